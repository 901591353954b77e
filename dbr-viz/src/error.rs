/// Error types for chart building
use dbr_data::DataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VizError {
    /// Column lookup or numeric conversion failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Not enough usable rows to draw the chart
    #[error("{chart}: {reason}")]
    InsufficientData { chart: &'static str, reason: String },

    /// A parameter is out of range or inconsistent
    #[error("{chart}: invalid '{name}': {reason}")]
    InvalidParameter {
        chart: &'static str,
        name: &'static str,
        reason: String,
    },
}

/// Type alias for Results using VizError
pub type Result<T> = std::result::Result<T, VizError>;
