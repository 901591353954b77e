//! Tabular survey data for dashboardr charts.
//!
//! Data arrives as CSV and is held as a small in-memory [`DataFrame`] of
//! optional string cells. Chart builders read columns out of it, decide how
//! missing values are treated ([`NaPolicy`]), order categories the way a
//! factor would ([`levels::order_levels`]) and aggregate with [`Tally`].
//!
//! # Missing values
//!
//! Empty fields and the tokens `NA`, `N/A`, `NaN`, `null` are read as
//! missing (`None`).

pub mod error;
pub mod filter;
pub mod frame;
pub mod group;
pub mod levels;
pub mod stats;

pub use error::{DataError, Result};
pub use filter::{Filter, FilterOp};
pub use frame::DataFrame;
pub use group::Tally;
pub use levels::NaPolicy;
