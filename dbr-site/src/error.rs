/// Error types for dashboard project validation
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SiteError {
    /// Project has no title
    #[error("Dashboard title must not be empty")]
    EmptyTitle,

    /// Two pages share a name
    #[error("Duplicate page name '{0}'")]
    DuplicatePage(String),

    /// Two page names map to the same output file
    #[error("Pages '{first}' and '{second}' would both be written to '{file}'")]
    FileCollision {
        first: String,
        second: String,
        file: String,
    },

    /// More than one page is marked as the landing page
    #[error("Only one landing page is allowed, found '{first}' and '{second}'")]
    MultipleLandingPages { first: String, second: String },

    /// A navbar section or sidebar group names a page that does not exist
    #[error("{context} refers to unknown page '{page}'")]
    UnknownPage { context: String, page: String },

    /// A viz has neither its own data nor page data
    #[error("Page '{page}': visualization {index} ({chart}) has no data")]
    MissingData {
        page: String,
        index: usize,
        chart: &'static str,
    },

    /// A template page also declares content blocks
    #[error("Page '{0}' uses a template and cannot also have content blocks")]
    TemplateWithContent(String),
}

/// Type alias for Results using SiteError
pub type Result<T> = std::result::Result<T, SiteError>;
