use thiserror::Error;

/// Errors produced while initializing widgets in a loaded document.
///
/// Only two of these ever become user-visible: `DependencyUnavailable`
/// replaces every mount point's content with a shared diagnostic panel, and
/// `Instantiation` replaces the content of the one mount point it belongs to.
/// `Config` is recovered internally (the widget falls back to defaults) and
/// surfaces only as a logged warning.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The rendering primitives or the editor+viewer component factory could
    /// not be resolved. Fatal for the whole document pass.
    #[error("failed to load widget dependencies: {0}")]
    DependencyUnavailable(String),

    /// The component factory failed while constructing or rendering one
    /// widget. Fatal for that widget only.
    #[error("widget instantiation failed: {0}")]
    Instantiation(String),

    /// A props fragment did not parse as a JSON object.
    #[error("invalid widget configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EmbedError>;

impl EmbedError {
    /// The message shown inside a diagnostic panel, without the variant
    /// prefix used for logs.
    pub fn panel_message(&self) -> &str {
        match self {
            EmbedError::DependencyUnavailable(msg)
            | EmbedError::Instantiation(msg)
            | EmbedError::Config(msg) => msg,
        }
    }
}
