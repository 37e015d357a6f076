use thiserror::Error;

/// Error taxonomy for the content-creation core.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or inconsistent startup configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An agent declared an output key outside the fixed slot set.
    /// Programmer error; fails loudly rather than being swallowed.
    #[error("unknown output key '{0}' (valid keys: ideas, outline, draft, feedback, seo-result)")]
    UnknownOutputKey(String),

    /// The hosted-model call failed. Reported to the caller as a failed
    /// turn; never retried automatically.
    #[error("model invocation failed: {0}")]
    Invocation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
