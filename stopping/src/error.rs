use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A grace period pair in the configuration could not be parsed.
    #[error("invalid grace period '{pair}': {reason}")]
    InvalidGracePeriod { pair: String, reason: String },

    #[error("invalid early stopping configuration: {0}")]
    InvalidConfig(String),

    /// The render callback failed for one of the evaluation views.
    #[error("render failed: {0}")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Tensor(#[from] candle_core::Error),
}

impl Error {
    pub(crate) fn grace_period(pair: &str, reason: impl Into<String>) -> Self {
        Self::InvalidGracePeriod {
            pair: pair.to_string(),
            reason: reason.into(),
        }
    }

    /// Configuration errors are raised before training starts.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidGracePeriod { .. } | Self::InvalidConfig(_))
    }
}
