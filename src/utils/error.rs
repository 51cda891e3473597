use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// Identity-provider call failed: transport error, non-2xx status or a
    /// malformed grant body. Never retried.
    #[error("authentication failed: {message}")]
    Auth {
        status: Option<u16>,
        message: String,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Offer endpoint answered with a non-success status.
    #[error("upstream API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Upstream returned zero offers; a legitimate empty result, not a
    /// gateway failure.
    #[error("no flight offers found")]
    NoOffers,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("invalid query parameter {field}: {reason}")]
    InvalidQuery { field: String, reason: String },

    #[error("processing error: {message}")]
    Processing { message: String },
}

impl GatewayError {
    /// Whether a failure is worth retrying. Transport-level errors and
    /// 5xx/429 responses are transient; a decode failure, an auth failure or
    /// any other 4xx is not.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Network(err) => !err.is_decode(),
            GatewayError::Upstream { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
