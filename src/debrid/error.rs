use thiserror::Error;

/// Failures surfaced by provider adapters.
///
/// Every variant maps onto one shared code via [`DebridError::kind`], so callers
/// can react the same way regardless of which provider produced it.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("API key expired or invalid")]
    ExpiredApiKey,

    #[error("access denied by provider")]
    AccessDenied,

    #[error("two-factor authentication required")]
    TwoFactorAuth,

    #[error("account is not premium")]
    NotPremium,

    #[error("torrent not ready: {0}")]
    NotReady(String),

    #[error("torrent {torrent_id} failed: {status}")]
    PermanentFailure { torrent_id: String, status: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("link resolution failed: {0}")]
    Resolution(String),

    #[error("invalid file id: {0}")]
    InvalidFileId(String),

    #[error("provider error: {message}")]
    Provider { message: String, raw: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("provider configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DebridError>;

/// Shared error vocabulary across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ExpiredApiKey,
    AccessDenied,
    TwoFactorAuth,
    NotPremium,
    NotReady,
    PermanentFailure,
    Transport,
    Resolution,
    Cancelled,
    Generic,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::ExpiredApiKey => "EXPIRED_API_KEY",
            ErrorKind::AccessDenied => "ACCESS_DENIED",
            ErrorKind::TwoFactorAuth => "TWO_FACTOR_AUTH",
            ErrorKind::NotPremium => "NOT_PREMIUM",
            ErrorKind::NotReady => "NOT_READY",
            ErrorKind::PermanentFailure => "PERMANENT_FAILURE",
            ErrorKind::Transport => "TRANSPORT",
            ErrorKind::Resolution => "RESOLUTION",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::Generic => "GENERIC",
        }
    }

    /// Credential problems; the caller should ask the user to reconfigure.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ErrorKind::ExpiredApiKey | ErrorKind::AccessDenied | ErrorKind::TwoFactorAuth
        )
    }
}

impl DebridError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DebridError::ExpiredApiKey => ErrorKind::ExpiredApiKey,
            DebridError::AccessDenied => ErrorKind::AccessDenied,
            DebridError::TwoFactorAuth => ErrorKind::TwoFactorAuth,
            DebridError::NotPremium => ErrorKind::NotPremium,
            DebridError::NotReady(_) => ErrorKind::NotReady,
            DebridError::PermanentFailure { .. } => ErrorKind::PermanentFailure,
            DebridError::Transport(_) => ErrorKind::Transport,
            DebridError::Resolution(_) | DebridError::InvalidFileId(_) => ErrorKind::Resolution,
            DebridError::Cancelled => ErrorKind::Cancelled,
            DebridError::Provider { .. } | DebridError::Config(_) => ErrorKind::Generic,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

impl From<reqwest::Error> for DebridError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DebridError::Transport("request timed out".into())
        } else if e.is_decode() {
            DebridError::Transport(format!("malformed response: {}", e))
        } else {
            DebridError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for DebridError {
    fn from(e: serde_json::Error) -> Self {
        DebridError::Transport(format!("malformed response: {}", e))
    }
}
