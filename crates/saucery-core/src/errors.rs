/// Core error type for the bot.
///
/// The adapter crate maps SDK errors into this type so handlers can treat
/// failures consistently (log-and-skip vs user-facing failure embed).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{service} error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("transcode failed: {0}")]
    Transcode(String),

    #[error("discord error: {0}")]
    Discord(String),
}

impl Error {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
