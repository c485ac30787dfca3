use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide settings shared by the server and the CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Serialized random-forest classifier artifact.
    pub model_path: PathBuf,
    /// Serialized TF-IDF vectorizer artifact.
    pub vectorizer_path: PathBuf,
    /// Upper bound on a single interactive feedback text, in characters.
    pub max_feedback_chars: usize,
    /// Upper bound on rows accepted in one uploaded CSV.
    pub max_batch_rows: usize,
    /// Upper bound on an uploaded request body, in bytes.
    pub max_upload_bytes: usize,
}
