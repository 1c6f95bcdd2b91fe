use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

pub const DEFAULT_USER_AGENT: &str = concat!("relget/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the forge REST API, without a trailing slash
    pub api_base: String,

    /// User-Agent sent with every request (GitHub rejects requests without one)
    pub user_agent: String,

    /// Directory assets are saved to when the caller doesn't pick one
    pub download_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            download_dir: Self::default_download_dir(),
        }
    }
}

impl Config {
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_download_dir(mut self, download_dir: &Path) -> Self {
        self.download_dir = download_dir.to_path_buf();
        self
    }

    /// The user's download directory, or the current directory if there is none.
    pub fn default_download_dir() -> PathBuf {
        dirs::download_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
