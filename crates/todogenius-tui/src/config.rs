use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::route::Route;

#[derive(Debug, Parser)]
#[command(name = "todogenius", about = "Terminal client for the TodoGenius task API")]
pub struct Config {
    /// Base URL of the TodoGenius API
    #[arg(long, env = "TODOGENIUS_API_URL", default_value = "http://127.0.0.1:8000/api")]
    pub api_url: String,

    /// View to open first: "/", "/tasks" or "/context"
    #[arg(long, default_value = "/")]
    pub route: String,

    /// How long the task title must stay unchanged before AI suggestions are requested (ms)
    #[arg(long, default_value = "3000")]
    pub title_debounce_ms: u64,

    /// Delay before the search box refetches the task list (ms)
    #[arg(long, default_value = "500")]
    pub search_debounce_ms: u64,

    /// Per-request timeout (seconds)
    #[arg(long, default_value = "30")]
    pub request_timeout_secs: u64,

    /// Log file. Defaults to todogenius.log in the system temp dir.
    #[arg(long, env = "TODOGENIUS_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("todogenius.log"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn initial_route(&self) -> Route {
        Route::parse(&self.route)
    }

    pub fn ui(&self) -> UiConfig {
        UiConfig {
            title_debounce: Duration::from_millis(self.title_debounce_ms),
            search_debounce: Duration::from_millis(self.search_debounce_ms),
        }
    }
}

/// Timing knobs the app itself needs, separate from process setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiConfig {
    pub title_debounce: Duration,
    pub search_debounce: Duration,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title_debounce: Duration::from_millis(3000),
            search_debounce: Duration::from_millis(500),
        }
    }
}
