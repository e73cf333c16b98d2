use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// The default period between two change-detection walks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Selects between the cached production store and the recompiling development store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  /// Compile every recipe once at startup and render from the cache.
  #[default]
  Production,
  /// Recompile on every render and serve live-reload events.
  Development,
}

impl Mode {
  pub fn is_development(self) -> bool {
    self == Mode::Development
  }
}

impl FromStr for Mode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "production" | "prod" => Ok(Mode::Production),
      "development" | "dev" => Ok(Mode::Development),
      other => Err(format!("unknown mode {other:?}, expected \"production\" or \"development\"")),
    }
  }
}

/// Configuration for a [`Bakery`](crate::Bakery).
///
/// Every field has a default, so a host application can deserialize a partial
/// table from its own configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub mode: Mode,
  /// Directory that recipe fragment paths and file-group globs are relative to.
  /// In development mode it is also the root of the change watcher's walk.
  pub template_root: PathBuf,
  /// File suffixes (e.g. `.html`, `.css`) that trigger a reload when modified.
  /// An empty list disables change detection.
  pub watch_extensions: Vec<String>,
  pub poll_interval_ms: u64,
  /// Route of the server-sent event stream.
  pub events_path: String,
  /// Route of the browser-side reload script.
  pub script_path: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      mode: Mode::Production,
      template_root: PathBuf::from("templates"),
      watch_extensions: Vec::new(),
      poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
      events_path: "/tepid".to_string(),
      script_path: "/tepid.js".to_string(),
    }
  }
}

impl Config {
  pub fn production(template_root: impl Into<PathBuf>) -> Self {
    Self {
      template_root: template_root.into(),
      ..Self::default()
    }
  }

  pub fn development(template_root: impl Into<PathBuf>) -> Self {
    Self {
      mode: Mode::Development,
      template_root: template_root.into(),
      ..Self::default()
    }
  }

  /// Replaces the watched suffix list.
  pub fn watch_extensions<I, S>(mut self, extensions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.watch_extensions = extensions.into_iter().map(Into::into).collect();
    self
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms.max(1))
  }
}
