use crate::core::config::DEFAULT_POLL_INTERVAL;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

/// "At least one watched file changed since the last check."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadEvent;

/// Polls a directory tree for recently modified files.
///
/// Each poll tick walks the whole tree and compares modification times with a
/// window starting one period ago. Detection is best effort: a write that lands
/// on a tick boundary may be seen on this tick or the next.
#[derive(Debug, Clone)]
pub struct ChangeWatcher {
  root: PathBuf,
  extensions: Arc<[String]>,
  period: Duration,
}

impl ChangeWatcher {
  pub fn new<I, S>(root: impl Into<PathBuf>, extensions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      root: root.into(),
      extensions: extensions.into_iter().map(Into::into).collect(),
      period: DEFAULT_POLL_INTERVAL,
    }
  }

  /// Sets the poll period. Defaults to 250ms.
  pub fn period(mut self, period: Duration) -> Self {
    self.period = period.max(Duration::from_millis(1));
    self
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// `false` when there are no watched extensions.
  pub fn is_enabled(&self) -> bool {
    !self.extensions.is_empty()
  }

  fn is_watched(&self, path: &Path) -> bool {
    let path = path.to_string_lossy();
    self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
  }

  /// Walks the tree once and reports whether a watched file was modified after `since`.
  ///
  /// Stops at the first match. The token is checked before every entry, so a
  /// cancelled walk returns `false` right away. Unreadable entries are skipped.
  pub fn has_changes(&self, since: SystemTime, token: &CancellationToken) -> bool {
    if !self.is_enabled() {
      return false;
    }

    for entry in WalkDir::new(&self.root) {
      if token.is_cancelled() {
        log::debug!("Change scan of {} cancelled", self.root.display());
        return false;
      }

      let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
          log::debug!("Skipping unreadable entry: {}", e);
          continue;
        }
      };
      if entry.file_type().is_dir() || !self.is_watched(entry.path()) {
        continue;
      }

      let modified = match entry.metadata().map(|m| m.modified()) {
        Ok(Ok(modified)) => modified,
        Ok(Err(e)) => {
          log::debug!("No modification time for {}: {}", entry.path().display(), e);
          continue;
        }
        Err(e) => {
          log::debug!("Unable to stat {}: {}", entry.path().display(), e);
          continue;
        }
      };

      if modified > since {
        log::info!("📝 Change detected: {}", entry.path().display());
        return true;
      }
    }

    false
  }

  /// Starts the poll loop on the Tokio runtime and returns its event receiver.
  ///
  /// The loop runs until `token` is cancelled. Events are sent without waiting:
  /// when the previous event has not been received yet, the new one is dropped.
  pub fn spawn(&self, token: CancellationToken) -> mpsc::Receiver<ReloadEvent> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(self.clone().run(token, tx));
    rx
  }

  async fn run(self, token: CancellationToken, tx: mpsc::Sender<ReloadEvent>) {
    let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      let scheduled = tokio::select! {
        _ = token.cancelled() => break,
        scheduled = ticker.tick() => scheduled,
      };
      if !self.is_enabled() {
        continue;
      }

      // Measure the window from the scheduled tick so that consecutive windows overlap.
      let lag = Instant::now().saturating_duration_since(scheduled);
      let since = SystemTime::now()
        .checked_sub(self.period + lag)
        .unwrap_or(SystemTime::UNIX_EPOCH);

      let watcher = self.clone();
      let scan_token = token.clone();
      let changed = match tokio::task::spawn_blocking(move || watcher.has_changes(since, &scan_token)).await {
        Ok(changed) => changed,
        Err(e) => {
          log::debug!("Change scan task failed: {}", e);
          false
        }
      };
      if !changed {
        continue;
      }

      match tx.try_send(ReloadEvent) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => log::debug!("Reload receiver busy, dropping event"),
        Err(TrySendError::Closed(_)) => break,
      }
    }

    log::debug!("Change watcher for {} stopped", self.root.display());
  }
}
