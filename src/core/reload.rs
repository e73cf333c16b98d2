use crate::core::watch::ChangeWatcher;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio_util::sync::CancellationToken;

/// An event pushed to a live-reload client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveEvent {
  /// Always the first event of a connection.
  Connected,
  /// Something changed; the client should re-fetch.
  Reload,
}

impl LiveEvent {
  /// The event encoded as one server-sent event frame.
  pub fn as_sse_frame(self) -> &'static [u8] {
    match self {
      LiveEvent::Connected => b"data: {\"connected\": true}\n\n",
      LiveEvent::Reload => b"data: {\"reload\": true}\n\n",
    }
  }
}

/// Hands every live-reload connection its own change watcher.
///
/// Each call to [`connect`](ReloadNotifier::connect) runs an independent poll
/// loop scoped to that connection. The loop stops when the returned stream is
/// dropped or when [`shutdown`](ReloadNotifier::shutdown) is called.
#[derive(Debug, Clone)]
pub struct ReloadNotifier {
  watcher: ChangeWatcher,
  // Parent of every per-connection token.
  shutdown: CancellationToken,
}

impl ReloadNotifier {
  pub fn new(watcher: ChangeWatcher) -> Self {
    Self {
      watcher,
      shutdown: CancellationToken::new(),
    }
  }

  /// Opens a new event stream: `Connected` first, then one `Reload` per detected change.
  ///
  /// The stream owns its watcher. A reconnecting client starts from scratch and
  /// never sees events from an earlier connection.
  pub fn connect(&self) -> BoxStream<'static, LiveEvent> {
    let watcher = self.watcher.clone();
    let token = self.shutdown.child_token();

    async_stream::stream! {
      // Dropping the stream cancels the watcher.
      let _guard = token.clone().drop_guard();

      yield LiveEvent::Connected;

      let mut changes = watcher.spawn(token.clone());
      loop {
        let changed = tokio::select! {
          _ = token.cancelled() => false,
          change = changes.recv() => change.is_some(),
        };
        if !changed {
          break;
        }
        yield LiveEvent::Reload;
      }

      log::debug!("Live-reload connection closed");
    }
    .boxed()
  }

  /// Ends every open connection.
  pub fn shutdown(&self) {
    self.shutdown.cancel();
  }
}
