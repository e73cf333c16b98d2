use crate::core::reload::{LiveEvent, ReloadNotifier};
use actix_web::{
  HttpResponse,
  http::header::CACHE_CONTROL,
};
use bytes::Bytes;
use futures_util::StreamExt;
use std::convert::Infallible;

/// Opens one server-sent event stream backed by its own change watcher.
///
/// The stream (and with it the watcher) is dropped by Actix when the client
/// disconnects.
pub(crate) async fn events_handler(notifier: ReloadNotifier) -> HttpResponse {
  log::info!("New live-reload connection");

  let frames = notifier.connect().map(|event: LiveEvent| {
    log::debug!("Sending live-reload event: {:?}", event);
    Ok::<_, Infallible>(Bytes::from_static(event.as_sse_frame()))
  });

  HttpResponse::Ok()
    .content_type("text/event-stream")
    .insert_header((CACHE_CONTROL, "no-cache"))
    .streaming(Box::pin(frames))
}

/// Serves the browser-side reload script rendered at build time.
pub(crate) async fn script_handler(script: Bytes) -> HttpResponse {
  HttpResponse::Ok()
    .content_type("text/javascript")
    .insert_header((CACHE_CONTROL, "no-cache"))
    .body(script)
}
