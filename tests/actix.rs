mod common;

use std::fs;
use std::future::poll_fn;
use std::path::Path;
use std::pin::Pin;
use std::time::{Duration, SystemTime};

use actix_web::{App, HttpResponse, body::MessageBody, http::StatusCode, test, web};
use bytes::Bytes;
use tempfile::tempdir;
use tepid::{Bakery, Config, actix::dev::InjectReloadScript};
use tokio::time::timeout;

use crate::common::{build, test_handler, write_site};

fn dev_config(root: &Path) -> Config {
  let mut config = Config::development(root).watch_extensions([".tmpl", ".css"]);
  config.poll_interval_ms = 50;
  config
}

// Pushes the modification time ahead so the next poll tick is certain to see it.
fn touch(path: &Path) {
  let file = fs::File::options().write(true).open(path).unwrap();
  file.set_modified(SystemTime::now() + Duration::from_secs(5)).unwrap();
}

// Reads the next chunk of a streaming body.
async fn next_chunk<B: MessageBody>(body: &mut Pin<Box<B>>) -> Bytes {
  let chunk = timeout(Duration::from_secs(2), poll_fn(|cx| body.as_mut().poll_next(cx)))
    .await
    .expect("Timeout waiting for event");
  match chunk {
    Some(Ok(bytes)) => bytes,
    Some(Err(_)) => panic!("Body stream failed"),
    None => panic!("Stream ended unexpectedly"),
  }
}

async fn simple_html_handler() -> HttpResponse {
  HttpResponse::Ok()
    .content_type("text/html")
    .body("<html><head></head><body>Hello</body></html>")
}

#[actix_rt::test]
async fn test_middleware_injects_script() {
  let temp_dir = tempdir().unwrap();
  let bakery = Bakery::builder(dev_config(temp_dir.path())).build().unwrap();

  let app = test::init_service(
    App::new()
      .wrap(InjectReloadScript::new(&bakery))
      .route("/", web::get().to(simple_html_handler)),
  )
  .await;

  let req = test::TestRequest::get().uri("/").to_request();
  let resp = test::call_service(&app, req).await;
  assert!(resp.status().is_success());

  let body = test::read_body(resp).await;
  let body_str = std::str::from_utf8(&body).unwrap();

  // The original content is still there, split by the injection.
  assert!(body_str.starts_with("<html><head></head><body>Hello"));
  assert!(body_str.ends_with("</body></html>"));
  assert!(body_str.contains(r#"<script defer="true" src="/tepid.js" data-tepid-reload="true"></script>"#));
}

#[actix_rt::test]
async fn test_middleware_passes_through_in_production() {
  let temp_dir = tempdir().unwrap();
  let bakery = Bakery::builder(Config::production(temp_dir.path())).build().unwrap();

  let app = test::init_service(
    App::new()
      .wrap(InjectReloadScript::new(&bakery))
      .route("/", web::get().to(simple_html_handler)),
  )
  .await;

  let req = test::TestRequest::get().uri("/").to_request();
  let body = test::call_and_read_body(&app, req).await;
  assert_eq!(&body[..], b"<html><head></head><body>Hello</body></html>");
}

#[actix_rt::test]
async fn test_event_stream_sends_connected_then_reload() {
  // 1. Setup a development site with live reload routes
  let temp_dir = tempdir().unwrap();
  write_site(temp_dir.path());
  let bakery = build(dev_config(temp_dir.path()));

  let routes = bakery.clone();
  let app = test::init_service(
    App::new()
      .app_data(web::Data::new(bakery))
      .configure(move |cfg| routes.configure_routes(cfg))
      .route("/", web::get().to(test_handler)),
  )
  .await;

  // 2. Open the event stream
  let req = test::TestRequest::get().uri("/tepid").to_request();
  let resp = test::call_service(&app, req).await;
  assert!(resp.status().is_success());
  assert_eq!(resp.headers().get("content-type").unwrap(), "text/event-stream");
  assert_eq!(resp.headers().get("cache-control").unwrap(), "no-cache");

  let mut body = Box::pin(resp.into_body());
  assert_eq!(&next_chunk(&mut body).await[..], b"data: {\"connected\": true}\n\n");

  // 3. Touch a watched fragment and wait for the reload
  touch(&temp_dir.path().join("partials/footer.tmpl"));
  assert_eq!(&next_chunk(&mut body).await[..], b"data: {\"reload\": true}\n\n");
}

#[actix_rt::test]
async fn test_reload_script_route() {
  let temp_dir = tempdir().unwrap();
  let bakery = Bakery::builder(dev_config(temp_dir.path())).build().unwrap();

  let routes = bakery.clone();
  let app = test::init_service(App::new().configure(move |cfg| routes.configure_routes(cfg))).await;

  let req = test::TestRequest::get().uri("/tepid.js").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.headers().get("content-type").unwrap(), "text/javascript");

  let body = test::read_body(resp).await;
  let script = std::str::from_utf8(&body).unwrap();
  assert!(script.contains("new EventSource(\"/tepid\")"));
  assert!(script.contains("window.location.reload()"));
}

#[actix_rt::test]
async fn test_production_has_no_live_reload_routes() {
  let temp_dir = tempdir().unwrap();
  write_site(temp_dir.path());
  let bakery = build(Config::production(temp_dir.path()));

  let routes = bakery.clone();
  let app = test::init_service(App::new().configure(move |cfg| routes.configure_routes(cfg))).await;

  for uri in ["/tepid", "/tepid.js"] {
    let req = test::TestRequest::get().uri(uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}

#[actix_rt::test]
async fn test_development_pages_are_not_cached() {
  let temp_dir = tempdir().unwrap();
  write_site(temp_dir.path());
  let bakery = build(dev_config(temp_dir.path()));

  let app = test::init_service(
    App::new()
      .app_data(web::Data::new(bakery.clone()))
      .wrap(InjectReloadScript::new(&bakery))
      .route("/", web::get().to(test_handler)),
  )
  .await;

  let req = test::TestRequest::get().uri("/").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.headers().get("cache-control").unwrap(), "no-cache");

  let body = test::read_body(resp).await;
  let body_str = std::str::from_utf8(&body).unwrap();
  assert!(body_str.contains("<footer>Made with tepid</footer><script defer=\"true\""));
}

#[actix_rt::test]
async fn test_frame_page_wraps_target_route() {
  let temp_dir = tempdir().unwrap();
  let bakery = Bakery::builder(dev_config(temp_dir.path())).build().unwrap();
  let frame = bakery.frame_page("/imaginary").unwrap();

  let app = test::init_service(
    App::new()
      .wrap(InjectReloadScript::new(&bakery))
      .route(
        "/index/dev",
        web::get().to(move || {
          let frame = frame.clone();
          async move { frame }
        }),
      ),
  )
  .await;

  let req = test::TestRequest::get().uri("/index/dev").to_request();
  let body = test::call_and_read_body(&app, req).await;
  let page = std::str::from_utf8(&body).unwrap();

  assert!(page.contains(r#"<iframe width="100%" height="100%" frameborder="0" src="/imaginary"></iframe>"#));
  // The frame already loads the script, so the middleware must not add a second copy.
  assert_eq!(page.matches("data-tepid-reload").count(), 1);
}

#[actix_rt::test]
async fn test_single_file_source_follows_mode() {
  let temp_dir = tempdir().unwrap();
  let page_path = temp_dir.path().join("page.html");
  fs::write(&page_path, "<h1>from disk</h1>").unwrap();

  let dev = Bakery::builder(dev_config(temp_dir.path())).build().unwrap();
  let prod = Bakery::builder(Config::production(temp_dir.path())).build().unwrap();
  let dev_file = dev.single_file(&page_path, b"<h1>embedded</h1>", "text/html");
  let prod_file = prod.single_file(&page_path, b"<h1>embedded</h1>", "text/html");
  let gone_file = dev.single_file(temp_dir.path().join("gone.html"), b"", "text/html");

  let app = test::init_service(
    App::new()
      .route(
        "/dev",
        web::get().to(move || {
          let file = dev_file.clone();
          async move { file }
        }),
      )
      .route(
        "/prod",
        web::get().to(move || {
          let file = prod_file.clone();
          async move { file }
        }),
      )
      .route(
        "/gone",
        web::get().to(move || {
          let file = gone_file.clone();
          async move { file }
        }),
      ),
  )
  .await;

  let resp = test::call_service(&app, test::TestRequest::get().uri("/dev").to_request()).await;
  assert_eq!(resp.headers().get("cache-control").unwrap(), "no-cache");
  assert_eq!(&test::read_body(resp).await[..], b"<h1>from disk</h1>");

  let body = test::call_and_read_body(&app, test::TestRequest::get().uri("/prod").to_request()).await;
  assert_eq!(&body[..], b"<h1>embedded</h1>");

  let resp = test::call_service(&app, test::TestRequest::get().uri("/gone").to_request()).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
