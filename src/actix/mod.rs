use crate::core::app::{Bakery, FramePage, SingleFile, Template};
use crate::error::TepidError;
use actix_web::{
  HttpRequest, HttpResponse, HttpResponseBuilder, Responder, ResponseError,
  body::BoxBody,
  http::{
    StatusCode,
    header::{CACHE_CONTROL, ContentType},
  },
  web,
  web::ServiceConfig,
};

pub mod dev;

impl ResponseError for TepidError {
  fn status_code(&self) -> StatusCode {
    match self {
      TepidError::NotFound { .. } => StatusCode::NOT_FOUND,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl Responder for Template {
  type Body = BoxBody;

  fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
    // The body is fully rendered before the response is built.
    match self.app_state.render_context(&self.recipe, self.context) {
      Ok(body) => {
        let mut response = HttpResponse::build(StatusCode::OK);
        response.content_type(ContentType::html());
        no_cache_in_dev(&mut response, self.app_state.is_dev());
        response.body(body)
      }
      Err(e) => {
        log::error!("Template rendering error: {}", e);
        e.error_response()
      }
    }
  }
}

impl Responder for FramePage {
  type Body = BoxBody;

  fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
    HttpResponse::Ok()
      .content_type(ContentType::html())
      .insert_header((CACHE_CONTROL, "no-cache"))
      .body(self.body)
  }
}

impl Responder for SingleFile {
  type Body = BoxBody;

  fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
    match self.load() {
      Ok(body) => {
        let mut response = HttpResponse::build(StatusCode::OK);
        response.content_type(self.content_type.as_str());
        no_cache_in_dev(&mut response, self.from_disk);
        response.body(body)
      }
      Err(e) => {
        log::error!("Unable to read {}: {}", self.path.display(), e);
        HttpResponse::InternalServerError().finish()
      }
    }
  }
}

fn no_cache_in_dev(response: &mut HttpResponseBuilder, is_dev: bool) {
  if is_dev {
    response.insert_header((CACHE_CONTROL, "no-cache"));
  }
}

impl Bakery {
  /// Configures the Actix services needed for live reload.
  ///
  /// In development this adds the event stream route (`events_path`) and the
  /// reload script route (`script_path`). In production it does nothing, so
  /// user code can call it unconditionally.
  pub fn configure_routes(&self, cfg: &mut ServiceConfig) {
    let Some(live) = self.live_reload.clone() else {
      return;
    };

    log::info!(
      "🔥 tepid development mode. Attaching live reload at {} (script at {})",
      self.config.events_path,
      self.config.script_path
    );

    let notifier = live.notifier.clone();
    cfg.route(
      &self.config.events_path,
      web::get().to(move || dev::sse::events_handler(notifier.clone())),
    );

    let script = live.script.clone();
    cfg.route(
      &self.config.script_path,
      web::get().to(move || dev::sse::script_handler(script.clone())),
    );
  }
}
