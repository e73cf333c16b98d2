use crate::core::app::Bakery;
use actix_web::{
  Error,
  body::{BoxBody, MessageBody},
  dev::{Service, ServiceRequest, ServiceResponse, Transform},
  http::header::CONTENT_TYPE,
};
use bytes::{Bytes, BytesMut};
use futures_util::future::{self, LocalBoxFuture};
use std::{rc::Rc, task::Poll};

const RELOAD_MARKER: &[u8] = b"data-tepid-reload";
const BODY_TAG: &[u8] = b"</body>";

/// Inserts the reload script tag into HTML responses in development mode.
///
/// The tag goes right before `</body>`, or at the end when there is none.
/// Responses that already carry the tag (such as frame pages) are left alone.
/// In production the middleware passes every response through.
#[derive(Debug, Clone)]
pub struct InjectReloadScript {
  script_tag: Option<Bytes>,
}

impl InjectReloadScript {
  pub fn new(bakery: &Bakery) -> Self {
    let script_tag = bakery.is_dev().then(|| {
      Bytes::from(format!(
        "<script defer=\"true\" src=\"{}\" data-tepid-reload=\"true\"></script>",
        bakery.config().script_path
      ))
    });
    Self { script_tag }
  }
}

impl<S, B> Transform<S, ServiceRequest> for InjectReloadScript
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  B: MessageBody + 'static,
{
  type Response = ServiceResponse<BoxBody>;
  type Error = Error;
  type Transform = InjectReloadScriptMiddleware<S>;
  type InitError = ();
  type Future = future::Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    future::ok(InjectReloadScriptMiddleware {
      service: Rc::new(service),
      script_tag: self.script_tag.clone(),
    })
  }
}

pub struct InjectReloadScriptMiddleware<S> {
  service: Rc<S>,
  script_tag: Option<Bytes>,
}

impl<S, B> Service<ServiceRequest> for InjectReloadScriptMiddleware<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  B: MessageBody + 'static,
{
  type Response = ServiceResponse<BoxBody>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  fn poll_ready(&self, cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
    self.service.poll_ready(cx)
  }

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let service = self.service.clone();
    let script_tag = self.script_tag.clone();

    Box::pin(async move {
      let res = service.call(req).await?;

      let Some(script_tag) = script_tag else {
        return Ok(res.map_into_boxed_body());
      };

      let is_html = res
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|val| val.to_str().unwrap_or("").contains("text/html"));
      if !is_html {
        return Ok(res.map_into_boxed_body());
      }

      let res = res.map_body(move |_head, body| {
        let body_fut = async move {
          let body_bytes = actix_web::body::to_bytes(body)
            .await
            .map_err(|_| actix_web::error::ErrorInternalServerError("Failed to buffer response body"))?;
          Ok::<_, Error>(inject(&body_bytes, &script_tag))
        };

        actix_web::body::BodyStream::new(Box::pin(async_stream::stream! {
          yield body_fut.await;
        }))
        .boxed()
      });

      Ok(res)
    })
  }
}

fn inject(body: &[u8], script_tag: &[u8]) -> Bytes {
  if find_case_insensitive(body, RELOAD_MARKER).is_some() {
    return Bytes::copy_from_slice(body);
  }

  let split = find_case_insensitive(body, BODY_TAG).unwrap_or(body.len());
  let mut new_body = BytesMut::with_capacity(body.len() + script_tag.len());
  new_body.extend_from_slice(&body[..split]);
  new_body.extend_from_slice(script_tag);
  new_body.extend_from_slice(&body[split..]);
  new_body.freeze()
}

fn find_case_insensitive(haystack: &[u8], needle: &[u8]) -> Option<usize> {
  haystack
    .windows(needle.len())
    .position(|window| window.eq_ignore_ascii_case(needle))
}
