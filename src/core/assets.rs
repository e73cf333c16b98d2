use crate::error::{Result, TepidError};

use bytes::Bytes;
use std::borrow::Cow;
use tera::{Context, Tera};

const RELOAD_SCRIPT: &str = include_str!("../assets/reload.js");
const FRAME_WRAPPER: &str = include_str!("../assets/frame.html");

/// The fixed fragments used by the development endpoints.
///
/// Both are Tera sources. The reload script receives `endpoint`; the frame
/// wrapper receives `target_route` and `script_path`. The defaults are bundled
/// with the crate and can be swapped out through
/// [`BakeryBuilder::assets`](crate::BakeryBuilder::assets).
#[derive(Debug, Clone)]
pub struct Assets {
  pub reload_script: Cow<'static, str>,
  pub frame_wrapper: Cow<'static, str>,
}

impl Default for Assets {
  fn default() -> Self {
    Self {
      reload_script: Cow::Borrowed(RELOAD_SCRIPT),
      frame_wrapper: Cow::Borrowed(FRAME_WRAPPER),
    }
  }
}

impl Assets {
  /// Renders the browser script that listens on `endpoint`.
  pub fn render_reload_script(&self, endpoint: &str) -> Result<Bytes> {
    let mut context = Context::new();
    context.insert("endpoint", endpoint);
    render(&self.reload_script, &context)
  }

  /// Renders a page that shows `target_route` in a full-size iframe and loads the reload script.
  pub fn render_frame(&self, target_route: &str, script_path: &str) -> Result<Bytes> {
    let mut context = Context::new();
    context.insert("target_route", target_route);
    context.insert("script_path", script_path);
    render(&self.frame_wrapper, &context)
  }
}

fn render(source: &str, context: &Context) -> Result<Bytes> {
  Tera::one_off(source, context, false)
    .map(Bytes::from)
    .map_err(TepidError::Asset)
}
