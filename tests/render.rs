mod common;

use crate::common::{build, missing_handler, test_handler, write, write_site};

use actix_web::{App, http::StatusCode, test, web};
use serde::Serialize;
use tempfile::tempdir;
use tepid::{Bakery, Config, TepidError};

#[derive(Serialize)]
struct HomeData {
  #[serde(rename = "Title")]
  title: String,
}

#[core::prelude::v1::test]
fn test_explicit_recipe_composes_page_and_partials() {
  let temp_dir = tempdir().unwrap();
  write_site(temp_dir.path());

  let bakery = Bakery::builder(Config::production(temp_dir.path()))
    .add_recipe("home", ["base.tmpl", "partials/footer.tmpl", "pages/home.tmpl"])
    .build()
    .unwrap();

  let body = bakery
    .render("home", &HomeData { title: "X".to_string() })
    .unwrap();
  let body = std::str::from_utf8(&body).unwrap();

  assert!(body.contains("<h1>X</h1>"));
  assert!(body.contains("<footer>Made with tepid</footer>"));
}

#[core::prelude::v1::test]
fn test_modes_render_identically() {
  let temp_dir = tempdir().unwrap();
  write_site(temp_dir.path());

  let prod = build(Config::production(temp_dir.path()));
  let dev = build(Config::development(temp_dir.path()));
  let data = HomeData { title: "Same".to_string() };

  assert_eq!(prod.render("home.tmpl", &data).unwrap(), dev.render("home.tmpl", &data).unwrap());
}

#[core::prelude::v1::test]
fn test_development_finds_fragments_below_root() {
  // Recipes name fragments relative to a subdirectory, the walk finds them by suffix.
  let temp_dir = tempdir().unwrap();
  write(temp_dir.path(), "views/card.tmpl", "<div>{{ Title }}</div>");

  let bakery = Bakery::builder(Config::development(temp_dir.path()))
    .add_recipe("card", ["card.tmpl"])
    .build()
    .unwrap();

  let body = bakery.render("card", &HomeData { title: "c".to_string() }).unwrap();
  assert_eq!(&body[..], b"<div>c</div>");
}

#[core::prelude::v1::test]
fn test_shadowed_fragment_renders_the_same_in_both_modes() {
  let temp_dir = tempdir().unwrap();
  write(temp_dir.path(), "base.tmpl", "CURRENT {{ Title }}");
  write(temp_dir.path(), "archive/base.tmpl", "OLD {{ Title }}");

  let data = HomeData { title: "x".to_string() };
  let bodies: Vec<_> = [Config::production(temp_dir.path()), Config::development(temp_dir.path())]
    .into_iter()
    .map(|config| {
      let bakery = Bakery::builder(config).add_recipe("base", ["base.tmpl"]).build().unwrap();
      bakery.render("base", &data).unwrap()
    })
    .collect();

  assert_eq!(&bodies[0][..], b"CURRENT x");
  assert_eq!(bodies[0], bodies[1]);
}

#[core::prelude::v1::test]
fn test_missing_recipe_is_not_found() {
  let temp_dir = tempdir().unwrap();
  write_site(temp_dir.path());

  for config in [Config::production(temp_dir.path()), Config::development(temp_dir.path())] {
    let bakery = build(config);
    let err = bakery.render("about.tmpl", &HomeData { title: String::new() }).unwrap_err();
    assert!(matches!(err, TepidError::NotFound { .. }));
  }
}

#[actix_rt::test]
async fn test_render_in_actix_server() {
  // 1. Setup: Lay out a site and build a production bakery
  let temp_dir = tempdir().unwrap();
  write_site(temp_dir.path());
  let bakery = build(Config::production(temp_dir.path()));

  // 2. Setup: Create the Actix test server
  let app = test::init_service(
    App::new()
      .app_data(web::Data::new(bakery))
      .route("/", web::get().to(test_handler))
      .route("/missing", web::get().to(missing_handler)),
  )
  .await;

  // 3. Execution: Render through the Responder
  let req = test::TestRequest::get().uri("/").to_request();
  let resp = test::call_service(&app, req).await;

  assert!(resp.status().is_success());
  assert!(resp.headers().get("cache-control").is_none());
  let body = test::read_body(resp).await;
  let body_str = std::str::from_utf8(&body).unwrap();

  let expected_html = "<html><head><title>Integration Test</title></head>\
    <body><h1>Integration Test</h1><footer>Made with tepid</footer></body></html>";
  assert_eq!(body_str, expected_html);

  // 4. Unknown recipes become a 404
  let req = test::TestRequest::get().uri("/missing").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_execution_failure_is_a_server_error() {
  let temp_dir = tempdir().unwrap();
  write_site(temp_dir.path());
  write(temp_dir.path(), "pages/needs.tmpl", "{% extends \"base.tmpl\" %}{% block content %}{{ user.name }}{% endblock %}");
  let bakery = build(Config::development(temp_dir.path()));

  let app = test::init_service(App::new().app_data(web::Data::new(bakery)).route(
    "/",
    web::get().to(|bakery: web::Data<tepid::Bakery>| async move { bakery.bake("needs.tmpl", tera::Context::new()) }),
  ))
  .await;

  let req = test::TestRequest::get().uri("/").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
