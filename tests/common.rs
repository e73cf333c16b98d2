#![allow(dead_code)]

use actix_web::{Responder, web};
use std::fs;
use std::path::Path;
use tepid::{Bakery, Config, FileGroups};
use tera::Context;

// Test handler that uses the tepid bake method
pub async fn test_handler(bakery: web::Data<Bakery>) -> impl Responder {
  let mut context = Context::new();
  context.insert("Title", "Integration Test");
  bakery.bake("home.tmpl", context)
}

pub async fn missing_handler(bakery: web::Data<Bakery>) -> impl Responder {
  bakery.bake("nope.tmpl", Context::new())
}

pub fn write(root: &Path, relative: &str, content: &str) {
  let path = root.join(relative);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

/// Lays out a small site: a base layout, a footer partial and a home page.
pub fn write_site(root: &Path) {
  write(
    root,
    "base.tmpl",
    "<html><head><title>{% block title %}{% endblock %}</title></head>\
     <body>{% block content %}{% endblock %}{% include \"partials/footer.tmpl\" %}</body></html>",
  );
  write(root, "partials/footer.tmpl", "<footer>Made with tepid</footer>");
  write(
    root,
    "pages/home.tmpl",
    "{% extends \"base.tmpl\" %}{% block title %}{{ Title }}{% endblock %}\
     {% block content %}<h1>{{ Title }}</h1>{% endblock %}",
  );
}

pub fn site_groups() -> FileGroups {
  FileGroups::new("base.tmpl")
    .partials(["partials/*.tmpl"])
    .pages(["pages/*.tmpl"])
}

pub fn build(config: Config) -> Bakery {
  Bakery::builder(config).file_groups(site_groups()).build().unwrap()
}
