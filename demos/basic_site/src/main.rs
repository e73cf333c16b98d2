use actix_web::{App, HttpServer, Responder, web};
use anyhow::Context as _;
use clap::Parser;
use std::path::PathBuf;
use tepid::{Bakery, Config, FileGroups, Mode, actix::dev::InjectReloadScript};
use tera::Context;

#[derive(Debug, Parser)]
#[command(about = "tepid demo site")]
struct Args {
  /// Recompile templates per request and enable live reload.
  #[arg(long, env = "TEPID_DEV")]
  dev: bool,
  #[arg(long, default_value_t = 9001)]
  port: u16,
}

#[derive(serde::Serialize)]
struct User {
  name: String,
  email: String,
}

/// Renders the home page.
async fn index(bakery: web::Data<Bakery>) -> impl Responder {
  let mut context = Context::new();
  context.insert("title", "Home");
  context.insert("message", "Welcome to the tepid demo site!");
  bakery.bake("home.html", context)
}

/// Renders a page with more complex context.
async fn user_profile(bakery: web::Data<Bakery>) -> impl Responder {
  let mut context = Context::new();
  context.insert("title", "User Profile");
  context.insert(
    "user",
    &User {
      name: "Alice".to_string(),
      email: "alice@example.com".to_string(),
    },
  );
  bakery.bake("profile.html", context)
}

/// Renders a standalone component without the layout.
async fn card(bakery: web::Data<Bakery>) -> impl Responder {
  let mut context = Context::new();
  context.insert("title", "A standalone card");
  bakery.bake("card.html", context)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
  let args = Args::parse();

  let site_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
  let static_dir = site_dir.join("static");

  // 1. Configure and build the bakery.
  let mut config = Config::production(site_dir.join("templates")).watch_extensions([".html"]);
  if args.dev {
    config.mode = Mode::Development;
  }

  let bakery = Bakery::builder(config)
    .file_groups(
      FileGroups::new("layouts/app.html")
        .partials(["partials/*.html"])
        .pages(["pages/*.html"])
        .standalone(["components/*.html"]),
    )
    .add_global("site_name", "tepid demo")
    .add_global("version", env!("CARGO_PKG_VERSION"))
    .build()
    .context("failed to build the bakery")?;

  let stylesheet = bakery.single_file(static_dir.join("site.css"), include_bytes!("../static/site.css"), "text/css");
  let plain_page = bakery.single_file(
    static_dir.join("page.html"),
    include_bytes!("../static/page.html"),
    "text/html",
  );
  let plain_page_frame = bakery.frame_page("/page")?;

  log::info!("🚀 Starting server at http://127.0.0.1:{}", args.port);

  HttpServer::new(move || {
    let stylesheet = stylesheet.clone();
    let plain_page = plain_page.clone();
    let plain_page_frame = plain_page_frame.clone();

    App::new()
      .app_data(web::Data::new(bakery.clone()))
      // 2. [development only] Inject the reload script into HTML responses.
      .wrap(InjectReloadScript::new(&bakery))
      .route("/", web::get().to(index))
      .route("/profile", web::get().to(user_profile))
      .route("/card.html", web::get().to(card))
      .route(
        "/static/site.css",
        web::get().to(move || {
          let file = stylesheet.clone();
          async move { file }
        }),
      )
      .route(
        "/page",
        web::get().to(move || {
          let file = plain_page.clone();
          async move { file }
        }),
      )
      .route(
        "/page/dev",
        web::get().to(move || {
          let frame = plain_page_frame.clone();
          async move { frame }
        }),
      )
      // 3. [development only] Attach the event stream and script routes.
      .configure(|cfg| bakery.configure_routes(cfg))
  })
  .bind(("127.0.0.1", args.port))?
  .run()
  .await?;

  Ok(())
}
