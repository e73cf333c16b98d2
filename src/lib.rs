//! # tepid
//!
//! Named, composable Tera templates built from fragment files, with live reload
//! for development and first-class support for Actix Web.
//!
//! ## Features
//!
//! - **Recipes:** A recipe is an ordered list of fragments (base layout, partials,
//!   page). Register them one by one or derive them from file-group globs.
//! - **Production Mode:** Every recipe is compiled once at startup. Rendering is a
//!   lookup plus an execute, with no locks.
//! - **Development Mode:** Recipes are recompiled from disk on every render, so
//!   edits show up on the next request without a restart.
//! - **Live Reload:** Each browser tab gets a server-sent event stream backed by its
//!   own change watcher. Any modified file with a watched extension reloads the page.
//! - **Typed Errors:** `NotFound`, `CompileFailed` and `ExecFailed` map to distinct
//!   HTTP statuses at the Actix boundary.
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use actix_web::{web, App, HttpServer, Responder};
//! use tepid::{Bakery, Config, FileGroups};
//! use tera::Context;
//!
//! async fn home(bakery: web::Data<Bakery>) -> impl Responder {
//!   let mut context = Context::new();
//!   context.insert("title", "Welcome");
//!   // `bake` returns a `Template`, which is a Responder.
//!   bakery.bake("home.html", context)
//! }
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!   let config = Config::development("templates").watch_extensions([".html", ".css"]);
//!   let bakery = Bakery::builder(config)
//!     .file_groups(
//!       FileGroups::new("base.html")
//!         .partials(["partials/*.html"])
//!         .pages(["pages/*.html"]),
//!     )
//!     .add_global("site_name", "My Site")
//!     .build()
//!     .expect("Failed to build Bakery");
//!
//!   HttpServer::new(move || {
//!     App::new()
//!       .app_data(web::Data::new(bakery.clone()))
//!       // Adds the reload script to HTML responses in development.
//!       .wrap(tepid::actix::dev::InjectReloadScript::new(&bakery))
//!       .route("/", web::get().to(home))
//!       // Adds the event stream and script routes in development.
//!       .configure(|cfg| bakery.configure_routes(cfg))
//!   })
//!   .bind(("127.0.0.1", 3000))?
//!   .run()
//!   .await
//! }
//! ```

pub mod actix;
pub mod core;
pub mod error;

pub use crate::core::app::{Bakery, BakeryBuilder, FramePage, SingleFile, Template};
pub use crate::core::assets::Assets;
pub use crate::core::config::{Config, Mode};
pub use crate::core::recipe::{FileGroups, Recipe, Recipes};
pub use crate::core::reload::{LiveEvent, ReloadNotifier};
pub use crate::core::watch::{ChangeWatcher, ReloadEvent};
pub use crate::error::{Result, TepidError};
