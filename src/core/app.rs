use crate::core::assets::Assets;
use crate::core::config::Config;
use crate::core::recipe::{FileGroups, Recipe, Recipes};
use crate::core::reload::ReloadNotifier;
use crate::core::store::{Configurator, TemplateStore};
use crate::core::watch::ChangeWatcher;
use crate::error::{Result, TepidError};

use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tera::{Context, Tera};

/// A framework-agnostic representation of a recipe to be rendered.
///
/// It is created by the `Bakery::bake` method. Web framework integration
/// layers can then use this struct to implement their native response traits.
pub struct Template {
  pub(crate) app_state: Bakery,
  pub(crate) recipe: String,
  pub(crate) context: Context,
}

/// A pre-rendered frame watcher page. See [`Bakery::frame_page`].
#[derive(Debug, Clone)]
pub struct FramePage {
  pub(crate) body: Bytes,
}

/// A single file served from disk in development and from embedded bytes in production.
#[derive(Debug, Clone)]
pub struct SingleFile {
  pub(crate) path: PathBuf,
  pub(crate) embedded: Bytes,
  pub(crate) content_type: String,
  pub(crate) from_disk: bool,
}

impl SingleFile {
  /// The bytes to serve right now.
  pub fn load(&self) -> std::io::Result<Bytes> {
    if self.from_disk {
      std::fs::read(&self.path).map(Bytes::from)
    } else {
      Ok(self.embedded.clone())
    }
  }
}

/// Development-only state: the rendered reload script and the notifier behind the event stream.
#[derive(Debug)]
pub(crate) struct LiveReload {
  pub(crate) notifier: ReloadNotifier,
  pub(crate) script: Bytes,
}

/// The primary application state for tepid, designed to be shared across threads.
///
/// It holds the template store and all configuration. It is created using the
/// `Bakery::builder()` method and never changes afterwards, so renders take no
/// locks.
#[derive(Clone)]
pub struct Bakery {
  pub(crate) config: Arc<Config>,
  pub(crate) store: Arc<TemplateStore>,
  /// The pre-built global context, shared across all requests.
  pub(crate) global_context: Arc<Context>,
  pub(crate) configurator: Option<Configurator>,
  pub(crate) assets: Arc<Assets>,
  /// Present only in development mode.
  pub(crate) live_reload: Option<Arc<LiveReload>>,
}

impl fmt::Debug for Bakery {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Bakery")
      .field("config", &self.config)
      .field("store", &self.store)
      .field("live_reload", &self.live_reload)
      .finish_non_exhaustive()
  }
}

impl Bakery {
  /// Creates a new `BakeryBuilder` to configure and build a `Bakery` instance.
  ///
  /// This is the main entry point for using the library.
  pub fn builder(config: Config) -> BakeryBuilder {
    BakeryBuilder::new(config)
  }

  /// Renders a recipe with any serializable struct or map as data.
  ///
  /// The data must serialize to an object. Anything else fails with
  /// `ExecFailed`, just like a template that reads a missing field.
  pub fn render<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<Bytes> {
    let entry = self.store.entry(name)?;
    let context = Context::from_serialize(data).map_err(|source| TepidError::ExecFailed {
      name: name.to_string(),
      template: entry.to_string(),
      source,
    })?;
    self.render_context(name, context)
  }

  /// Renders a recipe with a ready-made context.
  ///
  /// The context is merged over the globals, so its values win.
  pub fn render_context(&self, name: &str, user_context: Context) -> Result<Bytes> {
    // 1. Start with a clone of our base globals.
    let mut final_context = (*self.global_context).clone();

    // 2. Extend it with the context the caller supplied.
    final_context.extend(user_context);

    // 3. Render into a buffer, either from the cache or from a fresh compile.
    self.store.render(name, &final_context, self.configurator.as_ref())
  }

  /// Wraps a render for an integration layer to execute when it responds.
  pub fn bake(&self, name: &str, context: Context) -> Template {
    Template {
      app_state: self.clone(),
      recipe: name.to_string(),
      context,
    }
  }

  pub fn is_dev(&self) -> bool {
    self.config.mode.is_development()
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Every registered recipe name, sorted.
  pub fn recipe_names(&self) -> Vec<&str> {
    self.store.names()
  }

  /// The live-reload notifier, or `None` in production.
  pub fn notifier(&self) -> Option<&ReloadNotifier> {
    self.live_reload.as_ref().map(|live| &live.notifier)
  }

  /// Builds a page that embeds `target_route` in an iframe alongside the reload script.
  ///
  /// Handy for static pages that are not rendered by tepid and so never get the
  /// script themselves.
  pub fn frame_page(&self, target_route: &str) -> Result<FramePage> {
    let body = self.assets.render_frame(target_route, &self.config.script_path)?;
    Ok(FramePage { body })
  }

  /// Describes a single file: read from `path` on every request in development,
  /// served from `embedded` in production.
  pub fn single_file(&self, path: impl Into<PathBuf>, embedded: &'static [u8], content_type: &str) -> SingleFile {
    SingleFile {
      path: path.into(),
      embedded: Bytes::from_static(embedded),
      content_type: content_type.to_string(),
      from_disk: self.is_dev(),
    }
  }
}

/// A builder for creating a configured `Bakery` instance.
///
/// Recipes can only be registered here. Once `build` returns, the recipe set
/// is fixed.
pub struct BakeryBuilder {
  config: Config,
  file_groups: Option<FileGroups>,
  recipes: Vec<(String, Vec<String>)>,
  globals: Context,
  tera_configurator: Option<Configurator>,
  assets: Assets,
}

impl BakeryBuilder {
  pub(crate) fn new(config: Config) -> Self {
    Self {
      config,
      file_groups: None,
      recipes: Vec::new(),
      globals: Context::new(),
      tera_configurator: None,
      assets: Assets::default(),
    }
  }

  /// Derives recipes from base/partial/page/standalone globs at build time.
  pub fn file_groups(mut self, groups: FileGroups) -> Self {
    self.file_groups = Some(groups);
    self
  }

  /// Registers a recipe from an explicit fragment list. The last fragment is executed.
  ///
  /// Explicit recipes override file-group recipes of the same name.
  pub fn add_recipe<I, S>(mut self, name: &str, fragments: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self
      .recipes
      .push((name.to_string(), fragments.into_iter().map(Into::into).collect()));
    self
  }

  /// Registers a recipe made of a shared fragment list followed by `additional` fragments.
  pub fn add_recipe_from_existing<B, I, S>(self, name: &str, base: &[B], additional: I) -> Self
  where
    B: AsRef<str>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let fragments: Vec<String> = base
      .iter()
      .map(|f| f.as_ref().to_string())
      .chain(additional.into_iter().map(Into::into))
      .collect();
    self.add_recipe(name, fragments)
  }

  /// Adds a global variable that will be available to all templates.
  ///
  /// This can be called multiple times to add multiple globals.
  pub fn add_global<S: Into<String>, T: Serialize>(mut self, key: S, value: T) -> Self {
    self.globals.insert(key.into(), &value);
    self
  }

  /// Provides a closure to run on every `Tera` instance before fragments are added.
  ///
  /// This is the escape hatch for registering custom functions, filters and
  /// testers. In development mode it runs on every render.
  pub fn configure_tera<F>(mut self, configurator: F) -> Self
  where
    F: Fn(&mut Tera) + Send + Sync + 'static,
  {
    self.tera_configurator = Some(Arc::new(configurator));
    self
  }

  /// Replaces the bundled reload script and frame wrapper.
  pub fn assets(mut self, assets: Assets) -> Self {
    self.assets = assets;
    self
  }

  /// Consumes the builder to construct the final `Bakery`.
  ///
  /// In production every recipe is compiled here and the first broken one
  /// fails the build. In development nothing is compiled yet.
  pub fn build(self) -> Result<Bakery> {
    let root = self.config.template_root.clone();

    // 1. Resolve the recipe map.
    let mut recipes = match &self.file_groups {
      Some(groups) => groups.resolve(&root)?,
      None => Recipes::new(),
    };
    for (name, fragments) in self.recipes {
      let recipe = Recipe::new(fragments).ok_or_else(|| TepidError::EmptyRecipe { name: name.clone() })?;
      if recipes.insert(name.clone(), recipe).is_some() {
        log::debug!("Explicit recipe {:?} overrides a file-group recipe", name);
      }
    }

    // 2. Build the store for the selected mode.
    let store = if self.config.mode.is_development() {
      TemplateStore::development(&root, recipes)
    } else {
      TemplateStore::production(&root, &recipes, self.tera_configurator.as_ref())?
    };

    // 3. Development only: prepare the reload script and the notifier.
    let live_reload = if self.config.mode.is_development() {
      let script = self.assets.render_reload_script(&self.config.events_path)?;
      let watcher = ChangeWatcher::new(root.clone(), self.config.watch_extensions.iter().cloned())
        .period(self.config.poll_interval());
      if !watcher.is_enabled() {
        log::info!("No watch extensions configured, live reload will never fire");
      }
      Some(Arc::new(LiveReload {
        notifier: ReloadNotifier::new(watcher),
        script,
      }))
    } else {
      None
    };

    log::info!(
      "🍞 tepid ready in {:?} mode with {} recipes from {}",
      self.config.mode,
      store.names().len(),
      root.display()
    );

    Ok(Bakery {
      config: Arc::new(self.config),
      store: Arc::new(store),
      global_context: Arc::new(self.globals),
      configurator: self.tera_configurator,
      assets: Arc::new(self.assets),
      live_reload,
    })
  }
}
