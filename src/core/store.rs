use crate::core::recipe::{Recipe, Recipes};
use crate::error::{Result, TepidError};

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tera::{Context, Tera};
use walkdir::WalkDir;

/// A hook run on every fresh `Tera` instance before fragments are added.
pub(crate) type Configurator = Arc<dyn Fn(&mut Tera) + Send + Sync>;

/// A compiled recipe: one `Tera` instance holding every fragment, plus the
/// fragment to execute.
#[derive(Debug)]
pub(crate) struct Renderable {
  tera: Tera,
  entry: String,
}

impl Renderable {
  /// Reads each fragment from `files` (parallel to `recipe.fragments()`) and compiles them.
  pub(crate) fn compile(
    name: &str,
    recipe: &Recipe,
    files: &[PathBuf],
    configurator: Option<&Configurator>,
  ) -> Result<Self> {
    let compile_failed = |source| TepidError::CompileFailed {
      name: name.to_string(),
      source,
    };

    let mut sources = Vec::with_capacity(files.len());
    for (fragment, file) in recipe.fragments().iter().zip(files) {
      let content = std::fs::read_to_string(file).map_err(|e| {
        compile_failed(tera::Error::chain(
          format!("Unable to read fragment '{}' from {}", fragment, file.display()),
          e,
        ))
      })?;
      sources.push((fragment.as_str(), content));
    }

    let mut tera = Tera::default();
    if let Some(configure) = configurator {
      configure(&mut tera);
    }
    tera.add_raw_templates(sources).map_err(compile_failed)?;

    Ok(Self {
      tera,
      entry: recipe.entry().to_string(),
    })
  }

  /// Executes the entry fragment into a buffer. Nothing is returned on failure.
  pub(crate) fn execute(&self, name: &str, context: &Context) -> Result<Bytes> {
    match self.tera.render(&self.entry, context) {
      Ok(body) => Ok(Bytes::from(body)),
      Err(source) => Err(TepidError::ExecFailed {
        name: name.to_string(),
        template: failing_template(&source).unwrap_or_else(|| self.entry.clone()),
        source,
      }),
    }
  }
}

/// A development recipe with the on-disk location of each fragment.
#[derive(Debug)]
pub(crate) struct DevRecipe {
  recipe: Recipe,
  files: Vec<PathBuf>,
}

/// Where rendered recipes come from, depending on the mode.
pub(crate) enum TemplateStore {
  /// Compiled once, read-only afterwards.
  Production(HashMap<String, Renderable>),
  /// Recompiled from disk on every render.
  Development(HashMap<String, DevRecipe>),
}

impl fmt::Debug for TemplateStore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TemplateStore::Production(cache) => f.debug_tuple("Production").field(&cache.len()).finish(),
      TemplateStore::Development(recipes) => f.debug_tuple("Development").field(&recipes.len()).finish(),
    }
  }
}

impl TemplateStore {
  /// Compiles every recipe. The first failure aborts the whole store.
  pub(crate) fn production(root: &Path, recipes: &Recipes, configurator: Option<&Configurator>) -> Result<Self> {
    let mut cache = HashMap::with_capacity(recipes.len());
    for (name, recipe) in recipes {
      let files: Vec<PathBuf> = recipe.fragments().iter().map(|f| root.join(f)).collect();
      let renderable = Renderable::compile(name, recipe, &files, configurator)?;
      log::debug!("Compiled recipe {:?} from {} fragments", name, files.len());
      cache.insert(name.clone(), renderable);
    }
    Ok(TemplateStore::Production(cache))
  }

  /// Keeps the recipes uncompiled, with every fragment rewritten to its real path.
  pub(crate) fn development(root: &Path, recipes: Recipes) -> Self {
    let locations = discover_paths(root, &recipes);
    let store = recipes
      .into_iter()
      .map(|(name, recipe)| {
        let files = recipe
          .fragments()
          .iter()
          .map(|f| locations.get(f).cloned().unwrap_or_else(|| root.join(f)))
          .collect();
        (name, DevRecipe { recipe, files })
      })
      .collect();
    TemplateStore::Development(store)
  }

  /// The entry fragment of `name`, or `NotFound`.
  pub(crate) fn entry(&self, name: &str) -> Result<&str> {
    let entry = match self {
      TemplateStore::Production(cache) => cache.get(name).map(|r| r.entry.as_str()),
      TemplateStore::Development(recipes) => recipes.get(name).map(|d| d.recipe.entry()),
    };
    entry.ok_or_else(|| not_found(name))
  }

  pub(crate) fn render(&self, name: &str, context: &Context, configurator: Option<&Configurator>) -> Result<Bytes> {
    match self {
      TemplateStore::Production(cache) => cache.get(name).ok_or_else(|| not_found(name))?.execute(name, context),
      TemplateStore::Development(recipes) => {
        let dev = recipes.get(name).ok_or_else(|| not_found(name))?;
        Renderable::compile(name, &dev.recipe, &dev.files, configurator)?.execute(name, context)
      }
    }
  }

  pub(crate) fn names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = match self {
      TemplateStore::Production(cache) => cache.keys().map(String::as_str).collect(),
      TemplateStore::Development(recipes) => recipes.keys().map(String::as_str).collect(),
    };
    names.sort_unstable();
    names
  }
}

fn not_found(name: &str) -> TepidError {
  TepidError::NotFound { name: name.to_string() }
}

/// Maps each fragment path to a file on disk.
///
/// A fragment that exists at `root/<fragment>` resolves there, the same file
/// production compiles. Otherwise the shallowest file below `root` whose path
/// ends with the fragment, component by component, is used.
pub(crate) fn discover_paths(root: &Path, recipes: &Recipes) -> HashMap<String, PathBuf> {
  let mut files: Option<Vec<(usize, PathBuf)>> = None;

  let mut locations = HashMap::new();
  for fragment in recipes.values().flat_map(|r| r.fragments()) {
    if locations.contains_key(fragment) {
      continue;
    }

    let direct = root.join(fragment);
    let found = if direct.is_file() {
      direct
    } else {
      let files = files.get_or_insert_with(|| walk_files(root));
      let Some((_, found)) = files
        .iter()
        .filter(|(_, file)| file.ends_with(Path::new(fragment)))
        .min_by_key(|(depth, _)| *depth)
      else {
        log::warn!("Fragment {:?} not found under {}", fragment, root.display());
        continue;
      };
      found.clone()
    };
    let absolute = found.canonicalize().unwrap_or(found);
    locations.insert(fragment.clone(), absolute);
  }
  locations
}

/// Every file below `root` with its depth, in walk order.
fn walk_files(root: &Path) -> Vec<(usize, PathBuf)> {
  WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_map(|entry| match entry {
      Ok(entry) if entry.file_type().is_file() => Some((entry.depth(), entry.into_path())),
      Ok(_) => None,
      Err(e) => {
        log::debug!("Skipping entry during template discovery: {}", e);
        None
      }
    })
    .collect()
}

/// Finds the innermost template Tera blames in an error chain.
fn failing_template(err: &tera::Error) -> Option<String> {
  const IN_PARENT: &str = "error happened in '";
  const RENDERING: &str = "Failed to render '";

  let mut blamed = None;
  let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
  while let Some(e) = current {
    let message = e.to_string();
    if let Some(name) = quoted_after(&message, IN_PARENT).or_else(|| quoted_after(&message, RENDERING)) {
      blamed = Some(name);
    }
    current = e.source();
  }
  blamed
}

fn quoted_after(message: &str, marker: &str) -> Option<String> {
  let start = message.find(marker)? + marker.len();
  let len = message[start..].find('\'')?;
  Some(message[start..start + len].to_string())
}
