use crate::error::{Result, TepidError};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Component, Path};

/// Logical recipe names mapped to their fragment lists.
pub type Recipes = BTreeMap<String, Recipe>;

/// An ordered, non-empty list of fragment paths that compose one document.
///
/// Fragment paths are relative to the template root and use `/` separators.
/// They double as Tera template names, so fragments reference each other
/// with `{% extends "base.html" %}` or `{% include "partials/nav.html" %}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
  fragments: Vec<String>,
  entry: usize,
}

impl Recipe {
  /// Builds a recipe from an explicit list. The last fragment is the one executed.
  ///
  /// Returns `None` for an empty list.
  pub fn new<I, S>(fragments: I) -> Option<Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let fragments: Vec<String> = fragments.into_iter().map(Into::into).collect();
    let entry = fragments.len().checked_sub(1)?;
    Some(Self { fragments, entry })
  }

  /// `[base] ++ partials ++ [page]`, executing the page.
  pub(crate) fn page(base: &str, partials: &[String], page: &str) -> Self {
    let mut fragments = Vec::with_capacity(partials.len() + 2);
    fragments.push(base.to_string());
    fragments.extend_from_slice(partials);
    fragments.push(page.to_string());
    let entry = fragments.len() - 1;
    Self { fragments, entry }
  }

  /// `[file] ++ partials`, executing the standalone file.
  pub(crate) fn standalone(file: &str, partials: &[String]) -> Self {
    let mut fragments = Vec::with_capacity(partials.len() + 1);
    fragments.push(file.to_string());
    fragments.extend_from_slice(partials);
    Self { fragments, entry: 0 }
  }

  pub fn fragments(&self) -> &[String] {
    &self.fragments
  }

  /// The fragment handed to the engine at render time.
  pub fn entry(&self) -> &str {
    &self.fragments[self.entry]
  }
}

/// Describes recipes by file role instead of listing them one by one.
///
/// All patterns are globs relative to the template root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileGroups {
  /// Must match exactly one file.
  pub base: String,
  /// Included in every recipe produced by this group.
  pub partials: Vec<String>,
  /// Each match becomes `base + partials + page`.
  pub pages: Vec<String>,
  /// Each match becomes `standalone + partials`, without the base.
  pub standalone: Vec<String>,
}

impl FileGroups {
  pub fn new(base: impl Into<String>) -> Self {
    Self {
      base: base.into(),
      ..Self::default()
    }
  }

  pub fn partials<I, S>(mut self, globs: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.partials = globs.into_iter().map(Into::into).collect();
    self
  }

  pub fn pages<I, S>(mut self, globs: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.pages = globs.into_iter().map(Into::into).collect();
    self
  }

  pub fn standalone<I, S>(mut self, globs: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.standalone = globs.into_iter().map(Into::into).collect();
    self
  }

  /// Expands every group under `root` and assembles the recipe map.
  ///
  /// Recipes are keyed by the base name of their page or standalone file.
  pub fn resolve(&self, root: &Path) -> Result<Recipes> {
    let base = expand(root, std::slice::from_ref(&self.base))?;
    let base = match base.as_slice() {
      [single] => single.clone(),
      _ => {
        return Err(TepidError::BaseCardinality {
          pattern: self.base.clone(),
          expected: 1,
          actual: base.len(),
        });
      }
    };

    let partials = expand(root, &self.partials)?;
    let pages = expand(root, &self.pages)?;
    let standalone = expand(root, &self.standalone)?;

    let mut recipes = Recipes::new();
    for file in &standalone {
      insert(&mut recipes, base_name(file), Recipe::standalone(file, &partials));
    }
    for page in &pages {
      insert(&mut recipes, base_name(page), Recipe::page(&base, &partials, page));
    }

    log::debug!(
      "Resolved {} recipes from base {:?} ({} partials)",
      recipes.len(),
      base,
      partials.len()
    );
    Ok(recipes)
  }
}

fn insert(recipes: &mut Recipes, name: String, recipe: Recipe) {
  if let Some(previous) = recipes.insert(name.clone(), recipe) {
    log::warn!(
      "Recipe {:?} defined twice, {:?} replaces {:?}",
      name,
      recipes[&name].entry(),
      previous.entry()
    );
  }
}

/// Expands patterns in order. Within one pattern the matches come out in
/// lexical path order.
fn expand(root: &Path, patterns: &[String]) -> Result<Vec<String>> {
  // An empty root means the working directory, not `/`.
  let prefix = if root.as_os_str().is_empty() {
    ".".to_string()
  } else {
    glob::Pattern::escape(&root.to_string_lossy())
  };
  let mut matched = Vec::new();

  for pattern in patterns {
    let full = format!("{}/{}", prefix.trim_end_matches('/'), pattern.trim_start_matches('/'));
    for entry in glob::glob(&full)? {
      let path = match entry {
        Ok(path) => path,
        Err(e) => {
          log::warn!("Skipping unreadable path while expanding {:?}: {}", pattern, e);
          continue;
        }
      };
      if !path.is_file() {
        continue;
      }
      if let Some(fragment) = fragment_name(root, &path) {
        matched.push(fragment);
      }
    }
  }

  Ok(matched)
}

/// Turns a matched path back into a root-relative, `/`-separated fragment path.
fn fragment_name(root: &Path, path: &Path) -> Option<String> {
  let relative = path.strip_prefix(root).ok()?;
  let parts: Vec<_> = relative
    .components()
    .filter_map(|c| match c {
      Component::Normal(part) => Some(part.to_string_lossy()),
      _ => None,
    })
    .collect();
  if parts.is_empty() {
    return None;
  }
  Some(parts.join("/"))
}

fn base_name(fragment: &str) -> String {
  fragment.rsplit('/').next().unwrap_or(fragment).to_string()
}
