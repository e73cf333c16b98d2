use thiserror::Error;

/// A specialized `Result` type for `tepid` operations.
pub type Result<T, E = TepidError> = std::result::Result<T, E>;

/// The primary error type for all `tepid` operations.
///
/// Configuration errors (`Pattern`, `BaseCardinality`, `EmptyRecipe`, `Asset`)
/// are raised while building a [`Bakery`](crate::Bakery). The remaining variants
/// are per-request render failures.
#[derive(Debug, Error)]
pub enum TepidError {
  /// A glob pattern in a file group could not be parsed.
  #[error("Invalid glob pattern: {0}")]
  Pattern(#[from] glob::PatternError),

  /// The base pattern of a file group did not match exactly one file.
  #[error("Base glob {pattern:?} must match exactly {expected} file, got {actual}")]
  BaseCardinality {
    pattern: String,
    expected: usize,
    actual: usize,
  },

  /// A recipe was registered without any fragments.
  #[error("Recipe {name:?} has no fragments")]
  EmptyRecipe { name: String },

  /// No recipe is registered under the requested name.
  #[error("Recipe {name:?} not found")]
  NotFound { name: String },

  /// Reading or parsing the fragments of a recipe failed.
  #[error("Failed to compile recipe {name:?}: {source}")]
  CompileFailed {
    name: String,
    #[source]
    source: tera::Error,
  },

  /// The recipe compiled, but executing it failed (usually a data shape mismatch).
  #[error("Failed to render recipe {name:?} in template {template:?}: {source}")]
  ExecFailed {
    name: String,
    template: String,
    #[source]
    source: tera::Error,
  },

  /// One of the built-in development assets failed to render.
  #[error("Asset rendering error: {0}")]
  Asset(#[source] tera::Error),
}
