use std::path::PathBuf;

use thiserror::Error;
use vellum_ir::ValidationErrors;

use crate::Target;

/// Why bindings could not be generated.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerateError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error("no output target selected")]
    NoTargets,
    #[error("`{prefix}` is not a valid symbol prefix")]
    InvalidPrefix { prefix: String },
    #[error("`{name}` cannot be used as an identifier in {target} output")]
    ReservedIdentifier { name: String, target: Target },
    #[error("two different C types would both be named `{name}`")]
    TypedefCollision { name: String },
    #[error("`{path}` is not a valid Rust path")]
    InvalidPath { path: String },
    #[error("unable to read cargo manifest `{}`", path.display())]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse cargo manifest `{}`", path.display())]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },
}
