//! Generates bindings for the vellum ABI from a [`vellum_ir::Items`]
//! description.
//!
//! The Rust target writes one file holding:
//!
//! - the struct declarations;
//! - the raw `extern "C"` block in a private module;
//! - `unsafe fn` wrappers that convert between POD and wrapper forms;
//! - a `vellum_implement!` macro that checks and exports an implementation.
//!
//! The C target writes `<stem>.h` with the POD layer, and `<stem>_export.h`
//! for libraries implemented in C.
//!
//! The Python target writes `<stem>.py`, a ctypes module whose `load(path)`
//! opens the library and declares every function.
//!
//! Generation is usually driven from a build script:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let items: vellum_ir::Items = serde_json::from_str(&std::fs::read_to_string("kv.json")?)?;
//! let options = vellum_codegen::Options::new("kv").symbol_prefix("kv_");
//!
//! let out_dir = std::path::PathBuf::from(std::env::var_os("OUT_DIR").unwrap());
//! for file in vellum_codegen::generate(&items, &options)? {
//!     std::fs::write(out_dir.join(&file.name), file.contents)?;
//! }
//! # Ok(())
//! # }
//! ```
#![allow(clippy::std_instead_of_alloc, reason = "host-side generator")]
#![allow(clippy::std_instead_of_core, reason = "host-side generator")]

// -----------------------------------------------------------------------------
// Modules

mod c;
mod error;
mod manifest;
mod options;
mod python;
mod rust;
mod symbols;

// -----------------------------------------------------------------------------
// Top-level exports

pub use error::GenerateError;
pub use manifest::Manifest;
pub use options::{Options, Target};
pub use symbols::{SymbolFormat, render_symbols, symbols};

use vellum_ir::Items;

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name without directories, e.g. `kv.rs`.
    pub name: String,
    pub contents: String,
}

/// Validates `items` and renders every target selected in `options`.
pub fn generate(items: &Items, options: &Options) -> Result<Vec<GeneratedFile>, GenerateError> {
    options.check()?;
    let items = items.clone().into_validated()?;

    let mut files = Vec::new();
    for target in options.get_targets() {
        log::debug!("generating {target} bindings for `{}`", options.stem());
        match target {
            Target::Rust => files.push(GeneratedFile {
                name: format!("{}.rs", options.stem()),
                contents: rust::render(&items, options)?,
            }),
            Target::C => {
                files.push(GeneratedFile {
                    name: format!("{}.h", options.stem()),
                    contents: c::render_header(&items, options)?,
                });
                files.push(GeneratedFile {
                    name: format!("{}_export.h", options.stem()),
                    contents: c::render_export(&items, options),
                });
            }
            Target::Python => files.push(GeneratedFile {
                name: format!("{}.py", options.stem()),
                contents: python::render(&items, options)?,
            }),
        }
    }
    Ok(files)
}

/// Renders the Rust bindings only, ignoring the target list.
pub fn generate_rust(items: &Items, options: &Options) -> Result<String, GenerateError> {
    options.check()?;
    let items = items.clone().into_validated()?;
    rust::render(&items, options)
}

/// Renders `<stem>.h` only, ignoring the target list.
pub fn generate_c(items: &Items, options: &Options) -> Result<String, GenerateError> {
    options.check()?;
    let items = items.clone().into_validated()?;
    c::render_header(&items, options)
}

/// Renders `<stem>.py` only, ignoring the target list.
pub fn generate_python(items: &Items, options: &Options) -> Result<String, GenerateError> {
    options.check()?;
    let items = items.clone().into_validated()?;
    python::render(&items, options)
}
