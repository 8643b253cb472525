//! Rust output: declarations, wrappers and the implement macro in one file
//! meant to be `include!`d.

use proc_macro2::TokenStream;
use vellum_ir::Items;

use crate::manifest::{RUNTIME_CRATE, default_path};
use crate::{GenerateError, Manifest, Options};

// -----------------------------------------------------------------------------
// Modules

mod functions;
mod items;
mod path;
mod types;

pub(crate) const HEADER: &str = "// @generated by vellum. Do not edit.";

/// Renders validated `items`. Structs must already be in dependency order.
pub(crate) fn render(items: &Items, options: &Options) -> Result<String, GenerateError> {
    let rt = runtime_path(options)?;
    log::debug!("runtime crate resolved to `{}`", quote::quote!(#rt));

    let mut parts: Vec<TokenStream> = Vec::new();
    for item in &items.abstract_structs {
        parts.push(items::abstract_struct(item)?);
    }
    for item in &items.structs {
        parts.push(items::complete_struct(item, &rt)?);
    }
    parts.push(functions::abi_module(&items.functions, &rt, options)?);
    for f in &items.functions {
        log::trace!("wrapper `{}`", f.name);
        parts.push(functions::wrapper(f, &rt, options)?);
    }
    parts.push(functions::implement_macro(&items.functions, &rt, options)?);

    let mut out = String::from(HEADER);
    out.push('\n');
    for part in parts {
        out.push('\n');
        out.push_str(&part.to_string());
        out.push('\n');
    }
    Ok(out)
}

/// An explicit path from the options, else the one found in the invoking
/// crate's manifest, else `::vellum_abi`.
fn runtime_path(options: &Options) -> Result<syn::Path, GenerateError> {
    if let Some(path) = options.get_runtime_path() {
        return syn::parse_str(path).map_err(|_| GenerateError::InvalidPath {
            path: path.to_owned(),
        });
    }
    Ok(Manifest::shared(Manifest::runtime_path)?.unwrap_or_else(|| default_path(RUNTIME_CRATE)))
}

#[cfg(test)]
mod tests {
    use vellum_ir::{AbstractStruct, Function, Items, Mutability, Struct, Type};

    use super::render;
    use crate::{GenerateError, Options};

    fn items() -> Items {
        Items {
            structs: vec![
                Struct::new("Outer").field("inner", Type::named("Inner")),
                Struct::new("Inner").field("store", Type::pointer(Mutability::Mut, Type::named("Store"))),
            ],
            abstract_structs: vec![AbstractStruct::new("Store")],
            functions: vec![Function::new("touch").arg("outer", Type::named("Outer"))],
        }
        .into_validated()
        .unwrap()
    }

    #[test]
    fn sections_come_in_order() {
        let out = render(&items(), &Options::new("t").runtime_path("::vellum::abi")).unwrap();
        assert!(out.starts_with("// @generated"));

        let at = |needle: &str| out.find(needle).unwrap();
        assert!(at("pub struct Store") < at("pub struct Inner"));
        assert!(at("pub struct Inner") < at("pub struct Outer"));
        assert!(at("pub struct Outer") < at("mod __vellum_private_abi"));
        assert!(at("mod __vellum_private_abi") < at("pub unsafe fn touch"));
        assert!(at("pub unsafe fn touch") < at("macro_rules ! vellum_implement"));
        assert!(out.contains(":: vellum :: abi :: guard"));
    }

    #[test]
    fn bad_runtime_path_is_rejected() {
        let err = render(&items(), &Options::new("t").runtime_path("not a path")).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidPath { .. }));
    }
}
