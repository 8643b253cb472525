use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table, TableLike};

use crate::GenerateError;

/// The `Cargo.toml` of the crate that will compile the generated Rust.
///
/// Generated bindings name the runtime crate by an absolute path, and that
/// path depends on how the consuming crate pulls the runtime in.
///
/// # Resolution rules
///
/// 1. If `vellum_abi` is listed in `dependencies`, return `::vellum_abi`
///    (or `::alias` when it is renamed with `package = "vellum_abi"`).
/// 2. If the facade `vellum` is listed instead, return `::vellum::abi`.
/// 3. Repeat steps 1-2 in `dev-dependencies`.
/// 4. Otherwise, fall back to `::vellum_abi`.
///
/// ```
/// # use vellum_codegen::Manifest;
/// let manifest = Manifest::parse(r#"
///     [dependencies]
///     vellum = "0.1"
/// "#).unwrap();
///
/// let path = manifest.runtime_path();
/// assert_eq!(quote::quote!(#path).to_string(), ":: vellum :: abi");
/// ```
#[derive(Debug)]
pub struct Manifest {
    manifest: Document<Box<str>>,
    modified_time: Option<SystemTime>,
}

pub(crate) const RUNTIME_CRATE: &str = "vellum_abi";
const FACADE_CRATE: &str = "vellum";
const FACADE_PREFIX: &str = "vellum_";

impl Manifest {
    /// Parses manifest text.
    pub fn parse(text: &str) -> Result<Self, GenerateError> {
        Self::parse_at(text.into(), Path::new("Cargo.toml"), None)
    }

    /// Reads and parses the manifest at `path`.
    pub fn read(path: &Path) -> Result<Self, GenerateError> {
        let read_error = |source| GenerateError::ReadManifest {
            path: path.to_owned(),
            source,
        };
        let modified_time = Self::modified_time(path).map_err(read_error)?;
        let text = std::fs::read_to_string(path).map_err(read_error)?;
        Self::parse_at(text.into_boxed_str(), path, Some(modified_time))
    }

    fn parse_at(
        text: Box<str>,
        path: &Path,
        modified_time: Option<SystemTime>,
    ) -> Result<Self, GenerateError> {
        let manifest = Document::parse(text).map_err(|source| GenerateError::ParseManifest {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self {
            manifest,
            modified_time,
        })
    }

    // `Cargo.toml` of the crate being built, if running under cargo.
    #[inline(never)]
    fn manifest_path() -> Option<PathBuf> {
        let mut path = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR")?);
        path.push("Cargo.toml");
        Some(path)
    }

    #[inline(never)]
    fn modified_time(path: &Path) -> Result<SystemTime, std::io::Error> {
        std::fs::metadata(path).and_then(|metadata| metadata.modified())
    }

    fn find_in_deps(deps: &dyn TableLike, name: &str) -> Option<String> {
        if deps.contains_key(name) {
            return Some(format!("::{name}"));
        }

        // `alias = { package = "name", .. }`
        for (key, item) in deps.iter() {
            let package = item
                .as_table_like()
                .and_then(|table| table.get("package"))
                .and_then(Item::as_str);
            if package == Some(name) {
                return Some(format!("::{}", key.replace('-', "_")));
            }
        }

        if let Some(module) = name.strip_prefix(FACADE_PREFIX)
            && deps.contains_key(FACADE_CRATE)
        {
            return Some(format!("::{FACADE_CRATE}::{module}"));
        }
        None
    }

    fn dependency_table(&self, key: &str) -> Option<&dyn TableLike> {
        match self.manifest.get(key)? {
            Item::Table(table) => Some(table as &Table as &dyn TableLike),
            item => item.as_table_like(),
        }
    }

    /// Path of the crate `name` as seen from this manifest's crate.
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        let found = ["dependencies", "dev-dependencies"]
            .into_iter()
            .filter_map(|key| self.dependency_table(key))
            .find_map(|deps| Self::find_in_deps(deps, name));

        found
            .and_then(|path| syn::parse_str(&path).ok())
            .unwrap_or_else(|| default_path(name))
    }

    /// Path of the runtime crate, see the resolution rules above.
    #[inline]
    pub fn runtime_path(&self) -> syn::Path {
        self.get_crate_path(RUNTIME_CRATE)
    }

    /// Runs `func` on the manifest of the crate currently being built.
    ///
    /// Returns `Ok(None)` outside of cargo (`CARGO_MANIFEST_DIR` unset).
    /// Manifests are cached per path and re-read when they change on disk.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> Result<Option<R>, GenerateError> {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let Some(manifest_path) = Self::manifest_path() else {
            return Ok(None);
        };
        let modified_time = Self::modified_time(&manifest_path).ok();

        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);

        if let Some(manifest) = manifests.get(&manifest_path)
            && modified_time.is_some()
            && manifest.modified_time == modified_time
        {
            return Ok(Some(func(manifest)));
        }

        drop(manifests);

        log::debug!("reading {}", manifest_path.display());
        let manifest = Self::read(&manifest_path)?;
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(manifest_path, manifest);

        Ok(Some(result))
    }
}

/// `::name`, falling back to the runtime crate if `name` is not an identifier.
pub(crate) fn default_path(name: &str) -> syn::Path {
    let ident = syn::parse_str::<syn::Ident>(name)
        .unwrap_or_else(|_| syn::Ident::new(RUNTIME_CRATE, proc_macro2::Span::call_site()));
    syn::Path {
        leading_colon: Some(Default::default()),
        segments: [syn::PathSegment::from(ident)].into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use quote::ToTokens;

    use super::Manifest;

    fn runtime(text: &str) -> String {
        Manifest::parse(text).unwrap().runtime_path().to_token_stream().to_string()
    }

    #[test]
    fn direct_dependency() {
        assert_eq!(runtime("[dependencies]\nvellum_abi = \"0.1\"\n"), ":: vellum_abi");
    }

    #[test]
    fn facade_dependency() {
        assert_eq!(
            runtime("[dependencies]\nvellum = { version = \"0.1\" }\n"),
            ":: vellum :: abi"
        );
    }

    #[test]
    fn renamed_dependency() {
        assert_eq!(
            runtime("[dependencies]\nabi-rt = { package = \"vellum_abi\", version = \"0.1\" }\n"),
            ":: abi_rt"
        );
    }

    #[test]
    fn dev_dependency_and_fallback() {
        assert_eq!(runtime("[dev-dependencies]\nvellum_abi = \"0.1\"\n"), ":: vellum_abi");
        assert_eq!(runtime("[package]\nname = \"x\"\n"), ":: vellum_abi");
    }

    #[test]
    fn dotted_dependency_table() {
        assert_eq!(runtime("dependencies.vellum.version = \"0.1\"\n"), ":: vellum :: abi");
    }

    #[test]
    fn invalid_manifest_is_an_error() {
        assert!(Manifest::parse("[dependencies").is_err());
    }
}
