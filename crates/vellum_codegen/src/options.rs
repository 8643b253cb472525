use core::fmt;
use core::str::FromStr;

use crate::GenerateError;

// -----------------------------------------------------------------------------
// Target

/// An output language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    /// `<stem>.rs`: POD and wrapper layers plus the `vellum_implement!` macro.
    Rust,
    /// `<stem>.h` and `<stem>_export.h`: POD layer only.
    C,
    /// `<stem>.py`: ctypes layouts and a `load` function.
    Python,
}

impl Target {
    pub const ALL: [Target; 3] = [Self::Rust, Self::C, Self::Python];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::C => "c",
            Self::Python => "python",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown target `{s}`, expected `rust`, `c` or `python`"))
    }
}

// -----------------------------------------------------------------------------
// Options

/// Generator settings.
///
/// ```
/// use vellum_codegen::{Options, Target};
///
/// let options = Options::new("kv")
///     .target(Target::C)
///     .link_name("kv")
///     .symbol_prefix("kv_");
///
/// assert_eq!(options.get_targets(), [Target::Rust, Target::C]);
/// assert_eq!(options.symbol("get"), "kv_get");
/// assert_eq!(options.get_header_prefix(), "kv");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    stem: String,
    targets: Vec<Target>,
    link_name: Option<String>,
    symbol_prefix: String,
    header_prefix: Option<String>,
    runtime_path: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self::new("bindings")
    }
}

impl Options {
    /// Rust output only, named after `stem`.
    pub fn new(stem: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            targets: vec![Target::Rust],
            link_name: None,
            symbol_prefix: String::new(),
            header_prefix: None,
            runtime_path: None,
        }
    }

    /// Adds an output target. Duplicates are ignored.
    pub fn target(mut self, target: Target) -> Self {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
        self
    }

    /// Replaces the target list.
    pub fn targets(mut self, targets: impl IntoIterator<Item = Target>) -> Self {
        self.targets.clear();
        for target in targets {
            self = self.target(target);
        }
        self
    }

    /// Library name used by the Rust import annotation
    /// (`#[link(name = .., kind = "dylib")]`). Without one, linking is left
    /// to the build.
    pub fn link_name(mut self, name: impl Into<String>) -> Self {
        self.link_name = Some(name.into());
        self
    }

    /// Prepended to every exported symbol.
    pub fn symbol_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.symbol_prefix = prefix.into();
        self
    }

    /// Prefix of the C macros and typedefs. Defaults to the symbol prefix
    /// without its trailing `_`, or `vellum`.
    pub fn header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = Some(prefix.into());
        self
    }

    /// Path of the runtime crate in the generated Rust, e.g. `::vellum::abi`.
    /// When unset it is looked up in the invoking crate's `Cargo.toml`.
    pub fn runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = Some(path.into());
        self
    }

    // -------------------------------------------------------------------------
    // Accessors

    #[inline]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    #[inline]
    pub fn get_targets(&self) -> &[Target] {
        &self.targets
    }

    #[inline]
    pub fn get_link_name(&self) -> Option<&str> {
        self.link_name.as_deref()
    }

    #[inline]
    pub fn get_symbol_prefix(&self) -> &str {
        &self.symbol_prefix
    }

    #[inline]
    pub fn get_runtime_path(&self) -> Option<&str> {
        self.runtime_path.as_deref()
    }

    /// The resolved C prefix, see [`header_prefix`](Self::header_prefix).
    pub fn get_header_prefix(&self) -> &str {
        if let Some(prefix) = &self.header_prefix {
            return prefix;
        }
        match self.symbol_prefix.trim_end_matches('_') {
            "" => "vellum",
            prefix => prefix,
        }
    }

    /// The exported symbol of the function `name`.
    #[inline]
    pub fn symbol(&self, name: &str) -> String {
        format!("{}{name}", self.symbol_prefix)
    }

    pub(crate) fn check(&self) -> Result<(), GenerateError> {
        if self.targets.is_empty() {
            return Err(GenerateError::NoTargets);
        }
        let valid = |s: &str| s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid(&self.symbol_prefix) || self.symbol_prefix.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(GenerateError::InvalidPrefix {
                prefix: self.symbol_prefix.clone(),
            });
        }
        let header = self.get_header_prefix();
        if header.is_empty() || !valid(header) || header.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(GenerateError::InvalidPrefix {
                prefix: header.to_owned(),
            });
        }
        Ok(())
    }
}
