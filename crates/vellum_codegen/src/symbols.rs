use core::fmt;
use core::str::FromStr;

use vellum_ir::Items;

use crate::Options;

/// How [`render_symbols`] lays out the exported names.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFormat {
    /// One symbol per line.
    #[default]
    List,
    /// A GNU ld version script exporting the symbols and hiding the rest.
    GnuVersionScript,
}

impl SymbolFormat {
    pub const fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::GnuVersionScript => "gnu-version-script",
        }
    }
}

impl fmt::Display for SymbolFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SymbolFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::List, Self::GnuVersionScript]
            .into_iter()
            .find(|format| format.name() == s)
            .ok_or_else(|| format!("unknown symbol format `{s}`"))
    }
}

/// The exported symbol of every function, in declaration order.
pub fn symbols(items: &Items, options: &Options) -> Vec<String> {
    items.functions.iter().map(|f| options.symbol(&f.name)).collect()
}

/// ```
/// use vellum_codegen::{Options, SymbolFormat, render_symbols};
/// use vellum_ir::{Function, Items};
///
/// let items = Items {
///     functions: vec![Function::new("get"), Function::new("set")],
///     ..Items::default()
/// };
/// let options = Options::default().symbol_prefix("kv_");
///
/// assert_eq!(render_symbols(&items, &options, SymbolFormat::List), "kv_get\nkv_set\n");
/// assert_eq!(
///     render_symbols(&items, &options, SymbolFormat::GnuVersionScript),
///     "{\n  global:\n    kv_get;\n    kv_set;\n  local: *;\n};\n",
/// );
/// ```
pub fn render_symbols(items: &Items, options: &Options, format: SymbolFormat) -> String {
    let symbols = symbols(items, options);
    match format {
        SymbolFormat::List => symbols.iter().map(|s| format!("{s}\n")).collect(),
        SymbolFormat::GnuVersionScript => {
            let mut out = String::from("{\n  global:\n");
            for symbol in &symbols {
                out.push_str("    ");
                out.push_str(symbol);
                out.push_str(";\n");
            }
            out.push_str("  local: *;\n};\n");
            out
        }
    }
}
