//! C output: the POD layer as a header, plus an implementation header.

use std::fmt::Write;

use vellum_ir::{Function, Items};

use crate::{GenerateError, Options};

// -----------------------------------------------------------------------------
// Modules

mod typedefs;
mod types;

use typedefs::Typedefs;
use types::Declarator;

const HEADER: &str = "/* @generated by vellum. Do not edit. */";

/// `/*! .. */`, or nothing without docs.
fn doc_block(out: &mut String, lines: &[String], indent: &str) {
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "{indent}/*!");
    for line in lines {
        let line = line.replace("*/", "* /");
        if line.is_empty() {
            let _ = writeln!(out, "{indent} *");
        } else {
            let _ = writeln!(out, "{indent} * {line}");
        }
    }
    let _ = writeln!(out, "{indent} */");
}

fn guard_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

fn macro_prefix(options: &Options) -> String {
    options.get_header_prefix().to_ascii_uppercase()
}

/// `name(args)` of `f` under `symbol`.
fn prototype(c: Declarator<'_>, f: &Function, symbol: &str) -> String {
    let params = c.params(f.args.iter().map(|arg| (&arg.ty, arg.name.as_str())));
    c.declare_return(f.returns.as_ref(), &format!("{symbol}({params})"))
}

fn begin_extern_c(out: &mut String) {
    out.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");
}

fn end_extern_c(out: &mut String) {
    out.push_str("#ifdef __cplusplus\n}\n#endif\n");
}

// -----------------------------------------------------------------------------
// <stem>.h

/// Forward declarations, typedefs, struct definitions and the extern
/// prototypes. Structs must already be in dependency order.
pub(crate) fn render_header(items: &Items, options: &Options) -> Result<String, GenerateError> {
    let c = Declarator {
        prefix: options.get_header_prefix(),
    };
    let abi = format!("{}_ABI", macro_prefix(options));
    let guard = format!("{}_H", guard_name(options.stem()));
    let mut out = String::new();

    let _ = writeln!(out, "{HEADER}\n#ifndef {guard}\n#define {guard}\n");
    out.push_str("#include <stdbool.h>\n#include <stddef.h>\n#include <stdint.h>\n\n");

    let p = macro_prefix(options);
    let _ = writeln!(
        out,
        "#ifndef {abi}\n\
         #  if !defined({p}_SHARED)\n\
         #    define {abi}\n\
         #  elif defined(_WIN32) || defined(__CYGWIN__)\n\
         #    if defined({p}_EXPORTS)\n\
         #      define {abi} __declspec(dllexport)\n\
         #    else\n\
         #      define {abi} __declspec(dllimport)\n\
         #    endif\n\
         #  else\n\
         #    define {abi} __attribute__((visibility(\"default\")))\n\
         #  endif\n\
         #endif\n"
    );
    begin_extern_c(&mut out);

    let mut declared = false;
    for name in items.abstract_structs.iter().map(|s| &s.name).chain(items.structs.iter().map(|s| &s.name)) {
        let _ = writeln!(out, "struct {name};");
        declared = true;
    }
    if declared {
        out.push('\n');
    }

    for def in Typedefs::collect(items, c)?.iter() {
        let _ = writeln!(out, "{def}\n");
    }

    for s in &items.structs {
        doc_block(&mut out, &s.docs, "");
        let _ = writeln!(out, "struct {} {{", s.name);
        for field in &s.fields {
            doc_block(&mut out, &field.docs, "    ");
            let _ = writeln!(out, "    {};", c.declare(&field.ty, &field.name));
        }
        out.push_str("};\n\n");
    }

    for f in &items.functions {
        doc_block(&mut out, &f.docs, "");
        let _ = writeln!(out, "{abi} {};\n", prototype(c, f, &options.symbol(&f.name)));
    }

    end_extern_c(&mut out);
    let _ = writeln!(out, "\n#endif /* {guard} */");
    Ok(out)
}

// -----------------------------------------------------------------------------
// <stem>_export.h

/// Included by exactly one translation unit of a C implementation. It
/// declares `<prefix>_export_<name>` for the library to define and exports
/// each symbol as a call to it.
pub(crate) fn render_export(items: &Items, options: &Options) -> String {
    let c = Declarator {
        prefix: options.get_header_prefix(),
    };
    let p = macro_prefix(options);
    let guard = format!("{}_EXPORT_H", guard_name(options.stem()));
    let mut out = String::new();

    let _ = writeln!(out, "{HEADER}\n#ifndef {guard}\n#define {guard}\n");
    let _ = writeln!(
        out,
        "#ifndef {p}_EXPORTS\n#define {p}_EXPORTS\n#endif\n#include \"{}.h\"\n",
        options.stem()
    );
    begin_extern_c(&mut out);

    let implementation = |f: &Function| format!("{}_export_{}", options.get_header_prefix(), f.name);

    for f in &items.functions {
        let _ = writeln!(out, "{};", prototype(c, f, &implementation(f)));
    }
    out.push('\n');

    for f in &items.functions {
        let args: Vec<&str> = f.args.iter().map(|arg| arg.name.as_str()).collect();
        let call = format!("{}({})", implementation(f), args.join(", "));
        let body = match f.returns {
            Some(_) => format!("return {call};"),
            None => format!("{call};"),
        };
        let _ = writeln!(
            out,
            "{p}_ABI {} {{\n    {body}\n}}\n",
            prototype(c, f, &options.symbol(&f.name))
        );
    }

    end_extern_c(&mut out);
    let _ = writeln!(out, "\n#endif /* {guard} */");
    out
}
