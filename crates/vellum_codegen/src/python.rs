//! Python output: a ctypes module with every struct layout and a `load`
//! function that declares each symbol on a loaded library.
//!
//! The module is self-contained. Its prelude defines the `Slice`, `OwnedPtr`,
//! `OwnedSlice` and `Closure` class factories; each is cached, so one
//! instantiation always yields the same class.

use std::fmt::Write;

use vellum_ir::{FnSignature, Items, Primitive, Type};

use crate::{GenerateError, Options, Target};

const HEADER: &str = "# @generated by vellum. Do not edit.";

const PRELUDE: &str = r#"import ctypes as ct
import functools


class _Owner:
    """Runs the deleter when an owning value is collected.

    Views into another buffer (struct fields, slice elements) never free.
    """

    def release(self):
        """Returns a copy to pass to a function that takes ownership, leaving
        this value empty."""
        raw = type(self).from_buffer_copy(self)
        raw._owner = False
        keep = getattr(self, "_keep", None)
        if keep is not None:
            raw._keep = keep
        ct.memset(ct.addressof(self), 0, ct.sizeof(self))
        return raw

    def __del__(self):
        if self._b_base_ is None and getattr(self, "_owner", True):
            self.free()


@functools.cache
def Slice(element):
    """A borrowed `{data, len}` view of `element` values."""
    pointer = ct.POINTER(element)

    class Slice(ct.Structure):
        _fields_ = [("data", pointer), ("len", ct.c_size_t)]

        def __len__(self):
            return int(self.len)

        def __getitem__(self, index):
            if not 0 <= index < len(self):
                raise IndexError(index)
            return self.data[index]

        def __iter__(self):
            for index in range(len(self)):
                yield self.data[index]

    return Slice


@functools.cache
def OwnedPtr(element):
    """One `element` and the deleter that frees it."""
    pointer = ct.POINTER(element)

    class OwnedPtr(_Owner, ct.Structure):
        _fields_ = [("data", pointer), ("deleter", ct.CFUNCTYPE(None, pointer))]

        def free(self):
            if self.data and self.deleter:
                self.deleter(self.data)
            ct.memset(ct.addressof(self), 0, ct.sizeof(self))

    return OwnedPtr


@functools.cache
def OwnedSlice(element):
    """A block of `element` values and the deleter that frees it."""
    view = Slice(element)

    class OwnedSlice(_Owner, ct.Structure):
        _fields_ = [("slice", view), ("deleter", ct.CFUNCTYPE(None, view))]

        def __len__(self):
            return len(self.slice)

        def __getitem__(self, index):
            return self.slice[index]

        def __iter__(self):
            return iter(self.slice)

        def free(self):
            if self.slice.data and self.deleter:
                self.deleter(self.slice)
            ct.memset(ct.addressof(self), 0, ct.sizeof(self))

    return OwnedSlice


@functools.cache
def Closure(restype, *argtypes):
    """A `{caller, state, deleter}` callable."""
    caller = ct.CFUNCTYPE(restype, ct.c_void_p, *argtypes)
    deleter = ct.CFUNCTYPE(None, ct.c_void_p)

    class Closure(_Owner, ct.Structure):
        _fields_ = [("caller", caller), ("state", ct.c_void_p), ("deleter", deleter)]

        @classmethod
        def wrap(cls, function):
            """Wraps a Python callable, with no state and no deleter.

            Keep the result alive for as long as it may be called.
            """
            trampoline = caller(lambda _state, *args: function(*args))
            closure = cls(trampoline, None, deleter())
            closure._keep = trampoline
            return closure

        def __call__(self, *args):
            if not self.caller:
                raise ValueError("call through an empty closure")
            return self.caller(self.state, *args)

        def free(self):
            if self.deleter:
                self.deleter(self.state)
            ct.memset(ct.addressof(self), 0, ct.sizeof(self))

    return Closure


def _declare(lib, name, argtypes, restype):
    function = getattr(lib, name)
    function.argtypes = argtypes
    function.restype = restype
"#;

/// Python keywords, plus the names the prelude defines.
const RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield", "ct", "functools", "load", "Slice", "OwnedPtr", "OwnedSlice",
    "Closure", "_Owner", "_declare",
];

fn class_name(name: &str) -> Result<&str, GenerateError> {
    if RESERVED.contains(&name) {
        return Err(GenerateError::ReservedIdentifier {
            name: name.to_owned(),
            target: Target::Python,
        });
    }
    Ok(name)
}

// -----------------------------------------------------------------------------
// Types

fn primitive(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Bool => "ct.c_bool",
        Primitive::I8 => "ct.c_int8",
        Primitive::I16 => "ct.c_int16",
        Primitive::I32 => "ct.c_int32",
        Primitive::I64 => "ct.c_int64",
        Primitive::Isize => "ct.c_ssize_t",
        Primitive::U8 => "ct.c_uint8",
        Primitive::U16 => "ct.c_uint16",
        Primitive::U32 => "ct.c_uint32",
        Primitive::U64 => "ct.c_uint64",
        Primitive::Usize => "ct.c_size_t",
        Primitive::F32 => "ct.c_float",
        Primitive::F64 => "ct.c_double",
    }
}

/// The ctypes expression for `ty`. ctypes has no constness, so mutability
/// is dropped.
pub(crate) fn ctype(ty: &Type) -> String {
    match ty {
        Type::Primitive(p) => primitive(*p).to_owned(),
        Type::Named(name) => name.clone(),
        Type::Pointer { pointee, .. } => format!("ct.POINTER({})", ctype(pointee)),
        Type::String { .. } => "ct.c_char_p".to_owned(),
        Type::Slice { element, .. } => format!("Slice({})", ctype(element)),
        Type::Owned(inner) => match &**inner {
            Type::Pointer { pointee, .. } => format!("OwnedPtr({})", ctype(pointee)),
            Type::Slice { element, .. } => format!("OwnedSlice({})", ctype(element)),
            other => ctype(other),
        },
        Type::Function(sig) => format!("ct.CFUNCTYPE({})", signature(sig)),
        Type::Closure(sig) => format!("Closure({})", signature(sig)),
        Type::Array { element, len } => format!("({} * {len})", ctype(element)),
    }
}

fn restype(ty: Option<&Type>) -> String {
    ty.map_or_else(|| "None".to_owned(), ctype)
}

/// `restype, arg, ..`
fn signature(sig: &FnSignature) -> String {
    let mut parts = vec![restype(sig.returns.as_deref())];
    parts.extend(sig.args.iter().map(ctype));
    parts.join(", ")
}

// -----------------------------------------------------------------------------
// Module

fn docstring(out: &mut String, lines: &[String], indent: &str) {
    let lines: Vec<String> = lines
        .iter()
        .map(|line| line.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\""))
        .collect();
    match lines.as_slice() {
        [] => {}
        [single] => {
            let _ = writeln!(out, "{indent}\"\"\"{single}\"\"\"");
        }
        [first, rest @ ..] => {
            let _ = writeln!(out, "{indent}\"\"\"{first}");
            for line in rest {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    let _ = writeln!(out, "{indent}{line}");
                }
            }
            let _ = writeln!(out, "{indent}\"\"\"");
        }
    }
}

fn class(out: &mut String, name: &str, docs: &[String]) {
    let _ = writeln!(out, "\n\nclass {name}(ct.Structure):");
    if docs.is_empty() {
        out.push_str("    pass\n");
    } else {
        docstring(out, docs, "    ");
    }
}

/// The module for validated `items`. Structs must already be in dependency
/// order.
pub(crate) fn render(items: &Items, options: &Options) -> Result<String, GenerateError> {
    let mut out = String::new();
    let _ = writeln!(out, "{HEADER}\n\"\"\"ctypes bindings for `{}`.\"\"\"\n", options.stem());
    out.push_str(PRELUDE);

    // Every class exists before any layout is set, so pointers may refer
    // forward.
    for s in &items.abstract_structs {
        let mut docs = s.docs.clone();
        if !docs.is_empty() {
            docs.push(String::new());
        }
        docs.push("Opaque type; only used behind pointers.".to_owned());
        class(&mut out, class_name(&s.name)?, &docs);
    }
    for s in &items.structs {
        let mut docs = s.docs.clone();
        let documented: Vec<_> = s.fields.iter().filter(|field| !field.docs.is_empty()).collect();
        if !documented.is_empty() {
            if !docs.is_empty() {
                docs.push(String::new());
            }
            docs.push("Fields:".to_owned());
            for field in documented {
                let mut lines = field.docs.iter();
                if let Some(first) = lines.next() {
                    docs.push(format!("- {}: {first}", field.name));
                }
                docs.extend(lines.map(|line| format!("  {line}")));
            }
        }
        class(&mut out, class_name(&s.name)?, &docs);
    }

    for s in &items.structs {
        let _ = write!(out, "\n\n{}._fields_ = [", s.name);
        if s.fields.is_empty() {
            out.push_str("]\n");
            continue;
        }
        out.push('\n');
        for field in &s.fields {
            let _ = writeln!(out, "    (\"{}\", {}),", field.name, ctype(&field.ty));
        }
        out.push_str("]\n");
    }

    let mut docs = vec!["Loads the shared library at `path` and declares its functions.".to_owned()];
    if !items.functions.is_empty() {
        docs.push(String::new());
        docs.push("Functions:".to_owned());
        for f in &items.functions {
            docs.push(String::new());
            docs.push(format!("- {}", options.symbol(&f.name)));
            docs.extend(f.docs.iter().map(|line| format!("  {line}")));
        }
    }
    out.push_str("\n\ndef load(path):\n");
    docstring(&mut out, &docs, "    ");
    out.push_str("    lib = ct.CDLL(path)\n");
    for f in &items.functions {
        log::trace!("ctypes declaration `{}`", f.name);
        let args: Vec<String> = f.args.iter().map(|arg| ctype(&arg.ty)).collect();
        let _ = writeln!(
            out,
            "    _declare(lib, \"{}\", [{}], {})",
            options.symbol(&f.name),
            args.join(", "),
            restype(f.returns.as_ref()),
        );
    }
    out.push_str("    return lib\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use vellum_ir::{AbstractStruct, Function, Items, Mutability, Primitive, Struct, Type};

    use super::{ctype, render};
    use crate::{GenerateError, Options, Target};

    #[test]
    fn type_mapping() {
        let node = Type::named("Node");
        assert_eq!(ctype(&Type::pointer(Mutability::Const, Primitive::U8.into())), "ct.POINTER(ct.c_uint8)");
        assert_eq!(ctype(&Type::string(Mutability::Mut)), "ct.c_char_p");
        assert_eq!(ctype(&Type::slice(Mutability::Const, node.clone())), "Slice(Node)");
        assert_eq!(ctype(&Type::owned(Type::pointer(Mutability::Mut, node.clone()))), "OwnedPtr(Node)");
        assert_eq!(ctype(&Type::owned(Type::slice(Mutability::Mut, node))), "OwnedSlice(Node)");
        assert_eq!(
            ctype(&Type::function([Primitive::I32.into()], Some(Primitive::Bool.into()))),
            "ct.CFUNCTYPE(ct.c_bool, ct.c_int32)"
        );
        assert_eq!(
            ctype(&Type::closure([Type::string(Mutability::Const)], None)),
            "Closure(None, ct.c_char_p)"
        );
        assert_eq!(ctype(&Type::array(Primitive::F64.into(), 3)), "(ct.c_double * 3)");
    }

    #[test]
    fn classes_come_before_layouts() {
        let items = Items {
            structs: vec![
                Struct::new("Node")
                    .doc("A list node.")
                    .field("next", Type::pointer(Mutability::Mut, Type::named("Node")))
                    .field("value", Primitive::I64.into()),
            ],
            abstract_structs: vec![AbstractStruct::new("List")],
            functions: vec![
                Function::new("head")
                    .doc("The first node, or null.")
                    .arg("list", Type::pointer(Mutability::Const, Type::named("List")))
                    .returns(Type::pointer(Mutability::Mut, Type::named("Node"))),
            ],
        };
        let out = render(&items, &Options::new("list").symbol_prefix("ls_")).unwrap();

        assert!(out.starts_with("# @generated by vellum"));
        assert!(out.contains("class List(ct.Structure):\n    \"\"\"Opaque type; only used behind pointers.\"\"\"\n"));
        assert!(out.contains("class Node(ct.Structure):\n    \"\"\"A list node.\"\"\"\n"));
        assert!(out.contains(
            "Node._fields_ = [\n    (\"next\", ct.POINTER(Node)),\n    (\"value\", ct.c_int64),\n]\n"
        ));
        assert!(out.find("class Node").unwrap() < out.find("Node._fields_").unwrap());
        assert!(out.contains("    - ls_head\n      The first node, or null.\n"));
        assert!(out.contains(
            "    _declare(lib, \"ls_head\", [ct.POINTER(List)], ct.POINTER(Node))\n    return lib\n"
        ));
    }

    #[test]
    fn python_keywords_are_rejected() {
        let items = Items {
            abstract_structs: vec![AbstractStruct::new("lambda")],
            ..Items::default()
        };
        let err = render(&items, &Options::default()).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::ReservedIdentifier {
                target: Target::Python,
                ..
            }
        ));
        assert_eq!(err.to_string(), "`lambda` cannot be used as an identifier in python output");
    }

    #[test]
    fn docstrings_cannot_close_early() {
        let items = Items {
            structs: vec![Struct::new("Quote").doc("says \"\"\" and \\ too").doc("second line")],
            ..Items::default()
        };
        let out = render(&items, &Options::default()).unwrap();
        assert!(out.contains("    \"\"\"says \\\"\\\"\\\" and \\\\ too\n    second line\n    \"\"\"\n"));
        assert!(out.contains("Quote._fields_ = []\n"));
    }
}
