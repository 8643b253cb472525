use std::collections::BTreeMap;

use vellum_ir::{FnSignature, Items, Mutability, Type};

use super::types::Declarator;
use crate::GenerateError;

/// The concrete typedefs a header needs, dependencies first.
#[derive(Debug, Default)]
pub(crate) struct Typedefs {
    /// Typedef name to the C type it spells.
    seen: BTreeMap<String, Type>,
    defs: Vec<String>,
    collision: Option<String>,
}

impl Typedefs {
    /// Every typedef used by a struct field or function of `items`.
    ///
    /// Fails when two different C types would get the same typedef name,
    /// e.g. a struct named `u8_ptr` next to `*mut u8`.
    pub(crate) fn collect(items: &Items, c: Declarator<'_>) -> Result<Self, GenerateError> {
        let mut typedefs = Self::default();
        for s in &items.structs {
            for field in &s.fields {
                typedefs.visit(&field.ty, c);
            }
        }
        for f in &items.functions {
            for arg in &f.args {
                typedefs.visit(&arg.ty, c);
            }
            if let Some(ret) = &f.returns {
                typedefs.visit(ret, c);
            }
        }
        if let Some(name) = typedefs.collision.take() {
            return Err(GenerateError::TypedefCollision { name });
        }
        log::trace!("{} C typedefs", typedefs.defs.len());
        Ok(typedefs)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(String::as_str)
    }

    fn push(&mut self, name: String, ty: &Type, def: impl FnOnce() -> String) {
        let ty = c_type(ty);
        match self.seen.get(&name) {
            Some(seen) if *seen == ty => {}
            Some(_) => {
                self.collision.get_or_insert(name);
            }
            None => {
                self.defs.push(def());
                self.seen.insert(name, ty);
            }
        }
    }

    fn visit_signature(&mut self, sig: &FnSignature, c: Declarator<'_>) {
        for arg in &sig.args {
            self.visit(arg, c);
        }
        if let Some(ret) = &sig.returns {
            self.visit(ret, c);
        }
    }

    fn visit(&mut self, ty: &Type, c: Declarator<'_>) {
        match ty {
            Type::Primitive(_) | Type::String { .. } | Type::Named(_) => {}
            Type::Pointer { pointee, .. } => self.visit(pointee, c),
            Type::Array { element, .. } => self.visit(element, c),
            Type::Slice {
                mutability,
                element,
            } => {
                self.visit(element, c);
                self.slice(*mutability, element, c);
            }
            Type::Owned(inner) => match &**inner {
                Type::Pointer { pointee, .. } => {
                    self.visit(pointee, c);
                    let name = c.typedef_name(ty);
                    let data = Type::pointer(Mutability::Mut, (**pointee).clone());
                    self.push(name.clone(), ty, || {
                        format!(
                            "typedef struct {name} {{\n    {};\n    void (*deleter)({});\n}} {name};",
                            c.declare(&data, "data"),
                            c.declare(&data, ""),
                        )
                    });
                }
                Type::Slice { element, .. } => {
                    self.visit(element, c);
                    let slice = self.slice(Mutability::Mut, element, c);
                    let name = c.typedef_name(ty);
                    self.push(name.clone(), ty, || {
                        format!(
                            "typedef struct {name} {{\n    {slice} slice;\n    void (*deleter)({slice});\n}} {name};"
                        )
                    });
                }
                other => self.visit(other, c),
            },
            Type::Function(sig) => {
                self.visit_signature(sig, c);
                let name = c.typedef_name(ty);
                let params = c.params(sig.args.iter().map(|arg| (arg, "")));
                self.push(name.clone(), ty, || {
                    let decl = format!("(*{name})({params})");
                    format!("typedef {};", c.declare_return(sig.returns.as_deref(), &decl))
                });
            }
            Type::Closure(sig) => {
                self.visit_signature(sig, c);
                let name = c.typedef_name(ty);
                let params = std::iter::once("void *".to_owned())
                    .chain(sig.args.iter().map(|arg| c.declare(arg, "")))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.push(name.clone(), ty, || {
                    let caller = c.declare_return(sig.returns.as_deref(), &format!("(*caller)({params})"));
                    format!(
                        "typedef struct {name} {{\n    {caller};\n    void *state;\n    void (*deleter)(void *);\n}} {name};"
                    )
                });
            }
        }
    }

    /// `{ T *data; size_t len; }`, returning the typedef name.
    fn slice(&mut self, mutability: Mutability, element: &Type, c: Declarator<'_>) -> String {
        let ty = Type::slice(mutability, element.clone());
        let name = c.typedef_name(&ty);
        let data = Type::pointer(mutability, element.clone());
        self.push(name.clone(), &ty, || {
            format!(
                "typedef struct {name} {{\n    {};\n    size_t len;\n}} {name};",
                c.declare(&data, "data"),
            )
        });
        name
    }
}

/// `ty` as C sees it: owned pointers and slices are always mutable.
fn c_type(ty: &Type) -> Type {
    let signature = |sig: &FnSignature| FnSignature::new(sig.args.iter().map(c_type), sig.returns.as_deref().map(c_type));
    match ty {
        Type::Owned(inner) => match &**inner {
            Type::Pointer { pointee, .. } => Type::owned(Type::pointer(Mutability::Mut, c_type(pointee))),
            Type::Slice { element, .. } => Type::owned(Type::slice(Mutability::Mut, c_type(element))),
            other => c_type(other),
        },
        Type::Pointer {
            mutability,
            pointee,
        } => Type::pointer(*mutability, c_type(pointee)),
        Type::Slice {
            mutability,
            element,
        } => Type::slice(*mutability, c_type(element)),
        Type::Array { element, len } => Type::array(c_type(element), *len),
        Type::Function(sig) => Type::Function(signature(sig)),
        Type::Closure(sig) => Type::Closure(signature(sig)),
        Type::Primitive(_) | Type::String { .. } | Type::Named(_) => ty.clone(),
    }
}
