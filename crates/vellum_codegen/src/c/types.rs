use vellum_ir::{FnSignature, Mutability, Primitive, Type};

// -----------------------------------------------------------------------------
// Names

pub(crate) fn primitive(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Bool => "bool",
        Primitive::I8 => "int8_t",
        Primitive::I16 => "int16_t",
        Primitive::I32 => "int32_t",
        Primitive::I64 => "int64_t",
        Primitive::Isize => "ptrdiff_t",
        Primitive::U8 => "uint8_t",
        Primitive::U16 => "uint16_t",
        Primitive::U32 => "uint32_t",
        Primitive::U64 => "uint64_t",
        Primitive::Usize => "size_t",
        Primitive::F32 => "float",
        Primitive::F64 => "double",
    }
}

/// A C identifier fragment naming `ty`, used to build typedef names.
///
/// ```text
/// *const u8                 const_u8_ptr
/// [mut] slice of Entry      slice_mut_Entry
/// owned(*mut Store)         owned_ptr_Store
/// fn(i32) -> bool           fn_bool_args_i32
/// closure(string)           closure_void_args_const_char_ptr
/// ```
pub(crate) fn mangle(ty: &Type) -> String {
    match ty {
        Type::Primitive(p) => p.name().to_owned(),
        Type::Named(name) => name.clone(),
        Type::Pointer {
            mutability: Mutability::Const,
            pointee,
        } => format!("const_{}_ptr", mangle(pointee)),
        Type::Pointer { pointee, .. } => format!("{}_ptr", mangle(pointee)),
        Type::String {
            mutability: Mutability::Const,
        } => "const_char_ptr".to_owned(),
        Type::String { .. } => "char_ptr".to_owned(),
        Type::Slice {
            mutability,
            element,
        } => format!("slice_{}_{}", mutability.name(), mangle(element)),
        Type::Owned(inner) => match &**inner {
            Type::Pointer { pointee, .. } => format!("owned_ptr_{}", mangle(pointee)),
            Type::Slice { element, .. } => format!("owned_slice_{}", mangle(element)),
            other => mangle(other),
        },
        Type::Function(sig) => format!("fn_{}", mangle_signature(sig)),
        Type::Closure(sig) => format!("closure_{}", mangle_signature(sig)),
        Type::Array { element, len } => format!("array_{}_{len}", mangle(element)),
    }
}

fn mangle_signature(sig: &FnSignature) -> String {
    let mut out = match &sig.returns {
        Some(ret) => mangle(ret),
        None => "void".to_owned(),
    };
    out.push_str("_args");
    for arg in &sig.args {
        out.push('_');
        out.push_str(&mangle(arg));
    }
    out
}

// -----------------------------------------------------------------------------
// Declarators

/// Spells C declarations with the typedef prefix `prefix`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Declarator<'a> {
    pub prefix: &'a str,
}

impl Declarator<'_> {
    pub(crate) fn typedef_name(&self, ty: &Type) -> String {
        format!("{}_{}", self.prefix, mangle(ty))
    }

    /// Declares `decl` (a name, or empty for an abstract declarator) of
    /// type `ty`.
    ///
    /// ```text
    /// *const *mut u8, "p"   uint8_t *const *p
    /// *const [u8; 4], "p"   const uint8_t (*p)[4]
    /// ```
    pub(crate) fn declare(&self, ty: &Type, decl: &str) -> String {
        self.declare_qualified(ty, decl.to_owned(), false)
    }

    /// `R decl`, or `void decl`.
    pub(crate) fn declare_return(&self, ty: Option<&Type>, decl: &str) -> String {
        match ty {
            Some(ty) => self.declare(ty, decl),
            None => join("void", decl),
        }
    }

    /// Comma separated parameters, `void` when there are none.
    pub(crate) fn params<'t>(&self, params: impl IntoIterator<Item = (&'t Type, &'t str)>) -> String {
        let params: Vec<String> = params.into_iter().map(|(ty, name)| self.declare(ty, name)).collect();
        if params.is_empty() {
            "void".to_owned()
        } else {
            params.join(", ")
        }
    }

    fn declare_qualified(&self, ty: &Type, decl: String, is_const: bool) -> String {
        let qualify = |base: &str| {
            if is_const {
                format!("const {base}")
            } else {
                base.to_owned()
            }
        };
        match ty {
            Type::Primitive(p) => join(&qualify(primitive(*p)), &decl),
            Type::Named(name) => join(&qualify(&format!("struct {name}")), &decl),
            Type::Pointer {
                mutability,
                pointee,
            } => self.declare_qualified(pointee, pointer(decl, is_const), !mutability.is_mut()),
            Type::String { mutability } => {
                let base = match mutability {
                    Mutability::Const => "const char",
                    Mutability::Mut => "char",
                };
                join(base, &pointer(decl, is_const))
            }
            Type::Array { element, len } => {
                let decl = if decl.starts_with('*') {
                    format!("({decl})[{len}]")
                } else {
                    format!("{decl}[{len}]")
                };
                self.declare_qualified(element, decl, is_const)
            }
            Type::Slice { .. } | Type::Owned(_) | Type::Function(_) | Type::Closure(_) => {
                join(&qualify(&self.typedef_name(ty)), &decl)
            }
        }
    }
}

fn pointer(decl: String, is_const: bool) -> String {
    match (is_const, decl.is_empty()) {
        (true, true) => "*const".to_owned(),
        (true, false) => format!("*const {decl}"),
        (false, _) => format!("*{decl}"),
    }
}

fn join(base: &str, decl: &str) -> String {
    if decl.is_empty() {
        base.to_owned()
    } else {
        format!("{base} {decl}")
    }
}

#[cfg(test)]
mod tests {
    use vellum_ir::{Mutability, Primitive, Type};

    use super::{Declarator, mangle};

    const C: Declarator<'static> = Declarator { prefix: "kv" };

    #[test]
    fn mangled_names() {
        let entry = Type::named("Entry");
        assert_eq!(mangle(&Type::slice(Mutability::Mut, entry.clone())), "slice_mut_Entry");
        assert_eq!(mangle(&Type::owned(Type::slice(Mutability::Mut, entry.clone()))), "owned_slice_Entry");
        assert_eq!(mangle(&Type::owned(Type::pointer(Mutability::Mut, entry))), "owned_ptr_Entry");
        assert_eq!(mangle(&Type::pointer(Mutability::Const, Primitive::U8.into())), "const_u8_ptr");
        assert_eq!(
            mangle(&Type::closure([Type::string(Mutability::Const)], None)),
            "closure_void_args_const_char_ptr"
        );
        assert_eq!(
            mangle(&Type::function([Primitive::I32.into()], Some(Primitive::Bool.into()))),
            "fn_bool_args_i32"
        );
        assert_eq!(mangle(&Type::array(Primitive::F32.into(), 3)), "array_f32_3");
    }

    #[test]
    fn declarators() {
        let u8 = Type::primitive(Primitive::U8);
        let inner = Type::pointer(Mutability::Mut, u8.clone());

        assert_eq!(C.declare(&Type::string(Mutability::Const), "key"), "const char *key");
        assert_eq!(C.declare(&Type::pointer(Mutability::Const, inner.clone()), "p"), "uint8_t *const *p");
        assert_eq!(
            C.declare(&Type::pointer(Mutability::Const, Type::array(u8.clone(), 4)), "p"),
            "const uint8_t (*p)[4]"
        );
        assert_eq!(C.declare(&Type::array(inner, 3), "a"), "uint8_t *a[3]");
        assert_eq!(
            C.declare(&Type::pointer(Mutability::Mut, Type::named("Store")), ""),
            "struct Store *"
        );
        assert_eq!(
            C.declare(&Type::slice(Mutability::Const, u8), "bytes"),
            "kv_slice_const_u8 bytes"
        );
        assert_eq!(C.declare_return(None, "kv_clear(void)"), "void kv_clear(void)");
    }
}
