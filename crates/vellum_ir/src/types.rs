use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Primitive

/// Fixed-size scalar types shared by every target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

impl Primitive {
    pub const ALL: [Primitive; 13] = [
        Self::Bool,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::Isize,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::Usize,
        Self::F32,
        Self::F64,
    ];

    /// The lowercase name used in the interface description, e.g. `"usize"`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// Mutability

/// Whether a pointer, string or slice may be written through.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    #[default]
    Const,
    Mut,
}

impl Mutability {
    #[inline]
    pub const fn is_mut(self) -> bool {
        matches!(self, Self::Mut)
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Const => "const",
            Self::Mut => "mut",
        }
    }
}

// -----------------------------------------------------------------------------
// FnSignature

/// Argument and return types of a function pointer or closure type.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FnSignature {
    #[serde(default)]
    pub args: Vec<Type>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<Box<Type>>,
}

impl FnSignature {
    pub fn new(args: impl IntoIterator<Item = Type>, returns: Option<Type>) -> Self {
        Self {
            args: args.into_iter().collect(),
            returns: returns.map(Box::new),
        }
    }
}

// -----------------------------------------------------------------------------
// Type

/// A type as written in the interface description.
///
/// The JSON form is externally tagged:
///
/// ```
/// use vellum_ir::{Mutability, Type};
///
/// let json = r#"{ "owned": { "slice": { "mutability": "mut", "element": { "named": "Entry" } } } }"#;
/// let ty: Type = serde_json::from_str(json).unwrap();
///
/// assert_eq!(ty, Type::owned(Type::slice(Mutability::Mut, Type::named("Entry"))));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Primitive(Primitive),
    /// A raw pointer. It never owns its pointee.
    Pointer {
        #[serde(default)]
        mutability: Mutability,
        pointee: Box<Type>,
    },
    /// A nul-terminated C string.
    String {
        #[serde(default)]
        mutability: Mutability,
    },
    /// A non-owning `(data, len)` view.
    Slice {
        #[serde(default)]
        mutability: Mutability,
        element: Box<Type>,
    },
    /// Ownership of a pointer or slice, freed by a deleter travelling with it.
    Owned(Box<Type>),
    /// A nullable plain function pointer.
    Function(FnSignature),
    /// A type-erased callable with state.
    Closure(FnSignature),
    Array { element: Box<Type>, len: u64 },
    /// A struct or abstract struct declared in the same description.
    Named(String),
}

impl Type {
    #[inline]
    pub fn primitive(primitive: Primitive) -> Self {
        Self::Primitive(primitive)
    }

    #[inline]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    #[inline]
    pub fn pointer(mutability: Mutability, pointee: Type) -> Self {
        Self::Pointer {
            mutability,
            pointee: Box::new(pointee),
        }
    }

    #[inline]
    pub fn string(mutability: Mutability) -> Self {
        Self::String { mutability }
    }

    #[inline]
    pub fn slice(mutability: Mutability, element: Type) -> Self {
        Self::Slice {
            mutability,
            element: Box::new(element),
        }
    }

    #[inline]
    pub fn owned(inner: Type) -> Self {
        Self::Owned(Box::new(inner))
    }

    #[inline]
    pub fn function(args: impl IntoIterator<Item = Type>, returns: Option<Type>) -> Self {
        Self::Function(FnSignature::new(args, returns))
    }

    #[inline]
    pub fn closure(args: impl IntoIterator<Item = Type>, returns: Option<Type>) -> Self {
        Self::Closure(FnSignature::new(args, returns))
    }

    #[inline]
    pub fn array(element: Type, len: u64) -> Self {
        Self::Array {
            element: Box::new(element),
            len,
        }
    }

    /// Returns the struct this type stores inline, looking through arrays.
    ///
    /// `Pointer`, `Slice` and the other indirections return `None`: they do
    /// not need the pointee's layout.
    pub fn by_value_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name.as_str()),
            Self::Array { element, .. } => element.by_value_name(),
            _ => None,
        }
    }

    /// Iterates over this type and every type nested in it, parents first.
    ///
    /// ```
    /// use vellum_ir::{Mutability, Primitive, Type};
    ///
    /// let ty = Type::closure([Type::string(Mutability::Const)], Some(Type::primitive(Primitive::Bool)));
    /// assert_eq!(ty.iter_tree().count(), 3);
    /// ```
    pub fn iter_tree(&self) -> TypeTree<'_> {
        TypeTree { stack: alloc::vec![self] }
    }

    /// Direct children in declaration order.
    fn children(&self) -> impl DoubleEndedIterator<Item = &Type> {
        let (first, rest): (Option<&Type>, &[Type]) = match self {
            Self::Pointer { pointee, .. } => (Some(&**pointee), &[]),
            Self::Slice { element, .. } | Self::Array { element, .. } => (Some(&**element), &[]),
            Self::Owned(inner) => (Some(&**inner), &[]),
            Self::Function(sig) | Self::Closure(sig) => (None, sig.args.as_slice()),
            Self::Primitive(_) | Self::String { .. } | Self::Named(_) => (None, &[]),
        };
        let returns = match self {
            Self::Function(sig) | Self::Closure(sig) => sig.returns.as_deref(),
            _ => None,
        };
        first.into_iter().chain(rest.iter()).chain(returns)
    }
}

impl From<Primitive> for Type {
    #[inline]
    fn from(primitive: Primitive) -> Self {
        Self::Primitive(primitive)
    }
}

/// Pre-order walk over a [`Type`], see [`Type::iter_tree`].
pub struct TypeTree<'a> {
    stack: Vec<&'a Type>,
}

impl<'a> Iterator for TypeTree<'a> {
    type Item = &'a Type;

    fn next(&mut self) -> Option<&'a Type> {
        let ty = self.stack.pop()?;
        self.stack.extend(ty.children().rev());
        Some(ty)
    }
}

// -----------------------------------------------------------------------------
// Tests
