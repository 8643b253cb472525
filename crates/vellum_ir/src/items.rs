use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::Type;

// -----------------------------------------------------------------------------
// Items

/// Everything one interface description declares.
///
/// ```
/// let json = r#"{
///     "structs": [
///         { "name": "Point", "fields": [
///             { "name": "x", "ty": { "primitive": "f64" } },
///             { "name": "y", "ty": { "primitive": "f64" } }
///         ] }
///     ],
///     "functions": [
///         { "name": "norm", "args": [{ "name": "p", "ty": { "named": "Point" } }],
///           "returns": { "primitive": "f64" } }
///     ]
/// }"#;
/// let items: vellum_ir::Items = serde_json::from_str(json).unwrap();
///
/// assert!(items.validate().is_ok());
/// assert_eq!(items.functions[0].args[0].name, "p");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Items {
    #[serde(default)]
    pub structs: Vec<Struct>,
    #[serde(default)]
    pub abstract_structs: Vec<AbstractStruct>,
    #[serde(default)]
    pub functions: Vec<Function>,
}

/// What a top-level name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Struct,
    AbstractStruct,
    Function,
}

impl Items {
    pub fn find_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Classifies `name`. The first declaration wins if it is declared twice.
    pub fn kind_of(&self, name: &str) -> Option<ItemKind> {
        if self.structs.iter().any(|s| s.name == name) {
            Some(ItemKind::Struct)
        } else if self.abstract_structs.iter().any(|s| s.name == name) {
            Some(ItemKind::AbstractStruct)
        } else if self.functions.iter().any(|f| f.name == name) {
            Some(ItemKind::Function)
        } else {
            None
        }
    }

    /// Every declared name in order: structs, abstract structs, functions.
    pub fn names(&self) -> impl Iterator<Item = (&str, ItemKind)> {
        let structs = self.structs.iter().map(|s| (s.name.as_str(), ItemKind::Struct));
        let abstracts = self
            .abstract_structs
            .iter()
            .map(|s| (s.name.as_str(), ItemKind::AbstractStruct));
        let functions = self.functions.iter().map(|f| (f.name.as_str(), ItemKind::Function));
        structs.chain(abstracts).chain(functions)
    }
}

// -----------------------------------------------------------------------------
// Declarations

/// A struct with a known layout.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A struct only ever handled behind a pointer. Its layout is private to the
/// implementation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractStruct {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
}

/// A function exported by the library.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    #[serde(default)]
    pub args: Vec<Arg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arg {
    pub name: String,
    pub ty: Type,
}

// -----------------------------------------------------------------------------
// Builders

impl Struct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.fields.push(Field {
            name: name.into(),
            ty,
            docs: Vec::new(),
        });
        self
    }

    pub fn doc(mut self, line: impl Into<String>) -> Self {
        self.docs.push(line.into());
        self
    }
}

impl AbstractStruct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: Vec::new(),
        }
    }
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.args.push(Arg { name: name.into(), ty });
        self
    }

    pub fn returns(mut self, ty: Type) -> Self {
        self.returns = Some(ty);
        self
    }

    pub fn doc(mut self, line: impl Into<String>) -> Self {
        self.docs.push(line.into());
        self
    }
}
