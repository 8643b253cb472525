use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;

/// Where in the description a type appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Site {
    Field { owner: String, field: String },
    Argument { function: String, arg: String },
    Return { function: String },
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { owner, field } => write!(f, "field `{owner}.{field}`"),
            Self::Argument { function, arg } => write!(f, "argument `{arg}` of `{function}`"),
            Self::Return { function } => write!(f, "return type of `{function}`"),
        }
    }
}

/// One problem found in an interface description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("`{name}` is declared more than once")]
    DuplicateItem { name: String },
    #[error("struct `{owner}` declares field `{field}` more than once")]
    DuplicateField { owner: String, field: String },
    #[error("function `{function}` declares argument `{arg}` more than once")]
    DuplicateArg { function: String, arg: String },
    #[error("`{name}` is not a valid identifier")]
    InvalidIdentifier { name: String },
    #[error("unknown type `{name}` in {site}")]
    UnknownType { name: String, site: Site },
    #[error("`{name}` is a function, not a type, in {site}")]
    NotAType { name: String, site: Site },
    #[error("abstract struct `{name}` is used by value in {site}")]
    Unsized { name: String, site: Site },
    #[error("`owned` must wrap a pointer or a slice, in {site}")]
    InvalidOwned { site: Site },
    #[error("zero-length array in {site}")]
    ZeroLengthArray { site: Site },
    #[error("arrays cannot be passed or returned by value, in {site}")]
    ArrayByValue { site: Site },
    #[error("closure takes {args} arguments, at most {max} are supported, in {site}")]
    ClosureArity { site: Site, args: usize, max: usize },
    #[error("struct `{name}` contains itself by value")]
    Cycle { name: String },
}

/// Every problem found in one description, in discovery order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    #[inline]
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "invalid interface description: {single}"),
            errors => {
                write!(f, "invalid interface description ({} problems):", errors.len())?;
                for error in errors {
                    write!(f, "\n  - {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl core::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = alloc::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = core::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
