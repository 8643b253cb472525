use alloc::collections::BTreeSet;
use alloc::string::ToString;
use alloc::vec::Vec;

use crate::order::struct_order;
use crate::{FnSignature, ItemKind, Items, Site, Struct, Type, ValidationError, ValidationErrors};

/// The most arguments a closure may take; the runtime implements closure
/// signatures up to this arity.
pub const MAX_CLOSURE_ARGS: usize = 8;

impl Items {
    /// Checks the description, reporting every problem at once.
    ///
    /// Checked:
    ///
    /// - names are identifiers and unique among items, fields and arguments;
    /// - every named type refers to a struct or abstract struct;
    /// - abstract structs only appear behind a pointer;
    /// - `owned` wraps a pointer or a slice;
    /// - arrays are non-empty and never passed or returned by value;
    /// - closures take at most [`MAX_CLOSURE_ARGS`] arguments;
    /// - no struct contains itself by value.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let (errors, _) = check(self);
        match ValidationErrors::from_vec(errors) {
            Some(errors) => Err(errors),
            None => Ok(()),
        }
    }

    /// Validates the description and reorders its structs so that every
    /// struct follows the structs it contains by value.
    pub fn into_validated(mut self) -> Result<Self, ValidationErrors> {
        let (errors, order) = check(&self);
        if let Some(errors) = ValidationErrors::from_vec(errors) {
            return Err(errors);
        }

        if let Some(order) = order {
            let mut slots: Vec<Option<Struct>> = self.structs.into_iter().map(Some).collect();
            self.structs = order.into_iter().filter_map(|i| slots[i].take()).collect();
        }
        Ok(self)
    }
}

fn check(items: &Items) -> (Vec<ValidationError>, Option<Vec<usize>>) {
    let mut validator = Validator {
        items,
        errors: Vec::new(),
    };
    validator.check_items();

    let order = match struct_order(items) {
        Ok(order) => Some(order),
        Err(error) => {
            validator.report(error);
            None
        }
    };

    log::debug!(
        "validated {} structs, {} abstract structs, {} functions: {} problem(s)",
        items.structs.len(),
        items.abstract_structs.len(),
        items.functions.len(),
        validator.errors.len(),
    );
    (validator.errors, order)
}

/// Returns `true` for ASCII identifiers other than `_`.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name != "_"
}

struct Validator<'a> {
    items: &'a Items,
    errors: Vec<ValidationError>,
}

impl Validator<'_> {
    fn report(&mut self, error: ValidationError) {
        log::warn!("{error}");
        self.errors.push(error);
    }

    fn identifier(&mut self, name: &str) {
        if !is_identifier(name) {
            self.report(ValidationError::InvalidIdentifier {
                name: name.to_string(),
            });
        }
    }

    fn check_items(&mut self) {
        let items = self.items;

        let mut seen = BTreeSet::new();
        for (name, _) in items.names() {
            self.identifier(name);
            if !seen.insert(name) {
                self.report(ValidationError::DuplicateItem {
                    name: name.to_string(),
                });
            }
        }

        for s in &items.structs {
            let mut fields = BTreeSet::new();
            for field in &s.fields {
                self.identifier(&field.name);
                if !fields.insert(field.name.as_str()) {
                    self.report(ValidationError::DuplicateField {
                        owner: s.name.clone(),
                        field: field.name.clone(),
                    });
                }
                let site = Site::Field {
                    owner: s.name.clone(),
                    field: field.name.clone(),
                };
                self.check_type(&field.ty, &site, true);
            }
        }

        for f in &items.functions {
            let mut args = BTreeSet::new();
            for arg in &f.args {
                self.identifier(&arg.name);
                if !args.insert(arg.name.as_str()) {
                    self.report(ValidationError::DuplicateArg {
                        function: f.name.clone(),
                        arg: arg.name.clone(),
                    });
                }
                let site = Site::Argument {
                    function: f.name.clone(),
                    arg: arg.name.clone(),
                };
                self.check_passed(&arg.ty, &site);
            }
            if let Some(returns) = &f.returns {
                let site = Site::Return {
                    function: f.name.clone(),
                };
                self.check_passed(returns, &site);
            }
        }
    }

    /// A type passed to or returned from a function.
    fn check_passed(&mut self, ty: &Type, site: &Site) {
        if matches!(ty, Type::Array { .. }) {
            self.report(ValidationError::ArrayByValue { site: site.clone() });
        }
        self.check_type(ty, site, true);
    }

    fn check_type(&mut self, ty: &Type, site: &Site, by_value: bool) {
        match ty {
            Type::Primitive(_) | Type::String { .. } => {}
            Type::Named(name) => self.check_name(name, site, by_value),
            Type::Pointer { pointee, .. } => self.check_type(pointee, site, false),
            Type::Slice { element, .. } => self.check_type(element, site, true),
            Type::Owned(inner) => {
                if !matches!(**inner, Type::Pointer { .. } | Type::Slice { .. }) {
                    self.report(ValidationError::InvalidOwned { site: site.clone() });
                }
                self.check_type(inner, site, by_value);
            }
            Type::Array { element, len } => {
                if *len == 0 {
                    self.report(ValidationError::ZeroLengthArray { site: site.clone() });
                }
                self.check_type(element, site, true);
            }
            Type::Closure(sig) if sig.args.len() > MAX_CLOSURE_ARGS => {
                self.report(ValidationError::ClosureArity {
                    site: site.clone(),
                    args: sig.args.len(),
                    max: MAX_CLOSURE_ARGS,
                });
                self.check_signature(sig, site);
            }
            Type::Function(sig) | Type::Closure(sig) => self.check_signature(sig, site),
        }
    }

    fn check_signature(&mut self, sig: &FnSignature, site: &Site) {
        for arg in &sig.args {
            self.check_passed(arg, site);
        }
        if let Some(returns) = &sig.returns {
            self.check_passed(returns, site);
        }
    }

    fn check_name(&mut self, name: &str, site: &Site, by_value: bool) {
        let error = match self.items.kind_of(name) {
            None => ValidationError::UnknownType {
                name: name.to_string(),
                site: site.clone(),
            },
            Some(ItemKind::Function) => ValidationError::NotAType {
                name: name.to_string(),
                site: site.clone(),
            },
            Some(ItemKind::AbstractStruct) if by_value => ValidationError::Unsized {
                name: name.to_string(),
                site: site.clone(),
            },
            Some(_) => return,
        };
        self.report(error);
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::is_identifier;
    use alloc::string::ToString;
    use crate::{
        AbstractStruct, Function, Items, Mutability, Primitive, Site, Struct, Type,
        ValidationError,
    };

    fn handle() -> Type {
        Type::pointer(Mutability::Mut, Type::named("Handle"))
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("kv_get"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("Vec3"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("_"));
        assert!(!is_identifier("3d"));
        assert!(!is_identifier("kv-get"));
    }

    #[test]
    fn abstract_struct_behind_pointer_is_fine() {
        let items = Items {
            abstract_structs: alloc::vec![AbstractStruct::new("Handle")],
            functions: alloc::vec![
                Function::new("open").returns(Type::owned(handle())),
                Function::new("close").arg("h", Type::owned(handle())),
            ],
            ..Items::default()
        };
        assert_eq!(items.validate(), Ok(()));
    }

    #[test]
    fn every_problem_is_reported() {
        let items = Items {
            structs: alloc::vec![
                Struct::new("Pair")
                    .field("a", Primitive::I32.into())
                    .field("a", Primitive::I32.into())
                    .field("h", Type::named("Handle")),
            ],
            abstract_structs: alloc::vec![AbstractStruct::new("Handle")],
            functions: alloc::vec![
                Function::new("Pair"),
                Function::new("f")
                    .arg("x", Type::named("Missing"))
                    .arg("x", Type::named("f"))
                    .returns(Type::owned(Primitive::U8.into())),
            ],
        };

        let errors = items.validate().unwrap_err().into_vec();
        assert_eq!(
            errors,
            [
                ValidationError::DuplicateItem { name: "Pair".into() },
                ValidationError::DuplicateField {
                    owner: "Pair".into(),
                    field: "a".into(),
                },
                ValidationError::Unsized {
                    name: "Handle".into(),
                    site: Site::Field {
                        owner: "Pair".into(),
                        field: "h".into(),
                    },
                },
                ValidationError::UnknownType {
                    name: "Missing".into(),
                    site: Site::Argument {
                        function: "f".into(),
                        arg: "x".into(),
                    },
                },
                ValidationError::DuplicateArg {
                    function: "f".into(),
                    arg: "x".into(),
                },
                ValidationError::NotAType {
                    name: "f".into(),
                    site: Site::Argument {
                        function: "f".into(),
                        arg: "x".into(),
                    },
                },
                ValidationError::InvalidOwned {
                    site: Site::Return { function: "f".into() },
                },
            ]
        );
    }

    #[test]
    fn arrays_by_value_only_inside_structs() {
        let items = Items {
            structs: alloc::vec![Struct::new("Key").field("bytes", Type::array(Primitive::U8.into(), 32))],
            functions: alloc::vec![
                Function::new("hash").arg("data", Type::array(Primitive::U8.into(), 4)),
                Function::new("zero").arg("k", Type::pointer(Mutability::Const, Type::array(Primitive::U8.into(), 0))),
            ],
            ..Items::default()
        };
        let errors = items.validate().unwrap_err().into_vec();
        assert!(matches!(errors[0], ValidationError::ArrayByValue { .. }));
        assert!(matches!(errors[1], ValidationError::ZeroLengthArray { .. }));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn into_validated_sorts_structs() {
        let items = Items {
            structs: alloc::vec![
                Struct::new("Outer").field("inner", Type::named("Inner")),
                Struct::new("Inner").field("x", Primitive::U32.into()),
            ],
            ..Items::default()
        }
        .into_validated()
        .unwrap();
        assert_eq!(items.structs[0].name, "Inner");
        assert_eq!(items.structs[1].name, "Outer");
    }

    #[test]
    fn closures_are_limited_to_eight_arguments() {
        let bytes = |n| alloc::vec![Type::from(Primitive::U8); n];
        let items = Items {
            functions: alloc::vec![
                Function::new("eight").arg("cb", Type::closure(bytes(8), None)),
                Function::new("nine").arg("cb", Type::closure(bytes(9), None)),
                Function::new("raw").arg("cb", Type::function(bytes(9), None)),
            ],
            ..Items::default()
        };

        let errors = items.validate().unwrap_err();
        assert_eq!(
            errors.as_slice(),
            [ValidationError::ClosureArity {
                site: Site::Argument {
                    function: "nine".into(),
                    arg: "cb".into(),
                },
                args: 9,
                max: 8,
            }]
        );
        assert_eq!(
            errors.to_string(),
            "invalid interface description: closure takes 9 arguments, at most 8 are supported, in argument `cb` of `nine`"
        );
    }

    #[test]
    fn cycles_are_validation_errors() {
        let items = Items {
            structs: alloc::vec![Struct::new("Loop").field("again", Type::array(Type::named("Loop"), 1))],
            ..Items::default()
        };
        let errors = items.validate().unwrap_err();
        assert_eq!(
            errors.as_slice(),
            [ValidationError::Cycle { name: "Loop".into() }]
        );
    }
}
