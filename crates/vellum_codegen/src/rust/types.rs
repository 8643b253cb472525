use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::Ident;
use vellum_ir::{FnSignature, Mutability, Primitive, Type};

use super::path::{c_char_, closure_, owned_ptr_, owned_slice_};
use super::path::{raw_closure_, raw_owned_ptr_, raw_owned_slice_, slice_, slice_mut_};
use crate::{GenerateError, Target};

// -----------------------------------------------------------------------------
// Identifiers

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

// Keywords that cannot be raw identifiers.
const RESERVED: &[&str] = &["self", "Self", "super", "crate"];

/// `name` as a Rust identifier, raw if it is a keyword.
pub(crate) fn ident(name: &str) -> Result<Ident, GenerateError> {
    if RESERVED.contains(&name) {
        return Err(GenerateError::ReservedIdentifier {
            name: name.to_owned(),
            target: Target::Rust,
        });
    }
    if KEYWORDS.contains(&name) {
        Ok(Ident::new_raw(name, Span::call_site()))
    } else {
        Ok(Ident::new(name, Span::call_site()))
    }
}

/// `#[doc = ".."]` attributes, one per line.
pub(crate) fn docs(lines: &[String]) -> TokenStream {
    let lines = lines.iter().map(|line| format!(" {line}"));
    quote! {
        #( #[doc = #lines] )*
    }
}

pub(crate) fn primitive(primitive: Primitive) -> TokenStream {
    let name = format_ident!("{}", primitive.name());
    quote!(#name)
}

// -----------------------------------------------------------------------------
// Projections

/// The POD form of `ty`: what crosses the `extern "C"` boundary.
pub(crate) fn pod_type(ty: &Type, rt: &syn::Path) -> Result<TokenStream, GenerateError> {
    Ok(match ty {
        Type::Primitive(p) => primitive(*p),
        Type::Named(name) => {
            let name = ident(name)?;
            quote!(#name)
        }
        Type::Pointer {
            mutability,
            pointee,
        } => {
            let pointee = pod_type(pointee, rt)?;
            pointer(*mutability, pointee)
        }
        Type::String { mutability } => pointer(*mutability, c_char_()),
        Type::Slice {
            mutability,
            element,
        } => {
            let element = pod_type(element, rt)?;
            let slice = match mutability {
                Mutability::Const => slice_(rt),
                Mutability::Mut => slice_mut_(rt),
            };
            quote!(#slice<#element>)
        }
        Type::Owned(inner) => match &**inner {
            Type::Pointer { pointee, .. } => {
                let (raw, pointee) = (raw_owned_ptr_(rt), pod_type(pointee, rt)?);
                quote!(#raw<#pointee>)
            }
            Type::Slice { element, .. } => {
                let (raw, element) = (raw_owned_slice_(rt), pod_type(element, rt)?);
                quote!(#raw<#element>)
            }
            // Rejected by validation.
            other => pod_type(other, rt)?,
        },
        Type::Function(sig) => {
            let (args, ret) = signature(sig, rt)?;
            quote!(::core::option::Option<unsafe extern "C" fn(#(#args),*) #ret>)
        }
        Type::Closure(sig) => {
            let raw = raw_closure_(rt);
            let sig = closure_signature(sig, rt)?;
            quote!(#raw<#sig>)
        }
        Type::Array { element, len } => {
            let element = pod_type(element, rt)?;
            let len = proc_macro2::Literal::u64_unsuffixed(*len);
            quote!([#element; #len])
        }
    })
}

/// The wrapper form of `ty` in a forwarding function.
///
/// Only the outermost owned or closure type is wrapped. Nested ones stay in
/// POD form.
pub(crate) fn wrapper_type(ty: &Type, rt: &syn::Path) -> Result<TokenStream, GenerateError> {
    Ok(match ty {
        Type::Owned(inner) => match &**inner {
            Type::Pointer { pointee, .. } => {
                let (owned, pointee) = (owned_ptr_(rt), pod_type(pointee, rt)?);
                quote!(#owned<#pointee>)
            }
            Type::Slice { element, .. } => {
                let (owned, element) = (owned_slice_(rt), pod_type(element, rt)?);
                quote!(#owned<#element>)
            }
            other => pod_type(other, rt)?,
        },
        Type::Closure(sig) => {
            let closure = closure_(rt);
            let sig = closure_signature(sig, rt)?;
            quote!(#closure<#sig>)
        }
        other => pod_type(other, rt)?,
    })
}

/// Whether the wrapper and POD forms of `ty` differ.
#[inline]
pub(crate) fn is_wrapped(ty: &Type) -> bool {
    matches!(ty, Type::Owned(_) | Type::Closure(_))
}

/// `-> R`, or nothing for `void`.
pub(crate) fn return_type(ty: Option<&Type>, rt: &syn::Path) -> Result<TokenStream, GenerateError> {
    match ty {
        Some(ty) => {
            let ty = pod_type(ty, rt)?;
            Ok(quote!(-> #ty))
        }
        None => Ok(TokenStream::new()),
    }
}

fn pointer(mutability: Mutability, pointee: TokenStream) -> TokenStream {
    match mutability {
        Mutability::Const => quote!(*const #pointee),
        Mutability::Mut => quote!(*mut #pointee),
    }
}

fn signature(sig: &FnSignature, rt: &syn::Path) -> Result<(Vec<TokenStream>, TokenStream), GenerateError> {
    let args = sig
        .args
        .iter()
        .map(|arg| pod_type(arg, rt))
        .collect::<Result<Vec<_>, _>>()?;
    let ret = return_type(sig.returns.as_deref(), rt)?;
    Ok((args, ret))
}

/// `fn(A, B) -> R`, the `Signature` parameter of a closure.
fn closure_signature(sig: &FnSignature, rt: &syn::Path) -> Result<TokenStream, GenerateError> {
    let (args, ret) = signature(sig, rt)?;
    Ok(quote!(fn(#(#args),*) #ret))
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use quote::quote;
    use vellum_ir::{Mutability, Primitive, Type};

    use super::{ident, pod_type, wrapper_type};
    use crate::GenerateError;

    fn rt() -> syn::Path {
        syn::parse_quote!(::rt)
    }

    fn pod(ty: &Type) -> String {
        pod_type(ty, &rt()).unwrap().to_string()
    }

    fn wrapper(ty: &Type) -> String {
        wrapper_type(ty, &rt()).unwrap().to_string()
    }

    #[test]
    fn keywords_become_raw() {
        assert_eq!(ident("type").unwrap().to_string(), "r#type");
        assert_eq!(ident("value").unwrap().to_string(), "value");
        assert!(matches!(ident("self"), Err(GenerateError::ReservedIdentifier { .. })));
    }

    #[test]
    fn pod_projection() {
        let entry = Type::named("Entry");
        assert_eq!(pod(&Type::string(Mutability::Const)), quote!(*const ::core::ffi::c_char).to_string());
        assert_eq!(
            pod(&Type::owned(Type::slice(Mutability::Mut, entry.clone()))),
            quote!(::rt::RawOwnedSlice<Entry>).to_string()
        );
        assert_eq!(
            pod(&Type::owned(Type::pointer(Mutability::Mut, entry.clone()))),
            quote!(::rt::RawOwnedPtr<Entry>).to_string()
        );
        assert_eq!(pod(&Type::array(Primitive::U8.into(), 16)), quote!([u8; 16]).to_string());
        assert_eq!(
            pod(&Type::function([Primitive::I32.into()], None)),
            quote!(::core::option::Option<unsafe extern "C" fn(i32)>).to_string()
        );
    }

    #[test]
    fn only_the_outer_type_is_wrapped() {
        let inner = Type::owned(Type::pointer(Mutability::Mut, Type::named("Node")));
        let visit = Type::closure([inner.clone()], Some(Primitive::Bool.into()));

        assert_eq!(wrapper(&inner), quote!(::rt::OwnedPtr<Node>).to_string());
        assert_eq!(
            wrapper(&visit),
            quote!(::rt::Closure<fn(::rt::RawOwnedPtr<Node>) -> bool>).to_string()
        );
        assert_eq!(wrapper(&Primitive::U8.into()), "u8");
    }
}
