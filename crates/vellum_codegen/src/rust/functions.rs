use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use vellum_ir::{Function, Type};

use super::path::{closure_, guard_, owned_ptr_, owned_slice_};
use super::types::{docs, ident, is_wrapped, pod_type, return_type, wrapper_type};
use crate::{GenerateError, Options};

pub(crate) const PRIVATE_ABI: &str = "__vellum_private_abi";
pub(crate) const IMPLEMENT_MACRO: &str = "vellum_implement";

/// POD argument list of `f`: names and types.
fn pod_args(f: &Function, rt: &syn::Path) -> Result<(Vec<syn::Ident>, Vec<TokenStream>), GenerateError> {
    let mut names = Vec::with_capacity(f.args.len());
    let mut types = Vec::with_capacity(f.args.len());
    for arg in &f.args {
        names.push(ident(&arg.name)?);
        types.push(pod_type(&arg.ty, rt)?);
    }
    Ok((names, types))
}

// -----------------------------------------------------------------------------
// Extern declarations

/// The private module holding one `extern "C"` declaration per function.
pub(crate) fn abi_module(
    functions: &[Function],
    rt: &syn::Path,
    options: &Options,
) -> Result<TokenStream, GenerateError> {
    let mut decls = Vec::with_capacity(functions.len());
    for f in functions {
        let name = ident(&f.name)?;
        let symbol = options.symbol(&f.name);
        let (args, types) = pod_args(f, rt)?;
        let ret = return_type(f.returns.as_ref(), rt)?;
        decls.push(quote! {
            #[link_name = #symbol]
            pub fn #name(#(#args: #types),*) #ret;
        });
    }

    let link = options.get_link_name().map(|lib| {
        quote! {
            #[cfg_attr(all(vellum_shared, not(vellum_export)), link(name = #lib, kind = "dylib"))]
        }
    });

    let module = format_ident!("{}", PRIVATE_ABI);
    Ok(quote! {
        #[doc(hidden)]
        #[allow(unused_imports)]
        mod #module {
            use super::*;

            #link
            unsafe extern "C" {
                #(#decls)*
            }
        }
    })
}

// -----------------------------------------------------------------------------
// Wrappers

/// An `unsafe fn` with the function's own name that converts owned and
/// closure arguments to their POD form, calls the extern declaration and
/// wraps the result again.
pub(crate) fn wrapper(f: &Function, rt: &syn::Path, options: &Options) -> Result<TokenStream, GenerateError> {
    let name = ident(&f.name)?;
    let module = format_ident!("{}", PRIVATE_ABI);
    let attrs = docs(&f.docs);
    let safety = format!(
        " Calls `{}` across the library boundary. Pointer and slice arguments must be valid \
          for the accesses the implementation performs.",
        options.symbol(&f.name),
    );

    let mut params = Vec::with_capacity(f.args.len());
    let mut forwarded = Vec::with_capacity(f.args.len());
    for arg in &f.args {
        let arg_name = ident(&arg.name)?;
        let ty = wrapper_type(&arg.ty, rt)?;
        params.push(quote!(#arg_name: #ty));
        forwarded.push(if is_wrapped(&arg.ty) {
            quote!(#arg_name.into_raw())
        } else {
            quote!(#arg_name)
        });
    }

    let call = quote!(#module::#name(#(#forwarded),*));
    let (ret, body) = match &f.returns {
        None => (TokenStream::new(), quote!(unsafe { #call })),
        Some(ty) => {
            let wrapped = wrapper_type(ty, rt)?;
            let body = match wrapper_path(ty, rt) {
                Some(owner) => quote!(unsafe { #owner::from_raw(#call) }),
                None => quote!(unsafe { #call }),
            };
            (quote!(-> #wrapped), body)
        }
    };

    let sep = (!f.docs.is_empty()).then(|| quote!(#[doc = ""]));
    Ok(quote! {
        #attrs
        #sep
        /// # Safety
        ///
        #[doc = #safety]
        #[inline]
        pub unsafe fn #name(#(#params),*) #ret {
            #body
        }
    })
}

/// The wrapper type whose `from_raw` adopts a POD return value.
fn wrapper_path(ty: &Type, rt: &syn::Path) -> Option<TokenStream> {
    match ty {
        Type::Owned(inner) => match &**inner {
            Type::Pointer { .. } => Some(owned_ptr_(rt)),
            Type::Slice { .. } => Some(owned_slice_(rt)),
            _ => None,
        },
        Type::Closure(_) => Some(closure_(rt)),
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// Implement macro

/// `vellum_implement!(path::to::module)` checks that `module` has a function
/// for every declaration with exactly the POD signature, and exports a
/// trampoline under each symbol that calls it inside the boundary guard.
pub(crate) fn implement_macro(
    functions: &[Function],
    rt: &syn::Path,
    options: &Options,
) -> Result<TokenStream, GenerateError> {
    let guard = guard_(rt);

    let mut exports = Vec::with_capacity(functions.len());
    for f in functions {
        let name = ident(&f.name)?;
        let symbol = options.symbol(&f.name);
        let export = format_ident!("__vellum_export_{}", f.name);
        let check = format_ident!("__VELLUM_EXPECTED_SIGNATURE_{}", f.name);
        let (args, types) = pod_args(f, rt)?;
        let ret = return_type(f.returns.as_ref(), rt)?;

        exports.push(quote! {
            #[unsafe(export_name = #symbol)]
            extern "C" fn #export(#(#args: #types),*) #ret {
                #[allow(non_upper_case_globals)]
                const #check: unsafe fn(#(#types),*) #ret = $($imp)+::#name;
                #guard(move || unsafe { #check(#(#args),*) })
            }
        });
    }

    let doc = format!(
        " Exports an implementation of these bindings.\n\n \
          `{IMPLEMENT_MACRO}!(path::to::module)` expects `module` to define one function per \
          declaration, named after it and taking and returning the POD types. A missing function \
          or a signature mismatch fails to compile at `__VELLUM_EXPECTED_SIGNATURE_<name>`.",
    );
    let name = format_ident!("{}", IMPLEMENT_MACRO);
    Ok(quote! {
        #[doc = #doc]
        #[allow(unused_macros)]
        macro_rules! #name {
            ($($imp:tt)+) => {
                const _: () = {
                    #(#exports)*
                };
            };
        }
    })
}
