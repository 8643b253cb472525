//! Paths into the runtime crate used by the generated code.
//!
//! Every helper takes the resolved runtime path, see [`Manifest`](crate::Manifest),
//! so that the generated file compiles whether the runtime is a direct
//! dependency or reached through the `vellum` facade.

use proc_macro2::TokenStream;
use quote::quote;

// -----------------------------------------------------------------------------
// POD forms

#[inline(always)]
pub(crate) fn slice_(rt: &syn::Path) -> TokenStream {
    quote! {
        #rt::Slice
    }
}

#[inline(always)]
pub(crate) fn slice_mut_(rt: &syn::Path) -> TokenStream {
    quote! {
        #rt::SliceMut
    }
}

#[inline(always)]
pub(crate) fn raw_owned_ptr_(rt: &syn::Path) -> TokenStream {
    quote! {
        #rt::RawOwnedPtr
    }
}

#[inline(always)]
pub(crate) fn raw_owned_slice_(rt: &syn::Path) -> TokenStream {
    quote! {
        #rt::RawOwnedSlice
    }
}

#[inline(always)]
pub(crate) fn raw_closure_(rt: &syn::Path) -> TokenStream {
    quote! {
        #rt::RawClosure
    }
}

// -----------------------------------------------------------------------------
// Wrapper forms

#[inline(always)]
pub(crate) fn owned_ptr_(rt: &syn::Path) -> TokenStream {
    quote! {
        #rt::OwnedPtr
    }
}

#[inline(always)]
pub(crate) fn owned_slice_(rt: &syn::Path) -> TokenStream {
    quote! {
        #rt::OwnedSlice
    }
}

#[inline(always)]
pub(crate) fn closure_(rt: &syn::Path) -> TokenStream {
    quote! {
        #rt::Closure
    }
}

// -----------------------------------------------------------------------------
// Misc

#[inline(always)]
pub(crate) fn guard_(rt: &syn::Path) -> TokenStream {
    quote! {
        #rt::guard
    }
}

#[inline(always)]
pub(crate) fn c_char_() -> TokenStream {
    quote! {
        ::core::ffi::c_char
    }
}
