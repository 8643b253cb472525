use proc_macro2::TokenStream;
use quote::quote;
use vellum_ir::{AbstractStruct, Struct};

use super::types::{docs, ident, pod_type};
use crate::GenerateError;

/// An opaque type: zero-sized, `!Send`, `!Sync`, `!Unpin`, never constructed
/// on the Rust side.
pub(crate) fn abstract_struct(item: &AbstractStruct) -> Result<TokenStream, GenerateError> {
    let name = ident(&item.name)?;
    let attrs = docs(&item.docs);
    Ok(quote! {
        #attrs
        #[repr(C)]
        pub struct #name {
            _opaque: [u8; 0],
            _marker: ::core::marker::PhantomData<(*mut u8, ::core::marker::PhantomPinned)>,
        }
    })
}

/// A complete struct. Its fields are POD, so the struct is too.
pub(crate) fn complete_struct(item: &Struct, rt: &syn::Path) -> Result<TokenStream, GenerateError> {
    let name = ident(&item.name)?;
    let attrs = docs(&item.docs);

    let mut fields = Vec::with_capacity(item.fields.len());
    for field in &item.fields {
        let field_attrs = docs(&field.docs);
        let name = ident(&field.name)?;
        let ty = pod_type(&field.ty, rt)?;
        fields.push(quote! {
            #field_attrs
            pub #name: #ty
        });
    }

    Ok(quote! {
        #attrs
        #[repr(C)]
        #[derive(Debug, Clone, Copy)]
        pub struct #name {
            #(#fields,)*
        }
    })
}
