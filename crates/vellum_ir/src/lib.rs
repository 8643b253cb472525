//! The interface description consumed by the vellum generator.
//!
//! An [`Items`] value lists the structs, abstract (opaque) structs and
//! functions a library exposes. It is plain serde data; the `vellum` CLI reads
//! it from JSON and build scripts usually construct it with the builder
//! methods on [`Struct`] and [`Function`].
//!
//! [`Items::validate`] reports every problem in one pass, and
//! [`Items::into_validated`] also puts complete structs into an order in which
//! each one follows the structs it embeds by value.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod items;
mod order;
mod types;
mod validate;

// -----------------------------------------------------------------------------
// Top-level exports

pub use error::{Site, ValidationError, ValidationErrors};
pub use items::{AbstractStruct, Arg, Field, Function, ItemKind, Items, Struct};
pub use order::struct_order;
pub use types::{FnSignature, Mutability, Primitive, Type, TypeTree};
pub use validate::MAX_CLOSURE_ARGS;
