//! ABI-stable ownership types for crossing a compiled-library boundary.
//!
//! Every type in this crate comes in two forms that share one memory layout:
//!
//! - a **POD form** (`#[repr(C)]`, `Copy`) that is passed by value through
//!   `extern "C"` declarations and can be consumed from any language;
//! - a **wrapper form** that owns the resource and runs its deleter on drop.
//!
//! | POD form | Wrapper form | Owns |
//! |---|---|---|
//! | [`Slice<T>`] / [`SliceMut<T>`] | - | nothing, it is a view |
//! | [`RawOwnedPtr<T>`] | [`OwnedPtr<T>`] | one object |
//! | [`RawOwnedSlice<T>`] | [`OwnedSlice<T>`] | a block of `len` objects |
//! | [`RawClosure<S>`] | [`Closure<S>`] | the state of a callable |
//!
//! Converting a wrapper to its POD form (`into_raw`) hands the cleanup
//! obligation to whoever receives the POD value. Converting back
//! (`from_raw`) takes it over again. Neither conversion allocates.
//!
//! **Deleters**
//!
//! A deleter is a plain `unsafe extern "C" fn` stored next to the data. The
//! side that allocated a resource also decides how it is freed, so a resource
//! may be released by code compiled with a different toolchain. A null
//! deleter means "not mine to free".
//!
//! **Failure at the boundary**
//!
//! Nothing unwinds through these types. A panic escaping a closure invoked
//! across the boundary, or a call to an empty closure, terminates the process
//! (see [`guard`] and [`fatal`]).
#![expect(unsafe_code, reason = "Boundary types are raw pointers by definition.")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod boundary;
mod closure;
mod deleter;
mod error;
mod layout;
mod owned_ptr;
mod owned_slice;
mod slice;

// -----------------------------------------------------------------------------
// Top-level exports

pub use boundary::{fatal, guard};
pub use closure::{Closure, RawClosure, Signature, StateDeleter};
pub use deleter::{drop_box, drop_boxed_slice};
pub use error::OutOfRange;
pub use owned_ptr::{OwnedPtr, PtrDeleter, RawOwnedPtr};
pub use owned_slice::{OwnedSlice, RawOwnedSlice, SliceDeleter};
pub use slice::{Slice, SliceMut};
