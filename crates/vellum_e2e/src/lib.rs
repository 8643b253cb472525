//! A string map implemented behind generated vellum bindings and called back
//! through the generated wrappers, all in one crate.
//!
//! [`kv`] holds the generated declarations. The private `store` module is the
//! implementation `vellum_implement!` exports under the `kv_*` symbols.
//!
//! # Signature checks
//!
//! `kv_check_bindings!()` declares the same bindings again, exported under
//! `kv_check_*`. An implementation taking and returning the POD types is
//! accepted:
//!
//! ```
//! # #![allow(unsafe_code, dead_code)]
//! mod kv {
//!     vellum_e2e::kv_check_bindings!();
//!     vellum_implement!(super::imp);
//! }
//!
//! mod imp {
//!     use core::ffi::c_char;
//!     use core::ptr;
//!
//!     use vellum_abi::{RawClosure, RawOwnedPtr, RawOwnedSlice};
//!
//!     use super::kv::{KvEntry, KvStore};
//!
//!     pub fn create() -> RawOwnedPtr<KvStore> {
//!         RawOwnedPtr::default()
//!     }
//!     pub fn set(_: *mut KvStore, _: *const c_char, _: *const c_char) {}
//!     pub unsafe fn get(_: *const KvStore, _: *const c_char) -> *const c_char {
//!         ptr::null()
//!     }
//!     pub fn delete(_: *mut KvStore, _: *const c_char) -> bool {
//!         false
//!     }
//!     pub fn entries(_: *const KvStore) -> RawOwnedSlice<KvEntry> {
//!         RawOwnedSlice::default()
//!     }
//!     pub fn for_each(_: *const KvStore, _: RawClosure<fn(*const c_char, *const c_char)>) {}
//! }
//! # fn main() {}
//! ```
//!
//! Arguments in the wrong order fail to build:
//!
//! ```compile_fail,E0308
//! # #![allow(unsafe_code, dead_code)]
//! # mod kv {
//! #     vellum_e2e::kv_check_bindings!();
//! #     vellum_implement!(super::imp);
//! # }
//! # mod imp {
//! # use core::ffi::c_char;
//! # use vellum_abi::{RawClosure, RawOwnedPtr, RawOwnedSlice};
//! # use super::kv::{KvEntry, KvStore};
//! # pub fn create() -> RawOwnedPtr<KvStore> { RawOwnedPtr::default() }
//! # pub fn set(_: *mut KvStore, _: *const c_char, _: *const c_char) {}
//! # pub fn get(_: *const KvStore, _: *const c_char) -> *const c_char { core::ptr::null() }
//! pub fn delete(_: *const c_char, _: *mut KvStore) -> bool {
//!     false
//! }
//! # pub fn entries(_: *const KvStore) -> RawOwnedSlice<KvEntry> { RawOwnedSlice::default() }
//! # pub fn for_each(_: *const KvStore, _: RawClosure<fn(*const c_char, *const c_char)>) {}
//! # }
//! # fn main() {}
//! ```
//!
//! So does a bare pointer where ownership is transferred:
//!
//! ```compile_fail,E0308
//! # #![allow(unsafe_code, dead_code)]
//! # mod kv {
//! #     vellum_e2e::kv_check_bindings!();
//! #     vellum_implement!(super::imp);
//! # }
//! # mod imp {
//! # use core::ffi::c_char;
//! # use vellum_abi::{RawClosure, RawOwnedSlice};
//! # use super::kv::{KvEntry, KvStore};
//! pub fn create() -> *mut KvStore {
//!     core::ptr::null_mut()
//! }
//! # pub fn set(_: *mut KvStore, _: *const c_char, _: *const c_char) {}
//! # pub fn get(_: *const KvStore, _: *const c_char) -> *const c_char { core::ptr::null() }
//! # pub fn delete(_: *mut KvStore, _: *const c_char) -> bool { false }
//! # pub fn entries(_: *const KvStore) -> RawOwnedSlice<KvEntry> { RawOwnedSlice::default() }
//! # pub fn for_each(_: *const KvStore, _: RawClosure<fn(*const c_char, *const c_char)>) {}
//! # }
//! # fn main() {}
//! ```
//!
//! And a wrong number of arguments:
//!
//! ```compile_fail,E0308
//! # #![allow(unsafe_code, dead_code)]
//! # mod kv {
//! #     vellum_e2e::kv_check_bindings!();
//! #     vellum_implement!(super::imp);
//! # }
//! # mod imp {
//! # use core::ffi::c_char;
//! # use vellum_abi::{RawClosure, RawOwnedPtr, RawOwnedSlice};
//! # use super::kv::{KvEntry, KvStore};
//! # pub fn create() -> RawOwnedPtr<KvStore> { RawOwnedPtr::default() }
//! pub fn set(_: *mut KvStore, _: *const c_char) {}
//! # pub fn get(_: *const KvStore, _: *const c_char) -> *const c_char { core::ptr::null() }
//! # pub fn delete(_: *mut KvStore, _: *const c_char) -> bool { false }
//! # pub fn entries(_: *const KvStore) -> RawOwnedSlice<KvEntry> { RawOwnedSlice::default() }
//! # pub fn for_each(_: *const KvStore, _: RawClosure<fn(*const c_char, *const c_char)>) {}
//! # }
//! # fn main() {}
//! ```
//!
//! A missing function is reported too:
//!
//! ```compile_fail,E0425
//! # #![allow(unsafe_code, dead_code)]
//! # mod kv {
//! #     vellum_e2e::kv_check_bindings!();
//! #     vellum_implement!(super::imp);
//! # }
//! mod imp {
//!     // no `for_each`
//! # use core::ffi::c_char;
//! # use vellum_abi::{RawOwnedPtr, RawOwnedSlice};
//! # use super::kv::{KvEntry, KvStore};
//! # pub fn create() -> RawOwnedPtr<KvStore> { RawOwnedPtr::default() }
//! # pub fn set(_: *mut KvStore, _: *const c_char, _: *const c_char) {}
//! # pub fn get(_: *const KvStore, _: *const c_char) -> *const c_char { core::ptr::null() }
//! # pub fn delete(_: *mut KvStore, _: *const c_char) -> bool { false }
//! # pub fn entries(_: *const KvStore) -> RawOwnedSlice<KvEntry> { RawOwnedSlice::default() }
//! }
//! # fn main() {}
//! ```
#![expect(unsafe_code, reason = "Implements and calls extern \"C\" functions.")]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc, reason = "test harness")]

pub mod kv {
    include!(concat!(env!("OUT_DIR"), "/kv.rs"));

    vellum_implement!(super::store);
}

mod store;

pub use store::entries_freed;

/// The C header generated from the same description.
pub const KV_HEADER: &str = include_str!(concat!(env!("OUT_DIR"), "/kv.h"));

include!(concat!(env!("OUT_DIR"), "/kv_check_macro.rs"));
