//! The implementation behind the `kv_*` symbols.
//!
//! Every function takes and returns the POD forms; `vellum_implement!` checks
//! each signature against the declarations.

use std::collections::BTreeMap;
use std::ffi::{CStr, CString, c_char};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use vellum_abi::{Closure, RawClosure, RawOwnedPtr, RawOwnedSlice, SliceMut, drop_boxed_slice};

use crate::kv::{KvEntry, KvStore};

/// What a `KvStore` pointer really points to.
#[derive(Default)]
struct Store {
    map: BTreeMap<CString, CString>,
}

static ENTRIES_FREED: AtomicUsize = AtomicUsize::new(0);

/// How many `entries` snapshots have been freed so far.
pub fn entries_freed() -> usize {
    ENTRIES_FREED.load(Ordering::SeqCst)
}

// Every `store` argument below was returned by `create` and is still owned by
// the caller. Every string is nul-terminated.

unsafe fn store_ref<'a>(store: *const KvStore) -> &'a Store {
    unsafe { &*store.cast::<Store>() }
}

unsafe fn store_mut<'a>(store: *mut KvStore) -> &'a mut Store {
    unsafe { &mut *store.cast::<Store>() }
}

unsafe extern "C" fn drop_store(store: *mut KvStore) {
    if !store.is_null() {
        drop(unsafe { Box::from_raw(store.cast::<Store>()) });
    }
}

unsafe extern "C" fn free_entries(entries: SliceMut<KvEntry>) {
    ENTRIES_FREED.fetch_add(1, Ordering::SeqCst);
    log::trace!("freeing {} entries", entries.len());
    unsafe { drop_boxed_slice(entries) }
}

pub fn create() -> RawOwnedPtr<KvStore> {
    let store = Box::into_raw(Box::new(Store::default()));
    RawOwnedPtr {
        data: store.cast::<KvStore>(),
        deleter: Some(drop_store),
    }
}

pub unsafe fn set(store: *mut KvStore, key: *const c_char, value: *const c_char) {
    let (key, value) = unsafe { (CStr::from_ptr(key), CStr::from_ptr(value)) };
    let store = unsafe { store_mut(store) };
    store.map.insert(key.to_owned(), value.to_owned());
}

/// The value stays valid until `key` is set again or deleted.
pub unsafe fn get(store: *const KvStore, key: *const c_char) -> *const c_char {
    let (store, key) = unsafe { (store_ref(store), CStr::from_ptr(key)) };
    store.map.get(key).map_or(ptr::null(), |value| value.as_ptr())
}

pub unsafe fn delete(store: *mut KvStore, key: *const c_char) -> bool {
    let (store, key) = unsafe { (store_mut(store), CStr::from_ptr(key)) };
    store.map.remove(key).is_some()
}

/// A snapshot whose strings borrow from the store.
pub unsafe fn entries(store: *const KvStore) -> RawOwnedSlice<KvEntry> {
    let store = unsafe { store_ref(store) };
    let entries: Box<[KvEntry]> = store
        .map
        .iter()
        .map(|(key, value)| KvEntry {
            key: key.as_ptr(),
            value: value.as_ptr(),
        })
        .collect();

    let len = entries.len();
    let data = Box::into_raw(entries).cast::<KvEntry>();
    RawOwnedSlice {
        slice: SliceMut::from_raw_parts(data, len),
        deleter: Some(free_entries),
    }
}

pub unsafe fn for_each(store: *const KvStore, visit: RawClosure<fn(*const c_char, *const c_char)>) {
    let (store, visit) = unsafe { (store_ref(store), Closure::from_raw(visit)) };
    for (key, value) in &store.map {
        visit.call(key.as_ptr(), value.as_ptr());
    }
}
