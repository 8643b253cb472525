#![expect(unsafe_code, reason = "The generated wrappers are unsafe fns.")]

use std::cell::RefCell;
use std::ffi::{CStr, c_char};
use std::rc::Rc;

use vellum_abi::{Closure, OwnedPtr};
use vellum_e2e::kv::{self, KvStore};

fn text<'a>(ptr: *const c_char) -> &'a str {
    assert!(!ptr.is_null());
    let text = unsafe { CStr::from_ptr(ptr) };
    text.to_str().unwrap()
}

fn store() -> OwnedPtr<KvStore> {
    let store = unsafe { kv::create() };
    assert!(!store.is_null());
    assert!(store.get_deleter().is_some());
    store
}

#[test]
fn set_get_delete_and_snapshot() {
    let store = store();
    let handle = store.get();

    // Zero-length snapshots go through the same deleter.
    let empty = unsafe { kv::entries(handle) };
    assert!(empty.is_empty());
    let freed = vellum_e2e::entries_freed();
    drop(empty);
    assert_eq!(vellum_e2e::entries_freed(), freed + 1);

    unsafe {
        kv::set(handle, c"Alice".as_ptr(), c"teacher".as_ptr());
        kv::set(handle, c"Bob".as_ptr(), c"musician".as_ptr());
        assert!(kv::delete(handle, c"Bob".as_ptr()));
        assert!(!kv::delete(handle, c"Bob".as_ptr()));
    }

    assert_eq!(text(unsafe { kv::get(handle, c"Alice".as_ptr()) }), "teacher");
    assert!(unsafe { kv::get(handle, c"Bob".as_ptr()) }.is_null());

    let freed = vellum_e2e::entries_freed();
    let entries = unsafe { kv::entries(handle) };
    assert_eq!(entries.len(), 1);
    assert_eq!(text(entries[0].key), "Alice");
    assert_eq!(text(entries[0].value), "teacher");

    assert_eq!(vellum_e2e::entries_freed(), freed);
    drop(entries);
    assert_eq!(vellum_e2e::entries_freed(), freed + 1);
}

#[test]
fn for_each_visits_in_key_order() {
    let store = store();
    unsafe {
        kv::set(store.get(), c"b".as_ptr(), c"2".as_ptr());
        kv::set(store.get(), c"a".as_ptr(), c"1".as_ptr());
    }

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let visit = Closure::<fn(*const c_char, *const c_char)>::new(move |key, value| {
        sink.borrow_mut().push(format!("{}={}", text(key), text(value)));
    });
    unsafe { kv::for_each(store.get(), visit) };

    assert_eq!(*seen.borrow(), ["a=1", "b=2"]);
    // The callee dropped the closure and with it the captured `Rc`.
    assert_eq!(Rc::strong_count(&seen), 1);
}

#[test]
fn missing_keys_read_as_null() {
    let store = store();
    assert!(unsafe { kv::get(store.get(), c"missing".as_ptr()) }.is_null());
    assert!(!unsafe { kv::delete(store.get(), c"missing".as_ptr()) });
}

#[test]
fn c_header_matches_the_description() {
    let header = vellum_e2e::KV_HEADER;
    assert!(header.contains("KV_ABI bool kv_delete(struct KvStore *store, const char *key);"));
    assert!(header.contains("KV_ABI kv_owned_ptr_KvStore kv_create(void);"));
}
