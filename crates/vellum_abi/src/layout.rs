//! Compile-time checks that the POD forms keep their C layout.
//!
//! Field order is part of the ABI; foreign headers rely on these offsets.

use core::ffi::c_void;
use core::mem::offset_of;

use crate::{RawClosure, RawOwnedPtr, RawOwnedSlice, Slice, SliceMut};

const WORD: usize = size_of::<usize>();

const _: () = {
    assert!(size_of::<Slice<u8>>() == 2 * WORD);
    assert!(align_of::<Slice<u8>>() == align_of::<usize>());
    assert!(offset_of!(Slice<u8>, data) == 0);
    assert!(offset_of!(Slice<u8>, len) == WORD);

    assert!(size_of::<SliceMut<u64>>() == 2 * WORD);
    assert!(offset_of!(SliceMut<u64>, len) == WORD);
};

const _: () = {
    assert!(size_of::<RawOwnedPtr<u8>>() == 2 * WORD);
    assert!(align_of::<RawOwnedPtr<u8>>() == align_of::<usize>());
    assert!(offset_of!(RawOwnedPtr<u8>, data) == 0);
    assert!(offset_of!(RawOwnedPtr<u8>, deleter) == WORD);
};

const _: () = {
    assert!(size_of::<RawOwnedSlice<u8>>() == 3 * WORD);
    assert!(align_of::<RawOwnedSlice<u8>>() == align_of::<usize>());
    assert!(offset_of!(RawOwnedSlice<u8>, slice) == 0);
    assert!(offset_of!(RawOwnedSlice<u8>, deleter) == 2 * WORD);
};

const _: () = {
    assert!(size_of::<RawClosure<fn()>>() == 3 * WORD);
    assert!(size_of::<RawClosure<fn(i32, *const c_void) -> u64>>() == 3 * WORD);
    assert!(align_of::<RawClosure<fn() -> i32>>() == align_of::<usize>());
    assert!(offset_of!(RawClosure<fn()>, caller) == 0);
    assert!(offset_of!(RawClosure<fn()>, state) == WORD);
    assert!(offset_of!(RawClosure<fn()>, deleter) == 2 * WORD);
};
