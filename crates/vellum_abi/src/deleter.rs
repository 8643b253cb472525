//! Default deleters for resources allocated by Rust's global allocator.

use alloc::boxed::Box;
use core::ptr;

use crate::SliceMut;

/// Frees an object allocated with [`Box`]. Null is ignored.
///
/// This is the deleter installed by [`OwnedPtr::new`](crate::OwnedPtr::new)
/// and `From<Box<T>>`.
///
/// # Safety
/// `data` must be null or come from `Box::<T>::into_raw`, and must not be
/// used afterwards.
pub unsafe extern "C" fn drop_box<T>(data: *mut T) {
    if data.is_null() {
        return;
    }
    // SAFETY: `data` came from `Box::into_raw` per the caller.
    drop(unsafe { Box::from_raw(data) });
}

/// Frees a block allocated as a `Box<[T]>`, dropping every element.
///
/// This is the deleter installed by the `OwnedSlice` constructors. It
/// tolerates `{ null, 0 }` and `{ dangling, 0 }`; neither frees anything.
///
/// # Safety
/// `slice` must be `{ null, _ }` or describe exactly a block that came from
/// `Box::<[T]>::into_raw`, and must not be used afterwards.
pub unsafe extern "C" fn drop_boxed_slice<T>(slice: SliceMut<T>) {
    if slice.data.is_null() {
        return;
    }
    let raw = ptr::slice_from_raw_parts_mut(slice.data, slice.len);
    // SAFETY: `raw` is the fat pointer `Box::into_raw` returned, per the caller.
    // A zero-length box owns no allocation and drops no element.
    drop(unsafe { Box::from_raw(raw) });
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec::Vec;
    use core::ptr;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::{drop_box, drop_boxed_slice};
    use crate::SliceMut;

    #[test]
    fn null_is_ignored() {
        unsafe {
            drop_box::<u32>(ptr::null_mut());
            drop_boxed_slice::<u32>(SliceMut::EMPTY);
            drop_boxed_slice::<u32>(SliceMut::from_raw_parts(ptr::null_mut(), 7));
        }
    }

    #[test]
    fn zero_length_block_drops_nothing() {
        static DROPS: AtomicUsize = AtomicUsize::new(0);
        struct Counted;
        impl Drop for Counted {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::Relaxed);
            }
        }

        let block: Box<[Counted]> = Vec::new().into_boxed_slice();
        let data = Box::into_raw(block).cast::<Counted>();
        unsafe { drop_boxed_slice(SliceMut::from_raw_parts(data, 0)) };
        assert_eq!(DROPS.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn block_elements_drop_once() {
        static DROPS: AtomicUsize = AtomicUsize::new(0);
        struct Counted;
        impl Drop for Counted {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::Relaxed);
            }
        }

        let block: Box<[Counted]> = [Counted, Counted, Counted].into();
        let data = Box::into_raw(block).cast::<Counted>();
        unsafe { drop_boxed_slice(SliceMut::from_raw_parts(data, 3)) };
        assert_eq!(DROPS.load(Ordering::Relaxed), 3);
    }
}
