use alloc::boxed::Box;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ptr;

use crate::drop_box;

/// Frees the object behind an [`OwnedPtr`].
pub type PtrDeleter<T> = unsafe extern "C" fn(*mut T);

// -----------------------------------------------------------------------------
// RawOwnedPtr

/// POD form of [`OwnedPtr`]: `{ data, deleter }`.
///
/// - If `data` is null the deleter is never called.
/// - If `deleter` is `None` the holder must not free `data`.
///
/// Whoever holds a `RawOwnedPtr` with both fields set must call the deleter
/// exactly once, usually by turning it back into an [`OwnedPtr`].
#[repr(C)]
#[must_use = "dropping a `RawOwnedPtr` leaks its pointee"]
pub struct RawOwnedPtr<T> {
    pub data: *mut T,
    pub deleter: Option<PtrDeleter<T>>,
}

impl<T> Clone for RawOwnedPtr<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawOwnedPtr<T> {}

impl<T> Default for RawOwnedPtr<T> {
    /// `{ null, None }`
    #[inline(always)]
    fn default() -> Self {
        Self::NULL
    }
}

impl<T> fmt::Debug for RawOwnedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawOwnedPtr")
            .field("data", &self.data)
            .field("deleter", &self.deleter.map(|d| d as *const ()))
            .finish()
    }
}

impl<T> RawOwnedPtr<T> {
    /// `{ null, None }`
    pub const NULL: Self = Self {
        data: ptr::null_mut(),
        deleter: None,
    };
}

impl<T> From<OwnedPtr<T>> for RawOwnedPtr<T> {
    #[inline]
    fn from(owned: OwnedPtr<T>) -> Self {
        owned.into_raw()
    }
}

// -----------------------------------------------------------------------------
// OwnedPtr

/// Unique ownership of one object, freed by a stored deleter.
///
/// `OwnedPtr` behaves like a nullable [`Box`] whose deallocation routine was
/// chosen by whoever allocated the object. It can be turned into a
/// [`RawOwnedPtr`] to cross an `extern "C"` boundary and rebuilt on the other
/// side without copying or allocating.
///
/// # Examples
///
/// ```
/// use vellum_abi::OwnedPtr;
///
/// let mut p = OwnedPtr::new(String::from("hello"));
/// p.as_mut().unwrap().push_str(", world");
///
/// let raw = p.into_raw();
/// let p = unsafe { OwnedPtr::from_raw(raw) };
/// assert_eq!(p.as_ref().map(String::as_str), Some("hello, world"));
/// ```
pub struct OwnedPtr<T> {
    data: *mut T,
    deleter: Option<PtrDeleter<T>>,
    _marker: PhantomData<T>,
}

// SAFETY: `OwnedPtr<T>` owns its `T` uniquely, like `Box<T>`.
unsafe impl<T: Send> Send for OwnedPtr<T> {}
// SAFETY: `&OwnedPtr<T>` only hands out `&T`.
unsafe impl<T: Sync> Sync for OwnedPtr<T> {}

impl<T> OwnedPtr<T> {
    /// An empty pointer. Dropping it does nothing.
    #[inline(always)]
    pub const fn null() -> Self {
        Self {
            data: ptr::null_mut(),
            deleter: None,
            _marker: PhantomData,
        }
    }

    /// Boxes `value` and takes ownership of it, with [`drop_box`] as the deleter.
    #[inline]
    pub fn new(value: T) -> Self {
        Self::from(Box::new(value))
    }

    /// Adopts `data`, to be freed with `deleter`.
    ///
    /// # Safety
    /// If both are non-null, `data` must be valid for reads and writes of a `T`
    /// and `deleter(data)` must be a sound way to free it. Nothing else may
    /// free `data`.
    #[inline(always)]
    pub const unsafe fn from_raw_parts(data: *mut T, deleter: Option<PtrDeleter<T>>) -> Self {
        Self {
            data,
            deleter,
            _marker: PhantomData,
        }
    }

    /// Adopts a POD pointer received across the boundary.
    ///
    /// # Safety
    /// See [`from_raw_parts`](Self::from_raw_parts). `raw` must not be adopted
    /// twice.
    #[inline(always)]
    pub const unsafe fn from_raw(raw: RawOwnedPtr<T>) -> Self {
        // SAFETY: forwarded to the caller.
        unsafe { Self::from_raw_parts(raw.data, raw.deleter) }
    }

    /// Gives up ownership as a POD pointer without running the deleter.
    #[inline]
    pub fn into_raw(self) -> RawOwnedPtr<T> {
        let this = ManuallyDrop::new(self);
        RawOwnedPtr {
            data: this.data,
            deleter: this.deleter,
        }
    }

    /// Returns the pointer and leaves `self` empty. The deleter is not run;
    /// freeing the object becomes the caller's business.
    #[inline]
    pub fn release(&mut self) -> *mut T {
        let data = mem::replace(&mut self.data, ptr::null_mut());
        self.deleter = None;
        data
    }

    /// Runs the current deleter, then adopts `data` and `deleter`.
    ///
    /// # Safety
    /// Same as [`from_raw_parts`](Self::from_raw_parts).
    pub unsafe fn reset(&mut self, data: *mut T, deleter: Option<PtrDeleter<T>>) {
        self.delete();
        self.data = data;
        self.deleter = deleter;
    }

    /// Runs the current deleter and leaves `self` empty.
    #[inline]
    pub fn clear(&mut self) {
        // SAFETY: the null pair owns nothing.
        unsafe { self.reset(ptr::null_mut(), None) }
    }

    /// Moves the contents out, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Exchanges the contents of two pointers.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Returns the raw pointer, which may be null.
    #[inline(always)]
    pub const fn get(&self) -> *mut T {
        self.data
    }

    /// Returns the deleter that will free the object.
    #[inline(always)]
    pub const fn get_deleter(&self) -> Option<PtrDeleter<T>> {
        self.deleter
    }

    #[inline(always)]
    pub const fn is_null(&self) -> bool {
        self.data.is_null()
    }

    #[inline]
    pub const fn as_ref(&self) -> Option<&T> {
        // SAFETY: a non-null `data` is valid per the construction contract.
        unsafe { self.data.as_ref() }
    }

    #[inline]
    pub const fn as_mut(&mut self) -> Option<&mut T> {
        // SAFETY: a non-null `data` is valid and uniquely owned.
        unsafe { self.data.as_mut() }
    }

    fn delete(&mut self) {
        if self.data.is_null() {
            return;
        }
        if let Some(deleter) = self.deleter {
            // SAFETY: `deleter` frees `data` per the construction contract.
            unsafe { deleter(self.data) };
        }
    }
}

impl<T> Drop for OwnedPtr<T> {
    #[inline]
    fn drop(&mut self) {
        self.delete();
    }
}

impl<T> Default for OwnedPtr<T> {
    #[inline(always)]
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Box<T>> for OwnedPtr<T> {
    #[inline]
    fn from(boxed: Box<T>) -> Self {
        // SAFETY: `drop_box` frees exactly what `Box::into_raw` returns.
        unsafe { Self::from_raw_parts(Box::into_raw(boxed), Some(drop_box::<T>)) }
    }
}

impl<T: fmt::Debug> fmt::Debug for OwnedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedPtr").field(&self.as_ref()).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use core::ptr;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::{OwnedPtr, RawOwnedPtr};

    #[test]
    fn round_trip_keeps_pointer_and_deletes_once() {
        static DELETES: AtomicUsize = AtomicUsize::new(0);
        unsafe extern "C" fn counting_delete(data: *mut u64) {
            DELETES.fetch_add(1, Ordering::SeqCst);
            drop(unsafe { Box::from_raw(data) });
        }

        let data = Box::into_raw(Box::new(7_u64));
        let owned = unsafe { OwnedPtr::from_raw_parts(data, Some(counting_delete)) };

        let raw: RawOwnedPtr<u64> = owned.into();
        assert_eq!(DELETES.load(Ordering::SeqCst), 0);
        assert_eq!(raw.data, data);

        let back = unsafe { OwnedPtr::from_raw(raw) };
        assert_eq!(DELETES.load(Ordering::SeqCst), 0);
        assert_eq!(back.get(), data);
        assert_eq!(back.as_ref(), Some(&7));

        drop(back);
        assert_eq!(DELETES.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut a = OwnedPtr::new(3_i32);
        let original = a.get();

        let b = a.take();
        assert!(a.is_null());
        assert!(a.get_deleter().is_none());
        assert_eq!(b.get(), original);
        drop(a);
        assert_eq!(b.as_ref(), Some(&3));
    }

    #[test]
    fn null_data_never_calls_deleter() {
        unsafe extern "C" fn must_not_run(_: *mut u8) {
            panic!("deleter called on null");
        }
        let p = unsafe { OwnedPtr::from_raw_parts(ptr::null_mut(), Some(must_not_run)) };
        assert!(p.is_null());
        drop(p);
    }

    #[test]
    fn release_skips_the_deleter() {
        let mut p = OwnedPtr::new(5_u16);
        let data = p.release();
        assert!(p.is_null());
        drop(p);
        // Still ours to free.
        assert_eq!(*unsafe { Box::from_raw(data) }, 5);
    }

    #[test]
    fn reset_runs_previous_deleter() {
        static DELETES: AtomicUsize = AtomicUsize::new(0);
        unsafe extern "C" fn counting_delete(data: *mut u8) {
            DELETES.fetch_add(1, Ordering::SeqCst);
            drop(unsafe { Box::from_raw(data) });
        }

        let first = Box::into_raw(Box::new(1_u8));
        let second = Box::into_raw(Box::new(2_u8));
        let mut p = unsafe { OwnedPtr::from_raw_parts(first, Some(counting_delete)) };

        unsafe { p.reset(second, Some(counting_delete)) };
        assert_eq!(DELETES.load(Ordering::SeqCst), 1);
        assert_eq!(p.as_ref(), Some(&2));

        p.clear();
        assert_eq!(DELETES.load(Ordering::SeqCst), 2);
        assert!(p.is_null());
    }

    #[test]
    fn swap_exchanges_both_fields() {
        let mut a = OwnedPtr::new('a');
        let mut b = OwnedPtr::null();
        a.swap(&mut b);
        assert!(a.is_null());
        assert_eq!(b.as_ref(), Some(&'a'));
        assert!(b.get_deleter().is_some());
    }
}
