use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ops::{Deref, DerefMut};

use crate::{OutOfRange, Slice, SliceMut, drop_boxed_slice};

/// Frees the block behind an [`OwnedSlice`]. It receives the whole view.
pub type SliceDeleter<T> = unsafe extern "C" fn(SliceMut<T>);

// -----------------------------------------------------------------------------
// RawOwnedSlice

/// POD form of [`OwnedSlice`]: `{ slice, deleter }`.
///
/// Same ownership rules as [`RawOwnedPtr`](crate::RawOwnedPtr): the deleter
/// is only called when `slice.data` is non-null, and a `None` deleter means
/// the block is not owned.
#[repr(C)]
#[must_use = "dropping a `RawOwnedSlice` leaks its elements"]
pub struct RawOwnedSlice<T> {
    pub slice: SliceMut<T>,
    pub deleter: Option<SliceDeleter<T>>,
}

impl<T> Clone for RawOwnedSlice<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawOwnedSlice<T> {}

impl<T> Default for RawOwnedSlice<T> {
    #[inline(always)]
    fn default() -> Self {
        Self::NULL
    }
}

impl<T> fmt::Debug for RawOwnedSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawOwnedSlice")
            .field("slice", &self.slice)
            .field("deleter", &self.deleter.map(|d| d as *const ()))
            .finish()
    }
}

impl<T> RawOwnedSlice<T> {
    /// `{ { null, 0 }, None }`
    pub const NULL: Self = Self {
        slice: SliceMut::EMPTY,
        deleter: None,
    };
}

impl<T> From<OwnedSlice<T>> for RawOwnedSlice<T> {
    #[inline]
    fn from(owned: OwnedSlice<T>) -> Self {
        owned.into_raw()
    }
}

// -----------------------------------------------------------------------------
// OwnedSlice

/// Unique ownership of a block of `len` values, freed by a stored deleter.
///
/// Reads and writes go through `Deref<Target = [T]>`.
///
/// # Examples
///
/// ```
/// use vellum_abi::OwnedSlice;
///
/// let mut s = OwnedSlice::from_elem(0_u8, 4);
/// s[1] = 9;
/// assert_eq!(&*s, &[0, 9, 0, 0]);
///
/// let raw = s.into_raw();
/// let s = unsafe { OwnedSlice::from_raw(raw) };
/// assert_eq!(s.at(1), Ok(&9));
/// assert!(s.at(4).is_err());
/// ```
pub struct OwnedSlice<T> {
    slice: SliceMut<T>,
    deleter: Option<SliceDeleter<T>>,
    _marker: PhantomData<T>,
}

// SAFETY: `OwnedSlice<T>` owns its elements uniquely, like `Box<[T]>`.
unsafe impl<T: Send> Send for OwnedSlice<T> {}
// SAFETY: `&OwnedSlice<T>` only hands out `&[T]`.
unsafe impl<T: Sync> Sync for OwnedSlice<T> {}

impl<T> OwnedSlice<T> {
    /// An empty slice, `{ null, 0 }` with no deleter.
    #[inline(always)]
    pub const fn null() -> Self {
        Self {
            slice: SliceMut::EMPTY,
            deleter: None,
            _marker: PhantomData,
        }
    }

    /// Allocates one block of `count` clones of `value`.
    ///
    /// `count == 0` yields a zero-length slice whose deleter is still set and
    /// safe to call.
    pub fn from_elem(value: T, count: usize) -> Self
    where
        T: Clone,
    {
        Self::from(alloc::vec![value; count])
    }

    /// Takes over the elements of `vec`. Spare capacity is released first.
    #[inline]
    pub fn from_vec(vec: Vec<T>) -> Self {
        Self::from(vec.into_boxed_slice())
    }

    /// Adopts `slice`, to be freed with `deleter`.
    ///
    /// # Safety
    /// If `slice.data` is non-null, it must be valid for reads and writes of
    /// `slice.len` values, and `deleter(slice)` must be a sound way to free
    /// them. Nothing else may free the block.
    #[inline(always)]
    pub const unsafe fn from_raw_parts(slice: SliceMut<T>, deleter: Option<SliceDeleter<T>>) -> Self {
        Self {
            slice,
            deleter,
            _marker: PhantomData,
        }
    }

    /// Adopts a POD slice received across the boundary.
    ///
    /// # Safety
    /// See [`from_raw_parts`](Self::from_raw_parts). `raw` must not be adopted
    /// twice.
    #[inline(always)]
    pub const unsafe fn from_raw(raw: RawOwnedSlice<T>) -> Self {
        // SAFETY: forwarded to the caller.
        unsafe { Self::from_raw_parts(raw.slice, raw.deleter) }
    }

    /// Gives up ownership as a POD slice without running the deleter.
    #[inline]
    pub fn into_raw(self) -> RawOwnedSlice<T> {
        let this = ManuallyDrop::new(self);
        RawOwnedSlice {
            slice: this.slice,
            deleter: this.deleter,
        }
    }

    /// Returns the view and leaves `self` empty without running the deleter.
    #[inline]
    pub fn release(&mut self) -> SliceMut<T> {
        self.deleter = None;
        mem::take(&mut self.slice)
    }

    /// Runs the current deleter, then adopts `slice` and `deleter`.
    ///
    /// # Safety
    /// Same as [`from_raw_parts`](Self::from_raw_parts).
    pub unsafe fn reset(&mut self, slice: SliceMut<T>, deleter: Option<SliceDeleter<T>>) {
        self.delete();
        self.slice = slice;
        self.deleter = deleter;
    }

    /// Runs the current deleter and leaves `self` empty.
    #[inline]
    pub fn clear(&mut self) {
        // SAFETY: the null pair owns nothing.
        unsafe { self.reset(SliceMut::EMPTY, None) }
    }

    /// Moves the contents out, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Exchanges the contents of two slices.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Returns the element at `index`, or [`OutOfRange`].
    #[inline]
    pub fn at(&self, index: usize) -> Result<&T, OutOfRange> {
        OutOfRange::check(index, self.slice.len)?;
        Ok(&self[index])
    }

    /// Returns the owned view. It stays owned by `self`.
    #[inline(always)]
    pub const fn get_slice(&self) -> SliceMut<T> {
        self.slice
    }

    /// Returns the owned view as a read-only [`Slice`].
    #[inline(always)]
    pub const fn as_view(&self) -> Slice<T> {
        self.slice.as_const()
    }

    /// Returns the deleter that will free the block.
    #[inline(always)]
    pub const fn get_deleter(&self) -> Option<SliceDeleter<T>> {
        self.deleter
    }

    /// Returns `true` if no block is held. A zero-length block is not null.
    #[inline(always)]
    pub const fn is_null(&self) -> bool {
        self.slice.data.is_null()
    }

    /// Copies the elements out and frees the block.
    pub fn into_vec(self) -> Vec<T>
    where
        T: Clone,
    {
        self.to_vec()
    }

    fn delete(&mut self) {
        if self.slice.data.is_null() {
            return;
        }
        if let Some(deleter) = self.deleter {
            // SAFETY: `deleter` frees `slice` per the construction contract.
            unsafe { deleter(self.slice) };
        }
    }
}

impl<T> Drop for OwnedSlice<T> {
    #[inline]
    fn drop(&mut self) {
        self.delete();
    }
}

impl<T> Default for OwnedSlice<T> {
    #[inline(always)]
    fn default() -> Self {
        Self::null()
    }
}

impl<T> Deref for OwnedSlice<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        // SAFETY: an owned block is valid for `len` reads while `self` lives.
        unsafe { self.slice.as_const().as_slice() }
    }
}

impl<T> DerefMut for OwnedSlice<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: an owned block is valid for `len` writes and uniquely borrowed.
        unsafe { self.slice.as_mut_slice() }
    }
}

impl<T> From<Box<[T]>> for OwnedSlice<T> {
    fn from(block: Box<[T]>) -> Self {
        let len = block.len();
        let data = Box::into_raw(block).cast::<T>();
        // SAFETY: `drop_boxed_slice` frees exactly what `Box::into_raw` returns.
        unsafe {
            Self::from_raw_parts(
                SliceMut::from_raw_parts(data, len),
                Some(drop_boxed_slice::<T>),
            )
        }
    }
}

impl<T> From<Vec<T>> for OwnedSlice<T> {
    #[inline]
    fn from(vec: Vec<T>) -> Self {
        Self::from_vec(vec)
    }
}

impl<'a, T> IntoIterator for &'a OwnedSlice<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for OwnedSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::{OwnedSlice, RawOwnedSlice};
    use crate::SliceMut;

    #[test]
    fn zero_count_has_len_zero_and_safe_deleter() {
        let s = OwnedSlice::from_elem(String::new(), 0);
        assert_eq!(s.len(), 0);
        let deleter = s.get_deleter().unwrap();

        let raw = s.into_raw();
        // `{ dangling, 0 }` and `{ null, 0 }` both pass through the deleter untouched.
        unsafe { deleter(raw.slice) };
        unsafe { deleter(SliceMut::EMPTY) };
    }

    #[test]
    fn deleter_runs_once_per_block() {
        static DELETES: AtomicUsize = AtomicUsize::new(0);
        unsafe extern "C" fn counting_delete(slice: SliceMut<u32>) {
            DELETES.fetch_add(1, Ordering::SeqCst);
            unsafe { crate::drop_boxed_slice(slice) };
        }

        let mut block = OwnedSlice::from(vec![1_u32, 2, 3]);
        let view = block.release();
        let owned = unsafe { OwnedSlice::from_raw_parts(view, Some(counting_delete)) };

        let raw: RawOwnedSlice<u32> = owned.into();
        let owned = unsafe { OwnedSlice::from_raw(raw) };
        assert_eq!(DELETES.load(Ordering::SeqCst), 0);
        assert_eq!(owned.iter().sum::<u32>(), 6);

        drop(owned);
        assert_eq!(DELETES.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn take_and_swap() {
        let mut a = OwnedSlice::from(vec!["x".to_string(), "y".to_string()]);
        let mut b = a.take();
        assert!(a.is_null());
        assert!(a.is_empty());
        assert!(a.get_deleter().is_none());
        assert_eq!(b.len(), 2);

        a.swap(&mut b);
        assert_eq!(a.to_vec(), ["x", "y"]);
        assert!(b.is_null());
    }

    #[test]
    fn elements_are_mutable_and_cloned_out() {
        let mut s = OwnedSlice::from_elem(1_i64, 3);
        for x in s.iter_mut() {
            *x *= 2;
        }
        assert_eq!(s.at(2), Ok(&2));
        assert_eq!(s.into_vec(), vec![2, 2, 2]);
    }

    #[test]
    fn clear_frees_and_empties() {
        let mut s = OwnedSlice::from(vec![String::from("a")]);
        s.clear();
        assert!(s.is_null());
        assert_eq!(s.len(), 0);
    }
}
