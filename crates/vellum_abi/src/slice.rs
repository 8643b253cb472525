use core::fmt;
use core::ptr;

use crate::OutOfRange;

// -----------------------------------------------------------------------------
// Slice & SliceMut

/// A non-owning view `(data, len)` with the layout of a C struct.
///
/// `Slice` carries no lifetime, so every read through it is `unsafe`: the
/// caller promises that `data` points to `len` initialized values that
/// outlive the access. A null `data` with `len == 0` is the empty slice.
///
/// Use [`SliceMut`] for views that may be written through.
///
/// # Examples
///
/// ```
/// use vellum_abi::Slice;
///
/// let x = [1, 2, 3, 4];
/// let view = Slice::from_ref(&x);
///
/// assert_eq!(view.len(), 4);
/// assert_eq!(unsafe { *view.get_unchecked(2) }, 3);
/// assert_eq!(unsafe { view.as_slice() }, &[1, 2, 3, 4]);
/// ```
#[repr(C)]
pub struct Slice<T> {
    pub data: *const T,
    pub len: usize,
}

/// A non-owning mutable view `(data, len)` with the layout of a C struct.
///
/// Same contract as [`Slice`], plus write access.
///
/// # Examples
///
/// ```
/// use vellum_abi::SliceMut;
///
/// let mut x = [1, 2, 3];
/// let view = SliceMut::from_mut(&mut x);
///
/// unsafe { view.as_mut_slice()[0] = 10 };
/// assert_eq!(x, [10, 2, 3]);
/// ```
#[repr(C)]
pub struct SliceMut<T> {
    pub data: *mut T,
    pub len: usize,
}

macro_rules! impl_slice {
    ($name:ident, $ptr:ty, $null:path) => {
        impl<T> Clone for $name<T> {
            #[inline(always)]
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T> Default for $name<T> {
            /// `{ null, 0 }`
            #[inline(always)]
            fn default() -> Self {
                Self::EMPTY
            }
        }

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("data", &self.data)
                    .field("len", &self.len)
                    .finish()
            }
        }

        impl<T> $name<T> {
            /// The empty view, `{ null, 0 }`.
            pub const EMPTY: Self = Self {
                data: $null(),
                len: 0,
            };

            /// Creates a view from its two fields. Nothing is read.
            #[inline(always)]
            pub const fn from_raw_parts(data: $ptr, len: usize) -> Self {
                Self { data, len }
            }

            /// Returns the data pointer.
            #[inline(always)]
            pub const fn data(self) -> $ptr {
                self.data
            }

            /// Returns the number of elements.
            #[inline(always)]
            pub const fn len(self) -> usize {
                self.len
            }

            /// Returns `true` if the view has no elements.
            #[inline(always)]
            pub const fn is_empty(self) -> bool {
                self.len == 0
            }

            /// Returns a reference to the element at `index`, or [`OutOfRange`].
            ///
            /// # Safety
            /// The view must be valid for reads for `'a`.
            #[inline]
            pub unsafe fn at<'a>(self, index: usize) -> Result<&'a T, OutOfRange> {
                OutOfRange::check(index, self.len)?;
                // SAFETY: bounds checked above, validity guaranteed by the caller.
                Ok(unsafe { &*self.data.add(index) })
            }

            /// Returns a reference to the element at `index` without a bounds check.
            ///
            /// # Safety
            /// `index < self.len()` and the view must be valid for reads for `'a`.
            #[cfg_attr(debug_assertions, track_caller)]
            #[cfg_attr(not(debug_assertions), inline(always))]
            pub unsafe fn get_unchecked<'a>(self, index: usize) -> &'a T {
                #[cfg(all(debug_assertions, feature = "debug"))]
                assert!(index < self.len, "tried to index out-of-bounds of a slice");

                // SAFETY: `index` is in-bounds so the resulting pointer is valid to deref.
                unsafe { &*self.data.add(index) }
            }

            /// Reborrows the view as a Rust slice.
            ///
            /// # Safety
            /// The view must be valid for reads for `'a`. A null `data` is
            /// only allowed with `len == 0`.
            #[cfg_attr(debug_assertions, track_caller)]
            #[inline]
            pub unsafe fn as_slice<'a>(self) -> &'a [T] {
                if self.data.is_null() {
                    #[cfg(all(debug_assertions, feature = "debug"))]
                    assert!(self.len == 0, "null slice with non-zero length");
                    return &[];
                }
                // SAFETY: non-null and valid for `len` reads per the caller.
                unsafe { core::slice::from_raw_parts(self.data, self.len) }
            }

            /// Iterates over `[data, data + len)`.
            ///
            /// # Safety
            /// Same as [`as_slice`](Self::as_slice).
            #[inline]
            pub unsafe fn iter<'a>(self) -> core::slice::Iter<'a, T> {
                // SAFETY: forwarded to the caller.
                unsafe { self.as_slice() }.iter()
            }
        }
    };
}

impl_slice!(Slice, *const T, ptr::null);
impl_slice!(SliceMut, *mut T, ptr::null_mut);

// -----------------------------------------------------------------------------
// Slice

impl<T> Slice<T> {
    /// Borrows a Rust slice as a view.
    ///
    /// [`From::from`] is not const, but this is.
    #[inline(always)]
    pub const fn from_ref(slice: &[T]) -> Self {
        Self {
            data: slice.as_ptr(),
            len: slice.len(),
        }
    }
}

impl<T> From<&[T]> for Slice<T> {
    #[inline]
    fn from(slice: &[T]) -> Self {
        Self::from_ref(slice)
    }
}

impl<T> From<SliceMut<T>> for Slice<T> {
    #[inline]
    fn from(slice: SliceMut<T>) -> Self {
        slice.as_const()
    }
}

// -----------------------------------------------------------------------------
// SliceMut

impl<T> SliceMut<T> {
    /// Borrows a mutable Rust slice as a view.
    #[inline(always)]
    pub const fn from_mut(slice: &mut [T]) -> Self {
        Self {
            data: slice.as_mut_ptr(),
            len: slice.len(),
        }
    }

    /// Drops write access.
    #[inline(always)]
    pub const fn as_const(self) -> Slice<T> {
        Slice {
            data: self.data.cast_const(),
            len: self.len,
        }
    }

    /// Returns a mutable reference to the element at `index`, or [`OutOfRange`].
    ///
    /// # Safety
    /// The view must be valid for writes for `'a` and not aliased.
    #[inline]
    pub unsafe fn at_mut<'a>(self, index: usize) -> Result<&'a mut T, OutOfRange> {
        OutOfRange::check(index, self.len)?;
        // SAFETY: bounds checked above, validity guaranteed by the caller.
        Ok(unsafe { &mut *self.data.add(index) })
    }

    /// Reborrows the view as a mutable Rust slice.
    ///
    /// # Safety
    /// The view must be valid for writes for `'a` and not aliased. A null
    /// `data` is only allowed with `len == 0`.
    #[cfg_attr(debug_assertions, track_caller)]
    #[inline]
    pub unsafe fn as_mut_slice<'a>(self) -> &'a mut [T] {
        if self.data.is_null() {
            #[cfg(all(debug_assertions, feature = "debug"))]
            assert!(self.len == 0, "null slice with non-zero length");
            return &mut [];
        }
        // SAFETY: non-null and valid for `len` writes per the caller.
        unsafe { core::slice::from_raw_parts_mut(self.data, self.len) }
    }
}

impl<T> From<&mut [T]> for SliceMut<T> {
    #[inline]
    fn from(slice: &mut [T]) -> Self {
        Self::from_mut(slice)
    }
}

// -----------------------------------------------------------------------------
// Tests
