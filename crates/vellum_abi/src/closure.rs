use alloc::boxed::Box;
use core::ffi::c_void;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ptr::{self, NonNull};

use crate::{fatal, guard};

/// Frees the erased state of a [`Closure`].
pub type StateDeleter = unsafe extern "C" fn(*mut c_void);

mod sealed {
    pub trait Sealed {}
}

/// Function signatures a [`Closure`] can carry.
///
/// Implemented for `fn(A0, .., An) -> R` with up to eight arguments. The
/// argument and return types should themselves be ABI types, since they are
/// passed through an `extern "C"` trampoline.
pub trait Signature: sealed::Sealed + Copy {
    /// `unsafe extern "C" fn(*mut c_void, A0, .., An) -> R`
    type Caller: Copy;
}

// -----------------------------------------------------------------------------
// RawClosure

/// POD form of [`Closure`]: `{ caller, state, deleter }`.
///
/// `caller` is invoked as `caller(state, args..)`. `deleter`, if set, is
/// called once with `state` when the closure is destroyed.
#[repr(C)]
#[must_use = "dropping a `RawClosure` leaks its state"]
pub struct RawClosure<S: Signature> {
    pub caller: Option<S::Caller>,
    pub state: *mut c_void,
    pub deleter: Option<StateDeleter>,
}

impl<S: Signature> Clone for RawClosure<S> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Signature> Copy for RawClosure<S> {}

impl<S: Signature> Default for RawClosure<S> {
    #[inline(always)]
    fn default() -> Self {
        Self::NULL
    }
}

impl<S: Signature> fmt::Debug for RawClosure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawClosure")
            .field("bound", &self.caller.is_some())
            .field("state", &self.state)
            .field("deleter", &self.deleter.map(|d| d as *const ()))
            .finish()
    }
}

impl<S: Signature> RawClosure<S> {
    /// All fields null.
    pub const NULL: Self = Self {
        caller: None,
        state: ptr::null_mut(),
        deleter: None,
    };
}

impl<S: Signature> From<Closure<S>> for RawClosure<S> {
    #[inline]
    fn from(closure: Closure<S>) -> Self {
        closure.into_raw()
    }
}

// -----------------------------------------------------------------------------
// Closure

/// An owned, type-erased callable that can cross an `extern "C"` boundary.
///
/// Construction picks the cheapest representation:
///
/// - [`from_fn`](Self::from_fn) stores the function pointer itself as the
///   state, with no deleter and no allocation;
/// - [`new`](Self::new) boxes the callable and installs a deleter for the box,
///   unless the callable is zero-sized and has no drop glue, in which case it
///   needs neither.
///
/// Calling never unwinds: a panic inside the callable, or calling an empty
/// closure, aborts the process.
///
/// # Examples
///
/// ```
/// use vellum_abi::Closure;
///
/// let offset = 10;
/// let add = Closure::<fn(i32) -> i32>::new(move |x| x + offset);
/// assert!(add.get_deleter().is_some());
/// assert_eq!(add.call(5), 15);
///
/// fn double(x: i32) -> i32 { x * 2 }
/// let double = Closure::<fn(i32) -> i32>::from_fn(double);
/// assert!(double.get_deleter().is_none());
/// assert_eq!(double.call(5), 10);
/// ```
pub struct Closure<S: Signature> {
    caller: Option<S::Caller>,
    state: *mut c_void,
    deleter: Option<StateDeleter>,
    _marker: PhantomData<S>,
}

impl<S: Signature> Closure<S> {
    /// An empty closure. Calling it aborts.
    #[inline(always)]
    pub const fn null() -> Self {
        Self {
            caller: None,
            state: ptr::null_mut(),
            deleter: None,
            _marker: PhantomData,
        }
    }

    /// Adopts a `{ caller, state, deleter }` triple.
    ///
    /// # Safety
    /// `caller(state, ..)` must be sound to invoke for as long as the closure
    /// lives, and `deleter(state)`, if set, must be a sound way to free
    /// `state` exactly once.
    #[inline(always)]
    pub const unsafe fn from_raw_parts(
        caller: Option<S::Caller>,
        state: *mut c_void,
        deleter: Option<StateDeleter>,
    ) -> Self {
        Self {
            caller,
            state,
            deleter,
            _marker: PhantomData,
        }
    }

    /// Adopts a POD closure received across the boundary.
    ///
    /// # Safety
    /// See [`from_raw_parts`](Self::from_raw_parts). `raw` must not be adopted
    /// twice.
    #[inline(always)]
    pub const unsafe fn from_raw(raw: RawClosure<S>) -> Self {
        // SAFETY: forwarded to the caller.
        unsafe { Self::from_raw_parts(raw.caller, raw.state, raw.deleter) }
    }

    /// Gives up ownership as a POD closure without running the deleter.
    #[inline]
    pub fn into_raw(self) -> RawClosure<S> {
        let this = ManuallyDrop::new(self);
        RawClosure {
            caller: this.caller,
            state: this.state,
            deleter: this.deleter,
        }
    }

    /// Returns `true` if the closure can be called.
    #[inline(always)]
    pub const fn is_bound(&self) -> bool {
        self.caller.is_some()
    }

    #[inline(always)]
    pub const fn get_caller(&self) -> Option<S::Caller> {
        self.caller
    }

    #[inline(always)]
    pub const fn get_state(&self) -> *mut c_void {
        self.state
    }

    #[inline(always)]
    pub const fn get_deleter(&self) -> Option<StateDeleter> {
        self.deleter
    }

    /// Moves the contents out, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Drops the current triple, running its deleter, then adopts `other`'s.
    #[inline]
    pub fn set(&mut self, other: Self) {
        *self = other;
    }

    /// Exchanges all three fields with `other`.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    #[inline]
    fn caller_or_abort(&self) -> S::Caller {
        match self.caller {
            Some(caller) => caller,
            None => fatal("called an empty closure"),
        }
    }
}

impl<S: Signature> Drop for Closure<S> {
    #[inline]
    fn drop(&mut self) {
        if let Some(deleter) = self.deleter {
            // SAFETY: `deleter` frees `state` per the construction contract.
            unsafe { deleter(self.state) };
        }
    }
}

impl<S: Signature> Default for Closure<S> {
    #[inline(always)]
    fn default() -> Self {
        Self::null()
    }
}

impl<S: Signature> fmt::Debug for Closure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("bound", &self.is_bound())
            .field("state", &self.state)
            .field("boxed", &self.deleter.is_some())
            .finish()
    }
}

unsafe extern "C" fn drop_boxed_state<F>(state: *mut c_void) {
    if state.is_null() {
        return;
    }
    // SAFETY: `state` came from `Box::<F>::into_raw` in `Closure::new`.
    drop(unsafe { Box::from_raw(state.cast::<F>()) });
}

// -----------------------------------------------------------------------------
// Per-arity implementations

macro_rules! impl_closure {
    ($($arg:ident: $ty:ident),*) => {
        impl<R, $($ty,)*> sealed::Sealed for fn($($ty),*) -> R {}

        impl<R, $($ty,)*> Signature for fn($($ty),*) -> R {
            type Caller = unsafe extern "C" fn(*mut c_void, $($ty),*) -> R;
        }

        impl<R, $($ty,)*> Closure<fn($($ty),*) -> R> {
            /// Wraps a plain function pointer. No allocation, no deleter.
            #[inline]
            pub fn from_fn(f: fn($($ty),*) -> R) -> Self {
                let caller: unsafe extern "C" fn(*mut c_void, $($ty),*) -> R = Self::call_fn_pointer;
                // SAFETY: `call_fn_pointer` reads `state` back as this exact fn type.
                unsafe { Self::from_raw_parts(Some(caller), f as *mut c_void, None) }
            }

            /// Wraps any callable with this signature.
            ///
            /// Zero-sized callables without drop glue are stored without
            /// allocating; everything else is boxed.
            pub fn new<F>(f: F) -> Self
            where
                F: Fn($($ty),*) -> R + 'static,
            {
                let caller: unsafe extern "C" fn(*mut c_void, $($ty),*) -> R = Self::call_erased::<F>;

                if size_of::<F>() == 0 && !mem::needs_drop::<F>() {
                    mem::forget(f);
                    let state = NonNull::<F>::dangling().as_ptr().cast::<c_void>();
                    // SAFETY: any aligned non-null pointer is a valid `&F` for a ZST.
                    return unsafe { Self::from_raw_parts(Some(caller), state, None) };
                }

                let state = Box::into_raw(Box::new(f)).cast::<c_void>();
                // SAFETY: `state` is a live `Box<F>` until `drop_boxed_state::<F>` frees it.
                unsafe { Self::from_raw_parts(Some(caller), state, Some(drop_boxed_state::<F>)) }
            }

            /// Invokes the closure.
            ///
            /// Aborts if the closure is empty or if the callable panics.
            #[inline]
            pub fn call(&self, $($arg: $ty),*) -> R {
                let caller = self.caller_or_abort();
                // SAFETY: `caller` and `state` were paired at construction.
                unsafe { caller(self.state, $($arg),*) }
            }

            unsafe extern "C" fn call_fn_pointer(state: *mut c_void, $($arg: $ty),*) -> R {
                if state.is_null() {
                    fatal("closure state is null");
                }
                // SAFETY: `from_fn` stored a fn pointer of exactly this type.
                let f = unsafe { mem::transmute::<*mut c_void, fn($($ty),*) -> R>(state) };
                guard(move || f($($arg),*))
            }

            unsafe extern "C" fn call_erased<F>(state: *mut c_void, $($arg: $ty),*) -> R
            where
                F: Fn($($ty),*) -> R,
            {
                // SAFETY: `new` stored a live `F`, or a dangling pointer to a ZST `F`.
                let f = unsafe { &*state.cast::<F>() };
                guard(move || f($($arg),*))
            }
        }

        impl<R, $($ty,)*> RawClosure<fn($($ty),*) -> R> {
            /// Invokes `caller(state, args..)` directly on the POD triple.
            ///
            /// Aborts if `caller` is null.
            ///
            /// # Safety
            /// The triple must be live: not yet deleted and not adopted elsewhere.
            #[inline]
            pub unsafe fn call(&self, $($arg: $ty),*) -> R {
                let Some(caller) = self.caller else {
                    fatal("called an empty closure");
                };
                // SAFETY: forwarded to the caller.
                unsafe { caller(self.state, $($arg),*) }
            }
        }
    };
}

impl_closure!();
impl_closure!(a0: A0);
impl_closure!(a0: A0, a1: A1);
impl_closure!(a0: A0, a1: A1, a2: A2);
impl_closure!(a0: A0, a1: A1, a2: A2, a3: A3);
impl_closure!(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4);
impl_closure!(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4, a5: A5);
impl_closure!(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4, a5: A5, a6: A6);
impl_closure!(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4, a5: A5, a6: A6, a7: A7);

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use core::cell::Cell;
    use core::ffi::c_void;

    use super::{Closure, RawClosure};

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    #[test]
    fn function_pointer_needs_no_deleter() {
        let c = Closure::<fn(i32, i32) -> i32>::from_fn(add);
        assert!(c.is_bound());
        assert!(c.get_deleter().is_none());
        assert_eq!(c.get_state(), add as fn(i32, i32) -> i32 as *mut c_void);
        assert_eq!(c.call(2, 3), 5);
    }

    #[test]
    fn captureless_closure_needs_no_deleter() {
        let c = Closure::<fn(u8) -> u8>::new(|x| x + 1);
        assert!(c.get_deleter().is_none());
        assert_eq!(c.call(1), 2);
    }

    #[test]
    fn captured_state_is_boxed_and_matches_direct_call() {
        let suffix = String::from("!");
        let direct = move |s: usize| s + suffix.len();
        let expected = direct(41);

        let c = Closure::<fn(usize) -> usize>::new(direct);
        assert!(c.get_deleter().is_some());

        let raw = c.into_raw();
        let caller = raw.caller.unwrap();
        assert_eq!(unsafe { caller(raw.state, 41) }, expected);
        assert_eq!(unsafe { raw.call(41) }, expected);

        drop(unsafe { Closure::from_raw(raw) });
    }

    #[test]
    fn drop_runs_deleter_once() {
        let tracker = Rc::new(());
        let held = Rc::clone(&tracker);
        let mut c = Closure::<fn()>::new(move || {
            let _ = &held;
        });
        assert_eq!(Rc::strong_count(&tracker), 2);

        let d = c.take();
        assert!(!c.is_bound());
        drop(c);
        assert_eq!(Rc::strong_count(&tracker), 2);

        drop(d);
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn set_drops_previous_state() {
        let first = Rc::new(());
        let held = Rc::clone(&first);
        let mut c = Closure::<fn() -> u32>::new(move || {
            let _ = &held;
            1
        });

        c.set(Closure::<fn() -> u32>::from_fn(|| 2));
        assert_eq!(Rc::strong_count(&first), 1);
        assert_eq!(c.call(), 2);
    }

    #[test]
    fn swap_exchanges_all_fields() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let mut a = Closure::<fn(u32)>::new(move |n| seen.set(seen.get() + n));
        let mut b = Closure::<fn(u32)>::default();

        a.swap(&mut b);
        assert!(!a.is_bound());
        assert!(b.is_bound());
        b.call(3);
        b.call(4);
        assert_eq!(count.get(), 7);
    }

    #[test]
    fn eight_arguments() {
        let c = Closure::<fn(u8, u8, u8, u8, u8, u8, u8, u8) -> u32>::new(
            |a, b, c, d, e, f, g, h| [a, b, c, d, e, f, g, h].iter().map(|&x| u32::from(x)).sum(),
        );
        assert_eq!(c.call(1, 2, 3, 4, 5, 6, 7, 8), 36);
    }

    #[test]
    fn default_raw_is_all_null() {
        let raw = RawClosure::<fn() -> i32>::default();
        assert!(raw.caller.is_none());
        assert!(raw.state.is_null());
        assert!(raw.deleter.is_none());
    }
}
