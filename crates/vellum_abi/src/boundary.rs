//! Process termination for failures that must not cross the boundary.

/// Logs `reason` and terminates the process.
///
/// Used for conditions that cannot be reported to the other side of the
/// boundary, such as invoking an empty [`Closure`](crate::Closure).
#[cold]
#[inline(never)]
pub fn fatal(reason: &str) -> ! {
    log::error!("vellum: fatal boundary error: {reason}");
    terminate()
}

#[cfg(feature = "std")]
#[inline(always)]
fn terminate() -> ! {
    std::process::abort()
}

#[cfg(not(feature = "std"))]
#[inline(always)]
fn terminate() -> ! {
    // Unwinding out of an `extern "C"` frame is itself an abort.
    extern "C" fn panic_in_nounwind_frame() -> ! {
        panic!("vellum: fatal boundary error");
    }
    panic_in_nounwind_frame()
}

/// Runs `f`, terminating the process if it panics.
///
/// Every trampoline that invokes user code on behalf of a foreign caller goes
/// through this function, so a panic never unwinds into a frame compiled by
/// another toolchain.
///
/// Without the `std` feature the panic cannot be caught. `f` is called
/// directly and the enclosing `extern "C"` frame aborts on unwind.
///
/// # Examples
///
/// ```
/// let value = vellum_abi::guard(|| 40 + 2);
/// assert_eq!(value, 42);
/// ```
#[cfg(feature = "std")]
#[inline]
pub fn guard<R>(f: impl FnOnce() -> R) -> R {
    use alloc::string::String;

    match std::panic::catch_unwind(core::panic::AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("<non-string payload>");
            log::error!("vellum: panic escaped a boundary call: {message}");
            fatal("panic escaped a boundary call")
        }
    }
}

/// Runs `f`.
///
/// Without the `std` feature the panic cannot be caught; the enclosing
/// `extern "C"` frame aborts on unwind.
#[cfg(not(feature = "std"))]
#[inline(always)]
pub fn guard<R>(f: impl FnOnce() -> R) -> R {
    f()
}
