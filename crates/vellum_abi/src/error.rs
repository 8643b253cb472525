use thiserror::Error;

/// Returned by the checked `at` accessors when `index >= len`.
///
/// # Examples
///
/// ```
/// use vellum_abi::{OutOfRange, Slice};
///
/// let data = [1, 2, 3];
/// let view = Slice::from_ref(&data);
///
/// let err = unsafe { view.at(3) }.unwrap_err();
/// assert_eq!(err, OutOfRange { index: 3, len: 3 });
/// ```
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("index {index} is out of range for a slice of length {len}")]
pub struct OutOfRange {
    pub index: usize,
    pub len: usize,
}

impl OutOfRange {
    #[inline]
    pub(crate) const fn check(index: usize, len: usize) -> Result<(), Self> {
        if index < len {
            Ok(())
        } else {
            Err(Self { index, len })
        }
    }
}
