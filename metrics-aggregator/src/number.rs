//! Numeric kinds and atomic numeric storage.
//!
//! Measurement values are either 64-bit signed integers or 64-bit floats.
//! Both are stored atomically through their bit pattern in an `AtomicU64`,
//! which keeps the synchronous update path lock-free for either kind.
//!
//! We always require a 64-bit atomic regardless of whether the standard
//! library exposes one for the target architecture.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::Ordering;

#[cfg(target_pointer_width = "32")]
use portable_atomic::AtomicU64;
#[cfg(not(target_pointer_width = "32"))]
use std::sync::atomic::AtomicU64;

use crate::reading::MetricValue;

mod private {
    pub trait Sealed {}

    impl Sealed for i64 {}
    impl Sealed for f64 {}
}

/// The numeric kind of an instrument.
///
/// Fixed at instrument registration and propagated unchanged through every
/// compiled view and collector for that instrument.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum NumberKind {
    /// 64-bit signed integer measurements.
    Int64,
    /// 64-bit floating-point measurements.
    Float64,
}

/// A measurement value.
///
/// This trait is sealed: the numeric kind space is closed, with exactly the
/// `i64` and `f64` implementations.
pub trait Number:
    private::Sealed + Copy + PartialEq + PartialOrd + Send + Sync + fmt::Debug + 'static
{
    /// The kind corresponding to this type.
    const KIND: NumberKind;

    /// The additive identity.
    const ZERO: Self;

    /// The bit pattern used for atomic storage.
    fn to_bits(self) -> u64;

    /// Reconstructs a value from its bit pattern.
    fn from_bits(bits: u64) -> Self;

    /// Adds two values.  Integer addition wraps.
    fn add(self, rhs: Self) -> Self;

    /// Converts the value to `f64`, e.g. for histogram boundary comparison.
    fn into_f64(self) -> f64;

    /// Converts the value into its kind-tagged reading form.
    fn to_value(self) -> MetricValue;
}

impl Number for i64 {
    const KIND: NumberKind = NumberKind::Int64;
    const ZERO: Self = 0;

    fn to_bits(self) -> u64 {
        self as u64
    }

    fn from_bits(bits: u64) -> Self {
        bits as i64
    }

    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    fn into_f64(self) -> f64 {
        self as f64
    }

    fn to_value(self) -> MetricValue {
        MetricValue::Int64(self)
    }
}

impl Number for f64 {
    const KIND: NumberKind = NumberKind::Float64;
    const ZERO: Self = 0.0;

    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }

    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn into_f64(self) -> f64 {
        self
    }

    fn to_value(self) -> MetricValue {
        MetricValue::Float64(self.into())
    }
}

/// An atomic cell holding the bit pattern of a [`Number`].
pub struct AtomicNumber<N> {
    bits: AtomicU64,
    _kind: PhantomData<N>,
}

impl<N: Number> AtomicNumber<N> {
    /// Creates a cell holding `value`.
    pub fn new(value: N) -> Self {
        AtomicNumber { bits: AtomicU64::new(value.to_bits()), _kind: PhantomData }
    }

    /// Loads the current value.
    pub fn load(&self) -> N {
        N::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Stores `value`, replacing the current value.
    pub fn store(&self, value: N) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    /// Atomically adds `value` to the current value.
    pub fn add(&self, value: N) {
        let _ = self.bits.fetch_update(Ordering::AcqRel, Ordering::Relaxed, |bits| {
            Some(N::from_bits(bits).add(value).to_bits())
        });
    }

    /// Atomically replaces the current value with `value`, returning the
    /// previous value.  The exchange is indivisible with respect to any
    /// concurrent [`add`](AtomicNumber::add).
    pub fn swap(&self, value: N) -> N {
        N::from_bits(self.bits.swap(value.to_bits(), Ordering::AcqRel))
    }
}

impl<N: Number> Default for AtomicNumber<N> {
    fn default() -> Self {
        AtomicNumber::new(N::ZERO)
    }
}

impl<N: Number> fmt::Debug for AtomicNumber<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicNumber").field(&self.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{AtomicNumber, Number};

    #[test]
    fn test_bit_roundtrip() {
        for value in [i64::MIN, -47, 0, 47, i64::MAX] {
            assert_eq!(value, i64::from_bits(value.to_bits()));
        }
        for value in [f64::MIN, -47.25, 0.0, 47.25, f64::MAX] {
            assert_eq!(value, f64::from_bits(Number::to_bits(value)));
        }
    }

    #[test]
    fn test_add_and_swap() {
        let cell = AtomicNumber::new(0i64);
        cell.add(3);
        cell.add(-1);
        assert_eq!(cell.load(), 2);
        assert_eq!(cell.swap(0), 2);
        assert_eq!(cell.load(), 0);

        let cell = AtomicNumber::new(1.5f64);
        cell.add(2.25);
        assert_eq!(cell.load(), 3.75);
    }

    #[test]
    fn test_concurrent_adds() {
        const THREADS: usize = 4;
        const PER_THREAD: i64 = 10_000;

        let cell = AtomicNumber::new(0i64);
        let res = crossbeam_utils::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|_| {
                    for _ in 0..PER_THREAD {
                        cell.add(1);
                    }
                });
            }
        });
        assert!(res.is_ok());
        assert_eq!(cell.load(), THREADS as i64 * PER_THREAD);
    }
}
