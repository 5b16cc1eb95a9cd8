//! Last-value aggregation.
//!
//! Keeps the most recently recorded measurement, last-write-wins.  The
//! identity is "no value": storage that has not been updated since its last
//! reset reads as absent rather than zero.  State is guarded by a short-held
//! mutex; last-value instruments are dominated by once-per-cycle observation
//! callbacks, so contention is rare and the lock is the simplest correct
//! discipline.

use parking_lot::Mutex;

use crate::aggregator::Aggregator;
use crate::number::Number;
use crate::reading::Reading;

/// Last-value configuration.  Last-value takes no options.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config;

/// Accumulation state for a last value.
#[derive(Debug)]
pub struct State<N: Number> {
    value: Mutex<Option<N>>,
}

impl<N: Number> State<N> {
    /// The current value, if one has been recorded since the last reset.
    pub fn value(&self) -> Option<N> {
        *self.value.lock()
    }
}

/// The last-value aggregation.
#[derive(Clone, Copy, Debug)]
pub struct LastValue;

impl<N: Number> Aggregator<N> for LastValue {
    type Config = Config;
    type Storage = State<N>;

    fn init(_: &Config) -> State<N> {
        State { value: Mutex::new(None) }
    }

    fn update(storage: &State<N>, value: N) {
        *storage.value.lock() = Some(value);
    }

    fn synchronized_move(from: &State<N>, into: Option<&State<N>>) {
        let moved = from.value.lock().take();
        if let Some(into) = into {
            *into.value.lock() = moved;
        }
    }

    fn merge(from: &State<N>, into: &State<N>) {
        // An absent source carries no observation and must not clobber the
        // destination.
        if let Some(value) = *from.value.lock() {
            *into.value.lock() = Some(value);
        }
    }

    fn reading(storage: &State<N>) -> Reading {
        Reading::LastValue(storage.value.lock().map(Number::to_value))
    }
}
