//! Sum aggregation.
//!
//! Accumulates measurements by atomic addition, which keeps concurrent
//! updates lock-free.  The snapshot hand-off is a single atomic exchange, so
//! any concurrent update lands entirely in either the moved-out value or the
//! reset accumulator.

use crate::aggregator::Aggregator;
use crate::number::{AtomicNumber, Number};
use crate::reading::Reading;

/// Sum configuration.  Sums take no options.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config;

/// Accumulation state for a sum.
#[derive(Debug)]
pub struct State<N: Number> {
    value: AtomicNumber<N>,
}

impl<N: Number> State<N> {
    /// The current accumulated value.
    pub fn value(&self) -> N {
        self.value.load()
    }
}

/// The sum aggregation.
#[derive(Clone, Copy, Debug)]
pub struct Sum;

impl<N: Number> Aggregator<N> for Sum {
    type Config = Config;
    type Storage = State<N>;

    fn init(_: &Config) -> State<N> {
        State { value: AtomicNumber::new(N::ZERO) }
    }

    fn update(storage: &State<N>, value: N) {
        storage.value.add(value);
    }

    fn synchronized_move(from: &State<N>, into: Option<&State<N>>) {
        let moved = from.value.swap(N::ZERO);
        if let Some(into) = into {
            into.value.store(moved);
        }
    }

    fn merge(from: &State<N>, into: &State<N>) {
        into.value.add(from.value.load());
    }

    fn reading(storage: &State<N>) -> Reading {
        Reading::Sum(storage.value.load().to_value())
    }
}
