//! Explicit-boundary histogram aggregation.
//!
//! Buckets measurements against a sorted boundary list: a value lands in the
//! first bucket whose upper boundary it does not exceed, with one overflow
//! bucket above the highest boundary.  The record of counts, sum, and total
//! count is guarded by a short-held mutex so that the snapshot hand-off is a
//! single indivisible exchange.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::aggregator::Aggregator;
use crate::number::{Number, NumberKind};
use crate::reading::{HistogramReading, Reading};

const DEFAULT_BOUNDARIES: &[f64] = &[
    0.0, 5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 250.0, 500.0, 750.0, 1000.0, 2500.0, 5000.0, 7500.0,
    10000.0,
];

/// Histogram configuration: the explicit bucket boundaries.
#[derive(Clone, Debug)]
pub struct Config {
    boundaries: Arc<[f64]>,
}

impl Config {
    /// The default boundaries for the given numeric kind.
    ///
    /// Both kinds currently share one default boundary set; the kind is part
    /// of the signature because defaults are resolved per instrument.
    pub fn default_for(_kind: NumberKind) -> Self {
        Config { boundaries: DEFAULT_BOUNDARIES.into() }
    }

    /// Replaces the boundaries with an explicit list, e.g. from a view rule.
    /// The boundaries are sorted and deduplicated.
    pub fn with_boundaries(self, boundaries: &[f64]) -> Self {
        let mut sorted = boundaries.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("histogram boundaries must not be NaN"));
        sorted.dedup();
        Config { boundaries: sorted.into() }
    }

    /// The configured boundaries, sorted ascending.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }
}

#[derive(Debug)]
struct Totals<N: Number> {
    counts: Box<[u64]>,
    sum: N,
    count: u64,
}

impl<N: Number> Totals<N> {
    fn empty(buckets: usize) -> Self {
        Totals { counts: vec![0; buckets].into_boxed_slice(), sum: N::ZERO, count: 0 }
    }
}

/// Accumulation state for a histogram.
#[derive(Debug)]
pub struct State<N: Number> {
    boundaries: Arc<[f64]>,
    totals: Mutex<Totals<N>>,
}

impl<N: Number> State<N> {
    /// The recorded measurement count.
    pub fn count(&self) -> u64 {
        self.totals.lock().count
    }

    /// The sum of recorded measurements.
    pub fn sum(&self) -> N {
        self.totals.lock().sum
    }

    /// The per-bucket counts.
    pub fn bucket_counts(&self) -> Vec<u64> {
        self.totals.lock().counts.to_vec()
    }
}

/// The explicit-boundary histogram aggregation.
#[derive(Clone, Copy, Debug)]
pub struct Histogram;

impl<N: Number> Aggregator<N> for Histogram {
    type Config = Config;
    type Storage = State<N>;

    fn init(config: &Config) -> State<N> {
        State {
            boundaries: config.boundaries.clone(),
            totals: Mutex::new(Totals::empty(config.boundaries.len() + 1)),
        }
    }

    fn update(storage: &State<N>, value: N) {
        let as_f64 = value.into_f64();
        let bucket = storage.boundaries.partition_point(|boundary| as_f64 > *boundary);
        let mut totals = storage.totals.lock();
        totals.counts[bucket] += 1;
        totals.sum = totals.sum.add(value);
        totals.count += 1;
    }

    fn synchronized_move(from: &State<N>, into: Option<&State<N>>) {
        let buckets = from.boundaries.len() + 1;
        let moved = mem::replace(&mut *from.totals.lock(), Totals::empty(buckets));
        if let Some(into) = into {
            *into.totals.lock() = moved;
        }
    }

    fn merge(from: &State<N>, into: &State<N>) {
        let from_totals = from.totals.lock();
        let mut into_totals = into.totals.lock();
        for (into_count, from_count) in into_totals.counts.iter_mut().zip(from_totals.counts.iter())
        {
            *into_count += *from_count;
        }
        into_totals.sum = into_totals.sum.add(from_totals.sum);
        into_totals.count += from_totals.count;
    }

    fn reading(storage: &State<N>) -> Reading {
        let totals = storage.totals.lock();
        Reading::Histogram(HistogramReading {
            count: totals.count,
            sum: totals.sum.to_value(),
            buckets: totals.counts.to_vec(),
            boundaries: storage.boundaries.iter().copied().map(Into::into).collect(),
        })
    }
}
