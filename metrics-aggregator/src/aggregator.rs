use crate::number::Number;
use crate::reading::Reading;

/// The operation set every aggregation provides.
///
/// Implementations are zero-sized selectors; all state lives in the
/// associated `Storage` type, which is interior-mutable so that one storage
/// instance can be updated and collected through shared references.
///
/// The concurrency contract: `update` and `synchronized_move` may race with
/// each other and with other `update` calls, and the storage must guarantee
/// that a `synchronized_move` observes each concurrent update either in the
/// moved-out state or in the reset accumulator, never partially in both.
pub trait Aggregator<N: Number>: Send + Sync + 'static {
    /// Aggregation-specific configuration, resolved once at view-compile
    /// time.
    type Config: Clone + Send + Sync + 'static;

    /// Accumulation state.
    type Storage: Send + Sync + 'static;

    /// Creates storage holding the aggregation identity.
    fn init(config: &Self::Config) -> Self::Storage;

    /// Folds one measurement into `storage`.
    fn update(storage: &Self::Storage, value: N);

    /// Moves the accumulated state of `from` into `into`, resetting `from`
    /// to the aggregation identity.  `None` discards the moved state, which
    /// reduces the operation to a reset.
    fn synchronized_move(from: &Self::Storage, into: Option<&Self::Storage>);

    /// Combines the state of `from` into `into`, leaving `from` untouched.
    fn merge(from: &Self::Storage, into: &Self::Storage);

    /// Returns a point-in-time reading of `storage`.
    fn reading(storage: &Self::Storage) -> Reading;
}
