/// How a single operation schedules its work.
///
/// `Parallel` fans the inner loops out over the global rayon pool and blocks
/// the calling thread until every task has finished. Both policies produce
/// the same results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionPolicy {
    #[default]
    Sequential,
    Parallel,
}
