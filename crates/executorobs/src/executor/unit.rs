use std::fmt;
use std::time::Instant;
use uuid::Uuid;

pub type UnitId = Uuid;

type Operation<T> = Box<dyn FnOnce() -> anyhow::Result<T> + Send + 'static>;

/// Identity of a work unit, handed to lifecycle hooks instead of the computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnitInfo {
    /// Identifier
    pub id: UnitId,

    /// Instant when the unit was created
    pub created_at: Instant,
}

/// A zero-argument computation producing a single result on the worker.
pub struct WorkUnit<T> {
    info: WorkUnitInfo,
    op: Operation<T>,
}

impl<T> WorkUnit<T>
where
    T: Send + 'static,
{
    pub fn new<F>(op: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        Self::with_id(Uuid::new_v4(), op)
    }

    /// Creates a unit that shares its identifier with the originating request.
    pub fn with_id<F>(id: UnitId, op: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        Self {
            info: WorkUnitInfo {
                id,
                created_at: Instant::now(),
            },
            op: Box::new(op),
        }
    }

    pub fn info(&self) -> &WorkUnitInfo {
        &self.info
    }

    pub(crate) fn into_parts(self) -> (WorkUnitInfo, Operation<T>) {
        (self.info, self.op)
    }
}

impl<T> fmt::Debug for WorkUnit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkUnit")
            .field("id", &self.info.id)
            .field("created_at", &self.info.created_at)
            .finish_non_exhaustive()
    }
}
