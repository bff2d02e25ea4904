/// Deferred destruction queue
///
/// Each resource owns one queue. Every successful creation step registers a
/// tag naming the teardown that undoes it; `run_all` replays the tags newest
/// first, so teardown mirrors construction in reverse (unmap before free,
/// sampler and view before the image they reference). A resource that failed
/// half-way through construction holds exactly the tags of the steps that
/// succeeded.

use crate::error::{Error, Result};

/// One teardown step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Teardown {
    /// Destroy a buffer and free its allocation
    BufferAllocation,
    /// Unmap a persistently mapped allocation
    Mapping,
    /// Destroy an image and free its allocation
    ImageAllocation,
    /// Destroy an image view
    ImageView,
    /// Destroy a sampler
    Sampler,
}

impl Teardown {
    /// Number of distinct teardown steps
    pub const COUNT: usize = 5;
}

/// Fixed-capacity, last-in first-out list of teardown steps
///
/// A step can be registered at most once; a resource never needs two of the same.
#[derive(Debug, Default)]
pub struct DeletionQueue {
    steps: [Option<Teardown>; Teardown::COUNT],
    len: usize,
}

impl DeletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a teardown step
    ///
    /// # Errors
    ///
    /// `InvalidResource` when the step is already registered.
    pub fn register(&mut self, step: Teardown) -> Result<()> {
        if self.contains(step) {
            crate::engine_error!("ember::DeletionQueue", "Teardown {:?} registered twice", step);
            return Err(Error::InvalidResource(format!("teardown {:?} already registered", step)));
        }
        // Distinct steps never exceed COUNT, so this slot exists.
        self.steps[self.len] = Some(step);
        self.len += 1;
        Ok(())
    }

    /// Whether `step` is pending
    pub fn contains(&self, step: Teardown) -> bool {
        self.steps[..self.len].contains(&Some(step))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pending steps in the order they will run
    pub fn pending(&self) -> impl Iterator<Item = Teardown> + '_ {
        self.steps[..self.len].iter().rev().flatten().copied()
    }

    /// Run every pending step, most recent first, and leave the queue empty
    pub fn run_all(&mut self, mut teardown: impl FnMut(Teardown)) {
        while self.len > 0 {
            self.len -= 1;
            if let Some(step) = self.steps[self.len].take() {
                teardown(step);
            }
        }
    }
}

#[cfg(test)]
#[path = "deletion_queue_tests.rs"]
mod tests;
