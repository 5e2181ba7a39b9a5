//! Progress accounting for a batch.

use tracing::info;

/// Counts completed items, forwards each update to an optional callback and
/// logs at every tenth of the batch.
pub struct ProgressTracker<'a> {
    total: usize,
    completed: usize,
    next_log: usize,
    log: bool,
    callback: Option<&'a mut dyn FnMut(usize, usize)>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(total: usize, log: bool, callback: Option<&'a mut dyn FnMut(usize, usize)>) -> Self {
        Self {
            total,
            completed: 0,
            next_log: Self::step(total),
            log,
            callback,
        }
    }

    fn step(total: usize) -> usize {
        (total / 10).max(1)
    }

    /// Record one completed item.
    pub fn tick(&mut self) {
        self.completed += 1;
        if let Some(callback) = self.callback.as_mut() {
            callback(self.completed, self.total);
        }
        if self.log && (self.completed >= self.next_log || self.completed == self.total) {
            info!(completed = self.completed, total = self.total, "progress");
            self.next_log = self.completed + Self::step(self.total);
        }
    }

    #[inline]
    pub fn completed(&self) -> usize {
        self.completed
    }
}
