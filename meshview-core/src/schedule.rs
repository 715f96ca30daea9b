/// Render request bookkeeping for the embedding view
use log::debug;

/// Tracks whether a render is owed.
///
/// Any number of input changes between two polls collapse into a single
/// render. Once cancelled (the view is gone) the scheduler stays closed.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: bool,
    closed: bool,
    requests: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that an input changed. Returns false when the scheduler is closed.
    pub fn request(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.pending = true;
        self.requests += 1;
        true
    }

    /// Consume the pending request, if any
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Drop any pending request and refuse new ones
    pub fn cancel(&mut self) {
        if self.pending {
            debug!("Cancelling pending render");
        }
        self.pending = false;
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Total requests accepted so far
    pub fn requests(&self) -> u64 {
        self.requests
    }
}
