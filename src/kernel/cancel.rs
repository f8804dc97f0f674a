use tokio_util::sync::CancellationToken;

/// Broadcast stop signal shared by every loop of a session.
///
/// Each clone handed out by [`arm`](Self::arm) observes the same
/// [`cancel`](Self::cancel) independently, so the issuer never needs to know
/// how many loops are running. A cancelled token stays cancelled; the next
/// session gets a fresh one.
#[derive(Debug)]
pub struct CancellationCoordinator {
    current: CancellationToken,
    generation: u64,
}

impl Default for CancellationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationCoordinator {
    pub fn new() -> Self {
        let current = CancellationToken::new();
        // Nothing is running yet; an unarmed coordinator reads as stopped.
        current.cancel();
        Self { current, generation: 0 }
    }

    /// Start a new session signal and return the token its loops watch.
    pub fn arm(&mut self) -> CancellationToken {
        self.current.cancel();
        self.current = CancellationToken::new();
        self.generation += 1;
        self.current.clone()
    }

    /// Issue the stop. Idempotent.
    pub fn cancel(&self) {
        self.current.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.current.is_cancelled()
    }

    /// Number of sessions armed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
