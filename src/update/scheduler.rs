//! Coalescing update scheduler with cancellation tokens.

use std::fmt;

/// Identifies one scheduled update pass.
///
/// A token goes stale once its pass has run or been cancelled; dispatching a
/// stale token does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpdateToken(u64);

/// Callback the host installs to arrange a deferred call on its own loop.
pub type IdleHook = Box<dyn FnMut(UpdateToken)>;

/// Owns the "recompute pending" state of one tree.
pub struct UpdateScheduler {
    pending: Option<UpdateToken>,
    next_token: u64,
    passes: u64,
    idle_hook: Option<IdleHook>,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self {
            pending: None,
            next_token: 1,
            passes: 0,
            idle_hook: None,
        }
    }

    /// Install the host callback invoked each time a new pass is scheduled.
    pub fn set_idle_hook(&mut self, hook: impl FnMut(UpdateToken) + 'static) {
        self.idle_hook = Some(Box::new(hook));
    }

    /// Schedule a pass unless one is already pending.
    ///
    /// Returns the new token, or `None` when the request coalesced into the
    /// pending pass.
    pub fn queue(&mut self) -> Option<UpdateToken> {
        if self.pending.is_some() {
            return None;
        }
        let token = UpdateToken(self.next_token);
        self.next_token += 1;
        self.pending = Some(token);
        tracing::debug!(token = token.0, "update scheduled");
        if let Some(hook) = self.idle_hook.as_mut() {
            hook(token);
        }
        Some(token)
    }

    /// Whether a pass is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The token of the pending pass, if any.
    pub fn pending(&self) -> Option<UpdateToken> {
        self.pending
    }

    /// Drop the pending pass. Returns its token if there was one.
    pub fn cancel(&mut self) -> Option<UpdateToken> {
        self.pending.take()
    }

    /// Consume the pending pass if `token` still names it.
    pub fn claim(&mut self, token: UpdateToken) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Count a completed pass.
    pub fn record_pass(&mut self) -> u64 {
        self.passes += 1;
        self.passes
    }

    /// Number of passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UpdateScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateScheduler")
            .field("pending", &self.pending)
            .field("passes", &self.passes)
            .field("idle_hook", &self.idle_hook.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
