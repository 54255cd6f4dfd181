/// Lifecycle of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    /// `index` is the cursor into the pool; `answered` once the current
    /// question has been graded and advancing is allowed.
    InProgress { index: usize, answered: bool },
    Complete,
}

/// Result of an advance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the question at this index.
    Next(usize),
    /// Left the last question; the session is now complete.
    Completed,
    /// The current question has not been answered; nothing changed.
    NotAnswered,
    /// The session was already complete; nothing changed.
    AlreadyComplete,
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}
