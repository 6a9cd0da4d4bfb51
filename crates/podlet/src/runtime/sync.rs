//! Per-action outcomes reported by pod-level operations.

use std::fmt;

/// Action a [`SyncResult`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    /// Stop a single container.
    KillContainer,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KillContainer => write!(f, "KillContainer"),
        }
    }
}

/// Failure category attached to a failed [`SyncResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncError {
    /// The container could not be killed.
    KillContainer,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KillContainer => write!(f, "KillContainerError"),
        }
    }
}

/// Outcome of one action against one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    /// What was attempted.
    pub action: SyncAction,
    /// Name of the target, usually a container name.
    pub target: String,
    /// Failure category, `None` on success.
    pub error: Option<SyncError>,
    /// Failure detail, empty on success.
    pub message: String,
}

impl SyncResult {
    /// Create a successful result.
    pub fn new(action: SyncAction, target: impl Into<String>) -> Self {
        Self {
            action,
            target: target.into(),
            error: None,
            message: String::new(),
        }
    }

    /// Mark this result as failed.
    pub fn fail(&mut self, error: SyncError, message: impl Into<String>) {
        self.error = Some(error);
        self.message = message.into();
    }

    /// Whether the action succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error {
            None => write!(f, "{} {}: ok", self.action, self.target),
            Some(error) => write!(f, "{} {}: {error}: {}", self.action, self.target, self.message),
        }
    }
}
