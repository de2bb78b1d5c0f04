use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

// @module: Events emitted by a workflow run

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every video was processed
    Succeeded,
    /// The run stopped early or at least one video failed
    Failed,
    /// The caller asked the run to stop
    Cancelled,
}

impl RunStatus {
    /// Completion flag as seen by simple callers
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", label)
    }
}

/// Messages from the worker to whoever drives the run
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    /// Step update; `total` is 0 for sub-steps inside one video
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// Preview text of the subtitle just written
    Preview(String),
    /// One video could not be processed, the run goes on
    VideoFailed {
        index: usize,
        video: String,
        message: String,
    },
    /// Final event of every run
    Finished {
        status: RunStatus,
        message: String,
    },
}

/// Cooperative stop request, checked between videos
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop before its next video
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Sending half of the event channel. A caller that stopped listening does not
/// stop the run.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: UnboundedSender<WorkflowEvent>,
}

impl EventSender {
    /// Create a connected sender/receiver pair
    pub fn channel() -> (Self, UnboundedReceiver<WorkflowEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, event: WorkflowEvent) {
        let _ = self.tx.send(event);
    }

    pub fn progress(&self, message: impl Into<String>, current: usize, total: usize) {
        self.send(WorkflowEvent::Progress { current, total, message: message.into() });
    }

    pub fn preview(&self, text: impl Into<String>) {
        self.send(WorkflowEvent::Preview(text.into()));
    }

    pub fn finished(&self, status: RunStatus, message: impl Into<String>) {
        self.send(WorkflowEvent::Finished { status, message: message.into() });
    }
}
