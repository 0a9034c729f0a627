//! Progress notices and incremental-save hook
//!
//! A [`Notifier`] is handed to the rate limiter and the executor at
//! construction. Notices are always logged; when a channel is attached they
//! are also pushed to it. Sending never blocks and a closed receiver is
//! ignored.

use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::info;

/// Callback invoked when partial progress should be persisted
pub type SaveHook = Arc<dyn Fn() + Send + Sync>;

/// Listener for human-readable progress and save requests
#[derive(Clone, Default)]
pub struct Notifier {
    progress: Option<UnboundedSender<String>>,
    save_hook: Option<SaveHook>,
}

impl Notifier {
    /// Notifier that only logs
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a notifier together with the receiving end of its progress channel
    pub fn channel() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        (Self::new().with_progress(tx), rx)
    }

    /// Attach a progress channel
    pub fn with_progress(mut self, sender: UnboundedSender<String>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Attach an incremental-save hook
    pub fn with_save_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.save_hook = Some(Arc::new(hook));
        self
    }

    /// Emit a progress notice
    pub fn notify(&self, text: impl Into<String>) {
        let text = text.into();
        info!("{text}");
        if let Some(sender) = &self.progress {
            let _ = sender.send(text);
        }
    }

    /// Ask the caller to persist partial progress
    pub fn save(&self) {
        if let Some(hook) = &self.save_hook {
            hook();
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("progress", &self.progress.is_some())
            .field("save_hook", &self.save_hook.is_some())
            .finish()
    }
}
