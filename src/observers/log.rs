//! # Simple logging observer for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [scheduled] inv=3 task=greeting kind=duration delay=250ms
//! [fired] inv=3 task=greeting
//! [value] inv=3 task=greeting
//! [completed] inv=3 task=greeting
//! [errored] inv=4 task=- err="value resolver failed: boom"
//! [canceled] inv=5 task=-
//! [observer-overflow] observer=metrics reason="observer=metrics reason=full"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Observe;

/// Stdout logging observer.
///
/// Enabled via the `logging` feature. Not intended for production use:
/// implement [`Observe`] for structured logging or metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self
    }

    fn line(e: &Event) -> String {
        let inv = e.invocation.unwrap_or_default();
        let task = e.task.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::InvocationScheduled => {
                let kind = e.delay_kind.unwrap_or("-");
                match e.delay_ms {
                    Some(ms) => format!("[scheduled] inv={inv} task={task} kind={kind} delay={ms}ms"),
                    None => format!("[scheduled] inv={inv} task={task} kind={kind}"),
                }
            }
            EventKind::InvocationFired => format!("[fired] inv={inv} task={task}"),
            EventKind::ValueEmitted => format!("[value] inv={inv} task={task}"),
            EventKind::InvocationCompleted => format!("[completed] inv={inv} task={task}"),
            EventKind::InvocationErrored => {
                format!("[errored] inv={inv} task={task} err={:?}", e.error.as_deref().unwrap_or(""))
            }
            EventKind::InvocationCanceled => format!("[canceled] inv={inv} task={task}"),
            EventKind::ObserverOverflow => {
                format!("[observer-overflow] observer={task} reason={:?}", e.error.as_deref().unwrap_or(""))
            }
            EventKind::ObserverPanicked => {
                format!("[observer-panicked] observer={task} err={:?}", e.error.as_deref().unwrap_or(""))
            }
        }
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        println!("{}", Self::line(e));
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
