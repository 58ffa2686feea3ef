//! Delivery of trade events.
//!
//! Delivery failures are logged and dropped; they never change trading state.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use tracing::{info, warn};

use super::event::TradeEvent;

/// Errors from a notification channel.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notifier not configured")]
    NotConfigured,

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Out-of-band channel for trade events.
pub trait Notifier {
    fn notify(&self, event: &TradeEvent) -> Result<(), NotifyError>;
}

/// Send an event, logging instead of propagating any failure.
pub fn dispatch(notifier: &dyn Notifier, event: &TradeEvent) {
    if let Err(e) = notifier.notify(event) {
        warn!("Notification '{}' not sent: {}", event.title(), e);
    }
}

/// Writes rendered events to the log.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    agent: String,
}

impl LogNotifier {
    pub fn new(agent: &str) -> Self {
        Self {
            agent: agent.to_string(),
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, event: &TradeEvent) -> Result<(), NotifyError> {
        info!("\n{}", event.render(&self.agent));
        Ok(())
    }
}

/// Collects events in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    events: Rc<RefCell<Vec<TradeEvent>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TradeEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, event: &TradeEvent) -> Result<(), NotifyError> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}

/// Discards events. Used when no channel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: &TradeEvent) -> Result<(), NotifyError> {
        Err(NotifyError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> TradeEvent {
        TradeEvent::RiskAlert {
            message: "test".to_string(),
        }
    }

    #[test]
    fn test_memory_notifier_shares_buffer() {
        let notifier = MemoryNotifier::new();
        let handle = notifier.clone();

        dispatch(&notifier, &alert());
        assert_eq!(handle.len(), 1);
        assert_eq!(handle.events()[0], alert());
    }

    #[test]
    fn test_dispatch_swallows_errors() {
        // Must not panic or propagate
        dispatch(&NullNotifier, &alert());
        assert!(matches!(NullNotifier.notify(&alert()), Err(NotifyError::NotConfigured)));
    }
}
