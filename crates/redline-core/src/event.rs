//! Engine change notifications.
//!
//! Subscribers receive events over std mpsc channels; the engine never
//! blocks on a slow or dropped subscriber.

use std::sync::mpsc::{channel, Receiver, Sender};

use crate::document::EntityId;

/// Notifications emitted after engine commands.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Finalized stroke count, sent on every document mutation.
    PathsChanged { count: usize },
    /// The selected shape changed (None = deselected).
    SelectionChanged { selected: Option<EntityId> },
    /// Drawing affordances for the UI layer.
    DrawingStateChanged {
        can_undo: bool,
        can_delete: bool,
        /// Label of the selected shape, if any.
        shape: Option<&'static str>,
        /// Current step of an in-progress measurement tool.
        drawing_step: Option<usize>,
    },
}

/// Fan-out sender that drops disconnected subscribers on the fly.
#[derive(Debug, Default)]
pub(crate) struct Notifier {
    senders: Vec<Sender<EngineEvent>>,
}

impl Notifier {
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = channel();
        self.senders.push(tx);
        rx
    }

    pub fn emit(&mut self, event: EngineEvent) {
        self.senders
            .retain(|sender| sender.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_fan_out_to_all_subscribers() {
        let mut notifier = Notifier::default();
        let a = notifier.subscribe();
        let b = notifier.subscribe();
        notifier.emit(EngineEvent::PathsChanged { count: 2 });
        assert_eq!(a.try_recv().unwrap(), EngineEvent::PathsChanged { count: 2 });
        assert_eq!(b.try_recv().unwrap(), EngineEvent::PathsChanged { count: 2 });
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut notifier = Notifier::default();
        let rx = notifier.subscribe();
        drop(rx);
        notifier.emit(EngineEvent::PathsChanged { count: 0 });
        assert!(notifier.senders.is_empty());
    }
}
