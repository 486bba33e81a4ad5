//! In-memory holder for a single aggregate's state.
//!
//! A [`Store`] owns the current state of one [`Aggregate`] and runs commands
//! against it: the command handler decides, the resulting domain events are
//! folded into the next state, and subscribers are notified. A rejected
//! command leaves the state exactly as it was.

use tokio::sync::watch;

use crate::aggregate::Aggregate;

/// Owner of one aggregate's live state.
///
/// The state lives inside a [`watch`] channel so readers can subscribe to
/// changes. All operations are synchronous and run to completion; the
/// channel is only used for its change-notification semantics, no runtime
/// is required.
pub struct Store<A: Aggregate> {
    state: watch::Sender<A>,
}

// Manual `Debug` so `A` does not need to implement it.
impl<A: Aggregate> std::fmt::Debug for Store<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("aggregate_type", &A::AGGREGATE_TYPE)
            .field("subscribers", &self.state.receiver_count())
            .finish()
    }
}

impl<A: Aggregate> Default for Store<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Aggregate> Store<A> {
    /// Create a store holding `A::default()`.
    pub fn new() -> Self {
        Self::with_state(A::default())
    }

    /// Create a store holding the given initial state.
    pub fn with_state(state: A) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { state: tx }
    }

    /// Run a command against the current state.
    ///
    /// The handler's events are folded into the state in order and
    /// subscribers are notified once. A command that produces no events
    /// neither changes the state nor notifies anyone.
    ///
    /// # Returns
    ///
    /// The domain events that were applied.
    ///
    /// # Errors
    ///
    /// Returns the aggregate's own error when the handler rejects the
    /// command. The state is left unchanged in that case.
    pub fn execute(&self, cmd: A::Command) -> Result<Vec<A::DomainEvent>, A::Error> {
        let _span = tracing::info_span!("execute", aggregate_type = A::AGGREGATE_TYPE).entered();

        let mut outcome = Ok(Vec::new());
        self.state.send_if_modified(|state| match state.handle(cmd) {
            Ok(events) if events.is_empty() => false,
            Ok(events) => {
                let current = std::mem::take(state);
                *state = events.iter().fold(current, |s, event| s.apply(event));
                outcome = Ok(events);
                true
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });

        match &outcome {
            Ok(events) if !events.is_empty() => {
                tracing::debug!(count = events.len(), "events applied");
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "command rejected"),
        }
        outcome
    }

    /// Return a snapshot of the current state.
    pub fn state(&self) -> A {
        self.state.borrow().clone()
    }

    /// Read the current state without cloning it.
    ///
    /// The closure runs while the state is borrowed; it must not call back
    /// into [`execute`](Store::execute) on the same store.
    pub fn read<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Subscribe to state changes.
    ///
    /// The receiver starts with the current state marked as seen. Every
    /// successful, non-empty [`execute`](Store::execute) marks it changed.
    pub fn subscribe(&self) -> watch::Receiver<A> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EventsError, NotFoundError};
    use crate::events::{EventInput, EventsCollection, EventsCommand, EventsEvent};

    fn add(id: &str, title: &str) -> EventsCommand {
        EventsCommand::Add {
            id: id.into(),
            input: EventInput::new(title, "2025-01-01", "X", "d"),
        }
    }

    fn remove(id: &str) -> EventsCommand {
        EventsCommand::Remove { id: id.into() }
    }

    #[test]
    fn new_store_holds_default_state() {
        let store = Store::<EventsCollection>::new();
        assert_eq!(store.state(), EventsCollection::default());
    }

    #[test]
    fn execute_returns_and_applies_events() {
        let store = Store::<EventsCollection>::new();
        let applied = store.execute(add("a", "A")).unwrap();
        assert!(matches!(&applied[..], [EventsEvent::Added { event }] if event.id == "a"));

        store.execute(add("b", "B")).unwrap();
        let applied = store.execute(remove("a")).unwrap();

        assert_eq!(applied, vec![EventsEvent::Removed { id: "a".into() }]);
        assert!(!store.state().contains("a"));
        assert!(store.state().contains("b"));
    }

    #[test]
    fn rejected_command_leaves_state_unchanged() {
        let store = Store::<EventsCollection>::new();
        store.execute(add("a", "A")).unwrap();
        let before = store.state();

        let err = store.execute(remove("zzz")).unwrap_err();

        assert_eq!(err, EventsError::NotFound(NotFoundError { id: "zzz".into() }));
        assert_eq!(store.state(), before);
    }

    #[test]
    fn read_borrows_current_state() {
        let store = Store::<EventsCollection>::new();
        store.execute(add("a", "Launch")).unwrap();
        let title = store.read(|c| c.get("a").map(|e| e.title.clone()));
        assert_eq!(title.as_deref(), Some("Launch"));
    }

    #[test]
    fn subscriber_sees_applied_changes() {
        let store = Store::<EventsCollection>::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.execute(add("a", "A")).unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().events().len(), 1);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn rejected_commands_do_not_notify() {
        let store = Store::<EventsCollection>::new();
        let rx = store.subscribe();

        store.execute(remove("missing")).unwrap_err();
        store.execute(add("a", "")).unwrap_err();

        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn debug_reports_aggregate_type() {
        let store = Store::<EventsCollection>::new();
        let debug_output = format!("{store:?}");
        assert!(debug_output.contains("events"));
    }
}
