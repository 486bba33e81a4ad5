//! Composition root: the one session and the one events collection.

use crate::error::EventsError;
use crate::events::{Event, EventsCollection, EventsStore};
use crate::session::{Credentials, SessionStore};

/// Application state holding both stores.
///
/// Built once at startup and passed explicitly to whatever drives the UI;
/// there is no global instance. Both stores are `Send + Sync` and every
/// operation takes `&self`, so a shared reference (or an `Arc`) is enough.
#[derive(Debug, Default)]
pub struct AppState {
    /// Who, if anyone, is logged in.
    pub session: SessionStore,
    /// The listed events.
    pub events: EventsStore,
}

impl AppState {
    /// State with default credentials and an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start configuring an [`AppState`].
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }
}

/// Builder for [`AppState`].
///
/// # Examples
///
/// ```
/// use eventboard::{AppState, Credentials};
///
/// let state = AppState::builder()
///     .credentials(Credentials::default())
///     .build()
///     .expect("no seed events to reject");
///
/// assert!(!state.session.is_authenticated());
/// assert!(state.events.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct AppStateBuilder {
    credentials: Credentials,
    seed: Vec<Event>,
}

impl AppStateBuilder {
    /// Replace the accepted login credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Preload the events collection, in order.
    pub fn seed_events(mut self, events: impl IntoIterator<Item = Event>) -> Self {
        self.seed.extend(events);
        self
    }

    /// Build the state. The session always starts unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError`] if a seed event has an empty required field
    /// or reuses an id.
    pub fn build(self) -> Result<AppState, EventsError> {
        let collection = EventsCollection::from_events(self.seed)?;
        tracing::debug!(seeded = collection.events().len(), "app state built");
        Ok(AppState {
            session: SessionStore::with_credentials(self.credentials),
            events: EventsStore::with_collection(collection),
        })
    }
}
