//! Events aggregate -- the insertion-ordered collection of listed events.
//!
//! Events are created from an [`EventInput`] with four required text fields,
//! removed by id, and never mutated in place. Edit is part of the surface but
//! has no behavior yet. The collection knows nothing about authentication;
//! callers gate mutations on the session themselves.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::error::{EventsError, NotFoundError, ValidationError};
use crate::store::Store;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Opaque reference to a locally stored copy of a picked image.
///
/// Never opened or validated; it is handed back to the UI as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap a local file reference.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The reference as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageRef {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for ImageRef {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

/// The text fields an event cannot be created without, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredField {
    Title,
    Date,
    Location,
    Description,
}

impl RequiredField {
    /// All required fields, in the order they are checked.
    pub const ALL: [RequiredField; 4] = [
        RequiredField::Title,
        RequiredField::Date,
        RequiredField::Location,
        RequiredField::Description,
    ];

    fn as_str(self) -> &'static str {
        match self {
            RequiredField::Title => "title",
            RequiredField::Date => "date",
            RequiredField::Location => "location",
            RequiredField::Description => "description",
        }
    }
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate event as submitted by the create form.
///
/// Absent fields deserialize as empty strings and fail validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventInput {
    pub title: String,
    /// Free-form; never parsed as a calendar date.
    pub date: String,
    pub location: String,
    pub description: String,
    pub image: Option<ImageRef>,
}

impl EventInput {
    /// Build an input without an image.
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            location: location.into(),
            description: description.into(),
            image: None,
        }
    }

    /// Attach an image reference.
    pub fn with_image(mut self, image: impl Into<ImageRef>) -> Self {
        self.image = Some(image.into());
        self
    }

    fn field(&self, which: RequiredField) -> &str {
        match which {
            RequiredField::Title => &self.title,
            RequiredField::Date => &self.date,
            RequiredField::Location => &self.location,
            RequiredField::Description => &self.description,
        }
    }

    /// Check that every required field is non-empty.
    ///
    /// Only emptiness is checked: no trimming, no length or format rules.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] naming the first empty
    /// field in form order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match RequiredField::ALL
            .into_iter()
            .find(|&which| self.field(which).is_empty())
        {
            Some(which) => Err(ValidationError::MissingField { which }),
            None => Ok(()),
        }
    }
}

impl From<&Event> for EventInput {
    fn from(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            date: event.date.clone(),
            location: event.location.clone(),
            description: event.description.clone(),
            image: event.image.clone(),
        }
    }
}

/// A listed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique within the collection; assigned at creation, never changed.
    pub id: String,
    pub title: String,
    pub date: String,
    pub location: String,
    pub description: String,
    pub image: Option<ImageRef>,
    /// Creator attribution. Currently always empty, even when a user is
    /// logged in at creation time.
    pub created_by: String,
}

/// Requested changes for an edit. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageRef>,
}

/// The ordered, id-unique collection of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsCollection {
    events: Vec<Event>,
}

impl EventsCollection {
    /// Build a collection from existing events, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError::Validation`] if an event has an empty required
    /// field, or [`EventsError::DuplicateId`] if two events share an id.
    pub fn from_events(events: Vec<Event>) -> Result<Self, EventsError> {
        let mut collection = Self::default();
        for event in events {
            EventInput::from(&event).validate()?;
            if collection.contains(&event.id) {
                return Err(EventsError::DuplicateId { id: event.id });
            }
            collection.events.push(event);
        }
        Ok(collection)
    }

    /// Events in insertion order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Look up an event by id.
    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Whether an event with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands accepted by the [`EventsCollection`] aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventsCommand {
    /// Append a new event under a caller-chosen id.
    Add { id: String, input: EventInput },
    /// Remove an event.
    Remove { id: String },
    /// Change an event's fields.
    Edit { id: String, patch: EventPatch },
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Domain events produced by the [`EventsCollection`] aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventsEvent {
    /// An event was appended to the collection.
    Added { event: Event },
    /// An event was removed from the collection.
    Removed { id: String },
}

// ---------------------------------------------------------------------------
// Aggregate impl
// ---------------------------------------------------------------------------

impl Aggregate for EventsCollection {
    const AGGREGATE_TYPE: &'static str = "events";
    type Command = EventsCommand;
    type DomainEvent = EventsEvent;
    type Error = EventsError;

    fn handle(&self, cmd: EventsCommand) -> Result<Vec<EventsEvent>, EventsError> {
        match cmd {
            EventsCommand::Add { id, input } => {
                input.validate()?;
                if self.contains(&id) {
                    return Err(EventsError::DuplicateId { id });
                }
                let EventInput {
                    title,
                    date,
                    location,
                    description,
                    image,
                } = input;
                Ok(vec![EventsEvent::Added {
                    event: Event {
                        id,
                        title,
                        date,
                        location,
                        description,
                        image,
                        created_by: String::new(),
                    },
                }])
            }
            EventsCommand::Remove { id } => {
                if !self.contains(&id) {
                    return Err(NotFoundError { id }.into());
                }
                Ok(vec![EventsEvent::Removed { id }])
            }
            EventsCommand::Edit { id, patch: _ } => {
                if !self.contains(&id) {
                    return Err(NotFoundError { id }.into());
                }
                Err(EventsError::EditNotImplemented { id })
            }
        }
    }

    fn apply(mut self, event: &EventsEvent) -> Self {
        match event {
            EventsEvent::Added { event } => self.events.push(event.clone()),
            EventsEvent::Removed { id } => self.events.retain(|e| e.id != *id),
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Holder of the canonical events collection.
#[derive(Debug, Default)]
pub struct EventsStore {
    store: Store<EventsCollection>,
}

impl EventsStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with `collection`.
    pub fn with_collection(collection: EventsCollection) -> Self {
        Self {
            store: Store::with_state(collection),
        }
    }

    /// Create an event under a fresh random id and append it.
    ///
    /// # Returns
    ///
    /// The created event, with an empty `created_by`.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError::Validation`] wrapping
    /// [`ValidationError::MissingField`] if a required field is empty.
    /// The collection is unchanged on error.
    pub fn add(&self, input: EventInput) -> Result<Event, EventsError> {
        self.add_with_id(Uuid::new_v4().to_string(), input)
    }

    /// Create an event under a caller-chosen id and append it.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError::Validation`] wrapping
    /// [`ValidationError::MissingField`] if a required field is empty, or
    /// [`EventsError::DuplicateId`] if the id is taken.
    pub fn add_with_id(
        &self,
        id: impl Into<String>,
        input: EventInput,
    ) -> Result<Event, EventsError> {
        let id = id.into();
        let applied = self.store.execute(EventsCommand::Add {
            id: id.clone(),
            input,
        })?;
        let Some(EventsEvent::Added { event: created }) = applied.into_iter().next() else {
            unreachable!("an accepted add always yields exactly one Added event for {id}");
        };
        tracing::info!(
            aggregate_type = EventsCollection::AGGREGATE_TYPE,
            event_id = %created.id,
            "event added"
        );
        Ok(created)
    }

    /// Remove the event with this id.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError::NotFound`] wrapping [`NotFoundError`] if no
    /// event has this id. The collection is unchanged in that case.
    pub fn remove(&self, id: &str) -> Result<(), EventsError> {
        self.store.execute(EventsCommand::Remove { id: id.to_owned() })?;
        tracing::info!(
            aggregate_type = EventsCollection::AGGREGATE_TYPE,
            event_id = %id,
            "event removed"
        );
        Ok(())
    }

    /// Edit an event.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError::NotFound`] wrapping [`NotFoundError`] for an
    /// unknown id and
    /// [`EventsError::EditNotImplemented`] otherwise; the collection is
    /// never changed.
    pub fn edit(&self, id: &str, patch: EventPatch) -> Result<Event, EventsError> {
        self.store.execute(EventsCommand::Edit {
            id: id.to_owned(),
            patch,
        })?;
        Ok(self.find(id)?)
    }

    /// All events, in insertion order.
    pub fn list(&self) -> Vec<Event> {
        self.store.read(|c| c.events.clone())
    }

    /// The event with this id, if present.
    pub fn get(&self, id: &str) -> Option<Event> {
        self.store.read(|c| c.get(id).cloned())
    }

    /// The event with this id.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if no event has this id.
    pub fn find(&self, id: &str) -> Result<Event, NotFoundError> {
        self.get(id).ok_or_else(|| NotFoundError { id: id.to_owned() })
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.store.read(|c| c.events.len())
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to collection changes.
    pub fn subscribe(&self) -> watch::Receiver<EventsCollection> {
        self.store.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> EventInput {
        EventInput::new(title, "2025-01-01", "X", "d")
    }

    fn ids(store: &EventsStore) -> Vec<String> {
        store.list().into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn add_appends_with_fresh_id() {
        let store = EventsStore::new();
        let a = store.add(input("A")).expect("add ok");
        let b = store.add(input("B")).expect("add ok");
        assert_ne!(a.id, b.id);
        assert_eq!(ids(&store), vec![a.id.clone(), b.id.clone()]);
        assert_eq!(store.list().last(), Some(&b));
    }

    #[test]
    fn add_generates_uuid_ids() {
        let store = EventsStore::new();
        let event = store.add(input("A")).unwrap();
        assert!(Uuid::parse_str(&event.id).is_ok());
    }

    #[test]
    fn add_keeps_fields_and_leaves_created_by_empty() {
        let store = EventsStore::new();
        let event = store
            .add(
                EventInput::new("Meetup", "next friday", "Berlin", "Rust talk")
                    .with_image("file:///img.jpg"),
            )
            .unwrap();
        assert_eq!(event.title, "Meetup");
        assert_eq!(event.date, "next friday");
        assert_eq!(event.location, "Berlin");
        assert_eq!(event.description, "Rust talk");
        assert_eq!(
            event.image.as_ref().map(ImageRef::as_str),
            Some("file:///img.jpg")
        );
        assert_eq!(event.created_by, "");
    }

    #[test]
    fn reject_each_missing_field() {
        let store = EventsStore::new();
        store.add(input("kept")).unwrap();
        let before = store.list();

        for which in RequiredField::ALL {
            let mut candidate = input("T");
            match which {
                RequiredField::Title => candidate.title.clear(),
                RequiredField::Date => candidate.date.clear(),
                RequiredField::Location => candidate.location.clear(),
                RequiredField::Description => candidate.description.clear(),
            }
            let err = store.add(candidate).unwrap_err();
            assert_eq!(
                err,
                EventsError::Validation(ValidationError::MissingField { which })
            );
        }
        assert_eq!(store.list(), before);
    }

    #[test]
    fn missing_field_reports_first_in_form_order() {
        let err = EventInput::default().validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                which: RequiredField::Title
            }
        );
    }

    #[test]
    fn whitespace_counts_as_present() {
        assert!(EventInput::new(" ", " ", " ", " ").validate().is_ok());
    }

    #[test]
    fn absent_json_fields_fail_validation() {
        let candidate: EventInput =
            serde_json::from_value(serde_json::json!({ "title": "A", "date": "d" })).unwrap();
        assert_eq!(
            candidate.validate().unwrap_err(),
            ValidationError::MissingField {
                which: RequiredField::Location
            }
        );
    }

    #[test]
    fn reject_duplicate_id() {
        let store = EventsStore::new();
        store.add_with_id("e-1", input("A")).unwrap();
        let err = store.add_with_id("e-1", input("B")).unwrap_err();
        assert_eq!(err, EventsError::DuplicateId { id: "e-1".into() });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_keeps_relative_order() {
        let store = EventsStore::new();
        store.add_with_id("a", input("A")).unwrap();
        store.add_with_id("b", input("B")).unwrap();
        store.add_with_id("c", input("C")).unwrap();

        store.remove("b").expect("remove ok");

        assert_eq!(ids(&store), vec!["a", "c"]);
    }

    #[test]
    fn remove_unknown_id_is_not_found() {
        let store = EventsStore::new();
        store.add_with_id("a", input("A")).unwrap();
        let before = store.list();

        let err = store.remove("zzz").unwrap_err();

        assert_eq!(err, EventsError::NotFound(NotFoundError { id: "zzz".into() }));
        assert_eq!(store.list(), before);
    }

    #[test]
    fn edit_unknown_id_is_not_found() {
        let store = EventsStore::new();
        let err = store.edit("nope", EventPatch::default()).unwrap_err();
        assert!(matches!(err, EventsError::NotFound(_)));
    }

    #[test]
    fn edit_existing_is_not_implemented_and_changes_nothing() {
        let store = EventsStore::new();
        store.add_with_id("a", input("A")).unwrap();
        let before = store.list();

        let patch = EventPatch {
            title: Some("Renamed".into()),
            ..EventPatch::default()
        };
        let err = store.edit("a", patch).unwrap_err();

        assert_eq!(err, EventsError::EditNotImplemented { id: "a".into() });
        assert_eq!(store.list(), before);
    }

    #[test]
    fn get_and_find() {
        let store = EventsStore::new();
        let created = store.add(input("A")).unwrap();
        assert_eq!(store.get(&created.id), Some(created.clone()));
        assert_eq!(store.find(&created.id), Ok(created));
        assert_eq!(
            store.find("missing"),
            Err(NotFoundError {
                id: "missing".into()
            })
        );
    }

    #[test]
    fn list_is_a_snapshot() {
        let store = EventsStore::new();
        store.add(input("A")).unwrap();
        let snapshot = store.list();
        store.add(input("B")).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn from_events_rejects_duplicates_and_blank_fields() {
        let event = Event {
            id: "e-1".into(),
            title: "A".into(),
            date: "2025-01-01".into(),
            location: "X".into(),
            description: "d".into(),
            image: None,
            created_by: String::new(),
        };
        let err = EventsCollection::from_events(vec![event.clone(), event.clone()]).unwrap_err();
        assert_eq!(err, EventsError::DuplicateId { id: "e-1".into() });

        let blank = Event {
            description: String::new(),
            ..event.clone()
        };
        let err = EventsCollection::from_events(vec![blank]).unwrap_err();
        assert!(matches!(err, EventsError::Validation(_)));

        let collection = EventsCollection::from_events(vec![event]).unwrap();
        assert!(collection.contains("e-1"));
    }

    #[test]
    fn event_serializes_camel_case() {
        let store = EventsStore::new();
        let event = store.add(input("A").with_image("file:///a.png")).unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["createdBy"], "");
        assert_eq!(json["image"], "file:///a.png");
        assert_eq!(json["title"], "A");
    }

    #[test]
    fn subscriber_notified_on_add_and_remove() {
        let store = EventsStore::new();
        let mut rx = store.subscribe();

        let event = store.add(input("A")).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().events().len(), 1);

        store.remove("missing").unwrap_err();
        assert!(!rx.has_changed().unwrap());

        store.remove(&event.id).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().events().is_empty());
    }
}
