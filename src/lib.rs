//! Session and events state for an event listing app.
//!
//! Two independent aggregates, the session and the events collection, each
//! held in a [`Store`]. [`AppState`] composes them once at startup and the
//! [`commands`] module is the guarded surface the UI calls.

mod aggregate;
pub use aggregate::Aggregate;
pub mod commands;
mod error;
mod events;
mod session;
mod state;
mod store;

pub use error::{AppError, AuthError, EventsError, NotFoundError, ValidationError};
pub use events::{
    Event, EventInput, EventPatch, EventsCollection, EventsCommand, EventsEvent, EventsStore,
    ImageRef, RequiredField,
};
pub use session::{
    Credentials, Session, SessionCommand, SessionEvent, SessionState, SessionStore, User,
};
pub use state::{AppState, AppStateBuilder};
pub use store::Store;
