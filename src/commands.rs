//! Handlers the UI layer calls into.
//!
//! Read handlers go straight to the stores. Write handlers on the events
//! collection first check that someone is logged in and refuse with
//! [`AppError::AuthenticationRequired`] otherwise; the stores themselves
//! never look at the session.

use crate::error::AppError;
use crate::events::{Event, EventInput, EventPatch};
use crate::session::Session;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Refuse `action` unless a user is logged in.
fn require_login(state: &AppState, action: &str) -> Result<(), AppError> {
    if state.session.is_authenticated() {
        return Ok(());
    }
    tracing::debug!(action, "refused: not logged in");
    Err(AppError::AuthenticationRequired(format!(
        "please login to {action}"
    )))
}

// ---------------------------------------------------------------------------
// Session commands
// ---------------------------------------------------------------------------

/// Log in with an email/password pair.
pub fn login(state: &AppState, email: &str, password: &str) -> Result<Session, AppError> {
    Ok(state.session.login(email, password)?)
}

/// Log out. Always succeeds.
pub fn logout(state: &AppState) -> Session {
    state.session.logout()
}

/// The current session.
pub fn current_session(state: &AppState) -> Session {
    state.session.current_session()
}

// ---------------------------------------------------------------------------
// Event queries
// ---------------------------------------------------------------------------

/// All events, in insertion order. Public.
pub fn list_events(state: &AppState) -> Vec<Event> {
    state.events.list()
}

/// The logged-in user's events.
///
/// There is no per-user filtering: this is the same collection as
/// [`list_events`], only gated behind login.
pub fn my_events(state: &AppState) -> Result<Vec<Event>, AppError> {
    require_login(state, "view your events")?;
    Ok(state.events.list())
}

/// A single event for the detail view, looked up by id. Public.
pub fn event_detail(state: &AppState, id: &str) -> Result<Event, AppError> {
    Ok(state.events.find(id)?)
}

// ---------------------------------------------------------------------------
// Event commands
// ---------------------------------------------------------------------------

/// Create an event from the form input.
pub fn create_event(state: &AppState, input: EventInput) -> Result<Event, AppError> {
    require_login(state, "create events")?;
    Ok(state.events.add(input)?)
}

/// Delete an event.
pub fn delete_event(state: &AppState, id: &str) -> Result<(), AppError> {
    require_login(state, "delete events")?;
    Ok(state.events.remove(id)?)
}

/// Edit an event. Not available yet: reports `NotImplemented` for any
/// existing event.
pub fn edit_event(state: &AppState, id: &str, patch: EventPatch) -> Result<Event, AppError> {
    require_login(state, "edit events")?;
    Ok(state.events.edit(id, patch)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in() -> AppState {
        let state = AppState::new();
        login(&state, "test@gmail.com", "1234").expect("login ok");
        state
    }

    fn sample() -> EventInput {
        EventInput::new("A", "2025-01-01", "X", "d")
    }

    #[test]
    fn create_requires_login() {
        let state = AppState::new();
        let err = create_event(&state, sample()).unwrap_err();
        assert_eq!(
            err,
            AppError::AuthenticationRequired("please login to create events".into())
        );
        assert!(list_events(&state).is_empty());
    }

    #[test]
    fn delete_requires_login() {
        let state = logged_in();
        let event = create_event(&state, sample()).unwrap();
        logout(&state);

        let err = delete_event(&state, &event.id).unwrap_err();

        assert!(matches!(err, AppError::AuthenticationRequired(_)));
        assert_eq!(list_events(&state), vec![event]);
    }

    #[test]
    fn create_ignores_logged_in_user_for_attribution() {
        let state = logged_in();
        let event = create_event(&state, sample()).unwrap();
        assert_eq!(event.created_by, "");
    }

    #[test]
    fn create_reports_validation_errors() {
        let state = logged_in();
        let err = create_event(&state, EventInput::new("A", "", "X", "d")).unwrap_err();
        assert_eq!(
            err,
            AppError::Validation("missing required field: date".into())
        );
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let state = logged_in();
        let err = delete_event(&state, "nope").unwrap_err();
        assert_eq!(err, AppError::NotFound("nope".into()));
    }

    #[test]
    fn edit_is_not_implemented() {
        let state = logged_in();
        let event = create_event(&state, sample()).unwrap();
        let err = edit_event(&state, &event.id, EventPatch::default()).unwrap_err();
        assert!(matches!(err, AppError::NotImplemented(_)));

        let err = edit_event(&state, "nope", EventPatch::default()).unwrap_err();
        assert_eq!(err, AppError::NotFound("nope".into()));
    }

    #[test]
    fn my_events_matches_list_events() {
        let state = logged_in();
        create_event(&state, sample()).unwrap();
        assert_eq!(my_events(&state).unwrap(), list_events(&state));

        logout(&state);
        assert!(matches!(
            my_events(&state),
            Err(AppError::AuthenticationRequired(_))
        ));
    }

    #[test]
    fn detail_is_public() {
        let state = logged_in();
        let event = create_event(&state, sample()).unwrap();
        logout(&state);

        assert_eq!(event_detail(&state, &event.id).unwrap(), event);
        assert_eq!(
            event_detail(&state, "gone").unwrap_err(),
            AppError::NotFound("gone".into())
        );
    }

    #[test]
    fn bad_login_maps_to_invalid_credentials() {
        let state = AppState::new();
        let err = login(&state, "test@gmail.com", "wrong").unwrap_err();
        assert_eq!(
            err,
            AppError::InvalidCredentials("invalid email or password".into())
        );
        assert!(!current_session(&state).is_authenticated());
    }
}
