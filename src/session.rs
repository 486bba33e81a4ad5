//! Session aggregate -- who, if anyone, is logged in.
//!
//! A singleton aggregate with two states: unauthenticated (initial) and
//! authenticated with a [`User`]. Login checks the supplied pair against a
//! single fixed [`Credentials`] entry; there is no hashing, no persistence
//! and no notion of roles.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::aggregate::Aggregate;
use crate::error::AuthError;
use crate::store::Store;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Identity of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id taken from the accepted credentials.
    pub id: String,
    /// Email the user logged in with.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// The process-wide authentication state.
///
/// The user is present if and only if the session is authenticated; the
/// type makes any other combination unrepresentable. Serialized as
/// `{ "authenticated": bool, "user": null | {..} }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SessionRepr", into = "SessionRepr")]
pub struct Session {
    user: Option<User>,
}

impl Session {
    /// An authenticated session for `user`.
    pub fn authenticated(user: User) -> Self {
        Self { user: Some(user) }
    }

    /// The unauthenticated session.
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// Whether a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

/// Wire shape of [`Session`] with the explicit `authenticated` flag.
#[derive(Clone, Serialize, Deserialize)]
struct SessionRepr {
    authenticated: bool,
    user: Option<User>,
}

impl From<Session> for SessionRepr {
    fn from(session: Session) -> Self {
        Self {
            authenticated: session.user.is_some(),
            user: session.user,
        }
    }
}

impl TryFrom<SessionRepr> for Session {
    type Error = String;

    fn try_from(repr: SessionRepr) -> Result<Self, Self::Error> {
        if repr.authenticated != repr.user.is_some() {
            return Err("`user` must be present exactly when `authenticated` is true".into());
        }
        Ok(Self { user: repr.user })
    }
}

/// The single credential pair the login check accepts.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Accepted email, compared exactly.
    pub email: String,
    /// Accepted password, compared exactly.
    pub password: String,
    /// Id given to the user on successful login.
    pub user_id: String,
    /// Display name given to the user on successful login.
    pub display_name: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: "test@gmail.com".into(),
            password: "1234".into(),
            user_id: "1".into(),
            display_name: "Test User".into(),
        }
    }
}

// Keep the password out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl Credentials {
    /// Exact, case-sensitive comparison of both fields.
    pub fn matches(&self, email: &str, password: &str) -> bool {
        self.email == email && self.password == password
    }
}

/// Aggregate state: the accepted credentials plus the current session.
///
/// Credentials are configuration, not state, so they are skipped when
/// serializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(skip)]
    credentials: Credentials,
    session: Session,
}

impl SessionState {
    /// Unauthenticated state accepting the given credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            session: Session::default(),
        }
    }

    /// The current session.
    pub fn session(&self) -> &Session {
        &self.session
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands accepted by the [`SessionState`] aggregate.
#[derive(Clone)]
pub enum SessionCommand {
    /// Attempt to log in.
    Login { email: String, password: String },
    /// End the session, whatever its state.
    Logout,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Domain events produced by the [`SessionState`] aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    /// A user logged in, replacing any previous session.
    LoggedIn { user: User },
    /// The session was reset to unauthenticated.
    LoggedOut,
}

// ---------------------------------------------------------------------------
// Aggregate impl
// ---------------------------------------------------------------------------

impl Aggregate for SessionState {
    const AGGREGATE_TYPE: &'static str = "session";
    type Command = SessionCommand;
    type DomainEvent = SessionEvent;
    type Error = AuthError;

    fn handle(&self, cmd: SessionCommand) -> Result<Vec<SessionEvent>, AuthError> {
        match cmd {
            SessionCommand::Login { email, password } => {
                if !self.credentials.matches(&email, &password) {
                    return Err(AuthError::InvalidCredentials);
                }
                // Logging in while already logged in simply replaces the user.
                Ok(vec![SessionEvent::LoggedIn {
                    user: User {
                        id: self.credentials.user_id.clone(),
                        email,
                        name: self.credentials.display_name.clone(),
                    },
                }])
            }
            SessionCommand::Logout => Ok(vec![SessionEvent::LoggedOut]),
        }
    }

    fn apply(mut self, event: &SessionEvent) -> Self {
        match event {
            SessionEvent::LoggedIn { user } => self.session = Session::authenticated(user.clone()),
            SessionEvent::LoggedOut => self.session = Session::unauthenticated(),
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Single source of truth for the current session.
#[derive(Debug, Default)]
pub struct SessionStore {
    store: Store<SessionState>,
}

impl SessionStore {
    /// A store accepting the default credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store accepting `credentials` instead of the defaults.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            store: Store::with_state(SessionState::new(credentials)),
        }
    }

    /// Log in with an email/password pair.
    ///
    /// # Returns
    ///
    /// The new, authenticated session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the pair does not
    /// match. The previous session is kept as it was.
    pub fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let cmd = SessionCommand::Login {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let applied = match self.store.execute(cmd) {
            Ok(applied) => applied,
            Err(e) => {
                tracing::warn!(email, "login rejected");
                return Err(e);
            }
        };
        // Built from the applied event, not re-read: another thread may
        // already have logged out again.
        let Some(SessionEvent::LoggedIn { user }) = applied.into_iter().next() else {
            unreachable!("an accepted login always yields exactly one LoggedIn event");
        };
        tracing::info!(email, "user logged in");
        Ok(Session::authenticated(user))
    }

    /// Reset to the unauthenticated session. Always succeeds.
    pub fn logout(&self) -> Session {
        match self.store.execute(SessionCommand::Logout) {
            Ok(_) => tracing::info!("user logged out"),
            // `handle` accepts `Logout` in every state.
            Err(e) => unreachable!("logout rejected: {e}"),
        }
        Session::unauthenticated()
    }

    /// The current session.
    pub fn current_session(&self) -> Session {
        self.store.read(|state| state.session.clone())
    }

    /// Shorthand for `current_session().is_authenticated()` without cloning.
    pub fn is_authenticated(&self) -> bool {
        self.store.read(|state| state.session.is_authenticated())
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.store.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
