//! Mock sign-in.
//!
//! There is no user database. The configured admin credentials sign in as
//! the administrator, any other non-empty email and password pair signs in as
//! a customer, and the answer arrives after a simulated delay.

use crate::environment::StorefrontEnvironment;
use keystore_core::effect::Effect;
use keystore_core::{delay, reducer::Reducer, smallvec, SmallVec};
use serde::{Deserialize, Serialize};

/// Sign-in errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Email or password left empty
    #[error("Email and password are required")]
    MissingCredentials,
    /// Admin-only operation
    #[error("Administrator access required")]
    NotAdmin,
}

/// What a signed-in user may do
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Shopper
    Customer,
    /// Store administrator
    Admin,
}

/// The signed-in user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: String,
    /// Email used to sign in
    pub email: String,
    /// Display name
    pub name: String,
    /// Role
    pub role: Role,
}

impl User {
    /// Checks for the admin role
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Session state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Signed-in user
    pub user: Option<User>,
    /// A sign-in is in progress
    pub is_loading: bool,
    /// Reason the last sign-in was rejected
    pub last_error: Option<String>,
}

impl SessionState {
    /// Checks if someone is signed in
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Checks if the signed-in user is an administrator
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAdmin`] for anonymous sessions and customers.
    pub fn require_admin(&self) -> Result<&User, SessionError> {
        self.user
            .as_ref()
            .filter(|user| user.is_admin())
            .ok_or(SessionError::NotAdmin)
    }
}

/// Session actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionAction {
    // Commands
    /// Sign in
    Login {
        /// Email
        email: String,
        /// Password
        password: String,
    },
    /// Sign out
    Logout,

    // Events
    /// Credentials accepted
    LoginSucceeded {
        /// Signed-in user
        user: User,
    },
    /// Credentials rejected
    LoginRejected {
        /// Rejection reason
        reason: String,
    },
}

/// Reducer for the session
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionReducer;

impl SessionReducer {
    /// Creates a new `SessionReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn authenticate(email: &str, password: &str, env: &StorefrontEnvironment) -> Result<User, SessionError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        if email == env.settings.admin_email && password == env.settings.admin_password {
            return Ok(User {
                id: "1".to_string(),
                email: email.to_string(),
                name: "Администратор".to_string(),
                role: Role::Admin,
            });
        }

        Ok(User {
            id: "2".to_string(),
            email: email.to_string(),
            name: "Пользователь".to_string(),
            role: Role::Customer,
        })
    }
}

impl Reducer for SessionReducer {
    type State = SessionState;
    type Action = SessionAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SessionAction::Login { email, password } => {
                state.is_loading = true;
                state.last_error = None;
                let outcome = match Self::authenticate(&email, &password, env) {
                    Ok(user) => SessionAction::LoginSucceeded { user },
                    Err(error) => SessionAction::LoginRejected {
                        reason: error.to_string(),
                    },
                };
                smallvec![delay! {
                    duration: env.settings.login_delay,
                    action: outcome
                }]
            },

            SessionAction::LoginSucceeded { user } => {
                tracing::info!(user_id = %user.id, role = ?user.role, "Signed in");
                state.user = Some(user);
                state.is_loading = false;
                SmallVec::new()
            },

            SessionAction::LoginRejected { reason } => {
                tracing::warn!(%reason, "Sign-in rejected");
                state.is_loading = false;
                state.last_error = Some(reason);
                SmallVec::new()
            },

            SessionAction::Logout => {
                if let Some(user) = state.user.take() {
                    tracing::info!(user_id = %user.id, "Signed out");
                }
                state.is_loading = false;
                SmallVec::new()
            },
        }
    }
}
