//! Authentication types

use serde::{Deserialize, Serialize};

/// An authenticated user as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    /// Create a user without an avatar
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            avatar: None,
        }
    }

    /// First letter of each name part, upper-cased, at most two characters
    pub fn initials(&self) -> String {
        self.name
            .split(' ')
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }
}

/// Current authenticated identity and its credential token
///
/// A session is either empty or holds both a user and a token; the
/// constructors are the only way to build one, so the two can never
/// drift apart.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    token: Option<String>,
}

impl Session {
    /// A session with no identity
    pub fn empty() -> Self {
        Self::default()
    }

    /// A session for `user` holding `token`
    pub fn authenticated(user: User, token: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            token: Some(token.into()),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    /// Normalize a session read from outside (disk, wire)
    ///
    /// Anything with only one half present collapses to the empty session.
    pub fn normalized(self) -> Self {
        match (self.user, self.token) {
            (Some(user), Some(token)) if !token.is_empty() => Self::authenticated(user, token),
            _ => Self::empty(),
        }
    }
}

/// Login form input
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Registration form input
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCredentials {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Successful login/register response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

impl From<AuthPayload> for Session {
    fn from(payload: AuthPayload) -> Self {
        Session::authenticated(payload.user, payload.token)
    }
}
