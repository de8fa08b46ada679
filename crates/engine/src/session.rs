use std::fmt;

use serde::{Deserialize, Serialize};

/// Out-of-band channel the one-time code is delivered to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Contact {
    Phone(String),
    Email(String),
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phone(phone) => write!(f, "phone {phone}"),
            Self::Email(email) => write!(f, "e-mail {email}"),
        }
    }
}

/// Authenticated user context handed to a flow when it is built.
///
/// The flow never looks up credentials on its own: everything it needs to talk
/// to the backend comes from here.
#[derive(Clone)]
pub struct Session {
    user: String,
    access_token: String,
    contact: Contact,
}

impl Session {
    pub fn new(user: impl Into<String>, access_token: impl Into<String>, contact: Contact) -> Self {
        Self {
            user: user.into(),
            access_token: access_token.into(),
            contact,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &"<redacted>")
            .field("contact", &self.contact)
            .finish()
    }
}
