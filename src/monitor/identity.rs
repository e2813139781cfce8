//! User identity capability.

use sentry::protocol::User;

/// Anything that can be reported as the acting user.
pub trait Identity {
    /// Primary identifier. Always reported.
    fn id(&self) -> String;

    /// Only reported when PII is enabled.
    fn email(&self) -> Option<&str> {
        None
    }

    /// Only reported when PII is enabled.
    fn username(&self) -> Option<&str> {
        None
    }
}

/// Owned snapshot of an [`Identity`], safe to keep in `'static` processors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

impl UserIdentity {
    pub fn capture<I: Identity + ?Sized>(user: &I) -> Self {
        Self {
            id: user.id(),
            email: user.email().map(str::to_owned),
            username: user.username().map(str::to_owned),
        }
    }

    /// Build the SDK user, dropping email and username unless `pii_enabled`.
    pub fn to_user(&self, pii_enabled: bool) -> User {
        let mut user = User {
            id: Some(self.id.clone()),
            ..User::default()
        };
        if pii_enabled {
            user.email = self.email.clone();
            user.username = self.username.clone();
        }
        user
    }
}

impl Identity for UserIdentity {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}
