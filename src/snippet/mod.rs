//! Client-side monitoring snippet.
//!
//! # Responsibilities
//! - Build the template context for the browser SDK loader
//! - Resolve the user from the request, or a bare user outside requests
//! - Offer the last captured event id to the feedback variant
//!
//! # Design Decisions
//! - Context building is a pure function of its inputs
//! - No endpoint configured means an empty context and no markup

pub mod render;

use serde_json::{json, Map, Value};

use crate::config::SentrySettings;
use crate::monitor::Identity;

pub use render::{SnippetError, SnippetRenderer};

/// Public key of an endpoint identifier: the token between `//` and `@`.
pub fn public_key(dsn: &str) -> Option<&str> {
    let (_, rest) = dsn.split_once("//")?;
    let (key, _) = rest.split_once('@')?;
    Some(key).filter(|k| !k.is_empty())
}

/// The surroundings a snippet is rendered in.
pub enum TemplateContext<'a> {
    /// Rendering a response to a request; only the request's user counts.
    Request { user: Option<&'a dyn Identity> },
    /// Rendering outside a request (e.g. a server error page).
    Standalone { user: Option<&'a dyn Identity> },
}

impl<'a> TemplateContext<'a> {
    pub fn user(&self) -> Option<&'a dyn Identity> {
        match self {
            Self::Request { user } | Self::Standalone { user } => *user,
        }
    }
}

/// The two snippet variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snippet {
    /// Error capture only.
    Js,
    /// Error capture plus the user-feedback dialog.
    Feedback,
}

impl Snippet {
    /// Template tag name.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Js => "sentry_js",
            Self::Feedback => "sentry_feedback",
        }
    }

    /// Template context for this snippet.
    ///
    /// `last_event_id` is only used by [`Snippet::Feedback`].
    pub fn context(
        self,
        settings: &SentrySettings,
        ctx: &TemplateContext<'_>,
        last_event_id: Option<String>,
    ) -> Map<String, Value> {
        let mut context = js_context(settings, ctx);
        if self == Self::Feedback {
            context.insert(
                "sentry_dialog_event_id".to_string(),
                last_event_id.map(Value::String).unwrap_or(Value::Null),
            );
        }
        context
    }
}

fn js_context(settings: &SentrySettings, ctx: &TemplateContext<'_>) -> Map<String, Value> {
    let mut context = Map::new();
    if !settings.is_enabled() {
        return context;
    }

    let mut init = json!({
        "release": settings.release,
        "environment": settings.environment,
        "sendDefaultPii": settings.pii_enabled,
    });

    if let Some(user) = ctx.user() {
        let identity = if settings.pii_enabled {
            json!({
                "id": user.id(),
                "email": user.email(),
                "username": user.username(),
            })
        } else {
            json!({ "id": user.id() })
        };
        init["initialScope"] = json!({ "user": identity });
    }

    context.insert(
        "sentry_public_key".to_string(),
        json!(public_key(&settings.dsn).unwrap_or_default()),
    );
    context.insert("sentry_init".to_string(), init);
    context
}
