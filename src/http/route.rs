//! Route-resolution metadata.
//!
//! # Design Decisions
//! - Handlers may report a full `RouteMatch` through the scope
//! - Otherwise the router's matched pattern is resolved against the path
//! - Both `{name}` / `{*name}` and `:name` / `*name` segments are understood

use std::collections::BTreeMap;

use serde_json::json;

/// The route that handled a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    /// Route pattern, e.g. `/users/{id}`.
    pub route: String,
    pub namespace: Option<String>,
    pub url_name: Option<String>,
    pub view_name: Option<String>,
    /// Fully qualified handler path.
    pub view_class: Option<String>,
    pub args: Vec<String>,
    pub kwargs: BTreeMap<String, String>,
}

impl RouteMatch {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            ..Self::default()
        }
    }

    /// Match `pattern` against `path`, collecting named segments as kwargs.
    ///
    /// Segments that cannot be paired up are ignored; the pattern is kept
    /// as-is either way.
    pub fn resolve(pattern: &str, path: &str) -> Self {
        let mut kwargs = BTreeMap::new();
        let mut actual = path.trim_start_matches('/').split('/');

        for segment in pattern.trim_start_matches('/').split('/') {
            if let Some(name) = wildcard(segment) {
                let rest: Vec<&str> = actual.by_ref().collect();
                kwargs.insert(name.to_string(), rest.join("/"));
                break;
            }
            let Some(value) = actual.next() else { break };
            if let Some(name) = param(segment) {
                kwargs.insert(name.to_string(), value.to_string());
            }
        }

        Self {
            route: pattern.to_string(),
            kwargs,
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn url_name(mut self, name: impl Into<String>) -> Self {
        self.url_name = Some(name.into());
        self
    }

    /// Name and handler path of the view.
    pub fn view(mut self, name: impl Into<String>, class: impl Into<String>) -> Self {
        self.view_name = Some(name.into());
        self.view_class = Some(class.into());
        self
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Transaction name for this route.
    pub fn transaction_name(&self) -> String {
        format!("route:{}", self.route)
    }

    /// `(tag, value)` pairs for the fields that are known.
    pub fn tags(&self) -> Vec<(&'static str, &str)> {
        [
            ("url_namespace", &self.namespace),
            ("url_name", &self.url_name),
            ("view_name", &self.view_name),
            ("view_class", &self.view_class),
        ]
        .into_iter()
        .filter_map(|(tag, value)| value.as_deref().map(|v| (tag, v)))
        .collect()
    }

    /// The `url_params` context block.
    pub fn url_params(&self) -> serde_json::Value {
        json!({
            "args": self.args,
            "kwargs": self.kwargs,
        })
    }
}

fn param(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .or_else(|| segment.strip_prefix(':'))
        .filter(|name| !name.starts_with('*'))
}

fn wildcard(segment: &str) -> Option<&str> {
    segment
        .strip_prefix("{*")
        .and_then(|s| s.strip_suffix('}'))
        .or_else(|| segment.strip_prefix('*'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_braced_params() {
        let route = RouteMatch::resolve("/orgs/{org}/users/{id}", "/orgs/acme/users/42");
        assert_eq!(route.route, "/orgs/{org}/users/{id}");
        assert_eq!(route.kwargs["org"], "acme");
        assert_eq!(route.kwargs["id"], "42");
        assert!(route.args.is_empty());
    }

    #[test]
    fn test_resolves_colon_params_and_wildcards() {
        let route = RouteMatch::resolve("/files/:bucket/*path", "/files/media/a/b/c.png");
        assert_eq!(route.kwargs["bucket"], "media");
        assert_eq!(route.kwargs["path"], "a/b/c.png");

        let route = RouteMatch::resolve("/static/{*rest}", "/static/css/site.css");
        assert_eq!(route.kwargs["rest"], "css/site.css");
    }

    #[test]
    fn test_static_routes_have_no_params() {
        let route = RouteMatch::resolve("/health", "/health");
        assert!(route.kwargs.is_empty());
        assert_eq!(route.transaction_name(), "route:/health");
    }

    #[test]
    fn test_tags_skip_unknown_fields() {
        let route = RouteMatch::new("users/<int:id>/")
            .namespace("accounts")
            .view("accounts:user", "accounts.views.UserView");
        assert_eq!(
            route.tags(),
            vec![
                ("url_namespace", "accounts"),
                ("view_name", "accounts:user"),
                ("view_class", "accounts.views.UserView"),
            ]
        );
    }

    #[test]
    fn test_url_params_block() {
        let route = RouteMatch::new("/p/{id}").arg("x").kwarg("id", "9");
        assert_eq!(
            route.url_params(),
            json!({"args": ["x"], "kwargs": {"id": "9"}})
        );
    }
}
