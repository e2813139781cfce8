//! Per-request / per-job monitoring context.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use sentry::types::Uuid;
use sentry::Level;
use sentry::{Hub, Transaction, TransactionOrSpan};

use crate::db::QueryTracer;
use crate::http::route::RouteMatch;
use crate::monitor::identity::{Identity, UserIdentity};

/// Explicit monitoring context for one unit of work.
///
/// The request middleware inserts it into the request extensions; job
/// closures receive it as an argument. Everything recorded through it lands
/// on this unit's own hub, never on a shared global scope.
#[derive(Clone)]
pub struct MonitorScope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    hub: Arc<Hub>,
    transaction: Option<Transaction>,
    user: Arc<ArcSwapOption<UserIdentity>>,
    route: ArcSwapOption<RouteMatch>,
    queries: Option<QueryTracer>,
}

impl MonitorScope {
    pub(crate) fn new(
        hub: Arc<Hub>,
        transaction: Option<Transaction>,
        user: Arc<ArcSwapOption<UserIdentity>>,
        queries: Option<QueryTracer>,
    ) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                hub,
                transaction,
                user,
                route: ArcSwapOption::empty(),
                queries,
            }),
        }
    }

    /// The hub isolated to this unit of work.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.inner.hub
    }

    /// The transaction (or `None` for a scope built without one).
    pub fn span(&self) -> Option<TransactionOrSpan> {
        self.inner.transaction.clone().map(Into::into)
    }

    /// Record the acting user for this unit of work.
    pub fn identify<I: Identity + ?Sized>(&self, user: &I) {
        self.inner
            .user
            .store(Some(Arc::new(UserIdentity::capture(user))));
    }

    pub fn user(&self) -> Option<Arc<UserIdentity>> {
        self.inner.user.load_full()
    }

    /// Report the route that handled the request.
    pub fn set_route(&self, route: RouteMatch) {
        self.inner.route.store(Some(Arc::new(route)));
    }

    pub fn route(&self) -> Option<Arc<RouteMatch>> {
        self.inner.route.load_full()
    }

    /// Query tracer, present when a database is configured.
    pub fn queries(&self) -> Option<&QueryTracer> {
        self.inner.queries.as_ref()
    }

    pub fn capture_message(&self, message: &str, level: Level) -> Uuid {
        self.inner.hub.capture_message(message, level)
    }

    pub fn capture_error<E: std::error::Error + ?Sized>(&self, error: &E) -> Uuid {
        self.inner.hub.capture_error(error)
    }

    /// Id of the last event captured through this scope's hub.
    pub fn last_event_id(&self) -> Option<Uuid> {
        self.inner.hub.last_event_id()
    }
}

impl std::fmt::Debug for MonitorScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorScope")
            .field("user", &self.user())
            .field("route", &self.route())
            .field("queries", &self.inner.queries.is_some())
            .finish()
    }
}
