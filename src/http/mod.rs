//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → middleware.rs (fresh hub, transaction, MonitorScope extension)
//!     → request.rs (URL, method, query, small bodies for events)
//!     → handler (may identify the user, report its RouteMatch, trace queries)
//!     → route.rs (rename to route pattern, route tags)
//!     → status and user recorded, transaction finished
//! ```

pub mod middleware;
pub mod request;
pub mod route;
pub mod server;

pub use middleware::{sentry_middleware, HTTP_SERVER_OP};
pub use request::RequestSnapshot;
pub use route::RouteMatch;
pub use server::{AppState, HttpServer};
