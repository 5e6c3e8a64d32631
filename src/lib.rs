//! Client-side authentication session cache and navigation guards for
//! WebQuiz.
//!
//! A [`SessionManager`] caches who is logged in and keeps that cache in sync
//! with the remote session API. A [`Router`] runs the [`GuardPipeline`]
//! against the manager before entering any route, redirecting anonymous
//! users away from protected pages and logged-in users away from the login
//! and signup pages.

pub mod backend;
pub mod config;
pub mod error;
pub mod guard;
pub mod router;
pub mod routes;
pub mod session;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;

pub use backend::{HttpBackend, SessionBackend};
pub use config::SessionConfig;
pub use error::{ConfigError, ErrorKind, NavigationError, SessionError, UserError};
pub use guard::{GuardPipeline, NavigationGuard, NavigationOutcome, Redirect};
pub use router::{Location, Router};
pub use routes::{RouteDescriptor, RouteName, RouteTable};
pub use session::SessionManager;
pub use user::{CurrentUser, UserDetails};
