//! Navigation guards.
//!
//! SYSTEM CONTEXT
//! ==============
//! The router runs the pipeline before entering any route. Global guards run
//! first, in order, then the target route's own guard if it has one. The
//! first guard that redirects wins and the rest are skipped.
//!
//! Guards only read the session through `SessionManager` operations. The one
//! side effect is the logout route, which ends the session on entry.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ErrorKind, SessionError};
use crate::routes::{BeforeEnter, RouteDescriptor, RouteName};
use crate::session::SessionManager;

/// Query/param key carrying the originally requested path to the login route.
pub const RETURN_PATH_PARAM: &str = "returnPath";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Allow,
    Redirect(Redirect),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: RouteName,
    pub params: BTreeMap<String, String>,
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

impl Redirect {
    #[must_use]
    pub fn replace(to: RouteName) -> Self {
        Self { to, params: BTreeMap::new(), replace: true }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// The route a navigation is trying to enter.
#[derive(Debug, Clone, Copy)]
pub struct NavigationTarget<'a> {
    pub route: &'a RouteDescriptor,
    pub full_path: &'a str,
}

#[async_trait]
pub trait NavigationGuard: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(
        &self,
        session: &SessionManager,
        target: &NavigationTarget<'_>,
    ) -> Result<NavigationOutcome, SessionError>;
}

// =============================================================================
// GUARDS
// =============================================================================

/// Protected routes send anonymous users to `login`, remembering where
/// they were going.
pub struct RequireAuth;

#[async_trait]
impl NavigationGuard for RequireAuth {
    fn name(&self) -> &'static str {
        "require-auth"
    }

    async fn check(
        &self,
        session: &SessionManager,
        target: &NavigationTarget<'_>,
    ) -> Result<NavigationOutcome, SessionError> {
        if target.route.requires_auth && !session.is_logged_in().await {
            let redirect = Redirect::replace(RouteName::Login).with_param(RETURN_PATH_PARAM, target.full_path);
            return Ok(NavigationOutcome::Redirect(redirect));
        }
        Ok(NavigationOutcome::Allow)
    }
}

pub struct RedirectIfLoggedIn;

#[async_trait]
impl NavigationGuard for RedirectIfLoggedIn {
    fn name(&self) -> &'static str {
        "redirect-if-logged-in"
    }

    async fn check(
        &self,
        session: &SessionManager,
        _target: &NavigationTarget<'_>,
    ) -> Result<NavigationOutcome, SessionError> {
        if session.is_logged_in().await {
            return Ok(NavigationOutcome::Redirect(Redirect::replace(RouteName::Home)));
        }
        Ok(NavigationOutcome::Allow)
    }
}

/// Ends the session and lands on `public`. Visiting the logout route with
/// no session is not an error: the user is already where logout would leave
/// them. Any other failure aborts the navigation.
pub struct EndSession;

#[async_trait]
impl NavigationGuard for EndSession {
    fn name(&self) -> &'static str {
        "end-session"
    }

    async fn check(
        &self,
        session: &SessionManager,
        _target: &NavigationTarget<'_>,
    ) -> Result<NavigationOutcome, SessionError> {
        match session.logout().await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NoSession => {
                tracing::debug!("logout route visited without a session");
            }
            Err(e) => return Err(e),
        }
        Ok(NavigationOutcome::Redirect(Redirect::replace(RouteName::Public)))
    }
}

impl BeforeEnter {
    #[must_use]
    pub fn guard(self) -> &'static dyn NavigationGuard {
        match self {
            Self::RedirectIfLoggedIn => &RedirectIfLoggedIn,
            Self::EndSession => &EndSession,
        }
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

pub struct GuardPipeline {
    global: Vec<Arc<dyn NavigationGuard>>,
}

impl Default for GuardPipeline {
    fn default() -> Self {
        Self { global: vec![Arc::new(RequireAuth)] }
    }
}

impl GuardPipeline {
    /// Append a global guard, run after the existing ones.
    #[must_use]
    pub fn with_global(mut self, guard: Arc<dyn NavigationGuard>) -> Self {
        self.global.push(guard);
        self
    }

    /// Run global guards, then the route's own guard, stopping at the first
    /// redirect.
    ///
    /// # Errors
    ///
    /// Propagates any session error a guard does not absorb.
    pub async fn evaluate(
        &self,
        session: &SessionManager,
        target: &NavigationTarget<'_>,
    ) -> Result<NavigationOutcome, SessionError> {
        let mut guards: Vec<&dyn NavigationGuard> = self.global.iter().map(|g| &**g).collect();
        if let Some(before_enter) = target.route.before_enter {
            guards.push(before_enter.guard());
        }

        for guard in guards {
            let outcome = guard.check(session, target).await?;
            if let NavigationOutcome::Redirect(redirect) = &outcome {
                tracing::debug!(
                    guard = guard.name(),
                    from = %target.full_path,
                    to = %redirect.to,
                    "navigation redirected"
                );
                return Ok(outcome);
            }
        }
        Ok(NavigationOutcome::Allow)
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
