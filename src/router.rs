//! Navigation engine driving the guard pipeline.
//!
//! ARCHITECTURE
//! ============
//! `Router::push` resolves a path against the route table, follows static
//! redirects, and runs the guard pipeline. A guard redirect restarts the
//! loop at the redirect target, so every hop is guarded again. The loop is
//! bounded; a table or guard set that never settles yields `RedirectLoop`.
//!
//! History follows browser semantics: a navigation pushes one entry unless
//! it was started with `replace` or any guard along the way asked for
//! replacement, in which case the current entry is overwritten. This keeps
//! the back button from cycling through a page the user was bounced from.

use std::collections::BTreeMap;

use crate::error::NavigationError;
use crate::guard::{GuardPipeline, NavigationOutcome, NavigationTarget, RETURN_PATH_PARAM};
use crate::routes::{RouteName, RouteTable, normalize_full_path};
use crate::session::SessionManager;

pub const MAX_REDIRECTS: usize = 10;

/// Where a navigation ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub route: RouteName,
    pub full_path: String,
    pub params: BTreeMap<String, String>,
}

impl Location {
    /// The path a guard bounced the user away from, if any.
    #[must_use]
    pub fn return_path(&self) -> Option<&str> {
        self.params.get(RETURN_PATH_PARAM).map(String::as_str)
    }
}

pub struct Router {
    session: SessionManager,
    routes: RouteTable,
    guards: GuardPipeline,
    history: Vec<String>,
    current: Option<Location>,
}

impl Router {
    #[must_use]
    pub fn new(session: SessionManager) -> Self {
        Self::with_parts(session, RouteTable::standard(), GuardPipeline::default())
    }

    #[must_use]
    pub fn with_parts(session: SessionManager, routes: RouteTable, guards: GuardPipeline) -> Self {
        Self { session, routes, guards, history: Vec::new(), current: None }
    }

    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    #[must_use]
    pub fn current(&self) -> Option<&Location> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Navigate to `path`, adding a history entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a guard's session call fails or redirects loop.
    pub async fn push(&mut self, path: &str) -> Result<Location, NavigationError> {
        self.navigate(path, false).await
    }

    /// Navigate to `path`, overwriting the current history entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a guard's session call fails or redirects loop.
    pub async fn replace(&mut self, path: &str) -> Result<Location, NavigationError> {
        self.navigate(path, true).await
    }

    /// Log in, then resume the navigation that sent the user to the login
    /// page, or go `home` if there was none.
    ///
    /// # Errors
    ///
    /// Returns the login failure wrapped as a navigation error, or any error
    /// from the follow-up navigation.
    pub async fn login_and_resume(
        &mut self,
        username: &str,
        password: &str,
        return_path: Option<&str>,
    ) -> Result<Location, NavigationError> {
        let destination = return_path.map_or_else(
            || self.routes.by_name(RouteName::Home).path.to_string(),
            normalize_full_path,
        );
        self.session
            .login(username, password)
            .await
            .map_err(|source| NavigationError::Session { path: destination.clone(), source })?;
        self.push(&destination).await
    }

    async fn navigate(&mut self, path: &str, replace: bool) -> Result<Location, NavigationError> {
        let requested = normalize_full_path(path);
        let mut full_path = requested.clone();
        let mut params = BTreeMap::new();
        let mut replace = replace;

        for _ in 0..=MAX_REDIRECTS {
            let route = self.routes.resolve(&full_path);
            if let Some(redirect) = route.redirect {
                tracing::debug!(from = %full_path, to = redirect, "static redirect");
                full_path = redirect.to_string();
                params.clear();
                continue;
            }

            let target = NavigationTarget { route, full_path: &full_path };
            let outcome = self
                .guards
                .evaluate(&self.session, &target)
                .await
                .map_err(|source| NavigationError::Session { path: full_path.clone(), source })?;

            match outcome {
                NavigationOutcome::Allow => {
                    let location = Location { route: route.name, full_path, params };
                    self.commit(&location, replace);
                    return Ok(location);
                }
                NavigationOutcome::Redirect(redirect) => {
                    full_path = self.routes.by_name(redirect.to).path.to_string();
                    params = redirect.params;
                    replace |= redirect.replace;
                }
            }
        }

        tracing::warn!(path = %requested, hops = MAX_REDIRECTS, "navigation did not settle");
        Err(NavigationError::RedirectLoop { path: requested, hops: MAX_REDIRECTS })
    }

    fn commit(&mut self, location: &Location, replace: bool) {
        match self.history.last_mut() {
            Some(last) if replace => last.clone_from(&location.full_path),
            _ => self.history.push(location.full_path.clone()),
        }
        tracing::debug!(route = %location.route, path = %location.full_path, replace, "navigated");
        self.current = Some(location.clone());
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
