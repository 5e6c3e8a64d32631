//! Session manager: the in-memory cache of who is currently logged in.
//!
//! DESIGN
//! ======
//! `SessionManager` is an explicitly constructed context, cheap to clone,
//! that owns the authentication cache and the backend used to keep it in
//! sync. Nothing is persisted; dropping the last handle forgets the user and
//! a new context must hydrate again from `/user/current`.
//!
//! The cache only changes in four places: hydration, `login`, `create_user`
//! and `logout`. Each of those writes after its remote call completes, never
//! while it is in flight.
//!
//! HYDRATION
//! =========
//! An empty cache is hydrated lazily by the first state check. Concurrent
//! checks share one in-flight read. The read runs as its own task, so a
//! check that is dropped while waiting does not stop it; the task applies
//! its result and leaves the shared slot when the backend answers. A read
//! that finds no user is not remembered: the next check issues a new read.
//!
//! A generation counter guards against stale reads. `login`, `create_user`
//! and `logout` bump it, and a hydration result is only applied if the
//! generation it started under is still current and the cache is still empty.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{Mutex, RwLock};

use crate::backend::{CURRENT_USER_PATH, HttpBackend, SessionBackend};
use crate::config::SessionConfig;
use crate::error::{ConfigError, SessionError, UserError};
use crate::user::{CurrentUser, UserDetails};

type HydrationResult = Result<bool, SessionError>;

#[derive(Debug, Default)]
struct Cache {
    current: Option<CurrentUser>,
    generation: u64,
}

struct Flight {
    id: u64,
    read: Shared<BoxFuture<'static, HydrationResult>>,
}

struct Inner {
    backend: Arc<dyn SessionBackend>,
    cache: RwLock<Cache>,
    hydration: Mutex<Option<Flight>>,
    next_flight: AtomicU64,
}

/// Handle to one authentication session context.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    #[must_use]
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                cache: RwLock::new(Cache::default()),
                hydration: Mutex::new(None),
                next_flight: AtomicU64::new(0),
            }),
        }
    }

    /// Build a context talking HTTP to the configured service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: SessionConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Arc::new(HttpBackend::new(config)?)))
    }

    // =========================================================================
    // STATE CHECKS
    // =========================================================================

    /// Whether a user is logged in, hydrating the cache first if it is empty.
    ///
    /// A failed hydration read counts as "not logged in"; use [`Self::check`]
    /// to see the transport error instead.
    pub async fn is_logged_in(&self) -> bool {
        match self.check().await {
            Ok(logged_in) => logged_in,
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "session hydration failed; treating as logged out");
                false
            }
        }
    }

    /// Like [`Self::is_logged_in`], but surfaces hydration failures.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Backend` if the current-user read fails.
    pub async fn check(&self) -> Result<bool, SessionError> {
        if self.inner.cache.read().await.current.is_some() {
            return Ok(true);
        }
        self.hydrate().await
    }

    async fn hydrate(&self) -> Result<bool, SessionError> {
        let read = {
            let mut slot = self.inner.hydration.lock().await;
            if let Some(flight) = slot.as_ref() {
                tracing::debug!(flight = flight.id, "joining in-flight session hydration");
                flight.read.clone()
            } else {
                let generation = self.inner.cache.read().await.generation;
                let id = self.inner.next_flight.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(flight = id, "hydrating session from backend");
                let read = tokio::spawn(run_flight(Arc::clone(&self.inner), id, generation))
                    .map(|joined| {
                        joined.unwrap_or_else(|e| {
                            Err(SessionError::backend(CURRENT_USER_PATH, format!("hydration task failed: {e}")))
                        })
                    })
                    .boxed()
                    .shared();
                *slot = Some(Flight { id, read: read.clone() });
                read
            }
        };
        read.await
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Log in with a username and password.
    ///
    /// # Errors
    ///
    /// - `AlreadyLoggedIn` if a session exists; no login request is sent.
    /// - `InvalidLogin` if the service rejects the credentials.
    /// - `Backend` on any transport or status failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), SessionError> {
        if self.check().await? {
            return Err(UserError::AlreadyLoggedIn.into());
        }
        let user = self
            .inner
            .backend
            .login(username, password)
            .await?
            .ok_or_else(|| UserError::InvalidLogin { username: username.to_owned() })?;
        self.replace_current(Some(user)).await;
        tracing::info!(%username, "logged in");
        Ok(())
    }

    /// A copy of the cached user. Never contacts the backend.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` if the cache is empty.
    pub async fn get_user(&self) -> Result<CurrentUser, SessionError> {
        self.inner
            .cache
            .read()
            .await
            .current
            .clone()
            .ok_or_else(|| UserError::NotLoggedIn.into())
    }

    /// Create an account and log in as it.
    ///
    /// # Errors
    ///
    /// - `AlreadyLoggedIn` if a session exists; no create request is sent.
    /// - `CreateFailed` if the service rejects the account.
    /// - `Backend` on any transport or status failure.
    pub async fn create_user(&self, details: &UserDetails) -> Result<CurrentUser, SessionError> {
        if self.check().await? {
            return Err(UserError::AlreadyLoggedIn.into());
        }
        let user = self
            .inner
            .backend
            .create_user(details)
            .await?
            .ok_or(UserError::CreateFailed)?;
        self.replace_current(Some(user.clone())).await;
        tracing::info!(username = %details.username, "account created");
        Ok(user)
    }

    /// End the current session.
    ///
    /// # Errors
    ///
    /// - `NoSession` if nobody is logged in; no logout request is sent.
    /// - `Backend` if the logout request fails; the cache is left as is.
    pub async fn logout(&self) -> Result<(), SessionError> {
        if !self.check().await? {
            return Err(UserError::NoSession.into());
        }
        self.inner.backend.logout().await?;
        self.replace_current(None).await;
        tracing::info!("logged out");
        Ok(())
    }

    async fn replace_current(&self, user: Option<CurrentUser>) {
        let mut cache = self.inner.cache.write().await;
        cache.current = user;
        cache.generation += 1;
    }
}

/// Body of one hydration task. Runs to completion even if every waiter is
/// gone.
async fn run_flight(inner: Arc<Inner>, id: u64, generation: u64) -> HydrationResult {
    let result = inner.backend.current_user().await;

    {
        let mut slot = inner.hydration.lock().await;
        if slot.as_ref().is_some_and(|f| f.id == id) {
            *slot = None;
        }
    }

    let user = result?;
    let mut cache = inner.cache.write().await;
    if let Some(user) = user {
        if cache.current.is_none() && cache.generation == generation {
            cache.current = Some(user);
        }
    }
    Ok(cache.current.is_some())
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
