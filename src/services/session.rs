//! Session Manager
//!
//! Owns the authentication lifecycle. The current [`SessionState`] is
//! published through a watch channel; the route guard and any other consumer
//! subscribe to it instead of polling.
//!
//! Identity resolution is serialized by an async mutex. Every `login` and
//! `logout` bumps an epoch first, so a resolution that started before a
//! later transition finds its epoch stale and neither publishes nor clears
//! anything. The epoch lives under a synchronous mutex that is also held
//! while the credential is written and the new state is published; a
//! transition is never observed half done. That mutex is never held across
//! an `.await`.

use std::sync::{Arc, Mutex, MutexGuard};

use suluk_api::endpoints;
use suluk_api::types::Identity;
use suluk_api::RequestDispatcher;
use tokio::sync::{watch, Mutex as AsyncMutex};

use crate::models::session::SessionState;
use crate::storage::credentials::CredentialStore;
use crate::utils::error::AppResult;

pub struct SessionManager {
    credentials: Arc<dyn CredentialStore>,
    dispatcher: Arc<RequestDispatcher>,
    state_tx: watch::Sender<SessionState>,
    resolve_lock: AsyncMutex<()>,
    epoch: Mutex<u64>,
}

impl SessionManager {
    /// Create a manager in `Resolving` without touching the network.
    pub fn new(credentials: Arc<dyn CredentialStore>, dispatcher: Arc<RequestDispatcher>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Resolving);
        Self {
            credentials,
            dispatcher,
            state_tx,
            resolve_lock: AsyncMutex::new(()),
            epoch: Mutex::new(0),
        }
    }

    /// Create a manager and resolve the stored credential, if any.
    pub async fn start(
        credentials: Arc<dyn CredentialStore>,
        dispatcher: Arc<RequestDispatcher>,
    ) -> Self {
        let manager = Self::new(credentials, dispatcher);
        manager.initialize().await;
        manager
    }

    /// Resolve the stored credential into an identity.
    pub async fn initialize(&self) -> SessionState {
        let epoch = *self.lock_epoch();
        let _guard = self.resolve_lock.lock().await;
        self.resolve(epoch).await
    }

    /// Store a freshly issued token and resolve the identity behind it.
    ///
    /// An identity failure is not returned as an error: it clears the token
    /// and ends in `Unauthenticated`. Only a storage failure is an error.
    pub async fn login(&self, token: &str) -> AppResult<SessionState> {
        let epoch = {
            let mut current = self.lock_epoch();
            *current += 1;
            *current
        };
        let _guard = self.resolve_lock.lock().await;
        {
            let current = self.lock_epoch();
            if *current != epoch {
                tracing::debug!("login superseded before it started");
                return Ok(self.state());
            }
            if let Err(e) = self.credentials.save(token) {
                self.publish(SessionState::Unauthenticated);
                return Err(e);
            }
            self.publish(SessionState::Resolving);
        }
        Ok(self.resolve(epoch).await)
    }

    /// Drop the credential and go straight to `Unauthenticated`.
    ///
    /// Makes no network call. Safe to call any number of times.
    pub fn logout(&self) -> AppResult<()> {
        let mut current = self.lock_epoch();
        *current += 1;
        let cleared = self.credentials.clear();
        self.publish(SessionState::Unauthenticated);
        drop(current);
        tracing::info!("logged out");
        cleared
    }

    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state_tx.borrow().identity().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    fn lock_epoch(&self) -> MutexGuard<'_, u64> {
        match self.epoch.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Caller holds `resolve_lock`.
    async fn resolve(&self, epoch: u64) -> SessionState {
        let has_token = {
            let current = self.lock_epoch();
            if *current != epoch {
                return self.state();
            }
            let has_token = self.credentials.read().is_some();
            if !has_token {
                self.publish(SessionState::Unauthenticated);
            }
            has_token
        };
        if !has_token {
            return SessionState::Unauthenticated;
        }

        let fetched = self
            .dispatcher
            .get_json::<Identity>(endpoints::CURRENT_USER, &[])
            .await;

        let current = self.lock_epoch();
        if *current != epoch {
            tracing::debug!("discarding identity resolution superseded by a later transition");
            return self.state();
        }

        let next = match fetched {
            Ok(identity) => {
                tracing::info!(username = %identity.username, "session authenticated");
                SessionState::Authenticated { identity }
            }
            Err(e) => {
                tracing::warn!(error = %e, "identity resolution failed, clearing stored credential");
                if let Err(clear_err) = self.credentials.clear() {
                    tracing::warn!(error = %clear_err, "failed to clear stored credential");
                }
                SessionState::Unauthenticated
            }
        };
        self.publish(next.clone());
        next
    }

    fn publish(&self, next: SessionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
