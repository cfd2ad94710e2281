//! Route Guard
//!
//! Maps session state to what a protected view should do.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::models::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    RenderLoading,
    RenderChildren,
    RedirectToLogin,
}

pub fn route_decision(state: &SessionState) -> RouteDecision {
    match state {
        SessionState::Resolving => RouteDecision::RenderLoading,
        SessionState::Authenticated { .. } => RouteDecision::RenderChildren,
        SessionState::Unauthenticated => RouteDecision::RedirectToLogin,
    }
}

/// Re-evaluates [`route_decision`] on every session publication.
pub struct RouteGuard {
    session: watch::Receiver<SessionState>,
}

impl RouteGuard {
    pub fn new(session: watch::Receiver<SessionState>) -> Self {
        Self { session }
    }

    pub fn current(&self) -> RouteDecision {
        route_decision(&self.session.borrow())
    }

    /// Decision after the next publication, or `None` once the session
    /// manager is gone.
    pub async fn changed(&mut self) -> Option<RouteDecision> {
        self.session.changed().await.ok()?;
        Some(route_decision(&self.session.borrow_and_update()))
    }

    /// First decision that is not [`RouteDecision::RenderLoading`].
    pub async fn settled(&mut self) -> RouteDecision {
        if let Ok(state) = self.session.wait_for(|state| !state.is_resolving()).await {
            return route_decision(&state);
        }
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suluk_api::types::Identity;

    fn authenticated() -> SessionState {
        SessionState::Authenticated {
            identity: Identity {
                id: 1,
                username: "noor".to_string(),
                created_at: "2024-01-01T00:00:00".to_string(),
            },
        }
    }

    #[test]
    fn test_decision_for_every_state() {
        assert_eq!(route_decision(&SessionState::Resolving), RouteDecision::RenderLoading);
        assert_eq!(
            route_decision(&SessionState::Unauthenticated),
            RouteDecision::RedirectToLogin
        );
        assert_eq!(route_decision(&authenticated()), RouteDecision::RenderChildren);
    }

    #[tokio::test]
    async fn test_follows_publications() {
        let (tx, rx) = watch::channel(SessionState::Resolving);
        let mut guard = RouteGuard::new(rx);
        assert_eq!(guard.current(), RouteDecision::RenderLoading);

        tx.send(authenticated()).unwrap();
        assert_eq!(guard.changed().await, Some(RouteDecision::RenderChildren));

        tx.send(SessionState::Unauthenticated).unwrap();
        assert_eq!(guard.changed().await, Some(RouteDecision::RedirectToLogin));

        drop(tx);
        assert_eq!(guard.changed().await, None);
    }

    #[tokio::test]
    async fn test_settled_waits_past_resolving() {
        let (tx, rx) = watch::channel(SessionState::Resolving);
        let mut guard = RouteGuard::new(rx);

        let waiter = tokio::spawn(async move { guard.settled().await });
        tx.send(authenticated()).unwrap();
        assert_eq!(waiter.await.unwrap(), RouteDecision::RenderChildren);
    }
}
