//! Read-only credential access for the dispatcher.

/// Source of the current bearer token.
///
/// The dispatcher only ever reads through this trait. Writing the token is
/// the session layer's job and happens through a richer store type that also
/// implements this trait.
pub trait CredentialSource: Send + Sync {
    /// The token to attach right now, if any. Called once per request.
    fn current_token(&self) -> Option<String>;
}
