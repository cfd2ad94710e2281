//! Application State
//!
//! Owns every service and wires them together. Components receive the
//! handles they need from here instead of reaching for ambient state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use suluk_api::types::Identity;
use suluk_api::{HttpTransport, ReqwestTransport, RequestDispatcher};

use crate::models::session::SessionState;
use crate::models::settings::AppConfig;
use crate::services::analysis::AnalysisOrchestrator;
use crate::services::auth::{AuthError, AuthService};
use crate::services::records::RecordsService;
use crate::services::route_guard::{RouteDecision, RouteGuard};
use crate::services::session::SessionManager;
use crate::storage::config::ConfigService;
use crate::storage::credentials::{CredentialStore, FileCredentialStore};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{credentials_path, suluk_dir};

/// Where to load configuration and credentials from.
#[derive(Debug, Clone, Default)]
pub struct StateOptions {
    /// Defaults to `~/.suluk`.
    pub config_dir: Option<PathBuf>,
    /// Wins over both the config file and the host rule.
    pub api_url: Option<String>,
    /// Password for the configured proxy. config.json never holds it.
    pub proxy_password: Option<String>,
}

pub struct AppState {
    config: AppConfig,
    dispatcher: Arc<RequestDispatcher>,
    session: Arc<SessionManager>,
    auth: AuthService,
    orchestrator: Arc<AnalysisOrchestrator>,
    records: RecordsService,
}

impl AppState {
    /// Load configuration from disk, open the credential store and resolve
    /// the stored session.
    pub async fn initialize(options: StateOptions) -> AppResult<Self> {
        let config_dir = match options.config_dir {
            Some(dir) => dir,
            None => suluk_dir()?,
        };
        let mut config = ConfigService::new(&config_dir)?.get_config().clone();
        if let Some(url) = options.api_url {
            config.api_base_url = Some(url);
            config.validate().map_err(AppError::config)?;
        }
        if let (Some(proxy), Some(password)) = (config.proxy.as_mut(), options.proxy_password) {
            proxy.password = Some(password);
        }

        let transport = Arc::new(ReqwestTransport::new(config.proxy.as_ref())?);
        Ok(Self::with_transport(config, &config_dir, transport).await)
    }

    /// Build the state over an explicit transport, with credentials kept in
    /// `config_dir`.
    pub async fn with_transport(
        config: AppConfig,
        config_dir: &Path,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let base_url = config.resolve_base_url();
        let credentials = Arc::new(FileCredentialStore::open(
            credentials_path(config_dir),
            &base_url,
        ));
        Self::with_parts(config, transport, credentials).await
    }

    /// Build the state over an explicit transport and credential store.
    pub async fn with_parts<C>(
        config: AppConfig,
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<C>,
    ) -> Self
    where
        C: CredentialStore + 'static,
    {
        let base_url = config.resolve_base_url();
        tracing::debug!(base_url = %base_url, "building application state");

        let dispatcher = Arc::new(
            RequestDispatcher::new(base_url, transport, credentials.clone())
                .with_timeout(Duration::from_secs(config.request_timeout_secs)),
        );
        let session = Arc::new(SessionManager::start(credentials, dispatcher.clone()).await);
        let auth = AuthService::new(dispatcher.clone(), session.clone());
        let orchestrator = Arc::new(AnalysisOrchestrator::new(dispatcher.clone()));
        let records = RecordsService::new(dispatcher.clone());

        Self {
            config,
            dispatcher,
            session,
            auth,
            orchestrator,
            records,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        self.dispatcher.base_url()
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn orchestrator(&self) -> &Arc<AnalysisOrchestrator> {
        &self.orchestrator
    }

    pub fn records(&self) -> &RecordsService {
        &self.records
    }

    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.subscribe())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<SessionState, AuthError> {
        self.auth.login(username, password).await
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        self.auth.register(username, password).await
    }

    /// End the session and abandon any analysis still streaming.
    pub fn logout(&self) -> AppResult<()> {
        self.orchestrator.cancel();
        self.session.logout()
    }

    /// Admit a protected operation: the identity when the route guard
    /// renders children, `NotAuthenticated` when it redirects to login.
    pub async fn require_session(&self) -> AppResult<Identity> {
        match self.route_guard().settled().await {
            RouteDecision::RenderChildren => {
                self.session.identity().ok_or(AppError::NotAuthenticated)
            }
            _ => Err(AppError::NotAuthenticated),
        }
    }
}
