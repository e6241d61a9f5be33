//! The dashboard view model: cached backend state, derived views and the
//! background polling that keeps them current.

pub mod aggregation;
pub mod poller;
pub mod session;

pub use aggregation::{CouponTypeGroup, ViewFilter};
pub use poller::{CounterTracker, PollEvent};
pub use session::{CurrentUser, DashboardSession, DashboardState, NeedDetail};

use std::sync::Arc;
use tracing::info;

use crate::api::PaydaBackend;
use crate::config::ClientConfig;

/// Owns the live session and replaces it when the signed-in user changes.
/// Dropping the dashboard tears the session down.
pub struct Dashboard {
    backend: Arc<dyn PaydaBackend>,
    config: ClientConfig,
    session: Arc<DashboardSession>,
}

impl Dashboard {
    /// Opens a session: loads the initial state, then starts polling.
    pub async fn open(
        backend: Arc<dyn PaydaBackend>,
        config: ClientConfig,
        user: Option<CurrentUser>,
    ) -> Self {
        let session = Self::start_session(&backend, &config, user).await;
        Self {
            backend,
            config,
            session,
        }
    }

    async fn start_session(
        backend: &Arc<dyn PaydaBackend>,
        config: &ClientConfig,
        user: Option<CurrentUser>,
    ) -> Arc<DashboardSession> {
        let session = DashboardSession::new(Arc::clone(backend), config.clone(), user);
        session.refresh().await;
        session.start();
        session
    }

    pub fn session(&self) -> &Arc<DashboardSession> {
        &self.session
    }

    /// Closes the current session, cancelling its poller and timers, and
    /// opens a fresh one for `user`.
    pub async fn switch_user(&mut self, user: Option<CurrentUser>) {
        info!(
            from = self.session.user().map(|u| u.id),
            to = user.as_ref().map(|u| u.id),
            "switching dashboard user"
        );
        self.session.close();
        self.session = Self::start_session(&self.backend, &self.config, user).await;
    }

    pub fn close(&self) {
        self.session.close();
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.session.close();
    }
}
