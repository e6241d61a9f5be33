use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::aggregation::{
    claimed_coupon_types, filter_items, filter_needs, group_coupon_types, CouponTypeGroup,
    ViewFilter,
};
use super::poller::spawn_poller;
use crate::api::PaydaBackend;
use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::models::{
    donation, AssignCouponRequest, Coupon, CouponQuery, CouponStatus, CreatedNeed, Donation, Need,
    NeedStatus, NewNeed, OperationStatus, ShowcaseItem, UseCouponRequest,
};
use crate::notifications::{NotificationCenter, NotificationConfig, NotificationKind};

const SUCCESS_ICON: &str = "fa-check-circle";

/// The signed-in person the dashboard acts for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub name: Option<String>,
}

impl CurrentUser {
    pub fn new(id: i64) -> Self {
        Self { id, name: None }
    }
}

/// Cached backend slices. Each slice only changes when its own read succeeds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub items: Vec<ShowcaseItem>,
    pub active_needs: Vec<Need>,
    pub unassigned_coupons: Vec<Coupon>,
    pub my_coupons: Vec<Coupon>,
    /// Newest first
    pub coupon_donations: Vec<Donation>,
    pub loading: bool,
    pub last_refreshed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NeedDetail {
    pub need: Need,
    pub recent_donations: Vec<Donation>,
}

/// Owned dashboard aggregate: cached state, notifications and the
/// background tasks that keep them current.
pub struct DashboardSession {
    backend: Arc<dyn PaydaBackend>,
    config: ClientConfig,
    user: Option<CurrentUser>,
    state: RwLock<DashboardState>,
    notifications: Mutex<NotificationCenter>,
    refreshes_in_flight: AtomicUsize,
    closed: AtomicBool,
    shutdown: watch::Sender<bool>,
    poller: StdMutex<Option<JoinHandle<()>>>,
    timers: StdMutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardSession")
            .field("backend", &self.backend.base_url())
            .field("user", &self.user)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn apply<T>(slot: &mut T, result: Result<T, ClientError>, slice: &'static str) {
    match result {
        Ok(value) => *slot = value,
        Err(err) => warn!(slice, error = %err, "read failed; keeping previous data"),
    }
}

impl DashboardSession {
    pub fn new(
        backend: Arc<dyn PaydaBackend>,
        config: ClientConfig,
        user: Option<CurrentUser>,
    ) -> Arc<Self> {
        let notifications = NotificationCenter::new(NotificationConfig::from(&config));
        let (shutdown, _) = watch::channel(false);

        Arc::new(Self {
            backend,
            config,
            user,
            state: RwLock::new(DashboardState::default()),
            notifications: Mutex::new(notifications),
            refreshes_in_flight: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            shutdown,
            poller: StdMutex::new(None),
            timers: StdMutex::new(Vec::new()),
        })
    }

    pub fn backend(&self) -> &Arc<dyn PaydaBackend> {
        &self.backend
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn require_user(&self) -> Result<&CurrentUser, ClientError> {
        self.user.as_ref().ok_or(ClientError::MissingUser)
    }

    /// Starts the poller and, for a signed-in user, the welcome timer.
    /// The poller stops by itself once the last strong handle to the session
    /// is dropped; `close` stops it immediately.
    pub fn start(self: &Arc<Self>) {
        if self.is_closed() {
            return;
        }

        let handle = spawn_poller(self, self.shutdown.subscribe());
        if let Some(previous) = self.poller_slot().replace(handle) {
            previous.abort();
        }

        if self.user.is_some() {
            let session = Arc::clone(self);
            self.spawn_timer(self.config.welcome_delay(), async move {
                session
                    .notify(
                        "Welcome!",
                        "Welcome to PAYDA. You can manage your coupons and needs here.",
                        NotificationKind::Success,
                        SUCCESS_ICON,
                    )
                    .await;
            });
        }
    }

    /// Stops the poller and cancels pending timers. Results of requests
    /// still in flight are dropped.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.shutdown.send_replace(true);
        for timer in self.timers_slot().drain(..) {
            timer.abort();
        }
        // The poller exits on the shutdown signal once its current tick is done
        self.poller_slot().take();
        info!(user_id = self.user.as_ref().map(|u| u.id), "dashboard session closed");
    }

    fn poller_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.poller.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn timers_slot(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn spawn_timer<F>(&self, delay: Duration, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        let mut timers = self.timers_slot();
        timers.retain(|timer| !timer.is_finished());
        timers.push(handle);
    }

    /// Schedules a full refresh after `delay`. Cancelled by [`close`](Self::close).
    pub fn schedule_refresh(self: &Arc<Self>, delay: Duration) {
        if self.is_closed() {
            return;
        }
        let session = Arc::clone(self);
        self.spawn_timer(delay, async move {
            session.refresh().await;
        });
    }

    /// Re-reads every slice concurrently. A failed read keeps its slice as it was.
    #[instrument(skip(self), fields(user_id = self.user.as_ref().map(|u| u.id)))]
    pub async fn refresh(&self) {
        if self.is_closed() {
            return;
        }

        self.refreshes_in_flight.fetch_add(1, Ordering::SeqCst);
        self.state.write().await.loading = true;

        let backend = &self.backend;
        let user_id = self.user.as_ref().map(|u| u.id);
        let unassigned_query = CouponQuery::unassigned();

        let (items, needs, unassigned, mine, donations) = tokio::join!(
            backend.list_items(),
            backend.list_needs(Some(NeedStatus::Active)),
            backend.list_coupons(&unassigned_query),
            async {
                match user_id {
                    Some(id) => Some(backend.list_coupons(&CouponQuery::held_by(id)).await),
                    None => None,
                }
            },
            backend.list_donations(),
        );

        let still_loading = self.refreshes_in_flight.fetch_sub(1, Ordering::SeqCst) > 1;
        let mut state = self.state.write().await;
        state.loading = still_loading;

        if self.is_closed() {
            debug!("session closed during refresh; discarding results");
            return;
        }

        apply(&mut state.items, items, "items");
        apply(&mut state.active_needs, needs, "active_needs");
        apply(&mut state.unassigned_coupons, unassigned, "unassigned_coupons");
        if let Some(mine) = mine {
            apply(&mut state.my_coupons, mine, "my_coupons");
        }
        apply(
            &mut state.coupon_donations,
            donations.map(donation::coupon_donations),
            "coupon_donations",
        );
        state.last_refreshed = Some(Utc::now());
    }

    /// Claims one unassigned coupon of the given type for the current user.
    ///
    /// Refuses locally when nobody is signed in or the user already holds a
    /// coupon of the type; in both cases the backend is not contacted.
    #[instrument(skip(self))]
    pub async fn claim_coupon(self: &Arc<Self>, coupon_type_id: i64) -> Result<Coupon, ClientError> {
        let user_id = self.require_user()?.id;

        if self.claimed_types().await.contains(&coupon_type_id) {
            return Err(ClientError::AlreadyClaimed(coupon_type_id));
        }

        let unassigned = self.backend.list_coupons(&CouponQuery::unassigned()).await?;
        let mut coupon = unassigned
            .into_iter()
            .find(|c| c.coupon_type_id == coupon_type_id)
            .ok_or(ClientError::NoCouponAvailable(coupon_type_id))?;

        let outcome = self
            .backend
            .assign_coupon(&AssignCouponRequest {
                coupon_id: coupon.id,
                beneficiary_id: user_id,
            })
            .await?;
        debug!(coupon_id = coupon.id, message = ?outcome.message, "coupon assigned");

        coupon.status = CouponStatus::Assigned;
        coupon.beneficiary_id = Some(user_id);

        self.notify(
            "Coupon Claimed",
            "Coupon claimed successfully!",
            NotificationKind::Success,
            SUCCESS_ICON,
        )
        .await;
        self.schedule_refresh(self.config.refresh_delay());
        Ok(coupon)
    }

    /// Redeems a coupon. The backend reports domain failures inside the
    /// response envelope; anything but `"success"` becomes an error.
    #[instrument(skip(self))]
    pub async fn use_coupon(self: &Arc<Self>, coupon_id: i64) -> Result<OperationStatus, ClientError> {
        let outcome = self
            .backend
            .use_coupon(&UseCouponRequest { coupon_id })
            .await?;

        if !outcome.is_success() {
            return Err(ClientError::Backend {
                status: 200,
                message: outcome
                    .message
                    .clone()
                    .unwrap_or_else(|| "Coupon could not be used".to_string()),
            });
        }

        self.notify(
            "Coupon Used",
            "Coupon used successfully!",
            NotificationKind::Success,
            SUCCESS_ICON,
        )
        .await;
        self.schedule_refresh(self.config.refresh_delay());
        Ok(outcome)
    }

    /// Posts a new need for the current user, then refreshes.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_need(&self, draft: NewNeed) -> Result<CreatedNeed, ClientError> {
        let user_id = self.require_user()?.id;
        let need = NewNeed { user_id, ..draft }.normalized();
        need.validate()?;

        let created = self.backend.create_need(&need).await?;
        info!(need_id = created.id, "need created");

        self.notify(
            "Need Created",
            format!("{} was created successfully.", created.title),
            NotificationKind::Success,
            SUCCESS_ICON,
        )
        .await;
        self.refresh().await;
        Ok(created)
    }

    /// A need together with its most recent donations.
    #[instrument(skip(self))]
    pub async fn need_detail(&self, need_id: i64) -> Result<NeedDetail, ClientError> {
        let (need, donations) =
            tokio::try_join!(self.backend.get_need(need_id), self.backend.list_donations())?;

        let mut recent: Vec<Donation> = donations
            .into_iter()
            .filter(|d| d.need_id == Some(need_id))
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(self.config.recent_donation_limit);

        Ok(NeedDetail {
            need,
            recent_donations: recent,
        })
    }

    pub async fn notify(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        icon: impl Into<String>,
    ) -> Option<Uuid> {
        self.notifications
            .lock()
            .await
            .notify(title, message, kind, icon)
    }

    /// Direct access to the notification list and toasts.
    pub fn notifications(&self) -> &Mutex<NotificationCenter> {
        &self.notifications
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn claimed_types(&self) -> HashSet<i64> {
        claimed_coupon_types(&self.state.read().await.my_coupons)
    }

    pub async fn coupon_groups(&self, filter: &ViewFilter) -> Vec<CouponTypeGroup> {
        group_coupon_types(&self.state.read().await.items, filter)
    }

    pub async fn items(&self, filter: &ViewFilter) -> Vec<ShowcaseItem> {
        let state = self.state.read().await;
        filter_items(&state.items, filter).into_iter().cloned().collect()
    }

    pub async fn needs(&self, filter: &ViewFilter) -> Vec<Need> {
        let state = self.state.read().await;
        filter_needs(&state.active_needs, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Sum of the coupon donations currently cached.
    pub async fn total_coupon_donations(&self) -> Decimal {
        self.state
            .read()
            .await
            .coupon_donations
            .iter()
            .map(|d| d.amount)
            .sum()
    }
}
