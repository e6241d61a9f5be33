//! Periodic showcase polling and the counter diffing that turns it into events.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::session::DashboardSession;
use crate::display::format_lira;
use crate::models::ShowcaseItem;
use crate::notifications::NotificationKind;

/// A change noticed between two consecutive polls.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// More unassigned coupons than last time, which was already non-zero.
    CouponsCreated {
        coupon_type_id: i64,
        title: String,
        company: String,
        delta: u32,
    },
    /// Unassigned coupons appeared where there were none.
    CouponsReady {
        coupon_type_id: i64,
        title: String,
        company: String,
        available: u32,
    },
    /// The pool balance grew from a non-zero value.
    DonationReceived {
        coupon_type_id: i64,
        title: String,
        delta: Decimal,
    },
}

impl PollEvent {
    pub fn coupon_type_id(&self) -> i64 {
        match self {
            PollEvent::CouponsCreated { coupon_type_id, .. }
            | PollEvent::CouponsReady { coupon_type_id, .. }
            | PollEvent::DonationReceived { coupon_type_id, .. } => *coupon_type_id,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PollEvent::CouponsCreated { .. } => "New Coupons Created!",
            PollEvent::CouponsReady { .. } => "Coupons Ready!",
            PollEvent::DonationReceived { .. } => "New Donation!",
        }
    }

    pub fn message(&self) -> String {
        match self {
            PollEvent::CouponsCreated {
                title,
                company,
                delta,
                ..
            } => format!(
                "{} new coupons were created for {}! Support provided by {}.",
                delta, title, company
            ),
            PollEvent::CouponsReady {
                title,
                company,
                available,
                ..
            } => format!(
                "{} coupons are available for {}! Support provided by {}.",
                available, title, company
            ),
            PollEvent::DonationReceived { title, delta, .. } => {
                format!("{} new donation received for {}!", format_lira(*delta), title)
            }
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            PollEvent::CouponsCreated { .. } => NotificationKind::Success,
            PollEvent::CouponsReady { .. } | PollEvent::DonationReceived { .. } => {
                NotificationKind::Info
            }
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            PollEvent::CouponsCreated { .. } => "fa-ticket-alt",
            PollEvent::CouponsReady { .. } => "fa-gift",
            PollEvent::DonationReceived { .. } => "fa-heart",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Counters {
    pub available: u32,
    pub collected: Decimal,
}

/// Last observed counters per coupon type. An unseen type counts as zero.
#[derive(Debug, Default)]
pub struct CounterTracker {
    baseline: HashMap<i64, Counters>,
}

impl CounterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline(&self, coupon_type_id: i64) -> Counters {
        self.baseline
            .get(&coupon_type_id)
            .copied()
            .unwrap_or_default()
    }

    /// Diffs `items` against the baseline recorded by the previous call, then
    /// replaces the baseline with the values seen now.
    pub fn observe(&mut self, items: &[ShowcaseItem]) -> Vec<PollEvent> {
        let mut events = Vec::new();
        let mut next = self.baseline.clone();

        for item in items {
            let type_id = item.type_key();
            let previous = self.baseline(type_id);
            let available = item.available_coupons;
            let collected = item.collected;

            if previous.available > 0 && available > previous.available {
                events.push(PollEvent::CouponsCreated {
                    coupon_type_id: type_id,
                    title: item.title.clone(),
                    company: item.company.clone(),
                    delta: available - previous.available,
                });
            }

            if previous.available == 0 && available > 0 {
                events.push(PollEvent::CouponsReady {
                    coupon_type_id: type_id,
                    title: item.title.clone(),
                    company: item.company.clone(),
                    available,
                });
            }

            if collected > previous.collected && previous.collected > Decimal::ZERO {
                events.push(PollEvent::DonationReceived {
                    coupon_type_id: type_id,
                    title: item.title.clone(),
                    delta: collected - previous.collected,
                });
            }

            next.insert(
                type_id,
                Counters {
                    available,
                    collected,
                },
            );
        }

        self.baseline = next;
        events
    }
}

/// One poll: fetch the showcase, notify about changes, then refresh the
/// whole session regardless of the outcome.
pub async fn poll_tick(session: &DashboardSession, tracker: &mut CounterTracker) -> Vec<PollEvent> {
    let events = match session.backend().list_items().await {
        Ok(items) => tracker.observe(&items),
        Err(err) => {
            warn!(error = %err, "showcase poll failed");
            Vec::new()
        }
    };

    if session.is_closed() {
        return events;
    }

    for event in &events {
        debug!(coupon_type_id = event.coupon_type_id(), title = event.title(), "poll event");
        session
            .notify(event.title(), event.message(), event.kind(), event.icon())
            .await;
    }

    session.refresh().await;
    events
}

/// Spawns the polling loop. Ticks never overlap: a tick that comes due while
/// the previous one is still running is skipped. The loop ends once
/// `shutdown` flips to `true`, its sender is dropped, or the session itself
/// has been dropped. The loop only holds a weak reference to the session.
pub fn spawn_poller(
    session: &Arc<DashboardSession>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let period = session.config().poll_interval();
    let session: Weak<DashboardSession> = Arc::downgrade(session);

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tracker = CounterTracker::new();

        info!(interval_ms = period.as_millis() as u64, "poller started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let Some(session) = session.upgrade() else {
                        break;
                    };
                    poll_tick(&session, &mut tracker).await;
                }
            }
        }
        info!("poller stopped");
    })
}
