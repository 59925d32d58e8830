//! Hold expiry and cancellation warnings
//!
//! Two background tasks share one interval style: `select!` between the
//! tick and the shutdown signal, run an idempotent core function, log and
//! continue on per-row failures. The core functions are plain async logic
//! so tests drive them directly without any scheduling.
//!
//! Safe to run concurrently with user-initiated cancellation: every
//! mutation is a compare-and-set on the Reserved status, and a `false`
//! result is a lost race, not an error.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use metrics::counter;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{info, warn};

use crate::config::ReservationsConfig;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::Reservation;
use crate::domain::DomainResult;
use crate::notifications::events::{
    ReservationCancellationWarningEvent, ReservationCancelledEvent,
};
use crate::notifications::{Event, SharedEventBus};
use crate::shared::shutdown::ShutdownSignal;

/// Start the periodic expiry sweep.
pub fn start_expiry_sweep_task(
    repos: Arc<dyn RepositoryProvider>,
    event_bus: SharedEventBus,
    shutdown: ShutdownSignal,
    rules: ReservationsConfig,
) {
    tokio::spawn(async move {
        info!(
            interval_minutes = rules.sweep_interval_minutes,
            hold_expiry_hours = rules.hold_expiry_hours,
            "🧹 Expiry sweep task started"
        );

        let mut ticker = interval(TokioDuration::from_secs(rules.sweep_interval_minutes * 60));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match sweep_expired_reservations(&repos, &event_bus, rules.hold_expiry_hours).await {
                        Ok(0) => {}
                        Ok(n) => info!("Expiry sweep cancelled {} stale holds", n),
                        Err(e) => warn!("Expiry sweep failed: {}", e),
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("🧹 Expiry sweep task shutting down");
                    break;
                }
            }
        }
    });
}

/// Start the periodic cancellation-warning task.
///
/// The already-warned set lives inside the task; duplicate warnings across
/// process restarts are acceptable, consumers are idempotent.
pub fn start_warning_task(
    repos: Arc<dyn RepositoryProvider>,
    event_bus: SharedEventBus,
    shutdown: ShutdownSignal,
    rules: ReservationsConfig,
) {
    tokio::spawn(async move {
        info!(
            interval_minutes = rules.sweep_interval_minutes,
            lead_hours = rules.warning_lead_hours,
            "⏰ Cancellation warning task started"
        );

        let mut ticker = interval(TokioDuration::from_secs(rules.sweep_interval_minutes * 60));
        let mut warned = HashSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) =
                        emit_cancellation_warnings(&repos, &event_bus, &rules, &mut warned).await
                    {
                        warn!("Cancellation warning pass failed: {}", e);
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("⏰ Cancellation warning task shutting down");
                    break;
                }
            }
        }
    });
}

/// Cancel every Reserved hold older than the expiry window.
///
/// Returns the number of holds cancelled in this pass. Each row is handled
/// independently: a failure is logged and the sweep moves on.
pub async fn sweep_expired_reservations(
    repos: &Arc<dyn RepositoryProvider>,
    event_bus: &SharedEventBus,
    hold_expiry_hours: i64,
) -> DomainResult<usize> {
    let cutoff = Utc::now() - Duration::hours(hold_expiry_hours);
    let stale = repos.reservations().find_reserved_created_before(cutoff).await?;

    let mut cancelled = 0;
    for reservation in stale {
        match repos.reservations().expire_hold(reservation.id).await {
            Ok(true) => {}
            // Lost the race to a user cancellation or a check-in; skip.
            Ok(false) => continue,
            Err(e) => {
                warn!("Could not expire reservation {}: {}", reservation.id, e);
                continue;
            }
        }

        if let Err(e) = repos.spots().release(reservation.spot_id).await {
            warn!(
                "Could not release spot {} of expired reservation {}: {}",
                reservation.spot_id, reservation.id, e
            );
        }
        refresh_zone_of_spot(repos, reservation.spot_id).await;

        counter!("reservations_expired_total").increment(1);
        cancelled += 1;

        emit_cancelled_event(repos, event_bus, &reservation).await;
    }

    Ok(cancelled)
}

/// Warn users whose hold enters its final stretch before auto-cancellation.
///
/// A hold created between `expiry - lead` and `expiry` hours ago expires
/// within the lead window. `warned` dedupes within a process lifetime and
/// is pruned to the current window so it cannot grow without bound.
pub async fn emit_cancellation_warnings(
    repos: &Arc<dyn RepositoryProvider>,
    event_bus: &SharedEventBus,
    rules: &ReservationsConfig,
    warned: &mut HashSet<i32>,
) -> DomainResult<usize> {
    let now = Utc::now();
    let from = now - Duration::hours(rules.hold_expiry_hours);
    let to = from + Duration::hours(rules.warning_lead_hours);

    let expiring = repos
        .reservations()
        .find_reserved_created_between(from, to)
        .await?;

    // Holds that fell out of the window can never re-enter it.
    let current: HashSet<i32> = expiring.iter().map(|r| r.id).collect();
    warned.retain(|id| current.contains(id));

    let mut emitted = 0;
    for reservation in &expiring {
        if !warned.insert(reservation.id) {
            continue;
        }

        let email = match repos.users().find_by_id(reservation.user_id).await {
            Ok(Some(user)) => user.email,
            Ok(None) => {
                warn!(
                    "No user {} for warning on reservation {}",
                    reservation.user_id, reservation.id
                );
                continue;
            }
            Err(e) => {
                warn!("User lookup failed for reservation {}: {}", reservation.id, e);
                continue;
            }
        };

        event_bus.publish(Event::ReservationCancellationWarning(
            ReservationCancellationWarningEvent {
                email,
                cancellation_time: reservation.expires_at(rules.hold_expiry_hours),
            },
        ));
        emitted += 1;
    }

    Ok(emitted)
}

async fn emit_cancelled_event(
    repos: &Arc<dyn RepositoryProvider>,
    event_bus: &SharedEventBus,
    reservation: &Reservation,
) {
    let email = match repos.users().find_by_id(reservation.user_id).await {
        Ok(Some(user)) => user.email,
        Ok(None) => {
            warn!(
                "No user {} for cancellation notification of reservation {}",
                reservation.user_id, reservation.id
            );
            return;
        }
        Err(e) => {
            warn!("User lookup failed for reservation {}: {}", reservation.id, e);
            return;
        }
    };

    let zone_name = match zone_name_of_spot(repos, reservation.spot_id).await {
        Some(name) => name,
        None => String::new(),
    };

    event_bus.publish(Event::ReservationCancelled(ReservationCancelledEvent {
        reservation_id: reservation.id,
        parking_zone_name: zone_name,
        email,
        cancelled_at: Utc::now(),
    }));
}

async fn zone_name_of_spot(repos: &Arc<dyn RepositoryProvider>, spot_id: i32) -> Option<String> {
    let spot = repos.spots().find_by_id(spot_id).await.ok()??;
    let zone = repos.zones().find_by_id(spot.zone_id).await.ok()??;
    Some(zone.name)
}

async fn refresh_zone_of_spot(repos: &Arc<dyn RepositoryProvider>, spot_id: i32) {
    let zone_id = match repos.spots().find_by_id(spot_id).await {
        Ok(Some(spot)) => spot.zone_id,
        _ => return,
    };
    if let Ok(available) = repos.spots().count_available(zone_id).await {
        let _ = repos.zones().set_full_flag(zone_id, available == 0).await;
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::reservation::{Reservation, SessionStatus};
    use crate::domain::user::User;
    use crate::domain::zone::{ParkingSpot, ParkingZone, SpotStatus};
    use crate::infrastructure::memory::InMemoryRepositoryProvider;
    use crate::notifications::create_event_bus;
    use rust_decimal::Decimal;

    async fn seeded_hold(
        repos: &Arc<dyn RepositoryProvider>,
        age_hours: i64,
    ) -> Reservation {
        let user = repos
            .users()
            .save(User::new(0, "driver@example.com", "Driver"))
            .await
            .unwrap();
        let zone = repos
            .zones()
            .save(ParkingZone::new(0, "Center", 1, 1, Decimal::from(5)))
            .await
            .unwrap();
        repos
            .spots()
            .insert_many(vec![ParkingSpot::new(0, zone.id, 1, 1)])
            .await
            .unwrap();

        let mut hold = Reservation::new(user.id, 1, 1);
        hold.created_at = Utc::now() - Duration::hours(age_hours);
        let hold = repos.reservations().save(hold).await.unwrap();
        repos.spots().reserve(1, hold.id).await.unwrap();
        hold
    }

    #[tokio::test]
    async fn stale_hold_is_cancelled_and_spot_freed() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let bus = create_event_bus();
        let mut subscriber = bus.subscribe();
        let hold = seeded_hold(&repos, 25).await;

        let cancelled = sweep_expired_reservations(&repos, &bus, 24).await.unwrap();
        assert_eq!(cancelled, 1);

        let reloaded = repos
            .reservations()
            .find_by_id(hold.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, SessionStatus::Cancelled);
        assert!(!reloaded.is_paid);

        let spot = repos.spots().find_by_id(1).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Available);

        let msg = subscriber.recv().await.unwrap();
        assert_eq!(msg.event.event_type(), "reservation_cancelled");
    }

    #[tokio::test]
    async fn fresh_hold_survives_the_sweep() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let bus = create_event_bus();
        let hold = seeded_hold(&repos, 2).await;

        let cancelled = sweep_expired_reservations(&repos, &bus, 24).await.unwrap();
        assert_eq!(cancelled, 0);

        let reloaded = repos
            .reservations()
            .find_by_id(hold.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, SessionStatus::Reserved);
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let bus = create_event_bus();
        seeded_hold(&repos, 30).await;

        assert_eq!(sweep_expired_reservations(&repos, &bus, 24).await.unwrap(), 1);
        assert_eq!(sweep_expired_reservations(&repos, &bus, 24).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn started_session_is_not_swept() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let bus = create_event_bus();
        let hold = seeded_hold(&repos, 25).await;

        // The car arrived just before the sweep ran
        repos
            .reservations()
            .begin_session(hold.id, Utc::now())
            .await
            .unwrap();

        assert_eq!(sweep_expired_reservations(&repos, &bus, 24).await.unwrap(), 0);
        let reloaded = repos
            .reservations()
            .find_by_id(hold.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn warning_is_emitted_once_per_hold() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let bus = create_event_bus();
        let mut subscriber = bus.subscribe();

        // 23.5h old with a 24h expiry and 1h lead: inside the warning window
        let user = repos
            .users()
            .save(User::new(0, "late@example.com", "Late"))
            .await
            .unwrap();
        let mut hold = Reservation::new(user.id, 1, 1);
        hold.created_at = Utc::now() - Duration::minutes(23 * 60 + 30);
        repos.reservations().save(hold).await.unwrap();

        let rules = ReservationsConfig::default();
        let mut warned = HashSet::new();

        let first = emit_cancellation_warnings(&repos, &bus, &rules, &mut warned)
            .await
            .unwrap();
        assert_eq!(first, 1);
        let msg = subscriber.recv().await.unwrap();
        assert_eq!(msg.event.event_type(), "reservation_cancellation_warning");
        assert_eq!(msg.event.email(), "late@example.com");

        // Second pass: already warned, nothing emitted
        let second = emit_cancellation_warnings(&repos, &bus, &rules, &mut warned)
            .await
            .unwrap();
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn young_hold_gets_no_warning() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let bus = create_event_bus();
        seeded_hold(&repos, 2).await;

        let rules = ReservationsConfig::default();
        let mut warned = HashSet::new();
        let emitted = emit_cancellation_warnings(&repos, &bus, &rules, &mut warned)
            .await
            .unwrap();
        assert_eq!(emitted, 0);
        assert!(warned.is_empty());
    }
}
