//! End-to-end flows through the wired application context.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Datelike, Duration, Utc};
use lexbook_api::{create_router, AppContext};
use lexbook_domain::{
    AppointmentStatus, BookingRequest, CancelTarget, Frequency, NewAvailabilityRule,
};
use lexbook_infra::config::{Config, DatabaseConfig, ServerConfig, SweeperConfig};
use lexbook_infra::{DbManager, SqliteWalletLedger};
use lexbook_core::WalletLedger;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

fn scratch_context() -> (Arc<AppContext>, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir created");
    let config = Config {
        database: DatabaseConfig { path: temp_dir.path().join("test.db"), pool_size: 4 },
        server: ServerConfig { bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)) },
        sweeper: SweeperConfig { cron_expression: "0 0 * * * *".into() },
    };
    let db = Arc::new(
        DbManager::new(&config.database.path, config.database.pool_size)
            .expect("manager created"),
    );
    db.run_migrations().expect("migrations run");
    (Arc::new(AppContext::with_database(config, db)), temp_dir)
}

fn request_for(slot_id: Uuid, advocate_id: Uuid, user_id: Uuid) -> BookingRequest {
    BookingRequest {
        advocate_id,
        slot_id,
        user_id,
        user_name: "Asha Verma".into(),
        notes: Some("initial consultation".into()),
        case_id: None,
    }
}

#[tokio::test]
async fn book_then_cancel_refunds_the_user() {
    let (ctx, _guard) = scratch_context();
    let advocate = Uuid::new_v4();
    let user = Uuid::new_v4();

    let slot = ctx
        .availability
        .create_slot(advocate, Utc::now() + Duration::days(2))
        .await
        .unwrap();

    let booking = ctx.bookings.book(request_for(slot.id, advocate, user)).await.unwrap();
    assert_eq!(booking.status, AppointmentStatus::Confirmed);

    // the slot is gone from the open inventory
    assert!(ctx.availability.available_slots(advocate).await.unwrap().is_empty());

    ctx.bookings.cancel(CancelTarget::Booking(booking.id)).await.unwrap();

    let history = ctx.bookings.history_for_user(user).await.unwrap();
    assert_eq!(history[0].status, AppointmentStatus::Cancelled);

    let ledger = SqliteWalletLedger::new(ctx.db.clone());
    let wallet = ledger.get_or_create_wallet(user).await.unwrap();
    assert_eq!(wallet.balance, 100);

    // cancelling released the slot back into the inventory
    let open = ctx.availability.available_slots(advocate).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, slot.id);
}

#[tokio::test]
async fn double_booking_the_same_slot_conflicts() {
    let (ctx, _guard) = scratch_context();
    let advocate = Uuid::new_v4();

    let slot = ctx
        .availability
        .create_slot(advocate, Utc::now() + Duration::days(1))
        .await
        .unwrap();

    ctx.bookings.book(request_for(slot.id, advocate, Uuid::new_v4())).await.unwrap();
    let err = ctx
        .bookings
        .book(request_for(slot.id, advocate, Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, lexbook_domain::LexbookError::Conflict(_)));
}

#[tokio::test]
async fn postponing_moves_the_booking_between_slots() {
    let (ctx, _guard) = scratch_context();
    let advocate = Uuid::new_v4();
    let user = Uuid::new_v4();

    let first = ctx
        .availability
        .create_slot(advocate, Utc::now() + Duration::days(2))
        .await
        .unwrap();
    let second = ctx
        .availability
        .create_slot(advocate, Utc::now() + Duration::days(3))
        .await
        .unwrap();

    let booking = ctx.bookings.book(request_for(first.id, advocate, user)).await.unwrap();
    let moved = ctx
        .bookings
        .postpone(booking.id, second.starts_at, "client travel".into())
        .await
        .unwrap();

    assert_eq!(moved.slot_id, second.id);
    assert_eq!(moved.status, AppointmentStatus::Postponed);
    assert_eq!(moved.postpone_reason.as_deref(), Some("client travel"));

    // the vacated slot is bookable again, the new one is not
    let open = ctx.availability.available_slots(advocate).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, first.id);
}

#[tokio::test]
async fn recurring_rule_expands_into_bookable_slots() {
    let (ctx, _guard) = scratch_context();
    let advocate = Uuid::new_v4();

    let today = Utc::now().date_naive();
    let tomorrow = today + Duration::days(1);
    let payload = NewAvailabilityRule {
        advocate_id: advocate,
        description: "weekly consultations".into(),
        start_date: today,
        end_date: today + Duration::days(14),
        frequency: Frequency::Weekly,
        days_of_week: BTreeSet::from([tomorrow.weekday().num_days_from_sunday() as u8]),
        time_slot: "10:30".into(),
        exceptions: BTreeSet::new(),
    };

    let (_, inserted) = ctx.availability.create_rule(payload).await.unwrap();
    assert!(inserted >= 2);

    let open = ctx.availability.available_slots(advocate).await.unwrap();
    assert_eq!(open.len(), inserted);
    assert!(open.iter().all(|slot| slot.is_available));
}

#[tokio::test]
async fn http_surface_maps_domain_errors() {
    let (ctx, _guard) = scratch_context();
    let app = create_router(ctx);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/bookings/{}/cancel", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
