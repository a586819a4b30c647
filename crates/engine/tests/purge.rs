mod common;

use engine::{BookingStatus, EngineError, Money, PurgeCmd, Role, ServiceNew};
use sea_orm::Value;
use uuid::Uuid;

use common::{TestEnv, setup};

const CREATED_AT: &str = "2026-02-01 10:00:00+00:00";

fn id() -> String {
    Uuid::new_v4().to_string()
}

async fn insert_post(env: &TestEnv, author: Uuid, linked_service: Option<Uuid>) -> String {
    let post_id = id();
    env.exec(
        "INSERT INTO posts (id, user_id, video_url, description, linked_service_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
        vec![
            post_id.clone().into(),
            author.to_string().into(),
            "https://cdn.ketzal.mx/v/1.mp4".into(),
            "cenote tour".into(),
            Value::from(linked_service.map(|id| id.to_string())),
            CREATED_AT.into(),
        ],
    )
    .await;
    post_id
}

async fn insert_comment(env: &TestEnv, post_id: &str, author: Uuid) {
    env.exec(
        "INSERT INTO post_comments (id, post_id, user_id, parent_comment_id, content, created_at) \
         VALUES (?, ?, ?, NULL, ?, ?)",
        vec![
            id().into(),
            post_id.into(),
            author.to_string().into(),
            "¡Qué bonito!".into(),
            CREATED_AT.into(),
        ],
    )
    .await;
}

async fn insert_like(env: &TestEnv, post_id: &str, author: Uuid) {
    env.exec(
        "INSERT INTO post_likes (id, user_id, post_id, created_at) VALUES (?, ?, ?, ?)",
        vec![
            id().into(),
            author.to_string().into(),
            post_id.into(),
            CREATED_AT.into(),
        ],
    )
    .await;
}

async fn rows_for(env: &TestEnv, table: &str, column: &str, value: Uuid) -> i64 {
    env.count(
        &format!("SELECT COUNT(*) AS n FROM {table} WHERE {column} = ?"),
        vec![value.to_string().into()],
    )
    .await
}

#[tokio::test]
async fn confirmed_booking_blocks_the_purge() {
    let env = setup().await;
    let provider = env.user("casa_maya", Role::Provider).await;
    let traveler = env.user("lucia", Role::Traveler).await;
    let wallet = env.wallet_of(provider.id).await;
    env.deposit(wallet.id, 40_000).await;
    let service = env
        .engine
        .create_service(
            Some(provider.id),
            ServiceNew::new("Cenote tour", Money::new(120_000)),
        )
        .await
        .unwrap();
    let booking = env
        .engine
        .book_service(Some(traveler.id), service.id)
        .await
        .unwrap();
    env.engine
        .update_booking_status(Some(provider.id), booking.id, BookingStatus::Confirmed)
        .await
        .unwrap();

    let impact = env
        .engine
        .deletion_impact(env.admin_id(), provider.id)
        .await
        .unwrap();
    assert!(!impact.can_delete);
    assert_eq!(impact.active_bookings_as_provider, 1);
    assert_eq!(impact.services, 1);

    let err = env
        .engine
        .purge_user(PurgeCmd::new(env.admin_id(), provider.id).confirmed(true))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::HasActiveCommitments(
            "casa_maya has 1 pending or confirmed bookings on its services".to_string()
        )
    );

    assert_eq!(rows_for(&env, "profiles", "id", provider.id).await, 1);
    assert_eq!(rows_for(&env, "services", "provider_id", provider.id).await, 1);
    assert_eq!(rows_for(&env, "bookings", "service_id", service.id).await, 1);
    assert_eq!(env.wallet_of(provider.id).await.balance, Money::new(40_000));
    assert_eq!(env.transaction_count(wallet.id).await, 1);
    assert!(env.identities.contains(provider.id));
}

#[tokio::test]
async fn pending_booking_blocks_until_cancelled() {
    let env = setup().await;
    let provider = env.user("casa_maya", Role::Provider).await;
    let traveler = env.user("lucia", Role::Traveler).await;
    let service = env
        .engine
        .create_service(
            Some(provider.id),
            ServiceNew::new("Cenote tour", Money::new(120_000)),
        )
        .await
        .unwrap();
    let booking = env
        .engine
        .book_service(Some(traveler.id), service.id)
        .await
        .unwrap();

    let err = env
        .engine
        .purge_user(PurgeCmd::new(env.admin_id(), provider.id).confirmed(true))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::HasActiveCommitments(_)));
    assert_eq!(rows_for(&env, "profiles", "id", provider.id).await, 1);

    env.engine
        .update_booking_status(Some(provider.id), booking.id, BookingStatus::Cancelled)
        .await
        .unwrap();
    let impact = env
        .engine
        .deletion_impact(env.admin_id(), provider.id)
        .await
        .unwrap();
    assert!(impact.can_delete);
    assert_eq!(impact.active_bookings_as_provider, 0);

    env.engine
        .purge_user(PurgeCmd::new(env.admin_id(), provider.id).confirmed(true))
        .await
        .unwrap();
    assert_eq!(rows_for(&env, "profiles", "id", provider.id).await, 0);
    assert_eq!(rows_for(&env, "bookings", "service_id", service.id).await, 0);
    assert_eq!(rows_for(&env, "profiles", "id", traveler.id).await, 1);
}

#[tokio::test]
async fn completed_bookings_go_and_foreign_posts_are_unlinked() {
    let env = setup().await;
    let provider = env.user("casa_maya", Role::Provider).await;
    let traveler = env.user("lucia", Role::Traveler).await;
    let creator = env.user("mateo", Role::Ambassador).await;
    let service = env
        .engine
        .create_service(
            Some(provider.id),
            ServiceNew::new("Cenote tour", Money::new(120_000)),
        )
        .await
        .unwrap();
    let booking = env
        .engine
        .book_service(Some(traveler.id), service.id)
        .await
        .unwrap();
    env.engine
        .update_booking_status(Some(provider.id), booking.id, BookingStatus::Completed)
        .await
        .unwrap();
    let foreign_post = insert_post(&env, creator.id, Some(service.id)).await;

    let report = env
        .engine
        .purge_user(PurgeCmd::new(env.admin_id(), provider.id).confirmed(true))
        .await
        .unwrap();

    assert!(report.impact.can_delete);
    assert_eq!(report.impact.services, 1);
    assert_eq!(
        env.count(
            "SELECT COUNT(*) AS n FROM posts WHERE id = ? AND linked_service_id IS NULL",
            vec![foreign_post.into()],
        )
        .await,
        1
    );
    assert_eq!(rows_for(&env, "bookings", "service_id", service.id).await, 0);
    assert_eq!(rows_for(&env, "services", "id", service.id).await, 0);
    assert_eq!(rows_for(&env, "profiles", "id", provider.id).await, 0);
    assert_eq!(rows_for(&env, "wallets", "user_id", provider.id).await, 0);
    assert_eq!(rows_for(&env, "profiles", "id", traveler.id).await, 1);
    assert!(!env.identities.contains(provider.id));

    let err = env
        .engine
        .deletion_impact(env.admin_id(), provider.id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ProfileNotFound(format!("profile {} not exists", provider.id))
    );
}

#[tokio::test]
async fn purge_removes_every_dependent_row() {
    let env = setup().await;
    let provider = env.user("casa_maya", Role::Provider).await;
    let ambassador = env.user("mateo", Role::Ambassador).await;
    let target = env.user("lucia", Role::Traveler).await;
    let other = env.user("sofia", Role::Traveler).await;

    let wallet = env.wallet_of(target.id).await;
    env.deposit(wallet.id, 25_000).await;

    let service = env
        .engine
        .create_service(
            Some(provider.id),
            ServiceNew::new("Temazcal", Money::new(80_000)),
        )
        .await
        .unwrap();
    let booking = env
        .engine
        .book_service(Some(target.id), service.id)
        .await
        .unwrap();

    let own_post = insert_post(&env, target.id, None).await;
    insert_comment(&env, &own_post, other.id).await;
    insert_like(&env, &own_post, other.id).await;
    let other_post = insert_post(&env, other.id, Some(service.id)).await;
    insert_comment(&env, &other_post, target.id).await;
    insert_like(&env, &other_post, target.id).await;

    env.exec(
        "INSERT INTO service_reviews (id, service_id, user_id, booking_id, rating, comment, created_at) \
         VALUES (?, ?, ?, ?, 5, 'excelente', ?)",
        vec![
            id().into(),
            service.id.to_string().into(),
            target.id.to_string().into(),
            booking.id.to_string().into(),
            CREATED_AT.into(),
        ],
    )
    .await;
    env.exec(
        "INSERT INTO notifications (id, user_id, title, body, read, created_at) \
         VALUES (?, ?, 'Reserva recibida', NULL, 0, ?)",
        vec![id().into(), target.id.to_string().into(), CREATED_AT.into()],
    )
    .await;
    env.exec(
        "INSERT INTO referrals (id, ambassador_id, referred_user_id, status, created_at) \
         VALUES (?, ?, ?, 'completed', ?)",
        vec![
            id().into(),
            ambassador.id.to_string().into(),
            target.id.to_string().into(),
            CREATED_AT.into(),
        ],
    )
    .await;
    env.exec(
        "INSERT INTO ambassador_details (user_id, referral_code, commission_rate_bp, total_earnings_minor, created_at) \
         VALUES (?, 'LUCIA10', 1000, 0, ?)",
        vec![target.id.to_string().into(), CREATED_AT.into()],
    )
    .await;

    let impact = env
        .engine
        .deletion_impact(env.admin_id(), target.id)
        .await
        .unwrap();
    assert!(impact.can_delete);
    assert_eq!(impact.wallet_balance, Money::new(25_000));
    assert_eq!(impact.bookings_as_traveler, 1);
    assert_eq!(impact.posts, 1);
    assert_eq!(impact.services, 0);

    let report = env
        .engine
        .purge_user(PurgeCmd::new(env.admin_id(), target.id).confirmed(true))
        .await
        .unwrap();

    // No notification_preferences table in this schema: nothing to skip.
    assert!(report.skipped.is_empty());

    for (table, column) in [
        ("post_likes", "user_id"),
        ("post_comments", "user_id"),
        ("service_reviews", "user_id"),
        ("posts", "user_id"),
        ("bookings", "user_id"),
        ("wallets", "user_id"),
        ("notifications", "user_id"),
        ("ambassador_details", "user_id"),
        ("referrals", "referred_user_id"),
        ("profiles", "id"),
    ] {
        assert_eq!(rows_for(&env, table, column, target.id).await, 0, "{table}");
    }
    assert_eq!(rows_for(&env, "transactions", "wallet_id", wallet.id).await, 0);
    assert_eq!(
        env.count(
            "SELECT COUNT(*) AS n FROM post_comments WHERE post_id = ?",
            vec![own_post.into()],
        )
        .await,
        0
    );
    assert_eq!(
        env.count(
            "SELECT COUNT(*) AS n FROM posts WHERE id = ?",
            vec![other_post.into()],
        )
        .await,
        1
    );
    assert_eq!(rows_for(&env, "services", "id", service.id).await, 1);
    assert_eq!(rows_for(&env, "profiles", "id", other.id).await, 1);
    assert!(!env.identities.contains(target.id));
}

#[tokio::test]
async fn purge_needs_admin_and_confirmation() {
    let env = setup().await;
    let provider = env.user("casa_maya", Role::Provider).await;
    let target = env.user("lucia", Role::Traveler).await;

    let err = env
        .engine
        .purge_user(PurgeCmd::new(Some(provider.id), target.id).confirmed(true))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientPermissions("admin role required".to_string())
    );

    let err = env
        .engine
        .purge_user(PurgeCmd::new(env.admin_id(), target.id))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ConfirmationRequired("account deletion must be confirmed".to_string())
    );

    let err = env
        .engine
        .deletion_impact(Some(target.id), target.id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientPermissions("admin role required".to_string())
    );

    assert_eq!(rows_for(&env, "profiles", "id", target.id).await, 1);
}

#[tokio::test]
async fn purge_of_unknown_user_fails_cleanly() {
    let env = setup().await;
    let ghost = Uuid::new_v4();

    let err = env
        .engine
        .purge_user(PurgeCmd::new(env.admin_id(), ghost).confirmed(true))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ProfileNotFound(format!("profile {ghost} not exists"))
    );
}

#[tokio::test]
async fn identity_failure_is_reported_as_incomplete() {
    let env = setup().await;
    let target = env.user("lucia", Role::Traveler).await;
    env.identities.fail_deletes();

    let err = env
        .engine
        .purge_user(PurgeCmd::new(env.admin_id(), target.id).confirmed(true))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::PurgeIncomplete(_)));
    assert!(!err.is_clean_failure());
    assert_eq!(rows_for(&env, "profiles", "id", target.id).await, 0);
    assert!(env.identities.contains(target.id));
}

#[tokio::test]
async fn admin_deletes_a_post_with_its_interactions() {
    let env = setup().await;
    let author = env.user("mateo", Role::Ambassador).await;
    let fan = env.user("lucia", Role::Traveler).await;
    let post = insert_post(&env, author.id, None).await;
    let kept = insert_post(&env, author.id, None).await;
    insert_comment(&env, &post, fan.id).await;
    insert_like(&env, &post, fan.id).await;
    insert_like(&env, &kept, fan.id).await;
    let post_id = Uuid::parse_str(&post).unwrap();

    let err = env
        .engine
        .delete_post(Some(fan.id), post_id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientPermissions("admin role required".to_string())
    );

    let rows = env.engine.delete_post(env.admin_id(), post_id).await.unwrap();
    assert_eq!(rows, 3);
    assert_eq!(rows_for(&env, "posts", "id", post_id).await, 0);
    assert_eq!(rows_for(&env, "post_comments", "post_id", post_id).await, 0);
    assert_eq!(rows_for(&env, "post_likes", "user_id", fan.id).await, 1);
    assert_eq!(rows_for(&env, "posts", "user_id", author.id).await, 1);

    let err = env
        .engine
        .delete_post(env.admin_id(), post_id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("post not exists".to_string()));
}
