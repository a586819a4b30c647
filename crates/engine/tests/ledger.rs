mod common;

use engine::{EngineError, LedgerCmd, Money, Role, TransactionKind};
use uuid::Uuid;

use common::setup;

#[tokio::test]
async fn admin_deposit_adds_to_balance_and_records_entry() {
    let env = setup().await;
    let traveler = env.user("lucia", Role::Traveler).await;
    let wallet = env.wallet_of(traveler.id).await;
    env.deposit(wallet.id, 10_000).await;

    let tx = env
        .engine
        .apply_transaction(LedgerCmd::deposit(env.admin_id(), wallet.id, Money::new(5_000)))
        .await
        .unwrap();

    assert_eq!(tx.kind, TransactionKind::Deposit);
    assert_eq!(tx.amount, Money::new(5_000));
    assert_eq!(tx.description, "Admin deposit: 50.00 AXO");
    assert_eq!(tx.reference_id, Some(env.admin.id));
    assert_eq!(env.wallet_of(traveler.id).await.balance, Money::new(15_000));
    assert_eq!(env.transaction_count(wallet.id).await, 2);
}

#[tokio::test]
async fn withdrawal_above_balance_changes_nothing() {
    let env = setup().await;
    let traveler = env.user("mateo", Role::Traveler).await;
    let wallet = env.wallet_of(traveler.id).await;
    env.deposit(wallet.id, 3_000).await;

    let err = env
        .engine
        .apply_transaction(
            LedgerCmd::withdrawal(env.admin_id(), wallet.id, Money::new(5_000)).confirmed(true),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InsufficientFunds("balance 30.00 AXO is lower than 50.00".to_string())
    );
    assert!(err.is_clean_failure());
    assert_eq!(env.wallet_of(traveler.id).await.balance, Money::new(3_000));
    assert_eq!(env.transaction_count(wallet.id).await, 1);
}

#[tokio::test]
async fn confirmed_withdrawal_is_stored_negative() {
    let env = setup().await;
    let traveler = env.user("sofia", Role::Traveler).await;
    let wallet = env.wallet_of(traveler.id).await;
    env.deposit(wallet.id, 3_000).await;

    let tx = env
        .engine
        .apply_transaction(
            LedgerCmd::withdrawal(env.admin_id(), wallet.id, Money::new(3_000))
                .confirmed(true)
                .description("payout to bank"),
        )
        .await
        .unwrap();

    assert_eq!(tx.amount, Money::new(-3_000));
    assert_eq!(tx.description, "payout to bank");
    assert_eq!(env.wallet_of(traveler.id).await.balance, Money::ZERO);
}

#[tokio::test]
async fn withdrawal_requires_confirmation() {
    let env = setup().await;
    let traveler = env.user("diego", Role::Traveler).await;
    let wallet = env.wallet_of(traveler.id).await;
    env.deposit(wallet.id, 3_000).await;

    let err = env
        .engine
        .apply_transaction(LedgerCmd::withdrawal(env.admin_id(), wallet.id, Money::new(1_000)))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::ConfirmationRequired("withdrawals must be confirmed".to_string())
    );
    assert_eq!(env.wallet_of(traveler.id).await.balance, Money::new(3_000));
}

#[tokio::test]
async fn only_admins_move_money() {
    let env = setup().await;
    let provider = env.user("casa_maya", Role::Provider).await;
    let wallet = env.wallet_of(provider.id).await;

    let err = env
        .engine
        .apply_transaction(LedgerCmd::deposit(Some(provider.id), wallet.id, Money::new(100)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientPermissions("admin role required".to_string())
    );

    let err = env
        .engine
        .apply_transaction(LedgerCmd::deposit(None, wallet.id, Money::new(100)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Unauthorized("no authenticated identity".to_string())
    );

    let ghost = Uuid::new_v4();
    let err = env
        .engine
        .apply_transaction(LedgerCmd::deposit(Some(ghost), wallet.id, Money::new(100)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ProfileNotFound(format!("profile {ghost} not exists"))
    );

    assert_eq!(env.transaction_count(wallet.id).await, 0);
}

#[tokio::test]
async fn non_positive_amount_is_rejected_before_wallet_lookup() {
    let env = setup().await;
    let missing_wallet = Uuid::new_v4();

    for minor in [0, -500] {
        let err = env
            .engine
            .apply_transaction(LedgerCmd::deposit(
                env.admin_id(),
                missing_wallet,
                Money::new(minor),
            ))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("amount must be positive".to_string())
        );
    }
}

#[tokio::test]
async fn unknown_wallet_is_reported() {
    let env = setup().await;
    let missing_wallet = Uuid::new_v4();

    let err = env
        .engine
        .apply_transaction(LedgerCmd::deposit(
            env.admin_id(),
            missing_wallet,
            Money::new(100),
        ))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::WalletNotFound(format!("wallet {missing_wallet} not exists"))
    );
}

#[tokio::test]
async fn balance_matches_ledger_after_mixed_operations() {
    let env = setup().await;
    let traveler = env.user("valeria", Role::Traveler).await;
    let wallet = env.wallet_of(traveler.id).await;

    env.deposit(wallet.id, 12_345).await;
    env.deposit(wallet.id, 655).await;
    env.engine
        .apply_transaction(
            LedgerCmd::withdrawal(env.admin_id(), wallet.id, Money::new(4_000)).confirmed(true),
        )
        .await
        .unwrap();
    env.engine
        .apply_transaction(
            LedgerCmd::withdrawal(env.admin_id(), wallet.id, Money::new(99_999)).confirmed(true),
        )
        .await
        .unwrap_err();

    let report = env
        .engine
        .reconcile_wallet(env.admin_id(), wallet.id)
        .await
        .unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.balance, Money::new(9_000));
    assert_eq!(report.entries, 3);

    let entries = env
        .engine
        .list_wallet_transactions(env.admin_id(), wallet.id, 2)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|tx| tx.wallet_id == wallet.id));
}

#[tokio::test]
async fn new_users_get_an_empty_axo_wallet() {
    let env = setup().await;
    let traveler = env.user("andrea", Role::Traveler).await;

    let wallet = env.wallet_of(traveler.id).await;
    assert_eq!(wallet.balance, Money::ZERO);
    assert_eq!(wallet.currency, engine::Currency::Axo);

    let same = env.engine.wallet(env.admin_id(), wallet.id).await.unwrap();
    assert_eq!(same.id, wallet.id);
    assert_eq!(same.user_id, traveler.id);
}

#[tokio::test]
async fn balance_changed_behind_the_ledger_is_a_concurrent_update() {
    let env = setup().await;
    let traveler = env.user("lucia", Role::Traveler).await;
    let wallet = env.wallet_of(traveler.id).await;
    env.deposit(wallet.id, 10_000).await;

    // Another writer moves the balance right after the entry is inserted.
    env.exec(
        "CREATE TRIGGER concurrent_writer AFTER INSERT ON transactions \
         WHEN NEW.description = 'race' \
         BEGIN UPDATE wallets SET balance = balance + 1 WHERE id = NEW.wallet_id; END",
        vec![],
    )
    .await;

    let err = env
        .engine
        .apply_transaction(
            LedgerCmd::deposit(env.admin_id(), wallet.id, Money::new(5_000)).description("race"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::ConcurrentUpdate(_)));
    assert!(err.is_clean_failure());
    assert_eq!(env.wallet_of(traveler.id).await.balance, Money::new(10_000));
    assert_eq!(env.transaction_count(wallet.id).await, 1);
}

#[tokio::test]
async fn failed_balance_update_leaves_no_entry() {
    let env = setup().await;
    let traveler = env.user("mateo", Role::Traveler).await;
    let wallet = env.wallet_of(traveler.id).await;
    env.deposit(wallet.id, 10_000).await;

    env.exec(
        "CREATE TRIGGER frozen_wallet BEFORE UPDATE OF balance ON wallets \
         BEGIN SELECT RAISE(ABORT, 'wallet frozen'); END",
        vec![],
    )
    .await;

    let err = env
        .engine
        .apply_transaction(LedgerCmd::deposit(env.admin_id(), wallet.id, Money::new(5_000)))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Database(_)));
    assert_eq!(env.wallet_of(traveler.id).await.balance, Money::new(10_000));
    assert_eq!(env.transaction_count(wallet.id).await, 1);
}
