//! Wallet endpoints of the finance dashboard.

use api_types::wallet::{
    Reconciliation, TransactionKind, TransactionListQuery, TransactionNew, TransactionView,
    WalletView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{LedgerCmd, Money, Profile, Transaction, Wallet};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

const DEFAULT_LIST_LIMIT: u64 = 50;
const MAX_LIST_LIMIT: u64 = 500;

fn kind_view(kind: engine::TransactionKind) -> TransactionKind {
    match kind {
        engine::TransactionKind::Deposit => TransactionKind::Deposit,
        engine::TransactionKind::Withdrawal => TransactionKind::Withdrawal,
    }
}

fn transaction_view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        wallet_id: tx.wallet_id,
        kind: kind_view(tx.kind),
        amount_minor: tx.amount.minor(),
        description: tx.description,
        reference_id: tx.reference_id,
        created_at: tx.created_at,
    }
}

fn wallet_view(wallet: Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        user_id: wallet.user_id,
        balance_minor: wallet.balance.minor(),
        currency: wallet.currency.code().to_string(),
        updated_at: wallet.updated_at,
    }
}

pub async fn wallet_for_user(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<WalletView>, ServerError> {
    let wallet = state
        .engine
        .wallet_for_user(Some(admin.id), user_id)
        .await?;
    Ok(Json(wallet_view(wallet)))
}

/// Deposit or withdrawal on behalf of the wallet owner.
pub async fn transaction_new(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let amount = Money::new(payload.amount_minor);
    let mut cmd = match payload.kind {
        TransactionKind::Deposit => LedgerCmd::deposit(Some(admin.id), wallet_id, amount),
        TransactionKind::Withdrawal => LedgerCmd::withdrawal(Some(admin.id), wallet_id, amount),
    }
    .confirmed(payload.confirmed);
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let tx = state.engine.apply_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(transaction_view(tx))))
}

pub async fn transaction_list(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let entries = state
        .engine
        .list_wallet_transactions(Some(admin.id), wallet_id, limit)
        .await?;
    Ok(Json(entries.into_iter().map(transaction_view).collect()))
}

pub async fn reconciliation(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<Reconciliation>, ServerError> {
    let report = state
        .engine
        .reconcile_wallet(Some(admin.id), wallet_id)
        .await?;
    Ok(Json(Reconciliation {
        wallet_id: report.wallet_id,
        balance_minor: report.balance.minor(),
        ledger_sum_minor: report.ledger_sum.minor(),
        entries: report.entries,
        consistent: report.is_consistent(),
    }))
}
