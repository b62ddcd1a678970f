//! In-memory integration tests for balances and transfers.

use super::helpers::{ADMIN, Stack, WORKER, stack};
use questbank::error::{Classify, ErrorKind};
use questbank::identity::UserId;
use questbank::ledger::domain::TransactionStatus;
use rstest::rstest;
use rust_decimal_macros::dec;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registration_opens_a_zero_balance(stack: Stack) -> eyre::Result<()> {
    let newcomer = UserId::new(500);

    stack.transactions.open_balance(newcomer).await?;

    eyre::ensure!(stack.balance(newcomer).await.is_zero());
    eyre::ensure!(stack.transactions.user_transactions(newcomer).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transfers_appear_for_both_parties_in_storage_order(stack: Stack) -> eyre::Result<()> {
    let first = stack.transactions.transfer(ADMIN.id(), WORKER.id(), dec!(30)).await?;
    let second = stack.transactions.transfer(WORKER.id(), ADMIN.id(), dec!(10)).await?;

    let for_admin = stack.transactions.user_transactions(ADMIN.id()).await?;
    let for_worker = stack.transactions.user_transactions(WORKER.id()).await?;

    eyre::ensure!(for_admin == vec![first.clone(), second.clone()]);
    eyre::ensure!(for_worker == vec![first, second]);
    eyre::ensure!(
        for_admin
            .iter()
            .all(|tx| tx.status() == TransactionStatus::Completed)
    );
    eyre::ensure!(stack.balance(ADMIN.id()).await == dec!(80));
    eyre::ensure!(stack.balance(WORKER.id()).await == dec!(20));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn short_balance_records_nothing(stack: Stack) -> eyre::Result<()> {
    stack.fund(ADMIN.id(), dec!(10));

    let result = stack.transactions.transfer(ADMIN.id(), WORKER.id(), dec!(50)).await;

    eyre::ensure!(result.as_ref().err().map(Classify::kind) == Some(ErrorKind::InsufficientFunds));
    eyre::ensure!(stack.balance(ADMIN.id()).await == dec!(10));
    eyre::ensure!(stack.transactions.user_transactions(ADMIN.id()).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn leaderboard_reflects_transfers(stack: Stack) -> eyre::Result<()> {
    stack.fund(UserId::new(3), dec!(60));
    stack.transactions.transfer(ADMIN.id(), WORKER.id(), dec!(70)).await?;

    let top = stack.transactions.leaderboard(Some(2)).await?;
    let ranking: Vec<(UserId, rust_decimal::Decimal)> = top
        .iter()
        .map(|balance| (balance.user_id(), balance.amount()))
        .collect();

    eyre::ensure!(ranking == vec![(WORKER.id(), dec!(70)), (UserId::new(3), dec!(60))]);
    Ok(())
}
