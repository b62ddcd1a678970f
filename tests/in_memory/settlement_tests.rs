//! In-memory integration tests for accept-and-pay.

use super::helpers::{ADMIN, OTHER_ADMIN, Stack, WORKER, stack};
use questbank::error::{Classify, ErrorKind};
use questbank::ledger::domain::TransactionStatus;
use questbank::task::domain::TaskStatus;
use rstest::rstest;
use rust_decimal_macros::dec;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clean_lab_is_accepted_and_paid(stack: Stack) -> eyre::Result<()> {
    let task = stack.submitted_task("clean lab", dec!(50)).await;
    eyre::ensure!(task.status() == TaskStatus::WaitingForAcceptance);

    let settlement = stack.settlements.accept_and_pay(task.id(), &ADMIN).await?;

    eyre::ensure!(settlement.task.status() == TaskStatus::Completed);
    eyre::ensure!(stack.balance(ADMIN.id()).await == dec!(50));
    eyre::ensure!(stack.balance(WORKER.id()).await == dec!(50));

    let log = stack.transactions.user_transactions(WORKER.id()).await?;
    eyre::ensure!(log.len() == 1);
    let payout = log.first().ok_or_else(|| eyre::eyre!("missing payout"))?;
    eyre::ensure!(payout.status() == TransactionStatus::Completed);
    eyre::ensure!(payout.sender_id() == ADMIN.id());
    eyre::ensure!(payout.amount().value() == dec!(50));
    eyre::ensure!(payout.task_id() == Some(task.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn wrong_admin_changes_nothing(stack: Stack) -> eyre::Result<()> {
    stack.fund(OTHER_ADMIN.id(), dec!(100));
    let task = stack.submitted_task("clean lab", dec!(50)).await;

    let result = stack.settlements.accept_and_pay(task.id(), &OTHER_ADMIN).await;

    eyre::ensure!(
        result.as_ref().err().map(Classify::kind) == Some(ErrorKind::NotEnoughPermission)
    );
    eyre::ensure!(stack.tasks.get(task.id()).await?.status() == TaskStatus::WaitingForAcceptance);
    eyre::ensure!(stack.balance(ADMIN.id()).await == dec!(100));
    eyre::ensure!(stack.balance(OTHER_ADMIN.id()).await == dec!(100));
    eyre::ensure!(stack.balance(WORKER.id()).await.is_zero());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reconcile_pays_tasks_accepted_while_underfunded(stack: Stack) -> eyre::Result<()> {
    stack.fund(ADMIN.id(), dec!(20));
    let task = stack.submitted_task("clean lab", dec!(50)).await;

    let failed = stack.settlements.accept_and_pay(task.id(), &ADMIN).await;
    eyre::ensure!(failed.as_ref().err().map(Classify::kind) == Some(ErrorKind::InsufficientFunds));
    eyre::ensure!(stack.tasks.get(task.id()).await?.status() == TaskStatus::Completed);

    stack.fund(ADMIN.id(), dec!(75));
    let report = stack.settlements.reconcile(&ADMIN).await?;

    eyre::ensure!(report.settled == vec![task.id()]);
    eyre::ensure!(stack.balance(ADMIN.id()).await == dec!(25));
    eyre::ensure!(stack.balance(WORKER.id()).await == dec!(50));
    eyre::ensure!(stack.settlements.unsettled_tasks(&ADMIN).await?.is_empty());
    Ok(())
}
