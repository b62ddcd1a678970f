//! `PostgreSQL` integration tests for accept-and-pay and the one-payout rule.

use std::sync::Arc;

use super::helpers::{ADMIN, PgStack, WORKER, pg_stack};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use questbank::error::{Classify, ErrorKind};
use questbank::ledger::domain::TransactionStatus;
use questbank::task::domain::TaskStatus;
use rstest::rstest;
use rust_decimal_macros::dec;

#[rstest]
fn accept_and_pay_records_a_linked_payout(pg_stack: Option<PgStack>) -> eyre::Result<()> {
    let Some(stack) = pg_stack else {
        return Ok(());
    };
    stack.runtime.block_on(async {
        let task = stack.submitted_task("clean lab", dec!(50)).await?;

        let settlement = stack.settlements.accept_and_pay(task.id(), &ADMIN).await?;

        eyre::ensure!(settlement.task.status() == TaskStatus::Completed);
        let payout = stack
            .transactions
            .settlement_of(task.id())
            .await?
            .ok_or_else(|| eyre::eyre!("payout not stored"))?;
        eyre::ensure!(payout.status() == TransactionStatus::Completed);
        eyre::ensure!(payout.amount().value() == dec!(50));
        eyre::ensure!(stack.balance(ADMIN.id()).await? == dec!(50));
        eyre::ensure!(stack.balance(WORKER.id()).await? == dec!(50));
        Ok(())
    })
}

#[rstest]
fn racing_accepts_pay_exactly_once(pg_stack: Option<PgStack>) -> eyre::Result<()> {
    let Some(stack) = pg_stack else {
        return Ok(());
    };
    let task_id = stack
        .runtime
        .block_on(stack.submitted_task("clean lab", dec!(50)))?
        .id();

    let outcomes = stack.runtime.block_on(async {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let settlements = Arc::clone(&stack.settlements);
                tokio::spawn(async move { settlements.accept_and_pay(task_id, &ADMIN).await })
            })
            .collect();
        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.await?);
        }
        eyre::Ok(outcomes)
    })?;

    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let losers: Vec<ErrorKind> = outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().err().map(Classify::kind))
        .collect();
    eyre::ensure!(successes == 1);
    eyre::ensure!(losers == vec![ErrorKind::InvalidState; 3]);
    eyre::ensure!(stack.transaction_rows_for_task(task_id)? == 1);
    stack.runtime.block_on(async {
        eyre::ensure!(stack.balance(ADMIN.id()).await? == dec!(50));
        eyre::ensure!(stack.balance(WORKER.id()).await? == dec!(50));
        Ok(())
    })
}

#[rstest]
fn a_paid_task_cannot_be_settled_again(pg_stack: Option<PgStack>) -> eyre::Result<()> {
    let Some(stack) = pg_stack else {
        return Ok(());
    };
    stack.runtime.block_on(async {
        let task = stack.submitted_task("clean lab", dec!(30)).await?;
        stack.settlements.accept_and_pay(task.id(), &ADMIN).await?;

        let again = stack
            .transactions
            .settle_task(task.id(), ADMIN.id(), WORKER.id(), task.amount())
            .await;

        eyre::ensure!(again.as_ref().err().map(Classify::kind) == Some(ErrorKind::Conflict));
        eyre::ensure!(stack.balance(ADMIN.id()).await? == dec!(70));
        eyre::ensure!(stack.balance(WORKER.id()).await? == dec!(30));
        eyre::ensure!(stack.transaction_rows_for_task(task.id())? == 1);
        Ok(())
    })
}

#[rstest]
fn concurrent_settlements_of_one_task_pay_once(pg_stack: Option<PgStack>) -> eyre::Result<()> {
    let Some(stack) = pg_stack else {
        return Ok(());
    };
    let task = stack
        .runtime
        .block_on(stack.submitted_task("clean lab", dec!(20)))?;
    let (task_id, amount) = (task.id(), task.amount());

    let kinds = stack.runtime.block_on(async {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let transactions = Arc::clone(&stack.transactions);
                tokio::spawn(async move {
                    transactions
                        .settle_task(task_id, ADMIN.id(), WORKER.id(), amount)
                        .await
                        .map_err(|err| err.kind())
                })
            })
            .collect();
        let mut kinds = Vec::with_capacity(handles.len());
        for handle in handles {
            kinds.push(handle.await?.err());
        }
        eyre::Ok(kinds)
    })?;

    eyre::ensure!(kinds.iter().filter(|kind| kind.is_none()).count() == 1);
    eyre::ensure!(
        kinds
            .iter()
            .flatten()
            .all(|kind| *kind == ErrorKind::Conflict),
        "losing settlements should conflict, got {kinds:?}"
    );
    eyre::ensure!(stack.transaction_rows_for_task(task_id)? == 1);
    stack.runtime.block_on(async {
        eyre::ensure!(stack.balance(ADMIN.id()).await? == dec!(80));
        eyre::ensure!(stack.balance(WORKER.id()).await? == dec!(20));
        Ok(())
    })
}

#[rstest]
fn schema_refuses_a_second_completed_payout_row(pg_stack: Option<PgStack>) -> eyre::Result<()> {
    let Some(stack) = pg_stack else {
        return Ok(());
    };
    let task_id = stack.runtime.block_on(async {
        let task = stack.submitted_task("clean lab", dec!(10)).await?;
        stack.settlements.accept_and_pay(task.id(), &ADMIN).await?;
        eyre::Ok(task.id())
    })?;

    let duplicate = stack.execute_sql(&format!(
        "INSERT INTO transactions (sender_id, receiver_id, amount, type_id, status_id, task_id) \
         VALUES ({admin}, {worker}, 10, 1, 2, {task})",
        admin = ADMIN.id().value(),
        worker = WORKER.id().value(),
        task = task_id.value(),
    ))?;

    eyre::ensure!(
        matches!(
            duplicate,
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
        ),
        "expected a unique violation, got {duplicate:?}"
    );
    eyre::ensure!(stack.transaction_rows_for_task(task_id)? == 1);
    Ok(())
}
