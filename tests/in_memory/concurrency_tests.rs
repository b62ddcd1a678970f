//! Concurrency tests: racing accepts and transfers against shared stores.

use std::sync::Arc;

use super::helpers::{ADMIN, Stack, WORKER, stack};
use questbank::error::{Classify, ErrorKind};
use questbank::identity::UserId;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_accepts_pay_exactly_once(stack: Stack) -> eyre::Result<()> {
    let task_id = stack.submitted_task("clean lab", dec!(50)).await.id();
    let first = Arc::clone(&stack.settlements);
    let second = Arc::clone(&stack.settlements);

    let (left, right) = tokio::join!(
        tokio::spawn(async move { first.accept_and_pay(task_id, &ADMIN).await }),
        tokio::spawn(async move { second.accept_and_pay(task_id, &ADMIN).await }),
    );
    let outcomes = [left?, right?];

    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let losers: Vec<ErrorKind> = outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().err().map(Classify::kind))
        .collect();
    eyre::ensure!(successes == 1);
    eyre::ensure!(losers == vec![ErrorKind::InvalidState]);
    eyre::ensure!(stack.transactions.user_transactions(WORKER.id()).await?.len() == 1);
    eyre::ensure!(stack.balance(WORKER.id()).await == dec!(50));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_never_overdraw(stack: Stack) -> eyre::Result<()> {
    let receivers: Vec<UserId> = (100..110).map(UserId::new).collect();
    for receiver in &receivers {
        stack.fund(*receiver, Decimal::ZERO);
    }
    let transactions = Arc::clone(&stack.transactions);

    let handles: Vec<_> = receivers
        .iter()
        .map(|receiver| {
            let service = Arc::clone(&transactions);
            let to = *receiver;
            tokio::spawn(async move { service.transfer(ADMIN.id(), to, dec!(15)).await })
        })
        .collect();

    let mut completed = 0_usize;
    let mut refused = 0_usize;
    for handle in handles {
        match handle.await? {
            Ok(_) => completed += 1,
            Err(err) if err.kind() == ErrorKind::InsufficientFunds => refused += 1,
            Err(err) => eyre::bail!("unexpected transfer failure: {err}"),
        }
    }

    eyre::ensure!(completed == 6);
    eyre::ensure!(refused == 4);
    eyre::ensure!(stack.balance(ADMIN.id()).await == dec!(10));
    let mut paid_out = Decimal::ZERO;
    for receiver in &receivers {
        paid_out += stack.balance(*receiver).await;
    }
    eyre::ensure!(paid_out == dec!(90));
    Ok(())
}
