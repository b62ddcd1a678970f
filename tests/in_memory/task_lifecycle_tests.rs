//! In-memory integration tests for task lifecycle operations.

use super::helpers::{ADMIN, OTHER_ADMIN, Stack, WORKER, stack};
use questbank::error::{Classify, ErrorKind};
use questbank::identity::Principal;
use questbank::task::{
    domain::{TaskAction, TaskStatus},
    services::{CreateTaskRequest, TaskListing},
};
use rstest::rstest;
use rust_decimal_macros::dec;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn request_then_decline_makes_the_task_terminal(stack: Stack) -> eyre::Result<()> {
    let task = stack.submitted_task("clean lab", dec!(50)).await;

    let declined = stack.tasks.decline(task.id(), &WORKER).await?;
    eyre::ensure!(declined.status() == TaskStatus::Cancelled);

    for (action, actor) in [
        (TaskAction::RequestAcceptance, WORKER),
        (TaskAction::Accept, ADMIN),
        (TaskAction::Decline, WORKER),
    ] {
        let result = stack.tasks.transition(task.id(), action, &actor).await;
        eyre::ensure!(
            result.as_ref().err().map(Classify::kind) == Some(ErrorKind::InvalidState),
            "{action} on a cancelled task should be invalid, got {result:?}"
        );
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_tasks_reject_every_action(stack: Stack) -> eyre::Result<()> {
    let task = stack.submitted_task("clean lab", dec!(50)).await;
    stack.tasks.accept(task.id(), &ADMIN).await?;

    let again = stack.tasks.accept(task.id(), &ADMIN).await;
    let decline = stack.tasks.decline(task.id(), &WORKER).await;

    eyre::ensure!(again.err().map(|err| err.kind()) == Some(ErrorKind::InvalidState));
    eyre::ensure!(decline.err().map(|err| err.kind()) == Some(ErrorKind::InvalidState));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn another_admin_cannot_accept(stack: Stack) -> eyre::Result<()> {
    let task = stack.submitted_task("clean lab", dec!(50)).await;

    let result = stack.tasks.accept(task.id(), &OTHER_ADMIN).await;

    eyre::ensure!(result.err().map(|err| err.kind()) == Some(ErrorKind::NotEnoughPermission));
    eyre::ensure!(stack.tasks.get(task.id()).await?.status() == TaskStatus::WaitingForAcceptance);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listings_are_scoped_and_signal_no_tasks(stack: Stack) -> eyre::Result<()> {
    let stranger = Principal::user(99);
    eyre::ensure!(stack.tasks.list_for_user(&stranger).await? == TaskListing::NoTasks);
    eyre::ensure!(stack.tasks.list_for_admin(&OTHER_ADMIN).await?.is_empty());

    let assigned = stack.submitted_task("clean lab", dec!(50)).await;
    let broadcast = stack
        .tasks
        .create(&ADMIN, CreateTaskRequest::for_all("water plants", dec!(5)))
        .await?;

    let for_stranger = stack.tasks.list_for_user(&stranger).await?.into_vec();
    let for_worker = stack.tasks.list_for_user(&WORKER).await?.into_vec();
    let for_admin = stack.tasks.list_for_admin(&ADMIN).await?.into_vec();

    eyre::ensure!(for_stranger.iter().map(|t| t.id()).collect::<Vec<_>>() == vec![broadcast.id()]);
    eyre::ensure!(
        for_worker.iter().map(|t| t.id()).collect::<Vec<_>>() == vec![broadcast.id(), assigned.id()]
    );
    eyre::ensure!(for_admin.len() == 2);
    Ok(())
}
