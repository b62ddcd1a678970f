//! Given steps for task payout BDD scenarios.

use super::world::{PayoutWorld, parse_amount, run_async};
use eyre::WrapErr;
use questbank::identity::{Principal, UserId};
use questbank::task::services::CreateTaskRequest;
use rstest_bdd_macros::given;

fn register(
    world: &mut PayoutWorld,
    principal: Principal,
    amount: &str,
) -> Result<(), eyre::Report> {
    world
        .ledger
        .seed_balance(principal.id(), parse_amount(amount)?)
        .wrap_err("seed balance for scenario")?;
    world.principals.insert(principal.id().value(), principal);
    Ok(())
}

#[given("an admin {id:i64} with a balance of {amount}")]
fn admin_with_balance(
    world: &mut PayoutWorld,
    id: i64,
    amount: String,
) -> Result<(), eyre::Report> {
    register(world, Principal::admin(id), &amount)
}

#[given("a user {id:i64} with a balance of {amount}")]
fn user_with_balance(
    world: &mut PayoutWorld,
    id: i64,
    amount: String,
) -> Result<(), eyre::Report> {
    register(world, Principal::user(id), &amount)
}

#[given(r#"admin {admin:i64} created the task "{name}" worth {amount} for user {user:i64}"#)]
fn admin_created_task(
    world: &mut PayoutWorld,
    admin: i64,
    name: String,
    amount: String,
    user: i64,
) -> Result<(), eyre::Report> {
    let creator = world.principal(admin)?;
    let request = CreateTaskRequest::for_user(name, parse_amount(&amount)?, UserId::new(user));
    let task = run_async(world.tasks.create(&creator, request))
        .wrap_err("create task for scenario")?;
    world.current_task = Some(task);
    Ok(())
}
