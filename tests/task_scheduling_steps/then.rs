//! Then steps for task scheduling BDD scenarios.

use super::world::SchedulingWorld;
use cadenza::task::{domain::TaskStatus, services::TaskErrorKind};
use rstest_bdd_macros::then;

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &SchedulingWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world.current_task()?;
    eyre::ensure!(
        task.status() == expected,
        "expected status {expected}, found {}",
        task.status()
    );
    Ok(())
}

#[then(r#"the executor received prompt "{prompt}""#)]
fn executor_received_prompt(world: &SchedulingWorld, prompt: String) -> Result<(), eyre::Report> {
    let job = world
        .received
        .last()
        .ok_or_else(|| eyre::eyre!("executor received no job"))?;
    eyre::ensure!(
        job.request().prompt == prompt,
        "expected prompt {prompt:?}, got {:?}",
        job.request().prompt
    );
    Ok(())
}

#[then("the task run count is {count:u64}")]
fn task_run_count_is(world: &SchedulingWorld, count: u64) -> Result<(), eyre::Report> {
    let task = world.current_task()?;
    eyre::ensure!(
        task.run_count() == count,
        "expected run count {count}, found {}",
        task.run_count()
    );
    Ok(())
}

#[then("the task last ran at {millis:i64}")]
fn task_last_ran_at(world: &SchedulingWorld, millis: i64) -> Result<(), eyre::Report> {
    let task = world.current_task()?;
    let last_run = task
        .last_run()
        .ok_or_else(|| eyre::eyre!("task has never run"))?;
    eyre::ensure!(
        last_run.timestamp_millis() == millis,
        "expected last run at {millis}, found {}",
        last_run.timestamp_millis()
    );
    Ok(())
}

#[then("the task is scheduled at {millis:i64}")]
fn task_scheduled_at(world: &SchedulingWorld, millis: i64) -> Result<(), eyre::Report> {
    let scheduled = world.current_task()?.scheduled_time().timestamp_millis();
    eyre::ensure!(
        scheduled == millis,
        "expected scheduled time {millis}, found {scheduled}"
    );
    Ok(())
}

#[then("no task was dispatched")]
fn no_task_dispatched(world: &SchedulingWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(
        world.dispatches.is_empty(),
        "expected no dispatch, got {}",
        world.dispatches.len()
    );
    Ok(())
}

#[then("the request fails with an invalid state error")]
fn request_fails_with_invalid_state(world: &SchedulingWorld) -> Result<(), eyre::Report> {
    let err = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected the request to fail"))?;
    eyre::ensure!(
        err.kind() == TaskErrorKind::InvalidState,
        "expected an invalid state error, got {err}"
    );
    Ok(())
}
