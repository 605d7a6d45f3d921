//! When steps for task scheduling BDD scenarios.

use super::world::{SchedulingWorld, run_async};
use cadenza::task::ports::ExecutionOutcome;
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when("the clock moves to {millis:i64}")]
fn clock_moves_to(world: &mut SchedulingWorld, millis: i64) {
    world.clock.set_millis(millis);
}

#[when("the scheduler polls")]
fn scheduler_polls(world: &mut SchedulingWorld) -> Result<(), eyre::Report> {
    let dispatches = run_async(world.scheduler.tick()).wrap_err("scheduler tick")?;
    for _ in &dispatches {
        let job = run_async(world.jobs.recv())
            .ok_or_else(|| eyre::eyre!("executor channel closed"))?;
        world.received.push(job);
    }
    world.dispatches = dispatches;
    world.refresh_task()
}

#[when("the executor reports success at {millis:i64}")]
fn executor_reports_success(world: &mut SchedulingWorld, millis: i64) -> Result<(), eyre::Report> {
    report(world, millis, ExecutionOutcome::Success)
}

#[when(r#"the executor reports failure "{reason}" at {millis:i64}"#)]
fn executor_reports_failure(
    world: &mut SchedulingWorld,
    reason: String,
    millis: i64,
) -> Result<(), eyre::Report> {
    report(world, millis, ExecutionOutcome::failure(reason))
}

#[when("the task is paused")]
fn task_is_paused(world: &mut SchedulingWorld) -> Result<(), eyre::Report> {
    let id = world.current_task()?.id();
    match run_async(world.scheduler.lifecycle().pause(id)) {
        Ok(paused) => world.task = Some(paused),
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}

fn report(
    world: &mut SchedulingWorld,
    millis: i64,
    outcome: ExecutionOutcome,
) -> Result<(), eyre::Report> {
    let job = world
        .received
        .pop()
        .ok_or_else(|| eyre::eyre!("no executor job awaiting a report"))?;
    world.clock.set_millis(millis);
    job.report(outcome);
    for dispatch in world.dispatches.drain(..) {
        run_async(dispatch.join()).wrap_err("wait for outcome to be recorded")?;
    }
    world.refresh_task()
}
