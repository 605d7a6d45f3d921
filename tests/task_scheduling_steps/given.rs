//! Given steps for task scheduling BDD scenarios.

use super::world::{SchedulingWorld, run_async};
use cadenza::task::domain::{RepeatSpec, RepeatType, TaskDraft, TriggerSpec};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given("the scheduler clock reads {millis:i64}")]
fn scheduler_clock_reads(world: &mut SchedulingWorld, millis: i64) {
    world.clock.set_millis(millis);
}

#[given(r#"a task "{name}" with prompt "{prompt}" scheduled immediately"#)]
fn immediate_task(
    world: &mut SchedulingWorld,
    name: String,
    prompt: String,
) -> Result<(), eyre::Report> {
    create(world, TaskDraft::new(name, prompt))
}

#[given(r#"a task "{name}" with prompt "{prompt}" delayed by {minutes:i64} minutes"#)]
fn delayed_task(
    world: &mut SchedulingWorld,
    name: String,
    prompt: String,
    minutes: i64,
) -> Result<(), eyre::Report> {
    create(
        world,
        TaskDraft::new(name, prompt).with_trigger(TriggerSpec::delay(minutes)),
    )
}

#[given(r#"a task "{name}" with prompt "{prompt}" repeating "{repeat}""#)]
fn repeating_task(
    world: &mut SchedulingWorld,
    name: String,
    prompt: String,
    repeat: String,
) -> Result<(), eyre::Report> {
    let repeat_type = RepeatType::try_from(repeat.as_str())
        .map_err(|err| eyre::eyre!("invalid repeat type in scenario: {err}"))?;
    create(
        world,
        TaskDraft::new(name, prompt).with_repeat(RepeatSpec::of(repeat_type)),
    )
}

fn create(world: &mut SchedulingWorld, draft: TaskDraft) -> Result<(), eyre::Report> {
    let created = run_async(world.scheduler.lifecycle().create(draft))
        .wrap_err("create task for scheduling scenario")?;
    world.task = Some(created);
    Ok(())
}
