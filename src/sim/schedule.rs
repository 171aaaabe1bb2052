//! Daily recurring override tasks.

use crate::sim::types::{ScheduledTask, TaskAction, TaskId, TaskStatus};

/// Hours within which a task's time counts as "now".
pub const MATCH_TOLERANCE_HOURS: f32 = 0.01;

/// Finds the first pending task due at `hour`, marks it executed and returns a copy.
///
/// Tasks are checked in stored order and at most one fires per call; any other
/// task colliding on the same time stays pending.
pub fn match_due(tasks: &mut [ScheduledTask], hour: f32) -> Option<ScheduledTask> {
    let task = tasks.iter_mut().find(|t| {
        t.status == TaskStatus::Pending && (t.time - hour).abs() < MATCH_TOLERANCE_HOURS
    })?;
    task.status = TaskStatus::Executed;
    Some(task.clone())
}

/// Re-arms every task for a new simulated day.
pub fn reset_all(tasks: &mut [ScheduledTask]) {
    for task in tasks {
        task.status = TaskStatus::Pending;
    }
}

/// Appends a new pending task.
pub fn add(tasks: &mut Vec<ScheduledTask>, id: TaskId, time: f32, action: TaskAction) {
    tasks.push(ScheduledTask {
        id,
        time,
        action,
        status: TaskStatus::Pending,
    });
}

/// Removes the task with `id`, returning `true` if one was removed.
pub fn delete(tasks: &mut Vec<ScheduledTask>, id: TaskId) -> bool {
    let before = tasks.len();
    tasks.retain(|t| t.id != id);
    tasks.len() != before
}
