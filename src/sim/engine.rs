//! Simulation loop: owns the canonical state and advances it one tick at a time.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;
use tracing::{debug, error};

use crate::devices::{Battery, NoiseSource, SeededNoise};
use crate::error::{IntentError, InvariantViolation};

use super::clock::{self, Clock};
use super::constraints::apply_soc_limits;
use super::controller::{DispatchAgent, LogPolicy, SampledLogPolicy};
use super::environment::Environment;
use super::ledger::{Ledger, StepSavings, step_savings};
use super::schedule;
use super::types::{
    ChartDataPoint, Severity, SimConfig, SimulationState, StepRecord, TaskAction, TaskId,
};

/// Default number of chart samples retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 49;
/// Default number of agent log entries retained.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// An external request to change the simulation inputs.
///
/// Intents are validated when submitted and applied together at the start of
/// the next tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    SetCloudCover(f32),
    ToggleBlackout,
    AddTask { time: f32, action: TaskAction },
    DeleteTask(TaskId),
}

#[derive(Debug, Clone, PartialEq)]
enum Queued {
    CloudCover(f32),
    ToggleBlackout,
    AddTask(TaskId, f32, TaskAction),
    DeleteTask(TaskId),
}

/// Owned snapshot of everything an external observer may read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// Ticks completed so far.
    pub tick: u64,
    pub state: SimulationState,
    /// Chart samples, oldest first.
    pub history: Vec<ChartDataPoint>,
}

/// Result of one pure state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Stepped {
    pub state: SimulationState,
    /// Action of the scheduled task that fired, if any.
    pub task: Option<TaskAction>,
    pub clamped: bool,
    pub savings: StepSavings,
    pub rolled_over: bool,
}

/// Computes the state following `prev`.
///
/// Runs, in order: clock, environment, scheduler, dispatch agent, constraint
/// solver and ledger. `prev` is never modified.
pub fn step<N: NoiseSource, P: LogPolicy>(
    prev: &SimulationState,
    environment: &mut Environment<N>,
    agent: &mut DispatchAgent<P>,
    config: &SimConfig,
    log_capacity: usize,
) -> Stepped {
    let advance = clock::advance(prev.time, config.dt_hours);
    let mut next = prev.clone();
    next.time = advance.hour;
    if advance.rolled_over {
        schedule::reset_all(&mut next.scheduled_tasks);
    }

    let reading = environment.sample(next.time, next.cloud_cover);
    next.solar_output = reading.solar_kw;
    next.load = reading.load_kw;
    next.grid_price = reading.price;
    next.grid_carbon = reading.carbon_g_per_kwh;

    let task = schedule::match_due(&mut next.scheduled_tasks, next.time);
    let dispatch = agent.decide(&next, task.as_ref());

    let solved = apply_soc_limits(
        agent.battery(),
        next.battery_soc,
        dispatch.battery_kw,
        dispatch.grid_kw,
        dispatch.status,
        config.dt_hours,
    );

    let savings = step_savings(
        next.load,
        next.grid_price,
        next.grid_carbon,
        solved.grid_kw,
        config.dt_hours,
    );
    let mut ledger = Ledger::new(prev.money_saved, prev.co2_saved);
    ledger.record(savings);

    next.grid_status = dispatch.status;
    next.battery_soc = solved.soc_pct;
    next.battery_flow = solved.battery_kw;
    next.net_grid_flow = solved.grid_kw;
    next.money_saved = ledger.money_saved;
    next.co2_saved = ledger.co2_saved;
    if let Some(entry) = dispatch.log {
        next.logs.insert(0, entry);
        next.logs.truncate(log_capacity);
    }

    Stepped {
        state: next,
        task: task.map(|t| t.action),
        clamped: solved.clamped,
        savings,
        rolled_over: advance.rolled_over,
    }
}

/// Checks the invariants every committed state must satisfy.
///
/// Grid flow while disconnected is tolerated on ticks where a scheduled
/// override fired.
pub fn check_invariants(
    state: &SimulationState,
    override_fired: bool,
) -> Result<(), InvariantViolation> {
    let values = [
        ("time", state.time),
        ("solar_output", state.solar_output),
        ("load", state.load),
        ("battery_soc", state.battery_soc),
        ("battery_flow", state.battery_flow),
        ("net_grid_flow", state.net_grid_flow),
        ("money_saved", state.money_saved),
        ("co2_saved", state.co2_saved),
    ];
    if let Some(&(name, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
        return Err(InvariantViolation::NonFiniteValue(name));
    }
    if !(0.0..=100.0).contains(&state.battery_soc) {
        return Err(InvariantViolation::SocOutOfBounds(state.battery_soc));
    }
    if !(0.0..24.0).contains(&state.time) {
        return Err(InvariantViolation::TimeOutOfRange(state.time));
    }
    if !state.grid_status.is_connected() && !override_fired && state.net_grid_flow != 0.0 {
        return Err(InvariantViolation::GridFlowWhileDisconnected {
            status: state.grid_status,
            flow_kw: state.net_grid_flow,
        });
    }
    let mut seen = HashSet::with_capacity(state.scheduled_tasks.len());
    for task in &state.scheduled_tasks {
        if !seen.insert(task.id) {
            return Err(InvariantViolation::DuplicateTaskId(task.id));
        }
    }
    Ok(())
}

/// The simulation loop.
///
/// Generic over the noise source and the routine-log policy so hosts get a
/// seeded simulator by default and tests can pin both down.
pub struct Engine<N: NoiseSource = SeededNoise, P: LogPolicy = SampledLogPolicy> {
    config: SimConfig,
    environment: Environment<N>,
    agent: DispatchAgent<P>,
    state: SimulationState,
    history: VecDeque<ChartDataPoint>,
    history_capacity: usize,
    log_capacity: usize,
    queue: Vec<Queued>,
    next_task_id: u64,
    ticks: u64,
    strict: bool,
}

impl<N: NoiseSource, P: LogPolicy> Engine<N, P> {
    /// Creates an engine starting from [`SimulationState::default`].
    pub fn new(config: SimConfig, environment: Environment<N>, agent: DispatchAgent<P>) -> Self {
        Self::from_state(config, environment, agent, SimulationState::default())
    }

    /// Creates an engine resuming from an arbitrary state.
    ///
    /// The state is not validated here; a broken state is caught by the
    /// first tick's invariant check.
    pub fn from_state(
        config: SimConfig,
        environment: Environment<N>,
        agent: DispatchAgent<P>,
        state: SimulationState,
    ) -> Self {
        let next_task_id = state
            .scheduled_tasks
            .iter()
            .map(|t| t.id.0)
            .max()
            .map_or(1, |max| max + 1);
        Self {
            config,
            environment,
            agent,
            state,
            history: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            log_capacity: DEFAULT_LOG_CAPACITY,
            queue: Vec::new(),
            next_task_id,
            ticks: 0,
            strict: cfg!(debug_assertions),
        }
    }

    /// Sets how many chart samples and log entries are retained.
    pub fn with_capacities(mut self, history: usize, logs: usize) -> Self {
        self.history_capacity = history;
        self.log_capacity = logs;
        self.state.logs.truncate(logs);
        self
    }

    /// Panic on invariant violations instead of rolling back.
    ///
    /// Defaults to on in debug builds.
    pub fn with_strict_invariants(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Validates and queues an intent for the next tick.
    ///
    /// Returns the id assigned to the new task for [`Intent::AddTask`].
    pub fn submit(&mut self, intent: Intent) -> Result<Option<TaskId>, IntentError> {
        match intent {
            Intent::SetCloudCover(value) => {
                if !(0.0..=1.0).contains(&value) {
                    return Err(IntentError::CloudCoverOutOfRange(value));
                }
                self.queue.push(Queued::CloudCover(value));
                Ok(None)
            }
            Intent::ToggleBlackout => {
                self.queue.push(Queued::ToggleBlackout);
                Ok(None)
            }
            Intent::AddTask { time, action } => {
                if !(0.0..24.0).contains(&time) {
                    return Err(IntentError::TaskTimeOutOfRange(time));
                }
                let id = TaskId(self.next_task_id);
                self.next_task_id += 1;
                self.queue.push(Queued::AddTask(id, time, action));
                Ok(Some(id))
            }
            Intent::DeleteTask(id) => {
                let known = self.state.scheduled_tasks.iter().any(|t| t.id == id)
                    || self
                        .queue
                        .iter()
                        .any(|q| matches!(q, Queued::AddTask(queued, ..) if *queued == id));
                if !known {
                    return Err(IntentError::UnknownTask(id));
                }
                self.queue.push(Queued::DeleteTask(id));
                Ok(None)
            }
        }
    }

    pub fn set_cloud_cover(&mut self, value: f32) -> Result<(), IntentError> {
        self.submit(Intent::SetCloudCover(value)).map(|_| ())
    }

    pub fn toggle_blackout(&mut self) {
        self.queue.push(Queued::ToggleBlackout);
    }

    pub fn add_task(&mut self, time: f32, action: TaskAction) -> Result<TaskId, IntentError> {
        let id = TaskId(self.next_task_id);
        self.submit(Intent::AddTask { time, action })?;
        Ok(id)
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<(), IntentError> {
        self.submit(Intent::DeleteTask(id)).map(|_| ())
    }

    /// Number of intents waiting for the next tick.
    pub fn pending_intents(&self) -> usize {
        self.queue.len()
    }

    fn apply_queued(&mut self) {
        for queued in self.queue.drain(..) {
            match queued {
                Queued::CloudCover(value) => self.state.cloud_cover = value,
                Queued::ToggleBlackout => self.state.has_blackout = !self.state.has_blackout,
                Queued::AddTask(id, time, action) => {
                    schedule::add(&mut self.state.scheduled_tasks, id, time, action);
                }
                Queued::DeleteTask(id) => {
                    schedule::delete(&mut self.state.scheduled_tasks, id);
                }
            }
        }
    }

    /// Advances the simulation by one tick and returns its record.
    ///
    /// # Panics
    ///
    /// Panics on an invariant violation when strict invariants are enabled.
    pub fn tick(&mut self) -> StepRecord {
        self.apply_queued();

        let stepped = step(
            &self.state,
            &mut self.environment,
            &mut self.agent,
            &self.config,
            self.log_capacity,
        );

        let mut record_savings = stepped.savings;
        let rolled_back = match check_invariants(&stepped.state, stepped.task.is_some()) {
            Ok(()) => {
                self.state = stepped.state;
                false
            }
            Err(violation) => {
                if self.strict {
                    panic!("invariant violated at {}: {violation}", stepped.state.time);
                }
                error!(%violation, tick = self.ticks, "invariant violated, keeping last good state");
                self.roll_back(stepped.state.time, stepped.rolled_over, &violation);
                record_savings = StepSavings::default();
                true
            }
        };

        self.history.push_back(ChartDataPoint::from(&self.state));
        while self.history.len() > self.history_capacity {
            self.history.pop_front();
        }

        let s = &self.state;
        let record = StepRecord {
            tick: self.ticks,
            time_hr: s.time,
            solar_kw: s.solar_output,
            load_kw: s.load,
            price: s.grid_price,
            carbon_g_per_kwh: s.grid_carbon,
            grid_status: s.grid_status,
            battery_kw: s.battery_flow,
            grid_kw: s.net_grid_flow,
            soc_pct: s.battery_soc,
            step_money_saved: record_savings.money,
            step_co2_saved: record_savings.co2_kg,
            task: if rolled_back { None } else { stepped.task },
            clamped: !rolled_back && stepped.clamped,
            rolled_back,
        };
        debug!(
            tick = record.tick,
            time = record.time_hr,
            status = %record.grid_status,
            battery_kw = record.battery_kw,
            grid_kw = record.grid_kw,
            soc = record.soc_pct,
            "tick"
        );
        self.ticks += 1;
        record
    }

    /// Keeps the pre-tick physical state, moving only the clock forward.
    fn roll_back(&mut self, time: f32, rolled_over: bool, violation: &InvariantViolation) {
        self.state.time = time;
        if rolled_over {
            schedule::reset_all(&mut self.state.scheduled_tasks);
        }
        let entry = self.agent.log_entry(
            time,
            Severity::Error,
            format!("Invariant violation: {violation}. State rolled back."),
        );
        self.state.logs.insert(0, entry);
        self.state.logs.truncate(self.log_capacity);
    }

    /// Runs `ticks` ticks and returns their records.
    pub fn run(&mut self, ticks: u64) -> Vec<StepRecord> {
        let mut records = Vec::with_capacity(ticks as usize);
        Clock::new(ticks).run(|_| records.push(self.tick()));
        records
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Chart samples, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &ChartDataPoint> {
        self.history.iter()
    }

    pub fn observe(&self) -> Observation {
        Observation {
            tick: self.ticks,
            state: self.state.clone(),
            history: self.history.iter().cloned().collect(),
        }
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns a reference to the battery (for summary capacity queries).
    pub fn battery(&self) -> &Battery {
        self.agent.battery()
    }

    /// Returns a reference to the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
