//! Dispatch agent: grid-mode state machine and battery/grid setpoints.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;

use crate::devices::Battery;
use crate::sim::types::{
    GridStatus, LogEntry, ScheduledTask, Severity, SimulationState, TaskAction, format_clock,
};

/// Decides whether a routine (non-transition) decision is worth logging.
///
/// Self-consumption branches fire on most ticks; the policy keeps them from
/// flooding the bounded log.
pub trait LogPolicy {
    fn permit(&mut self) -> bool;
}

/// Admits roughly `rate` of routine log entries using a seeded RNG.
#[derive(Debug, Clone)]
pub struct SampledLogPolicy {
    rate: f32,
    rng: StdRng,
}

impl SampledLogPolicy {
    pub fn new(rate: f32, seed: u64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl LogPolicy for SampledLogPolicy {
    fn permit(&mut self) -> bool {
        self.rng.random::<f32>() < self.rate
    }
}

/// Logs every routine decision.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysLog;

impl LogPolicy for AlwaysLog {
    fn permit(&mut self) -> bool {
        true
    }
}

/// Suppresses every routine decision.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverLog;

impl LogPolicy for NeverLog {
    fn permit(&mut self) -> bool {
        false
    }
}

/// Thresholds steering the agent's decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentConfig {
    /// Sell stored energy above this price per kWh.
    pub arbitrage_price: f32,
    /// Minimum SoC (%) before arbitrage discharging.
    pub arbitrage_min_soc_pct: f32,
    /// Carbon intensity (gCO2/kWh) above which the home islands.
    pub islanding_carbon: f32,
    /// Minimum SoC (%) required to enter islanding.
    pub islanding_min_soc_pct: f32,
    /// SoC (%) at or below which connected deficits are imported.
    pub reserve_soc_pct: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            arbitrage_price: 0.40,
            arbitrage_min_soc_pct: 80.0,
            islanding_carbon: 400.0,
            islanding_min_soc_pct: 20.0,
            reserve_soc_pct: 10.0,
        }
    }
}

/// Agent output for one tick, before physical constraints are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Grid mode after this tick's transitions.
    pub status: GridStatus,
    /// Proposed battery power (kW; positive=charge).
    pub battery_kw: f32,
    /// Proposed grid exchange (kW; positive=import).
    pub grid_kw: f32,
    pub log: Option<LogEntry>,
}

/// Rule-based home energy agent.
///
/// Scheduled tasks override everything. Otherwise the grid mode is updated
/// (blackout, carbon-aware islanding, reconnection) and a setpoint chosen for
/// that mode: survival in `Blackout`, self-supply in `Islanding`, and price
/// arbitrage or self-consumption while `Connected`.
#[derive(Debug, Clone)]
pub struct DispatchAgent<P: LogPolicy> {
    config: AgentConfig,
    battery: Battery,
    dt_hours: f32,
    policy: P,
    next_log_id: u64,
}

impl<P: LogPolicy> DispatchAgent<P> {
    pub fn new(config: AgentConfig, battery: Battery, dt_hours: f32, policy: P) -> Self {
        Self {
            config,
            battery,
            dt_hours,
            policy,
            next_log_id: 1,
        }
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    /// Creates a log entry stamped with the next id and the simulated time.
    pub fn log_entry(&mut self, hour: f32, severity: Severity, message: impl Into<String>) -> LogEntry {
        let id = self.next_log_id;
        self.next_log_id += 1;
        LogEntry {
            id,
            timestamp: format_clock(hour),
            message: message.into(),
            severity,
        }
    }

    /// Decides battery and grid setpoints for the tick described by `state`.
    ///
    /// `state` must already carry this tick's environment reading.
    pub fn decide(&mut self, state: &SimulationState, task: Option<&ScheduledTask>) -> Dispatch {
        if let Some(task) = task {
            return self.run_task(state, task);
        }

        let previous = state.grid_status;
        let (status, mut log) = self.next_status(state);
        if status != previous {
            info!(from = %previous, to = %status, time = %format_clock(state.time), "grid status changed");
        }

        let net_load = state.load - state.solar_output;
        let (battery_kw, grid_kw) = match status {
            GridStatus::Blackout => {
                if previous != GridStatus::Blackout && log.is_none() {
                    log = Some(self.log_entry(
                        state.time,
                        Severity::Error,
                        "GRID FAILURE. Running critical loads on Battery.",
                    ));
                }
                let deliverable = self.battery.deliverable_kw(state.battery_soc, self.dt_hours);
                if net_load > 0.0 {
                    // shed the load if the battery cannot carry it this tick
                    let battery_kw = if deliverable >= net_load { -net_load } else { 0.0 };
                    (battery_kw, 0.0)
                } else {
                    (net_load.abs(), 0.0)
                }
            }
            GridStatus::Islanding => {
                if net_load > 0.0 {
                    (-net_load, 0.0)
                } else {
                    (net_load.abs(), 0.0)
                }
            }
            GridStatus::Connected => self.connected(state, net_load, &mut log),
        };

        Dispatch {
            status,
            battery_kw,
            grid_kw,
            log,
        }
    }

    fn run_task(&mut self, state: &SimulationState, task: &ScheduledTask) -> Dispatch {
        let (battery_kw, message) = match task.action {
            TaskAction::ForceCharge => (
                self.battery.max_rate_kw,
                "SCHEDULED TASK: Forcing Grid Charge.",
            ),
            TaskAction::ForceDischarge => (
                -self.battery.max_rate_kw,
                "SCHEDULED TASK: Forcing Battery Discharge.",
            ),
        };
        info!(task = %task.id, action = %task.action, time = %format_clock(state.time), "scheduled task executed");
        Dispatch {
            status: state.grid_status,
            battery_kw,
            grid_kw: state.load - state.solar_output + battery_kw,
            log: Some(self.log_entry(state.time, Severity::Warning, message)),
        }
    }

    fn next_status(&mut self, state: &SimulationState) -> (GridStatus, Option<LogEntry>) {
        let previous = state.grid_status;
        let mut status = previous;
        let mut log = None;

        if state.has_blackout {
            status = GridStatus::Blackout;
        } else if previous == GridStatus::Blackout {
            status = GridStatus::Connected;
            log = Some(self.log_entry(
                state.time,
                Severity::Success,
                "Grid power restored. Reconnecting.",
            ));
        }

        let cfg = self.config;
        if state.grid_carbon > cfg.islanding_carbon
            && state.battery_soc > cfg.islanding_min_soc_pct
            && !state.has_blackout
        {
            status = GridStatus::Islanding;
            if previous != GridStatus::Islanding {
                log = Some(self.log_entry(
                    state.time,
                    Severity::Warning,
                    "High Carbon Intensity detected. Switching to ISLAND MODE.",
                ));
            }
        } else if status == GridStatus::Islanding
            && state.grid_carbon <= cfg.islanding_carbon
            && !state.has_blackout
        {
            status = GridStatus::Connected;
            log = Some(self.log_entry(
                state.time,
                Severity::Success,
                "Carbon Intensity normalized. Reconnecting to Grid.",
            ));
        }

        (status, log)
    }

    fn connected(
        &mut self,
        state: &SimulationState,
        net_load: f32,
        log: &mut Option<LogEntry>,
    ) -> (f32, f32) {
        let cfg = self.config;
        let soc = state.battery_soc;

        if state.grid_price > cfg.arbitrage_price && soc > cfg.arbitrage_min_soc_pct {
            let battery_kw = -self.battery.max_rate_kw;
            if log.is_none() {
                *log = Some(self.log_entry(
                    state.time,
                    Severity::Success,
                    format!(
                        "Price Spike (${:.2}). Arbitrage: Selling Battery power to Grid.",
                        state.grid_price
                    ),
                ));
            }
            return (battery_kw, net_load + battery_kw);
        }

        if net_load < 0.0 {
            if soc < 100.0 {
                self.routine_log(state, log, "Solar Surplus. Charging Battery.");
                (net_load.abs(), 0.0)
            } else {
                (0.0, net_load)
            }
        } else if soc > cfg.reserve_soc_pct {
            self.routine_log(state, log, "Load exceeds Solar. Discharging Battery.");
            (-net_load, 0.0)
        } else {
            (0.0, net_load)
        }
    }

    fn routine_log(&mut self, state: &SimulationState, log: &mut Option<LogEntry>, message: &str) {
        if log.is_none() && self.policy.permit() {
            *log = Some(self.log_entry(state.time, Severity::Info, message));
        }
    }
}
