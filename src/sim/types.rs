//! Core simulation types: timing configuration, canonical state, and step records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Centralized timing configuration.
///
/// All components reference this struct for the logical step length,
/// eliminating duplicated `dt_hours` computations.
///
/// # Examples
///
/// ```
/// use energy_twin::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(15, 1000, 42);
/// assert_eq!(cfg.dt_hours, 0.25);
/// assert_eq!(cfg.steps_per_day(), 96);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct SimConfig {
    /// Simulated minutes covered by one tick.
    pub minutes_per_tick: u32,
    /// Duration of one tick in hours, derived as `minutes_per_tick / 60`.
    pub dt_hours: f32,
    /// Real-time interval between ticks when driven by a timer.
    pub tick_interval_ms: u64,
    /// Master random seed for reproducibility.
    pub seed: u64,
}

impl SimConfig {
    /// Creates a new timing configuration.
    ///
    /// # Panics
    ///
    /// Panics if `minutes_per_tick` is zero or longer than a day.
    pub fn new(minutes_per_tick: u32, tick_interval_ms: u64, seed: u64) -> Self {
        assert!(
            minutes_per_tick > 0 && minutes_per_tick <= 24 * 60,
            "minutes_per_tick must be in 1..=1440"
        );
        Self {
            minutes_per_tick,
            dt_hours: minutes_per_tick as f32 / 60.0,
            tick_interval_ms,
            seed,
        }
    }

    /// Number of ticks in one simulated day (rounded up).
    pub fn steps_per_day(&self) -> usize {
        (24 * 60usize).div_ceil(self.minutes_per_tick as usize)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(15, 1000, 42)
    }
}

/// Grid connection mode. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GridStatus {
    #[default]
    Connected,
    Islanding,
    Blackout,
}

impl GridStatus {
    /// Returns `true` when power may flow to or from the grid.
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for GridStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connected => "CONNECTED",
            Self::Islanding => "ISLANDING",
            Self::Blackout => "BLACKOUT",
        })
    }
}

/// Severity of an agent log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Immutable, human-readable record of an agent decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: u64,
    /// Simulated wall-clock time, `"HH:MM"`.
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:<7} {}", self.timestamp, self.severity, self.message)
    }
}

/// Unique identifier of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Manual override a scheduled task applies to the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskAction {
    ForceCharge,
    ForceDischarge,
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ForceCharge => "FORCE_CHARGE",
            Self::ForceDischarge => "FORCE_DISCHARGE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Executed,
}

/// A daily recurring override fired at `time` (hours, `[0, 24)`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub time: f32,
    pub action: TaskAction,
    pub status: TaskStatus,
}

/// The canonical simulation state, replaced wholesale every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationState {
    /// Simulated hour of day in `[0, 24)`.
    pub time: f32,
    /// Solar generation (kW, >= 0).
    pub solar_output: f32,
    /// Household demand (kW, >= 0).
    pub load: f32,
    /// Battery state of charge (%, 0 to 100).
    pub battery_soc: f32,
    /// Grid price per kWh.
    pub grid_price: f32,
    /// Grid carbon intensity (gCO2/kWh).
    pub grid_carbon: f32,
    pub grid_status: GridStatus,
    /// Grid exchange (kW; positive=import, negative=export).
    pub net_grid_flow: f32,
    /// Battery power (kW; positive=charge, negative=discharge).
    pub battery_flow: f32,
    /// Running monetary savings against the no-battery baseline.
    pub money_saved: f32,
    /// Running avoided emissions (kg CO2).
    pub co2_saved: f32,
    /// Cloud cover fraction in `[0, 1]`.
    pub cloud_cover: f32,
    /// Externally forced grid outage.
    pub has_blackout: bool,
    /// Agent log, most recent first.
    pub logs: Vec<LogEntry>,
    pub scheduled_tasks: Vec<ScheduledTask>,
}

impl SimulationState {
    /// Creates the state a fresh simulation starts from.
    pub fn initial(start_hour: f32, battery_soc: f32, cloud_cover: f32) -> Self {
        Self {
            time: start_hour,
            battery_soc,
            cloud_cover,
            ..Self::default()
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            time: 6.0,
            solar_output: 0.0,
            load: 0.5,
            battery_soc: 50.0,
            grid_price: 0.15,
            grid_carbon: 200.0,
            grid_status: GridStatus::Connected,
            net_grid_flow: 0.0,
            battery_flow: 0.0,
            money_saved: 0.0,
            co2_saved: 0.0,
            cloud_cover: 0.1,
            has_blackout: false,
            logs: Vec::new(),
            scheduled_tasks: Vec::new(),
        }
    }
}

/// History sample consumed by external charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataPoint {
    /// `"HH:MM"` label.
    pub time: String,
    pub solar: f32,
    pub load: f32,
    /// Battery state of charge (%).
    pub battery: f32,
    /// Grid price in cents per kWh.
    pub price: f32,
}

impl From<&SimulationState> for ChartDataPoint {
    fn from(s: &SimulationState) -> Self {
        Self {
            time: format_clock(s.time),
            solar: s.solar_output,
            load: s.load,
            battery: s.battery_soc,
            price: s.grid_price * 100.0,
        }
    }
}

/// Complete record of one simulation tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// Tick index since the engine was created.
    pub tick: u64,
    /// Simulated hour of day after advancing.
    pub time_hr: f32,
    pub solar_kw: f32,
    pub load_kw: f32,
    pub price: f32,
    pub carbon_g_per_kwh: f32,
    pub grid_status: GridStatus,
    /// Applied battery power (kW; positive=charge).
    pub battery_kw: f32,
    /// Applied grid exchange (kW; positive=import).
    pub grid_kw: f32,
    /// Battery SoC after the tick (%).
    pub soc_pct: f32,
    pub step_money_saved: f32,
    pub step_co2_saved: f32,
    /// Override fired this tick, if any.
    pub task: Option<TaskAction>,
    /// Whether the constraint solver had to clamp the battery.
    pub clamped: bool,
    /// Whether the tick was discarded after an invariant violation.
    pub rolled_back: bool,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>4} ({}) | {:<9} | solar={:.2}  load={:.2}  bat={:>6.2}  grid={:>6.2} kW \
             (SoC={:.1}%) | price={:.2} carbon={:.0} | saved={:.3}",
            self.tick,
            format_clock(self.time_hr),
            self.grid_status.to_string(),
            self.solar_kw,
            self.load_kw,
            self.battery_kw,
            self.grid_kw,
            self.soc_pct,
            self.price,
            self.carbon_g_per_kwh,
            self.step_money_saved,
        )
    }
}

/// Formats an hour-of-day value as `"HH:MM"`, truncating partial minutes.
///
/// # Examples
///
/// ```
/// use energy_twin::sim::types::format_clock;
///
/// assert_eq!(format_clock(6.25), "06:15");
/// assert_eq!(format_clock(0.0), "00:00");
/// ```
pub fn format_clock(hour: f32) -> String {
    let hours = hour.floor();
    let minutes = ((hour - hours) * 60.0).floor();
    format!("{:02}:{:02}", hours as u32, minutes as u32)
}
