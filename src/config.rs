//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::devices::{Battery, HouseholdLoad, LoadPeak, NoiseSource, SeededNoise, SolarArray};
pub use crate::error::ConfigError;
use crate::sim::controller::{AgentConfig, DispatchAgent, LogPolicy, SampledLogPolicy};
use crate::sim::engine::Engine;
use crate::sim::environment::Environment;
use crate::sim::tariff::{CarbonModel, PriceTier, Tariff};
use crate::sim::types::{SimConfig, SimulationState, TaskAction};

/// Seed offset for the log sampler so it does not mirror the noise stream.
const LOG_SEED_OFFSET: u64 = 0x5eed;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation timing and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Battery storage parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Rooftop solar parameters.
    #[serde(default)]
    pub solar: SolarConfig,
    /// Household demand profile.
    #[serde(default)]
    pub load: LoadConfig,
    /// Time-of-use price tiers.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Grid carbon-intensity model.
    #[serde(default)]
    pub carbon: CarbonConfig,
    /// Dispatch agent thresholds.
    #[serde(default)]
    pub agent: AgentSection,
    /// Scheduled tasks loaded before the first tick.
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
    /// Scripted grid outages for headless runs.
    #[serde(default)]
    pub blackouts: Vec<BlackoutWindow>,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Simulated minutes per tick (1..=1440).
    pub minutes_per_tick: u32,
    /// Real-time interval between ticks when served (ms, > 0).
    pub tick_interval_ms: u64,
    /// Ticks to run headless.
    pub ticks: u64,
    /// Master random seed.
    pub seed: u64,
    /// Simulated hour the run starts at, `[0, 24)`.
    pub start_hour: f32,
    /// Initial cloud cover, `[0, 1]`.
    pub initial_cloud_cover: f32,
    /// Chart samples retained.
    pub history_capacity: usize,
    /// Agent log entries retained.
    pub log_capacity: usize,
    /// Fraction of routine self-consumption decisions that get logged.
    pub log_sample_rate: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            minutes_per_tick: 15,
            tick_interval_ms: 1000,
            ticks: 96,
            seed: 42,
            start_hour: 6.0,
            initial_cloud_cover: 0.1,
            history_capacity: 49,
            log_capacity: 50,
            log_sample_rate: 0.1,
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Usable energy capacity (kWh).
    pub capacity_kwh: f32,
    /// Maximum charge/discharge power (kW).
    pub max_rate_kw: f32,
    /// Initial state of charge (%, 0-100).
    pub initial_soc_pct: f32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 13.5,
            max_rate_kw: 5.0,
            initial_soc_pct: 50.0,
        }
    }
}

/// Rooftop solar parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    /// Clear-sky peak output (kW).
    pub max_kw: f32,
    pub sunrise_hour: f32,
    pub sunset_hour: f32,
    /// Half-width of the uniform output noise (kW).
    pub noise_kw: f32,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            max_kw: 6.0,
            sunrise_hour: 6.0,
            sunset_hour: 18.0,
            noise_kw: 0.1,
        }
    }
}

/// Household demand profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Always-on demand (kW).
    pub base_kw: f32,
    /// Upper bound of the uniform demand noise (kW).
    pub noise_kw: f32,
    pub morning_peak_kw: f32,
    pub morning_start_hour: f32,
    pub morning_end_hour: f32,
    pub evening_peak_kw: f32,
    pub evening_start_hour: f32,
    pub evening_end_hour: f32,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            base_kw: 0.5,
            noise_kw: 0.2,
            morning_peak_kw: 1.5,
            morning_start_hour: 7.0,
            morning_end_hour: 9.0,
            evening_peak_kw: 3.5,
            evening_start_hour: 18.0,
            evening_end_hour: 22.0,
        }
    }
}

/// Time-of-use price tiers. The peak tier wins where windows overlap.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    pub peak_price: f32,
    pub peak_start_hour: f32,
    pub peak_end_hour: f32,
    pub midday_price: f32,
    pub midday_start_hour: f32,
    pub midday_end_hour: f32,
    pub off_peak_price: f32,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            peak_price: 0.55,
            peak_start_hour: 17.0,
            peak_end_hour: 21.0,
            midday_price: 0.25,
            midday_start_hour: 9.0,
            midday_end_hour: 17.0,
            off_peak_price: 0.10,
        }
    }
}

/// Grid carbon-intensity model (gCO2/kWh).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarbonConfig {
    pub base_g_per_kwh: f32,
    /// Reduction per kW of solar output.
    pub solar_slope: f32,
    pub min_g_per_kwh: f32,
    pub max_g_per_kwh: f32,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            base_g_per_kwh: 500.0,
            solar_slope: 50.0,
            min_g_per_kwh: 100.0,
            max_g_per_kwh: 600.0,
        }
    }
}

/// Dispatch agent thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentSection {
    pub arbitrage_price: f32,
    pub arbitrage_min_soc_pct: f32,
    pub islanding_carbon: f32,
    pub islanding_min_soc_pct: f32,
    pub reserve_soc_pct: f32,
}

impl Default for AgentSection {
    fn default() -> Self {
        let a = AgentConfig::default();
        Self {
            arbitrage_price: a.arbitrage_price,
            arbitrage_min_soc_pct: a.arbitrage_min_soc_pct,
            islanding_carbon: a.islanding_carbon,
            islanding_min_soc_pct: a.islanding_min_soc_pct,
            reserve_soc_pct: a.reserve_soc_pct,
        }
    }
}

/// A scheduled task preloaded from the scenario.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Hour of day, `[0, 24)`.
    pub time: f32,
    /// `"FORCE_CHARGE"` or `"FORCE_DISCHARGE"`.
    pub action: TaskAction,
}

/// A grid outage active for ticks in `[start_tick, end_tick)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlackoutWindow {
    pub start_tick: u64,
    pub end_tick: u64,
}

impl ScenarioConfig {
    /// Returns the baseline scenario (the simulator's built-in defaults).
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the overcast preset: heavy cloud, so carbon stays high and the
    /// agent spends daylight hours islanded.
    pub fn overcast() -> Self {
        Self {
            simulation: SimulationConfig {
                initial_cloud_cover: 0.8,
                ..SimulationConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the time-of-use preset: cheap night charging and a forced
    /// discharge into the evening peak.
    pub fn time_of_use() -> Self {
        Self {
            simulation: SimulationConfig {
                start_hour: 0.0,
                ..SimulationConfig::default()
            },
            battery: BatteryConfig {
                initial_soc_pct: 20.0,
                ..BatteryConfig::default()
            },
            tasks: vec![
                TaskConfig {
                    time: 2.0,
                    action: TaskAction::ForceCharge,
                },
                TaskConfig {
                    time: 3.0,
                    action: TaskAction::ForceCharge,
                },
                TaskConfig {
                    time: 18.0,
                    action: TaskAction::ForceDischarge,
                },
            ],
            ..Self::default()
        }
    }

    /// Returns the storm preset: heavy cloud and an evening grid outage.
    pub fn storm() -> Self {
        Self {
            simulation: SimulationConfig {
                initial_cloud_cover: 0.9,
                ..SimulationConfig::default()
            },
            battery: BatteryConfig {
                initial_soc_pct: 70.0,
                ..BatteryConfig::default()
            },
            // 06:00 start: ticks 48..64 cover 18:00-22:00
            blackouts: vec![BlackoutWindow {
                start_tick: 48,
                end_tick: 64,
            }],
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "overcast", "time_of_use", "storm"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "overcast" => Ok(Self::overcast()),
            "time_of_use" => Ok(Self::time_of_use()),
            "storm" => Ok(Self::storm()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: String, message: &str| {
            if !ok {
                errors.push(ConfigError::new(field, message));
            }
        };

        let s = &self.simulation;
        check(
            (1..=24 * 60).contains(&s.minutes_per_tick),
            "simulation.minutes_per_tick".into(),
            "must be in 1..=1440",
        );
        check(
            s.tick_interval_ms > 0,
            "simulation.tick_interval_ms".into(),
            "must be > 0",
        );
        check(
            (0.0..24.0).contains(&s.start_hour),
            "simulation.start_hour".into(),
            "must be in [0, 24)",
        );
        check(
            (0.0..=1.0).contains(&s.initial_cloud_cover),
            "simulation.initial_cloud_cover".into(),
            "must be in [0, 1]",
        );
        check(
            s.history_capacity > 0,
            "simulation.history_capacity".into(),
            "must be > 0",
        );
        check(s.log_capacity > 0, "simulation.log_capacity".into(), "must be > 0");
        check(
            (0.0..=1.0).contains(&s.log_sample_rate),
            "simulation.log_sample_rate".into(),
            "must be in [0, 1]",
        );

        let bat = &self.battery;
        check(
            bat.capacity_kwh > 0.0,
            "battery.capacity_kwh".into(),
            "must be > 0",
        );
        check(bat.max_rate_kw >= 0.0, "battery.max_rate_kw".into(), "must be >= 0");
        check(
            (0.0..=100.0).contains(&bat.initial_soc_pct),
            "battery.initial_soc_pct".into(),
            "must be in [0, 100]",
        );

        let sol = &self.solar;
        check(sol.max_kw >= 0.0, "solar.max_kw".into(), "must be >= 0");
        check(sol.noise_kw >= 0.0, "solar.noise_kw".into(), "must be >= 0");
        check(
            sol.sunrise_hour < sol.sunset_hour,
            "solar.sunrise_hour".into(),
            "must be < solar.sunset_hour",
        );

        let load = &self.load;
        check(load.base_kw >= 0.0, "load.base_kw".into(), "must be >= 0");
        check(load.noise_kw >= 0.0, "load.noise_kw".into(), "must be >= 0");
        check(
            load.morning_start_hour < load.morning_end_hour,
            "load.morning_start_hour".into(),
            "must be < load.morning_end_hour",
        );
        check(
            load.evening_start_hour < load.evening_end_hour,
            "load.evening_start_hour".into(),
            "must be < load.evening_end_hour",
        );

        let t = &self.tariff;
        check(
            t.peak_price > 0.0 && t.midday_price > 0.0 && t.off_peak_price > 0.0,
            "tariff".into(),
            "prices must be > 0",
        );
        check(
            t.peak_start_hour < t.peak_end_hour,
            "tariff.peak_start_hour".into(),
            "must be < tariff.peak_end_hour",
        );
        check(
            t.midday_start_hour < t.midday_end_hour,
            "tariff.midday_start_hour".into(),
            "must be < tariff.midday_end_hour",
        );

        let c = &self.carbon;
        check(
            c.min_g_per_kwh <= c.max_g_per_kwh,
            "carbon.min_g_per_kwh".into(),
            "must be <= carbon.max_g_per_kwh",
        );

        for (i, task) in self.tasks.iter().enumerate() {
            check(
                (0.0..24.0).contains(&task.time),
                format!("tasks[{i}].time"),
                "must be in [0, 24)",
            );
        }
        for (i, window) in self.blackouts.iter().enumerate() {
            check(
                window.start_tick < window.end_tick,
                format!("blackouts[{i}].start_tick"),
                "must be < end_tick",
            );
        }
        let mut windows = self.blackouts.clone();
        windows.sort_by_key(|w| w.start_tick);
        check(
            windows.windows(2).all(|w| w[0].end_tick <= w[1].start_tick),
            "blackouts".into(),
            "windows must not overlap",
        );

        errors
    }

    /// Timing configuration derived from the `[simulation]` section.
    ///
    /// Call [`validate`](Self::validate) first; an out-of-range tick length panics.
    pub fn sim_config(&self) -> SimConfig {
        let s = &self.simulation;
        SimConfig::new(s.minutes_per_tick, s.tick_interval_ms, s.seed)
    }

    pub fn tariff(&self) -> Tariff {
        let t = &self.tariff;
        Tariff {
            tiers: vec![
                PriceTier {
                    start_hour: t.peak_start_hour,
                    end_hour: t.peak_end_hour,
                    price: t.peak_price,
                },
                PriceTier {
                    start_hour: t.midday_start_hour,
                    end_hour: t.midday_end_hour,
                    price: t.midday_price,
                },
            ],
            off_peak_price: t.off_peak_price,
        }
    }

    pub fn agent_config(&self) -> AgentConfig {
        let a = &self.agent;
        AgentConfig {
            arbitrage_price: a.arbitrage_price,
            arbitrage_min_soc_pct: a.arbitrage_min_soc_pct,
            islanding_carbon: a.islanding_carbon,
            islanding_min_soc_pct: a.islanding_min_soc_pct,
            reserve_soc_pct: a.reserve_soc_pct,
        }
    }

    /// Builds a seeded engine for this scenario.
    ///
    /// # Errors
    ///
    /// Returns every validation error if the scenario is invalid.
    pub fn build_engine(&self) -> Result<Engine, Vec<ConfigError>> {
        let seed = self.simulation.seed;
        self.build_engine_with(
            SeededNoise::new(seed),
            SampledLogPolicy::new(
                self.simulation.log_sample_rate,
                seed.wrapping_add(LOG_SEED_OFFSET),
            ),
        )
    }

    /// Builds an engine with an injected noise source and log policy.
    ///
    /// Preloaded tasks are queued and land on the first tick.
    ///
    /// # Errors
    ///
    /// Returns every validation error if the scenario is invalid.
    pub fn build_engine_with<N: NoiseSource, P: LogPolicy>(
        &self,
        noise: N,
        policy: P,
    ) -> Result<Engine<N, P>, Vec<ConfigError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        let sim = self.sim_config();
        let solar = SolarArray::new(
            self.solar.max_kw,
            self.solar.sunrise_hour,
            self.solar.sunset_hour,
            self.solar.noise_kw,
        );
        let l = &self.load;
        let load = HouseholdLoad::new(
            l.base_kw,
            l.noise_kw,
            vec![
                LoadPeak {
                    start_hour: l.morning_start_hour,
                    end_hour: l.morning_end_hour,
                    extra_kw: l.morning_peak_kw,
                },
                LoadPeak {
                    start_hour: l.evening_start_hour,
                    end_hour: l.evening_end_hour,
                    extra_kw: l.evening_peak_kw,
                },
            ],
        );
        let c = &self.carbon;
        let carbon = CarbonModel {
            base_g_per_kwh: c.base_g_per_kwh,
            solar_slope: c.solar_slope,
            min_g_per_kwh: c.min_g_per_kwh,
            max_g_per_kwh: c.max_g_per_kwh,
        };
        let environment = Environment::new(solar, load, self.tariff(), carbon, noise);

        let battery = Battery::new(self.battery.capacity_kwh, self.battery.max_rate_kw);
        let agent = DispatchAgent::new(self.agent_config(), battery, sim.dt_hours, policy);

        let s = &self.simulation;
        let state = SimulationState::initial(
            s.start_hour,
            self.battery.initial_soc_pct,
            s.initial_cloud_cover,
        );
        let mut engine = Engine::from_state(sim, environment, agent, state)
            .with_capacities(s.history_capacity, s.log_capacity);

        let mut errors = Vec::new();
        for (i, task) in self.tasks.iter().enumerate() {
            if let Err(e) = engine.add_task(task.time, task.action) {
                errors.push(ConfigError::new(format!("tasks[{i}]"), e.to_string()));
            }
        }
        if errors.is_empty() {
            Ok(engine)
        } else {
            Err(errors)
        }
    }

    /// Returns `true` if a scripted blackout starts or ends before `tick`.
    pub fn blackout_toggles_at(&self, tick: u64) -> bool {
        self.blackouts
            .iter()
            .any(|w| w.start_tick == tick || w.end_tick == tick)
    }
}
