/// A home battery described by its energy capacity and power rating.
///
/// State of charge is carried in [`SimulationState`](crate::sim::types::SimulationState)
/// as a percentage; this type only converts between power, energy and SoC.
///
/// # Power Flow Convention
/// - Positive power: Charging
/// - Negative power: Discharging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Battery {
    /// Usable energy capacity in kilowatt-hours.
    pub capacity_kwh: f32,

    /// Maximum charge and discharge power in kilowatts (positive value).
    pub max_rate_kw: f32,
}

impl Battery {
    /// Creates a new battery.
    ///
    /// # Arguments
    ///
    /// * `capacity_kwh` - Usable capacity in kWh (must be > 0)
    /// * `max_rate_kw` - Symmetric charge/discharge rating in kW (must be >= 0)
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero/negative or the rate is negative.
    pub fn new(capacity_kwh: f32, max_rate_kw: f32) -> Self {
        assert!(capacity_kwh > 0.0);
        assert!(max_rate_kw >= 0.0);
        Self {
            capacity_kwh,
            max_rate_kw,
        }
    }

    /// SoC change in percentage points from holding `power_kw` for `dt_hours`.
    pub fn soc_delta_pct(&self, power_kw: f32, dt_hours: f32) -> f32 {
        power_kw * dt_hours / self.capacity_kwh * 100.0
    }

    /// Energy in kWh represented by `pct` percentage points of SoC.
    pub fn energy_kwh(&self, pct: f32) -> f32 {
        pct / 100.0 * self.capacity_kwh
    }

    /// Power in kW that would move `pct` percentage points of SoC in `dt_hours`.
    pub fn pct_to_kw(&self, pct: f32, dt_hours: f32) -> f32 {
        self.energy_kwh(pct) / dt_hours
    }

    /// Highest discharge power the stored energy could sustain for one step.
    pub fn deliverable_kw(&self, soc_pct: f32, dt_hours: f32) -> f32 {
        self.pct_to_kw(soc_pct.max(0.0), dt_hours)
    }
}
