//! Savings and avoided-emissions accounting against a no-battery baseline.

/// Savings attributed to a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepSavings {
    /// Currency saved this tick; negative when the agent cost more.
    pub money: f32,
    /// Kilograms of CO2 avoided this tick.
    pub co2_kg: f32,
}

/// Compares the tick's actual grid exchange with the baseline of importing
/// the whole load.
///
/// Exports earn money at the current price but no emissions credit.
pub fn step_savings(
    load_kw: f32,
    price: f32,
    carbon_g_per_kwh: f32,
    grid_kw: f32,
    dt_hours: f32,
) -> StepSavings {
    let baseline_cost = load_kw * price * dt_hours;
    let baseline_co2 = load_kw * carbon_g_per_kwh / 1000.0 * dt_hours;

    let actual_cost = grid_kw * price * dt_hours;
    let actual_co2 = grid_kw.max(0.0) * carbon_g_per_kwh / 1000.0 * dt_hours;

    StepSavings {
        money: baseline_cost - actual_cost,
        co2_kg: baseline_co2 - actual_co2,
    }
}

/// Running totals since the engine started.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ledger {
    pub money_saved: f32,
    pub co2_saved: f32,
}

impl Ledger {
    pub fn new(money_saved: f32, co2_saved: f32) -> Self {
        Self {
            money_saved,
            co2_saved,
        }
    }

    pub fn record(&mut self, step: StepSavings) {
        self.money_saved += step.money;
        self.co2_saved += step.co2_kg;
    }
}
