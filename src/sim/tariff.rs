//! Grid price tiers and carbon-intensity model.

use crate::devices::types::within_window;

/// One price tier active during `[start_hour, end_hour)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceTier {
    pub start_hour: f32,
    pub end_hour: f32,
    /// Price per kWh.
    pub price: f32,
}

/// Time-of-use tariff as a step function over the day.
///
/// Tiers are checked in order; the first matching tier wins. Hours matched by
/// no tier pay `off_peak_price`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    pub tiers: Vec<PriceTier>,
    pub off_peak_price: f32,
}

impl Tariff {
    /// Price per kWh at `hour`.
    pub fn price_at(&self, hour: f32) -> f32 {
        self.tiers
            .iter()
            .find(|tier| within_window(hour, tier.start_hour, tier.end_hour))
            .map_or(self.off_peak_price, |tier| tier.price)
    }
}

impl Default for Tariff {
    /// Evening peak 0.55, midday 0.25, everything else 0.10.
    fn default() -> Self {
        Self {
            tiers: vec![
                PriceTier {
                    start_hour: 17.0,
                    end_hour: 21.0,
                    price: 0.55,
                },
                PriceTier {
                    start_hour: 9.0,
                    end_hour: 17.0,
                    price: 0.25,
                },
            ],
            off_peak_price: 0.10,
        }
    }
}

/// Marginal grid carbon intensity, falling linearly as solar output rises.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbonModel {
    /// Intensity with no solar on the grid (gCO2/kWh).
    pub base_g_per_kwh: f32,
    /// Reduction per kW of local solar output.
    pub solar_slope: f32,
    pub min_g_per_kwh: f32,
    pub max_g_per_kwh: f32,
}

impl CarbonModel {
    /// Intensity in gCO2/kWh for the given solar output, clamped to bounds.
    pub fn intensity(&self, solar_kw: f32) -> f32 {
        (self.base_g_per_kwh - solar_kw * self.solar_slope)
            .clamp(self.min_g_per_kwh, self.max_g_per_kwh)
    }
}

impl Default for CarbonModel {
    fn default() -> Self {
        Self {
            base_g_per_kwh: 500.0,
            solar_slope: 50.0,
            min_g_per_kwh: 100.0,
            max_g_per_kwh: 600.0,
        }
    }
}
