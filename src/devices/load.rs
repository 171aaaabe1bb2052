use crate::devices::types::{NoiseSource, within_open_window};

/// Additive demand during a window of the day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadPeak {
    /// Window start hour (exclusive).
    pub start_hour: f32,
    /// Window end hour (exclusive).
    pub end_hour: f32,
    /// Extra demand while inside the window, in kilowatts.
    pub extra_kw: f32,
}

/// Household consumption model.
///
/// Demand is a flat baseline plus uniform noise in `[0, noise_kw)`, with fixed
/// increments added during each configured peak window.
///
/// # Examples
///
/// ```
/// use energy_twin::devices::load::{HouseholdLoad, LoadPeak};
/// use energy_twin::devices::types::ConstantNoise;
///
/// let load = HouseholdLoad::new(0.5, 0.2, vec![LoadPeak {
///     start_hour: 18.0,
///     end_hour: 22.0,
///     extra_kw: 3.5,
/// }]);
/// let evening = load.demand_kw(19.0, &mut ConstantNoise(0.0));
/// assert!((evening - 4.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct HouseholdLoad {
    /// Always-on consumption in kilowatts.
    pub base_kw: f32,

    /// Width of the uniform noise band in kilowatts.
    pub noise_kw: f32,

    /// Peak windows, evaluated independently (overlaps stack).
    pub peaks: Vec<LoadPeak>,
}

impl HouseholdLoad {
    /// Creates a new household load model.
    pub fn new(base_kw: f32, noise_kw: f32, peaks: Vec<LoadPeak>) -> Self {
        Self {
            base_kw: base_kw.max(0.0),
            noise_kw: noise_kw.max(0.0),
            peaks,
        }
    }

    /// Demand in kilowatts at `hour`. Never negative.
    pub fn demand_kw(&self, hour: f32, noise: &mut impl NoiseSource) -> f32 {
        let mut kw = self.base_kw + noise.uniform(0.0, self.noise_kw);
        for peak in &self.peaks {
            if within_open_window(hour, peak.start_hour, peak.end_hour) {
                kw += peak.extra_kw;
            }
        }
        kw.max(0.0)
    }
}
