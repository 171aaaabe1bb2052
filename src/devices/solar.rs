use crate::devices::types::{NoiseSource, within_open_window};

/// A rooftop solar array with a half-sine daylight profile.
///
/// Output is zero outside the open `(sunrise_hour, sunset_hour)` window. Inside
/// it follows `sin(pi * (t - sunrise) / daylight_hours)`, peaking at solar noon,
/// scaled by `max_kw` and attenuated by `(1 - cloud_cover)`. Uniform noise in
/// `[-noise_kw, noise_kw)` is added afterwards and the result is floored at 0.
///
/// # Examples
///
/// ```
/// use energy_twin::devices::solar::SolarArray;
/// use energy_twin::devices::types::ConstantNoise;
///
/// let pv = SolarArray::new(6.0, 6.0, 18.0, 0.1);
/// let noon = pv.output_kw(12.0, 0.0, &mut ConstantNoise(0.5));
/// assert!((noon - 6.0).abs() < 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct SolarArray {
    /// Peak output in kilowatts under a clear sky.
    pub max_kw: f32,

    /// Hour of day when generation starts (exclusive).
    pub sunrise_hour: f32,

    /// Hour of day when generation ends (exclusive).
    pub sunset_hour: f32,

    /// Half-width of the uniform noise band in kilowatts.
    pub noise_kw: f32,
}

impl SolarArray {
    /// Creates a new solar array.
    ///
    /// # Arguments
    ///
    /// * `max_kw` - Peak output in kilowatts
    /// * `sunrise_hour` - Start of the generation window
    /// * `sunset_hour` - End of the generation window
    /// * `noise_kw` - Half-width of the uniform noise band
    ///
    /// # Panics
    ///
    /// Panics if `sunrise_hour >= sunset_hour`.
    pub fn new(max_kw: f32, sunrise_hour: f32, sunset_hour: f32, noise_kw: f32) -> Self {
        assert!(
            sunrise_hour < sunset_hour,
            "sunrise_hour must be < sunset_hour"
        );
        Self {
            max_kw: max_kw.max(0.0),
            sunrise_hour,
            sunset_hour,
            noise_kw: noise_kw.max(0.0),
        }
    }

    /// Clear-sky fraction of peak output at `hour` (0.0 outside daylight).
    pub fn daylight_frac(&self, hour: f32) -> f32 {
        if !within_open_window(hour, self.sunrise_hour, self.sunset_hour) {
            return 0.0;
        }
        let span = self.sunset_hour - self.sunrise_hour;
        (std::f32::consts::PI * (hour - self.sunrise_hour) / span)
            .sin()
            .max(0.0)
    }

    /// Generation in kilowatts at `hour` under the given cloud cover.
    ///
    /// Noise is only drawn inside the daylight window, so night-time output is
    /// exactly zero and does not consume samples.
    pub fn output_kw(&self, hour: f32, cloud_cover: f32, noise: &mut impl NoiseSource) -> f32 {
        let frac = self.daylight_frac(hour);
        if frac <= 0.0 {
            return 0.0;
        }
        let clear_sky = frac * self.max_kw;
        let attenuated = clear_sky * (1.0 - cloud_cover.clamp(0.0, 1.0));
        (attenuated + noise.uniform(-self.noise_kw, self.noise_kw)).max(0.0)
    }
}
