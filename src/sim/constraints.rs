//! Physical constraint solver keeping the battery SoC within bounds.

use tracing::warn;

use crate::devices::Battery;
use crate::sim::types::GridStatus;

/// Flows and SoC after the constraint solver has run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solved {
    /// Resulting state of charge (%), always within `[0, 100]`.
    pub soc_pct: f32,
    /// Applied battery power (kW; positive=charge).
    pub battery_kw: f32,
    /// Applied grid exchange (kW; positive=import).
    pub grid_kw: f32,
    /// `true` if the proposed battery flow had to be reduced.
    pub clamped: bool,
}

/// Applies `battery_kw` over `dt_hours` and clamps the result to `[0, 100]` %.
///
/// Energy that would overfill the battery is taken off the battery flow and,
/// only while [`GridStatus::Connected`], exported instead. A shortfall below
/// empty is handed back symmetrically and imported when connected. When the
/// grid is unavailable the clamped energy is simply not served (or curtailed).
pub fn apply_soc_limits(
    battery: &Battery,
    soc_pct: f32,
    battery_kw: f32,
    grid_kw: f32,
    status: GridStatus,
    dt_hours: f32,
) -> Solved {
    let candidate = soc_pct + battery.soc_delta_pct(battery_kw, dt_hours);

    if candidate > 100.0 {
        let excess_kw = battery.pct_to_kw(candidate - 100.0, dt_hours);
        let grid_kw = if status.is_connected() {
            grid_kw - excess_kw
        } else {
            grid_kw
        };
        warn!(excess_kw, %status, "battery full, charge clamped");
        return Solved {
            soc_pct: 100.0,
            battery_kw: battery_kw - excess_kw,
            grid_kw,
            clamped: true,
        };
    }

    if candidate < 0.0 {
        let deficit_kw = battery.pct_to_kw(-candidate, dt_hours);
        let grid_kw = if status.is_connected() {
            grid_kw + deficit_kw
        } else {
            grid_kw
        };
        warn!(deficit_kw, %status, "battery empty, discharge clamped");
        return Solved {
            soc_pct: 0.0,
            battery_kw: battery_kw + deficit_kw,
            grid_kw,
            clamped: true,
        };
    }

    Solved {
        soc_pct: candidate,
        battery_kw,
        grid_kw,
        clamped: false,
    }
}
