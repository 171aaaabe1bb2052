//! Post-hoc run summary computed from step records.

use std::fmt;

use super::types::{GridStatus, StepRecord};

/// Aggregate indicators derived from a complete run.
///
/// Computed post-hoc from `&[StepRecord]` so the summary always agrees with
/// exported telemetry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub ticks: usize,
    /// Currency saved against the no-battery baseline.
    pub money_saved: f32,
    /// Avoided emissions (kg CO2).
    pub co2_saved_kg: f32,
    /// Energy imported from the grid (kWh).
    pub grid_import_kwh: f32,
    /// Energy exported to the grid (kWh, positive).
    pub grid_export_kwh: f32,
    /// Total battery energy throughput (kWh, sum of |power| * dt).
    pub battery_throughput_kwh: f32,
    /// Battery equivalent full cycles (throughput / 2*capacity).
    pub battery_equivalent_full_cycles: f32,
    pub min_soc_pct: f32,
    pub max_soc_pct: f32,
    pub connected_ticks: usize,
    pub islanding_ticks: usize,
    pub blackout_ticks: usize,
    pub tasks_executed: usize,
    /// Ticks where the constraint solver clamped the battery.
    pub clamped_ticks: usize,
    /// Ticks discarded after an invariant violation.
    pub rolled_back_ticks: usize,
}

impl RunSummary {
    /// Computes the summary from the complete step record vector.
    ///
    /// # Arguments
    ///
    /// * `records` - Step records in tick order
    /// * `dt_hours` - Tick duration in hours
    /// * `battery_capacity_kwh` - Battery capacity for cycle calculation
    pub fn from_records(records: &[StepRecord], dt_hours: f32, battery_capacity_kwh: f32) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            ticks: records.len(),
            min_soc_pct: f32::INFINITY,
            max_soc_pct: f32::NEG_INFINITY,
            ..Self::default()
        };

        for r in records {
            summary.money_saved += r.step_money_saved;
            summary.co2_saved_kg += r.step_co2_saved;

            if r.grid_kw > 0.0 {
                summary.grid_import_kwh += r.grid_kw * dt_hours;
            } else {
                summary.grid_export_kwh += -r.grid_kw * dt_hours;
            }
            summary.battery_throughput_kwh += r.battery_kw.abs() * dt_hours;

            summary.min_soc_pct = summary.min_soc_pct.min(r.soc_pct);
            summary.max_soc_pct = summary.max_soc_pct.max(r.soc_pct);

            match r.grid_status {
                GridStatus::Connected => summary.connected_ticks += 1,
                GridStatus::Islanding => summary.islanding_ticks += 1,
                GridStatus::Blackout => summary.blackout_ticks += 1,
            }
            if r.task.is_some() {
                summary.tasks_executed += 1;
            }
            if r.clamped {
                summary.clamped_ticks += 1;
            }
            if r.rolled_back {
                summary.rolled_back_ticks += 1;
            }
        }

        if battery_capacity_kwh > 0.0 {
            summary.battery_equivalent_full_cycles =
                summary.battery_throughput_kwh / (2.0 * battery_capacity_kwh);
        }
        summary
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Summary ({} ticks) ---", self.ticks)?;
        writeln!(f, "Money saved:           {:.2}", self.money_saved)?;
        writeln!(f, "CO2 avoided:           {:.2} kg", self.co2_saved_kg)?;
        writeln!(f, "Grid import:           {:.2} kWh", self.grid_import_kwh)?;
        writeln!(f, "Grid export:           {:.2} kWh", self.grid_export_kwh)?;
        writeln!(
            f,
            "Battery throughput:    {:.2} kWh ({:.2} equiv. cycles)",
            self.battery_throughput_kwh, self.battery_equivalent_full_cycles
        )?;
        writeln!(
            f,
            "SoC range:             {:.1}% .. {:.1}%",
            self.min_soc_pct, self.max_soc_pct
        )?;
        writeln!(
            f,
            "Ticks by status:       connected={} islanding={} blackout={}",
            self.connected_ticks, self.islanding_ticks, self.blackout_ticks
        )?;
        writeln!(f, "Tasks executed:        {}", self.tasks_executed)?;
        writeln!(f, "Clamped ticks:         {}", self.clamped_ticks)?;
        write!(f, "Rolled-back ticks:     {}", self.rolled_back_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::TaskAction;

    fn record(grid_kw: f32, battery_kw: f32, soc_pct: f32, status: GridStatus) -> StepRecord {
        StepRecord {
            tick: 0,
            time_hr: 0.0,
            solar_kw: 0.0,
            load_kw: 1.0,
            price: 0.10,
            carbon_g_per_kwh: 500.0,
            grid_status: status,
            battery_kw,
            grid_kw,
            soc_pct,
            step_money_saved: 0.1,
            step_co2_saved: 0.05,
            task: None,
            clamped: false,
            rolled_back: false,
        }
    }

    #[test]
    fn empty_records() {
        let s = RunSummary::from_records(&[], 0.25, 13.5);
        assert_eq!(s, RunSummary::default());
    }

    #[test]
    fn import_export_split() {
        let records = vec![
            record(2.0, 0.0, 50.0, GridStatus::Connected),
            record(-4.0, -5.0, 45.0, GridStatus::Connected),
        ];
        let s = RunSummary::from_records(&records, 0.25, 13.5);
        assert!((s.grid_import_kwh - 0.5).abs() < 1e-6);
        assert!((s.grid_export_kwh - 1.0).abs() < 1e-6);
    }

    #[test]
    fn throughput_and_cycles() {
        // 4 steps at 5 kW, dt=0.25 => 5 kWh throughput; 10 kWh capacity => 0.25 cycles
        let records: Vec<_> = (0..4)
            .map(|_| record(0.0, 5.0, 50.0, GridStatus::Connected))
            .collect();
        let s = RunSummary::from_records(&records, 0.25, 10.0);
        assert!((s.battery_throughput_kwh - 5.0).abs() < 1e-6);
        assert!((s.battery_equivalent_full_cycles - 0.25).abs() < 1e-6);
    }

    #[test]
    fn counts_statuses_tasks_and_soc_range() {
        let mut forced = record(0.0, 5.0, 80.0, GridStatus::Islanding);
        forced.task = Some(TaskAction::ForceCharge);
        forced.clamped = true;
        let mut lost = record(0.0, 0.0, 40.0, GridStatus::Blackout);
        lost.rolled_back = true;
        let records = vec![
            record(1.0, 0.0, 50.0, GridStatus::Connected),
            forced,
            lost,
        ];

        let s = RunSummary::from_records(&records, 0.25, 13.5);
        assert_eq!(s.ticks, 3);
        assert_eq!(
            (s.connected_ticks, s.islanding_ticks, s.blackout_ticks),
            (1, 1, 1)
        );
        assert_eq!(s.tasks_executed, 1);
        assert_eq!(s.clamped_ticks, 1);
        assert_eq!(s.rolled_back_ticks, 1);
        assert_eq!(s.min_soc_pct, 40.0);
        assert_eq!(s.max_soc_pct, 80.0);
        assert!((s.money_saved - 0.3).abs() < 1e-6);
    }

    #[test]
    fn display_lists_savings() {
        let s = RunSummary::from_records(
            &[record(0.0, 0.0, 50.0, GridStatus::Connected)],
            0.25,
            13.5,
        );
        let text = s.to_string();
        assert!(text.contains("Money saved"));
        assert!(text.contains("Rolled-back ticks"));
    }
}
