//! CSV export for simulation step records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::{StepRecord, format_clock};

/// Column header for CSV telemetry export.
const HEADER: &str = "tick,time_hr,clock,grid_status,solar_kw,load_kw,price,\
                       carbon_g_per_kwh,battery_kw,grid_kw,soc_pct,\
                       step_money_saved,step_co2_saved,task,clamped,rolled_back";

/// Exports step records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per tick. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[StepRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes step records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[StepRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.tick.to_string(),
            format!("{:.2}", r.time_hr),
            format_clock(r.time_hr),
            r.grid_status.to_string(),
            format!("{:.4}", r.solar_kw),
            format!("{:.4}", r.load_kw),
            format!("{:.2}", r.price),
            format!("{:.1}", r.carbon_g_per_kwh),
            format!("{:.4}", r.battery_kw),
            format!("{:.4}", r.grid_kw),
            format!("{:.4}", r.soc_pct),
            format!("{:.5}", r.step_money_saved),
            format!("{:.5}", r.step_co2_saved),
            r.task.map(|a| a.to_string()).unwrap_or_default(),
            r.clamped.to_string(),
            r.rolled_back.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::{GridStatus, TaskAction};

    fn make_record(t: u64) -> StepRecord {
        StepRecord {
            tick: t,
            time_hr: 6.0 + t as f32 * 0.25,
            solar_kw: 1.5,
            load_kw: 0.6,
            price: 0.10,
            carbon_g_per_kwh: 425.0,
            grid_status: GridStatus::Islanding,
            battery_kw: 0.9,
            grid_kw: 0.0,
            soc_pct: 52.3,
            step_money_saved: 0.015,
            step_co2_saved: 0.064,
            task: (t == 1).then_some(TaskAction::ForceCharge),
            clamped: false,
            rolled_back: false,
        }
    }

    fn render(records: &[StepRecord]) -> String {
        let mut buf = Vec::new();
        write_csv(records, &mut buf).ok();
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn header_is_stable() {
        let output = render(&[make_record(0)]);
        let first_line = output.lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "tick,time_hr,clock,grid_status,solar_kw,load_kw,price,\
             carbon_g_per_kwh,battery_kw,grid_kw,soc_pct,\
             step_money_saved,step_co2_saved,task,clamped,rolled_back"
        );
    }

    #[test]
    fn row_count_matches_tick_count() {
        let records: Vec<StepRecord> = (0..24).map(make_record).collect();
        // 1 header + 24 data rows
        assert_eq!(render(&records).lines().count(), 25);
    }

    #[test]
    fn deterministic_output() {
        let records: Vec<StepRecord> = (0..5).map(make_record).collect();
        assert_eq!(render(&records), render(&records));
    }

    #[test]
    fn rows_parse_back() {
        let records: Vec<StepRecord> = (0..3).map(make_record).collect();
        let output = render(&records);

        let mut rdr = csv::ReaderBuilder::new().from_reader(output.as_bytes());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(16));

        let rows: Vec<csv::StringRecord> = rdr.records().filter_map(Result::ok).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][2], "06:00");
        assert_eq!(&rows[0][3], "ISLANDING");
        assert_eq!(&rows[0][13], "");
        assert_eq!(&rows[1][13], "FORCE_CHARGE");
        for row in &rows {
            for i in [1, 4, 5, 6, 7, 8, 9, 10, 11, 12] {
                assert!(row[i].parse::<f32>().is_ok(), "column {i} should parse as f32");
            }
            assert!(row[15].parse::<bool>().is_ok());
        }
    }
}
