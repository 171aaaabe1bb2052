//! Command-line argument parsing.

use std::env;
use std::path::PathBuf;

/// Default port for `--serve`.
pub const DEFAULT_PORT: u16 = 3000;

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub seed: Option<u64>,
    pub ticks: Option<u64>,
    pub telemetry_out: Option<PathBuf>,
    /// Suppress agent log lines; only the summary is printed.
    pub quiet: bool,
    pub serve: bool,
    pub port: u16,
    pub help: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            scenario: None,
            preset: None,
            seed: None,
            ticks: None,
            telemetry_out: None,
            quiet: false,
            serve: false,
            port: DEFAULT_PORT,
            help: false,
        }
    }
}

pub fn parse_args() -> Result<CliOptions, String> {
    parse_args_from(env::args().skip(1))
}

pub fn parse_args_from<I, S>(args: I) -> Result<CliOptions, String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let mut opts = CliOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --scenario (expected a TOML file path)")?;
                if opts.scenario.replace(PathBuf::from(path)).is_some() {
                    return Err("--scenario provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if opts.preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let seed = raw
                    .parse()
                    .map_err(|_| format!("invalid --seed value \"{raw}\" (expected a u64)"))?;
                opts.seed = Some(seed);
            }
            "--ticks" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --ticks (expected a u64)")?;
                let ticks = raw
                    .parse()
                    .map_err(|_| format!("invalid --ticks value \"{raw}\" (expected a u64)"))?;
                opts.ticks = Some(ticks);
            }
            "--telemetry-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --telemetry-out (expected a file path)",
                )?;
                if opts.telemetry_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--telemetry-out provided more than once".to_string());
                }
            }
            "--quiet" | "-q" => opts.quiet = true,
            "--serve" => opts.serve = true,
            "--port" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                opts.port = raw
                    .parse()
                    .map_err(|_| format!("invalid --port value \"{raw}\" (expected a u16)"))?;
            }
            "--help" | "-h" => opts.help = true,
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("energy-twin: home energy-management simulator");
    eprintln!();
    eprintln!("Usage: energy-twin [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, overcast, time_of_use, storm)");
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --ticks <n>              Override the number of ticks to run");
    eprintln!("  --telemetry-out <path>   Export step records to CSV");
    eprintln!("  --quiet, -q              Only print the run summary");
    eprintln!("  --serve                  Serve the live simulation over HTTP (feature `api`)");
    eprintln!("  --port <u16>             API server port (default: {DEFAULT_PORT})");
    eprintln!("  --help, -h               Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let opts = parse_args_from(Vec::<String>::new()).expect("parse should succeed");
        assert_eq!(opts, CliOptions::default());
    }

    #[test]
    fn supports_scenario_cli() {
        let opts = parse_args_from(["--scenario", "scenario.toml"]).expect("parse should succeed");
        assert_eq!(
            opts.scenario.as_deref().and_then(|p| p.to_str()),
            Some("scenario.toml")
        );
        assert!(opts.preset.is_none());
    }

    #[test]
    fn supports_preset_with_overrides() {
        let opts = parse_args_from([
            "--preset", "storm", "--seed", "7", "--ticks", "192", "--quiet",
        ])
        .expect("parse should succeed");
        assert_eq!(opts.preset.as_deref(), Some("storm"));
        assert_eq!(opts.seed, Some(7));
        assert_eq!(opts.ticks, Some(192));
        assert!(opts.quiet);
    }

    #[test]
    fn serve_with_port() {
        let opts = parse_args_from(["--serve", "--port", "8080"]).expect("parse should succeed");
        assert!(opts.serve);
        assert_eq!(opts.port, 8080);
    }

    #[test]
    fn rejects_scenario_and_preset_together() {
        let err = parse_args_from(["--scenario", "a.toml", "--preset", "storm"]).unwrap_err();
        assert!(err.contains("mutually exclusive"));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(parse_args_from(["--seed", "abc"]).is_err());
        assert!(parse_args_from(["--port", "70000"]).is_err());
        assert!(parse_args_from(["--ticks"]).is_err());
    }

    #[test]
    fn rejects_unknown_argument() {
        let err = parse_args_from(["--bogus"]).unwrap_err();
        assert_eq!(err, "unknown argument: --bogus");
    }

    #[test]
    fn help_flag_is_reported() {
        assert!(parse_args_from(["-h"]).expect("parse should succeed").help);
    }
}
