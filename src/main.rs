//! energy-twin entry point: CLI wiring, headless runs and the optional live host.

use std::process;

use tracing_subscriber::EnvFilter;

use energy_twin::cli::{self, CliOptions};
use energy_twin::config::ScenarioConfig;
use energy_twin::io::export::export_csv;
use energy_twin::runner::run_scenario;

fn load_scenario(cli: &CliOptions) -> ScenarioConfig {
    // --scenario takes priority, then --preset, then baseline default
    let loaded = if let Some(ref path) = cli.scenario {
        ScenarioConfig::from_toml_file(path)
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)
    } else {
        Ok(ScenarioConfig::baseline())
    };
    let mut scenario = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(seed) = cli.seed {
        scenario.simulation.seed = seed;
    }
    if let Some(ticks) = cli.ticks {
        scenario.simulation.ticks = ticks;
    }
    scenario
}

#[cfg(feature = "api")]
fn serve(engine: energy_twin::sim::engine::Engine, port: u16) {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });
    if let Err(e) = rt.block_on(energy_twin::api::serve(Arc::new(Mutex::new(engine)), addr)) {
        eprintln!("error: API server failed: {e}");
        process::exit(1);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(2);
    });
    if cli.help {
        cli::print_usage();
        return;
    }

    let scenario = load_scenario(&cli);
    let mut engine = scenario.build_engine().unwrap_or_else(|errors| {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    });

    if cli.serve {
        #[cfg(feature = "api")]
        {
            serve(engine, cli.port);
            return;
        }
        #[cfg(not(feature = "api"))]
        {
            eprintln!("error: --serve requires building with `--features api`");
            process::exit(1);
        }
    }

    let quiet = cli.quiet;
    let output = run_scenario(&scenario, &mut engine, scenario.simulation.ticks, |entry| {
        if !quiet {
            println!("{entry}");
        }
    });

    println!("\n{}", output.summary);

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&output.records, path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {}", path.display());
    }
}
