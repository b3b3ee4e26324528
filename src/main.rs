//! windgrid-sim entry point: CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;

use tracing::warn;

use windgrid_sim::config::ScenarioConfig;
use windgrid_sim::io::export_csv;
use windgrid_sim::logging::init_tracing;
use windgrid_sim::sim::{CancelToken, Engine, RunReport, spawn_run};
use windgrid_sim::telemetry::{TelemetryPipeline, TelemetryRecord};
use windgrid_sim::wind::WindModel;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    telemetry_out: Option<String>,
    quiet: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("windgrid-sim: wind turbine fleet and grid-compliance scenario engine");
    eprintln!();
    eprintln!("Usage: windgrid-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --telemetry-out <path>   Export telemetry records to CSV");
    eprintln!("  --quiet                  Only log warnings and errors");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after the run");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the normal preset is used.");
    eprintln!("Log filtering honours WINDGRID_LOG, then RUST_LOG.");
}

/// Returns the value following flag `args[*i]`, or exits with a usage error.
fn flag_value(args: &[String], i: &mut usize, what: &str) -> String {
    *i += 1;
    match args.get(*i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {} requires {what} argument", args[*i - 1]);
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        telemetry_out: None,
        quiet: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => cli.scenario_path = Some(flag_value(&args, &mut i, "a path")),
            "--preset" => cli.preset = Some(flag_value(&args, &mut i, "a name")),
            "--seed" => {
                let raw = flag_value(&args, &mut i, "a u64");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--telemetry-out" => cli.telemetry_out = Some(flag_value(&args, &mut i, "a path")),
            "--quiet" | "-q" => cli.quiet = true,
            #[cfg(feature = "api")]
            "--serve" => cli.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                let raw = flag_value(&args, &mut i, "a u16");
                if let Ok(p) = raw.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{raw}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Runs `engine` on a worker thread through the configured telemetry
/// pipeline and collects what the consumer receives. Exits on a stalled
/// consumer or a worker panic.
fn stream_run(
    engine: Engine<WindModel>,
    scenario: &ScenarioConfig,
) -> Vec<TelemetryRecord> {
    let (pipeline, publisher) = match TelemetryPipeline::new(scenario.pipeline) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let mut consumer = pipeline.attach();
    let handle = match spawn_run(engine, publisher, CancelToken::new()) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("error: failed to start engine thread: {e}");
            process::exit(1);
        }
    };

    let records: Vec<TelemetryRecord> = consumer.by_ref().collect();
    match handle.join() {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
        Err(_) => {
            eprintln!("error: engine thread panicked");
            process::exit(1);
        }
    }

    let dropped = consumer.dropped();
    if dropped > 0 {
        warn!(dropped, "telemetry consumer fell behind, records were thinned");
    }
    records
}

fn main() {
    let cli = parse_args();
    init_tracing(if cli.quiet { "warn" } else { "info" });

    // --scenario takes priority, then --preset, then the normal preset
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::normal()
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let engine = match scenario.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    #[cfg(feature = "api")]
    let (spec, grid_code) = (*engine.spec(), engine.grid_code().clone());
    let step_s = engine.step_s();

    let records = stream_run(engine, &scenario);
    let report = RunReport::from_records(&records, step_s);

    println!("Scenario: {}", scenario.scenario.name());
    println!("{report}");

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&records, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(windgrid_sim::api::AppState {
            spec,
            grid_code,
            report,
            records,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(windgrid_sim::api::serve(state, addr)) {
            eprintln!("error: API server failed on {addr}: {e}");
            process::exit(1);
        }
    }
}
