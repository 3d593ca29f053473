use std::path::PathBuf;
use std::process;

use altitude_bench::paths;
use altitude_bench::report;
use altitude_bench::runner::StreamRunner;
use altitude_core::config::{load_config_from_path, load_config_from_str, TerrainConfig};

const DEFAULT_CONFIG: &str = include_str!("../../../data/terrain.ron");

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut baseline_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut regression_threshold = 10.0f64;
    let mut tick_count = 240u32;
    let mut dt = 1.0f32 / 60.0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_path = Some(PathBuf::from(arg_value(&args, i, "--config")));
            }
            "--baseline" => {
                i += 1;
                baseline_path = Some(PathBuf::from(arg_value(&args, i, "--baseline")));
            }
            "--output" => {
                i += 1;
                output_path = Some(PathBuf::from(arg_value(&args, i, "--output")));
            }
            "--regression-threshold" => {
                i += 1;
                regression_threshold = arg_value(&args, i, "--regression-threshold")
                    .parse()
                    .expect("invalid --regression-threshold value");
            }
            "--ticks" => {
                i += 1;
                tick_count = arg_value(&args, i, "--ticks")
                    .parse()
                    .expect("invalid --ticks value");
            }
            "--dt" => {
                i += 1;
                dt = arg_value(&args, i, "--dt")
                    .parse()
                    .expect("invalid --dt value");
            }
            "--help" | "-h" => {
                eprintln!("Usage: stream-runner [OPTIONS]");
                eprintln!("  --config <path>                Terrain config RON (default: data/terrain.ron)");
                eprintln!("  --baseline <path>              Load baseline JSON for comparison");
                eprintln!("  --output <path>                Save current results as JSON baseline");
                eprintln!(
                    "  --regression-threshold <pct>   Regression threshold percentage (default: 10)"
                );
                eprintln!("  --ticks <n>                    Ticks per path (default: 240)");
                eprintln!("  --dt <seconds>                 Simulated time per tick (default: 1/60)");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    log::info!(
        "Chunk size {:?}, view distance {:?}, completion every {}s",
        config.chunk_size,
        config.view_distance,
        config.complete_interval
    );

    let runner = match StreamRunner::new(config, tick_count, dt) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let mut results = Vec::new();
    for path in &paths::standard_paths() {
        match runner.run_path(path) {
            Ok(result) => results.push(result),
            Err(e) => {
                eprintln!("ERROR: path '{}' failed: {}", path.name, e);
                process::exit(1);
            }
        }
    }

    println!("\n## Streaming Results\n");
    println!("{}", report::format_markdown(&results));

    if let Some(ref path) = output_path {
        let baseline = report::Baseline {
            timestamp: run_timestamp(),
            results: results.clone(),
        };
        report::save_baseline(path, &baseline).expect("failed to save baseline");
        log::info!("Saved baseline to {}", path.display());
    }

    if let Some(ref path) = baseline_path {
        if let Some(baseline) = report::load_baseline(path) {
            let regressions = report::compare(&results, &baseline, regression_threshold);
            println!(
                "{}",
                report::format_comparison(&regressions, regression_threshold)
            );
            if !regressions.is_empty() {
                eprintln!(
                    "ERROR: {} regressions detected, exiting with code 1",
                    regressions.len()
                );
                process::exit(1);
            }
        } else {
            log::warn!("Baseline file not found: {}", path.display());
        }
    }

    log::info!("Streaming run complete.");
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<TerrainConfig, altitude_core::ConfigError> {
    match path {
        Some(path) => {
            log::info!("Loading terrain config from {}", path.display());
            load_config_from_path(path)
        }
        None => load_config_from_str(DEFAULT_CONFIG),
    }
}

fn arg_value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i) {
        Some(value) => value,
        None => {
            eprintln!("Missing value for {}", flag);
            process::exit(1);
        }
    }
}

fn run_timestamp() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("run-{}", secs)
}
