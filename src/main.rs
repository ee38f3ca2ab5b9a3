mod config;
mod doppler;
mod executor;
mod monitor;
mod orbit;
mod topology;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::doppler::format_doppler_shift;
use crate::executor::ShellExecutor;
use crate::monitor::{FileLogWriter, Monitor, MonitorContext};
use crate::topology::{GslEndpoint, IslLink};
use crate::web::AppState;

#[derive(Parser)]
#[command(name = "leo-linkmon")]
#[command(about = "Real-time link quality monitor for emulated LEO satellite networks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file
    Validate { config: String },
    /// Run a measurement session until Ctrl-C or the given duration
    Run {
        config: String,
        #[arg(long, value_parser = humantime::parse_duration)]
        duration: Option<Duration>,
    },
    /// Serve the control API
    Serve { config: String },
    /// Print the Doppler shift on a ground-satellite link
    Doppler {
        config: String,
        #[arg(long)]
        sat: usize,
        #[arg(long)]
        gs: usize,
        /// Emulation time in seconds
        #[arg(long, default_value_t = 0)]
        at: u64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Decode an interface address into the node owning it
    Decode { config: String, ip: String },
    /// List the interface addresses of a satellite
    Addresses {
        config: String,
        #[arg(long)]
        sat: usize,
        /// Also show the link towards this ground station
        #[arg(long)]
        gs: Option<usize>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Decode { config, ip } => decode(&config, &ip),
        Commands::Addresses { config, sat, gs } => addresses(&config, sat, gs),
        Commands::Doppler {
            config,
            sat,
            gs,
            at,
            json,
        } => doppler(&config, sat, gs, at, json),
        Commands::Run { config, duration } => with_runtime(run(config, duration)),
        Commands::Serve { config } => with_runtime(serve(config)),
    }
}

fn load(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading {}: {}", path, e);
            None
        }
    }
}

fn context(config: &Config) -> Option<Arc<MonitorContext>> {
    let executor = Arc::new(ShellExecutor::new(config.executor.clone()));
    let logs = Arc::new(FileLogWriter::new(config.monitor.log_dir.clone()));
    match MonitorContext::from_config(config, executor, logs) {
        Ok(context) => Some(Arc::new(context)),
        Err(e) => {
            eprintln!("Error: {}", e);
            None
        }
    }
}

fn with_runtime(task: impl std::future::Future<Output = ExitCode>) -> ExitCode {
    match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime.block_on(task),
        Err(e) => {
            eprintln!("Cannot start runtime: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(config) = load(path) else {
        return ExitCode::FAILURE;
    };
    // propagators are built here so bad elements surface now
    let Some(context) = context(&config) else {
        return ExitCode::FAILURE;
    };

    let c = &config.constellation;
    println!(
        "Config is valid: {} satellites ({} orbits x {}, {} deg, {} km), {} ground stations, carrier {}",
        context.satellites.len(),
        c.orbits,
        c.satellites_per_orbit,
        c.inclination_deg,
        c.altitude_km,
        context.addressing.ground_station_count(),
        config.radio.carrier
    );
    for (station, raw) in context.stations.iter().zip(&config.ground_stations) {
        println!(
            "  gs-{}: {} ({:.4}, {:.4}, {} m)",
            station.index,
            raw.name.as_deref().unwrap_or("unnamed"),
            station.latitude_deg,
            station.longitude_deg,
            station.altitude_m
        );
    }
    match config.pairs() {
        Ok(pairs) => {
            for pair in pairs {
                println!("  pair {} <-> {} [{}]", pair.a, pair.b, pair.link_class());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn decode(path: &str, ip: &str) -> ExitCode {
    let Some(config) = load(path) else {
        return ExitCode::FAILURE;
    };
    match config.addressing().decode_str(ip) {
        Some(node) => {
            println!("{}", node);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("{} is not part of the address plan", ip);
            ExitCode::FAILURE
        }
    }
}

fn addresses(path: &str, sat: usize, gs: Option<usize>) -> ExitCode {
    let Some(config) = load(path) else {
        return ExitCode::FAILURE;
    };
    let addressing = config.addressing();

    let (Some(intra), Some(inter)) = (
        addressing.isl_address(sat, IslLink::IntraOrbit),
        addressing.isl_address(sat, IslLink::InterOrbit),
    ) else {
        eprintln!("sat-{} is not part of the address plan", sat);
        return ExitCode::FAILURE;
    };
    println!("sat-{}: intra-orbit ISL {}, inter-orbit ISL {}", sat, intra, inter);

    if let Some(gs) = gs {
        let sat_side = addressing.gsl_address(sat, gs, GslEndpoint::Satellite);
        let gs_side = addressing.gsl_address(sat, gs, GslEndpoint::Ground);
        match (sat_side, gs_side) {
            (Some(sat_side), Some(gs_side)) => {
                println!("sat-{} <-> gs-{}: GSL {} / {}", sat, gs, sat_side, gs_side)
            }
            _ => {
                eprintln!("No GSL address for sat-{} / gs-{}", sat, gs);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn doppler(path: &str, sat: usize, gs: usize, at: u64, json: bool) -> ExitCode {
    let Some(config) = load(path) else {
        return ExitCode::FAILURE;
    };
    let Some(context) = context(&config) else {
        return ExitCode::FAILURE;
    };

    match context.doppler(gs, sat, at) {
        Ok(sample) if json => match serde_json::to_string_pretty(&sample) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        Ok(sample) => {
            println!(
                "T={}s ({}): gs-{} / sat-{}: {} (radial velocity {:.1} m/s)",
                at,
                context.emulation_instant(at),
                gs,
                sat,
                format_doppler_shift(sample.shift_hz),
                sample.radial_velocity_m_s
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(path: String, duration: Option<Duration>) -> ExitCode {
    let Some(config) = load(&path) else {
        return ExitCode::FAILURE;
    };
    let Some(context) = context(&config) else {
        return ExitCode::FAILURE;
    };
    let pairs = match config.pairs() {
        Ok(pairs) => pairs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut monitor = Monitor::new(context);
    if let Err(e) = monitor.start(pairs) {
        eprintln!("Cannot start monitor: {}", e);
        return ExitCode::FAILURE;
    }

    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        _ = deadline => log::info!("Session duration elapsed"),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                log::error!("Cannot listen for Ctrl-C: {}", e);
            }
        }
    }

    monitor.stop().await;
    let status = monitor.status();
    println!("Completed {} measurement passes", status.iterations);
    for target in status.log_targets {
        println!("  {}", config.monitor.log_dir.join(target).display());
    }
    ExitCode::SUCCESS
}

async fn serve(path: String) -> ExitCode {
    let Some(config) = load(&path) else {
        return ExitCode::FAILURE;
    };
    let Some(context) = context(&config) else {
        return ExitCode::FAILURE;
    };
    let pairs = match config.pairs() {
        Ok(pairs) => pairs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let bind = config
        .web
        .as_ref()
        .map(|w| w.bind.clone())
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());

    match web::run_server(&bind, AppState::new(context, pairs)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
