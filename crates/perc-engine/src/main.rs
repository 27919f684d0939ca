use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use perc_engine::prelude::*;
use perc_engine::VERSION;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("percolation")
        .version(VERSION)
        .about("Resilience of access-controlled networks under a privacy budget")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("run")
                .about("Estimate resilience over a range of budgets")
                .arg(
                    Arg::new("network")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Network JSON file"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML or YAML engine configuration"),
                )
                .arg(
                    Arg::new("integral-steps")
                        .long("integral-steps")
                        .value_parser(value_parser!(usize))
                        .help("Midpoint-rule cells over rho"),
                )
                .arg(
                    Arg::new("rand-steps")
                        .long("rand-steps")
                        .value_parser(value_parser!(usize))
                        .help("Monte-Carlo trials per cell"),
                )
                .arg(
                    Arg::new("min-budget")
                        .long("min-budget")
                        .value_parser(value_parser!(u32))
                        .help("First budget of the sweep"),
                )
                .arg(
                    Arg::new("max-budget")
                        .long("max-budget")
                        .value_parser(value_parser!(u32))
                        .help("Last budget of the sweep"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("sequential")
                        .long("sequential")
                        .action(ArgAction::SetTrue)
                        .help("Run trials on the current thread only"),
                )
                .arg(
                    Arg::new("threads")
                        .long("threads")
                        .value_parser(value_parser!(usize))
                        .help("Size of the trial thread pool"),
                )
                .arg(
                    Arg::new("demand")
                        .long("demand")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON demand table; uniform demand when absent"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .default_value("budget-vs-alpha.csv")
                        .value_parser(value_parser!(PathBuf))
                        .help("CSV output file"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the alpha mapping as JSON"),
                )
                .arg(
                    Arg::new("report")
                        .long("report")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the full report as JSON"),
                ),
        )
        .subcommand(
            Command::new("extract")
                .about("Extract a network from a digital-twin export")
                .arg(
                    Arg::new("twin")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Twin JSON file"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Network JSON file; stdout when absent"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a network file and print its summary")
                .arg(
                    Arg::new("network")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Network JSON file"),
                ),
        )
        .subcommand(Command::new("schema").about("Print the JSON schema of network files"))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn path_arg<'m>(args: &'m ArgMatches, name: &str) -> Result<&'m PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing argument <{name}>"))
}

fn load_network(path: &Path) -> Result<Network> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read network {}", path.display()))?;
    Network::from_json(&text).with_context(|| format!("invalid network {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn engine_config(args: &ArgMatches) -> Result<EngineConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(&steps) = args.get_one::<usize>("integral-steps") {
        config.integral_steps = steps;
    }
    if let Some(&steps) = args.get_one::<usize>("rand-steps") {
        config.rand_steps = steps;
    }
    if let Some(&budget) = args.get_one::<u32>("min-budget") {
        config.min_budget = budget;
    }
    if let Some(&budget) = args.get_one::<u32>("max-budget") {
        config.max_budget = budget;
    }
    if let Some(&seed) = args.get_one::<u64>("seed") {
        config.seed = Some(seed);
    }
    if args.get_flag("sequential") {
        config.parallel = false;
    }
    config.validate()?;
    Ok(config)
}

/// Wait for `worker`, raising `cancel` if `interrupt` fires first
///
/// An interrupt listener that fails to install leaves the sweep running.
async fn await_sweep<T>(
    mut worker: JoinHandle<T>,
    interrupt: impl Future<Output = std::io::Result<()>>,
    cancel: &CancelFlag,
) -> Result<T, JoinError> {
    tokio::select! {
        joined = &mut worker => joined,
        signal = interrupt => {
            match signal {
                Ok(()) => {
                    warn!("interrupt received, stopping after the current budget");
                    cancel.cancel();
                }
                Err(err) => warn!(error = %err, "cannot listen for interrupts"),
            }
            worker.await
        }
    }
}

async fn run(args: &ArgMatches) -> Result<()> {
    let network = load_network(path_arg(args, "network")?)?;
    let config = engine_config(args)?;
    let demand = args
        .get_one::<PathBuf>("demand")
        .map(|path| {
            DemandTable::from_path(path)
                .with_context(|| format!("failed to load demand {}", path.display()))
        })
        .transpose()?;

    if let Some(&threads) = args.get_one::<usize>("threads") {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to size the trial thread pool")?;
    }

    let cancel = CancelFlag::new();
    let worker = {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || match &demand {
            Some(table) => percolation_with(&network, &config, table, &cancel),
            None => percolation_with(&network, &config, &UniformDemand, &cancel),
        })
    };

    let report = await_sweep(worker, tokio::signal::ctrl_c(), &cancel)
        .await
        .context("sweep task failed")??;

    let csv = report.to_csv();
    print!("{csv}");

    let output = path_arg(args, "output")?;
    write_file(output, &csv)?;
    info!(path = %output.display(), "wrote CSV report");
    if let Some(path) = args.get_one::<PathBuf>("json") {
        write_file(path, &report.alpha_map_json()?)?;
        info!(path = %path.display(), "wrote alpha mapping");
    }
    if let Some(path) = args.get_one::<PathBuf>("report") {
        write_file(path, &report.to_json_pretty()?)?;
        info!(path = %path.display(), "wrote full report");
    }

    if !report.completed {
        bail!("sweep cancelled after {} budget(s)", report.rows.len());
    }
    Ok(())
}

fn extract(args: &ArgMatches) -> Result<()> {
    let twin = path_arg(args, "twin")?;
    let text = std::fs::read_to_string(twin)
        .with_context(|| format!("failed to read twin {}", twin.display()))?;
    let description = perc_twin::extract_network(&text)
        .with_context(|| format!("failed to extract network from {}", twin.display()))?;
    info!(
        nodes = description.nodes.len(),
        edges = description.edges.len(),
        "extracted network"
    );
    let json = description.to_json_pretty()?;
    match args.get_one::<PathBuf>("output") {
        Some(path) => write_file(path, &json),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn validate(args: &ArgMatches) -> Result<()> {
    let network = load_network(path_arg(args, "network")?)?;
    println!("nodes: {}", network.node_count());
    println!("edges: {}", network.edge_count());
    println!("fingerprint: {}", network.fingerprint());
    Ok(())
}

fn schema() -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&NetworkDescription::json_schema())?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("run", args)) => run(args).await,
        Some(("extract", args)) => extract(args),
        Some(("validate", args)) => validate(args),
        Some(("schema", _)) => schema(),
        _ => unreachable!("clap requires a subcommand"),
    }
}
