//! Command-line driver: load properties, build an engine, run the
//! timeline, report probe counts.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rdmsim::strategy::{
  BalancedTreeStrategy, DepthLimitTreeStrategy, FullyConnectedStrategy, LineStrategy,
  NConnectedStrategy, RingStrategy, SnowflakeStrategy, StarStrategy, SubstructureFactory,
  TopologyStrategy, TreeStrategy,
};
use rdmsim::{Engine, SimError, SimProps, SimResult, StructureType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyKind {
  Tree,
  BalancedTree,
  DepthLimitTree,
  Line,
  Ring,
  Star,
  FullyConnected,
  NConnected,
  Snowflake,
}

#[derive(Debug, Parser)]
#[command(name = "rdmsim", about = "Discrete-time reconfigurable distributed mirror simulator")]
struct Cli {
  /// Property file (JSON); defaults apply for missing keys.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Topology strategy to start with.
  #[arg(short, long, value_enum, default_value = "ring")]
  strategy: StrategyKind,

  /// Degree parameter for the n-connected strategy.
  #[arg(long, default_value_t = 2)]
  n: usize,

  /// Links-per-node parameter for the balanced tree strategy.
  #[arg(long, default_value_t = 2)]
  target_links: usize,

  /// Depth cap for the depth-limited tree strategy.
  #[arg(long, default_value_t = 3)]
  max_depth: usize,

  /// Child cap for the depth-limited tree strategy; unbounded if omitted.
  #[arg(long)]
  max_children: Option<usize>,

  /// Override `sim_time` from the property file.
  #[arg(long)]
  sim_time: Option<u64>,

  /// Override `num_mirrors` from the property file.
  #[arg(long)]
  num_mirrors: Option<usize>,

  /// Schedule a target mirror count, as TICK:COUNT; repeatable.
  #[arg(long = "set-mirrors", value_name = "TICK:COUNT")]
  set_mirrors: Vec<String>,

  /// Schedule a strategy switch, as TICK:STRATEGY; repeatable.
  #[arg(long = "switch-strategy", value_name = "TICK:STRATEGY")]
  switch_strategy: Vec<String>,

  /// Write per-tick probe counts to a CSV file.
  #[arg(long)]
  csv: Option<PathBuf>,

  /// Increase log verbosity (-v: debug, -vv: trace).
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn parse_scheduled<'a>(spec: &'a str, what: &str) -> SimResult<(u64, &'a str)> {
  let (tick, rest) = spec
    .split_once(':')
    .ok_or_else(|| SimError::Config(format!("{what} wants TICK:VALUE, got {spec:?}")))?;
  let tick = tick
    .parse::<u64>()
    .map_err(|_| SimError::Config(format!("bad tick in {what} {spec:?}")))?;
  Ok((tick, rest))
}

fn build_strategy_by_kind(kind: StrategyKind, cli: &Cli) -> SimResult<Box<dyn TopologyStrategy>> {
  Ok(match kind {
    StrategyKind::Tree => Box::new(TreeStrategy::new()),
    StrategyKind::BalancedTree => Box::new(BalancedTreeStrategy::new(cli.target_links)),
    StrategyKind::DepthLimitTree => {
      Box::new(DepthLimitTreeStrategy::new(cli.max_depth, cli.max_children))
    }
    StrategyKind::Line => Box::new(LineStrategy::new()),
    StrategyKind::Ring => Box::new(RingStrategy::new()),
    StrategyKind::Star => Box::new(StarStrategy::new()),
    StrategyKind::FullyConnected => Box::new(FullyConnectedStrategy::new()),
    StrategyKind::NConnected => Box::new(NConnectedStrategy::new(cli.n)?),
    StrategyKind::Snowflake => Box::new(SnowflakeStrategy::new(
      vec![StructureType::DepthLimitTree, StructureType::BalancedTree, StructureType::Star],
      0.3,
      2,
      SubstructureFactory::default(),
    )?),
  })
}

fn run(cli: Cli) -> SimResult<()> {
  let mut props = match &cli.config {
    Some(path) => SimProps::load(path)?,
    None => SimProps::default(),
  };
  if let Some(t) = cli.sim_time {
    props.sim_time = t;
  }
  if let Some(m) = cli.num_mirrors {
    props.num_mirrors = m;
  }

  let strategy = build_strategy_by_kind(cli.strategy, &cli)?;
  let mut engine = Engine::new(props, strategy)?;

  for spec in &cli.set_mirrors {
    let (tick, count) = parse_scheduled(spec, "--set-mirrors")?;
    let count = count
      .parse::<usize>()
      .map_err(|_| SimError::Config(format!("bad count in --set-mirrors {spec:?}")))?;
    engine.set_mirrors(count, tick)?;
  }
  for spec in &cli.switch_strategy {
    let (tick, name) = parse_scheduled(spec, "--switch-strategy")?;
    let kind = StrategyKind::from_str(name, true)
      .map_err(|_| SimError::Config(format!("unknown strategy in --switch-strategy {spec:?}")))?;
    let strategy = build_strategy_by_kind(kind, &cli)?;
    engine.set_strategy(strategy, tick)?;
  }

  let mut history: Vec<(u64, usize, usize, usize, usize, usize)> = Vec::new();
  while engine.now() < engine.sim_time() {
    let t = engine.run_step();
    let mirrors = engine.mirror_probe();
    let links = engine.link_probe();
    history.push((
      t,
      mirrors.num_mirrors(),
      mirrors.num_ready_mirrors(),
      mirrors.num_target_mirrors(),
      links.num_links(),
      links.num_active_links(),
    ));
  }

  if let Some(path) = &cli.csv {
    let mut out = std::fs::File::create(path)?;
    writeln!(out, "tick,mirrors,ready_mirrors,target_mirrors,links,active_links")?;
    for (t, m, r, tm, l, al) in &history {
      writeln!(out, "{t},{m},{r},{tm},{l},{al}")?;
    }
    info!(path = %path.display(), rows = history.len(), "probe history written");
  }

  let mirrors = engine.mirror_probe();
  let links = engine.link_probe();
  info!(
    run_id = %engine.run_id(),
    strategy = engine.strategy().name(),
    mirrors = mirrors.num_mirrors(),
    ready = mirrors.num_ready_mirrors(),
    links = links.num_links(),
    target_links = links.num_target_links(),
    "run finished"
  );
  match engine.validate() {
    Ok(()) => info!("structure invariant holds"),
    Err(reason) => info!(%reason, "structure has not converged"),
  }
  Ok(())
}

fn main() {
  let cli = Cli::parse();
  let filter = match cli.verbose {
    0 => "info",
    1 => "debug",
    _ => "trace",
  };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
    .init();

  if let Err(err) = run(cli) {
    eprintln!("rdmsim: {err}");
    std::process::exit(match err {
      SimError::SchedulingOutOfRange { .. } => 2,
      _ => 1,
    });
  }
}
