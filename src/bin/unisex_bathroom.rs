use std::ops::Range;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use groupgate::sim::{SimConfig, Simulation};
use groupgate::{BatchPolicy, Group, PerGroup};

/// Men and women sharing one bathroom, never at the same time.
#[derive(Parser, Debug)]
#[command(name = "unisex_bathroom", version)]
struct Cli {
    /// Number of men.
    men: usize,

    /// Number of women.
    women: usize,

    /// Visits per person. Runs until Ctrl-C if omitted.
    #[arg(long)]
    rounds: Option<usize>,

    /// Working time between visits, in milliseconds.
    #[arg(long, default_value = "100..500", value_parser = parse_millis)]
    think_ms: Range<Duration>,

    /// Time spent in the bathroom, in milliseconds.
    #[arg(long, default_value = "50..200", value_parser = parse_millis)]
    stay_ms: Range<Duration>,

    /// Let people keep joining their group inside even when the other group is waiting.
    #[arg(long)]
    greedy: bool,

    /// Women get the first tie instead of men.
    #[arg(long)]
    women_first: bool,
}

fn parse_millis(s: &str) -> Result<Range<Duration>, String> {
    let (lo, hi) = s
        .split_once("..")
        .ok_or_else(|| format!("expected LO..HI, got `{s}`"))?;
    let lo: u64 = lo.trim().parse().map_err(|e| format!("bad lower bound: {e}"))?;
    let hi: u64 = hi.trim().parse().map_err(|e| format!("bad upper bound: {e}"))?;
    Ok(Duration::from_millis(lo)..Duration::from_millis(hi))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SimConfig {
        members: PerGroup::new(cli.men, cli.women),
        think: cli.think_ms,
        stay: cli.stay_ms,
        rounds: cli.rounds,
        policy: if cli.greedy {
            BatchPolicy::Greedy
        } else {
            BatchPolicy::Yielding
        },
        first_turn: if cli.women_first { Group::B } else { Group::A },
        ..SimConfig::default()
    };

    let mut sim = Simulation::new(config).context("invalid parameters")?;
    let labels = sim.config().labels.clone();
    let events = sim.trace();

    // Ctrl-C lets everyone inside finish, then ends the run.
    let stop = sim.stop_handle();
    ctrlc::set_handler(move || stop.stop()).context("failed to set Ctrl-C handler")?;

    // Prints the trace. Ends when the run ends and the channel disconnects.
    let printer = thread::spawn(move || {
        for event in events {
            println!(
                "{} {} {}, inside {} (waiting {})",
                labels[event.group],
                event.member.0,
                event.action,
                event.occupancy.occupied,
                event.occupancy.waiting,
            );
        }
    });

    let report = sim.run()?;
    printer
        .join()
        .map_err(|_| anyhow::anyhow!("trace printer panicked"))?;

    println!("\n{report}");
    Ok(())
}
