//! 负载感知选路控制器仿真
//!
//! 加载 scenario.json（缺省时使用内置的 diamond 拓扑），用仿真交换机驱动控制器运行。

use clap::Parser;
use sdnlb_rs::emu::bootstrap;
use sdnlb_rs::sim::{ScenarioSpec, SimTime, Simulator};
use sdnlb_rs::topo::diamond::{DiamondOpts, build_diamond};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "controller-sim",
    about = "Run the load-aware path controller against emulated switches"
)]
struct Args {
    /// Path to scenario.json; defaults to the built-in diamond topology
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Run until this time (ms)
    #[arg(long, default_value_t = 30_000)]
    until_ms: u64,

    /// Write every path decision as a JSON array to this file
    #[arg(long)]
    decisions_json: Option<PathBuf>,

    /// diamond 拓扑：s4 -> s6 背景负载（bytes/s）
    #[arg(long, default_value_t = 1_000_000)]
    upper_load: u64,

    /// diamond 拓扑：s5 -> s6 背景负载（bytes/s）
    #[arg(long, default_value_t = 0)]
    lower_load: u64,
}

fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let spec = match &args.scenario {
        Some(path) => match ScenarioSpec::load(path) {
            Ok(spec) => spec,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(2);
            }
        },
        None => build_diamond(&DiamondOpts {
            upper_load: args.upper_load,
            lower_load: args.lower_load,
            ..DiamondOpts::default()
        }),
    };

    let mut sim = Simulator::default();
    let mut world = match bootstrap(&spec, &mut sim) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    if args.decisions_json.is_some() {
        world.ctl.enable_decision_log();
    }

    sim.run_until(SimTime::from_millis(args.until_ms), &mut world);

    if let Some(log) = world.ctl.decisions() {
        for d in &log.records {
            println!(
                "decision seq={} src={} dst={} path={:?} cost={:.1} mean_rejected={} candidates={}",
                d.seq,
                d.src,
                d.dst,
                d.path.iter().map(|n| n.0).collect::<Vec<_>>(),
                d.cost,
                d.mean_rejected
                    .map_or_else(|| "n/a".to_string(), |m| format!("{m:.1}")),
                d.candidates
            );
        }
        if let Some(path) = &args.decisions_json {
            let raw = match log.to_json() {
                Ok(raw) => raw,
                Err(e) => {
                    eprintln!("error: serialize decisions: {e}");
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = fs::write(path, raw) {
                eprintln!("error: write {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    let s = &world.ctl.stats;
    println!(
        "done @ {}, packet_ins={}, arp_replies={}, flows_routed={}, unreachable={}, rules_sent={}, stats_replies={}, dataplane_hits={}",
        sim.now(),
        s.packet_ins,
        s.arp_replies,
        s.flows_routed,
        s.unreachable,
        s.rules_sent,
        s.stats_replies,
        world.fabric.stats.dataplane_hits
    );
    ExitCode::SUCCESS
}
