//! `wavefront` command-line solver.

use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use wavefront::domain::npuzzle::NPuzzle;
use wavefront::domain::plank::Plank;
use wavefront::domain::sokoban::Sokoban;
use wavefront::engine::{
    DddBfs, DddOptions, DiskBfs, DiskOptions, MemBfs, MemOptions, ParallelBfs, ParallelOptions,
};
use wavefront::report::RunReport;
use wavefront::Domain;

#[derive(Parser)]
#[command(name = "wavefront")]
#[command(about = "Exhaustive BFS over perfectly-hashed puzzle state spaces", long_about = None)]
struct Cli {
    /// Puzzle domain of the instance.
    #[arg(long, value_enum)]
    domain: DomainKind,

    /// Search engine.
    #[arg(long, value_enum, default_value_t = EngineKind::Mem)]
    engine: EngineKind,

    /// Instance file; standard input when omitted.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Worker thread count T (parallel engine).
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Visited-bitmap partition exponent m, 0 for a single block
    /// (disk and parallel engines).
    #[arg(long, default_value_t = 20)]
    block_exponent: u32,

    /// In-buffer budget in megabytes (disk and parallel engines).
    #[arg(long, default_value_t = 16)]
    in_mb: usize,

    /// Out-buffer budget in megabytes (disk and parallel engines).
    #[arg(long, default_value_t = 16)]
    out_mb: usize,

    /// DDD run-buffer budget in megabytes.
    #[arg(long, default_value_t = 64)]
    buffer_mb: usize,

    /// Treat the state graph as undirected and bipartite (DDD engine).
    #[arg(long, default_value_t = false)]
    undirected: bool,

    /// Directory for GEN-DDDD frontier files (disk and parallel engines).
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Exhaust the reachable component instead of stopping at a goal.
    #[arg(long, default_value_t = false)]
    exhaustive: bool,

    /// Emit the run report as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DomainKind {
    Sokoban,
    Plank,
    Npuzzle,
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineKind {
    Mem,
    Ddd,
    Disk,
    Parallel,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let text = match &cli.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading instance {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading instance from stdin")?;
            buf
        }
    };

    match cli.domain {
        DomainKind::Sokoban => run(&Sokoban::load(&text)?, &cli),
        DomainKind::Plank => run(&Plank::load(&text)?, &cli),
        DomainKind::Npuzzle => run(&NPuzzle::load(&text)?, &cli),
    }
}

fn run<D: Domain + Sync>(domain: &D, cli: &Cli) -> Result<()> {
    let stop_on_goal = !cli.exhaustive;
    let started = Instant::now();

    let (engine_name, outcome) = match cli.engine {
        EngineKind::Mem => (
            "mem",
            MemBfs::solve(domain, &MemOptions { stop_on_goal })?,
        ),
        EngineKind::Ddd => (
            "ddd",
            DddBfs::solve(
                domain,
                &DddOptions {
                    capacity: cli.buffer_mb << 20 >> 3,
                    undirected: cli.undirected,
                    stop_on_goal,
                },
            )?,
        ),
        EngineKind::Disk => (
            "disk",
            DiskBfs::solve(
                domain,
                &DiskOptions {
                    dir: cli.dir.clone(),
                    block_exponent: cli.block_exponent,
                    in_buffer: cli.in_mb << 20,
                    out_buffer: cli.out_mb << 20,
                    stop_on_goal,
                },
            )?,
        ),
        EngineKind::Parallel => (
            "parallel",
            ParallelBfs::solve(
                domain,
                &ParallelOptions {
                    dir: cli.dir.clone(),
                    threads: cli.threads,
                    block_exponent: cli.block_exponent,
                    in_buffer: cli.in_mb << 20,
                    out_buffer: cli.out_mb << 20,
                    stop_on_goal,
                },
            )?,
        ),
    };
    let elapsed_ms = started.elapsed().as_millis();

    let space = domain.space();
    let domain_name = match cli.domain {
        DomainKind::Sokoban => "sokoban",
        DomainKind::Plank => "plank",
        DomainKind::Npuzzle => "npuzzle",
    };
    let report = RunReport::new(
        domain_name,
        engine_name,
        space.max_rank(),
        space.state_size(),
        &outcome,
        elapsed_ms,
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &outcome.solution {
        Some(path) => {
            println!("solution in {} moves:", path.len() - 1);
            let mut cfg = domain.start();
            for (step, &rank) in path.iter().enumerate() {
                domain.decode(rank, &mut cfg)?;
                println!("step {step}:");
                print!("{}", domain.render(&cfg));
            }
        }
        None => match outcome.goal_depth {
            Some(depth) => println!("goal reached at depth {depth} (no path stored)"),
            None => println!("no solution"),
        },
    }
    println!(
        "{} states reached over {} generations in {} ms",
        report.reachable,
        report.generations.len(),
        report.elapsed_ms
    );
    Ok(())
}
