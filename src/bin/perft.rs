use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use piecore::board::Position;
use piecore::perft::{perft, perft_divide, perft_parallel};

#[derive(Parser, Debug)]
#[command(name = "perft", about = "Perft driver for PieCore move generation")]
struct Args {
    /// Search depth
    #[arg(value_name = "DEPTH")]
    depth: u32,
    /// FEN string or "startpos"
    #[arg(value_name = "FEN", default_value = "startpos")]
    fen: String,
    /// Number of threads for root-split
    #[arg(long, default_value_t = 1)]
    threads: usize,
    /// Print the node count below each root move
    #[arg(long, default_value_t = false)]
    divide: bool,
    /// Report elapsed time and NPS
    #[arg(long, default_value_t = false)]
    nps: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut pos = if args.fen == "startpos" {
        Position::startpos()
    } else {
        Position::from_fen(&args.fen).with_context(|| format!("invalid FEN {:?}", args.fen))?
    };

    if args.divide {
        let t0 = Instant::now();
        let counts = perft_divide(&mut pos, args.depth);
        let total: u64 = counts.iter().map(|(_, n)| n).sum();
        for (mv, n) in &counts {
            println!("{mv}: {n}");
        }
        println!();
        println!("moves: {} nodes: {total} elapsed: {:.3}s", counts.len(), t0.elapsed().as_secs_f64());
        return Ok(());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.max(1))
        .build()
        .context("failed to build thread pool")?;
    let (nodes, dt) = pool.install(|| {
        let t0 = Instant::now();
        let nodes = if args.threads <= 1 { perft(&mut pos, args.depth) } else { perft_parallel(&pos, args.depth) };
        (nodes, t0.elapsed().as_secs_f64())
    });

    if args.nps {
        println!("nodes: {nodes} elapsed: {:.3}s nps: {:.1}", dt, nodes as f64 / dt.max(f64::EPSILON));
    } else {
        println!("nodes: {nodes}");
    }
    Ok(())
}
