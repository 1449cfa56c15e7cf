use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use piecore::board::Position;
use piecore::config::EngineConfig;
use piecore::eval::PstEval;
use piecore::search::{Engine, SearchParams};

const BENCH_FENS: &[&str] = &[
    Position::STARTPOS_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1",
];

#[derive(Parser, Debug)]
#[command(name = "piecore-bench", version, about = "Benchmark PieCore search NPS over a fixed position set")]
struct Args {
    /// FEN string, 'startpos', or 'suite' for the built-in position list
    #[arg(long, default_value = "suite")]
    fen: String,

    /// Threads
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Movetime in milliseconds per position (ignored if depth is set)
    #[arg(long, default_value_t = 1000)]
    movetime: u64,

    /// Fixed search depth (overrides movetime when > 0)
    #[arg(long, default_value_t = 0)]
    depth: u32,

    /// Transposition table size in MB
    #[arg(long, default_value_t = 64)]
    hash_mb: usize,

    /// JSON engine config; command line threads/hash override it
    #[arg(long)]
    config: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match args.config.as_deref() {
        Some(path) => EngineConfig::from_json_file(path).with_context(|| format!("failed to load config {path}"))?,
        None => EngineConfig::default(),
    };
    config.threads = args.threads.max(1);
    config.hash_mb = args.hash_mb.max(1);

    let fens: Vec<String> = match args.fen.as_str() {
        "suite" => BENCH_FENS.iter().map(|f| f.to_string()).collect(),
        "startpos" => vec![Position::STARTPOS_FEN.to_string()],
        fen => vec![fen.to_string()],
    };

    let mut engine = Engine::new(PstEval::new(), config).context("failed to create engine")?;
    let params = if args.depth > 0 {
        SearchParams::depth(args.depth)
    } else {
        SearchParams::movetime(Duration::from_millis(args.movetime))
    };

    let t0 = Instant::now();
    let mut total_nodes = 0u64;
    for fen in &fens {
        let pos = Position::from_fen(fen).with_context(|| format!("invalid FEN {fen:?}"))?;
        engine.new_game();
        let res = engine.search(&pos, params);
        total_nodes += res.nodes;
        let secs = res.elapsed.as_secs_f64();
        println!(
            "bestmove={} score_cp={} depth={} nodes={} elapsed={:.3}s nps={:.1}",
            res.bestmove.map_or_else(|| "(none)".to_string(), |m| m.to_string()),
            res.score_cp,
            res.depth,
            res.nodes,
            secs,
            if secs > 0.0 { res.nodes as f64 / secs } else { 0.0 }
        );
    }
    let dt = t0.elapsed().as_secs_f64();
    println!("total nodes={} elapsed={:.3}s nps={:.1}", total_nodes, dt, total_nodes as f64 / dt.max(f64::EPSILON));
    Ok(())
}
