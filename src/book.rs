//! Opening book keyed by position hash, built from named lines in UCI notation.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Mutex;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::board::{Move, Position};
use crate::error::BookError;

/// Consulted once at the search entry point, before any tree search.
pub trait OpeningBook: Send + Sync {
    fn has_move(&self, hash: u64) -> bool;
    fn get_move(&self, hash: u64) -> Option<Move>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningLine {
    pub name: String,
    pub moves: Vec<String>,
}

impl OpeningLine {
    pub fn new(name: &str, moves: &str) -> Self {
        Self { name: name.to_string(), moves: moves.split_whitespace().map(String::from).collect() }
    }
}

const BUILTIN: &[(&str, &str)] = &[
    ("Italian Game", "e2e4 e7e5 g1f3 b8c6 f1c4 f8c5 e1g1 g8f6"),
    ("Ruy Lopez", "e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4 g8f6"),
    ("Scotch Game", "e2e4 e7e5 g1f3 b8c6 d2d4 e5d4 f3d4 f8c5"),
    ("Sicilian Defense, Dragon", "e2e4 c7c5 g1f3 d7d6 d2d4 c5d4 f3d4 g8f6"),
    ("French Defense", "e2e4 e7e6 d2d4 d7d5 b1c3 f8b4 e4e5 c7c5"),
    ("Caro-Kann Defense", "e2e4 c7c6 d2d4 d7d5 b1c3 d5e4 c3e4 c8f5"),
    ("Scandinavian Defense", "e2e4 d7d5 e4d5 d8d5 b1c3 d5a5 d2d4 g8f6"),
    ("Queen's Gambit Declined", "d2d4 d7d5 c2c4 e7e6 b1c3 g8f6 c1g5 f8e7"),
    ("Nimzo-Indian Defense", "d2d4 g8f6 c2c4 e7e6 b1c3 f8b4 e2e3 e8g8"),
    ("King's Indian Defense", "d2d4 g8f6 c2c4 g7g6 b1c3 f8g7 e2e4 d7d6"),
    ("Catalan Opening", "d2d4 g8f6 c2c4 e7e6 g2g3 d7d5 f1g2 f8e7"),
    ("London System", "d2d4 d7d5 g1f3 g8f6 c1f4 c7c5 e2e3 b8c6"),
    ("English Opening", "c2c4 e7e5 b1c3 g8f6 g2g3 d7d5 c4d5 f6d5"),
];

pub fn builtin_lines() -> Vec<OpeningLine> {
    BUILTIN.iter().map(|(name, moves)| OpeningLine::new(name, moves)).collect()
}

/// Book of move candidates per position, weighted by how many lines pass through.
pub struct LineBook {
    entries: HashMap<u64, Vec<(Move, u32)>>,
    rng: Mutex<SmallRng>,
}

impl LineBook {
    pub fn from_lines(lines: &[OpeningLine]) -> Result<Self, BookError> {
        let mut entries: HashMap<u64, Vec<(Move, u32)>> = HashMap::new();
        for line in lines {
            let mut pos = Position::startpos();
            for text in &line.moves {
                let mv = pos
                    .parse_move(text)
                    .map_err(|source| BookError::Line { line: line.name.clone(), source })?;
                let candidates = entries.entry(pos.hash()).or_default();
                match candidates.iter_mut().find(|(m, _)| *m == mv) {
                    Some((_, weight)) => *weight += 1,
                    None => candidates.push((mv, 1)),
                }
                pos.make_move(mv);
            }
        }
        Ok(Self { entries, rng: Mutex::new(SmallRng::from_entropy()) })
    }

    pub fn builtin() -> Result<Self, BookError> { Self::from_lines(&builtin_lines()) }

    /// Reads a JSON array of `{ "name": ..., "moves": [...] }` objects.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, BookError> {
        let reader = BufReader::new(File::open(path)?);
        let lines: Vec<OpeningLine> = serde_json::from_reader(reader)?;
        Self::from_lines(&lines)
    }

    /// Fixes the random choice between candidates, for reproducible games.
    pub fn with_seed(self, seed: u64) -> Self {
        Self { rng: Mutex::new(SmallRng::seed_from_u64(seed)), ..self }
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn candidates(&self, hash: u64) -> &[(Move, u32)] {
        self.entries.get(&hash).map_or(&[], |v| v.as_slice())
    }
}

impl OpeningBook for LineBook {
    fn has_move(&self, hash: u64) -> bool { self.entries.contains_key(&hash) }

    fn get_move(&self, hash: u64) -> Option<Move> {
        let candidates = self.entries.get(&hash)?;
        let total: u32 = candidates.iter().map(|(_, w)| w).sum();
        let mut pick = match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..total),
            Err(_) => 0,
        };
        for &(mv, weight) in candidates {
            if pick < weight { return Some(mv); }
            pick -= weight;
        }
        candidates.first().map(|&(mv, _)| mv)
    }
}
