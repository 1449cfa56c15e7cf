pub mod alphabeta;
pub mod engine;
pub mod eval;
pub mod history;
pub mod params;
pub mod picker;
pub mod see;
pub mod time;
pub mod tt;

pub use engine::{Engine, SearchParams, SearchResult, StopHandle};
pub use params::Tunables;
pub use time::{TimeControl, TimeManager};
pub use tt::{Bound, TranspositionTable, TtEntry};
