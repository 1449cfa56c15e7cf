use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use super::eval::MAX_PLY;

/// Bounds and step of one tunable, as exposed to an external tuner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: i32,
    pub min: i32,
    pub max: i32,
    pub step: i32,
}

macro_rules! tunables {
    ($($name:ident: $default:expr, $min:expr, $max:expr, $step:expr;)*) => {
        /// Named search parameters, adjustable at runtime.
        #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct Tunables {
            $(pub $name: i32,)*
        }

        impl Default for Tunables {
            fn default() -> Self { Self { $($name: $default,)* } }
        }

        impl Tunables {
            pub fn specs() -> &'static [ParamSpec] {
                const SPECS: &[ParamSpec] = &[
                    $(ParamSpec { name: stringify!($name), default: $default, min: $min, max: $max, step: $step },)*
                ];
                SPECS
            }

            pub fn get(&self, name: &str) -> Option<i32> {
                match name {
                    $(stringify!($name) => Some(self.$name),)*
                    _ => None,
                }
            }

            pub fn set(&mut self, name: &str, value: i32) -> Result<(), ConfigError> {
                let spec = Self::spec(name)?;
                Self::check(spec, value)?;
                match name {
                    $(stringify!($name) => self.$name = value,)*
                    _ => return Err(ConfigError::UnknownParameter(name.to_string())),
                }
                Ok(())
            }

            /// Range check for a whole set, e.g. after deserializing one.
            pub fn validate(&self) -> Result<(), ConfigError> {
                $(Self::check(Self::spec(stringify!($name))?, self.$name)?;)*
                Ok(())
            }
        }
    };
}

tunables! {
    rfp_depth: 8, 1, 16, 1;
    rfp_margin: 80, 20, 200, 10;
    rfp_improving: 60, 0, 150, 10;
    nmp_min_depth: 3, 1, 8, 1;
    nmp_base: 3, 1, 6, 1;
    nmp_divisor: 4, 2, 8, 1;
    nmp_eval_divisor: 200, 50, 400, 25;
    lmp_depth: 8, 1, 16, 1;
    lmp_base: 3, 0, 10, 1;
    fut_depth: 6, 1, 12, 1;
    fut_base: 60, 0, 200, 10;
    fut_margin: 90, 20, 200, 10;
    see_quiet_depth: 8, 1, 12, 1;
    see_quiet_margin: 60, 10, 150, 10;
    see_capture_margin: 90, 20, 200, 10;
    lmr_base: 75, 0, 200, 5;
    lmr_divisor: 225, 100, 400, 10;
    lmr_min_depth: 3, 1, 6, 1;
    lmr_min_moves: 3, 1, 8, 1;
    iir_depth: 4, 2, 10, 1;
    asp_window: 25, 5, 100, 5;
    asp_min_depth: 5, 1, 10, 1;
    delta_margin: 200, 50, 500, 25;
    qs_see_depth: 2, 0, 8, 1;
    qs_checks: 1, 0, 1, 1;
    hist_bonus_mul: 170, 50, 400, 10;
    hist_bonus_offset: 50, 0, 200, 10;
    hist_bonus_max: 1600, 400, 4000, 100;
    tm_soft_pct: 70, 30, 150, 5;
    tm_hard_pct: 300, 100, 600, 25;
}

impl Tunables {
    fn spec(name: &str) -> Result<&'static ParamSpec, ConfigError> {
        Self::specs()
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ConfigError::UnknownParameter(name.to_string()))
    }

    fn check(spec: &ParamSpec, value: i32) -> Result<(), ConfigError> {
        if value < spec.min || value > spec.max {
            return Err(ConfigError::OutOfRange { name: spec.name.to_string(), value, min: spec.min, max: spec.max });
        }
        Ok(())
    }
}

/// Late-move reductions indexed by `[depth][move number]`.
#[derive(Clone, Debug)]
pub struct LmrTable {
    table: Vec<[i32; 64]>,
}

impl LmrTable {
    pub fn new(params: &Tunables) -> Self {
        let base = params.lmr_base as f64 / 100.0;
        let divisor = params.lmr_divisor as f64 / 100.0;
        let mut table = vec![[0i32; 64]; MAX_PLY + 1];
        for (depth, row) in table.iter_mut().enumerate().skip(1) {
            for (played, r) in row.iter_mut().enumerate().skip(1) {
                *r = (base + (depth as f64).ln() * (played as f64).ln() / divisor) as i32;
            }
        }
        Self { table }
    }

    #[inline]
    pub fn get(&self, depth: i32, played: usize) -> i32 {
        let d = (depth.max(0) as usize).min(MAX_PLY);
        self.table[d][played.min(63)]
    }
}
