use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::ModelError;
use crate::rng::Sampler;

pub const GRID_ROWS: usize = 6;
pub const GRID_COLS: usize = 5;
pub const BLOCK_COUNT: usize = GRID_ROWS * GRID_COLS;
pub const JITTER_MIN: f64 = 0.8;
pub const JITTER_MAX: f64 = 1.2;

const BLOCK_PREFIX: &str = "Block_";

/// One of the 30 blocks of the string, displayed as `Block_1..Block_30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockId(u8);

impl BlockId {
    pub fn new(number: usize) -> Result<Self, ModelError> {
        if (1..=BLOCK_COUNT).contains(&number) {
            Ok(Self(number as u8))
        } else {
            Err(ModelError::InvalidInput(format!(
                "block number {number} outside [1, {BLOCK_COUNT}]"
            )))
        }
    }

    pub fn number(self) -> usize {
        self.0 as usize
    }

    pub fn all() -> impl Iterator<Item = BlockId> {
        (1..=BLOCK_COUNT as u8).map(BlockId)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BLOCK_PREFIX}{}", self.0)
    }
}

impl FromStr for BlockId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ModelError::InvalidInput(format!("unknown block '{s}'"));
        let digits = s.trim().strip_prefix(BLOCK_PREFIX).ok_or_else(unknown)?;
        let number: usize = digits.parse().map_err(|_| unknown())?;
        BlockId::new(number).map_err(|_| unknown())
    }
}

impl TryFrom<String> for BlockId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BlockId> for String {
    fn from(value: BlockId) -> Self {
        value.to_string()
    }
}

/// Jittered block health values in a fixed 6x5 layout, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockGrid {
    rows: [[f64; GRID_COLS]; GRID_ROWS],
}

impl BlockGrid {
    pub fn rows(&self) -> &[[f64; GRID_COLS]; GRID_ROWS] {
        &self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }

    pub fn row_labels() -> Vec<String> {
        (1..=GRID_ROWS).map(|i| format!("Row {i}")).collect()
    }

    pub fn col_labels() -> Vec<String> {
        (1..=GRID_COLS).map(|i| format!("Col {i}")).collect()
    }
}

/// Draws one jitter factor per block and fills the grid row by row. Values are
/// floored at zero but not capped.
pub fn generate_grid<S: Sampler + ?Sized>(
    years: u32,
    degradation_factor: f64,
    grid_rate: f64,
    sampler: &mut S,
) -> BlockGrid {
    let mut rows = [[0.0; GRID_COLS]; GRID_ROWS];
    for index in 0..BLOCK_COUNT {
        let jitter = sampler.uniform(JITTER_MIN, JITTER_MAX);
        let health = 100.0 - years as f64 * grid_rate * degradation_factor * jitter;
        rows[index / GRID_COLS][index % GRID_COLS] = health.max(0.0);
    }
    BlockGrid { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngManager, ScriptedSampler};

    #[test]
    fn grid_has_thirty_non_negative_values() {
        let mut rng = RngManager::new(11);
        let grid = generate_grid(9, 15.4, 8.0, &mut rng.stream("grid"));
        assert_eq!(grid.values().count(), BLOCK_COUNT);
        assert!(grid.values().all(|v| v >= 0.0));
        assert!(grid.values().all(|v| v == 0.0));
    }

    #[test]
    fn jitter_bounds_hold_at_baseline() {
        let mut rng = RngManager::new(5);
        let mut stream = rng.stream("grid");
        for _ in 0..50 {
            let grid = generate_grid(1, 1.0, 8.0, &mut stream);
            for value in grid.values() {
                // 100 - 8 * [0.8, 1.2)
                assert!(value > 90.4 - 1e-9 && value <= 93.6 + 1e-9, "{value}");
            }
        }
    }

    #[test]
    fn cells_are_filled_row_major() {
        let fractions: Vec<f64> = (0..BLOCK_COUNT).map(|i| i as f64 / 29.0).collect();
        let mut sampler = ScriptedSampler::new(fractions);
        let grid = generate_grid(1, 1.0, 8.0, &mut sampler);

        let first = grid.get(0, 0).unwrap();
        let second = grid.get(0, 1).unwrap();
        let sixth = grid.get(1, 0).unwrap();
        let last = grid.get(5, 4).unwrap();
        assert!((first - (100.0 - 8.0 * 0.8)).abs() < 1e-9);
        assert!(second < first);
        assert!(sixth < grid.get(0, 4).unwrap());
        assert!((last - (100.0 - 8.0 * 1.2)).abs() < 1e-9);
        assert_eq!(grid.get(6, 0), None);
    }

    #[test]
    fn midpoint_jitter_matches_headline_formula() {
        let grid = generate_grid(2, 1.0, 8.0, &mut ScriptedSampler::midpoint());
        assert!(grid.values().all(|v| (v - 84.0).abs() < 1e-9));
    }

    #[test]
    fn block_ids_round_trip() {
        let ids: Vec<BlockId> = BlockId::all().collect();
        assert_eq!(ids.len(), 30);
        assert_eq!(ids[0].to_string(), "Block_1");
        assert_eq!(ids[29].to_string(), "Block_30");
        assert_eq!("Block_17".parse::<BlockId>().unwrap().number(), 17);
        for bad in ["Block_0", "Block_31", "block_3", "Block_x", ""] {
            assert!(bad.parse::<BlockId>().is_err(), "{bad}");
        }
    }

    #[test]
    fn block_id_serializes_as_label() {
        let id = BlockId::new(4).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"Block_4\"");
        let back: BlockId = serde_json::from_str("\"Block_4\"").unwrap();
        assert_eq!(back, id);
    }
}
