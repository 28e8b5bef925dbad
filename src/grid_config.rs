//! This module implements the grid model for a fill operation: which cells are writable, the slots
//! (maximal runs of writable cells) derived from them, and the overlap constraints between slots
//! that share a cell. It's independent of the word list and of the fill algorithm, and it never
//! changes once built.

use std::collections::HashMap;
use std::fmt::Debug;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::backtracking_search::Assignment;
use crate::error::{Error, Result};
use crate::types::{GridCoord, SlotId};
use crate::word_list::WordList;

/// Character used for writable cells in a structure file; anything else is a block.
pub const WRITABLE_CELL: char = '_';

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Across,
    Down,
}

/// A struct identifying a specific slot in the grid. Slots compare and hash by value, so two
/// `Slot`s built independently from the same coordinates are interchangeable as map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub row: usize,
    pub col: usize,
    pub length: usize,
    pub direction: Direction,
}

impl Slot {
    /// The coords of the cell at the given offset within this slot.
    #[must_use]
    pub fn cell(&self, cell_idx: usize) -> GridCoord {
        match self.direction {
            Direction::Across => (self.row, self.col + cell_idx),
            Direction::Down => (self.row + cell_idx, self.col),
        }
    }

    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length).map(|cell_idx| self.cell(cell_idx)).collect()
    }

    /// Parse a string like "1,2,down,5" into a `Slot`.
    pub fn from_key(key: &str) -> std::result::Result<Slot, String> {
        let key_parts: Vec<&str> = key.split(',').collect();
        if key_parts.len() != 4 {
            return Err(format!("invalid slot key: {key}"));
        }

        let row: std::result::Result<usize, _> = key_parts[0].parse();
        let col: std::result::Result<usize, _> = key_parts[1].parse();
        let direction: Option<Direction> = match key_parts[2] {
            "across" => Some(Direction::Across),
            "down" => Some(Direction::Down),
            _ => None,
        };
        let length: std::result::Result<usize, _> = key_parts[3].parse();

        if let (Ok(row), Ok(col), Some(direction), Ok(length)) = (row, col, direction, length) {
            Ok(Slot {
                row,
                col,
                length,
                direction,
            })
        } else {
            Err(format!("invalid slot key: {key:?}"))
        }
    }

    /// Represent this slot as a string like "1,2,down,5".
    #[must_use]
    pub fn to_key(&self) -> String {
        let direction = match self.direction {
            Direction::Across => "across",
            Direction::Down => "down",
        };
        format!("{},{},{},{}", self.row, self.col, direction, self.length)
    }
}

/// Serialize a `Slot` into a string key.
#[cfg(feature = "serde")]
impl Serialize for Slot {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_key())
    }
}

/// Deserialize a `Slot` from a string key.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_string = String::deserialize(deserializer)?;
        Slot::from_key(&raw_string).map_err(serde::de::Error::custom)
    }
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub slot: Slot,

    /// For each cell of the slot, the crossing slot sharing that cell, if any.
    pub crossings: Vec<Option<Crossing>>,

    /// Every other slot sharing at least one cell with this one, in cell order.
    pub neighbors: Vec<SlotId>,
}

/// The immutable description of a puzzle: the activity matrix, the slots derived from it, and the
/// overlap relation between slots.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// `structure[row][col]` is true for writable cells.
    pub structure: Vec<Vec<bool>>,

    pub width: usize,
    pub height: usize,

    /// Config representing all of the slots in the grid and their crossings. A `SlotId` is an
    /// index into this list.
    pub slot_configs: Vec<SlotConfig>,

    /// For each ordered pair of overlapping slots `(x, y)`, the offsets `(ix, iy)` of the shared
    /// cell within `x` and `y` respectively.
    overlaps: HashMap<(SlotId, SlotId), (usize, usize)>,

    slot_id_by_slot: HashMap<Slot, SlotId>,
}

impl GridConfig {
    /// Build a grid model from a rectangular activity matrix.
    pub fn from_structure(structure: Vec<Vec<bool>>) -> Result<GridConfig> {
        let height = structure.len();
        let width = structure.first().map_or(0, Vec::len);

        if height == 0 || width == 0 {
            return Err(Error::MalformedInput(
                "grid must have at least one row and one column".into(),
            ));
        }
        if let Some(row) = structure.iter().position(|line| line.len() != width) {
            return Err(Error::MalformedInput(format!(
                "row {row} has {} cells, expected {width}",
                structure[row].len()
            )));
        }

        let slots = generate_slots_from_structure(&structure);
        let slot_configs = generate_slot_configs(&slots);

        let mut overlaps = HashMap::new();
        for slot_config in &slot_configs {
            for (cell_idx, crossing) in slot_config.crossings.iter().enumerate() {
                if let Some(crossing) = crossing {
                    overlaps.insert(
                        (slot_config.id, crossing.other_slot_id),
                        (cell_idx, crossing.other_slot_cell),
                    );
                }
            }
        }

        let slot_id_by_slot = slot_configs
            .iter()
            .map(|slot_config| (slot_config.slot, slot_config.id))
            .collect();

        Ok(GridConfig {
            structure,
            width,
            height,
            slot_configs,
            overlaps,
            slot_id_by_slot,
        })
    }

    /// Build a grid model from the text of a structure file.
    pub fn from_structure_string(template: &str) -> Result<GridConfig> {
        GridConfig::from_structure(parse_structure(template)?)
    }

    /// The grid's `(height, width)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Is the given cell writable? Cells outside the grid aren't.
    #[must_use]
    pub fn is_active(&self, row: usize, col: usize) -> bool {
        self.structure
            .get(row)
            .and_then(|line| line.get(col))
            .copied()
            .unwrap_or(false)
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    /// All slots, in `SlotId` order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.slot_configs.iter().map(|slot_config| &slot_config.slot)
    }

    #[must_use]
    pub fn slot(&self, slot_id: SlotId) -> &Slot {
        &self.slot_configs[slot_id].slot
    }

    /// Look up the id of a slot by value.
    #[must_use]
    pub fn slot_id(&self, slot: &Slot) -> Option<SlotId> {
        self.slot_id_by_slot.get(slot).copied()
    }

    /// The offsets of the cell shared by `x` and `y`, as `(offset in x, offset in y)`, or `None` if
    /// they don't cross.
    #[must_use]
    pub fn overlap(&self, x: SlotId, y: SlotId) -> Option<(usize, usize)> {
        self.overlaps.get(&(x, y)).copied()
    }

    /// Same as `overlap`, but addressed by slot value.
    #[must_use]
    pub fn overlap_between(&self, x: &Slot, y: &Slot) -> Option<(usize, usize)> {
        self.overlap(self.slot_id(x)?, self.slot_id(y)?)
    }

    /// Every slot sharing a cell with `slot_id`, excluding itself.
    #[must_use]
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.slot_configs[slot_id].neighbors
    }

    /// The number of neighbors a slot has, used to break ties when choosing which slot to fill.
    #[must_use]
    pub fn degree(&self, slot_id: SlotId) -> usize {
        self.slot_configs[slot_id].neighbors.len()
    }

    /// Every ordered pair of slots with a defined overlap, in slot order.
    #[must_use]
    pub fn arcs(&self) -> Vec<(SlotId, SlotId)> {
        self.slot_configs
            .iter()
            .flat_map(|slot_config| {
                slot_config
                    .neighbors
                    .iter()
                    .map(move |&other_slot_id| (slot_config.id, other_slot_id))
            })
            .collect()
    }
}

/// Parse the text of a structure file into an activity matrix: one line per row, with
/// `WRITABLE_CELL` marking writable cells and any other character marking a block. Rows shorter
/// than the widest row are padded with blocks.
pub fn parse_structure(template: &str) -> Result<Vec<Vec<bool>>> {
    let lines: Vec<Vec<char>> = template
        .lines()
        .map(|line| line.trim_end_matches('\r').chars().collect())
        .collect();

    // Ignore trailing blank lines, but keep interior ones since they're legitimate all-block rows.
    let height = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(0, |last| last + 1);
    let width = lines.iter().map(Vec::len).max().unwrap_or(0);

    if height == 0 || width == 0 {
        return Err(Error::MalformedInput("structure is empty".into()));
    }

    Ok(lines[..height]
        .iter()
        .map(|line| {
            (0..width)
                .map(|col| line.get(col) == Some(&WRITABLE_CELL))
                .collect()
        })
        .collect())
}

/// Find every maximal run of at least two writable cells, first scanning rows (across) and then
/// columns (down).
#[must_use]
pub fn generate_slots_from_structure(structure: &[Vec<bool>]) -> Vec<Slot> {
    fn build_runs(lines: impl Iterator<Item = Vec<bool>>) -> Vec<(usize, usize, usize)> {
        let mut result = vec![];

        for (line_idx, line) in lines.enumerate() {
            let mut run_start: Option<usize> = None;

            for (idx, &active) in line.iter().chain(std::iter::once(&false)).enumerate() {
                match (active, run_start) {
                    (true, None) => run_start = Some(idx),
                    (false, Some(start)) => {
                        if idx - start > 1 {
                            result.push((line_idx, start, idx - start));
                        }
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }

        result
    }

    let height = structure.len();
    let width = structure.first().map_or(0, Vec::len);

    let mut slots: Vec<Slot> = build_runs(structure.iter().cloned())
        .into_iter()
        .map(|(row, col, length)| Slot {
            row,
            col,
            length,
            direction: Direction::Across,
        })
        .collect();

    let columns = (0..width).map(|col| {
        (0..height)
            .map(|row| structure[row][col])
            .collect::<Vec<bool>>()
    });
    slots.extend(
        build_runs(columns)
            .into_iter()
            .map(|(col, row, length)| Slot {
                row,
                col,
                length,
                direction: Direction::Down,
            }),
    );

    slots
}

/// Given the slots in a grid, generate `SlotConfig`s containing derived information about
/// crossings and neighbors.
#[must_use]
pub fn generate_slot_configs(slots: &[Slot]) -> Vec<SlotConfig> {
    // Build a map from cell location to (slot index, cell index within slot), which we can then
    // use to calculate crossings.
    let mut entries_by_loc: HashMap<GridCoord, Vec<(SlotId, usize)>> = HashMap::new();

    for (slot_id, slot) in slots.iter().enumerate() {
        for (cell_idx, loc) in slot.cell_coords().into_iter().enumerate() {
            entries_by_loc.entry(loc).or_default().push((slot_id, cell_idx));
        }
    }

    slots
        .iter()
        .enumerate()
        .map(|(slot_id, &slot)| {
            let crossings: Vec<Option<Crossing>> = slot
                .cell_coords()
                .iter()
                .map(|loc| {
                    entries_by_loc[loc]
                        .iter()
                        .find(|&&(other_slot_id, _)| other_slot_id != slot_id)
                        .map(|&(other_slot_id, other_slot_cell)| Crossing {
                            other_slot_id,
                            other_slot_cell,
                        })
                })
                .collect();

            let mut neighbors: Vec<SlotId> = vec![];
            for crossing in crossings.iter().flatten() {
                if !neighbors.contains(&crossing.other_slot_id) {
                    neighbors.push(crossing.other_slot_id);
                }
            }

            SlotConfig {
                id: slot_id,
                slot,
                crossings,
                neighbors,
            }
        })
        .collect()
}

/// Project a (possibly partial) assignment onto the grid: each cell covered by an assigned slot
/// gets the corresponding character of that slot's word, and every other cell is `None`.
#[must_use]
pub fn letter_grid(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
) -> Vec<Vec<Option<char>>> {
    let mut letters: Vec<Vec<Option<char>>> = vec![vec![None; config.width]; config.height];

    for (slot_id, word_id) in assignment.iter() {
        let slot = config.slot(slot_id);
        let word = word_list.word(slot.length, word_id);

        for (cell_idx, &glyph) in word.glyphs.iter().enumerate() {
            let (row, col) = slot.cell(cell_idx);
            letters[row][col] = Some(word_list.glyphs[glyph]);
        }
    }

    letters
}

/// Turn the given assignment into a printable grid, with blocks drawn as `█` and unfilled cells
/// left blank.
#[must_use]
pub fn render_grid(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> String {
    let letters = letter_grid(config, word_list, assignment);

    letters
        .iter()
        .enumerate()
        .map(|(row, line)| {
            line.iter()
                .enumerate()
                .map(|(col, cell)| {
                    if config.is_active(row, col) {
                        cell.unwrap_or(' ')
                    } else {
                        '█'
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
