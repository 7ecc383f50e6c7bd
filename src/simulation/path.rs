//! Road path geometry
//!
//! A path is an ordered sequence of distinct grid cells. The cell-to-index
//! lookup is built once at construction so advancement never scans the
//! sequence.

use anyhow::{bail, Result};
use std::collections::HashMap;

use super::types::Cell;

/// An ordered, fixed sequence of grid cells plus a position-to-index lookup
#[derive(Debug, Clone)]
pub struct RoadPath {
    cells: Vec<Cell>,
    index: HashMap<Cell, usize>,
}

impl RoadPath {
    /// Build a path from a cell sequence
    ///
    /// Rejects empty sequences and duplicate cells at configuration time;
    /// a path that revisits a cell would make index lookup ambiguous.
    pub fn new(cells: Vec<Cell>) -> Result<Self> {
        if cells.is_empty() {
            bail!("road path must contain at least one cell");
        }

        let mut index = HashMap::with_capacity(cells.len());
        for (i, &cell) in cells.iter().enumerate() {
            if index.insert(cell, i).is_some() {
                bail!("road path revisits cell ({}, {})", cell.x, cell.y);
            }
        }

        Ok(Self { cells, index })
    }

    /// Index of a cell within the path
    ///
    /// Panics if the cell is not a member. Every vehicle position is placed
    /// from this path, so a miss is a contract violation; failing silently
    /// here would corrupt all subsequent advancement math.
    pub fn index_of(&self, cell: Cell) -> usize {
        match self.index.get(&cell) {
            Some(&i) => i,
            None => panic!(
                "cell ({}, {}) is not a member of this road path",
                cell.x, cell.y
            ),
        }
    }

    /// Cell at the given index, if within bounds
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.index.contains_key(&cell)
    }

    /// First cell of the path, where vehicles are placed
    pub fn start(&self) -> Cell {
        self.cells[0]
    }

    /// Last cell of the path, where vehicles are removed
    pub fn end(&self) -> Cell {
        self.cells[self.cells.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Index of the final cell
    pub fn last_index(&self) -> usize {
        self.cells.len() - 1
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}
