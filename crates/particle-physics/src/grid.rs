//! Uniform broad-phase grid
//!
//! Cells are 1×1 world units indexed column-major (`cx * rows + cy`). The
//! contents are rebuilt from scratch every substep with a counting sort: a
//! prefix table `cell_start` plus one flat `entries` array holding particle
//! indices grouped by cell, ascending within a cell. Cells are therefore
//! unbounded without allocating per rebuild once the buffers have grown.
//! A bounded policy is available to mirror the fixed-slot device layout.

use std::ops::Range;

use glam::Vec2;
use rayon::prelude::*;

use crate::constants::CELL_SIZE;
use crate::error::{Error, Result};
use crate::store::ParticleStore;

/// How many particles a single cell may hold per rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellCapacity {
    /// Every particle is kept
    #[default]
    Unbounded,
    /// Particles beyond this count (by ascending index) are left out of the
    /// cell for the current substep
    Bounded(usize),
}

/// Forward half of the 8-neighbourhood: the cells whose column-major index is
/// larger than the centre cell.
const FORWARD_OFFSETS: [(isize, isize); 4] = [(0, 1), (1, -1), (1, 0), (1, 1)];

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    columns: usize,
    rows: usize,
    capacity: CellCapacity,
    /// `cell_start[c]..cell_start[c + 1]` is the entry range of cell `c`
    cell_start: Vec<u32>,
    entries: Vec<u32>,
    cell_of: Vec<u32>,
    cursor: Vec<u32>,
    dropped: usize,
}

impl SpatialGrid {
    /// Allocate `ceil(width) × ceil(height)` empty cells.
    ///
    /// Errors:
    /// - `Error::InvalidDimension` if either side is non-positive or not finite,
    ///   or the cell count does not fit a `u32` index.
    pub fn new(width: f32, height: f32) -> Result<Self> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let invalid = || Error::InvalidDimension { width, height };
        let (columns, rows) = ((width / CELL_SIZE).ceil(), (height / CELL_SIZE).ceil());
        // Cell and entry indices are stored as u32.
        if columns >= u32::MAX as f32 || rows >= u32::MAX as f32 {
            return Err(invalid());
        }
        let (columns, rows) = (columns as usize, rows as usize);
        let cells = columns
            .checked_mul(rows)
            .filter(|&cells| cells < u32::MAX as usize)
            .ok_or_else(invalid)?;

        log::debug!("Spatial grid: {columns}x{rows} cells");

        Ok(Self {
            columns,
            rows,
            capacity: CellCapacity::Unbounded,
            cell_start: vec![0; cells + 1],
            entries: Vec::new(),
            cell_of: Vec::new(),
            cursor: vec![0; cells],
            dropped: 0,
        })
    }

    pub fn with_capacity_policy(mut self, capacity: CellCapacity) -> Self {
        self.capacity = capacity;
        self
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.columns * self.rows
    }

    pub fn capacity(&self) -> CellCapacity {
        self.capacity
    }

    /// Particles left out by the bounded policy during the last rebuild
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Cell coordinates of `position`, clamped into the grid.
    ///
    /// Positions on the upper boundary (and anything beyond) land in the last
    /// column/row.
    #[inline]
    pub fn cell_coords(&self, position: Vec2) -> (usize, usize) {
        cell_coords(self.columns, self.rows, position)
    }

    #[inline]
    pub fn cell_index(&self, position: Vec2) -> usize {
        let (cx, cy) = self.cell_coords(position);
        cx * self.rows + cy
    }

    /// Particle indices in cell `index`; empty when out of range.
    pub fn cell_at(&self, index: usize) -> &[u32] {
        if index >= self.cell_count() {
            return &[];
        }
        &self.entries[self.cell_range(index)]
    }

    /// Range of `entries` belonging to cell `index`.
    #[inline]
    pub fn cell_range(&self, index: usize) -> Range<usize> {
        self.cell_start[index] as usize..self.cell_start[index + 1] as usize
    }

    /// Range of `entries` covering every cell of the given column block.
    pub fn column_span(&self, columns: Range<usize>) -> Range<usize> {
        let first = columns.start.min(self.columns) * self.rows;
        let last = columns.end.min(self.columns) * self.rows;
        self.cell_start[first] as usize..self.cell_start[last] as usize
    }

    /// All particle indices, grouped by cell in index order
    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    /// The 3×3 block centred on cell `index` (itself included), cut at the
    /// grid edges.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let valid = index < self.cell_count();
        let (cx, cy) = if valid {
            (index / self.rows, index % self.rows)
        } else {
            (0, 0)
        };
        (-1isize..=1)
            .flat_map(|dx| (-1isize..=1).map(move |dy| (dx, dy)))
            .filter(move |_| valid)
            .filter_map(move |(dx, dy)| self.offset_cell(cx, cy, dx, dy))
    }

    /// Cells of the forward half stencil around `(cx, cy)`.
    pub fn forward_neighbors(&self, cx: usize, cy: usize) -> impl Iterator<Item = usize> + '_ {
        FORWARD_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| self.offset_cell(cx, cy, dx, dy))
    }

    #[inline]
    fn offset_cell(&self, cx: usize, cy: usize, dx: isize, dy: isize) -> Option<usize> {
        let nx = cx.checked_add_signed(dx).filter(|&x| x < self.columns)?;
        let ny = cy.checked_add_signed(dy).filter(|&y| y < self.rows)?;
        Some(nx * self.rows + ny)
    }

    /// Re-bin every particle of `store` by its current position.
    ///
    /// Returns the number of particles dropped by a bounded policy.
    pub fn rebuild<S: ParticleStore>(&mut self, store: &S) -> usize {
        let count = store.len();
        let cells = self.cell_count();
        let (columns, rows) = (self.columns, self.rows);

        self.cell_of.resize(count, 0);
        self.cell_of
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, cell)| {
                let (cx, cy) = cell_coords(columns, rows, store.position(index));
                *cell = (cx * rows + cy) as u32;
            });

        let limit = match self.capacity {
            CellCapacity::Unbounded => u32::MAX,
            CellCapacity::Bounded(capacity) => capacity.min(u32::MAX as usize) as u32,
        };

        // Histogram shifted by one so the prefix sum yields start offsets.
        self.cell_start.fill(0);
        for &cell in &self.cell_of {
            let slot = &mut self.cell_start[cell as usize + 1];
            if *slot < limit {
                *slot += 1;
            }
        }
        for c in 0..cells {
            self.cell_start[c + 1] += self.cell_start[c];
        }

        let kept = self.cell_start[cells] as usize;
        self.entries.resize(kept, 0);
        self.cursor.copy_from_slice(&self.cell_start[..cells]);

        let mut dropped = 0;
        for (index, &cell) in self.cell_of.iter().enumerate() {
            let cell = cell as usize;
            let next = self.cursor[cell];
            if next == self.cell_start[cell + 1] {
                dropped += 1;
                continue;
            }
            self.entries[next as usize] = index as u32;
            self.cursor[cell] = next + 1;
        }

        self.report_overflow(dropped);
        dropped
    }

    fn report_overflow(&mut self, dropped: usize) {
        if let CellCapacity::Bounded(capacity) = self.capacity {
            if dropped > 0 && self.dropped == 0 {
                log::warn!("{}", Error::CellCapacityExceeded { dropped, capacity });
            } else if dropped == 0 && self.dropped > 0 {
                log::info!("Cell occupancy back under capacity {capacity}");
            } else if dropped > 0 {
                log::trace!("{}", Error::CellCapacityExceeded { dropped, capacity });
            }
        }
        self.dropped = dropped;
    }
}

#[inline]
fn cell_coords(columns: usize, rows: usize, position: Vec2) -> (usize, usize) {
    // Float-to-int casts saturate, so negatives and NaN land on 0.
    let cx = ((position.x / CELL_SIZE).floor() as usize).min(columns - 1);
    let cy = ((position.y / CELL_SIZE).floor() as usize).min(rows - 1);
    (cx, cy)
}
