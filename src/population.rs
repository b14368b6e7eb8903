//! Index of live cell coordinates, the traversal source for each step.

use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

/// Lattice coordinates of one live cell. The cell's potential lives in the
/// lattice, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Ordered list of live-cell coordinates.
///
/// Workers read it by index during a step; all mutation happens on the
/// scheduler thread between steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Population {
    coords: Vec<Coord>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_coords(coords: Vec<Coord>) -> Self {
        Self { coords }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Coord] {
        &self.coords
    }

    pub fn push(&mut self, coord: Coord) {
        self.coords.push(coord);
    }

    pub fn extend<I: IntoIterator<Item = Coord>>(&mut self, coords: I) {
        self.coords.extend(coords);
    }

    pub fn clear(&mut self) {
        self.coords.clear();
    }

    /// Point entry `index` at a new site after a migration.
    pub fn relocate(&mut self, index: usize, to: Coord) {
        self.coords[index] = to;
    }

    pub fn shuffle(&mut self, rng: &mut SimRng) {
        rng.shuffle(&mut self.coords);
    }

    /// Drop the entries journaled dead this step. `dead` is positional over
    /// the pre-birth prefix; entries past its length are kept. Returns how
    /// many were removed.
    pub fn remove_dead(&mut self, dead: &[bool]) -> usize {
        let before = self.coords.len();
        let mut index = 0;
        self.coords.retain(|_| {
            let keep = !dead.get(index).copied().unwrap_or(false);
            index += 1;
            keep
        });
        before - self.coords.len()
    }

    /// Shift every coordinate after the lattice grew by `pad` on each edge.
    pub fn translate(&mut self, pad: usize) {
        for coord in &mut self.coords {
            coord.x += pad;
            coord.y += pad;
        }
    }

    /// True when any cell sits within `margin` sites of the border.
    pub fn near_border(&self, size: usize, margin: usize) -> bool {
        self.coords.iter().any(|c| {
            c.x <= margin || c.x >= size - margin - 1 || c.y <= margin || c.y >= size - margin - 1
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coord> {
        self.coords.iter()
    }
}
