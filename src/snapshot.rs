//! Read-only view of a run for renderers and tests.

use crate::lattice::{classify, SiteKind, EMPTY};
use serde::{Deserialize, Serialize};

/// Dense copy of the lattice plus the recorded count series.
///
/// Renderers map sites as: empty white, stem cells yellow, regular cells red
/// with intensity `round(255 * value / potential_max)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Side of the square lattice.
    pub size: usize,
    /// Step count at capture time.
    pub step: u64,
    /// Maximum regular-cell potential; the stem tag is this plus one.
    pub potential_max: u32,
    /// Row-major site values.
    pub cells: Vec<i32>,
    /// Stem-cell totals per counted step; empty when counting was off.
    pub stc: Vec<usize>,
    /// Regular-cell totals per counted step; empty when counting was off.
    pub rtc: Vec<usize>,
}

impl Snapshot {
    /// Raw value at a site.
    pub fn site(&self, x: usize, y: usize) -> i32 {
        assert!(
            x < self.size && y < self.size,
            "site ({x}, {y}) outside {size}x{size} snapshot",
            size = self.size
        );
        self.cells[x + y * self.size]
    }

    /// Classified value at a site.
    pub fn kind(&self, x: usize, y: usize) -> SiteKind {
        classify(self.site(x, y), self.potential_max as i32)
    }

    /// Number of occupied sites.
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&v| v != EMPTY).count()
    }

    /// ASCII rendering: `.` for empty, `*` for stem cells, and the regular
    /// potential as a single digit capped at 9. Row 0 prints last so the
    /// y axis points up.
    pub fn ascii(&self) -> String {
        let mut text = String::with_capacity(self.size * (self.size + 1));
        for y in (0..self.size).rev() {
            for x in 0..self.size {
                let glyph = match self.kind(x, y) {
                    SiteKind::Empty => '.',
                    SiteKind::Stc => '*',
                    SiteKind::Rtc(p) => {
                        char::from_digit(p.min(9) as u32, 10).unwrap_or('9')
                    }
                };
                text.push(glyph);
            }
            text.push('\n');
        }
        text
    }
}
