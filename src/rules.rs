//! Per-cell fate decisions for one simulation step.

use crate::config::CellConfig;
use crate::lattice::{Lattice, EMPTY};
use crate::neighborhood;
use crate::population::Coord;
use crate::rng::SimRng;

/// Buffers a worker fills while sweeping its share of the population.
///
/// Workers may not touch the shared index during a step, so daughters and
/// coordinate changes are journaled here and drained by the scheduler after
/// the join.
#[derive(Debug, Default)]
pub struct WorkerOutcome {
    /// Coordinates of daughters committed this step.
    pub births: Vec<Coord>,
    /// Index entries that migrated, with their new coordinates.
    pub moves: Vec<(usize, Coord)>,
    /// Index entries whose cell died this step. A died cell's site is
    /// immediately reservable by neighbors, so removal is journaled by
    /// index rather than inferred from site emptiness.
    pub deaths: Vec<usize>,
}

/// Advance one cell: spontaneous death, then proliferation or migration into
/// a reserved neighbor site, else idle. `index` is the cell's position in
/// the step's population snapshot.
///
/// Every reservation taken here is committed or released before returning.
pub fn update_cell(
    lattice: &Lattice,
    rules: &CellConfig,
    index: usize,
    at: Coord,
    rng: &mut SimRng,
    out: &mut WorkerOutcome,
) {
    let value = lattice.get(at.x, at.y);
    if value <= EMPTY {
        // Emptied earlier in this step; nothing left to do.
        return;
    }
    let stc_tag = rules.potential_max as i32 + 1;
    let is_stc = value >= stc_tag;

    if !is_stc && (rng.percent() as f32) < rules.death_chance {
        lattice.set(at.x, at.y, EMPTY);
        out.deaths.push(index);
        return;
    }

    let Some(target) = neighborhood::reserve_free_neighbor(lattice, at, rng) else {
        // Boxed in: idle this step.
        return;
    };

    if rng.percent() < rules.proliferation_chance {
        if is_stc {
            let daughter = if rng.percent() < rules.stc_child_chance {
                stc_tag
            } else {
                rules.potential_max as i32
            };
            lattice.set(target.x, target.y, daughter);
            out.births.push(target);
        } else {
            // The parent spends one division and the daughter inherits the
            // spent value; at zero the parent is gone and no daughter lands.
            let remaining = value - 1;
            lattice.set(at.x, at.y, remaining);
            if remaining > EMPTY {
                lattice.set(target.x, target.y, remaining);
                out.births.push(target);
            } else {
                out.deaths.push(index);
                lattice.release(target.x, target.y);
            }
        }
    } else if rng.percent() < rules.migration_chance {
        lattice.set(target.x, target.y, value);
        lattice.set(at.x, at.y, EMPTY);
        out.moves.push((index, target));
    } else {
        lattice.release(target.x, target.y);
    }
}
