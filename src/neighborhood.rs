//! Locating and claiming a free site next to a cell.

use crate::lattice::Lattice;
use crate::population::Coord;
use crate::rng::SimRng;

/// The four lattice directions. North is `+y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    East,
    West,
    North,
    South,
}

/// Probe sequence per starting direction: the opposite site first, then the
/// cross axis.
const PROBES: [[Dir; 4]; 4] = [
    [Dir::East, Dir::West, Dir::North, Dir::South],
    [Dir::West, Dir::East, Dir::South, Dir::North],
    [Dir::North, Dir::South, Dir::East, Dir::West],
    [Dir::South, Dir::North, Dir::West, Dir::East],
];

/// Neighbor of `at` in `dir`, or None past the lattice edge.
fn neighbor(at: Coord, dir: Dir, size: usize) -> Option<Coord> {
    match dir {
        Dir::East => (at.x + 1 < size).then(|| Coord::new(at.x + 1, at.y)),
        Dir::West => (at.x > 0).then(|| Coord::new(at.x - 1, at.y)),
        Dir::North => (at.y + 1 < size).then(|| Coord::new(at.x, at.y + 1)),
        Dir::South => (at.y > 0).then(|| Coord::new(at.x, at.y - 1)),
    }
}

/// Reserve the first empty 4-neighbor of `at`, starting from a uniformly
/// drawn direction. Sites past the edge count as occupied. Losing a claim
/// race to another worker just moves the probe to the next direction.
///
/// The returned site is held reserved and must be either committed with a
/// real value or released before the worker moves on.
pub fn reserve_free_neighbor(lattice: &Lattice, at: Coord, rng: &mut SimRng) -> Option<Coord> {
    for dir in PROBES[rng.pick(4)] {
        let Some(next) = neighbor(at, dir, lattice.size()) else {
            continue;
        };
        if lattice.try_reserve(next.x, next.y) {
            return Some(next);
        }
    }
    None
}
