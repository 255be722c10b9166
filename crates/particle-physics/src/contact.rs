//! Circle-circle contact resolution over the spatial grid
//!
//! Each pass gathers positions into a scratch buffer ordered like the grid
//! entries, relaxes overlaps there and scatters the result back. Grid columns
//! are grouped into stripes of `w` columns; a stripe only touches its own
//! columns plus the first column of the next stripe, so all even stripes can
//! run concurrently, then all odd ones. Every task owns a disjoint slice of the
//! scratch buffer.
//!
//! Pairs are enumerated with a half stencil (same cell with `b > a`, plus the
//! four neighbours of larger index), so each pair of particles in touching
//! cells is tested exactly once per pass.

use std::ops::{Add, AddAssign, Range};

use glam::Vec2;
use rayon::prelude::*;

use crate::constants::CONTACT_EPSILON;
use crate::grid::SpatialGrid;
use crate::store::ParticleStore;

const UNSLOTTED: u32 = u32::MAX;

/// Result of testing one pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairOutcome {
    Apart,
    /// Centres closer than `CONTACT_EPSILON`; no direction to push along
    Degenerate,
    /// Correction to add to the first particle and subtract from the second
    Overlap(Vec2),
}

/// Narrow phase for two circles.
///
/// Overlapping circles are pushed apart along the centre line, each by half the
/// penetration depth.
#[inline]
pub fn resolve_pair(p_i: Vec2, r_i: f32, p_j: Vec2, r_j: f32) -> PairOutcome {
    let delta = p_i - p_j;
    let reach = r_i + r_j;
    let dist2 = delta.length_squared();
    if dist2 >= reach * reach {
        return PairOutcome::Apart;
    }
    let dist = dist2.sqrt();
    if dist <= CONTACT_EPSILON {
        return PairOutcome::Degenerate;
    }
    PairOutcome::Overlap(delta / dist * (0.5 * (reach - dist)))
}

/// Counters for one solver pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveReport {
    pub contacts: usize,
    pub degenerate: usize,
}

impl SolveReport {
    #[inline]
    fn record(&mut self, outcome: PairOutcome) {
        match outcome {
            PairOutcome::Apart => {}
            PairOutcome::Degenerate => self.degenerate += 1,
            PairOutcome::Overlap(_) => self.contacts += 1,
        }
    }
}

impl Add for SolveReport {
    type Output = SolveReport;

    fn add(self, other: SolveReport) -> SolveReport {
        SolveReport {
            contacts: self.contacts + other.contacts,
            degenerate: self.degenerate + other.degenerate,
        }
    }
}

impl AddAssign for SolveReport {
    fn add_assign(&mut self, other: SolveReport) {
        *self = *self + other;
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    position: Vec2,
    radius: f32,
}

/// Block of grid columns relaxed by one task
struct Stripe<'a> {
    columns: Range<usize>,
    /// Entry index of `bodies[0]`
    offset: usize,
    bodies: &'a mut [Body],
}

impl Stripe<'_> {
    fn solve(self, grid: &SpatialGrid) -> SolveReport {
        let mut report = SolveReport::default();
        let rows = grid.rows();

        for cx in self.columns.clone() {
            for cy in 0..rows {
                let own = self.local(grid.cell_range(cx * rows + cy));
                if own.is_empty() {
                    continue;
                }

                for a in own.clone() {
                    for b in a + 1..own.end {
                        report.record(relax(self.bodies, a, b));
                    }
                }

                for neighbor in grid.forward_neighbors(cx, cy) {
                    let other = self.local(grid.cell_range(neighbor));
                    for a in own.clone() {
                        for b in other.clone() {
                            report.record(relax(self.bodies, a, b));
                        }
                    }
                }
            }
        }

        report
    }

    #[inline]
    fn local(&self, entries: Range<usize>) -> Range<usize> {
        entries.start - self.offset..entries.end - self.offset
    }
}

#[inline]
fn relax(bodies: &mut [Body], a: usize, b: usize) -> PairOutcome {
    let (first, second) = (bodies[a], bodies[b]);
    let outcome = resolve_pair(first.position, first.radius, second.position, second.radius);
    if let PairOutcome::Overlap(correction) = outcome {
        bodies[a].position += correction;
        bodies[b].position -= correction;
    }
    outcome
}

/// Stripe width giving every worker a few stripes per phase.
fn stripe_width(columns: usize, threads: usize) -> usize {
    (columns / (threads.max(1) * 4)).max(1)
}

/// Reusable scratch state for contact passes
#[derive(Debug, Default)]
pub struct ContactSolver {
    bodies: Vec<Body>,
    slots: Vec<u32>,
}

impl ContactSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relax every overlapping pair once, using the grid built from `store`.
    ///
    /// Only positions change; previous positions stay put so the correction
    /// turns into velocity on the next integration.
    pub fn solve<S: ParticleStore>(&mut self, grid: &SpatialGrid, store: &mut S) -> SolveReport {
        let entries = grid.entries();
        if entries.is_empty() {
            return SolveReport::default();
        }

        {
            let store = &*store;
            entries
                .par_iter()
                .map(|&index| Body {
                    position: store.position(index as usize),
                    radius: store.radius(index as usize),
                })
                .collect_into_vec(&mut self.bodies);
        }

        let width = stripe_width(grid.columns(), rayon::current_num_threads());
        let mut report = self.solve_phase(grid, width, 0);
        report += self.solve_phase(grid, width, 1);

        self.slots.clear();
        self.slots.resize(store.len(), UNSLOTTED);
        for (slot, &index) in entries.iter().enumerate() {
            self.slots[index as usize] = slot as u32;
        }

        let (slots, bodies) = (&self.slots, &self.bodies);
        store.par_update_positions(|index, position| match slots[index] {
            UNSLOTTED => position,
            slot => bodies[slot as usize].position,
        });

        log::trace!(
            "Contact pass: {} contacts, {} degenerate, stripe width {width}",
            report.contacts,
            report.degenerate
        );
        report
    }

    /// Relax all stripes of one parity concurrently.
    fn solve_phase(&mut self, grid: &SpatialGrid, width: usize, parity: usize) -> SolveReport {
        let columns = grid.columns();
        let mut stripes = Vec::with_capacity(columns / (2 * width) + 1);
        let mut rest: &mut [Body] = &mut self.bodies;
        let mut consumed = 0;

        let mut start = parity * width;
        while start < columns {
            let end = (start + width).min(columns);
            // Writes reach one column past the stripe.
            let span = grid.column_span(start..end + 1);
            let (_, tail) = std::mem::take(&mut rest).split_at_mut(span.start - consumed);
            let (bodies, tail) = tail.split_at_mut(span.len());
            rest = tail;
            consumed = span.end;

            stripes.push(Stripe {
                columns: start..end,
                offset: span.start,
                bodies,
            });
            start += 2 * width;
        }

        stripes
            .into_par_iter()
            .map(|stripe| stripe.solve(grid))
            .reduce(SolveReport::default, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::particle::{Particle, Rgb};
    use crate::store::{ParticleColumns, ParticleVec};

    fn particle(x: f32, y: f32, radius: f32) -> Result<Particle> {
        Particle::new(Vec2::new(x, y), Vec2::ZERO, radius, Rgb::WHITE)
    }

    fn solve_once<S: ParticleStore>(store: &mut S, size: f32) -> Result<SolveReport> {
        let mut grid = SpatialGrid::new(size, size)?;
        grid.rebuild(store);
        Ok(ContactSolver::new().solve(&grid, store))
    }

    #[test]
    fn pair_outcomes() {
        assert_eq!(
            resolve_pair(Vec2::ZERO, 0.5, Vec2::new(2.0, 0.0), 0.5),
            PairOutcome::Apart
        );
        assert_eq!(
            resolve_pair(Vec2::ZERO, 0.5, Vec2::ZERO, 0.5),
            PairOutcome::Degenerate
        );
        match resolve_pair(Vec2::new(0.0, 0.0), 0.5, Vec2::new(0.6, 0.0), 0.5) {
            PairOutcome::Overlap(c) => {
                assert!((c.x + 0.2).abs() < 1e-6);
                assert_eq!(c.y, 0.0);
            }
            other => panic!("expected overlap, got {other:?}"),
        }
    }

    #[test]
    fn touching_circles_are_apart() {
        assert_eq!(
            resolve_pair(Vec2::ZERO, 0.5, Vec2::new(1.0, 0.0), 0.5),
            PairOutcome::Apart
        );
    }

    #[test]
    fn overlapping_pair_is_separated() -> Result<()> {
        let mut store = ParticleVec::new();
        store.push(particle(10.0, 10.0, 1.0)?);
        store.push(particle(10.1, 10.0, 1.0)?);

        let report = solve_once(&mut store, 20.0)?;
        assert_eq!(report.contacts, 1);
        let distance = store.position(0).distance(store.position(1));
        assert!((distance - 2.0).abs() < 1e-4, "distance {distance}");
        // Symmetric split around the old midpoint.
        let mid = (store.position(0) + store.position(1)) * 0.5;
        assert!((mid - Vec2::new(10.05, 10.0)).length() < 1e-4);
        Ok(())
    }

    #[test]
    fn previous_positions_untouched() -> Result<()> {
        let mut store = ParticleVec::new();
        store.push(particle(10.0, 10.0, 0.5)?);
        store.push(particle(10.4, 10.0, 0.5)?);
        solve_once(&mut store, 20.0)?;
        assert_eq!(
            store.get(0).map(|p| p.previous_position),
            Some(Vec2::new(10.0, 10.0))
        );
        assert_ne!(store.position(0), Vec2::new(10.0, 10.0));
        Ok(())
    }

    #[test]
    fn separated_particles_are_left_alone() -> Result<()> {
        let mut store = ParticleVec::new();
        store.push(particle(5.0, 5.0, 0.5)?);
        store.push(particle(6.5, 5.0, 0.5)?);
        store.push(particle(5.0, 7.0, 0.5)?);
        let report = solve_once(&mut store, 20.0)?;
        assert_eq!(report, SolveReport::default());
        assert_eq!(store.position(1), Vec2::new(6.5, 5.0));
        Ok(())
    }

    #[test]
    fn coincident_particles_are_skipped() -> Result<()> {
        let mut store = ParticleVec::new();
        store.push(particle(5.0, 5.0, 0.5)?);
        store.push(particle(5.0, 5.0, 0.5)?);
        let report = solve_once(&mut store, 20.0)?;
        assert_eq!(report.degenerate, 1);
        assert_eq!(report.contacts, 0);
        assert_eq!(store.position(0), store.position(1));
        Ok(())
    }

    #[test]
    fn each_pair_is_resolved_once() -> Result<()> {
        // Isolated pairs straddling column and row boundaries everywhere in
        // the grid, including stripe seams.
        let mut store = ParticleVec::new();
        let mut pairs = 0;
        for gx in 0..20 {
            for gy in 0..20 {
                let x = gx as f32 * 3.0 + 1.0;
                let y = gy as f32 * 3.0 + 1.0;
                store.push(particle(x - 0.2, y - 0.1, 0.4)?);
                store.push(particle(x + 0.2, y + 0.1, 0.4)?);
                pairs += 1;
            }
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .expect("test pool");
        let report = pool.install(|| solve_once(&mut store, 61.0))?;

        assert_eq!(report.contacts, pairs);
        for k in 0..pairs {
            let d = store.position(2 * k).distance(store.position(2 * k + 1));
            assert!((d - 0.8).abs() < 1e-4, "pair {k} at distance {d}");
        }
        Ok(())
    }

    #[test]
    fn dense_packing_reduces_overlap() -> Result<()> {
        let mut store = ParticleVec::new();
        for i in 0..400 {
            let x = 10.0 + (i % 20) as f32 * 0.7;
            let y = 10.0 + (i / 20) as f32 * 0.7 + (i % 3) as f32 * 0.05;
            store.push(particle(x, y, 0.5)?);
        }

        let penetration = |store: &ParticleVec| -> f32 {
            let mut total = 0.0;
            for i in 0..store.len() {
                for j in i + 1..store.len() {
                    let d = store.position(i).distance(store.position(j));
                    total += (1.0 - d).max(0.0);
                }
            }
            total
        };

        let before = penetration(&store);
        solve_once(&mut store, 40.0)?;
        let after = penetration(&store);
        assert!(after < before, "{after} !< {before}");
        Ok(())
    }

    #[test]
    fn layouts_solve_identically() -> Result<()> {
        let mut aos = ParticleVec::new();
        let mut soa = ParticleColumns::new();
        for i in 0..200 {
            let p = particle(
                5.0 + (i % 17) as f32 * 0.8,
                5.0 + (i / 17) as f32 * 0.75,
                0.5,
            )?;
            aos.push(p);
            soa.push(p);
        }

        let a = solve_once(&mut aos, 30.0)?;
        let b = solve_once(&mut soa, 30.0)?;
        assert_eq!(a, b);
        for i in 0..200 {
            assert_eq!(aos.position(i), soa.position(i));
        }
        Ok(())
    }

    #[test]
    fn stripe_width_never_zero() {
        assert_eq!(stripe_width(1, 16), 1);
        assert_eq!(stripe_width(200, 16), 3);
        assert_eq!(stripe_width(200, 0), 50);
    }
}
