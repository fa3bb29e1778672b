use crate::core::body::{Body, RADIUS};
use crate::core::contact::{pair_contact_time, wall_contact_time, Contact, ContactKind};
use crate::core::vec2::Vec2;
use crate::error::{Error, Result};
use log::{debug, trace};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};

/// Tolerance for contact proximity and residual-velocity checks.
pub const EPS: f64 = 1e-8;

/// Velocity decay base per unit simulated time. Damping below 1 is what makes
/// the event loop terminate at all.
const DAMPING: f64 = 0.97;

/// Upper bound (exclusive) for initial velocity magnitudes.
const MAX_SPEED: f64 = 1.0;

/// Width of one layout grid cell.
const CELL: f64 = 1.0 / 10.0;

/// Terminal state of the convergence loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every body's residual speed fell to EPS or below.
    Converged,
    /// Bodies still move but no future contact exists at current velocities.
    NoEvent,
}

/// Result of a completed `settle` run.
#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    pub status: Status,
    pub iterations: u64,
}

/// Damped hard-disk simulation inside the unit square.
///
/// Bodies start on a grid inset by `border` from the square's edge and move
/// event-to-event: each iteration advances all bodies exactly to the next
/// disk-disk or disk-boundary contact, resolves it, and decays every velocity
/// by `DAMPING^k` for the elapsed step time `k`.
#[derive(Debug)]
pub struct Simulation {
    pub bodies: Vec<Body>,
    border: f64,
    rng: StdRng,
}

impl Simulation {
    /// Create a simulation with `count` bodies, seeded for reproducibility
    /// when `seed` is given.
    pub fn new(count: usize, seed: Option<u64>) -> Result<Self> {
        let rng: StdRng = match seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };
        Self::from_rng(count, rng)
    }

    /// Create a simulation drawing all randomness from `rng`.
    ///
    /// Bodies are placed on a near-square grid: `side = ceil(sqrt(count))`
    /// columns, full rows first, then one shorter row whose cells stretch to
    /// fill the grid width. Every body gets a random velocity with magnitude
    /// in `[0, MAX_SPEED)`.
    ///
    /// Errors: `Error::InvalidParam` if `count` is zero.
    pub fn from_rng(count: usize, mut rng: StdRng) -> Result<Self> {
        if count == 0 {
            return Err(Error::InvalidParam("count must be > 0".into()));
        }

        let root = (count as f64).sqrt() as usize;
        let side = if root * root == count { root } else { root + 1 };
        let full_rows = count / side;
        let remainder = count % side;
        let border = (1.0 - side as f64 * CELL) / 2.0;

        let mut bodies = Vec::with_capacity(count);
        for i in 0..full_rows {
            for j in 0..side {
                let point = Vec2::new(
                    border + (i as f64 + 0.5) * CELL,
                    border + (j as f64 + 0.5) * CELL,
                );
                bodies.push(Body::new(
                    point,
                    Vec2::random_with_magnitude(&mut rng, MAX_SPEED),
                ));
            }
        }

        if remainder != 0 {
            let last_cell = (1.0 - 2.0 * border) / remainder as f64;
            for j in 0..remainder {
                let point = Vec2::new(
                    border + (full_rows as f64 + 0.5) * CELL,
                    border + (j as f64 + 0.5) * last_cell,
                );
                bodies.push(Body::new(
                    point,
                    Vec2::random_with_magnitude(&mut rng, MAX_SPEED),
                ));
            }
        }

        Ok(Self { bodies, border, rng })
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Grid inset from the unit square's edge.
    pub fn border(&self) -> f64 {
        self.border
    }

    /// Current body positions.
    pub fn positions(&self) -> Vec<Vec2> {
        self.bodies.iter().map(|b| b.point).collect()
    }

    /// Run the event loop until the system is at rest or no event remains.
    ///
    /// Errors: `Error::NonConvergent` if `max_iterations` steps pass without
    /// reaching a terminal state.
    pub fn settle(&mut self, max_iterations: u64) -> Result<Outcome> {
        let mut iterations = 0u64;

        while self.has_motion() {
            if iterations >= max_iterations {
                return Err(Error::NonConvergent { iterations });
            }

            let Some(contact) = self.next_contact()? else {
                debug!("no further event possible after {iterations} iterations");
                return Ok(Outcome {
                    status: Status::NoEvent,
                    iterations,
                });
            };

            let k = contact.time_f64();
            trace!("step {}: {:?} in {:.3e}", iterations, contact.kind, k);

            self.advance(k);
            self.resolve_pair_contacts();
            self.reflect_walls();

            iterations += 1;
        }

        debug!("converged after {iterations} iterations");
        Ok(Outcome {
            status: Status::Converged,
            iterations,
        })
    }

    /// True while any body retains a residual speed above EPS.
    pub fn has_motion(&self) -> bool {
        self.bodies.iter().any(|b| b.speed() > EPS)
    }

    // ============ Internal helpers ============

    /// Earliest upcoming contact over all disk pairs and boundaries, if any.
    fn next_contact(&self) -> Result<Option<Contact>> {
        let inner = self.earliest_pair_contact()?;
        let outer = self.earliest_wall_contact()?;
        Ok(match (inner, outer) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        })
    }

    /// Minimum finite positive disk-disk contact time over all unordered pairs.
    fn earliest_pair_contact(&self) -> Result<Option<Contact>> {
        let mut best: Option<Contact> = None;
        let n = self.bodies.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let k = pair_contact_time(&self.bodies[i], &self.bodies[j]);
                if !k.is_finite() || k <= 0.0 {
                    continue;
                }
                let candidate = Contact::new(k, ContactKind::Pair { i, j })?;
                if best.is_none_or(|b| candidate < b) {
                    best = Some(candidate);
                }
            }
        }

        Ok(best)
    }

    /// Minimum finite boundary contact time over all bodies, axes, and sides.
    fn earliest_wall_contact(&self) -> Result<Option<Contact>> {
        let lo = self.border + RADIUS;
        let hi = 1.0 - self.border - RADIUS;
        let mut best: Option<Contact> = None;

        for (i, body) in self.bodies.iter().enumerate() {
            let candidates = [
                (body.point.x, body.velocity.x, hi, 0usize, true),
                (body.point.x, body.velocity.x, lo, 0, false),
                (body.point.y, body.velocity.y, hi, 1, true),
                (body.point.y, body.velocity.y, lo, 1, false),
            ];
            for (point, velocity, target, axis, high) in candidates {
                let k = wall_contact_time(point, velocity, target);
                if !k.is_finite() {
                    continue;
                }
                let candidate = Contact::new(k, ContactKind::Wall { i, axis, high })?;
                if best.is_none_or(|b| candidate < b) {
                    best = Some(candidate);
                }
            }
        }

        Ok(best)
    }

    /// Move every body by `k` and decay its velocity by `DAMPING^k`.
    fn advance(&mut self, k: f64) {
        let decay = DAMPING.powf(k);
        for body in &mut self.bodies {
            *body = Body::new(body.point + body.velocity * k, body.velocity * decay);
        }
    }

    /// Resolve every pair currently at contact distance.
    ///
    /// A candidate resolution is committed only if it yields a smaller raw
    /// pair contact time than the pre-collision pair; with NaN the comparison
    /// is false and nothing is committed. Committed replacements are visible
    /// to later pairs within the same scan.
    fn resolve_pair_contacts(&mut self) {
        let n = self.bodies.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (self.bodies[i], self.bodies[j]);
                if (2.0 * RADIUS - (a.point - b.point).length()).abs() >= EPS {
                    continue;
                }

                let before = pair_contact_time(&a, &b);
                let (new_a, new_b) = collide(&a, &b, &mut self.rng);
                let after = pair_contact_time(&new_a, &new_b);

                if after < before {
                    trace!("pair ({i}, {j}) resolved");
                    self.bodies[i] = new_a;
                    self.bodies[j] = new_b;
                }
            }
        }
    }

    /// Negate velocity components of bodies sitting at the inset boundary and
    /// still heading outward. Both axes are handled independently, so a corner
    /// contact flips both in one step.
    fn reflect_walls(&mut self) {
        let lo = self.border + RADIUS;
        let hi = 1.0 - self.border - RADIUS;

        for body in &mut self.bodies {
            let mut v = body.velocity;

            if v.x > 0.0 && (body.point.x - hi).abs() < EPS
                || v.x < 0.0 && (body.point.x - lo).abs() < EPS
            {
                v = Vec2::new(-v.x, v.y);
            }

            if v.y > 0.0 && (body.point.y - hi).abs() < EPS
                || v.y < 0.0 && (body.point.y - lo).abs() < EPS
            {
                v = Vec2::new(v.x, -v.y);
            }

            if v != body.velocity {
                *body = Body::new(body.point, v);
            }
        }
    }
}

/// Equal-mass 2D elastic collision of two disks in contact.
///
/// Rotates both velocities into the contact frame spanned by the normalized
/// center difference, exchanges the normal components, and rotates back.
/// Normalization of a resting body's velocity falls back to a random
/// direction, so `rng` is threaded through.
fn collide<R: Rng>(a: &Body, b: &Body, rng: &mut R) -> (Body, Body) {
    let dir_a = a.velocity.norm(rng);
    let dir_b = b.velocity.norm(rng);

    let d = (b.point - a.point).norm(rng);
    let cos_phi = d.x;
    let sin_phi = d.y;

    let cos_sqr = cos_phi * cos_phi;
    let sin_sqr = sin_phi * sin_phi;
    let cos_sin = cos_phi * sin_phi;

    let speed_a = a.speed();
    let speed_b = b.speed();

    let new_a = exchanged_velocity(speed_b, dir_b, speed_a, dir_a, cos_sqr, sin_sqr, cos_sin);
    let new_b = exchanged_velocity(speed_a, dir_a, speed_b, dir_b, cos_sqr, sin_sqr, cos_sin);

    (Body::new(a.point, new_a), Body::new(b.point, new_b))
}

/// One side of the contact-frame exchange: the other body's normal component
/// combined with the own tangential component, already rotated back.
#[allow(clippy::too_many_arguments)]
fn exchanged_velocity(
    other_speed: f64,
    other_dir: Vec2,
    own_speed: f64,
    own_dir: Vec2,
    cos_sqr: f64,
    sin_sqr: f64,
    cos_sin: f64,
) -> Vec2 {
    Vec2::new(
        other_speed * (other_dir.x * cos_sqr + other_dir.y * cos_sin)
            - own_speed * (own_dir.y * cos_sin - own_dir.x * sin_sqr),
        other_speed * (other_dir.x * cos_sin + other_dir.y * sin_sqr)
            + own_speed * (own_dir.y * cos_sqr - own_dir.x * cos_sin),
    )
}

/// Final acceptance check: every pair separated by at least the disk diameter
/// and every center inside `[RADIUS, 1 - RADIUS]` on both axes.
///
/// A failing layout is discarded wholesale by the caller; there is no partial
/// repair.
pub fn layout_is_valid(points: &[Vec2]) -> bool {
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            if (points[i] - points[j]).length() < 2.0 * RADIUS {
                return false;
            }
        }

        let p = points[i];
        if p.x < RADIUS || p.x > 1.0 - RADIUS || p.y < RADIUS || p.y > 1.0 - RADIUS {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(count: usize, seed: u64) -> Simulation {
        match Simulation::new(count, Some(seed)) {
            Ok(sim) => sim,
            Err(e) => panic!("failed to build simulation: {e}"),
        }
    }

    #[test]
    fn perfect_square_grid_placement() {
        let sim = fixed(9, 1);
        assert_eq!(sim.len(), 9);
        // side = 3, border = (1 - 0.3) / 2 = 0.35
        assert!((sim.border() - 0.35).abs() < 1e-12);
        let first = sim.bodies[0].point;
        let last = sim.bodies[8].point;
        assert!((first.x - 0.4).abs() < 1e-12 && (first.y - 0.4).abs() < 1e-12);
        assert!((last.x - 0.6).abs() < 1e-12 && (last.y - 0.6).abs() < 1e-12);
    }

    #[test]
    fn remainder_row_stretches_to_grid_width() {
        let sim = fixed(10, 1);
        assert_eq!(sim.len(), 10);
        // side = 4, full_rows = 2, remainder = 2, border = 0.3,
        // last row at x = 0.3 + 2.5 * 0.1 with cell width (1 - 0.6) / 2 = 0.2
        let a = sim.bodies[8].point;
        let b = sim.bodies[9].point;
        assert!((a.x - 0.55).abs() < 1e-12 && (a.y - 0.4).abs() < 1e-12);
        assert!((b.x - 0.55).abs() < 1e-12 && (b.y - 0.6).abs() < 1e-12);
    }

    #[test]
    fn initial_speeds_below_bound() {
        let sim = fixed(25, 7);
        for body in &sim.bodies {
            assert!(body.speed() < MAX_SPEED);
        }
    }

    #[test]
    fn zero_count_rejected() {
        let err = match Simulation::new(0, Some(1)) {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("count"));
    }

    #[test]
    fn advance_moves_and_damps() {
        let mut sim = fixed(1, 1);
        sim.bodies[0] = Body::new(Vec2::new(0.5, 0.5), Vec2::new(0.1, -0.2));
        sim.advance(2.0);
        let body = sim.bodies[0];
        assert!((body.point.x - 0.7).abs() < 1e-12);
        assert!((body.point.y - 0.1).abs() < 1e-12);
        let decay = DAMPING * DAMPING;
        assert!((body.velocity.x - 0.1 * decay).abs() < 1e-12);
        assert!((body.velocity.y + 0.2 * decay).abs() < 1e-12);
    }

    #[test]
    fn wall_reflection_negates_once() {
        let mut sim = fixed(1, 1);
        let hi = 1.0 - sim.border() - RADIUS;
        sim.bodies[0] = Body::new(Vec2::new(hi, 0.5), Vec2::new(0.3, 0.0));

        sim.reflect_walls();
        assert!((sim.bodies[0].velocity.x + 0.3).abs() < 1e-12);
        assert_eq!(sim.bodies[0].velocity.y, 0.0);

        // Already heading inward: a second pass must not flip again.
        sim.reflect_walls();
        assert!((sim.bodies[0].velocity.x + 0.3).abs() < 1e-12);
    }

    #[test]
    fn corner_contact_flips_both_axes() {
        let mut sim = fixed(1, 1);
        let hi = 1.0 - sim.border() - RADIUS;
        sim.bodies[0] = Body::new(Vec2::new(hi, hi), Vec2::new(0.3, 0.2));
        sim.reflect_walls();
        let v = sim.bodies[0].velocity;
        assert!((v.x + 0.3).abs() < 1e-12);
        assert!((v.y + 0.2).abs() < 1e-12);
    }

    #[test]
    fn head_on_pair_swaps_normal_components() {
        let mut sim = fixed(2, 1);
        sim.bodies[0] = Body::new(Vec2::new(0.5 - RADIUS, 0.5), Vec2::new(0.25, 0.0));
        sim.bodies[1] = Body::new(Vec2::new(0.5 + RADIUS, 0.5), Vec2::new(-0.25, 0.0));

        sim.resolve_pair_contacts();

        let (va, vb) = (sim.bodies[0].velocity, sim.bodies[1].velocity);
        assert!(
            (va.x + 0.25).abs() < 1e-12,
            "normal component must swap, got {va:?}"
        );
        assert!(
            (vb.x - 0.25).abs() < 1e-12,
            "normal component must swap, got {vb:?}"
        );
        assert!(
            va.y.abs() < 1e-12 && vb.y.abs() < 1e-12,
            "tangential components stay zero"
        );
    }

    #[test]
    fn receding_pair_is_not_resolved() {
        // Already separating: the candidate resolution would turn them back
        // toward each other, so the contact-time guard rejects it.
        let mut sim = fixed(2, 1);
        sim.bodies[0] = Body::new(Vec2::new(0.5 - RADIUS, 0.5), Vec2::new(-0.25, 0.0));
        sim.bodies[1] = Body::new(Vec2::new(0.5 + RADIUS, 0.5), Vec2::new(0.25, 0.0));

        sim.resolve_pair_contacts();

        assert!((sim.bodies[0].velocity.x + 0.25).abs() < 1e-12);
        assert!((sim.bodies[1].velocity.x - 0.25).abs() < 1e-12);
    }

    #[test]
    fn zero_energy_system_converges_immediately() -> Result<()> {
        let mut sim = fixed(1, 1);
        sim.bodies[0] = Body::new(sim.bodies[0].point, Vec2::ZERO);

        let outcome = sim.settle(1_000)?;
        assert_eq!(outcome.status, Status::Converged);
        assert_eq!(outcome.iterations, 0);
        assert!((sim.bodies[0].point.x - 0.5).abs() < 1e-12);
        assert!((sim.bodies[0].point.y - 0.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn motion_without_events_stops_as_no_event() -> Result<()> {
        // A single body exactly at the high x-boundary moving outward, with no
        // y motion: every wall time is zero or infinite, so no event remains.
        let mut sim = fixed(1, 1);
        let hi = 1.0 - sim.border() - RADIUS;
        sim.bodies[0] = Body::new(Vec2::new(hi, 0.5), Vec2::new(0.5, 0.0));

        let outcome = sim.settle(1_000)?;
        assert_eq!(outcome.status, Status::NoEvent);
        assert_eq!(outcome.iterations, 0);
        Ok(())
    }

    #[test]
    fn iteration_cap_surfaces_non_convergence() {
        let mut sim = fixed(1, 1);
        sim.bodies[0] = Body::new(sim.bodies[0].point, Vec2::new(0.3, 0.1));
        match sim.settle(0) {
            Err(Error::NonConvergent { iterations }) => assert_eq!(iterations, 0),
            other => panic!("expected NonConvergent, got {other:?}"),
        }
    }

    #[test]
    fn validator_accepts_well_separated_layout() {
        let points = [
            Vec2::new(0.25, 0.25),
            Vec2::new(0.75, 0.25),
            Vec2::new(0.25, 0.75),
            Vec2::new(0.75, 0.75),
        ];
        assert!(layout_is_valid(&points));
    }

    #[test]
    fn validator_rejects_overlap_and_escape() {
        let overlap = [Vec2::new(0.5, 0.5), Vec2::new(0.5 + RADIUS, 0.5)];
        assert!(!layout_is_valid(&overlap));

        let outside = [Vec2::new(RADIUS / 2.0, 0.5)];
        assert!(!layout_is_valid(&outside));

        let empty: [Vec2; 0] = [];
        assert!(layout_is_valid(&empty));
    }
}
