//! Damped event-driven hard-disk relaxation in the unit square.
//!
//! Given a body count, the engine places equal-radius disks on a grid, gives
//! each a random velocity, and advances the system event-to-event (disk-disk
//! and disk-boundary contacts) while exponentially damping all motion. Once
//! at rest, the final positions are accepted only if no pair overlaps and
//! every disk lies inside the square; a rejected layout restarts the whole
//! simulation from a fresh random state.
//!
//! The accepted positions are normalized coordinates in `[0, 1]²`, ready for
//! a downstream renderer. Rendering and I/O are out of scope here.

pub mod core;
pub mod error;

pub use crate::core::{layout_is_valid, Body, Outcome, Simulation, Status, Vec2};

use crate::error::{Error, Result};
use log::{debug, warn};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};

/// Default bound on whole-simulation retries before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1_000;

/// Default per-attempt iteration cap for the convergence loop.
pub const DEFAULT_MAX_ITERATIONS: u64 = 100_000;

/// An accepted layout together with how much work it took.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Final disk centers, validated non-overlapping and contained.
    pub positions: Vec<Vec2>,
    /// Number of simulation attempts, including the accepted one.
    pub attempts: usize,
    /// Event iterations of the accepted attempt.
    pub iterations: u64,
    /// Terminal state of the accepted attempt.
    pub status: Status,
}

/// Generate a validated layout of `count` disks with default retry bounds.
///
/// `seed` makes the whole run deterministic; `None` draws from the process
/// generator.
pub fn generate(count: usize, seed: Option<u64>) -> Result<Layout> {
    generate_with(count, seed, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_ITERATIONS)
}

/// Generate a validated layout with explicit retry and iteration bounds.
///
/// Each attempt runs an independent simulation from a fresh random placement;
/// a rejected or non-convergent attempt is discarded wholesale and retried.
/// Attempt seeds derive from one master generator so a fixed `seed` fixes the
/// entire retry sequence.
///
/// Errors:
/// - `Error::InvalidParam` if `count` is outside `[1, 100]` or `max_attempts`
///   is zero.
/// - `Error::RetriesExhausted` if no attempt produced a valid layout.
pub fn generate_with(
    count: usize,
    seed: Option<u64>,
    max_attempts: usize,
    max_iterations: u64,
) -> Result<Layout> {
    if !(1..=100).contains(&count) {
        return Err(Error::InvalidParam(format!(
            "expected a count between 1 and 100, but got {count}"
        )));
    }
    if max_attempts == 0 {
        return Err(Error::InvalidParam("max_attempts must be > 0".into()));
    }

    let mut master: StdRng = match seed {
        Some(s) => SeedableRng::seed_from_u64(s),
        None => SeedableRng::seed_from_u64(rng().random()),
    };

    for attempt in 1..=max_attempts {
        let mut sim = Simulation::from_rng(count, StdRng::seed_from_u64(master.random()))?;

        match sim.settle(max_iterations) {
            Ok(outcome) => {
                let positions = sim.positions();
                if layout_is_valid(&positions) {
                    debug!(
                        "attempt {attempt}: accepted after {} iterations ({:?})",
                        outcome.iterations, outcome.status
                    );
                    return Ok(Layout {
                        positions,
                        attempts: attempt,
                        iterations: outcome.iterations,
                        status: outcome.status,
                    });
                }
                debug!("attempt {attempt}: layout rejected, restarting from a fresh placement");
            }
            Err(Error::NonConvergent { iterations }) => {
                warn!("attempt {attempt}: no convergence within {iterations} iterations, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::RetriesExhausted {
        attempts: max_attempts,
    })
}
