//! Vertical physics for the runner
//!
//! Semi-implicit Euler under constant gravity. The integrator never
//! decides to jump; the trigger arms one by setting `velocity` to the
//! configured jump velocity before the next step.

use super::state::{RunnerState, SimConfig};

/// Advance the runner's vertical state by `dt` seconds.
///
/// `dt` must already be clamped by the scheduler. Velocity updates before
/// position (semi-implicit), the offset is floored at the ground line, and
/// ground contact with downward velocity clamps velocity to zero.
pub fn integrate(runner: &mut RunnerState, config: &SimConfig, dt: f32) {
    runner.velocity += config.gravity * dt;
    runner.offset = (runner.offset + runner.velocity * dt).max(0.0);
    if runner.offset == 0.0 && runner.velocity < 0.0 {
        runner.velocity = 0.0;
    }
}
