//! Per-frame jump arming
//!
//! Two variants share one contract: arm at most one jump per obstacle
//! approach, never while airborne, and clear the trigger memory once no
//! obstacle is in range so the next qualifying obstacle can fire.

use super::state::{Corpus, RunnerState, SimConfig};
use crate::consts::*;

/// Scroll-synced variant. The world moves discontinuously with the user's
/// scroll, so the decision reacts to where the obstacle currently is: arm
/// when an obstacle's projected span overlaps the fixed band around the
/// runner's ground line.
pub fn position_window(
    runner: &mut RunnerState,
    corpus: &Corpus,
    scroll_offset: f32,
    config: &SimConfig,
) {
    let in_band = corpus.obstacles.iter().find(|obstacle| {
        // Runner's ground line sits at 0 in lane coordinates
        let lane_pos = scroll_offset - obstacle.world_pos;
        let lo = lane_pos - obstacle.width / 2.0;
        let hi = lane_pos + obstacle.width / 2.0;
        hi >= -TRIGGER_BAND_BELOW && lo <= TRIGGER_BAND_ABOVE
    });

    match in_band {
        Some(obstacle) => {
            if runner.is_grounded() && runner.last_triggered != Some(obstacle.id) {
                runner.velocity = config.jump_velocity;
                runner.last_triggered = Some(obstacle.id);
            }
        }
        None => runner.last_triggered = None,
    }
}

/// Clock-driven variant. The run speed is fixed, so the decision predicts:
/// launch early enough that the arc's carry clears the obstacle regardless
/// of frame-rate jitter.
pub fn lookahead(runner: &mut RunnerState, corpus: &Corpus, distance: f32, config: &SimConfig) {
    let next = corpus
        .obstacles
        .iter()
        .find(|obstacle| obstacle.trailing_edge() - distance >= RUNNER_ANCHOR_X);

    match next {
        Some(obstacle) => {
            let ahead = obstacle.leading_edge() - distance - RUNNER_ANCHOR_X;
            let trigger_ahead = (config.jump_carry() - obstacle.width / 2.0).max(MIN_JUMP_LEAD);
            if ahead <= trigger_ahead
                && runner.is_grounded()
                && runner.last_triggered != Some(obstacle.id)
            {
                runner.velocity = config.jump_velocity;
                runner.last_triggered = Some(obstacle.id);
            }
        }
        None => runner.last_triggered = None,
    }
}
