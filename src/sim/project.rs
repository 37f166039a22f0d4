//! World-to-screen projection
//!
//! Pure mapping from simulation state to screen-space descriptors. Nothing
//! here draws; the host (or the DOM glue in the binary) consumes the
//! emitted `FrameView` each tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Corpus, RunnerState, SimConfig};
use crate::consts::*;
use crate::jump_progress;

/// Screen-space runner descriptor. `pos.x` is the position along the run
/// axis, `pos.y` the height above the lane bottom ("bottom" in CSS terms).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunnerView {
    pub pos: Vec2,
    pub airborne: bool,
}

/// Screen-space obstacle descriptor. `lane_pos` is the obstacle's center
/// along the run axis in rendering units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub id: u32,
    pub label: String,
    pub lane_pos: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything a rendering surface needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameView {
    pub runner: RunnerView,
    pub obstacles: Vec<ObstacleView>,
}

/// Scroll-synced projection. The runner is screen-anchored with a small
/// forward sway peaking mid-jump; obstacles march past as the user
/// scrolls. Only obstacles intersecting the visible lane (plus overdraw)
/// are emitted.
pub fn scroll_view(
    runner: &RunnerState,
    corpus: &Corpus,
    scroll_offset: f32,
    config: &SimConfig,
) -> FrameView {
    let airborne = !runner.is_grounded();
    let sway = if airborne {
        let progress = jump_progress(runner.velocity, config.jump_velocity);
        RUNNER_SWAY * (progress * std::f32::consts::PI).sin()
    } else {
        0.0
    };

    let lane = config.lane_extent();
    let obstacles = corpus
        .obstacles
        .iter()
        .filter_map(|obstacle| {
            let lane_pos = scroll_offset - obstacle.world_pos;
            let half = obstacle.width / 2.0;
            if lane_pos + half < -OVERDRAW || lane_pos - half > lane + OVERDRAW {
                return None;
            }
            Some(ObstacleView {
                id: obstacle.id,
                label: obstacle.label.clone(),
                lane_pos,
                width: obstacle.width,
                height: obstacle.height,
            })
        })
        .collect();

    FrameView {
        runner: RunnerView {
            pos: Vec2::new(RUNNER_ANCHOR_X + sway, GROUND_OFFSET + runner.offset),
            airborne,
        },
        obstacles,
    }
}

/// Clock-driven projection. The runner holds a fixed screen position while
/// the track slides left; obstacles outside the arena (plus overdraw) are
/// culled.
pub fn clock_view(
    runner: &RunnerState,
    corpus: &Corpus,
    distance: f32,
    config: &SimConfig,
) -> FrameView {
    let arena = config.arena_width();
    let obstacles = corpus
        .obstacles
        .iter()
        .filter_map(|obstacle| {
            let lane_pos = obstacle.world_pos - distance;
            let half = obstacle.width / 2.0;
            if lane_pos + half < -OVERDRAW || lane_pos - half > arena + OVERDRAW {
                return None;
            }
            Some(ObstacleView {
                id: obstacle.id,
                label: obstacle.label.clone(),
                lane_pos,
                width: obstacle.width,
                height: obstacle.height,
            })
        })
        .collect();

    FrameView {
        runner: RunnerView {
            pos: Vec2::new(RUNNER_ANCHOR_X, GROUND_OFFSET + runner.offset),
            airborne: !runner.is_grounded(),
        },
        obstacles,
    }
}

/// True once the whole track has scrolled past the arena; the engine then
/// wraps the run distance to zero and clears trigger memory, looping the
/// course seamlessly.
pub fn clock_wrapped(corpus: &Corpus, distance: f32, config: &SimConfig) -> bool {
    !corpus.is_empty() && distance > corpus.track_end() + config.arena_width()
}
