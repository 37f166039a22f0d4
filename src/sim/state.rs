//! Run state and core simulation types

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// A single course obstacle. Immutable once built; a corpus rebuild
/// replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Unique within a corpus, strictly increasing in generation order
    pub id: u32,
    /// Short display label (already shortened/truncated)
    pub label: String,
    /// Center position along the run axis in world units: scroll distance
    /// in scroll-synced mode, run distance in clock-driven mode
    pub world_pos: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    #[inline]
    pub fn leading_edge(&self) -> f32 {
        self.world_pos - self.width / 2.0
    }

    #[inline]
    pub fn trailing_edge(&self) -> f32 {
        self.world_pos + self.width / 2.0
    }
}

/// The full ordered obstacle set for the current layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub obstacles: Vec<Obstacle>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// World position of the last obstacle (0 for an empty corpus)
    pub fn track_end(&self) -> f32 {
        self.obstacles.last().map(|o| o.world_pos).unwrap_or(0.0)
    }
}

/// Mutable per-run state, owned exclusively by the simulation loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerState {
    /// Displacement above the ground line, never negative
    pub offset: f32,
    /// Vertical velocity, positive = upward
    pub velocity: f32,
    /// Obstacle id of the last armed jump; blocks re-triggering the same
    /// obstacle while still airborne over it
    pub last_triggered: Option<u32>,
    /// Monotonic clock reading of the previous tick, milliseconds
    pub last_frame_ms: Option<f64>,
}

impl RunnerState {
    /// Grounded = resting on (or within epsilon of) the ground line and
    /// not moving upward
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.offset <= GROUND_EPSILON && self.velocity <= 0.0
    }
}

/// Which signal advances the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PositionSource {
    /// World position follows the host page's scroll offset
    Scroll { offset: f32 },
    /// World position advances autonomously at the configured run speed
    Clock { distance: f32 },
}

impl PositionSource {
    #[inline]
    pub fn position(&self) -> f32 {
        match self {
            PositionSource::Scroll { offset } => *offset,
            PositionSource::Clock { distance } => *distance,
        }
    }
}

/// Operating mode of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// World follows the user's scroll position (vertical run axis)
    ScrollSynced,
    /// World advances on its own clock (horizontal run axis, loops)
    ClockDriven,
}

/// Read-only per-mode constants, selected by viewport breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Negative, world units per second squared
    pub gravity: f32,
    /// Positive, world units per second
    pub jump_velocity: f32,
    /// Clock-driven horizontal speed, world units per second
    pub run_speed: f32,
    /// Narrow-viewport layout flag
    pub compact: bool,
    /// Current viewport (width, height) in rendering units
    pub viewport: (f32, f32),
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::for_viewport(DEFAULT_VIEWPORT.0, DEFAULT_VIEWPORT.1)
    }
}

impl SimConfig {
    pub fn for_viewport(width: f32, height: f32) -> Self {
        let compact = width < COMPACT_BREAKPOINT;
        let (jump_scale, run_scale) = if compact {
            (COMPACT_JUMP_SCALE, COMPACT_RUN_SCALE)
        } else {
            (1.0, 1.0)
        };
        Self {
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY * jump_scale,
            run_speed: RUN_SPEED * run_scale,
            compact,
            viewport: (width, height),
        }
    }

    /// Time from launch to the top of the arc, seconds
    #[inline]
    pub fn apex_time(&self) -> f32 {
        self.jump_velocity / self.gravity.abs()
    }

    /// Horizontal distance a full jump carries in clock-driven mode
    #[inline]
    pub fn jump_carry(&self) -> f32 {
        self.run_speed * self.apex_time() * 2.0
    }

    /// Visible run-axis extent in clock-driven mode
    #[inline]
    pub fn arena_width(&self) -> f32 {
        self.viewport.0
    }

    /// Visible run-axis extent in scroll-synced mode
    #[inline]
    pub fn lane_extent(&self) -> f32 {
        self.viewport.1
    }
}
