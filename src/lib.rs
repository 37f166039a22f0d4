//! Scroll Runner - a side-scrolling auto-runner widget for content pages
//!
//! Core modules:
//! - `sim`: Deterministic simulation (obstacle corpus, physics, jump
//!   triggers, screen projection)
//! - `platform`: Browser/native platform abstraction
//!
//! The widget runs in one of two modes: scroll-synced (the world advances
//! with the page's scroll offset) or clock-driven (the world advances
//! autonomously at a fixed run speed). There is no player input; jumps are
//! armed automatically ahead of each obstacle.

pub mod platform;
pub mod sim;

pub use sim::{Engine, FrameView, RunMode};

/// Widget tuning constants
pub mod consts {
    /// Gravity, world units per second squared (negative = downward)
    pub const GRAVITY: f32 = -1900.0;
    /// Launch velocity applied when a jump is armed, units per second
    pub const JUMP_VELOCITY: f32 = 860.0;
    /// Horizontal run speed in clock-driven mode, units per second
    pub const RUN_SPEED: f32 = 178.0;

    /// Viewport width below which the compact layout applies
    pub const COMPACT_BREAKPOINT: f32 = 768.0;
    /// Jump velocity scale in compact layout
    pub const COMPACT_JUMP_SCALE: f32 = 0.88;
    /// Run speed scale in compact layout
    pub const COMPACT_RUN_SCALE: f32 = 0.85;
    /// Obstacle dimension scale in compact layout
    pub const COMPACT_DIM_SCALE: f32 = 0.85;

    /// Frame delta-time ceiling in seconds; defends against tab
    /// backgrounding producing a huge catch-up step
    pub const MAX_FRAME_DT: f32 = 0.05;
    /// Offset at or below which the runner counts as grounded
    pub const GROUND_EPSILON: f32 = 1.0;

    /// Scroll-synced trigger band below the ground line (px)
    pub const TRIGGER_BAND_BELOW: f32 = 24.0;
    /// Scroll-synced trigger band above the ground line (px)
    pub const TRIGGER_BAND_ABOVE: f32 = 26.0;
    /// Smallest lookahead distance the clock-driven trigger will accept
    pub const MIN_JUMP_LEAD: f32 = 60.0;

    /// Minimum world-space gap between consecutive obstacles; guarantees a
    /// feasible jump window exists between any pair
    pub const MIN_OBSTACLE_GAP: f32 = 220.0;
    /// Content blocks shorter than this are skipped by the builder
    pub const MIN_BLOCK_HEIGHT: f32 = 140.0;
    /// Lead offset ahead of a block, as a fraction of viewport height
    pub const BLOCK_LEAD_FACTOR: f32 = 0.35;

    /// Obstacle width = clamp(base + label_len * char_w, base, max)
    pub const OBSTACLE_BASE_WIDTH: f32 = 46.0;
    pub const OBSTACLE_MAX_WIDTH: f32 = 150.0;
    pub const LABEL_CHAR_WIDTH: f32 = 7.2;
    /// Obstacle heights cycle through this palette in corpus order
    pub const HEIGHT_PALETTE: [f32; 4] = [34.0, 46.0, 40.0, 52.0];

    /// Label shortening limits (normal / compact)
    pub const LABEL_MAX_WORDS: usize = 3;
    pub const LABEL_MAX_WORDS_COMPACT: usize = 2;
    pub const LABEL_MAX_CHARS: usize = 22;
    pub const LABEL_MAX_CHARS_COMPACT: usize = 18;

    /// Runner ground line distance from the lane bottom (px)
    pub const GROUND_OFFSET: f32 = 18.0;
    /// Runner's fixed screen-space anchor along the run axis (px)
    pub const RUNNER_ANCHOR_X: f32 = 72.0;
    /// Peak horizontal sway during a scroll-synced jump (px)
    pub const RUNNER_SWAY: f32 = 14.0;
    /// Off-screen margin within which obstacles are still emitted (px)
    pub const OVERDRAW: f32 = 120.0;

    /// Viewport assumed when the host provides no dimensions
    pub const DEFAULT_VIEWPORT: (f32, f32) = (1280.0, 800.0);
    /// Corpus rebuild delay after mount, for late content reflow (ms)
    pub const SETTLE_DELAY_MS: i32 = 1200;

    /// Fallback course parameters
    pub const FALLBACK_SEED: u64 = 47;
    pub const FALLBACK_GAP_JITTER: f32 = 90.0;
}

/// Normalized progress through a jump arc: 0 at launch, 0.5 at the apex,
/// 1 at landing. Derived from velocity, which falls linearly under
/// constant gravity.
#[inline]
pub fn jump_progress(velocity: f32, jump_velocity: f32) -> f32 {
    if jump_velocity <= 0.0 {
        return 0.0;
    }
    ((jump_velocity - velocity) / (2.0 * jump_velocity)).clamp(0.0, 1.0)
}
