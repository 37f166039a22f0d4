//! Deterministic simulation module
//!
//! All run logic lives here. This module must be pure and deterministic:
//! - Delta time is handed in, never read from a clock
//! - Seeded RNG only (fallback course variation)
//! - No rendering or platform dependencies

pub mod corpus;
pub mod physics;
pub mod project;
pub mod state;
pub mod tick;
pub mod trigger;

pub use corpus::{ContentBlock, build_corpus};
pub use project::{FrameView, ObstacleView, RunnerView};
pub use state::{Corpus, Obstacle, PositionSource, RunMode, RunnerState, SimConfig};
pub use tick::{Engine, TickInput};
