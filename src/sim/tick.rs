//! The per-frame engine
//!
//! Both modes run the same pipeline with a different position signal and
//! trigger variant: read position, decide jump, integrate, project. The
//! scheduler hands in monotonic timestamps; everything below `frame` is
//! clock-free and deterministic.

use serde::{Deserialize, Serialize};

use super::corpus::{ContentBlock, build_corpus};
use super::project::{self, FrameView};
use super::state::{Corpus, PositionSource, RunMode, RunnerState, SimConfig};
use super::{physics, trigger};
use crate::consts::MAX_FRAME_DT;

/// External signals sampled for one tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Current page scroll offset; ignored in clock-driven mode
    pub scroll_offset: Option<f32>,
}

/// One parameterized run engine covering both modes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    pub config: SimConfig,
    pub corpus: Corpus,
    pub runner: RunnerState,
    pub source: PositionSource,
}

impl Engine {
    pub fn new(mode: RunMode, config: SimConfig) -> Self {
        let source = match mode {
            RunMode::ScrollSynced => PositionSource::Scroll { offset: 0.0 },
            RunMode::ClockDriven => PositionSource::Clock { distance: 0.0 },
        };
        Self {
            config,
            corpus: Corpus::default(),
            runner: RunnerState::default(),
            source,
        }
    }

    pub fn mode(&self) -> RunMode {
        match self.source {
            PositionSource::Scroll { .. } => RunMode::ScrollSynced,
            PositionSource::Clock { .. } => RunMode::ClockDriven,
        }
    }

    /// Atomically replace the corpus from the current content structure.
    /// Trigger memory is cleared so no stale obstacle id survives into the
    /// new course.
    pub fn rebuild_corpus(&mut self, blocks: &[ContentBlock]) {
        self.corpus = build_corpus(blocks, &self.config);
        self.runner.last_triggered = None;
        log::info!(
            "corpus rebuilt: {} obstacles, track end {:.0}",
            self.corpus.len(),
            self.corpus.track_end()
        );
        log::debug!(
            "labels: {:?}",
            self.corpus
                .obstacles
                .iter()
                .map(|o| o.label.as_str())
                .collect::<Vec<_>>()
        );
    }

    /// Reselect per-mode constants for a new viewport. The caller decides
    /// whether the corpus needs rebuilding afterwards.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.config = SimConfig::for_viewport(width, height);
    }

    /// Scheduler entry point: derive a clamped delta-time from the
    /// monotonic timestamp, then run one step. The first frame seeds the
    /// timestamp and steps with dt = 0.
    pub fn frame(&mut self, input: &TickInput, now_ms: f64) -> FrameView {
        let dt = match self.runner.last_frame_ms {
            Some(prev) => (((now_ms - prev) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT),
            None => 0.0,
        };
        self.runner.last_frame_ms = Some(now_ms);
        self.step(input, dt)
    }

    /// One simulation step with an already-clamped dt
    pub fn step(&mut self, input: &TickInput, dt: f32) -> FrameView {
        // 1. Position signal
        match &mut self.source {
            PositionSource::Scroll { offset } => {
                if let Some(scroll) = input.scroll_offset {
                    *offset = scroll;
                }
            }
            PositionSource::Clock { distance } => {
                // Wrap before advancing: the tick after the track fully
                // scrolls past restarts the loop from zero
                if project::clock_wrapped(&self.corpus, *distance, &self.config) {
                    *distance = 0.0;
                    self.runner.last_triggered = None;
                }
                *distance += self.config.run_speed * dt;
            }
        }
        let position = self.source.position();

        // 2. Jump decision
        match self.source {
            PositionSource::Scroll { .. } => {
                trigger::position_window(&mut self.runner, &self.corpus, position, &self.config);
            }
            PositionSource::Clock { .. } => {
                trigger::lookahead(&mut self.runner, &self.corpus, position, &self.config);
            }
        }

        // 3. Physics
        physics::integrate(&mut self.runner, &self.config, dt);

        // 4. Projection
        match self.source {
            PositionSource::Scroll { .. } => {
                project::scroll_view(&self.runner, &self.corpus, position, &self.config)
            }
            PositionSource::Clock { .. } => {
                project::clock_view(&self.runner, &self.corpus, position, &self.config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::state::Obstacle;

    const DT: f32 = 1.0 / 60.0;

    fn clock_engine(positions: &[f32]) -> Engine {
        let mut engine = Engine::new(RunMode::ClockDriven, SimConfig::default());
        engine.corpus = Corpus {
            obstacles: positions
                .iter()
                .enumerate()
                .map(|(i, p)| Obstacle {
                    id: i as u32 + 1,
                    label: format!("ob-{}", i + 1),
                    world_pos: *p,
                    width: 60.0,
                    height: 40.0,
                })
                .collect(),
        };
        engine
    }

    #[test]
    fn test_first_frame_seeds_timestamp() {
        let mut engine = clock_engine(&[600.0]);
        let view = engine.frame(&TickInput::default(), 1000.0);
        assert_eq!(engine.runner.last_frame_ms, Some(1000.0));
        // dt was 0: nothing moved
        assert_eq!(engine.source.position(), 0.0);
        assert_eq!(view.runner.pos.y, GROUND_OFFSET);
    }

    #[test]
    fn test_frame_dt_is_clamped() {
        let mut engine = clock_engine(&[6000.0]);
        engine.frame(&TickInput::default(), 0.0);
        // A 2-second gap (tab backgrounded) advances at most MAX_FRAME_DT
        engine.frame(&TickInput::default(), 2000.0);
        let expected = engine.config.run_speed * MAX_FRAME_DT;
        assert!((engine.source.position() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_end_to_end_clock_run() {
        // Corpus of 3 obstacles; the runner must arm before each leading
        // edge arrives and be grounded again before the trailing edge
        // passes.
        let mut engine = clock_engine(&[300.0, 520.0, 760.0]);
        assert!((engine.config.run_speed - 178.0).abs() < 1e-6);

        let mut armed_at: Option<f32> = None;
        let mut landed_before_trailing = false;
        let first_leading = 300.0 - 30.0;
        let first_trailing = 300.0 + 30.0;

        let input = TickInput::default();
        for _ in 0..400 {
            engine.step(&input, DT);
            let distance = engine.source.position();

            if armed_at.is_none() && engine.runner.last_triggered == Some(1) {
                armed_at = Some(distance);
            }
            // Trailing edge passes the runner's anchor
            if distance + RUNNER_ANCHOR_X >= first_trailing {
                landed_before_trailing = engine.runner.offset == 0.0;
                break;
            }
        }

        let armed_at = armed_at.expect("jump never armed for first obstacle");
        assert!(
            armed_at + RUNNER_ANCHOR_X < first_leading,
            "armed too late: distance {armed_at}"
        );
        assert!(landed_before_trailing, "still airborne past trailing edge");
    }

    #[test]
    fn test_all_three_obstacles_trigger() {
        let mut engine = clock_engine(&[300.0, 520.0, 760.0]);
        let input = TickInput::default();
        let mut seen = Vec::new();
        for _ in 0..600 {
            engine.step(&input, DT);
            if let Some(id) = engine.runner.last_triggered {
                if seen.last() != Some(&id) {
                    seen.push(id);
                }
            }
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_clock_wraparound_resets() {
        let mut engine = clock_engine(&[300.0]);
        let wrap_at = engine.corpus.track_end() + engine.config.arena_width();
        let input = TickInput::default();

        let mut wrapped = false;
        let mut prev_distance = 0.0;
        for _ in 0..40_000 {
            engine.step(&input, DT);
            let distance = engine.source.position();
            if prev_distance > wrap_at {
                // The tick after crossing the threshold restarts from zero
                assert!(distance < prev_distance);
                assert!(distance <= engine.config.run_speed * DT + 1e-3);
                assert_eq!(engine.runner.last_triggered, None);
                wrapped = true;
                break;
            }
            prev_distance = distance;
        }
        assert!(wrapped, "track never wrapped");
    }

    #[test]
    fn test_scroll_engine_follows_signal() {
        let mut engine = Engine::new(RunMode::ScrollSynced, SimConfig::default());
        engine.corpus = Corpus {
            obstacles: vec![Obstacle {
                id: 1,
                label: "step".into(),
                world_pos: 500.0,
                width: 60.0,
                height: 40.0,
            }],
        };

        // No signal yet: position holds at zero
        engine.step(&TickInput::default(), DT);
        assert_eq!(engine.source.position(), 0.0);
        assert_eq!(engine.runner.last_triggered, None);

        // Scroll the obstacle onto the ground line: jump arms
        let input = TickInput {
            scroll_offset: Some(500.0),
        };
        engine.step(&input, DT);
        assert_eq!(engine.runner.last_triggered, Some(1));
        assert!(engine.runner.offset > 0.0);
    }

    #[test]
    fn test_rebuild_clears_trigger_memory() {
        let mut engine = clock_engine(&[300.0]);
        engine.runner.last_triggered = Some(1);
        engine.rebuild_corpus(&[]);
        assert_eq!(engine.runner.last_triggered, None);
        // Fallback course took over
        assert!(!engine.corpus.is_empty());
    }

    #[test]
    fn test_offset_never_negative_over_course() {
        let mut engine = clock_engine(&[300.0, 520.0, 760.0]);
        let input = TickInput::default();
        for _ in 0..2000 {
            engine.step(&input, DT);
            assert!(engine.runner.offset >= 0.0);
        }
    }
}
