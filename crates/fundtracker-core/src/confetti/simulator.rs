//! Confetti simulator.
//!
//! A two-state machine driven by the host's frame callback. It does not
//! own a timer or a thread: the host calls `step()` once per requested
//! frame with the current timestamp, and each step requests the next frame
//! until the run's duration has elapsed.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut sim = ConfettiSimulator::new(ConfettiConfig::default())?;
//! sim.start(3000, now, &mut surface, &mut frames, &mut rng);
//! // In the frame callback:
//! sim.step(now, &mut surface, &mut frames); // Some(Event) when the run ends
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::ConfettiConfig;
use super::particle::Particle;
use super::random::RandomSource;
use super::surface::{FrameDriver, RenderSurface};
use crate::error::ValidationError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulatorState {
    Idle,
    Running,
}

/// Bookkeeping for the active batch.
#[derive(Debug, Clone)]
struct Run {
    started_at_ms: f64,
    duration_ms: u64,
    width: f64,
    height: f64,
    frames: u64,
}

#[derive(Debug, Clone)]
pub struct ConfettiSimulator {
    config: ConfettiConfig,
    particles: Vec<Particle>,
    run: Option<Run>,
}

impl ConfettiSimulator {
    /// Build an idle simulator. The config is validated up front so a run
    /// never starts with an empty palette.
    pub fn new(config: ConfettiConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            config,
            particles: Vec::new(),
            run: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SimulatorState {
        if self.run.is_some() {
            SimulatorState::Running
        } else {
            SimulatorState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn config(&self) -> &ConfettiConfig {
        &self.config
    }

    /// Working dimensions of the active run.
    pub fn dimensions(&self) -> Option<(f64, f64)> {
        self.run.as_ref().map(|r| (r.width, r.height))
    }

    /// Milliseconds since start, or `None` when idle.
    pub fn elapsed_ms(&self, now_ms: f64) -> Option<f64> {
        self.run.as_ref().map(|r| now_ms - r.started_at_ms)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Spawn a batch sized to the surface and begin a run.
    ///
    /// Ignored while a run is active: the current batch keeps its full
    /// duration and no second batch is created.
    pub fn start(
        &mut self,
        duration_ms: u64,
        now_ms: f64,
        surface: &mut dyn RenderSurface,
        frames: &mut dyn FrameDriver,
        rng: &mut dyn RandomSource,
    ) -> Option<Event> {
        if self.is_running() {
            debug!("confetti already running, trigger ignored");
            return None;
        }

        let width = surface.width();
        let height = surface.height();
        let count = self.config.particle_count(width);
        self.particles = (0..count)
            .map(|_| Particle::spawn(rng, width, height, &self.config.palette, duration_ms))
            .collect();

        surface.set_visible(true);
        self.run = Some(Run {
            started_at_ms: now_ms,
            duration_ms,
            width,
            height,
            frames: 0,
        });
        frames.request_frame();
        debug!(count, duration_ms, width, height, "confetti started");

        Some(Event::ConfettiStarted {
            particle_count: count,
            duration_ms,
            at: Utc::now(),
        })
    }

    /// Advance and redraw every particle. Returns `Some(Event::ConfettiFinished)`
    /// on the frame that ends the run. No-op while idle.
    pub fn step(
        &mut self,
        now_ms: f64,
        surface: &mut dyn RenderSurface,
        frames: &mut dyn FrameDriver,
    ) -> Option<Event> {
        let run = self.run.as_mut()?;
        run.frames += 1;

        surface.clear();
        for particle in &mut self.particles {
            particle.advance(self.config.gravity);
            surface.fill_rotated_rect(particle.rect());
        }
        surface.present();

        let elapsed = now_ms - run.started_at_ms;
        if elapsed < run.duration_ms as f64 {
            frames.request_frame();
            return None;
        }

        let frame_count = run.frames;
        self.finish(surface, frames);
        Some(Event::ConfettiFinished {
            frames: frame_count,
            at: Utc::now(),
        })
    }

    /// Track a resized surface without restarting the batch. Ignored when idle.
    pub fn resize(&mut self, width: f64, height: f64) {
        if let Some(run) = self.run.as_mut() {
            run.width = width;
            run.height = height;
            debug!(width, height, "confetti surface resized");
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, surface: &mut dyn RenderSurface, frames: &mut dyn FrameDriver) {
        frames.cancel_frame();
        surface.clear();
        surface.present();
        surface.set_visible(false);
        self.particles = Vec::new();
        self.run = None;
        debug!("confetti finished");
    }
}
