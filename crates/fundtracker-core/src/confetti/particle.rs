use std::f64::consts::TAU;

use super::config::Rgb;
use super::random::RandomSource;
use super::surface::RotatedRect;

/// Height of the drawn rectangle relative to its width.
const ASPECT: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
    pub color: Rgb,
    pub rotation: f64,
    pub spin: f64,
    /// Per-particle lifetime budget in milliseconds. Informational only:
    /// the whole batch is discarded together when the run ends.
    pub ttl_ms: f64,
}

impl Particle {
    /// Spawn above the visible area with a downward-biased velocity.
    ///
    /// Draw order is fixed so a scripted [`RandomSource`] yields exact
    /// trajectories: x, y, vx, vy, size, color, rotation, spin, ttl.
    pub fn spawn(
        rng: &mut dyn RandomSource,
        width: f64,
        height: f64,
        palette: &[Rgb],
        duration_ms: u64,
    ) -> Self {
        let x = rng.next_unit() * width;
        let y = rng.next_unit() * -height * 0.5;
        let vx = (rng.next_unit() - 0.5) * 6.0;
        let vy = rng.next_unit() * 6.0 + 2.0;
        let size = rng.next_unit() * 8.0 + 6.0;
        let idx = (rng.next_unit() * palette.len() as f64) as usize;
        let color = palette[idx.min(palette.len().saturating_sub(1))];
        let rotation = rng.next_unit() * TAU;
        let spin = (rng.next_unit() - 0.5) * 0.2;
        let ttl_ms = rng.next_unit() * duration_ms as f64;
        Self {
            x,
            y,
            vx,
            vy,
            size,
            color,
            rotation,
            spin,
            ttl_ms,
        }
    }

    /// One frame of motion: move, apply gravity, rotate.
    pub fn advance(&mut self, gravity: f64) {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += gravity;
        self.rotation += self.spin;
    }

    pub fn rect(&self) -> RotatedRect {
        RotatedRect {
            x: self.x,
            y: self.y,
            width: self.size,
            height: self.size * ASPECT,
            rotation: self.rotation,
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confetti::config::DEFAULT_PALETTE;
    use crate::confetti::random::SequenceRandom;

    #[test]
    fn spawn_maps_unit_draws_to_ranges() {
        let mut rng = SequenceRandom::constant(0.5);
        let p = Particle::spawn(&mut rng, 800.0, 600.0, &DEFAULT_PALETTE, 3000);
        assert_eq!(p.x, 400.0);
        assert_eq!(p.y, -150.0);
        assert_eq!(p.vx, 0.0);
        assert_eq!(p.vy, 5.0);
        assert_eq!(p.size, 10.0);
        assert_eq!(p.color, DEFAULT_PALETTE[3]);
        assert_eq!(p.rotation, TAU * 0.5);
        assert_eq!(p.spin, 0.0);
        assert_eq!(p.ttl_ms, 1500.0);
    }

    #[test]
    fn spawn_starts_at_or_above_the_top_edge() {
        let mut rng = SequenceRandom::new(vec![0.0, 0.999, 0.3, 0.7, 0.1]);
        for _ in 0..20 {
            let p = Particle::spawn(&mut rng, 800.0, 600.0, &DEFAULT_PALETTE, 3000);
            assert!(p.y <= 0.0);
            assert!(p.vy >= 2.0);
            assert!((6.0..14.0).contains(&p.size));
        }
    }

    #[test]
    fn advance_applies_velocity_then_gravity() {
        let mut rng = SequenceRandom::constant(0.5);
        let mut p = Particle::spawn(&mut rng, 800.0, 600.0, &DEFAULT_PALETTE, 3000);
        p.vx = 1.0;
        p.spin = 0.1;
        p.advance(0.08);
        assert_eq!(p.x, 401.0);
        assert_eq!(p.y, -145.0);
        assert!((p.vy - 5.08).abs() < 1e-12);
        assert!((p.rotation - (TAU * 0.5 + 0.1)).abs() < 1e-12);
        p.advance(0.08);
        assert!((p.y - (-145.0 + 5.08)).abs() < 1e-12);
    }

    #[test]
    fn rect_is_sixty_percent_tall() {
        let mut rng = SequenceRandom::constant(0.5);
        let r = Particle::spawn(&mut rng, 800.0, 600.0, &DEFAULT_PALETTE, 3000).rect();
        assert_eq!(r.width, 10.0);
        assert_eq!(r.height, 6.0);
    }
}
