mod config;
mod particle;
mod random;
mod simulator;
mod surface;

pub use config::{ConfettiConfig, Rgb, DEFAULT_PALETTE};
pub use particle::Particle;
pub use random::{PcgRandom, RandomSource, SequenceRandom};
pub use simulator::{ConfettiSimulator, SimulatorState};
pub use surface::{FrameDriver, HiddenSurface, RenderSurface, RotatedRect};
