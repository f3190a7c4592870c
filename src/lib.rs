//! Baseband signal synthesis for pulsed and FMCW radar systems.
//!
//! Describe a radar (waveform, MIMO antenna geometry, patterns, modulation,
//! phase noise) and a scene of point targets; [`simulation::run_simulation`]
//! produces the complex I/Q samples the receiver's ADC would observe,
//! reproducibly for a given seed.

pub mod antenna;
pub mod constants;
pub mod error;
pub mod phase_noise;
pub mod radar;
pub mod receiver;
pub mod simulation;
pub mod target;
pub mod transmitter;
pub mod waveform;

pub use error::{RadarError, RadarResult};
pub use radar::{MotionInput, Radar, RadarOptions};
pub use receiver::{BasebandType, Receiver, ReceiverConfig};
pub use simulation::{run_simulation, SimulationOptions, SimulationResult};
pub use target::{Coordinate, ReflectionModel, Scattering, Target};
pub use transmitter::{PhaseNoiseMask, Transmitter, TransmitterConfig};
pub use waveform::{PerPulse, Waveform, WaveformConfig};
