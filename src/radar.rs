use crate::error::{RadarError, RadarResult};
use crate::phase_noise::phase_noise_envelope;
use crate::receiver::Receiver;
use crate::target::Pose;
use crate::transmitter::Transmitter;
use ndarray::Array3;
use num_complex::Complex64;
use tracing::info;

/// One component of the platform state: a constant, or a field with one
/// value per baseband sample.
#[derive(Debug, Clone)]
pub enum MotionInput {
    Scalar(f64),
    Field(Array3<f64>),
}

impl From<f64> for MotionInput {
    fn from(v: f64) -> Self {
        MotionInput::Scalar(v)
    }
}

fn scalar_triplet(v: [f64; 3]) -> [MotionInput; 3] {
    v.map(MotionInput::Scalar)
}

/// Optional radar-level parameters.
#[derive(Debug, Clone)]
pub struct RadarOptions {
    /// Platform location [x, y, z] (m, default: origin)
    pub location: [MotionInput; 3],
    /// Platform velocity [vx, vy, vz] (m/s, default: 0)
    pub speed: [MotionInput; 3],
    /// Platform attitude [yaw, pitch, roll] (deg, default: 0)
    pub rotation: [MotionInput; 3],
    /// Attitude rates [yaw, pitch, roll] (deg/s, default: 0)
    pub rotation_rate: [MotionInput; 3],
    /// Frame start times (s, default: a single frame at 0)
    pub frame_time: Vec<f64>,
    /// Noise seed; a fresh one is drawn from OS entropy when absent
    pub seed: Option<u64>,
    /// Replace noise draws with constants for baseline tests
    pub validation: bool,
}

impl Default for RadarOptions {
    fn default() -> Self {
        RadarOptions {
            location: scalar_triplet([0.0; 3]),
            speed: scalar_triplet([0.0; 3]),
            rotation: scalar_triplet([0.0; 3]),
            rotation_rate: scalar_triplet([0.0; 3]),
            frame_time: vec![0.0],
            seed: None,
            validation: false,
        }
    }
}

impl RadarOptions {
    pub fn with_location(mut self, location: [f64; 3]) -> Self {
        self.location = scalar_triplet(location);
        self
    }

    pub fn with_speed(mut self, speed: [f64; 3]) -> Self {
        self.speed = scalar_triplet(speed);
        self
    }

    pub fn with_rotation(mut self, rotation_deg: [f64; 3]) -> Self {
        self.rotation = scalar_triplet(rotation_deg);
        self
    }

    pub fn with_rotation_rate(mut self, rate_deg: [f64; 3]) -> Self {
        self.rotation_rate = scalar_triplet(rate_deg);
        self
    }

    pub fn with_frame_time(mut self, frame_time: Vec<f64>) -> Self {
        self.frame_time = frame_time;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Per-sample platform state, either closed-form or fully expanded fields.
/// Rotations are stored in radians.
#[derive(Debug, Clone)]
pub enum PlatformMotion {
    Scalar {
        location: [f64; 3],
        speed: [f64; 3],
        rotation: [f64; 3],
        rotation_rate: [f64; 3],
    },
    Field {
        location: [Array3<f64>; 3],
        speed: [Array3<f64>; 3],
        rotation: [Array3<f64>; 3],
        rotation_rate: [Array3<f64>; 3],
    },
}

impl PlatformMotion {
    /// Pose of the platform for the sample at cube index `idx`, absolute
    /// time `t`.
    pub fn pose_at(&self, idx: (usize, usize, usize), t: f64) -> Pose {
        match self {
            PlatformMotion::Scalar {
                location,
                speed,
                rotation,
                rotation_rate,
            } => Pose {
                position: [
                    location[0] + speed[0] * t,
                    location[1] + speed[1] * t,
                    location[2] + speed[2] * t,
                ],
                rotation: [
                    rotation[0] + rotation_rate[0] * t,
                    rotation[1] + rotation_rate[1] * t,
                    rotation[2] + rotation_rate[2] * t,
                ],
            },
            PlatformMotion::Field {
                location, rotation, ..
            } => Pose {
                position: [location[0][idx], location[1][idx], location[2][idx]],
                rotation: [rotation[0][idx], rotation[1][idx], rotation[2][idx]],
            },
        }
    }
}

/// A fully assembled radar: transmitter and receiver fused into a virtual
/// array with derived timestamps, platform state, phase-noise envelope and
/// thermal-noise amplitude. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct Radar {
    pub transmitter: Transmitter,
    pub receiver: Receiver,
    /// Number of samples in one pulse
    pub samples_per_pulse: usize,
    /// Number of virtual channels (tx count times rx count)
    pub channel_size: usize,
    /// Number of frames
    pub frames: usize,
    /// Frame start times (s)
    pub frame_time: Vec<f64>,
    /// Virtual-array element locations, channel order `tx * n_rx + rx`
    pub virtual_array: Vec<[f64; 3]>,
    /// Absolute time of every sample, `[frames * channels, pulses, samples]`
    pub timestamp: Array3<f64>,
    pub motion: PlatformMotion,
    /// Oscillator phase-noise envelope, same shape as the baseband cube
    pub phase_noise: Option<Array3<Complex64>>,
    /// Peak thermal-noise amplitude (V)
    pub noise_amplitude: f64,
    pub validation: bool,
    seed: u64,
}

impl Radar {
    pub fn new(transmitter: Transmitter, receiver: Receiver) -> RadarResult<Self> {
        Self::with_options(transmitter, receiver, RadarOptions::default())
    }

    pub fn with_options(
        transmitter: Transmitter,
        receiver: Receiver,
        options: RadarOptions,
    ) -> RadarResult<Self> {
        let samples_per_pulse =
            (transmitter.waveform.pulse_length * receiver.fs) as usize;
        if samples_per_pulse == 0 {
            return Err(RadarError::InvalidConfig(
                "sampling rate too low: a pulse covers less than one sample".into(),
            ));
        }
        if options.frame_time.is_empty() {
            return Err(RadarError::InvalidConfig(
                "`frame_time` must contain at least one frame".into(),
            ));
        }

        let channel_size = transmitter.channel_size() * receiver.channel_size();
        let frames = options.frame_time.len();
        let pulses = transmitter.waveform.pulses;

        let mut virtual_array = Vec::with_capacity(channel_size);
        for tx in &transmitter.channels {
            for rx in &receiver.channels {
                virtual_array.push([
                    tx.location[0] + rx.location[0],
                    tx.location[1] + rx.location[1],
                    tx.location[2] + rx.location[2],
                ]);
            }
        }

        let timestamp = generate_timestamp(
            &options.frame_time,
            &transmitter,
            receiver.channel_size(),
            receiver.fs,
            samples_per_pulse,
        );

        let seed = options.seed.unwrap_or_else(rand::random);

        let phase_noise = match &transmitter.phase_noise {
            Some(mask) => {
                let rows = frames * channel_size * pulses;
                let envelope = phase_noise_envelope(
                    mask,
                    receiver.fs,
                    rows,
                    samples_per_pulse,
                    seed,
                    options.validation,
                );
                let cube = envelope
                    .into_shape((frames * channel_size, pulses, samples_per_pulse))
                    .expect("phase noise rows match the baseband cube");
                Some(cube)
            }
            None => None,
        };

        let motion = expand_motion(&options, &timestamp)?;
        let noise_amplitude = receiver.noise_amplitude();

        info!(
            channels = channel_size,
            pulses,
            samples = samples_per_pulse,
            frames,
            seed,
            "radar assembled"
        );

        Ok(Radar {
            transmitter,
            receiver,
            samples_per_pulse,
            channel_size,
            frames,
            frame_time: options.frame_time,
            virtual_array,
            timestamp,
            motion,
            phase_noise,
            noise_amplitude,
            validation: options.validation,
            seed,
        })
    }

    /// The seed in effect for every noise draw of this radar
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

fn generate_timestamp(
    frame_time: &[f64],
    transmitter: &Transmitter,
    rx_channels: usize,
    fs: f64,
    samples: usize,
) -> Array3<f64> {
    let pulses = transmitter.waveform.pulses;
    let starts = &transmitter.waveform.pulse_start_time;
    let channels = transmitter.channel_size() * rx_channels;
    Array3::from_shape_fn(
        (frame_time.len() * channels, pulses, samples),
        |(row, p, k)| {
            let frame = row / channels;
            let tx = (row % channels) / rx_channels;
            frame_time[frame]
                + transmitter.channels[tx].delay
                + starts[p]
                + k as f64 / fs
        },
    )
}

fn expand_motion(options: &RadarOptions, timestamp: &Array3<f64>) -> RadarResult<PlatformMotion> {
    let any_field = options
        .location
        .iter()
        .chain(&options.speed)
        .chain(&options.rotation)
        .chain(&options.rotation_rate)
        .any(|m| matches!(m, MotionInput::Field(_)));

    if !any_field {
        let scalar = |m: &[MotionInput; 3]| -> [f64; 3] {
            m.each_ref().map(|c| match c {
                MotionInput::Scalar(v) => *v,
                MotionInput::Field(_) => unreachable!(),
            })
        };
        return Ok(PlatformMotion::Scalar {
            location: scalar(&options.location),
            speed: scalar(&options.speed),
            rotation: scalar(&options.rotation).map(f64::to_radians),
            rotation_rate: scalar(&options.rotation_rate).map(f64::to_radians),
        });
    }

    let shape = timestamp.dim();
    let check = |field: &Array3<f64>, what: &str| -> RadarResult<()> {
        if field.dim() != shape {
            return Err(RadarError::ShapeMismatch(format!(
                "`{what}` field has shape {:?}, expected {:?}",
                field.dim(),
                shape
            )));
        }
        Ok(())
    };

    fn three<F>(mut component: F) -> RadarResult<[Array3<f64>; 3]>
    where
        F: FnMut(usize) -> RadarResult<Array3<f64>>,
    {
        Ok([component(0)?, component(1)?, component(2)?])
    }

    let expand = |m: &MotionInput, what: String, fill: &dyn Fn(f64) -> Array3<f64>| match m {
        MotionInput::Field(field) => {
            check(field, &what)?;
            Ok::<Array3<f64>, RadarError>(field.clone())
        }
        MotionInput::Scalar(v) => Ok(fill(*v)),
    };

    let constant = |v: f64| Array3::from_elem(shape, v);

    let speed = three(|c| expand(&options.speed[c], format!("speed[{c}]"), &constant))?;

    let location = three(|c| {
        let fill = |v: f64| &speed[c] * timestamp + v;
        expand(&options.location[c], format!("location[{c}]"), &fill)
    })?;

    let rotation_rate = three(|c| {
        let expanded = expand(
            &options.rotation_rate[c],
            format!("rotation_rate[{c}]"),
            &constant,
        )?;
        Ok(expanded.mapv(f64::to_radians))
    })?;

    let rotation = three(|c| match &options.rotation[c] {
        MotionInput::Field(field) => {
            check(field, &format!("rotation[{c}]"))?;
            Ok(field.mapv(f64::to_radians))
        }
        MotionInput::Scalar(v) => Ok(&rotation_rate[c] * timestamp + v.to_radians()),
    })?;

    Ok(PlatformMotion::Field {
        location,
        speed,
        rotation,
        rotation_rate,
    })
}
