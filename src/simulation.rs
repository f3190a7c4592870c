use crate::antenna::polarization_factor;
use crate::constants::C;
use crate::radar::Radar;
use crate::receiver::{BasebandType, Receiver};
use crate::target::{relative_geometry, Scattering, Target};
use ndarray::parallel::prelude::*;
use ndarray::{Array3, ArrayViewMut2, Axis};
use num_complex::Complex64;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;
use tracing::info;

/// Noise streams at or above this base feed the thermal draws; the streams
/// below it belong to the phase-noise rows.
const THERMAL_STREAM_BASE: u64 = 1 << 32;

/// Options of a single simulation run.
#[derive(Clone, Copy)]
pub struct SimulationOptions<'a> {
    /// Add thermal noise to the baseband (default: true)
    pub noise: bool,
    /// A second radar whose transmissions leak into the receiver
    pub interference: Option<&'a Radar>,
}

impl Default for SimulationOptions<'_> {
    fn default() -> Self {
        SimulationOptions {
            noise: true,
            interference: None,
        }
    }
}

/// Output of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Complex baseband samples, `[frames * channels, pulses, samples]`
    pub baseband: Array3<Complex64>,
    /// Absolute time of each sample (s), same shape as `baseband`
    pub timestamp: Array3<f64>,
    /// Leakage from the interfering radar, same shape as `baseband`
    pub interference: Option<Array3<Complex64>>,
}

/// Synthesizes the baseband cube a radar observes from a scene of point
/// targets.
///
/// Each sample accumulates, per target, the radar-equation amplitude and the
/// beat phase between the local oscillator and the round-trip-delayed echo,
/// then applies pulse/waveform modulation, the oscillator phase-noise
/// envelope and thermal noise. The cube is partitioned along its outer
/// frame-channel axis across worker threads; every noise draw is keyed by
/// `(seed, row, pulse)` so the output is identical for any thread count.
pub fn run_simulation(
    radar: &Radar,
    targets: &[Target],
    options: &SimulationOptions,
) -> SimulationResult {
    let pulses = radar.transmitter.waveform.pulses;
    let samples = radar.samples_per_pulse;

    info!(
        targets = targets.len(),
        rows = radar.frames * radar.channel_size,
        pulses,
        samples,
        noise = options.noise,
        "synthesizing baseband"
    );

    let mut baseband = Array3::zeros((radar.frames * radar.channel_size, pulses, samples));
    baseband
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(row, plane)| synthesize_row(radar, targets, options.noise, row, plane));

    let interference = options
        .interference
        .map(|interferer| interference_cube(radar, interferer));

    SimulationResult {
        baseband,
        timestamp: radar.timestamp.clone(),
        interference,
    }
}

/// All pulses of one frame-channel row.
fn synthesize_row(
    radar: &Radar,
    targets: &[Target],
    noise: bool,
    row: usize,
    mut plane: ArrayViewMut2<Complex64>,
) {
    let n_rx = radar.receiver.channel_size();
    let ch = row % radar.channel_size;
    let tx_channel = &radar.transmitter.channels[ch / n_rx];
    let rx_channel = &radar.receiver.channels[ch % n_rx];
    let pol = polarization_factor(&tx_channel.polarization, &rx_channel.polarization);

    let waveform = &radar.transmitter.waveform;
    let fs = radar.receiver.fs;
    let pulses = waveform.pulses;
    let samples = radar.samples_per_pulse;
    let sigma = radar.noise_amplitude / 2f64.sqrt();

    for p in 0..pulses {
        let pulse_mod = tx_channel.pulse_mod[p];
        // a zeroed pulse stays exactly zero, noise included
        if pulse_mod.norm_sqr() == 0.0 {
            continue;
        }

        let lambda = C / waveform.carrier_frequency(p);
        let mut rng = if noise {
            let mut rng = ChaCha8Rng::seed_from_u64(radar.seed());
            rng.set_stream(THERMAL_STREAM_BASE + (row * pulses + p) as u64);
            Some(rng)
        } else {
            None
        };

        for k in 0..samples {
            let tau = k as f64 / fs;
            let t = radar.timestamp[(row, p, k)];
            let pose = radar.motion.pose_at((row, p, k), t);

            let mut acc = Complex64::new(0.0, 0.0);
            for target in targets {
                if target.rcs == f64::NEG_INFINITY
                    && matches!(target.scattering, Scattering::Point)
                {
                    continue;
                }

                let body = pose.to_body(target.position(t));
                let to_tx = relative_geometry(tx_channel.location, body);
                let to_rx = relative_geometry(rx_channel.location, body);
                let delay = (to_tx.range + to_rx.range) / C;

                let mut phase =
                    waveform.phase_accumulation(p, tau - delay, tau) + target.phase.to_radians();

                let amplitude = match &target.scattering {
                    Scattering::Point => {
                        let p_db = radar.transmitter.tx_power
                            + tx_channel.gain_db(to_tx.azimuth_deg, to_tx.elevation_deg)
                            + rx_channel.gain_db(to_rx.azimuth_deg, to_rx.elevation_deg)
                            + target.rcs
                            - 10.0 * (4.0 * PI * to_tx.range * to_tx.range).log10()
                            - 10.0 * (4.0 * PI * to_rx.range * to_rx.range).log10()
                            + 10.0 * (lambda * lambda / (4.0 * PI)).log10()
                            + radar.receiver.rf_gain;
                        pol * peak_voltage(p_db, &radar.receiver)
                    }
                    Scattering::External(model) => {
                        let (gamma, apparent_phase) = model.reflection(ch, t);
                        phase += gamma.arg() + apparent_phase;
                        let p_db = radar.transmitter.tx_power
                            + 20.0 * gamma.norm().log10()
                            + radar.receiver.rf_gain;
                        peak_voltage(p_db, &radar.receiver)
                    }
                };
                if !amplitude.is_finite() || amplitude == 0.0 {
                    continue;
                }

                let envelope = tx_channel
                    .waveform_mod
                    .as_ref()
                    .map_or(Complex64::new(1.0, 0.0), |env| env.value(tau - delay));
                acc += amplitude * envelope * Complex64::from_polar(1.0, phase);
            }

            if let Some(phase_noise) = &radar.phase_noise {
                acc *= phase_noise[(row, p, k)];
            }
            acc *= pulse_mod;

            if let Some(rng) = rng.as_mut() {
                let re: f64 = StandardNormal.sample(rng);
                let im: f64 = StandardNormal.sample(rng);
                acc += Complex64::new(re, im) * sigma;
            }

            plane[(p, k)] = match radar.receiver.bb_type {
                BasebandType::Complex => acc,
                BasebandType::Real => Complex64::new(acc.re, 0.0),
            };
        }
    }
}

/// Direct-path leakage of a second radar into the primary receiver.
///
/// For every primary sample, the interferer emission arriving after the
/// one-way propagation delay is located in the interferer's own pulse table;
/// the contribution is kept only while the instantaneous beat between the two
/// waveforms falls inside the receiver band.
fn interference_cube(radar: &Radar, interferer: &Radar) -> Array3<Complex64> {
    let pulses = radar.transmitter.waveform.pulses;
    let samples = radar.samples_per_pulse;

    let mut cube = Array3::zeros((radar.frames * radar.channel_size, pulses, samples));
    cube.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(row, mut plane)| {
            let n_rx = radar.receiver.channel_size();
            let rx_channel = &radar.receiver.channels[(row % radar.channel_size) % n_rx];
            let waveform = &radar.transmitter.waveform;
            let int_waveform = &interferer.transmitter.waveform;
            let fs = radar.receiver.fs;

            for p in 0..pulses {
                for k in 0..samples {
                    let tau = k as f64 / fs;
                    let t = radar.timestamp[(row, p, k)];
                    let pose = radar.motion.pose_at((row, p, k), t);
                    let int_pose = interferer.motion.pose_at((0, 0, 0), t);
                    let rx_world = pose.to_world(rx_channel.location);

                    let mut acc = Complex64::new(0.0, 0.0);
                    for int_channel in &interferer.transmitter.channels {
                        let tx_world = int_pose.to_world(int_channel.location);
                        let range = distance(tx_world, rx_world);
                        let emitted = t - range / C;

                        // look angles on both ends, each in its own body frame
                        let to_tx = relative_geometry(rx_channel.location, pose.to_body(tx_world));
                        let to_rx =
                            relative_geometry(int_channel.location, int_pose.to_body(rx_world));

                        for (jp, start) in int_waveform.pulse_start_time.iter().enumerate() {
                            let ti = emitted - start - int_channel.delay;
                            if ti < 0.0 || ti > int_waveform.pulse_length {
                                continue;
                            }
                            let beat = waveform.instantaneous_frequency(p, tau)
                                - int_waveform.instantaneous_frequency(jp, ti);
                            if beat.abs() > fs / 2.0 {
                                continue;
                            }

                            let lambda = C / int_waveform.carrier_frequency(jp);
                            let p_db = interferer.transmitter.tx_power
                                + int_channel.gain_db(to_rx.azimuth_deg, to_rx.elevation_deg)
                                + rx_channel.gain_db(to_tx.azimuth_deg, to_tx.elevation_deg)
                                - 10.0 * (4.0 * PI * range * range).log10()
                                - 10.0 * (4.0 * PI).log10()
                                + 10.0 * (lambda * lambda / (4.0 * PI)).log10()
                                + radar.receiver.rf_gain;
                            let amplitude = polarization_factor(
                                &int_channel.polarization,
                                &rx_channel.polarization,
                            ) * peak_voltage(p_db, &radar.receiver);

                            let phase = waveform.phase_accumulation(p, 0.0, tau)
                                - int_waveform.phase_accumulation(jp, 0.0, ti);
                            let envelope = int_channel
                                .waveform_mod
                                .as_ref()
                                .map_or(Complex64::new(1.0, 0.0), |env| env.value(ti));
                            acc += amplitude
                                * int_channel.pulse_mod[jp]
                                * envelope
                                * Complex64::from_polar(1.0, phase);
                        }
                    }

                    plane[(p, k)] = match radar.receiver.bb_type {
                        BasebandType::Complex => acc,
                        BasebandType::Real => Complex64::new(acc.re, 0.0),
                    };
                }
            }
        });
    cube
}

/// Receive-chain conversion from received power (dBm) to peak voltage (V)
fn peak_voltage(p_db: f64, receiver: &Receiver) -> f64 {
    let watts = 1e-3 * 10f64.powf(p_db / 10.0);
    2f64.sqrt()
        * (watts * receiver.load_resistor).sqrt()
        * 10f64.powf(receiver.baseband_gain / 20.0)
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}
