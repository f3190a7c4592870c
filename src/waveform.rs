use crate::error::{RadarError, RadarResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A per-pulse quantity given either as one value for every pulse or as an
/// explicit list with one entry per pulse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerPulse {
    Scalar(f64),
    List(Vec<f64>),
}

impl PerPulse {
    fn broadcast(&self, pulses: usize, what: &str) -> RadarResult<Vec<f64>> {
        match self {
            PerPulse::Scalar(v) => Ok(vec![*v; pulses]),
            PerPulse::List(v) => {
                if v.len() != pulses {
                    return Err(RadarError::InvalidWaveform(format!(
                        "length of `{}` ({}) must equal `pulses` ({})",
                        what,
                        v.len(),
                        pulses
                    )));
                }
                Ok(v.clone())
            }
        }
    }
}

impl From<f64> for PerPulse {
    fn from(v: f64) -> Self {
        PerPulse::Scalar(v)
    }
}

impl From<Vec<f64>> for PerPulse {
    fn from(v: Vec<f64>) -> Self {
        PerPulse::List(v)
    }
}

/// Transmitted waveform description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformConfig {
    /// Frequency breakpoints of one pulse (Hz). A single entry transmits a
    /// continuous tone over the whole pulse.
    pub f: Vec<f64>,
    /// Time of each frequency breakpoint (s). A single entry is interpreted
    /// as the pulse length of a two-point profile.
    pub t: Vec<f64>,
    /// Total number of pulses (default: 1)
    #[serde(default = "default_pulses")]
    pub pulses: usize,
    /// Pulse repetition period (s), scalar or per pulse.
    /// Default: the pulse length.
    #[serde(default)]
    pub prp: Option<PerPulse>,
    /// Center-frequency offset per pulse (Hz), scalar or per pulse.
    /// Default: 0.
    #[serde(default)]
    pub f_offset: Option<PerPulse>,
}

fn default_pulses() -> usize {
    1
}

/// Piecewise-linear frequency-versus-time profile with per-pulse repetition
/// periods and center-frequency offsets. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Waveform {
    f: Vec<f64>,
    t: Vec<f64>,
    /// Cumulative frequency integral at each breakpoint (cycles)
    cum: Vec<f64>,
    /// Total number of pulses
    pub pulses: usize,
    /// Pulse repetition period for each pulse (s)
    pub prp: Vec<f64>,
    /// Center-frequency offset for each pulse (Hz)
    pub f_offset: Vec<f64>,
    /// Start time of each pulse relative to the frame start (s)
    pub pulse_start_time: Vec<f64>,
    /// Dwell time of one pulse (s)
    pub pulse_length: f64,
    /// `max(f) - min(f)` (Hz)
    pub bandwidth: f64,
    center_frequency: f64,
}

impl Waveform {
    pub fn new(config: WaveformConfig) -> RadarResult<Self> {
        let WaveformConfig {
            mut f,
            mut t,
            pulses,
            prp,
            f_offset,
        } = config;

        // scalar conveniences: a lone frequency is a continuous tone, a lone
        // time is the pulse length
        if f.len() == 1 {
            f.push(f[0]);
        }
        if t.len() == 1 {
            t.insert(0, 0.0);
        }

        if f.len() != t.len() {
            return Err(RadarError::InvalidWaveform(format!(
                "lengths of `f` ({}) and `t` ({}) must be the same",
                f.len(),
                t.len()
            )));
        }
        if f.len() < 2 {
            return Err(RadarError::InvalidWaveform(
                "at least two frequency breakpoints are required".into(),
            ));
        }
        if f.iter().chain(t.iter()).any(|v| !v.is_finite()) {
            return Err(RadarError::InvalidWaveform(
                "`f` and `t` must be finite".into(),
            ));
        }

        // time axis is relative to the first breakpoint
        let t0 = t[0];
        for v in t.iter_mut() {
            *v -= t0;
        }
        if t.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RadarError::InvalidWaveform(
                "`t` must be strictly increasing".into(),
            ));
        }

        if pulses == 0 {
            return Err(RadarError::InvalidWaveform(
                "`pulses` must be at least 1".into(),
            ));
        }

        let pulse_length = t[t.len() - 1];
        let prp = match prp {
            Some(p) => p.broadcast(pulses, "prp")?,
            None => vec![pulse_length; pulses],
        };
        let f_offset = match f_offset {
            Some(o) => o.broadcast(pulses, "f_offset")?,
            None => vec![0.0; pulses],
        };
        if prp.iter().cloned().fold(f64::INFINITY, f64::min) < pulse_length {
            return Err(RadarError::InvalidWaveform(
                "`prp` must not be shorter than the pulse length".into(),
            ));
        }

        let mut pulse_start_time = Vec::with_capacity(pulses);
        let mut start = 0.0;
        for p in &prp {
            pulse_start_time.push(start);
            start += p;
        }

        let f_max = f.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let f_min = f.iter().cloned().fold(f64::INFINITY, f64::min);

        let mut cum = Vec::with_capacity(t.len());
        cum.push(0.0);
        for i in 0..t.len() - 1 {
            let seg = 0.5 * (f[i] + f[i + 1]) * (t[i + 1] - t[i]);
            cum.push(cum[i] + seg);
        }

        Ok(Waveform {
            f,
            t,
            cum,
            pulses,
            prp,
            f_offset,
            pulse_start_time,
            pulse_length,
            bandwidth: f_max - f_min,
            center_frequency: 0.5 * (f_max + f_min),
        })
    }

    /// Carrier frequency used for path loss on the given pulse (Hz)
    pub fn carrier_frequency(&self, pulse: usize) -> f64 {
        self.center_frequency + self.f_offset[pulse]
    }

    /// Instantaneous frequency at time `tau` into the given pulse (Hz).
    /// Outside the breakpoint table the boundary segment extrapolates
    /// linearly.
    pub fn instantaneous_frequency(&self, pulse: usize, tau: f64) -> f64 {
        let i = self.segment_index(tau);
        self.f[i] + self.slope(i) * (tau - self.t[i]) + self.f_offset[pulse]
    }

    /// Phase accumulated between `tau0` and `tau1` of the given pulse (rad).
    ///
    /// The exact integral of the frequency profile over `[tau0, tau1]`; each
    /// linear segment with start frequency `f0` and slope `k` contributes
    /// `f0*(b - a) + k*(b^2 - a^2)/2` cycles. Valid for arbitrary
    /// sub-intervals, including times before the pulse start.
    pub fn phase_accumulation(&self, pulse: usize, tau0: f64, tau1: f64) -> f64 {
        let cycles = self.antiderivative(tau1) - self.antiderivative(tau0)
            + self.f_offset[pulse] * (tau1 - tau0);
        2.0 * PI * cycles
    }

    fn slope(&self, segment: usize) -> f64 {
        (self.f[segment + 1] - self.f[segment]) / (self.t[segment + 1] - self.t[segment])
    }

    fn segment_index(&self, x: f64) -> usize {
        let p = self.t.partition_point(|&v| v <= x);
        p.saturating_sub(1).min(self.t.len() - 2)
    }

    /// Frequency integral from the pulse start to `x` (cycles)
    fn antiderivative(&self, x: f64) -> f64 {
        let i = self.segment_index(x);
        let dx = x - self.t[i];
        self.cum[i] + self.f[i] * dx + 0.5 * self.slope(i) * dx * dx
    }
}
