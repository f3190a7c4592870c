use crate::error::{RadarError, RadarResult};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

fn default_polarization() -> [Complex64; 3] {
    [
        Complex64::new(0.0, 0.0),
        Complex64::new(0.0, 0.0),
        Complex64::new(1.0, 0.0),
    ]
}

fn default_angles() -> Vec<f64> {
    vec![-90.0, 90.0]
}

fn default_pattern() -> Vec<f64> {
    vec![0.0, 0.0]
}

fn default_grid() -> f64 {
    1.0
}

/// Piecewise-constant complex envelope applied along a pulse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Time stamps of the envelope values (s)
    pub t: Vec<f64>,
    /// Relative amplitude at each time stamp (default: 1)
    #[serde(default)]
    pub amp: Option<Vec<f64>>,
    /// Phase at each time stamp (deg, default: 0)
    #[serde(default)]
    pub phase: Option<Vec<f64>>,
}

/// Transmitter channel description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxChannelConfig {
    /// 3D location of the channel [x, y, z] (m)
    pub location: [f64; 3],
    /// Antenna polarization [x, y, z] (default: [0, 0, 1], vertical)
    #[serde(default = "default_polarization")]
    pub polarization: [Complex64; 3],
    /// Transmit delay (s, default: 0)
    #[serde(default)]
    pub delay: f64,
    /// Ray-occupancy grid hint for external scattering solvers (default: 1)
    #[serde(default = "default_grid")]
    pub grid: f64,
    /// Angles of the azimuth pattern (deg, default: [-90, 90])
    #[serde(default = "default_angles")]
    pub azimuth_angles: Vec<f64>,
    /// Azimuth pattern (dB, default: [0, 0])
    #[serde(default = "default_pattern")]
    pub azimuth_pattern: Vec<f64>,
    /// Angles of the elevation pattern (deg, default: [-90, 90])
    #[serde(default = "default_angles")]
    pub elevation_angles: Vec<f64>,
    /// Elevation pattern (dB, default: [0, 0])
    #[serde(default = "default_pattern")]
    pub elevation_pattern: Vec<f64>,
    /// Relative amplitude per pulse (default: 1)
    #[serde(default)]
    pub pulse_amp: Option<Vec<f64>>,
    /// Phase code per pulse (deg, default: 0)
    #[serde(default)]
    pub pulse_phase: Option<Vec<f64>>,
    /// Intra-pulse waveform modulation (default: none)
    #[serde(default)]
    pub modulation: Option<EnvelopeConfig>,
}

impl Default for TxChannelConfig {
    fn default() -> Self {
        TxChannelConfig {
            location: [0.0; 3],
            polarization: default_polarization(),
            delay: 0.0,
            grid: default_grid(),
            azimuth_angles: default_angles(),
            azimuth_pattern: default_pattern(),
            elevation_angles: default_angles(),
            elevation_pattern: default_pattern(),
            pulse_amp: None,
            pulse_phase: None,
            modulation: None,
        }
    }
}

/// Receiver channel description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RxChannelConfig {
    /// 3D location of the channel [x, y, z] (m)
    pub location: [f64; 3],
    /// Antenna polarization [x, y, z] (default: [0, 0, 1], vertical)
    #[serde(default = "default_polarization")]
    pub polarization: [Complex64; 3],
    /// Angles of the azimuth pattern (deg, default: [-90, 90])
    #[serde(default = "default_angles")]
    pub azimuth_angles: Vec<f64>,
    /// Azimuth pattern (dB, default: [0, 0])
    #[serde(default = "default_pattern")]
    pub azimuth_pattern: Vec<f64>,
    /// Angles of the elevation pattern (deg, default: [-90, 90])
    #[serde(default = "default_angles")]
    pub elevation_angles: Vec<f64>,
    /// Elevation pattern (dB, default: [0, 0])
    #[serde(default = "default_pattern")]
    pub elevation_pattern: Vec<f64>,
}

impl Default for RxChannelConfig {
    fn default() -> Self {
        RxChannelConfig {
            location: [0.0; 3],
            polarization: default_polarization(),
            azimuth_angles: default_angles(),
            azimuth_pattern: default_pattern(),
            elevation_angles: default_angles(),
            elevation_pattern: default_pattern(),
        }
    }
}

/// One-dimensional gain table with linear interpolation, clamped to its
/// endpoints. Stored normalized so the maximum entry is 0 dB.
#[derive(Debug, Clone)]
pub struct PatternTable {
    angles: Vec<f64>,
    gains: Vec<f64>,
}

impl PatternTable {
    /// Builds the table and returns it together with the extracted peak (dB).
    pub fn new(angles: &[f64], pattern: &[f64], what: &str) -> RadarResult<(Self, f64)> {
        if angles.len() != pattern.len() {
            return Err(RadarError::InvalidPattern(format!(
                "lengths of `{what}_angles` ({}) and `{what}_pattern` ({}) must be the same",
                angles.len(),
                pattern.len()
            )));
        }
        if angles.len() < 2 {
            return Err(RadarError::InvalidPattern(format!(
                "`{what}_angles` needs at least two entries"
            )));
        }
        if angles.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RadarError::InvalidPattern(format!(
                "`{what}_angles` must be strictly increasing"
            )));
        }
        let peak = pattern.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let table = PatternTable {
            angles: angles.to_vec(),
            gains: pattern.iter().map(|p| p - peak).collect(),
        };
        Ok((table, peak))
    }

    /// Interpolated gain at `angle` (deg), clamped to the table endpoints.
    pub fn value(&self, angle: f64) -> f64 {
        let n = self.angles.len();
        if angle <= self.angles[0] {
            return self.gains[0];
        }
        if angle >= self.angles[n - 1] {
            return self.gains[n - 1];
        }
        let i = self.angles.partition_point(|&a| a <= angle) - 1;
        let frac = (angle - self.angles[i]) / (self.angles[i + 1] - self.angles[i]);
        self.gains[i] + frac * (self.gains[i + 1] - self.gains[i])
    }
}

/// Piecewise-constant complex envelope with hold-last semantics.
#[derive(Debug, Clone)]
pub struct Envelope {
    t: Vec<f64>,
    var: Vec<Complex64>,
}

impl Envelope {
    fn new(config: &EnvelopeConfig) -> RadarResult<Self> {
        let n = config.t.len();
        let amp = match &config.amp {
            Some(a) => a.clone(),
            None => vec![1.0; config.phase.as_ref().map_or(n, |p| p.len())],
        };
        let phase = match &config.phase {
            Some(p) => p.clone(),
            None => vec![0.0; amp.len()],
        };
        if amp.len() != phase.len() {
            return Err(RadarError::InvalidConfig(format!(
                "lengths of modulation `amp` ({}) and `phase` ({}) must be the same",
                amp.len(),
                phase.len()
            )));
        }
        if amp.len() != n || n == 0 {
            return Err(RadarError::InvalidConfig(format!(
                "lengths of modulation `t` ({}) and its values ({}) must be the same",
                n,
                amp.len()
            )));
        }
        if config.t.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RadarError::InvalidConfig(
                "modulation `t` must be strictly increasing".into(),
            ));
        }
        let var = amp
            .iter()
            .zip(&phase)
            .map(|(a, p)| Complex64::from_polar(*a, p.to_radians()))
            .collect();
        Ok(Envelope {
            t: config.t.clone(),
            var,
        })
    }

    /// Envelope value at time `u`: identity before the first time stamp,
    /// otherwise the value at the largest time stamp `<= u`.
    pub fn value(&self, u: f64) -> Complex64 {
        if u < self.t[0] {
            return Complex64::new(1.0, 0.0);
        }
        let i = self.t.partition_point(|&v| v <= u) - 1;
        self.var[i]
    }
}

/// A transmitter channel after validation.
#[derive(Debug, Clone)]
pub struct TxChannel {
    pub location: [f64; 3],
    pub polarization: [Complex64; 3],
    pub delay: f64,
    pub grid: f64,
    /// Peak of the azimuth pattern (dB)
    pub antenna_gain: f64,
    pub azimuth: PatternTable,
    pub elevation: PatternTable,
    /// Complex per-pulse modulation code, one entry per pulse
    pub pulse_mod: Vec<Complex64>,
    pub waveform_mod: Option<Envelope>,
}

impl TxChannel {
    pub fn new(config: &TxChannelConfig, pulses: usize) -> RadarResult<Self> {
        let (azimuth, antenna_gain) =
            PatternTable::new(&config.azimuth_angles, &config.azimuth_pattern, "azimuth")?;
        let (elevation, _) = PatternTable::new(
            &config.elevation_angles,
            &config.elevation_pattern,
            "elevation",
        )?;

        let pulse_mod = pulse_modulation(
            config.pulse_amp.as_deref(),
            config.pulse_phase.as_deref(),
            pulses,
        )?;
        let waveform_mod = config.modulation.as_ref().map(Envelope::new).transpose()?;

        Ok(TxChannel {
            location: config.location,
            polarization: config.polarization,
            delay: config.delay,
            grid: config.grid,
            antenna_gain,
            azimuth,
            elevation,
            pulse_mod,
            waveform_mod,
        })
    }

    /// Combined pattern gain towards (`az`, `el`) in degrees (dB)
    pub fn gain_db(&self, az_deg: f64, el_deg: f64) -> f64 {
        self.azimuth.value(az_deg) + self.elevation.value(el_deg) + self.antenna_gain
    }
}

/// A receiver channel after validation.
#[derive(Debug, Clone)]
pub struct RxChannel {
    pub location: [f64; 3],
    pub polarization: [Complex64; 3],
    /// Peak of the azimuth pattern (dB)
    pub antenna_gain: f64,
    pub azimuth: PatternTable,
    pub elevation: PatternTable,
}

impl RxChannel {
    pub fn new(config: &RxChannelConfig) -> RadarResult<Self> {
        let (azimuth, antenna_gain) =
            PatternTable::new(&config.azimuth_angles, &config.azimuth_pattern, "azimuth")?;
        let (elevation, _) = PatternTable::new(
            &config.elevation_angles,
            &config.elevation_pattern,
            "elevation",
        )?;
        Ok(RxChannel {
            location: config.location,
            polarization: config.polarization,
            antenna_gain,
            azimuth,
            elevation,
        })
    }

    pub fn gain_db(&self, az_deg: f64, el_deg: f64) -> f64 {
        self.azimuth.value(az_deg) + self.elevation.value(el_deg) + self.antenna_gain
    }
}

fn pulse_modulation(
    amp: Option<&[f64]>,
    phase: Option<&[f64]>,
    pulses: usize,
) -> RadarResult<Vec<Complex64>> {
    let amp = match amp {
        Some(a) => a.to_vec(),
        None => vec![1.0; pulses],
    };
    let phase = match phase {
        Some(p) => p.to_vec(),
        None => vec![0.0; pulses],
    };
    if amp.len() != pulses {
        return Err(RadarError::InvalidConfig(format!(
            "length of `pulse_amp` ({}) must equal `pulses` ({})",
            amp.len(),
            pulses
        )));
    }
    if phase.len() != pulses {
        return Err(RadarError::InvalidConfig(format!(
            "length of `pulse_phase` ({}) must equal `pulses` ({})",
            phase.len(),
            pulses
        )));
    }
    Ok(amp
        .iter()
        .zip(&phase)
        .map(|(a, p)| Complex64::from_polar(*a, p.to_radians()))
        .collect())
}

/// Polarization mismatch factor between a transmit and a receive channel.
pub fn polarization_factor(tx: &[Complex64; 3], rx: &[Complex64; 3]) -> f64 {
    let dot: Complex64 = tx.iter().zip(rx.iter()).map(|(a, b)| a * b.conj()).sum();
    dot.norm_sqr()
}
