use crate::antenna::{RxChannel, RxChannelConfig};
use crate::constants::{BOLTZMANN, NOISE_TEMPERATURE};
use crate::error::{RadarError, RadarResult};
use serde::{Deserialize, Serialize};

/// Baseband sample representation produced by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasebandType {
    Complex,
    Real,
}

impl Default for BasebandType {
    fn default() -> Self {
        BasebandType::Complex
    }
}

fn default_noise_figure() -> f64 {
    10.0
}

fn default_load_resistor() -> f64 {
    500.0
}

/// Radar receiver description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Sampling rate (sps)
    pub fs: f64,
    /// Noise figure (dB, default: 10)
    #[serde(default = "default_noise_figure")]
    pub noise_figure: f64,
    /// Total RF gain (dB, default: 0)
    #[serde(default)]
    pub rf_gain: f64,
    /// Load resistor converting power to voltage (Ohm, default: 500)
    #[serde(default = "default_load_resistor")]
    pub load_resistor: f64,
    /// Total baseband gain (dB, default: 0)
    #[serde(default)]
    pub baseband_gain: f64,
    /// Baseband data type (default: complex)
    #[serde(default)]
    pub bb_type: BasebandType,
    /// Receiver channels (default: one channel at the origin)
    #[serde(default)]
    pub channels: Option<Vec<RxChannelConfig>>,
}

/// Radar receiver: sampling, RF chain and channel array.
#[derive(Debug, Clone)]
pub struct Receiver {
    /// Sampling rate (sps)
    pub fs: f64,
    /// Noise figure (dB)
    pub noise_figure: f64,
    /// Total RF gain (dB)
    pub rf_gain: f64,
    /// Load resistor (Ohm)
    pub load_resistor: f64,
    /// Total baseband gain (dB)
    pub baseband_gain: f64,
    pub bb_type: BasebandType,
    /// Bandwidth used for the thermal noise budget (Hz)
    pub noise_bandwidth: f64,
    pub channels: Vec<RxChannel>,
}

impl Receiver {
    pub fn new(config: ReceiverConfig) -> RadarResult<Self> {
        if !(config.fs > 0.0) {
            return Err(RadarError::InvalidConfig(format!(
                "`fs` must be positive, got {}",
                config.fs
            )));
        }
        if !(config.load_resistor > 0.0) {
            return Err(RadarError::InvalidConfig(format!(
                "`load_resistor` must be positive, got {}",
                config.load_resistor
            )));
        }

        let noise_bandwidth = match config.bb_type {
            BasebandType::Complex => config.fs,
            BasebandType::Real => config.fs / 2.0,
        };

        let channel_configs = match config.channels {
            None => vec![RxChannelConfig::default()],
            Some(channels) if channels.is_empty() => {
                return Err(RadarError::InvalidConfig(
                    "receiver channel list is empty".into(),
                ));
            }
            Some(channels) => channels,
        };
        let channels = channel_configs
            .iter()
            .map(RxChannel::new)
            .collect::<RadarResult<Vec<_>>>()?;

        Ok(Receiver {
            fs: config.fs,
            noise_figure: config.noise_figure,
            rf_gain: config.rf_gain,
            load_resistor: config.load_resistor,
            baseband_gain: config.baseband_gain,
            bb_type: config.bb_type,
            noise_bandwidth,
            channels,
        })
    }

    pub fn channel_size(&self) -> usize {
        self.channels.len()
    }

    /// Peak thermal-noise amplitude at the baseband output (V).
    ///
    /// `kTB` through the RF chain, converted to a voltage across the load
    /// resistor and scaled from RMS to peak.
    pub fn noise_amplitude(&self) -> f64 {
        let ktb_dbm = 10.0 * (BOLTZMANN * NOISE_TEMPERATURE * 1000.0).log10()
            + 10.0 * self.noise_bandwidth.log10();
        let rx_noise_dbm = ktb_dbm + self.rf_gain + self.noise_figure + self.baseband_gain;
        let noise_watts = 1e-3 * 10f64.powf(rx_noise_dbm / 10.0);
        2f64.sqrt() * (noise_watts * self.load_resistor).sqrt()
    }
}
