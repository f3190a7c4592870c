use crate::antenna::{TxChannel, TxChannelConfig};
use crate::error::{RadarError, RadarResult};
use crate::waveform::{Waveform, WaveformConfig};
use serde::{Deserialize, Serialize};

/// Single-sideband phase-noise mask of the transmitter oscillator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseNoiseMask {
    /// Offset frequency from the carrier (Hz)
    pub f: Vec<f64>,
    /// SSB phase-noise density at each offset (dBc/Hz)
    pub power: Vec<f64>,
}

impl PhaseNoiseMask {
    pub fn validate(&self) -> RadarResult<()> {
        if self.f.len() != self.power.len() {
            return Err(RadarError::InvalidMask(format!(
                "lengths of `f` ({}) and `power` ({}) must be the same",
                self.f.len(),
                self.power.len()
            )));
        }
        Ok(())
    }
}

/// Radar transmitter description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmitterConfig {
    pub waveform: WaveformConfig,
    /// Transmit power (dBm, default: 0)
    #[serde(default)]
    pub tx_power: f64,
    /// Oscillator phase-noise mask (default: none)
    #[serde(default)]
    pub phase_noise: Option<PhaseNoiseMask>,
    /// Transmitter channels (default: one channel at the origin)
    #[serde(default)]
    pub channels: Option<Vec<TxChannelConfig>>,
}

/// Radar transmitter: waveform, RF power and channel array.
#[derive(Debug, Clone)]
pub struct Transmitter {
    pub waveform: Waveform,
    /// Transmit power (dBm)
    pub tx_power: f64,
    pub phase_noise: Option<PhaseNoiseMask>,
    pub channels: Vec<TxChannel>,
}

impl Transmitter {
    pub fn new(config: TransmitterConfig) -> RadarResult<Self> {
        let waveform = Waveform::new(config.waveform)?;

        if let Some(mask) = &config.phase_noise {
            mask.validate()?;
        }

        let channel_configs = match config.channels {
            None => vec![TxChannelConfig::default()],
            Some(channels) if channels.is_empty() => {
                return Err(RadarError::InvalidWaveform(
                    "transmitter channel list is empty".into(),
                ));
            }
            Some(channels) => channels,
        };
        let channels = channel_configs
            .iter()
            .map(|c| TxChannel::new(c, waveform.pulses))
            .collect::<RadarResult<Vec<_>>>()?;

        Ok(Transmitter {
            waveform,
            tx_power: config.tx_power,
            phase_noise: config.phase_noise,
            channels,
        })
    }

    pub fn channel_size(&self) -> usize {
        self.channels.len()
    }
}
