//! Declarative codec configuration.
//!
//! Each config deserializes from JSON or YAML and builds a ready-to-use
//! context, applying its tuning through the control channel. Tuning fields
//! left out keep the engine's defaults.
//!
//! ```yaml
//! sample_rate: 8000
//! channels: 1
//! application: voip
//! complexity: 2
//! signal: voice
//! ```

use serde::Deserialize;
use tracing::debug;

use crate::echo::EchoCanceller;
use crate::error::Result;
use crate::opus::{self, Application, Signal};
use crate::speex::{self, Mode};

/// Opus encoder configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OpusEncoderConfig {
    /// Sample rate (8000, 12000, 16000, 24000, or 48000).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: i32,
    #[serde(default = "default_channels")]
    pub channels: i32,
    #[serde(default = "default_application")]
    pub application: Application,
    /// Target bitrate in bits per second.
    #[serde(default)]
    pub bitrate: Option<i32>,
    /// Complexity (0-10).
    #[serde(default)]
    pub complexity: Option<i32>,
    #[serde(default)]
    pub signal: Option<Signal>,
    #[serde(default)]
    pub inband_fec: Option<bool>,
    /// Expected packet loss in percent (0-100).
    #[serde(default)]
    pub packet_loss_perc: Option<i32>,
    #[serde(default)]
    pub dtx: Option<bool>,
}

impl Default for OpusEncoderConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            application: default_application(),
            bitrate: None,
            complexity: None,
            signal: None,
            inband_fec: None,
            packet_loss_perc: None,
            dtx: None,
        }
    }
}

impl OpusEncoderConfig {
    /// Creates the encoder and applies the tuning.
    pub fn build(&self) -> Result<opus::Encoder> {
        let mut encoder = opus::Encoder::new(self.sample_rate, self.channels, self.application)?;
        if let Some(bitrate) = self.bitrate {
            encoder.set_bitrate(bitrate)?;
        }
        if let Some(complexity) = self.complexity {
            encoder.set_complexity(complexity)?;
        }
        if let Some(signal) = self.signal {
            encoder.set_signal(signal)?;
        }
        if let Some(fec) = self.inband_fec {
            encoder.set_inband_fec(fec)?;
        }
        if let Some(perc) = self.packet_loss_perc {
            encoder.set_packet_loss_perc(perc)?;
        }
        if let Some(dtx) = self.dtx {
            encoder.set_dtx(dtx)?;
        }
        debug!(config = ?self, "opus: encoder configured");
        Ok(encoder)
    }
}

/// Opus decoder configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OpusDecoderConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: i32,
    #[serde(default = "default_channels")]
    pub channels: i32,
}

impl Default for OpusDecoderConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
        }
    }
}

impl OpusDecoderConfig {
    pub fn build(&self) -> Result<opus::Decoder> {
        opus::Decoder::new(self.sample_rate, self.channels)
    }
}

/// Speex encoder configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeexEncoderConfig {
    #[serde(default = "default_mode")]
    pub mode: Mode,
    /// Quality (0-10).
    #[serde(default)]
    pub quality: Option<i32>,
    /// Complexity (1-10).
    #[serde(default)]
    pub complexity: Option<i32>,
    #[serde(default)]
    pub vbr: Option<bool>,
}

impl Default for SpeexEncoderConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            quality: None,
            complexity: None,
            vbr: None,
        }
    }
}

impl SpeexEncoderConfig {
    /// Creates the encoder and applies the tuning.
    pub fn build(&self) -> Result<speex::Encoder> {
        let mut encoder = speex::Encoder::new(self.mode)?;
        if let Some(quality) = self.quality {
            encoder.set_quality(quality)?;
        }
        if let Some(complexity) = self.complexity {
            encoder.set_complexity(complexity)?;
        }
        if let Some(vbr) = self.vbr {
            encoder.set_vbr(vbr)?;
        }
        debug!(config = ?self, "speex: encoder configured");
        Ok(encoder)
    }
}

/// Speex decoder configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeexDecoderConfig {
    #[serde(default = "default_mode")]
    pub mode: Mode,
    /// Perceptual enhancement, on by default.
    #[serde(default = "default_enhance")]
    pub enhance: bool,
}

impl Default for SpeexDecoderConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            enhance: default_enhance(),
        }
    }
}

impl SpeexDecoderConfig {
    pub fn build(&self) -> Result<speex::Decoder> {
        speex::Decoder::new(self.mode, self.enhance)
    }
}

/// Echo canceller configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EchoConfig {
    /// Samples per frame.
    #[serde(default = "default_echo_frame_size")]
    pub frame_size: i32,
    /// Echo tail in samples.
    #[serde(default = "default_filter_length")]
    pub filter_length: i32,
    #[serde(default)]
    pub sample_rate: Option<i32>,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            frame_size: default_echo_frame_size(),
            filter_length: default_filter_length(),
            sample_rate: None,
        }
    }
}

impl EchoConfig {
    pub fn build(&self) -> Result<EchoCanceller> {
        let mut echo = EchoCanceller::new(self.frame_size, self.filter_length)?;
        if let Some(rate) = self.sample_rate {
            echo.set_sampling_rate(rate)?;
        }
        Ok(echo)
    }
}

fn default_sample_rate() -> i32 {
    16000
}

fn default_channels() -> i32 {
    1
}

fn default_application() -> Application {
    Application::VoIP
}

fn default_mode() -> Mode {
    Mode::Wideband
}

fn default_enhance() -> bool {
    true
}

fn default_echo_frame_size() -> i32 {
    320
}

// 200ms at 16kHz
fn default_filter_length() -> i32 {
    3200
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctl::Control;
    use crate::error::Error;

    #[test]
    fn test_opus_encoder_from_json() {
        let cfg: OpusEncoderConfig = serde_json::from_str(
            r#"{
                "sample_rate": 8000,
                "application": "voip",
                "complexity": 2,
                "signal": "voice",
                "bitrate": 12000
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.channels, 1);
        let mut encoder = cfg.build().unwrap();
        assert_eq!(encoder.sample_rate(), 8000);
        assert_eq!(encoder.complexity().unwrap(), 2);
        assert_eq!(encoder.bitrate().unwrap(), 12000);
        assert_eq!(
            encoder.get(crate::opus::ffi::OPUS_GET_SIGNAL_REQUEST).unwrap(),
            crate::opus::ffi::OPUS_SIGNAL_VOICE
        );
    }

    #[test]
    fn test_opus_encoder_bad_rate() {
        let cfg = OpusEncoderConfig {
            sample_rate: 44100,
            ..Default::default()
        };
        assert_eq!(cfg.build().unwrap_err().code(), crate::opus::ffi::OPUS_BAD_ARG);
    }

    #[test]
    fn test_opus_decoder_defaults() {
        let cfg: OpusDecoderConfig = serde_json::from_str("{}").unwrap();
        let decoder = cfg.build().unwrap();
        assert_eq!(decoder.sample_rate(), 16000);
        assert_eq!(decoder.channels(), 1);
    }

    #[test]
    fn test_speex_from_yaml() {
        let yaml = "mode: nb\nquality: 5\ncomplexity: 3\nvbr: false\n";
        let cfg: SpeexEncoderConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.mode, Mode::Narrowband);
        let mut encoder = cfg.build().unwrap();
        assert_eq!(encoder.frame_size(), 160);
        assert_eq!(encoder.complexity().unwrap(), 3);

        let cfg: SpeexDecoderConfig = serde_yaml::from_str("mode: ultra_wideband\n").unwrap();
        assert!(cfg.enhance);
        assert_eq!(cfg.build().unwrap().frame_size(), 640);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(serde_json::from_str::<SpeexDecoderConfig>(r#"{"mode": "fullband"}"#).is_err());
    }

    #[test]
    fn test_echo_config() {
        let yaml = "frame_size: 160\nfilter_length: 1600\nsample_rate: 8000\n";
        let cfg: EchoConfig = serde_yaml::from_str(yaml).unwrap();
        let mut echo = cfg.build().unwrap();
        assert_eq!(echo.frame_size(), 160);
        assert_eq!(echo.sampling_rate().unwrap(), 8000);

        let bad = EchoConfig {
            frame_size: 0,
            ..Default::default()
        };
        assert!(matches!(bad.build(), Err(Error::BadArgument(_))));
    }
}
