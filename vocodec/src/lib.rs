//! Resource-safe bindings for the Opus and Speex codecs and the SpeexDSP
//! echo canceller.
//!
//! This crate provides:
//!
//! - `opus`: Opus encoder and decoder contexts
//! - `speex`: Speex narrowband/wideband/ultra-wideband encoder and decoder contexts
//! - `echo`: acoustic echo cancellation
//! - `registry`: integer handles for hosts that cannot hold Rust values
//! - `pin`: scoped zero-copy access to caller buffers
//! - `config`: serde-driven construction of the above
//!
//! Native state is owned by exactly one Rust value and freed when it drops.
//! Caller buffers reach the native engines only through pin guards that are
//! released on every exit path.
//!
//! # Example
//!
//! ```no_run
//! use giztoy_vocodec::opus::{Application, Decoder, Encoder};
//!
//! let mut encoder = Encoder::new(8000, 1, Application::VoIP).unwrap();
//! let mut decoder = Decoder::new(8000, 1).unwrap();
//!
//! let pcm = vec![0i16; 160]; // 20ms at 8kHz
//! let mut packet = vec![0u8; 1000];
//! let n = encoder.encode(&pcm[..], 160, &mut packet[..], 1000).unwrap();
//!
//! let mut out = vec![0i16; 160];
//! let samples = decoder.decode(Some(&packet[..]), n, &mut out[..], 160, false).unwrap();
//! assert_eq!(samples, 160);
//! ```
//!
//! # Linking
//!
//! `libopus`, `libspeex` and `libspeexdsp` are linked dynamically. Set
//! `VOCODEC_LIB_DIR` to add a search path.

pub mod config;
pub mod ctl;
pub mod echo;
mod error;
pub mod opus;
pub mod pin;
pub mod registry;
pub mod report;
pub mod sample;
pub mod speex;

pub use ctl::Control;
pub use echo::EchoCanceller;
pub use error::{code, to_code, Engine, Error, Result};
pub use registry::{DecoderHandle, EchoHandle, EncoderHandle, Registry};
pub use report::{error_string, version_string};
pub use sample::Sample;
