//! callsim Audio Backend
//!
//! This crate renders clean voice recordings as phone calls: the room they
//! were recorded in, the street noise behind the caller, the phone network in
//! between and the handset at the far end.
//!
//! # Overview
//!
//! [`process_audio`] is the functional core. It takes a voice buffer, a
//! parameter record and a seed and returns the processed buffer plus a
//! [`RenderStatus`](callsim_spec::RenderStatus) describing which optional
//! branches fired. [`RenderSession`] wraps it with input decoding, WAV
//! output and temp-file ownership.
//!
//! - **Source conditioning** - spectral-gate dereverb, HPF/LPF, one-knob leveler
//! - **Impulse responses** - room, background-bed and handset IRs with a
//!   guard that never applies the same file twice
//! - **Scene** - foreground sound effects and a ducked background bed
//! - **Phone frame** - tier passband, landline μ-law coloration, legacy bandwidth,
//!   Opus round trip
//! - **Network** - dropouts, garble, stutter, jitter, reordering, codec artifacts
//!
//! # Determinism
//!
//! Every stochastic stage draws from its own PCG32 stream, seeded by BLAKE3
//! from the stage name, the render seed and a local index. Given the same
//! input, parameters and seed the output is bit-identical.
//!
//! # Example
//!
//! ```ignore
//! use callsim_backend_audio::RenderSession;
//! use callsim_spec::EffectParameters;
//!
//! let params = EffectParameters::from_json(r#"{ "quality_tier": "cordless" }"#)?;
//! let mut session = RenderSession::new()?;
//! let out = session.render(Path::new("voice.wav"), &params, 42)?;
//!
//! println!("{}", out.status);
//! println!("PCM hash: {}", out.pcm_hash);
//! ```
//!
//! # Crate Structure
//!
//! - [`pipeline`] - Stage orchestration
//! - [`session`] - Render sessions and output files
//! - [`decode`] - symphonia decoding with ffmpeg fallback
//! - [`convolve`] - Impulse responses and FFT convolution
//! - [`tier`] - Phone-quality tiers and μ-law coloration
//! - [`network`] - Network-impairment simulators
//! - [`opus`] - Opus codec round trip through ffmpeg
//! - [`background`] - Background bed with ducking
//! - [`events`] - Foreground event placement
//! - [`rng`] - Deterministic RNG with seed derivation
//! - [`wav`] - Deterministic WAV file writer

pub mod background;
pub mod buffer;
pub mod convolve;
pub mod decode;
pub mod dereverb;
pub mod dynamics;
pub mod error;
pub mod events;
pub mod filter;
pub mod loudness;
pub mod network;
pub mod opus;
pub mod pipeline;
pub mod resample;
pub mod rng;
pub mod session;
pub mod tier;
pub mod wav;

// Re-export main types at crate root
pub use buffer::AudioBuffer;
pub use error::{AudioError, AudioResult};
pub use pipeline::{process_audio, process_file, MAX_INPUT_SECONDS, MIN_INPUT_SECONDS};
pub use session::{RenderOutput, RenderSession};
pub use wav::WavResult;
