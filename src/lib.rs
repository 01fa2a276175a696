//! # correst: sync word correlation and offset estimation
//!
//! This crate detects a known reference sequence — a *sync word* —
//! in a continuous stream of complex samples, and estimates the
//! carrier phase offset and sub-sample timing offset at each
//! detection point. The estimates are emitted as stream-synchronized
//! metadata ([`SyncTag`]) for use by follow-on synchronization
//! stages, while the sample stream itself passes through unmodified.
//!
//! The sync word is provided as a sequence of complex symbols. A
//! root-raised-cosine matched filter upsamples and shapes the
//! symbols into the reference waveform the correlator searches for.
//! On every input sample, the correlator computes a normalized
//! complex correlation between the most recent window of samples
//! and the reference; a perfect match has magnitude 1.0 regardless
//! of input amplitude, so the detection `threshold` is a fraction
//! of full correlation.
//!
//! At each threshold-crossing local maximum of the correlation
//! magnitude, a [`SyncTag`] reports:
//!
//! * `phase_est` — the argument of the complex correlation at the
//!   peak, usable by downstream carrier phase correction loops;
//! * `time_est` — a sub-sample timing offset recovered by parabolic
//!   interpolation of the magnitudes around the peak, usable by
//!   downstream clock synchronization;
//! * `corr_est` — the complex correlation value itself; and
//! * `corr_start` — the absolute sample index of the peak.
//!
//! Tags are attached `mark_delay` samples after the peak, which
//! lets the caller mark the proper point in the sync word for the
//! particular modulation and downstream stages in use.
//!
//! ## Example
//!
//! ```
//! use correst::{build_reference, CorrEstBuilder};
//! use num_complex::Complex;
//!
//! // a two-symbol BPSK sync word at 2 samples per symbol
//! let symbols = vec![Complex::new(1.0f32, 0.0), Complex::new(-1.0f32, 0.0)];
//! let mut est = CorrEstBuilder::new(&symbols, 2.0)
//!     .build()
//!     .expect("valid configuration");
//!
//! // feed the sync word itself, followed by silence
//! let mut input = build_reference(&symbols, 2.0).expect("valid configuration");
//! input.resize(input.len() + 16, Complex::new(0.0, 0.0));
//!
//! let out = est.process(&input);
//! assert_eq!(out.output, input);     // pure pass-through
//!
//! // one detection, at the last sample of the sync word
//! assert_eq!(out.tags.len(), 1);
//! let tag = &out.tags[0];
//! assert_eq!(tag.corr_start, 3);
//! assert!(tag.corr_est.norm() > 0.9);
//! assert!(tag.phase_est.abs() < 1.0e-3);
//! ```
//!
//! The estimator is deliberately decoupled from any host streaming
//! framework: [`CorrEstimator::process()`] consumes a batch of
//! samples and returns an equal-length batch of output plus a list
//! of tags keyed by absolute sample index. Binding it to a
//! scheduler, a sound card, or an SDR is a thin adapter left to the
//! caller.
//!
//! Configuration is validated up front. The builder and every
//! runtime setter reject empty symbol sets, `sps < 1`, and
//! detection thresholds outside `(0, 1]` with
//! [`InvalidConfiguration`]; steady-state processing never fails.

mod builder;
mod correlator;
mod estimator;
mod peak;
mod waveform;

pub use builder::{CorrEstBuilder, InvalidConfiguration};
pub use estimator::{CorrEstimator, ProcessOut, SyncTag};
pub use waveform::{build_reference, ROLLOFF};
