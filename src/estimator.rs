//! Batch estimator: pass-through stream plus sync tags
//!
//! The [`CorrEstimator`] ties the stages together. Each call to
//! [`process()`](CorrEstimator::process) consumes a batch of input
//! samples and produces:
//!
//! 1. the input samples, unmodified, at the same stream positions
//!    (a pure pass-through);
//! 2. optionally, one normalized correlation value per input
//!    sample, for diagnostic inspection; and
//! 3. sync tags — metadata events keyed by absolute sample index —
//!    for every correlation peak whose marked position has been
//!    produced.
//!
//! Tags are marked `mark_delay` samples after the correlation peak.
//! A tag is never released before its position exists in the output
//! stream; if the marked position lies beyond the current batch,
//! the tag is held and released by a later call.

use std::collections::VecDeque;

use num_complex::Complex;
use num_traits::Zero;

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use crate::builder::{validate_threshold, CorrEstBuilder, InvalidConfiguration};
use crate::correlator::SlidingCorrelator;
use crate::peak::PeakDetector;
use crate::waveform::build_reference;

/// Sync word detection tag
///
/// One tag is emitted per detected correlation peak. Tags are
/// keyed by `position`, an absolute index into the pass-through
/// output stream, and carry the estimates downstream
/// synchronization stages need to correct their own loops.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyncTag {
    /// Absolute sample index this tag is attached to
    ///
    /// Equal to `corr_start + mark_delay`.
    pub position: u64,

    /// Carrier phase offset at the peak, radians
    pub phase_est: f32,

    /// Sub-sample timing offset at the peak, fractional samples
    pub time_est: f32,

    /// Complex correlation value at the peak
    pub corr_est: Complex<f32>,

    /// Absolute sample index of the correlation peak itself
    pub corr_start: u64,
}

/// Output of one [`CorrEstimator::process()`] call
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessOut {
    /// Pass-through samples, identical to the input batch
    pub output: Vec<Complex<f32>>,

    /// Normalized correlation values, one per input sample
    ///
    /// Only present when the diagnostic correlation output is
    /// enabled. Samples still in warm-up are zero, keeping the
    /// stream aligned sample-for-sample with `output`.
    pub corr: Option<Vec<Complex<f32>>>,

    /// Tags released by this batch, in emission order
    pub tags: Vec<SyncTag>,
}

/// Streaming sync word correlator and estimator
///
/// Detects a known reference sequence in a stream of complex
/// samples and estimates the carrier phase and sub-sample timing
/// offset at each detection, emitting the estimates as
/// [`SyncTag`]s. The input stream is passed through unmodified.
///
/// Create one with a [`CorrEstBuilder`]:
///
/// ```
/// use correst::CorrEstBuilder;
/// use num_complex::Complex;
///
/// let symbols = vec![Complex::new(1.0f32, 0.0), Complex::new(-1.0, 0.0)];
/// let est = CorrEstBuilder::new(&symbols, 2.0).build().expect("valid configuration");
/// assert_eq!(est.threshold(), 0.9);
/// ```
///
/// All processing is synchronous and single-threaded; the
/// estimator owns its entire state, and reconfiguration is
/// serialized with processing by `&mut self`.
#[derive(Clone, Debug)]
pub struct CorrEstimator {
    symbols: Vec<Complex<f32>>,
    sps: f32,
    mark_delay: u64,

    correlator: SlidingCorrelator,
    detector: PeakDetector,
    correlation_output: bool,

    // lifetime count of consumed input samples; the absolute index
    // of the next sample to arrive
    sample_counter: u64,

    // tags waiting for their marked position to be produced
    pending: VecDeque<SyncTag>,
}

impl CorrEstimator {
    // Called by CorrEstBuilder::build()
    pub(crate) fn from_builder(builder: &CorrEstBuilder) -> Result<Self, InvalidConfiguration> {
        let waveform = build_reference(builder.symbols(), builder.sps())?;
        let threshold = validate_threshold(builder.threshold())?;

        Ok(Self {
            symbols: builder.symbols().to_vec(),
            sps: builder.sps(),
            mark_delay: builder.mark_delay(),
            correlator: SlidingCorrelator::new(&waveform),
            detector: PeakDetector::new(threshold),
            correlation_output: builder.correlation_output(),
            sample_counter: 0,
            pending: VecDeque::new(),
        })
    }

    /// Process a batch of input samples
    ///
    /// Consumes `input` and returns exactly `input.len()` output
    /// samples — the input itself, unmodified — along with any
    /// released [`SyncTag`]s and, if enabled, the diagnostic
    /// correlation stream. One output sample is produced for every
    /// input sample, always.
    pub fn process(&mut self, input: &[Complex<f32>]) -> ProcessOut {
        let mut corr_out = self
            .correlation_output
            .then(|| Vec::with_capacity(input.len()));

        for &sample in input.iter() {
            let index = self.sample_counter;
            let corr = self.correlator.on_sample(sample);

            if let Some(corr) = corr {
                if let Some(peak) = self.detector.input(index, corr) {
                    self.pending.push_back(SyncTag {
                        position: peak.index + self.mark_delay,
                        phase_est: peak.phase,
                        time_est: peak.timing,
                        corr_est: peak.corr,
                        corr_start: peak.index,
                    });
                }
            }

            if let Some(ref mut out) = corr_out {
                out.push(corr.unwrap_or_else(Complex::zero));
            }

            self.sample_counter += 1;
        }

        ProcessOut {
            output: input.to_vec(),
            corr: corr_out,
            tags: self.release_tags(),
        }
    }

    // Release every pending tag whose marked position has been
    // produced. Changing mark_delay between batches can reorder
    // pending positions, so the whole queue is scanned.
    fn release_tags(&mut self) -> Vec<SyncTag> {
        let mut tags = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].position < self.sample_counter {
                tags.push(self.pending.remove(i).expect("pending occupancy"));
            } else {
                i += 1;
            }
        }
        tags
    }

    /// Sync word symbols
    pub fn symbols(&self) -> &[Complex<f32>] {
        &self.symbols
    }

    /// Replace the sync word
    ///
    /// The reference waveform is regenerated and the sample window
    /// and detector state are discarded; the change takes effect
    /// from the next input sample. The stream position and any
    /// already-detected pending tags are preserved.
    pub fn set_symbols(&mut self, symbols: &[Complex<f32>]) -> Result<(), InvalidConfiguration> {
        let waveform = build_reference(symbols, self.sps)?;
        self.symbols = symbols.to_vec();
        self.correlator = SlidingCorrelator::new(&waveform);
        self.detector.reset();
        debug!(
            "reconfigure: {} symbols, reference length {}",
            self.symbols.len(),
            self.correlator.len()
        );
        Ok(())
    }

    /// Samples per symbol
    ///
    /// Fixed at construction; changing it requires
    /// [`reconfigure()`](#method.reconfigure).
    pub fn sps(&self) -> f32 {
        self.sps
    }

    /// Tag marking delay, in samples
    pub fn mark_delay(&self) -> u64 {
        self.mark_delay
    }

    /// Change the tag marking delay
    ///
    /// Affects only peaks detected after this call; tags already
    /// pending keep the delay in force when they were created. No
    /// DSP state is reset.
    pub fn set_mark_delay(&mut self, mark_delay: u64) {
        self.mark_delay = mark_delay;
    }

    /// Detection threshold
    pub fn threshold(&self) -> f32 {
        self.detector.threshold()
    }

    /// Change the detection threshold
    ///
    /// Must be in `(0, 1]`. The peak detector restarts from its
    /// below-threshold state; the sample window is unaffected.
    pub fn set_threshold(&mut self, threshold: f32) -> Result<(), InvalidConfiguration> {
        self.detector.set_threshold(validate_threshold(threshold)?);
        Ok(())
    }

    /// Reference waveform length, in samples
    ///
    /// Equals `round(symbols.len() * sps)`. The correlator emits
    /// nothing until this many samples have been consumed.
    pub fn reference_len(&self) -> usize {
        self.correlator.len()
    }

    /// Lifetime count of consumed input samples
    pub fn sample_counter(&self) -> u64 {
        self.sample_counter
    }

    /// Replace the entire configuration
    ///
    /// Validates `builder` and swaps in the new configuration
    /// atomically: on error, the estimator is left exactly as it
    /// was. DSP state is discarded as in [`set_symbols()`]
    /// (#method.set_symbols); the stream position and pending tags
    /// are preserved.
    pub fn reconfigure(&mut self, builder: &CorrEstBuilder) -> Result<(), InvalidConfiguration> {
        let mut next = Self::from_builder(builder)?;
        next.sample_counter = self.sample_counter;
        next.pending = std::mem::take(&mut self.pending);
        *self = next;
        debug!(
            "reconfigure: {} symbols at {} sps, threshold {:.2}, mark delay {}",
            self.symbols.len(),
            self.sps,
            self.threshold(),
            self.mark_delay
        );
        Ok(())
    }

    /// Reset to zero initial conditions
    ///
    /// Clears the sample window, detector state, pending tags, and
    /// the sample counter. The configuration is kept.
    pub fn reset(&mut self) {
        self.correlator.reset();
        self.detector.reset();
        self.pending.clear();
        self.sample_counter = 0;
    }
}
