//! Estimator configuration and construction

use num_complex::Complex;
use thiserror::Error;

use crate::estimator::CorrEstimator;

/// Configuration error
///
/// Returned by [`CorrEstBuilder::build()`] and by the runtime
/// setters on [`CorrEstimator`] when a parameter violates its
/// constraints. Configuration errors are always surfaced
/// synchronously to the caller; they are never raised during
/// sample processing.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InvalidConfiguration {
    /// The sync word contains no symbols
    #[error("sync word must contain at least one symbol")]
    EmptySymbols,

    /// Samples per symbol below one (or not finite)
    #[error("samples per symbol must be at least 1.0 (got {0})")]
    InvalidSps(f32),

    /// Detection threshold outside `(0, 1]`
    ///
    /// The correlation is normalized so that a perfect match has
    /// magnitude 1.0; a threshold outside `(0, 1]` can never fire
    /// meaningfully.
    #[error("threshold must be in (0, 1] (got {0})")]
    InvalidThreshold(f32),
}

/// Builds a sync word correlator and estimator
///
/// The builder requires the sync word `symbols` and the number of
/// samples per symbol; everything else has a sensible default.
///
/// ```
/// use correst::CorrEstBuilder;
/// use num_complex::Complex;
///
/// let symbols = vec![Complex::new(1.0f32, 0.0), Complex::new(-1.0, 0.0)];
/// let est = CorrEstBuilder::new(&symbols, 2.0)
///     .with_threshold(0.8)
///     .with_mark_delay(4)
///     .build()
///     .expect("valid configuration");
/// assert_eq!(est.mark_delay(), 4);
/// ```
///
/// Unlike the estimator's runtime setters, the builder's `with_*`
/// methods accept any value; validation happens once, in
/// [`build()`](#method.build).
#[derive(Clone, Debug, PartialEq)]
pub struct CorrEstBuilder {
    symbols: Vec<Complex<f32>>,
    sps: f32,
    mark_delay: u64,
    threshold: f32,
    correlation_output: bool,
}

impl CorrEstBuilder {
    /// New builder with default detection parameters
    ///
    /// `symbols` is the sync word to search for, and `sps` is the
    /// number of samples per symbol of the input stream. The
    /// detection threshold defaults to `0.9`, the tag marking delay
    /// to `0`, and the diagnostic correlation output to disabled.
    pub fn new(symbols: &[Complex<f32>], sps: f32) -> Self {
        Self {
            symbols: symbols.to_vec(),
            sps,
            mark_delay: 0,
            threshold: 0.9f32,
            correlation_output: false,
        }
    }

    /// Build the estimator
    ///
    /// Validates the configuration, generates the reference
    /// waveform, and returns an estimator that is immediately
    /// ready to process samples.
    pub fn build(&self) -> Result<CorrEstimator, InvalidConfiguration> {
        CorrEstimator::from_builder(self)
    }

    /// Detection threshold (fraction of a full-scale correlation)
    ///
    /// A peak is only reported when the normalized correlation
    /// magnitude reaches `threshold`. A perfect match has magnitude
    /// 1.0 regardless of input amplitude, so the threshold is a
    /// fraction of full correlation. Must be in `(0, 1]`.
    pub fn with_threshold(&mut self, threshold: f32) -> &mut Self {
        self.threshold = threshold;
        self
    }

    /// Tag marking delay, in samples
    ///
    /// Tags are attached `mark_delay` samples after the peak of the
    /// correlation. Use this to mark the proper point in the sync
    /// word for downstream synchronization stages.
    pub fn with_mark_delay(&mut self, mark_delay: u64) -> &mut Self {
        self.mark_delay = mark_delay;
        self
    }

    /// Enable or disable the diagnostic correlation output
    ///
    /// When enabled, [`process()`](crate::CorrEstimator::process)
    /// emits the raw normalized correlation values alongside the
    /// pass-through output, one per input sample.
    pub fn with_correlation_output(&mut self, enable: bool) -> &mut Self {
        self.correlation_output = enable;
        self
    }

    /// Sync word symbols
    pub fn symbols(&self) -> &[Complex<f32>] {
        &self.symbols
    }

    /// Samples per symbol
    pub fn sps(&self) -> f32 {
        self.sps
    }

    /// Tag marking delay, in samples
    pub fn mark_delay(&self) -> u64 {
        self.mark_delay
    }

    /// Detection threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Is the diagnostic correlation output enabled?
    pub fn correlation_output(&self) -> bool {
        self.correlation_output
    }
}

// Validate a detection threshold
pub(crate) fn validate_threshold(threshold: f32) -> Result<f32, InvalidConfiguration> {
    if threshold > 0.0f32 && threshold <= 1.0f32 {
        Ok(threshold)
    } else {
        Err(InvalidConfiguration::InvalidThreshold(threshold))
    }
}
