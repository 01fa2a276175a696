//! Correlation peak detection and offset estimation
//!
//! The [`PeakDetector`] watches the stream of normalized
//! correlation magnitudes for local maxima that reach the detection
//! threshold. At each qualifying peak it estimates:
//!
//! * the carrier phase offset, from the argument of the complex
//!   correlation value at the peak; and
//! * a sub-sample timing offset, by fitting a parabola through the
//!   magnitudes at `peak-1`, `peak`, `peak+1` and taking the vertex.
//!
//! Only a three-sample magnitude history is kept; there is no
//! persistent record of past peaks.

use arraydeque::ArrayDeque;
use num_complex::Complex;

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

/// Detector state
///
/// A peak is recognized on the `Rising → Falling` transition: the
/// first strict magnitude decrease after the threshold was crossed
/// on the way up. The sample *before* that decrease is the peak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PeakState {
    /// Magnitude below threshold
    Below,

    /// At or above threshold, not yet decreasing
    Rising,

    /// Past a peak, still at or above threshold
    ///
    /// A renewed increase returns to `Rising`, so back-to-back
    /// peaks that never dip below threshold are each reported.
    Falling,
}

/// One detected correlation peak
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakCandidate {
    /// Absolute sample index of the peak
    ///
    /// This is the index of the input sample at which the
    /// correlation window ended — i.e., the last sample of the
    /// matched segment.
    pub index: u64,

    /// Complex correlation value at the peak
    pub corr: Complex<f32>,

    /// Normalized correlation magnitude at the peak, in `[0, 1]`
    pub magnitude: f32,

    /// Carrier phase offset estimate, radians
    pub phase: f32,

    /// Sub-sample timing offset estimate, fractional samples
    ///
    /// Positive values place the true peak after `index`; the
    /// estimate is bounded by `±0.5` samples.
    pub timing: f32,
}

/// Threshold-crossing peak detector
#[derive(Clone, Debug)]
pub struct PeakDetector {
    threshold: f32,

    state: PeakState,

    // last three correlation magnitudes, oldest first
    history: ArrayDeque<f32, 3, arraydeque::Wrapping>,

    // correlation value one sample ago
    prev_corr: Complex<f32>,
}

impl PeakDetector {
    /// Create a detector with the given threshold
    ///
    /// `threshold` is a fraction of a full-scale (1.0) correlation;
    /// range validation happens in the configuration layer.
    pub fn new(threshold: f32) -> Self {
        let mut out = Self {
            threshold,
            state: PeakState::Below,
            history: ArrayDeque::default(),
            prev_corr: Complex::new(0.0f32, 0.0f32),
        };
        out.reset();
        out
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.state = PeakState::Below;
        self.history.clear();
        for _i in 0..self.history.capacity() {
            self.history.push_back(0.0f32);
        }
        self.prev_corr = Complex::new(0.0f32, 0.0f32);
    }

    /// Detection threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Change the detection threshold
    ///
    /// The detector state machine restarts from `Below`; magnitude
    /// history accumulated against the old threshold is discarded.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
        self.reset();
    }

    /// Process one correlation sample
    ///
    /// `index` is the absolute stream index of `corr`. Returns a
    /// [`PeakCandidate`] when this sample is the first strict
    /// decrease after a qualifying maximum; the candidate describes
    /// the *previous* sample.
    pub fn input(&mut self, index: u64, corr: Complex<f32>) -> Option<PeakCandidate> {
        let magnitude = corr.norm();
        let prev_magnitude = self.history[2];
        self.history.push_back(magnitude);

        let out = match self.state {
            PeakState::Below => {
                if magnitude >= self.threshold && magnitude > prev_magnitude {
                    self.state = PeakState::Rising;
                }
                None
            }
            PeakState::Rising => {
                if magnitude < prev_magnitude {
                    // previous sample was the peak; the history now
                    // holds [peak-1, peak, peak+1]
                    self.state = PeakState::Falling;
                    let timing =
                        parabolic_peak_offset(self.history[0], self.history[1], self.history[2]);
                    let peak = PeakCandidate {
                        index: index - 1,
                        corr: self.prev_corr,
                        magnitude: prev_magnitude,
                        phase: self.prev_corr.arg(),
                        timing,
                    };
                    debug!(
                        "peak: index {} magnitude {:.3} phase {:.3} timing {:+.3}",
                        peak.index, peak.magnitude, peak.phase, peak.timing
                    );
                    Some(peak)
                } else {
                    // plateaus of equal magnitude hold this state;
                    // the reported peak is the plateau sample next
                    // to the first strict decrease
                    None
                }
            }
            PeakState::Falling => {
                if magnitude < self.threshold {
                    self.state = PeakState::Below;
                } else if magnitude > prev_magnitude {
                    self.state = PeakState::Rising;
                }
                None
            }
        };

        self.prev_corr = corr;
        out
    }
}

// Parabolic interpolation of the peak position
//
// Fits a parabola through `(−1, m_prev)`, `(0, m_peak)`,
// `(+1, m_next)` and returns the abscissa of its vertex. Detection
// guarantees `m_peak ≥ m_prev` and `m_peak > m_next`, which bounds
// the result to `[−0.5, 0.5]`. A vanishing denominator (flat
// neighborhood) yields zero.
#[inline]
fn parabolic_peak_offset(m_prev: f32, m_peak: f32, m_next: f32) -> f32 {
    let denom = m_prev - 2.0f32 * m_peak + m_next;
    if denom.abs() < 1.0e-12f32 {
        0.0f32
    } else {
        0.5f32 * (m_prev - m_next) / denom
    }
}
