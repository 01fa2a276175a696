//! Sliding correlation against the reference waveform
//!
//! The [`SlidingCorrelator`] maintains a window of the most recent
//! input samples, equal in length to the reference waveform, and
//! computes one normalized complex correlation value per input
//! sample:
//!
//! ```txt
//! corr = Σᵢ window[i] · conj(waveform[i])
//!        ─────────────────────────────────
//!        sqrt( Σ|window|² · Σ|waveform|² )
//! ```
//!
//! The normalization makes a perfect match come out at magnitude
//! 1.0 regardless of the input amplitude, which is what makes a
//! detection threshold meaningful as a fraction of full
//! correlation.
//!
//! The window energy `Σ|window|²` is maintained incrementally: the
//! new sample's energy is added and the evicted sample's energy is
//! removed. One exact recomputation per window length of evictions
//! keeps floating-point drift from accumulating.

use std::collections::VecDeque;

use nalgebra::DVector;
use num_complex::Complex;
use num_traits::Zero;

/// Reference correlation taps
///
/// Stores the conjugated reference waveform, in window order
/// (oldest sample first), along with its precomputed energy.
/// Correlation is then a single multiply-accumulate pass over the
/// sample window; no flipping is needed at run time.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceTaps {
    taps: DVector<Complex<f32>>,
    energy: f32,
}

impl ReferenceTaps {
    /// Create taps from the reference waveform
    ///
    /// The `waveform` must be non-empty; this is enforced upstream
    /// by waveform construction.
    pub fn from_waveform(waveform: &[Complex<f32>]) -> Self {
        debug_assert!(!waveform.is_empty());
        let energy = waveform.iter().map(|sa| sa.norm_sqr()).sum();
        Self {
            taps: DVector::from_iterator(waveform.len(), waveform.iter().map(|sa| sa.conj())),
            energy,
        }
    }

    /// Number of taps
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Reference energy, `Σ|waveform[i]|²`
    pub fn energy(&self) -> f32 {
        self.energy
    }

    // Unnormalized correlation of `window` against the reference
    //
    // `window` is the sample window in arrival order; it must hold
    // exactly `len()` samples.
    fn correlate(&self, window: &VecDeque<Complex<f32>>) -> Complex<f32> {
        debug_assert_eq!(window.len(), self.taps.len());
        let mut out = Complex::zero();
        for (sa, tap) in window.iter().zip(self.taps.iter()) {
            out += *sa * *tap;
        }
        out
    }
}

/// Fixed-capacity window of the most recent input samples
///
/// New samples are pushed onto the back; once the window is full,
/// the oldest sample is evicted on every arrival. The window also
/// carries a running estimate of its own energy.
#[derive(Clone, Debug)]
pub struct SampleWindow {
    samples: VecDeque<Complex<f32>>,
    capacity: usize,
    energy: f32,
    // evictions since the last exact energy recomputation
    evictions: usize,
}

impl SampleWindow {
    /// Create an empty window holding up to `capacity` samples
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            energy: 0.0f32,
            evictions: 0,
        }
    }

    /// Reset to zero initial conditions
    ///
    /// The window is emptied; a full warm-up period follows.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.energy = 0.0f32;
        self.evictions = 0;
    }

    /// Push a sample, evicting the oldest if full
    pub fn push(&mut self, sample: Complex<f32>) {
        if self.samples.len() == self.capacity {
            let old = self.samples.pop_front().expect("window occupancy");
            self.energy -= old.norm_sqr();
            self.evictions += 1;
        }
        self.samples.push_back(sample);
        self.energy += sample.norm_sqr();

        if self.evictions >= self.capacity {
            self.energy = self.samples.iter().map(|sa| sa.norm_sqr()).sum();
            self.evictions = 0;
        }
    }

    /// Is the window at capacity?
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Window energy, `Σ|window[i]|²`
    ///
    /// The incremental update can drift slightly negative on an
    /// all-zero tail; the estimate is floored at zero.
    pub fn energy(&self) -> f32 {
        f32::max(self.energy, 0.0f32)
    }

    /// Current window contents, oldest sample first
    pub fn samples(&self) -> &VecDeque<Complex<f32>> {
        &self.samples
    }
}

/// Sliding correlator
///
/// Feeds every input sample through the sample window and emits one
/// normalized correlation value per sample once the window is full.
/// The warm-up period (`len - 1` samples) emits nothing.
#[derive(Clone, Debug)]
pub struct SlidingCorrelator {
    taps: ReferenceTaps,
    window: SampleWindow,
}

impl SlidingCorrelator {
    // Degenerate-energy guard; windows quieter than this are
    // reported as zero correlation rather than dividing by a
    // vanishing norm
    const ENERGY_FLOOR: f32 = 1.0e-20f32;

    /// Create a correlator for the given reference waveform
    pub fn new(waveform: &[Complex<f32>]) -> Self {
        let taps = ReferenceTaps::from_waveform(waveform);
        let window = SampleWindow::new(taps.len());
        Self { taps, window }
    }

    /// Process one input sample
    ///
    /// Returns `None` during warm-up. Once the window is full,
    /// returns the normalized correlation of the window ending at
    /// this sample. An all-zero window yields a defined zero
    /// correlation, never a division fault.
    pub fn on_sample(&mut self, sample: Complex<f32>) -> Option<Complex<f32>> {
        self.window.push(sample);
        if !self.window.is_full() {
            return None;
        }

        let norm_sqr = self.window.energy() * self.taps.energy();
        if norm_sqr <= Self::ENERGY_FLOOR {
            return Some(Complex::zero());
        }

        let dot = self.taps.correlate(self.window.samples());
        Some(dot / norm_sqr.sqrt())
    }

    /// Reference waveform length, in samples
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Reset to zero initial conditions
    ///
    /// Clears the window; the reference taps are kept.
    pub fn reset(&mut self) {
        self.window.reset();
    }
}
