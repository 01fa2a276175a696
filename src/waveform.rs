//! Reference waveform construction
//!
//! The correlator searches for a sync word given as a sequence of
//! complex symbols. Before it can do that, the symbols must be
//! converted into the time-domain waveform that will actually be
//! received over the air: each symbol is placed `sps` samples apart
//! and shaped with a baseband matched filter.
//!
//! The pulse shape used here is a root-raised-cosine with a rolloff
//! of [`ROLLOFF`]. The waveform is evaluated directly in the time
//! domain, one output sample at a time, so the result is a pure
//! function of `(symbols, sps)`. Rebuilding with identical inputs
//! yields bit-identical output.

use num_complex::Complex;

use crate::builder::InvalidConfiguration;

/// Root-raised-cosine rolloff factor for the reference pulse shape
pub const ROLLOFF: f32 = 0.35;

/// Build the time-domain reference waveform
///
/// Upsamples `symbols` by `sps` samples per symbol and applies
/// root-raised-cosine pulse shaping. The output length is
/// `round(symbols.len() * sps)` samples, with symbol `k` centered
/// on output sample `k * sps`.
///
/// The absolute scale of the waveform is irrelevant to the
/// correlator, which normalizes by reference energy; no gain
/// correction is applied.
///
/// Returns [`InvalidConfiguration`] if `symbols` is empty or
/// `sps < 1.0`.
pub fn build_reference(
    symbols: &[Complex<f32>],
    sps: f32,
) -> Result<Vec<Complex<f32>>, InvalidConfiguration> {
    if symbols.is_empty() {
        return Err(InvalidConfiguration::EmptySymbols);
    }
    if !(sps >= 1.0f32) || !sps.is_finite() {
        return Err(InvalidConfiguration::InvalidSps(sps));
    }

    let nsamples = usize::max((symbols.len() as f32 * sps).round() as usize, 1);

    let mut waveform = Vec::with_capacity(nsamples);
    for n in 0..nsamples {
        let mut sample = Complex::new(0.0f32, 0.0f32);
        for (k, sym) in symbols.iter().enumerate() {
            let t = (n as f32 - k as f32 * sps) / sps;
            sample += *sym * root_raised_cosine(t, ROLLOFF);
        }
        waveform.push(sample);
    }

    Ok(waveform)
}

// Root-raised-cosine impulse response
//
// `t` is expressed in symbol periods. The two singular points of the
// closed form, t = 0 and |t| = 1/(4β), are evaluated with their
// limits.
pub(crate) fn root_raised_cosine(t: f32, rolloff: f32) -> f32 {
    use std::f32::consts::PI;

    // each singularity gets its own guard on t; rounding of the
    // sample instants can leave t a hair away from either point
    if t.abs() < 1.0e-5f32 {
        return 1.0f32 + rolloff * (4.0f32 / PI - 1.0f32);
    }

    let four_beta_t = 4.0f32 * rolloff * t;
    if (four_beta_t.abs() - 1.0f32).abs() < 1.0e-5f32 {
        // |t| = 1/(4β)
        let x = PI / (4.0f32 * rolloff);
        return (rolloff / f32::sqrt(2.0f32))
            * ((1.0f32 + 2.0f32 / PI) * f32::sin(x) + (1.0f32 - 2.0f32 / PI) * f32::cos(x));
    }

    (f32::sin(PI * t * (1.0f32 - rolloff)) + four_beta_t * f32::cos(PI * t * (1.0f32 + rolloff)))
        / (PI * t * (1.0f32 - four_beta_t * four_beta_t))
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_rrc_singular_points() {
        use std::f32::consts::PI;

        // peak value at t = 0
        assert_approx_eq!(
            root_raised_cosine(0.0, 0.35),
            1.0 + 0.35 * (4.0 / PI - 1.0)
        );

        // the closed form blows up at |t| = 1/(4β); the limit must
        // agree with nearby points
        let t_sing = 1.0f32 / (4.0f32 * 0.35f32);
        let at_sing = root_raised_cosine(t_sing, 0.35);
        let nearby = root_raised_cosine(t_sing + 1.0e-3, 0.35);
        assert!((at_sing - nearby).abs() < 1.0e-2);

        // symmetric
        assert_approx_eq!(
            root_raised_cosine(0.7, 0.35),
            root_raised_cosine(-0.7, 0.35)
        );
    }

    #[test]
    fn test_rrc_near_zero_t() {
        // a sample instant that rounds to a hair off zero must
        // evaluate near the t = 0 peak, not fall into the
        // |t| = 1/(4β) limit
        let peak = root_raised_cosine(0.0, 0.35);
        assert_approx_eq!(root_raised_cosine(1.0e-7, 0.35), peak, 1.0e-3);
        assert_approx_eq!(root_raised_cosine(-1.0e-7, 0.35), peak, 1.0e-3);
    }

    #[test]
    fn test_reference_length() {
        let symbols = vec![Complex::new(1.0f32, 0.0); 3];

        // round(3 * 2.5) = 8
        let wave = build_reference(&symbols, 2.5).unwrap();
        assert_eq!(8, wave.len());

        let wave = build_reference(&symbols, 1.0).unwrap();
        assert_eq!(3, wave.len());

        let wave = build_reference(&symbols[..1], 4.0).unwrap();
        assert_eq!(4, wave.len());
    }

    #[test]
    fn test_reference_deterministic() {
        let symbols = vec![
            Complex::new(1.0f32, 0.0),
            Complex::new(-1.0, 0.0),
            Complex::new(0.0, 1.0),
        ];

        let one = build_reference(&symbols, 3.0).unwrap();
        let two = build_reference(&symbols, 3.0).unwrap();
        assert_eq!(one, two);
    }

    #[test]
    fn test_reference_rejects_bad_config() {
        let symbols = vec![Complex::new(1.0f32, 0.0)];

        assert!(matches!(
            build_reference(&[], 2.0),
            Err(InvalidConfiguration::EmptySymbols)
        ));
        assert!(matches!(
            build_reference(&symbols, 0.5),
            Err(InvalidConfiguration::InvalidSps(_))
        ));
        assert!(matches!(
            build_reference(&symbols, f32::NAN),
            Err(InvalidConfiguration::InvalidSps(_))
        ));
    }

    #[test]
    fn test_reference_bpsk_antipodal() {
        // [1, -1] at 2 sps: the pulse tails cancel at the midpoint
        // and the two symbol peaks are antipodal
        let symbols = vec![Complex::new(1.0f32, 0.0), Complex::new(-1.0, 0.0)];
        let wave = build_reference(&symbols, 2.0).unwrap();

        assert_eq!(4, wave.len());
        assert_approx_eq!(wave[0].re, -wave[2].re);
        assert_approx_eq!(wave[1].re, 0.0f32);
        assert!(wave[0].re > 1.0f32);
    }
}
