use crate::transmitter::PhaseNoiseMask;
use ndarray::Array2;
use num_complex::Complex64;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use rustfft::FftPlanner;
use tracing::debug;

/// Generates a multiplicative oscillator phase-noise envelope.
///
/// Each row is an independent realization of length `samples` whose one-sided
/// phase PSD follows the SSB mask at sampling rate `fs`. The envelope is
/// `exp(j*phi_n)` with `phi_n` a zero-mean Gaussian sequence shaped in the
/// frequency domain:
///
/// 1. sort the mask, drop entries at or above `fs/2`, prepend 0 dBc/Hz at DC;
/// 2. interpolate the mask in log-frequency onto `M = floor(N/2)+1` equally
///    spaced bins covering `[0, fs/2]`;
/// 3. scale unit complex Gaussians by `M * sqrt(delta_f * P)` (the `M` factor
///    compensates the IFFT normalization);
/// 4. mirror to a Hermitian spectrum of `2M-2` points, zero the DC bin, and
///    inverse-FFT; the real part of the first `N` samples is the phase angle.
///
/// Row `r` draws from stream `r` of the seeded generator, so realizations are
/// independent of evaluation order. In validation mode every Gaussian draw is
/// replaced by `sqrt(0.5)*(1+j)` for reproducible baselines.
pub fn phase_noise_envelope(
    mask: &PhaseNoiseMask,
    fs: f64,
    rows: usize,
    samples: usize,
    seed: u64,
    validation: bool,
) -> Array2<Complex64> {
    let mut pairs: Vec<(f64, f64)> = mask
        .f
        .iter()
        .zip(mask.power.iter())
        .map(|(&f, &p)| (f, p))
        .filter(|&(f, _)| f < fs / 2.0)
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    if !pairs.iter().any(|&(f, _)| f == 0.0) {
        pairs.insert(0, (0.0, 0.0));
    }

    let num_f_points = if samples % 2 == 1 {
        (samples + 1) / 2 + 1
    } else {
        samples / 2 + 1
    };
    let m = num_f_points;
    let fft_len = 2 * m - 2;

    let f_grid: Vec<f64> = (0..m)
        .map(|i| fs / 2.0 * i as f64 / (m - 1) as f64)
        .collect();
    let mut delta_f: Vec<f64> = f_grid.windows(2).map(|w| w[1] - w[0]).collect();
    delta_f.push(f_grid[m - 1] - f_grid[m - 2]);

    // piecewise interpolation of the mask in log-frequency; the tiny offset
    // keeps log10 finite at DC
    let realmin = f64::MIN_POSITIVE;
    let mut log_p = vec![0.0f64; m];
    for (i, &(left, t1)) in pairs.iter().enumerate() {
        let (right, t2) = if i == pairs.len() - 1 {
            (fs / 2.0, pairs[pairs.len() - 1].1)
        } else {
            pairs[i + 1]
        };
        let last = i == pairs.len() - 1;
        for (j, &fg) in f_grid.iter().enumerate() {
            let inside = if last {
                fg >= left && fg <= right
            } else {
                fg >= left && fg < right
            };
            if inside {
                log_p[j] = t1
                    + ((fg + realmin).log10() - (left + realmin).log10())
                        / ((right + 2.0 * realmin).log10() - (left + realmin).log10())
                        * (t2 - t1);
            }
        }
    }
    let shape: Vec<f64> = log_p
        .iter()
        .zip(&delta_f)
        .map(|(lp, df)| m as f64 * (df * 10f64.powf(lp / 10.0)).sqrt())
        .collect();

    debug!(rows, samples, bins = m, "shaping phase noise spectrum");

    let mut planner = FftPlanner::<f64>::new();
    let ifft = planner.plan_fft_inverse(fft_len);
    let scale = 1.0 / fft_len as f64;

    let realized: Vec<Vec<Complex64>> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(row as u64);
            let mut spectrum = vec![Complex64::new(0.0, 0.0); fft_len];
            for (i, s) in shape.iter().enumerate() {
                let z = if validation {
                    Complex64::new(0.5f64.sqrt(), 0.5f64.sqrt())
                } else {
                    let re: f64 = StandardNormal.sample(&mut rng);
                    let im: f64 = StandardNormal.sample(&mut rng);
                    Complex64::new(re, im) * 0.5f64.sqrt()
                };
                spectrum[i] = *s * z;
            }
            // Hermitian mirror onto the negative frequencies, DC removed
            for i in 1..m - 1 {
                spectrum[fft_len - i] = spectrum[i].conj();
            }
            spectrum[0] = Complex64::new(0.0, 0.0);

            let mut scratch =
                vec![Complex64::new(0.0, 0.0); ifft.get_inplace_scratch_len()];
            ifft.process_with_scratch(&mut spectrum, &mut scratch);

            spectrum[..samples]
                .iter()
                .map(|x| Complex64::from_polar(1.0, -x.re * scale))
                .collect()
        })
        .collect();

    let mut envelope = Array2::zeros((rows, samples));
    for (row, phi) in realized.into_iter().enumerate() {
        for (k, z) in phi.into_iter().enumerate() {
            envelope[(row, k)] = z;
        }
    }
    envelope
}
