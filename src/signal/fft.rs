use std::sync::Arc;

use ndarray::Array1;
use num::complex::Complex64;
use rustfft::FftPlanner;

use super::{fir::hamming_window, SampledDomain};

pub trait FFT {
    fn fft_planned(self, plan: &Arc<dyn rustfft::Fft<f64>>) -> Array1<Complex64>;
    fn fft(self) -> Array1<Complex64>;

    // Normalized by 1/N so that ifft(fft(x)) == x.
    fn ifft(self) -> Array1<Complex64>;
}

impl FFT for Array1<Complex64> {
    fn fft_planned(self, plan: &Arc<dyn rustfft::Fft<f64>>) -> Array1<Complex64> {
        let mut buffer = self.to_vec();
        plan.process(&mut buffer);

        Array1::from(buffer)
    }

    fn fft(self) -> Array1<Complex64> {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(self.len());

        self.fft_planned(&fft)
    }

    fn ifft(self) -> Array1<Complex64> {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_inverse(self.len());

        let N = self.len() as f64;

        self.fft_planned(&fft) / Complex64::new(N, 0.)
    }
}

/// Hamming-windowed power spectral density in decibels, bin order as returned by the transform.
pub fn psd(data: &Array1<Complex64>) -> Array1<f64> {
    let window = hamming_window(data.len()).mapv(|w| Complex64::new(w, 0.));
    (data * &window).fft().mapv(|x| {
        let db = 10. * x.norm_sqr().log10();
        if db.is_finite() {
            db
        } else {
            0.
        }
    })
}

/// Frequency of the strongest bin of `data` sampled at `sample_rate`.
pub fn dominant_frequency(data: &Array1<Complex64>, sample_rate: f64) -> f64 {
    if data.is_empty() {
        return 0.;
    }
    let freqs =
        SampledDomain::from_sample_interval(0., 1. / sample_rate, data.len()).fft_frequencies();
    let spectrum = psd(data);
    let peak = spectrum
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|x| x.0)
        .unwrap_or(0);
    freqs[peak]
}

#[cfg(test)]
mod test {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;
    use ndarray::Array1;
    use num::complex::Complex64;

    use super::{dominant_frequency, FFT};

    #[test]
    fn ifft_commutes_with_fft() {
        let signal: Array1<Complex64> = (0..10)
            .map(|k| Complex64::new((k as f64 * 0.3).cos(), (k as f64 * 0.7).sin()))
            .collect();

        {
            let transformed = signal.clone().fft().ifft();
            assert_relative_eq!(signal, transformed, epsilon = 1e-12);
        }

        {
            let transformed = signal.clone().ifft().fft();
            assert_relative_eq!(signal, transformed, epsilon = 1e-12);
        }
    }

    #[test]
    fn dominant_frequency_finds_tone() {
        let fs = 1024.;
        let f = 64.;
        let signal: Array1<Complex64> = (0..256)
            .map(|k| (Complex64::i() * 2. * PI * f * k as f64 / fs).exp())
            .collect();
        assert_relative_eq!(dominant_frequency(&signal, fs), f);

        let negative = signal.mapv(|z| z.conj());
        assert_relative_eq!(dominant_frequency(&negative, fs), -f);
    }
}
