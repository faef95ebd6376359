use std::{cell::RefCell, f64::consts::PI};

use ndarray::Array1;
use num::complex::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::helper::snap_to_integer;

use self::scalar::Scalar;

pub mod algebra;
pub mod fft;
pub mod fir;
pub mod realization;
pub mod scalar;

/// Number of samples taken over `[0, interval)` at the given rate, i.e. `ceil(interval * rate)`.
pub fn sampling_freq_to_len(interval: f64, sampling_frequency: f64) -> usize {
    snap_to_integer(interval * sampling_frequency).ceil().max(0.) as usize
}

pub trait Signal {
    type Valued: Scalar;
    fn generate(&self, t: f64) -> Self::Valued;

    fn generate_signal(&self, time: &SampledDomain) -> Array1<Self::Valued> {
        time.iter().map(|t| self.generate(t)).collect()
    }
}

// Represents a half-open time or frequency interval `[start, start + range)`, sampled at a given rate.
#[derive(Clone, Debug)]
pub struct SampledDomain {
    start: f64,
    freq: f64,
    interval: f64,
    samples: usize,
}

impl SampledDomain {
    pub fn new(start: f64, duration: f64, freq: f64) -> SampledDomain {
        assert!(duration >= 0.);
        SampledDomain {
            start,
            freq,
            interval: 1. / freq,
            samples: sampling_freq_to_len(duration, freq),
        }
    }

    pub fn from_sample_interval(start: f64, interval: f64, num: usize) -> SampledDomain {
        SampledDomain {
            start,
            freq: 1. / interval,
            interval,
            samples: num,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    // One interval past the last sample.
    pub fn end(&self) -> f64 {
        self.start + self.samples as f64 * self.interval
    }

    pub fn freq(&self) -> f64 {
        self.freq
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }

    pub fn sample_interval(&self) -> f64 {
        self.interval
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> {
        let (start, interval) = (self.start, self.interval);
        (0..self.samples).map(move |k| start + k as f64 * interval)
    }

    // Index of the sample nearest to `t`, if `t` lies within half an interval of it.
    pub fn nearest_index(&self, t: f64) -> Option<usize> {
        let k = ((t - self.start) / self.interval).round();
        if k < 0. || k >= self.samples as f64 {
            return None;
        }
        let k = k as usize;
        let offset = (self.start + k as f64 * self.interval - t).abs();
        if offset <= self.interval / 2. {
            Some(k)
        } else {
            None
        }
    }

    // Frequencies of the bins of a transform over this domain, laid out like numpy's `fftfreq`:
    // non-negative frequencies first, then the negative ones.
    pub fn fft_frequencies(&self) -> Array1<f64> {
        let n = self.samples;
        let df = self.freq / n as f64;
        (0..n)
            .map(|k| {
                if k < (n + 1) / 2 {
                    k as f64 * df
                } else {
                    (k as f64 - n as f64) * df
                }
            })
            .collect()
    }
}

impl From<SampledDomain> for Array1<f64> {
    fn from(time: SampledDomain) -> Self {
        time.iter().collect()
    }
}

/// `A·cos(2πft + θ)`, the pure description of a tone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sinusoid {
    pub amplitude: f64,
    pub frequency: f64,
    pub phase: f64,
}

impl Sinusoid {
    pub fn new(amplitude: f64, frequency: f64, phase: f64) -> Sinusoid {
        Sinusoid {
            amplitude,
            frequency,
            phase,
        }
    }

    pub fn angular_frequency(&self) -> f64 {
        2. * PI * self.frequency
    }

    // Mean of |x(t)|^2 over one period of the real tone.
    pub fn average_power(&self) -> f64 {
        self.amplitude * self.amplitude / 2.
    }

    // Smallest rate that satisfies Nyquist for this tone.
    pub fn default_sample_rate(&self) -> f64 {
        2. * self.frequency.abs() + 1.
    }
}

/// How a [Sinusoid] is realized in the time domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    // A·cos(ωt + θ)
    Cosine,
    // A·sin(ωt + θ)
    Sine,
    // A·e^{j(ωt + θ)}
    Complex,
}

impl Variant {
    pub fn is_real(&self) -> bool {
        !matches!(self, Variant::Complex)
    }
}

/// A sinusoid together with the variant used to sample it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub sinusoid: Sinusoid,
    pub variant: Variant,
}

impl Tone {
    pub fn cosine(sinusoid: Sinusoid) -> Tone {
        Tone {
            sinusoid,
            variant: Variant::Cosine,
        }
    }

    pub fn sine(sinusoid: Sinusoid) -> Tone {
        Tone {
            sinusoid,
            variant: Variant::Sine,
        }
    }

    pub fn complex(sinusoid: Sinusoid) -> Tone {
        Tone {
            sinusoid,
            variant: Variant::Complex,
        }
    }

    // The cosine that produces the same samples as this tone's real part.
    // sin(ωt + θ) = cos(-ωt + π/2 - θ)
    pub fn cosine_equivalent(&self) -> Sinusoid {
        match self.variant {
            Variant::Sine => Sinusoid {
                amplitude: self.sinusoid.amplitude,
                frequency: -self.sinusoid.frequency,
                phase: PI / 2. - self.sinusoid.phase,
            },
            Variant::Cosine | Variant::Complex => self.sinusoid,
        }
    }

    pub fn average_power(&self) -> f64 {
        match self.variant {
            Variant::Complex => self.sinusoid.amplitude * self.sinusoid.amplitude,
            Variant::Cosine | Variant::Sine => self.sinusoid.average_power(),
        }
    }
}

impl Signal for Tone {
    type Valued = Complex64;

    fn generate(&self, t: f64) -> Self::Valued {
        const i: Complex64 = Complex64::new(0., 1.);

        let s = self.cosine_equivalent();
        let arg = s.angular_frequency() * t + s.phase;
        match self.variant {
            Variant::Complex => s.amplitude * (i * arg).exp(),
            Variant::Cosine | Variant::Sine => Complex64::new(s.amplitude * arg.cos(), 0.),
        }
    }
}

// Implements a random gaussian signal. This signal is inherently non-deterministic, and calling generate twice with the same value
// will almost certainly yield different results.
pub struct GaussianNoise<T: Rng> {
    rng: RefCell<T>,
    sigma: f64,
}

impl<T: Rng> GaussianNoise<T> {
    pub fn new(sigma: f64, rng: T) -> GaussianNoise<T> {
        GaussianNoise {
            rng: RefCell::new(rng),
            sigma: sigma.abs(),
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn set_sigma(&mut self, sigma: f64) {
        self.sigma = sigma.abs();
    }
}

impl<T: Rng> Signal for GaussianNoise<T> {
    type Valued = Complex64;

    fn generate(&self, _: f64) -> Self::Valued {
        let rng = &mut *self.rng.borrow_mut();
        let re: f64 = rng.sample(StandardNormal);
        let im: f64 = rng.sample(StandardNormal);
        Complex64::new(self.sigma * re, self.sigma * im)
    }
}

#[cfg(test)]
mod test {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use super::{GaussianNoise, SampledDomain, Signal, Sinusoid, Tone};

    #[test]
    fn domain_has_arange_length() {
        // [0, 1) at 10 Hz is 10 samples, the end point is excluded.
        let domain = SampledDomain::new(0., 1., 10.);
        assert_eq!(domain.sample_count(), 10);
        assert_relative_eq!(domain.end(), 1.);

        // A partial interval still gets its leading sample.
        assert_eq!(SampledDomain::new(0., 1.05, 10.).sample_count(), 11);
    }

    #[test]
    fn nearest_index_respects_half_interval() {
        let domain = SampledDomain::new(2., 1., 10.);
        assert_eq!(domain.nearest_index(2.3), Some(3));
        assert_eq!(domain.nearest_index(2.33), Some(3));
        assert_eq!(domain.nearest_index(3.5), None);
        assert_eq!(domain.nearest_index(1.9), None);
    }

    #[test]
    fn fft_frequencies_match_fftfreq() {
        let freqs = SampledDomain::from_sample_interval(0., 0.25, 4).fft_frequencies();
        assert_eq!(freqs.to_vec(), vec![0., 1., -2., -1.]);
    }

    #[test]
    fn sine_is_a_shifted_cosine() {
        let s = Sinusoid::new(2., 3., 0.4);
        let sine = Tone::sine(s);
        for t in [0., 0.1, 0.27, 1.3] {
            let expected = 2. * (2. * PI * 3. * t + 0.4).sin();
            assert_relative_eq!(sine.generate(t).re, expected, epsilon = 1e-12);
            assert_eq!(sine.generate(t).im, 0.);
        }
    }

    #[test]
    fn complex_tone_has_unit_circle_phase() {
        let tone = Tone::complex(Sinusoid::new(1., 5., 0.));
        let z = tone.generate(0.05);
        assert_relative_eq!(z.norm(), 1., epsilon = 1e-12);
        assert_relative_eq!(z.arg(), PI / 2., epsilon = 1e-12);
    }

    #[test]
    fn average_power_of_cosine_is_half_square_amplitude() {
        assert_relative_eq!(Sinusoid::new(3., 1., 0.).average_power(), 4.5);
        assert_relative_eq!(Tone::complex(Sinusoid::new(3., 1., 0.)).average_power(), 9.);
    }

    #[test]
    fn noise_has_requested_spread() {
        let noise = GaussianNoise::new(0.5, StdRng::seed_from_u64(7));
        let domain = SampledDomain::new(0., 4000., 1.);
        let samples = noise.generate_signal(&domain);
        let power = samples.iter().map(|x| x.norm_sqr()).sum::<f64>() / samples.len() as f64;
        // Complex noise carries sigma^2 in each quadrature.
        assert_relative_eq!(power, 2. * 0.25, max_relative = 0.1);
    }
}
