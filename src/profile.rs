//! Range profile reconstruction.
//!
//! Each sweep step contributes one complex bin `V[round(f / step)]` to a zero-filled frequency
//! vector of power-of-two length `M`. The magnitude of its inverse transform is the range profile:
//! bin `k` corresponds to `k * c / (2 * M * step)` metres.

use ndarray::Array1;
use num::complex::Complex64;

use crate::{
    error::{Error, Result},
    helper::decibels_or_else,
    radar::bin_to_range,
    signal::fft::FFT,
};

/// Frequency-domain samples of the channel, indexed by step number.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyVector {
    bins: Array1<Complex64>,
}

impl FrequencyVector {
    pub fn zeros(len: usize) -> FrequencyVector {
        FrequencyVector {
            bins: Array1::from_elem(len, Complex64::new(0., 0.)),
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn set(&mut self, index: usize, value: Complex64) -> Result<()> {
        let len = self.bins.len();
        let bin = self.bins.get_mut(index).ok_or_else(|| {
            Error::InvalidSweep(format!(
                "frequency index {} outside a vector of {} bins",
                index, len
            ))
        })?;
        *bin = value;
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<Complex64> {
        self.bins.get(index).copied()
    }

    pub fn bins(&self) -> &Array1<Complex64> {
        &self.bins
    }

    /// The spectrum with its negative frequencies filled in as a mirror image,
    /// `[V[0], .., V[M-1], V[M-1], .., V[1]]`, for `2M - 1` bins.
    pub fn mirrored(&self) -> Array1<Complex64> {
        self.bins
            .iter()
            .chain(self.bins.iter().skip(1).rev())
            .copied()
            .collect()
    }
}

impl From<Array1<Complex64>> for FrequencyVector {
    fn from(bins: Array1<Complex64>) -> Self {
        FrequencyVector { bins }
    }
}

/// Magnitude of the channel impulse response against range.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeProfile {
    range: Array1<f64>,
    magnitude: Array1<f64>,
}

impl RangeProfile {
    /// Inverse transform of the positive-frequency vector.
    pub fn reconstruct(spectrum: &FrequencyVector, step_frequency: f64) -> RangeProfile {
        let len = spectrum.len();
        let magnitude = if len == 0 {
            Array1::from(Vec::new())
        } else {
            spectrum.bins.clone().ifft().mapv(|z| z.norm())
        };
        let range = (0..len)
            .map(|k| bin_to_range(k, len, step_frequency))
            .collect();
        RangeProfile { range, magnitude }
    }

    pub fn len(&self) -> usize {
        self.magnitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitude.is_empty()
    }

    pub fn range(&self) -> &Array1<f64> {
        &self.range
    }

    pub fn magnitude(&self) -> &Array1<f64> {
        &self.magnitude
    }

    /// First bin of greatest magnitude.
    pub fn peak_index(&self) -> usize {
        self.magnitude
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (k, &y)| match best {
                Some((_, top)) if top >= y => best,
                _ => Some((k, y)),
            })
            .map_or(0, |(k, _)| k)
    }

    /// Range of the strongest reflector. Zero for an empty profile.
    pub fn predicted_range(&self) -> f64 {
        self.range.get(self.peak_index()).copied().unwrap_or(0.)
    }

    /// Scaled so the peak has unit magnitude.
    pub fn normalized(&self) -> RangeProfile {
        let peak = self.magnitude.fold(0f64, |a, &b| a.max(b));
        let magnitude = if peak > 0. {
            &self.magnitude / peak
        } else {
            self.magnitude.clone()
        };
        RangeProfile {
            range: self.range.clone(),
            magnitude,
        }
    }

    /// Power relative to the peak in dB. Empty bins read as `floor`.
    pub fn decibels(&self, floor: f64) -> Array1<f64> {
        self.normalized()
            .magnitude
            .mapv(|y| decibels_or_else(y * y, floor))
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use ndarray::Array1;
    use num::complex::Complex64;

    use super::{FrequencyVector, RangeProfile};
    use crate::{error::Error, radar::SPEED_OF_LIGHT};

    #[test]
    fn set_rejects_index_past_end() {
        let mut v = FrequencyVector::zeros(8);
        v.set(7, Complex64::new(1., 0.)).unwrap();
        assert!(matches!(
            v.set(8, Complex64::new(1., 0.)),
            Err(Error::InvalidSweep(_))
        ));
    }

    #[test]
    fn mirrored_spectrum_reflects_about_dc() {
        let v = FrequencyVector::from(
            (0..4)
                .map(|k| Complex64::new(k as f64, 0.))
                .collect::<Array1<_>>(),
        );
        let mirrored = v.mirrored();
        assert_eq!(mirrored.len(), 7);
        assert_eq!(
            mirrored.mapv(|z| z.re).to_vec(),
            vec![0., 1., 2., 3., 3., 2., 1.]
        );
    }

    #[test]
    fn single_delay_peaks_at_its_bin() {
        let (m, step) = (64, 5e6);
        // Delay that lands exactly on bin 9.
        let tau = 9. / (m as f64 * step);
        let mut v = FrequencyVector::zeros(m);
        for n in 10..40 {
            let f = n as f64 * step;
            v.set(
                n,
                Complex64::from_polar(1., -2. * std::f64::consts::PI * f * tau),
            )
            .unwrap();
        }
        let profile = RangeProfile::reconstruct(&v, step);
        assert_eq!(profile.len(), m);
        assert_eq!(profile.peak_index(), 9);
        assert_relative_eq!(
            profile.predicted_range(),
            9. * SPEED_OF_LIGHT / (2. * m as f64 * step)
        );
        // 30 unit bins normalised by 1/M.
        assert_relative_eq!(profile.magnitude()[9], 30. / m as f64, epsilon = 1e-12);
    }

    #[test]
    fn empty_spectrum_predicts_zero_range() {
        let profile = RangeProfile::reconstruct(&FrequencyVector::zeros(16), 1e6);
        assert_eq!(profile.peak_index(), 0);
        assert_eq!(profile.predicted_range(), 0.);
        assert!(profile.decibels(-100.).iter().all(|x| *x == -100.));
    }

    #[test]
    fn normalized_peak_is_zero_db() {
        let mut v = FrequencyVector::zeros(8);
        v.set(1, Complex64::new(2., 0.)).unwrap();
        v.set(2, Complex64::new(1., 0.)).unwrap();
        let profile = RangeProfile::reconstruct(&v, 1e6);
        let db = profile.decibels(-100.);
        assert_relative_eq!(db[profile.peak_index()], 0., epsilon = 1e-12);
        assert!(db.iter().all(|x| *x <= 1e-12));
    }
}
