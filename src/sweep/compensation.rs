//! Phase compensation: reduces one step's reference and measurement channels to the complex ratio
//! `V = measurement / reference` stored in the frequency vector.

use ndarray::{s, Array1};
use num::complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub trait PhaseCompensation {
    /// Both channels must have the same nonzero length.
    fn compensate(&self, reference: &Array1<Complex64>, measurement: &Array1<Complex64>)
        -> Complex64;
}

/// Ratio of the samples at the midpoint of the buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Midpoint;

impl PhaseCompensation for Midpoint {
    fn compensate(
        &self,
        reference: &Array1<Complex64>,
        measurement: &Array1<Complex64>,
    ) -> Complex64 {
        let n = reference.len().min(measurement.len());
        if n == 0 {
            return Complex64::new(0., 0.);
        }
        let mid = n / 2;
        measurement[mid] / reference[mid]
    }
}

/// Ratio of the channel means over `[factor_a * n, factor_b * n)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Takahashi {
    factor_a: f64,
    factor_b: f64,
}

impl Default for Takahashi {
    fn default() -> Self {
        Takahashi {
            factor_a: 0.25,
            factor_b: 0.75,
        }
    }
}

impl Takahashi {
    pub fn new(factor_a: f64, factor_b: f64) -> Result<Takahashi> {
        if !(0. ..1.).contains(&factor_a) || !(factor_a < factor_b && factor_b <= 1.) {
            return Err(Error::InvalidSweep(format!(
                "averaging window [{}, {}) is not a subrange of [0, 1)",
                factor_a, factor_b
            )));
        }
        Ok(Takahashi { factor_a, factor_b })
    }

    // Sample range averaged for a buffer of length n; never empty for n > 0.
    fn window(&self, n: usize) -> (usize, usize) {
        let a = ((self.factor_a * n as f64) as usize).min(n.saturating_sub(1));
        let b = ((self.factor_b * n as f64) as usize).clamp(a + 1, n.max(a + 1));
        (a, b)
    }
}

impl PhaseCompensation for Takahashi {
    fn compensate(
        &self,
        reference: &Array1<Complex64>,
        measurement: &Array1<Complex64>,
    ) -> Complex64 {
        let n = reference.len().min(measurement.len());
        if n == 0 {
            return Complex64::new(0., 0.);
        }
        let (a, b) = self.window(n);
        // Equal-length windows, so the ratio of sums is the ratio of means.
        let measured = measurement.slice(s![a..b]).sum();
        let referenced = reference.slice(s![a..b]).sum();
        measured / referenced
    }
}

/// Serializable choice of compensation strategy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Compensation {
    Midpoint,
    Takahashi { factor_a: f64, factor_b: f64 },
}

impl Default for Compensation {
    fn default() -> Self {
        Compensation::Midpoint
    }
}

impl Compensation {
    pub fn takahashi() -> Compensation {
        let Takahashi { factor_a, factor_b } = Takahashi::default();
        Compensation::Takahashi { factor_a, factor_b }
    }

    /// The strategy this choice names, checking its parameters.
    pub fn build(&self) -> Result<Box<dyn PhaseCompensation + Send>> {
        Ok(match *self {
            Compensation::Midpoint => Box::new(Midpoint),
            Compensation::Takahashi { factor_a, factor_b } => {
                Box::new(Takahashi::new(factor_a, factor_b)?)
            }
        })
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use ndarray::Array1;
    use num::complex::Complex64;

    use super::{Compensation, Midpoint, PhaseCompensation, Takahashi};
    use crate::error::Error;

    fn channels(n: usize, phase: f64) -> (Array1<Complex64>, Array1<Complex64>) {
        let reference: Array1<Complex64> = (0..n)
            .map(|k| Complex64::from_polar(1., 0.3 * k as f64))
            .collect();
        let rotation = Complex64::from_polar(0.5, -phase);
        let measurement = reference.mapv(|z| z * rotation);
        (reference, measurement)
    }

    #[test]
    fn midpoint_recovers_channel_rotation() {
        let (reference, measurement) = channels(64, 1.1);
        let v = Midpoint.compensate(&reference, &measurement);
        assert_relative_eq!(v.norm(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(v.arg(), -1.1, epsilon = 1e-12);
    }

    #[test]
    fn midpoint_reads_centre_sample() {
        let reference = Array1::from(vec![Complex64::new(1., 0.); 4]);
        let measurement: Array1<Complex64> =
            (0..4).map(|k| Complex64::new(k as f64, 0.)).collect();
        assert_relative_eq!(Midpoint.compensate(&reference, &measurement).re, 2.);
    }

    #[test]
    fn takahashi_averages_middle_half() {
        let reference = Array1::from(vec![Complex64::new(1., 0.); 8]);
        let measurement: Array1<Complex64> =
            (0..8).map(|k| Complex64::new(k as f64, 0.)).collect();
        // mean of 2, 3, 4, 5
        let v = Takahashi::default().compensate(&reference, &measurement);
        assert_relative_eq!(v.re, 3.5);

        let (reference, measurement) = channels(1024, -0.4);
        let v = Takahashi::default().compensate(&reference, &measurement);
        assert_relative_eq!(v.arg(), 0.4, epsilon = 1e-9);
    }

    #[test]
    fn takahashi_window_never_empty() {
        let t = Takahashi::new(0.5, 0.6).unwrap();
        assert_eq!(t.window(1), (0, 1));
        assert_eq!(t.window(4), (2, 3));
    }

    #[test]
    fn takahashi_rejects_inverted_window() {
        assert!(matches!(
            Takahashi::new(0.75, 0.25),
            Err(Error::InvalidSweep(_))
        ));
        assert!(Compensation::Takahashi {
            factor_a: -0.1,
            factor_b: 0.5
        }
        .build()
        .is_err());
    }

    #[test]
    fn compensation_deserializes_by_method() {
        let c: Compensation =
            serde_json::from_str(r#"{"method": "takahashi", "factor_a": 0.25, "factor_b": 0.75}"#)
                .unwrap();
        assert_eq!(c, Compensation::takahashi());
        let c: Compensation = serde_json::from_str(r#"{"method": "midpoint"}"#).unwrap();
        assert_eq!(c, Compensation::Midpoint);
    }
}
