//! Seams to the SDR hardware (or its simulation): a control surface that takes parameter
//! commands and a data channel that delivers interleaved sample buffers.

use std::time::Duration;

use ndarray::Array1;
use num::complex::{Complex32, Complex64};

use crate::error::{Error, LinkError, Result};

/// Remote parameters of the transceiver flow graph.
pub trait ControlSurface {
    fn set_baseband_frequency(&mut self, frequency: f64) -> std::result::Result<(), LinkError>;
    fn set_sample_rate(&mut self, sample_rate: f64) -> std::result::Result<(), LinkError>;
    fn set_target_range(&mut self, range: f64) -> std::result::Result<(), LinkError>;
    fn set_n_points(&mut self, n_points: usize) -> std::result::Result<(), LinkError>;
    fn set_gain(&mut self, gain: f64) -> std::result::Result<(), LinkError>;
    fn set_noise_amplitude(&mut self, amplitude: f64) -> std::result::Result<(), LinkError>;
}

/// Source of reference/measurement buffers.
pub trait DataChannel {
    /// Waits up to `timeout` for a buffer, returning whether one is ready.
    fn poll(&mut self, timeout: Duration) -> std::result::Result<bool, LinkError>;

    /// Takes the next buffer: `2 * n_points` samples alternating reference and measurement.
    fn recv(&mut self) -> std::result::Result<Vec<Complex32>, LinkError>;
}

/// Splits an interleaved buffer into its reference and measurement channels.
pub fn deinterleave(
    buffer: &[Complex32],
    n_points: usize,
) -> Result<(Array1<Complex64>, Array1<Complex64>)> {
    if buffer.len() != 2 * n_points {
        return Err(Error::MalformedBuffer {
            expected: 2 * n_points,
            received: buffer.len(),
        });
    }
    let widen = |z: &Complex32| Complex64::new(z.re as f64, z.im as f64);
    let reference = buffer.iter().step_by(2).map(widen).collect();
    let measurement = buffer.iter().skip(1).step_by(2).map(widen).collect();
    Ok((reference, measurement))
}

/// Inverse of [deinterleave], narrowing to the wire precision.
pub fn interleave(reference: &Array1<Complex64>, measurement: &Array1<Complex64>) -> Vec<Complex32> {
    let narrow = |z: &Complex64| Complex32::new(z.re as f32, z.im as f32);
    reference
        .iter()
        .zip(measurement.iter())
        .flat_map(|(r, m)| [narrow(r), narrow(m)])
        .collect()
}
