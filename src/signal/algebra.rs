use approx::relative_eq;
use ndarray::{s, Array1, Zip};

use crate::error::{Error, Result};

use super::{realization::SampledWaveform, scalar::Scalar, SampledDomain};

/// Pointwise operator applied where two waveforms share samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Add,
    Multiply,
}

impl Operation {
    // Value left in samples that neither operand covers.
    pub fn identity<T: Scalar>(&self) -> T {
        match self {
            Operation::Add => T::zero(),
            Operation::Multiply => T::one(),
        }
    }

    pub fn apply<T: Scalar>(&self, x: T, y: T) -> T {
        match self {
            Operation::Add => x + y,
            Operation::Multiply => x * y,
        }
    }
}

/**
Combines two waveforms sampled at the same rate into one spanning the union of their windows.

Every sample of the result starts at the operator's identity. Each operand is then folded in over
the stretch of the combined axis it covers, so samples only one operand covers are copied through,
samples both cover are combined, and gaps between disjoint operands keep the identity. Overlap,
nesting and disjoint windows all fall out of the same computation.

Operands are placed at the combined-axis sample nearest their first time value. An operand that
starts off the grid may then reach one sample past the union window, in which case the combined
axis is extended to hold it. Operands whose own time axis strays from their sample rate are
rejected with [Error::AlignmentError].
*/
pub fn combine<T: Scalar>(
    a: &SampledWaveform<T>,
    b: &SampledWaveform<T>,
    op: Operation,
) -> Result<SampledWaveform<T>> {
    if !relative_eq!(a.sample_rate, b.sample_rate) {
        return Err(Error::RateMismatch(a.sample_rate, b.sample_rate));
    }
    let rate = a.sample_rate;
    let start = a.time_start.min(b.time_start);
    let end = a.time_end().max(b.time_end());
    let union = SampledDomain::new(start, end - start, rate);

    let placements = [placement(a, start, rate)?, placement(b, start, rate)?];
    let len = placements
        .iter()
        .flatten()
        .map(|(offset, operand)| offset + operand.len())
        .fold(union.sample_count(), usize::max);
    let duration = if len > union.sample_count() {
        len as f64 / rate
    } else {
        end - start
    };

    let mut amplitude = Array1::from_elem(len, op.identity::<T>());
    for (offset, operand) in placements.into_iter().flatten() {
        Zip::from(amplitude.slice_mut(s![offset..offset + operand.len()]))
            .and(&operand.amplitude)
            .for_each(|acc, &x| *acc = op.apply(*acc, x));
    }

    let time = SampledDomain::from_sample_interval(start, union.sample_interval(), len);
    Ok(SampledWaveform::from_parts(
        duration,
        start,
        rate,
        time.into(),
        amplitude,
    ))
}

// Offset of `operand` on the grid starting at `start`. None for an empty operand.
fn placement<T: Scalar>(
    operand: &SampledWaveform<T>,
    start: f64,
    rate: f64,
) -> Result<Option<(usize, &SampledWaveform<T>)>> {
    let (first, last) = match (operand.time.first(), operand.time.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok(None),
    };
    let k = ((first - start) * rate).round();
    if !k.is_finite() || k < 0. {
        return Err(Error::AlignmentError { time: first });
    }
    let expected_last = first + (operand.len() - 1) as f64 / rate;
    if (last - expected_last).abs() > 0.5 / rate {
        return Err(Error::AlignmentError { time: last });
    }
    Ok(Some((k as usize, operand)))
}

impl<T: Scalar> SampledWaveform<T> {
    pub fn try_add(&self, other: &SampledWaveform<T>) -> Result<SampledWaveform<T>> {
        combine(self, other, Operation::Add)
    }

    pub fn try_mul(&self, other: &SampledWaveform<T>) -> Result<SampledWaveform<T>> {
        combine(self, other, Operation::Multiply)
    }
}
