use std::{
    fmt::{Debug, Display},
    ops::{Add, AddAssign, Mul, MulAssign},
};

use num::{complex::Complex64, Float};

/// Amplitude type of a sampled waveform. Implemented for real (`f64`) and complex (`Complex64`) samples.
pub trait Scalar:
    Copy
    + Mul<Self, Output = Self>
    + Add<Self, Output = Self>
    + AddAssign
    + MulAssign
    + PartialEq
    + Debug
    + Display
{
    type CompType: Float + Scalar + Into<f64>;
    fn norm_sqr(&self) -> Self::CompType;
    fn norm(&self) -> Self::CompType;
    fn conj(&self) -> Self;
    fn zero() -> Self;
    fn one() -> Self;
    // Converts a phasor into this sample type. Real samples keep the in-phase component.
    fn from_phasor(z: Complex64) -> Self;
}

impl Scalar for f64 {
    type CompType = f64;

    fn norm_sqr(&self) -> Self::CompType {
        self.abs().powi(2)
    }

    fn norm(&self) -> Self::CompType {
        self.abs()
    }

    fn conj(&self) -> Self {
        *self
    }

    fn zero() -> Self {
        0.
    }

    fn one() -> Self {
        1.
    }

    fn from_phasor(z: Complex64) -> Self {
        z.re
    }
}

impl Scalar for Complex64 {
    type CompType = f64;

    fn norm_sqr(&self) -> Self::CompType {
        Complex64::norm_sqr(self)
    }

    fn norm(&self) -> Self::CompType {
        Complex64::norm(*self)
    }

    fn conj(&self) -> Self {
        Complex64::conj(self)
    }

    fn zero() -> Self {
        0.0.into()
    }

    fn one() -> Self {
        1.0.into()
    }

    fn from_phasor(z: Complex64) -> Self {
        z
    }
}
