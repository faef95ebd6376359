use ndarray::Array1;
use num::complex::Complex64;

use crate::error::{Error, Result};

use super::{scalar::Scalar, SampledDomain, Signal, Sinusoid, Tone};

/// A tone (or a combination of tones) sampled over the window `[time_start, time_start + duration)`.
#[derive(Clone, Debug)]
pub struct SampledWaveform<T: Scalar> {
    pub(crate) duration: f64,
    pub(crate) time_start: f64,
    pub(crate) sample_rate: f64,
    // The generating tone. None for waveforms produced by algebra.
    pub(crate) tone: Option<Tone>,
    // Evenly spaced at 1 / sample_rate starting at time_start.
    pub(crate) time: Array1<f64>,
    // Must be same length as time
    pub(crate) amplitude: Array1<T>,
}

fn check_nyquist(tone: &Tone, sample_rate: f64) -> Result<()> {
    let frequency = tone.sinusoid.frequency;
    if tone.variant.is_real() && sample_rate <= 2. * frequency.abs() {
        return Err(Error::RateViolation {
            frequency,
            sample_rate,
        });
    }
    Ok(())
}

impl<T: Scalar> SampledWaveform<T> {
    /// Samples `tone` over `[time_start, time_start + duration)`.
    ///
    /// Without an explicit rate the tone is sampled at `2|f| + 1`. Real tones sampled at or below
    /// twice their frequency are rejected with [Error::RateViolation], and negative or non-finite
    /// durations with [Error::InvalidDuration].
    pub fn new(
        tone: Tone,
        duration: f64,
        time_start: f64,
        sample_rate: Option<f64>,
    ) -> Result<SampledWaveform<T>> {
        if !duration.is_finite() || duration < 0. {
            return Err(Error::InvalidDuration(duration));
        }
        let sample_rate = match sample_rate {
            Some(rate) => {
                check_nyquist(&tone, rate)?;
                rate
            }
            None => tone.sinusoid.default_sample_rate(),
        };

        let mut out = SampledWaveform {
            duration,
            time_start,
            sample_rate,
            tone: Some(tone),
            time: Array1::from(Vec::new()),
            amplitude: Array1::from(Vec::new()),
        };
        out.regenerate();
        Ok(out)
    }

    pub fn cosine(
        sinusoid: Sinusoid,
        duration: f64,
        time_start: f64,
        sample_rate: Option<f64>,
    ) -> Result<SampledWaveform<T>> {
        Self::new(Tone::cosine(sinusoid), duration, time_start, sample_rate)
    }

    pub fn sine(
        sinusoid: Sinusoid,
        duration: f64,
        time_start: f64,
        sample_rate: Option<f64>,
    ) -> Result<SampledWaveform<T>> {
        Self::new(Tone::sine(sinusoid), duration, time_start, sample_rate)
    }

    // Assembles a waveform from precomputed axes. Used by the algebra, which has no tone to sample.
    pub(crate) fn from_parts(
        duration: f64,
        time_start: f64,
        sample_rate: f64,
        time: Array1<f64>,
        amplitude: Array1<T>,
    ) -> SampledWaveform<T> {
        debug_assert_eq!(time.len(), amplitude.len());
        SampledWaveform {
            duration,
            time_start,
            sample_rate,
            tone: None,
            time,
            amplitude,
        }
    }

    pub(crate) fn domain(&self) -> SampledDomain {
        SampledDomain::new(self.time_start, self.duration, self.sample_rate)
    }

    fn regenerate(&mut self) {
        if let Some(tone) = self.tone {
            let domain = self.domain();
            self.amplitude = tone.generate_signal(&domain).mapv(T::from_phasor);
            self.time = domain.into();
        }
    }

    /// Resamples the generating tone at a new rate, rebuilding both axes.
    pub fn update_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        let tone = self.tone.ok_or(Error::NotRegenerable)?;
        check_nyquist(&tone, sample_rate)?;
        self.sample_rate = sample_rate;
        self.regenerate();
        Ok(())
    }

    /// Changes the phase of the generating tone, rebuilding both axes.
    pub fn update_phase(&mut self, phase: f64) -> Result<()> {
        let tone = self.tone.as_mut().ok_or(Error::NotRegenerable)?;
        tone.sinusoid.phase = phase;
        self.regenerate();
        Ok(())
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn time_start(&self) -> f64 {
        self.time_start
    }

    pub fn time_end(&self) -> f64 {
        self.time_start + self.duration
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn tone(&self) -> Option<&Tone> {
        self.tone.as_ref()
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    pub fn amplitude(&self) -> &Array1<T> {
        &self.amplitude
    }

    // Value of the sample nearest to `t`, if `t` falls on this waveform's axis.
    pub fn value_at(&self, t: f64) -> Option<T> {
        self.domain()
            .nearest_index(t)
            .and_then(|k| self.amplitude.get(k).copied())
    }

    pub fn signal_energy(&self) -> f64 {
        let dt = 1. / self.sample_rate;
        self.amplitude
            .iter()
            .map(|x| -> f64 { x.norm_sqr().into() })
            .sum::<f64>()
            * dt
    }

    pub fn signal_power(&self) -> f64 {
        if self.is_empty() {
            return 0.;
        }
        self.signal_energy() / (self.len() as f64 / self.sample_rate)
    }
}

impl SampledWaveform<Complex64> {
    // A·e^{-j(ωt+θ)}. The tone, if any, is conjugated alongside the samples.
    pub fn conjugate(&self) -> SampledWaveform<Complex64> {
        let mut out = self.clone();
        out.amplitude.mapv_inplace(|x| x.conj());
        if let Some(tone) = out.tone.as_mut() {
            if !tone.variant.is_real() {
                tone.sinusoid.frequency = -tone.sinusoid.frequency;
                tone.sinusoid.phase = -tone.sinusoid.phase;
            }
        }
        out
    }
}

#[cfg(test)]
mod test {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;
    use num::complex::Complex64;
    use proptest::prelude::*;

    use super::SampledWaveform;
    use crate::{
        error::Error,
        signal::{Sinusoid, Tone},
    };

    #[test]
    fn default_rate_is_just_above_nyquist() {
        let w = SampledWaveform::<f64>::cosine(Sinusoid::new(1., 10., 0.), 1., 0., None).unwrap();
        assert_relative_eq!(w.sample_rate(), 21.);
        assert_eq!(w.len(), 21);
        assert_eq!(w.time()[0], 0.);
    }

    #[test]
    fn rejects_aliasing_rate() {
        let err = SampledWaveform::<f64>::cosine(Sinusoid::new(1., 10., 0.), 1., 0., Some(20.));
        assert!(matches!(err, Err(Error::RateViolation { .. })));

        // Negative frequencies alias just the same.
        let err = SampledWaveform::<f64>::sine(Sinusoid::new(1., -10., 0.), 1., 0., Some(15.));
        assert!(matches!(err, Err(Error::RateViolation { .. })));
    }

    #[test]
    fn complex_tone_skips_nyquist_check() {
        let w = SampledWaveform::<Complex64>::new(
            Tone::complex(Sinusoid::new(1., 10., 0.)),
            1.,
            0.,
            Some(15.),
        )
        .unwrap();
        assert_eq!(w.len(), 15);
    }

    #[test]
    fn time_axis_starts_at_time_start() {
        let w = SampledWaveform::<f64>::cosine(Sinusoid::new(1., 1., 0.), 0.5, 3., Some(10.))
            .unwrap();
        assert_eq!(w.len(), 5);
        assert_relative_eq!(w.time()[0], 3.);
        assert_relative_eq!(w.time()[4], 3.4, epsilon = 1e-12);
        assert_relative_eq!(w.time_end(), 3.5);
    }

    #[test]
    fn update_sample_rate_regenerates_both_axes() {
        let mut w =
            SampledWaveform::<f64>::cosine(Sinusoid::new(1., 2., 0.), 1., 0., Some(10.)).unwrap();
        w.update_sample_rate(40.).unwrap();
        assert_eq!(w.len(), 40);
        assert_eq!(w.amplitude().len(), 40);
        assert_relative_eq!(w.amplitude()[5], (2. * PI * 2. * 5. / 40.).cos(), epsilon = 1e-12);

        assert!(matches!(
            w.update_sample_rate(4.),
            Err(Error::RateViolation { .. })
        ));
        // A rejected update leaves the waveform untouched.
        assert_eq!(w.len(), 40);
    }

    #[test]
    fn update_phase_keeps_time_axis() {
        let mut w =
            SampledWaveform::<f64>::cosine(Sinusoid::new(1., 2., 0.), 1., 0., Some(10.)).unwrap();
        let time = w.time().clone();
        w.update_phase(PI / 2.).unwrap();
        assert_eq!(w.time(), &time);
        assert_relative_eq!(w.amplitude()[0], 0., epsilon = 1e-12);
        assert_relative_eq!(w.tone().unwrap().sinusoid.phase, PI / 2.);
    }

    #[test]
    fn conjugate_negates_tone() {
        let tone = Tone::complex(Sinusoid::new(1., 4., 0.5));
        let w = SampledWaveform::<Complex64>::new(tone, 1., 0., Some(32.)).unwrap();
        let mut conj = w.conjugate();
        assert_relative_eq!(conj.amplitude()[3], w.amplitude()[3].conj());
        // Regenerating from the conjugated tone reproduces the conjugated samples.
        conj.update_phase(-0.5).unwrap();
        assert_relative_eq!(conj.amplitude()[3], w.amplitude()[3].conj(), epsilon = 1e-12);
    }

    #[test]
    fn power_of_cosine_over_whole_periods() {
        let w = SampledWaveform::<f64>::cosine(Sinusoid::new(2., 5., 0.3), 2., 0., Some(100.))
            .unwrap();
        assert_relative_eq!(w.signal_power(), 2., epsilon = 1e-9);
    }

    #[test]
    fn rejects_unphysical_duration() {
        for duration in [-0.5, f64::NAN, f64::INFINITY] {
            let w = SampledWaveform::<f64>::cosine(Sinusoid::new(1., 1., 0.), duration, 0., Some(10.));
            assert!(matches!(w, Err(Error::InvalidDuration(_))));
        }
    }

    #[test]
    fn value_at_reads_nearest_sample() {
        let w = SampledWaveform::<f64>::cosine(Sinusoid::new(1., 1., 0.), 1., 0., Some(100.))
            .unwrap();
        assert_relative_eq!(w.value_at(0.25).unwrap(), 0., epsilon = 1e-12);
        assert!(w.value_at(1.5).is_none());
    }

    proptest! {
        #[test]
        fn valid_rate_constructs_matching_axes(
            amplitude in 0.1f64..10.,
            frequency in -50f64..50.,
            phase in -PI..PI,
            margin in 0.5f64..100.,
            duration in 0.01f64..2.,
        ) {
            let rate = 2. * frequency.abs() + margin;
            let w = SampledWaveform::<f64>::cosine(
                Sinusoid::new(amplitude, frequency, phase), duration, 0., Some(rate)
            ).unwrap();
            prop_assert_eq!(w.time().len(), w.amplitude().len());
        }

        #[test]
        fn rate_at_or_below_nyquist_fails(
            frequency in 1f64..1e6,
            fraction in 0.01f64..=1.,
        ) {
            let rate = 2. * frequency * fraction;
            let w = SampledWaveform::<f64>::cosine(Sinusoid::new(1., frequency, 0.), 1., 0., Some(rate));
            prop_assert!(matches!(w, Err(Error::RateViolation { .. })), "rate {} accepted", rate);
        }
    }
}
