//! Analytic model of a stepped-frequency pulse train.
//!
//! Pulse `i` is transmitted at `freq_start + i * freq_step_size` starting at `i * PRI`. The echo is
//! the same pulse delayed by the two-way travel time to the target, and the reference is the local
//! oscillator, available for the whole repetition interval.
//!
//! Bursts repeat the same frequency schedule back to back. The target keeps moving between them.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    radar::two_way_delay,
    signal::{algebra::combine, algebra::Operation, realization::SampledWaveform, Sinusoid},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SteppedFrequencyModel {
    pub n_bursts: usize,
    pub n_pulses: usize,
    // m
    pub target_range: f64,
    // m/s, positive when receding
    pub target_velocity: f64,
    // Hz
    pub freq_step_size: f64,
    // Hz
    pub freq_start: f64,
    // s
    pub pulse_width: f64,
    // s
    pub pulse_repetition_interval: f64,
    pub amplitude: f64,
    pub relative_phase: f64,
    // Shared by every pulse so that the waveforms of one step can be combined.
    pub sample_rate: f64,
}

impl SteppedFrequencyModel {
    fn check_index(&self, i: usize) -> Result<()> {
        if i >= self.n_pulses {
            return Err(Error::PulseOutOfRange {
                index: i,
                n_pulses: self.n_pulses,
            });
        }
        Ok(())
    }

    pub fn frequency(&self, i: usize) -> f64 {
        self.freq_start + i as f64 * self.freq_step_size
    }

    // Target range while pulse `i` is in flight.
    pub fn range_at(&self, i: usize) -> f64 {
        self.target_range + self.target_velocity * i as f64 * self.pulse_repetition_interval
    }

    /// The single-burst train for burst `b`. Its schedule restarts at zero while the target has
    /// moved on by `b` whole bursts.
    pub fn burst(&self, b: usize) -> Result<SteppedFrequencyModel> {
        if b >= self.n_bursts {
            return Err(Error::BurstOutOfRange {
                index: b,
                n_bursts: self.n_bursts,
            });
        }
        let burst_duration = self.n_pulses as f64 * self.pulse_repetition_interval;
        Ok(SteppedFrequencyModel {
            n_bursts: 1,
            target_range: self.target_range + self.target_velocity * b as f64 * burst_duration,
            ..self.clone()
        })
    }

    fn tone(&self, i: usize) -> Sinusoid {
        Sinusoid::new(self.amplitude, self.frequency(i), self.relative_phase)
    }

    /// x_i(t): the transmitted pulse, `[i * PRI, i * PRI + pulse_width)`.
    pub fn transmitted_waveform(&self, i: usize) -> Result<SampledWaveform<f64>> {
        self.check_index(i)?;
        SampledWaveform::cosine(
            self.tone(i),
            self.pulse_width,
            i as f64 * self.pulse_repetition_interval,
            Some(self.sample_rate),
        )
    }

    /// y_i(t): the echo, shifted by the round trip to the target.
    pub fn received_waveform(&self, i: usize) -> Result<SampledWaveform<f64>> {
        self.check_index(i)?;
        SampledWaveform::cosine(
            self.tone(i),
            self.pulse_width,
            self.sample_time(i),
            Some(self.sample_rate),
        )
    }

    /// z_i(t): the reference oscillator over the whole repetition interval.
    pub fn reference_waveform(&self, i: usize) -> Result<SampledWaveform<f64>> {
        self.check_index(i)?;
        SampledWaveform::cosine(
            self.tone(i),
            self.pulse_repetition_interval,
            i as f64 * self.pulse_repetition_interval,
            Some(self.sample_rate),
        )
    }

    /// The echo mixed with the reference oscillator.
    pub fn mixed_waveform(&self, i: usize) -> Result<SampledWaveform<f64>> {
        let received = self.received_waveform(i)?;
        let reference = self.reference_waveform(i)?;
        combine(&received, &reference, Operation::Multiply)
    }

    // Instant the leading edge of echo `i` reaches the receiver.
    pub fn sample_time(&self, i: usize) -> f64 {
        i as f64 * self.pulse_repetition_interval + two_way_delay(self.range_at(i))
    }

    /// Samples the mixer output of every pulse at the arrival of its echo.
    pub fn operate(&self) -> Result<Vec<f64>> {
        (0..self.n_pulses)
            .map(|i| {
                let mixed = self.mixed_waveform(i)?;
                let t = self.sample_time(i);
                mixed
                    .value_at(t)
                    .ok_or(Error::AlignmentError { time: t })
            })
            .collect()
    }

    /// [operate](Self::operate) for each burst in turn.
    pub fn operate_bursts(&self) -> Result<Vec<Vec<f64>>> {
        (0..self.n_bursts)
            .map(|b| self.burst(b)?.operate())
            .collect()
    }
}
