//! Drives a sweep over the hardware seams.
//!
//! For every target range the controller steps the baseband frequency across the band, reduces
//! each acquired buffer to one complex bin with the configured phase compensation, and hands the
//! filled frequency vector to [RangeProfile] for a range estimate.

use std::{thread, time::Duration};

use num::complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};

use crate::{
    error::{LinkError, Result},
    profile::{FrequencyVector, RangeProfile},
    signal::fft::dominant_frequency,
};

use super::{
    compensation::{Compensation, PhaseCompensation},
    hardware::{deinterleave, ControlSurface, DataChannel},
    retry::{CancellationToken, PollPolicy, RetryPolicy},
    SweepConfig, SweepReport, SweepResult,
};

/// Timing and reduction settings of the acquisition loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub n_points_per_channel: usize,
    // Pause after every accepted command while the oscillator settles.
    pub lo_settle_time: Duration,
    // Pause before reading so the flow graph flushes samples from the previous setting.
    pub data_settle_time: Duration,
    pub retry: RetryPolicy,
    pub poll: PollPolicy,
    pub compensation: Compensation,
    // Sent once before the sweep when set.
    pub gain: Option<f64>,
    pub noise_amplitude: Option<f64>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        AcquisitionConfig {
            n_points_per_channel: 1024,
            lo_settle_time: Duration::from_millis(10),
            data_settle_time: Duration::from_secs(1),
            retry: Default::default(),
            poll: Default::default(),
            compensation: Default::default(),
            gain: None,
            noise_amplitude: None,
        }
    }
}

impl AcquisitionConfig {
    /// No settling pauses and no backoff. For simulated hardware.
    pub fn immediate() -> AcquisitionConfig {
        AcquisitionConfig {
            lo_settle_time: Duration::ZERO,
            data_settle_time: Duration::ZERO,
            retry: RetryPolicy::unbounded(Duration::ZERO),
            poll: PollPolicy {
                interval: Duration::ZERO,
                deadline: None,
            },
            ..Default::default()
        }
    }
}

pub struct SweepController<C: ControlSurface, D: DataChannel> {
    config: SweepConfig,
    acquisition: AcquisitionConfig,
    compensation: Box<dyn PhaseCompensation + Send>,
    control: C,
    data: D,
    cancel: CancellationToken,
}

impl<C: ControlSurface, D: DataChannel> SweepController<C, D> {
    pub fn new(
        config: SweepConfig,
        acquisition: AcquisitionConfig,
        control: C,
        data: D,
    ) -> Result<SweepController<C, D>> {
        let compensation = acquisition.compensation.build()?;
        Ok(SweepController {
            config,
            acquisition,
            compensation,
            control,
            data,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the configured compensation with a custom strategy.
    pub fn with_compensation(mut self, compensation: impl PhaseCompensation + Send + 'static) -> Self {
        self.compensation = Box::new(compensation);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Hands back the hardware endpoints.
    pub fn finish(self) -> (C, D) {
        (self.control, self.data)
    }

    // Sends one command under the retry policy, then waits for it to settle.
    fn command(
        &mut self,
        name: &'static str,
        mut send: impl FnMut(&mut C) -> std::result::Result<(), LinkError>,
    ) -> Result<()> {
        let control = &mut self.control;
        self.acquisition
            .retry
            .run(name, &self.cancel, || send(control))?;
        thread::sleep(self.acquisition.lo_settle_time);
        Ok(())
    }

    fn prepare(&mut self) -> Result<()> {
        let n_points = self.acquisition.n_points_per_channel;
        let sample_rate = self.config.sample_rate();
        self.command("n_points", |c| c.set_n_points(n_points))?;
        self.command("sample_rate", |c| c.set_sample_rate(sample_rate))?;
        if let Some(gain) = self.acquisition.gain {
            self.command("gain", |c| c.set_gain(gain))?;
        }
        if let Some(amplitude) = self.acquisition.noise_amplitude {
            self.command("noise_amplitude", |c| c.set_noise_amplitude(amplitude))?;
        }
        Ok(())
    }

    // Tunes to one step frequency and reduces the resulting buffer to a complex bin.
    fn acquire(&mut self, frequency: f64) -> Result<Complex64> {
        self.command("baseband_frequency", |c| c.set_baseband_frequency(frequency))?;
        thread::sleep(self.acquisition.data_settle_time);

        self.acquisition.poll.wait_ready(&mut self.data, &self.cancel)?;
        let buffer = self
            .acquisition
            .retry
            .run("recv", &self.cancel, || self.data.recv())?;
        let (reference, measurement) =
            deinterleave(&buffer, self.acquisition.n_points_per_channel)?;

        if tracing::enabled!(Level::DEBUG) {
            debug!(
                frequency,
                received = dominant_frequency(&reference, self.config.sample_rate()),
                "acquired step"
            );
        }
        Ok(self.compensation.compensate(&reference, &measurement))
    }

    /// Runs every step of the band against one target range.
    pub fn measure(&mut self, target_range: f64) -> Result<RangeProfile> {
        self.command("target_range", |c| c.set_target_range(target_range))?;

        let mut spectrum = FrequencyVector::zeros(self.config.transform_length());
        let steps: Vec<(usize, f64)> = self.config.frequencies().collect();
        for (index, frequency) in steps {
            let v = self.acquire(frequency)?;
            spectrum.set(index, v)?;
        }
        Ok(RangeProfile::reconstruct(
            &spectrum,
            self.config.step_frequency(),
        ))
    }

    /// Measures every target range of the sweep in order.
    pub fn run(&mut self) -> Result<Vec<SweepResult>> {
        info!(
            name = self.config.name(),
            start = self.config.start_frequency(),
            end = self.config.end_frequency(),
            step = self.config.step_frequency(),
            steps = self.config.step_count(),
            max_unambiguous_range = self.config.max_unambiguous_range(),
            range_resolution = self.config.range_resolution(),
            "starting sweep"
        );
        self.prepare()?;

        let ranges: Vec<f64> = self.config.target_ranges().collect();
        let mut results = Vec::with_capacity(ranges.len());
        for expected_range in ranges {
            info!(range = expected_range, "measuring target");
            let profile = self.measure(expected_range)?;
            let result = SweepResult {
                expected_range,
                predicted_range: profile.predicted_range(),
            };
            info!(
                expected = result.expected_range,
                predicted = result.predicted_range,
                "range estimated"
            );
            results.push(result);
        }
        Ok(results)
    }

    pub fn run_report(&mut self) -> Result<SweepReport> {
        let results = self.run()?;
        Ok(SweepReport {
            config: self.config.clone(),
            results,
        })
    }
}
