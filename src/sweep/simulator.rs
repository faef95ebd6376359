//! In-process stand-in for the SDR bench.
//!
//! The reference channel is a complex baseband tone. The measurement channel is the same tone
//! delayed by the round trip to the simulated target, rounded down to whole samples, optionally
//! attenuated by the radar equation and corrupted by gaussian noise. Transient command failures
//! and slow data can be injected to exercise the controller's retry and poll paths.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ndarray::Array1;
use num::complex::{Complex32, Complex64};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    error::LinkError,
    radar::{delay_to_range, range_equation, two_way_delay},
    signal::{GaussianNoise, SampledDomain, Signal, Sinusoid, Tone},
};

use super::hardware::{interleave, ControlSurface, DataChannel};

type LinkResult<T> = std::result::Result<T, LinkError>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchSettings {
    // Hz
    pub baseband_frequency: f64,
    // Hz
    pub sample_rate: f64,
    // m
    pub target_range: f64,
    // m/s, positive when receding
    pub target_velocity: f64,
    pub n_points: usize,
    // Shared by the transmit and receive antennas.
    pub gain: f64,
    pub noise_amplitude: f64,
    // m^2
    pub radar_cross_section: f64,
    // Attenuate the echo with the radar equation instead of returning it at unit amplitude.
    pub path_loss: bool,
    pub seed: u64,
}

impl Default for BenchSettings {
    fn default() -> Self {
        BenchSettings {
            baseband_frequency: 100e6,
            sample_rate: 1e9,
            target_range: 1.,
            target_velocity: 0.,
            n_points: 1024,
            gain: 1.,
            noise_amplitude: 0.,
            radar_cross_section: 1.,
            path_loss: false,
            seed: 0,
        }
    }
}

impl BenchSettings {
    // Round-trip delay to a target at `range`, truncated to whole samples.
    pub fn echo_delay(&self, range: f64) -> f64 {
        (self.sample_rate * two_way_delay(range)).floor() / self.sample_rate
    }

    /// Range a perfect reconstruction would report for a target at `range`, after the echo
    /// delay is truncated to the sample grid.
    pub fn apparent_range(&self, range: f64) -> f64 {
        delay_to_range(self.echo_delay(range))
    }
}

struct BenchState {
    settings: BenchSettings,
    noise: GaussianNoise<StdRng>,
    // Stream time of the next sample.
    clock: f64,
    failures_left: u32,
    stalls_left: u32,
    history: Vec<&'static str>,
}

impl BenchState {
    fn capture(&mut self) -> Vec<Complex32> {
        let s = &self.settings;
        let domain =
            SampledDomain::from_sample_interval(self.clock, 1. / s.sample_rate, s.n_points);
        let tone = Tone::complex(Sinusoid::new(1., s.baseband_frequency, 0.));

        let range = s.target_range + s.target_velocity * self.clock;
        let delay = s.echo_delay(range);
        let attenuation = if s.path_loss {
            range_equation(
                1.,
                range,
                s.gain,
                s.gain,
                s.radar_cross_section,
                s.baseband_frequency,
            )
            .sqrt()
        } else {
            1.
        };

        let reference = tone.generate_signal(&domain);
        let measurement: Array1<Complex64> = domain
            .iter()
            .map(|t| attenuation * tone.generate(t - delay) + self.noise.generate(t))
            .collect();
        trace!(
            range,
            apparent_range = delay_to_range(delay),
            delay,
            attenuation,
            clock = self.clock,
            "captured buffer"
        );

        self.clock = domain.end();
        interleave(&reference, &measurement)
    }
}

fn lock(state: &Mutex<BenchState>) -> LinkResult<MutexGuard<'_, BenchState>> {
    state
        .lock()
        .map_err(|_| LinkError::Unavailable("bench state poisoned".into()))
}

/// Owns the simulated bench. [SimulatedBench::split] hands out the two endpoints.
pub struct SimulatedBench {
    state: Arc<Mutex<BenchState>>,
}

impl SimulatedBench {
    pub fn new(settings: BenchSettings) -> SimulatedBench {
        let noise = GaussianNoise::new(
            settings.noise_amplitude,
            StdRng::seed_from_u64(settings.seed),
        );
        SimulatedBench {
            state: Arc::new(Mutex::new(BenchState {
                settings,
                noise,
                clock: 0.,
                failures_left: 0,
                stalls_left: 0,
                history: Vec::new(),
            })),
        }
    }

    /// The next `n` commands fail as if the control surface were unreachable.
    pub fn fail_next_commands(&self, n: u32) -> LinkResult<()> {
        lock(&self.state)?.failures_left = n;
        Ok(())
    }

    /// The next `n` polls report no data.
    pub fn stall_next_polls(&self, n: u32) -> LinkResult<()> {
        lock(&self.state)?.stalls_left = n;
        Ok(())
    }

    pub fn settings(&self) -> LinkResult<BenchSettings> {
        Ok(lock(&self.state)?.settings.clone())
    }

    // Names of the commands applied so far, in order.
    pub fn history(&self) -> LinkResult<Vec<&'static str>> {
        Ok(lock(&self.state)?.history.clone())
    }

    pub fn split(&self) -> (BenchControl, BenchData) {
        (
            BenchControl {
                state: Arc::clone(&self.state),
            },
            BenchData {
                state: Arc::clone(&self.state),
            },
        )
    }
}

pub struct BenchControl {
    state: Arc<Mutex<BenchState>>,
}

impl BenchControl {
    fn command(
        &mut self,
        name: &'static str,
        apply: impl FnOnce(&mut BenchState),
    ) -> LinkResult<()> {
        let mut state = lock(&self.state)?;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(LinkError::Unavailable(format!("{} rejected", name)));
        }
        apply(&mut *state);
        state.history.push(name);
        Ok(())
    }
}

impl ControlSurface for BenchControl {
    fn set_baseband_frequency(&mut self, frequency: f64) -> LinkResult<()> {
        self.command("baseband_frequency", |s| {
            s.settings.baseband_frequency = frequency
        })
    }

    fn set_sample_rate(&mut self, sample_rate: f64) -> LinkResult<()> {
        self.command("sample_rate", |s| s.settings.sample_rate = sample_rate)
    }

    fn set_target_range(&mut self, range: f64) -> LinkResult<()> {
        self.command("target_range", |s| s.settings.target_range = range)
    }

    fn set_n_points(&mut self, n_points: usize) -> LinkResult<()> {
        self.command("n_points", |s| s.settings.n_points = n_points)
    }

    fn set_gain(&mut self, gain: f64) -> LinkResult<()> {
        self.command("gain", |s| s.settings.gain = gain)
    }

    fn set_noise_amplitude(&mut self, amplitude: f64) -> LinkResult<()> {
        self.command("noise_amplitude", |s| {
            s.settings.noise_amplitude = amplitude;
            s.noise.set_sigma(amplitude);
        })
    }
}

pub struct BenchData {
    state: Arc<Mutex<BenchState>>,
}

impl DataChannel for BenchData {
    fn poll(&mut self, _: Duration) -> LinkResult<bool> {
        let mut state = lock(&self.state)?;
        if state.stalls_left > 0 {
            state.stalls_left -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn recv(&mut self) -> LinkResult<Vec<Complex32>> {
        Ok(lock(&self.state)?.capture())
    }
}
