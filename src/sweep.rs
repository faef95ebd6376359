//! Sweep planning and the results a sweep produces.
//!
//! A [SweepSpec] is the partial, physical description a user supplies. Resolving it yields an
//! immutable [SweepConfig] in which the step count, end frequency, step size, sample rate and
//! transform length are all consistent with each other.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    helper::{round_to_decimals, snap_to_integer},
    radar,
};

pub mod compensation;
pub mod controller;
pub mod hardware;
pub mod retry;
pub mod simulator;

// The acquisition sample rate is this many times the highest swept frequency.
const OVERSAMPLING: f64 = 10.;

const NAME_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A partially specified sweep. Two of `end_frequency`, `step_frequency` and `step_count` are
/// required; the third is derived when resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSpec {
    pub name: Option<String>,
    // Hz
    pub start_frequency: f64,
    pub end_frequency: Option<f64>,
    pub step_frequency: Option<f64>,
    #[serde(alias = "N")]
    pub step_count: Option<usize>,
    // m
    pub target_range_start: f64,
    pub target_range_end: f64,
    pub target_range_step: f64,
    // Decimal places kept when the step size is derived.
    pub step_decimals: u32,
}

impl Default for SweepSpec {
    fn default() -> Self {
        SweepSpec {
            name: None,
            start_frequency: 100e6,
            end_frequency: None,
            step_frequency: None,
            step_count: None,
            target_range_start: 1.,
            target_range_end: 50.,
            target_range_step: 1.,
            step_decimals: 2,
        }
    }
}

impl SweepSpec {
    pub fn new(start_frequency: f64) -> SweepSpec {
        SweepSpec {
            start_frequency,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<SweepSpec> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn named(mut self, name: impl Into<String>) -> SweepSpec {
        self.name = Some(name.into());
        self
    }

    pub fn end_frequency(mut self, end_frequency: f64) -> SweepSpec {
        self.end_frequency = Some(end_frequency);
        self
    }

    pub fn step_frequency(mut self, step_frequency: f64) -> SweepSpec {
        self.step_frequency = Some(step_frequency);
        self
    }

    pub fn step_count(mut self, step_count: usize) -> SweepSpec {
        self.step_count = Some(step_count);
        self
    }

    pub fn target_ranges(mut self, start: f64, end: f64, step: f64) -> SweepSpec {
        self.target_range_start = start;
        self.target_range_end = end;
        self.target_range_step = step;
        self
    }

    pub fn resolve(self) -> Result<SweepConfig> {
        SweepConfig::new(self)
    }
}

/// A fully resolved sweep plan.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SweepConfig {
    name: String,
    start_frequency: f64,
    end_frequency: f64,
    step_frequency: f64,
    #[serde(rename = "N")]
    step_count: usize,
    target_range_start: f64,
    target_range_end: f64,
    target_range_step: f64,
    sample_rate: f64,
    #[serde(rename = "M")]
    transform_length: usize,
    max_unambiguous_range: f64,
    range_resolution: f64,
}

fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| NAME_LETTERS[rng.gen_range(0..NAME_LETTERS.len())] as char)
        .collect();
    format!("test-{}", suffix)
}

fn step_frequencies(start: f64, end: f64, step: f64) -> impl Iterator<Item = (usize, f64)> {
    (0..)
        .map(move |i| start + i as f64 * step)
        .take_while(move |f| *f < end - step * 1e-9)
        .map(move |f| ((f / step).round() as usize, f))
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidSweep(reason.into())
}

impl SweepConfig {
    pub fn new(spec: SweepSpec) -> Result<SweepConfig> {
        let start = spec.start_frequency;
        let supplied = [
            spec.end_frequency.is_some(),
            spec.step_frequency.is_some(),
            spec.step_count.is_some(),
        ]
        .iter()
        .filter(|x| **x)
        .count();
        if supplied < 2 {
            return Err(Error::UnderspecifiedSweep(supplied));
        }
        if !start.is_finite() || start <= 0. {
            return Err(invalid(format!("start frequency {} Hz", start)));
        }

        let (end, step, step_count) =
            match (spec.end_frequency, spec.step_frequency, spec.step_count) {
                (Some(end), Some(step), Some(step_count)) => {
                    // Allow for the step having been rounded before it was written down.
                    let tolerance = step_count as f64 * 0.5 * 10f64.powi(-(spec.step_decimals as i32))
                        + 1e-9 * end.abs();
                    if (start + step_count as f64 * step - end).abs() > tolerance {
                        return Err(Error::ContradictorySweep {
                            start,
                            end,
                            step,
                            step_count,
                        });
                    }
                    (end, step, step_count)
                }
                (Some(end), Some(step), None) => {
                    if step <= 0. {
                        return Err(invalid(format!("step frequency {} Hz", step)));
                    }
                    let step_count = ((end - start) / step).round();
                    if step_count < 1. {
                        return Err(invalid(format!(
                            "band {} Hz to {} Hz holds no {} Hz step",
                            start, end, step
                        )));
                    }
                    (end, step, step_count as usize)
                }
                (None, Some(step), Some(step_count)) => {
                    (start + step_count as f64 * step, step, step_count)
                }
                (Some(end), None, Some(step_count)) => {
                    if step_count == 0 {
                        return Err(invalid("zero frequency steps"));
                    }
                    let step =
                        round_to_decimals((end - start) / step_count as f64, spec.step_decimals);
                    (end, step, step_count)
                }
                _ => return Err(Error::UnderspecifiedSweep(supplied)),
            };

        if !(step > 0.) || !step.is_finite() {
            return Err(invalid(format!("step frequency {} Hz", step)));
        }
        if step_count == 0 {
            return Err(invalid("zero frequency steps"));
        }
        if !(end > start) || !end.is_finite() {
            return Err(invalid(format!(
                "end frequency {} Hz not above start {} Hz",
                end, start
            )));
        }
        if !(spec.target_range_step > 0.) {
            return Err(invalid(format!(
                "target range step {} m",
                spec.target_range_step
            )));
        }
        if spec.target_range_end < spec.target_range_start {
            return Err(invalid(format!(
                "target ranges run backwards from {} m to {} m",
                spec.target_range_start, spec.target_range_end
            )));
        }

        // Smallest power of two covering end / step, grown when a start off the step grid
        // rounds the last index past it.
        let last_index = step_frequencies(start, end, step)
            .map(|(index, _)| index)
            .max()
            .unwrap_or(0);
        let transform_length = (snap_to_integer(end / step).ceil() as usize)
            .max(last_index + 1)
            .next_power_of_two();

        Ok(SweepConfig {
            name: spec.name.unwrap_or_else(random_name),
            start_frequency: start,
            end_frequency: end,
            step_frequency: step,
            step_count,
            target_range_start: spec.target_range_start,
            target_range_end: spec.target_range_end,
            target_range_step: spec.target_range_step,
            sample_rate: end * OVERSAMPLING,
            transform_length,
            max_unambiguous_range: radar::max_unambiguous_range(step),
            range_resolution: radar::range_resolution(step_count, step),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_frequency(&self) -> f64 {
        self.start_frequency
    }

    pub fn end_frequency(&self) -> f64 {
        self.end_frequency
    }

    pub fn step_frequency(&self) -> f64 {
        self.step_frequency
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn target_range_start(&self) -> f64 {
        self.target_range_start
    }

    pub fn target_range_end(&self) -> f64 {
        self.target_range_end
    }

    pub fn target_range_step(&self) -> f64 {
        self.target_range_step
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn transform_length(&self) -> usize {
        self.transform_length
    }

    pub fn max_unambiguous_range(&self) -> f64 {
        self.max_unambiguous_range
    }

    pub fn range_resolution(&self) -> f64 {
        self.range_resolution
    }

    /// The swept frequencies, from the start frequency up to but excluding the end frequency,
    /// each paired with its frequency-vector index `round(f / step)`.
    pub fn frequencies(&self) -> impl Iterator<Item = (usize, f64)> {
        step_frequencies(self.start_frequency, self.end_frequency, self.step_frequency)
    }

    /// Target-range test points, from the first up to and including the last.
    pub fn target_ranges(&self) -> impl Iterator<Item = f64> {
        let (start, end, step) = (
            self.target_range_start,
            self.target_range_end,
            self.target_range_step,
        );
        (0..)
            .map(move |i| start + i as f64 * step)
            .take_while(move |r| *r <= end + step * 1e-9)
    }
}

/// Outcome of one target-range test point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    #[serde(rename = "expected")]
    pub expected_range: f64,
    #[serde(rename = "predicted")]
    pub predicted_range: f64,
}

impl SweepResult {
    pub fn error(&self) -> f64 {
        self.predicted_range - self.expected_range
    }
}

/// The resolved configuration together with every result of a sweep.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SweepReport {
    pub config: SweepConfig,
    pub results: Vec<SweepResult>,
}

impl SweepReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
