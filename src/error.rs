//! Error types for the sfcw core.

use thiserror::Error;

/// Errors surfaced by waveform synthesis, sweep configuration and acquisition.
#[derive(Debug, Error)]
pub enum Error {
    /// A real-valued waveform was requested at a rate that aliases its tone.
    #[error("sample rate {sample_rate} Hz does not exceed twice the frequency {frequency} Hz")]
    RateViolation { frequency: f64, sample_rate: f64 },

    /// Waveform algebra on inputs sampled at different rates.
    #[error("waveforms are not sampled at the same rate ({0} Hz vs {1} Hz)")]
    RateMismatch(f64, f64),

    /// An input's time axis could not be placed on the combined axis.
    #[error("sample at t = {time} s does not align with the combined time axis")]
    AlignmentError { time: f64 },

    /// A waveform window with a negative or non-finite length.
    #[error("waveform duration {0} s is not a finite non-negative length")]
    InvalidDuration(f64),

    /// The waveform was produced by algebra and has no tone to regenerate from.
    #[error("waveform has no generating sinusoid to regenerate from")]
    NotRegenerable,

    /// Fewer than two of end frequency, step frequency and step count were given.
    #[error("sweep needs two of end_frequency, step_frequency and step_count, got {0}")]
    UnderspecifiedSweep(usize),

    /// All three frequency quantities were given and disagree.
    #[error("start {start} + {step_count} x {step} does not reach end {end}")]
    ContradictorySweep {
        start: f64,
        end: f64,
        step: f64,
        step_count: usize,
    },

    /// A sweep parameter is outside its physical domain.
    #[error("invalid sweep: {0}")]
    InvalidSweep(String),

    /// Pulse index outside `[0, n_pulses)`.
    #[error("pulse {index} out of range for a train of {n_pulses}")]
    PulseOutOfRange { index: usize, n_pulses: usize },

    /// Burst index outside `[0, n_bursts)`.
    #[error("burst {index} out of range for {n_bursts} bursts")]
    BurstOutOfRange { index: usize, n_bursts: usize },

    /// The control surface kept failing until the retry policy gave up.
    #[error("hardware unreachable while setting {command} after {attempts} attempts: {source}")]
    HardwareUnreachable {
        command: &'static str,
        attempts: u32,
        #[source]
        source: LinkError,
    },

    /// The data channel never became ready before the poll deadline.
    #[error("data channel not ready after {0:?}")]
    DataTimeout(std::time::Duration),

    /// A received buffer did not hold the expected number of samples.
    #[error("expected {expected} interleaved samples, received {received}")]
    MalformedBuffer { expected: usize, received: usize },

    /// The sweep was cancelled at a retry or poll boundary.
    #[error("sweep cancelled")]
    Cancelled,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reported by an external collaborator (control surface or data channel).
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("remote endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
