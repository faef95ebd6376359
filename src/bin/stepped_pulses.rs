use sfcw_lib::{error::Error, logging::init_logging, stepped::SteppedFrequencyModel};
use tracing::info;

fn main() -> Result<(), Error> {
    init_logging("info");

    let model = SteppedFrequencyModel {
        n_bursts: 2,
        n_pulses: 8,
        target_range: 150e3,
        target_velocity: 300.,
        freq_step_size: 100.,
        freq_start: 1e3,
        pulse_width: 1e-3,
        pulse_repetition_interval: 5e-3,
        amplitude: 1.,
        relative_phase: 0.,
        sample_rate: 1e5,
    };

    for (b, samples) in model.operate_bursts()?.iter().enumerate() {
        let burst = model.burst(b)?;
        for (i, sample) in samples.iter().enumerate() {
            info!(
                burst = b,
                pulse = i,
                frequency = burst.frequency(i),
                range = burst.range_at(i),
                sample_time = burst.sample_time(i),
                sample,
                "mixer output"
            );
        }
    }

    Ok(())
}
