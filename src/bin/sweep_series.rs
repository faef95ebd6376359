use sfcw_lib::{
    error::Error,
    logging::init_logging,
    sweep::{
        controller::{AcquisitionConfig, SweepController},
        simulator::{BenchSettings, SimulatedBench},
        SweepSpec,
    },
};

// Sweeps 100 MHz in 3 MHz steps with a growing number of steps against the simulated bench and
// prints one JSON report per sweep.
fn main() -> Result<(), Error> {
    init_logging("info");

    for step_count in (120..200).step_by(20) {
        let config = SweepSpec::new(100e6)
            .step_frequency(3e6)
            .step_count(step_count)
            .resolve()?;

        let bench = SimulatedBench::new(BenchSettings {
            noise_amplitude: 0.05,
            ..Default::default()
        });
        let (control, data) = bench.split();
        let mut controller =
            SweepController::new(config, AcquisitionConfig::immediate(), control, data)?;

        let report = controller.run_report()?;
        println!("{}", report.to_json()?);
    }

    Ok(())
}
