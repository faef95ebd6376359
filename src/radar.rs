use std::f64::consts::PI;

const c: f64 = 299_792_458.0;

pub const SPEED_OF_LIGHT: f64 = c;

pub fn wavelength(f: f64) -> f64 {
    c / f
}

// Round trip time for a target at the given range.
pub fn two_way_delay(range: f64) -> f64 {
    2. * range / c
}

pub fn delay_to_range(delay: f64) -> f64 {
    delay * c / 2.
}

// Largest range that does not alias when the carrier advances by `step_frequency` per step.
pub fn max_unambiguous_range(step_frequency: f64) -> f64 {
    c / (2. * step_frequency)
}

// Smallest separation resolvable over a swept bandwidth of `step_count * step_frequency`.
pub fn range_resolution(step_count: usize, step_frequency: f64) -> f64 {
    c / (2. * step_count as f64 * step_frequency)
}

/// Physical range of bin `k` of a range profile computed from an `len` point inverse transform.
pub fn bin_to_range(k: usize, len: usize, step_frequency: f64) -> f64 {
    k as f64 * c / (2. * len as f64 * step_frequency)
}

/// Monostatic radar equation. Returns the received power given the transmitted power,
/// the antenna gains, the radar cross section and the carrier frequency.
pub fn range_equation(
    power_xmtd: f64,
    range: f64,
    xmtr_gain: f64,
    rcvr_gain: f64,
    signature: f64,
    freq: f64,
) -> f64 {
    let wavelength = wavelength(freq);
    let effective_aperture = rcvr_gain * wavelength.powi(2) / (4. * PI);
    let density_at_tgt = power_xmtd * xmtr_gain / (4. * PI * range * range);
    let reflected_power = signature * density_at_tgt;
    let density_at_rcvr = reflected_power / (4. * PI * range * range);

    effective_aperture * density_at_rcvr
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn delay_round_trips_to_range() {
        let delay = two_way_delay(12.5);
        assert_relative_eq!(delay_to_range(delay), 12.5, epsilon = 1e-12);
    }

    #[test]
    fn resolution_scales_with_bandwidth() {
        let unambiguous = max_unambiguous_range(10e6);
        assert_relative_eq!(unambiguous, SPEED_OF_LIGHT / 20e6);
        assert_relative_eq!(range_resolution(15, 10e6), unambiguous / 15.);
        // The last bin of an N point transform sits one bin short of the ambiguity limit.
        assert_relative_eq!(bin_to_range(16, 16, 10e6), unambiguous);
    }

    #[test]
    fn received_power_falls_with_fourth_power_of_range() {
        let near = range_equation(1., 10., 1., 1., 1., 1e9);
        let far = range_equation(1., 20., 1., 1., 1., 1e9);
        assert_relative_eq!(near / far, 16., max_relative = 1e-12);
    }
}
