pub fn decibels_or_else(x: f64, or: f64) -> f64 {
    if x <= 0. {
        or
    } else {
        10. * x.log10()
    }
}

// Round half away from zero to the given number of decimal places.
pub fn round_to_decimals(x: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (x * scale).round() / scale
}

// Snaps values that are within floating point noise of an integer onto that integer,
// so that ceil/floor of e.g. 250e6 / 10e6 does not land one step off.
pub fn snap_to_integer(x: f64) -> f64 {
    let rounded = x.round();
    if (x - rounded).abs() <= 1e-9 * rounded.abs().max(1.) {
        rounded
    } else {
        x
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_relative_eq!(round_to_decimals(3.14159, 2), 3.14);
        assert_relative_eq!(round_to_decimals(10e6 / 3., 2), 3333333.33);
    }

    #[test]
    fn snaps_only_near_integers() {
        assert_eq!(snap_to_integer(25.000000000001), 25.);
        assert_eq!(snap_to_integer(24.5), 24.5);
    }

    #[test]
    fn decibels_of_non_positive_uses_fallback() {
        assert_relative_eq!(decibels_or_else(100., -120.), 20.);
        assert_eq!(decibels_or_else(0., -120.), -120.);
    }
}
