use std::f64::consts::PI;

use ndarray::Array1;

/**
This version of the hamming window uses 25/46 rather than the rounded 0.54. See equation (134) in [1].

[1] Armin Doerry, "Catalog of Window Taper Functions for Sidelobe Control", 2017.
*/
pub fn hamming_window(size: usize) -> Array1<f64> {
    const a0: f64 = 25. / 46.;
    const a1: f64 = 1. - a0;
    match size {
        0 => Array1::zeros(0),
        1 => Array1::ones(1),
        _ => {
            let step = 2. * PI / (size - 1) as f64;
            (0..size)
                .map(|k| a0 + a1 * (-PI + k as f64 * step).cos())
                .collect()
        }
    }
}
