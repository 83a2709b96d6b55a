//! Incomplete elliptic integral of the first kind.
//!
//! The Adams world-in-a-square transform needs F(phi, m) with parameter
//! m = k^2 = 1/2. Computed through the Carlson symmetric form RF with the
//! standard duplication algorithm.

/// Carlson's symmetric elliptic integral RF(x, y, z).
///
/// Arguments must be non-negative with at most one zero.
pub fn carlson_rf(mut x: f64, mut y: f64, mut z: f64) -> f64 {
    let mut mu = (x + y + z) / 3.0;
    for _ in 0..100 {
        let lambda = x.sqrt() * y.sqrt() + y.sqrt() * z.sqrt() + z.sqrt() * x.sqrt();
        x = (x + lambda) / 4.0;
        y = (y + lambda) / 4.0;
        z = (z + lambda) / 4.0;
        mu = (x + y + z) / 3.0;
        let eps = (x - mu).abs().max((y - mu).abs()).max((z - mu).abs()) / mu;
        if eps < 1e-12 {
            break;
        }
    }
    let dx = 1.0 - x / mu;
    let dy = 1.0 - y / mu;
    let dz = 1.0 - z / mu;
    let e2 = dx * dy - dz * dz;
    let e3 = dx * dy * dz;
    (1.0 - e2 / 10.0 + e3 / 14.0 + e2 * e2 / 24.0 - 3.0 * e2 * e3 / 44.0) / mu.sqrt()
}

/// Incomplete elliptic integral of the first kind F(phi, m), m = k^2.
pub fn ellip_f(phi: f64, m: f64) -> f64 {
    let s = phi.sin();
    let c = phi.cos();
    s * carlson_rf(c * c, 1.0 - m * s * s, 1.0)
}
