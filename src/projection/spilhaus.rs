//! Spilhaus-style world-ocean projection.
//!
//! An oblique aspect of the Adams world-in-a-square conformal projection,
//! centered so the world ocean forms one continuous silhouette. Parameters
//! are the published Spilhaus constants: WGS84 eccentricity, center at
//! 66.94970198 E / 49.56371678 S, azimuth 40.17823482 degrees.
//!
//! The forward transform is closed-form (conformal latitude, oblique
//! spherical rotation, Adams square via the elliptic integral F with
//! m = 1/2). No closed-form inverse is published; like PROJ, the inverse
//! here is numeric - Newton iteration on the forward transform, seeded from
//! a coarse forward table bucketed over the plane. Points outside the
//! square-on-its-vertex domain, and points where the iteration cannot
//! converge (fold seams, the singular vertices), come back as NaN.

use once_cell::sync::OnceCell;

use super::elliptic::ellip_f;
use super::Projection;

/// Half-width of the square sampling domain, meters
pub const PLANE_EXTENT: f64 = 11_825_474.0;

/// WGS84 first eccentricity squared
const E2: f64 = 0.006_694_38;

const LAT_CENTER_DEG: f64 = -49.563_716_78;
const LON_CENTER_DEG: f64 = 66.949_701_98;
const AZIMUTH_DEG: f64 = 40.178_234_82;

/// Seed grid spacing in degrees for the inverse
const SEED_STEP_DEG: f64 = 2.0;

/// Buckets per plane axis for seed lookup
const BUCKETS: i32 = 64;

/// Newton convergence tolerance in plane meters
const NEWTON_TOL: f64 = 1e-4;

const NEWTON_MAX_ITER: usize = 40;

/// Finite-difference step for the Jacobian, degrees
const FD_STEP: f64 = 1e-7;

/// Largest Newton step per iteration, degrees
const MAX_STEP_DEG: f64 = 20.0;

struct Seed {
    x: f64,
    y: f64,
    lon: f64,
    lat: f64,
}

struct SeedTable {
    seeds: Vec<Seed>,
    buckets: Vec<Vec<u32>>,
}

/// The Spilhaus projection with its published parameters.
pub struct Spilhaus {
    /// sin/cos of the pole offset of the oblique aspect
    sin_alpha: f64,
    cos_alpha: f64,
    /// Longitude of the rotated origin, radians
    lam0: f64,
    /// Longitude offset in the rotated frame, radians
    beta: f64,
    /// Plane meters per native Adams unit
    scale: f64,
    table: OnceCell<SeedTable>,
}

impl Default for Spilhaus {
    fn default() -> Self {
        Self::new()
    }
}

impl Spilhaus {
    pub fn new() -> Self {
        let e = E2.sqrt();
        let lat_center = LAT_CENTER_DEG.to_radians();
        let azimuth = AZIMUTH_DEG.to_radians();

        let chi0 = conformal_latitude(lat_center, e);
        let alpha = -(chi0.cos() * azimuth.cos()).asin();
        let lam0 = LON_CENTER_DEG.to_radians() + azimuth.tan().atan2(-chi0.sin());
        let beta = std::f64::consts::PI + (-azimuth.sin()).atan2(-chi0.tan());

        // The Adams square stands on its vertex; the vertex sits at
        // sqrt(2) * F(pi/4, 1/2) native units from the center.
        let vertex = std::f64::consts::SQRT_2 * ellip_f(std::f64::consts::FRAC_PI_4, 0.5);
        let scale = PLANE_EXTENT / vertex;

        Self {
            sin_alpha: alpha.sin(),
            cos_alpha: alpha.cos(),
            lam0,
            beta,
            scale,
            table: OnceCell::new(),
        }
    }

    /// Forward transform: (longitude, latitude) in degrees to plane meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let e = E2.sqrt();
        let lam = lon_deg.to_radians();
        let phi = lat_deg.to_radians();

        let chi = conformal_latitude(phi, e);
        let dl = lam - self.lam0;

        // Oblique rotation on the conformal sphere
        let sin_lat_s =
            self.sin_alpha * chi.sin() - self.cos_alpha * chi.cos() * dl.cos();
        let lat_s = sin_lat_s.clamp(-1.0, 1.0).asin();
        let lon_s = wrap_pi(
            self.beta
                + (chi.cos() * dl.sin())
                    .atan2(self.sin_alpha * chi.cos() * dl.cos() + self.cos_alpha * chi.sin()),
        );

        // Adams world-in-a-square II
        let spp = (0.5 * lat_s).tan();
        let a0 = spp.clamp(-1.0, 1.0).asin().cos() * (0.5 * lon_s).sin();
        let sm = (spp + a0) < 0.0;
        let sn = (spp - a0) < 0.0;
        let b = spp.clamp(-1.0, 1.0).acos();
        let a = a0.clamp(-1.0, 1.0).acos();

        let m = (((1.0 + (a + b).cos()) / 2.0).max(0.0)).sqrt().asin();
        let n = (((1.0 - (a - b).cos()).abs() / 2.0).sqrt()).asin();
        let mut u = ellip_f(m, 0.5);
        let mut v = ellip_f(n, 0.5);
        if sm {
            u = -u;
        }
        if sn {
            v = -v;
        }

        // Rotate 45 degrees onto the vertex-up square and scale to meters
        let rsqrt2 = std::f64::consts::FRAC_1_SQRT_2;
        (
            self.scale * rsqrt2 * (u - v),
            self.scale * rsqrt2 * (u + v),
        )
    }

    fn seed_table(&self) -> &SeedTable {
        self.table.get_or_init(|| {
            let mut seeds = Vec::new();
            let mut buckets = vec![Vec::new(); (BUCKETS * BUCKETS) as usize];

            let mut lat = -89.0;
            while lat <= 89.0 {
                let mut lon = -180.0;
                while lon < 180.0 {
                    let (x, y) = self.forward(lon, lat);
                    let idx = seeds.len() as u32;
                    seeds.push(Seed { x, y, lon, lat });
                    buckets[bucket_of(x, y)].push(idx);
                    lon += SEED_STEP_DEG;
                }
                lat += SEED_STEP_DEG;
            }

            SeedTable { seeds, buckets }
        })
    }

    /// Nearest seed to a plane point, searched bucket ring by bucket ring
    fn best_seed<'a>(&self, table: &'a SeedTable, x: f64, y: f64) -> &'a Seed {
        let (bx, by) = bucket_coords(x, y);
        let mut best: Option<&Seed> = None;
        let mut best_d2 = f64::INFINITY;

        for r in 0..BUCKETS {
            for dx in -r..=r {
                for dy in -r..=r {
                    if dx.abs().max(dy.abs()) != r {
                        continue;
                    }
                    let cx = bx + dx;
                    let cy = by + dy;
                    if !(0..BUCKETS).contains(&cx) || !(0..BUCKETS).contains(&cy) {
                        continue;
                    }
                    for &si in &table.buckets[(cy * BUCKETS + cx) as usize] {
                        let seed = &table.seeds[si as usize];
                        let d2 = (seed.x - x).powi(2) + (seed.y - y).powi(2);
                        if d2 < best_d2 {
                            best_d2 = d2;
                            best = Some(seed);
                        }
                    }
                }
            }
            // one extra ring after the first hit, so a neighbor bucket
            // cannot hide a closer seed
            if best.is_some() && r >= 1 {
                break;
            }
        }

        best.expect("seed table covers the plane domain")
    }

    /// Newton inverse of one plane point
    fn invert_point(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if x.abs() + y.abs() > PLANE_EXTENT * (1.0 + 1e-7) {
            return None;
        }

        let table = self.seed_table();
        let seed = self.best_seed(table, x, y);
        let mut lon = seed.lon;
        let mut lat = seed.lat;

        for _ in 0..NEWTON_MAX_ITER {
            let (fx, fy) = self.forward(lon, lat);
            let rx = fx - x;
            let ry = fy - y;
            if rx.hypot(ry) < NEWTON_TOL {
                return Some((wrap_deg(lon), lat));
            }

            let (fxl, fyl) = self.forward(lon + FD_STEP, lat);
            let (fxp, fyp) = self.forward(lon, lat + FD_STEP);
            let j11 = (fxl - fx) / FD_STEP;
            let j21 = (fyl - fy) / FD_STEP;
            let j12 = (fxp - fx) / FD_STEP;
            let j22 = (fyp - fy) / FD_STEP;
            let det = j11 * j22 - j12 * j21;
            if det == 0.0 || !det.is_finite() {
                return None;
            }

            let dlon = ((-rx) * j22 + ry * j12) / det;
            let dlat = ((-ry) * j11 + rx * j21) / det;
            lon += dlon.clamp(-MAX_STEP_DEG, MAX_STEP_DEG);
            lat += dlat.clamp(-MAX_STEP_DEG, MAX_STEP_DEG);
            lat = lat.clamp(-89.999_999, 89.999_999);
            lon = wrap_deg(lon);
        }

        None
    }
}

impl Projection for Spilhaus {
    fn invert(&self, x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
        debug_assert_eq!(x.len(), y.len());
        let mut lons = Vec::with_capacity(x.len());
        let mut lats = Vec::with_capacity(x.len());
        for (&px, &py) in x.iter().zip(y) {
            match self.invert_point(px, py) {
                Some((lon, lat)) => {
                    lons.push(lon);
                    lats.push(lat);
                }
                None => {
                    lons.push(f64::NAN);
                    lats.push(f64::NAN);
                }
            }
        }
        (lons, lats)
    }

    fn half_width(&self) -> f64 {
        PLANE_EXTENT
    }

    fn name(&self) -> &str {
        "spilhaus"
    }
}

/// Conformal latitude for geodetic latitude `phi` and eccentricity `e`
fn conformal_latitude(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    -std::f64::consts::FRAC_PI_2
        + 2.0
            * ((std::f64::consts::FRAC_PI_4 + phi / 2.0).tan()
                * ((1.0 - es) / (1.0 + es)).powf(e / 2.0))
            .atan()
}

fn wrap_pi(mut x: f64) -> f64 {
    while x > std::f64::consts::PI {
        x -= 2.0 * std::f64::consts::PI;
    }
    while x < -std::f64::consts::PI {
        x += 2.0 * std::f64::consts::PI;
    }
    x
}

fn wrap_deg(deg: f64) -> f64 {
    let w = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if w == -180.0 {
        180.0
    } else {
        w
    }
}

fn bucket_coords(x: f64, y: f64) -> (i32, i32) {
    let f = |v: f64| -> i32 {
        let b = ((v + PLANE_EXTENT) / (2.0 * PLANE_EXTENT) * BUCKETS as f64) as i32;
        b.clamp(0, BUCKETS - 1)
    };
    (f(x), f(y))
}

fn bucket_of(x: f64, y: f64) -> usize {
    let (bx, by) = bucket_coords(x, y);
    (by * BUCKETS + bx) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_maps_to_origin() {
        let p = Spilhaus::new();
        let (x, y) = p.forward(LON_CENTER_DEG, LAT_CENTER_DEG);
        assert!(x.abs() < 1.0, "x = {}", x);
        assert!(y.abs() < 1.0, "y = {}", y);
    }

    #[test]
    fn test_forward_stays_in_domain() {
        let p = Spilhaus::new();
        for lat in (-88..=88).step_by(11) {
            for lon in (-180..180).step_by(17) {
                let (x, y) = p.forward(lon as f64, lat as f64);
                assert!(
                    x.abs() + y.abs() <= PLANE_EXTENT * 1.000_001,
                    "({}, {}) -> ({}, {})",
                    lon,
                    lat,
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_invert_round_trip() {
        let p = Spilhaus::new();
        let points = [
            (0.0, 0.0),
            (120.5, -35.2),
            (-70.0, 40.0),
            (170.0, -60.0),
            (66.949_701_98, -49.563_716_78),
            (-15.3, 72.8),
        ];
        for (lon, lat) in points {
            let (x, y) = p.forward(lon, lat);
            let (lons, lats) = p.invert(&[x], &[y]);
            assert!(lons[0].is_finite() && lats[0].is_finite(), "({}, {})", lon, lat);
            let (x2, y2) = p.forward(lons[0], lats[0]);
            let err = (x2 - x).hypot(y2 - y);
            assert!(err < 1.0, "round trip error {} m at ({}, {})", err, lon, lat);
        }
    }

    #[test]
    fn test_corners_are_invalid() {
        let p = Spilhaus::new();
        let (lons, lats) = p.invert(
            &[PLANE_EXTENT, -PLANE_EXTENT, PLANE_EXTENT, -PLANE_EXTENT],
            &[PLANE_EXTENT, PLANE_EXTENT, -PLANE_EXTENT, -PLANE_EXTENT],
        );
        for i in 0..4 {
            assert!(lons[i].is_nan());
            assert!(lats[i].is_nan());
        }
    }

    #[test]
    fn test_invert_deterministic() {
        let p = Spilhaus::new();
        let xs = [0.0, 1.0e6, -3.0e6, 5.0e6];
        let ys = [0.0, -2.0e6, 1.0e6, 4.0e6];
        let a = p.invert(&xs, &ys);
        let b = p.invert(&xs, &ys);
        assert_eq!(a, b);
    }

    #[test]
    fn test_batch_preserves_length_and_mixes_validity() {
        let p = Spilhaus::new();
        // First point valid (origin), second outside the domain
        let (lons, lats) = p.invert(&[0.0, PLANE_EXTENT * 2.0], &[0.0, 0.0]);
        assert_eq!(lons.len(), 2);
        assert_eq!(lats.len(), 2);
        assert!(lons[0].is_finite());
        assert!(lons[1].is_nan());
    }

    #[test]
    fn test_wrap_deg() {
        assert_eq!(wrap_deg(0.0), 0.0);
        assert_eq!(wrap_deg(190.0), -170.0);
        assert_eq!(wrap_deg(-190.0), 170.0);
        assert_eq!(wrap_deg(360.0), 0.0);
    }
}
