//! Test data generation utilities.
//!
//! Builders for small but globally-covering source datasets with known
//! value patterns, shaped like the World Ocean Atlas files the pipeline
//! consumes in production.

use std::io::Write;
use std::path::Path;

use netcdf::Error;
type Result<T> = std::result::Result<T, Error>;

/// Latitude-dependent temperature used by the NetCDF fixture.
///
/// Warm at the equator, cold at the poles, so rendered values are easy to
/// predict from the sampled coordinate.
pub fn expected_temperature(lat: f64) -> f32 {
    (30.0 - lat.abs() / 3.0) as f32
}

/// Creates a WOA-shaped NetCDF file covering the whole globe.
///
/// The grid is coarse (10 degree spacing) but global, so every inverse
/// projected coordinate finds a nearest cell. The temperature field is
/// `expected_temperature(lat)` at every longitude, with the full
/// time/depth/lat/lon dimension order of the real climatology.
pub fn create_global_sst_nc(path: &Path) -> Result<()> {
    let lats: Vec<f64> = (0..18).map(|i| -85.0 + i as f64 * 10.0).collect();
    let lons: Vec<f64> = (0..36).map(|i| -175.0 + i as f64 * 10.0).collect();

    let mut file = netcdf::create(path)?;

    file.add_dimension("lat", lats.len())?;
    file.add_dimension("lon", lons.len())?;
    file.add_dimension("depth", 2)?;
    file.add_dimension("time", 1)?;

    file.add_attribute("title", "Global SST Test Data")?;
    file.add_attribute("institution", "pelagos test suite")?;

    {
        let mut lat_var = file.add_variable::<f64>("lat", &["lat"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_values(&lats, &[..])?;
    }
    {
        let mut lon_var = file.add_variable::<f64>("lon", &["lon"])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_values(&lons, &[..])?;
    }

    // Surface slice holds the pattern; the deeper slice is shifted so a
    // depth indexing mistake changes every assertion
    let mut data: Vec<f32> = Vec::with_capacity(2 * lats.len() * lons.len());
    for d in 0..2 {
        for lat in &lats {
            for _ in &lons {
                data.push(expected_temperature(*lat) + d as f32 * 100.0);
            }
        }
    }

    {
        let mut temp_var = file.add_variable::<f32>("t_mn", &["time", "depth", "lat", "lon"])?;
        temp_var.put_attribute("units", "degrees_celsius")?;
        temp_var.put_attribute("long_name", "Objectively analyzed mean temperature")?;
        temp_var.put_values(&data, &[.., .., .., ..])?;
    }

    Ok(())
}

/// Creates a global landmask CSV in the WOA format.
///
/// `code_for` maps each (lat, lon) cell center to its classification code:
/// 0 for sea, 1 for land, higher codes for sub-surface standard levels.
pub fn create_global_mask_csv<F>(path: &Path, code_for: F) -> std::io::Result<()>
where
    F: Fn(f64, f64) -> u32,
{
    let mut f = std::fs::File::create(path)?;
    writeln!(f, "Latitude,Longitude,Bottom_Standard_level")?;
    for i in 0..18 {
        let lat = -85.0 + i as f64 * 10.0;
        for j in 0..36 {
            let lon = -175.0 + j as f64 * 10.0;
            writeln!(f, "{},{},{}", lat, lon, code_for(lat, lon))?;
        }
    }
    Ok(())
}

/// An all-sea mask
pub fn all_sea(_lat: f64, _lon: f64) -> u32 {
    0
}

/// An all-land mask
pub fn all_land(_lat: f64, _lon: f64) -> u32 {
    1
}
