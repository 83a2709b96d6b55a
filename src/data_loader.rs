//! Source dataset loading.
//!
//! Two loaders feed the pipeline: a NetCDF reader for the World Ocean Atlas
//! temperature climatology and a CSV reader for the matching land/sea mask.
//! Both run before any grid computation so a missing or malformed dataset
//! aborts the run without producing an image.

use ndarray::Array2;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::DataConfig;
use crate::error::{PelagosError, Result};
use crate::logging::log_source_load_stats;
use crate::source::{MaskGrid, SourceGrid};

/// Mask CSV column holding the classification code; both spellings occur
/// across WOA releases
const MASK_COLUMNS: [&str; 2] = ["Bottom_Standard_level", "Bottom_Standard_Level"];

/// Load the temperature field from a WOA NetCDF file.
///
/// The configured variable is sliced at the configured time and depth
/// indices and reduced to a 2D `[lat][lon]` field. Fill values become NaN;
/// `scale_factor` and `add_offset` are applied when present.
pub fn load_sst(path: &Path, config: &DataConfig) -> Result<SourceGrid> {
    if !path.exists() {
        return Err(PelagosError::MissingInputDataset {
            path: path.display().to_string(),
            message: "File not found".to_string(),
        });
    }

    let file = netcdf::open(path)?;
    let var = file
        .variable(&config.variable)
        .ok_or_else(|| PelagosError::MissingInputDataset {
            path: path.display().to_string(),
            message: format!("Variable {} not found", config.variable),
        })?;

    let dim_names: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let lat_dim = find_dimension(&dim_names, &["lat", "latitude", "y"]).ok_or_else(|| {
        PelagosError::MissingInputDataset {
            path: path.display().to_string(),
            message: format!("Variable {} has no latitude dimension", config.variable),
        }
    })?;
    let lon_dim = find_dimension(&dim_names, &["lon", "longitude", "x"]).ok_or_else(|| {
        PelagosError::MissingInputDataset {
            path: path.display().to_string(),
            message: format!("Variable {} has no longitude dimension", config.variable),
        }
    })?;

    // Slice every non-spatial dimension down to a single index
    let mut extents: Vec<netcdf::Extent> = Vec::with_capacity(dim_names.len());
    for (i, name) in dim_names.iter().enumerate() {
        let len = var.dimensions()[i].len();
        if i == lat_dim || i == lon_dim {
            extents.push((0..len).into());
        } else {
            let index = slice_index(name, config);
            if index >= len {
                return Err(PelagosError::InvalidParameter {
                    param: name.clone(),
                    message: format!("Index {} out of range for dimension of length {}", index, len),
                });
            }
            extents.push((index..index + 1).into());
        }
    }

    let raw: Vec<f32> = var.get_values::<f32, _>(extents.as_slice())?;
    let n_lat = var.dimensions()[lat_dim].len();
    let n_lon = var.dimensions()[lon_dim].len();

    // The slice keeps lat/lon in variable order; transpose if lon comes first
    let mut values = if lat_dim < lon_dim {
        Array2::from_shape_vec((n_lat, n_lon), raw)?
    } else {
        Array2::from_shape_vec((n_lon, n_lat), raw)?.reversed_axes().to_owned()
    };

    apply_packing(&mut values, &var);

    let lats = coordinate_axis(&file, &dim_names[lat_dim], path)?;
    let lons = coordinate_axis(&file, &dim_names[lon_dim], path)?;

    let grid = SourceGrid::new(config.variable.clone(), lats, lons, values)?;
    log_source_load_stats(
        &path.display().to_string(),
        &grid.name,
        grid.lats.len(),
        grid.lons.len(),
    );
    Ok(grid)
}

/// Load the land/sea mask from a WOA CSV file.
///
/// Classification codes follow the WOA convention: 0 is sea, 1 is land, and
/// any code above 1 marks a sub-surface standard level, treated as sea.
pub fn load_landmask(path: &Path) -> Result<MaskGrid> {
    let content =
        std::fs::read_to_string(path).map_err(|e| PelagosError::MissingInputDataset {
            path: path.display().to_string(),
            message: format!("Failed to read mask file: {}", e),
        })?;

    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or_else(|| PelagosError::MissingInputDataset {
        path: path.display().to_string(),
        message: "Mask file is empty".to_string(),
    })?;

    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let lat_col = find_column(&columns, &["Latitude", "lat"], path)?;
    let lon_col = find_column(&columns, &["Longitude", "lon"], path)?;
    let code_col = find_column(&columns, &MASK_COLUMNS, path)?;

    let mut records: Vec<(f64, f64, bool)> = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < columns.len() {
            warn!(line = line_no + 2, "Skipping short mask record");
            continue;
        }
        let lat: f64 = parse_field(fields[lat_col], "Latitude", line_no, path)?;
        let lon: f64 = parse_field(fields[lon_col], "Longitude", line_no, path)?;
        let code: f64 = parse_field(fields[code_col], columns[code_col], line_no, path)?;
        records.push((lat, lon, normalize_mask_code(code)));
    }

    if records.is_empty() {
        return Err(PelagosError::MissingInputDataset {
            path: path.display().to_string(),
            message: "Mask file contains no records".to_string(),
        });
    }

    let lats = unique_sorted(records.iter().map(|r| r.0));
    let lons = unique_sorted(records.iter().map(|r| r.1));
    debug!(
        n_lat = lats.len(),
        n_lon = lons.len(),
        n_records = records.len(),
        "Parsed mask records"
    );

    // Cells absent from the file default to sea
    let mut values = Array2::from_elem((lats.len(), lons.len()), false);
    for (lat, lon, land) in records {
        let i = crate::source::nearest_index(&lats, lat);
        let j = crate::source::nearest_index(&lons, lon);
        values[[i, j]] = land;
    }

    let grid = MaskGrid::new("landmask".to_string(), lats, lons, values)?;
    log_source_load_stats(
        &path.display().to_string(),
        &grid.name,
        grid.lats.len(),
        grid.lons.len(),
    );
    Ok(grid)
}

/// Collapse a WOA standard-level code to the land/sea classification.
///
/// Only code 1 is land; 0 and every deeper level code mean open water.
pub fn normalize_mask_code(code: f64) -> bool {
    code == 1.0
}

fn find_dimension(dim_names: &[String], candidates: &[&str]) -> Option<usize> {
    dim_names
        .iter()
        .position(|name| candidates.iter().any(|c| name.eq_ignore_ascii_case(c)))
}

fn slice_index(dim_name: &str, config: &DataConfig) -> usize {
    let lower = dim_name.to_ascii_lowercase();
    if lower.starts_with("time") {
        config.time_index
    } else if lower.starts_with("depth") || lower.starts_with("lev") {
        config.depth_index
    } else {
        0
    }
}

/// Read a coordinate axis variable as f64
fn coordinate_axis(file: &netcdf::File, name: &str, path: &Path) -> Result<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| PelagosError::MissingInputDataset {
            path: path.display().to_string(),
            message: format!("Coordinate variable {} not found", name),
        })?;
    Ok(var.get_values::<f64, _>(&[] as &[netcdf::Extent])?)
}

/// Apply fill values and packing attributes in place
fn apply_packing(values: &mut Array2<f32>, var: &netcdf::Variable) {
    let fill = attr_number(var, "_FillValue").or_else(|| attr_number(var, "missing_value"));
    let scale = attr_number(var, "scale_factor");
    let offset = attr_number(var, "add_offset");

    for v in values.iter_mut() {
        if let Some(fill) = fill {
            if (*v as f64 - fill).abs() < 1e-6 * fill.abs().max(1.0) {
                *v = f32::NAN;
                continue;
            }
        }
        if let Some(scale) = scale {
            *v = (*v as f64 * scale) as f32;
        }
        if let Some(offset) = offset {
            *v = (*v as f64 + offset) as f32;
        }
    }
}

fn attr_number(var: &netcdf::Variable, name: &str) -> Option<f64> {
    use netcdf::AttributeValue;

    let value = var.attribute(name)?.value().ok()?;
    match value {
        AttributeValue::Uchar(v) => Some(v as f64),
        AttributeValue::Schar(v) => Some(v as f64),
        AttributeValue::Short(v) => Some(v as f64),
        AttributeValue::Int(v) => Some(v as f64),
        AttributeValue::Float(v) => Some(v as f64),
        AttributeValue::Double(v) => Some(v),
        _ => None,
    }
}

fn find_column(columns: &[&str], candidates: &[&str], path: &Path) -> Result<usize> {
    columns
        .iter()
        .position(|name| candidates.iter().any(|c| name.eq_ignore_ascii_case(c)))
        .ok_or_else(|| PelagosError::MissingInputDataset {
            path: path.display().to_string(),
            message: format!("Mask file is missing a {} column", candidates[0]),
        })
}

fn parse_field(field: &str, column: &str, line_no: usize, path: &Path) -> Result<f64> {
    field
        .parse::<f64>()
        .map_err(|_| PelagosError::MissingInputDataset {
            path: path.display().to_string(),
            message: format!(
                "Unparseable {} value {:?} on record {}",
                column,
                field,
                line_no + 2
            ),
        })
}

fn unique_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out.dedup();
    out
}

/// Create a small WOA-shaped NetCDF file for tests
#[cfg(test)]
pub fn create_test_sst_file(path: &Path) -> Result<()> {
    let mut file = netcdf::create(path)?;

    file.add_dimension("lat", 3)?;
    file.add_dimension("lon", 4)?;
    file.add_dimension("depth", 2)?;
    file.add_dimension("time", 2)?;

    {
        let mut lat_var = file.add_variable::<f64>("lat", &["lat"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_values(&[-10.0, 0.0, 10.0], &[..])?;
    }
    {
        let mut lon_var = file.add_variable::<f64>("lon", &["lon"])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_values(&[100.0, 110.0, 120.0, 130.0], &[..])?;
    }

    // time 0 / depth 0 holds a recognizable ramp, the rest is offset by 100
    // so slicing mistakes show up in assertions
    let mut data: Vec<f32> = Vec::with_capacity(2 * 2 * 3 * 4);
    for t in 0..2 {
        for d in 0..2 {
            for i in 0..12 {
                data.push(i as f32 + (t * 2 + d) as f32 * 100.0);
            }
        }
    }
    // One fill value at lat 0, lon 1 of the first slice
    data[1] = 9.96921e36;

    {
        let mut temp_var = file.add_variable::<f32>("t_mn", &["time", "depth", "lat", "lon"])?;
        temp_var.put_attribute("units", "degrees_celsius")?;
        temp_var.put_attribute("_FillValue", 9.96921e36f32)?;
        temp_var.put_values(&data, &[.., .., .., ..])?;
    }

    Ok(())
}
