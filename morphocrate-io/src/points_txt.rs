//! Whitespace-delimited point text files
//!
//! Control points come as one row per point with at least three columns;
//! only the first three (x, y, z) are used. Mapped points are written back
//! with 18 fractional digits in scientific notation, e.g.
//! `1.500000000000000000e+00 0.000000000000000000e+00 -2.000000000000000000e-03`.

use crate::write_atomically;
use morphocrate_core::{Error, Point3d, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read control points from a whitespace-delimited text file.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn read_control_points<P: AsRef<Path>>(path: P) -> Result<Vec<Point3d>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut points = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let values = content
            .split_whitespace()
            .take(3)
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    Error::InvalidData(format!("line {}: invalid number '{}'", line_no + 1, token))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if values.len() < 3 {
            return Err(Error::InvalidData(format!(
                "line {}: expected at least 3 columns, found {}",
                line_no + 1,
                values.len()
            )));
        }
        points.push(Point3d::new(values[0], values[1], values[2]));
    }

    Ok(points)
}

/// Write one point per row, space separated
pub fn write_points_txt<P: AsRef<Path>>(points: &[Point3d], path: P) -> Result<()> {
    let mut out = String::with_capacity(points.len() * 75);
    for p in points {
        out.push_str(&format_scientific(p.x));
        out.push(' ');
        out.push_str(&format_scientific(p.y));
        out.push(' ');
        out.push_str(&format_scientific(p.z));
        out.push('\n');
    }
    write_atomically(path.as_ref(), out.as_bytes())
}

/// `%.18e` formatting: signed exponent with at least two digits
fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let formatted = format!("{:.18e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}
