//! Space-delimited result files.
//!
//! One row per sweep point: `weight runtime memory... knobs...`, with the
//! memory flattened to one (classical) or four (quantum) values.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EstimatorError, Result};
use crate::nns::Memory;
use crate::sweep::{SweepCurve, SweepPoint};
use crate::variants::Algorithm;

pub const DELIMITER: char = ' ';

/// File name of a sweep result, e.g. `RPC_w100_i20_p1e-7.csv`.
pub fn results_file_name(algorithm: Algorithm, range_weights: usize, iters: usize, prec: f64) -> String {
    format!("{}_w{}_i{}_p{:e}.csv", algorithm.name(), range_weights, iters, prec)
}

fn format_row(values: &[f64]) -> String {
    let mut line = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            line.push(DELIMITER);
        }
        // `{}` on f64 is the shortest representation that parses back exactly
        line.push_str(&v.to_string());
    }
    line
}

fn point_row(point: &SweepPoint) -> Vec<f64> {
    let mut row = vec![point.weight, point.runtime];
    row.extend(point.memory.to_row());
    row.extend(&point.knobs);
    row
}

/// Writes `rows` to `dir/file_name`, creating `dir` if needed.
pub fn write_rows(dir: &Path, file_name: &str, rows: &[Vec<f64>]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let mut text = String::new();
    for row in rows {
        text.push_str(&format_row(row));
        text.push('\n');
    }
    fs::write(&path, text)?;
    Ok(path)
}

/// Writes a sweep curve under its standard file name.
pub fn write_results(dir: &Path, curve: &SweepCurve, range_weights: usize, iters: usize, prec: f64) -> Result<PathBuf> {
    let rows: Vec<Vec<f64>> = curve.points.iter().map(point_row).collect();
    write_rows(dir, &results_file_name(curve.algorithm, range_weights, iters, prec), &rows)
}

/// Reads every row of a result file as floats.
pub fn read_results(path: &Path) -> Result<Vec<Vec<f64>>> {
    let text = fs::read_to_string(path)?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.split(DELIMITER)
                .filter(|field| !field.is_empty())
                .map(|field| {
                    field.parse::<f64>().map_err(|e| EstimatorError::Parse {
                        line: i + 1,
                        message: format!("{field:?}: {e}"),
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect()
}

/// Reads a result file back into a curve, using the shape of `algorithm`.
pub fn read_curve(path: &Path, algorithm: Algorithm) -> Result<SweepCurve> {
    let memory_arity = algorithm.memory_arity();
    let width = 2 + memory_arity + algorithm.knob_arity();

    let points = read_results(path)?
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() != width {
                return Err(EstimatorError::Parse {
                    line: i + 1,
                    message: format!("expected {width} values for {algorithm}, got {}", row.len()),
                });
            }
            let memory_end = 2 + memory_arity;
            let memory = Memory::from_row(&row[2..memory_end]).ok_or_else(|| EstimatorError::Parse {
                line: i + 1,
                message: format!("memory of arity {memory_arity}"),
            })?;
            Ok(SweepPoint {
                weight: row[0],
                runtime: row[1],
                memory,
                knobs: row[memory_end..].to_vec(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SweepCurve { algorithm, points })
}

/// Writes `label x y` rows for an external plotting tool.
pub fn write_series(dir: &Path, file_name: &str, series: &[(&str, Vec<(f64, f64)>)]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let mut text = String::new();
    for (label, points) in series {
        // labels contain spaces, quote them
        for (x, y) in points {
            text.push_str(&format!("\"{label}\"{DELIMITER}{x}{DELIMITER}{y}\n"));
        }
    }
    fs::write(&path, text)?;
    Ok(path)
}
