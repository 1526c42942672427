//! Virtual-work table artifact
//!
//! A plain-text CSV with one row per time frame:
//!
//! ```text
//! #Step, IVW1, ..., IVW_nVF, EVW1, ..., EVW_nVF
//! ```
//!
//! Values are written in scientific notation with 6 significant digits.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the internal/external virtual-work table
///
/// `internal` and `external` are the flattened v·T + t vectors; both must
/// carry `n_vf` fields over the same frame count.
pub fn write_csv<P: AsRef<Path>>(
    path: P,
    internal: &[f64],
    external: &[f64],
    n_vf: usize,
) -> Result<(), String> {
    if n_vf == 0 {
        return Err("Virtual-work table requires at least one virtual field.".to_string());
    }
    if internal.len() != external.len() || internal.len() % n_vf != 0 {
        return Err(format!(
            "Virtual-work table shape mismatch: {} internal and {} external entries for {} fields.",
            internal.len(),
            external.len(),
            n_vf
        ));
    }
    let n_t = internal.len() / n_vf;

    let file = File::create(&path)
        .map_err(|e| format!("Unable to create {}: {}", path.as_ref().display(), e))?;
    let mut writer = BufWriter::new(file);

    let mut header = String::from("#Step");
    for v in 1..=n_vf {
        header.push_str(&format!(", IVW{}", v));
    }
    for v in 1..=n_vf {
        header.push_str(&format!(", EVW{}", v));
    }
    writeln!(writer, "{}", header).map_err(|e| format!("Write failed: {}", e))?;

    for t in 0..n_t {
        let mut row = format!("{}", t);
        for v in 0..n_vf {
            row.push_str(&format!(", {:.5e}", internal[v * n_t + t]));
        }
        for v in 0..n_vf {
            row.push_str(&format!(", {:.5e}", external[v * n_t + t]));
        }
        writeln!(writer, "{}", row).map_err(|e| format!("Write failed: {}", e))?;
    }

    writer.flush().map_err(|e| format!("Write failed: {}", e))
}
