//! Formatted diagnostic tables and summaries
//!
//! All printers return strings; routing to a sink is the caller's business.

use nalgebra::{Matrix3, Vector3};

use crate::storage::{
    DeformationSeries, LoadSeries, MeasuredSeries, NodalField, RaggedTensorField, StressSeries,
    VirtualFieldSet,
};
use crate::vfm::params::Parameter;

/// Compact vector rendering
pub fn vec3_to_string(v: &Vector3<f64>) -> String {
    format!("({:.6e}, {:.6e}, {:.6e})", v.x, v.y, v.z)
}

/// Compact tensor rendering, row major
pub fn mat3_to_string(m: &Matrix3<f64>) -> String {
    format!(
        "[{:.6e} {:.6e} {:.6e}; {:.6e} {:.6e} {:.6e}; {:.6e} {:.6e} {:.6e}]",
        m[(0, 0)],
        m[(0, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        m[(1, 2)],
        m[(2, 0)],
        m[(2, 1)],
        m[(2, 2)]
    )
}

fn rule(name_width: usize, value_width: usize, columns: usize) -> String {
    let mut line = String::from("+");
    line.push_str(&"-".repeat(name_width));
    for _ in 0..columns {
        line.push('+');
        line.push_str(&"-".repeat(value_width));
    }
    line.push('+');
    line
}

fn centered(title: &str, inner: usize) -> String {
    let len = title.len().min(inner);
    let pad_left = (inner - len) / 2;
    let pad_right = inner - len - pad_left;
    format!(" {}{}{} ", "=".repeat(pad_left), title, "=".repeat(pad_right))
}

/// Boxed parameter table: name, current value, bounds
///
/// Layout mirrors the solver's startup report:
///
/// ```text
///  ====== title ======
/// +------+------+------+------+
/// |Name  | Value|   Min|   Max|
/// +------+------+------+------+
/// ```
pub fn parameter_table(params: &[Parameter], title: &str) -> String {
    let value_width = 14usize;
    let name_width = params
        .iter()
        .map(|p| p.spec.name.len())
        .chain(std::iter::once(4))
        .max()
        .unwrap();

    let inner = name_width + 3 * value_width + 3;
    let mut out = String::new();
    out.push_str(&centered(title, inner));
    out.push('\n');
    out.push_str(&rule(name_width, value_width, 3));
    out.push('\n');
    out.push_str(&format!(
        "|{:<name_width$}|{:>value_width$}|{:>value_width$}|{:>value_width$}|\n",
        "Name", "Value", "Min", "Max"
    ));
    out.push_str(&rule(name_width, value_width, 3));
    out.push('\n');
    for p in params {
        out.push_str(&format!(
            "|{:<name_width$}|{:>value_width$.6}|{:>value_width$.6}|{:>value_width$.6}|\n",
            p.spec.name, p.value, p.spec.lo, p.spec.hi
        ));
    }
    out.push_str(&rule(name_width, value_width, 3));
    out
}

fn max_norm(field: &NodalField) -> f64 {
    field.iter().map(|v| v.norm()).fold(0.0, f64::max)
}

/// Per-frame sample counts and peak magnitudes of the measured series
pub fn summary_measured(series: &MeasuredSeries) -> String {
    let mut out = format!("Measured displacements: {} frames\n", series.num_frames());
    for t in 0..series.num_frames() {
        out.push_str(&format!(
            "  [{:02}] nodes = {}  max|u| = {:.6e}\n",
            t,
            series.frame(t).u.len(),
            max_norm(&series.frame(t).u)
        ));
    }
    out
}

/// Per-field frame counts and peak magnitudes of the virtual fields
pub fn summary_virtuals(fields: &VirtualFieldSet) -> String {
    let mut out = format!("Virtual fields: {}\n", fields.num_fields());
    for v in 0..fields.num_fields() {
        out.push_str(&format!(
            "  [#{}] frames = {}\n",
            v,
            fields.num_frames(v)
        ));
        for t in 0..fields.num_frames(v) {
            out.push_str(&format!(
                "    [{:02}] max|u*| = {:.6e}\n",
                t,
                max_norm(&fields.frame(v, t).u)
            ));
        }
    }
    out
}

/// Per-frame surface resultants of the load series
pub fn summary_loads(loads: &LoadSeries) -> String {
    let mut out = format!("Measured loads: {} frames\n", loads.num_frames());
    for t in 0..loads.num_frames() {
        let frame = loads.frame(t);
        out.push_str(&format!(
            "  [{:02}] t = {:<10} surfaces = {}\n",
            t,
            frame.time,
            frame.loads.len()
        ));
        for load in &frame.loads {
            out.push_str(&format!(
                "    {:<12} : F = {}\n",
                load.surface,
                vec3_to_string(&load.force)
            ));
        }
    }
    out
}

fn det_range(field: &RaggedTensorField) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for e in 0..field.num_elements() {
        for m in field.element(e) {
            let d = m.determinant();
            lo = lo.min(d);
            hi = hi.max(d);
        }
    }
    if lo > hi {
        (0.0, 0.0)
    } else {
        (lo, hi)
    }
}

/// Per-frame det(F) ranges of a deformation series
pub fn summary_deformation(series: &DeformationSeries) -> String {
    let mut out = format!("Deformation gradients: {} frames\n", series.num_frames());
    for t in 0..series.num_frames() {
        let (lo, hi) = det_range(series.frame(t));
        out.push_str(&format!(
            "  [{:02}] det(F) in [{:.6e}, {:.6e}]\n",
            t, lo, hi
        ));
    }
    out
}

fn frobenius_max(field: &RaggedTensorField) -> f64 {
    let mut max = 0.0_f64;
    for e in 0..field.num_elements() {
        for m in field.element(e) {
            max = max.max(m.norm());
        }
    }
    max
}

/// Per-frame peak stress magnitudes
pub fn summary_stresses(series: &StressSeries) -> String {
    let mut out = format!("Stresses: {} frames\n", series.num_frames());
    for t in 0..series.num_frames() {
        let frame = series.frame(t);
        out.push_str(&format!(
            "  [{:02}] max|sigma| = {:.6e}  max|P| = {:.6e}\n",
            t,
            frobenius_max(&frame.sigma),
            frobenius_max(&frame.piola)
        ));
    }
    out
}

/// Side-by-side internal/external virtual-work table
pub fn virtual_work_table(internal: &[f64], external: &[f64], n_vf: usize) -> String {
    if n_vf == 0 || internal.len() != external.len() || internal.len() % n_vf != 0 {
        return String::from("Virtual work: <shape mismatch>\n");
    }
    let n_t = internal.len() / n_vf;
    let mut out = String::from("Virtual work (internal | external):\n");
    for v in 0..n_vf {
        out.push_str(&format!("  field #{}\n", v));
        for t in 0..n_t {
            out.push_str(&format!(
                "    [{:02}] {:>14.6e} | {:>14.6e}\n",
                t,
                internal[v * n_t + t],
                external[v * n_t + t]
            ));
        }
    }
    out
}

/// One-paragraph termination summary of a Levenberg-Marquardt run
pub fn levmar_summary(report: &crate::linalg::LevmarReport) -> String {
    let mut out = format!(
        "LM terminated: cost {:.6e} -> {:.6e}, |J^T e|_inf = {:.3e}, |dp| = {:.3e}, mu = {:.3e}\n",
        report.initial_cost, report.final_cost, report.grad_inf, report.step_norm, report.mu
    );
    out.push_str(&format!(
        "  iterations = {}, stop = {:?} (code {}), evals = {}, jacobians = {}, solves = {}",
        report.iterations,
        report.stop,
        report.stop as i32,
        report.n_fev,
        report.n_jac,
        report.n_solve
    ));
    out
}

/// Bounded dump of a nodal field
pub fn dump_nodes(field: &NodalField, max_items: usize) -> String {
    let mut out = String::new();
    for (i, v) in field.iter().enumerate().take(max_items) {
        out.push_str(&format!("  node {:>6} : {}\n", i, vec3_to_string(v)));
    }
    if field.len() > max_items {
        out.push_str(&format!("  ... {} more\n", field.len() - max_items));
    }
    out
}

/// Bounded dump of a ragged tensor field
pub fn dump_element_tensors(field: &RaggedTensorField, max_items: usize) -> String {
    let mut out = String::new();
    let mut written = 0usize;
    'outer: for e in 0..field.num_elements() {
        for (g, m) in field.element(e).iter().enumerate() {
            if written >= max_items {
                out.push_str(&format!(
                    "  ... {} more\n",
                    field.total_gauss_points() - written
                ));
                break 'outer;
            }
            out.push_str(&format!("  e{:>4} g{:>2} : {}\n", e, g, mat3_to_string(m)));
            written += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfm::params::{ParamSpec, Parameter};

    fn params() -> Vec<Parameter> {
        vec![
            Parameter::new(ParamSpec {
                name: "mu".into(),
                init: 1.0,
                lo: 0.1,
                hi: 10.0,
                scale: 1.0,
            }),
            Parameter::new(ParamSpec {
                name: "kappa".into(),
                init: 1000.0,
                lo: 100.0,
                hi: 5000.0,
                scale: 100.0,
            }),
        ]
    }

    #[test]
    fn test_parameter_table_layout() {
        let table = parameter_table(&params(), "Parameters");
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].contains("Parameters"));
        assert!(lines[1].starts_with("+-"));
        assert!(lines[2].contains("|Name"));
        assert!(table.contains("mu"));
        assert!(table.contains("kappa"));
        // Header rule, header, rule, two rows, closing rule
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_measured_summary_counts() {
        let mut series = MeasuredSeries::new(3);
        series.add_frame();
        series.add_frame();
        let text = summary_measured(&series);
        assert!(text.contains("2 frames"));
        assert!(text.contains("[01]"));
    }

    #[test]
    fn test_virtual_work_table_shape_guard() {
        let text = virtual_work_table(&[1.0, 2.0], &[1.0], 1);
        assert!(text.contains("shape mismatch"));

        let text = virtual_work_table(&[1.0, 2.0], &[3.0, 4.0], 2);
        assert!(text.contains("field #1"));
    }

    #[test]
    fn test_dump_nodes_truncates() {
        let field = NodalField::zeros(5);
        let text = dump_nodes(&field, 2);
        assert!(text.contains("... 3 more"));
    }

    #[test]
    fn test_det_range_of_identity() {
        let mut field = RaggedTensorField::from_shape(&[2]);
        field.fill(Matrix3::identity());
        let (lo, hi) = det_range(&field);
        assert_eq!((lo, hi), (1.0, 1.0));
    }
}
