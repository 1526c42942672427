//! Input DTO for the identification task
//!
//! Reads the XML input file and provides raw, structured data for the problem
//! builder: model geometry, the material definition, identifiable parameters,
//! measured/virtual displacement histories, measured surface loads, and
//! solver options. Parsing keeps numeric triples as raw text; the loader
//! stage validates them and names the offending entry on failure.

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level XML input document
///
/// Root element `<vfm_input version="2.0">`; every section is optional at the
/// parse level and checked for presence by the problem builder.
#[derive(Debug, Clone, Deserialize)]
pub struct VfmInput {
    #[serde(rename = "@version")]
    pub version: String,

    #[serde(rename = "Mesh")]
    pub mesh: Option<MeshDto>,

    #[serde(rename = "Material")]
    pub material: Option<MaterialDto>,

    #[serde(rename = "Parameters")]
    pub parameters: Option<ParametersDto>,

    #[serde(rename = "MeasuredDisplacements")]
    pub measured_displacements: Option<DisplacementBlockDto>,

    #[serde(rename = "VirtualDisplacements")]
    pub virtual_displacements: Option<VirtualBlockDto>,

    #[serde(rename = "MeasuredLoads")]
    pub measured_loads: Option<LoadsBlockDto>,

    #[serde(rename = "Options")]
    pub options: Option<OptionsDto>,
}

/// Model geometry: nodes, element blocks, named surfaces
#[derive(Debug, Clone, Deserialize)]
pub struct MeshDto {
    #[serde(rename = "Nodes")]
    pub nodes: NodesDto,

    #[serde(rename = "Elements", default)]
    pub elements: Vec<ElementsDto>,

    #[serde(rename = "Surface", default)]
    pub surfaces: Vec<SurfaceDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodesDto {
    #[serde(rename = "node", default)]
    pub nodes: Vec<IdValueDto>,
}

/// One element block; all elements in a block share a kind
#[derive(Debug, Clone, Deserialize)]
pub struct ElementsDto {
    #[serde(rename = "@type")]
    pub kind: String,

    #[serde(rename = "@name")]
    pub name: Option<String>,

    #[serde(rename = "elem", default)]
    pub elems: Vec<IdValueDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceDto {
    #[serde(rename = "@name")]
    pub name: String,

    #[serde(rename = "node", default)]
    pub nodes: Vec<SurfaceNodeDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceNodeDto {
    #[serde(rename = "@id")]
    pub id: i32,
}

/// Material definition
///
/// The `type` attribute selects the model ("neo-Hookean" or "uncoupled
/// Mooney-Rivlin"); the scalar children carry the model constants.
#[derive(Debug, Clone, Deserialize)]
pub struct MaterialDto {
    #[serde(rename = "@type")]
    pub kind: String,

    #[serde(rename = "@name")]
    pub name: Option<String>,

    pub mu: Option<f64>,
    pub kappa: Option<f64>,
    pub lambda: Option<f64>,
    pub c1: Option<f64>,
    pub c2: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParametersDto {
    #[serde(rename = "param", default)]
    pub params: Vec<ParamDto>,
}

/// `<param name="mu">init, lo, hi, scale</param>` (scale optional)
#[derive(Debug, Clone, Deserialize)]
pub struct ParamDto {
    #[serde(rename = "@name")]
    pub name: String,

    #[serde(rename = "$text")]
    pub value: Option<String>,
}

/// A per-time block of nodal samples
#[derive(Debug, Clone, Deserialize)]
pub struct TimeNodesDto {
    #[serde(rename = "@t")]
    pub t: Option<f64>,

    #[serde(rename = "node", default)]
    pub nodes: Vec<IdValueDto>,

    /// Legacy spelling of the node entry
    #[serde(rename = "elem", default)]
    pub elems: Vec<IdValueDto>,
}

impl TimeNodesDto {
    /// All nodal samples of this block, current and legacy spellings
    pub fn samples(&self) -> impl Iterator<Item = &IdValueDto> {
        self.nodes.iter().chain(self.elems.iter())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplacementBlockDto {
    #[serde(rename = "time", default)]
    pub times: Vec<TimeNodesDto>,
}

/// `<VirtualDisplacements>` accepts either named `<virtualdisplacement>`
/// blocks or, in the legacy form, bare `<time>` blocks that make up a single
/// anonymous virtual field.
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualBlockDto {
    #[serde(rename = "virtualdisplacement", default)]
    pub fields: Vec<VirtualFieldDto>,

    #[serde(rename = "time", default)]
    pub times: Vec<TimeNodesDto>,
}

impl VirtualBlockDto {
    /// Virtual fields in declaration order, folding the legacy form into an
    /// anonymous trailing field
    pub fn all_fields(&self) -> Vec<VirtualFieldDto> {
        let mut fields = self.fields.clone();
        if !self.times.is_empty() {
            fields.push(VirtualFieldDto {
                id: None,
                times: self.times.clone(),
            });
        }
        fields
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VirtualFieldDto {
    #[serde(rename = "@id")]
    pub id: Option<i32>,

    #[serde(rename = "time", default)]
    pub times: Vec<TimeNodesDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadsBlockDto {
    #[serde(rename = "time", default)]
    pub times: Vec<TimeLoadsDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeLoadsDto {
    #[serde(rename = "@t")]
    pub t: Option<f64>,

    #[serde(rename = "surface", default)]
    pub surfaces: Vec<SurfaceValueDto>,
}

/// `<surface id="x+">Fx, Fy, Fz</surface>`
#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceValueDto {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "$text")]
    pub value: Option<String>,
}

/// An `id`-attributed entry whose text payload is a numeric tuple
#[derive(Debug, Clone, Deserialize)]
pub struct IdValueDto {
    #[serde(rename = "@id")]
    pub id: i32,

    #[serde(rename = "$text")]
    pub value: Option<String>,
}

/// Solver options section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionsDto {
    /// Solver selection: "levmar" or "constrained-levmar"
    #[serde(rename = "@type")]
    pub kind: Option<String>,

    pub tau: Option<f64>,
    pub grad_tol: Option<f64>,
    pub step_tol: Option<f64>,
    pub obj_tol: Option<f64>,
    pub diff_scale: Option<f64>,
    /// "forward" (default) or "central"
    pub diff_mode: Option<String>,
    pub max_iterations: Option<usize>,
    pub plane_deformation: Option<bool>,
    pub save_virtual_work: Option<String>,
}

impl VfmInput {
    /// Load and parse the XML input file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read input file: {}", e))?;
        Self::from_str(&contents)
    }

    /// Parse the XML input from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, String> {
        let input: VfmInput = quick_xml::de::from_str(contents)
            .map_err(|e| format!("Failed to parse input file: {}", e))?;

        if input.version != "2.0" {
            return Err(format!(
                "Invalid input version \"{}\". Expected 2.0.",
                input.version
            ));
        }
        Ok(input)
    }

    /// Print a one-screen ingestion summary
    pub fn print_summary(&self) {
        println!("Input sections:");
        if let Some(mesh) = &self.mesh {
            let n_elems: usize = mesh.elements.iter().map(|b| b.elems.len()).sum();
            println!(
                "  mesh      : {} nodes, {} elements, {} surfaces",
                mesh.nodes.nodes.len(),
                n_elems,
                mesh.surfaces.len()
            );
        }
        if let Some(mat) = &self.material {
            println!("  material  : {}", mat.kind);
        }
        println!(
            "  params    : {}",
            self.parameters.as_ref().map_or(0, |p| p.params.len())
        );
        println!(
            "  measuredU : {} time slices",
            self.measured_displacements.as_ref().map_or(0, |d| d.times.len())
        );
        println!(
            "  virtualU  : {} fields",
            self.virtual_displacements.as_ref().map_or(0, |v| v.all_fields().len())
        );
        println!(
            "  loads     : {} time slices",
            self.measured_loads.as_ref().map_or(0, |l| l.times.len())
        );
    }
}

/// Split a numeric tuple on commas and/or whitespace
fn split_numbers(text: &str) -> Result<Vec<f64>, String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| format!("Invalid number \"{}\".", s))
        })
        .collect()
}

/// Parse a 3-component vector from entry text
pub fn parse_vec3(text: Option<&str>) -> Result<[f64; 3], String> {
    let values = split_numbers(text.unwrap_or(""))?;
    if values.len() != 3 {
        return Err(format!("Expected 3 components, found {}.", values.len()));
    }
    Ok([values[0], values[1], values[2]])
}

/// Parse a parameter tuple `init, lo, hi[, scale]`; scale defaults to 1
pub fn parse_param_tuple(text: Option<&str>) -> Result<(f64, f64, f64, f64), String> {
    let values = split_numbers(text.unwrap_or(""))?;
    match values.len() {
        3 => Ok((values[0], values[1], values[2], 1.0)),
        4 => Ok((values[0], values[1], values[2], values[3])),
        n => Err(format!("Expected 3 or 4 components, found {}.", n)),
    }
}

/// Parse an element connectivity list of external node ids
pub fn parse_node_ids(text: Option<&str>) -> Result<Vec<i32>, String> {
    text.unwrap_or("")
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| format!("Invalid node id \"{}\".", s))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MINIMAL: &str = r#"
        <vfm_input version="2.0">
            <Parameters>
                <param name="mu">1.0, 0.1, 10.0, 1.0</param>
            </Parameters>
            <MeasuredDisplacements>
                <time t="0">
                    <node id="1">0.0, 0.0, 0.0</node>
                    <node id="2">0.1, 0.0, 0.0</node>
                </time>
            </MeasuredDisplacements>
            <VirtualDisplacements>
                <virtualdisplacement id="0">
                    <time t="0">
                        <node id="1">1.0, 0.0, 0.0</node>
                    </time>
                </virtualdisplacement>
            </VirtualDisplacements>
            <MeasuredLoads>
                <time t="0">
                    <surface id="x+">2.5, 0.0, 0.0</surface>
                </time>
            </MeasuredLoads>
            <Options type="constrained-levmar">
                <tau>1e-3</tau>
                <max_iterations>50</max_iterations>
                <plane_deformation>true</plane_deformation>
                <save_virtual_work>work.txt</save_virtual_work>
            </Options>
        </vfm_input>
    "#;

    #[test]
    fn test_parse_minimal_document() {
        let input = VfmInput::from_str(MINIMAL).unwrap();

        let params = input.parameters.as_ref().unwrap();
        assert_eq!(params.params.len(), 1);
        assert_eq!(params.params[0].name, "mu");

        let measured = input.measured_displacements.as_ref().unwrap();
        assert_eq!(measured.times.len(), 1);
        assert_eq!(measured.times[0].nodes.len(), 2);
        assert_relative_eq!(measured.times[0].t.unwrap(), 0.0, epsilon = 1e-15);

        let loads = input.measured_loads.as_ref().unwrap();
        assert_eq!(loads.times[0].surfaces[0].id, "x+");

        let options = input.options.as_ref().unwrap();
        assert_eq!(options.kind.as_deref(), Some("constrained-levmar"));
        assert_eq!(options.max_iterations, Some(50));
        assert_eq!(options.plane_deformation, Some(true));
        assert_eq!(options.save_virtual_work.as_deref(), Some("work.txt"));
    }

    #[test]
    fn test_version_check() {
        let doc = r#"<vfm_input version="1.0"></vfm_input>"#;
        let err = VfmInput::from_str(doc).unwrap_err();
        assert!(err.contains("version"));
    }

    #[test]
    fn test_legacy_virtual_block() {
        let doc = r#"
            <vfm_input version="2.0">
                <VirtualDisplacements>
                    <time t="0">
                        <node id="1">1.0, 0.0, 0.0</node>
                    </time>
                </VirtualDisplacements>
            </vfm_input>
        "#;
        let input = VfmInput::from_str(doc).unwrap();
        let fields = input.virtual_displacements.as_ref().unwrap().all_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].id, None);
        assert_eq!(fields[0].times.len(), 1);
    }

    #[test]
    fn test_mesh_section() {
        let doc = r#"
            <vfm_input version="2.0">
                <Mesh>
                    <Nodes>
                        <node id="1">0.0, 0.0, 0.0</node>
                        <node id="2">1.0, 0.0, 0.0</node>
                        <node id="3">0.0, 1.0, 0.0</node>
                        <node id="4">0.0, 0.0, 1.0</node>
                    </Nodes>
                    <Elements type="tet4">
                        <elem id="1">1, 2, 3, 4</elem>
                    </Elements>
                    <Surface name="base">
                        <node id="1"/>
                        <node id="2"/>
                        <node id="3"/>
                    </Surface>
                </Mesh>
                <Material type="neo-Hookean" name="rubber">
                    <mu>1.0</mu>
                    <kappa>1000.0</kappa>
                </Material>
            </vfm_input>
        "#;
        let input = VfmInput::from_str(doc).unwrap();
        let mesh = input.mesh.as_ref().unwrap();
        assert_eq!(mesh.nodes.nodes.len(), 4);
        assert_eq!(mesh.elements[0].kind, "tet4");
        assert_eq!(mesh.surfaces[0].name, "base");
        assert_eq!(mesh.surfaces[0].nodes.len(), 3);

        let mat = input.material.as_ref().unwrap();
        assert_eq!(mat.kind, "neo-Hookean");
        assert_relative_eq!(mat.kappa.unwrap(), 1000.0, epsilon = 1e-15);
    }

    #[test]
    fn test_parse_vec3() {
        assert_eq!(parse_vec3(Some("1.0, 2.0, 3.0")).unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(parse_vec3(Some("1 2 3")).unwrap(), [1.0, 2.0, 3.0]);
        assert!(parse_vec3(Some("1, 2")).is_err());
        assert!(parse_vec3(Some("a, b, c")).is_err());
        assert!(parse_vec3(None).is_err());
    }

    #[test]
    fn test_parse_param_tuple_scale_default() {
        let (init, lo, hi, scale) = parse_param_tuple(Some("1.0, 0.0, 2.0")).unwrap();
        assert_eq!((init, lo, hi, scale), (1.0, 0.0, 2.0, 1.0));

        let (.., scale) = parse_param_tuple(Some("1.0, 0.0, 2.0, 0.5")).unwrap();
        assert_eq!(scale, 0.5);

        assert!(parse_param_tuple(Some("1.0")).is_err());
    }

    #[test]
    fn test_parse_node_ids() {
        assert_eq!(
            parse_node_ids(Some("1, 2, 3, 4, 5, 6, 7, 8")).unwrap(),
            vec![1, 2, 3, 4, 5, 6, 7, 8]
        );
        assert!(parse_node_ids(Some("1, x")).is_err());
    }
}
