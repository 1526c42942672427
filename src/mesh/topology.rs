use crate::fem::GaussQuadrature;

/// Supported solid element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// 8-node trilinear hexahedron
    Hex8,
    /// 20-node serendipity hexahedron
    Hex20,
    /// 4-node linear tetrahedron
    Tet4,
    /// 10-node quadratic tetrahedron
    Tet10,
}

impl ElementKind {
    /// Number of nodes for this element kind
    pub fn num_nodes(&self) -> usize {
        match self {
            ElementKind::Hex8 => 8,
            ElementKind::Hex20 => 20,
            ElementKind::Tet4 => 4,
            ElementKind::Tet10 => 10,
        }
    }

    /// Default quadrature rule for this element kind
    pub fn quadrature(&self) -> GaussQuadrature {
        match self {
            ElementKind::Hex8 => GaussQuadrature::hex_8point(),
            ElementKind::Hex20 => GaussQuadrature::hex_27point(),
            ElementKind::Tet4 => GaussQuadrature::tet_4point(),
            ElementKind::Tet10 => GaussQuadrature::tet_4point(),
        }
    }

    /// Number of integration points of the default rule
    pub fn num_gauss_points(&self) -> usize {
        match self {
            ElementKind::Hex8 => 8,
            ElementKind::Hex20 => 27,
            ElementKind::Tet4 => 4,
            ElementKind::Tet10 => 4,
        }
    }

    /// Parse the input-file `type` attribute
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "hex8" => Some(ElementKind::Hex8),
            "hex20" => Some(ElementKind::Hex20),
            "tet4" => Some(ElementKind::Tet4),
            "tet10" => Some(ElementKind::Tet10),
            _ => None,
        }
    }
}

/// A solid element with its external identifier and node connectivity
///
/// Node entries are dense indices into the mesh geometry; the external id is
/// the opaque integer the surrounding ecosystem uses to refer to the element.
#[derive(Debug, Clone)]
pub struct SolidElement {
    /// External element identifier
    pub id: i32,
    /// Element kind
    pub kind: ElementKind,
    /// Dense node indices, in the kind's canonical ordering
    pub nodes: Vec<usize>,
}

impl SolidElement {
    pub fn new(id: i32, kind: ElementKind, nodes: Vec<usize>) -> Self {
        assert_eq!(
            nodes.len(),
            kind.num_nodes(),
            "node count does not match element kind"
        );
        Self { id, kind, nodes }
    }
}

/// Classification of a mesh domain
///
/// The identification pipeline only operates on solid domains; anything else
/// present in a model is rejected at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainClass {
    Solid,
    Shell,
}

/// A named group of elements sharing a class
#[derive(Debug, Clone)]
pub struct Domain {
    pub name: String,
    pub class: DomainClass,
    /// Element indices (into the connectivity) belonging to this domain
    pub elements: Vec<usize>,
}

/// Connectivity information for the mesh
#[derive(Debug, Clone, Default)]
pub struct Connectivity {
    pub elements: Vec<SolidElement>,
    pub domains: Vec<Domain>,
}

impl Connectivity {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            domains: Vec::new(),
        }
    }

    pub fn add_element(&mut self, element: SolidElement) -> usize {
        let idx = self.elements.len();
        self.elements.push(element);
        idx
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Register a domain over a set of element indices
    pub fn add_domain(&mut self, name: &str, class: DomainClass, elements: Vec<usize>) {
        self.domains.push(Domain {
            name: name.to_string(),
            class,
            elements,
        });
    }

    /// Total number of integration points across all elements
    pub fn total_gauss_points(&self) -> usize {
        self.elements.iter().map(|e| e.kind.num_gauss_points()).sum()
    }
}
