use crate::material::{MaterialSystem, ParamSlot};

/// Metadata for one identifiable scalar parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Name resolved against the material system
    pub name: String,
    /// Starting value for the optimization
    pub init: f64,
    /// Lower bound
    pub lo: f64,
    /// Upper bound
    pub hi: f64,
    /// Sensitivity scale; consumed as the finite-difference step scale
    pub scale: f64,
}

/// One optimization parameter: its spec plus the current physical value
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub spec: ParamSpec,
    /// Current value mirrored from the material backing store
    pub value: f64,
}

impl Parameter {
    pub fn new(spec: ParamSpec) -> Self {
        let value = spec.init;
        Self { spec, value }
    }
}

/// Writes trial parameter vectors into the material backing store
///
/// Parameter names are resolved to writable slots exactly once, at
/// construction; `apply` then performs slot writes only. Resolution misses
/// surface as validation failures at construction time.
#[derive(Debug, Clone)]
pub struct ParameterApplier {
    slots: Vec<ParamSlot>,
}

impl ParameterApplier {
    /// Resolve every parameter name against the material system
    pub fn resolve(system: &MaterialSystem, params: &[Parameter]) -> Result<Self, String> {
        let mut slots = Vec::with_capacity(params.len());
        for p in params {
            let slot = system.resolve(&p.spec.name).ok_or_else(|| {
                format!(
                    "Cannot find parameter \"{}\" in material \"{}\" ({}).",
                    p.spec.name,
                    system.name,
                    system.model.name()
                )
            })?;
            slots.push(slot);
        }
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Write θ into the material store and mirror it into the records
    ///
    /// The vector length must match the resolved parameter count; on a
    /// mismatch nothing is written.
    pub fn apply(
        &self,
        values: &[f64],
        system: &mut MaterialSystem,
        params: &mut [Parameter],
    ) -> Result<(), String> {
        if values.len() != self.slots.len() || params.len() != self.slots.len() {
            return Err(format!(
                "Parameter vector length mismatch: {} values for {} parameters.",
                values.len(),
                self.slots.len()
            ));
        }

        for (i, &slot) in self.slots.iter().enumerate() {
            system.write(slot, values[i]);
            params[i].value = values[i];
        }
        Ok(())
    }

    /// Read the current parameter vector back from the material store
    pub fn current(&self, system: &MaterialSystem) -> Vec<f64> {
        self.slots.iter().map(|&s| system.read(s)).collect()
    }
}
