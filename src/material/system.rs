use super::model::MaterialModel;

/// Cached handle to one writable scalar parameter of the material system
///
/// Resolved once by name; writing through a slot is O(1) and touches nothing
/// but the addressed scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSlot {
    index: usize,
}

/// The constitutive side of the model: the material and its parameter store
///
/// This is the collaborator the identification pipeline writes trial
/// parameters into and evaluates stresses through. Parameter names are the
/// model's field names ("mu", "kappa", "c1", "c2"); resolution failures are
/// validation errors, not panics.
#[derive(Debug, Clone)]
pub struct MaterialSystem {
    /// Material name from the model input
    pub name: String,
    pub model: MaterialModel,
}

impl MaterialSystem {
    pub fn new(name: &str, model: MaterialModel) -> Self {
        Self {
            name: name.to_string(),
            model,
        }
    }

    /// Resolve a parameter name to a writable scalar slot
    pub fn resolve(&self, name: &str) -> Option<ParamSlot> {
        self.model
            .param_names()
            .iter()
            .position(|&p| p == name)
            .map(|index| ParamSlot { index })
    }

    /// Read the scalar behind a slot
    pub fn read(&self, slot: ParamSlot) -> f64 {
        self.model.param(slot.index)
    }

    /// Write the scalar behind a slot
    pub fn write(&mut self, slot: ParamSlot, value: f64) {
        self.model.set_param(slot.index, value);
    }
}
