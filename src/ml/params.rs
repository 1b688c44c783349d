use burn::{
    module::{Module, ModuleVisitor, ParamId},
    prelude::*,
};

/// One float parameter tensor of a module
#[derive(Debug, Clone, PartialEq)]
pub struct ParamEntry {
    pub id:     ParamId,
    pub shape:  Vec<usize>,
    pub values: Vec<f32>,
}

impl ParamEntry {
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Snapshot of every float parameter of a module, in visit order
/// (fc1.weight, fc1.bias, fc2.weight, ... for the Mlp).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamInventory {
    pub entries: Vec<ParamEntry>,
}

impl ParamInventory {
    /// Read all parameters of `module` back to the host.
    pub fn collect<B: Backend, M: Module<B>>(module: &M) -> Self {
        let mut inventory = Self::default();
        module.visit(&mut inventory);
        inventory
    }

    /// Number of parameter tensors
    pub fn tensor_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of scalar parameters
    pub fn scalar_count(&self) -> usize {
        self.entries.iter().map(ParamEntry::numel).sum()
    }

    /// True when both inventories hold bit-identical values
    pub fn same_values(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| {
                    a.shape == b.shape
                        && a.values.len() == b.values.len()
                        && a.values.iter().zip(&b.values).all(|(x, y)| x.to_bits() == y.to_bits())
                })
    }
}

impl<B: Backend> ModuleVisitor<B> for ParamInventory {
    fn visit_float<const D: usize>(&mut self, id: ParamId, tensor: &Tensor<B, D>) {
        let values = tensor
            .clone()
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .unwrap_or_default();

        self.entries.push(ParamEntry {
            id,
            shape: tensor.dims().to_vec(),
            values,
        });
    }
}
