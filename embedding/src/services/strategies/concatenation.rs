use super::{FusionInput, FusionStrategy, StrategyContext, CONCATENATION};
use crate::error::{FusionError, Result};

/// Joins vectors end to end in registry priority order.
///
/// With `pad_missing` every registered modality occupies its slot, absent ones
/// as zeros, so the output dimension is the registry total for every request.
/// Without it only present modalities are emitted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Concatenation;

impl FusionStrategy for Concatenation {
    fn tag(&self) -> &str {
        CONCATENATION
    }

    fn fuse(&self, inputs: &[FusionInput<'_>], ctx: &StrategyContext<'_>) -> Result<Vec<f32>> {
        for input in inputs {
            if !ctx.modalities.iter().any(|m| m.modality == input.modality) {
                return Err(FusionError::validation(format!(
                    "modality {} is not registered",
                    input.modality
                )));
            }
        }

        let capacity: usize = ctx.modalities.iter().map(|m| m.dimension).sum();
        let mut result = Vec::with_capacity(capacity);

        for slot in ctx.modalities {
            match inputs.iter().find(|i| i.modality == slot.modality) {
                Some(input) => {
                    if input.vector.len() != slot.dimension {
                        return Err(FusionError::dimension_mismatch(
                            format!("{} ({})", CONCATENATION, slot.modality),
                            slot.dimension,
                            input.vector.len(),
                        ));
                    }
                    result.extend_from_slice(input.vector);
                }
                None if ctx.pad_missing => {
                    result.resize(result.len() + slot.dimension, 0.0);
                }
                None => {}
            }
        }

        Ok(result)
    }
}
