//! Top-up to a target total volume.

use super::{Action, ActionKind, other_volumes};
use crate::component::Source;
use crate::error::{MixError, Result};
use crate::quantity::Volume;

/// Fill the mix to a target total volume with a single component.
///
/// The transfer is `target - (sum of every other action's volume)`. Without an
/// explicit target the mix's own total volume is used.
#[derive(Debug, Clone)]
pub struct FillToVolume {
    components: Vec<Source>,
    target_total_volume: Volume,
}

impl FillToVolume {
    /// Fill to the enclosing mix's total volume.
    pub fn new(component: impl Into<Source>) -> Self {
        Self {
            components: vec![component.into()],
            target_total_volume: Volume::undefined(),
        }
    }

    /// Create from a component list, which must hold exactly one component.
    pub fn from_components<S: Into<Source>>(components: impl IntoIterator<Item = S>) -> Result<Self> {
        let mut components: Vec<Source> = components.into_iter().map(Into::into).collect();
        match components.len() {
            1 => Ok(Self::new(components.remove(0))),
            0 => Err(MixError::NoComponents {
                action: ActionKind::FillToVolume.id(),
            }),
            n => Err(MixError::MultiComponentFill(n)),
        }
    }

    /// Fill to an explicit total instead of the mix volume (builder pattern).
    pub fn with_target(mut self, target_total_volume: Volume) -> Self {
        self.target_total_volume = target_total_volume;
        self
    }

    /// Explicit target total volume; undefined when filling to the mix volume.
    pub fn target_total_volume(&self) -> Volume {
        self.target_total_volume
    }
}

/// Explicit target if set, otherwise the mix volume.
pub(super) fn fill_target(target: Volume, mix_volume: Volume) -> Volume {
    if target.is_defined() { target } else { mix_volume }
}

impl Action for FillToVolume {
    fn kind(&self) -> ActionKind {
        ActionKind::FillToVolume
    }

    fn components(&self) -> &[Source] {
        &self.components
    }

    fn components_mut(&mut self) -> &mut [Source] {
        &mut self.components
    }

    fn each_volumes(&self, mix_volume: Volume, siblings: &[Box<dyn Action>]) -> Result<Vec<Volume>> {
        let target = fill_target(self.target_total_volume, mix_volume);
        let others = other_volumes(self, mix_volume, siblings)?;
        Ok(vec![target - others])
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}
