//! Dilution to a target concentration.

use super::{Action, ActionKind, require_components};
use crate::component::Source;
use crate::error::Result;
use crate::quantity::{Concentration, Volume};

/// Dilute every component to the same target concentration:
/// `each_volume = mix_volume * target / source`.
///
/// The enclosing mix must have a fixed total volume; without one the volumes
/// are undefined and validation reports it.
#[derive(Debug, Clone)]
pub struct FixedConcentration {
    components: Vec<Source>,
    fixed_concentration: Concentration,
}

impl FixedConcentration {
    /// Create a dilution action.
    pub fn new<S: Into<Source>>(
        components: impl IntoIterator<Item = S>,
        fixed_concentration: Concentration,
    ) -> Result<Self> {
        let components: Vec<Source> = components.into_iter().map(Into::into).collect();
        require_components(ActionKind::FixedConcentration, &components)?;
        Ok(Self {
            components,
            fixed_concentration,
        })
    }

    /// Target concentration in the destination.
    pub fn fixed_concentration(&self) -> Concentration {
        self.fixed_concentration
    }
}

/// Destination concentrations are the target exactly whenever the volume is
/// computable, so decimal rounding in the division does not leak back out.
pub(super) fn target_dests(
    target: Concentration,
    mix_volume: Volume,
    sources: &[Concentration],
    volumes: &[Volume],
) -> Vec<Concentration> {
    sources
        .iter()
        .zip(volumes)
        .map(|(&source, &volume)| {
            if mix_volume.is_defined() && source.is_defined() && !source.is_zero() {
                target
            } else {
                source * (volume / mix_volume)
            }
        })
        .collect()
}

impl Action for FixedConcentration {
    fn kind(&self) -> ActionKind {
        ActionKind::FixedConcentration
    }

    fn components(&self) -> &[Source] {
        &self.components
    }

    fn components_mut(&mut self) -> &mut [Source] {
        &mut self.components
    }

    fn each_volumes(&self, mix_volume: Volume, _siblings: &[Box<dyn Action>]) -> Result<Vec<Volume>> {
        Ok(self
            .source_concentrations()?
            .into_iter()
            .map(|source| mix_volume * (self.fixed_concentration / source))
            .collect())
    }

    fn dest_concentrations(
        &self,
        mix_volume: Volume,
        siblings: &[Box<dyn Action>],
    ) -> Result<Vec<Concentration>> {
        let volumes = self.each_volumes(mix_volume, siblings)?;
        let sources = self.source_concentrations()?;
        Ok(target_dests(self.fixed_concentration, mix_volume, &sources, &volumes))
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;

    #[test]
    fn dilution_round_trips_target() {
        let stock = Component::new("s").with_concentration(Concentration::nanomolar(100));
        let action = FixedConcentration::new([stock], Concentration::nanomolar(50)).unwrap();
        let mv = Volume::microliters(10);
        assert_eq!(action.each_volumes(mv, &[]).unwrap(), vec![Volume::microliters(5)]);
        assert_eq!(
            action.dest_concentrations(mv, &[]).unwrap(),
            vec![Concentration::nanomolar(50)]
        );
    }

    #[test]
    fn undefined_mix_volume_propagates() {
        let stock = Component::new("s").with_concentration(Concentration::nanomolar(100));
        let action = FixedConcentration::new([stock], Concentration::nanomolar(50)).unwrap();
        let volumes = action.each_volumes(Volume::undefined(), &[]).unwrap();
        assert!(volumes[0].is_undefined());
        assert!(action.dest_concentrations(Volume::undefined(), &[]).unwrap()[0].is_undefined());
    }

    #[test]
    fn unknown_stock_concentration_gives_undefined_volume() {
        let action = FixedConcentration::new([Component::new("s")], Concentration::nanomolar(50)).unwrap();
        assert!(action.each_volumes(Volume::microliters(10), &[]).unwrap()[0].is_undefined());
    }
}
