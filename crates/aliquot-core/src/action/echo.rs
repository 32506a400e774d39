//! Acoustic (droplet-based) dispenser actions.
//!
//! Every volume these actions produce is an integer multiple of the
//! dispenser's droplet volume. Computed volumes are rounded to the nearest
//! droplet, ties to even; caller-given fixed volumes must already be whole
//! droplets and are checked at construction.

use super::fill::fill_target;
use super::fixed_volume::equal_concentration_volumes;
use super::{
    Action, ActionKind, EqualConcMethod, check_droplet_multiple, check_droplet_volume,
    default_droplet_volume, other_volumes, require_components,
};
use crate::component::Source;
use crate::error::{MixError, Result};
use crate::quantity::{Concentration, Volume};

const ECHO_NOTE: &str = "ECHO";

fn collect_sources<S: Into<Source>>(
    kind: ActionKind,
    components: impl IntoIterator<Item = S>,
) -> Result<Vec<Source>> {
    let components: Vec<Source> = components.into_iter().map(Into::into).collect();
    require_components(kind, &components)?;
    Ok(components)
}

/// Acoustic transfer of the same whole-droplet volume of every component.
#[derive(Debug, Clone)]
pub struct EchoFixedVolume {
    components: Vec<Source>,
    fixed_volume: Volume,
    droplet_volume: Volume,
    set_name: Option<String>,
}

impl EchoFixedVolume {
    /// Create with the default droplet volume.
    ///
    /// Fails if `fixed_volume` is not a whole number of droplets.
    pub fn new<S: Into<Source>>(
        components: impl IntoIterator<Item = S>,
        fixed_volume: Volume,
    ) -> Result<Self> {
        Self::new_with_droplet(components, fixed_volume, default_droplet_volume())
    }

    /// Create with an explicit droplet volume.
    pub fn new_with_droplet<S: Into<Source>>(
        components: impl IntoIterator<Item = S>,
        fixed_volume: Volume,
        droplet_volume: Volume,
    ) -> Result<Self> {
        let components = collect_sources(ActionKind::EchoFixedVolume, components)?;
        check_droplet_volume(droplet_volume)?;
        check_droplet_multiple(fixed_volume, droplet_volume)?;
        Ok(Self {
            components,
            fixed_volume,
            droplet_volume,
            set_name: None,
        })
    }

    /// Use a different droplet volume, re-checking the fixed volume.
    pub fn with_droplet_volume(mut self, droplet_volume: Volume) -> Result<Self> {
        check_droplet_volume(droplet_volume)?;
        check_droplet_multiple(self.fixed_volume, droplet_volume)?;
        self.droplet_volume = droplet_volume;
        Ok(self)
    }

    /// Name the component set in recipe output (builder pattern).
    pub fn with_set_name(mut self, name: impl Into<String>) -> Self {
        self.set_name = Some(name.into());
        self
    }
}

impl Action for EchoFixedVolume {
    fn kind(&self) -> ActionKind {
        ActionKind::EchoFixedVolume
    }

    fn components(&self) -> &[Source] {
        &self.components
    }

    fn components_mut(&mut self) -> &mut [Source] {
        &mut self.components
    }

    fn each_volumes(&self, _mix_volume: Volume, _siblings: &[Box<dyn Action>]) -> Result<Vec<Volume>> {
        Ok(vec![self.fixed_volume; self.components.len()])
    }

    fn set_name(&self) -> Option<&str> {
        self.set_name.as_deref()
    }

    fn note(&self) -> Option<String> {
        Some(ECHO_NOTE.to_string())
    }

    fn droplet_volume(&self) -> Option<Volume> {
        Some(self.droplet_volume)
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

/// Acoustic equal-concentration transfer.
///
/// The fixed volume is scaled per component as for
/// [`EqualConcentration`](super::EqualConcentration), then rounded to whole
/// droplets, so destination concentrations are equal only up to one droplet.
/// `max_fill` behaves as `max_volume`; no top-up line is emitted.
#[derive(Debug, Clone)]
pub struct EchoEqualTargetConcentration {
    components: Vec<Source>,
    fixed_volume: Volume,
    method: EqualConcMethod,
    droplet_volume: Volume,
    set_name: Option<String>,
}

impl EchoEqualTargetConcentration {
    /// Create with the default droplet volume.
    ///
    /// Fails if `fixed_volume` is not a whole number of droplets.
    pub fn new<S: Into<Source>>(
        components: impl IntoIterator<Item = S>,
        fixed_volume: Volume,
        method: EqualConcMethod,
    ) -> Result<Self> {
        Self::new_with_droplet(components, fixed_volume, method, default_droplet_volume())
    }

    /// Create with an explicit droplet volume.
    pub fn new_with_droplet<S: Into<Source>>(
        components: impl IntoIterator<Item = S>,
        fixed_volume: Volume,
        method: EqualConcMethod,
        droplet_volume: Volume,
    ) -> Result<Self> {
        let components = collect_sources(ActionKind::EchoEqualTargetConcentration, components)?;
        check_droplet_volume(droplet_volume)?;
        check_droplet_multiple(fixed_volume, droplet_volume)?;
        Ok(Self {
            components,
            fixed_volume,
            method,
            droplet_volume,
            set_name: None,
        })
    }

    /// Use a different droplet volume, re-checking the fixed volume.
    pub fn with_droplet_volume(mut self, droplet_volume: Volume) -> Result<Self> {
        check_droplet_volume(droplet_volume)?;
        check_droplet_multiple(self.fixed_volume, droplet_volume)?;
        self.droplet_volume = droplet_volume;
        Ok(self)
    }

    /// Name the component set in recipe output (builder pattern).
    pub fn with_set_name(mut self, name: impl Into<String>) -> Self {
        self.set_name = Some(name.into());
        self
    }
}

impl Action for EchoEqualTargetConcentration {
    fn kind(&self) -> ActionKind {
        ActionKind::EchoEqualTargetConcentration
    }

    fn components(&self) -> &[Source] {
        &self.components
    }

    fn components_mut(&mut self) -> &mut [Source] {
        &mut self.components
    }

    fn each_volumes(&self, _mix_volume: Volume, _siblings: &[Box<dyn Action>]) -> Result<Vec<Volume>> {
        let sources = self.source_concentrations()?;
        let volumes =
            equal_concentration_volumes(self.fixed_volume, &self.method, &self.components, &sources)?;
        if self.method == EqualConcMethod::Check {
            return Ok(volumes);
        }
        Ok(volumes
            .into_iter()
            .map(|v| v.round_to_multiple(self.droplet_volume))
            .collect())
    }

    fn set_name(&self) -> Option<&str> {
        self.set_name.as_deref()
    }

    fn note(&self) -> Option<String> {
        Some(ECHO_NOTE.to_string())
    }

    fn droplet_volume(&self) -> Option<Volume> {
        Some(self.droplet_volume)
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

/// Acoustic dilution: get as close to a target concentration as whole
/// droplets allow.
#[derive(Debug, Clone)]
pub struct EchoTargetConcentration {
    components: Vec<Source>,
    target_concentration: Concentration,
    droplet_volume: Volume,
}

impl EchoTargetConcentration {
    /// Create with the default droplet volume.
    pub fn new<S: Into<Source>>(
        components: impl IntoIterator<Item = S>,
        target_concentration: Concentration,
    ) -> Result<Self> {
        Ok(Self {
            components: collect_sources(ActionKind::EchoTargetConcentration, components)?,
            target_concentration,
            droplet_volume: default_droplet_volume(),
        })
    }

    /// Use a different droplet volume.
    pub fn with_droplet_volume(mut self, droplet_volume: Volume) -> Result<Self> {
        check_droplet_volume(droplet_volume)?;
        self.droplet_volume = droplet_volume;
        Ok(self)
    }

    /// The concentration aimed for.
    pub fn target_concentration(&self) -> Concentration {
        self.target_concentration
    }
}

impl Action for EchoTargetConcentration {
    fn kind(&self) -> ActionKind {
        ActionKind::EchoTargetConcentration
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
            .map(|source| {
                (mix_volume * (self.target_concentration / source))
                    .round_to_multiple(self.droplet_volume)
            })
            .collect())
    }

    fn note(&self) -> Option<String> {
        Some(format!("{ECHO_NOTE}, target {}", self.target_concentration))
    }

    fn droplet_volume(&self) -> Option<Volume> {
        Some(self.droplet_volume)
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

/// Acoustic top-up to a target total volume, rounded to whole droplets.
#[derive(Debug, Clone)]
pub struct EchoFillToVolume {
    components: Vec<Source>,
    target_total_volume: Volume,
    droplet_volume: Volume,
}

impl EchoFillToVolume {
    /// Fill to the enclosing mix's total volume with the default droplet volume.
    pub fn new(component: impl Into<Source>) -> Self {
        Self {
            components: vec![component.into()],
            target_total_volume: Volume::undefined(),
            droplet_volume: default_droplet_volume(),
        }
    }

    /// Create from a component list, which must hold exactly one component.
    pub fn from_components<S: Into<Source>>(components: impl IntoIterator<Item = S>) -> Result<Self> {
        let mut components: Vec<Source> = components.into_iter().map(Into::into).collect();
        match components.len() {
            1 => Ok(Self::new(components.remove(0))),
            0 => Err(MixError::NoComponents {
                action: ActionKind::EchoFillToVolume.id(),
            }),
            n => Err(MixError::MultiComponentFill(n)),
        }
    }

    /// Fill to an explicit total instead of the mix volume (builder pattern).
    pub fn with_target(mut self, target_total_volume: Volume) -> Self {
        self.target_total_volume = target_total_volume;
        self
    }

    /// Use a different droplet volume.
    pub fn with_droplet_volume(mut self, droplet_volume: Volume) -> Result<Self> {
        check_droplet_volume(droplet_volume)?;
        self.droplet_volume = droplet_volume;
        Ok(self)
    }
}

impl Action for EchoFillToVolume {
    fn kind(&self) -> ActionKind {
        ActionKind::EchoFillToVolume
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
        Ok(vec![(target - others).round_to_multiple(self.droplet_volume)])
    }

    fn note(&self) -> Option<String> {
        Some(ECHO_NOTE.to_string())
    }

    fn droplet_volume(&self) -> Option<Volume> {
        Some(self.droplet_volume)
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}
