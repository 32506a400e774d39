//! Mixes: ordered action lists with mix-level policy.
//!
//! A [`Mix`] resolves its own total volume (the fixed value, or the sum of
//! what its actions transfer), feeds it back to every action, and exposes the
//! result through the same [`Reagent`] interface as a plain component, so a
//! finished mix can be an ingredient of another.
//!
//! ```rust
//! use aliquot_core::{Component, Concentration, FixedVolume, Mix, Reagent, Volume};
//!
//! let a = Component::new("a").with_concentration(Concentration::nanomolar(100));
//! let b = Component::new("b").with_concentration(Concentration::nanomolar(200));
//! let mix = Mix::new(
//!     "m",
//!     vec![
//!         Box::new(FixedVolume::new([a], Volume::microliters(5)).unwrap()),
//!         Box::new(FixedVolume::new([b], Volume::microliters(10)).unwrap()),
//!     ],
//! )
//! .unwrap()
//! .with_fixed_total_volume(Volume::microliters(20));
//!
//! assert_eq!(mix.buffer_volume().unwrap(), Volume::microliters(5));
//! assert_eq!(mix.concentration().unwrap(), Concentration::nanomolar(25));
//! assert!(mix.validate().unwrap().is_empty());
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::action::Action;
use crate::component::{Reagent, Source};
use crate::error::{MixError, Result};
use crate::ledger::VolumeLedger;
use crate::mixline::MixLine;
use crate::plate_map::{self, PlateMap};
use crate::quantity::{Concentration, Volume};
use crate::reference::Reference;
use crate::table::ComponentTable;
use crate::validation::{self, ValidationFinding};
use crate::well::{PlateType, WellPos};

/// Smallest volume a hand pipette is trusted with, unless configured (µL).
pub const DEFAULT_MIN_VOLUME_UL: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Name of the top-up line, unless configured.
pub const DEFAULT_BUFFER_NAME: &str = "Buffer";

/// How a mix reports its own concentration when used as a source.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MixConcentration {
    /// Destination concentration of the first component of the first action.
    #[default]
    Derived,
    /// A literal concentration.
    Fixed(Concentration),
    /// Aggregate concentration of the named component.
    Of(String),
}

/// Instruction to divide a split mix into identical tubes.
#[derive(Debug, Clone, PartialEq)]
pub struct AliquotPlan {
    /// Number of tubes to fill.
    pub num_tubes: u32,
    /// Volume dispensed into each tube.
    pub volume_each: Volume,
}

impl AliquotPlan {
    /// Human-readable instruction.
    pub fn instruction(&self) -> String {
        format!(
            "Aliquot {} from this mix into {} different test tubes.",
            self.volume_each, self.num_tubes
        )
    }
}

/// A planned mixture: a non-empty, ordered list of actions plus policy.
#[derive(Debug, Clone)]
pub struct Mix {
    pub(crate) actions: Vec<Box<dyn Action>>,
    pub(crate) name: String,
    pub(crate) test_tube_name: Option<String>,
    pub(crate) fixed_total_volume: Volume,
    pub(crate) fixed_concentration: MixConcentration,
    pub(crate) buffer_name: String,
    pub(crate) min_volume: Volume,
    pub(crate) plate: String,
    pub(crate) well: Option<WellPos>,
    pub(crate) reference: Option<Arc<Reference>>,
    pub(crate) aliquot: Option<AliquotPlan>,
}

impl Mix {
    /// Create a mix. Fails with [`MixError::EmptyActions`] if `actions` is empty.
    pub fn new(name: impl Into<String>, actions: Vec<Box<dyn Action>>) -> Result<Self> {
        let name = name.into();
        if actions.is_empty() {
            return Err(MixError::EmptyActions(name));
        }
        Ok(Self {
            actions,
            name,
            test_tube_name: None,
            fixed_total_volume: Volume::undefined(),
            fixed_concentration: MixConcentration::Derived,
            buffer_name: DEFAULT_BUFFER_NAME.to_string(),
            min_volume: Volume::microliters(DEFAULT_MIN_VOLUME_UL),
            plate: String::new(),
            well: None,
            reference: None,
            aliquot: None,
        })
    }

    /// Fix the total volume; the buffer makes up the difference (builder pattern).
    pub fn with_fixed_total_volume(mut self, volume: Volume) -> Self {
        self.fixed_total_volume = volume;
        self
    }

    /// Set how the mix reports its concentration (builder pattern).
    pub fn with_fixed_concentration(mut self, concentration: MixConcentration) -> Self {
        self.fixed_concentration = concentration;
        self
    }

    /// Set the label written on the tube (builder pattern).
    pub fn with_test_tube_name(mut self, name: impl Into<String>) -> Self {
        self.test_tube_name = Some(name.into());
        self
    }

    /// Set the buffer name (builder pattern).
    pub fn with_buffer_name(mut self, name: impl Into<String>) -> Self {
        self.buffer_name = name.into();
        self
    }

    /// Set the minimum pipettable volume (builder pattern).
    pub fn with_min_volume(mut self, volume: Volume) -> Self {
        self.min_volume = volume;
        self
    }

    /// Set where the mix itself is made (builder pattern).
    pub fn with_location(mut self, plate: impl Into<String>, well: Option<WellPos>) -> Self {
        self.plate = plate.into();
        self.well = well;
        self
    }

    /// Mix name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Actions in order.
    pub fn actions(&self) -> &[Box<dyn Action>] {
        &self.actions
    }

    /// Test tube label, if any.
    pub fn test_tube_name(&self) -> Option<&str> {
        self.test_tube_name.as_deref()
    }

    /// Fixed total volume; undefined when derived from the actions.
    pub fn fixed_total_volume(&self) -> Volume {
        self.fixed_total_volume
    }

    /// Concentration policy.
    pub fn fixed_concentration(&self) -> &MixConcentration {
        &self.fixed_concentration
    }

    /// Buffer name.
    pub fn buffer_name(&self) -> &str {
        &self.buffer_name
    }

    /// Minimum pipettable volume.
    pub fn min_volume(&self) -> Volume {
        self.min_volume
    }

    /// Reference table the components were reconciled against.
    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_deref()
    }

    /// Aliquot plan, for split mixes.
    pub fn aliquot(&self) -> Option<&AliquotPlan> {
        self.aliquot.as_ref()
    }

    /// Returns `true` if the total volume is fixed.
    pub fn has_fixed_total_volume(&self) -> bool {
        self.fixed_total_volume.is_defined()
    }

    /// Returns `true` if any action needs a fixed total volume.
    pub fn has_fixed_concentration_action(&self) -> bool {
        self.actions
            .iter()
            .any(|a| a.kind().requires_fixed_total_volume())
    }

    /// Total volume: the fixed value, or the sum of every action's transfer.
    pub fn total_volume(&self) -> Result<Volume> {
        if self.has_fixed_total_volume() {
            return Ok(self.fixed_total_volume);
        }
        self.actions
            .iter()
            .map(|a| a.tx_volume(self.fixed_total_volume, &self.actions))
            .sum()
    }

    /// Total volume, failing if it cannot be concretely resolved.
    pub fn resolved_total_volume(&self) -> Result<Volume> {
        if !self.has_fixed_total_volume() && self.has_fixed_concentration_action() {
            return Err(MixError::DilutionWithoutFixedVolume(self.name.clone()));
        }
        let total = self.total_volume()?;
        if total.is_undefined() {
            return Err(MixError::UndefinedTotalVolume(self.name.clone()));
        }
        Ok(total)
    }

    /// Buffer top-up: total volume minus everything the actions transfer.
    /// Negative when the actions overfill the mix.
    pub fn buffer_volume(&self) -> Result<Volume> {
        let total = self.total_volume()?;
        let transferred = self
            .actions
            .iter()
            .map(|a| a.tx_volume(total, &self.actions))
            .sum::<Result<Volume>>()?;
        Ok(total - transferred)
    }

    /// Recipe lines of every action, followed by the buffer line when the
    /// total volume is fixed.
    pub fn mixlines(&self) -> Result<Vec<MixLine>> {
        let total = self.total_volume()?;
        let mut lines = Vec::new();
        for action in &self.actions {
            lines.extend(action.mixlines(total, &self.actions)?);
        }
        if self.has_fixed_total_volume() {
            lines.push(MixLine::buffer(&self.buffer_name, self.buffer_volume()?));
        }
        Ok(lines)
    }

    /// Every problem with the plan. An empty list means the mix can be made.
    pub fn validate(&self) -> Result<Vec<ValidationFinding>> {
        let lines = self.mixlines()?;
        validation::validate(self, &lines)
    }

    /// Fail with [`MixError::Validation`] if validation reports anything.
    pub fn ensure_valid(&self) -> Result<()> {
        let findings = self.validate()?;
        if findings.is_empty() {
            Ok(())
        } else {
            Err(MixError::Validation {
                mix: self.name.clone(),
                findings,
            })
        }
    }

    /// Plate maps of every plated line, one per (plate, volume) when
    /// `combine` is set, otherwise one per line.
    pub fn plate_maps(&self, plate_type: PlateType, combine: bool) -> Result<Vec<PlateMap>> {
        let lines = self.mixlines()?;
        plate_map::from_lines(&lines, plate_type, combine)
    }

    /// Names of components held in test tubes, grouped by transfer volume.
    pub fn tube_volumes(&self) -> Result<Vec<(Volume, Vec<String>)>> {
        let mut groups: Vec<(Volume, Vec<String>)> = Vec::new();
        for line in self.mixlines()? {
            if line.is_buffer || !line.is_tube() {
                continue;
            }
            match groups.iter().position(|(v, _)| *v == line.each_volume) {
                Some(i) => groups[i].1.extend(line.names),
                None => groups.push((line.each_volume, line.names)),
            }
        }
        Ok(groups)
    }

    /// Record what this mix makes and consumes, recursing into nested mixes.
    /// A mix already in the ledger is skipped.
    pub fn record_volumes(&self, ledger: &mut VolumeLedger) -> Result<()> {
        if !ledger.enter(&self.name) {
            return Ok(());
        }
        let total = self.total_volume()?;
        tracing::debug!("record_volumes: {} makes {total}", self.name);
        ledger.make(&self.name, total);
        ledger.consume(&self.name, Volume::zero());

        for action in &self.actions {
            let volumes = action.each_volumes(total, &self.actions)?;
            for (component, volume) in action.components().iter().zip(volumes) {
                ledger.consume(component.name(), volume);
                component.record_volumes(ledger)?;
            }
        }

        let buffer = self.buffer_volume()?;
        if buffer > Volume::zero() {
            ledger.make_if_absent(&self.buffer_name, Volume::zero());
            ledger.consume(&self.buffer_name, buffer);
        }
        Ok(())
    }

    /// Fresh ledger for this mix and everything it draws from.
    pub fn volume_ledger(&self) -> Result<VolumeLedger> {
        let mut ledger = VolumeLedger::new();
        self.record_volumes(&mut ledger)?;
        Ok(ledger)
    }

    /// One-line summary: name, concentration, total volume and tube name.
    pub fn infoline(&self) -> Result<String> {
        let mut elems = vec![
            format!("Mix: {}", self.name),
            format!("Conc: {:.2}", self.concentration()?),
            format!("Total Vol: {:.2}", self.total_volume()?),
        ];
        if let Some(tube) = &self.test_tube_name {
            elems.push(format!("Test tube name: {tube}"));
        }
        Ok(elems.join(", "))
    }

    /// Closing instruction of a split mix.
    pub fn aliquot_instruction(&self) -> Option<String> {
        self.aliquot.as_ref().map(AliquotPlan::instruction)
    }

    /// Return a copy with every action's components reconciled against
    /// `reference`, and the reference bound to the mix.
    pub fn with_reference(&self, reference: &Reference) -> Result<Self> {
        let mut mix = self.clone();
        mix.update_reference(reference)?;
        Ok(mix)
    }

    /// In-place form of [`with_reference`](Self::with_reference).
    pub fn update_reference(&mut self, reference: &Reference) -> Result<()> {
        for action in &mut self.actions {
            for component in action.components_mut() {
                component.update_reference(reference)?;
            }
        }
        self.reference = Some(Arc::new(reference.clone()));
        Ok(())
    }

    fn derived_concentration(&self) -> Result<Concentration> {
        let total = self.total_volume()?;
        let first = self
            .actions
            .first()
            .ok_or_else(|| MixError::EmptyActions(self.name.clone()))?;
        let dests = first.dest_concentrations(total, &self.actions)?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            // Logging only; actions that fail to resolve are skipped.
            let distinct: HashSet<String> = self
                .actions
                .iter()
                .filter_map(|action| action.dest_concentrations(total, &self.actions).ok())
                .flatten()
                .map(|dest| dest.to_string())
                .collect();
            if distinct.len() > 1 {
                tracing::debug!(
                    "mix {} has {} distinct component concentrations; reporting the first",
                    self.name,
                    distinct.len()
                );
            }
        }

        Ok(dests.first().copied().unwrap_or_default())
    }
}

impl Reagent for Mix {
    fn name(&self) -> &str {
        &self.name
    }

    /// Resolution order: a fixed concentration, then the named component's
    /// aggregate concentration, then the first component's destination
    /// concentration.
    fn concentration(&self) -> Result<Concentration> {
        match &self.fixed_concentration {
            MixConcentration::Fixed(c) => Ok(*c),
            MixConcentration::Of(name) => self
                .all_components()?
                .concentration_of(name)
                .ok_or_else(|| MixError::UnknownComponent(name.clone())),
            MixConcentration::Derived => self.derived_concentration(),
        }
    }

    fn plate(&self) -> &str {
        &self.plate
    }

    fn well(&self) -> Option<WellPos> {
        self.well
    }

    fn printed_name(&self) -> String {
        match &self.test_tube_name {
            Some(tube) => format!("{} ({tube})", self.name),
            None => self.name.clone(),
        }
    }

    fn all_components(&self) -> Result<ComponentTable> {
        let total = self.total_volume()?;
        let mut table = ComponentTable::new();
        for action in &self.actions {
            table.merge(action.all_components(total, &self.actions)?);
        }
        Ok(table)
    }
}

impl From<&Mix> for Source {
    fn from(mix: &Mix) -> Self {
        Source::Mix(Arc::new(mix.clone()))
    }
}
