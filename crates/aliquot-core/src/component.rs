//! Reagents: plain components, strands, and mixes used as sources.
//!
//! Every source a pipetting action draws from is a [`Source`], a closed set
//! of leaf [`Component`], sequence-bearing [`Strand`], or a previously planned
//! [`Mix`]. They share the [`Reagent`] capability interface, so a mix used as
//! an ingredient behaves exactly like a tube of stock.

use std::sync::Arc;

use crate::error::Result;
use crate::ledger::VolumeLedger;
use crate::mix::Mix;
use crate::quantity::Concentration;
use crate::reference::Reference;
use crate::table::ComponentTable;
use crate::well::WellPos;

/// Capability interface shared by everything that can be pipetted.
pub trait Reagent {
    /// Unique name.
    fn name(&self) -> &str;

    /// Stock concentration; may be undefined.
    fn concentration(&self) -> Result<Concentration>;

    /// Source plate name, empty when unset.
    fn plate(&self) -> &str {
        ""
    }

    /// Source well, if located on a plate.
    fn well(&self) -> Option<WellPos> {
        None
    }

    /// Name as printed in instructions.
    fn printed_name(&self) -> String {
        self.name().to_string()
    }

    /// Every leaf component contained, with its concentration in this reagent.
    fn all_components(&self) -> Result<ComponentTable>;
}

/// A named reagent with a stock concentration and optional location.
#[derive(Debug, Clone)]
pub struct Component {
    /// Unique name.
    pub name: String,
    /// Stock concentration; undefined when unknown.
    pub concentration: Concentration,
    /// Plate name, empty when unset. `"tube"` marks a test tube.
    pub plate: String,
    /// Well on the plate.
    pub well: Option<WellPos>,
}

impl Component {
    /// Create a component with an undefined concentration and no location.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            concentration: Concentration::undefined(),
            plate: String::new(),
            well: None,
        }
    }

    /// Set the stock concentration (builder pattern).
    pub fn with_concentration(mut self, concentration: Concentration) -> Self {
        self.concentration = concentration;
        self
    }

    /// Set the plate and well (builder pattern).
    pub fn with_location(mut self, plate: impl Into<String>, well: Option<WellPos>) -> Self {
        self.plate = plate.into();
        self.well = well;
        self
    }

    /// Return a copy with concentration and location taken from `reference`.
    ///
    /// Components without a matching reference row are returned unchanged.
    pub fn with_reference(&self, reference: &Reference) -> Result<Self> {
        let Some(row) = reference.reconcile(self, None)? else {
            return Ok(self.clone());
        };
        Ok(Self {
            name: self.name.clone(),
            concentration: row.concentration,
            plate: row.plate.clone(),
            well: row.well,
        })
    }

    /// In-place form of [`with_reference`](Self::with_reference).
    pub fn update_reference(&mut self, reference: &Reference) -> Result<()> {
        *self = self.with_reference(reference)?;
        Ok(())
    }
}

/// Components are equal when names match and concentrations are equal or
/// both undefined. Location is not compared.
impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.concentration == other.concentration
    }
}

impl Reagent for Component {
    fn name(&self) -> &str {
        &self.name
    }

    fn concentration(&self) -> Result<Concentration> {
        Ok(self.concentration)
    }

    fn plate(&self) -> &str {
        &self.plate
    }

    fn well(&self) -> Option<WellPos> {
        self.well
    }

    fn all_components(&self) -> Result<ComponentTable> {
        let mut table = ComponentTable::new();
        table.insert(Source::Component(self.clone()), self.concentration);
        Ok(table)
    }
}

/// A nucleic-acid strand: a component with an optional sequence.
#[derive(Debug, Clone)]
pub struct Strand {
    /// Name, concentration and location.
    pub component: Component,
    /// Sequence, if known.
    pub sequence: Option<String>,
}

impl Strand {
    /// Create a strand with no concentration, location or sequence.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            component: Component::new(name),
            sequence: None,
        }
    }

    /// Set the stock concentration (builder pattern).
    pub fn with_concentration(mut self, concentration: Concentration) -> Self {
        self.component.concentration = concentration;
        self
    }

    /// Set the plate and well (builder pattern).
    pub fn with_location(mut self, plate: impl Into<String>, well: Option<WellPos>) -> Self {
        self.component.plate = plate.into();
        self.component.well = well;
        self
    }

    /// Set the sequence (builder pattern).
    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }

    /// Return a copy reconciled against `reference`, including the sequence.
    ///
    /// When both sides define a sequence they must match, ignoring spaces and
    /// hyphens. A defined, non-empty sequence wins over a missing one.
    pub fn with_reference(&self, reference: &Reference) -> Result<Self> {
        let Some(row) = reference.reconcile(&self.component, self.sequence.as_deref())? else {
            return Ok(self.clone());
        };
        let sequence = match (&self.sequence, &row.sequence) {
            (None, None) => None,
            (Some(own), None) => Some(own.clone()),
            (Some(own), Some(theirs)) if theirs.trim().is_empty() => Some(own.clone()),
            (_, Some(theirs)) => Some(theirs.clone()),
        };
        Ok(Self {
            component: Component {
                name: self.component.name.clone(),
                concentration: row.concentration,
                plate: row.plate.clone(),
                well: row.well,
            },
            sequence,
        })
    }

    /// In-place form of [`with_reference`](Self::with_reference).
    pub fn update_reference(&mut self, reference: &Reference) -> Result<()> {
        *self = self.with_reference(reference)?;
        Ok(())
    }
}

impl PartialEq for Strand {
    fn eq(&self, other: &Self) -> bool {
        self.component == other.component
            && self.sequence.as_deref().map(normalize_sequence)
                == other.sequence.as_deref().map(normalize_sequence)
    }
}

impl Reagent for Strand {
    fn name(&self) -> &str {
        &self.component.name
    }

    fn concentration(&self) -> Result<Concentration> {
        Ok(self.component.concentration)
    }

    fn plate(&self) -> &str {
        &self.component.plate
    }

    fn well(&self) -> Option<WellPos> {
        self.component.well
    }

    fn all_components(&self) -> Result<ComponentTable> {
        let mut table = ComponentTable::new();
        table.insert(Source::Strand(self.clone()), self.component.concentration);
        Ok(table)
    }
}

/// Strip spaces and hyphens so formatted sequences compare equal.
pub fn normalize_sequence(sequence: &str) -> String {
    sequence.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// Anything an action can transfer from.
///
/// Mixes are shared behind [`Arc`] so one intermediate mix can feed several
/// downstream mixes without copying its action tree.
#[derive(Debug, Clone)]
pub enum Source {
    /// A plain component.
    Component(Component),
    /// A strand with an optional sequence.
    Strand(Strand),
    /// A previously planned mix.
    Mix(Arc<Mix>),
}

impl Source {
    /// Returns the nested mix, if this source is one.
    pub fn as_mix(&self) -> Option<&Mix> {
        match self {
            Source::Mix(mix) => Some(mix),
            _ => None,
        }
    }

    /// Returns `true` for mix sources.
    pub fn is_mix(&self) -> bool {
        matches!(self, Source::Mix(_))
    }

    fn reagent(&self) -> &dyn Reagent {
        match self {
            Source::Component(c) => c,
            Source::Strand(s) => s,
            Source::Mix(m) => m.as_ref(),
        }
    }

    /// Return a copy reconciled against `reference`. Mixes reconcile every
    /// component of every action.
    pub fn with_reference(&self, reference: &Reference) -> Result<Self> {
        Ok(match self {
            Source::Component(c) => Source::Component(c.with_reference(reference)?),
            Source::Strand(s) => Source::Strand(s.with_reference(reference)?),
            Source::Mix(m) => Source::Mix(Arc::new(m.with_reference(reference)?)),
        })
    }

    /// In-place form of [`with_reference`](Self::with_reference).
    ///
    /// A shared mix is cloned before being updated.
    pub fn update_reference(&mut self, reference: &Reference) -> Result<()> {
        match self {
            Source::Component(c) => c.update_reference(reference),
            Source::Strand(s) => s.update_reference(reference),
            Source::Mix(m) => Arc::make_mut(m).update_reference(reference),
        }
    }

    /// Record this source in `ledger`. Leaves are made with zero volume; mixes
    /// recurse into their own components.
    pub fn record_volumes(&self, ledger: &mut VolumeLedger) -> Result<()> {
        match self {
            Source::Mix(m) => m.record_volumes(ledger),
            leaf => {
                ledger.record_leaf(leaf.name());
                Ok(())
            }
        }
    }
}

impl Reagent for Source {
    fn name(&self) -> &str {
        self.reagent().name()
    }

    fn concentration(&self) -> Result<Concentration> {
        self.reagent().concentration()
    }

    fn plate(&self) -> &str {
        self.reagent().plate()
    }

    fn well(&self) -> Option<WellPos> {
        self.reagent().well()
    }

    fn printed_name(&self) -> String {
        self.reagent().printed_name()
    }

    fn all_components(&self) -> Result<ComponentTable> {
        self.reagent().all_components()
    }
}

impl From<Component> for Source {
    fn from(component: Component) -> Self {
        Source::Component(component)
    }
}

impl From<Strand> for Source {
    fn from(strand: Strand) -> Self {
        Source::Strand(strand)
    }
}

impl From<Mix> for Source {
    fn from(mix: Mix) -> Self {
        Source::Mix(Arc::new(mix))
    }
}

impl From<Arc<Mix>> for Source {
    fn from(mix: Arc<Mix>) -> Self {
        Source::Mix(mix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceRow;

    fn nm(v: i64) -> Concentration {
        Concentration::nanomolar(v)
    }

    #[test]
    fn equality_ignores_location_and_treats_undefined_as_equal() {
        let a = Component::new("a").with_location("P1", Some("A1".parse().unwrap()));
        let b = Component::new("a");
        assert_eq!(a, b);
        assert_ne!(a.clone().with_concentration(nm(10)), b);
        assert_eq!(a.with_concentration(nm(10)), b.with_concentration(nm(10)));
    }

    #[test]
    fn sequence_equality_is_format_insensitive() {
        let a = Strand::new("s").with_sequence("ACG TTA-C");
        let b = Strand::new("s").with_sequence("ACGTTAC");
        assert_eq!(a, b);
    }

    #[test]
    fn strand_takes_reference_sequence_when_missing() {
        let reference = Reference::new(vec![
            ReferenceRow::new("s1", nm(100), "P1", Some("B2".parse().unwrap()))
                .with_sequence("AAAA"),
        ]);
        let s = Strand::new("s1").with_reference(&reference).unwrap();
        assert_eq!(s.sequence.as_deref(), Some("AAAA"));
        assert_eq!(s.component.concentration, nm(100));
        assert_eq!(s.component.plate, "P1");
    }

    #[test]
    fn strand_keeps_own_sequence_over_empty_reference() {
        let reference = Reference::new(vec![
            ReferenceRow::new("s1", nm(100), "P1", None).with_sequence(""),
        ]);
        let s = Strand::new("s1")
            .with_sequence("CCCC")
            .with_reference(&reference)
            .unwrap();
        assert_eq!(s.sequence.as_deref(), Some("CCCC"));
    }

    #[test]
    fn update_reference_mutates_in_place() {
        let reference = Reference::new(vec![ReferenceRow::new("c", nm(7), "P2", None)]);
        let mut source = Source::from(Component::new("c"));
        source.update_reference(&reference).unwrap();
        assert_eq!(source.concentration().unwrap(), nm(7));
        assert_eq!(source.plate(), "P2");
    }
}
