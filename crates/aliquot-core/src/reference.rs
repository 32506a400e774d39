//! In-memory reference table of stock components.
//!
//! A [`Reference`] is the authoritative record of which reagent sits in which
//! well at which concentration. Components are reconciled against it by name:
//!
//! - no row with the name: the component passes through unchanged
//! - one or more consistent rows: the first one is merged in (several are
//!   logged as ambiguous)
//! - only inconsistent rows: [`MixError::ReferenceMismatch`]
//!
//! A row is inconsistent when the component already specifies a concentration,
//! plate, well or sequence that differs from the row's.

use crate::component::{Component, normalize_sequence};
use crate::error::{MixError, Result};
use crate::quantity::Concentration;
use crate::well::WellPos;

/// One row of a reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRow {
    /// Component name.
    pub name: String,
    /// Stock concentration (the `Concentration (nM)` column).
    pub concentration: Concentration,
    /// Plate name.
    pub plate: String,
    /// Well on the plate.
    pub well: Option<WellPos>,
    /// Sequence, if the row describes a strand.
    pub sequence: Option<String>,
}

impl ReferenceRow {
    /// Create a row without a sequence.
    pub fn new(
        name: impl Into<String>,
        concentration: Concentration,
        plate: impl Into<String>,
        well: Option<WellPos>,
    ) -> Self {
        Self {
            name: name.into(),
            concentration,
            plate: plate.into(),
            well,
            sequence: None,
        }
    }

    /// Set the sequence (builder pattern).
    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }

    fn location(&self) -> String {
        match self.well {
            Some(well) => format!("{}:{well}", self.plate),
            None => self.plate.clone(),
        }
    }

    /// Name of the first field where `component` disagrees with this row.
    fn mismatch(&self, component: &Component, sequence: Option<&str>) -> Option<&'static str> {
        if component.concentration.is_defined() && component.concentration != self.concentration {
            return Some("Concentration (nM)");
        }
        if !component.plate.is_empty() && component.plate != self.plate {
            return Some("Plate");
        }
        if component.well.is_some() && component.well != self.well {
            return Some("Well");
        }
        let defined = |s: &&str| !s.trim().is_empty();
        if let (Some(own), Some(theirs)) = (
            sequence.filter(defined),
            self.sequence.as_deref().filter(defined),
        ) && normalize_sequence(own) != normalize_sequence(theirs)
        {
            return Some("Sequence");
        }
        None
    }
}

/// A table of reference rows, looked up by component name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reference {
    rows: Vec<ReferenceRow>,
}

impl Reference {
    /// Create a reference table from rows.
    pub fn new(rows: Vec<ReferenceRow>) -> Self {
        Self { rows }
    }

    /// All rows in table order.
    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `true` if any row has this name.
    pub fn contains(&self, name: &str) -> bool {
        self.rows.iter().any(|r| r.name == name)
    }

    /// Rows with the given name, in table order.
    pub fn rows_named<'s>(&'s self, name: &str) -> impl Iterator<Item = &'s ReferenceRow> {
        self.rows.iter().filter(move |r| r.name == name)
    }

    /// Find the row `component` should be merged with.
    ///
    /// `sequence` is the component's own sequence, when it is a strand.
    /// Returns `Ok(None)` when no row has the component's name.
    pub fn reconcile(
        &self,
        component: &Component,
        sequence: Option<&str>,
    ) -> Result<Option<&ReferenceRow>> {
        let mut matches = Vec::new();
        let mut mismatches = Vec::new();
        for row in self.rows_named(&component.name) {
            match row.mismatch(component, sequence) {
                Some(field) => mismatches.push(format!("{field} at {}", row.location())),
                None => matches.push(row),
            }
        }

        match matches.as_slice() {
            [] if mismatches.is_empty() => Ok(None),
            [] => Err(MixError::reference_mismatch(
                &component.name,
                mismatches.join(", "),
            )),
            [only] => Ok(Some(*only)),
            [first, ..] => {
                let locations: Vec<_> = matches.iter().map(|r| r.location()).collect();
                tracing::warn!(
                    "{} has more than one location: {}; choosing first",
                    component.name,
                    locations.join(", ")
                );
                Ok(Some(*first))
            }
        }
    }
}

impl FromIterator<ReferenceRow> for Reference {
    fn from_iter<I: IntoIterator<Item = ReferenceRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
