//! Transfer lines: the rows of a mix recipe.

use rust_decimal::Decimal;

use crate::quantity::{Concentration, Volume};
use crate::well::WellPos;

/// One line of a mix recipe: a group of components transferred with the same
/// per-component volume from the same plate.
#[derive(Debug, Clone, PartialEq)]
pub struct MixLine {
    /// Component names, in action order.
    pub names: Vec<String>,
    /// Display label replacing the names, when the action has a set name.
    pub label: Option<String>,
    /// Shared stock concentration; `None` for the buffer line.
    pub source_concentration: Option<Concentration>,
    /// Shared concentration in the destination; `None` for the buffer line.
    pub dest_concentration: Option<Concentration>,
    /// Volume transferred from each component.
    pub each_volume: Volume,
    /// Plate the components sit on, empty when unplated.
    pub plate: String,
    /// Well of each component, parallel to `names`.
    pub wells: Vec<Option<WellPos>>,
    /// Free-form note, e.g. the dispenser used.
    pub note: Option<String>,
    /// Set on the buffer top-up line.
    pub is_buffer: bool,
}

impl MixLine {
    /// Create a line for a single component.
    pub fn new(
        name: impl Into<String>,
        source_concentration: Concentration,
        dest_concentration: Concentration,
        each_volume: Volume,
        plate: impl Into<String>,
        well: Option<WellPos>,
    ) -> Self {
        Self {
            names: vec![name.into()],
            label: None,
            source_concentration: Some(source_concentration),
            dest_concentration: Some(dest_concentration),
            each_volume,
            plate: plate.into(),
            wells: vec![well],
            note: None,
            is_buffer: false,
        }
    }

    /// Create the buffer top-up line.
    pub fn buffer(name: impl Into<String>, volume: Volume) -> Self {
        Self {
            names: vec![name.into()],
            label: None,
            source_concentration: None,
            dest_concentration: None,
            each_volume: volume,
            plate: String::new(),
            wells: vec![None],
            note: None,
            is_buffer: true,
        }
    }

    /// Number of components on this line.
    pub fn count(&self) -> usize {
        self.names.len()
    }

    /// Volume transferred by the whole line.
    pub fn total_volume(&self) -> Volume {
        self.each_volume * Decimal::from(self.count())
    }

    /// Names joined with `", "`, or the label when set.
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.names.join(", "),
        }
    }

    /// Returns `true` if the line's components are in test tubes.
    pub fn is_tube(&self) -> bool {
        self.plate.eq_ignore_ascii_case("tube")
    }

    pub(crate) fn accepts(
        &self,
        source_concentration: Concentration,
        dest_concentration: Concentration,
        each_volume: Volume,
        plate: &str,
    ) -> bool {
        !self.is_buffer
            && self.source_concentration == Some(source_concentration)
            && self.dest_concentration == Some(dest_concentration)
            && self.each_volume == each_volume
            && self.plate == plate
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, well: Option<WellPos>) {
        self.names.push(name.into());
        self.wells.push(well);
    }
}
