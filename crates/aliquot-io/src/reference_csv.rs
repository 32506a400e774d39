//! Reference tables from CSV.

use std::io::Read;
use std::path::Path;

use aliquot_core::{Concentration, Reference, ReferenceRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A reference CSV row.
///
/// Header: `Name,Plate,Well,Concentration (nM),Sequence`. Well and
/// sequence may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Component name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Plate name.
    #[serde(rename = "Plate", default)]
    pub plate: String,
    /// Well, e.g. `A1`.
    #[serde(rename = "Well", default)]
    pub well: Option<String>,
    /// Stock concentration in nM.
    #[serde(rename = "Concentration (nM)")]
    pub concentration_nm: Decimal,
    /// Strand sequence.
    #[serde(rename = "Sequence", default)]
    pub sequence: Option<String>,
}

impl ReferenceRecord {
    fn into_row(self) -> Result<ReferenceRow> {
        let well = match self.well.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(text.parse().map_err(|source| Error::InvalidWell {
                name: self.name.clone(),
                value: text.to_string(),
                source,
            })?),
        };
        let row = ReferenceRow::new(
            self.name,
            Concentration::nanomolar(self.concentration_nm),
            self.plate,
            well,
        );
        Ok(match self.sequence {
            Some(sequence) if !sequence.trim().is_empty() => row.with_sequence(sequence),
            _ => row,
        })
    }
}

/// Read a reference table from any CSV source.
pub fn reference_from_reader<R: Read>(reader: R) -> Result<Reference> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<ReferenceRecord>() {
        rows.push(record?.into_row()?);
    }
    Ok(Reference::new(rows))
}

/// Read a reference table from a CSV file.
pub fn read_reference_csv<P: AsRef<Path>>(path: P) -> Result<Reference> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let reference = reference_from_reader(file)?;
    tracing::debug!(
        "read {} reference row(s) from {}",
        reference.rows().len(),
        path.display()
    );
    Ok(reference)
}
