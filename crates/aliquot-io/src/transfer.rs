//! Acoustic transfer lists (pick lists).

use std::io::Write;
use std::path::Path;

use aliquot_core::{Mix, Reagent};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Unit written in the "Concentration Units" column.
pub const CONCENTRATION_UNITS: &str = "nM";

/// One component transfer performed by the acoustic dispenser.
///
/// Concentrations are in nM and volumes in nL. Undefined concentrations
/// and missing wells are written as empty fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRow {
    /// Printed name of the source component.
    #[serde(rename = "Sample Name")]
    pub sample_name: String,
    /// Stock concentration (nM).
    #[serde(rename = "Source Concentration")]
    pub source_concentration: Option<Decimal>,
    /// Concentration reached in the destination mix (nM).
    #[serde(rename = "Destination Concentration")]
    pub destination_concentration: Option<Decimal>,
    /// Always [`CONCENTRATION_UNITS`].
    #[serde(rename = "Concentration Units")]
    pub concentration_units: String,
    /// Volume transferred (nL).
    #[serde(rename = "Transfer Volume")]
    pub transfer_volume: Option<Decimal>,
    /// Plate holding the source component.
    #[serde(rename = "Source Plate Name")]
    pub source_plate: String,
    /// Source well.
    #[serde(rename = "Source Well")]
    pub source_well: Option<String>,
    /// Plate the mix is made on.
    #[serde(rename = "Destination Plate Name")]
    pub destination_plate: String,
    /// Destination well.
    #[serde(rename = "Destination Well")]
    pub destination_well: Option<String>,
    /// Name of the mix.
    #[serde(rename = "Destination Sample Name")]
    pub destination_sample: String,
}

/// Project the acoustic actions of `mix` into transfer rows, in action and
/// component order. Hand-pipetted actions are skipped.
///
/// # Errors
///
/// Fails when the mix volume cannot be resolved, e.g. a dilution without a
/// fixed total volume.
pub fn transfer_list(mix: &Mix) -> Result<Vec<TransferRow>> {
    let mix_volume = mix.resolved_total_volume()?;
    let actions = mix.actions();
    let destination_well = mix.well().map(|w| w.to_string());

    let mut rows = Vec::new();
    for action in actions.iter().filter(|a| a.kind().is_acoustic()) {
        let sources = action.source_concentrations()?;
        let dests = action.dest_concentrations(mix_volume, actions)?;
        let volumes = action.each_volumes(mix_volume, actions)?;

        for (((component, source), dest), volume) in
            action.components().iter().zip(sources).zip(dests).zip(volumes)
        {
            rows.push(TransferRow {
                sample_name: component.printed_name(),
                source_concentration: source.to_nanomolar().map(|d| d.normalize()),
                destination_concentration: dest.to_nanomolar().map(|d| d.normalize()),
                concentration_units: CONCENTRATION_UNITS.to_string(),
                transfer_volume: volume.to_nanoliters().map(|d| d.normalize()),
                source_plate: component.plate().to_string(),
                source_well: component.well().map(|w| w.to_string()),
                destination_plate: mix.plate().to_string(),
                destination_well: destination_well.clone(),
                destination_sample: mix.name().to_string(),
            });
        }
    }

    tracing::debug!("{} transfer row(s) for mix {}", rows.len(), mix.name());
    Ok(rows)
}

/// Write transfer rows as CSV, with a header row, to any writer.
pub fn write_transfers<W: Write>(writer: W, rows: &[TransferRow]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write transfer rows to a CSV file.
pub fn write_transfer_csv<P: AsRef<Path>>(path: P, rows: &[TransferRow]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_transfers(file, rows)?;
    tracing::debug!("wrote {} transfer row(s) to {}", rows.len(), path.display());
    Ok(())
}

/// Render transfer rows as a CSV string.
pub fn transfers_to_csv_string(rows: &[TransferRow]) -> Result<String> {
    let mut buffer = Vec::new();
    write_transfers(&mut buffer, rows)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aliquot_core::{
        Action, Component, Concentration, EchoFixedVolume, FixedVolume, Volume,
    };

    fn stock(name: &str, nm: i64, well: &str) -> Component {
        Component::new(name)
            .with_concentration(Concentration::nanomolar(nm))
            .with_location("src", Some(well.parse().unwrap()))
    }

    fn mix() -> Mix {
        let actions: Vec<Box<dyn Action>> = vec![
            Box::new(FixedVolume::new([stock("hand", 100, "A1")], Volume::microliters(1)).unwrap()),
            Box::new(
                EchoFixedVolume::new(
                    [stock("a", 1000, "B1"), stock("b", 500, "B2")],
                    Volume::nanoliters(100),
                )
                .unwrap(),
            ),
        ];
        Mix::new("m", actions)
            .unwrap()
            .with_fixed_total_volume(Volume::microliters(10))
            .with_location("dest", Some("C3".parse().unwrap()))
    }

    #[test]
    fn only_acoustic_actions_are_listed() {
        let rows = transfer_list(&mix()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sample_name, "a");
        assert_eq!(rows[0].transfer_volume, Some(Decimal::from(100)));
        assert_eq!(rows[0].destination_concentration, Some(Decimal::from(10)));
        assert_eq!(rows[1].source_well.as_deref(), Some("B2"));
        assert_eq!(rows[1].destination_well.as_deref(), Some("C3"));
        assert_eq!(rows[1].destination_plate, "dest");
        assert_eq!(rows[1].concentration_units, "nM");
    }

    #[test]
    fn csv_has_dispenser_header() {
        let csv = transfers_to_csv_string(&transfer_list(&mix()).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some(
                "Sample Name,Source Concentration,Destination Concentration,Concentration Units,\
                 Transfer Volume,Source Plate Name,Source Well,Destination Plate Name,\
                 Destination Well,Destination Sample Name"
            )
        );
        assert_eq!(lines.next(), Some("a,1000,10,nM,100,src,B1,dest,C3,m"));
    }
}
