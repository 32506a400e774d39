//! Integration tests for aliquot-io.

use aliquot_core::{
    Action, Component, Concentration, EchoTargetConcentration, FixedConcentration, Mix, MixError,
    Volume,
};
use aliquot_io::{
    Error, TransferRow, read_reference_csv, transfer_list, write_transfer_csv,
};
use tempfile::TempDir;

fn plated(name: &str, nm: i64, well: &str) -> Component {
    Component::new(name)
        .with_concentration(Concentration::nanomolar(nm))
        .with_location("source", Some(well.parse().unwrap()))
}

fn echo_mix() -> Mix {
    let actions: Vec<Box<dyn Action>> = vec![Box::new(
        EchoTargetConcentration::new(
            [plated("a", 1000, "A1"), plated("b", 4000, "A2")],
            Concentration::nanomolar(10),
        )
        .unwrap(),
    )];
    Mix::new("assay", actions)
        .unwrap()
        .with_fixed_total_volume(Volume::microliters(10))
        .with_location("dest", Some("D4".parse().unwrap()))
}

#[test]
fn transfer_csv_file_reads_back() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("picklist.csv");

    let rows = transfer_list(&echo_mix()).unwrap();
    write_transfer_csv(&path, &rows).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let read: Vec<TransferRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(read, rows);
    assert_eq!(read[0].transfer_volume.map(|v| v.to_string()), Some("100".to_string()));
    assert_eq!(read[1].transfer_volume.map(|v| v.to_string()), Some("25".to_string()));
}

#[test]
fn dilution_without_total_volume_cannot_be_exported() {
    let actions: Vec<Box<dyn Action>> = vec![Box::new(
        FixedConcentration::new([plated("a", 1000, "A1")], Concentration::nanomolar(10)).unwrap(),
    )];
    let mix = Mix::new("loose", actions).unwrap();
    assert!(matches!(
        transfer_list(&mix),
        Err(Error::Mix(MixError::DilutionWithoutFixedVolume(_)))
    ));
}

#[test]
fn reference_csv_binds_to_a_mix() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("reference.csv");
    std::fs::write(
        &path,
        "Name,Plate,Well,Concentration (nM),Sequence\n\
         a,P1,B3,1000,\n\
         b,P1,B4,4000,\n",
    )
    .unwrap();

    let reference = read_reference_csv(&path).unwrap();
    let actions: Vec<Box<dyn Action>> = vec![Box::new(
        EchoTargetConcentration::new([Component::new("a"), Component::new("b")], Concentration::nanomolar(10))
            .unwrap(),
    )];
    let mix = Mix::new("assay", actions)
        .unwrap()
        .with_fixed_total_volume(Volume::microliters(10))
        .with_reference(&reference)
        .unwrap();

    let rows = transfer_list(&mix).unwrap();
    assert_eq!(rows[0].source_plate, "P1");
    assert_eq!(rows[1].source_well.as_deref(), Some("B4"));
}

#[test]
fn missing_reference_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(matches!(
        read_reference_csv(temp_dir.path().join("absent.csv")),
        Err(Error::Io(_))
    ));
}
