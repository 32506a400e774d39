//! Integration tests for aliquot-core.
//!
//! Exercises whole plans across modules: reference reconciliation feeding
//! recipe lines and plate maps, acoustic quantization inside a mix, nested
//! mixes with volume bookkeeping, and split mixes.

use aliquot_core::{
    Action, Component, Concentration, EchoEqualTargetConcentration, EchoFixedVolume,
    EchoTargetConcentration, EqualConcMethod, EqualConcentration, FixedConcentration, FixedVolume,
    Mix, MixError, PlateType, Reagent, Reference, ReferenceRow, Strand, ValidationFinding, Volume,
    default_droplet_volume, split_mix,
};
use rust_decimal_macros::dec;

fn nm(v: i64) -> Concentration {
    Concentration::nanomolar(v)
}

fn ul(v: i64) -> Volume {
    Volume::microliters(v)
}

fn stock(name: &str, conc: i64) -> Component {
    Component::new(name).with_concentration(nm(conc))
}

fn plate_reference() -> Reference {
    Reference::new(vec![
        ReferenceRow::new("s1", nm(1000), "P1", Some("A1".parse().unwrap())),
        ReferenceRow::new("s2", nm(1000), "P1", Some("B1".parse().unwrap())),
        ReferenceRow::new("s3", nm(500), "P1", Some("C1".parse().unwrap())),
        ReferenceRow::new("st", nm(200), "P2", Some("A1".parse().unwrap())).with_sequence("ACGTAC"),
    ])
}

// ============================================================================
// 1. Reference reconciliation through a plated mix
// ============================================================================

#[test]
fn reference_bound_mix_groups_lines_and_plates() {
    let actions: Vec<Box<dyn Action>> = vec![Box::new(
        EqualConcentration::new(
            [Component::new("s1"), Component::new("s2"), Component::new("s3")],
            ul(2),
            EqualConcMethod::MinVolume,
        )
        .unwrap(),
    )];
    let mix = Mix::new("staples", actions)
        .unwrap()
        .with_fixed_total_volume(ul(20))
        .with_reference(&plate_reference())
        .unwrap();

    assert!(mix.reference().is_some());
    let lines = mix.mixlines().unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].names, ["s1", "s2"]);
    assert_eq!(lines[1].each_volume, ul(4));
    assert!(lines[2].is_buffer);
    assert_eq!(lines[2].each_volume, ul(12));

    let all = mix.all_components().unwrap();
    for name in ["s1", "s2", "s3"] {
        assert_eq!(all.concentration_of(name), Some(nm(100)), "{name}");
    }

    let maps = mix.plate_maps(PlateType::Wells96, true).unwrap();
    assert_eq!(maps.len(), 2);
    assert_eq!(maps[0].get("B1".parse().unwrap()), Some("s2"));
    assert_eq!(maps[1].volume_each(), ul(4));
    assert!(mix.validate().unwrap().is_empty());
}

#[test]
fn reference_mismatch_fails_binding() {
    let actions: Vec<Box<dyn Action>> =
        vec![Box::new(FixedVolume::new([stock("s1", 999)], ul(2)).unwrap())];
    let mix = Mix::new("m", actions).unwrap();
    let err = mix.with_reference(&plate_reference()).unwrap_err();
    assert!(
        matches!(err, MixError::ReferenceMismatch { ref name, ref details } if name == "s1" && details.contains("Concentration")),
        "{err}"
    );
}

#[test]
fn strand_sequences_reconcile_ignoring_hyphens() {
    let strand = Strand::new("st").with_sequence("ACG-TAC");
    let actions: Vec<Box<dyn Action>> = vec![Box::new(FixedVolume::new([strand], ul(1)).unwrap())];
    let mix = Mix::new("m", actions)
        .unwrap()
        .with_reference(&plate_reference())
        .unwrap();
    assert_eq!(mix.actions()[0].components()[0].concentration().unwrap(), nm(200));

    let conflicting = Strand::new("st").with_sequence("TTTT");
    let actions: Vec<Box<dyn Action>> =
        vec![Box::new(FixedVolume::new([conflicting], ul(1)).unwrap())];
    let err = Mix::new("m", actions)
        .unwrap()
        .with_reference(&plate_reference())
        .unwrap_err();
    assert!(matches!(err, MixError::ReferenceMismatch { .. }), "{err}");
}

// ============================================================================
// 2. Acoustic quantization
// ============================================================================

#[test]
fn acoustic_volumes_are_whole_droplets() {
    let actions: Vec<Box<dyn Action>> = vec![Box::new(
        EchoTargetConcentration::new([stock("a", 1000), stock("b", 3000)], nm(10)).unwrap(),
    )];
    let mix = Mix::new("echo", actions)
        .unwrap()
        .with_fixed_total_volume(ul(10))
        .with_min_volume(Volume::zero());

    let volumes = mix.actions()[0].each_volumes(ul(10), mix.actions()).unwrap();
    assert_eq!(volumes, vec![Volume::nanoliters(100), Volume::nanoliters(25)]);
    for v in &volumes {
        assert!(v.is_multiple_of(default_droplet_volume()), "{v}");
    }
    assert!(mix.validate().unwrap().is_empty());
}

#[test]
fn acoustic_fixed_volume_must_be_droplet_multiple() {
    let err = EchoFixedVolume::new([stock("a", 100)], Volume::nanoliters(30)).unwrap_err();
    assert!(matches!(err, MixError::NotDropletMultiple { .. }));
    assert!(EchoFixedVolume::new([stock("a", 100)], Volume::nanoliters(75)).is_ok());
}

#[test]
fn check_method_rejects_differing_concentrations() {
    let actions: Vec<Box<dyn Action>> = vec![Box::new(
        EchoEqualTargetConcentration::new(
            [stock("a", 100), stock("b", 200)],
            Volume::nanoliters(100),
            EqualConcMethod::Check,
        )
        .unwrap(),
    )];
    let mix = Mix::new("m", actions).unwrap().with_fixed_total_volume(ul(10));
    assert!(matches!(
        mix.mixlines().unwrap_err(),
        MixError::ConcentrationsDiffer { .. }
    ));
}

// ============================================================================
// 3. Nested mixes and the volume ledger
// ============================================================================

fn intermediate(total: i64) -> Mix {
    let actions: Vec<Box<dyn Action>> =
        vec![Box::new(FixedConcentration::new([stock("a", 1000)], nm(100)).unwrap())];
    Mix::new("inner", actions)
        .unwrap()
        .with_fixed_total_volume(ul(total))
}

fn outer_from(inner: &Mix) -> Mix {
    let actions: Vec<Box<dyn Action>> =
        vec![Box::new(FixedConcentration::new([inner], nm(10)).unwrap())];
    Mix::new("outer", actions)
        .unwrap()
        .with_fixed_total_volume(ul(100))
}

#[test]
fn nested_mix_dilutes_and_balances() {
    let inner = intermediate(50);
    let outer = outer_from(&inner);

    assert_eq!(inner.concentration().unwrap(), nm(100));
    assert_eq!(outer.all_components().unwrap().concentration_of("a"), Some(nm(10)));
    assert!(outer.validate().unwrap().is_empty());

    let ledger = outer.volume_ledger().unwrap();
    assert_eq!(ledger.made("inner"), ul(50));
    assert_eq!(ledger.consumed("inner"), ul(10));
    assert_eq!(ledger.consumed("a"), ul(5));
    assert_eq!(ledger.consumed("Buffer"), ul(135));
    assert!(ledger.shortfalls().is_empty());
}

#[test]
fn undersized_intermediate_is_reported() {
    let outer = outer_from(&intermediate(5));
    let findings = outer.validate().unwrap();
    assert_eq!(findings.len(), 1, "{findings:?}");
    assert_eq!(findings[0].code(), "insufficient_intermediate_volume");

    let ledger = outer.volume_ledger().unwrap();
    assert_eq!(ledger.shortfalls(), vec![("inner", ul(5))]);
}

// ============================================================================
// 4. Validation and splitting
// ============================================================================

#[test]
fn independent_faults_are_all_reported() {
    let actions: Vec<Box<dyn Action>> = vec![
        Box::new(FixedVolume::new([stock("a", 100)], Volume::nanoliters(100)).unwrap()),
        Box::new(FixedVolume::new([stock("b", 100)], ul(20)).unwrap()),
    ];
    let mix = Mix::new("m", actions).unwrap().with_fixed_total_volume(ul(10));
    let findings = mix.validate().unwrap();
    assert!(findings.len() >= 2, "{findings:?}");
    assert!(findings.iter().any(|f| matches!(f, ValidationFinding::BelowMinimumVolume { .. })));
    assert!(findings.iter().any(|f| matches!(f, ValidationFinding::ExceedsTotalVolume { .. })));

    let err = mix.ensure_valid().unwrap_err();
    assert!(err.to_string().starts_with("mix 'm' failed validation"), "{err}");
}

#[test]
fn split_mix_keeps_template_concentrations() {
    let actions: Vec<Box<dyn Action>> = vec![
        Box::new(FixedVolume::new([stock("a", 100)], ul(1)).unwrap()),
        Box::new(FixedVolume::new([stock("b", 100)], ul(2)).unwrap()),
    ];
    let template = Mix::new("m", actions)
        .unwrap()
        .with_fixed_total_volume(ul(10))
        .with_test_tube_name("T1");
    let large = split_mix(&template, 10, dec!(0.05)).unwrap();

    assert_eq!(large.total_volume().unwrap(), Volume::microliters(105));
    assert_eq!(large.buffer_volume().unwrap(), Volume::microliters(dec!(73.5)));
    assert_eq!(
        large.all_components().unwrap().concentration_of("b"),
        template.all_components().unwrap().concentration_of("b"),
    );
    assert_eq!(large.printed_name(), "m (T1)");
    assert_eq!(
        large.aliquot_instruction().unwrap(),
        "Aliquot 10 µL from this mix into 10 different test tubes."
    );
    large.ensure_valid().unwrap();
}
