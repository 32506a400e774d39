//! Property-based tests for aliquot-core.
//!
//! Volume conservation, action invariants, droplet quantization and
//! concentration aggregation, using proptest for randomized quantities.

use aliquot_core::{
    Action, Component, ComponentTable, Concentration, EchoEqualTargetConcentration,
    EchoTargetConcentration, EqualConcMethod, FixedConcentration, FixedVolume, Mix, MixError,
    Reagent, Source, Volume, default_droplet_volume,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Positive volume in µL with up to three decimal places (0.001 to 1000).
fn volume() -> impl Strategy<Value = Volume> {
    (1i64..1_000_000).prop_map(|n| Volume::microliters(Decimal::new(n, 3)))
}

/// Positive concentration in nM with up to two decimal places.
fn concentration() -> impl Strategy<Value = Concentration> {
    (1i64..10_000_000).prop_map(|n| Concentration::nanomolar(Decimal::new(n, 2)))
}

fn component(index: usize, conc: Concentration) -> Component {
    Component::new(format!("c{index}")).with_concentration(conc)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// A fixed total volume is reported exactly, whatever the actions transfer.
    #[test]
    fn fixed_total_volume_is_exact(
        total in volume(),
        each in prop::collection::vec(volume(), 1..6),
    ) {
        let actions: Vec<Box<dyn Action>> = each
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                Box::new(FixedVolume::new([component(i, Concentration::nanomolar(100))], v).unwrap())
                    as Box<dyn Action>
            })
            .collect();
        let mix = Mix::new("m", actions).unwrap().with_fixed_total_volume(total);
        prop_assert_eq!(mix.total_volume().unwrap(), total);

        let transferred: Volume = each.iter().sum();
        prop_assert_eq!(mix.buffer_volume().unwrap(), total - transferred);
    }

    /// Fixed-volume transfers do not depend on the mix volume.
    #[test]
    fn fixed_volume_ignores_mix_volume(
        fixed in volume(),
        mix_a in volume(),
        mix_b in volume(),
        n in 1usize..5,
    ) {
        let components: Vec<Component> =
            (0..n).map(|i| component(i, Concentration::nanomolar(10))).collect();
        let action = FixedVolume::new(components, fixed).unwrap();
        let siblings: Vec<Box<dyn Action>> = vec![Box::new(action.clone())];
        let a = action.each_volumes(mix_a, &siblings).unwrap();
        let b = action.each_volumes(mix_b, &siblings).unwrap();
        let undefined = action.each_volumes(Volume::undefined(), &siblings).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &undefined);
        prop_assert_eq!(a, vec![fixed; n]);
    }

    /// A dilution reaches its target concentration in the destination.
    #[test]
    fn fixed_concentration_reproduces_target(
        source in concentration(),
        percent in 1i64..100,
        mix_volume in volume(),
    ) {
        let target = source * Decimal::new(percent, 2);
        let action = FixedConcentration::new([component(0, source)], target).unwrap();
        let siblings: Vec<Box<dyn Action>> = vec![Box::new(action.clone())];
        let dests = action.dest_concentrations(mix_volume, &siblings).unwrap();
        prop_assert_eq!(dests, vec![target]);

        let volume = action.each_volumes(mix_volume, &siblings).unwrap()[0];
        prop_assert!(volume <= mix_volume);
        prop_assert!(volume > Volume::zero());
    }

    /// Acoustic dilution volumes are whole droplets.
    #[test]
    fn acoustic_volumes_are_droplet_multiples(
        sources in prop::collection::vec(concentration(), 1..6),
        percent in 1i64..100,
        mix_volume in volume(),
    ) {
        let target = Concentration::nanomolar(Decimal::new(percent, 2));
        let components: Vec<Component> =
            sources.iter().enumerate().map(|(i, &c)| component(i, c)).collect();
        let action = EchoTargetConcentration::new(components, target).unwrap();
        let siblings: Vec<Box<dyn Action>> = vec![Box::new(action.clone())];
        for volume in action.each_volumes(mix_volume, &siblings).unwrap() {
            prop_assert!(
                volume.is_zero() || volume.is_multiple_of(default_droplet_volume()),
                "{} is not a whole number of droplets", volume
            );
        }
    }

    /// The `check` method accepts equal concentrations unchanged and rejects
    /// any difference.
    #[test]
    fn check_method_requires_equal_concentrations(
        a in concentration(),
        b in concentration(),
        droplets in 1i64..40,
    ) {
        let fixed = Volume::nanoliters(25 * droplets);
        let action = EchoEqualTargetConcentration::new(
            [component(0, a), component(1, b)],
            fixed,
            EqualConcMethod::Check,
        )
        .unwrap();
        let siblings: Vec<Box<dyn Action>> = vec![Box::new(action.clone())];
        let result = action.each_volumes(Volume::microliters(10), &siblings);
        if a == b {
            prop_assert_eq!(result.unwrap(), vec![fixed, fixed]);
        } else {
            let is_differ = matches!(result, Err(MixError::ConcentrationsDiffer { .. }));
            prop_assert!(is_differ);
        }
    }

    /// Aggregating a component list concatenated with itself doubles every
    /// concentration without adding rows.
    #[test]
    fn aggregation_doubles_without_duplicates(
        concs in prop::collection::vec(concentration(), 1..8),
    ) {
        let entries: Vec<(Source, Concentration)> = concs
            .iter()
            .enumerate()
            .map(|(i, &c)| (Source::from(component(i, c)), c))
            .collect();
        let single: ComponentTable = entries.iter().cloned().collect();
        let doubled: ComponentTable = entries.iter().cloned().chain(entries.iter().cloned()).collect();

        prop_assert_eq!(single.len(), concs.len());
        prop_assert_eq!(doubled.len(), concs.len());
        for (name, entry) in single.iter() {
            prop_assert_eq!(
                doubled.concentration_of(name),
                Some(entry.concentration * Decimal::TWO)
            );
        }
    }

    /// The same component added by two actions of a mix is one row holding
    /// the sum of both contributions.
    #[test]
    fn mix_sums_repeated_component(
        stock in concentration(),
        first in volume(),
        second in volume(),
        extra in volume(),
    ) {
        let total = first + second + extra;
        let actions: Vec<Box<dyn Action>> = vec![
            Box::new(FixedVolume::new([component(0, stock)], first).unwrap()),
            Box::new(FixedVolume::new([component(0, stock)], second).unwrap()),
        ];
        let expected = actions[0].dest_concentrations(total, &actions).unwrap()[0]
            + actions[1].dest_concentrations(total, &actions).unwrap()[0];
        let mix = Mix::new("m", actions).unwrap().with_fixed_total_volume(total);

        let table = mix.all_components().unwrap();
        prop_assert_eq!(table.len(), 1);
        prop_assert_eq!(table.concentration_of("c0"), Some(expected));
    }
}
