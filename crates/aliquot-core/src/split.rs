//! Split mixes: one large batch aliquoted into identical tubes.

use rust_decimal::Decimal;

use crate::error::{MixError, Result};
use crate::mix::{AliquotPlan, Mix};

/// Derive a batch mix from which `num_tubes` copies of `template` can be
/// aliquoted, with `excess` (a fraction, e.g. `0.05`) extra volume.
///
/// Fixed-volume style actions and the fixed total volume (when set) are
/// multiplied by `num_tubes * (1 + excess)`. Dilution, fill and acoustic
/// actions are kept unchanged: they already scale with the mix volume or
/// are bound to droplet sizes. The result carries an [`AliquotPlan`] with
/// the template's total volume per tube.
pub fn split_mix(template: &Mix, num_tubes: u32, excess: Decimal) -> Result<Mix> {
    if num_tubes == 0 {
        return Err(MixError::InvalidSplit("number of tubes must be at least 1".to_string()));
    }
    if excess < Decimal::ZERO {
        return Err(MixError::InvalidSplit(format!("excess must not be negative, got {excess}")));
    }

    let multiplier = Decimal::from(num_tubes) * (Decimal::ONE + excess);
    let volume_each = template.total_volume()?;

    let mut large = template.clone();
    large.actions = template
        .actions
        .iter()
        .map(|action| action.scaled(multiplier).unwrap_or_else(|| action.clone()))
        .collect();
    if template.has_fixed_total_volume() {
        large.fixed_total_volume = template.fixed_total_volume * multiplier;
    }
    large.aliquot = Some(AliquotPlan {
        num_tubes,
        volume_each,
    });

    tracing::debug!(
        "split_mix: {} x{num_tubes} (excess {excess}), multiplier {multiplier}",
        template.name()
    );
    Ok(large)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, FixedConcentration, FixedVolume};
    use crate::component::{Component, Reagent};
    use crate::quantity::{Concentration, Volume};
    use rust_decimal_macros::dec;

    fn comp(name: &str) -> Component {
        Component::new(name).with_concentration(Concentration::nanomolar(100))
    }

    #[test]
    fn ten_tubes_five_percent_excess() {
        let template = Mix::new(
            "m",
            vec![Box::new(FixedVolume::new([comp("a")], Volume::microliters(1)).unwrap()) as Box<dyn Action>],
        )
        .unwrap();
        let large = split_mix(&template, 10, dec!(0.05)).unwrap();
        let volumes = large.actions()[0].each_volumes(Volume::undefined(), large.actions()).unwrap();
        assert_eq!(volumes, vec![Volume::microliters(dec!(10.5))]);
        assert_eq!(large.total_volume().unwrap(), Volume::microliters(dec!(10.5)));
        assert_eq!(large.name(), "m");
        assert_eq!(
            large.aliquot_instruction().unwrap(),
            "Aliquot 1 µL from this mix into 10 different test tubes."
        );
        // the template is untouched
        assert!(template.aliquot().is_none());
    }

    #[test]
    fn fixed_total_scales_and_dilutions_keep_concentration() {
        let template = Mix::new(
            "m",
            vec![
                Box::new(FixedConcentration::new([comp("a")], Concentration::nanomolar(10)).unwrap())
                    as Box<dyn Action>,
                Box::new(FixedVolume::new([comp("b")], Volume::microliters(2)).unwrap()),
            ],
        )
        .unwrap()
        .with_fixed_total_volume(Volume::microliters(20));
        let large = split_mix(&template, 4, Decimal::ZERO).unwrap();
        assert_eq!(large.total_volume().unwrap(), Volume::microliters(80));
        assert_eq!(large.buffer_volume().unwrap(), Volume::microliters(64));
        assert_eq!(large.concentration().unwrap(), template.concentration().unwrap());
        assert_eq!(large.aliquot().unwrap().volume_each, Volume::microliters(20));
    }

    #[test]
    fn rejects_bad_parameters() {
        let template = Mix::new(
            "m",
            vec![Box::new(FixedVolume::new([comp("a")], Volume::microliters(1)).unwrap()) as Box<dyn Action>],
        )
        .unwrap();
        assert!(matches!(split_mix(&template, 0, Decimal::ZERO), Err(MixError::InvalidSplit(_))));
        assert!(matches!(split_mix(&template, 2, dec!(-0.1)), Err(MixError::InvalidSplit(_))));
    }
}
