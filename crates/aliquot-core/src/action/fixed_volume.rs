//! Fixed-volume transfers.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::{Action, ActionKind, group_lines, require_components};
use crate::component::{Reagent, Source};
use crate::error::{MixError, Result};
use crate::mixline::MixLine;
use crate::quantity::{Concentration, Volume};

/// Transfer the same volume of every component.
#[derive(Debug, Clone)]
pub struct FixedVolume {
    components: Vec<Source>,
    fixed_volume: Volume,
    set_name: Option<String>,
}

impl FixedVolume {
    /// Create a fixed-volume action.
    pub fn new<S: Into<Source>>(
        components: impl IntoIterator<Item = S>,
        fixed_volume: Volume,
    ) -> Result<Self> {
        let components: Vec<Source> = components.into_iter().map(Into::into).collect();
        require_components(ActionKind::FixedVolume, &components)?;
        Ok(Self {
            components,
            fixed_volume,
            set_name: None,
        })
    }

    /// Name the component set in recipe output (builder pattern).
    pub fn with_set_name(mut self, name: impl Into<String>) -> Self {
        self.set_name = Some(name.into());
        self
    }

    /// Volume transferred from each component.
    pub fn fixed_volume(&self) -> Volume {
        self.fixed_volume
    }
}

impl Action for FixedVolume {
    fn kind(&self) -> ActionKind {
        ActionKind::FixedVolume
    }

    fn components(&self) -> &[Source] {
        &self.components
    }

    fn components_mut(&mut self) -> &mut [Source] {
        &mut self.components
    }

    fn each_volumes(&self, _mix_volume: Volume, _siblings: &[Box<dyn Action>]) -> Result<Vec<Volume>> {
        Ok(vec![self.fixed_volume; self.components.len()])
    }

    fn set_name(&self) -> Option<&str> {
        self.set_name.as_deref()
    }

    fn scaled(&self, factor: Decimal) -> Option<Box<dyn Action>> {
        let mut scaled = self.clone();
        scaled.fixed_volume = self.fixed_volume * factor;
        Some(Box::new(scaled))
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

/// How an equal-concentration action adjusts its fixed volume.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EqualConcMethod {
    /// The most concentrated component gets the fixed volume; the others get
    /// proportionally more.
    #[default]
    MinVolume,
    /// The least concentrated component gets the fixed volume; the others get
    /// proportionally less.
    MaxVolume,
    /// As [`MaxVolume`](Self::MaxVolume), then top every component up to the
    /// fixed volume with the named buffer.
    MaxFill {
        /// Buffer used for the top-up line.
        buffer_name: String,
    },
    /// Every component must already have the same concentration.
    Check,
}

impl FromStr for EqualConcMethod {
    type Err = MixError;

    /// Parses `min_volume`, `max_volume`, `check`, `max_fill` or
    /// `max_fill:<buffer name>`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "min_volume" => Ok(Self::MinVolume),
            "max_volume" => Ok(Self::MaxVolume),
            "check" => Ok(Self::Check),
            "max_fill" => Ok(Self::MaxFill {
                buffer_name: "Buffer".to_string(),
            }),
            other => match other.split_once(':') {
                Some(("max_fill", buffer)) if !buffer.trim().is_empty() => Ok(Self::MaxFill {
                    buffer_name: buffer.trim().to_string(),
                }),
                _ => Err(MixError::InvalidMethod(other.to_string())),
            },
        }
    }
}

impl fmt::Display for EqualConcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinVolume => f.write_str("min_volume"),
            Self::MaxVolume => f.write_str("max_volume"),
            Self::MaxFill { buffer_name } => write!(f, "max_fill:{buffer_name}"),
            Self::Check => f.write_str("check"),
        }
    }
}

/// Per-component volumes for an equal-concentration rule.
pub(crate) fn equal_concentration_volumes(
    fixed_volume: Volume,
    method: &EqualConcMethod,
    components: &[Source],
    sources: &[Concentration],
) -> Result<Vec<Volume>> {
    let scale = match method {
        EqualConcMethod::Check => {
            if sources.windows(2).any(|w| w[0] != w[1]) {
                let names: Vec<_> = components.iter().map(Reagent::name).collect();
                return Err(MixError::ConcentrationsDiffer {
                    names: names.join(", "),
                });
            }
            return Ok(vec![fixed_volume; sources.len()]);
        }
        EqualConcMethod::MinVolume => sources.iter().copied().reduce(Concentration::max),
        EqualConcMethod::MaxVolume | EqualConcMethod::MaxFill { .. } => {
            sources.iter().copied().reduce(Concentration::min)
        }
    }
    .unwrap_or_default();

    Ok(sources
        .iter()
        .map(|&source| fixed_volume * (scale / source))
        .collect())
}

/// Buffer line topping each component up to the fixed volume.
pub(crate) fn max_fill_line(buffer_name: &str, fixed_volume: Volume, volumes: &[Volume]) -> MixLine {
    let fill: Volume = volumes.iter().map(|&v| fixed_volume - v).sum();
    MixLine::buffer(buffer_name, fill)
}

/// Transfer a fixed volume of every component, adjusted so they all reach the
/// same destination concentration.
#[derive(Debug, Clone)]
pub struct EqualConcentration {
    components: Vec<Source>,
    fixed_volume: Volume,
    method: EqualConcMethod,
    set_name: Option<String>,
}

impl EqualConcentration {
    /// Create an equal-concentration action.
    pub fn new<S: Into<Source>>(
        components: impl IntoIterator<Item = S>,
        fixed_volume: Volume,
        method: EqualConcMethod,
    ) -> Result<Self> {
        let components: Vec<Source> = components.into_iter().map(Into::into).collect();
        require_components(ActionKind::EqualConcentration, &components)?;
        Ok(Self {
            components,
            fixed_volume,
            method,
            set_name: None,
        })
    }

    /// Name the component set in recipe output (builder pattern).
    pub fn with_set_name(mut self, name: impl Into<String>) -> Self {
        self.set_name = Some(name.into());
        self
    }

    /// The volume adjustment method.
    pub fn method(&self) -> &EqualConcMethod {
        &self.method
    }
}

impl Action for EqualConcentration {
    fn kind(&self) -> ActionKind {
        ActionKind::EqualConcentration
    }

    fn components(&self) -> &[Source] {
        &self.components
    }

    fn components_mut(&mut self) -> &mut [Source] {
        &mut self.components
    }

    fn each_volumes(&self, _mix_volume: Volume, _siblings: &[Box<dyn Action>]) -> Result<Vec<Volume>> {
        let sources = self.source_concentrations()?;
        equal_concentration_volumes(self.fixed_volume, &self.method, &self.components, &sources)
    }

    fn tx_volume(&self, mix_volume: Volume, siblings: &[Box<dyn Action>]) -> Result<Volume> {
        match self.method {
            EqualConcMethod::MaxFill { .. } => {
                Ok(self.fixed_volume * Decimal::from(self.components.len()))
            }
            _ => Ok(self.each_volumes(mix_volume, siblings)?.into_iter().sum()),
        }
    }

    fn set_name(&self) -> Option<&str> {
        self.set_name.as_deref()
    }

    fn mixlines(&self, mix_volume: Volume, siblings: &[Box<dyn Action>]) -> Result<Vec<MixLine>> {
        let mut lines = group_lines(self, mix_volume, siblings)?;
        if let EqualConcMethod::MaxFill { buffer_name } = &self.method {
            let volumes = self.each_volumes(mix_volume, siblings)?;
            lines.push(max_fill_line(buffer_name, self.fixed_volume, &volumes));
        }
        Ok(lines)
    }

    fn scaled(&self, factor: Decimal) -> Option<Box<dyn Action>> {
        let mut scaled = self.clone();
        scaled.fixed_volume = self.fixed_volume * factor;
        Some(Box::new(scaled))
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;

    fn comp(name: &str, nm: i64) -> Component {
        Component::new(name).with_concentration(Concentration::nanomolar(nm))
    }

    #[test]
    fn fixed_volume_ignores_mix_volume() {
        let action = FixedVolume::new([comp("a", 100), comp("b", 50)], Volume::microliters(2)).unwrap();
        let v1 = action.each_volumes(Volume::microliters(10), &[]).unwrap();
        let v2 = action.each_volumes(Volume::undefined(), &[]).unwrap();
        assert_eq!(v1, v2);
        assert_eq!(v1, vec![Volume::microliters(2); 2]);
    }

    #[test]
    fn empty_component_list_is_rejected() {
        let err = FixedVolume::new(Vec::<Component>::new(), Volume::microliters(1)).unwrap_err();
        assert!(matches!(err, MixError::NoComponents { .. }));
    }

    #[test]
    fn min_volume_scales_up_dilute_components() {
        let action = EqualConcentration::new(
            [comp("a", 100), comp("b", 50)],
            Volume::microliters(1),
            EqualConcMethod::MinVolume,
        )
        .unwrap();
        let v = action.each_volumes(Volume::microliters(10), &[]).unwrap();
        assert_eq!(v, vec![Volume::microliters(1), Volume::microliters(2)]);
        let dest = action.dest_concentrations(Volume::microliters(10), &[]).unwrap();
        assert_eq!(dest[0], dest[1]);
    }

    #[test]
    fn max_volume_scales_down_concentrated_components() {
        let action = EqualConcentration::new(
            [comp("a", 100), comp("b", 50)],
            Volume::microliters(2),
            EqualConcMethod::MaxVolume,
        )
        .unwrap();
        let v = action.each_volumes(Volume::microliters(10), &[]).unwrap();
        assert_eq!(v, vec![Volume::microliters(1), Volume::microliters(2)]);
    }

    #[test]
    fn max_fill_tops_up_with_buffer() {
        let action = EqualConcentration::new(
            [comp("a", 100), comp("b", 50)],
            Volume::microliters(2),
            "max_fill:Water".parse().unwrap(),
        )
        .unwrap();
        let mv = Volume::microliters(10);
        assert_eq!(action.tx_volume(mv, &[]).unwrap(), Volume::microliters(4));
        let lines = action.mixlines(mv, &[]).unwrap();
        let fill = lines.last().unwrap();
        assert_eq!(fill.names, ["Water"]);
        assert_eq!(fill.each_volume, Volume::microliters(1));
    }

    #[test]
    fn check_requires_equal_concentrations() {
        let equal = EqualConcentration::new(
            [comp("a", 100), comp("b", 100)],
            Volume::microliters(2),
            EqualConcMethod::Check,
        )
        .unwrap();
        assert_eq!(
            equal.each_volumes(Volume::undefined(), &[]).unwrap(),
            vec![Volume::microliters(2); 2]
        );

        let unequal = EqualConcentration::new(
            [comp("a", 100), comp("b", 50)],
            Volume::microliters(2),
            EqualConcMethod::Check,
        )
        .unwrap();
        let err = unequal.each_volumes(Volume::undefined(), &[]).unwrap_err();
        assert!(matches!(err, MixError::ConcentrationsDiffer { .. }));
    }

    #[test]
    fn method_parsing() {
        assert_eq!("check".parse::<EqualConcMethod>().unwrap(), EqualConcMethod::Check);
        let err = "maximum".parse::<EqualConcMethod>().unwrap_err();
        assert_eq!(err, MixError::InvalidMethod("maximum".to_string()));
        assert_eq!(
            "max_fill".parse::<EqualConcMethod>().unwrap().to_string(),
            "max_fill:Buffer"
        );
    }

    #[test]
    fn scaling_multiplies_fixed_volume() {
        let action = FixedVolume::new([comp("a", 100)], Volume::microliters(1)).unwrap();
        let scaled = action.scaled(Decimal::from(3)).unwrap();
        assert_eq!(
            scaled.each_volumes(Volume::undefined(), &[]).unwrap(),
            vec![Volume::microliters(3)]
        );
    }
}
