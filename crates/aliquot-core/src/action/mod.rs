//! Pipetting actions.
//!
//! An [`Action`] is a rule over an ordered list of source components that
//! computes, for a given mix volume and the full list of sibling actions in
//! the same mix, how much of each component to transfer and what
//! concentration it reaches in the destination.
//!
//! | kind | volume rule |
//! |------|-------------|
//! | [`FixedVolume`] | the same caller-given volume for every component |
//! | [`EqualConcentration`] | a fixed volume adjusted so every component ends at the same concentration |
//! | [`FixedConcentration`] | `mix_volume * target / source` |
//! | [`FillToVolume`] | target total minus every other action's volume |
//! | `Echo*` | acoustic variants, rounded to whole droplets |
//!
//! Undefined mix volumes propagate into undefined transfer volumes rather
//! than errors; validation reports them.

mod echo;
mod fill;
mod fixed_concentration;
mod fixed_volume;

pub use echo::{
    EchoEqualTargetConcentration, EchoFillToVolume, EchoFixedVolume, EchoTargetConcentration,
};
pub use fill::FillToVolume;
pub use fixed_concentration::FixedConcentration;
pub use fixed_volume::{EqualConcMethod, EqualConcentration, FixedVolume};

use std::fmt;

use rust_decimal::Decimal;

use crate::component::{Reagent, Source};
use crate::error::{MixError, Result};
use crate::mixline::MixLine;
use crate::quantity::{Concentration, Volume};
use crate::table::ComponentTable;

/// Droplet volume of an acoustic dispenser unless configured otherwise (nL).
pub const DEFAULT_DROPLET_NL: i64 = 25;

/// [`DEFAULT_DROPLET_NL`] as a volume.
pub fn default_droplet_volume() -> Volume {
    Volume::nanoliters(DEFAULT_DROPLET_NL)
}

/// Every kind of action, with metadata for configuration and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Identical fixed volume of each component.
    FixedVolume,
    /// Fixed volume adjusted to equalize destination concentrations.
    EqualConcentration,
    /// Dilution to a target concentration.
    FixedConcentration,
    /// Top up to a target total volume.
    FillToVolume,
    /// Acoustic fixed volume.
    EchoFixedVolume,
    /// Acoustic equal target concentration.
    EchoEqualTargetConcentration,
    /// Acoustic dilution to a target concentration.
    EchoTargetConcentration,
    /// Acoustic top-up.
    EchoFillToVolume,
}

impl ActionKind {
    /// Every action kind, in listing order.
    pub const ALL: [ActionKind; 8] = [
        ActionKind::FixedVolume,
        ActionKind::EqualConcentration,
        ActionKind::FixedConcentration,
        ActionKind::FillToVolume,
        ActionKind::EchoFixedVolume,
        ActionKind::EchoEqualTargetConcentration,
        ActionKind::EchoTargetConcentration,
        ActionKind::EchoFillToVolume,
    ];

    /// Stable identifier used in protocol files (lowercase, underscores).
    pub const fn id(&self) -> &'static str {
        match self {
            ActionKind::FixedVolume => "fixed_volume",
            ActionKind::EqualConcentration => "equal_concentration",
            ActionKind::FixedConcentration => "fixed_concentration",
            ActionKind::FillToVolume => "fill_to_volume",
            ActionKind::EchoFixedVolume => "echo_fixed_volume",
            ActionKind::EchoEqualTargetConcentration => "echo_equal_target_concentration",
            ActionKind::EchoTargetConcentration => "echo_target_concentration",
            ActionKind::EchoFillToVolume => "echo_fill_to_volume",
        }
    }

    /// Human-readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            ActionKind::FixedVolume => "Fixed Volume",
            ActionKind::EqualConcentration => "Equal Concentration",
            ActionKind::FixedConcentration => "Fixed Concentration",
            ActionKind::FillToVolume => "Fill to Volume",
            ActionKind::EchoFixedVolume => "Echo Fixed Volume",
            ActionKind::EchoEqualTargetConcentration => "Echo Equal Target Concentration",
            ActionKind::EchoTargetConcentration => "Echo Target Concentration",
            ActionKind::EchoFillToVolume => "Echo Fill to Volume",
        }
    }

    /// One-line description.
    pub const fn description(&self) -> &'static str {
        match self {
            ActionKind::FixedVolume => "Transfer the same fixed volume of every component",
            ActionKind::EqualConcentration => {
                "Transfer a fixed volume, adjusted so every component reaches the same concentration"
            }
            ActionKind::FixedConcentration => {
                "Dilute every component to a target concentration in the mix"
            }
            ActionKind::FillToVolume => "Top up with one component to a target total volume",
            ActionKind::EchoFixedVolume => "Acoustic transfer of a fixed whole-droplet volume",
            ActionKind::EchoEqualTargetConcentration => {
                "Acoustic equal-concentration transfer, rounded to whole droplets"
            }
            ActionKind::EchoTargetConcentration => {
                "Acoustic dilution to a target concentration, rounded to whole droplets"
            }
            ActionKind::EchoFillToVolume => "Acoustic top-up, rounded to whole droplets",
        }
    }

    /// Whether volumes are quantized to droplets.
    pub const fn is_acoustic(&self) -> bool {
        matches!(
            self,
            ActionKind::EchoFixedVolume
                | ActionKind::EchoEqualTargetConcentration
                | ActionKind::EchoTargetConcentration
                | ActionKind::EchoFillToVolume
        )
    }

    /// Whether the enclosing mix must have a fixed total volume.
    pub const fn requires_fixed_total_volume(&self) -> bool {
        matches!(
            self,
            ActionKind::FixedConcentration | ActionKind::EchoTargetConcentration
        )
    }

    /// Whether the action fills the mix up to a target volume.
    pub const fn is_fill(&self) -> bool {
        matches!(self, ActionKind::FillToVolume | ActionKind::EchoFillToVolume)
    }

    /// Parameter names accepted in protocol files; the first is required
    /// unless the kind is a fill.
    pub const fn parameters(&self) -> &'static [&'static str] {
        match self {
            ActionKind::FixedVolume => &["fixed_volume", "set_name"],
            ActionKind::EqualConcentration => &["fixed_volume", "method", "set_name"],
            ActionKind::FixedConcentration => &["fixed_concentration"],
            ActionKind::FillToVolume => &["target_total_volume"],
            ActionKind::EchoFixedVolume => &["fixed_volume", "droplet_volume", "set_name"],
            ActionKind::EchoEqualTargetConcentration => {
                &["fixed_volume", "method", "droplet_volume", "set_name"]
            }
            ActionKind::EchoTargetConcentration => &["target_concentration", "droplet_volume"],
            ActionKind::EchoFillToVolume => &["target_total_volume", "droplet_volume"],
        }
    }

    /// Look up a kind by its [`id`](Self::id). Case-insensitive; hyphens are
    /// accepted in place of underscores.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|k| k.id() == id)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A rule computing transfer volumes for its components.
///
/// `each_volumes` and `dest_concentrations` return one entry per component,
/// in component order. `siblings` is the full action list of the enclosing
/// mix, including this action; fill actions use it to find what is left.
pub trait Action: fmt::Debug + Send + Sync {
    /// The kind of this action.
    fn kind(&self) -> ActionKind;

    /// Source components, in order.
    fn components(&self) -> &[Source];

    /// Mutable access to the components, for in-place reconciliation.
    fn components_mut(&mut self) -> &mut [Source];

    /// Volume transferred from each component.
    fn each_volumes(&self, mix_volume: Volume, siblings: &[Box<dyn Action>]) -> Result<Vec<Volume>>;

    /// Stock concentration of each component.
    fn source_concentrations(&self) -> Result<Vec<Concentration>> {
        self.components().iter().map(Reagent::concentration).collect()
    }

    /// Concentration each component reaches in the destination mix:
    /// `source * each_volume / mix_volume`.
    fn dest_concentrations(
        &self,
        mix_volume: Volume,
        siblings: &[Box<dyn Action>],
    ) -> Result<Vec<Concentration>> {
        let volumes = self.each_volumes(mix_volume, siblings)?;
        let sources = self.source_concentrations()?;
        Ok(sources
            .into_iter()
            .zip(volumes)
            .map(|(source, volume)| source * (volume / mix_volume))
            .collect())
    }

    /// Total volume transferred by this action.
    fn tx_volume(&self, mix_volume: Volume, siblings: &[Box<dyn Action>]) -> Result<Volume> {
        Ok(self.each_volumes(mix_volume, siblings)?.into_iter().sum())
    }

    /// Display name given to the whole component set, if any.
    fn set_name(&self) -> Option<&str> {
        None
    }

    /// The set name, or the component names joined with `", "`.
    fn name(&self) -> String {
        match self.set_name() {
            Some(name) => name.to_string(),
            None => self
                .components()
                .iter()
                .map(Reagent::name)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Note printed next to this action's lines.
    fn note(&self) -> Option<String> {
        None
    }

    /// Droplet volume for acoustic actions.
    fn droplet_volume(&self) -> Option<Volume> {
        None
    }

    /// Copy with fixed volumes multiplied by `factor`, for actions whose
    /// volumes scale with batch size. `None` for all others.
    fn scaled(&self, _factor: Decimal) -> Option<Box<dyn Action>> {
        None
    }

    /// Clone into a new box.
    fn clone_box(&self) -> Box<dyn Action>;

    /// Every leaf component this action contributes, with its concentration
    /// in the destination. Nested mixes are expanded and diluted by the
    /// fraction of the destination they make up.
    fn all_components(
        &self,
        mix_volume: Volume,
        siblings: &[Box<dyn Action>],
    ) -> Result<ComponentTable> {
        let volumes = self.each_volumes(mix_volume, siblings)?;
        let dests = self.dest_concentrations(mix_volume, siblings)?;
        let mut table = ComponentTable::new();
        for ((source, volume), dest) in self.components().iter().zip(volumes).zip(dests) {
            match source {
                Source::Mix(mix) => table.merge(mix.all_components()?.scaled(volume / mix_volume)),
                leaf => table.insert(leaf.clone(), dest),
            }
        }
        Ok(table)
    }

    /// Recipe lines. Components sharing source concentration, destination
    /// concentration, volume and plate share a line; order is preserved.
    fn mixlines(&self, mix_volume: Volume, siblings: &[Box<dyn Action>]) -> Result<Vec<MixLine>> {
        group_lines(self, mix_volume, siblings)
    }
}

impl Clone for Box<dyn Action> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Default recipe-line grouping, shared by actions that extend their lines.
pub(crate) fn group_lines<A: Action + ?Sized>(
    action: &A,
    mix_volume: Volume,
    siblings: &[Box<dyn Action>],
) -> Result<Vec<MixLine>> {
    let volumes = action.each_volumes(mix_volume, siblings)?;
    let sources = action.source_concentrations()?;
    let dests = action.dest_concentrations(mix_volume, siblings)?;
    let note = action.note();

    let mut lines: Vec<MixLine> = Vec::new();
    for (((component, source), dest), volume) in
        action.components().iter().zip(sources).zip(dests).zip(volumes)
    {
        let plate = component.plate();
        match lines
            .iter()
            .position(|line| line.accepts(source, dest, volume, plate))
        {
            Some(i) => lines[i].push(component.name(), component.well()),
            None => {
                let mut line = MixLine::new(
                    component.name(),
                    source,
                    dest,
                    volume,
                    plate,
                    component.well(),
                );
                line.note.clone_from(&note);
                lines.push(line);
            }
        }
    }
    if let (Some(label), [line]) = (action.set_name(), lines.as_mut_slice()) {
        line.label = Some(label.to_string());
    }
    Ok(lines)
}

pub(crate) fn require_components(kind: ActionKind, components: &[Source]) -> Result<()> {
    if components.is_empty() {
        return Err(MixError::NoComponents { action: kind.id() });
    }
    Ok(())
}

pub(crate) fn check_droplet_volume(droplet: Volume) -> Result<()> {
    if droplet.is_defined() && droplet > Volume::zero() {
        Ok(())
    } else {
        Err(MixError::InvalidDropletVolume(droplet))
    }
}

pub(crate) fn check_droplet_multiple(volume: Volume, droplet: Volume) -> Result<()> {
    if volume.is_multiple_of(droplet) {
        Ok(())
    } else {
        Err(MixError::not_droplet_multiple(volume, droplet))
    }
}

/// Sum of every sibling's transfer volume except `this` one's.
///
/// Fails with [`MixError::MultipleFillActions`] if another sibling is a fill,
/// since two fills would each depend on the other.
pub(crate) fn other_volumes(
    this: &dyn Action,
    mix_volume: Volume,
    siblings: &[Box<dyn Action>],
) -> Result<Volume> {
    let mut total = Volume::zero();
    for sibling in siblings {
        if std::ptr::addr_eq(this, sibling.as_ref()) {
            continue;
        }
        if sibling.kind().is_fill() {
            return Err(MixError::MultipleFillActions);
        }
        total = total + sibling.tx_volume(mix_volume, siblings)?;
    }
    Ok(total)
}
