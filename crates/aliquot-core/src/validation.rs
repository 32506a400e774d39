//! Physical-realizability checks for a mix.
//!
//! [`validate`] inspects a mix's resolved recipe lines and returns every
//! problem it finds instead of stopping at the first. Callers decide whether
//! findings are fatal; [`Mix::ensure_valid`] escalates them into
//! [`MixError::Validation`](crate::MixError::Validation).
//!
//! Negative volumes are reported once: the last line (usually the buffer) by
//! [`NegativeBufferVolume`](ValidationFinding::NegativeBufferVolume) or
//! [`NegativeLastLine`](ValidationFinding::NegativeLastLine), any other line by
//! [`NegativeVolumes`](ValidationFinding::NegativeVolumes). The minimum-volume
//! rule only applies to positive volumes.

use thiserror::Error;

use crate::action::ActionKind;
use crate::error::Result;
use crate::mix::Mix;
use crate::mixline::MixLine;
use crate::quantity::Volume;

/// A problem that makes a mix impossible or unwise to prepare.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFinding {
    /// A dilution action needs the mix total volume to be fixed.
    #[error("mix '{mix}' uses a {action} action, so its fixed total volume must be specified")]
    DilutionWithoutFixedVolume {
        /// Mix name.
        mix: String,
        /// Kind of the offending action.
        action: ActionKind,
    },

    /// Some transfer volumes are undefined.
    #[error(
        "some volumes aren't defined (mix probably isn't fully specified): {}",
        .names.join("; ")
    )]
    UndefinedVolumes {
        /// Line names with undefined volumes.
        names: Vec<String>,
    },

    /// Some lines transfer more than the whole mix volume.
    #[error(
        "some items have higher transfer volume than total mix volume of {total} \
         (target concentration probably too high for source): {}",
        format_items(.items)
    )]
    ExceedsTotalVolume {
        /// Mix total volume.
        total: Volume,
        /// Offending line names and volumes.
        items: Vec<(String, Volume)>,
    },

    /// A positive transfer below the minimum pipettable volume.
    #[error(
        "in mix '{mix}', {names} would be pipetted at {volume} each, below the minimum of {min_volume}"
    )]
    BelowMinimumVolume {
        /// Mix name.
        mix: String,
        /// Line names.
        names: String,
        /// Per-component volume.
        volume: Volume,
        /// The mix's minimum volume.
        min_volume: Volume,
    },

    /// The buffer top-up is negative.
    #[error(
        "negative buffer volume {volume} of mix '{mix}' ({buffer_name}); target concentrations \
         are probably too high for the source concentrations"
    )]
    NegativeBufferVolume {
        /// Mix name.
        mix: String,
        /// Buffer name.
        buffer_name: String,
        /// Computed buffer volume.
        volume: Volume,
    },

    /// The last line of a mix without a buffer is negative.
    #[error(
        "last mix component ({names}) has volume {volume} < 0 µL; component target \
         concentrations probably too high"
    )]
    NegativeLastLine {
        /// Line names.
        names: String,
        /// Computed volume.
        volume: Volume,
    },

    /// Lines other than the last have negative volume.
    #[error("some volumes are negative: {}", format_items(.items))]
    NegativeVolumes {
        /// Offending line names and volumes.
        items: Vec<(String, Volume)>,
    },

    /// A nested mix holds less than is drawn from it.
    #[error(
        "intermediate mix '{intermediate}' needs {needed} to create mix '{mix}', but mix \
         '{intermediate}' contains only {available}"
    )]
    InsufficientIntermediateVolume {
        /// Mix being made.
        mix: String,
        /// Nested mix drawn from.
        intermediate: String,
        /// Volume drawn.
        needed: Volume,
        /// Nested mix's fixed total volume.
        available: Volume,
    },
}

impl ValidationFinding {
    /// Stable short code, for machine-readable output.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DilutionWithoutFixedVolume { .. } => "dilution_without_fixed_volume",
            Self::UndefinedVolumes { .. } => "undefined_volumes",
            Self::ExceedsTotalVolume { .. } => "exceeds_total_volume",
            Self::BelowMinimumVolume { .. } => "below_minimum_volume",
            Self::NegativeBufferVolume { .. } => "negative_buffer_volume",
            Self::NegativeLastLine { .. } => "negative_last_line",
            Self::NegativeVolumes { .. } => "negative_volumes",
            Self::InsufficientIntermediateVolume { .. } => "insufficient_intermediate_volume",
        }
    }
}

fn format_items(items: &[(String, Volume)]) -> String {
    items
        .iter()
        .map(|(names, volume)| format!("{names} at {volume}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check `mix` against its recipe `lines` (from [`Mix::mixlines`]).
pub fn validate(mix: &Mix, lines: &[MixLine]) -> Result<Vec<ValidationFinding>> {
    let mut findings = Vec::new();

    if !mix.has_fixed_total_volume()
        && let Some(action) = mix
            .actions()
            .iter()
            .find(|a| a.kind().requires_fixed_total_volume())
    {
        findings.push(ValidationFinding::DilutionWithoutFixedVolume {
            mix: mix.name().to_string(),
            action: action.kind(),
        });
    }

    let totals: Vec<(String, Volume)> = lines
        .iter()
        .map(|line| (line.display_name(), line.total_volume()))
        .collect();

    let undefined: Vec<String> = totals
        .iter()
        .filter(|(_, v)| v.is_undefined())
        .map(|(n, _)| n.clone())
        .collect();
    if !undefined.is_empty() {
        findings.push(ValidationFinding::UndefinedVolumes { names: undefined });
    }

    let total = mix.total_volume()?;
    let high: Vec<(String, Volume)> = totals.iter().filter(|(_, v)| *v > total).cloned().collect();
    if !high.is_empty() {
        findings.push(ValidationFinding::ExceedsTotalVolume { total, items: high });
    }

    for line in lines {
        let each = line.each_volume;
        if each > Volume::zero() && each < mix.min_volume() {
            findings.push(ValidationFinding::BelowMinimumVolume {
                mix: mix.name().to_string(),
                names: line.display_name(),
                volume: each,
                min_volume: mix.min_volume(),
            });
        }
    }

    if let Some((last, rest)) = lines.split_last() {
        let last_total = last.total_volume();
        if last_total < Volume::zero() {
            if last.is_buffer {
                findings.push(ValidationFinding::NegativeBufferVolume {
                    mix: mix.name().to_string(),
                    buffer_name: last.display_name(),
                    volume: last_total,
                });
            } else {
                findings.push(ValidationFinding::NegativeLastLine {
                    names: last.display_name(),
                    volume: last_total,
                });
            }
        }

        let negative: Vec<(String, Volume)> = rest
            .iter()
            .map(|line| (line.display_name(), line.total_volume()))
            .filter(|(_, v)| *v < Volume::zero())
            .collect();
        if !negative.is_empty() {
            findings.push(ValidationFinding::NegativeVolumes { items: negative });
        }
    }

    for action in mix.actions() {
        let volumes = action.each_volumes(total, mix.actions())?;
        for (component, volume) in action.components().iter().zip(volumes) {
            if let Some(intermediate) = component.as_mix()
                && intermediate.fixed_total_volume() < volume
            {
                findings.push(ValidationFinding::InsufficientIntermediateVolume {
                    mix: mix.name().to_string(),
                    intermediate: intermediate.name().to_string(),
                    needed: volume,
                    available: intermediate.fixed_total_volume(),
                });
            }
        }
    }

    if !findings.is_empty() {
        tracing::debug!("validate: mix {} has {} finding(s)", mix.name(), findings.len());
    }
    Ok(findings)
}
