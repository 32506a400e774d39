//! Error types for mix construction and resolution.

use thiserror::Error;

use crate::quantity::Volume;
use crate::validation::ValidationFinding;
use crate::well::WellPos;

/// Errors raised while building, resolving, or transforming a mix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MixError {
    /// A mix was created without any actions
    #[error("mix '{0}' has no actions")]
    EmptyActions(String),

    /// An action was created with an empty component list
    #[error("{action} action has no components")]
    NoComponents {
        /// Registry id of the action kind.
        action: &'static str,
    },

    /// A fill action was given more than one component
    #[error("fill action can only fill with one component, got {0}")]
    MultiComponentFill(usize),

    /// An acoustic volume is not a whole number of droplets
    #[error("volume {volume} is not a multiple of droplet volume {droplet}")]
    NotDropletMultiple {
        /// The offending volume.
        volume: Volume,
        /// Droplet volume of the dispenser.
        droplet: Volume,
    },

    /// Droplet volume is zero, negative, or undefined
    #[error("invalid droplet volume {0}")]
    InvalidDropletVolume(Volume),

    /// Unknown equal-concentration method name
    #[error("unknown equal-concentration method '{0}'")]
    InvalidMethod(String),

    /// The `check` method found components with differing concentrations
    #[error("concentrations of {names} are not all equal")]
    ConcentrationsDiffer {
        /// Comma-separated component names.
        names: String,
    },

    /// More than one fill action in a single mix
    #[error("mix has more than one fill action; fill volumes depend on each other")]
    MultipleFillActions,

    /// A dilution action requires the mix total volume to be fixed
    #[error("mix '{0}' has a dilution action but no fixed total volume")]
    DilutionWithoutFixedVolume(String),

    /// Total volume could not be resolved
    #[error("total volume of mix '{0}' is undefined")]
    UndefinedTotalVolume(String),

    /// Component named in a protocol is not defined anywhere
    #[error("unknown component '{0}'")]
    UnknownComponent(String),

    /// Component attributes disagree with every matching reference row
    #[error("component '{name}' does not match reference: {details}")]
    ReferenceMismatch {
        /// Component name.
        name: String,
        /// Human-readable list of mismatched fields.
        details: String,
    },

    /// Two different components assigned to the same well of a plate map
    #[error("well {well} on plate '{plate}' holds both '{existing}' and '{incoming}'")]
    DuplicateWell {
        /// Plate name.
        plate: String,
        /// Contested well.
        well: WellPos,
        /// Name already in the well.
        existing: String,
        /// Name that collided.
        incoming: String,
    },

    /// Well position outside the plate geometry
    #[error("well {well} is outside a {rows}x{cols} plate")]
    WellOutOfRange {
        /// The well position.
        well: WellPos,
        /// Plate row count.
        rows: u8,
        /// Plate column count.
        cols: u8,
    },

    /// Split parameters out of range
    #[error("invalid split: {0}")]
    InvalidSplit(String),

    /// Validation reported one or more problems
    #[error("mix '{mix}' failed validation with {} finding(s): {}", .findings.len(), join_findings(.findings))]
    Validation {
        /// Mix name.
        mix: String,
        /// Every finding, in rule order.
        findings: Vec<ValidationFinding>,
    },
}

impl MixError {
    /// Create a droplet-multiple error.
    pub fn not_droplet_multiple(volume: Volume, droplet: Volume) -> Self {
        MixError::NotDropletMultiple { volume, droplet }
    }

    /// Create a reference-mismatch error.
    pub fn reference_mismatch(name: impl Into<String>, details: impl Into<String>) -> Self {
        MixError::ReferenceMismatch {
            name: name.into(),
            details: details.into(),
        }
    }
}

fn join_findings(findings: &[ValidationFinding]) -> String {
    findings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for mix operations.
pub type Result<T> = std::result::Result<T, MixError>;
