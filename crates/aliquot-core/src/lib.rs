//! Aliquot Core - quantity propagation and validation for liquid-handling mixes
//!
//! This crate plans laboratory mixes: which volume of which source component
//! to pipette so that a destination tube ends up at the intended
//! concentrations, and whether that plan can physically be carried out.
//!
//! # Core Abstractions
//!
//! ## Quantities
//!
//! - [`Quantity`] - Decimal magnitude tagged with a [`Dimension`], possibly undefined
//! - [`Volume`], [`Concentration`], [`Ratio`] - The three dimensions in use
//!
//! ## Reagents
//!
//! - [`Reagent`] - Capability interface shared by every source
//! - [`Component`] / [`Strand`] - Leaf reagents, optionally located on a plate
//! - [`Source`] - Closed set of component, strand, or nested [`Mix`]
//! - [`Reference`] - In-memory reference table components are reconciled against
//!
//! ## Actions
//!
//! - [`Action`] - Object-safe transfer rule over an ordered component list
//! - [`ActionKind`] - Registry of every action type with stable ids
//! - [`FixedVolume`], [`EqualConcentration`], [`FixedConcentration`], [`FillToVolume`]
//! - [`EchoFixedVolume`], [`EchoEqualTargetConcentration`],
//!   [`EchoTargetConcentration`], [`EchoFillToVolume`] - Droplet-quantized variants
//!
//! ## Mixes
//!
//! - [`Mix`] - Ordered actions plus total volume, concentration and buffer policy
//! - [`MixLine`] - Grouped recipe lines
//! - [`validate`] / [`ValidationFinding`] - Every physical-realizability problem at once
//! - [`split_mix`] - Batch mix for aliquoting into identical tubes
//! - [`VolumeLedger`] - Made and consumed volumes across nested mixes
//! - [`PlateMap`] - Well assignments per plate and volume
//!
//! # Example
//!
//! ```rust
//! use aliquot_core::{Action, Component, Concentration, FixedConcentration, FixedVolume, Mix, Volume};
//!
//! let stock = Component::new("oligo").with_concentration("1 uM".parse().unwrap());
//! let salt = Component::new("MgCl2").with_concentration("100 mM".parse().unwrap());
//!
//! let actions: Vec<Box<dyn Action>> = vec![
//!     Box::new(FixedConcentration::new([stock], Concentration::nanomolar(50)).unwrap()),
//!     Box::new(FixedVolume::new([salt], Volume::microliters(2)).unwrap()),
//! ];
//! let mix = Mix::new("annealing", actions)
//!     .unwrap()
//!     .with_fixed_total_volume(Volume::microliters(100));
//!
//! assert_eq!(mix.buffer_volume().unwrap(), Volume::microliters(93));
//! assert!(mix.validate().unwrap().is_empty());
//! ```
//!
//! # Design Principles
//!
//! - **Undefined propagates**: unknown quantities flow through arithmetic instead of failing
//! - **Findings, not panics**: validation collects every problem; callers decide what is fatal
//! - **Pure transforms**: `with_*` returns a new value; `update_*` is the explicit in-place form

pub mod action;
pub mod component;
pub mod error;
pub mod ledger;
pub mod mix;
pub mod mixline;
pub mod plate_map;
pub mod quantity;
pub mod reference;
pub mod split;
pub mod table;
pub mod validation;
pub mod well;

// Re-export main types at crate root
pub use action::{
    Action, ActionKind, DEFAULT_DROPLET_NL, EchoEqualTargetConcentration, EchoFillToVolume,
    EchoFixedVolume, EchoTargetConcentration, EqualConcMethod, EqualConcentration, FillToVolume,
    FixedConcentration, FixedVolume, default_droplet_volume,
};
pub use component::{Component, Reagent, Source, Strand, normalize_sequence};
pub use error::{MixError, Result};
pub use ledger::VolumeLedger;
pub use mix::{AliquotPlan, DEFAULT_BUFFER_NAME, DEFAULT_MIN_VOLUME_UL, Mix, MixConcentration};
pub use mixline::MixLine;
pub use plate_map::PlateMap;
pub use quantity::{
    Concentration, ConcentrationDim, Dimension, Quantity, QuantityParseError, Ratio, RatioDim,
    Volume, VolumeDim,
};
pub use reference::{Reference, ReferenceRow};
pub use split::split_mix;
pub use table::{ComponentTable, TableEntry};
pub use validation::{ValidationFinding, validate};
pub use well::{PlateType, WellError, WellPos};
