//! Protocol file format and building core mixes from it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use aliquot_core::{
    Component, Concentration, Mix, MixConcentration, Reference, ReferenceRow, Source, Strand,
    WellPos,
};
use serde::{Deserialize, Serialize};

use crate::action_config::ActionConfig;
use crate::error::ConfigError;
use crate::settings::{Settings, parse_volume};
use crate::validation::validate_protocol;

/// A protocol: stock components, an optional reference table, and the mixes
/// to plan, in dependency order.
///
/// # TOML Format
///
/// ```toml
/// name = "Tile assembly"
///
/// [[reference]]
/// name = "s1"
/// concentration = "100 uM"
/// plate = "P1"
/// well = "A1"
///
/// [[components]]
/// name = "s1"
///
/// [[components]]
/// name = "MgCl2"
/// concentration = "1 M"
/// plate = "tube"
///
/// [[mixes]]
/// name = "staples"
/// fixed_total_volume = "100 uL"
///
/// [[mixes.actions]]
/// type = "fixed_concentration"
/// components = ["s1"]
/// fixed_concentration = "1 uM"
///
/// [[mixes.actions]]
/// type = "fixed_volume"
/// components = ["MgCl2"]
/// fixed_volume = "1.25 uL"
/// ```
///
/// Components of an action may name stock components or any mix defined
/// earlier in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Protocol {
    /// Name of the protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Reference rows bound to every mix.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference: Vec<ReferenceConfig>,

    /// Stock components.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentConfig>,

    /// Mixes, each usable by later ones.
    #[serde(default)]
    pub mixes: Vec<MixConfig>,
}

/// A stock component; a `sequence` makes it a strand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ComponentConfig {
    /// Unique name.
    pub name: String,
    /// Stock concentration, e.g. `"100 uM"`; taken from the reference when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concentration: Option<String>,
    /// Plate name, or `"tube"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    /// Well, e.g. `"B7"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well: Option<String>,
    /// Strand sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
}

/// One row of the reference table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReferenceConfig {
    /// Component name.
    pub name: String,
    /// Concentration.
    pub concentration: String,
    /// Plate name.
    #[serde(default)]
    pub plate: String,
    /// Well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well: Option<String>,
    /// Sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
}

/// A mix and its actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MixConfig {
    /// Unique name.
    pub name: String,
    /// Label written on the tube.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_tube_name: Option<String>,
    /// Total volume; derived from the actions when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_total_volume: Option<String>,
    /// A concentration such as `"50 nM"`, or the name of a component whose
    /// concentration the mix reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_concentration: Option<String>,
    /// Overrides the settings buffer name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_name: Option<String>,
    /// Overrides the settings minimum volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_volume: Option<String>,
    /// Where the mix itself is made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    /// Well the mix is made in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well: Option<String>,
    /// Actions in order.
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

fn parse_well(context: &str, value: Option<&str>) -> Result<Option<WellPos>, ConfigError> {
    value
        .map(|w| {
            w.parse().map_err(|source| ConfigError::InvalidWell {
                context: context.to_string(),
                value: w.to_string(),
                source,
            })
        })
        .transpose()
}

fn parse_concentration(context: &str, value: &str) -> Result<Concentration, ConfigError> {
    value
        .parse()
        .map_err(|e| ConfigError::invalid_quantity(context, value, e))
}

impl ComponentConfig {
    /// Create a component entry with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Convert into a core source.
    pub fn to_source(&self) -> Result<Source, ConfigError> {
        let context = format!("component '{}'", self.name);
        let concentration = match &self.concentration {
            Some(c) => parse_concentration(&context, c)?,
            None => Concentration::undefined(),
        };
        let plate = self.plate.clone().unwrap_or_default();
        let well = parse_well(&context, self.well.as_deref())?;

        Ok(match &self.sequence {
            Some(sequence) => Strand::new(&self.name)
                .with_concentration(concentration)
                .with_location(plate, well)
                .with_sequence(sequence)
                .into(),
            None => Component::new(&self.name)
                .with_concentration(concentration)
                .with_location(plate, well)
                .into(),
        })
    }
}

impl ReferenceConfig {
    /// Convert into a core reference row.
    pub fn to_row(&self) -> Result<ReferenceRow, ConfigError> {
        let context = format!("reference row '{}'", self.name);
        let row = ReferenceRow::new(
            &self.name,
            parse_concentration(&context, &self.concentration)?,
            &self.plate,
            parse_well(&context, self.well.as_deref())?,
        );
        Ok(match &self.sequence {
            Some(sequence) => row.with_sequence(sequence),
            None => row,
        })
    }
}

impl MixConfig {
    /// Create a mix entry with no actions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an action (builder pattern).
    pub fn with_action(mut self, action: ActionConfig) -> Self {
        self.actions.push(action);
        self
    }

    /// How the mix reports its concentration. A value that parses as a
    /// concentration is literal; anything else names a component.
    pub fn concentration_policy(&self) -> MixConcentration {
        match &self.fixed_concentration {
            None => MixConcentration::Derived,
            Some(value) => match value.parse::<Concentration>() {
                Ok(c) if c.is_defined() => MixConcentration::Fixed(c),
                Ok(_) => MixConcentration::Derived,
                Err(_) => MixConcentration::Of(value.trim().to_string()),
            },
        }
    }

    /// Build the core mix, resolving component names against `sources`.
    pub fn build(
        &self,
        sources: &HashMap<String, Source>,
        settings: &Settings,
    ) -> Result<Mix, ConfigError> {
        let droplet = settings.droplet_volume()?;
        let mut actions = Vec::with_capacity(self.actions.len());
        for action in &self.actions {
            let resolved = action
                .components
                .iter()
                .map(|name| {
                    sources.get(name).cloned().ok_or_else(|| ConfigError::UnknownComponent {
                        mix: self.name.clone(),
                        name: name.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            actions.push(action.build(resolved, droplet)?);
        }

        let context = format!("mix '{}'", self.name);
        let min_volume = match &self.min_volume {
            Some(v) => parse_volume(&format!("{context} min_volume"), v)?,
            None => settings.min_volume()?,
        };
        let mut mix = Mix::new(&self.name, actions)?
            .with_buffer_name(self.buffer_name.as_deref().unwrap_or(&settings.buffer_name))
            .with_min_volume(min_volume)
            .with_fixed_concentration(self.concentration_policy());
        if let Some(total) = &self.fixed_total_volume {
            mix = mix.with_fixed_total_volume(parse_volume(
                &format!("{context} fixed_total_volume"),
                total,
            )?);
        }
        if let Some(tube) = &self.test_tube_name {
            mix = mix.with_test_tube_name(tube);
        }
        if self.plate.is_some() || self.well.is_some() {
            mix = mix.with_location(
                self.plate.clone().unwrap_or_default(),
                parse_well(&context, self.well.as_deref())?,
            );
        }
        Ok(mix)
    }
}

impl Protocol {
    /// Create an empty protocol.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Load a protocol from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a protocol from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the protocol to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Convert the protocol to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Mix names in file order.
    pub fn mix_names(&self) -> Vec<&str> {
        self.mixes.iter().map(|m| m.name.as_str()).collect()
    }

    /// The reference table built from `[[reference]]` rows.
    pub fn reference_table(&self) -> Result<Reference, ConfigError> {
        self.reference.iter().map(ReferenceConfig::to_row).collect()
    }

    /// Build every mix in file order.
    ///
    /// The protocol is validated first; structural problems are returned
    /// together as [`ConfigError::Invalid`]. When a reference table is
    /// present, every mix is reconciled against it.
    pub fn build(&self, settings: &Settings) -> Result<Vec<Mix>, ConfigError> {
        let issues = validate_protocol(self);
        if !issues.is_empty() {
            return Err(ConfigError::Invalid(issues));
        }

        let reference = self.reference_table()?;
        let mut sources: HashMap<String, Source> = HashMap::new();
        for component in &self.components {
            sources.insert(component.name.clone(), component.to_source()?);
        }

        let mut mixes = Vec::with_capacity(self.mixes.len());
        for config in &self.mixes {
            let mut mix = config.build(&sources, settings)?;
            if !reference.is_empty() {
                mix.update_reference(&reference)?;
            }
            tracing::debug!(
                "built mix {} with {} action(s)",
                mix.name(),
                mix.actions().len()
            );
            sources.insert(mix.name().to_string(), Source::Mix(Arc::new(mix.clone())));
            mixes.push(mix);
        }
        Ok(mixes)
    }

    /// Build the protocol and return the mix called `name`.
    pub fn build_mix(&self, name: &str, settings: &Settings) -> Result<Mix, ConfigError> {
        self.build(settings)?
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| ConfigError::MixNotFound(name.to_string()))
    }
}
