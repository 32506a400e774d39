//! Action configuration types.

use std::collections::BTreeMap;
use std::str::FromStr;

use aliquot_core::{
    Action, ActionKind, Concentration, EchoEqualTargetConcentration, EchoFillToVolume,
    EchoFixedVolume, EchoTargetConcentration, EqualConcMethod, EqualConcentration, FillToVolume,
    FixedConcentration, FixedVolume, Source, Volume,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a single action in a mix.
///
/// Each action has a type id (see [`ActionKind::id`]), the names of the
/// components it draws from, and type-specific parameters as strings.
///
/// # Example
///
/// ```rust
/// use aliquot_config::ActionConfig;
///
/// let config = ActionConfig::new("fixed_volume")
///     .with_components(["a", "b"])
///     .with_param("fixed_volume", "5 uL");
///
/// assert_eq!(config.action_type, "fixed_volume");
/// assert_eq!(config.get_param("fixed_volume"), Some("5 uL"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionConfig {
    /// Action type id (e.g. "fixed_volume", "echo_target_concentration").
    #[serde(rename = "type")]
    pub action_type: String,

    /// Names of components or earlier mixes, in order.
    #[serde(default)]
    pub components: Vec<String>,

    /// Parameters such as `fixed_volume = "5 uL"`.
    #[serde(flatten)]
    pub params: BTreeMap<String, String>,
}

impl ActionConfig {
    /// Create a new action configuration.
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            components: Vec::new(),
            params: BTreeMap::new(),
        }
    }

    /// Append a component name.
    pub fn with_component(mut self, name: impl Into<String>) -> Self {
        self.components.push(name.into());
        self
    }

    /// Append several component names.
    pub fn with_components<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.components.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add a parameter to the configuration.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Get a parameter value.
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Resolve the action type.
    pub fn kind(&self) -> Result<ActionKind, ConfigError> {
        ActionKind::from_id(&self.action_type)
            .ok_or_else(|| ConfigError::UnknownAction(self.action_type.clone()))
    }

    /// Parameters not accepted by `kind`.
    pub fn unknown_params(&self, kind: ActionKind) -> Vec<&str> {
        self.params
            .keys()
            .map(String::as_str)
            .filter(|key| !kind.parameters().contains(key))
            .collect()
    }

    /// Parse an optional quantity parameter.
    pub fn quantity_param<Q>(&self, key: &str) -> Result<Option<Q>, ConfigError>
    where
        Q: FromStr<Err = aliquot_core::QuantityParseError>,
    {
        self.get_param(key)
            .map(|value| {
                value.parse().map_err(|e| {
                    ConfigError::invalid_quantity(
                        format!("action '{}' parameter '{key}'", self.action_type),
                        value,
                        e,
                    )
                })
            })
            .transpose()
    }

    fn required<Q>(&self, key: &str) -> Result<Q, ConfigError>
    where
        Q: FromStr<Err = aliquot_core::QuantityParseError>,
    {
        self.quantity_param(key)?
            .ok_or_else(|| ConfigError::invalid_parameter(&self.action_type, key, "missing"))
    }

    fn method(&self) -> Result<EqualConcMethod, ConfigError> {
        Ok(self
            .get_param("method")
            .map(str::parse::<EqualConcMethod>)
            .transpose()?
            .unwrap_or_default())
    }

    /// Build the core action over already-resolved `sources`.
    ///
    /// `default_droplet` applies to acoustic actions without an explicit
    /// `droplet_volume` parameter.
    pub fn build(
        &self,
        sources: Vec<Source>,
        default_droplet: Volume,
    ) -> Result<Box<dyn Action>, ConfigError> {
        let kind = self.kind()?;
        if let Some(param) = self.unknown_params(kind).first() {
            return Err(ConfigError::invalid_parameter(
                kind.id(),
                *param,
                format!("accepted parameters are: {}", kind.parameters().join(", ")),
            ));
        }
        let droplet: Volume = self
            .quantity_param("droplet_volume")?
            .unwrap_or(default_droplet);
        let set_name = self.get_param("set_name");

        let action: Box<dyn Action> = match kind {
            ActionKind::FixedVolume => {
                let mut action = FixedVolume::new(sources, self.required("fixed_volume")?)?;
                if let Some(name) = set_name {
                    action = action.with_set_name(name);
                }
                Box::new(action)
            }
            ActionKind::EqualConcentration => {
                let mut action =
                    EqualConcentration::new(sources, self.required("fixed_volume")?, self.method()?)?;
                if let Some(name) = set_name {
                    action = action.with_set_name(name);
                }
                Box::new(action)
            }
            ActionKind::FixedConcentration => Box::new(FixedConcentration::new(
                sources,
                self.required::<Concentration>("fixed_concentration")?,
            )?),
            ActionKind::FillToVolume => {
                let mut action = FillToVolume::from_components(sources)?;
                if let Some(target) = self.quantity_param("target_total_volume")? {
                    action = action.with_target(target);
                }
                Box::new(action)
            }
            ActionKind::EchoFixedVolume => {
                let mut action =
                    EchoFixedVolume::new_with_droplet(sources, self.required("fixed_volume")?, droplet)?;
                if let Some(name) = set_name {
                    action = action.with_set_name(name);
                }
                Box::new(action)
            }
            ActionKind::EchoEqualTargetConcentration => {
                let mut action = EchoEqualTargetConcentration::new_with_droplet(
                    sources,
                    self.required("fixed_volume")?,
                    self.method()?,
                    droplet,
                )?;
                if let Some(name) = set_name {
                    action = action.with_set_name(name);
                }
                Box::new(action)
            }
            ActionKind::EchoTargetConcentration => Box::new(
                EchoTargetConcentration::new(
                    sources,
                    self.required::<Concentration>("target_concentration")?,
                )?
                .with_droplet_volume(droplet)?,
            ),
            ActionKind::EchoFillToVolume => {
                let mut action = EchoFillToVolume::from_components(sources)?.with_droplet_volume(droplet)?;
                if let Some(target) = self.quantity_param("target_total_volume")? {
                    action = action.with_target(target);
                }
                Box::new(action)
            }
        };
        Ok(action)
    }
}
