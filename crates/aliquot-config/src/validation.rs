//! Structural protocol validation.
//!
//! [`validate_protocol`] checks a protocol before any mix is built and
//! returns every problem it finds: duplicate names, unknown action types or
//! parameters, missing required parameters, and component names that do not
//! resolve to a stock component or an earlier mix. Quantity arithmetic is not
//! checked here; that is the core validator's job once mixes are built.
//!
//! # Example
//!
//! ```rust
//! use aliquot_config::{ActionConfig, MixConfig, Protocol, validate_protocol};
//!
//! let mut protocol = Protocol::new("p");
//! protocol.mixes.push(
//!     MixConfig::new("m").with_action(ActionConfig::new("stir").with_component("a")),
//! );
//!
//! let issues = validate_protocol(&protocol);
//! assert_eq!(issues.len(), 2); // unknown type, unknown component
//! ```

use std::collections::HashSet;

use aliquot_core::ActionKind;
use thiserror::Error;

use crate::protocol::Protocol;

/// A structural problem in a protocol file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    /// Two components, two mixes, or a mix and a component share a name.
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName {
        /// "component" or "mix".
        kind: &'static str,
        /// The repeated name.
        name: String,
    },

    /// A mix has no actions.
    #[error("mix '{0}' has no actions")]
    EmptyActions(String),

    /// An action lists no components.
    #[error("action {index} of mix '{mix}' has no components")]
    NoComponents {
        /// Mix name.
        mix: String,
        /// One-based action position.
        index: usize,
    },

    /// The action type id is not registered.
    #[error("unknown action type '{action_type}' in mix '{mix}'")]
    UnknownActionType {
        /// Mix name.
        mix: String,
        /// The unrecognized type id.
        action_type: String,
    },

    /// A parameter the action type does not accept.
    #[error("unknown parameter '{param}' for {action_type} action in mix '{mix}'")]
    UnknownParameter {
        /// Mix name.
        mix: String,
        /// Action type id.
        action_type: &'static str,
        /// The unrecognized parameter.
        param: String,
    },

    /// A required parameter is missing.
    #[error("{action_type} action in mix '{mix}' needs parameter '{param}'")]
    MissingParameter {
        /// Mix name.
        mix: String,
        /// Action type id.
        action_type: &'static str,
        /// The missing parameter.
        param: &'static str,
    },

    /// A fill action lists more than one component.
    #[error("{action_type} action in mix '{mix}' fills with {count} components; exactly one is allowed")]
    MultiComponentFill {
        /// Mix name.
        mix: String,
        /// Action type id.
        action_type: &'static str,
        /// Number of components listed.
        count: usize,
    },

    /// A mix has more than one fill action.
    #[error("mix '{0}' has more than one fill action")]
    MultipleFills(String),

    /// A component name that is neither a stock component nor a mix.
    #[error("mix '{mix}' refers to unknown component '{name}'")]
    UnknownComponent {
        /// Mix name.
        mix: String,
        /// The unresolved name.
        name: String,
    },

    /// A mix used before (or by) its own definition.
    #[error("mix '{mix}' uses mix '{name}' before it is defined")]
    ForwardReference {
        /// Mix name.
        mix: String,
        /// The mix defined later.
        name: String,
    },
}

/// Check a protocol's structure. An empty list means it can be built.
pub fn validate_protocol(protocol: &Protocol) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    let mut components = HashSet::new();
    for component in &protocol.components {
        if !components.insert(component.name.as_str()) {
            issues.push(ConfigIssue::DuplicateName {
                kind: "component",
                name: component.name.clone(),
            });
        }
    }

    let all_mixes: HashSet<&str> = protocol.mixes.iter().map(|m| m.name.as_str()).collect();
    let mut defined: HashSet<&str> = HashSet::new();

    for mix in &protocol.mixes {
        if components.contains(mix.name.as_str()) || defined.contains(mix.name.as_str()) {
            issues.push(ConfigIssue::DuplicateName {
                kind: "mix",
                name: mix.name.clone(),
            });
        }
        if mix.actions.is_empty() {
            issues.push(ConfigIssue::EmptyActions(mix.name.clone()));
        }

        let mut fills = 0;
        for (index, action) in mix.actions.iter().enumerate() {
            if action.components.is_empty() {
                issues.push(ConfigIssue::NoComponents {
                    mix: mix.name.clone(),
                    index: index + 1,
                });
            }
            for name in &action.components {
                if components.contains(name.as_str()) || defined.contains(name.as_str()) {
                    continue;
                }
                if all_mixes.contains(name.as_str()) {
                    issues.push(ConfigIssue::ForwardReference {
                        mix: mix.name.clone(),
                        name: name.clone(),
                    });
                } else {
                    issues.push(ConfigIssue::UnknownComponent {
                        mix: mix.name.clone(),
                        name: name.clone(),
                    });
                }
            }

            let Some(kind) = ActionKind::from_id(&action.action_type) else {
                issues.push(ConfigIssue::UnknownActionType {
                    mix: mix.name.clone(),
                    action_type: action.action_type.clone(),
                });
                continue;
            };
            for param in action.unknown_params(kind) {
                issues.push(ConfigIssue::UnknownParameter {
                    mix: mix.name.clone(),
                    action_type: kind.id(),
                    param: param.to_string(),
                });
            }
            if kind.is_fill() {
                fills += 1;
                if action.components.len() > 1 {
                    issues.push(ConfigIssue::MultiComponentFill {
                        mix: mix.name.clone(),
                        action_type: kind.id(),
                        count: action.components.len(),
                    });
                }
            } else if let Some(&required) = kind.parameters().first()
                && action.get_param(required).is_none()
            {
                issues.push(ConfigIssue::MissingParameter {
                    mix: mix.name.clone(),
                    action_type: kind.id(),
                    param: required,
                });
            }
        }
        if fills > 1 {
            issues.push(ConfigIssue::MultipleFills(mix.name.clone()));
        }

        defined.insert(mix.name.as_str());
    }

    if !issues.is_empty() {
        tracing::debug!("protocol validation found {} issue(s)", issues.len());
    }
    issues
}
