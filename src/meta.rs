//! UI component tree construction for prompt nodes.
//!
//! [`MetaBuilder`] is a pure constructor: it never touches a
//! [`crate::context::NodeContext`] and produces an opaque, serializable
//! [`MetaStructure`] blob the engine treats as a black box and forwards to
//! the caller only when a flow runs in verbose mode. It is usable directly
//! by executors that want to hand back a prompt's UI tree themselves.

use serde::{Deserialize, Serialize};

use crate::context::Input;

/// A constructed UI component tree for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaStructure {
    /// Top-level components, in display order.
    pub components: Vec<Component>,
}

/// One node in the UI component tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "UPPERCASE")]
pub enum Component {
    /// A heading line.
    Heading {
        /// Heading text.
        text: String,
    },
    /// A subtitle line beneath the heading.
    Subtitle {
        /// Subtitle text.
        text: String,
    },
    /// A container grouping inputs and the submit action.
    Block {
        /// Child components, in order.
        children: Vec<Component>,
    },
    /// A single input field.
    Input(InputComponent),
    /// A submit action.
    Action(ActionComponent),
}

/// The component rendered for one [`Input`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputComponent {
    /// Mirrors [`Input::input_type`].
    #[serde(rename = "type")]
    pub input_type: String,
    /// Mirrors [`Input::ref_`] — the stable UI anchor.
    pub id: String,
    /// Mirrors [`Input::identifier`] — the context key.
    #[serde(rename = "ref")]
    pub ref_: String,
    /// Display label; defaults to the identifier when not configured.
    pub label: String,
    /// Placeholder text, if configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Enumerated choices, transferred verbatim from the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// The submit action component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionComponent {
    /// Component id, defaults to `"<prefix>_submit"`.
    pub id: String,
    /// Button label.
    pub label: String,
    /// Visual variant, always `"PRIMARY"` by default.
    pub variant: String,
    /// UI event type, always `"SUBMIT"` by default.
    pub event_type: String,
}

/// Per-input label/placeholder overrides passed to [`MetaBuilder::add_input`].
#[derive(Debug, Clone, Default)]
pub struct InputConfig {
    /// Overrides the default label (the input's identifier).
    pub label: Option<String>,
    /// Placeholder text for the rendered field.
    pub placeholder: Option<String>,
}

/// Builds a [`MetaStructure`] for one prompt.
pub struct MetaBuilder {
    prefix: String,
    heading: Option<String>,
    subtitle: Option<String>,
    inputs: Vec<(Input, InputConfig)>,
    submit_label: Option<String>,
    submit_id: Option<String>,
}

impl MetaBuilder {
    /// Start a builder with the given id prefix (used to derive the
    /// default submit action id).
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            heading: None,
            subtitle: None,
            inputs: Vec::new(),
            submit_label: None,
            submit_id: None,
        }
    }

    /// Set the heading text.
    pub fn heading(mut self, text: impl Into<String>) -> Self {
        self.heading = Some(text.into());
        self
    }

    /// Set the subtitle text.
    pub fn subtitle(mut self, text: impl Into<String>) -> Self {
        self.subtitle = Some(text.into());
        self
    }

    /// Append an input, in order, with optional label/placeholder config.
    pub fn add_input(mut self, input: Input, config: InputConfig) -> Self {
        self.inputs.push((input, config));
        self
    }

    /// Set the submit button's label, enabling the submit action. Without
    /// a label no submit action is emitted.
    pub fn submit(mut self, label: impl Into<String>) -> Self {
        self.submit_label = Some(label.into());
        self
    }

    /// Override the submit action's id (defaults to `"<prefix>_submit"`).
    pub fn submit_id(mut self, id: impl Into<String>) -> Self {
        self.submit_id = Some(id.into());
        self
    }

    /// Build the final component tree.
    pub fn build(self) -> MetaStructure {
        let mut top = Vec::new();

        if let Some(text) = self.heading {
            top.push(Component::Heading { text });
        }
        if let Some(text) = self.subtitle {
            top.push(Component::Subtitle { text });
        }

        let mut children: Vec<Component> = self
            .inputs
            .into_iter()
            .map(|(input, config)| {
                Component::Input(InputComponent {
                    input_type: input.input_type,
                    id: input.ref_,
                    ref_: input.identifier.clone(),
                    label: config.label.unwrap_or(input.identifier),
                    placeholder: config.placeholder,
                    options: input.options,
                })
            })
            .collect();

        if let Some(label) = self.submit_label {
            children.push(Component::Action(ActionComponent {
                id: self.submit_id.unwrap_or_else(|| format!("{}_submit", self.prefix)),
                label,
                variant: "PRIMARY".to_string(),
                event_type: "SUBMIT".to_string(),
            }));
        }

        top.push(Component::Block { children });

        MetaStructure { components: top }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(identifier: &str) -> Input {
        Input {
            ref_: format!("{}_ref", identifier),
            identifier: identifier.to_string(),
            input_type: "text".to_string(),
            required: true,
            options: None,
        }
    }

    #[test]
    fn emits_heading_subtitle_then_single_block() {
        let meta = MetaBuilder::new("login")
            .heading("Sign in")
            .subtitle("Enter your credentials")
            .add_input(input("username"), InputConfig::default())
            .submit("Continue")
            .build();

        assert_eq!(meta.components.len(), 3);
        assert_eq!(meta.components[0], Component::Heading { text: "Sign in".to_string() });
        assert_eq!(
            meta.components[1],
            Component::Subtitle { text: "Enter your credentials".to_string() }
        );
        match &meta.components[2] {
            Component::Block { children } => assert_eq!(children.len(), 2),
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn input_label_defaults_to_identifier() {
        let meta = MetaBuilder::new("login").add_input(input("username"), InputConfig::default()).build();
        let Component::Block { children } = &meta.components[0] else {
            panic!("expected block");
        };
        let Component::Input(comp) = &children[0] else {
            panic!("expected input component");
        };
        assert_eq!(comp.label, "username");
        assert_eq!(comp.id, "username_ref");
        assert_eq!(comp.ref_, "username");
    }

    #[test]
    fn submit_defaults_are_primary_submit() {
        let meta = MetaBuilder::new("login").submit("Continue").build();
        let Component::Block { children } = &meta.components[0] else {
            panic!("expected block");
        };
        let Component::Action(action) = children.last().unwrap() else {
            panic!("expected action component");
        };
        assert_eq!(action.id, "login_submit");
        assert_eq!(action.variant, "PRIMARY");
        assert_eq!(action.event_type, "SUBMIT");
    }

    #[test]
    fn no_submit_action_without_label() {
        let meta = MetaBuilder::new("login").add_input(input("username"), InputConfig::default()).build();
        let Component::Block { children } = &meta.components[0] else {
            panic!("expected block");
        };
        assert!(children.iter().all(|c| !matches!(c, Component::Action(_))));
    }

    #[test]
    fn no_heading_or_subtitle_when_unset() {
        let meta = MetaBuilder::new("login").build();
        assert_eq!(meta.components.len(), 1);
        assert!(matches!(meta.components[0], Component::Block { .. }));
    }
}
