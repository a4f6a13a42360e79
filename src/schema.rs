//! The closed set of palette actions, their parameters and defaults.
//!
//! Every length crossing the palette boundary is in millimeters. The schema is
//! also rendered into the system prompt that tells the model which JSON shape
//! to answer with.

use crate::types::{Command, EntityKind};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    CreateBox,
    CreateCylinder,
    CreateSphere,
    CreateGear,
    CreateHole,
    ExtrudeFace,
    MoveBody,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::CreateBox,
        ActionKind::CreateCylinder,
        ActionKind::CreateSphere,
        ActionKind::CreateGear,
        ActionKind::CreateHole,
        ActionKind::ExtrudeFace,
        ActionKind::MoveBody,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::CreateBox => "create_box",
            ActionKind::CreateCylinder => "create_cylinder",
            ActionKind::CreateSphere => "create_sphere",
            ActionKind::CreateGear => "create_gear",
            ActionKind::CreateHole => "create_hole",
            ActionKind::ExtrudeFace => "extrude_face",
            ActionKind::MoveBody => "move_body",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The entity kind the user must pick before the action can run.
    pub fn required_selection(self) -> Option<EntityKind> {
        match self {
            ActionKind::CreateHole | ActionKind::ExtrudeFace => Some(EntityKind::Face),
            ActionKind::MoveBody => Some(EntityKind::Body),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Value(f64),
    /// Falls back to another, already resolved, parameter of the same action.
    SameAs(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub default: DefaultValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ActionSpec {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

fn param(name: &'static str, description: &'static str, default: f64) -> ParamSpec {
    ParamSpec {
        name,
        description,
        default: DefaultValue::Value(default),
    }
}

fn param_same_as(name: &'static str, description: &'static str, other: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        description,
        default: DefaultValue::SameAs(other),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    actions: Vec<ActionSpec>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::standard()
    }
}

impl Schema {
    pub fn standard() -> Self {
        let actions = vec![
            ActionSpec {
                kind: ActionKind::CreateBox,
                description: "Creates a rectangular box",
                params: vec![
                    param("length", "edge length along X in mm", 10.0),
                    param_same_as("width", "edge length along Y in mm", "length"),
                    param_same_as("height", "extrusion height in mm", "length"),
                ],
            },
            ActionSpec {
                kind: ActionKind::CreateCylinder,
                description: "Creates a cylinder",
                params: vec![
                    param("radius", "radius in mm", 5.0),
                    param("height", "height in mm", 10.0),
                ],
            },
            ActionSpec {
                kind: ActionKind::CreateSphere,
                description: "Creates a sphere",
                params: vec![param("radius", "radius in mm", 5.0)],
            },
            ActionSpec {
                kind: ActionKind::CreateGear,
                description: "Creates a spur gear",
                params: vec![
                    param("number_of_teeth", "tooth count", 20.0),
                    param("module", "module in mm", 2.0),
                    param("bore_diameter", "center bore diameter in mm, 0 for none", 6.0),
                    param("thickness", "face width in mm", 5.0),
                ],
            },
            ActionSpec {
                kind: ActionKind::CreateHole,
                description: "Creates a hole in the selected face",
                params: vec![
                    param("diameter", "diameter in mm", 5.0),
                    param("depth", "depth in mm", 10.0),
                ],
            },
            ActionSpec {
                kind: ActionKind::ExtrudeFace,
                description: "Extrudes the selected face",
                params: vec![param("distance", "distance in mm", 5.0)],
            },
            ActionSpec {
                kind: ActionKind::MoveBody,
                description: "Moves the selected body",
                params: vec![
                    param("x", "offset along X in mm", 0.0),
                    param("y", "offset along Y in mm", 0.0),
                    param("z", "offset along Z in mm", 0.0),
                ],
            },
        ];
        Self { actions }
    }

    /// Replaces defaults from a `[schema.<action>]` config table.
    ///
    /// Unknown actions or parameters are skipped with a warning.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, BTreeMap<String, f64>>) -> Self {
        for (action, values) in overrides {
            let Some(kind) = ActionKind::from_name(action) else {
                warn!(action = %action, "ignoring default override for unknown action");
                continue;
            };
            let spec = self.spec_mut(kind);
            for (name, value) in values {
                match spec.params.iter_mut().find(|p| p.name == name.as_str()) {
                    Some(p) => p.default = DefaultValue::Value(*value),
                    None => warn!(action = %action, param = %name, "ignoring default override for unknown parameter"),
                }
            }
        }
        self
    }

    pub fn actions(&self) -> &[ActionSpec] {
        &self.actions
    }

    pub fn spec(&self, kind: ActionKind) -> &ActionSpec {
        // Specs are stored in `ActionKind::ALL` order.
        &self.actions[kind as usize]
    }

    fn spec_mut(&mut self, kind: ActionKind) -> &mut ActionSpec {
        &mut self.actions[kind as usize]
    }

    pub fn default_value(&self, kind: ActionKind, name: &str) -> Option<DefaultValue> {
        self.spec(kind).param(name).map(|p| p.default)
    }

    /// A command for `kind` with every parameter set to its default.
    pub fn default_command(&self, kind: ActionKind) -> Command {
        let spec = self.spec(kind);
        let mut parameters = Map::new();
        for p in &spec.params {
            let value = match p.default {
                DefaultValue::Value(v) => v,
                DefaultValue::SameAs(other) => parameters
                    .get(other)
                    .and_then(Value::as_f64)
                    .unwrap_or_default(),
            };
            parameters.insert(p.name.to_string(), Value::from(value));
        }
        Command::new(kind.name(), parameters).with_original(format!("default {}", kind.name()))
    }

    /// Renders the schema as the system prompt for the completion endpoint.
    pub fn system_prompt(&self) -> String {
        let operations: String = self
            .actions
            .iter()
            .map(|spec| {
                let params = spec
                    .params
                    .iter()
                    .map(|p| p.name)
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut line = format!("- {}: {} (parameters: {})", spec.kind.name(), spec.description, params);
                if let Some(kind) = spec.kind.required_selection() {
                    line.push_str(&format!(" [requires a selected {}]", kind.label()));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n");

        let defaults: String = self
            .actions
            .iter()
            .flat_map(|spec| {
                spec.params.iter().map(move |p| {
                    let value = match p.default {
                        DefaultValue::Value(v) => format!("{v}"),
                        DefaultValue::SameAs(other) => format!("same as {other}"),
                    };
                    format!("- {}.{}: {} ({})", spec.kind.name(), p.name, value, p.description)
                })
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are an assistant inside a parametric 3D CAD application.
Convert natural language modeling commands into structured JSON. All lengths are in millimeters.

SUPPORTED OPERATIONS:
{operations}

DEFAULTS (use when the user does not say):
{defaults}

Always respond with ONLY valid JSON in this format:
{{"status": "success", "action": "operation_name", "parameters": {{"param1": 1.0}}, "message": "Human readable description"}}

If the command is unclear or unsupported, respond with:
{{"status": "error", "message": "Explanation of the issue"}}"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specs_are_stored_in_kind_order() {
        let schema = Schema::standard();
        for kind in ActionKind::ALL {
            assert_eq!(schema.spec(kind).kind, kind);
        }
    }

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ActionKind::from_name("not_a_real_action"), None);
    }

    #[test]
    fn selection_requirements_match_table() {
        assert_eq!(ActionKind::CreateHole.required_selection(), Some(EntityKind::Face));
        assert_eq!(ActionKind::ExtrudeFace.required_selection(), Some(EntityKind::Face));
        assert_eq!(ActionKind::MoveBody.required_selection(), Some(EntityKind::Body));
        assert_eq!(ActionKind::CreateGear.required_selection(), None);
    }

    #[test]
    fn default_box_command_is_a_cube() {
        let cmd = Schema::standard().default_command(ActionKind::CreateBox);
        assert_eq!(cmd.action, "create_box");
        assert_eq!(cmd.parameters["length"], 10.0);
        assert_eq!(cmd.parameters["width"], 10.0);
        assert_eq!(cmd.parameters["height"], 10.0);
    }

    #[test]
    fn overrides_replace_defaults_and_skip_unknowns() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "create_gear".to_string(),
            BTreeMap::from([("module".to_string(), 1.5), ("bogus".to_string(), 9.0)]),
        );
        overrides.insert("launch_rocket".to_string(), BTreeMap::new());

        let schema = Schema::standard().with_overrides(&overrides);
        assert_eq!(
            schema.default_value(ActionKind::CreateGear, "module"),
            Some(DefaultValue::Value(1.5))
        );
        assert_eq!(
            schema.default_value(ActionKind::CreateGear, "number_of_teeth"),
            Some(DefaultValue::Value(20.0))
        );
    }

    #[test]
    fn system_prompt_lists_every_action() {
        let prompt = Schema::standard().system_prompt();
        for kind in ActionKind::ALL {
            assert!(prompt.contains(kind.name()), "missing {}", kind.name());
        }
        assert!(prompt.contains("requires a selected body"));
        assert!(prompt.contains("create_gear.module: 2"));
    }
}
