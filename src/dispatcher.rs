use crate::action::Action;
use crate::error::DispatchError;
use crate::handlers;
use crate::host::Host;
use crate::schema::{ActionKind, Schema};
use crate::types::{Command, ExecutionResult};
use serde_json::{Map, Value};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Success {
    pub kind: ActionKind,
    pub parameters: Map<String, Value>,
    pub message: String,
}

/// Maps structured commands onto modeling handlers.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    schema: Schema,
}

impl Dispatcher {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn execute(&self, host: &mut dyn Host, command: &Command) -> Result<Success, DispatchError> {
        let action = Action::resolve(command, &self.schema)?;
        let message = handlers::run(host, &action)?;
        Ok(Success {
            kind: action.kind(),
            parameters: action.parameters(),
            message,
        })
    }

    /// Like [`Dispatcher::execute`], but folds every failure into an error
    /// record for the palette.
    pub fn dispatch(&self, host: &mut dyn Host, command: &Command) -> ExecutionResult {
        let result = match self.execute(host, command) {
            Ok(success) => {
                info!(action = success.kind.name(), "{}", success.message);
                ExecutionResult::success(success.kind.name(), success.parameters, success.message)
            }
            Err(err) => {
                warn!(action = %command.action, error = %err, "command failed");
                let mut result = ExecutionResult::error(err.to_string());
                if !matches!(err, DispatchError::UnknownAction(_)) {
                    result.action = Some(command.action.clone());
                }
                result
            }
        };
        result.with_original(&command.original_command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimulatedHost;
    use crate::types::{Entity, Status};
    use serde_json::json;

    fn command(value: Value) -> Command {
        serde_json::from_value(value).unwrap()
    }

    /// A document holding one box, with whatever `kind` needs already selected.
    fn prepared_host(kind: ActionKind) -> SimulatedHost {
        let mut host = SimulatedHost::new();
        let dispatcher = Dispatcher::default();
        let seed = dispatcher.schema().default_command(ActionKind::CreateBox);
        assert!(dispatcher.dispatch(&mut host, &seed).is_success());
        let body = &host.bodies()[0];
        let entity = match kind.required_selection() {
            Some(crate::types::EntityKind::Face) => Some(Entity::Face(body.faces[0])),
            Some(crate::types::EntityKind::Body) => Some(Entity::Body(body.id)),
            _ => None,
        };
        if let Some(entity) = entity {
            host.select(entity);
        }
        host
    }

    #[test]
    fn well_formed_commands_echo_their_parameters() {
        let cases = [
            json!({"action": "create_box", "parameters": {"length": 12.0, "width": 8.0, "height": 3.0}}),
            json!({"action": "create_cylinder", "parameters": {"radius": 4.0, "height": 9.0}}),
            json!({"action": "create_sphere", "parameters": {"radius": 7.5}}),
            json!({"action": "create_gear", "parameters": {"number_of_teeth": 24, "module": 1.5, "bore_diameter": 5.0, "thickness": 4.0}}),
            json!({"action": "create_hole", "parameters": {"diameter": 3.0, "depth": 6.0}}),
            json!({"action": "extrude_face", "parameters": {"distance": 2.5}}),
            json!({"action": "move_body", "parameters": {"x": 1.0, "y": -2.0, "z": 3.0}}),
        ];
        let dispatcher = Dispatcher::default();
        for case in cases {
            let cmd = command(case.clone());
            let kind = ActionKind::from_name(&cmd.action).unwrap();
            let mut host = prepared_host(kind);
            let result = dispatcher.dispatch(&mut host, &cmd);

            assert_eq!(result.status, Status::Success, "{}: {}", cmd.action, result.message);
            assert_eq!(result.action.as_deref(), Some(cmd.action.as_str()));
            assert_eq!(
                Value::Object(result.parameters.unwrap()),
                case["parameters"],
                "{}",
                cmd.action
            );
        }
    }

    #[test]
    fn omitted_parameters_are_defaulted_in_the_echo() {
        let mut host = SimulatedHost::new();
        let cmd = command(json!({"action": "create_gear", "parameters": {"number_of_teeth": 30}}));
        let result = Dispatcher::default().dispatch(&mut host, &cmd);
        assert_eq!(
            Value::Object(result.parameters.unwrap()),
            json!({"number_of_teeth": 30, "module": 2.0, "bore_diameter": 6.0, "thickness": 5.0})
        );
    }

    #[test]
    fn unknown_action_performs_no_mutation() {
        let mut host = SimulatedHost::new();
        let cmd = command(json!({"action": "not_a_real_action", "originalCommand": "do magic"}));
        let result = Dispatcher::default().dispatch(&mut host, &cmd);

        assert_eq!(result.status, Status::Error);
        assert_eq!(result.message, "Unknown action: not_a_real_action");
        assert_eq!(result.original_command.as_deref(), Some("do magic"));
        assert_eq!(host.mutations(), 0);
    }

    #[test]
    fn selection_actions_with_empty_selection_never_touch_the_host() {
        let dispatcher = Dispatcher::default();
        for kind in [ActionKind::CreateHole, ActionKind::ExtrudeFace, ActionKind::MoveBody] {
            let mut host = SimulatedHost::new();
            let result = dispatcher.dispatch(&mut host, &dispatcher.schema().default_command(kind));
            assert_eq!(result.status, Status::Error);
            assert!(result.message.starts_with("Please select a"), "{}", result.message);
            assert_eq!(host.mutations(), 0);
        }
    }

    #[test]
    fn every_default_command_yields_a_well_formed_result() {
        let dispatcher = Dispatcher::default();
        for kind in ActionKind::ALL {
            for mut host in [SimulatedHost::new(), SimulatedHost::without_design(), prepared_host(kind)] {
                let cmd = dispatcher.schema().default_command(kind);
                let result = dispatcher.dispatch(&mut host, &cmd);
                assert!(!result.message.is_empty());
                assert_ne!(result.status, Status::Processing);
                let round: ExecutionResult = serde_json::from_str(&result.to_json()).unwrap();
                assert_eq!(round, result);
            }
        }
    }

    #[test]
    fn defaults_succeed_when_preconditions_hold() {
        let dispatcher = Dispatcher::default();
        for kind in ActionKind::ALL {
            let mut host = prepared_host(kind);
            let result = dispatcher.dispatch(&mut host, &dispatcher.schema().default_command(kind));
            assert!(result.is_success(), "{}: {}", kind.name(), result.message);
        }
    }

    #[test]
    fn invalid_parameter_keeps_action_name() {
        let mut host = SimulatedHost::new();
        let cmd = command(json!({"action": "create_cylinder", "parameters": {"radius": 0}}));
        let result = Dispatcher::default().dispatch(&mut host, &cmd);
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.action.as_deref(), Some("create_cylinder"));
        assert_eq!(host.mutations(), 0);
    }
}
