use crate::config::LlmConfig;
use crate::error::{InterpretError, TransportError};
use crate::fallback::LocalInterpreter;
use crate::openai::OpenAiClient;
use crate::schema::Schema;
use crate::types::Command;
use serde_json::Value;
use tracing::{debug, info};

/// Turns free text into a structured command.
pub trait Interpreter {
    fn name(&self) -> &'static str;

    fn interpret(&self, text: &str) -> Result<Command, InterpretError>;
}

/// A chat completion endpoint: system prompt plus user text in, reply text out.
pub trait ChatModel {
    fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, TransportError>;
}

pub struct RemoteInterpreter<C: ChatModel> {
    client: C,
    system_prompt: String,
}

impl<C: ChatModel> RemoteInterpreter<C> {
    pub fn new(client: C, schema: &Schema) -> Self {
        Self {
            client,
            system_prompt: schema.system_prompt(),
        }
    }
}

impl<C: ChatModel> Interpreter for RemoteInterpreter<C> {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn interpret(&self, text: &str) -> Result<Command, InterpretError> {
        let reply = self.client.complete(&self.system_prompt, text)?;
        debug!(reply = %reply, "model replied");
        let mut command = parse_reply(&reply)?;
        command.original_command = text.to_string();
        Ok(command)
    }
}

/// Extracts the outermost JSON object from a model reply.
pub fn parse_reply(reply: &str) -> Result<Command, InterpretError> {
    let trimmed = reply.trim();
    let json_str = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(s), Some(e)) if e > s => &trimmed[s..=e],
        _ => trimmed,
    };

    let invalid = || InterpretError::InvalidJson {
        raw: reply.to_string(),
    };
    let parsed: Value = serde_json::from_str(json_str).map_err(|_| invalid())?;
    if !parsed.is_object() {
        return Err(invalid());
    }

    if parsed["status"].as_str() == Some("error") {
        return Err(InterpretError::Declined {
            message: parsed["message"]
                .as_str()
                .unwrap_or("The AI could not interpret this command")
                .to_string(),
            raw: reply.to_string(),
        });
    }

    let action = match parsed["action"].as_str() {
        Some(a) if !a.trim().is_empty() => a.trim().to_string(),
        _ => {
            return Err(InterpretError::MissingAction {
                raw: reply.to_string(),
            })
        }
    };

    let mut command = Command::new(
        action,
        parsed["parameters"].as_object().cloned().unwrap_or_default(),
    );
    command.message = parsed["message"].as_str().map(String::from);
    Ok(command)
}

/// Remote interpreter when a credential is configured, local matcher otherwise.
pub fn build_interpreter(config: &LlmConfig, schema: &Schema) -> Box<dyn Interpreter> {
    match config.api_key() {
        Some(key) => {
            info!(model = %config.model, endpoint = %config.endpoint, "using remote interpreter");
            Box::new(RemoteInterpreter::new(OpenAiClient::new(config, key), schema))
        }
        None => {
            info!("no API credential configured; using local fallback interpreter");
            Box::new(LocalInterpreter::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned replies and records what it was asked.
    #[derive(Default)]
    struct ScriptedModel {
        replies: RefCell<VecDeque<Result<String, TransportError>>>,
        prompts: RefCell<Vec<(String, String)>>,
    }

    impl ScriptedModel {
        fn with_reply(self, reply: Result<&str, TransportError>) -> Self {
            self.replies.borrow_mut().push_back(reply.map(str::to_string));
            self
        }
    }

    impl ChatModel for ScriptedModel {
        fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, TransportError> {
            self.prompts
                .borrow_mut()
                .push((system_prompt.to_string(), user_text.to_string()));
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted reply".to_string())))
        }
    }

    fn remote(model: ScriptedModel) -> RemoteInterpreter<ScriptedModel> {
        RemoteInterpreter::new(model, &Schema::standard())
    }

    #[test]
    fn sends_schema_prompt_and_user_text() {
        let interpreter = remote(ScriptedModel::default().with_reply(Ok(
            r#"{"status":"success","action":"create_sphere","parameters":{"radius":3}}"#,
        )));
        let cmd = interpreter.interpret("a 3mm ball").unwrap();

        assert_eq!(cmd.action, "create_sphere");
        assert_eq!(cmd.parameters["radius"], 3);
        assert_eq!(cmd.original_command, "a 3mm ball");

        let prompts = interpreter.client.prompts.borrow();
        assert!(prompts[0].0.contains("create_gear"));
        assert_eq!(prompts[0].1, "a 3mm ball");
    }

    #[test]
    fn reply_wrapped_in_prose_is_still_parsed() {
        let reply = "Sure!\n```json\n{\"status\": \"success\", \"action\": \"create_box\", \"parameters\": {\"length\": 4}, \"message\": \"A box\"}\n```";
        let cmd = parse_reply(reply).unwrap();
        assert_eq!(cmd.action, "create_box");
        assert_eq!(cmd.message.as_deref(), Some("A box"));
    }

    #[test]
    fn garbage_reply_keeps_raw_text() {
        let err = parse_reply("I cannot do that").unwrap_err();
        assert_eq!(err.to_string(), "AI returned invalid JSON format");
        assert_eq!(err.raw_reply(), Some("I cannot do that"));
    }

    #[test]
    fn model_error_status_is_declined() {
        let err = parse_reply(r#"{"status":"error","message":"Which face?"}"#).unwrap_err();
        assert!(matches!(err, InterpretError::Declined { ref message, .. } if message == "Which face?"));
    }

    #[test]
    fn success_without_action_is_rejected() {
        let err = parse_reply(r#"{"status":"success","parameters":{}}"#).unwrap_err();
        assert!(matches!(err, InterpretError::MissingAction { .. }));
    }

    #[test]
    fn transport_errors_pass_through() {
        for failure in [
            TransportError::InvalidCredential,
            TransportError::RateLimited,
            TransportError::Timeout(30),
        ] {
            let interpreter = remote(ScriptedModel::default().with_reply(Err(failure.clone())));
            let err = interpreter.interpret("make a cube").unwrap_err();
            assert_eq!(err, InterpretError::Transport(failure));
        }
    }

    #[test]
    fn missing_credential_selects_local_fallback() {
        let config = LlmConfig {
            api_key: None,
            ..LlmConfig::default()
        };
        // Only holds when the environment does not provide a key either.
        if config.api_key().is_none() {
            let interpreter = build_interpreter(&config, &Schema::standard());
            assert_eq!(interpreter.name(), "local");
        }
    }

    #[test]
    fn configured_credential_selects_remote() {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        let interpreter = build_interpreter(&config, &Schema::standard());
        assert_eq!(interpreter.name(), "remote");
    }
}
