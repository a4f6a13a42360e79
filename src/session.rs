//! The palette session: owns the interpreter, dispatcher and host for as long
//! as the add-in is active, and answers bridge messages.

use crate::dispatcher::Dispatcher;
use crate::host::Host;
use crate::interpreter::Interpreter;
use crate::types::ExecutionResult;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

pub const AI_RESPONSE_EVENT: &str = "aiResponse";

/// Receives events pushed to the palette.
pub trait PaletteSink {
    fn send(&mut self, event: &str, payload: &str);
}

impl PaletteSink for Vec<(String, String)> {
    fn send(&mut self, event: &str, payload: &str) {
        self.push((event.to_string(), payload.to_string()));
    }
}

#[derive(Debug, Deserialize)]
struct BridgeMessage {
    action: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandData {
    #[serde(default)]
    command: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyData {
    #[serde(default)]
    arg1: Value,
    #[serde(default)]
    arg2: Value,
}

pub struct Session<H: Host> {
    interpreter: Box<dyn Interpreter>,
    dispatcher: Dispatcher,
    host: H,
}

impl<H: Host> Session<H> {
    pub fn activate(interpreter: Box<dyn Interpreter>, dispatcher: Dispatcher, host: H) -> Self {
        info!(interpreter = interpreter.name(), "session activated");
        Self {
            interpreter,
            dispatcher,
            host,
        }
    }

    /// Ends the session and hands the host back.
    pub fn deactivate(self) -> H {
        info!("session deactivated");
        self.host
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn interpreter_name(&self) -> &'static str {
        self.interpreter.name()
    }

    /// Interprets and executes one line of free text.
    pub fn run_command(&mut self, text: &str, session_id: Option<&str>) -> ExecutionResult {
        let text = text.trim();
        let mut result = if text.is_empty() {
            ExecutionResult::error("Please enter a command.").with_original(text)
        } else {
            match self.interpreter.interpret(text) {
                Ok(command) => {
                    debug!(action = %command.action, "interpreted");
                    let mut result = self.dispatcher.dispatch(&mut self.host, &command);
                    result.note = command.note.clone();
                    result.with_original(text)
                }
                Err(err) => {
                    warn!(error = %err, "could not interpret command");
                    let mut result = ExecutionResult::error(err.to_string()).with_original(text);
                    result.ai_raw_response = err.raw_reply().map(String::from);
                    result
                }
            }
        };
        if let Some(id) = session_id {
            result = result.with_session(id);
        }
        result
    }

    /// Handles one raw bridge message and returns the synchronous reply.
    pub fn handle_message(&mut self, raw: &str, sink: &mut dyn PaletteSink) -> String {
        let message: BridgeMessage = match serde_json::from_str(raw) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "malformed bridge message");
                return ExecutionResult::error(format!("System error: {e}")).to_json();
            }
        };

        match message.action.as_str() {
            "aiCommand" => match decode_data::<CommandData>(message.data) {
                Ok(data) => self.handle_ai_command(data, sink),
                Err(e) => ExecutionResult::error(format!("System error: {e}")).to_json(),
            },
            "messageFromPalette" => {
                let data = decode_data::<LegacyData>(message.data).unwrap_or_default();
                format!(
                    "Received: {}, {}",
                    display_value(&data.arg1),
                    display_value(&data.arg2)
                )
            }
            other => format!("Unknown action: {other}"),
        }
    }

    fn handle_ai_command(&mut self, data: CommandData, sink: &mut dyn PaletteSink) -> String {
        let session_id = data.session_id.as_deref();
        let mut processing = ExecutionResult::processing(&data.command);
        if let Some(id) = session_id {
            processing = processing.with_session(id);
        }
        sink.send(AI_RESPONSE_EVENT, &processing.to_json());

        let reply = self.run_command(&data.command, session_id).to_json();
        sink.send(AI_RESPONSE_EVENT, &reply);
        reply
    }
}

/// `data` arrives either as an object or as a JSON-encoded string.
fn decode_data<T: for<'de> Deserialize<'de> + Default>(data: Value) -> Result<T, serde_json::Error> {
    match data {
        Value::Null => Ok(T::default()),
        Value::String(s) if s.trim().is_empty() => Ok(T::default()),
        Value::String(s) => serde_json::from_str(&s),
        other => serde_json::from_value(other),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
