use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured command produced by an interpreter from free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub action: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub original_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Command {
    pub fn new(action: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            action: action.into(),
            parameters,
            original_command: String::new(),
            message: None,
            note: None,
        }
    }

    pub fn with_original(mut self, text: impl Into<String>) -> Self {
        self.original_command = text.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Processing,
    Success,
    Error,
}

/// The record handed back to the palette for every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_raw_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ExecutionResult {
    pub fn success(
        action: impl Into<String>,
        parameters: Map<String, Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: Status::Success,
            action: Some(action.into()),
            parameters: Some(parameters),
            message: message.into(),
            original_command: None,
            session_id: None,
            ai_raw_response: None,
            note: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            action: None,
            parameters: None,
            message: message.into(),
            original_command: None,
            session_id: None,
            ai_raw_response: None,
            note: None,
        }
    }

    pub fn processing(original_command: &str) -> Self {
        Self {
            status: Status::Processing,
            message: "Analyzing your command...".to_string(),
            original_command: Some(original_command.to_string()),
            ..Self::error("")
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn with_original(mut self, text: &str) -> Self {
        self.original_command = Some(text.to_string());
        self
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn to_json(&self) -> String {
        // A struct of strings, maps and enums always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"status":"error","message":"failed to encode result"}"#.to_string()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SketchId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Face,
    Body,
    Edge,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Face => "face",
            EntityKind::Body => "body",
            EntityKind::Edge => "edge",
        }
    }
}

/// A host entity picked by the user before a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Face(FaceId),
    Body(BodyId),
    Edge(EdgeId),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Face(_) => EntityKind::Face,
            Entity::Body(_) => EntityKind::Body,
            Entity::Edge(_) => EntityKind::Edge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn polar(radius: f64, angle: f64) -> Self {
        Self {
            x: radius * angle.cos(),
            y: radius * angle.sin(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SketchPlane {
    Xy,
    Xz,
    Face(FaceId),
}

/// Boolean mode of a feature relative to existing bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureOperation {
    NewBody,
    Join,
    Cut,
}
