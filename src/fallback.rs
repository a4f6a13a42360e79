//! Keyword matcher used when no API credential is configured.

use crate::error::InterpretError;
use crate::interpreter::Interpreter;
use crate::types::Command;
use regex::Regex;
use serde_json::{Map, Value};

pub const EXAMPLE_PHRASES: [&str; 4] = [
    "'create a 10mm cube'",
    "'make a cylinder with radius 5mm and height 20mm'",
    "'create a gear with 24 teeth'",
    "'make a hole with diameter 8mm'",
];

pub const FALLBACK_NOTE: &str = "Local fallback - no API credential configured";

pub struct LocalInterpreter {
    number: Regex,
}

impl Default for LocalInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalInterpreter {
    pub fn new() -> Self {
        Self {
            number: Regex::new(r"\d+(?:\.\d+)?").expect("number pattern is valid"),
        }
    }

    fn numbers(&self, text: &str) -> Vec<f64> {
        self.number
            .find_iter(text)
            .filter_map(|m| m.as_str().parse().ok())
            .collect()
    }

    fn match_command(&self, text: &str) -> Option<(&'static str, Map<String, Value>, String)> {
        let lower = text.to_lowercase();
        let n = self.numbers(text);

        if lower.contains("cube") || lower.contains("box") {
            let length = *n.first()?;
            let width = n.get(1).copied().unwrap_or(length);
            let height = n.get(2).copied().unwrap_or(length);
            let message = if n.len() == 1 {
                format!("Creating a {length}mm cube")
            } else {
                format!("Creating a {length}mm × {width}mm × {height}mm box")
            };
            let params = to_params(&[("length", length), ("width", width), ("height", height)]);
            return Some(("create_box", params, message));
        }

        if lower.contains("cylinder") {
            let [radius, height, ..] = n.as_slice() else {
                return None;
            };
            return Some((
                "create_cylinder",
                to_params(&[("radius", *radius), ("height", *height)]),
                format!("Creating a cylinder with radius {radius}mm and height {height}mm"),
            ));
        }

        if lower.contains("sphere") {
            let radius = *n.first()?;
            return Some((
                "create_sphere",
                to_params(&[("radius", radius)]),
                format!("Creating a sphere with radius {radius}mm"),
            ));
        }

        if lower.contains("gear") {
            let teeth = n.first().map(|t| t.trunc() as u64).unwrap_or(20);
            let module = n.get(1).copied().unwrap_or(2.0);
            let mut params = Map::new();
            params.insert("number_of_teeth".to_string(), Value::from(teeth));
            params.extend(to_params(&[
                ("module", module),
                ("bore_diameter", n.get(2).copied().unwrap_or(6.0)),
                ("thickness", n.get(3).copied().unwrap_or(5.0)),
            ]));
            return Some((
                "create_gear",
                params,
                format!("Creating a gear with {teeth} teeth, module {module}mm"),
            ));
        }

        if lower.contains("hole") {
            let diameter = n.first().copied().unwrap_or(5.0);
            let depth = n.get(1).copied().unwrap_or(10.0);
            return Some((
                "create_hole",
                to_params(&[("diameter", diameter), ("depth", depth)]),
                format!("Creating a hole with diameter {diameter}mm and depth {depth}mm"),
            ));
        }

        None
    }
}

fn to_params(pairs: &[(&str, f64)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), Value::from(*value)))
        .collect()
}

impl Interpreter for LocalInterpreter {
    fn name(&self) -> &'static str {
        "local"
    }

    fn interpret(&self, text: &str) -> Result<Command, InterpretError> {
        let (action, parameters, message) =
            self.match_command(text).ok_or(InterpretError::Unrecognized)?;
        let mut command = Command::new(action, parameters).with_original(text);
        command.message = Some(message);
        command.note = Some(FALLBACK_NOTE.to_string());
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interpret(text: &str) -> Result<Command, InterpretError> {
        LocalInterpreter::new().interpret(text)
    }

    fn params(cmd: &Command) -> Value {
        Value::Object(cmd.parameters.clone())
    }

    #[test]
    fn cube_sets_all_three_sides() {
        let cmd = interpret("create a 10mm cube").unwrap();
        assert_eq!(cmd.action, "create_box");
        assert_eq!(params(&cmd), json!({"length": 10.0, "width": 10.0, "height": 10.0}));
        assert_eq!(cmd.original_command, "create a 10mm cube");
        assert_eq!(cmd.note.as_deref(), Some(FALLBACK_NOTE));
    }

    #[test]
    fn box_takes_numbers_positionally() {
        let cmd = interpret("Box 30 by 20 by 5").unwrap();
        assert_eq!(params(&cmd), json!({"length": 30.0, "width": 20.0, "height": 5.0}));
    }

    #[test]
    fn cylinder_reads_radius_then_height() {
        let cmd = interpret("cylinder with radius 5 and height 20").unwrap();
        assert_eq!(cmd.action, "create_cylinder");
        assert_eq!(params(&cmd), json!({"radius": 5.0, "height": 20.0}));
    }

    #[test]
    fn cylinder_with_one_number_is_not_recognized() {
        assert_eq!(interpret("a cylinder of 5mm"), Err(InterpretError::Unrecognized));
    }

    #[test]
    fn cube_without_size_is_not_recognized() {
        assert_eq!(interpret("make a cube"), Err(InterpretError::Unrecognized));
    }

    #[test]
    fn sphere_uses_first_number() {
        let cmd = interpret("SPHERE radius 2.5").unwrap();
        assert_eq!(params(&cmd), json!({"radius": 2.5}));
    }

    #[test]
    fn gear_fills_missing_values_with_defaults() {
        let cmd = interpret("create a gear with 24 teeth").unwrap();
        assert_eq!(cmd.action, "create_gear");
        assert_eq!(
            params(&cmd),
            json!({"number_of_teeth": 24, "module": 2.0, "bore_diameter": 6.0, "thickness": 5.0})
        );

        let cmd = interpret("gear").unwrap();
        assert_eq!(cmd.parameters["number_of_teeth"], json!(20));
    }

    #[test]
    fn hole_defaults_depth() {
        let cmd = interpret("make a hole with diameter 8mm").unwrap();
        assert_eq!(params(&cmd), json!({"diameter": 8.0, "depth": 10.0}));
    }

    #[test]
    fn unknown_text_lists_examples() {
        let err = interpret("paint it blue").unwrap_err();
        assert_eq!(err, InterpretError::Unrecognized);
        assert!(err.to_string().contains("create a 10mm cube"));
    }
}
