use crate::error::DispatchError;
use crate::schema::{ActionKind, DefaultValue, Schema};
use crate::types::Command;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxParams {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CylinderParams {
    pub radius: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SphereParams {
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GearParams {
    pub number_of_teeth: u32,
    pub module: f64,
    pub bore_diameter: f64,
    pub thickness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoleParams {
    pub diameter: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtrudeParams {
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoveParams {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A command whose parameters have been checked and defaulted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    CreateBox(BoxParams),
    CreateCylinder(CylinderParams),
    CreateSphere(SphereParams),
    CreateGear(GearParams),
    CreateHole(HoleParams),
    ExtrudeFace(ExtrudeParams),
    MoveBody(MoveParams),
}

impl Action {
    /// Looks up the command's action and fills in missing parameters.
    pub fn resolve(command: &Command, schema: &Schema) -> Result<Self, DispatchError> {
        let kind = ActionKind::from_name(command.action.trim())
            .ok_or_else(|| DispatchError::UnknownAction(command.action.clone()))?;
        let mut reader = ParamReader::new(kind, &command.parameters, schema);

        let action = match kind {
            ActionKind::CreateBox => Action::CreateBox(BoxParams {
                length: reader.positive("length")?,
                width: reader.positive("width")?,
                height: reader.positive("height")?,
            }),
            ActionKind::CreateCylinder => Action::CreateCylinder(CylinderParams {
                radius: reader.positive("radius")?,
                height: reader.positive("height")?,
            }),
            ActionKind::CreateSphere => Action::CreateSphere(SphereParams {
                radius: reader.positive("radius")?,
            }),
            ActionKind::CreateGear => {
                let params = GearParams {
                    number_of_teeth: reader.count("number_of_teeth", 3)?,
                    module: reader.positive("module")?,
                    bore_diameter: reader.non_negative("bore_diameter")?,
                    thickness: reader.positive("thickness")?,
                };
                let root = crate::gear::GearDimensions::new(params.number_of_teeth, params.module)
                    .root_diameter;
                if params.bore_diameter >= root {
                    return Err(reader.invalid(
                        "bore_diameter",
                        format!("must be smaller than the root diameter ({root:.2} mm)"),
                    ));
                }
                Action::CreateGear(params)
            }
            ActionKind::CreateHole => Action::CreateHole(HoleParams {
                diameter: reader.positive("diameter")?,
                depth: reader.positive("depth")?,
            }),
            ActionKind::ExtrudeFace => Action::ExtrudeFace(ExtrudeParams {
                distance: reader.non_zero("distance")?,
            }),
            ActionKind::MoveBody => Action::MoveBody(MoveParams {
                x: reader.finite("x")?,
                y: reader.finite("y")?,
                z: reader.finite("z")?,
            }),
        };
        Ok(action)
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::CreateBox(_) => ActionKind::CreateBox,
            Action::CreateCylinder(_) => ActionKind::CreateCylinder,
            Action::CreateSphere(_) => ActionKind::CreateSphere,
            Action::CreateGear(_) => ActionKind::CreateGear,
            Action::CreateHole(_) => ActionKind::CreateHole,
            Action::ExtrudeFace(_) => ActionKind::ExtrudeFace,
            Action::MoveBody(_) => ActionKind::MoveBody,
        }
    }

    /// The resolved parameters in millimeters, as echoed to the palette.
    pub fn parameters(&self) -> Map<String, Value> {
        let value = match self {
            Action::CreateBox(p) => serde_json::to_value(p),
            Action::CreateCylinder(p) => serde_json::to_value(p),
            Action::CreateSphere(p) => serde_json::to_value(p),
            Action::CreateGear(p) => serde_json::to_value(p),
            Action::CreateHole(p) => serde_json::to_value(p),
            Action::ExtrudeFace(p) => serde_json::to_value(p),
            Action::MoveBody(p) => serde_json::to_value(p),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Reads numeric parameters, substituting schema defaults for absent ones.
struct ParamReader<'a> {
    kind: ActionKind,
    given: &'a Map<String, Value>,
    schema: &'a Schema,
    resolved: Vec<(&'static str, f64)>,
}

impl<'a> ParamReader<'a> {
    fn new(kind: ActionKind, given: &'a Map<String, Value>, schema: &'a Schema) -> Self {
        Self {
            kind,
            given,
            schema,
            resolved: Vec::new(),
        }
    }

    fn invalid(&self, name: &'static str, reason: impl Into<String>) -> DispatchError {
        DispatchError::InvalidParameter {
            action: self.kind.name(),
            name,
            reason: reason.into(),
        }
    }

    fn number(&mut self, name: &'static str) -> Result<f64, DispatchError> {
        let given = self.given;
        let value = match given.get(name) {
            None | Some(Value::Null) => self.default_for(name)?,
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| self.invalid(name, "not a number"))?,
            Some(Value::String(s)) => s
                .trim()
                .trim_end_matches("mm")
                .trim()
                .parse::<f64>()
                .map_err(|_| self.invalid(name, format!("'{s}' is not a number")))?,
            Some(other) => return Err(self.invalid(name, format!("expected a number, got {other}"))),
        };
        if !value.is_finite() {
            return Err(self.invalid(name, "must be finite"));
        }
        self.resolved.push((name, value));
        Ok(value)
    }

    fn default_for(&self, name: &'static str) -> Result<f64, DispatchError> {
        match self.schema.default_value(self.kind, name) {
            Some(DefaultValue::Value(v)) => Ok(v),
            Some(DefaultValue::SameAs(other)) => self
                .resolved
                .iter()
                .find(|(n, _)| *n == other)
                .map(|(_, v)| *v)
                .ok_or_else(|| self.invalid(name, format!("default depends on unresolved '{other}'"))),
            None => Err(self.invalid(name, "not part of the schema")),
        }
    }

    fn finite(&mut self, name: &'static str) -> Result<f64, DispatchError> {
        self.number(name)
    }

    fn positive(&mut self, name: &'static str) -> Result<f64, DispatchError> {
        let value = self.number(name)?;
        if value <= 0.0 {
            return Err(self.invalid(name, format!("must be greater than 0, got {value}")));
        }
        Ok(value)
    }

    fn non_negative(&mut self, name: &'static str) -> Result<f64, DispatchError> {
        let value = self.number(name)?;
        if value < 0.0 {
            return Err(self.invalid(name, format!("must not be negative, got {value}")));
        }
        Ok(value)
    }

    fn non_zero(&mut self, name: &'static str) -> Result<f64, DispatchError> {
        let value = self.number(name)?;
        if value == 0.0 {
            return Err(self.invalid(name, "must not be 0"));
        }
        Ok(value)
    }

    fn count(&mut self, name: &'static str, min: u32) -> Result<u32, DispatchError> {
        let value = self.number(name)?.trunc();
        if value < f64::from(min) || value > f64::from(u16::MAX) {
            return Err(self.invalid(name, format!("must be between {min} and {}", u16::MAX)));
        }
        Ok(value as u32)
    }
}
