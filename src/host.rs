//! The construction surface the palette drives, plus an in-memory document.
//!
//! Lengths passed to a [`Host`] are in the host's internal unit
//! (centimeters); conversion happens in the handlers.

use crate::error::HostError;
use crate::types::{
    BodyId, Entity, FaceId, FeatureOperation, Point2, SketchId, SketchPlane, Vector3,
};
use std::fmt;
use tracing::debug;

pub trait Host {
    fn has_active_design(&self) -> bool;

    /// Entities the user has picked, in pick order.
    fn selection(&self) -> Vec<Entity>;

    fn create_sketch(&mut self, plane: SketchPlane) -> Result<SketchId, HostError>;

    fn add_rectangle(&mut self, sketch: SketchId, a: Point2, b: Point2) -> Result<(), HostError>;

    fn add_circle(&mut self, sketch: SketchId, center: Point2, radius: f64) -> Result<(), HostError>;

    fn add_line(&mut self, sketch: SketchId, from: Point2, to: Point2) -> Result<(), HostError>;

    /// Arc around `center` from `start` to `end`, counter-clockwise.
    fn add_arc(
        &mut self,
        sketch: SketchId,
        center: Point2,
        start: Point2,
        end: Point2,
    ) -> Result<(), HostError>;

    fn extrude_profile(
        &mut self,
        sketch: SketchId,
        distance: f64,
        operation: FeatureOperation,
    ) -> Result<BodyId, HostError>;

    /// Revolves the sketch profile around the line `axis`.
    fn revolve_profile(
        &mut self,
        sketch: SketchId,
        axis: (Point2, Point2),
        angle: f64,
        operation: FeatureOperation,
    ) -> Result<BodyId, HostError>;

    fn extrude_face(
        &mut self,
        face: FaceId,
        distance: f64,
        operation: FeatureOperation,
    ) -> Result<(), HostError>;

    fn move_body(&mut self, body: BodyId, translation: Vector3) -> Result<(), HostError>;

    fn delete_sketch(&mut self, sketch: SketchId) -> Result<(), HostError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    Rectangle(Point2, Point2),
    Circle { center: Point2, radius: f64 },
    Line(Point2, Point2),
    Arc { center: Point2, start: Point2, end: Point2 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    pub id: SketchId,
    pub plane: SketchPlane,
    pub curves: Vec<Curve>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub faces: Vec<FaceId>,
    pub translation: Vector3,
}

/// A feature as recorded in the document timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Extrude {
        sketch: SketchId,
        distance: f64,
        operation: FeatureOperation,
    },
    Revolve {
        sketch: SketchId,
        angle: f64,
        operation: FeatureOperation,
    },
    FaceExtrude {
        face: FaceId,
        distance: f64,
        operation: FeatureOperation,
    },
    Move {
        body: BodyId,
        translation: Vector3,
    },
}

/// Which host call a [`SimulatedHost`] should refuse, for failure drills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOp {
    CreateSketch,
    AddCurve,
    Extrude,
    Revolve,
    ExtrudeFace,
    Move,
}

/// In-memory stand-in for a CAD document.
///
/// Every successful mutating call bumps [`SimulatedHost::mutations`].
#[derive(Debug, Clone)]
pub struct SimulatedHost {
    active_design: bool,
    sketches: Vec<Sketch>,
    bodies: Vec<Body>,
    timeline: Vec<Feature>,
    selection: Vec<Entity>,
    next_id: u32,
    mutations: usize,
    fail_on: Option<HostOp>,
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self {
            active_design: true,
            sketches: Vec::new(),
            bodies: Vec::new(),
            timeline: Vec::new(),
            selection: Vec::new(),
            next_id: 1,
            mutations: 0,
            fail_on: None,
        }
    }

    /// A host with no design open.
    pub fn without_design() -> Self {
        Self {
            active_design: false,
            ..Self::new()
        }
    }

    pub fn failing_on(mut self, op: HostOp) -> Self {
        self.fail_on = Some(op);
        self
    }

    pub fn select(&mut self, entity: Entity) {
        self.selection.push(entity);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn sketches(&self) -> &[Sketch] {
        &self.sketches
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn timeline(&self) -> &[Feature] {
        &self.timeline
    }

    pub fn mutations(&self) -> usize {
        self.mutations
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check(&self, op: HostOp) -> Result<(), HostError> {
        if self.fail_on == Some(op) {
            return Err(HostError::Rejected(format!("host refused {op:?}")));
        }
        Ok(())
    }

    fn sketch_mut(&mut self, id: SketchId) -> Result<&mut Sketch, HostError> {
        self.sketches
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(HostError::UnknownSketch(id.0))
    }

    fn add_curve(&mut self, sketch: SketchId, curve: Curve) -> Result<(), HostError> {
        self.check(HostOp::AddCurve)?;
        self.sketch_mut(sketch)?.curves.push(curve);
        self.mutations += 1;
        Ok(())
    }

    fn face_exists(&self, face: FaceId) -> bool {
        self.bodies.iter().any(|b| b.faces.contains(&face))
    }

    /// Adds a body with a top, bottom and side face.
    fn new_body(&mut self) -> BodyId {
        let id = BodyId(self.next_id());
        let faces = (0..3).map(|_| FaceId(self.next_id())).collect();
        self.bodies.push(Body {
            id,
            faces,
            translation: Vector3 {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
        });
        id
    }

    fn profile_body(
        &mut self,
        sketch: SketchId,
        operation: FeatureOperation,
    ) -> Result<BodyId, HostError> {
        let (plane, has_profile) = {
            let target = self.sketch_mut(sketch)?;
            (target.plane, !target.curves.is_empty())
        };
        if !has_profile {
            return Err(HostError::EmptyProfile(sketch.0));
        }
        let body = match operation {
            FeatureOperation::NewBody => self.new_body(),
            // Join and cut modify whatever body the sketch plane sits on.
            _ => match plane {
                SketchPlane::Face(face) => self
                    .bodies
                    .iter()
                    .find(|b| b.faces.contains(&face))
                    .map(|b| b.id)
                    .ok_or(HostError::UnknownFace(face.0))?,
                _ => return Err(HostError::Rejected(format!("{operation:?} needs a target body"))),
            },
        };
        Ok(body)
    }
}

impl Host for SimulatedHost {
    fn has_active_design(&self) -> bool {
        self.active_design
    }

    fn selection(&self) -> Vec<Entity> {
        self.selection.clone()
    }

    fn create_sketch(&mut self, plane: SketchPlane) -> Result<SketchId, HostError> {
        self.check(HostOp::CreateSketch)?;
        if let SketchPlane::Face(face) = plane {
            if !self.face_exists(face) {
                return Err(HostError::UnknownFace(face.0));
            }
        }
        let id = SketchId(self.next_id());
        self.sketches.push(Sketch {
            id,
            plane,
            curves: Vec::new(),
        });
        self.mutations += 1;
        debug!(sketch = id.0, ?plane, "sketch created");
        Ok(id)
    }

    fn add_rectangle(&mut self, sketch: SketchId, a: Point2, b: Point2) -> Result<(), HostError> {
        self.add_curve(sketch, Curve::Rectangle(a, b))
    }

    fn add_circle(&mut self, sketch: SketchId, center: Point2, radius: f64) -> Result<(), HostError> {
        self.add_curve(sketch, Curve::Circle { center, radius })
    }

    fn add_line(&mut self, sketch: SketchId, from: Point2, to: Point2) -> Result<(), HostError> {
        self.add_curve(sketch, Curve::Line(from, to))
    }

    fn add_arc(
        &mut self,
        sketch: SketchId,
        center: Point2,
        start: Point2,
        end: Point2,
    ) -> Result<(), HostError> {
        self.add_curve(sketch, Curve::Arc { center, start, end })
    }

    fn extrude_profile(
        &mut self,
        sketch: SketchId,
        distance: f64,
        operation: FeatureOperation,
    ) -> Result<BodyId, HostError> {
        self.check(HostOp::Extrude)?;
        let body = self.profile_body(sketch, operation)?;
        self.timeline.push(Feature::Extrude {
            sketch,
            distance,
            operation,
        });
        self.mutations += 1;
        debug!(sketch = sketch.0, body = body.0, distance, "profile extruded");
        Ok(body)
    }

    fn revolve_profile(
        &mut self,
        sketch: SketchId,
        _axis: (Point2, Point2),
        angle: f64,
        operation: FeatureOperation,
    ) -> Result<BodyId, HostError> {
        self.check(HostOp::Revolve)?;
        let body = self.profile_body(sketch, operation)?;
        self.timeline.push(Feature::Revolve {
            sketch,
            angle,
            operation,
        });
        self.mutations += 1;
        debug!(sketch = sketch.0, body = body.0, angle, "profile revolved");
        Ok(body)
    }

    fn extrude_face(
        &mut self,
        face: FaceId,
        distance: f64,
        operation: FeatureOperation,
    ) -> Result<(), HostError> {
        self.check(HostOp::ExtrudeFace)?;
        if !self.face_exists(face) {
            return Err(HostError::UnknownFace(face.0));
        }
        self.timeline.push(Feature::FaceExtrude {
            face,
            distance,
            operation,
        });
        self.mutations += 1;
        Ok(())
    }

    fn move_body(&mut self, body: BodyId, translation: Vector3) -> Result<(), HostError> {
        self.check(HostOp::Move)?;
        let target = self
            .bodies
            .iter_mut()
            .find(|b| b.id == body)
            .ok_or(HostError::UnknownBody(body.0))?;
        target.translation.x += translation.x;
        target.translation.y += translation.y;
        target.translation.z += translation.z;
        self.timeline.push(Feature::Move { body, translation });
        self.mutations += 1;
        Ok(())
    }

    fn delete_sketch(&mut self, sketch: SketchId) -> Result<(), HostError> {
        let before = self.sketches.len();
        self.sketches.retain(|s| s.id != sketch);
        if self.sketches.len() == before {
            return Err(HostError::UnknownSketch(sketch.0));
        }
        self.mutations += 1;
        debug!(sketch = sketch.0, "sketch deleted");
        Ok(())
    }
}

impl fmt::Display for SimulatedHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.active_design {
            return writeln!(f, "no active design");
        }
        writeln!(
            f,
            "{} sketch(es), {} body(ies), {} feature(s)",
            self.sketches.len(),
            self.bodies.len(),
            self.timeline.len()
        )?;
        for body in &self.bodies {
            let faces = body
                .faces
                .iter()
                .map(|face| face.0.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let t = body.translation;
            writeln!(
                f,
                "  body {}  faces [{}]  offset ({:.2}, {:.2}, {:.2}) cm",
                body.id.0, faces, t.x, t.y, t.z
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Point2 {
        Point2::new(0.0, 0.0)
    }

    #[test]
    fn extruding_a_sketch_creates_a_body_with_faces() {
        let mut host = SimulatedHost::new();
        let sketch = host.create_sketch(SketchPlane::Xy).unwrap();
        host.add_circle(sketch, origin(), 1.0).unwrap();
        let body = host.extrude_profile(sketch, 2.0, FeatureOperation::NewBody).unwrap();

        assert_eq!(host.bodies().len(), 1);
        assert_eq!(host.body(body).unwrap().faces.len(), 3);
        assert_eq!(host.mutations(), 3);
    }

    #[test]
    fn empty_sketch_cannot_be_extruded() {
        let mut host = SimulatedHost::new();
        let sketch = host.create_sketch(SketchPlane::Xy).unwrap();
        let err = host
            .extrude_profile(sketch, 2.0, FeatureOperation::NewBody)
            .unwrap_err();
        assert_eq!(err, HostError::EmptyProfile(sketch.0));
        assert!(host.bodies().is_empty());
    }

    #[test]
    fn sketch_on_unknown_face_is_rejected() {
        let mut host = SimulatedHost::new();
        let err = host.create_sketch(SketchPlane::Face(FaceId(42))).unwrap_err();
        assert_eq!(err, HostError::UnknownFace(42));
        assert_eq!(host.mutations(), 0);
    }

    #[test]
    fn cut_on_face_targets_owning_body() {
        let mut host = SimulatedHost::new();
        let base = host.create_sketch(SketchPlane::Xy).unwrap();
        host.add_circle(base, origin(), 1.0).unwrap();
        let body = host.extrude_profile(base, 1.0, FeatureOperation::NewBody).unwrap();
        let face = host.body(body).unwrap().faces[0];

        let sketch = host.create_sketch(SketchPlane::Face(face)).unwrap();
        host.add_circle(sketch, origin(), 0.2).unwrap();
        let cut = host.extrude_profile(sketch, 0.5, FeatureOperation::Cut).unwrap();
        assert_eq!(cut, body);
        assert_eq!(host.bodies().len(), 1);
    }

    #[test]
    fn move_accumulates_translation() {
        let mut host = SimulatedHost::new();
        let sketch = host.create_sketch(SketchPlane::Xy).unwrap();
        host.add_circle(sketch, origin(), 1.0).unwrap();
        let body = host.extrude_profile(sketch, 1.0, FeatureOperation::NewBody).unwrap();

        let step = Vector3 { x: 1.0, y: -2.0, z: 0.5 };
        host.move_body(body, step).unwrap();
        host.move_body(body, step).unwrap();
        let t = host.body(body).unwrap().translation;
        assert_eq!((t.x, t.y, t.z), (2.0, -4.0, 1.0));
    }

    #[test]
    fn injected_failure_leaves_no_mutation() {
        let mut host = SimulatedHost::new().failing_on(HostOp::CreateSketch);
        assert!(host.create_sketch(SketchPlane::Xy).is_err());
        assert_eq!(host.mutations(), 0);
        assert!(host.sketches().is_empty());
    }
}
