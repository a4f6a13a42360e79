//! One handler per action: check preconditions, convert millimeters to the
//! host unit, issue construction calls.

use crate::action::{
    Action, BoxParams, CylinderParams, ExtrudeParams, GearParams, HoleParams, MoveParams,
    SphereParams,
};
use crate::error::{DispatchError, HostError, PreconditionError};
use crate::gear::{GearDimensions, ToothProfile};
use crate::host::Host;
use crate::types::{
    BodyId, Entity, EntityKind, FaceId, FeatureOperation, Point2, SketchId, SketchPlane, Vector3,
};
use std::f64::consts::TAU;
use tracing::{debug, warn};

/// Host lengths are centimeters.
pub const MM_TO_INTERNAL: f64 = 0.1;

pub fn to_internal(mm: f64) -> f64 {
    mm * MM_TO_INTERNAL
}

/// Runs `action` against the host and returns the user-facing summary.
pub fn run(host: &mut dyn Host, action: &Action) -> Result<String, DispatchError> {
    if !host.has_active_design() {
        return Err(PreconditionError::NoActiveDesign.into());
    }
    match *action {
        Action::CreateBox(p) => create_box(host, p),
        Action::CreateCylinder(p) => create_cylinder(host, p),
        Action::CreateSphere(p) => create_sphere(host, p),
        Action::CreateGear(p) => create_gear(host, p),
        Action::CreateHole(p) => create_hole(host, p),
        Action::ExtrudeFace(p) => extrude_face(host, p),
        Action::MoveBody(p) => move_body(host, p),
    }
}

fn failed(verb: &'static str) -> impl FnOnce(HostError) -> DispatchError {
    move |source| DispatchError::Execution { verb, source }
}

/// Exactly one entity of kind `expected` must be selected.
fn single_selection(
    host: &dyn Host,
    expected: EntityKind,
    guidance: &'static str,
) -> Result<Entity, PreconditionError> {
    let selection = host.selection();
    match selection.as_slice() {
        [] => Err(PreconditionError::NothingSelected { expected, guidance }),
        [entity] if entity.kind() == expected => Ok(*entity),
        [entity] => Err(PreconditionError::WrongSelection {
            expected,
            found: entity.kind(),
        }),
        many => Err(PreconditionError::AmbiguousSelection {
            expected,
            count: many.len(),
        }),
    }
}

fn selected_face(host: &dyn Host, guidance: &'static str) -> Result<FaceId, PreconditionError> {
    match single_selection(host, EntityKind::Face, guidance)? {
        Entity::Face(face) => Ok(face),
        other => Err(PreconditionError::WrongSelection {
            expected: EntityKind::Face,
            found: other.kind(),
        }),
    }
}

fn selected_body(host: &dyn Host, guidance: &'static str) -> Result<BodyId, PreconditionError> {
    match single_selection(host, EntityKind::Body, guidance)? {
        Entity::Body(body) => Ok(body),
        other => Err(PreconditionError::WrongSelection {
            expected: EntityKind::Body,
            found: other.kind(),
        }),
    }
}

/// Creates a sketch, lets `build` fill and consume it, and deletes the sketch
/// again if any later call fails.
fn with_sketch<T>(
    host: &mut dyn Host,
    plane: SketchPlane,
    build: impl FnOnce(&mut dyn Host, SketchId) -> Result<T, HostError>,
) -> Result<T, HostError> {
    let sketch = host.create_sketch(plane)?;
    match build(host, sketch) {
        Ok(value) => Ok(value),
        Err(err) => {
            debug!(sketch = sketch.0, error = %err, "rolling back sketch");
            if let Err(cleanup) = host.delete_sketch(sketch) {
                warn!(sketch = sketch.0, error = %cleanup, "could not remove partial sketch");
            }
            Err(err)
        }
    }
}

fn create_box(host: &mut dyn Host, p: BoxParams) -> Result<String, DispatchError> {
    let (l, w, h) = (to_internal(p.length), to_internal(p.width), to_internal(p.height));
    with_sketch(host, SketchPlane::Xy, |host, sketch| {
        host.add_rectangle(
            sketch,
            Point2::new(-l / 2.0, -w / 2.0),
            Point2::new(l / 2.0, w / 2.0),
        )?;
        host.extrude_profile(sketch, h, FeatureOperation::NewBody)
    })
    .map_err(failed("create box"))?;

    Ok(format!(
        "Created box: {:.1}mm × {:.1}mm × {:.1}mm",
        p.length, p.width, p.height
    ))
}

fn create_cylinder(host: &mut dyn Host, p: CylinderParams) -> Result<String, DispatchError> {
    let (r, h) = (to_internal(p.radius), to_internal(p.height));
    with_sketch(host, SketchPlane::Xy, |host, sketch| {
        host.add_circle(sketch, Point2::new(0.0, 0.0), r)?;
        host.extrude_profile(sketch, h, FeatureOperation::NewBody)
    })
    .map_err(failed("create cylinder"))?;

    Ok(format!(
        "Created cylinder: radius {:.1}mm, height {:.1}mm",
        p.radius, p.height
    ))
}

fn create_sphere(host: &mut dyn Host, p: SphereParams) -> Result<String, DispatchError> {
    let r = to_internal(p.radius);
    with_sketch(host, SketchPlane::Xz, |host, sketch| {
        let center = Point2::new(0.0, 0.0);
        let top = Point2::new(0.0, r);
        let bottom = Point2::new(0.0, -r);
        host.add_arc(sketch, center, top, bottom)?;
        host.add_line(sketch, top, bottom)?;
        host.revolve_profile(sketch, (top, bottom), TAU, FeatureOperation::NewBody)
    })
    .map_err(failed("create sphere"))?;

    Ok(format!("Created sphere: radius {:.1}mm", p.radius))
}

fn create_gear(host: &mut dyn Host, p: GearParams) -> Result<String, DispatchError> {
    let dims = GearDimensions::new(p.number_of_teeth, p.module);
    let profile = ToothProfile::new(&dims.scaled(MM_TO_INTERNAL));
    let bore_radius = to_internal(p.bore_diameter) / 2.0;
    let thickness = to_internal(p.thickness);

    with_sketch(host, SketchPlane::Xy, |host, sketch| {
        for (from, to) in profile.segments() {
            host.add_line(sketch, from, to)?;
        }
        if bore_radius > 0.0 {
            host.add_circle(sketch, Point2::new(0.0, 0.0), bore_radius)?;
        }
        host.extrude_profile(sketch, thickness, FeatureOperation::NewBody)
    })
    .map_err(failed("create gear"))?;

    debug!(
        teeth = dims.teeth,
        pitch = dims.pitch_diameter,
        outer = dims.outer_diameter,
        root = dims.root_diameter,
        "gear built"
    );
    Ok(format!(
        "Created gear: {} teeth, module {}mm, pitch diameter {:.1}mm, bore {:.1}mm, thickness {:.1}mm",
        p.number_of_teeth, p.module, dims.pitch_diameter, p.bore_diameter, p.thickness
    ))
}

fn create_hole(host: &mut dyn Host, p: HoleParams) -> Result<String, DispatchError> {
    let face = selected_face(host, "Please select a face to create a hole in first.")?;
    let (r, depth) = (to_internal(p.diameter) / 2.0, to_internal(p.depth));
    with_sketch(host, SketchPlane::Face(face), |host, sketch| {
        host.add_circle(sketch, Point2::new(0.0, 0.0), r)?;
        host.extrude_profile(sketch, depth, FeatureOperation::Cut)
    })
    .map_err(failed("create hole"))?;

    Ok(format!(
        "Created hole: diameter {:.1}mm, depth {:.1}mm",
        p.diameter, p.depth
    ))
}

fn extrude_face(host: &mut dyn Host, p: ExtrudeParams) -> Result<String, DispatchError> {
    let face = selected_face(host, "Please select a face to extrude first.")?;
    host.extrude_face(face, to_internal(p.distance), FeatureOperation::Join)
        .map_err(failed("extrude face"))?;

    Ok(format!("Extruded selected face by {:.1}mm", p.distance))
}

fn move_body(host: &mut dyn Host, p: MoveParams) -> Result<String, DispatchError> {
    let body = selected_body(host, "Please select a body to move first.")?;
    let translation = Vector3 {
        x: to_internal(p.x),
        y: to_internal(p.y),
        z: to_internal(p.z),
    };
    host.move_body(body, translation)
        .map_err(failed("move body"))?;

    Ok(format!(
        "Moved selected body by X:{:.1}mm, Y:{:.1}mm, Z:{:.1}mm",
        p.x, p.y, p.z
    ))
}
