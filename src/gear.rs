//! Spur gear reference circles and a polygonal tooth outline.
//!
//! The outline is a straight-segment approximation of the tooth flanks, not a
//! true involute. Each tooth contributes [`POINTS_PER_TOOTH`] boundary points
//! walking counter-clockwise: root, pitch, outer, outer, pitch, root.

use crate::types::Point2;
use std::f64::consts::TAU;

pub const POINTS_PER_TOOTH: usize = 6;

/// Share of one angular slot occupied by the tooth at each reference circle.
const ROOT_WIDTH: f64 = 0.55;
const PITCH_WIDTH: f64 = 0.5;
const OUTER_WIDTH: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearDimensions {
    pub teeth: u32,
    pub module: f64,
    pub pitch_diameter: f64,
    pub outer_diameter: f64,
    pub root_diameter: f64,
}

impl GearDimensions {
    pub fn new(teeth: u32, module: f64) -> Self {
        let pitch_diameter = f64::from(teeth) * module;
        let addendum = module;
        let dedendum = 1.25 * module;
        Self {
            teeth,
            module,
            pitch_diameter,
            outer_diameter: pitch_diameter + 2.0 * addendum,
            root_diameter: pitch_diameter - 2.0 * dedendum,
        }
    }

    /// Angle between neighbouring tooth centers, in radians.
    pub fn slot_angle(&self) -> f64 {
        TAU / f64::from(self.teeth)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            teeth: self.teeth,
            module: self.module * factor,
            pitch_diameter: self.pitch_diameter * factor,
            outer_diameter: self.outer_diameter * factor,
            root_diameter: self.root_diameter * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryPoint {
    /// Polar angle normalized to `[0, 2π)`.
    pub angle: f64,
    pub radius: f64,
}

impl BoundaryPoint {
    fn new(angle: f64, radius: f64) -> Self {
        Self {
            angle: angle.rem_euclid(TAU),
            radius,
        }
    }

    pub fn position(&self) -> Point2 {
        Point2::polar(self.radius, self.angle)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToothProfile {
    pub points: Vec<BoundaryPoint>,
}

impl ToothProfile {
    pub fn new(dims: &GearDimensions) -> Self {
        let slot = dims.slot_angle();
        let root = dims.root_diameter / 2.0;
        let pitch = dims.pitch_diameter / 2.0;
        let outer = dims.outer_diameter / 2.0;
        let (hr, hp, ho) = (
            slot * ROOT_WIDTH / 2.0,
            slot * PITCH_WIDTH / 2.0,
            slot * OUTER_WIDTH / 2.0,
        );

        let mut points = Vec::with_capacity(dims.teeth as usize * POINTS_PER_TOOTH);
        for i in 0..dims.teeth {
            let center = f64::from(i) * slot;
            points.extend([
                BoundaryPoint::new(center - hr, root),
                BoundaryPoint::new(center - hp, pitch),
                BoundaryPoint::new(center - ho, outer),
                BoundaryPoint::new(center + ho, outer),
                BoundaryPoint::new(center + hp, pitch),
                BoundaryPoint::new(center + hr, root),
            ]);
        }
        Self { points }
    }

    /// Closed polygon edges, the last one running from the final tooth back
    /// to the first.
    pub fn segments(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| {
            (
                self.points[i].position(),
                self.points[(i + 1) % n].position(),
            )
        })
    }

    /// Total counter-clockwise angle walked around the closed outline.
    ///
    /// Each step is taken modulo 2π so the closing edge wraps correctly; a
    /// well-formed outline sweeps exactly one turn.
    pub fn angular_sweep(&self) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| (self.points[(i + 1) % n].angle - self.points[i].angle).rem_euclid(TAU))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn reference_diameters_follow_module() {
        let dims = GearDimensions::new(20, 2.0);
        assert!((dims.pitch_diameter - 40.0).abs() < EPS);
        assert!((dims.outer_diameter - 44.0).abs() < EPS);
        assert!((dims.root_diameter - 35.0).abs() < EPS);
    }

    #[test]
    fn reference_diameters_for_odd_sizes() {
        for (teeth, module) in [(7, 0.5), (31, 1.25), (64, 3.0)] {
            let dims = GearDimensions::new(teeth, module);
            let pitch = f64::from(teeth) * module;
            assert!((dims.pitch_diameter - pitch).abs() < EPS);
            assert!((dims.outer_diameter - (pitch + 2.0 * module)).abs() < EPS);
            assert!((dims.root_diameter - (pitch - 2.5 * module)).abs() < EPS);
        }
    }

    #[test]
    fn profile_has_fixed_points_per_tooth() {
        for teeth in [3, 12, 20, 57] {
            let profile = ToothProfile::new(&GearDimensions::new(teeth, 2.0));
            assert_eq!(profile.points.len(), teeth as usize * POINTS_PER_TOOTH);
            assert_eq!(profile.segments().count(), profile.points.len());
        }
    }

    #[test]
    fn outline_sweeps_one_full_turn() {
        for teeth in [3, 20, 99] {
            let profile = ToothProfile::new(&GearDimensions::new(teeth, 1.0));
            assert!((profile.angular_sweep() - TAU).abs() < 1e-9);
        }
    }

    #[test]
    fn first_root_point_wraps_below_two_pi() {
        let profile = ToothProfile::new(&GearDimensions::new(20, 2.0));
        let first = profile.points[0];
        assert!(first.angle > 3.0 * std::f64::consts::FRAC_PI_2 && first.angle < TAU);
        assert!((first.radius - 17.5).abs() < EPS);
    }

    #[test]
    fn closing_segment_joins_last_tooth_to_first() {
        let profile = ToothProfile::new(&GearDimensions::new(10, 2.0));
        let (from, to) = profile.segments().last().unwrap();
        let last = profile.points.last().unwrap().position();
        let first = profile.points[0].position();
        assert_eq!(from, last);
        assert_eq!(to, first);
    }

    #[test]
    fn scaling_keeps_tooth_count() {
        let dims = GearDimensions::new(20, 2.0).scaled(0.1);
        assert_eq!(dims.teeth, 20);
        assert!((dims.pitch_diameter - 4.0).abs() < EPS);
    }
}
