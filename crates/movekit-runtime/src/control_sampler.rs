//! Per-frame control sampling.
//!
//! Two independent products are derived from the host samples each frame:
//!
//! 1. At most one [`TouchAdjustment`] from the controller touchpad.  A
//!    radial-scroll gesture (when rotation is enabled) wins over a vertical
//!    swipe (when depth is enabled).
//! 2. The DoF-shaped control signal handed to the engine update, built by
//!    [`three_dof_control`] or [`six_dof_control`].
//!
//! # Example
//!
//! ```rust
//! use movekit_runtime::config::TouchConfig;
//! use movekit_runtime::control_sampler::{ControlSampler, TouchAdjustment};
//! use movekit_types::{ControllerSample, Pose, TouchSample, Vec2};
//!
//! let touch = TouchConfig { depth_enabled: true, max_depth_delta: 0.2, ..TouchConfig::default() };
//! let mut sampler = ControlSampler::new(touch);
//!
//! let mut controller = ControllerSample::connected_at(Pose::identity());
//! controller.touch = TouchSample { active: true, position: Vec2::new(0.0, 0.8), force: 1.0 };
//!
//! let adj = sampler.sample_touch(Some(&controller));
//! assert_eq!(adj, Some(TouchAdjustment::Depth { delta_m: 0.2 }));
//! ```

use movekit_types::{
    ControllerSample, InputDriver, Pose, Quaternion, SixDofControl,
    ThreeDofControl, TouchGesture, Vec2, Vec3,
};

use crate::config::TouchConfig;

/// A touchpad-driven nudge applied before the frame's pose update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchAdjustment {
    /// Spin around world up, radians.
    Rotation { delta_rad: f32 },
    /// Move along the control ray, metres (positive = away).
    Depth { delta_m: f32 },
}

/// Turns touchpad samples into [`TouchAdjustment`]s.
///
/// Remembers the last touch position seen during a radial scroll so the
/// next frame can measure the swept angle.
#[derive(Debug, Clone)]
pub struct ControlSampler {
    touch: TouchConfig,
    previous_touch: Vec2,
}

impl ControlSampler {
    pub fn new(touch: TouchConfig) -> Self {
        Self {
            touch,
            previous_touch: Vec2::zero(),
        }
    }

    /// Touch position recorded by the last radial-scroll frame.
    pub fn previous_touch(&self) -> Vec2 {
        self.previous_touch
    }

    /// Derive this frame's touch adjustment, if any.
    ///
    /// Returns `None` without a connected controller.
    pub fn sample_touch(&mut self, controller: Option<&ControllerSample>) -> Option<TouchAdjustment> {
        let controller = controller.filter(|c| c.connected)?;
        let touch = controller.touch;

        if self.touch.rotation_enabled
            && let Some(TouchGesture::RadialScroll(_)) = controller.gesture
        {
            let max = self.touch.max_rotation_delta;
            let angle = Vec2::signed_angle(self.previous_touch, touch.position);
            // Bounded on both sides whatever the gesture reports.
            let clamped = angle.max(-max).min(max);
            self.previous_touch = touch.position;
            return Some(TouchAdjustment::Rotation {
                delta_rad: clamped.to_radians(),
            });
        }

        if self.touch.depth_enabled
            && touch.active
            && touch.position.y.abs() > touch.position.x.abs()
        {
            let magnitude = self.touch.max_depth_delta * touch.force.powi(3);
            return Some(TouchAdjustment::Depth {
                delta_m: magnitude.copysign(touch.position.y),
            });
        }

        None
    }
}

/// Control rotation steered by `driver`, shared by both DoF shapes.
fn driver_rotation(driver: InputDriver, headpose: Pose, controller: Option<&ControllerSample>) -> Quaternion {
    match driver {
        InputDriver::Controller => match controller.filter(|c| c.connected) {
            Some(c) => c.orientation,
            None => Quaternion::identity(),
        },
        InputDriver::Headpose => headpose.rotation,
    }
}

/// Build the 3DoF control signal: the head anchors the ray, the driver
/// aims it.
pub fn three_dof_control(
    driver: InputDriver,
    headpose: Pose,
    controller: Option<&ControllerSample>,
) -> ThreeDofControl {
    ThreeDofControl {
        headpose_position: headpose.position,
        control_rotation: driver_rotation(driver, headpose, controller).normalized(),
    }
}

/// Build the 6DoF control signal: the driver's full pose plus the head pose.
pub fn six_dof_control(
    driver: InputDriver,
    headpose: Pose,
    controller: Option<&ControllerSample>,
) -> SixDofControl {
    let control_position = match driver {
        InputDriver::Controller => match controller.filter(|c| c.connected) {
            Some(c) => c.position,
            None => Vec3::zero(),
        },
        InputDriver::Headpose => headpose.position,
    };
    SixDofControl {
        headpose_position: headpose.position,
        headpose_rotation: headpose.rotation.normalized(),
        control_position,
        control_rotation: driver_rotation(driver, headpose, controller),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use movekit_types::{ScrollDirection, TouchSample};

    fn touching(position: Vec2, force: f32) -> ControllerSample {
        let mut c = ControllerSample::connected_at(Pose::identity());
        c.touch = TouchSample {
            active: true,
            position,
            force,
        };
        c
    }

    fn scrolling(position: Vec2, direction: ScrollDirection) -> ControllerSample {
        let mut c = touching(position, 0.5);
        c.gesture = Some(TouchGesture::RadialScroll(direction));
        c
    }

    fn all_touch(max_depth: f32, max_rotation: f32) -> ControlSampler {
        ControlSampler::new(TouchConfig {
            depth_enabled: true,
            max_depth_delta: max_depth,
            rotation_enabled: true,
            max_rotation_delta: max_rotation,
        })
    }

    fn rotation_of(adj: Option<TouchAdjustment>) -> f32 {
        match adj {
            Some(TouchAdjustment::Rotation { delta_rad }) => delta_rad,
            other => panic!("expected rotation, got {other:?}"),
        }
    }

    #[test]
    fn no_controller_means_no_adjustment() {
        let mut sampler = all_touch(0.1, 10.0);
        assert_eq!(sampler.sample_touch(None), None);
        let disconnected = ControllerSample::disconnected();
        assert_eq!(sampler.sample_touch(Some(&disconnected)), None);
    }

    #[test]
    fn clockwise_scroll_is_clamped_from_below() {
        let mut sampler = all_touch(0.1, 10.0);
        // 12 o'clock to 3 o'clock: a real clockwise sweep of -90°.
        sampler.sample_touch(Some(&scrolling(Vec2::new(0.0, 1.0), ScrollDirection::Clockwise)));
        let delta = rotation_of(
            sampler.sample_touch(Some(&scrolling(Vec2::new(1.0, 0.0), ScrollDirection::Clockwise))),
        );
        assert!(delta.abs() <= 10f32.to_radians() + 1e-6, "delta={delta}");
        assert!((delta + 10f32.to_radians()).abs() < 1e-5, "delta={delta}");
    }

    #[test]
    fn scroll_against_reported_direction_is_still_bounded() {
        let mut sampler = all_touch(0.1, 10.0);
        sampler.sample_touch(Some(&scrolling(Vec2::new(1.0, 0.0), ScrollDirection::Clockwise)));
        // Sweep 90° counter-clockwise while the gesture reports clockwise.
        let delta = rotation_of(
            sampler.sample_touch(Some(&scrolling(Vec2::new(0.0, 1.0), ScrollDirection::Clockwise))),
        );
        assert!((delta - 10f32.to_radians()).abs() < 1e-5, "delta={delta}");
    }

    #[test]
    fn counter_clockwise_scroll_is_clamped_from_below() {
        let mut sampler = all_touch(0.1, 10.0);
        sampler.sample_touch(Some(&scrolling(
            Vec2::new(0.0, 1.0),
            ScrollDirection::CounterClockwise,
        )));
        let delta = rotation_of(sampler.sample_touch(Some(&scrolling(
            Vec2::new(1.0, 0.0),
            ScrollDirection::CounterClockwise,
        ))));
        assert!((delta + 10f32.to_radians()).abs() < 1e-5, "delta={delta}");
    }

    #[test]
    fn small_scroll_passes_through_unclamped() {
        let mut sampler = all_touch(0.1, 10.0);
        let start = Vec2::new(1.0, 0.0);
        let five_deg = 5f32.to_radians();
        let end = Vec2::new(five_deg.cos(), five_deg.sin());
        sampler.sample_touch(Some(&scrolling(start, ScrollDirection::CounterClockwise)));
        let delta =
            rotation_of(sampler.sample_touch(Some(&scrolling(end, ScrollDirection::CounterClockwise))));
        assert!((delta - five_deg).abs() < 1e-4, "delta={delta}");
    }

    #[test]
    fn scroll_updates_previous_touch() {
        let mut sampler = all_touch(0.1, 10.0);
        sampler.sample_touch(Some(&scrolling(Vec2::new(0.3, 0.4), ScrollDirection::Clockwise)));
        assert_eq!(sampler.previous_touch(), Vec2::new(0.3, 0.4));
    }

    #[test]
    fn rotation_wins_over_depth() {
        let mut sampler = all_touch(0.1, 10.0);
        // Mostly vertical touch would qualify for depth too.
        let adj = sampler.sample_touch(Some(&scrolling(Vec2::new(0.0, 0.9), ScrollDirection::Clockwise)));
        assert!(matches!(adj, Some(TouchAdjustment::Rotation { .. })));
    }

    #[test]
    fn depth_uses_cubed_force_and_vertical_sign() {
        let mut sampler = all_touch(0.4, 10.0);
        let up = sampler.sample_touch(Some(&touching(Vec2::new(0.1, 0.6), 0.5)));
        assert_eq!(up, Some(TouchAdjustment::Depth { delta_m: 0.4 * 0.125 }));

        let down = sampler.sample_touch(Some(&touching(Vec2::new(0.1, -0.6), 1.0)));
        assert_eq!(down, Some(TouchAdjustment::Depth { delta_m: -0.4 }));
    }

    #[test]
    fn depth_never_exceeds_max() {
        let mut sampler = all_touch(0.25, 10.0);
        for force in [0.0, 0.3, 0.7, 1.0] {
            match sampler.sample_touch(Some(&touching(Vec2::new(0.0, -0.5), force))) {
                Some(TouchAdjustment::Depth { delta_m }) => {
                    assert!(delta_m.abs() <= 0.25 + f32::EPSILON);
                    assert!(delta_m <= 0.0);
                }
                other => panic!("expected depth, got {other:?}"),
            }
        }
    }

    #[test]
    fn horizontal_swipe_does_not_change_depth() {
        let mut sampler = all_touch(0.1, 10.0);
        assert_eq!(sampler.sample_touch(Some(&touching(Vec2::new(0.8, 0.2), 1.0))), None);
    }

    #[test]
    fn disabled_touch_features_are_ignored() {
        let mut sampler = ControlSampler::new(TouchConfig::default());
        assert_eq!(
            sampler.sample_touch(Some(&scrolling(Vec2::new(0.0, 1.0), ScrollDirection::Clockwise))),
            None
        );
        assert_eq!(sampler.sample_touch(Some(&touching(Vec2::new(0.0, 1.0), 1.0))), None);
    }

    #[test]
    fn six_dof_controller_signal_uses_controller_pose() {
        let controller = ControllerSample::connected_at(Pose::new(
            Vec3::new(1.0, 0.0, 0.0),
            Quaternion::identity(),
        ));
        let control = six_dof_control(InputDriver::Controller, Pose::identity(), Some(&controller));
        assert_eq!(control.control_position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(control.headpose_position, Vec3::zero());
    }

    #[test]
    fn disconnected_controller_falls_back_to_origin() {
        let head = Pose::new(
            Vec3::new(0.0, 1.6, 0.0),
            Quaternion::from_axis_angle(Vec3::up(), 0.5),
        );
        let disconnected = ControllerSample::disconnected();
        let six = six_dof_control(InputDriver::Controller, head, Some(&disconnected));
        assert_eq!(six.control_position, Vec3::zero());
        assert_eq!(six.control_rotation, Quaternion::identity());

        let three = three_dof_control(InputDriver::Controller, head, None);
        assert_eq!(three.control_rotation, Quaternion::identity());
        assert_eq!(three.headpose_position, head.position);
    }

    #[test]
    fn headpose_driver_follows_camera() {
        let head = Pose::new(
            Vec3::new(0.0, 1.6, 0.0),
            Quaternion::new(2.0, 0.0, 0.0, 0.0),
        );
        let three = three_dof_control(InputDriver::Headpose, head, None);
        assert!((three.control_rotation.length() - 1.0).abs() < 1e-6);

        let six = six_dof_control(InputDriver::Headpose, head, None);
        assert_eq!(six.control_position, head.position);
        assert!((six.headpose_rotation.length() - 1.0).abs() < 1e-6);
    }
}
