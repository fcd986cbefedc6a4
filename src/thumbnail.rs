// thumbnail.rs — cinema thumbnail viewer: pointer input -> camera -> image choice

use crate::addressing::{image_path, ImageKey};
use crate::camera::OrbitCamera;
use crate::config::{check_rotation_factor, ConfigError, RollPolicy, ViewerConfig};
use crate::pointer::{PointerMove, PointerSample};
use crate::selector::{select_view, ViewSelection};
use crate::state_token::StateTokenError;

/// What the host should display: image `path`, rotated by `roll_degrees`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub key: ImageKey,
    pub path: String,
    pub roll_degrees: i32,
    /// `Deferred` asks the host to hold the rotation until `path` has loaded.
    pub roll_policy: RollPolicy,
    /// Orientation token to persist alongside the displayed image.
    pub state: String,
}

impl Frame {
    /// CSS-style transform for the rotation.
    pub fn transform(&self) -> String {
        format!("rotate({}deg)", self.roll_degrees)
    }
}

/// Display side of the viewer. This is the only place a frame leaves the core.
pub trait Presenter {
    fn present(&mut self, frame: &Frame);
}

impl<F: FnMut(&Frame)> Presenter for F {
    fn present(&mut self, frame: &Frame) {
        self(frame)
    }
}

pub struct CinemaThumbnail {
    basepath: String,
    config: ViewerConfig,
    epsilon: f64,
    camera: OrbitCamera,
    last_sample: PointerSample,
    presenter: Option<Box<dyn Presenter>>,
    last_frame: Option<Frame>,
}

impl CinemaThumbnail {
    pub fn new(basepath: impl Into<String>, config: ViewerConfig) -> Self {
        let camera = OrbitCamera::new(config.rotation_factor);
        Self {
            basepath: basepath.into(),
            epsilon: config.epsilon(),
            config,
            camera,
            last_sample: PointerSample::default(),
            presenter: None,
            last_frame: None,
        }
    }

    /// Like [`CinemaThumbnail::new`], restoring a previously saved orientation.
    /// A missing or unusable token leaves the default camera.
    pub fn with_state(basepath: impl Into<String>, config: ViewerConfig, saved: Option<&str>) -> Self {
        let mut viewer = Self::new(basepath, config);
        if let Some(token) = saved {
            viewer.set_state(token);
        }
        viewer
    }

    pub fn basepath(&self) -> &str {
        &self.basepath
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.presenter.is_some()
    }

    /// Connects the display side and shows the current frame.
    pub fn attach(&mut self, presenter: impl Presenter + 'static) {
        self.presenter = Some(Box::new(presenter));
        self.update_image();
    }

    /// Releases the display side. Later refreshes are no-ops.
    pub fn detach(&mut self) -> Option<Box<dyn Presenter>> {
        self.last_frame = None;
        self.presenter.take()
    }

    /// Points the viewer at another dataset; the camera is kept.
    pub fn set_basepath(&mut self, basepath: impl Into<String>) {
        self.basepath = basepath.into();
        self.last_frame = None;
        self.update_image();
    }

    /// Changes the drag sensitivity. Non-finite or non-positive factors are
    /// rejected and the current one is kept.
    pub fn set_rotation_factor(&mut self, rotation_factor: f64) -> Result<(), ConfigError> {
        check_rotation_factor(rotation_factor)?;
        self.config.rotation_factor = rotation_factor;
        self.camera.set_rotation_factor(rotation_factor);
        Ok(())
    }

    pub fn set_roll_policy(&mut self, roll_policy: RollPolicy) {
        self.config.roll_policy = roll_policy;
    }

    pub fn reset(&mut self) {
        self.camera.reset();
        self.update_image();
    }

    /// Feeds one pointer-move event. Returns `true` when the camera moved.
    ///
    /// The primary button orbits, primary + shift rolls. The sample is
    /// remembered either way so the next drag starts from here.
    pub fn handle_pointer_move(&mut self, event: &PointerMove) -> bool {
        let sample = event.sample();
        let (dx, dy) = sample.delta_from(&self.last_sample);

        let moved = if !event.primary_down {
            false
        } else if event.shift {
            self.camera.roll(dx, dy, &sample)
        } else {
            self.camera.rotate(dx, dy, sample.width, sample.height)
        };

        if moved {
            self.update_image();
        }
        self.last_sample = sample;
        moved
    }

    pub fn selection(&self) -> ViewSelection {
        select_view(
            self.camera.position(),
            self.camera.view_up(),
            self.config.angle_step,
            self.epsilon,
        )
    }

    /// Picks the image for the current camera and hands it to the presenter.
    /// Returns `false` when nothing is attached.
    pub fn update_image(&mut self) -> bool {
        let Some(presenter) = self.presenter.as_mut() else {
            return false;
        };

        let ViewSelection { key, roll_degrees } = select_view(
            self.camera.position(),
            self.camera.view_up(),
            self.config.angle_step,
            self.epsilon,
        );
        let frame = Frame {
            key,
            path: image_path(&self.basepath, key.theta, key.phi),
            roll_degrees,
            roll_policy: self.config.roll_policy,
            state: self.camera.encode_state(),
        };

        if self.last_frame.as_ref().map(|f| f.key) != Some(key) {
            log::debug!("showing {} (roll {} deg)", frame.path, roll_degrees);
        }
        presenter.present(&frame);
        self.last_frame = Some(frame);
        true
    }

    /// Current orientation token.
    pub fn state(&self) -> String {
        self.camera.encode_state()
    }

    /// Restores an orientation token. An empty token means no saved state;
    /// a malformed one resets the camera to its default and reports why.
    pub fn try_set_state(&mut self, token: &str) -> Result<(), StateTokenError> {
        if token.is_empty() {
            return Ok(());
        }
        if let Err(err) = self.camera.restore_state(token) {
            self.camera.reset();
            return Err(err);
        }
        Ok(())
    }

    /// [`CinemaThumbnail::try_set_state`] that logs instead of failing.
    pub fn set_state(&mut self, token: &str) -> bool {
        match self.try_set_state(token) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("ignoring saved orientation {token:?}: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::Bounds;
    use std::cell::RefCell;
    use std::rc::Rc;

    const BASE: &str = "/api/v1/item/42/interactive_thumbnail";

    fn recorder() -> (Rc<RefCell<Vec<Frame>>>, impl Presenter + 'static) {
        let frames = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&frames);
        (frames, move |frame: &Frame| sink.borrow_mut().push(frame.clone()))
    }

    fn drag(x: f64, y: f64, shift: bool) -> PointerMove {
        PointerMove {
            client_x: x,
            client_y: y,
            bounds: Bounds::from_size(200.0, 200.0),
            primary_down: true,
            shift,
        }
    }

    fn hover(x: f64, y: f64) -> PointerMove {
        PointerMove {
            primary_down: false,
            ..drag(x, y, false)
        }
    }

    #[test]
    fn attach_shows_initial_frame() {
        let (frames, presenter) = recorder();
        let mut viewer = CinemaThumbnail::new(BASE, ViewerConfig::default());
        viewer.attach(presenter);

        let frames = frames.borrow();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].path, format!("{BASE}/80_0.jpg"));
        assert_eq!(frames[0].roll_degrees, 0);
        assert_eq!(frames[0].transform(), "rotate(0deg)");
        assert_eq!(frames[0].roll_policy, RollPolicy::Deferred);
        assert_eq!(frames[0].state, "gID/gP+A");
    }

    #[test]
    fn hover_only_tracks_position() {
        let (frames, presenter) = recorder();
        let mut viewer = CinemaThumbnail::new(BASE, ViewerConfig::default());
        viewer.attach(presenter);

        assert!(!viewer.handle_pointer_move(&hover(100.0, 100.0)));
        assert_eq!(frames.borrow().len(), 1);

        // the drag delta is measured from the hover sample, not the origin
        assert!(viewer.handle_pointer_move(&drag(50.0, 100.0, false)));
        let p = viewer.camera().position();
        assert!((p.x - 1.0).abs() < 1e-9, "position = {p}");
        assert_eq!(frames.borrow().len(), 2);
    }

    #[test]
    fn shift_drag_rolls() {
        let (frames, presenter) = recorder();
        let mut viewer = CinemaThumbnail::new(BASE, ViewerConfig::default());
        viewer.attach(presenter);
        viewer.handle_pointer_move(&hover(20.0, 100.0));
        assert!(viewer.handle_pointer_move(&drag(20.0, 80.0, true)));

        let frames = frames.borrow();
        let last = frames.last().unwrap();
        assert_eq!(last.key, ImageKey::new(80, 0));
        assert_ne!(last.roll_degrees, 0);
        assert!((viewer.camera().position() - glam::DVec3::Z).length() < 1e-9);
    }

    #[test]
    fn zero_roll_skips_refresh() {
        let (frames, presenter) = recorder();
        let mut viewer = CinemaThumbnail::new(BASE, ViewerConfig::default());
        viewer.attach(presenter);
        viewer.handle_pointer_move(&hover(60.0, 60.0));
        let camera = *viewer.camera();

        assert!(!viewer.handle_pointer_move(&drag(60.0, 60.0, true)));
        assert_eq!(*viewer.camera(), camera);
        assert_eq!(frames.borrow().len(), 1);
    }

    #[test]
    fn detached_viewer_is_inert() {
        let (frames, presenter) = recorder();
        let mut viewer = CinemaThumbnail::new(BASE, ViewerConfig::default());
        viewer.attach(presenter);
        assert!(viewer.detach().is_some());
        assert!(!viewer.is_attached());

        viewer.handle_pointer_move(&hover(0.0, 0.0));
        assert!(viewer.handle_pointer_move(&drag(30.0, 10.0, false)));
        assert!(!viewer.update_image());
        assert_eq!(frames.borrow().len(), 1);
        assert!(viewer.last_frame().is_none());
    }

    #[test]
    fn immediate_policy_is_forwarded() {
        let (frames, presenter) = recorder();
        let config = ViewerConfig {
            roll_policy: RollPolicy::Immediate,
            ..ViewerConfig::default()
        };
        let mut viewer = CinemaThumbnail::new(BASE, config);
        viewer.attach(presenter);
        assert_eq!(frames.borrow()[0].roll_policy, RollPolicy::Immediate);
    }

    #[test]
    fn state_restores_orientation() {
        let mut viewer = CinemaThumbnail::new(BASE, ViewerConfig::default());
        viewer.handle_pointer_move(&hover(100.0, 100.0));
        viewer.handle_pointer_move(&drag(70.0, 85.0, false));
        let token = viewer.state();
        assert_eq!(token.len(), 8);

        let restored = CinemaThumbnail::with_state(BASE, ViewerConfig::default(), Some(&token));
        let (before, after) = (viewer.selection(), restored.selection());
        assert_eq!(after.key, before.key);
        // quantization can move the roll across a rounding boundary
        assert!((after.roll_degrees - before.roll_degrees).abs() <= 1);
    }

    #[test]
    fn malformed_state_falls_back_to_default() {
        for token in ["abc", "########", "gID/gP+A!"] {
            let viewer = CinemaThumbnail::with_state(BASE, ViewerConfig::default(), Some(token));
            assert_eq!(*viewer.camera(), OrbitCamera::default(), "token {token:?}");
        }

        let mut viewer = CinemaThumbnail::new(BASE, ViewerConfig::default());
        viewer.handle_pointer_move(&hover(0.0, 0.0));
        viewer.handle_pointer_move(&drag(40.0, 0.0, false));
        assert!(matches!(viewer.try_set_state("short"), Err(StateTokenError::Length { .. })));
        assert_eq!(*viewer.camera(), OrbitCamera::default());
        assert!(viewer.try_set_state("").is_ok());
    }

    #[test]
    fn parallel_vectors_are_degenerate() {
        // position and view up both +Z
        let mut viewer = CinemaThumbnail::new(BASE, ViewerConfig::default());
        assert!(matches!(viewer.try_set_state("gID/gID/"), Err(StateTokenError::Degenerate)));
    }

    #[test]
    fn invalid_rotation_factor_is_rejected() {
        let (frames, presenter) = recorder();
        let mut viewer = CinemaThumbnail::new(BASE, ViewerConfig::default());
        viewer.attach(presenter);

        for factor in [f64::NAN, f64::INFINITY, 0.0, -1.0] {
            assert!(matches!(
                viewer.set_rotation_factor(factor),
                Err(ConfigError::InvalidRotationFactor(_))
            ));
        }
        assert_eq!(viewer.config().rotation_factor, 1.0);

        viewer.handle_pointer_move(&hover(100.0, 100.0));
        assert!(viewer.handle_pointer_move(&drag(50.0, 100.0, false)));
        let p = viewer.camera().position();
        assert!((p.length() - 1.0).abs() < 1e-9, "position = {p}");
        assert!((p.x - 1.0).abs() < 1e-9, "position = {p}");
        assert_eq!(frames.borrow().len(), 2);

        assert!(viewer.set_rotation_factor(0.5).is_ok());
        assert_eq!(viewer.camera().rotation_factor(), 0.5);
    }

    #[test]
    fn nan_config_never_collapses_the_camera() {
        let config = ViewerConfig {
            rotation_factor: f64::NAN,
            ..ViewerConfig::default()
        };
        let mut viewer = CinemaThumbnail::new(BASE, config);
        viewer.handle_pointer_move(&hover(100.0, 100.0));
        assert!(!viewer.handle_pointer_move(&drag(50.0, 100.0, false)));
        assert_eq!(viewer.camera().position(), glam::DVec3::Z);
        assert_eq!(viewer.camera().view_up(), glam::DVec3::Y);
    }

    #[test]
    fn basepath_change_refreshes() {
        let (frames, presenter) = recorder();
        let mut viewer = CinemaThumbnail::new(BASE, ViewerConfig::default());
        viewer.attach(presenter);
        viewer.set_basepath("local");
        assert_eq!(frames.borrow().last().unwrap().path, "local/80_0.jpg");
    }
}
