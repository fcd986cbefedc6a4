// view.rs — what the window currently shows and which image is on its way

use cinema_thumbnail::{Frame, RollPolicy};
use std::path::{Path, PathBuf};

/// What the event loop should do with a new frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameAction {
    /// Image already on screen: only the rotation changes.
    Rotate(i32),
    /// Start loading `path`; `rotate_now` is set when the roll must not wait.
    Load { path: PathBuf, rotate_now: Option<i32> },
    /// The image is already loading; nothing to do yet.
    Wait,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Upload the image, then apply `rotate` if set.
    Show { rotate: Option<i32> },
    /// A newer image was requested in the meantime.
    Stale,
}

pub struct ViewState {
    pub sensitivity: f64,
    pub roll_policy: RollPolicy,
    pub is_fullscreen: bool,
    pub roll: i32,
    shown: Option<PathBuf>,
    requested: Option<PathBuf>,
    pending_roll: Option<i32>,
    latest: Option<Frame>,
}

impl ViewState {
    pub fn new(sensitivity: f64, roll_policy: RollPolicy) -> Self {
        Self {
            sensitivity,
            roll_policy,
            is_fullscreen: false,
            roll: 0,
            shown: None,
            requested: None,
            pending_roll: None,
            latest: None,
        }
    }

    pub fn latest(&self) -> Option<&Frame> {
        self.latest.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.requested.is_some()
    }

    /// Forgets the displayed image, e.g. after switching datasets.
    pub fn clear(&mut self) {
        self.shown = None;
        self.requested = None;
        self.pending_roll = None;
        self.latest = None;
    }

    pub fn on_frame(&mut self, frame: Frame) -> FrameAction {
        let path = PathBuf::from(&frame.path);
        let roll = frame.roll_degrees;
        let policy = frame.roll_policy;
        self.latest = Some(frame);

        if self.shown.as_ref() == Some(&path) {
            // back on the displayed image: drop whatever was loading
            self.requested = None;
            self.pending_roll = None;
            self.roll = roll;
            return FrameAction::Rotate(roll);
        }

        let already_loading = self.requested.as_ref() == Some(&path);
        self.requested = Some(path.clone());

        match policy {
            RollPolicy::Deferred => {
                self.pending_roll = Some(roll);
                if already_loading {
                    FrameAction::Wait
                } else {
                    FrameAction::Load { path, rotate_now: None }
                }
            }
            RollPolicy::Immediate => {
                self.pending_roll = None;
                self.roll = roll;
                if already_loading {
                    FrameAction::Rotate(roll)
                } else {
                    FrameAction::Load { path, rotate_now: Some(roll) }
                }
            }
        }
    }

    pub fn on_loaded(&mut self, path: &Path) -> LoadOutcome {
        if self.requested.as_deref() != Some(path) {
            return LoadOutcome::Stale;
        }
        self.requested = None;
        self.shown = Some(path.to_path_buf());
        let rotate = self.pending_roll.take();
        if let Some(roll) = rotate {
            self.roll = roll;
        }
        LoadOutcome::Show { rotate }
    }

    /// A failed load keeps the previous image and its rotation.
    pub fn on_failed(&mut self, path: &Path) {
        if self.requested.as_deref() == Some(path) {
            self.requested = None;
            self.pending_roll = None;
        }
    }
}
