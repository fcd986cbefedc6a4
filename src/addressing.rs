// addressing.rs — cinema dataset grid and file naming
//
// Images of a cinema dataset live at `<basepath>/<theta>_<phi>.jpg`. The
// naming is shared with the dataset generator and must not change.

use std::fmt;
use std::path::Path;

use crate::selector::{MAX_THETA, MIN_THETA};

/// Angle step used by the thumbnail generation job.
pub const DEFAULT_ANGLE_STEP: u32 = 20;
/// Edge length (px) of generated thumbnails.
pub const DEFAULT_IMAGE_SIZE: u32 = 256;

/// Grid coordinate of a pre-rendered image, in integer degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageKey {
    pub theta: i32,
    pub phi: i32,
}

impl ImageKey {
    pub fn new(theta: i32, phi: i32) -> Self {
        Self { theta, phi }
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}.jpg", self.theta, self.phi)
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.theta, self.phi)
    }
}

pub fn image_path(basepath: &str, theta: i32, phi: i32) -> String {
    format!("{basepath}/{theta}_{phi}.jpg")
}

/// REST prefix under which an item's thumbnail images are served.
pub fn item_thumbnail_base(api_root: &str, item_id: &str) -> String {
    format!("{}/item/{}/interactive_thumbnail", api_root.trim_end_matches('/'), item_id)
}

/// Every image a dataset with the given step is expected to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGrid {
    angle_step: u32,
}

impl ImageGrid {
    pub fn new(angle_step: u32) -> Self {
        Self {
            angle_step: angle_step.max(1),
        }
    }

    pub fn angle_step(&self) -> u32 {
        self.angle_step
    }

    /// Multiples of the step over [0, 180], with the poles pulled in to 1 and 179.
    pub fn thetas(&self) -> Vec<i32> {
        let mut thetas: Vec<i32> = (0..=180)
            .step_by(self.angle_step as usize)
            .map(|theta: i32| theta.clamp(MIN_THETA, MAX_THETA))
            .collect();
        thetas.dedup();
        thetas
    }

    pub fn phis(&self) -> Vec<i32> {
        (0..360).step_by(self.angle_step as usize).collect()
    }

    pub fn keys(&self) -> Vec<ImageKey> {
        let phis = self.phis();
        self.thetas()
            .into_iter()
            .flat_map(|theta| phis.iter().map(move |&phi| ImageKey::new(theta, phi)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.thetas().len() * self.phis().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys whose image file is absent from a local dataset directory.
    pub fn missing(&self, dir: &Path) -> Vec<ImageKey> {
        self.keys()
            .into_iter()
            .filter(|key| !dir.join(key.file_name()).is_file())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{hemisphere_epsilon, select_view};
    use glam::DVec3;
    use std::collections::HashSet;

    #[test]
    fn path_format() {
        assert_eq!(image_path("/api/v1/item/abc/interactive_thumbnail", 1, 340),
            "/api/v1/item/abc/interactive_thumbnail/1_340.jpg");
        assert_eq!(image_path("data", 80, 0), "data/80_0.jpg");
        assert_eq!(ImageKey::new(179, 20).file_name(), "179_20.jpg");
        assert_eq!(ImageKey::new(100, 260).to_string(), "100_260");
    }

    #[test]
    fn item_base() {
        assert_eq!(
            item_thumbnail_base("http://host/api/v1/", "5b2f"),
            "http://host/api/v1/item/5b2f/interactive_thumbnail"
        );
    }

    #[test]
    fn default_grid_shape() {
        let grid = ImageGrid::new(DEFAULT_ANGLE_STEP);
        assert_eq!(grid.thetas(), vec![1, 20, 40, 60, 80, 100, 120, 140, 160, 179]);
        assert_eq!(grid.phis().len(), 18);
        assert_eq!(grid.len(), 180);
        assert_eq!(grid.keys().len(), grid.len());
    }

    #[test]
    fn unit_step_has_no_duplicate_poles() {
        let grid = ImageGrid::new(1);
        let thetas = grid.thetas();
        assert_eq!(thetas.first(), Some(&1));
        assert_eq!(thetas.last(), Some(&179));
        assert_eq!(thetas.len(), 179);
    }

    #[test]
    fn selections_are_grid_members() {
        let grid = ImageGrid::new(DEFAULT_ANGLE_STEP);
        let keys: HashSet<_> = grid.keys().into_iter().collect();
        let eps = hemisphere_epsilon(DEFAULT_ANGLE_STEP);
        for i in 0..36 {
            for j in -9..=9 {
                let azimuth = f64::from(i * 10).to_radians();
                let elevation = f64::from(j * 10).to_radians();
                let p = DVec3::new(
                    elevation.cos() * azimuth.sin(),
                    elevation.sin(),
                    elevation.cos() * azimuth.cos(),
                );
                let s = select_view(p, DVec3::Y, DEFAULT_ANGLE_STEP, eps);
                assert!(keys.contains(&s.key), "{} not in grid", s.key);
            }
        }
    }

    #[test]
    fn reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let grid = ImageGrid::new(90);
        for key in grid.keys().iter().skip(1) {
            std::fs::write(dir.path().join(key.file_name()), b"jpg").unwrap();
        }
        assert_eq!(grid.missing(dir.path()), vec![ImageKey::new(1, 0)]);
    }
}
