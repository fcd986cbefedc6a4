//! Interactive "cinema" thumbnails.
//!
//! A cinema dataset is a grid of images of one object rendered from discrete
//! camera directions `(theta, phi)`. [`CinemaThumbnail`] turns pointer drags
//! into a continuous trackball camera ([`OrbitCamera`]), picks the closest
//! pre-rendered image for it ([`select_view`]) and reports how far that image
//! must be rotated in-plane so that its up matches the camera's up.

pub mod addressing;
pub mod camera;
pub mod config;
pub mod pointer;
pub mod selector;
pub mod state_token;
pub mod thumbnail;

pub use addressing::{image_path, item_thumbnail_base, ImageGrid, ImageKey};
pub use camera::OrbitCamera;
pub use config::{ConfigError, RollPolicy, ViewerConfig};
pub use pointer::{Bounds, PointerMove, PointerSample};
pub use selector::{select_view, snap, ViewSelection};
pub use state_token::StateTokenError;
pub use thumbnail::{CinemaThumbnail, Frame, Presenter};
