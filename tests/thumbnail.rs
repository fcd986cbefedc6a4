use cinema_thumbnail::{
    image_path, item_thumbnail_base, Bounds, CinemaThumbnail, Frame, ImageGrid, ImageKey,
    PointerMove, RollPolicy, ViewerConfig,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

fn pointer(x: f64, y: f64, primary_down: bool, shift: bool) -> PointerMove {
    PointerMove {
        client_x: x,
        client_y: y,
        bounds: Bounds::new(100.0, 50.0, 256.0, 256.0),
        primary_down,
        shift,
    }
}

fn attached(config: ViewerConfig) -> (CinemaThumbnail, Rc<RefCell<Vec<Frame>>>) {
    let frames = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&frames);
    let base = item_thumbnail_base("/api/v1", "abc123");
    let mut viewer = CinemaThumbnail::new(base, config);
    viewer.attach(move |frame: &Frame| sink.borrow_mut().push(frame.clone()));
    (viewer, frames)
}

#[test]
fn initial_frame_uses_rest_path() {
    let (_viewer, frames) = attached(ViewerConfig::default());
    let frames = frames.borrow();
    assert_eq!(
        frames[0].path,
        "/api/v1/item/abc123/interactive_thumbnail/80_0.jpg"
    );
    assert_eq!(
        frames[0].path,
        image_path("/api/v1/item/abc123/interactive_thumbnail", 80, 0)
    );
}

#[test]
fn full_orbit_walks_the_grid() {
    let (mut viewer, frames) = attached(ViewerConfig::default());
    let grid: HashSet<ImageKey> = ImageGrid::new(20).keys().into_iter().collect();

    // drag across the widget in small steps, one full turn in total
    viewer.handle_pointer_move(&pointer(100.0, 178.0, false, false));
    for i in 1..=64 {
        let x = 100.0 + f64::from(i) * 4.0;
        assert!(viewer.handle_pointer_move(&pointer(x, 178.0, true, false)));
    }

    let frames = frames.borrow();
    assert_eq!(frames.len(), 65);
    let visited: HashSet<ImageKey> = frames.iter().map(|f| f.key).collect();
    assert!(visited.iter().all(|key| grid.contains(key)));
    assert!(visited.iter().all(|key| key.theta == 80));
    // negative angles snap toward zero and the back hemisphere stops half a
    // step early, so column 260 is never selected
    assert_eq!(visited.len(), 17);
    assert!(!visited.contains(&ImageKey::new(80, 260)));
    for frame in frames.iter() {
        assert_eq!(frame.roll_degrees, 0, "{frame:?}");
    }

    // back where we started
    let p = viewer.camera().position();
    assert!((p.z - 1.0).abs() < 1e-9, "position = {p}");
}

#[test]
fn vertical_drag_reaches_the_pole_clamp() {
    let (mut viewer, frames) = attached(ViewerConfig::default());
    viewer.handle_pointer_move(&pointer(228.0, 300.0, false, false));
    // a quarter turn of elevation, in eight steps
    for i in 1..=8 {
        let y = 300.0 - f64::from(i) * 8.0;
        viewer.handle_pointer_move(&pointer(228.0, y, true, false));
    }
    let last = frames.borrow().last().cloned().unwrap();
    assert!(last.key.theta == 1 || last.key.theta == 179, "{last:?}");
}

#[test]
fn deferred_and_immediate_policies() {
    let (_deferred, frames) = attached(ViewerConfig::default());
    assert_eq!(frames.borrow()[0].roll_policy, RollPolicy::Deferred);

    let (_immediate, frames) = attached(ViewerConfig {
        roll_policy: RollPolicy::Immediate,
        ..ViewerConfig::default()
    });
    assert_eq!(frames.borrow()[0].roll_policy, RollPolicy::Immediate);
}

#[test]
fn state_token_survives_reload() {
    let (mut viewer, frames) = attached(ViewerConfig::default());
    viewer.handle_pointer_move(&pointer(150.0, 150.0, false, false));
    viewer.handle_pointer_move(&pointer(190.0, 170.0, true, false));
    viewer.handle_pointer_move(&pointer(190.0, 150.0, true, true));
    let saved = frames.borrow().last().unwrap().state.clone();
    assert_eq!(saved, viewer.state());

    let reloaded = CinemaThumbnail::with_state("x", ViewerConfig::default(), Some(&saved));
    let camera = reloaded.camera();
    assert!((camera.position() - viewer.camera().position()).length() < 0.05);
    assert!((camera.view_up() - viewer.camera().view_up()).length() < 0.05);
    assert!(camera.position().dot(camera.view_up()).abs() < 1e-9);
}

#[test]
fn garbage_state_means_default_camera() {
    let viewer = CinemaThumbnail::with_state("x", ViewerConfig::default(), Some("!!!!!!!!"));
    assert_eq!(viewer.selection().key, ImageKey::new(80, 0));
    assert_eq!(viewer.selection().roll_degrees, 0);
}
