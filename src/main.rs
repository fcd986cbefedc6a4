// main.rs — desktop viewer for local cinema datasets

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod dataset;
mod renderer;
mod view;

use cinema_thumbnail::{Bounds, CinemaThumbnail, Frame, PointerMove, Presenter, RollPolicy};
use dataset::{Dataset, DatasetError, Overrides};
use renderer::Renderer;
use view::{FrameAction, LoadOutcome, ViewState};

use clap::Parser;
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowBuilder},
};

use image::io::Reader as ImageReader;
use image::RgbaImage;
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

const APP_TITLE: &str = "Cinema Viewer";

#[derive(Parser, Debug)]
#[command(name = "cinema-viewer", version, about = "Browse a cinema image dataset by dragging the camera around it")]
struct Args {
    /// Dataset directory holding `<theta>_<phi>.jpg` images
    dir: Option<PathBuf>,

    /// Angular spacing of the image grid in degrees
    #[arg(long)]
    angle_step: Option<u32>,

    /// Drag sensitivity: full turns per window width of drag
    #[arg(long)]
    rotation_factor: Option<f64>,

    /// Rotate as soon as a frame arrives instead of after its image loaded
    #[arg(long)]
    immediate_roll: bool,

    /// Saved orientation token to start from
    #[arg(long)]
    state: Option<String>,

    /// JSON config file, applied after the dataset's own thumbnail.json
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            config_file: self.config.clone(),
            angle_step: self.angle_step,
            rotation_factor: self.rotation_factor,
            roll_policy: self.immediate_roll.then_some(RollPolicy::Immediate),
        }
    }
}

/// Result of a background image load.
struct Loaded {
    path: PathBuf,
    image: Option<RgbaImage>,
}

/// An open dataset and the thumbnail browsing it.
struct Session {
    dataset: Dataset,
    thumbnail: CinemaThumbnail,
}

impl Session {
    fn open(
        dir: &Path,
        overrides: &Overrides,
        state: Option<&str>,
        frames: &Sender<Frame>,
    ) -> Result<Self, DatasetError> {
        let dataset = Dataset::open(dir, overrides)?;
        let mut thumbnail =
            CinemaThumbnail::with_state(dataset.basepath(), dataset.config.clone(), state);
        thumbnail.attach(forward_to(frames));
        Ok(Self { dataset, thumbnail })
    }
}

/// Presenter handing frames to the event loop.
fn forward_to(frames: &Sender<Frame>) -> impl Presenter + 'static {
    let tx = frames.clone();
    move |frame: &Frame| {
        if tx.send(frame.clone()).is_err() {
            log::warn!("frame {} dropped, display is gone", frame.key);
        }
    }
}

#[derive(Default)]
struct UiRequests {
    open: Option<PathBuf>,
    reset: bool,
    exit: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Args::parse()) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let overrides = args.overrides();
    let initial = overrides.resolve(None)?;

    let (frame_tx, frame_rx): (Sender<Frame>, Receiver<Frame>) = channel();
    let (load_tx, load_rx): (Sender<Loaded>, Receiver<Loaded>) = channel();

    let mut session = match &args.dir {
        Some(dir) => Some(Session::open(dir, &overrides, args.state.as_deref(), &frame_tx)?),
        None => None,
    };

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(APP_TITLE)
            .with_inner_size(LogicalSize::new(720, 720))
            .build(&event_loop)?,
    );
    if let Some(session) = &session {
        set_title(&window, session);
    }

    let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;
    let mut view = match &session {
        Some(session) => ViewState::new(
            session.dataset.config.rotation_factor,
            session.dataset.config.roll_policy,
        ),
        None => ViewState::new(initial.rotation_factor, initial.roll_policy),
    };

    let mut cache: HashMap<PathBuf, RgbaImage> = HashMap::new();
    let mut mouse_pressed = false;
    let mut modifiers = ModifiersState::empty();

    event_loop.run(move |event, _, control_flow| {
        while let Ok(frame) = frame_rx.try_recv() {
            match view.on_frame(frame) {
                FrameAction::Rotate(degrees) => renderer.set_roll(degrees),
                FrameAction::Load { path, rotate_now } => {
                    if let Some(degrees) = rotate_now {
                        renderer.set_roll(degrees);
                    }
                    if let Some(image) = cache.get(&path) {
                        if let LoadOutcome::Show { rotate } = view.on_loaded(&path) {
                            renderer.show_image(image);
                            if let Some(degrees) = rotate {
                                renderer.set_roll(degrees);
                            }
                        }
                    } else {
                        start_load_image(path, load_tx.clone());
                    }
                }
                FrameAction::Wait => {}
            }
            window.request_redraw();
        }

        while let Ok(Loaded { path, image }) = load_rx.try_recv() {
            match image {
                Some(image) => {
                    if let LoadOutcome::Show { rotate } = view.on_loaded(&path) {
                        renderer.show_image(&image);
                        if let Some(degrees) = rotate {
                            renderer.set_roll(degrees);
                        }
                    }
                    cache.insert(path, image);
                }
                None => view.on_failed(&path),
            }
            window.request_redraw();
        }

        // keep polling while an image is on its way
        *control_flow = if view.is_loading() {
            ControlFlow::Poll
        } else {
            ControlFlow::Wait
        };

        match event {
            Event::WindowEvent { event, .. } => {
                // a release over the menu still ends the drag
                track_primary_button(&event, &mut mouse_pressed);

                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.repaint {
                    window.request_redraw();
                }
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        if let Some(session) = &session {
                            log::info!("final orientation: {}", session.thumbnail.state());
                        }
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                    }

                    WindowEvent::ModifiersChanged(state) => {
                        modifiers = state;
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                                        switch_dataset(
                                            &dir,
                                            &overrides,
                                            &mut session,
                                            &mut view,
                                            &mut cache,
                                            (&frame_tx, &frame_rx),
                                            &window,
                                        );
                                    }
                                }
                                Some(VirtualKeyCode::R) => {
                                    if let Some(session) = &mut session {
                                        session.thumbnail.reset();
                                    }
                                }
                                Some(VirtualKeyCode::F11) => {
                                    toggle_fullscreen(&window, &mut view);
                                }
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        if let Some(session) = &mut session {
                            let event = pointer_move(position, &renderer, mouse_pressed, modifiers);
                            if session.thumbnail.handle_pointer_move(&event) {
                                window.request_redraw();
                            }
                        }
                    }

                    WindowEvent::DroppedFile(path) => {
                        // an image dropped from a dataset opens its folder
                        let dir = if path.is_dir() {
                            Some(path)
                        } else {
                            path.parent().map(Path::to_path_buf)
                        };
                        if let Some(dir) = dir {
                            switch_dataset(
                                &dir,
                                &overrides,
                                &mut session,
                                &mut view,
                                &mut cache,
                                (&frame_tx, &frame_rx),
                                &window,
                            );
                        }
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                let mut requests = UiRequests::default();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(ctx, &mut view, session.as_ref(), &mut requests, &window);
                });

                if let Some(session) = &mut session {
                    let config = session.thumbnail.config();
                    let (rotation_factor, roll_policy) = (config.rotation_factor, config.roll_policy);
                    if rotation_factor != view.sensitivity {
                        if let Err(err) = session.thumbnail.set_rotation_factor(view.sensitivity) {
                            log::warn!("{err}");
                            view.sensitivity = rotation_factor;
                        }
                    }
                    if roll_policy != view.roll_policy {
                        session.thumbnail.set_roll_policy(view.roll_policy);
                    }
                    // the camera carries over to a newly opened dataset
                    if requests.reset && requests.open.is_none() {
                        session.thumbnail.reset();
                    }
                }

                if let Some(dir) = requests.open {
                    switch_dataset(
                        &dir,
                        &overrides,
                        &mut session,
                        &mut view,
                        &mut cache,
                        (&frame_tx, &frame_rx),
                        &window,
                    );
                }

                if requests.exit {
                    if let Some(session) = &session {
                        log::info!("final orientation: {}", session.thumbnail.state());
                    }
                    *control_flow = ControlFlow::Exit;
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::warn!("render error: {e:?}"),
                }
            }

            _ => {}
        }
    })
}

fn pointer_move(
    position: PhysicalPosition<f64>,
    renderer: &Renderer,
    primary_down: bool,
    modifiers: ModifiersState,
) -> PointerMove {
    PointerMove {
        client_x: position.x,
        client_y: position.y,
        bounds: Bounds::from_size(
            f64::from(renderer.size.width),
            f64::from(renderer.size.height),
        ),
        primary_down,
        shift: modifiers.shift(),
    }
}

fn set_title(window: &Window, session: &Session) {
    window.set_title(&format!("{} - {}", APP_TITLE, session.dataset.name()));
}

fn toggle_fullscreen(window: &Window, view: &mut ViewState) {
    view.is_fullscreen = !view.is_fullscreen;
    if view.is_fullscreen {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        window.set_fullscreen(None);
    }
}

/// Opens `dir`, keeping the current orientation. A failure leaves the
/// current dataset on screen.
fn switch_dataset(
    dir: &Path,
    overrides: &Overrides,
    session: &mut Option<Session>,
    view: &mut ViewState,
    cache: &mut HashMap<PathBuf, RgbaImage>,
    frames: (&Sender<Frame>, &Receiver<Frame>),
    window: &Window,
) {
    let (frame_tx, frame_rx) = frames;
    let state = session.as_ref().map(|s| s.thumbnail.state());
    // frames from the old thumbnail must not reach the new view
    if let Some(old) = session.as_mut() {
        old.thumbnail.detach();
    }
    let dropped = discard_pending(frame_rx);
    if dropped > 0 {
        log::debug!("discarded {dropped} frames of the previous dataset");
    }

    view.clear();
    cache.clear();
    match Session::open(dir, overrides, state.as_deref(), frame_tx) {
        Ok(opened) => {
            view.sensitivity = opened.dataset.config.rotation_factor;
            view.roll_policy = opened.dataset.config.roll_policy;
            set_title(window, &opened);
            *session = Some(opened);
        }
        Err(err) => {
            log::error!("{err}");
            if let Some(old) = session.as_mut() {
                old.thumbnail.attach(forward_to(frame_tx));
            }
        }
    }
    window.request_redraw();
}

/// Keeps `pressed` in step with the left button.
fn track_primary_button(event: &WindowEvent, pressed: &mut bool) {
    if let WindowEvent::MouseInput { state, button: MouseButton::Left, .. } = event {
        *pressed = *state == ElementState::Pressed;
    }
}

/// Empties the frame queue, returning how many frames were dropped.
fn discard_pending(frames: &Receiver<Frame>) -> usize {
    frames.try_iter().count()
}

fn start_load_image(path: PathBuf, tx: Sender<Loaded>) {
    thread::spawn(move || {
        log::debug!("loading {}", path.display());
        let image = match load_image(&path) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("cannot load {}: {e}", path.display());
                None
            }
        };
        if tx.send(Loaded { path, image }).is_err() {
            log::warn!("viewer closed before the image arrived");
        }
    });
}

fn load_image(path: &Path) -> Result<RgbaImage, image::ImageError> {
    let file = File::open(path)?;
    let mut reader = ImageReader::new(BufReader::new(file)).with_guessed_format()?;
    reader.no_limits();
    Ok(reader.decode()?.to_rgba8())
}

fn draw_ui(
    ctx: &egui::Context,
    view: &mut ViewState,
    session: Option<&Session>,
    requests: &mut UiRequests,
    window: &Window,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open dataset...").clicked() {
                    ui.close_menu();
                    requests.open = rfd::FileDialog::new().pick_folder();
                }
                if ui.button("Exit").clicked() {
                    requests.exit = true;
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Reset camera").clicked() {
                    requests.reset = true;
                    ui.close_menu();
                }

                let label = if view.is_fullscreen { "Exit fullscreen" } else { "Fullscreen" };
                if ui.button(label).clicked() {
                    toggle_fullscreen(window, view);
                    ui.close_menu();
                }

                ui.separator();
                ui.menu_button("Roll", |ui| {
                    if ui
                        .radio_value(&mut view.roll_policy, RollPolicy::Deferred, "After image loads")
                        .clicked()
                    {
                        ui.close_menu();
                    }
                    if ui
                        .radio_value(&mut view.roll_policy, RollPolicy::Immediate, "Immediately")
                        .clicked()
                    {
                        ui.close_menu();
                    }
                });

                ui.separator();
                ui.menu_button("Drag sensitivity", |ui| {
                    ui.add(egui::Slider::new(&mut view.sensitivity, 0.1..=5.0).text("turns / width"));
                    if ui.button("Reset to 1.0").clicked() {
                        view.sensitivity = 1.0;
                    }
                });
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if view.is_loading() {
                ui.label(egui::RichText::new("Loading...").color(egui::Color32::YELLOW));
                ui.label("|");
            }

            let Some(session) = session else {
                ui.label("No dataset. Press O or drop a folder here.");
                return;
            };

            ui.label(session.dataset.name());
            if let Some(frame) = view.latest() {
                ui.label("|");
                ui.label(format!("Image: {}", frame.key));
                ui.label("|");
                ui.label(format!("Roll: {}°", view.roll));
                ui.label("|");
                ui.label(format!("State: {}", frame.state));
            }
            if !session.dataset.missing.is_empty() {
                ui.label("|");
                ui.label(
                    egui::RichText::new(format!("{} missing", session.dataset.missing.len()))
                        .color(egui::Color32::LIGHT_RED),
                );
            }
        });
    });
}
