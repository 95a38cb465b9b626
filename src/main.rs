//! Plummet entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlElement, MouseEvent};

    use plummet::Settings;
    use plummet::assets::fetch_model;
    use plummet::consts::*;
    use plummet::renderer::RenderState;
    use plummet::sim::{AssetRequest, Key, LevelId, Session};

    const CANVAS_ID: &str = "gl-canvas";

    // JS binding for pointer lock
    #[wasm_bindgen(inline_js = "
        export function request_pointer_lock() {
            const canvas = document.getElementById('gl-canvas');
            if (canvas) {
                const result = canvas.requestPointerLock();
                if (result && result.catch) {
                    result.catch(e => console.error('Pointer lock failed:', e));
                }
            }
        }
    ")]
    extern "C" {
        fn request_pointer_lock();
    }

    /// Game instance holding all state
    struct Game {
        session: Session,
        render_state: Option<RenderState>,
        settings: Settings,
        accumulator: f32,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        /// Last text written to the readout element
        shown_readout: String,
        pointer_locked: bool,
    }

    impl Game {
        fn new(seed: u64, settings: Settings) -> Self {
            Self {
                session: Session::new(seed),
                render_state: None,
                settings,
                accumulator: 0.0,
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                shown_readout: String::new(),
                pointer_locked: false,
            }
        }

        /// Pointer lock changed: gameplay pauses or resumes. Time spent
        /// paused is never replayed as ticks.
        fn set_locked(&mut self, locked: bool) {
            self.pointer_locked = locked;
            self.accumulator = 0.0;
            if locked {
                self.session.lock_acquired();
            } else {
                self.session.lock_released();
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.session.step();
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(self.session.current()) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update the height readout in the DOM (only when it changed)
        fn update_hud(&mut self, document: &web_sys::Document) {
            let mut text = self.session.current().readout.clone().unwrap_or_default();
            if self.settings.show_fps {
                text = format!("{} ({} fps)", text, self.fps);
            }
            if text == self.shown_readout {
                return;
            }
            if let Some(el) = document.get_element_by_id("height") {
                el.set_text_content(Some(&text));
            }
            self.shown_readout = text;
        }
    }

    /// Show or hide the pause overlay
    fn set_overlay_visible(document: &web_sys::Document, visible: bool) {
        if let Some(el) = document
            .get_element_by_id("blurred")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        {
            let display = if visible { "block" } else { "none" };
            let _ = el.style().set_property("display", display);
        }
    }

    /// Canvas drawing-buffer size in device pixels
    fn canvas_size(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        (width.max(1), height.max(1))
    }

    async fn init_renderer(
        canvas: &HtmlCanvasElement,
        width: u32,
        height: u32,
    ) -> Option<RenderState> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Failed to create surface: {}", e);
                return None;
            }
        };

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::error!("Failed to get adapter: {}", e);
                return None;
            }
        };

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match RenderState::new(surface, &adapter, width, height).await {
            Ok(render_state) => Some(render_state),
            Err(e) => {
                log::error!("Failed to create device: {}", e);
                None
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Plummet starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id(CANVAS_ID)
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let (width, height) = canvas_size(&window, &canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = window
            .location()
            .search()
            .ok()
            .and_then(|query| plummet::seed_from_query(&query))
            .unwrap_or_else(|| js_sys::Date::now() as u64);

        let settings = Settings::load();
        let game = Rc::new(RefCell::new(Game::new(seed, settings.clone())));

        // Model loads start immediately; the menu is usable while they run
        start_asset_loads(game.clone());

        if let Some(mut render_state) = init_renderer(&canvas, width, height).await {
            render_state.camera.fov_y_degrees = settings.fov_degrees;
            game.borrow_mut().render_state = Some(render_state);
        } else {
            log::warn!("Running without rendering");
        }

        set_overlay_visible(&document, true);

        setup_level_buttons(&document, game.clone());
        setup_pointer_lock(&document, game.clone());
        setup_keyboard(&document, game.clone());
        setup_mouse_look(&document, game.clone());
        setup_resize(&window, &canvas, game.clone());

        log::info!("Plummet running with seed {}", game.borrow().session.seed());

        request_animation_frame(game);
    }

    /// Fetch every model once and queue one completion per request
    fn start_asset_loads(game: Rc<RefCell<Game>>) {
        let mut by_path: BTreeMap<String, Vec<AssetRequest>> = BTreeMap::new();
        for request in game.borrow().session.asset_requests() {
            by_path.entry(request.path.clone()).or_default().push(request);
        }

        for (path, requests) in by_path {
            let game = game.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match fetch_model(&path).await {
                    Ok(model) => {
                        let mut g = game.borrow_mut();
                        for request in &requests {
                            g.session.enqueue(request.complete(model.clone()));
                        }
                        log::info!("Loaded {} ({} uses)", path, requests.len());
                    }
                    Err(e) => log::error!("{}", e),
                }
            });
        }
    }

    fn setup_level_buttons(document: &web_sys::Document, game: Rc<RefCell<Game>>) {
        let buttons = [("levelOneButton", LevelId::One), ("levelTwoButton", LevelId::Two)];
        for (button_id, level) in buttons {
            let Some(btn) = document.get_element_by_id(button_id) else {
                log::warn!("Missing #{}", button_id);
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let ready = game.borrow_mut().session.select_level(level);
                if ready {
                    request_pointer_lock();
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_pointer_lock(document: &web_sys::Document, game: Rc<RefCell<Game>>) {
        {
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let locked = document_clone.pointer_lock_element().is_some();
                log::info!("Pointer lock {}", if locked { "acquired" } else { "released" });
                game.borrow_mut().set_locked(locked);
                set_overlay_visible(&document_clone, !locked);
            });
            let _ = document.add_event_listener_with_callback(
                "pointerlockchange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                log::error!("Pointer lock error!");
            });
            let _ = document.add_event_listener_with_callback(
                "pointerlockerror",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }
    }

    fn setup_keyboard(document: &web_sys::Document, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if let Some(key) = Key::from_code(&event.code()) {
                    game.borrow_mut().session.key_down(key);
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if let Some(key) = Key::from_code(&event.code()) {
                    game.borrow_mut().session.key_up(key);
                }
            });
            let _ = document
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_mouse_look(document: &web_sys::Document, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let mut g = game.borrow_mut();
            if !g.pointer_locked {
                return;
            }
            let dx = event.movement_x() as f32;
            let dy = g.settings.look_dy(event.movement_y() as f32);
            let sensitivity = g.settings.mouse_sensitivity;
            g.session.look(dx, dy, sensitivity);
        });
        let _ = document
            .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(window: &web_sys::Window, canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window_clone = window.clone();
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let (width, height) = canvas_size(&window_clone, &canvas);
            canvas.set_width(width);
            canvas.set_height(height);
            if let Some(render_state) = game.borrow_mut().render_state.as_mut() {
                render_state.resize(width, height);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Plummet (native) starting...");
    log::info!("Native mode is a headless demo - serve the web build to play");

    let seed = std::env::var("PLUMMET_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    demo::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted walk through both levels. Models are read from disk when the
/// asset directory is present, otherwise boxes stand in for them.
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::collections::BTreeMap;

    use glam::Vec3;

    use plummet::assets::{LoadedModel, parse_model};
    use plummet::sim::{Aabb, AssetRequest, Key, LevelId, ObjectKind, Session};

    /// Flat platform, scaled up 15x when placed. Off-centre so the spawn
    /// point is not on the seam between the top face's triangles.
    fn platform_bounds() -> Aabb {
        Aabb::new(Vec3::new(-0.5, -0.1, -0.4), Vec3::new(0.5, 0.0, 0.6))
    }

    /// Roughly plane-shaped, scaled up 3x when placed
    fn object_bounds() -> Aabb {
        Aabb::from_center(Vec3::ZERO, Vec3::new(1.5, 0.4, 1.5))
    }

    fn load(request: &AssetRequest) -> LoadedModel {
        let parsed = std::fs::read(&request.path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| parse_model(&request.path, &bytes).map_err(|e| e.to_string()));
        match parsed {
            Ok(model) => model,
            Err(e) => {
                log::debug!("{}: {}, using a box", request.path, e);
                let bounds = match request.kind {
                    ObjectKind::Base => platform_bounds(),
                    ObjectKind::Decoration => object_bounds(),
                };
                LoadedModel::cuboid(&request.path, bounds)
            }
        }
    }

    fn load_everything(session: &mut Session) {
        let mut loaded: BTreeMap<String, LoadedModel> = BTreeMap::new();
        for request in session.asset_requests() {
            let model = loaded
                .entry(request.path.clone())
                .or_insert_with(|| load(&request))
                .clone();
            session.enqueue(request.complete(model));
        }
    }

    fn play(session: &mut Session, level: LevelId) {
        if !session.select_level(level) {
            log::error!("{} has no base, skipping", level.as_str());
            return;
        }
        session.lock_acquired();
        session.key_down(Key::Forward);

        let mut resets = 0;
        for tick in 0..600 {
            if tick % 45 == 0 {
                session.key_down(Key::Jump);
            }
            if tick == 300 {
                session.look(400.0, 0.0, 0.002);
            }
            if let Some(report) = session.step() {
                if report.reset {
                    resets += 1;
                }
            }
            if tick % 120 == 0 {
                let current = session.current();
                log::info!(
                    "{} tick {}: pos {:?} readout {:?}",
                    level.as_str(),
                    tick,
                    current.player.position,
                    current.readout
                );
            }
        }

        session.key_up(Key::Forward);
        session.lock_released();

        let current = session.current();
        println!(
            "{} (seed {}): {} objects, {} resets, last readout {}",
            level.as_str(),
            session.seed(),
            current.objects.len(),
            resets,
            current.readout.as_deref().unwrap_or("-")
        );
    }

    pub fn run(seed: u64) {
        let mut session = Session::new(seed);
        load_everything(&mut session);
        // Applied on the first step, paused or not
        session.step();

        for level in LevelId::ALL {
            play(&mut session, level);
        }
    }
}
