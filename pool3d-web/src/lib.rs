/// Pool3D Web - WASM/WebGL2 front end for the pool scene
///
/// Call `start(canvasId, configJson?)` once the page has loaded. Space takes the shot;
/// `shoot()` does the same for an on-page button.
use pool3d_core::{AnimationState, FrameClock, SceneConfig, SceneDirector, SceneError, Viewport};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, KeyboardEvent, WebGl2RenderingContext, Window};

mod device;
mod shaders;

pub use device::WebGlDevice;

struct App {
    scene: SceneDirector,
    device: WebGlDevice,
    canvas: HtmlCanvasElement,
    clock: FrameClock,
}

impl App {
    fn frame(&mut self, now_ms: f64) -> Result<(), SceneError> {
        let dt = self.clock.delta(now_ms / 1000.0);
        let viewport = Viewport::new(self.canvas.width(), self.canvas.height());
        self.scene.frame(&mut self.device, dt, viewport);
        self.device.check_error()
    }
}

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
    static STARTED: Cell<bool> = Cell::new(false);
}

/// Marks the scene as started; false if it already was.
fn claim_start() -> bool {
    STARTED.with(|started| !started.replace(true))
}

fn release_start() {
    STARTED.with(|started| started.set(false));
}

fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|cell| cell.borrow_mut().as_mut().map(f))
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Set up the scene on `canvas_id` and start the animation loop.
#[wasm_bindgen]
pub fn start(canvas_id: &str, config_json: Option<String>) -> Result<(), JsValue> {
    // A second call would stack another set of listeners and another frame loop
    if !claim_start() {
        return Err(JsValue::from_str("pool3d is already running"));
    }
    let result = launch(canvas_id, config_json);
    if result.is_err() {
        release_start();
    }
    result
}

fn launch(canvas_id: &str, config_json: Option<String>) -> Result<(), JsValue> {
    let config = match config_json {
        Some(json) => SceneConfig::from_json(&json).map_err(to_js)?,
        None => SceneConfig::default(),
    };

    let window = window()?;
    let canvas = window
        .document()
        .and_then(|doc| doc.get_element_by_id(canvas_id))
        .ok_or_else(|| JsValue::from_str(&format!("no element with id '{}'", canvas_id)))?
        .dyn_into::<HtmlCanvasElement>()?;
    fit_to_window(&window, &canvas);

    let gl = canvas
        .get_context("webgl2")?
        .ok_or_else(|| JsValue::from_str("WebGL2 not supported"))?
        .dyn_into::<WebGl2RenderingContext>()?;

    let mut device = WebGlDevice::new(gl).map_err(to_js)?;
    let scene = SceneDirector::new(&mut device, config).map_err(to_js)?;
    APP.with(|cell| {
        *cell.borrow_mut() = Some(App {
            scene,
            device,
            canvas: canvas.clone(),
            clock: FrameClock::new(),
        });
    });

    listen_for_input(&window)?;
    listen_for_resize(&window, canvas)?;
    run_loop()?;

    log::info!("pool3d: started on #{}", canvas_id);
    Ok(())
}

/// Take the shot, as the Space key does.
#[wasm_bindgen]
pub fn shoot() -> bool {
    with_app(|app| app.scene.start()).unwrap_or(false)
}

/// Current animation state name, e.g. `"rolling"`.
#[wasm_bindgen]
pub fn state() -> String {
    with_app(|app| app.scene.animation_state())
        .unwrap_or(AnimationState::Ready)
        .to_string()
}

fn listen_for_input(window: &Window) -> Result<(), JsValue> {
    let on_key = Closure::<dyn FnMut(KeyboardEvent)>::new(|event: KeyboardEvent| {
        if event.code() == "Space" {
            event.prevent_default();
            with_app(|app| app.scene.start());
        }
    });
    window.add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref())?;
    on_key.forget();
    Ok(())
}

fn listen_for_resize(window: &Window, canvas: HtmlCanvasElement) -> Result<(), JsValue> {
    let on_resize = Closure::<dyn FnMut()>::new(move || {
        if let Some(window) = web_sys::window() {
            fit_to_window(&window, &canvas);
        }
    });
    window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
    on_resize.forget();
    Ok(())
}

/// requestAnimationFrame loop. A failing frame is logged and the loop carries on.
fn run_loop() -> Result<(), JsValue> {
    let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = callback.clone();

    *callback.borrow_mut() = Some(Closure::new(move |now: f64| {
        if let Some(Err(e)) = with_app(|app| app.frame(now)) {
            log::error!("pool3d: frame failed: {}", e);
        }
        if let Some(cb) = next.borrow().as_ref() {
            if let Err(e) = request_animation_frame(cb) {
                log::error!("pool3d: cannot schedule next frame: {:?}", e);
            }
        }
    }));

    let first = callback.borrow();
    let scheduled = match first.as_ref() {
        Some(cb) => request_animation_frame(cb).map(|_| ()),
        None => Err(JsValue::from_str("animation callback missing")),
    };
    scheduled
}

fn request_animation_frame(callback: &Closure<dyn FnMut(f64)>) -> Result<i32, JsValue> {
    window()?.request_animation_frame(callback.as_ref().unchecked_ref())
}

fn fit_to_window(window: &Window, canvas: &HtmlCanvasElement) {
    let size = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32;
    canvas.set_width(size(window.inner_width()));
    canvas.set_height(size(window.inner_height()));
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

fn to_js(e: SceneError) -> JsValue {
    JsValue::from_str(&e.to_string())
}
