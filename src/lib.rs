pub mod engine;
pub mod error;
pub mod game;

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{HtmlCanvasElement, KeyboardEvent, Request, RequestInit, RequestMode, Response, WebGlRenderingContext};

use crate::engine::mesh::Mesh;
use crate::engine::renderer::Renderer;
use crate::engine::scene::WebScene;
use crate::error::GameError;
use crate::game::config::{GameConfig, ModelConfig};
use crate::game::input::{Action, InputHandler};
use crate::game::models::{CarModel, ModelLibrary, FALLBACK_COLORS, PLACEHOLDER_EXTENT};
use crate::game::{BuiltinMeshes, Game};

const CONFIG_PATH: &str = "/assets/config.json";

type SharedGame = Rc<RefCell<Game<WebScene>>>;

thread_local! {
    // Shared by the keyboard listeners and the exported touch buttons.
    static INPUT: RefCell<InputHandler> = RefCell::new(InputHandler::new());
}

#[wasm_bindgen]
pub async fn init_game() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;
    let canvas = document.get_element_by_id("canvas")
        .ok_or("No canvas")?
        .dyn_into::<HtmlCanvasElement>()?;

    let gl = canvas
        .get_context("webgl")?
        .ok_or("No WebGL")?
        .dyn_into::<WebGlRenderingContext>()?;

    let config = match load_config().await {
        Ok(config) => {
            log::info!("loaded {}", CONFIG_PATH);
            config
        }
        Err(err @ GameError::AssetLoad { .. }) => {
            log::info!("{}, using default config", err);
            GameConfig::default()
        }
        Err(err) => {
            log::warn!("{}, using default config", err);
            GameConfig::default()
        }
    };

    let mut scene = WebScene::new(Renderer::new(gl)?);
    let [w, h, d] = PLACEHOLDER_EXTENT;
    let meshes = BuiltinMeshes {
        car_placeholder: scene.register_mesh(&Mesh::placeholder_car(w, h, d))?,
        light_glow: scene.register_mesh(&Mesh::cube(1.0, 1.0, 1.0))?,
        road_tile: scene.register_mesh(&Mesh::cube(0.18, 0.18, 0.2))?,
    };

    let game: SharedGame = Rc::new(RefCell::new(Game::new(
        scene,
        config.clone(),
        meshes,
        SmallRng::from_entropy(),
    )?));
    log::info!("night drive started");

    // Input handling
    let keydown = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        if INPUT.with(|input| input.borrow_mut().key_down(&event.code())) {
            event.prevent_default();
        }
    }) as Box<dyn FnMut(_)>);
    window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
    keydown.forget();

    let keyup = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        if INPUT.with(|input| input.borrow_mut().key_up(&event.code())) {
            event.prevent_default();
        }
    }) as Box<dyn FnMut(_)>);
    window.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
    keyup.forget();

    // Game loop
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    let frame_game = game.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        {
            let mut game = frame_game.borrow_mut();
            let input = INPUT.with(|input| input.borrow_mut().take_frame());
            game.update(input);
            game.scene().render(game.player_position(), game.is_game_over());
            update_ui(game.score() as i32, game.is_game_over());
        }
        if let Some(callback) = f.borrow().as_ref() {
            request_animation_frame(callback);
        }
    }) as Box<dyn FnMut()>));

    if let Some(callback) = g.borrow().as_ref() {
        request_animation_frame(callback);
    }

    // Models stream in while the game is already running on placeholders.
    spawn_local(load_assets(game, config));

    Ok(())
}

async fn load_config() -> Result<GameConfig, GameError> {
    let text = fetch(CONFIG_PATH, |resp| resp.text()).await?;
    let json = text.as_string().ok_or_else(|| GameError::AssetLoad {
        name: CONFIG_PATH.to_string(),
        reason: "body is not text".into(),
    })?;
    GameConfig::from_json(&json)
}

async fn fetch_bytes(path: &str) -> Result<Vec<u8>, GameError> {
    let buffer = fetch(path, |resp| resp.array_buffer()).await?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// GET `path` and await the body promise produced by `body`.
async fn fetch(
    path: &str,
    body: impl FnOnce(&Response) -> Result<js_sys::Promise, JsValue>,
) -> Result<JsValue, GameError> {
    let failed = |reason: String| GameError::AssetLoad {
        name: path.to_string(),
        reason,
    };

    let window = web_sys::window().ok_or_else(|| failed("no window".into()))?;
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(path, &opts).map_err(|e| failed(describe(&e)))?;
    let resp: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .and_then(|value| value.dyn_into())
        .map_err(|e| failed(describe(&e)))?;
    if !resp.ok() {
        return Err(failed(format!("HTTP {}", resp.status())));
    }

    let promise = body(&resp).map_err(|e| failed(describe(&e)))?;
    JsFuture::from(promise).await.map_err(|e| failed(describe(&e)))
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

async fn load_model(config: &ModelConfig, game: &SharedGame) -> Result<CarModel, GameError> {
    let bytes = fetch_bytes(&config.path).await?;
    let mut mesh = Mesh::from_gltf(&bytes)?;
    let bounds = mesh
        .recenter_on_ground()
        .ok_or_else(|| GameError::MeshParse(format!("{} has no vertices", config.path)))?;
    let id = game
        .borrow_mut()
        .scene_mut()
        .register_mesh(&mesh)
        .map_err(|e| GameError::AssetLoad {
            name: config.path.clone(),
            reason: describe(&e),
        })?;
    Ok(CarModel::loaded(id, &bounds, config))
}

async fn load_assets(game: SharedGame, config: GameConfig) {
    let placeholder = game.borrow().meshes().car_placeholder;

    let mut models = Vec::with_capacity(config.traffic.models.len());
    for (i, model_config) in config.traffic.models.iter().enumerate() {
        match load_model(model_config, &game).await {
            Ok(model) => models.push(model),
            Err(err) => {
                log::warn!("{}, using placeholder car", err);
                let color = FALLBACK_COLORS[i % FALLBACK_COLORS.len()];
                models.push(CarModel::placeholder(placeholder, color));
            }
        }
    }
    game.borrow_mut().install_models(ModelLibrary::ready(models));

    match load_model(&config.player.model, &game).await {
        Ok(model) => game.borrow_mut().install_player_model(model),
        Err(err) => log::warn!("{}, keeping placeholder player", err),
    }
}

fn request_animation_frame(f: &Closure<dyn FnMut()>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(err) = window.request_animation_frame(f.as_ref().unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {}", describe(&err));
    }
}

fn update_ui(score: i32, game_over: bool) {
    if let Some(window) = web_sys::window() {
        if let Some(document) = window.document() {
            if let Some(score_el) = document.get_element_by_id("score") {
                score_el.set_inner_html(&format!("Score: {}", score));
            }
            if let Some(gameover_el) = document.get_element_by_id("gameover") {
                if game_over {
                    gameover_el.set_attribute("style", "display: block;").ok();
                } else {
                    gameover_el.set_attribute("style", "display: none;").ok();
                }
            }
        }
    }
}

#[wasm_bindgen]
pub fn touch_left() {
    INPUT.with(|input| input.borrow_mut().tap(Action::Left));
}

#[wasm_bindgen]
pub fn touch_right() {
    INPUT.with(|input| input.borrow_mut().tap(Action::Right));
}

#[wasm_bindgen]
pub fn touch_restart() {
    INPUT.with(|input| input.borrow_mut().tap(Action::Restart));
}
