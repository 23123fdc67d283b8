use wasm_bindgen::JsValue;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("lane index {index} out of range (lane count {count})")]
    LaneOutOfRange { index: usize, count: usize },
    #[error("failed to load asset {name}: {reason}")]
    AssetLoad { name: String, reason: String },
    #[error("mesh parse error: {0}")]
    MeshParse(String),
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid config value {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, GameError>;

impl From<GameError> for JsValue {
    fn from(err: GameError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
