pub type ForgeResult<T> = Result<T, ForgeError>;

#[derive(thiserror::Error, Debug)]
pub enum ForgeError {
    #[error("asset fetch error: {0}")]
    AssetFetch(String),

    #[error("font registration error: {0}")]
    FontRegistration(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("pixel ({x}, {y}) out of range for {width}x{height} buffer")]
    OutOfRange {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ForgeError {
    pub fn asset_fetch(msg: impl Into<String>) -> Self {
        Self::AssetFetch(msg.into())
    }

    pub fn font_registration(msg: impl Into<String>) -> Self {
        Self::FontRegistration(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}
