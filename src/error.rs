pub type LayerswapResult<T> = Result<T, LayerswapError>;

#[derive(thiserror::Error, Debug)]
pub enum LayerswapError {
    #[error("format error: {0}")]
    Format(String),

    #[error("placeholder layer '{0}' not found")]
    NotFound(String),

    #[error("dangling resource reference: placeholder points at index {index} but the table holds {table_len} entries")]
    DanglingReference { index: usize, table_len: usize },

    #[error("resource too large: {len} bytes exceeds the {max} byte limit")]
    ResourceTooLarge { len: usize, max: usize },

    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LayerswapError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn unsupported_encoding(msg: impl Into<String>) -> Self {
        Self::UnsupportedEncoding(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}
