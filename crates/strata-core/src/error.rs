use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid address length: expected 32 bytes, got {0}")]
    InvalidAddressLength(usize),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
