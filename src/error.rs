use std::array::TryFromSliceError;
use rabe_bn::FieldError;
use thiserror::Error;

/// Crate wide result type.
pub type Result<T> = std::result::Result<T, AbeError>;

/// Errors raised by the LSSS compiler and the Waters08 scheme.
///
/// Construction-contract violations (`DuplicateAttribute`, `EmptyMatrix`,
/// `CoefficientOverflow`) signal a malformed policy and must not be retried
/// with the same input. Everything else is a recoverable error the caller may
/// answer with corrected input.
#[derive(Error, Debug)]
pub enum AbeError {
    #[error("duplicate attribute {id} in monotone formula: each attribute may appear only once")]
    DuplicateAttribute { id: u32 },
    #[error("share generating matrix has no rows")]
    EmptyMatrix,
    #[error("integer overflow while computing reconstruction coefficients")]
    CoefficientOverflow,
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),
    #[error("no such attribute: {0}")]
    NoSuchAttribute(String),
    #[error("attribute {0} already exists")]
    AttributeExists(String),
    #[error("unsupported security level: {requested} bits (supported: 1..={max})")]
    UnsupportedSecurityLevel { requested: u32, max: u32 },
    #[error("invalid public parameters: {0}")]
    InvalidPublicParameters(String),
    #[error("invalid master secret key: {0}")]
    InvalidMasterSecretKey(String),
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),
    #[error("deserialization error: {0}")]
    Deserialization(String),
    #[error("field error: {0}")]
    Field(String),
    #[error("decryption failed: {0}")]
    Decryption(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<FieldError> for AbeError {
    fn from(error: FieldError) -> Self {
        match error {
            FieldError::InvalidSliceLength => AbeError::Field("FieldError::InvalidSliceLength".to_string()),
            FieldError::InvalidU512Encoding => AbeError::Field("FieldError::InvalidU512Encoding".to_string()),
            FieldError::NotMember => AbeError::Field("FieldError::NotMember".to_string()),
        }
    }
}

impl From<TryFromSliceError> for AbeError {
    fn from(error: TryFromSliceError) -> Self {
        AbeError::Deserialization(error.to_string())
    }
}
