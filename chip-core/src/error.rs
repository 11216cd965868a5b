use thiserror::Error;

/// Main error type for CHIP onboarding operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChipError {
    #[error("TLV parsing error: {0}")]
    TlvParsing(String),

    #[error("TLV encoding error: {0}")]
    TlvEncoding(String),

    #[error("Invalid Base38 data: {0}")]
    InvalidBase38(String),

    #[error("Unrecognized QR code: {0}")]
    UnrecognizedQrCode(String),

    #[error("Invalid manual pairing code: {0}")]
    InvalidManualCode(String),

    #[error("Invalid onboarding payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Discriminant of a [`ChipError`], for callers that branch on the failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipErrorKind {
    TlvParsing,
    TlvEncoding,
    InvalidBase38,
    UnrecognizedQrCode,
    InvalidManualCode,
    InvalidPayload,
    InvalidArgument,
}

impl ChipError {
    /// Get the kind of this error
    pub fn kind(&self) -> ChipErrorKind {
        match self {
            ChipError::TlvParsing(_) => ChipErrorKind::TlvParsing,
            ChipError::TlvEncoding(_) => ChipErrorKind::TlvEncoding,
            ChipError::InvalidBase38(_) => ChipErrorKind::InvalidBase38,
            ChipError::UnrecognizedQrCode(_) => ChipErrorKind::UnrecognizedQrCode,
            ChipError::InvalidManualCode(_) => ChipErrorKind::InvalidManualCode,
            ChipError::InvalidPayload(_) => ChipErrorKind::InvalidPayload,
            ChipError::InvalidArgument(_) => ChipErrorKind::InvalidArgument,
        }
    }

    /// Get the message carried by this error
    pub fn message(&self) -> &str {
        match self {
            ChipError::TlvParsing(msg)
            | ChipError::TlvEncoding(msg)
            | ChipError::InvalidBase38(msg)
            | ChipError::UnrecognizedQrCode(msg)
            | ChipError::InvalidManualCode(msg)
            | ChipError::InvalidPayload(msg)
            | ChipError::InvalidArgument(msg) => msg,
        }
    }
}

/// Result type alias for CHIP onboarding operations
pub type ChipResult<T> = Result<T, ChipError>;
