use crate::codec::CodecType;

#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

/// Stream-level failures reported by a frame parser.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    #[error("Stream operation failed")]
    Fail,

    #[error("Invalid argument passed to parser")]
    InvalidArg,

    #[error("Out of memory while parsing")]
    NoMem,

    #[error("Not enough data to evaluate the frame header")]
    DataNotEnough,

    #[error("Bytes at cursor do not match any frame signature")]
    WrongHeader,

    #[error("Stream uses a feature that is not supported")]
    NotSupported,

    #[error("Requested stream element not found")]
    NotFound,

    #[error("End of stream")]
    Eos,

    #[error("File header mismatch, stream cannot continue")]
    NotContinue,

    #[error("Only skipping is possible at this position")]
    SkipOnly,
}

/// Decoder-level failures reported by codecs and the dispatcher.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Decode failed: {0}")]
    Fail(String),

    #[error("Not enough memory to hold decoder state")]
    MemLack,

    #[error("Not enough input data to decode a frame")]
    DataLack,

    #[error("Output buffer too small, {needed} bytes needed")]
    BufferNotEnough { needed: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Operation not supported by codec")]
    NotSupport,

    #[error("Codec {0} is not registered")]
    NotFound(CodecType),

    #[error("Codec {0} is already registered")]
    AlreadyRegistered(CodecType),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
}

/// Closed status codes of the stream family, 0 meaning success.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Ok = 0,
    Fail = -1,
    InvalidArg = -2,
    NoMem = -3,
    DataNotEnough = -4,
    WrongHeader = -5,
    NotSupported = -6,
    NotFound = -7,
    Eos = -8,
    NotContinue = -9,
    SkipOnly = -10,
}

/// Closed status codes of the decoder family, 0 meaning success.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    Ok = 0,
    Fail = -1,
    MemLack = -2,
    DataLack = -3,
    BuffNotEnough = -4,
    InvalidParameter = -5,
    NotSupport = -6,
    NotFound = -7,
}

impl StreamStatus {
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl DecodeStatus {
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl From<&StreamError> for StreamStatus {
    fn from(err: &StreamError) -> Self {
        match err {
            StreamError::Fail => Self::Fail,
            StreamError::InvalidArg => Self::InvalidArg,
            StreamError::NoMem => Self::NoMem,
            StreamError::DataNotEnough => Self::DataNotEnough,
            StreamError::WrongHeader => Self::WrongHeader,
            StreamError::NotSupported => Self::NotSupported,
            StreamError::NotFound => Self::NotFound,
            StreamError::Eos => Self::Eos,
            StreamError::NotContinue => Self::NotContinue,
            StreamError::SkipOnly => Self::SkipOnly,
        }
    }
}

impl From<&DecodeError> for DecodeStatus {
    fn from(err: &DecodeError) -> Self {
        match err {
            DecodeError::Fail(_) => Self::Fail,
            DecodeError::MemLack => Self::MemLack,
            DecodeError::DataLack => Self::DataLack,
            DecodeError::BufferNotEnough { .. } => Self::BuffNotEnough,
            DecodeError::InvalidParameter(_) | DecodeError::AlreadyRegistered(_) => {
                Self::InvalidParameter
            }
            DecodeError::NotSupport => Self::NotSupport,
            DecodeError::NotFound(_) => Self::NotFound,
            DecodeError::Stream(stream) => match stream {
                StreamError::DataNotEnough | StreamError::Eos => Self::DataLack,
                StreamError::NoMem => Self::MemLack,
                StreamError::InvalidArg => Self::InvalidParameter,
                StreamError::NotSupported => Self::NotSupport,
                StreamError::NotFound => Self::NotFound,
                _ => Self::Fail,
            },
        }
    }
}

/// How a caller is expected to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// More input bytes resolve it.
    InputInsufficient,
    /// A larger output buffer resolves it.
    CapacityInsufficient,
    /// Terminal for the current stream.
    FormatMismatch,
    /// Close the handle.
    ResourceExhausted,
    /// Programming error, never retried.
    InvalidUsage,
    /// Any other codec failure.
    Fatal,
}

impl ErrorClass {
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::InputInsufficient | Self::CapacityInsufficient)
    }
}

impl StreamError {
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::DataNotEnough => ErrorClass::InputInsufficient,
            Self::WrongHeader | Self::NotContinue | Self::NotSupported | Self::SkipOnly => {
                ErrorClass::FormatMismatch
            }
            Self::NoMem => ErrorClass::ResourceExhausted,
            Self::InvalidArg => ErrorClass::InvalidUsage,
            Self::Fail | Self::NotFound | Self::Eos => ErrorClass::Fatal,
        }
    }
}

impl DecodeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::DataLack => ErrorClass::InputInsufficient,
            Self::BufferNotEnough { .. } => ErrorClass::CapacityInsufficient,
            Self::MemLack => ErrorClass::ResourceExhausted,
            Self::InvalidParameter(_) | Self::AlreadyRegistered(_) | Self::NotFound(_) => {
                ErrorClass::InvalidUsage
            }
            Self::NotSupport => ErrorClass::FormatMismatch,
            Self::Fail(_) => ErrorClass::Fatal,
            Self::Stream(stream) => stream.class(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.class().is_recoverable()
    }

    pub fn status(&self) -> DecodeStatus {
        self.into()
    }
}

#[test]
fn status_codes_are_stable() {
    assert_eq!(StreamStatus::Ok.code(), 0);
    assert_eq!(StreamStatus::from(&StreamError::NotContinue).code(), -9);
    assert_eq!(
        DecodeError::BufferNotEnough { needed: 40 }.status(),
        DecodeStatus::BuffNotEnough
    );
    assert_eq!(
        DecodeError::Stream(StreamError::DataNotEnough).status(),
        DecodeStatus::DataLack
    );
}

#[test]
fn error_classes() {
    assert!(DecodeError::BufferNotEnough { needed: 1 }.is_recoverable());
    assert!(DecodeError::DataLack.is_recoverable());
    assert!(!DecodeError::Stream(StreamError::WrongHeader).is_recoverable());
    assert_eq!(
        StreamError::NotContinue.class(),
        ErrorClass::FormatMismatch
    );
    assert_eq!(DecodeError::MemLack.class(), ErrorClass::ResourceExhausted);
}
