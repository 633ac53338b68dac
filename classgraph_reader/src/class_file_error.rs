use thiserror::Error;

/// Models the possible errors raised while reading a single `.class` file.
///
/// Every variant here is recoverable at the call site: `parser::parse`
/// catches all of them and turns the classfile into a skipped record plus a
/// log entry. Nothing in this crate panics on malformed input.
#[derive(Error, Debug, PartialEq)]
pub enum ClassFileError {
    #[error("invalid class data: {0}")]
    InvalidClassData(String),

    #[error("constant pool tag not supported: {0}")]
    ConstantPoolTagNotSupported(u8),
    #[error("invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("constant pool entry at {0} is not a {1}")]
    WrongConstantPoolEntryKind(u16, &'static str),

    #[error("unexpected end of input")]
    UnexpectedEndOfData,
    #[error("invalid modified UTF-8 string")]
    InvalidCesu8String,

    #[error("unknown annotation element-value tag: {0}")]
    UnknownElementValueTag(u8),
    #[error("unsupported ConstantValue coercion for descriptor {0}")]
    UnsupportedConstantValueDescriptor(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ClassFileError {
    fn from(e: std::io::Error) -> Self {
        ClassFileError::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClassFileError>;
