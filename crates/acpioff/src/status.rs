//! Error kinds produced by the services layer and the ACPI exception codes
//! exchanged with the interpreter.

use core::{fmt, result};

pub type Result<T> = result::Result<T, OslError>;

/// Failure kinds of a services layer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OslError {
    /// Null, out of range or malformed input.
    InvalidParameter,
    /// Missing registration or unsupported mechanism.
    NotFound,
    /// Duplicate registration.
    AlreadyExists,
    NoMemory,
    /// Request outside a supported numeric range.
    Limit,
    Error,
}

impl fmt::Display for OslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Status::from(*self), f)
    }
}

/// An ACPI exception code, numbered the way ACPICA numbers them.
///
/// The upper nibble of the low 16 bits selects the class (environmental,
/// programmer, table, AML, control), the rest is the code within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Status(pub u32);

macro_rules! exceptions {
    ($($name:ident = $value:literal),* $(,)?) => {
        impl Status {
            $(pub const $name: Status = Status($value);)*

            /// The symbolic name of a known exception code.
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

exceptions! {
    AE_OK = 0x0000,

    AE_ERROR = 0x0001,
    AE_NO_ACPI_TABLES = 0x0002,
    AE_NO_NAMESPACE = 0x0003,
    AE_NO_MEMORY = 0x0004,
    AE_NOT_FOUND = 0x0005,
    AE_NOT_EXIST = 0x0006,
    AE_ALREADY_EXISTS = 0x0007,
    AE_TYPE = 0x0008,
    AE_NULL_OBJECT = 0x0009,
    AE_NULL_ENTRY = 0x000a,
    AE_BUFFER_OVERFLOW = 0x000b,
    AE_STACK_OVERFLOW = 0x000c,
    AE_STACK_UNDERFLOW = 0x000d,
    AE_NOT_IMPLEMENTED = 0x000e,
    AE_SUPPORT = 0x000f,
    AE_LIMIT = 0x0010,
    AE_TIME = 0x0011,
    AE_ACQUIRE_DEADLOCK = 0x0012,
    AE_RELEASE_DEADLOCK = 0x0013,
    AE_NOT_ACQUIRED = 0x0014,
    AE_ALREADY_ACQUIRED = 0x0015,
    AE_NO_HARDWARE_RESPONSE = 0x0016,
    AE_NO_GLOBAL_LOCK = 0x0017,
    AE_ABORT_METHOD = 0x0018,
    AE_SAME_HANDLER = 0x0019,
    AE_NO_HANDLER = 0x001a,
    AE_OWNER_ID_LIMIT = 0x001b,

    AE_BAD_PARAMETER = 0x1001,
    AE_BAD_CHARACTER = 0x1002,
    AE_BAD_PATHNAME = 0x1003,
    AE_BAD_DATA = 0x1004,
    AE_BAD_HEX_CONSTANT = 0x1005,
    AE_BAD_OCTAL_CONSTANT = 0x1006,
    AE_BAD_DECIMAL_CONSTANT = 0x1007,
    AE_MISSING_ARGUMENTS = 0x1008,
    AE_BAD_ADDRESS = 0x1009,

    AE_BAD_SIGNATURE = 0x2001,
    AE_BAD_HEADER = 0x2002,
    AE_BAD_CHECKSUM = 0x2003,
    AE_BAD_VALUE = 0x2004,
    AE_INVALID_TABLE_LENGTH = 0x2005,

    AE_AML_BAD_OPCODE = 0x3001,
    AE_AML_NO_OPERAND = 0x3002,
    AE_AML_OPERAND_TYPE = 0x3003,
    AE_AML_OPERAND_VALUE = 0x3004,
    AE_AML_UNINITIALIZED_LOCAL = 0x3005,
    AE_AML_UNINITIALIZED_ARG = 0x3006,
    AE_AML_UNINITIALIZED_ELEMENT = 0x3007,
    AE_AML_NUMERIC_OVERFLOW = 0x3008,
    AE_AML_REGION_LIMIT = 0x3009,
    AE_AML_BUFFER_LIMIT = 0x300a,
    AE_AML_PACKAGE_LIMIT = 0x300b,
    AE_AML_DIVIDE_BY_ZERO = 0x300c,

    AE_CTRL_RETURN_VALUE = 0x4001,
    AE_CTRL_PENDING = 0x4002,
    AE_CTRL_TERMINATE = 0x4003,
    AE_CTRL_TRUE = 0x4004,
    AE_CTRL_FALSE = 0x4005,
    AE_CTRL_DEPTH = 0x4006,
    AE_CTRL_END = 0x4007,
    AE_CTRL_TRANSFER = 0x4008,
    AE_CTRL_BREAK = 0x4009,
    AE_CTRL_CONTINUE = 0x400a,
    AE_CTRL_SKIP = 0x400b,
    AE_CTRL_PARSE_CONTINUE = 0x400c,
    AE_CTRL_PARSE_PENDING = 0x400d,
}

impl Status {
    #[inline]
    pub fn is_ok(self) -> bool {
        self == Status::AE_OK
    }

    /// The code as a process exit status.
    #[inline]
    pub fn exit_code(self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "AE_UNKNOWN(0x{:04X})", self.0),
        }
    }
}

impl From<OslError> for Status {
    fn from(err: OslError) -> Self {
        match err {
            OslError::InvalidParameter => Status::AE_BAD_PARAMETER,
            OslError::NotFound => Status::AE_NOT_EXIST,
            OslError::AlreadyExists => Status::AE_ALREADY_EXISTS,
            OslError::NoMemory => Status::AE_NO_MEMORY,
            OslError::Limit => Status::AE_LIMIT,
            OslError::Error => Status::AE_ERROR,
        }
    }
}
