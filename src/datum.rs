//! Column data types and values.
//!
//! This module defines the type system and value representation for the
//! relation layer. [`DataType`] names the two supported column types, and
//! [`Value`] represents a single typed column value with serialization to the
//! on-page binary format.

use std::fmt;

/// Errors from value serialization/deserialization.
#[derive(Debug)]
pub enum SerializationError {
    /// Buffer too small for the operation.
    BufferTooSmall {
        /// Bytes required.
        required: usize,
        /// Bytes available.
        available: usize,
    },
    /// Text value too long for the 16-bit length prefix.
    TextTooLong {
        /// Byte length of the offending value.
        len: usize,
    },
    /// Invalid data format.
    InvalidFormat(String),
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationError::BufferTooSmall {
                required,
                available,
            } => {
                write!(
                    f,
                    "buffer too small: need {} bytes, have {}",
                    required, available
                )
            }
            SerializationError::TextTooLong { len } => {
                write!(f, "text value of {} bytes exceeds the 16-bit length limit", len)
            }
            SerializationError::InvalidFormat(msg) => {
                write!(f, "invalid format: {}", msg)
            }
        }
    }
}

impl std::error::Error for SerializationError {}

/// Returns `SerializationError::BufferTooSmall` if the buffer is too small.
#[macro_export]
macro_rules! ensure_buf_len {
    ($buf:expr, $required:expr) => {
        if $buf.len() < $required {
            return Err($crate::datum::SerializationError::BufferTooSmall {
                required: $required,
                available: $buf.len(),
            });
        }
    };
}

/// Column data type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit signed integer.
    Int,
    /// Variable-length text, up to 65535 bytes.
    Text,
}

impl DataType {
    /// Returns the fixed byte size for fixed-length types, or `None` for
    /// variable-length types.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            DataType::Int => Some(4),
            DataType::Text => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int => "INT",
            DataType::Text => "TEXT",
        };
        write!(f, "{}", name)
    }
}

/// A typed column value.
///
/// Text values own their string data; nothing deserialized aliases the page
/// buffer it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit signed integer (INT).
    Int(i32),
    /// Variable-length text (TEXT).
    Text(String),
}

impl Value {
    /// Returns the data type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Text(_) => DataType::Text,
        }
    }

    /// Returns the serialized size in bytes.
    ///
    /// For text values this includes the 2-byte length prefix.
    pub fn serialized_size(&self) -> usize {
        match self {
            Value::Int(_) => 4,
            Value::Text(s) => 2 + s.len(),
        }
    }

    /// Serializes this value to a buffer, little-endian.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError::BufferTooSmall` if the buffer is too small.
    /// Returns `SerializationError::TextTooLong` if a text value does not fit
    /// the 16-bit length prefix.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializationError> {
        match self {
            Value::Int(n) => {
                ensure_buf_len!(buf, 4);
                buf[0..4].copy_from_slice(&n.to_le_bytes());
                Ok(4)
            }
            Value::Text(s) => {
                let data = s.as_bytes();
                if data.len() > u16::MAX as usize {
                    return Err(SerializationError::TextTooLong { len: data.len() });
                }
                let required = 2 + data.len();
                ensure_buf_len!(buf, required);
                buf[0..2].copy_from_slice(&(data.len() as u16).to_le_bytes());
                buf[2..2 + data.len()].copy_from_slice(data);
                Ok(required)
            }
        }
    }

    /// Deserializes a value from a buffer given its data type.
    ///
    /// Returns the value and the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError::BufferTooSmall` if the buffer is too small.
    /// Returns `SerializationError::InvalidFormat` for malformed data.
    pub fn deserialize(buf: &[u8], ty: DataType) -> Result<(Self, usize), SerializationError> {
        match ty {
            DataType::Int => {
                ensure_buf_len!(buf, 4);
                let n = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
                Ok((Value::Int(n), 4))
            }
            DataType::Text => {
                ensure_buf_len!(buf, 2);
                let len = u16::from_le_bytes([buf[0], buf[1]]) as usize;
                let required = 2 + len;
                ensure_buf_len!(buf, required);
                let s = String::from_utf8(buf[2..2 + len].to_vec())
                    .map_err(|e| SerializationError::InvalidFormat(e.to_string()))?;
                Ok((Value::Text(s), required))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}
