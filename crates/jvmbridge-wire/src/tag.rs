//! Single-byte type tags.
//!
//! Every value on the wire is preceded by one ASCII byte naming its kind.
//! The alphabet is fixed: the remote decoder dispatches on exactly these
//! bytes, so adding or renumbering a tag is a protocol break.

use std::fmt;

use crate::error::{Result, WireError};

/// Wire-level kind of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    Null = b'n',
    Int32 = b'i',
    Int64 = b'g',
    String = b'c',
    Bool = b'b',
    Double = b'd',
    Single = b'f',
    Date = b'D',
    Timestamp = b't',
    ObjectHandle = b'j',
    ByteBuffer = b'r',
    DoubleArrayOfArrays = b'A',
    SingleArrayOfArrays = b'F',
    HomogeneousArray = b'l',
    AssociativeMap = b'e',
    RowSequence = b'R',
    ObjectArray = b'O',
    GenericSequence = b'o',
    RowRecord = b's',
}

/// Every registered tag, in registry order.
pub const REGISTRY: [TypeTag; 19] = [
    TypeTag::Null,
    TypeTag::Int32,
    TypeTag::Int64,
    TypeTag::String,
    TypeTag::Bool,
    TypeTag::Double,
    TypeTag::Single,
    TypeTag::Date,
    TypeTag::Timestamp,
    TypeTag::ObjectHandle,
    TypeTag::ByteBuffer,
    TypeTag::DoubleArrayOfArrays,
    TypeTag::SingleArrayOfArrays,
    TypeTag::HomogeneousArray,
    TypeTag::AssociativeMap,
    TypeTag::RowSequence,
    TypeTag::ObjectArray,
    TypeTag::GenericSequence,
    TypeTag::RowRecord,
];

impl TypeTag {
    /// The byte written on the wire for this kind.
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Look up the kind registered for `byte`.
    pub fn from_byte(byte: u8) -> Result<Self> {
        let tag = match byte {
            b'n' => Self::Null,
            b'i' => Self::Int32,
            b'g' => Self::Int64,
            b'c' => Self::String,
            b'b' => Self::Bool,
            b'd' => Self::Double,
            b'f' => Self::Single,
            b'D' => Self::Date,
            b't' => Self::Timestamp,
            b'j' => Self::ObjectHandle,
            b'r' => Self::ByteBuffer,
            b'A' => Self::DoubleArrayOfArrays,
            b'F' => Self::SingleArrayOfArrays,
            b'l' => Self::HomogeneousArray,
            b'e' => Self::AssociativeMap,
            b'R' => Self::RowSequence,
            b'O' => Self::ObjectArray,
            b'o' => Self::GenericSequence,
            b's' => Self::RowRecord,
            other => return Err(WireError::UnknownTag(other)),
        };
        Ok(tag)
    }

    /// Human-readable name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Double => "double",
            Self::Single => "single",
            Self::Date => "date",
            Self::Timestamp => "timestamp",
            Self::ObjectHandle => "object-handle",
            Self::ByteBuffer => "byte-buffer",
            Self::DoubleArrayOfArrays => "double-array-of-arrays",
            Self::SingleArrayOfArrays => "single-array-of-arrays",
            Self::HomogeneousArray => "array",
            Self::AssociativeMap => "map",
            Self::RowSequence => "row-sequence",
            Self::ObjectArray => "object-array",
            Self::GenericSequence => "generic-sequence",
            Self::RowRecord => "row",
        }
    }

    /// Returns true for kinds that may serve as associative-map keys.
    pub fn is_map_key(self) -> bool {
        matches!(
            self,
            Self::Int32
                | Self::Int64
                | Self::String
                | Self::Bool
                | Self::Double
                | Self::Single
                | Self::Date
                | Self::Timestamp
                | Self::ObjectHandle
        )
    }
}

impl TryFrom<u8> for TypeTag {
    type Error = WireError;

    fn try_from(byte: u8) -> Result<Self> {
        Self::from_byte(byte)
    }
}

impl From<TypeTag> for u8 {
    fn from(tag: TypeTag) -> Self {
        tag.byte()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ('{}')", self.name(), self.byte() as char)
    }
}

/// Wire byte for `kind`.
pub fn tag_for(kind: TypeTag) -> u8 {
    kind.byte()
}

/// Kind registered for `byte`, or `UnknownTag`.
pub fn kind_for(byte: u8) -> Result<TypeTag> {
    TypeTag::from_byte(byte)
}
