use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A typed parameter value.
///
/// On the wire values travel as a [`RawParameterValue`]: a numeric `type`
/// discriminant plus one populated field per kind. Conversion between the two
/// forms goes through [`ParameterValue::from_raw`] and [`ParameterValue::to_raw`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameterValue", into = "RawParameterValue")]
pub enum ParameterValue {
    NotSet,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    ByteArray(Vec<u8>),
    BoolArray(Vec<bool>),
    IntegerArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterValueError {
    #[error("unknown parameter type discriminant {0}")]
    UnknownType(u8),
}

/// Discriminated wire form of a parameter value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawParameterValue {
    #[serde(rename = "type")]
    pub type_id: u8,
    pub bool_value: bool,
    pub integer_value: i64,
    pub double_value: f64,
    pub string_value: String,
    pub byte_array_value: Vec<u8>,
    pub bool_array_value: Vec<bool>,
    pub integer_array_value: Vec<i64>,
    pub double_array_value: Vec<f64>,
    pub string_array_value: Vec<String>,
}

impl ParameterValue {
    pub const NOT_SET: u8 = 0;
    pub const BOOL: u8 = 1;
    pub const INTEGER: u8 = 2;
    pub const DOUBLE: u8 = 3;
    pub const STRING: u8 = 4;
    pub const BYTE_ARRAY: u8 = 5;
    pub const BOOL_ARRAY: u8 = 6;
    pub const INTEGER_ARRAY: u8 = 7;
    pub const DOUBLE_ARRAY: u8 = 8;
    pub const STRING_ARRAY: u8 = 9;

    /// Wire discriminant of this value
    pub fn type_id(&self) -> u8 {
        match self {
            ParameterValue::NotSet => Self::NOT_SET,
            ParameterValue::Bool(_) => Self::BOOL,
            ParameterValue::Integer(_) => Self::INTEGER,
            ParameterValue::Double(_) => Self::DOUBLE,
            ParameterValue::String(_) => Self::STRING,
            ParameterValue::ByteArray(_) => Self::BYTE_ARRAY,
            ParameterValue::BoolArray(_) => Self::BOOL_ARRAY,
            ParameterValue::IntegerArray(_) => Self::INTEGER_ARRAY,
            ParameterValue::DoubleArray(_) => Self::DOUBLE_ARRAY,
            ParameterValue::StringArray(_) => Self::STRING_ARRAY,
        }
    }

    /// Select the populated field of a raw value according to its discriminant
    pub fn from_raw(raw: &RawParameterValue) -> Result<Self, ParameterValueError> {
        let value = match raw.type_id {
            Self::NOT_SET => ParameterValue::NotSet,
            Self::BOOL => ParameterValue::Bool(raw.bool_value),
            Self::INTEGER => ParameterValue::Integer(raw.integer_value),
            Self::DOUBLE => ParameterValue::Double(raw.double_value),
            Self::STRING => ParameterValue::String(raw.string_value.clone()),
            Self::BYTE_ARRAY => ParameterValue::ByteArray(raw.byte_array_value.clone()),
            Self::BOOL_ARRAY => ParameterValue::BoolArray(raw.bool_array_value.clone()),
            Self::INTEGER_ARRAY => ParameterValue::IntegerArray(raw.integer_array_value.clone()),
            Self::DOUBLE_ARRAY => ParameterValue::DoubleArray(raw.double_array_value.clone()),
            Self::STRING_ARRAY => ParameterValue::StringArray(raw.string_array_value.clone()),
            other => return Err(ParameterValueError::UnknownType(other)),
        };
        Ok(value)
    }

    pub fn to_raw(&self) -> RawParameterValue {
        let mut raw = RawParameterValue {
            type_id: self.type_id(),
            ..RawParameterValue::default()
        };
        match self {
            ParameterValue::NotSet => {}
            ParameterValue::Bool(v) => raw.bool_value = *v,
            ParameterValue::Integer(v) => raw.integer_value = *v,
            ParameterValue::Double(v) => raw.double_value = *v,
            ParameterValue::String(v) => raw.string_value = v.clone(),
            ParameterValue::ByteArray(v) => raw.byte_array_value = v.clone(),
            ParameterValue::BoolArray(v) => raw.bool_array_value = v.clone(),
            ParameterValue::IntegerArray(v) => raw.integer_array_value = v.clone(),
            ParameterValue::DoubleArray(v) => raw.double_array_value = v.clone(),
            ParameterValue::StringArray(v) => raw.string_array_value = v.clone(),
        }
        raw
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, ParameterValue::NotSet)
    }
}

impl TryFrom<RawParameterValue> for ParameterValue {
    type Error = ParameterValueError;

    fn try_from(raw: RawParameterValue) -> Result<Self, Self::Error> {
        ParameterValue::from_raw(&raw)
    }
}

impl From<ParameterValue> for RawParameterValue {
    fn from(value: ParameterValue) -> Self {
        value.to_raw()
    }
}

fn write_list<T, F>(f: &mut fmt::Formatter<'_>, items: &[T], mut item: F) -> fmt::Result
where
    F: FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
{
    write!(f, "[")?;
    for (i, value) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        item(f, value)?;
    }
    write!(f, "]")
}

/// Command-line form. Doubles always keep a fractional part and array strings
/// are quoted so the value parses back to the same type.
impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::NotSet => Ok(()),
            ParameterValue::Bool(v) => write!(f, "{}", v),
            ParameterValue::Integer(v) => write!(f, "{}", v),
            ParameterValue::Double(v) => write!(f, "{:?}", v),
            ParameterValue::String(v) => write!(f, "{}", v),
            ParameterValue::ByteArray(v) => write_list(f, v, |f, b| write!(f, "{}", b)),
            ParameterValue::BoolArray(v) => write_list(f, v, |f, b| write!(f, "{}", b)),
            ParameterValue::IntegerArray(v) => write_list(f, v, |f, i| write!(f, "{}", i)),
            ParameterValue::DoubleArray(v) => write_list(f, v, |f, d| write!(f, "{:?}", d)),
            ParameterValue::StringArray(v) => write_list(f, v, |f, s| {
                let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
                write!(f, "{}", quoted)
            }),
        }
    }
}

/// Named parameter as carried by components and parameter profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: ParameterValue,
}

impl Parameter {
    pub fn new<S: Into<String>>(name: S, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
