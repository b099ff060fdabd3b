//! Variable types and per-variable metadata

use std::fmt;

use serde::{Deserialize, Serialize};

/// The seven variable types a catalog knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    /// True/false flags
    Boolean,
    /// Whole numbers
    Integer,
    /// Floating point numbers
    Float,
    /// Calendar dates
    Date,
    /// Times of day
    Time,
    /// Dates with a time of day
    Timestamp,
    /// Character data
    Text,
}

impl VariableType {
    /// All types, in flag order
    pub const ALL: [VariableType; 7] = [
        VariableType::Boolean,
        VariableType::Integer,
        VariableType::Float,
        VariableType::Date,
        VariableType::Time,
        VariableType::Timestamp,
        VariableType::Text,
    ];

    /// Check if values of this type need a datetime format
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            VariableType::Date | VariableType::Time | VariableType::Timestamp
        )
    }

    /// Check if this is an integer or float type
    pub fn is_numeric(&self) -> bool {
        matches!(self, VariableType::Integer | VariableType::Float)
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableType::Boolean => write!(f, "boolean"),
            VariableType::Integer => write!(f, "integer"),
            VariableType::Float => write!(f, "float"),
            VariableType::Date => write!(f, "date"),
            VariableType::Time => write!(f, "time"),
            VariableType::Timestamp => write!(f, "timestamp"),
            VariableType::Text => write!(f, "text"),
        }
    }
}

impl std::str::FromStr for VariableType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "boolean" => Ok(VariableType::Boolean),
            "integer" => Ok(VariableType::Integer),
            "float" => Ok(VariableType::Float),
            "date" => Ok(VariableType::Date),
            "time" => Ok(VariableType::Time),
            "timestamp" => Ok(VariableType::Timestamp),
            "text" => Ok(VariableType::Text),
            _ => Err(format!(
                "Invalid variable type: {}. Expected: boolean, integer, float, date, time, timestamp, text",
                s
            )),
        }
    }
}

/// One flag per variable type
///
/// A well-formed variable has exactly one flag set. Dictionaries classify
/// each flag independently, so zero or several flags can occur and are
/// reported by the catalog's completeness check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeFlags {
    pub is_boolean: bool,
    pub is_integer: bool,
    pub is_float: bool,
    pub is_date: bool,
    pub is_time: bool,
    pub is_timestamp: bool,
    pub is_text: bool,
}

impl TypeFlags {
    /// Flags with only `variable_type` set
    pub fn of(variable_type: VariableType) -> Self {
        let mut flags = Self::default();
        flags.set(variable_type, true);
        flags
    }

    /// Read one flag
    pub fn get(&self, variable_type: VariableType) -> bool {
        match variable_type {
            VariableType::Boolean => self.is_boolean,
            VariableType::Integer => self.is_integer,
            VariableType::Float => self.is_float,
            VariableType::Date => self.is_date,
            VariableType::Time => self.is_time,
            VariableType::Timestamp => self.is_timestamp,
            VariableType::Text => self.is_text,
        }
    }

    /// Write one flag
    pub fn set(&mut self, variable_type: VariableType, value: bool) {
        let flag = match variable_type {
            VariableType::Boolean => &mut self.is_boolean,
            VariableType::Integer => &mut self.is_integer,
            VariableType::Float => &mut self.is_float,
            VariableType::Date => &mut self.is_date,
            VariableType::Time => &mut self.is_time,
            VariableType::Timestamp => &mut self.is_timestamp,
            VariableType::Text => &mut self.is_text,
        };
        *flag = value;
    }

    /// Number of flags set
    pub fn count(&self) -> usize {
        VariableType::ALL.iter().filter(|t| self.get(**t)).count()
    }

    /// The type, when exactly one flag is set
    pub fn single(&self) -> Option<VariableType> {
        let mut set = VariableType::ALL.iter().filter(|t| self.get(**t));
        match (set.next(), set.next()) {
            (Some(t), None) => Some(*t),
            _ => None,
        }
    }
}

/// Metadata for one variable of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableMetadata {
    /// Variable name
    pub name: String,
    /// Type flags
    pub flags: TypeFlags,
    /// Declared size in bytes (characters for text)
    pub num_bytes: u32,
    /// Canonical datetime format, required for temporal types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime_format: Option<String>,
    /// Type label in the system the metadata came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_in_source: Option<String>,
}

impl VariableMetadata {
    /// Create metadata for a variable of a single type
    pub fn new(name: impl Into<String>, variable_type: VariableType) -> Self {
        Self::with_flags(name, TypeFlags::of(variable_type))
    }

    /// Create metadata from raw type flags
    pub fn with_flags(name: impl Into<String>, flags: TypeFlags) -> Self {
        Self {
            name: name.into(),
            flags,
            num_bytes: 0,
            datetime_format: None,
            type_in_source: None,
        }
    }

    /// Set the declared size
    pub fn num_bytes(mut self, num_bytes: u32) -> Self {
        self.num_bytes = num_bytes;
        self
    }

    /// Set the canonical datetime format
    pub fn datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = Some(format.into());
        self
    }

    /// Set the source-system type label
    pub fn type_in_source(mut self, label: impl Into<String>) -> Self {
        self.type_in_source = Some(label.into());
        self
    }

    /// The variable's type, when exactly one flag is set
    pub fn variable_type(&self) -> Option<VariableType> {
        self.flags.single()
    }

    /// Exactly one type, and a non-empty format if that type is temporal
    pub fn is_complete(&self) -> bool {
        match self.variable_type() {
            Some(t) if t.is_temporal() => self
                .datetime_format
                .as_deref()
                .is_some_and(|f| !f.trim().is_empty()),
            Some(_) => true,
            None => false,
        }
    }
}
