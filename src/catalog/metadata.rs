//! The metadata catalog

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::CatalogError;
use super::formats::canonicalize_value;
use super::types::{VariableMetadata, VariableType};
use crate::models::Value;

/// Per-variable schema registry for a dataset
///
/// Variables are keyed by name and iterate in sorted order. When the catalog
/// is case-insensitive, names are upper-cased on insertion and on every
/// lookup. A catalog is immutable once built; projections produce new
/// catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawCatalog")]
pub struct MetadataCatalog {
    variables: BTreeMap<String, VariableMetadata>,
    case_sensitive: bool,
}

/// Saved form; keys are rebuilt from the variable names
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCatalog {
    variables: BTreeMap<String, VariableMetadata>,
    case_sensitive: bool,
}

impl TryFrom<RawCatalog> for MetadataCatalog {
    type Error = CatalogError;

    fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
        MetadataCatalog::new(raw.variables.into_values(), raw.case_sensitive)
    }
}

impl MetadataCatalog {
    /// Build a catalog, rejecting blank and duplicate names
    pub fn new<I>(variables: I, case_sensitive: bool) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = VariableMetadata>,
    {
        let mut map = BTreeMap::new();
        for mut variable in variables {
            let name = variable.name.trim();
            if name.is_empty() {
                return Err(CatalogError::BlankVariableName);
            }
            let key = if case_sensitive {
                name.to_string()
            } else {
                name.to_uppercase()
            };
            if map.contains_key(&key) {
                return Err(CatalogError::DuplicateVariable(variable.name));
            }
            variable.name = key.clone();
            map.insert(key, variable);
        }
        Ok(Self {
            variables: map,
            case_sensitive,
        })
    }

    /// Number of variables
    pub fn size(&self) -> usize {
        self.variables.len()
    }

    /// Check if the catalog has no variables
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Whether lookups are case-sensitive
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Variable names in sorted order
    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    /// Iterate over variables in sorted order
    pub fn variables(&self) -> impl Iterator<Item = &VariableMetadata> {
        self.variables.values()
    }

    /// Fold a caller-supplied name the way the catalog stores it
    pub fn normalize_name(&self, name: &str) -> String {
        if self.case_sensitive {
            name.trim().to_string()
        } else {
            name.trim().to_uppercase()
        }
    }

    /// Check if the catalog holds a variable
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(&self.normalize_name(name))
    }

    /// Look up a variable
    pub fn variable(&self, name: &str) -> Result<&VariableMetadata, CatalogError> {
        self.variables
            .get(&self.normalize_name(name))
            .ok_or_else(|| CatalogError::UnknownVariable(name.to_string()))
    }

    /// Type of a variable
    pub fn get_type(&self, name: &str) -> Result<VariableType, CatalogError> {
        let variable = self.variable(name)?;
        variable
            .variable_type()
            .ok_or_else(|| CatalogError::AmbiguousType {
                variable: variable.name.clone(),
                count: variable.flags.count(),
            })
    }

    /// Datetime format of a variable, if any
    pub fn get_datetime_format(&self, name: &str) -> Result<Option<&str>, CatalogError> {
        Ok(self.variable(name)?.datetime_format.as_deref())
    }

    /// Declared size of a variable
    pub fn variable_size(&self, name: &str) -> Result<u32, CatalogError> {
        Ok(self.variable(name)?.num_bytes)
    }

    /// Source-system type label of a variable
    pub fn type_in_source(&self, name: &str) -> Result<Option<&str>, CatalogError> {
        Ok(self.variable(name)?.type_in_source.as_deref())
    }

    /// Names of the variables whose flag for `variable_type` is set, sorted
    pub fn variables_of_type(&self, variable_type: VariableType) -> Vec<String> {
        self.variables
            .values()
            .filter(|v| v.flags.get(variable_type))
            .map(|v| v.name.clone())
            .collect()
    }

    fn has_flag(&self, name: &str, variable_type: VariableType) -> Result<bool, CatalogError> {
        Ok(self.variable(name)?.flags.get(variable_type))
    }

    /// Integer or float
    pub fn is_numeric(&self, name: &str) -> Result<bool, CatalogError> {
        Ok(self.has_flag(name, VariableType::Integer)? || self.has_flag(name, VariableType::Float)?)
    }

    pub fn is_boolean(&self, name: &str) -> Result<bool, CatalogError> {
        self.has_flag(name, VariableType::Boolean)
    }

    pub fn is_date(&self, name: &str) -> Result<bool, CatalogError> {
        self.has_flag(name, VariableType::Date)
    }

    pub fn is_time(&self, name: &str) -> Result<bool, CatalogError> {
        self.has_flag(name, VariableType::Time)
    }

    pub fn is_timestamp(&self, name: &str) -> Result<bool, CatalogError> {
        self.has_flag(name, VariableType::Timestamp)
    }

    pub fn is_text(&self, name: &str) -> Result<bool, CatalogError> {
        self.has_flag(name, VariableType::Text)
    }

    /// Project the catalog onto a subset of variables
    pub fn sub_catalog<S: AsRef<str>>(&self, names: &[S]) -> Result<MetadataCatalog, CatalogError> {
        let variables = names
            .iter()
            .map(|n| self.variable(n.as_ref()).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        MetadataCatalog::new(variables, self.case_sensitive)
    }

    /// One entry per variable, in sorted order: exactly one type, plus a
    /// format when temporal
    pub fn completeness_check(&self) -> Vec<bool> {
        self.variables.values().map(|v| v.is_complete()).collect()
    }

    /// Names of the variables failing the completeness check
    pub fn incomplete_variables(&self) -> Vec<String> {
        self.variables
            .values()
            .filter(|v| !v.is_complete())
            .map(|v| v.name.clone())
            .collect()
    }

    /// Fail naming every incomplete variable
    pub fn ensure_complete(&self) -> Result<(), CatalogError> {
        let variables = self.incomplete_variables();
        if variables.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Incomplete { variables })
        }
    }

    /// Variables whose presence or type differs between two catalogs
    ///
    /// Names are upper-cased for the comparison unless both catalogs are
    /// case-sensitive.
    pub fn schema_differences(&self, other: &MetadataCatalog) -> Vec<String> {
        let fold = !(self.case_sensitive && other.case_sensitive);
        let types = |catalog: &MetadataCatalog| -> BTreeMap<String, Option<VariableType>> {
            catalog
                .variables
                .values()
                .map(|v| {
                    let name = if fold { v.name.to_uppercase() } else { v.name.clone() };
                    (name, v.variable_type())
                })
                .collect()
        };
        let ours = types(self);
        let theirs = types(other);

        let mut differences: Vec<String> = ours
            .iter()
            .filter(|(name, t)| theirs.get(*name) != Some(*t))
            .map(|(name, _)| name.clone())
            .collect();
        differences.extend(theirs.keys().filter(|name| !ours.contains_key(*name)).cloned());
        differences.sort();
        differences
    }

    /// Load a catalog saved with [`MetadataCatalog::to_json`]
    pub fn from_json(json_content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_content)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Convert raw values to the canonical representation of a temporal
    /// variable
    ///
    /// Values of non-temporal variables are returned unchanged. Values that
    /// do not match the variable's format become `Value::Null`.
    pub fn format_datetime_data(
        &self,
        name: &str,
        values: Vec<Value>,
    ) -> Result<Vec<Value>, CatalogError> {
        let variable_type = self.get_type(name)?;
        if !variable_type.is_temporal() {
            return Ok(values);
        }
        let format = self
            .get_datetime_format(name)?
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| CatalogError::MissingDatetimeFormat(name.to_string()))?
            .to_string();

        let mut unparsed = 0usize;
        let converted: Vec<Value> = values
            .into_iter()
            .map(|value| {
                let was_null = value.is_null();
                let result = canonicalize_value(value, variable_type, &format);
                if result.is_null() && !was_null {
                    unparsed += 1;
                }
                result
            })
            .collect();
        if unparsed > 0 {
            warn!(
                variable = name,
                format = %format,
                unparsed,
                "Values did not match the datetime format and were set to missing"
            );
        }
        Ok(converted)
    }
}
