//! Record-related types for the deposit dashboard
//!
//! Every entity the dashboard shows (users, KYC submissions, products,
//! contracts, partner clients) arrives as a flat field → value mapping.
//! There is no enforced schema: localized amounts such as `"€50.000"` and
//! percentages such as `"9,00%"` stay text until a query interprets them.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Free text, ISO dates, localized currency and percent strings
    Text(String),
    /// A number delivered as a number (JSON numbers)
    Number(Decimal),
    /// A boolean flag
    Bool(bool),
    /// Missing or explicit null
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Base-10 display form. Numbers are normalized so `12.00` prints as `12`,
/// which is what free-text search matches against.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Number(number) => write!(f, "{}", number.normalize()),
            Value::Bool(flag) => write!(f, "{}", flag),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Decimal> for Value {
    fn from(number: Decimal) -> Self {
        Value::Number(number)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Number(Decimal::from(number))
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Value::Number(Decimal::from(number))
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(flag) => Value::Bool(flag),
            serde_json::Value::Number(number) => {
                let text = number.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(Value::Number)
                    .unwrap_or(Value::Text(text))
            }
            serde_json::Value::String(text) => Value::Text(text),
            // Nested structures are opaque to the dashboard
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Text(text) => serde_json::Value::String(text.clone()),
            Value::Number(number) => serde_json::Value::from_str(&number.normalize().to_string())
                .unwrap_or_else(|_| serde_json::Value::String(number.to_string())),
            Value::Bool(flag) => serde_json::Value::Bool(*flag),
            Value::Null => serde_json::Value::Null,
        }
    }
}

/// One entity instance as a flat field → value mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Look up a field; absent fields read as `None`
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The `id` field rendered as text, if present and non-null
    pub fn id(&self) -> Option<String> {
        self.get("id")
            .filter(|value| !value.is_null())
            .map(|value| value.to_string())
    }

    /// Merge `changes` over this record, field by field
    pub fn apply(&mut self, changes: &Record) {
        for (field, value) in &changes.fields {
            self.fields.insert(field.clone(), value.clone());
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A homogeneous list of records plus the column order they arrived in
///
/// The column order is only used for output; lookups go through [`Record`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Collection {
    /// Build a collection, inferring column order from first appearance
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for (field, _) in record.fields() {
                if !columns.iter().any(|c| c == field) {
                    columns.push(field.to_string());
                }
            }
        }
        Collection { columns, records }
    }

    /// Build a collection whose columns start with a known header
    ///
    /// Fields that appear in records but not in the header are appended.
    pub fn with_header(header: Vec<String>, records: Vec<Record>) -> Self {
        let inferred = Self::from_records(records);
        let mut columns = header;
        for column in inferred.columns {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        Collection {
            columns,
            records: inferred.records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
