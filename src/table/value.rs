//! Cell values
//!
//! A `Value` is what one cell of a record set holds. Values read from a file
//! start out as `Str` (or `Missing` for an empty cell) and only become typed
//! through validation, which coerces them against the schema's column types.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::schema::ColumnType;

/// A single row, keyed by column name.
pub type Record = BTreeMap<String, Value>;

/// Cell value
#[derive(Debug, Clone)]
pub enum Value {
    /// Empty cell
    Missing,
    /// UTF-8 text
    Str(String),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// Boolean
    Bool(bool),
    /// List of strings
    List(Vec<String>),
}

impl Value {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Str(_) => "string",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// True for a missing cell or an empty list.
    pub fn is_empty_like(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Builds a value from the raw text of a file cell.
    pub fn from_cell(cell: &str) -> Self {
        if cell.is_empty() {
            Value::Missing
        } else {
            Value::Str(cell.to_string())
        }
    }

    /// Renders the value as the text of a file cell.
    pub fn to_cell(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::List(items) => {
                serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
            }
        }
    }

    /// Coerces the value to a column type.
    ///
    /// `Missing` passes through unchanged, and so does an empty string, which
    /// becomes `Missing` as it would after a save and reload. Required/default
    /// handling belongs to the caller. The error string describes what was
    /// found.
    pub fn coerce(&self, column_type: ColumnType) -> Result<Value, String> {
        match self {
            Value::Missing => return Ok(Value::Missing),
            Value::Str(s) if s.is_empty() => return Ok(Value::Missing),
            _ => {}
        }

        let mismatch = || Err(format!("{} '{}'", self.type_name(), self.to_cell()));

        match column_type {
            ColumnType::String => match self {
                Value::Str(_) => Ok(self.clone()),
                _ => mismatch(),
            },
            ColumnType::Int => match self {
                Value::Int(_) => Ok(self.clone()),
                Value::Float(f) => match whole_to_int(*f) {
                    Some(i) => Ok(Value::Int(i)),
                    None => mismatch(),
                },
                Value::Str(s) => {
                    let trimmed = s.trim();
                    if let Ok(i) = trimmed.parse::<i64>() {
                        return Ok(Value::Int(i));
                    }
                    // Integer text that did not parse is out of range; going
                    // through f64 would round it back in
                    let digits = trimmed.strip_prefix(&['+', '-'][..]).unwrap_or(trimmed);
                    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                        return mismatch();
                    }
                    match trimmed.parse::<f64>().ok().and_then(whole_to_int) {
                        Some(i) => Ok(Value::Int(i)),
                        None => mismatch(),
                    }
                }
                _ => mismatch(),
            },
            ColumnType::Float => match self {
                Value::Float(_) => Ok(self.clone()),
                Value::Int(i) => Ok(Value::Float(*i as f64)),
                Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).or_else(|_| mismatch()),
                _ => mismatch(),
            },
            ColumnType::Bool => match self {
                Value::Bool(_) => Ok(self.clone()),
                Value::Int(0) => Ok(Value::Bool(false)),
                Value::Int(1) => Ok(Value::Bool(true)),
                Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
                    "false" | "f" | "no" | "n" | "0" => Ok(Value::Bool(false)),
                    _ => mismatch(),
                },
                _ => mismatch(),
            },
            ColumnType::List => match self {
                Value::List(_) => Ok(self.clone()),
                Value::Str(s) => parse_list_literal(s).map(Value::List).ok_or_else(|| {
                    format!("{} '{}'", self.type_name(), s)
                }),
                _ => mismatch(),
            },
        }
    }

    /// Converts a JSON value (schema defaults, config files).
    pub fn from_json(json: &serde_json::Value) -> Result<Value, String> {
        match json {
            serde_json::Value::Null => Ok(Value::Missing),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else {
                    n.as_f64()
                        .map(Value::Float)
                        .ok_or_else(|| format!("unrepresentable number {}", n))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(json_list_item)
                .collect::<Option<Vec<_>>>()
                .map(Value::List)
                .ok_or_else(|| "list items must be strings or numbers".to_string()),
            serde_json::Value::Object(_) => Err("objects are not valid cell values".to_string()),
        }
    }

    /// Converts to JSON (schema serialization).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Missing => serde_json::Value::Null,
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => serde_json::Value::from(items.clone()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Missing => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Float(_) => 3,
            Value::Str(_) => 4,
            Value::List(_) => 5,
        }
    }
}

fn json_list_item(item: &serde_json::Value) -> Option<String> {
    match item {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Exact integer value of a whole float within the `i64` range.
fn whole_to_int(f: f64) -> Option<i64> {
    // 2^63; `i64::MAX as f64` rounds up to it, so the upper bound is exclusive
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f.fract() == 0.0 && f >= -LIMIT && f < LIMIT {
        Some(f as i64)
    } else {
        None
    }
}

/// Parses a list cell: a JSON array, or a list literal whose items use
/// either quote style, such as `['anat', "it's"]`.
fn parse_list_literal(text: &str) -> Option<Vec<String>> {
    let trimmed = text.trim();
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;

    if let Ok(parsed) = serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
        return parsed.iter().map(json_list_item).collect();
    }
    parse_quoted_items(inner)
}

/// Comma-separated items, each quoted with `'` or `"` (backslash escapes
/// allowed) or a bare number. A trailing comma is accepted.
fn parse_quoted_items(inner: &str) -> Option<Vec<String>> {
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            // Empty list, or a trailing comma
            return Some(items);
        };

        let item = if first == '\'' || first == '"' {
            chars.next();
            let mut item = String::new();
            loop {
                match chars.next()? {
                    '\\' => match chars.next()? {
                        'n' => item.push('\n'),
                        't' => item.push('\t'),
                        escaped => item.push(escaped),
                    },
                    c if c == first => break,
                    c => item.push(c),
                }
            }
            item
        } else {
            let mut bare = String::new();
            while let Some(c) = chars.next_if(|c| *c != ',') {
                bare.push(c);
            }
            let bare = bare.trim().to_string();
            bare.parse::<f64>().ok()?;
            bare
        };
        items.push(item);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => return Some(items),
            Some(',') => continue,
            Some(_) => return None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Missing, Value::Missing) => Ordering::Equal,
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Missing => {}
            Value::Str(s) => s.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::List(items) => items.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cell())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(String::from).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Missing, Into::into)
    }
}

/// Builds a [`Record`] from `column => value` pairs.
///
/// ```ignore
/// let row = record! { "participant_id" => "01", "visit_id" => "BL" };
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::table::Record::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::table::Record::new();
        $(
            record.insert(
                ::std::string::String::from($column),
                $crate::table::Value::from($value),
            );
        )+
        record
    }};
}
