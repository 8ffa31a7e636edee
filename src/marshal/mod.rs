//! Type Marshaling Library
//!
//! Converts JSON-shaped test values into a language-neutral [`Marshaled`]
//! form, driven by the explicit semantic type tag declared for each
//! parameter. Emitters in [`crate::synth`] turn a `Marshaled` value into a
//! target-language literal; [`canonical`] renders values back to the
//! canonical text the verdict engine compares.
//!
//! Type tags are never guessed from parameter names: a list of one-character
//! strings is a `charArray` only when the problem author says so.

pub mod canonical;
pub mod structures;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub use canonical::{canonical_text, expected_text, format_float};
pub use structures::{BinaryTree, LinkedList, TRAVERSAL_LIMIT};

/// Semantic type tag of a parameter or return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    /// Integer or floating point scalar
    Number,
    /// true / false
    Boolean,
    /// Text
    String,
    /// Numeric list; a list of lists is reinterpreted as a matrix
    Array,
    /// List of strings
    StringArray,
    /// List of single characters
    CharArray,
    /// Numeric 2D array
    Matrix,
    /// Numeric 2D array of coordinate pairs
    Points,
    /// 2D array of single characters
    CharGrid,
    /// Singly linked list given as its ordered values
    LinkedList,
    /// Binary tree given in level order with `null` for absent nodes
    BinaryTree,
}

impl ValueType {
    /// Tag used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::StringArray => "stringArray",
            ValueType::CharArray => "charArray",
            ValueType::Matrix => "2dArray",
            ValueType::Points => "points",
            ValueType::CharGrid => "charGrid",
            ValueType::LinkedList => "linkedlist",
            ValueType::BinaryTree => "binarytree",
        }
    }

    /// Whether values of this type are pointer structures the harness must
    /// build, flatten and free
    pub fn is_structure(&self) -> bool {
        matches!(self, ValueType::LinkedList | ValueType::BinaryTree)
    }
}

impl std::str::FromStr for ValueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some((value_type, _)) = numeric_tag(s) {
            return Ok(value_type);
        }
        match s.trim().to_lowercase().as_str() {
            "number" => Ok(ValueType::Number),
            "boolean" | "bool" => Ok(ValueType::Boolean),
            "string" | "str" => Ok(ValueType::String),
            "array" | "list" => Ok(ValueType::Array),
            "stringarray" => Ok(ValueType::StringArray),
            "chararray" => Ok(ValueType::CharArray),
            "2darray" | "matrix" => Ok(ValueType::Matrix),
            "points" => Ok(ValueType::Points),
            "chargrid" => Ok(ValueType::CharGrid),
            "linkedlist" => Ok(ValueType::LinkedList),
            "binarytree" | "tree" => Ok(ValueType::BinaryTree),
            _ => Err(Error::Synthesis(format!("Unknown parameter type: {}", s))),
        }
    }
}

impl TryFrom<String> for ValueType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Split a width-bearing numeric tag into its shape and element width.
///
/// `int`, `long` and `double` name a scalar; a `[]` suffix makes it a list
/// and `[][]` a matrix. Other tags carry no width.
pub fn numeric_tag(tag: &str) -> Option<(ValueType, NumKind)> {
    let tag = tag.trim().to_lowercase();
    let (base, value_type) = match (tag.strip_suffix("[][]"), tag.strip_suffix("[]")) {
        (Some(base), _) => (base, ValueType::Matrix),
        (None, Some(base)) => (base, ValueType::Array),
        (None, None) => (tag.as_str(), ValueType::Number),
    };
    let kind = match base {
        "int" | "integer" => NumKind::Int32,
        "long" => NumKind::Int64,
        "float" | "double" => NumKind::Float,
        _ => return None,
    };
    Some((value_type, kind))
}

/// A JSON number split into its integral or floating form
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn from_json(value: &Value) -> Option<Num> {
        let number = value.as_number()?;
        if let Some(i) = number.as_i64() {
            Some(Num::Int(i))
        } else {
            number.as_f64().map(Num::Float)
        }
    }
}

/// Narrowest native numeric type able to hold a set of numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumKind {
    Int32,
    Int64,
    Float,
}

impl NumKind {
    pub fn of(num: &Num) -> NumKind {
        match num {
            Num::Int(i) if i32::try_from(*i).is_ok() => NumKind::Int32,
            Num::Int(_) => NumKind::Int64,
            Num::Float(_) => NumKind::Float,
        }
    }

    /// Widest kind among `nums`; `None` for no numbers
    pub fn widest<'a>(nums: impl IntoIterator<Item = &'a Num>) -> Option<NumKind> {
        nums.into_iter().map(NumKind::of).max()
    }

    /// Scalar name used in width-bearing tags
    pub fn tag_name(&self) -> &'static str {
        match self {
            NumKind::Int32 => "int",
            NumKind::Int64 => "long",
            NumKind::Float => "double",
        }
    }
}

/// Language-neutral, shape-checked test value
#[derive(Debug, Clone, PartialEq)]
pub enum Marshaled {
    Number(Num),
    Boolean(bool),
    Str(String),
    NumberList(Vec<Num>),
    StringList(Vec<String>),
    CharList(Vec<char>),
    NumberMatrix(Vec<Vec<Num>>),
    CharMatrix(Vec<Vec<char>>),
    LinkedList(Vec<i64>),
    Tree(Vec<Option<i64>>),
}

impl Marshaled {
    /// Widest numeric kind the value holds; `None` for non-numeric or empty values
    pub fn num_kind(&self) -> Option<NumKind> {
        match self {
            Marshaled::Number(num) => Some(NumKind::of(num)),
            Marshaled::NumberList(nums) => NumKind::widest(nums),
            Marshaled::NumberMatrix(rows) => NumKind::widest(rows.iter().flatten()),
            _ => None,
        }
    }
}

/// Check `value` against `value_type` and convert it
pub fn marshal(value: &Value, value_type: ValueType) -> Result<Marshaled> {
    match value_type {
        ValueType::Number => Num::from_json(value)
            .map(Marshaled::Number)
            .ok_or_else(|| mismatch(value, value_type)),
        ValueType::Boolean => value
            .as_bool()
            .map(Marshaled::Boolean)
            .ok_or_else(|| mismatch(value, value_type)),
        ValueType::String => value
            .as_str()
            .map(|s| Marshaled::Str(s.to_string()))
            .ok_or_else(|| mismatch(value, value_type)),
        ValueType::Array => {
            let items = as_array(value, value_type)?;
            if !items.is_empty() && items.iter().all(Value::is_array) {
                number_matrix(items, value_type).map(Marshaled::NumberMatrix)
            } else {
                number_list(items, value_type).map(Marshaled::NumberList)
            }
        }
        ValueType::Matrix | ValueType::Points => {
            number_matrix(as_array(value, value_type)?, value_type).map(Marshaled::NumberMatrix)
        }
        ValueType::StringArray => as_array(value, value_type)?
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| mismatch(item, value_type))
            })
            .collect::<Result<Vec<_>>>()
            .map(Marshaled::StringList),
        ValueType::CharArray => match value {
            Value::String(s) => Ok(Marshaled::CharList(s.chars().collect())),
            _ => char_list(as_array(value, value_type)?, value_type).map(Marshaled::CharList),
        },
        ValueType::CharGrid => as_array(value, value_type)?
            .iter()
            .map(|row| char_list(as_array(row, value_type)?, value_type))
            .collect::<Result<Vec<_>>>()
            .map(Marshaled::CharMatrix),
        ValueType::LinkedList => match value {
            Value::Null => Ok(Marshaled::LinkedList(Vec::new())),
            _ => as_array(value, value_type)?
                .iter()
                .map(|item| item.as_i64().ok_or_else(|| mismatch(item, value_type)))
                .collect::<Result<Vec<_>>>()
                .map(Marshaled::LinkedList),
        },
        ValueType::BinaryTree => match value {
            Value::Null => Ok(Marshaled::Tree(Vec::new())),
            _ => as_array(value, value_type)?
                .iter()
                .map(|item| match item {
                    Value::Null => Ok(None),
                    _ => item.as_i64().map(Some).ok_or_else(|| mismatch(item, value_type)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Marshaled::Tree),
        },
    }
}

fn mismatch(value: &Value, value_type: ValueType) -> Error {
    Error::Marshal(format!("{} is not a valid {}", value, value_type))
}

fn as_array(value: &Value, value_type: ValueType) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| mismatch(value, value_type))
}

fn number_list(items: &[Value], value_type: ValueType) -> Result<Vec<Num>> {
    items
        .iter()
        .map(|item| Num::from_json(item).ok_or_else(|| mismatch(item, value_type)))
        .collect()
}

fn number_matrix(rows: &[Value], value_type: ValueType) -> Result<Vec<Vec<Num>>> {
    rows.iter()
        .map(|row| number_list(as_array(row, value_type)?, value_type))
        .collect()
}

fn char_list(items: &[Value], value_type: ValueType) -> Result<Vec<char>> {
    items
        .iter()
        .map(|item| {
            let mut chars = item.as_str().map(str::chars).ok_or_else(|| mismatch(item, value_type))?;
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(mismatch(item, value_type)),
            }
        })
        .collect()
}
