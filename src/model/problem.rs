//! Problem catalog records
//!
//! Problems are authored by an external collaborator; the worker only reads
//! the test cases and the function signature.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::marshal::{numeric_tag, NumKind, ValueType};

/// Problem difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            other => Err(Error::InvalidProblem(format!("unknown difficulty '{}'", other))),
        }
    }
}

/// One declared parameter of the entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterSpec", into = "ParameterSpec")]
pub struct Parameter {
    pub name: String,
    pub value_type: ValueType,
    /// Element width named by the tag (`int`, `long[]`, `double[][]`)
    pub width: Option<NumKind>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Parameter {
            name: name.into(),
            value_type,
            width: None,
        }
    }

    /// The tag this parameter is written with
    pub fn tag(&self) -> String {
        match (self.width, self.value_type) {
            (Some(kind), ValueType::Number) => kind.tag_name().to_string(),
            (Some(kind), ValueType::Array) => format!("{}[]", kind.tag_name()),
            (Some(kind), ValueType::Matrix) => format!("{}[][]", kind.tag_name()),
            _ => self.value_type.to_string(),
        }
    }
}

/// Wire form of a parameter
#[derive(Serialize, Deserialize)]
struct ParameterSpec {
    name: String,
    #[serde(rename = "type")]
    tag: String,
}

impl TryFrom<ParameterSpec> for Parameter {
    type Error = Error;

    fn try_from(spec: ParameterSpec) -> Result<Self> {
        Ok(Parameter {
            value_type: spec.tag.parse()?,
            width: numeric_tag(&spec.tag).map(|(_, kind)| kind),
            name: spec.name,
        })
    }
}

impl From<Parameter> for ParameterSpec {
    fn from(param: Parameter) -> Self {
        ParameterSpec {
            tag: param.tag(),
            name: param.name,
        }
    }
}

/// Entry point the submitted code must provide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSignature {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Semantic type of the result; `None` renders by runtime shape
    #[serde(default)]
    pub return_type: Option<ValueType>,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionSignature {
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.parameters.push(Parameter::new(name, value_type));
        self
    }

    /// Add a numeric parameter with a fixed element width
    pub fn with_sized_parameter(
        mut self,
        name: impl Into<String>,
        value_type: ValueType,
        width: NumKind,
    ) -> Self {
        let mut param = Parameter::new(name, value_type);
        param.width = Some(width);
        self.parameters.push(param);
        self
    }

    pub fn with_return_type(mut self, value_type: ValueType) -> Self {
        self.return_type = Some(value_type);
        self
    }
}

/// One hidden test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Positional argument list, or an object keyed by parameter name
    pub input: Value,
    /// Expected result
    pub output: Value,
}

impl TestCase {
    pub fn new(input: Value, output: Value) -> Self {
        TestCase { input, output }
    }

    /// Resolve the arguments in declared parameter order.
    ///
    /// Fails when the input arity does not match the signature.
    pub fn arguments<'a>(&'a self, signature: &FunctionSignature) -> Result<Vec<&'a Value>> {
        let expected = signature.parameters.len();
        match &self.input {
            Value::Array(values) if values.len() == expected => Ok(values.iter().collect()),
            Value::Array(values) => Err(Error::InvalidProblem(format!(
                "input has {} values but {} declares {} parameters",
                values.len(),
                signature.name,
                expected
            ))),
            Value::Object(map) => {
                if map.len() != expected {
                    return Err(Error::InvalidProblem(format!(
                        "input has {} named values but {} declares {} parameters",
                        map.len(),
                        signature.name,
                        expected
                    )));
                }
                signature
                    .parameters
                    .iter()
                    .map(|param| {
                        map.get(&param.name).ok_or_else(|| {
                            Error::InvalidProblem(format!("input is missing parameter '{}'", param.name))
                        })
                    })
                    .collect()
            }
            // A bare scalar is accepted for single-parameter signatures
            other if expected == 1 && !other.is_null() => Ok(vec![other]),
            _ => Err(Error::InvalidProblem(format!(
                "input does not provide {} arguments for {}",
                expected, signature.name
            ))),
        }
    }
}

/// A catalog problem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Starter code keyed by language name
    #[serde(default)]
    pub starter_code: BTreeMap<String, String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    pub function_metadata: FunctionSignature,
}

impl Problem {
    /// Check the authoring preconditions the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if self.function_metadata.name.trim().is_empty() {
            return Err(Error::InvalidProblem(format!(
                "problem '{}' has no entry point name",
                self.title
            )));
        }
        for (index, test_case) in self.test_cases.iter().enumerate() {
            test_case
                .arguments(&self.function_metadata)
                .map_err(|e| Error::InvalidProblem(format!("test case {}: {}", index + 1, e)))?;
        }
        Ok(())
    }
}
