//! Code Synthesizer
//!
//! A [`CallPlan`] is the language-neutral description of one test-case
//! invocation: typed bindings in declared parameter order, the entry point,
//! and the result shape. Each target language implements [`Emitter`] to turn
//! a plan plus the verbatim user source into one runnable program.
//!
//! Programs for one submission are synthesized together: a numeric
//! parameter gets the same native width in every test case, taken from its
//! tag or else from the widest value any test case passes.
//!
//! Every generated harness follows the same contract:
//! - the result is printed as canonical text on a single stdout line
//! - a runtime fault prints `Runtime Error: <detail>` and exits non-zero

mod cpp;
mod javascript;
mod python;

pub use cpp::CppEmitter;
pub use javascript::JavascriptEmitter;
pub use python::PythonEmitter;

use tracing::debug;

use crate::error::{Error, Result};
use crate::marshal::{self, Marshaled, NumKind, ValueType};
use crate::model::{FunctionSignature, Language, TestCase};

/// Prefix reserved for names the harness introduces
pub const HARNESS_PREFIX: &str = "_judge";

/// Marker printed by every harness when the submitted code faults
pub const RUNTIME_ERROR_MARKER: &str = "Runtime Error:";

/// One local binding the harness declares before the call
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value_type: ValueType,
    pub value: Marshaled,
    /// Native numeric width for typed targets; `None` when nothing numeric is bound
    pub num_kind: Option<NumKind>,
}

/// Language-neutral plan for a single entry-point invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CallPlan {
    pub entry_point: String,
    pub bindings: Vec<Binding>,
    pub return_type: Option<ValueType>,
}

impl CallPlan {
    /// Resolve and marshal one test case's arguments against a signature
    pub fn build(signature: &FunctionSignature, test_case: &TestCase) -> Result<Self> {
        validate_identifier(&signature.name)?;
        let arguments = test_case.arguments(signature)?;

        let bindings = signature
            .parameters
            .iter()
            .zip(arguments)
            .map(|(param, value)| {
                validate_identifier(&param.name)?;
                if param.name == signature.name || param.name == "Solution" {
                    return Err(Error::Synthesis(format!(
                        "parameter '{}' shadows the entry point",
                        param.name
                    )));
                }
                let value = marshal::marshal(value, param.value_type)
                    .map_err(|e| Error::Marshal(format!("parameter '{}': {}", param.name, e)))?;
                Ok(Binding {
                    name: param.name.clone(),
                    value_type: param.value_type,
                    num_kind: param.width.max(value.num_kind()),
                    value,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CallPlan {
            entry_point: signature.name.clone(),
            bindings,
            return_type: signature.return_type,
        })
    }

    /// Give each parameter the widest numeric kind it has in any plan
    pub fn unify_num_kinds(plans: &mut [CallPlan]) {
        let arity = plans.first().map_or(0, |plan| plan.bindings.len());
        for index in 0..arity {
            let widest = plans
                .iter()
                .filter_map(|plan| plan.bindings.get(index).and_then(|b| b.num_kind))
                .max();
            for plan in plans.iter_mut() {
                if let Some(binding) = plan.bindings.get_mut(index) {
                    binding.num_kind = widest;
                }
            }
        }
    }

    /// Whether any binding or the result has the given type
    pub fn uses(&self, value_type: ValueType) -> bool {
        self.return_type == Some(value_type)
            || self.bindings.iter().any(|b| b.value_type == value_type)
    }

    /// Argument list in declared order
    pub fn argument_list(&self) -> String {
        self.bindings
            .iter()
            .map(|b| b.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Per-language program generator
pub trait Emitter: Send + Sync {
    /// Target language
    fn language(&self) -> Language;

    /// Words that cannot be used as binding names in this language
    fn reserved_words(&self) -> &'static [&'static str];

    /// Produce a complete program wrapping `source`
    fn emit(&self, source: &str, plan: &CallPlan) -> Result<String>;
}

/// A runnable program for one (submission, test case)
#[derive(Debug, Clone)]
pub struct SynthesizedProgram {
    pub language: Language,
    pub source: String,
}

/// Get the emitter for a language
pub fn emitter_for(language: Language) -> &'static dyn Emitter {
    match language {
        Language::Python => &PythonEmitter,
        Language::Javascript => &JavascriptEmitter,
        Language::Cpp => &CppEmitter,
    }
}

/// Build one program per test case, in order.
///
/// Every test case is marshaled before any program is emitted, so a bad
/// value anywhere fails the whole submission before a sandbox is spawned.
pub fn synthesize_all(
    language: Language,
    code: &str,
    signature: &FunctionSignature,
    test_cases: &[TestCase],
) -> Result<Vec<SynthesizedProgram>> {
    let emitter = emitter_for(language);
    check_reserved(emitter, signature)?;

    let mut plans = test_cases
        .iter()
        .enumerate()
        .map(|(index, test_case)| {
            CallPlan::build(signature, test_case).map_err(|e| in_test_case(e, index + 1))
        })
        .collect::<Result<Vec<_>>>()?;
    CallPlan::unify_num_kinds(&mut plans);

    let programs = plans
        .iter()
        .enumerate()
        .map(|(index, plan)| {
            let source = emitter.emit(code, plan).map_err(|e| in_test_case(e, index + 1))?;
            Ok(SynthesizedProgram { language, source })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        language = %language,
        entry_point = %signature.name,
        programs = programs.len(),
        bytes = programs.iter().map(|p| p.source.len()).sum::<usize>(),
        "Synthesized programs"
    );
    Ok(programs)
}

fn check_reserved(emitter: &dyn Emitter, signature: &FunctionSignature) -> Result<()> {
    let reserved = emitter.reserved_words();
    match std::iter::once(signature.name.as_str())
        .chain(signature.parameters.iter().map(|p| p.name.as_str()))
        .find(|name| reserved.contains(name))
    {
        Some(name) => Err(Error::Synthesis(format!(
            "'{}' is a reserved word in {}",
            name,
            emitter.language()
        ))),
        None => Ok(()),
    }
}

fn in_test_case(error: Error, test: usize) -> Error {
    match error {
        Error::Marshal(message) => Error::Marshal(format!("test case {}: {}", test, message)),
        Error::Synthesis(message) => Error::Synthesis(format!("test case {}: {}", test, message)),
        Error::InvalidProblem(message) => {
            Error::InvalidProblem(format!("test case {}: {}", test, message))
        }
        other => other,
    }
}

/// Check a signature name is a plain ASCII identifier outside the harness namespace
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid {
        return Err(Error::Synthesis(format!("'{}' is not a valid identifier", name)));
    }
    if name.starts_with(HARNESS_PREFIX) {
        return Err(Error::Synthesis(format!(
            "'{}' uses the reserved prefix {}",
            name, HARNESS_PREFIX
        )));
    }
    Ok(())
}

/// Line-oriented source builder shared by the emitters
#[derive(Debug, Default)]
pub(crate) struct SourceWriter {
    out: String,
    indent: usize,
    unit: &'static str,
}

impl SourceWriter {
    pub(crate) fn new(unit: &'static str) -> Self {
        SourceWriter {
            out: String::new(),
            indent: 0,
            unit,
        }
    }

    pub(crate) fn line(&mut self, s: &str) {
        if !s.is_empty() {
            for _ in 0..self.indent {
                self.out.push_str(self.unit);
            }
            self.out.push_str(s);
        }
        self.out.push('\n');
    }

    /// Append a block of text verbatim, followed by a newline if missing
    pub(crate) fn raw(&mut self, s: &str) {
        self.out.push_str(s);
        if !s.ends_with('\n') {
            self.out.push('\n');
        }
    }

    pub(crate) fn indent(&mut self) {
        self.indent += 1;
    }

    pub(crate) fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

/// Float literal that every target parses back as a float
pub(crate) fn float_literal(f: f64) -> Result<String> {
    if !f.is_finite() {
        return Err(Error::Marshal(format!("{} has no literal form", f)));
    }
    Ok(format!("{:?}", f))
}

/// Double-quoted literal with JSON escaping; valid in Python and JavaScript
pub(crate) fn quoted(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

pub(crate) fn join<I, F>(items: I, f: F) -> Result<String>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Result<String>,
{
    Ok(items.into_iter().map(f).collect::<Result<Vec<_>>>()?.join(", "))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::marshal::{expected_text, TRAVERSAL_LIMIT};
    use serde_json::json;
    use std::process::Command;

    /// Output of a program run with a locally installed toolchain
    #[derive(Debug)]
    pub(crate) struct LocalRun {
        pub(crate) stdout: String,
        pub(crate) stderr: String,
        pub(crate) code: Option<i32>,
    }

    /// Build and run `source` on this machine; `None` when the toolchain is missing
    pub(crate) fn run_locally(language: Language, source: &str) -> Option<LocalRun> {
        let (tool, file) = match language {
            Language::Python => ("python3", "main.py"),
            Language::Javascript => ("node", "main.js"),
            Language::Cpp => ("g++", "main.cpp"),
        };
        if Command::new(tool).arg("--version").output().is_err() {
            eprintln!("{} is not installed, skipping", tool);
            return None;
        }

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(file), source).unwrap();
        let output = match language {
            Language::Cpp => {
                let build = Command::new(tool)
                    .args(["-std=c++17", "-O0", "-o", "main", file])
                    .current_dir(dir.path())
                    .output()
                    .unwrap();
                if !build.status.success() {
                    return Some(LocalRun {
                        stdout: String::new(),
                        stderr: String::from_utf8_lossy(&build.stderr).into_owned(),
                        code: build.status.code(),
                    });
                }
                Command::new(dir.path().join("main"))
                    .current_dir(dir.path())
                    .output()
                    .unwrap()
            }
            _ => Command::new(tool).arg(file).current_dir(dir.path()).output().unwrap(),
        };

        Some(LocalRun {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }

    /// Run every test case's program; `None` when the toolchain is missing
    pub(crate) fn run_suite(
        language: Language,
        code: &str,
        signature: &FunctionSignature,
        cases: &[TestCase],
    ) -> Option<Vec<LocalRun>> {
        let programs = synthesize_all(language, code, signature, cases).unwrap();
        programs
            .iter()
            .map(|program| run_locally(language, &program.source))
            .collect()
    }

    /// Assert each run printed its case's expected text and exited cleanly
    fn assert_expected(language: Language, code: &str, signature: &FunctionSignature, cases: &[TestCase]) {
        let Some(runs) = run_suite(language, code, signature, cases) else {
            return;
        };
        for (case, run) in cases.iter().zip(runs) {
            let expected = expected_text(&case.output, signature.return_type);
            assert_eq!(run.stdout.trim_end(), expected, "{} {:?}", language, run);
            assert_eq!(run.code, Some(0), "{} {:?}", language, run);
        }
    }

    fn source(language: Language, python: &str, javascript: &str, cpp: &str) -> String {
        match language {
            Language::Python => python,
            Language::Javascript => javascript,
            Language::Cpp => cpp,
        }
        .to_string()
    }

    pub(crate) fn two_sum() -> FunctionSignature {
        FunctionSignature::new("twoSum")
            .with_parameter("nums", ValueType::Array)
            .with_parameter("target", ValueType::Number)
            .with_return_type(ValueType::Array)
    }

    #[test]
    fn test_call_plan_orders_bindings() {
        let case = TestCase::new(json!({"target": 9, "nums": [2, 7, 11, 15]}), json!([0, 1]));
        let plan = CallPlan::build(&two_sum(), &case).unwrap();
        assert_eq!(plan.entry_point, "twoSum");
        assert_eq!(plan.argument_list(), "nums, target");
        assert!(plan.uses(ValueType::Array));
        assert!(!plan.uses(ValueType::BinaryTree));
    }

    #[test]
    fn test_identifier_rules() {
        assert!(validate_identifier("twoSum").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("2sum").is_err());
        assert!(validate_identifier("two sum").is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("_judge_result").is_err());
        assert!(validate_identifier("naïve").is_err());
    }

    #[test]
    fn test_marshal_errors_name_the_parameter() {
        let case = TestCase::new(json!([[2, 7], "nine"]), json!([0, 1]));
        let err = CallPlan::build(&two_sum(), &case).unwrap_err();
        assert!(matches!(err, Error::Marshal(_)));
        assert!(err.to_string().contains("target"), "{}", err);
    }

    #[test]
    fn test_reserved_words_are_rejected() {
        let signature = FunctionSignature::new("solve").with_parameter("lambda", ValueType::Number);
        let cases = [TestCase::new(json!([1]), json!(1))];
        assert!(synthesize_all(Language::Python, "", &signature, &cases).is_err());
        // Not reserved in JavaScript
        assert!(synthesize_all(Language::Javascript, "", &signature, &cases).is_ok());
    }

    #[test]
    fn test_parameter_cannot_shadow_entry_point() {
        let signature = FunctionSignature::new("solve").with_parameter("solve", ValueType::Number);
        let cases = [TestCase::new(json!([1]), json!(1))];
        assert!(synthesize_all(Language::Python, "", &signature, &cases).is_err());
    }

    #[test]
    fn test_num_kinds_are_unified_across_test_cases() {
        let cases = [
            TestCase::new(json!([[1, 2], 3]), json!(null)),
            TestCase::new(json!([[1, 3_000_000_000i64], 3]), json!(null)),
            TestCase::new(json!([[], 2.5]), json!(null)),
        ];
        let mut plans = cases
            .iter()
            .map(|case| CallPlan::build(&two_sum(), case).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(plans[0].bindings[0].num_kind, Some(NumKind::Int32));
        assert_eq!(plans[2].bindings[0].num_kind, None);

        CallPlan::unify_num_kinds(&mut plans);
        for plan in &plans {
            assert_eq!(plan.bindings[0].num_kind, Some(NumKind::Int64));
            assert_eq!(plan.bindings[1].num_kind, Some(NumKind::Float));
        }
    }

    #[test]
    fn test_tag_width_is_a_floor() {
        let signature = FunctionSignature::new("total")
            .with_sized_parameter("nums", ValueType::Array, NumKind::Int64);
        let plan = CallPlan::build(&signature, &TestCase::new(json!([[1, 2]]), json!(3))).unwrap();
        assert_eq!(plan.bindings[0].num_kind, Some(NumKind::Int64));

        let plan = CallPlan::build(&signature, &TestCase::new(json!([[0.5]]), json!(0.5))).unwrap();
        assert_eq!(plan.bindings[0].num_kind, Some(NumKind::Float));
    }

    #[test]
    fn test_bad_value_fails_the_whole_suite() {
        let cases = [
            TestCase::new(json!([[2, 7], 9]), json!([0, 1])),
            TestCase::new(json!([[2, "7"], 9]), json!([0, 1])),
        ];
        let err = synthesize_all(Language::Cpp, "", &two_sum(), &cases).unwrap_err();
        assert!(matches!(err, Error::Marshal(_)));
        assert!(err.to_string().contains("test case 2"), "{}", err);
        assert!(synthesize_all(Language::Cpp, "", &two_sum(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_every_language_has_an_emitter() {
        for language in Language::all() {
            assert_eq!(emitter_for(language).language(), language);
        }
    }

    #[test]
    fn test_literal_helpers() {
        assert_eq!(float_literal(2.5).unwrap(), "2.5");
        assert_eq!(float_literal(2.0).unwrap(), "2.0");
        assert!(float_literal(f64::NAN).is_err());
        assert_eq!(quoted("a\"b\n"), "\"a\\\"b\\n\"");
    }

    #[test]
    fn test_tree_identity_prints_level_order() {
        let signature = FunctionSignature::new("identity")
            .with_parameter("root", ValueType::BinaryTree)
            .with_return_type(ValueType::BinaryTree);
        let cases = [
            TestCase::new(json!([[1, null, 2, 3]]), json!([1, null, 2, 3])),
            TestCase::new(json!([[4, 2, 7, 1, 3, 6, 9]]), json!([4, 2, 7, 1, 3, 6, 9])),
            TestCase::new(json!([[]]), json!([])),
        ];
        for language in Language::all() {
            let code = source(
                language,
                "class Solution:\n    def identity(self, root):\n        return root\n",
                "var identity = function(root) {\n  return root;\n};\n",
                "class Solution {\npublic:\n    TreeNode* identity(TreeNode* root) { return root; }\n};\n",
            );
            assert_expected(language, &code, &signature, &cases);
        }
    }

    #[test]
    fn test_list_identity_and_cycle_cap() {
        let identity = FunctionSignature::new("identity")
            .with_parameter("head", ValueType::LinkedList)
            .with_return_type(ValueType::LinkedList);
        let cases = [
            TestCase::new(json!([[5, 4, 3]]), json!([5, 4, 3])),
            TestCase::new(json!([[]]), json!([])),
        ];
        for language in Language::all() {
            let code = source(
                language,
                "def identity(head):\n    return head\n",
                "function identity(head) {\n  return head;\n}\n",
                "class Solution {\npublic:\n    ListNode* identity(ListNode* head) { return head; }\n};\n",
            );
            assert_expected(language, &code, &identity, &cases);
        }

        let close = FunctionSignature::new("close")
            .with_parameter("head", ValueType::LinkedList)
            .with_return_type(ValueType::LinkedList);
        let cases = [TestCase::new(json!([[1, 2, 3]]), json!(null))];
        for language in Language::all() {
            let code = source(
                language,
                "def close(head):\n    tail = head\n    while tail.next:\n        tail = tail.next\n    tail.next = head\n    return head\n",
                "function close(head) {\n  let tail = head;\n  while (tail.next) tail = tail.next;\n  tail.next = head;\n  return head;\n}\n",
                "class Solution {\npublic:\n    ListNode* close(ListNode* head) {\n        ListNode* tail = head;\n        while (tail->next) tail = tail->next;\n        tail->next = head;\n        return head;\n    }\n};\n",
            );
            let Some(runs) = run_suite(language, &code, &close, &cases) else {
                continue;
            };
            let printed = runs[0].stdout.trim_end();
            assert!(printed.starts_with("1,2,3,1,2,3"), "{} {:?}", language, runs[0]);
            assert_eq!(printed.split(',').count(), TRAVERSAL_LIMIT, "{}", language);
            assert_eq!(runs[0].code, Some(0), "{} {:?}", language, runs[0]);
        }
    }

    #[test]
    fn test_float_results_print_alike() {
        let signature = FunctionSignature::new("add")
            .with_parameter("a", ValueType::Number)
            .with_parameter("b", ValueType::Number)
            .with_return_type(ValueType::Number);
        let cases = [
            TestCase::new(json!([0.1, 0.2]), json!(0.30000000000000004)),
            TestCase::new(json!([2.5, 0.5]), json!(3)),
            TestCase::new(json!([1e20, 0]), json!(1e20)),
            TestCase::new(json!([1e-7, 0]), json!(1e-7)),
            TestCase::new(json!([-0.75, 0]), json!(-0.75)),
        ];
        for language in Language::all() {
            let code = source(
                language,
                "def add(a, b):\n    return a + b\n",
                "function add(a, b) {\n  return a + b;\n}\n",
                "class Solution {\npublic:\n    double add(double a, double b) { return a + b; }\n};\n",
            );
            assert_expected(language, &code, &signature, &cases);
        }
    }

    #[test]
    fn test_boolean_and_matrix_results() {
        let is_even = FunctionSignature::new("isEven")
            .with_parameter("n", ValueType::Number)
            .with_return_type(ValueType::Boolean);
        let cases = [
            TestCase::new(json!([4]), json!(true)),
            TestCase::new(json!([7]), json!(false)),
        ];
        let transpose = FunctionSignature::new("transpose")
            .with_parameter("matrix", ValueType::Matrix)
            .with_return_type(ValueType::Matrix);
        let grids = [TestCase::new(json!([[[1, 2], [3, 4]]]), json!([[1, 3], [2, 4]]))];

        for language in Language::all() {
            let code = source(
                language,
                "def isEven(n):\n    return n % 2 == 0\n",
                "function isEven(n) {\n  return n % 2 === 0;\n}\n",
                "class Solution {\npublic:\n    bool isEven(int n) { return n % 2 == 0; }\n};\n",
            );
            assert_expected(language, &code, &is_even, &cases);

            let code = source(
                language,
                "def transpose(matrix):\n    return [list(row) for row in zip(*matrix)]\n",
                "function transpose(matrix) {\n  return matrix[0].map((_, c) => matrix.map((row) => row[c]));\n}\n",
                "class Solution {\npublic:\n    vector<vector<int>> transpose(vector<vector<int>>& m) {\n        vector<vector<int>> out(m[0].size(), vector<int>(m.size()));\n        for (size_t r = 0; r < m.size(); r++)\n            for (size_t c = 0; c < m[0].size(); c++) out[c][r] = m[r][c];\n        return out;\n    }\n};\n",
            );
            assert_expected(language, &code, &transpose, &grids);
        }
    }

    #[test]
    fn test_thrown_errors_print_the_marker() {
        let signature = FunctionSignature::new("explode")
            .with_parameter("n", ValueType::Number)
            .with_return_type(ValueType::Number);
        let cases = [TestCase::new(json!([1]), json!(1))];
        for language in Language::all() {
            let code = source(
                language,
                "def explode(n):\n    raise ValueError(\"bad input\")\n",
                "function explode(n) {\n  throw new Error(\"bad input\");\n}\n",
                "class Solution {\npublic:\n    int explode(int n) { throw runtime_error(\"bad input\"); }\n};\n",
            );
            let Some(runs) = run_suite(language, &code, &signature, &cases) else {
                continue;
            };
            assert!(runs[0].stdout.starts_with(RUNTIME_ERROR_MARKER), "{} {:?}", language, runs[0]);
            assert!(runs[0].stdout.contains("bad input"), "{} {:?}", language, runs[0]);
            assert_eq!(runs[0].code, Some(1), "{} {:?}", language, runs[0]);
        }
    }
}
