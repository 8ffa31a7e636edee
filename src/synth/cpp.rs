//! C++17 harness
//!
//! C++ has no nullable `int`, so absent tree entries are passed to the
//! builder as `INT_MIN`; a tree value equal to `INT_MIN` is rejected.
//! `ListNode` and `TreeNode` allocate through class operators that track
//! every live node, whether the harness or the submitted code created it.
//! Whatever the submitted code did not delete itself is freed once after the
//! result is printed.

use super::{float_literal, CallPlan, Emitter, SourceWriter};
use crate::error::{Error, Result};
use crate::marshal::{Marshaled, Num, NumKind, ValueType, TRAVERSAL_LIMIT};
use crate::model::Language;

const PRELUDE: &str = "#include <bits/stdc++.h>
#include <signal.h>
#include <unistd.h>
using namespace std;
";

const NODE_TRACKING: &str = "
    static unordered_set<void*>& _judge_live() {
        static unordered_set<void*> nodes;
        return nodes;
    }
    static void* operator new(size_t size) {
        void* node = ::operator new(size);
        _judge_live().insert(node);
        return node;
    }
    static void operator delete(void* node) noexcept {
        _judge_live().erase(node);
        ::operator delete(node);
    }
";

const LIST_NODE: &str = "
struct ListNode {
    int val;
    ListNode *next;
    ListNode() : val(0), next(nullptr) {}
    ListNode(int x) : val(x), next(nullptr) {}
    ListNode(int x, ListNode *next) : val(x), next(next) {}
";

const TREE_NODE: &str = "
struct TreeNode {
    int val;
    TreeNode *left;
    TreeNode *right;
    TreeNode() : val(0), left(nullptr), right(nullptr) {}
    TreeNode(int x) : val(x), left(nullptr), right(nullptr) {}
    TreeNode(int x, TreeNode *left, TreeNode *right) : val(x), left(left), right(right) {}
";

const NODE_RELEASE: &str = "
template <typename Node>
static void _judge_release() {
    vector<void*> nodes(Node::_judge_live().begin(), Node::_judge_live().end());
    for (void* node : nodes) delete static_cast<Node*>(node);
}
";

// The handler runs on its own stack so a stack overflow still reports
const SIGNALS: &str = r#"
static volatile sig_atomic_t _judge_done = 0;
static char _judge_signal_stack[1 << 16];

static void _judge_on_signal(int sig) {
    if (_judge_done) _exit(0);
    char buffer[64];
    int length = snprintf(buffer, sizeof(buffer), "Runtime Error: signal %d\n", sig);
    if (length > 0) {
        ssize_t ignored = write(STDOUT_FILENO, buffer, (size_t)length);
        (void)ignored;
    }
    _exit(1);
}

static void _judge_install_signal_handlers() {
    stack_t stack;
    memset(&stack, 0, sizeof(stack));
    stack.ss_sp = _judge_signal_stack;
    stack.ss_size = sizeof(_judge_signal_stack);
    sigaltstack(&stack, nullptr);

    struct sigaction action;
    memset(&action, 0, sizeof(action));
    action.sa_handler = _judge_on_signal;
    action.sa_flags = SA_ONSTACK;
    sigemptyset(&action.sa_mask);
    const int signals[] = {SIGSEGV, SIGFPE, SIGABRT, SIGBUS};
    for (int sig : signals) sigaction(sig, &action, nullptr);
}
"#;

const SCALAR_FORMAT: &str = r#"
static string _judge_format(bool v) { return v ? "true" : "false"; }
static string _judge_format(char v) { return string(1, v); }
static string _judge_format(const string& v) { return v; }
static string _judge_format(const char* v) { return string(v); }

template <typename T, typename enable_if<is_integral<T>::value && !is_same<T, bool>::value && !is_same<T, char>::value, int>::type = 0>
static string _judge_format(T v) { return to_string(v); }

// Shortest round-trip digits, written without an exponent
static string _judge_format(double v) {
    if (std::isnan(v)) return "NaN";
    if (std::isinf(v)) return v > 0 ? "inf" : "-inf";
    if (v == std::floor(v) && std::fabs(v) < 1e15) return to_string((long long)v);
    char buffer[64];
    for (int precision = 15; precision <= 17; precision++) {
        snprintf(buffer, sizeof(buffer), "%.*e", precision - 1, v);
        if (strtod(buffer, nullptr) == v) break;
    }
    string text(buffer);
    string sign;
    if (text[0] == '-') {
        sign = "-";
        text.erase(0, 1);
    }
    size_t exponent = text.find('e');
    int point = 1 + atoi(text.c_str() + exponent + 1);
    string digits;
    for (size_t i = 0; i < exponent; i++) {
        if (text[i] != '.') digits += text[i];
    }
    while (digits.size() > 1 && digits.back() == '0') digits.pop_back();
    if (point <= 0) return sign + "0." + string(-point, '0') + digits;
    if (point >= (int)digits.size()) return sign + digits + string(point - digits.size(), '0');
    return sign + digits.substr(0, point) + "." + digits.substr(point);
}

static string _judge_format(float v) { return _judge_format((double)v); }
"#;

// Declared last so element overloads above are visible
const VECTOR_FORMAT: &str = "
template <typename T>
static string _judge_format(const vector<T>& v) {
    string out;
    for (size_t i = 0; i < v.size(); i++) {
        if (i > 0) out += \",\";
        out += _judge_format(static_cast<T>(v[i]));
    }
    return out;
}
";

const CPP_RESERVED: &[&str] = &[
    "alignas", "alignof", "and", "asm", "auto", "bool", "break", "case", "catch", "char",
    "class", "const", "constexpr", "continue", "default", "delete", "do", "double", "else",
    "enum", "explicit", "extern", "false", "float", "for", "friend", "goto", "if", "inline",
    "int", "long", "main", "mutable", "namespace", "new", "not", "nullptr", "operator", "or",
    "private", "protected", "public", "register", "return", "short", "signed", "sizeof",
    "solution", "static", "struct", "switch", "template", "this", "throw", "true", "try",
    "typedef", "typename", "union", "unsigned", "using", "virtual", "void", "volatile",
    "while",
];

/// Emits a C++17 program compiled with g++
#[derive(Debug, Clone, Copy, Default)]
pub struct CppEmitter;

impl Emitter for CppEmitter {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        CPP_RESERVED
    }

    fn emit(&self, source: &str, plan: &CallPlan) -> Result<String> {
        let lists = plan.uses(ValueType::LinkedList);
        let trees = plan.uses(ValueType::BinaryTree);

        let mut w = SourceWriter::new("    ");
        w.raw(PRELUDE);
        for (used, node) in [(lists, LIST_NODE), (trees, TREE_NODE)] {
            if used {
                w.raw(node);
                w.raw(NODE_TRACKING);
                w.line("};");
            }
        }
        if lists || trees {
            w.raw(NODE_RELEASE);
        }
        w.line("");
        w.raw(source);
        w.line("");
        w.raw(SIGNALS);
        w.raw(SCALAR_FORMAT);
        if lists {
            w.raw(&list_helpers());
        }
        if trees {
            w.raw(&tree_helpers());
        }
        w.raw(VECTOR_FORMAT);

        w.line("");
        w.line("int main() {");
        w.indent();
        w.line("_judge_install_signal_handlers();");
        w.line("int _judge_status = 0;");
        w.line("try {");
        w.indent();
        for binding in &plan.bindings {
            let kind = binding.num_kind.unwrap_or(NumKind::Int32);
            let (ty, value) = typed_literal(&binding.value, kind)?;
            w.line(&format!("{} {} = {};", ty, binding.name, value));
        }
        w.line("Solution solution;");
        w.line(&format!(
            "auto _judge_result = solution.{}({});",
            plan.entry_point,
            plan.argument_list()
        ));
        w.line("cout << _judge_format(_judge_result) << endl;");
        w.line("_judge_done = 1;");
        w.dedent();
        w.line("} catch (const exception& e) {");
        w.indent();
        w.line("cout << \"Runtime Error: \" << e.what() << endl;");
        w.line("_judge_status = 1;");
        w.dedent();
        w.line("} catch (...) {");
        w.indent();
        w.line("cout << \"Runtime Error: unknown exception\" << endl;");
        w.line("_judge_status = 1;");
        w.dedent();
        w.line("}");
        if lists {
            w.line("_judge_release<ListNode>();");
        }
        if trees {
            w.line("_judge_release<TreeNode>();");
        }
        w.line("return _judge_status;");
        w.dedent();
        w.line("}");

        Ok(w.finish())
    }
}

fn list_helpers() -> String {
    format!(
        "
static ListNode* _judge_build_list(const vector<int>& values) {{
    ListNode* head = nullptr;
    for (size_t i = values.size(); i > 0; i--) head = new ListNode(values[i - 1], head);
    return head;
}}

static string _judge_format(ListNode* head) {{
    string out;
    size_t count = 0;
    while (head != nullptr && count < {limit}) {{
        if (count > 0) out += \",\";
        out += to_string(head->val);
        head = head->next;
        count++;
    }}
    return out;
}}
",
        limit = TRAVERSAL_LIMIT
    )
}

fn tree_helpers() -> String {
    format!(
        "
static TreeNode* _judge_build_tree(const vector<int>& values) {{
    if (values.empty() || values[0] == INT_MIN) return nullptr;
    TreeNode* root = new TreeNode(values[0]);
    deque<TreeNode*> frontier{{root}};
    size_t index = 1;
    while (!frontier.empty() && index < values.size()) {{
        TreeNode* parent = frontier.front();
        frontier.pop_front();
        if (values[index] != INT_MIN) {{
            parent->left = new TreeNode(values[index]);
            frontier.push_back(parent->left);
        }}
        index++;
        if (index >= values.size()) break;
        if (values[index] != INT_MIN) {{
            parent->right = new TreeNode(values[index]);
            frontier.push_back(parent->right);
        }}
        index++;
    }}
    return root;
}}

static string _judge_format(TreeNode* root) {{
    vector<string> out;
    deque<TreeNode*> queue{{root}};
    size_t visited = 0;
    while (!queue.empty()) {{
        TreeNode* node = queue.front();
        queue.pop_front();
        if (node == nullptr) {{
            out.push_back(\"null\");
            continue;
        }}
        if (visited >= {limit}) break;
        visited++;
        out.push_back(to_string(node->val));
        queue.push_back(node->left);
        queue.push_back(node->right);
    }}
    while (!out.empty() && out.back() == \"null\") out.pop_back();
    string text;
    for (size_t i = 0; i < out.size(); i++) {{
        if (i > 0) text += \",\";
        text += out[i];
    }}
    return text;
}}
",
        limit = TRAVERSAL_LIMIT
    )
}

fn numeric_type(kind: NumKind) -> &'static str {
    match kind {
        NumKind::Int32 => "int",
        NumKind::Int64 => "long long",
        NumKind::Float => "double",
    }
}

fn number(num: &Num, kind: NumKind) -> Result<String> {
    match (num, kind) {
        (Num::Int(i), NumKind::Float) => Ok(format!("{}.0", i)),
        (Num::Int(i), NumKind::Int64) => Ok(format!("{}LL", i)),
        (Num::Int(i), _) => Ok(i.to_string()),
        (Num::Float(f), _) => float_literal(*f),
    }
}

fn numbers(nums: &[Num], kind: NumKind) -> Result<String> {
    let items = nums
        .iter()
        .map(|n| number(n, kind))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("{{{}}}", items.join(", ")))
}

fn node_value(value: i64, what: &str, reserve_sentinel: bool) -> Result<i32> {
    match i32::try_from(value) {
        Ok(v) if !(reserve_sentinel && v == i32::MIN) => Ok(v),
        _ => Err(Error::Marshal(format!("{} value {} does not fit a C++ node", what, value))),
    }
}

/// Quote a string for a C++ literal; control bytes become octal escapes
fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '?' => out.push_str("\\?"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn char_literal(c: char) -> Result<String> {
    if !c.is_ascii() {
        return Err(Error::Marshal(format!("'{}' is not a single-byte char", c)));
    }
    Ok(match c {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\n' => "'\\n'".to_string(),
        '\t' => "'\\t'".to_string(),
        '\r' => "'\\r'".to_string(),
        c if c.is_ascii_control() => format!("'\\{:03o}'", c as u32),
        c => format!("'{}'", c),
    })
}

fn chars(chars: &[char]) -> Result<String> {
    let items = chars.iter().map(|c| char_literal(*c)).collect::<Result<Vec<_>>>()?;
    Ok(format!("{{{}}}", items.join(", ")))
}

/// Declared type and initializer for one binding; `kind` fixes numeric width
fn typed_literal(value: &Marshaled, kind: NumKind) -> Result<(String, String)> {
    Ok(match value {
        Marshaled::Number(num) => (numeric_type(kind).to_string(), number(num, kind)?),
        Marshaled::Boolean(b) => ("bool".to_string(), b.to_string()),
        Marshaled::Str(s) => ("string".to_string(), string_literal(s)),
        Marshaled::NumberList(nums) => {
            (format!("vector<{}>", numeric_type(kind)), numbers(nums, kind)?)
        }
        Marshaled::StringList(items) => {
            let items: Vec<String> = items.iter().map(|s| string_literal(s)).collect();
            ("vector<string>".to_string(), format!("{{{}}}", items.join(", ")))
        }
        Marshaled::CharList(list) => ("vector<char>".to_string(), chars(list)?),
        Marshaled::NumberMatrix(rows) => {
            let rows = rows
                .iter()
                .map(|row| numbers(row, kind))
                .collect::<Result<Vec<_>>>()?;
            (
                format!("vector<vector<{}>>", numeric_type(kind)),
                format!("{{{}}}", rows.join(", ")),
            )
        }
        Marshaled::CharMatrix(rows) => {
            let rows = rows.iter().map(|row| chars(row)).collect::<Result<Vec<_>>>()?;
            ("vector<vector<char>>".to_string(), format!("{{{}}}", rows.join(", ")))
        }
        Marshaled::LinkedList(values) => {
            let items = values
                .iter()
                .map(|v| node_value(*v, "linked list", false).map(|v| v.to_string()))
                .collect::<Result<Vec<_>>>()?;
            ("ListNode*".to_string(), format!("_judge_build_list({{{}}})", items.join(", ")))
        }
        Marshaled::Tree(values) => {
            let items = values
                .iter()
                .map(|v| match v {
                    Some(v) => node_value(*v, "tree", true).map(|v| v.to_string()),
                    None => Ok("INT_MIN".to_string()),
                })
                .collect::<Result<Vec<_>>>()?;
            ("TreeNode*".to_string(), format!("_judge_build_tree({{{}}})", items.join(", ")))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FunctionSignature, TestCase};
    use crate::synth::tests::{run_locally, run_suite, two_sum};
    use crate::synth::{synthesize_all, RUNTIME_ERROR_MARKER};
    use serde_json::json;

    const TWO_SUM: &str = "class Solution {
public:
    vector<int> twoSum(vector<int>& nums, int target) {
        unordered_map<int, int> seen;
        for (int i = 0; i < (int)nums.size(); i++) {
            auto it = seen.find(target - nums[i]);
            if (it != seen.end()) return {it->second, i};
            seen[nums[i]] = i;
        }
        return {};
    }
};
";

    fn emit(signature: &FunctionSignature, input: serde_json::Value) -> Result<String> {
        let plan = CallPlan::build(signature, &TestCase::new(input, json!(null)))?;
        CppEmitter.emit(TWO_SUM, &plan)
    }

    #[test]
    fn test_two_sum_program() {
        let program = emit(&two_sum(), json!([[2, 7, 11, 15], 9])).unwrap();
        assert!(program.starts_with("#include <bits/stdc++.h>"));
        assert!(program.contains("        vector<int> nums = {2, 7, 11, 15};\n"));
        assert!(program.contains("        int target = 9;\n"));
        assert!(program.contains("Solution solution;"));
        assert!(program.contains("auto _judge_result = solution.twoSum(nums, target);"));
        assert!(program.contains("Runtime Error: signal %d"));
        assert!(!program.contains("struct ListNode"));
        // The vector formatter comes after every element overload
        let vector_at = program.find("const vector<T>& v").unwrap();
        let double_at = program.find("_judge_format(double v)").unwrap();
        assert!(double_at < vector_at);
    }

    #[test]
    fn test_double_formatter_is_shortest_round_trip() {
        let program = emit(&two_sum(), json!([[1], 1])).unwrap();
        assert!(program.contains("for (int precision = 15; precision <= 17; precision++) {"));
        assert!(program.contains("action.sa_flags = SA_ONSTACK;"));
        assert!(program.contains("sigaltstack(&stack, nullptr);"));
    }

    #[test]
    fn test_numeric_widening() {
        let signature = FunctionSignature::new("average").with_parameter("values", ValueType::Array);
        let program = emit(&signature, json!([[1, 2.5]])).unwrap();
        assert!(program.contains("vector<double> values = {1.0, 2.5};"));

        let program = emit(&signature, json!([[1, 3000000000i64]])).unwrap();
        assert!(program.contains("vector<long long> values = {1LL, 3000000000LL};"));

        let program = emit(&signature, json!([[[1, 2], [3, 4]]])).unwrap();
        assert!(program.contains("vector<vector<int>> values = {{1, 2}, {3, 4}};"));
    }

    #[test]
    fn test_tree_sentinel_and_cleanup() {
        let signature = FunctionSignature::new("invertTree")
            .with_parameter("root", ValueType::BinaryTree)
            .with_return_type(ValueType::BinaryTree);
        let program = emit(&signature, json!([[1, null, 2, 3]])).unwrap();
        assert!(program.contains("TreeNode* root = _judge_build_tree({1, INT_MIN, 2, 3});"));
        assert!(program.contains("    static void operator delete(void* node) noexcept {"));
        assert!(program.contains("    _judge_release<TreeNode>();\n    return _judge_status;"));

        let err = emit(&signature, json!([[i32::MIN]])).unwrap_err();
        assert!(matches!(err, Error::Marshal(_)));
    }

    #[test]
    fn test_linked_list_cleanup() {
        let signature = FunctionSignature::new("reverseList")
            .with_parameter("head", ValueType::LinkedList)
            .with_return_type(ValueType::LinkedList);
        let program = emit(&signature, json!([[1, 2]])).unwrap();
        assert!(program.contains("ListNode* head = _judge_build_list({1, 2});"));
        assert!(program.contains("_judge_release<ListNode>();"));
        assert!(!program.contains("struct TreeNode"));
        // The node struct closes after its tracking operators
        assert!(program.contains("        ::operator delete(node);\n    }\n};\n"));
    }

    #[test]
    fn test_suite_declares_one_width_per_parameter() {
        let signature = FunctionSignature::new("total").with_parameter("nums", ValueType::Array);
        let cases = [
            TestCase::new(json!([[1, 2]]), json!(3)),
            TestCase::new(json!([[1, 3_000_000_000i64]]), json!(3_000_000_001i64)),
        ];
        let programs = synthesize_all(Language::Cpp, "", &signature, &cases).unwrap();
        assert!(programs[0].source.contains("vector<long long> nums = {1LL, 2LL};"));
        assert!(programs[1].source.contains("vector<long long> nums = {1LL, 3000000000LL};"));

        let sized = FunctionSignature::new("total")
            .with_sized_parameter("nums", ValueType::Array, NumKind::Int64);
        let programs = synthesize_all(Language::Cpp, "", &sized, &cases[..1]).unwrap();
        assert!(programs[0].source.contains("vector<long long> nums = {1LL, 2LL};"));

        let code = "class Solution {\npublic:\n    long long total(vector<long long>& nums) {\n        long long sum = 0;\n        for (long long n : nums) sum += n;\n        return sum;\n    }\n};\n";
        let Some(runs) = run_suite(Language::Cpp, code, &signature, &cases) else {
            return;
        };
        assert_eq!(runs[0].stdout, "3\n", "{:?}", runs[0]);
        assert_eq!(runs[1].stdout, "3000000001\n", "{:?}", runs[1]);
    }

    #[test]
    fn test_stack_overflow_reports_runtime_error() {
        let signature = FunctionSignature::new("depth")
            .with_parameter("n", ValueType::Number)
            .with_return_type(ValueType::Number);
        let code = "class Solution {\npublic:\n    int depth(int n) {\n        volatile char pad[256];\n        pad[0] = 0;\n        return n == 0 ? pad[0] : 1 + depth(n - 1);\n    }\n};\n";
        let cases = [TestCase::new(json!([1_000_000_000]), json!(0))];
        let Some(runs) = run_suite(Language::Cpp, code, &signature, &cases) else {
            return;
        };
        assert!(runs[0].stdout.starts_with(RUNTIME_ERROR_MARKER), "{:?}", runs[0]);
        assert_eq!(runs[0].code, Some(1), "{:?}", runs[0]);
    }

    #[test]
    fn test_nodes_deleted_by_submission_are_freed_once() {
        let signature = FunctionSignature::new("dropHead")
            .with_parameter("head", ValueType::LinkedList)
            .with_return_type(ValueType::LinkedList);
        let code = "class Solution {\npublic:\n    ListNode* dropHead(ListNode* head) {\n        ListNode* next = head->next;\n        delete head;\n        return new ListNode(9, next);\n    }\n};\n";
        let cases = [TestCase::new(json!([[1, 2, 3]]), json!([9, 2, 3]))];
        let programs = synthesize_all(Language::Cpp, code, &signature, &cases).unwrap();
        // Exit status must come from main, not from the post-print signal handler
        let source = programs[0].source.replace("if (_judge_done) _exit(0);", "");
        let Some(run) = run_locally(Language::Cpp, &source) else {
            return;
        };
        assert_eq!(run.stdout, "9,2,3\n", "{:?}", run);
        assert_eq!(run.code, Some(0), "{:?}", run);
        assert!(!run.stderr.contains("double free"), "{:?}", run);
    }

    #[test]
    fn test_string_and_char_escaping() {
        assert_eq!(string_literal("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(string_literal("\u{1}"), "\"\\001\"");
        assert_eq!(char_literal('\'').unwrap(), "'\\''");
        assert_eq!(char_literal('x').unwrap(), "'x'");
        assert!(char_literal('é').is_err());
    }

    #[test]
    fn test_char_grid() {
        let grid = Marshaled::CharMatrix(vec![vec!['1', '0'], vec!['0', '1']]);
        let (ty, value) = typed_literal(&grid, NumKind::Int32).unwrap();
        assert_eq!(ty, "vector<vector<char>>");
        assert_eq!(value, "{{'1', '0'}, {'0', '1'}}");
    }
}
