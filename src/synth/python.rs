//! Python 3 harness

use super::{float_literal, join, quoted, CallPlan, Emitter, SourceWriter};
use crate::error::Result;
use crate::marshal::{Marshaled, Num, ValueType, TRAVERSAL_LIMIT};
use crate::model::Language;

const PRELUDE: &str = "import sys as _judge_sys
from typing import *
";

const LIST_NODE: &str = "
class ListNode:
    def __init__(self, val=0, next=None):
        self.val = val
        self.next = next
";

const TREE_NODE: &str = "
class TreeNode:
    def __init__(self, val=0, left=None, right=None):
        self.val = val
        self.left = left
        self.right = right
";

const FORMAT: &str = r#"
def _judge_format(value):
    if value is None:
        return "null"
    if isinstance(value, bool):
        return "true" if value else "false"
    if isinstance(value, float):
        return _judge_format_float(value)
    if isinstance(value, (list, tuple)):
        return ",".join(_judge_format(item) for item in value)
    return str(value)


def _judge_format_float(value):
    if value != value:
        return "NaN"
    if value in (float("inf"), float("-inf")):
        return "inf" if value > 0 else "-inf"
    if value.is_integer() and abs(value) < 1e15:
        return str(int(value))
    # Shortest round-trip digits, written without an exponent
    from decimal import Decimal
    text = format(Decimal(repr(value)), "f")
    return text[:-2] if text.endswith(".0") else text
"#;

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Emits a Python 3 program
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonEmitter;

impl Emitter for PythonEmitter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        PYTHON_KEYWORDS
    }

    fn emit(&self, source: &str, plan: &CallPlan) -> Result<String> {
        let lists = plan.uses(ValueType::LinkedList);
        let trees = plan.uses(ValueType::BinaryTree);

        // Node classes precede the user source so its annotations resolve
        let mut w = SourceWriter::new("    ");
        w.raw(PRELUDE);
        if lists {
            w.raw(LIST_NODE);
        }
        if trees {
            w.raw(TREE_NODE);
        }
        w.line("");
        w.raw(source);
        w.line("");
        w.raw(FORMAT);
        if lists {
            w.raw(&list_helpers());
        }
        if trees {
            w.raw(&tree_helpers());
        }

        w.line("");
        w.line("def _judge_main():");
        w.indent();
        for binding in &plan.bindings {
            w.line(&format!("{} = {}", binding.name, literal(&binding.value)?));
        }
        let args = plan.argument_list();
        w.line("if \"Solution\" in globals():");
        w.indent();
        w.line(&format!("_judge_result = Solution().{}({})", plan.entry_point, args));
        w.dedent();
        w.line("else:");
        w.indent();
        w.line(&format!("_judge_result = {}({})", plan.entry_point, args));
        w.dedent();
        match plan.return_type {
            Some(ValueType::LinkedList) => w.line("_judge_result = _judge_flatten_list(_judge_result)"),
            Some(ValueType::BinaryTree) => w.line("_judge_result = _judge_flatten_tree(_judge_result)"),
            _ => {}
        }
        w.line("print(_judge_format(_judge_result))");
        w.dedent();

        w.line("");
        w.line("");
        w.line("try:");
        w.indent();
        w.line("_judge_main()");
        w.dedent();
        w.line("except Exception as _judge_error:");
        w.indent();
        w.line("print(\"Runtime Error: \" + type(_judge_error).__name__ + \": \" + str(_judge_error))");
        w.line("_judge_sys.stdout.flush()");
        w.line("_judge_sys.exit(1)");
        w.dedent();

        Ok(w.finish())
    }
}

fn list_helpers() -> String {
    format!(
        "
def _judge_build_list(values):
    head = None
    for value in reversed(values):
        head = ListNode(value, head)
    return head


def _judge_flatten_list(head):
    out = []
    while head is not None and len(out) < {limit}:
        out.append(head.val)
        head = head.next
    return out
",
        limit = TRAVERSAL_LIMIT
    )
}

fn tree_helpers() -> String {
    format!(
        "
def _judge_build_tree(values):
    if not values or values[0] is None:
        return None
    root = TreeNode(values[0])
    frontier = [root]
    index = 1
    position = 0
    while position < len(frontier) and index < len(values):
        parent = frontier[position]
        position += 1
        for side in (\"left\", \"right\"):
            if index >= len(values):
                break
            if values[index] is not None:
                child = TreeNode(values[index])
                setattr(parent, side, child)
                frontier.append(child)
            index += 1
    return root


def _judge_flatten_tree(root):
    out = []
    queue = [root]
    position = 0
    visited = 0
    while position < len(queue):
        node = queue[position]
        position += 1
        if node is None:
            out.append(None)
            continue
        if visited >= {limit}:
            break
        visited += 1
        out.append(node.val)
        queue.append(node.left)
        queue.append(node.right)
    while out and out[-1] is None:
        out.pop()
    return out
",
        limit = TRAVERSAL_LIMIT
    )
}

fn number(num: &Num) -> Result<String> {
    match num {
        Num::Int(i) => Ok(i.to_string()),
        Num::Float(f) => float_literal(*f),
    }
}

fn literal(value: &Marshaled) -> Result<String> {
    Ok(match value {
        Marshaled::Number(num) => number(num)?,
        Marshaled::Boolean(b) => (if *b { "True" } else { "False" }).to_string(),
        Marshaled::Str(s) => quoted(s),
        Marshaled::NumberList(nums) => format!("[{}]", join(nums, number)?),
        Marshaled::StringList(items) => format!("[{}]", join(items, |s| Ok(quoted(s)))?),
        Marshaled::CharList(chars) => format!("[{}]", join(chars, |c| Ok(quoted(&c.to_string())))?),
        Marshaled::NumberMatrix(rows) => {
            format!("[{}]", join(rows, |row| Ok(format!("[{}]", join(row, number)?)))?)
        }
        Marshaled::CharMatrix(rows) => format!(
            "[{}]",
            join(rows, |row| Ok(format!("[{}]", join(row, |c| Ok(quoted(&c.to_string())))?)))?
        ),
        Marshaled::LinkedList(values) => {
            format!("_judge_build_list([{}])", join(values, |v| Ok(v.to_string()))?)
        }
        Marshaled::Tree(values) => format!(
            "_judge_build_tree([{}])",
            join(values, |v| Ok(v.map_or_else(|| "None".to_string(), |v| v.to_string())))?
        ),
    })
}
