//! Node.js harness

use super::{float_literal, join, quoted, CallPlan, Emitter, SourceWriter};
use crate::error::Result;
use crate::marshal::{Marshaled, Num, ValueType, TRAVERSAL_LIMIT};
use crate::model::Language;

// Installed on globalThis so a user-declared class of the same name wins
const LIST_NODE: &str = "globalThis.ListNode = class ListNode {
  constructor(val, next) {
    this.val = val === undefined ? 0 : val;
    this.next = next === undefined ? null : next;
  }
};
";

const TREE_NODE: &str = "globalThis.TreeNode = class TreeNode {
  constructor(val, left, right) {
    this.val = val === undefined ? 0 : val;
    this.left = left === undefined ? null : left;
    this.right = right === undefined ? null : right;
  }
};
";

const FORMAT: &str = r#"
function _judgeFormat(value) {
  if (value === null || value === undefined) return "null";
  if (typeof value === "boolean") return value ? "true" : "false";
  if (typeof value === "number") return _judgeFormatNumber(value);
  if (Array.isArray(value)) return value.map(_judgeFormat).join(",");
  return String(value);
}

// Shortest round-trip digits, written without an exponent
function _judgeFormatNumber(value) {
  if (Number.isNaN(value)) return "NaN";
  if (!Number.isFinite(value)) return value > 0 ? "inf" : "-inf";
  const text = String(value);
  const match = /^(-?)(\d)(?:\.(\d+))?e([+-]\d+)$/.exec(text);
  if (match === null) return text;
  const sign = match[1];
  const digits = match[2] + (match[3] || "");
  const point = 1 + Number(match[4]);
  if (point <= 0) return sign + "0." + "0".repeat(-point) + digits;
  if (point >= digits.length) return sign + digits + "0".repeat(point - digits.length);
  return sign + digits.slice(0, point) + "." + digits.slice(point);
}
"#;

const JS_RESERVED: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Emits a Node.js program
#[derive(Debug, Clone, Copy, Default)]
pub struct JavascriptEmitter;

impl Emitter for JavascriptEmitter {
    fn language(&self) -> Language {
        Language::Javascript
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        JS_RESERVED
    }

    fn emit(&self, source: &str, plan: &CallPlan) -> Result<String> {
        let lists = plan.uses(ValueType::LinkedList);
        let trees = plan.uses(ValueType::BinaryTree);

        let mut w = SourceWriter::new("  ");
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
        w.line("function _judgeMain() {");
        w.indent();
        for binding in &plan.bindings {
            w.line(&format!("const {} = {};", binding.name, literal(&binding.value)?));
        }
        let args = plan.argument_list();
        w.line(&format!(
            "let _judgeResult = typeof Solution === \"function\" ? new Solution().{entry}({args}) : {entry}({args});",
            entry = plan.entry_point,
            args = args
        ));
        match plan.return_type {
            Some(ValueType::LinkedList) => w.line("_judgeResult = _judgeFlattenList(_judgeResult);"),
            Some(ValueType::BinaryTree) => w.line("_judgeResult = _judgeFlattenTree(_judgeResult);"),
            _ => {}
        }
        w.line("console.log(_judgeFormat(_judgeResult));");
        w.dedent();
        w.line("}");

        w.line("");
        w.line("try {");
        w.indent();
        w.line("_judgeMain();");
        w.dedent();
        w.line("} catch (_judgeError) {");
        w.indent();
        w.line("const detail = _judgeError && _judgeError.message ? _judgeError.message : String(_judgeError);");
        w.line("console.log(\"Runtime Error: \" + detail);");
        // exitCode lets stdout drain; process.exit() can truncate piped output
        w.line("process.exitCode = 1;");
        w.dedent();
        w.line("}");

        Ok(w.finish())
    }
}

fn list_helpers() -> String {
    format!(
        "
function _judgeBuildList(values) {{
  let head = null;
  for (let i = values.length - 1; i >= 0; i--) head = new ListNode(values[i], head);
  return head;
}}

function _judgeFlattenList(head) {{
  const out = [];
  while (head !== null && head !== undefined && out.length < {limit}) {{
    out.push(head.val);
    head = head.next;
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
function _judgeBuildTree(values) {{
  if (values.length === 0 || values[0] === null) return null;
  const root = new TreeNode(values[0]);
  const frontier = [root];
  let index = 1;
  let position = 0;
  while (position < frontier.length && index < values.length) {{
    const parent = frontier[position++];
    for (const side of [\"left\", \"right\"]) {{
      if (index >= values.length) break;
      if (values[index] !== null) {{
        const child = new TreeNode(values[index]);
        parent[side] = child;
        frontier.push(child);
      }}
      index++;
    }}
  }}
  return root;
}}

function _judgeFlattenTree(root) {{
  const out = [];
  const queue = [root];
  let position = 0;
  let visited = 0;
  while (position < queue.length) {{
    const node = queue[position++];
    if (node === null || node === undefined) {{
      out.push(null);
      continue;
    }}
    if (visited >= {limit}) break;
    visited++;
    out.push(node.val);
    queue.push(node.left, node.right);
  }}
  while (out.length > 0 && out[out.length - 1] === null) out.pop();
  return out;
}}
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
        Marshaled::Boolean(b) => b.to_string(),
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
            format!("_judgeBuildList([{}])", join(values, |v| Ok(v.to_string()))?)
        }
        Marshaled::Tree(values) => format!(
            "_judgeBuildTree([{}])",
            join(values, |v| Ok(v.map_or_else(|| "null".to_string(), |v| v.to_string())))?
        ),
    })
}
