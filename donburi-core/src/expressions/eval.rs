use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::ast::{AssignOp, BinaryOp, Expr, Statement, UnaryOp};
use super::error::ExprError;
use crate::context::{Context, EVENT_TYPE_VAR};

/// Name under which expressions can address the whole context
/// (`context[key]`), unless a variable of that name shadows it.
pub const CONTEXT_ROOT: &str = "context";

pub fn eval_expr(expr: &Expr, ctx: &Context) -> Result<Value, ExprError> {
    eval(expr, ctx).map(Cow::into_owned)
}

/// Run a statement; assignments write into the context and yield the stored value.
pub fn exec_statement(stmt: &Statement, ctx: &mut Context) -> Result<Value, ExprError> {
    match stmt {
        Statement::Expr(expr) => eval_expr(expr, ctx),
        Statement::Assign { target, op, value } => {
            let path = resolve_place(target, ctx)?;
            let rhs = eval_expr(value, ctx)?;
            let new_value = match op {
                AssignOp::Set => rhs,
                AssignOp::Add | AssignOp::Sub => {
                    let current = read_place(&path, ctx)?;
                    let bop = if *op == AssignOp::Add {
                        BinaryOp::Add
                    } else {
                        BinaryOp::Sub
                    };
                    arithmetic(bop, &current, &rhs)?
                }
            };
            write_place(&path, ctx, new_value.clone())?;
            Ok(new_value)
        }
    }
}

/// Truthiness used by `!`, `&&` and `||`: `false`, `null`, `0`, `""`, `[]` and `{}` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Loose comparison with `false`, which is what skips a `when` guard.
///
/// `false`, `0`, numeric-zero strings (`"0"`, `" 0.0 "`, `""`) and lists that
/// flatten to one of those are false. `null` and mappings are not.
pub fn is_loosely_false(value: &Value) -> bool {
    match value {
        Value::Null | Value::Object(_) => false,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => numeric_zero(s),
        Value::Array(a) => match a.as_slice() {
            [] => true,
            [only] => match only {
                Value::Null => true,
                Value::Bool(_) | Value::Object(_) => false,
                other => is_loosely_false(other),
            },
            _ => false,
        },
    }
}

fn numeric_zero(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.parse::<f64>().is_ok_and(|f| f == 0.0)
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

fn eval<'c>(expr: &Expr, ctx: &'c Context) -> Result<Cow<'c, Value>, ExprError> {
    match expr {
        Expr::Literal(v) => Ok(Cow::Owned(v.clone())),
        Expr::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(eval_expr(item, ctx)?);
            }
            Ok(Cow::Owned(Value::Array(out)))
        }
        Expr::Var(name) => lookup_var(name, ctx),
        Expr::Member(base, key) => {
            let base = eval(base, ctx)?;
            member(base, key)
        }
        Expr::Index(base, index) => {
            let base = eval(base, ctx)?;
            let index = eval_expr(index, ctx)?;
            index_value(base, &index)
        }
        Expr::Unary(op, operand) => {
            let v = eval(operand, ctx)?;
            match op {
                UnaryOp::Not => Ok(Cow::Owned(Value::Bool(!is_truthy(&v)))),
                UnaryOp::Neg => match number(&v) {
                    Some(Num::Int(i)) => Ok(Cow::Owned(
                        i.checked_neg()
                            .map(Value::from)
                            .ok_or(ExprError::NonFinite)?,
                    )),
                    Some(Num::Float(f)) => Ok(Cow::Owned(float_value(-f)?)),
                    None => Err(ExprError::UnaryTypeMismatch {
                        op: "-",
                        operand: type_name(&v),
                    }),
                },
            }
        }
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            let ok = is_truthy(eval(lhs, ctx)?.as_ref()) && is_truthy(eval(rhs, ctx)?.as_ref());
            Ok(Cow::Owned(Value::Bool(ok)))
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            let ok = is_truthy(eval(lhs, ctx)?.as_ref()) || is_truthy(eval(rhs, ctx)?.as_ref());
            Ok(Cow::Owned(Value::Bool(ok)))
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = eval(lhs, ctx)?;
            let r = eval(rhs, ctx)?;
            binary(*op, &l, &r).map(Cow::Owned)
        }
        Expr::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for a in args {
                values.push(eval_expr(a, ctx)?);
            }
            call(name, values).map(Cow::Owned)
        }
    }
}

fn lookup_var<'c>(name: &str, ctx: &'c Context) -> Result<Cow<'c, Value>, ExprError> {
    if let Some(v) = ctx.get(name) {
        return Ok(Cow::Borrowed(v));
    }
    if name == CONTEXT_ROOT {
        return Ok(Cow::Owned(ctx.to_value()));
    }
    if name == EVENT_TYPE_VAR {
        if let Some(event) = ctx.event_type() {
            return Ok(Cow::Owned(Value::String(event.to_string())));
        }
    }
    Err(ExprError::UndefinedVariable(name.to_string()))
}

fn member<'c>(base: Cow<'c, Value>, key: &str) -> Result<Cow<'c, Value>, ExprError> {
    match base {
        Cow::Borrowed(Value::Object(map)) => {
            Ok(map.get(key).map(Cow::Borrowed).unwrap_or(Cow::Owned(Value::Null)))
        }
        Cow::Owned(Value::Object(mut map)) => {
            Ok(Cow::Owned(map.remove(key).unwrap_or(Value::Null)))
        }
        other => Err(ExprError::BadIndex {
            target: type_name(&other),
            index: format!("'{key}'"),
        }),
    }
}

fn index_value<'c>(base: Cow<'c, Value>, index: &Value) -> Result<Cow<'c, Value>, ExprError> {
    if let Value::String(key) = index {
        if base.is_object() {
            return member(base, key);
        }
    }
    if base.is_array() {
        if let Some(i) = array_index(index) {
            return Ok(match base {
                Cow::Borrowed(v) => v.get(i).map(Cow::Borrowed).unwrap_or(Cow::Owned(Value::Null)),
                Cow::Owned(mut v) => Cow::Owned(v.get_mut(i).map(Value::take).unwrap_or(Value::Null)),
            });
        }
    }
    Err(ExprError::BadIndex {
        target: type_name(&base),
        index: type_name(index).to_string(),
    })
}

fn array_index(index: &Value) -> Option<usize> {
    index.as_u64().and_then(|i| usize::try_from(i).ok())
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, ExprError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(json_eq(l, r))),
        BinaryOp::Ne => Ok(Value::Bool(!json_eq(l, r))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ord = json_cmp(l, r).ok_or_else(|| mismatch(op, l, r))?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ord.is_lt(),
                BinaryOp::Le => ord.is_le(),
                BinaryOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            }))
        }
        BinaryOp::In => match r {
            Value::Array(items) => Ok(Value::Bool(items.iter().any(|i| json_eq(i, l)))),
            Value::Object(map) => match l {
                Value::String(key) => Ok(Value::Bool(map.contains_key(key))),
                _ => Err(mismatch(op, l, r)),
            },
            Value::String(hay) => match l {
                Value::String(needle) => Ok(Value::Bool(hay.contains(needle.as_str()))),
                _ => Err(mismatch(op, l, r)),
            },
            _ => Err(mismatch(op, l, r)),
        },
        _ => arithmetic(op, l, r),
    }
}

fn arithmetic(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, ExprError> {
    if op == BinaryOp::Add {
        match (l, r) {
            (Value::String(a), b) => return Ok(Value::String(format!("{a}{}", display(b)))),
            (a, Value::String(b)) if !a.is_array() && !a.is_object() => {
                return Ok(Value::String(format!("{}{b}", display(a))))
            }
            (Value::Array(a), Value::Array(b)) => {
                let mut out = a.clone();
                out.extend(b.iter().cloned());
                return Ok(Value::Array(out));
            }
            _ => {}
        }
    }

    let (a, b) = match (number(l), number(r)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(mismatch(op, l, r)),
    };

    if let (Num::Int(x), Num::Int(y)) = (a, b) {
        let exact = match op {
            BinaryOp::Add => x.checked_add(y),
            BinaryOp::Sub => x.checked_sub(y),
            BinaryOp::Mul => x.checked_mul(y),
            BinaryOp::Div if y == 0 => return Err(ExprError::DivisionByZero),
            BinaryOp::Div if x.checked_rem(y) == Some(0) => x.checked_div(y),
            BinaryOp::Div => None,
            BinaryOp::Rem if y == 0 => return Err(ExprError::DivisionByZero),
            BinaryOp::Rem => x.checked_rem(y),
            _ => return Err(mismatch(op, l, r)),
        };
        if let Some(v) = exact {
            return Ok(Value::from(v));
        }
    }

    let (x, y) = (a.as_f64(), b.as_f64());
    let out = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div if y == 0.0 => return Err(ExprError::DivisionByZero),
        BinaryOp::Div => x / y,
        BinaryOp::Rem if y == 0.0 => return Err(ExprError::DivisionByZero),
        BinaryOp::Rem => x % y,
        _ => return Err(mismatch(op, l, r)),
    };
    float_value(out)
}

fn call(name: &str, args: Vec<Value>) -> Result<Value, ExprError> {
    let bad = |expected| ExprError::BadArguments {
        function: name.to_string(),
        expected,
    };
    match name {
        "len" => match args.as_slice() {
            [Value::String(s)] => Ok(Value::from(s.chars().count())),
            [Value::Array(a)] => Ok(Value::from(a.len())),
            [Value::Object(o)] => Ok(Value::from(o.len())),
            _ => Err(bad("one string, list or mapping")),
        },
        "keys" => match args.as_slice() {
            [Value::Object(o)] => Ok(Value::Array(
                o.keys().cloned().map(Value::String).collect(),
            )),
            _ => Err(bad("one mapping")),
        },
        "values" => match args.as_slice() {
            [Value::Object(o)] => Ok(Value::Array(o.values().cloned().collect())),
            _ => Err(bad("one mapping")),
        },
        _ => Err(ExprError::UnknownFunction(name.to_string())),
    }
}

/// A resolved assignment target: a root variable plus a key/index path.
#[derive(Debug)]
struct Place {
    root: String,
    path: Vec<Value>,
}

fn resolve_place(target: &Expr, ctx: &Context) -> Result<Place, ExprError> {
    match target {
        Expr::Var(name) => Ok(Place {
            root: name.clone(),
            path: Vec::new(),
        }),
        Expr::Member(base, key) => {
            let mut place = resolve_place(base, ctx)?;
            place.push(Value::String(key.clone()));
            Ok(place)
        }
        Expr::Index(base, index) => {
            let mut place = resolve_place(base, ctx)?;
            place.push(eval_expr(index, ctx)?);
            Ok(place)
        }
        _ => Err(ExprError::InvalidAssignmentTarget),
    }
}

impl Place {
    fn push(&mut self, segment: Value) {
        self.path.push(segment);
    }

    /// `context[k]` addresses the variable `k` unless `context` itself is a variable.
    fn normalize(&self, ctx: &Context) -> Result<(String, Vec<Value>), ExprError> {
        if self.root == CONTEXT_ROOT && !ctx.contains(CONTEXT_ROOT) {
            return match self.path.split_first() {
                Some((Value::String(name), rest)) => Ok((name.clone(), rest.to_vec())),
                _ => Err(ExprError::InvalidAssignmentTarget),
            };
        }
        Ok((self.root.clone(), self.path.clone()))
    }
}

fn read_place(place: &Place, ctx: &Context) -> Result<Value, ExprError> {
    let (root, path) = place.normalize(ctx)?;
    let mut cur: Cow<'_, Value> = lookup_var(&root, ctx)?;
    for seg in &path {
        cur = index_value(cur, seg)?;
    }
    Ok(cur.into_owned())
}

fn write_place(place: &Place, ctx: &mut Context, value: Value) -> Result<(), ExprError> {
    let (root, path) = place.normalize(ctx)?;
    let Some((last, parents)) = path.split_last() else {
        ctx.set(root, value);
        return Ok(());
    };

    let mut cur = ctx
        .get_mut(&root)
        .ok_or_else(|| ExprError::UndefinedVariable(root.clone()))?;
    for seg in parents {
        cur = step_mut(cur, seg)?;
    }

    match (cur, last) {
        (Value::Object(map), Value::String(key)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (Value::Array(items), idx) if array_index(idx).is_some_and(|i| i < items.len()) => {
            if let Some(slot) = array_index(idx).and_then(|i| items.get_mut(i)) {
                *slot = value;
            }
            Ok(())
        }
        (other, idx) => Err(ExprError::BadIndex {
            target: type_name(other),
            index: display(idx),
        }),
    }
}

fn step_mut<'v>(cur: &'v mut Value, seg: &Value) -> Result<&'v mut Value, ExprError> {
    let target = type_name(cur);
    let found = match (cur, seg) {
        (Value::Object(map), Value::String(key)) => map.get_mut(key),
        (Value::Array(items), idx) => array_index(idx).and_then(|i| items.get_mut(i)),
        _ => None,
    };
    found.ok_or_else(|| ExprError::BadIndex {
        target,
        index: display(seg),
    })
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn number(v: &Value) -> Option<Num> {
    let Value::Number(n) = v else {
        return None;
    };
    match n.as_i64() {
        Some(i) => Some(Num::Int(i)),
        None => n.as_f64().map(Num::Float),
    }
}

fn float_value(f: f64) -> Result<Value, ExprError> {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        return Ok(Value::from(f as i64));
    }
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .ok_or(ExprError::NonFinite)
}

fn mismatch(op: BinaryOp, l: &Value, r: &Value) -> ExprError {
    ExprError::TypeMismatch {
        op: op.symbol(),
        lhs: type_name(l),
        rhs: type_name(r),
    }
}

/// Render a value the way it appears inside a string (templates, concatenation).
pub fn display(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => objects_eq(a, b),
        _ => false,
    }
}

fn objects_eq(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(k, v)| b.get(k).map(|bv| json_eq(v, bv)).unwrap_or(false))
}

fn json_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::{evaluate, execute};
    use serde_json::json;

    fn ctx(v: Value) -> Context {
        Context::from_value(v).unwrap()
    }

    #[test]
    fn arithmetic_keeps_integers_exact() {
        let c = Context::new();
        assert_eq!(evaluate("1 + 2 * 3", &c).unwrap(), json!(7));
        assert_eq!(evaluate("7 / 2", &c).unwrap(), json!(3.5));
        assert_eq!(evaluate("8 / 2", &c).unwrap(), json!(4));
        assert_eq!(evaluate("7 % 3", &c).unwrap(), json!(1));
        assert_eq!(evaluate("-(2 - 5)", &c).unwrap(), json!(3));
        assert_eq!(evaluate("1 / 0", &c), Err(ExprError::DivisionByZero));
    }

    #[test]
    fn plus_concatenates_strings_and_lists() {
        let c = ctx(json!({"name": "bob"}));
        assert_eq!(evaluate("'hi ' + name", &c).unwrap(), json!("hi bob"));
        assert_eq!(evaluate("'n' + 1", &c).unwrap(), json!("n1"));
        assert_eq!(evaluate("[1] + [2, 3]", &c).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn paths_and_missing_keys() {
        let c = ctx(json!({"a": {"b": [10, 20]}}));
        assert_eq!(evaluate("a.b[1]", &c).unwrap(), json!(20));
        assert_eq!(evaluate("a['b'][0]", &c).unwrap(), json!(10));
        assert_eq!(evaluate("a.missing", &c).unwrap(), Value::Null);
        assert_eq!(evaluate("a.b[5]", &c).unwrap(), Value::Null);
        assert_eq!(
            evaluate("nope", &c),
            Err(ExprError::UndefinedVariable("nope".into()))
        );
    }

    #[test]
    fn context_root_addresses_all_variables() {
        let c = ctx(json!({"x": 1}));
        assert_eq!(evaluate("context['x']", &c).unwrap(), json!(1));
        assert_eq!(evaluate("'x' in context", &c).unwrap(), json!(true));
    }

    #[test]
    fn event_type_is_visible_but_not_a_variable() {
        let mut c = Context::new();
        assert!(evaluate("event_type", &c).is_err());
        c.set_event_type(Some("pre_delete"));
        assert_eq!(evaluate("event_type == 'pre_delete'", &c).unwrap(), json!(true));
        assert!(c.vars().is_empty());
    }

    #[test]
    fn logic_short_circuits() {
        let c = ctx(json!({"flag": false}));
        assert_eq!(evaluate("flag && missing", &c).unwrap(), json!(false));
        assert_eq!(evaluate("!flag || missing", &c).unwrap(), json!(true));
        assert_eq!(evaluate("not flag and 1 < 2", &c).unwrap(), json!(true));
    }

    #[test]
    fn membership_and_comparisons() {
        let c = ctx(json!({"xs": [1, 2], "m": {"k": 1}}));
        assert_eq!(evaluate("2 in xs", &c).unwrap(), json!(true));
        assert_eq!(evaluate("'k' in m", &c).unwrap(), json!(true));
        assert_eq!(evaluate("'ell' in 'hello'", &c).unwrap(), json!(true));
        assert_eq!(evaluate("'a' < 'b'", &c).unwrap(), json!(true));
        assert_eq!(evaluate("1 == 1.0", &c).unwrap(), json!(true));
        assert!(matches!(
            evaluate("xs < 1", &c),
            Err(ExprError::TypeMismatch { op: "<", .. })
        ));
    }

    #[test]
    fn builtin_functions() {
        let c = ctx(json!({"m": {"a": 1, "b": 2}}));
        assert_eq!(evaluate("len(m)", &c).unwrap(), json!(2));
        assert_eq!(evaluate("keys(m)", &c).unwrap(), json!(["a", "b"]));
        assert_eq!(evaluate("values(m)", &c).unwrap(), json!([1, 2]));
        assert_eq!(
            evaluate("exec('rm')", &c),
            Err(ExprError::UnknownFunction("exec".into()))
        );
    }

    #[test]
    fn compound_assignment_updates_context() {
        let mut c = ctx(json!({"result": 1, "item": 4}));
        assert_eq!(execute("result += item", &mut c).unwrap(), json!(5));
        assert_eq!(execute("result -= 2", &mut c).unwrap(), json!(3));
        assert_eq!(c.get("result"), Some(&json!(3)));
    }

    #[test]
    fn assignment_through_context_index() {
        let mut c = ctx(json!({"item": {"key": "color", "value": "red"}}));
        execute("context[item.key] = item.value", &mut c).unwrap();
        assert_eq!(c.get("color"), Some(&json!("red")));
    }

    #[test]
    fn assignment_into_nested_mapping() {
        let mut c = ctx(json!({"cfg": {"inner": {}}}));
        execute("cfg.inner.level = 3", &mut c).unwrap();
        assert_eq!(c.get("cfg"), Some(&json!({"inner": {"level": 3}})));
        assert!(matches!(
            execute("cfg.absent.level = 1", &mut c),
            Err(ExprError::BadIndex { .. })
        ));
    }

    #[test]
    fn truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(""), json!([]), json!({})] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!("false"), json!([0]), json!({"a": 0})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn loose_false_matches_guard_skipping() {
        for skip in [
            json!(false),
            json!(0),
            json!(0.0),
            json!(""),
            json!("0"),
            json!(" 0.0 "),
            json!([]),
            json!([0]),
            json!(["0"]),
            json!([null]),
        ] {
            assert!(is_loosely_false(&skip), "{skip} should skip");
        }
        for run in [json!(null), json!({}), json!(true), json!("false"), json!([false]), json!([1, 2])] {
            assert!(!is_loosely_false(&run), "{run} should run");
        }
    }
}
