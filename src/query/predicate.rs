//! Filter rule compilation.
//!
//! Each rule becomes a boolean SQL fragment over the task alias `t`. Rules
//! whose field/operator combination has no meaning compile to `None`; the
//! caller drops them and the drop is counted.

use super::payload::{FilterField, FilterRule, NativeField, Operator};
use super::{Clause, placeholders, record_dropped_rule};
use crate::db::tasks::normalize_due_date;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

/// Compile every rule, skipping the ones that compile to nothing.
pub fn compile_rules(rules: &[FilterRule], workspace_id: &str) -> Vec<Clause> {
    rules
        .iter()
        .filter_map(|rule| match compile_rule(rule, workspace_id) {
            Ok(clause) => Some(clause),
            Err(reason) => {
                record_dropped_rule(&rule.field.wire_name(), rule.op, reason);
                None
            }
        })
        .collect()
}

/// Compile one rule. The error is a short reason for the drop.
pub fn compile_rule(rule: &FilterRule, workspace_id: &str) -> Result<Clause, &'static str> {
    let value = rule.value.as_ref().unwrap_or(&Value::Null);
    match &rule.field {
        FilterField::Native(NativeField::AssigneeId) => compile_assignee(rule.op, value),
        FilterField::Native(field) => match field.column() {
            Some(column) => compile_native(*field, column, rule.op, value),
            None => Err("field has no column"),
        },
        FilterField::Custom(definition_id) => {
            compile_custom(definition_id, rule.op, value, workspace_id)
        }
        FilterField::Unknown(_) => Err("unknown field"),
    }
}

/// Bind a JSON scalar as a column value. Arrays and objects are not scalars.
fn scalar_param(field: NativeField, value: &Value) -> Option<SqlValue> {
    match value {
        Value::String(s) => {
            if field == NativeField::DueDate {
                if let Some(normalized) = normalize_due_date(s) {
                    return Some(SqlValue::Text(normalized));
                }
            }
            Some(SqlValue::Text(s.clone()))
        }
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real)),
        Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Text form of a JSON scalar as SQLite renders `CAST(json_extract(..) AS TEXT)`.
fn text_param(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Values for `in`/`not_in`. A lone scalar counts as a one-element list and
/// nulls inside the list are ignored.
fn list_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().filter(|v| !v.is_null()).collect(),
        Value::Null => Vec::new(),
        scalar => vec![scalar],
    }
}

fn comparison_sql(op: Operator) -> Option<&'static str> {
    match op {
        Operator::Eq => Some("="),
        Operator::Ne => Some("!="),
        Operator::Lt => Some("<"),
        Operator::Lte => Some("<="),
        Operator::Gt => Some(">"),
        Operator::Gte => Some(">="),
        _ => None,
    }
}

/// `name`, `status`, `priority` and `due_date`.
fn compile_native(
    field: NativeField,
    column: &str,
    op: Operator,
    value: &Value,
) -> Result<Clause, &'static str> {
    match op {
        Operator::IsEmpty => Ok(Clause::raw(format!(
            "({col} IS NULL OR {col} = '')",
            col = column
        ))),
        Operator::IsNotEmpty => Ok(Clause::raw(format!(
            "({col} IS NOT NULL AND {col} != '')",
            col = column
        ))),
        Operator::Eq if value.is_null() => Ok(Clause::raw(format!("{} IS NULL", column))),
        Operator::Ne if value.is_null() => Ok(Clause::raw(format!("{} IS NOT NULL", column))),
        Operator::Contains => {
            let needle = text_param(value).ok_or("contains needs a scalar value")?;
            Ok(Clause::new(
                format!("instr(lower({}), lower(?)) > 0", column),
                vec![SqlValue::Text(needle)],
            ))
        }
        Operator::In | Operator::NotIn => {
            let params = list_items(value)
                .into_iter()
                .map(|v| scalar_param(field, v).ok_or("list items must be scalars"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(membership(column, op == Operator::NotIn, params))
        }
        cmp => {
            let sql_op = comparison_sql(cmp).ok_or("unsupported operator")?;
            let param = scalar_param(field, value).ok_or("comparison needs a scalar value")?;
            Ok(Clause::new(
                format!("{} {} ?", column, sql_op),
                vec![param],
            ))
        }
    }
}

/// `expr IN (..)` / `expr NOT IN (..)`. An empty set matches nothing for
/// `in` and everything for `not_in`.
fn membership(expr: &str, negated: bool, params: Vec<SqlValue>) -> Clause {
    if params.is_empty() {
        return Clause::raw(if negated { "1" } else { "0" });
    }
    let keyword = if negated { "NOT IN" } else { "IN" };
    Clause::new(
        format!("{} {} ({})", expr, keyword, placeholders(params.len())),
        params,
    )
}

const ASSIGNEE_EXISTS: &str =
    "EXISTS (SELECT 1 FROM task_assignees ta WHERE ta.task_id = t.id";

/// `assignee_id` is a link table, so every operator is an existence check.
fn compile_assignee(op: Operator, value: &Value) -> Result<Clause, &'static str> {
    match op {
        Operator::IsEmpty => Ok(Clause::raw(format!("{})", ASSIGNEE_EXISTS)).negate()),
        Operator::IsNotEmpty => Ok(Clause::raw(format!("{})", ASSIGNEE_EXISTS))),
        Operator::Eq | Operator::Ne => {
            let user_id = text_param(value).ok_or("assignee comparison needs a user id")?;
            let exists = Clause::new(
                format!("{} AND ta.user_id = ?)", ASSIGNEE_EXISTS),
                vec![SqlValue::Text(user_id)],
            );
            Ok(if op == Operator::Ne {
                exists.negate()
            } else {
                exists
            })
        }
        Operator::In | Operator::NotIn => {
            let user_ids = list_items(value)
                .into_iter()
                .map(|v| text_param(v).map(SqlValue::Text).ok_or("assignee ids must be scalars"))
                .collect::<Result<Vec<_>, _>>()?;
            if user_ids.is_empty() {
                return Ok(Clause::raw(if op == Operator::NotIn { "1" } else { "0" }));
            }
            let exists = Clause::new(
                format!(
                    "{} AND ta.user_id IN ({}))",
                    ASSIGNEE_EXISTS,
                    placeholders(user_ids.len())
                ),
                user_ids,
            );
            Ok(if op == Operator::NotIn {
                exists.negate()
            } else {
                exists
            })
        }
        _ => Err("operator not supported for assignee_id"),
    }
}

/// Extracted custom field value as text, or NULL when the task has no row.
const CUSTOM_VALUE: &str = "CAST((SELECT json_extract(cv.value, '$.value') \
     FROM custom_field_values cv \
     WHERE cv.task_id = t.id AND cv.field_definition_id = ?) AS TEXT)";

/// `cf_<id>` rules. The value is read through a per-row subquery and compared
/// as text. Every predicate is guarded by the definition belonging to the
/// scope workspace, so foreign or unknown ids match nothing.
fn compile_custom(
    definition_id: &str,
    op: Operator,
    value: &Value,
    workspace_id: &str,
) -> Result<Clause, &'static str> {
    let field = || SqlValue::Text(definition_id.to_string());

    let predicate = match op {
        // Missing row, null value and empty string are all empty.
        Operator::IsEmpty => Clause::new(
            format!("({v} IS NULL OR {v} = '')", v = CUSTOM_VALUE),
            vec![field(), field()],
        ),
        Operator::IsNotEmpty => Clause::new(
            format!("({v} IS NOT NULL AND {v} != '')", v = CUSTOM_VALUE),
            vec![field(), field()],
        ),
        Operator::Eq if value.is_null() => {
            Clause::new(format!("{} IS NULL", CUSTOM_VALUE), vec![field()])
        }
        Operator::Ne if value.is_null() => {
            Clause::new(format!("{} IS NOT NULL", CUSTOM_VALUE), vec![field()])
        }
        Operator::Contains => {
            let needle = text_param(value).ok_or("contains needs a scalar value")?;
            Clause::new(
                format!("instr(lower({}), lower(?)) > 0", CUSTOM_VALUE),
                vec![field(), SqlValue::Text(needle)],
            )
        }
        Operator::In | Operator::NotIn => {
            let items = list_items(value)
                .into_iter()
                .map(|v| text_param(v).map(SqlValue::Text).ok_or("list items must be scalars"))
                .collect::<Result<Vec<_>, _>>()?;
            if items.is_empty() {
                Clause::raw(if op == Operator::NotIn { "1" } else { "0" })
            } else {
                let mut params = vec![field()];
                let sql = format!(
                    "{} {} ({})",
                    CUSTOM_VALUE,
                    if op == Operator::NotIn { "NOT IN" } else { "IN" },
                    placeholders(items.len())
                );
                params.extend(items);
                Clause::new(sql, params)
            }
        }
        cmp => {
            let sql_op = comparison_sql(cmp).ok_or("unsupported operator")?;
            let text = text_param(value).ok_or("comparison needs a scalar value")?;
            Clause::new(
                format!("{} {} ?", CUSTOM_VALUE, sql_op),
                vec![field(), SqlValue::Text(text)],
            )
        }
    };

    let mut params = vec![field(), SqlValue::Text(workspace_id.to_string())];
    params.extend(predicate.params);
    Ok(Clause::new(
        format!(
            "(EXISTS (SELECT 1 FROM custom_field_definitions cd \
             WHERE cd.id = ? AND cd.workspace_id = ?) AND {})",
            predicate.sql
        ),
        params,
    ))
}
