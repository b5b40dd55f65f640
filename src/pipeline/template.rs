//! Local rendering of simple answers.
//!
//! When the generated plan says no elaboration is needed, the answer is built
//! by filling `{{column}}` placeholders from a single-row result, skipping
//! the second model call. Anything that does not fit those rules falls back
//! to the interpreter.

use crate::domain::{is_identifier_column, Answer, AnswerPlan, QueryResult};

/// Fill `template` from the only row of `result`.
///
/// Returns `None` unless there is exactly one row, at least one placeholder,
/// and every placeholder names a non-null, non-identifier column.
pub fn render(template: &str, result: &QueryResult) -> Option<String> {
    if result.row_count() != 1 {
        return None;
    }
    let row = &result.rows[0];

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    let mut placeholders = 0;

    while let Some(open) = rest.find("{{") {
        rendered.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open.find("}}")?;
        let name = after_open[..close].trim();

        if name.is_empty() || is_identifier_column(name) {
            return None;
        }
        let value = row.get(result.column_index(name)?)?;
        if value.is_null() {
            return None;
        }

        rendered.push_str(&value.to_string());
        placeholders += 1;
        rest = &after_open[close + 2..];
    }
    rendered.push_str(rest);

    if placeholders == 0 {
        return None;
    }
    Some(rendered)
}

/// Answer from the plan's template, when the plan allows it
pub fn answer_from_plan(plan: &AnswerPlan, result: &QueryResult) -> Option<Answer> {
    if plan.requires_elaboration {
        return None;
    }
    let template = plan.answer_template.as_deref()?;
    render(template, result).and_then(Answer::new)
}
