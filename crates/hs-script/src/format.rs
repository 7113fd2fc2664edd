//! Canonical script text emission.

use crate::ScriptCommand;

/// Format a command in the canonical named-parameter form.
///
/// Values containing characters that would confuse the parser are quoted.
/// The legacy positional form is never emitted.
pub fn format_command(command: &ScriptCommand) -> String {
    let mut out = String::new();
    out.push_str(&command.name);
    out.push('(');
    for (i, (name, value)) in command.params.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(name);
        out.push('=');
        if needs_quoting(value) {
            out.push('"');
            out.push_str(value);
            out.push('"');
        } else {
            out.push_str(value);
        }
    }
    out.push(')');
    out
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| matches!(c, ',' | '"' | '=' | '(' | ')') || c.is_whitespace())
}
