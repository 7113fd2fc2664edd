//! Script text parsing.

use crate::{legacy_positional, ScriptCommand, ScriptError, ScriptResult};

/// Parse a whole script: one command per non-blank, non-comment line.
pub fn parse_script(text: &str) -> ScriptResult<Vec<ScriptCommand>> {
    let mut commands = Vec::new();
    for (i, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        commands.push(parse_command(line, i + 1)?);
    }
    Ok(commands)
}

/// Parse a single `Name(...)` command line.
pub fn parse_command(line: &str, lineno: usize) -> ScriptResult<ScriptCommand> {
    let open = line.find('(').ok_or_else(|| ScriptError::Malformed {
        line: lineno,
        text: line.to_string(),
    })?;
    let name = line[..open].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(ScriptError::Malformed {
            line: lineno,
            text: line.to_string(),
        });
    }
    let rest = &line[open + 1..];
    let close = rest.rfind(')').ok_or(ScriptError::UnterminatedParen { line: lineno })?;
    if !rest[close + 1..].trim().is_empty() {
        return Err(ScriptError::Malformed {
            line: lineno,
            text: line.to_string(),
        });
    }
    let body = rest[..close].trim();

    let fields = split_fields(body, lineno)?;
    if fields.is_empty() {
        return Ok(ScriptCommand::new(name));
    }

    // Legacy positional form: a non-empty parameter list with no '='.
    let named = fields.iter().any(|f| f.contains('='));
    if !named {
        return translate_legacy(name, &fields, lineno);
    }

    let mut command = ScriptCommand::new(name);
    for field in fields {
        let eq = field.find('=').ok_or_else(|| ScriptError::Malformed {
            line: lineno,
            text: field.clone(),
        })?;
        let pname = field[..eq].trim().to_string();
        let value = unquote(field[eq + 1..].trim());
        if pname.is_empty() {
            return Err(ScriptError::Malformed {
                line: lineno,
                text: field,
            });
        }
        command.params.push((pname, value));
    }
    Ok(command)
}

/// Split the parameter body on commas, honoring double-quoted values.
fn split_fields(body: &str, lineno: usize) -> ScriptResult<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in body.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                if !current.trim().is_empty() {
                    fields.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(ScriptError::UnterminatedQuote { line: lineno });
    }
    if !current.trim().is_empty() {
        fields.push(current.trim().to_string());
    }
    Ok(fields)
}

fn unquote(value: &str) -> String {
    let v = value.trim();
    if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
        v[1..v.len() - 1].to_string()
    } else {
        v.to_string()
    }
}

/// Translate a legacy positional command into canonical named form.
fn translate_legacy(name: &str, fields: &[String], lineno: usize) -> ScriptResult<ScriptCommand> {
    let (canonical, positions) =
        legacy_positional(name).ok_or_else(|| ScriptError::UnknownLegacyForm {
            line: lineno,
            name: name.to_string(),
        })?;
    if fields.len() > positions.len() {
        return Err(ScriptError::TooManyPositional {
            line: lineno,
            name: name.to_string(),
            max: positions.len(),
        });
    }
    let mut command = ScriptCommand::new(canonical);
    for (pname, value) in positions.iter().zip(fields) {
        command
            .params
            .push((pname.to_string(), unquote(value)));
    }
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_parameters() {
        let cmd = parse_command("Copy(TSID=A.Flow.Day,NewTSID=B.Flow.Day)", 1).unwrap();
        assert_eq!(cmd.name, "Copy");
        assert_eq!(cmd.param("TSID"), Some("A.Flow.Day"));
        assert_eq!(cmd.param("NewTSID"), Some("B.Flow.Day"));
    }

    #[test]
    fn quoted_values_keep_commas_and_parens() {
        let cmd =
            parse_command(r#"NewTable(TableID=t,Columns="TSID,Min,Max (cfs)")"#, 1).unwrap();
        assert_eq!(cmd.param("Columns"), Some("TSID,Min,Max (cfs)"));
    }

    #[test]
    fn empty_parameter_list() {
        let cmd = parse_command("RunChecks()", 1).unwrap();
        assert_eq!(cmd.name, "RunChecks");
        assert!(cmd.params.is_empty());
    }

    #[test]
    fn legacy_positional_is_translated() {
        let cmd = parse_command("scale(A.Flow.Day,2.0)", 3).unwrap();
        assert_eq!(cmd.name, "Scale");
        assert_eq!(cmd.param("TSID"), Some("A.Flow.Day"));
        assert_eq!(cmd.param("ScaleValue"), Some("2.0"));
    }

    #[test]
    fn legacy_with_fewer_values_than_positions() {
        let cmd = parse_command("lagK(A.Flow.Day,2)", 1).unwrap();
        assert_eq!(cmd.name, "LagK");
        assert_eq!(cmd.param("Lag"), Some("2"));
        assert_eq!(cmd.param("K"), None);
    }

    #[test]
    fn unknown_legacy_form_is_an_error() {
        let err = parse_command("mystery(A,B)", 7).unwrap_err();
        assert_eq!(
            err,
            ScriptError::UnknownLegacyForm {
                line: 7,
                name: "mystery".to_string()
            }
        );
    }

    #[test]
    fn malformed_lines() {
        assert!(parse_command("NoParens", 1).is_err());
        assert!(parse_command("Name(unclosed", 1).is_err());
        assert!(parse_command(r#"Name(A="unterminated)"#, 1).is_err());
        assert!(parse_command("Name() trailing", 1).is_err());
    }

    #[test]
    fn script_skips_comments_and_blank_lines() {
        let text = "\n# build inputs\nNewTimeSeries(NewTSID=A.Flow.Day)\n\nCopy(TSID=A.*,NewTSID=B.Flow.Day)\n";
        let commands = parse_script(text).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].name, "NewTimeSeries");
        assert_eq!(commands[1].name, "Copy");
    }

    #[test]
    fn error_carries_line_number() {
        let text = "NewTimeSeries(NewTSID=A.Flow.Day)\nbroken line\n";
        let err = parse_script(text).unwrap_err();
        assert!(matches!(err, ScriptError::Malformed { line: 2, .. }));
    }
}
