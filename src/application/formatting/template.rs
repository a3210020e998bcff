//! `{placeholder}` substitution for sheet sections

use std::collections::HashMap;

use crate::application::errors::SheetError;

/// Values available to a template, keyed by placeholder name
pub type Values<'a> = HashMap<&'static str, &'a str>;

/// Replace every `{key}` in `template` with its value.
///
/// `{{` and `}}` produce literal braces. A key with no value, or a brace
/// that is not part of a placeholder or escape, is an error.
pub fn render(template: &str, values: &Values<'_>) -> Result<String, SheetError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut key = String::new();
                let mut closed = false;
                for (_, k) in chars.by_ref() {
                    if k == '}' {
                        closed = true;
                        break;
                    }
                    if k == '{' {
                        return Err(SheetError::UnbalancedBrace(pos));
                    }
                    key.push(k);
                }
                if !closed || key.is_empty() {
                    return Err(SheetError::UnbalancedBrace(pos));
                }
                let value = values
                    .get(key.as_str())
                    .ok_or(SheetError::UnknownPlaceholder(key))?;
                out.push_str(value);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(SheetError::UnbalancedBrace(pos));
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}
