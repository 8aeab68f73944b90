//! `{placeholder}` interpolation for task descriptions.
//!
//! Only `{identifier}` sequences are placeholders. Any other brace, such as
//! the ones in an inline JSON example, is copied through untouched.

use std::collections::HashMap;

use crate::error::TemplateError;

pub fn interpolate(
    template: &str,
    vars: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let ident_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if ident_len == 0 {
            out.push('{');
            offset += open + 1;
            rest = after;
            continue;
        }

        let name = &after[..ident_len];
        match after[ident_len..].chars().next() {
            Some('}') => {
                let value = vars
                    .get(name)
                    .ok_or_else(|| TemplateError::MissingVariable(name.to_string()))?;
                out.push_str(value);
                let consumed = open + 1 + ident_len + 1;
                offset += consumed;
                rest = &rest[consumed..];
            }
            None => return Err(TemplateError::Unterminated(offset + open)),
            Some(_) => {
                out.push('{');
                offset += open + 1;
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}
