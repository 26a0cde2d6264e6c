//! Prompt rendering
//!
//! Templates are static text with `{name}` placeholders. Rendering is a
//! single left-to-right pass, so text substituted into a placeholder is never
//! itself scanned for placeholders.

use serde::Serialize;

/// Substitute `{name}` placeholders; unknown braces are kept verbatim (pure function)
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let candidate = &rest[open + 1..];

        let substitution = candidate.find('}').and_then(|close| {
            let name = &candidate[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match substitution {
            Some((value, close)) => {
                rendered.push_str(value);
                rest = &candidate[close + 1..];
            }
            None => {
                rendered.push('{');
                rest = candidate;
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

/// Compact JSON for interpolation into prompt text
pub fn to_prompt_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
