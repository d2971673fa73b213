use serde::{Deserialize, Serialize};

/// Textual repairs for near-JSON, least invasive first. Every repair leaves
/// the contents of double-quoted strings untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStep {
    MissingSeparators,
    TrailingSeparators,
    SingleQuotes,
    Literals,
}

impl RepairStep {
    pub const SEQUENCE: [RepairStep; 4] = [
        Self::MissingSeparators,
        Self::TrailingSeparators,
        Self::SingleQuotes,
        Self::Literals,
    ];

    pub fn apply(self, text: &str) -> String {
        match self {
            Self::MissingSeparators => insert_missing_separators(text),
            Self::TrailingSeparators => remove_trailing_separators(text),
            Self::SingleQuotes => normalize_single_quotes(text),
            Self::Literals => normalize_literals(text),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingSeparators => "missing_separators",
            Self::TrailingSeparators => "trailing_separators",
            Self::SingleQuotes => "single_quotes",
            Self::Literals => "literals",
        }
    }
}

fn is_bare_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '-' | '+' | '.' | '_')
}

/// Copies a quoted string starting at `chars[start]` (the opening quote)
/// into `out` and returns the index just past the closing quote.
fn copy_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push(quote);
    let mut idx = start + 1;
    while idx < chars.len() {
        let ch = chars[idx];
        out.push(ch);
        idx += 1;
        if ch == '\\' {
            if let Some(&escaped) = chars.get(idx) {
                out.push(escaped);
                idx += 1;
            }
        } else if ch == quote {
            break;
        }
    }
    idx
}

/// A `'` opens a single-quoted string when it sits where a key or value can
/// start; after a bare word it is an apostrophe.
fn opens_single_quoted(out: &str) -> bool {
    matches!(
        out.trim_end().chars().last(),
        None | Some('{' | '[' | ',' | ':' | '"' | '\'' | '}' | ']')
    )
}

fn insert_missing_separators(text: &str) -> String {
    let chars = text.chars().collect::<Vec<char>>();
    let mut out = String::with_capacity(text.len() + 16);
    let mut after_value = false;
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        match ch {
            '"' => {
                if after_value {
                    out.push(',');
                }
                idx = copy_quoted(&chars, idx, &mut out);
                after_value = true;
                continue;
            }
            '\'' if opens_single_quoted(&out) => {
                if after_value {
                    out.push(',');
                }
                idx = copy_quoted(&chars, idx, &mut out);
                after_value = true;
                continue;
            }
            '{' | '[' => {
                if after_value {
                    out.push(',');
                }
                out.push(ch);
                after_value = false;
            }
            '}' | ']' => {
                out.push(ch);
                after_value = true;
            }
            ',' | ':' => {
                out.push(ch);
                after_value = false;
            }
            ch if ch.is_whitespace() => out.push(ch),
            ch if is_bare_char(ch) => {
                if after_value {
                    out.push(',');
                }
                while idx < chars.len() && is_bare_char(chars[idx]) {
                    out.push(chars[idx]);
                    idx += 1;
                }
                after_value = true;
                continue;
            }
            other => {
                out.push(other);
                after_value = false;
            }
        }
        idx += 1;
    }

    out
}

fn remove_trailing_separators(text: &str) -> String {
    let chars = text.chars().collect::<Vec<char>>();
    let mut out = String::with_capacity(text.len());
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        if ch == '"' {
            idx = copy_quoted(&chars, idx, &mut out);
            continue;
        }
        if ch == ',' {
            let next = chars[idx + 1..].iter().find(|next| !next.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                idx += 1;
                continue;
            }
        }
        out.push(ch);
        idx += 1;
    }

    out
}

fn normalize_single_quotes(text: &str) -> String {
    let chars = text.chars().collect::<Vec<char>>();
    let mut out = String::with_capacity(text.len());
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        if ch == '"' {
            idx = copy_quoted(&chars, idx, &mut out);
            continue;
        }
        if ch != '\'' {
            out.push(ch);
            idx += 1;
            continue;
        }

        out.push('"');
        idx += 1;
        while idx < chars.len() {
            let inner = chars[idx];
            idx += 1;
            match inner {
                '\'' => break,
                '\\' => match chars.get(idx) {
                    Some('\'') => {
                        out.push('\'');
                        idx += 1;
                    }
                    Some(&escaped) => {
                        out.push('\\');
                        out.push(escaped);
                        idx += 1;
                    }
                    None => out.push('\\'),
                },
                '"' => out.push_str("\\\""),
                other => out.push(other),
            }
        }
        out.push('"');
    }

    out
}

fn normalize_literals(text: &str) -> String {
    let chars = text.chars().collect::<Vec<char>>();
    let mut out = String::with_capacity(text.len());
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        if ch == '"' {
            idx = copy_quoted(&chars, idx, &mut out);
            continue;
        }
        if !is_bare_char(ch) {
            out.push(ch);
            idx += 1;
            continue;
        }

        let start = idx;
        while idx < chars.len() && is_bare_char(chars[idx]) {
            idx += 1;
        }
        let token = chars[start..idx].iter().collect::<String>();
        let replacement = match token.as_str() {
            "True" | "TRUE" => "true",
            "False" | "FALSE" => "false",
            "None" | "NULL" | "Null" | "nil" | "undefined" => "null",
            _ => token.as_str(),
        };
        out.push_str(replacement);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_separators_between_values_are_inserted() {
        assert_eq!(
            insert_missing_separators(r#"{"a":1 "b":2}"#),
            r#"{"a":1 ,"b":2}"#
        );
        assert_eq!(
            insert_missing_separators("{\"a\":\"x\"\n\"b\":[1] \"c\":{}}"),
            "{\"a\":\"x\"\n,\"b\":[1] ,\"c\":{}}"
        );
        assert_eq!(insert_missing_separators(r#"[{"a":1} {"a":2}]"#), r#"[{"a":1} ,{"a":2}]"#);
    }

    #[test]
    fn separator_repair_skips_single_quoted_strings() {
        assert_eq!(
            insert_missing_separators("{'a b': 'c d' 'e': 1}"),
            "{'a b': 'c d' ,'e': 1}"
        );
    }

    #[test]
    fn separator_repair_leaves_string_contents_alone() {
        let text = r#"{"a":"1 \"quoted\" 2", "b":true}"#;
        assert_eq!(insert_missing_separators(text), text);
    }

    #[test]
    fn trailing_separators_are_removed() {
        assert_eq!(
            remove_trailing_separators("{\"a\":[1,2,],\n\"b\":\"x,}\",\n}"),
            "{\"a\":[1,2],\n\"b\":\"x,}\"\n}"
        );
    }

    #[test]
    fn single_quotes_become_double_quotes() {
        assert_eq!(
            normalize_single_quotes(r#"{'a': 'say "hi"', 'b': 'it\'s', "c": "don't"}"#),
            r#"{"a": "say \"hi\"", "b": "it's", "c": "don't"}"#
        );
    }

    #[test]
    fn language_literals_are_normalized_outside_strings() {
        assert_eq!(
            normalize_literals(r#"{"a": True, "b": None, "c": "True", "d": Falsey}"#),
            r#"{"a": true, "b": null, "c": "True", "d": Falsey}"#
        );
    }
}
