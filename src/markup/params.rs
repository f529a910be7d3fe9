use std::collections::BTreeMap;

/// Parsed parameters of an opening tag.
///
/// `<wave=2 a=1 f="0.5">` has default `"2"` and values `{a: "1", f: "0.5"}`. The first token
/// without `=` (when no keyed value precedes it) is also taken as the default: `<wave 2 a=1>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TagParams {
    /// Anonymous default value.
    pub default: Option<String>,
    /// Keyed values. Bare flags (`<shake loud>` after a default) map to an empty string.
    pub values: BTreeMap<String, String>,
}

impl TagParams {
    /// Return `true` when neither a default nor any keyed value is present.
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.values.is_empty()
    }

    /// Look up a keyed value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up the first present key among `keys`.
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// Parse a keyed value as `f64`; `None` when missing or unparsable.
    pub fn get_f64(&self, keys: &[&str]) -> Option<f64> {
        self.get_any(keys).and_then(|v| v.parse().ok())
    }

    /// Parse the default value as `f64`.
    pub fn default_f64(&self) -> Option<f64> {
        self.default.as_deref().and_then(|v| v.parse().ok())
    }

    /// Read a boolean flag. A bare flag (empty value) counts as `true`.
    pub fn get_flag(&self, key: &str) -> Option<bool> {
        parse_bool(self.get(key)?)
    }
}

/// Boolean syntax accepted in tag parameters.
pub(crate) fn parse_bool(v: &str) -> Option<bool> {
    match v {
        "" | "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Why parameter text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("param error at char {offset}: {message}")]
pub struct ParamError {
    /// Character offset into the parameter text.
    pub offset: usize,
    /// Human-readable reason.
    pub message: String,
}

impl ParamError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Parse the text between a tag's name and its `>`.
pub fn parse_params(text: &str) -> Result<TagParams, ParamError> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = TagParams::default();
    let mut i = 0usize;

    if chars.first() == Some(&'=') {
        i = 1;
        let (value, next) = read_value(&chars, i)?;
        if value.is_empty() {
            return Err(ParamError::new(i, "expected a value after '='"));
        }
        out.default = Some(value);
        i = next;
    }

    let mut seen_keyed = false;
    loop {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        if is_quote(chars[i]) {
            let (value, next) = read_value(&chars, i)?;
            if out.default.is_some() || seen_keyed {
                return Err(ParamError::new(i, "quoted value without a key"));
            }
            out.default = Some(value);
            i = next;
            continue;
        }

        let key_start = i;
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '=' {
            if is_quote(chars[i]) {
                return Err(ParamError::new(i, "quote inside parameter key"));
            }
            i += 1;
        }
        let key: String = chars[key_start..i].iter().collect();

        if i < chars.len() && chars[i] == '=' {
            if key.is_empty() {
                return Err(ParamError::new(i, "'=' without a key"));
            }
            let (value, next) = read_value(&chars, i + 1)?;
            if value.is_empty() && !chars.get(i + 1).copied().is_some_and(is_quote) {
                return Err(ParamError::new(i + 1, format!("missing value for '{key}'")));
            }
            i = next;
            insert_unique(&mut out, key, value, key_start)?;
            seen_keyed = true;
        } else if out.default.is_none() && !seen_keyed {
            out.default = Some(key);
        } else {
            insert_unique(&mut out, key, String::new(), key_start)?;
        }
    }

    Ok(out)
}

fn insert_unique(
    out: &mut TagParams,
    key: String,
    value: String,
    offset: usize,
) -> Result<(), ParamError> {
    if out.values.contains_key(&key) {
        return Err(ParamError::new(offset, format!("duplicate key '{key}'")));
    }
    out.values.insert(key, value);
    Ok(())
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// Read a quoted or bare value starting at `i`. Returns the value and the index after it.
fn read_value(chars: &[char], i: usize) -> Result<(String, usize), ParamError> {
    match chars.get(i) {
        Some(&q) if is_quote(q) => {
            let Some(rel) = chars[i + 1..].iter().position(|&c| c == q) else {
                return Err(ParamError::new(i, "unterminated quoted value"));
            };
            let end = i + 1 + rel;
            let value: String = chars[i + 1..end].iter().collect();
            let next = end + 1;
            if chars.get(next).is_some_and(|c| !c.is_whitespace()) {
                return Err(ParamError::new(next, "expected whitespace after quoted value"));
            }
            Ok((value, next))
        }
        _ => {
            let mut j = i;
            while j < chars.len() && !chars[j].is_whitespace() {
                if is_quote(chars[j]) || chars[j] == '=' {
                    return Err(ParamError::new(j, "unexpected character in bare value"));
                }
                j += 1;
            }
            Ok((chars[i..j].iter().collect(), j))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/markup/params.rs"]
mod tests;
