//! Stateless tag lexer over a character buffer.
//!
//! Tags look like `<[prefix]name[params]>` or `</[prefix]name>`. The scanner only finds
//! candidates; whether a tag means anything is decided later by a processor.

/// Prefix characters that select a processor family.
pub const TAG_PREFIXES: [char; 4] = ['?', '@', '+', '-'];

/// Whether a tag opens or closes a span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TagKind {
    /// `<name ...>`
    Open,
    /// `</name>`
    Close,
}

/// One syntactically well-formed tag found in raw text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// Family prefix, `None` for unprefixed tags.
    pub prefix: Option<char>,
    /// Tag name without prefix or slash.
    pub name: String,
    /// Open or close.
    pub kind: TagKind,
    /// Index of `<` in the raw buffer.
    pub raw_start: usize,
    /// Index one past `>` in the raw buffer.
    pub raw_end: usize,
    /// Everything between the name and `>`, unparsed.
    pub parameter_text: String,
}

impl Tag {
    /// Length of the tag in characters, brackets included.
    pub fn char_len(&self) -> usize {
        self.raw_end - self.raw_start
    }
}

/// Find the next well-formed tag at or after `from`.
///
/// A candidate that fails to parse is skipped; scanning resumes after its `<` so a stray `<` in
/// prose never hides a later tag. Every character is inspected a bounded number of times.
pub fn next_tag(text: &[char], from: usize) -> Option<Tag> {
    let mut i = from;
    while i < text.len() {
        let Some(open) = text[i..].iter().position(|&c| c == '<').map(|p| p + i) else {
            return None;
        };

        let mut j = open + 1;
        while j < text.len() && text[j] != '>' && text[j] != '<' {
            j += 1;
        }
        if j >= text.len() {
            // No `>` left anywhere, so no later `<` can close either.
            return None;
        }
        if text[j] == '<' {
            i = j;
            continue;
        }

        if let Some(tag) = parse_body(text, open, j) {
            return Some(tag);
        }
        // Nothing between `open` and `j` is a `<`, so the next candidate starts after `>`.
        i = j + 1;
    }
    None
}

/// Parse `text[open+1..close]` where `text[open] == '<'` and `text[close] == '>'`.
fn parse_body(text: &[char], open: usize, close: usize) -> Option<Tag> {
    let body = &text[open + 1..close];
    let mut k = 0usize;

    let kind = if body.first() == Some(&'/') {
        k += 1;
        TagKind::Close
    } else {
        TagKind::Open
    };

    let prefix = match body.get(k) {
        Some(c) if TAG_PREFIXES.contains(c) => {
            k += 1;
            Some(*c)
        }
        _ => None,
    };

    let name_start = k;
    while k < body.len() && !body[k].is_whitespace() && body[k] != '=' {
        k += 1;
    }
    if k == name_start {
        return None;
    }

    let name: String = body[name_start..k].iter().collect();
    let parameter_text: String = body[k..].iter().collect();

    if kind == TagKind::Close && !parameter_text.trim().is_empty() {
        return None;
    }

    Some(Tag {
        prefix,
        name,
        kind,
        raw_start: open,
        raw_end: close + 1,
        parameter_text,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/markup/scanner.rs"]
mod tests;
