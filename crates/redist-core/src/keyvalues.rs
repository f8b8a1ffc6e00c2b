//! Valve KeyValues (text) parser.
//!
//! Steam stores app manifests (`appmanifest_<id>.acf`) in this format:
//!
//! ```text
//! "AppState"
//! {
//!     "appid"     "304930"
//!     "buildid"   "18694317"
//! }
//! ```
//!
//! Only what the tool needs is supported: quoted and bare tokens, nested
//! objects, `//` comments, `[$PLATFORM]` conditionals (ignored) and the
//! `\n \t \\ \"` escapes.

use thiserror::Error;

/// Parse failure with the 1-based line it occurred on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("KeyValues parse error at line {line}: {message}")]
pub struct KeyValuesError {
    /// Line of the offending token.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

/// A value: either a string or a nested object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvValue {
    /// Leaf value.
    String(String),
    /// Nested `{ ... }` block.
    Object(KvObject),
}

impl KvValue {
    /// The string value, if this is a leaf.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Object(_) => None,
        }
    }

    /// The nested object, if this is a block.
    pub fn as_object(&self) -> Option<&KvObject> {
        match self {
            Self::Object(o) => Some(o),
            Self::String(_) => None,
        }
    }
}

/// Ordered key/value pairs. Keys may repeat; lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvObject {
    entries: Vec<(String, KvValue)>,
}

impl KvObject {
    /// First value whose key matches `key`, ignoring ASCII case.
    pub fn get(&self, key: &str) -> Option<&KvValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// String value at `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(KvValue::as_str)
    }

    /// Object value at `key`.
    pub fn get_object(&self, key: &str) -> Option<&KvObject> {
        self.get(key).and_then(KvValue::as_object)
    }
}

/// Parse a whole document. The returned object holds the top-level pairs
/// (for an app manifest, a single `AppState` block).
///
/// # Errors
///
/// Returns a [`KeyValuesError`] on unbalanced braces, unterminated strings or
/// a key without a value.
pub fn parse(text: &str) -> Result<KvObject, KeyValuesError> {
    let tokens = tokenize(text)?;
    let mut pos = 0;
    let root = parse_object(&tokens, &mut pos, false)?;
    Ok(root)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Open,
    Close,
}

fn parse_object(
    tokens: &[(Token, usize)],
    pos: &mut usize,
    nested: bool,
) -> Result<KvObject, KeyValuesError> {
    let mut object = KvObject::default();

    while let Some((token, line)) = tokens.get(*pos) {
        *pos += 1;
        let key = match token {
            Token::Close if nested => return Ok(object),
            Token::Close => return Err(error(*line, "unexpected '}'")),
            Token::Open => return Err(error(*line, "expected key, found '{'")),
            Token::Text(key) => key.clone(),
        };

        let value = match tokens.get(*pos) {
            Some((Token::Text(value), _)) => {
                *pos += 1;
                KvValue::String(value.clone())
            }
            Some((Token::Open, _)) => {
                *pos += 1;
                KvValue::Object(parse_object(tokens, pos, true)?)
            }
            Some((Token::Close, line)) => {
                return Err(error(*line, &format!("key '{key}' has no value")));
            }
            None => return Err(error(*line, &format!("key '{key}' has no value"))),
        };

        object.entries.push((key, value));
    }

    if nested {
        let line = tokens.last().map_or(1, |(_, line)| *line);
        return Err(error(line, "missing closing '}'"));
    }
    Ok(object)
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, KeyValuesError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '{' => tokens.push((Token::Open, line)),
            '}' => tokens.push((Token::Close, line)),
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '[' => {
                // Platform conditional such as [$WIN32]; evaluated as always true.
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                }
            }
            '"' => {
                let start = line;
                let mut value = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some(other) => value.push(other),
                            None => break,
                        },
                        '\n' => {
                            line += 1;
                            value.push('\n');
                        }
                        other => value.push(other),
                    }
                }
                if !closed {
                    return Err(error(start, "unterminated string"));
                }
                tokens.push((Token::Text(value), start));
            }
            other => {
                let mut value = String::from(other);
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
                tokens.push((Token::Text(value), line));
            }
        }
    }

    Ok(tokens)
}

fn error(line: usize, message: &str) -> KeyValuesError {
    KeyValuesError {
        line,
        message: message.to_string(),
    }
}
