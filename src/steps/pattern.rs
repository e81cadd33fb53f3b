use std::collections::BTreeMap;

use regex::Regex;
use thiserror::Error;

use crate::testing::assert::Failure;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("unclosed placeholder in step pattern '{pattern}'")]
    Unclosed { pattern: String },

    #[error("empty placeholder name in step pattern '{pattern}'")]
    EmptyName { pattern: String },

    #[error("unknown conversion ':{conversion}' in step pattern '{pattern}'")]
    UnknownConversion { pattern: String, conversion: String },

    #[error("placeholder '{name}' appears twice in step pattern '{pattern}'")]
    Duplicate { pattern: String, name: String },

    #[error("step pattern '{pattern}' did not compile: {reason}")]
    Regex { pattern: String, reason: String },
}

/// A step phrase with `{name}` (any text) and `{name:d}` (integer)
/// placeholders, matched against the whole step text.
#[derive(Debug, Clone)]
pub struct StepPattern {
    source: String,
    regex: Regex,
    names: Vec<String>,
    literal_len: usize,
}

impl StepPattern {
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let mut expression = String::from("^");
        let mut names: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut literal_len = 0;
        let mut rest = pattern;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let close = rest[open..].find('}').ok_or_else(|| PatternError::Unclosed {
                pattern: pattern.to_string(),
            })? + open;
            let placeholder = &rest[open + 1..close];
            let (name, conversion) = match placeholder.split_once(':') {
                Some((name, conversion)) => (name, Some(conversion)),
                None => (placeholder, None),
            };
            if name.is_empty() {
                return Err(PatternError::EmptyName {
                    pattern: pattern.to_string(),
                });
            }
            if names.iter().any(|known| known == name) {
                return Err(PatternError::Duplicate {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            let group = match conversion {
                None => "(.+?)",
                Some("d") => r"(-?\d+)",
                Some(other) => {
                    return Err(PatternError::UnknownConversion {
                        pattern: pattern.to_string(),
                        conversion: other.to_string(),
                    });
                }
            };

            literal_len += literal.chars().count();
            expression.push_str(&regex::escape(&literal));
            expression.push_str(group);
            literal.clear();
            names.push(name.to_string());
            rest = &rest[close + 1..];
        }
        literal.push_str(rest);
        literal_len += literal.chars().count();
        expression.push_str(&regex::escape(&literal));
        expression.push('$');

        let regex = Regex::new(&expression).map_err(|e| PatternError::Regex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
            names,
            literal_len,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Characters of fixed text; the more a pattern spells out, the more
    /// specific it is.
    pub fn literal_len(&self) -> usize {
        self.literal_len
    }

    pub fn matches(&self, text: &str) -> Option<StepArgs> {
        let captures = self.regex.captures(text)?;
        let values = self
            .names
            .iter()
            .enumerate()
            .filter_map(|(index, name)| {
                let value = captures.get(index + 1)?;
                Some((name.clone(), value.as_str().to_string()))
            })
            .collect();
        Some(StepArgs { values })
    }
}

/// Placeholder values captured from one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArgs {
    values: BTreeMap<String, String>,
}

impl StepArgs {
    pub fn text(&self, name: &str) -> Result<&str, Failure> {
        self.values
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Failure::assertion(format!("step has no argument '{name}'")))
    }

    pub fn int(&self, name: &str) -> Result<i64, Failure> {
        let raw = self.text(name)?;
        raw.parse()
            .map_err(|_| Failure::assertion(format!("argument '{name}' is not an integer: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_placeholders_capture_quoted_titles() {
        let pattern = StepPattern::compile("the user deletes the todo with title '{todo_title}'").unwrap();
        let args = pattern.matches("the user deletes the todo with title 'Pay Bills'").unwrap();

        assert_eq!(args.text("todo_title").unwrap(), "Pay Bills");
        assert!(pattern.matches("the user deletes the todo with title 'Pay Bills' twice").is_none());
    }

    #[test]
    fn integer_placeholders_only_match_digits() {
        let pattern = StepPattern::compile("the status code {status_code:d} will be received").unwrap();

        let args = pattern.matches("the status code 404 will be received").unwrap();
        assert_eq!(args.int("status_code").unwrap(), 404);
        assert!(pattern.matches("the status code four will be received").is_none());
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let pattern = StepPattern::compile("a (list) of {count:d} todos?").unwrap();
        assert!(pattern.matches("a (list) of 3 todos?").is_some());
        assert!(pattern.matches("a list of 3 todos").is_none());
    }

    #[test]
    fn literal_len_counts_fixed_text() {
        let short = StepPattern::compile("the todo has new title '{new_title}'").unwrap();
        let long = StepPattern::compile(
            "the todo has new title '{new_title}', doneStatus '{done_status}' and new description '{description}'",
        )
        .unwrap();
        assert_eq!(short.literal_len(), "the todo has new title ''".len());
        assert!(long.literal_len() > short.literal_len());
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        assert!(matches!(StepPattern::compile("title '{title"), Err(PatternError::Unclosed { .. })));
        assert!(matches!(StepPattern::compile("title '{}'"), Err(PatternError::EmptyName { .. })));
        assert!(matches!(
            StepPattern::compile("id {id:x}"),
            Err(PatternError::UnknownConversion { .. })
        ));
        assert!(matches!(
            StepPattern::compile("{a} and {a}"),
            Err(PatternError::Duplicate { .. })
        ));
    }

    #[test]
    fn missing_argument_is_a_failure() {
        let args = StepArgs::default();
        assert_eq!(args.text("title").unwrap_err().to_string(), "step has no argument 'title'");
    }
}
