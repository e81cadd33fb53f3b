use std::fmt::{self, Display};

use thiserror::Error;

use super::context::StepContext;
use super::pattern::{PatternError, StepArgs, StepPattern};
use crate::testing::assert::Failure;

/// Phase a step belongs to. `And`/`But` lines resolve to the keyword before
/// them when a feature is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Keyword {
    Given,
    When,
    Then,
}

impl Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Keyword::Given => "Given",
            Keyword::When => "When",
            Keyword::Then => "Then",
        };
        f.write_str(word)
    }
}

pub type StepHandler = fn(&mut StepContext<'_>, &StepArgs) -> Result<(), Failure>;

pub struct Binding {
    pub keyword: Keyword,
    pub pattern: StepPattern,
    pub handler: StepHandler,
    /// Skipped without running while the API is known to be down.
    pub requires_api: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("undefined step: {keyword} {text}")]
    Undefined { keyword: Keyword, text: String },

    #[error("ambiguous step: {keyword} {text} matches {patterns:?}")]
    Ambiguous {
        keyword: Keyword,
        text: String,
        patterns: Vec<String>,
    },
}

#[derive(Default)]
pub struct StepRegistry {
    bindings: Vec<Binding>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, keyword: Keyword, pattern: &str, handler: StepHandler) -> Result<(), PatternError> {
        self.push(keyword, pattern, handler, true)
    }

    /// Registers a step that runs even when the API is down, such as the
    /// liveness probe itself.
    pub fn register_probe(
        &mut self,
        keyword: Keyword,
        pattern: &str,
        handler: StepHandler,
    ) -> Result<(), PatternError> {
        self.push(keyword, pattern, handler, false)
    }

    fn push(&mut self, keyword: Keyword, pattern: &str, handler: StepHandler, requires_api: bool) -> Result<(), PatternError> {
        let pattern = StepPattern::compile(pattern)?;
        self.bindings.push(Binding {
            keyword,
            pattern,
            handler,
            requires_api,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// The binding for `keyword text`. When several patterns match, the one
    /// with the most literal text wins.
    pub fn find(&self, keyword: Keyword, text: &str) -> Result<(&Binding, StepArgs), LookupError> {
        let mut candidates: Vec<(&Binding, StepArgs)> = self
            .bindings
            .iter()
            .filter(|binding| binding.keyword == keyword)
            .filter_map(|binding| binding.pattern.matches(text).map(|args| (binding, args)))
            .collect();

        let Some(best) = candidates.iter().map(|(binding, _)| binding.pattern.literal_len()).max() else {
            return Err(LookupError::Undefined {
                keyword,
                text: text.to_string(),
            });
        };
        candidates.retain(|(binding, _)| binding.pattern.literal_len() == best);

        if candidates.len() > 1 {
            return Err(LookupError::Ambiguous {
                keyword,
                text: text.to_string(),
                patterns: candidates
                    .iter()
                    .map(|(binding, _)| binding.pattern.as_str().to_string())
                    .collect(),
            });
        }
        candidates.pop().ok_or_else(|| LookupError::Undefined {
            keyword,
            text: text.to_string(),
        })
    }
}
