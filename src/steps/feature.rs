//! Parser for the Gherkin subset the bundled features use.
//!
//! Supported: `Feature:`, `Background:`, `Scenario:`, `Scenario Outline:`
//! with `Examples:` tables, `Given/When/Then/And/But` steps, `#` comments
//! and `@tag` lines. Tags are read and dropped. Data tables outside
//! `Examples:` and doc strings are rejected.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::registry::Keyword;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: scenario '{scenario}' {message}")]
    StepOrder {
        line: usize,
        scenario: String,
        message: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<FeatureError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub keyword: Keyword,
    pub text: String,
    pub line: usize,
}

/// A runnable scenario. Background steps are already prepended and outline
/// rows already expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureScenario {
    pub name: String,
    pub line: usize,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub scenarios: Vec<FeatureScenario>,
}

enum Block {
    Preamble,
    Background,
    Scenario(Draft),
}

struct Draft {
    name: String,
    line: usize,
    steps: Vec<Step>,
    outline: bool,
    examples: Option<Table>,
}

#[derive(Default)]
struct Table {
    header: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

fn syntax(line: usize, message: impl Into<String>) -> FeatureError {
    FeatureError::Syntax {
        line,
        message: message.into(),
    }
}

pub fn parse(source: &str) -> Result<Feature, FeatureError> {
    let mut name: Option<String> = None;
    let mut background: Vec<Step> = Vec::new();
    let mut drafts: Vec<Draft> = Vec::new();
    let mut block = Block::Preamble;
    let mut last_keyword: Option<Keyword> = None;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') || text.starts_with('@') {
            continue;
        }

        if let Some(rest) = text.strip_prefix("Feature:") {
            if name.is_some() {
                return Err(syntax(line, "a file holds a single Feature"));
            }
            name = Some(rest.trim().to_string());
            continue;
        }
        if name.is_none() {
            return Err(syntax(line, format!("expected 'Feature:', found '{text}'")));
        }

        if text.starts_with("Background:") {
            if !matches!(block, Block::Preamble) {
                return Err(syntax(line, "Background must come before any scenario"));
            }
            block = Block::Background;
            last_keyword = None;
            continue;
        }

        let header = text
            .strip_prefix("Scenario Outline:")
            .map(|rest| (rest, true))
            .or_else(|| text.strip_prefix("Scenario:").map(|rest| (rest, false)));
        if let Some((rest, outline)) = header {
            if let Block::Scenario(draft) = std::mem::replace(&mut block, Block::Preamble) {
                drafts.push(draft);
            }
            block = Block::Scenario(Draft {
                name: rest.trim().to_string(),
                line,
                steps: Vec::new(),
                outline,
                examples: None,
            });
            last_keyword = None;
            continue;
        }

        if text.starts_with("Examples:") {
            match &mut block {
                Block::Scenario(draft) if draft.outline && draft.examples.is_none() => {
                    draft.examples = Some(Table::default());
                }
                Block::Scenario(draft) if draft.outline => {
                    return Err(syntax(line, format!("'{}' already has Examples", draft.name)));
                }
                _ => return Err(syntax(line, "Examples belong to a Scenario Outline")),
            }
            continue;
        }

        if text.starts_with('|') {
            let Block::Scenario(Draft {
                examples: Some(table), ..
            }) = &mut block
            else {
                return Err(syntax(line, "data tables are only supported under Examples"));
            };
            let cells = table_cells(text);
            if table.header.is_empty() {
                table.header = cells;
            } else if cells.len() != table.header.len() {
                return Err(syntax(
                    line,
                    format!("expected {} cells, found {}", table.header.len(), cells.len()),
                ));
            } else {
                table.rows.push((line, cells));
            }
            continue;
        }

        if text.starts_with("\"\"\"") {
            return Err(syntax(line, "doc strings are not supported"));
        }

        let Some((keyword, step_text)) = split_step(text, last_keyword, line)? else {
            if matches!(block, Block::Preamble) {
                // Free-form feature description.
                continue;
            }
            return Err(syntax(line, format!("unexpected line '{text}'")));
        };
        last_keyword = Some(keyword);
        let step = Step {
            keyword,
            text: step_text.to_string(),
            line,
        };
        match &mut block {
            Block::Preamble => return Err(syntax(line, "step outside of a scenario")),
            Block::Background => background.push(step),
            Block::Scenario(draft) if draft.examples.is_some() => {
                return Err(syntax(line, "steps must come before Examples"));
            }
            Block::Scenario(draft) => draft.steps.push(step),
        }
    }

    if let Block::Scenario(draft) = block {
        drafts.push(draft);
    }
    let name = name.ok_or_else(|| syntax(1, "missing 'Feature:' line"))?;

    let mut scenarios = Vec::new();
    for draft in drafts {
        for scenario in expand(draft, &background)? {
            validate_order(&scenario)?;
            scenarios.push(scenario);
        }
    }
    Ok(Feature { name, scenarios })
}

/// `(keyword, text)` when the line is a step. `And`/`But` take the keyword
/// of the previous step.
fn split_step(text: &str, previous: Option<Keyword>, line: usize) -> Result<Option<(Keyword, &str)>, FeatureError> {
    let Some((word, rest)) = text.split_once(' ') else {
        return Ok(None);
    };
    let keyword = match word {
        "Given" => Keyword::Given,
        "When" => Keyword::When,
        "Then" => Keyword::Then,
        "And" | "But" => previous.ok_or_else(|| syntax(line, format!("'{word}' has no step to continue")))?,
        _ => return Ok(None),
    };
    Ok(Some((keyword, rest.trim())))
}

fn table_cells(text: &str) -> Vec<String> {
    text.trim_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

fn expand(draft: Draft, background: &[Step]) -> Result<Vec<FeatureScenario>, FeatureError> {
    let steps: Vec<Step> = background.iter().cloned().chain(draft.steps).collect();
    if !draft.outline {
        return Ok(vec![FeatureScenario {
            name: draft.name,
            line: draft.line,
            steps,
        }]);
    }

    let table = draft
        .examples
        .filter(|table| !table.rows.is_empty())
        .ok_or_else(|| syntax(draft.line, format!("outline '{}' has no Examples rows", draft.name)))?;
    Ok(table
        .rows
        .iter()
        .map(|(line, row)| {
            let substitute = |text: &str| {
                table
                    .header
                    .iter()
                    .zip(row)
                    .fold(text.to_string(), |acc, (column, value)| acc.replace(&format!("<{column}>"), value))
            };
            FeatureScenario {
                name: format!("{} ({})", substitute(&draft.name), row.join(", ")),
                line: *line,
                steps: steps
                    .iter()
                    .map(|step| Step {
                        keyword: step.keyword,
                        text: substitute(&step.text),
                        line: step.line,
                    })
                    .collect(),
            }
        })
        .collect())
}

/// Steps must read `Given* When+ Then+`.
fn validate_order(scenario: &FeatureScenario) -> Result<(), FeatureError> {
    let fail = |line: usize, message: String| FeatureError::StepOrder {
        line,
        scenario: scenario.name.clone(),
        message,
    };

    for pair in scenario.steps.windows(2) {
        if pair[1].keyword < pair[0].keyword {
            return Err(fail(
                pair[1].line,
                format!("has a '{}' step after a '{}' step", pair[1].keyword, pair[0].keyword),
            ));
        }
    }
    for required in [Keyword::When, Keyword::Then] {
        if !scenario.steps.iter().any(|step| step.keyword == required) {
            return Err(fail(scenario.line, format!("has no '{required}' step")));
        }
    }
    Ok(())
}

/// Reads every path given. Directories contribute their `*.feature` files in
/// name order.
pub fn load_features(paths: &[PathBuf]) -> Result<Vec<Feature>, FeatureError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = fs::read_dir(path).map_err(|source| FeatureError::Io {
                path: path.clone(),
                source,
            })?;
            let mut found: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|candidate| candidate.extension().is_some_and(|ext| ext == "feature"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    files.iter().map(|path| load_file(path)).collect()
}

fn load_file(path: &Path) -> Result<Feature, FeatureError> {
    let source = fs::read_to_string(path).map_err(|source| FeatureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "parsing feature");
    parse(&source).map_err(|source| FeatureError::InFile {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DELETE: &str = "\
# language: en
@todos
Feature: Delete a todo
  As a user I want to remove todos I no longer need.

  Background:
    Given the API is responsive

  Scenario: Delete an existing todo
    Given there is an existing todo with title 'Write report' in the database
    When the user deletes the todo with title 'Write report'
    Then the status code 200 will be received
    And the todo with title 'Write report' should no longer exist in the database

  @error
  Scenario: Delete a missing todo
    When the user attempts to delete a todo with id 9999
    Then the status code 404 will be received
    But an error message 'Could not find any instances with todos/9999' will be displayed
";

    #[test]
    fn background_is_prepended_and_and_inherits() {
        let feature = parse(DELETE).unwrap();

        assert_eq!(feature.name, "Delete a todo");
        assert_eq!(feature.scenarios.len(), 2);
        let first = &feature.scenarios[0];
        assert_eq!(first.steps.len(), 5);
        assert_eq!(first.steps[0].text, "the API is responsive");
        assert_eq!(first.steps[4].keyword, Keyword::Then);
        assert_eq!(feature.scenarios[1].steps[3].keyword, Keyword::Then);
        assert_eq!(feature.scenarios[1].line, 16);
    }

    #[test]
    fn outline_rows_expand_into_scenarios() {
        let source = "\
Feature: Retrieve
  Scenario Outline: Seeded todo <title> is listed
    Given the database contains several todos
    When the user retrieves all todos
    Then the todo with title \"<title>\" is included in the list

    Examples:
      | title            |
      | Pay Bills        |
      | Grocery Shopping |
";
        let feature = parse(source).unwrap();

        let names: Vec<&str> = feature.scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Seeded todo Pay Bills is listed (Pay Bills)",
                "Seeded todo Grocery Shopping is listed (Grocery Shopping)"
            ]
        );
        assert_eq!(
            feature.scenarios[1].steps[2].text,
            "the todo with title \"Grocery Shopping\" is included in the list"
        );
    }

    #[test]
    fn steps_out_of_order_are_rejected() {
        let source = "\
Feature: Broken
  Scenario: then before when
    Given the API is responsive
    Then the status code 200 will be received
    When the user retrieves all todos
";
        let err = parse(source).unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 5: scenario 'then before when' has a 'When' step after a 'Then' step"
        );
    }

    #[test]
    fn scenario_without_then_is_rejected() {
        let source = "Feature: Broken\n  Scenario: no outcome\n    When the user retrieves all todos\n";
        let err = parse(source).unwrap_err();
        assert!(matches!(err, FeatureError::StepOrder { line: 2, .. }));
    }

    #[test]
    fn syntax_errors_carry_line_numbers() {
        let cases = [
            ("Scenario: first\n", "line 1: expected 'Feature:', found 'Scenario: first'"),
            ("Feature: a\n  And the API is responsive\n", "line 2: 'And' has no step to continue"),
            ("Feature: a\n  Scenario: b\n    | x |\n", "line 3: data tables are only supported under Examples"),
            ("Feature: a\n  Scenario: b\n    Whenever something\n", "line 3: unexpected line 'Whenever something'"),
            ("Feature: a\nFeature: b\n", "line 2: a file holds a single Feature"),
        ];
        for (source, expected) in cases {
            assert_eq!(parse(source).unwrap_err().to_string(), expected, "{source}");
        }
    }

    #[test]
    fn outline_without_rows_is_rejected() {
        let source = "\
Feature: a
  Scenario Outline: b
    When the user retrieves all todos
    Then the status code 200 will be received
    Examples:
      | title |
";
        assert_eq!(
            parse(source).unwrap_err().to_string(),
            "line 2: outline 'b' has no Examples rows"
        );
    }

    #[test]
    fn load_features_reads_directories_in_name_order() {
        let dir = std::env::temp_dir().join(format!("todoprobe-features-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("b.feature"), DELETE).unwrap();
        fs::write(dir.join("a.feature"), DELETE.replace("Delete a todo", "First")).unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let features = load_features(&[dir.clone()]).unwrap();
        let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Delete a todo"]);

        fs::write(dir.join("c.feature"), "Scenario: orphan\n").unwrap();
        let err = load_features(&[dir.clone()]).unwrap_err();
        assert!(err.to_string().ends_with("c.feature: line 1: expected 'Feature:', found 'Scenario: orphan'"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
