//! Mapping words in claim text onto dataset columns.
//!
//! Resolution is purely lexical. A column is recognized from its own name,
//! from a configured alias, from a close spelling of its name, or from one of
//! its categorical levels. Nothing is inferred from what a column might mean.

use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

use crate::input::{Column, ColumnKind, Dataset};

use super::claim::LevelMention;
use super::lexicon::{ExtractionConfig, Token, tokenize};

/// Words that flip a boolean column mention to its negative level
/// ("non-smokers").
const NEGATIVE_PREFIXES: [&str; 5] = ["non", "not", "no", "never", "without"];

/// Affirmative/negative spellings of two-level flag columns.
const BOOLEAN_PAIRS: [(&str, &str); 5] = [
    ("yes", "no"),
    ("true", "false"),
    ("y", "n"),
    ("1", "0"),
    ("t", "f"),
];

/// What the extractor knows about a dataset column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Distinct levels (categorical columns only).
    #[serde(default)]
    pub levels: Vec<String>,
}

impl ColumnProfile {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Numeric,
            levels: Vec::new(),
        }
    }

    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        levels: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Categorical,
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_column(column: &Column) -> Self {
        Self {
            name: column.name().to_string(),
            kind: column.kind(),
            levels: column.levels(),
        }
    }

    /// Profiles of every column in dataset order.
    pub fn from_dataset(dataset: &Dataset) -> Vec<Self> {
        dataset.columns().iter().map(Self::from_column).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchSource {
    Exact,
    Alias,
    Fuzzy,
    Level,
}

#[derive(Debug, Clone)]
struct Candidate {
    column: usize,
    start: usize,
    len: usize,
    source: MatchSource,
    plural: bool,
    level: Option<String>,
}

#[derive(Debug, Clone)]
struct CompiledColumn {
    profile: ColumnProfile,
    name_words: Vec<String>,
    name_joined: String,
    aliases: Vec<Vec<String>>,
    levels: Vec<(String, Vec<String>)>,
    /// (affirmative, negative) levels of a two-level flag column.
    boolean: Option<(String, String)>,
}

/// A column recognized in a claim, at the token where it was first seen.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedVariable {
    pub name: String,
    pub kind: ColumnKind,
    pub token: usize,
}

/// A level recognized in a claim.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedLevel {
    pub mention: LevelMention,
    pub token: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Resolution {
    /// Distinct variables ordered by first mention.
    pub variables: Vec<ResolvedVariable>,
    /// Level mentions in text order.
    pub levels: Vec<ResolvedLevel>,
}

impl Resolution {
    pub fn names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }
}

/// Resolves column mentions against a fixed set of columns.
#[derive(Debug, Clone)]
pub(crate) struct VariableResolver {
    columns: Vec<CompiledColumn>,
    fuzzy_threshold: f64,
    min_fuzzy_length: usize,
}

impl VariableResolver {
    pub fn new(columns: &[ColumnProfile], config: &ExtractionConfig) -> Self {
        let ignored: Vec<String> = config
            .ignored_levels
            .iter()
            .map(|l| l.trim().to_lowercase())
            .collect();

        let columns = columns
            .iter()
            .map(|profile| {
                let name_words = words(&profile.name);
                let aliases = config
                    .aliases
                    .get(&profile.name)
                    .map(|list| list.iter().map(|a| words(a)).filter(|w| !w.is_empty()).collect())
                    .unwrap_or_default();

                let levels = if config.resolve_by_level && profile.kind == ColumnKind::Categorical {
                    profile
                        .levels
                        .iter()
                        .filter(|level| is_identifying_level(level, &ignored))
                        .map(|level| (level.clone(), words(level)))
                        .filter(|(_, w)| !w.is_empty())
                        .collect()
                } else {
                    Vec::new()
                };

                CompiledColumn {
                    name_joined: name_words.join(" "),
                    name_words,
                    aliases,
                    levels,
                    boolean: boolean_levels(profile),
                    profile: profile.clone(),
                }
            })
            .collect();

        Self {
            columns,
            fuzzy_threshold: config.fuzzy_threshold,
            min_fuzzy_length: config.min_fuzzy_length,
        }
    }

    pub fn profiles(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.iter().map(|c| &c.profile)
    }

    pub fn resolve(&self, tokens: &[Token]) -> Resolution {
        let mut candidates = self.candidates(tokens);

        // Longest phrase wins; among equal lengths, the more direct source.
        candidates.sort_by(|a, b| {
            b.len
                .cmp(&a.len)
                .then(a.source.cmp(&b.source))
                .then(a.start.cmp(&b.start))
                .then(a.column.cmp(&b.column))
        });

        let mut taken = vec![false; tokens.len()];
        let mut accepted = Vec::new();
        for candidate in candidates {
            let range = candidate.start..candidate.start + candidate.len;
            if taken[range.clone()].iter().any(|&t| t) {
                continue;
            }
            taken[range].iter_mut().for_each(|t| *t = true);
            accepted.push(candidate);
        }
        accepted.sort_by_key(|c| (c.start, c.column));

        let mut resolution = Resolution::default();
        for candidate in accepted {
            let column = &self.columns[candidate.column];
            let name = &column.profile.name;

            if !resolution.variables.iter().any(|v| &v.name == name) {
                resolution.variables.push(ResolvedVariable {
                    name: name.clone(),
                    kind: column.profile.kind,
                    token: candidate.start,
                });
            }

            if let Some(level) = self.implied_level(&candidate, tokens) {
                let mention = LevelMention {
                    variable: name.clone(),
                    level,
                };
                if !resolution.levels.iter().any(|l| l.mention == mention) {
                    resolution.levels.push(ResolvedLevel {
                        mention,
                        token: candidate.start,
                    });
                }
            }
        }

        resolution
    }

    fn candidates(&self, tokens: &[Token]) -> Vec<Candidate> {
        let mut out = Vec::new();

        for (index, column) in self.columns.iter().enumerate() {
            for start in 0..tokens.len() {
                if let Some(plural) = phrase_at(&column.name_words, tokens, start) {
                    out.push(Candidate {
                        column: index,
                        start,
                        len: column.name_words.len(),
                        source: MatchSource::Exact,
                        plural,
                        level: None,
                    });
                    continue;
                }

                for alias in &column.aliases {
                    if let Some(plural) = phrase_at(alias, tokens, start) {
                        out.push(Candidate {
                            column: index,
                            start,
                            len: alias.len(),
                            source: MatchSource::Alias,
                            plural,
                            level: None,
                        });
                    }
                }

                if let Some(len) = self.fuzzy_at(column, tokens, start) {
                    out.push(Candidate {
                        column: index,
                        start,
                        len,
                        source: MatchSource::Fuzzy,
                        plural: false,
                        level: None,
                    });
                }

                for (level, level_words) in &column.levels {
                    if phrase_at(level_words, tokens, start).is_some() {
                        out.push(Candidate {
                            column: index,
                            start,
                            len: level_words.len(),
                            source: MatchSource::Level,
                            plural: false,
                            level: Some(level.clone()),
                        });
                    }
                }
            }
        }

        out
    }

    /// Length of a fuzzy match of the column name starting at `start`.
    fn fuzzy_at(&self, column: &CompiledColumn, tokens: &[Token], start: usize) -> Option<usize> {
        let len = column.name_words.len();
        if len == 0
            || start + len > tokens.len()
            || column.name_joined.chars().count() < self.min_fuzzy_length
        {
            return None;
        }

        let window = &tokens[start..start + len];
        if !window.iter().any(|t| t.text.chars().any(char::is_alphabetic)) {
            return None;
        }
        let phrase = window
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if phrase.chars().count() < self.min_fuzzy_length {
            return None;
        }

        (normalized_levenshtein(&phrase, &column.name_joined) >= self.fuzzy_threshold)
            .then_some(len)
    }

    /// Level a mention refers to: an explicit level, or for flag columns the
    /// affirmative level of a plural name mention ("smokers") and the
    /// negative level of a prefixed one ("non-smokers").
    fn implied_level(&self, candidate: &Candidate, tokens: &[Token]) -> Option<String> {
        if let Some(level) = &candidate.level {
            return Some(level.clone());
        }
        if !matches!(candidate.source, MatchSource::Exact | MatchSource::Alias) {
            return None;
        }

        let (affirmative, negative) = self.columns[candidate.column].boolean.as_ref()?;
        let prefixed = candidate
            .start
            .checked_sub(1)
            .is_some_and(|i| NEGATIVE_PREFIXES.contains(&tokens[i].text.as_str()));

        if prefixed {
            Some(negative.clone())
        } else if candidate.plural {
            Some(affirmative.clone())
        } else {
            None
        }
    }
}

fn words(text: &str) -> Vec<String> {
    tokenize(&split_camel_case(text))
        .into_iter()
        .map(|t| t.text)
        .collect()
}

/// "bloodPressure" -> "blood Pressure".
fn split_camel_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut previous_lower = false;
    for ch in text.chars() {
        if ch.is_uppercase() && previous_lower {
            out.push(' ');
        }
        previous_lower = ch.is_lowercase();
        out.push(ch);
    }
    out
}

/// Whether `phrase` occurs at `start`. The last word may appear in plural or
/// singular form; returns whether it was pluralized.
fn phrase_at(phrase: &[String], tokens: &[Token], start: usize) -> Option<bool> {
    if phrase.is_empty() || start + phrase.len() > tokens.len() {
        return None;
    }
    let last = phrase.len() - 1;
    let mut plural = false;

    for (i, (word, token)) in phrase.iter().zip(&tokens[start..]).enumerate() {
        let text = token.text.as_str();
        if text == word {
            continue;
        }
        if i != last || word.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if text.strip_suffix('s') == Some(word.as_str())
            || text.strip_suffix("es") == Some(word.as_str())
        {
            plural = true;
        } else if word.len() > 3 && word.strip_suffix('s') == Some(text) {
            continue;
        } else {
            return None;
        }
    }

    Some(plural)
}

fn is_identifying_level(level: &str, ignored: &[String]) -> bool {
    let normalized = level.trim().to_lowercase();
    !normalized.is_empty()
        && !ignored.contains(&normalized)
        && normalized.parse::<f64>().is_err()
}

fn boolean_levels(profile: &ColumnProfile) -> Option<(String, String)> {
    if profile.kind != ColumnKind::Categorical || profile.levels.len() != 2 {
        return None;
    }
    let find = |spelling: &str| {
        profile
            .levels
            .iter()
            .find(|l| l.trim().eq_ignore_ascii_case(spelling))
            .cloned()
    };
    BOOLEAN_PAIRS
        .iter()
        .find_map(|(yes, no)| Some((find(yes)?, find(no)?)))
}
