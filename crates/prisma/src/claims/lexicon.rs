//! Keyword tables and cue matching for claim extraction.
//!
//! Cues are plain phrases matched against whole words, case-insensitively.
//! A trailing `*` on a word turns it into a prefix match, so `correlat*`
//! matches "correlated", "correlation" and "correlates".

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::claim::DescriptiveStat;

fn cues(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Keywords per descriptive statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptiveCues {
    pub mean: Vec<String>,
    pub median: Vec<String>,
    pub std_dev: Vec<String>,
    pub minimum: Vec<String>,
    pub maximum: Vec<String>,
    pub range: Vec<String>,
    pub count: Vec<String>,
}

impl Default for DescriptiveCues {
    fn default() -> Self {
        Self {
            mean: cues(&[
                "mean",
                "average*",
                "avg",
                "centered around",
                "centred around",
                "typical*",
                "central tendency",
            ]),
            median: cues(&["median", "middle", "50th percentile"]),
            std_dev: cues(&["standard deviation", "std", "sd", "spread"]),
            minimum: cues(&["minimum", "min", "lowest", "smallest", "youngest"]),
            maximum: cues(&["maximum", "max", "highest", "largest", "oldest"]),
            range: cues(&[
                "range*",
                "vary",
                "varies",
                "variability",
                "variation",
                "outlier*",
                "spans",
                "between",
            ]),
            count: cues(&[
                "sample size",
                "records",
                "rows",
                "observations",
                "participants",
                "respondents",
                "entries",
                "count",
                "n",
            ]),
        }
    }
}

impl DescriptiveCues {
    /// Tables in tie-break order.
    pub fn tables(&self) -> [(DescriptiveStat, &[String]); 7] {
        [
            (DescriptiveStat::Mean, self.mean.as_slice()),
            (DescriptiveStat::Median, self.median.as_slice()),
            (DescriptiveStat::StdDev, self.std_dev.as_slice()),
            (DescriptiveStat::Minimum, self.minimum.as_slice()),
            (DescriptiveStat::Maximum, self.maximum.as_slice()),
            (DescriptiveStat::Range, self.range.as_slice()),
            (DescriptiveStat::Count, self.count.as_slice()),
        ]
    }
}

/// Configuration for claim extraction.
///
/// Every table can be replaced from the `[extraction]` section of the
/// configuration file; validation logic never reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub positive_cues: Vec<String>,
    pub negative_cues: Vec<String>,
    pub correlation_cues: Vec<String>,
    /// Generic relationship verbs ("associated with", "linked to").
    pub relation_cues: Vec<String>,
    /// Comparatives naming the larger side ("higher", "more").
    pub higher_cues: Vec<String>,
    /// Comparatives naming the smaller side ("lower", "fewer").
    pub lower_cues: Vec<String>,
    /// Comparison markers without a side ("than", "compared", "differ*").
    pub comparison_cues: Vec<String>,
    pub negation_cues: Vec<String>,
    pub descriptive_cues: DescriptiveCues,
    /// Column name -> additional phrases that refer to it.
    pub aliases: IndexMap<String, Vec<String>>,
    /// Minimum normalized Levenshtein similarity for a fuzzy match.
    pub fuzzy_threshold: f64,
    /// Phrases shorter than this are only matched exactly.
    pub min_fuzzy_length: usize,
    /// Resolve a categorical column from a mention of one of its levels.
    pub resolve_by_level: bool,
    /// Levels too generic to identify their column.
    pub ignored_levels: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            positive_cues: cues(&[
                "positive*",
                "increas*",
                "rise",
                "rises",
                "rising",
                "grow*",
                "higher",
                "greater",
                "direct",
                "directly",
            ]),
            negative_cues: cues(&[
                "negative*",
                "decreas*",
                "declin*",
                "falls",
                "falling",
                "drop*",
                "lower",
                "reduc*",
                "inverse*",
            ]),
            correlation_cues: cues(&[
                "correlat*",
                "trend*",
                "covar*",
                "go up with",
                "goes up with",
            ]),
            relation_cues: cues(&[
                "associat*",
                "related",
                "relates",
                "relation",
                "relationship*",
                "link*",
                "connected",
                "depend*",
                "influenc*",
                "affect*",
                "impact*",
                "predict*",
                "driven",
                "drives",
                "unrelated",
                "independen*",
            ]),
            higher_cues: cues(&[
                "higher",
                "highest",
                "more",
                "most",
                "greater",
                "greatest",
                "larger",
                "largest",
                "bigger",
                "exceed*",
                "above",
                "increased",
            ]),
            lower_cues: cues(&[
                "lower",
                "lowest",
                "less",
                "least",
                "fewer",
                "fewest",
                "smaller",
                "smallest",
                "below",
                "reduced",
                "decreased",
            ]),
            comparison_cues: cues(&[
                "than",
                "compared",
                "comparison",
                "versus",
                "vs",
                "differ*",
                "gap",
            ]),
            negation_cues: cues(&[
                "no",
                "not",
                "never",
                "neither",
                "nor",
                "without",
                "doesnt",
                "dont",
                "isnt",
                "arent",
                "wasnt",
                "werent",
                "lack*",
                "absence",
                "unrelated",
                "independen*",
            ]),
            descriptive_cues: DescriptiveCues::default(),
            aliases: IndexMap::new(),
            fuzzy_threshold: 0.85,
            min_fuzzy_length: 4,
            resolve_by_level: true,
            ignored_levels: cues(&[
                "yes", "no", "true", "false", "y", "n", "t", "f", "other", "unknown", "none", "na",
            ]),
        }
    }
}

impl ExtractionConfig {
    pub fn with_alias(mut self, column: impl Into<String>, alias: impl Into<String>) -> Self {
        self.aliases.entry(column.into()).or_default().push(alias.into());
        self
    }

    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    pub fn with_resolve_by_level(mut self, enabled: bool) -> Self {
        self.resolve_by_level = enabled;
        self
    }
}

/// A lowercase word and its byte range in the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

fn is_apostrophe(ch: char) -> bool {
    matches!(ch, '\'' | '\u{2019}')
}

/// Split text into lowercase alphanumeric words.
///
/// Apostrophes inside a word are dropped ("doesn't" becomes "doesnt");
/// every other non-alphanumeric character separates words.
pub(crate) fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut end = 0;

    for (i, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            if current.is_empty() {
                start = i;
            }
            current.extend(ch.to_lowercase());
            end = i + ch.len_utf8();
        } else if is_apostrophe(ch) && !current.is_empty() {
            continue;
        } else if !current.is_empty() {
            tokens.push(Token {
                text: std::mem::take(&mut current),
                start,
                end,
            });
        }
    }
    if !current.is_empty() {
        tokens.push(Token {
            text: current,
            start,
            end,
        });
    }

    tokens
}

/// Tokens joined by single spaces.
pub(crate) fn normalized(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq)]
struct CueWord {
    text: String,
    prefix: bool,
}

impl CueWord {
    fn matches(&self, token: &str) -> bool {
        if self.prefix {
            token.starts_with(&self.text)
        } else {
            token == self.text
        }
    }
}

/// A compiled multi-word cue.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cue {
    words: Vec<CueWord>,
}

impl Cue {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut words = Vec::new();
        for piece in raw.split_whitespace() {
            let prefix = piece.ends_with('*');
            let parts = tokenize(piece.trim_end_matches('*'));
            let last = parts.len().saturating_sub(1);
            for (i, part) in parts.into_iter().enumerate() {
                words.push(CueWord {
                    text: part.text,
                    prefix: prefix && i == last,
                });
            }
        }
        (!words.is_empty()).then_some(Self { words })
    }

    pub fn matches_at(&self, tokens: &[Token], at: usize) -> bool {
        at + self.words.len() <= tokens.len()
            && self
                .words
                .iter()
                .zip(&tokens[at..])
                .all(|(word, token)| word.matches(&token.text))
    }
}

/// A compiled keyword table.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CueSet {
    cues: Vec<Cue>,
}

impl CueSet {
    pub fn new(raw: &[String]) -> Self {
        Self {
            cues: raw.iter().filter_map(|c| Cue::parse(c)).collect(),
        }
    }

    /// Token indices where any cue starts, ascending.
    pub fn positions(&self, tokens: &[Token]) -> Vec<usize> {
        (0..tokens.len())
            .filter(|&i| self.cues.iter().any(|cue| cue.matches_at(tokens, i)))
            .collect()
    }

    pub fn first(&self, tokens: &[Token]) -> Option<usize> {
        (0..tokens.len()).find(|&i| self.cues.iter().any(|cue| cue.matches_at(tokens, i)))
    }

    pub fn any(&self, tokens: &[Token]) -> bool {
        self.first(tokens).is_some()
    }
}

/// Every keyword table of an [`ExtractionConfig`], compiled.
#[derive(Debug, Clone)]
pub(crate) struct Lexicon {
    pub positive: CueSet,
    pub negative: CueSet,
    pub correlation: CueSet,
    pub relation: CueSet,
    pub higher: CueSet,
    pub lower: CueSet,
    pub comparison: CueSet,
    pub negation: CueSet,
    /// Cues a negation must precede to deny a relationship.
    pub negatable: CueSet,
    /// Fixed phrases that open with a negation word but deny nothing.
    pub stock_phrases: CueSet,
    pub descriptive: Vec<(DescriptiveStat, CueSet)>,
}

impl Lexicon {
    pub fn new(config: &ExtractionConfig) -> Self {
        let negatable: Vec<String> = config
            .correlation_cues
            .iter()
            .chain(&config.relation_cues)
            .chain(&config.higher_cues)
            .chain(&config.lower_cues)
            .chain(&config.comparison_cues)
            .cloned()
            .chain(cues(&["significan*", "effect*", "evidence"]))
            .collect();

        Self {
            positive: CueSet::new(&config.positive_cues),
            negative: CueSet::new(&config.negative_cues),
            correlation: CueSet::new(&config.correlation_cues),
            relation: CueSet::new(&config.relation_cues),
            higher: CueSet::new(&config.higher_cues),
            lower: CueSet::new(&config.lower_cues),
            comparison: CueSet::new(&config.comparison_cues),
            negation: CueSet::new(&config.negation_cues),
            negatable: CueSet::new(&negatable),
            stock_phrases: CueSet::new(&cues(&[
                "not only",
                "not just",
                "not surprisingly",
                "not unexpectedly",
                "no doubt",
                "no wonder",
            ])),
            descriptive: config
                .descriptive_cues
                .tables()
                .into_iter()
                .map(|(stat, table)| (stat, CueSet::new(table)))
                .collect(),
        }
    }
}
