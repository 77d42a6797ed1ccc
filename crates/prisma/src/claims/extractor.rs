//! Turning generated text into structured claims.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::input::{ColumnKind, Dataset};

use super::claim::{
    Claim, ClaimDirection, ClaimTag, ClaimType, DescriptiveStat, GroupComparison, LevelMention,
};
use super::lexicon::{ExtractionConfig, Lexicon, Token, normalized, tokenize};
use super::resolver::{ColumnProfile, Resolution, VariableResolver};
use super::segment::{Segment, segment};

/// Tokens a negation may precede a relationship cue by.
const NEGATION_WINDOW: usize = 4;

const UP: &str =
    r"increas\w*|ris(?:e|es|ing)|grow(?:s|ing)?|climb\w*|go(?:es)? up|higher|more|greater";
const DOWN: &str =
    r"decreas\w*|declin\w*|fall(?:s|ing)?|drop\w*|reduc\w*|go(?:es)? down|lower|less|fewer";

/// Verbs of change, without the comparatives.
const MOVES: &str = concat!(
    r"increas\w*|decreas\w*|ris(?:e|es|ing)|fall(?:s|ing)?|",
    r"grow(?:s|ing)?|declin\w*|drop\w*|climb\w*",
);

static DOWNWARD: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"^(?:{DOWN})$")).unwrap());

static MOVEMENT: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"^(?:{MOVES})$")).unwrap());

/// "as age increases", wherever the other movement sits.
static AS_MOVEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\bas\s+(?:\w+\s+){{1,6}}?(?:{MOVES})\b")).unwrap());

/// Two linked movements whose signs compose into a direction, matched on
/// normalized text.
static COVARIATION: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "as age increases, charges decrease"
        format!(r"\b(?:as|when|while|if)\s+(?:\w+\s+){{1,6}}?({UP}|{DOWN})\b(?:\s+\w+){{0,10}}?\s+({UP}|{DOWN})\b"),
        // "the higher the bmi, the higher the charges"
        format!(r"\bthe\s+({UP}|{DOWN})\s+(?:\w+\s+){{0,4}}?the\s+({UP}|{DOWN})\b"),
        // "higher bmi is associated with lower charges"
        format!(r"\b({UP}|{DOWN})\s+(?:\w+\s+){{1,4}}?(?:associated|linked|correlated|related|corresponds?|leads?|results?)\s+(?:with|to|in)\s+(?:\w+\s+){{0,2}}?({UP}|{DOWN})\b"),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// p-value expressions whose numbers are not claimed values.
static P_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bp(?:\s*-\s*values?)?\s*(?:[<>=≤≥]+|\bof\b|\bis\b|\bwas\b)\s*\d*\.?\d+(?:e-?\d+)?").unwrap()
});

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w.])(?P<num>[-+]?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?|[-+]?\.\d+)\b").unwrap()
});

/// A number in claim text and its byte offset.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Number {
    value: f64,
    start: usize,
}

/// Extracts claims from generated text.
///
/// Extraction is a pure function of the text, the configuration and the
/// column profiles: the same input always yields the same claims.
#[derive(Debug, Clone)]
pub struct ClaimExtractor {
    config: ExtractionConfig,
    lexicon: Lexicon,
    resolver: VariableResolver,
}

impl ClaimExtractor {
    pub fn new(config: ExtractionConfig, columns: &[ColumnProfile]) -> Self {
        Self {
            lexicon: Lexicon::new(&config),
            resolver: VariableResolver::new(columns, &config),
            config,
        }
    }

    /// Extractor resolving against the columns of `dataset`.
    pub fn for_dataset(dataset: &Dataset, config: ExtractionConfig) -> Self {
        Self::new(config, &ColumnProfile::from_dataset(dataset))
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn columns(&self) -> Vec<&ColumnProfile> {
        self.resolver.profiles().collect()
    }

    /// Extract every claim in `text`, in source order.
    ///
    /// Empty or unparseable text yields no claims.
    pub fn extract(&self, text: &str) -> Vec<Claim> {
        let claims: Vec<Claim> = segment(text)
            .into_iter()
            .enumerate()
            .map(|(index, seg)| self.build_claim(index, seg))
            .collect();

        info!(
            claims = claims.len(),
            insufficient = claims.iter().filter(|c| c.has_insufficient_variables()).count(),
            "extracted claims"
        );
        claims
    }

    fn build_claim(&self, index: usize, seg: Segment) -> Claim {
        let tokens = tokenize(&seg.text);
        let resolution = self.resolver.resolve(&tokens);
        let normalized = normalized(&tokens);

        let covariation = covariation(&normalized);
        let cued = covariation.is_some() || AS_MOVEMENT.is_match(&normalized);
        let claim_type = self.classify(&tokens, &resolution, cued);
        let direction = covariation.unwrap_or_else(|| self.polarity(&tokens));
        let negated = self.is_negated(&seg.text, &tokens);

        let statistic = match claim_type {
            ClaimType::Descriptive => self.statistic(&tokens),
            _ => None,
        };
        let anchor = statistic
            .map(|(_, position)| tokens[position].start)
            .unwrap_or(0);
        let numbers = claimed_numbers(&seg.text, anchor);

        let group = match claim_type {
            ClaimType::GroupDifference => self.group_comparison(&tokens, &resolution),
            _ => None,
        };

        let variables = resolution.names();
        let mut tags = Vec::new();
        if variables.len() < 2 {
            tags.push(ClaimTag::InsufficientVariables);
        }

        let claim = Claim {
            index,
            text: seg.text,
            span: seg.span,
            claim_type,
            variables,
            direction,
            negated,
            claimed_value: numbers.first().map(|n| n.value),
            secondary_value: numbers.get(1).map(|n| n.value),
            statistic: statistic.map(|(stat, _)| stat),
            levels: resolution.levels.into_iter().map(|l| l.mention).collect(),
            group,
            tags,
        };

        debug!(
            index,
            claim_type = claim.claim_type.label(),
            variables = ?claim.variables,
            direction = claim.direction.label(),
            negated,
            "extracted claim"
        );
        claim
    }

    /// Claim type from cues and the kinds of the first two variables.
    ///
    /// A verb of change ("charges tend to increase with age") counts as a
    /// correlation cue when both variables are numeric.
    fn classify(&self, tokens: &[Token], resolution: &Resolution, covarying: bool) -> ClaimType {
        let pair = resolution.variables.len() >= 2;
        let numeric_pair = pair
            && resolution.variables[..2]
                .iter()
                .all(|v| v.kind == ColumnKind::Numeric);
        let moves = numeric_pair && tokens.iter().any(|t| MOVEMENT.is_match(&t.text));

        let correlation = covarying || moves || self.lexicon.correlation.any(tokens);
        let relation = self.lexicon.relation.any(tokens);
        let comparative = self.lexicon.higher.any(tokens)
            || self.lexicon.lower.any(tokens)
            || self.lexicon.comparison.any(tokens);

        if correlation || relation || (comparative && pair) {
            if pair {
                let first = resolution.variables[0].kind;
                let second = resolution.variables[1].kind;
                return match (first, second) {
                    (ColumnKind::Numeric, ColumnKind::Numeric) => ClaimType::Correlation,
                    (ColumnKind::Categorical, ColumnKind::Categorical) => ClaimType::Association,
                    _ => ClaimType::GroupDifference,
                };
            }
            return ClaimType::Correlation;
        }

        if self.lexicon.descriptive.iter().any(|(_, cues)| cues.any(tokens)) {
            return ClaimType::Descriptive;
        }

        ClaimType::Unclassified
    }

    fn polarity(&self, tokens: &[Token]) -> ClaimDirection {
        match (
            self.lexicon.positive.any(tokens),
            self.lexicon.negative.any(tokens),
        ) {
            (true, true) => ClaimDirection::Ambiguous,
            (true, false) => ClaimDirection::Positive,
            (false, true) => ClaimDirection::Negative,
            (false, false) => ClaimDirection::None,
        }
    }

    /// A negation cue shortly before a relationship or significance cue,
    /// in the same clause.
    ///
    /// Stock phrases such as "not only" or "no doubt" are not negations.
    fn is_negated(&self, text: &str, tokens: &[Token]) -> bool {
        let targets = self.lexicon.negatable.positions(tokens);
        let stock = self.lexicon.stock_phrases.positions(tokens);
        self.lexicon
            .negation
            .positions(tokens)
            .into_iter()
            .filter(|n| !stock.contains(n))
            .any(|n| {
                targets.iter().any(|&t| {
                    t >= n
                        && t - n <= NEGATION_WINDOW
                        && !text[tokens[n].start..tokens[t].start].contains([',', ';', ':'])
                })
            })
    }

    /// The statistic whose cue appears first, with its token position.
    fn statistic(&self, tokens: &[Token]) -> Option<(DescriptiveStat, usize)> {
        self.lexicon
            .descriptive
            .iter()
            .filter_map(|(stat, cues)| cues.first(tokens).map(|pos| (*stat, pos)))
            .min_by_key(|&(_, pos)| pos)
    }

    /// Which level of the grouping variable the claim puts on top.
    ///
    /// The first mentioned level is the subject of the first comparative
    /// cue; a second level, if any, is the reference it is compared with.
    fn group_comparison(
        &self,
        tokens: &[Token],
        resolution: &Resolution,
    ) -> Option<GroupComparison> {
        let variable = resolution
            .variables
            .iter()
            .find(|v| v.kind == ColumnKind::Categorical)?
            .name
            .clone();

        let mentioned: Vec<&LevelMention> = resolution
            .levels
            .iter()
            .map(|l| &l.mention)
            .filter(|m| m.variable == variable)
            .collect();
        let subject = mentioned.first().map(|m| m.level.clone());
        let reference = mentioned
            .iter()
            .map(|m| &m.level)
            .find(|level| Some(*level) != subject.as_ref())
            .cloned();

        let higher = self.lexicon.higher.first(tokens);
        let lower = self.lexicon.lower.first(tokens);
        let subject_is_higher = match (higher, lower) {
            (Some(h), Some(l)) => Some(h < l),
            (Some(_), None) => Some(true),
            (None, Some(_)) => Some(false),
            (None, None) => None,
        };

        let (higher, lower) = match (subject_is_higher, subject) {
            (Some(true), subject) => (subject, reference),
            (Some(false), subject) => (reference, subject),
            (None, _) => (None, None),
        };

        Some(GroupComparison {
            variable,
            higher,
            lower,
        })
    }
}

/// Direction implied by a covariation phrase, if the text contains one.
fn covariation(normalized: &str) -> Option<ClaimDirection> {
    COVARIATION.iter().find_map(|pattern| {
        let caps = pattern.captures(normalized)?;
        let first_down = DOWNWARD.is_match(caps.get(1)?.as_str());
        let second_down = DOWNWARD.is_match(caps.get(2)?.as_str());
        Some(if first_down == second_down {
            ClaimDirection::Positive
        } else {
            ClaimDirection::Negative
        })
    })
}

/// Numbers in `text` outside p-value expressions, those at or after
/// `anchor` first.
fn claimed_numbers(text: &str, anchor: usize) -> Vec<Number> {
    let excluded: Vec<(usize, usize)> = P_VALUE
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    let numbers: Vec<Number> = NUMBER
        .captures_iter(text)
        .filter_map(|caps| {
            let m = caps.name("num")?;
            if excluded.iter().any(|&(s, e)| m.start() < e && s < m.end()) {
                return None;
            }
            let value = m.as_str().replace(',', "").parse::<f64>().ok()?;
            Some(Number {
                value,
                start: m.start(),
            })
        })
        .collect();

    let (after, before): (Vec<Number>, Vec<Number>) =
        numbers.into_iter().partition(|n| n.start >= anchor);
    after.into_iter().chain(before).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ClaimExtractor {
        ClaimExtractor::new(
            ExtractionConfig::default(),
            &[
                ColumnProfile::numeric("age"),
                ColumnProfile::numeric("bmi"),
                ColumnProfile::numeric("charges"),
                ColumnProfile::numeric("income"),
                ColumnProfile::numeric("shoe_size"),
                ColumnProfile::categorical("smoker", ["no", "yes"]),
                ColumnProfile::categorical("sex", ["female", "male"]),
                ColumnProfile::categorical(
                    "region",
                    ["northeast", "northwest", "southeast", "southwest"],
                ),
            ],
        )
    }

    fn one(text: &str) -> Claim {
        let mut claims = extractor().extract(text);
        assert_eq!(claims.len(), 1, "expected one claim from {text:?}");
        claims.remove(0)
    }

    #[test]
    fn test_correlation_claim() {
        let claim = one("Age is positively correlated with charges.");
        assert_eq!(claim.claim_type, ClaimType::Correlation);
        assert_eq!(claim.variables, vec!["age", "charges"]);
        assert_eq!(claim.direction, ClaimDirection::Positive);
        assert!(!claim.negated);
        assert!(claim.tags.is_empty());
    }

    #[test]
    fn test_covariation_pattern_sets_direction() {
        let claim = one("As age increases, BMI tends to decrease.");
        assert_eq!(claim.claim_type, ClaimType::Correlation);
        assert_eq!(claim.direction, ClaimDirection::Negative);

        let claim = one("The higher the BMI, the higher the charges.");
        assert_eq!(claim.direction, ClaimDirection::Positive);

        let claim = one("Higher BMI is associated with lower charges.");
        assert_eq!(claim.direction, ClaimDirection::Negative);
    }

    #[test]
    fn test_conflicting_cues_are_ambiguous() {
        let claim = one("Age shows a positive and a negative correlation with BMI.");
        assert_eq!(claim.direction, ClaimDirection::Ambiguous);
    }

    #[test]
    fn test_group_difference_with_levels() {
        let claim = one("Smokers have higher charges than non-smokers.");
        assert_eq!(claim.claim_type, ClaimType::GroupDifference);
        assert_eq!(
            claim.group,
            Some(GroupComparison {
                variable: "smoker".to_string(),
                higher: Some("yes".to_string()),
                lower: Some("no".to_string()),
            })
        );
    }

    #[test]
    fn test_group_difference_lower_subject() {
        let claim = one("Charges are lower in the northwest than in the southeast.");
        let group = claim.group.unwrap();
        assert_eq!(group.variable, "region");
        assert_eq!(group.lower.as_deref(), Some("northwest"));
        assert_eq!(group.higher.as_deref(), Some("southeast"));
    }

    #[test]
    fn test_association_between_categoricals() {
        let claim = one("Sex is associated with smoker status.");
        assert_eq!(claim.claim_type, ClaimType::Association);
    }

    #[test]
    fn test_negated_claim() {
        let claim = one("There is no significant correlation between age and BMI.");
        assert!(claim.negated);
        assert_eq!(claim.claim_type, ClaimType::Correlation);
    }

    #[test]
    fn test_as_clause_alone_is_correlation() {
        let claim = one("Charges rise as age increases.");
        assert_eq!(claim.claim_type, ClaimType::Correlation);
        assert_eq!(claim.variables, vec!["charges", "age"]);
        assert_eq!(claim.direction, ClaimDirection::Positive);
    }

    #[test]
    fn test_verb_of_change_between_numerics_is_correlation() {
        let claim = one("Charges tend to increase with age.");
        assert_eq!(claim.claim_type, ClaimType::Correlation);
        assert_eq!(claim.direction, ClaimDirection::Positive);

        let claim = one("BMI tends to decline with age.");
        assert_eq!(claim.claim_type, ClaimType::Correlation);
        assert_eq!(claim.direction, ClaimDirection::Negative);
    }

    #[test]
    fn test_verb_of_change_needs_two_numerics() {
        let claim = one("Charges tend to increase over time.");
        assert_ne!(claim.claim_type, ClaimType::Correlation);
    }

    #[test]
    fn test_stock_phrases_are_not_negations() {
        let claim = one("Not surprisingly, smokers have higher charges than non-smokers.");
        assert!(!claim.negated);
        assert_eq!(claim.claim_type, ClaimType::GroupDifference);

        let claim = one("Not only are charges correlated with age, they also rise with BMI.");
        assert!(!claim.negated);

        let claim = one("No doubt age is associated with higher charges.");
        assert!(!claim.negated);
    }

    #[test]
    fn test_negation_stops_at_clause_break() {
        let claim = one("Without exception, age is correlated with charges.");
        assert!(!claim.negated);
        assert_eq!(claim.claim_type, ClaimType::Correlation);

        let claim = one("Age is not correlated with BMI.");
        assert!(claim.negated);
    }

    #[test]
    fn test_descriptive_single_variable() {
        let claim = one("The average age of patients is around 39.2 years.");
        assert_eq!(claim.claim_type, ClaimType::Descriptive);
        assert_eq!(claim.variables, vec!["age"]);
        assert_eq!(claim.statistic, Some(DescriptiveStat::Mean));
        assert_eq!(claim.claimed_value, Some(39.2));
        assert!(claim.has_insufficient_variables());
    }

    #[test]
    fn test_range_claim_values() {
        let claim = one("Charges range from $1,121 to $63,770.");
        assert_eq!(claim.statistic, Some(DescriptiveStat::Range));
        assert_eq!(claim.claimed_value, Some(1121.0));
        assert_eq!(claim.secondary_value, Some(63770.0));
    }

    #[test]
    fn test_p_values_are_not_claimed_values() {
        let claim = one("The median bmi is 30.4 (p < 0.001).");
        assert_eq!(claim.statistic, Some(DescriptiveStat::Median));
        assert_eq!(claim.claimed_value, Some(30.4));
        assert_eq!(claim.secondary_value, None);
    }

    #[test]
    fn test_unresolved_variables_are_not_guessed() {
        let claim = one("Income is positively correlated with happiness.");
        assert_eq!(claim.variables, vec!["income"]);
        assert!(claim.has_insufficient_variables());
    }

    #[test]
    fn test_unclassified() {
        let claim = one("The dataset looks clean.");
        assert_eq!(claim.claim_type, ClaimType::Unclassified);
    }

    #[test]
    fn test_order_and_indices() {
        let claims = extractor()
            .extract("1. Age correlates with BMI.\n2. Smokers pay more.\n3. BMI varies.");
        let indices: Vec<usize> = claims.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(claims[2].text, "BMI varies.");
    }

    #[test]
    fn test_empty_text() {
        assert!(extractor().extract("").is_empty());
        assert!(extractor().extract("\n\n   ").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let text = "1. Age correlates with charges.\n2. Men have higher BMI than women.";
        assert_eq!(extractor().extract(text), extractor().extract(text));
    }
}
