//! Structured claims extracted from generated text.

use serde::{Deserialize, Serialize};

/// What kind of relationship a claim asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    /// Two numeric variables move together.
    Correlation,
    /// A numeric variable differs across levels of a categorical one.
    GroupDifference,
    /// Two categorical variables are not independent.
    Association,
    /// A statement about one variable's distribution.
    Descriptive,
    /// Nothing in the fixed taxonomy matched.
    Unclassified,
}

impl ClaimType {
    pub fn label(&self) -> &'static str {
        match self {
            ClaimType::Correlation => "Correlation",
            ClaimType::GroupDifference => "Group Difference",
            ClaimType::Association => "Association",
            ClaimType::Descriptive => "Descriptive",
            ClaimType::Unclassified => "Unclassified",
        }
    }

    /// Whether the claim type carries a direction that must agree with the data.
    pub fn is_directional(&self) -> bool {
        matches!(self, ClaimType::Correlation | ClaimType::GroupDifference)
    }
}

/// Direction a claim asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimDirection {
    Positive,
    Negative,
    None,
    /// Both positive and negative cues were present.
    Ambiguous,
}

impl ClaimDirection {
    pub fn label(&self) -> &'static str {
        match self {
            ClaimDirection::Positive => "positive",
            ClaimDirection::Negative => "negative",
            ClaimDirection::None => "none",
            ClaimDirection::Ambiguous => "ambiguous",
        }
    }
}

/// Statistic a descriptive claim makes a statement about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptiveStat {
    Mean,
    Median,
    StdDev,
    Minimum,
    Maximum,
    Range,
    Count,
}

impl DescriptiveStat {
    pub fn label(&self) -> &'static str {
        match self {
            DescriptiveStat::Mean => "mean",
            DescriptiveStat::Median => "median",
            DescriptiveStat::StdDev => "standard deviation",
            DescriptiveStat::Minimum => "minimum",
            DescriptiveStat::Maximum => "maximum",
            DescriptiveStat::Range => "range",
            DescriptiveStat::Count => "count",
        }
    }
}

/// A categorical level named in the claim text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelMention {
    pub variable: String,
    pub level: String,
}

/// Which group a claim says has the higher or lower value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupComparison {
    /// The categorical variable defining the groups.
    pub variable: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub higher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lower: Option<String>,
}

/// Flags the extractor attaches for the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClaimTag {
    /// Fewer than two dataset variables were recognized.
    InsufficientVariables,
}

/// Byte range of a claim in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

/// One independently verifiable assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Position in extraction order, starting at 0.
    pub index: usize,
    pub text: String,
    pub span: TextSpan,
    pub claim_type: ClaimType,
    /// Resolved column names in order of first mention.
    pub variables: Vec<String>,
    pub direction: ClaimDirection,
    /// The claim denies a relationship ("no significant correlation").
    #[serde(default)]
    pub negated: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub claimed_value: Option<f64>,
    /// Second number, used as the upper bound of range claims.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub secondary_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub statistic: Option<DescriptiveStat>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub levels: Vec<LevelMention>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group: Option<GroupComparison>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<ClaimTag>,
}

impl Claim {
    /// A bare claim of the given type; used by tests and callers that build
    /// claims without the extractor.
    pub fn new(index: usize, text: impl Into<String>, claim_type: ClaimType) -> Self {
        let text = text.into();
        let span = TextSpan {
            start: 0,
            end: text.len(),
        };
        Self {
            index,
            text,
            span,
            claim_type,
            variables: Vec::new(),
            direction: ClaimDirection::None,
            negated: false,
            claimed_value: None,
            secondary_value: None,
            statistic: None,
            levels: Vec::new(),
            group: None,
            tags: Vec::new(),
        }
    }

    /// Set the resolved variables and refresh the insufficient-variables tag.
    pub fn with_variables<S: Into<String>>(
        mut self,
        variables: impl IntoIterator<Item = S>,
    ) -> Self {
        self.variables = variables.into_iter().map(Into::into).collect();
        self.tags.retain(|t| *t != ClaimTag::InsufficientVariables);
        if self.variables.len() < 2 {
            self.tags.push(ClaimTag::InsufficientVariables);
        }
        self
    }

    pub fn with_direction(mut self, direction: ClaimDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.claimed_value = Some(value);
        self
    }

    pub fn with_statistic(mut self, statistic: DescriptiveStat) -> Self {
        self.statistic = Some(statistic);
        self
    }

    pub fn with_group(mut self, group: GroupComparison) -> Self {
        self.group = Some(group);
        self
    }

    pub fn has_tag(&self, tag: ClaimTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn has_insufficient_variables(&self) -> bool {
        self.has_tag(ClaimTag::InsufficientVariables)
    }
}
