use serde::{Deserialize, Serialize};

use super::fields::Field;
use super::record::InquiryFields;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How matched rules combine into a final tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityPolicy {
    /// Each matching rule overwrites the running tier, so the last match wins.
    /// A submission with both a HIGH and a LOW signal ends up LOW.
    #[default]
    Sequential,
    /// The highest tier among matching rules wins.
    HighestWins,
}

impl std::str::FromStr for PriorityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(PriorityPolicy::Sequential),
            "highest" | "highest_wins" => Ok(PriorityPolicy::HighestWins),
            other => Err(format!("unknown priority policy '{other}'")),
        }
    }
}

/// A classification rule that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    AsapTimeline,
    HighBudget,
    MobileApplication,
    ExploringTimeline,
    ConsultationBudget,
}

impl Trigger {
    /// The tier this trigger votes for.
    pub fn tier(&self) -> Priority {
        match self {
            Trigger::AsapTimeline | Trigger::HighBudget | Trigger::MobileApplication => {
                Priority::High
            }
            Trigger::ExploringTimeline | Trigger::ConsultationBudget => Priority::Low,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Trigger::AsapTimeline => "URGENT timeline requirement",
            Trigger::HighBudget => "High budget potential",
            Trigger::MobileApplication => "Mobile application project",
            Trigger::ExploringTimeline => "Client is just exploring options",
            Trigger::ConsultationBudget => "Budget needs consultation",
        }
    }
}

struct Rule {
    trigger: Trigger,
    field: Field,
    needles: &'static [&'static str],
}

// Evaluation order matters for `PriorityPolicy::Sequential`.
const RULES: &[Rule] = &[
    Rule {
        trigger: Trigger::AsapTimeline,
        field: Field::Timeline,
        needles: &["ASAP"],
    },
    Rule {
        trigger: Trigger::HighBudget,
        field: Field::Budget,
        needles: &["$15,000+", "Enterprise"],
    },
    Rule {
        trigger: Trigger::MobileApplication,
        field: Field::Services,
        needles: &["Mobile Application"],
    },
    Rule {
        trigger: Trigger::ExploringTimeline,
        field: Field::Timeline,
        needles: &["Just exploring"],
    },
    Rule {
        trigger: Trigger::ConsultationBudget,
        field: Field::Budget,
        needles: &["Need consultation"],
    },
];

/// Outcome of classifying one inquiry: the tier and every rule that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub priority: Priority,
    pub triggers: Vec<Trigger>,
}

impl Classification {
    /// Matched triggers that argue for HIGH, in rule order.
    pub fn urgent_reasons(&self) -> impl Iterator<Item = Trigger> + '_ {
        self.triggers
            .iter()
            .copied()
            .filter(|t| t.tier() == Priority::High)
    }
}

/// Classify an inquiry. Total and side-effect free.
pub fn classify(fields: &InquiryFields, policy: PriorityPolicy) -> Classification {
    let triggers: Vec<Trigger> = RULES
        .iter()
        .filter(|rule| {
            fields
                .get(rule.field)
                .is_some_and(|value| rule.needles.iter().any(|n| value.contains(n)))
        })
        .map(|rule| rule.trigger)
        .collect();

    let priority = match policy {
        PriorityPolicy::Sequential => triggers
            .last()
            .map(Trigger::tier)
            .unwrap_or_default(),
        PriorityPolicy::HighestWins => triggers
            .iter()
            .map(Trigger::tier)
            .max()
            .unwrap_or_default(),
    };

    Classification { priority, triggers }
}
