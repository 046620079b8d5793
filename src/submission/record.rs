use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields::Field;
use super::priority::{self, Classification, Priority, PriorityPolicy, Trigger};
use super::response_id::ResponseId;

/// One answered question as delivered by the form host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    /// Multi-select answer, in the order the options were selected.
    Choices(Vec<String>),
}

impl Answer {
    /// Flatten the answer into the text stored on a record.
    ///
    /// Multi-select answers are joined with `", "`. Blank answers become `None`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Answer::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Answer::Choices(choices) => {
                let picked: Vec<&str> = choices
                    .iter()
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .collect();
                (!picked.is_empty()).then(|| picked.join(", "))
            }
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Answer::Text(s.clone())),
            Value::Array(items) => Some(Answer::Choices(
                items
                    .iter()
                    .filter_map(|v| match v {
                        Value::Null => None,
                        Value::String(s) => Some(s.clone()),
                        other => Some(other.to_string()),
                    })
                    .collect(),
            )),
            other => Some(Answer::Text(other.to_string())),
        }
    }
}

/// Label → answer pairs for a single submission, in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSubmission {
    items: Vec<(String, Answer)>,
}

impl RawSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, answer: Answer) {
        self.items.push((label.into(), answer));
    }

    pub fn with_text(mut self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.push(label, Answer::Text(text.into()));
        self
    }

    pub fn with_choices<I, S>(mut self, label: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(
            label,
            Answer::Choices(choices.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.items.iter().map(|(label, answer)| (label.as_str(), answer))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Accepts either `{"Label": "answer" | ["a", "b"], ...}` or
    /// `{"answers": [{"label": "...", "value": ...}, ...]}`.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| "Submission must be a JSON object".to_string())?;

        let mut raw = RawSubmission::new();

        if let Some(answers) = obj.get("answers").and_then(|a| a.as_array()) {
            for (idx, entry) in answers.iter().enumerate() {
                let label = entry
                    .get("label")
                    .and_then(|l| l.as_str())
                    .ok_or_else(|| format!("answers[{idx}] is missing a label"))?;
                if let Some(answer) = entry.get("value").and_then(Answer::from_value) {
                    raw.push(label, answer);
                }
            }
            return Ok(raw);
        }

        for (label, value) in obj {
            if let Some(answer) = Answer::from_value(value) {
                raw.push(label.clone(), answer);
            }
        }
        Ok(raw)
    }
}

/// Structured view of an inquiry. Every field is optional; the form host
/// enforces which ones are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub timeline: Option<String>,
    pub services: Option<String>,
    pub project_type: Option<String>,
    pub package_tier: Option<String>,
    pub budget: Option<String>,
    pub requirements: Option<String>,
    pub familiarity: Option<String>,
    pub lead_source: Option<String>,
    pub comments: Option<String>,
    pub communication_preferences: Option<String>,
}

impl InquiryFields {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Company => &self.company,
            Field::Timeline => &self.timeline,
            Field::Services => &self.services,
            Field::ProjectType => &self.project_type,
            Field::PackageTier => &self.package_tier,
            Field::Budget => &self.budget,
            Field::Requirements => &self.requirements,
            Field::Familiarity => &self.familiarity,
            Field::LeadSource => &self.lead_source,
            Field::Comments => &self.comments,
            Field::CommunicationPreferences => &self.communication_preferences,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::Company => &mut self.company,
            Field::Timeline => &mut self.timeline,
            Field::Services => &mut self.services,
            Field::ProjectType => &mut self.project_type,
            Field::PackageTier => &mut self.package_tier,
            Field::Budget => &mut self.budget,
            Field::Requirements => &mut self.requirements,
            Field::Familiarity => &mut self.familiarity,
            Field::LeadSource => &mut self.lead_source,
            Field::Comments => &mut self.comments,
            Field::CommunicationPreferences => &mut self.communication_preferences,
        }
    }
}

/// A classified inquiry. Built once per submission and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    response_id: ResponseId,
    fields: InquiryFields,
    classification: Classification,
    received_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn new(
        response_id: ResponseId,
        fields: InquiryFields,
        policy: PriorityPolicy,
        received_at: DateTime<Utc>,
    ) -> Self {
        let classification = priority::classify(&fields, policy);
        Self {
            response_id,
            fields,
            classification,
            received_at,
        }
    }

    pub fn response_id(&self) -> &ResponseId {
        &self.response_id
    }

    pub fn fields(&self) -> &InquiryFields {
        &self.fields
    }

    pub fn priority(&self) -> Priority {
        self.classification.priority
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.classification.triggers
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}
