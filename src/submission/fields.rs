use super::record::{InquiryFields, RawSubmission};

/// Semantic attributes of an inquiry that question labels map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
    Company,
    Timeline,
    Services,
    ProjectType,
    PackageTier,
    Budget,
    Requirements,
    Familiarity,
    LeadSource,
    Comments,
    CommunicationPreferences,
}

/// Label needle → field. A label maps to a field when it contains the needle
/// (case-sensitive). Every rule is tested against every label, so one label
/// can fill more than one field.
pub const FIELD_RULES: &[(&str, Field)] = &[
    ("Full Name", Field::Name),
    ("Email", Field::Email),
    ("Phone", Field::Phone),
    ("Company", Field::Company),
    ("Timeline", Field::Timeline),
    ("services", Field::Services),
    ("Budget", Field::Budget),
    ("Requirements", Field::Requirements),
    ("project type", Field::ProjectType),
    ("Package Tier", Field::PackageTier),
    ("familiar", Field::Familiarity),
    ("hear about", Field::LeadSource),
    ("Comments", Field::Comments),
    ("Communication Preferences", Field::CommunicationPreferences),
];

/// Fields a label maps onto, in rule order.
pub fn match_label(label: &str) -> impl Iterator<Item = Field> + '_ {
    FIELD_RULES
        .iter()
        .filter(move |(needle, _)| label.contains(needle))
        .map(|(_, field)| *field)
}

/// Map a raw submission onto [`InquiryFields`].
///
/// Labels are processed in delivery order; when two labels feed the same
/// field the later one wins. Labels that match nothing are dropped.
pub fn extract(raw: &RawSubmission) -> InquiryFields {
    let mut fields = InquiryFields::default();

    for (label, answer) in raw.items() {
        let mut matched = false;
        for field in match_label(label) {
            matched = true;
            fields.set(field, answer.to_text());
        }
        if !matched {
            tracing::debug!("Ignoring unmapped question label: {label:?}");
        }
    }

    fields
}
