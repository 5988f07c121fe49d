use crate::extract::record::RecordFields;
use crate::extract::rules::{rule_for, Field};
use scraper::Html;

/// Runs the rule of one field against a parsed page
///
/// Single-valued fields keep only the first accepted value.
pub fn extract_field(field: Field, document: &Html, raw: &str) -> Vec<String> {
    let mut values = rule_for(field).evaluate(document, raw);
    if !field.is_multi_valued() {
        values.truncate(1);
    }

    if values.is_empty() {
        tracing::debug!(field = field.key(), "Field absent");
    } else {
        tracing::debug!(field = field.key(), values = values.len(), "Field found");
    }

    values
}

/// Runs every field rule against a parsed page
///
/// Extraction never fails: a field no rule can recover is left empty.
pub fn extract_fields(document: &Html, raw: &str) -> RecordFields {
    let mut fields = RecordFields::default();

    for field in Field::ALL {
        let mut values = extract_field(field, document, raw);
        match field {
            Field::Images => fields.images = values,
            Field::Features => fields.features = values,
            _ => {
                let value = values.pop();
                match field {
                    Field::Title => fields.title = value,
                    Field::Price => fields.price = value,
                    Field::Rating => fields.rating = value,
                    Field::RatingCount => fields.rating_count = value,
                    Field::Availability => fields.availability = value,
                    Field::Description => fields.description = value,
                    Field::Images | Field::Features => {}
                }
            }
        }
    }

    fields
}
