use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

/// Document keys that hold instants in stored entities.
pub const TIMESTAMP_FIELDS: &[&str] = &["created_at", "updated_at", "due_date"];

/// Current UTC instant truncated to microseconds, so the canonical storage
/// form reads back to the exact same value.
pub fn utc_now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

pub fn to_canonical(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Rewrite every known timestamp-bearing field to the canonical ISO-8601
/// form, descending into nested objects and arrays. Values that do not parse
/// are left untouched rather than failing the document.
pub fn transcode_timestamps(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if TIMESTAMP_FIELDS.contains(&key.as_str()) {
                    if let JsonValue::String(raw) = entry {
                        if let Some(parsed) = parse_instant(raw) {
                            *entry = JsonValue::String(to_canonical(&parsed));
                        }
                    }
                } else {
                    transcode_timestamps(entry);
                }
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                transcode_timestamps(item);
            }
        }
        _ => {}
    }
}

/// Serde helper for optional instants that tolerates unparsable stored
/// values by mapping them to `None` instead of failing the read.
pub mod lenient_instant {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(instant) => serializer.serialize_str(&super::to_canonical(instant)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_instant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn utc_now_round_trips_through_canonical_form() {
        let now = utc_now();
        let canonical = to_canonical(&now);
        assert_eq!(parse_instant(&canonical), Some(now));
    }

    #[test]
    fn transcode_canonicalizes_known_fields() {
        let mut doc = json!({
            "id": "card-1",
            "created_at": "2026-01-02T03:04:05.000006+00:00",
            "title": "2026-01-02T03:04:05.000006+00:00",
        });

        transcode_timestamps(&mut doc);

        assert_eq!(doc["created_at"], "2026-01-02T03:04:05.000006Z");
        // Non-timestamp fields are never rewritten, even when they look like instants.
        assert_eq!(doc["title"], "2026-01-02T03:04:05.000006+00:00");
    }

    #[test]
    fn transcode_leaves_unparsable_values_untouched() {
        let mut doc = json!({
            "due_date": "next tuesday",
            "nested": [{"updated_at": "garbage"}],
        });

        transcode_timestamps(&mut doc);

        assert_eq!(doc["due_date"], "next tuesday");
        assert_eq!(doc["nested"][0]["updated_at"], "garbage");
    }

    #[test]
    fn transcode_descends_into_nested_documents() {
        let mut doc = json!({
            "entries": [{"created_at": "2026-05-06T07:08:09Z"}],
        });

        transcode_timestamps(&mut doc);

        assert_eq!(doc["entries"][0]["created_at"], "2026-05-06T07:08:09.000000Z");
    }
}
