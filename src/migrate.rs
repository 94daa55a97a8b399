//! Schema migration – turns raw loaded JSON of unknown or older shape into
//! a fully-populated [`ResumeSnapshot`].
//!
//! Runs once at load time, never mid-session. Everything here recovers
//! rather than rejects: missing fields default, legacy plain-string image
//! arrays coerce into captioned records (the serde layer handles that),
//! over-long lists truncate to their caps, short award lists pad from the
//! default set, and images that arrived without ids get generated ones.

use serde_json::Value;

use crate::snapshot::{
    Award, CaptionedImage, ResumeSnapshot, MAX_HOBBY_IMAGES, MAX_PORTFOLIO_IMAGES,
    MAX_SOCIAL_IMAGES, MAX_SPECIALTIES,
};
use crate::theme;

/// Migrate raw JSON into a complete snapshot. Total: malformed input
/// yields a defaulted snapshot, never an error.
pub fn migrate_snapshot(raw: &Value) -> ResumeSnapshot {
    let mut snapshot: ResumeSnapshot =
        serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
            log::warn!("stored snapshot unreadable, starting fresh: {e}");
            empty_snapshot()
        });

    // A malformed accent would classify as "not light" everywhere; replace
    // it outright so derived tokens have a real base.
    if theme::Color::from_hex(&snapshot.accent_color).is_none() {
        log::warn!(
            "malformed accent color {:?}, falling back to default",
            snapshot.accent_color
        );
        snapshot.accent_color = ResumeSnapshot::fallback_accent().to_string();
    }

    snapshot.hobbies.specialties.truncate(MAX_SPECIALTIES);
    snapshot.hobbies.images.truncate(MAX_HOBBY_IMAGES);
    snapshot.social_practice.images.truncate(MAX_SOCIAL_IMAGES);
    snapshot.portfolio.images.truncate(MAX_PORTFOLIO_IMAGES);

    assign_missing_ids(&mut snapshot.quality_reports, "quality");
    assign_missing_ids(&mut snapshot.certificates, "certificate");
    assign_missing_ids(&mut snapshot.portfolio.images, "portfolio");
    assign_missing_ids(&mut snapshot.hobbies.images, "hobby");
    assign_missing_ids(&mut snapshot.social_practice.images, "social");

    pad_awards(&mut snapshot.awards);

    snapshot
}

/// Parse a stored JSON string, tolerating empty and invalid input.
pub fn load_snapshot(raw: Option<&str>) -> ResumeSnapshot {
    let value = match raw {
        None => Value::Object(Default::default()),
        Some(text) => serde_json::from_str::<Value>(text).unwrap_or_else(|e| {
            log::warn!("stored snapshot is not valid JSON, starting fresh: {e}");
            Value::Object(Default::default())
        }),
    };
    migrate_snapshot(&value)
}

/// A snapshot with every serde default applied (the derived `Default`
/// would miss field-level defaults like the accent color).
fn empty_snapshot() -> ResumeSnapshot {
    serde_json::from_value(Value::Object(Default::default()))
        .unwrap_or_default()
}

/// Legacy image records had no ids; list-keyed mutation needs stable
/// unique ones.
fn assign_missing_ids(images: &mut [CaptionedImage], label: &str) {
    for (i, item) in images.iter_mut().enumerate() {
        if item.id.is_empty() {
            item.id = format!("migrated-{label}-{i}");
        }
    }
}

/// Pad short or empty award lists from the default set, skipping defaults
/// whose id is already taken.
fn pad_awards(awards: &mut Vec<Award>) {
    let target = Award::defaults().len();
    if awards.len() >= target {
        return;
    }
    for default in Award::defaults() {
        if awards.len() >= target {
            break;
        }
        if awards.iter().any(|a| a.id == default.id) {
            continue;
        }
        awards.push(default);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_input_gets_full_defaults() {
        let snap = load_snapshot(None);
        assert_eq!(snap.accent_color, "#0ea5e9");
        assert_eq!(snap.awards.len(), 8);
        assert!(snap.cover.show_avatar);
    }

    #[test]
    fn invalid_json_starts_fresh() {
        let snap = load_snapshot(Some("{not json"));
        assert_eq!(snap.accent_color, "#0ea5e9");
        assert_eq!(snap.awards.len(), 8);
    }

    #[test]
    fn legacy_arrays_and_missing_ids_coerce() {
        let raw = json!({
            "certificates": ["data:image/png;base64,AAAA"],
            "hobbies": { "images": ["data:image/png;base64,BBBB"] }
        });
        let snap = migrate_snapshot(&raw);
        assert_eq!(snap.certificates[0].id, "migrated-certificate-0");
        assert_eq!(snap.hobbies.images[0].id, "migrated-hobby-0");
        assert_eq!(snap.hobbies.images[0].image, "data:image/png;base64,BBBB");
    }

    #[test]
    fn specialties_truncate_to_cap() {
        let raw = json!({
            "hobbies": { "specialties": ["a", "b", "c", "d", "e"] }
        });
        let snap = migrate_snapshot(&raw);
        assert_eq!(snap.hobbies.specialties, vec!["a", "b", "c"]);
    }

    #[test]
    fn short_award_lists_pad_without_clobbering() {
        let raw = json!({
            "awards": [{ "id": "mine", "name": "Chess Club Champion" }]
        });
        let snap = migrate_snapshot(&raw);
        assert_eq!(snap.awards.len(), 8);
        assert_eq!(snap.awards[0].name, "Chess Club Champion");
    }

    #[test]
    fn malformed_accent_replaced_wholesale() {
        let raw = json!({ "accent_color": "tomato" });
        let snap = migrate_snapshot(&raw);
        assert_eq!(snap.accent_color, "#0ea5e9");
    }

    #[test]
    fn overflowing_collections_truncate() {
        let images: Vec<&str> = (0..7).map(|_| "data:image/png;base64,AAAA").collect();
        let raw = json!({ "hobbies": { "images": images } });
        let snap = migrate_snapshot(&raw);
        assert_eq!(snap.hobbies.images.len(), MAX_HOBBY_IMAGES);
    }
}
