use crate::graph::EntityKind;

/// Honorifics that mark a name as a person
const PERSON_MARKERS: &[&str] = &["mr.", "mrs.", "ms.", "dr.", "prof."];

/// Guess whether `name` denotes a person or a company.
///
/// Matching is case-insensitive and by substring, so `"Dr. Jane Roe"` is a
/// person. Every other name is a company, whether or not it carries a
/// corporate suffix such as `Inc`, `Ltd` or `Holdings`; a person marker wins
/// over such a suffix.
pub fn detect_entity_kind(name: &str) -> EntityKind {
    let lower = name.to_lowercase();

    if PERSON_MARKERS.iter().any(|m| lower.contains(m)) {
        return EntityKind::Person;
    }
    EntityKind::Company
}

/// Kind for one CSV cell: an explicit label when the cell is filled,
/// otherwise detection from the entity name.
pub fn resolve_entity_kind(name: &str, explicit: Option<&str>) -> EntityKind {
    match explicit {
        Some(label) if !label.trim().is_empty() => EntityKind::from_label(label),
        _ => detect_entity_kind(name),
    }
}
