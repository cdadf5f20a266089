//! Acting-principal identifiers for log entries

use uuid::Uuid;

/// Parse an actor identifier for inclusion as `admin_id`.
///
/// Only canonical hyphenated UUIDs qualify. Anything else (a "dev" principal,
/// a service name, an empty header) yields `None` and the field is omitted.
pub fn admin_id_from_str(raw: &str) -> Option<Uuid> {
    let raw = raw.trim();
    if !is_uuid_shaped(raw) {
        return None;
    }
    Uuid::parse_str(raw).ok()
}

/// 8-4-4-4-12 hexadecimal groups
pub fn is_uuid_shaped(raw: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

    let mut parts = raw.split('-');
    for len in GROUPS {
        match parts.next() {
            Some(part) if part.len() == len && part.bytes().all(|b| b.is_ascii_hexdigit()) => {}
            _ => return false,
        }
    }
    parts.next().is_none()
}
