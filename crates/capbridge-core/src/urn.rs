//! Helpers for the versioned capability URN shape.
//!
//! Every node in a capability document is typed by a URN of the form
//! `urn:<namespace>:<kind>:<name>:<value-code>:<vendor-product>:<version>`,
//! for example `urn:cap-spec-v2:property:temperature:00000020:acme-mc5:1`.

/// Namespace segment of the standard vocabulary. Types under any other
/// namespace are vendor-proprietary.
pub const STANDARD_NAMESPACE: &str = "cap-spec-v2";

/// Number of leading segments shared by all revisions of one type; the
/// standard-library translation dictionaries are keyed by this prefix.
pub const TYPE_PREFIX_SEGMENTS: usize = 5;

/// Machine name of a typed node (the fourth URN segment).
pub fn name(urn: &str) -> &str {
    urn.split(':').nth(3).unwrap_or("")
}

/// The 5-segment type prefix, or `None` when the URN is too short.
pub fn type_prefix(urn: &str) -> Option<&str> {
    let mut end = 0;
    let mut segments = 0;
    for (i, b) in urn.bytes().enumerate() {
        if b == b':' {
            segments += 1;
            if segments == TYPE_PREFIX_SEGMENTS {
                end = i;
                break;
            }
        }
    }
    if segments == TYPE_PREFIX_SEGMENTS {
        Some(&urn[..end])
    } else {
        None
    }
}

/// Whether the type lives outside the standard vocabulary.
pub fn is_proprietary(urn: &str) -> bool {
    urn.split(':').nth(1) != Some(STANDARD_NAMESPACE)
}

/// The URN with its trailing version segment removed; overlay filter tables
/// are keyed by this truncated form so one rule covers all revisions.
pub fn without_version(urn: &str) -> &str {
    match urn.rfind(':') {
        Some(idx) => &urn[..idx],
        None => urn,
    }
}
