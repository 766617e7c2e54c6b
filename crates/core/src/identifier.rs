//! Stable point identifiers.
//!
//! Ids come from a version-5 UUID over a fixed namespace, so the same natural
//! key maps to the same point in every process. `std::hash` and other seeded
//! hashers must not be used here: a rerun would write new points instead of
//! overwriting the old ones.

use uuid::Uuid;

const ID_MODULUS: u128 = 1_000_000_000_000;

/// Last 12 decimal digits of the v5 UUID for `key`.
pub fn point_id(key: &str) -> u64 {
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_DNS, key.as_bytes());
    (uuid.as_u128() % ID_MODULUS) as u64
}

/// Directed: `edge_id(a, b)` and `edge_id(b, a)` differ.
pub fn edge_id(source: &str, target: &str) -> u64 {
    point_id(&format!("{source}-{target}"))
}
