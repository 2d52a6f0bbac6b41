use uuid::Uuid;

/// Generates a new collection id such as `char_5f0c...`.
///
/// Ids are random v4 UUIDs, so a deleted id is never handed out again.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}
