//! Environment merger.
//!
//! Overlays a `{K: V}` map on the inherited `KEY=VALUE` environment: overlay
//! keys replace inherited ones, new keys are appended. Iteration order of
//! the result is unspecified; key uniqueness is guaranteed.

use std::collections::HashMap;

/// Merge `overlay` onto `inherited`. `inherited` is a `(key, value)` sequence
/// such as `std::env::vars()`; `overlay` wins on key collisions.
pub fn merge_env<I>(inherited: I, overlay: &HashMap<String, String>) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut merged: HashMap<String, String> = inherited.into_iter().collect();
    if overlay.is_empty() {
        return merged;
    }
    for (k, v) in overlay {
        merged.insert(k.clone(), v.clone());
    }
    merged
}
