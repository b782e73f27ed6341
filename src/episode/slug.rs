// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::config::SlugFallback;

/// Shortest slug accepted before the fallback kicks in
pub const MIN_SLUG_LENGTH: usize = 3;

/// Longest slug kept; longer ones are cut at this many characters
pub const MAX_SLUG_LENGTH: usize = 50;

const HASH_PREFIX_LENGTH: usize = 12;

/// Derive the slug for an episode title.
///
/// Lowercases, keeps only `[a-z0-9]`, whitespace and hyphens, then turns every
/// run of whitespace/hyphens into a single hyphen and strips hyphens from both
/// ends. The result is cut to [`MAX_SLUG_LENGTH`]. Titles that collapse to
/// fewer than [`MIN_SLUG_LENGTH`] characters get a fallback slug instead.
///
/// With [`SlugFallback::Timestamp`] the fallback embeds the current second, so
/// two calls on such a title are not guaranteed to agree.
pub fn slugify(title: &str, fallback: SlugFallback) -> String {
    try_slugify(title).unwrap_or_else(|| fallback_slug(title, fallback))
}

/// Slug for a title, or `None` when it is too short to be used
pub fn try_slugify(title: &str) -> Option<String> {
    let lowered = title.to_lowercase();
    let kept = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-');

    let collapsed = collapse_separators(kept);
    let trimmed = collapsed.trim_matches('-');
    // only ASCII survives the filter above, so byte slicing is safe
    let slug = trimmed[..trimmed.len().min(MAX_SLUG_LENGTH)].trim_end_matches('-');

    (slug.len() >= MIN_SLUG_LENGTH).then(|| slug.to_string())
}

/// Replacement slug for titles with no usable characters
pub fn fallback_slug(title: &str, fallback: SlugFallback) -> String {
    match fallback {
        SlugFallback::Timestamp => format!("episode-{}", Utc::now().timestamp()),
        SlugFallback::TitleHash => {
            let digest = format!("{:x}", Sha256::digest(title.as_bytes()));
            format!("episode-{}", &digest[..HASH_PREFIX_LENGTH])
        }
    }
}

/// Collapse runs of whitespace and hyphens into single hyphens
fn collapse_separators(chars: impl Iterator<Item = char>) -> String {
    let mut result = String::new();
    let mut last_was_separator = false;

    for c in chars {
        if c == '-' || c.is_whitespace() {
            if !last_was_separator {
                result.push('-');
                last_was_separator = true;
            }
        } else {
            result.push(c);
            last_was_separator = false;
        }
    }

    result
}
