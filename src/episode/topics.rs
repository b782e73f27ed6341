// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Keyword and sentence heuristics over episode descriptions.
//!
//! Everything here is a pure function of the description text.

/// Categories every post carries, in this order
pub const BASE_CATEGORIES: [&str; 2] = ["health metrics", "data science"];

/// Keywords matched (case-insensitively, as substrings) against the description
pub const CATEGORY_KEYWORDS: [&str; 9] = [
    "data science",
    "machine learning",
    "artificial intelligence",
    "health metrics",
    "epidemiology",
    "public health",
    "infectious disease",
    "statistics",
    "research",
];

pub const MAX_CATEGORIES: usize = 4;

pub const MAX_TOPICS: usize = 3;

/// Topics used when no sentence of the description qualifies
pub const FALLBACK_TOPICS: [&str; 3] = [
    "Health metrics and population health",
    "Data science methods in public health research",
    "Insights and takeaways from the conversation",
];

const SUMMARY_LENGTH: usize = 200;

/// Exclusive bounds on the length of a topic sentence
const TOPIC_MIN_EXCLUSIVE: usize = 20;
const TOPIC_MAX_EXCLUSIVE: usize = 200;

/// Base categories followed by the first matching keywords, at most four in total
pub fn derive_categories(description: &str) -> Vec<String> {
    let lowered = description.to_lowercase();
    let mut categories: Vec<String> = BASE_CATEGORIES.iter().map(|c| c.to_string()).collect();

    for keyword in CATEGORY_KEYWORDS {
        if categories.len() >= MAX_CATEGORIES {
            break;
        }
        if lowered.contains(keyword) && !categories.iter().any(|c| c == keyword) {
            categories.push(keyword.to_string());
        }
    }

    categories
}

/// Up to three sentence fragments of reasonable length, in order of appearance.
///
/// Sentences are split naively on `". "`, so abbreviations break them apart.
pub fn derive_topics(description: &str) -> Vec<String> {
    let topics: Vec<String> = description
        .split(". ")
        .map(str::trim)
        .filter(|fragment| {
            let length = fragment.chars().count();
            length > TOPIC_MIN_EXCLUSIVE && length < TOPIC_MAX_EXCLUSIVE
        })
        .take(MAX_TOPICS)
        .map(String::from)
        .collect();

    if topics.is_empty() {
        FALLBACK_TOPICS.iter().map(|t| t.to_string()).collect()
    } else {
        topics
    }
}

/// First 200 characters of the description, with `...` when cut short
pub fn summarize(description: &str) -> String {
    if description.chars().count() <= SUMMARY_LENGTH {
        return description.trim().to_string();
    }

    let cut: String = description.chars().take(SUMMARY_LENGTH).collect();
    format!("{}...", cut.trim())
}
