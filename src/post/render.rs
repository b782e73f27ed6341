// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::episode::{Episode, derive_categories, derive_topics, summarize};

use super::COVER_FILENAME;

/// Prefix of the permalink slug written into the front matter
pub const PERMALINK_PREFIX: &str = "podcast-";

/// Render the Quarto document for an episode: front matter, player embed,
/// overview and key topics.
pub fn render_document(episode: &Episode, slug: &str) -> String {
    let categories: String = derive_categories(&episode.description)
        .iter()
        .map(|category| format!("  - {category}\n"))
        .collect();

    let topics: String = derive_topics(&episode.description)
        .iter()
        .map(|topic| format!("- {topic}\n"))
        .collect();

    format!(
        r#"---
title: {title}
date: '{date}'
image: {COVER_FILENAME}
slug: {PERMALINK_PREFIX}{slug}
toc: true
categories:
{categories}summary: {summary}
execute:
  eval: false
---


<iframe data-testid="embed-iframe" style="border-radius:12px" src="{embed}" width="624" height="351" frameBorder="0" allowfullscreen="" allow="autoplay; clipboard-write; encrypted-media; fullscreen; picture-in-picture" loading="lazy"></iframe>


## Episode Overview

{description}

## Key Topics Discussed

{topics}
"#,
        title = yaml_quote(&episode.title),
        date = episode.publish_date.format("%Y-%m-%d"),
        summary = yaml_quote(&summarize(&episode.description)),
        embed = html_escape::encode_double_quoted_attribute(&episode.embed_url),
        description = episode.description,
    )
}

/// Double-quoted YAML scalar
fn yaml_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => {}
            '\t' => quoted.push_str("\\t"),
            c if c.is_ascii_control() => quoted.push_str(&format!("\\x{:02x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
