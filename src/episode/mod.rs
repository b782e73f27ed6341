// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod normalize;
mod slug;
mod topics;

pub use normalize::{DESCRIPTION_PLACEHOLDER, Episode, normalize};
pub use slug::{MAX_SLUG_LENGTH, MIN_SLUG_LENGTH, fallback_slug, slugify, try_slugify};
pub use topics::{
    BASE_CATEGORIES, CATEGORY_KEYWORDS, FALLBACK_TOPICS, MAX_CATEGORIES, MAX_TOPICS,
    derive_categories, derive_topics, summarize,
};
