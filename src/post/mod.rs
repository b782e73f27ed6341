// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod cover;
mod render;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::episode::Episode;
use crate::error::{ImageError, MaterializeError};
use crate::http::HttpClient;

pub use cover::{COVER_FILENAME, write_cover_image};
pub use render::{PERMALINK_PREFIX, render_document};

#[cfg(test)]
pub(crate) use cover::encoded_test_image;

/// What happened to the cover image of a materialized post
#[derive(Debug)]
pub enum CoverOutcome {
    Saved(PathBuf),
    /// The episode has no image URL
    NoImage,
    /// Download or conversion failed; the post itself still exists
    Failed(ImageError),
}

/// Files created for one episode
#[derive(Debug)]
pub struct MaterializedPost {
    pub directory: PathBuf,
    pub document: PathBuf,
    pub cover: CoverOutcome,
}

/// Create `<posts_dir>/<slug>/` with the rendered document and, if possible, a cover image.
///
/// Fails if the directory already exists or the document cannot be written.
/// Nothing is rolled back on failure.
pub async fn materialize_episode<C: HttpClient>(
    client: &C,
    episode: &Episode,
    slug: &str,
    posts_dir: &Path,
    extension: &str,
) -> Result<MaterializedPost, MaterializeError> {
    tokio::fs::create_dir_all(posts_dir)
        .await
        .map_err(|e| MaterializeError::CreateDirectoryFailed {
            path: posts_dir.to_path_buf(),
            source: e,
        })?;

    let directory = posts_dir.join(slug);
    match tokio::fs::create_dir(&directory).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(MaterializeError::DirectoryExists(directory));
        }
        Err(e) => {
            return Err(MaterializeError::CreateDirectoryFailed {
                path: directory,
                source: e,
            });
        }
    }

    let document = directory.join(format!("index.{extension}"));
    tokio::fs::write(&document, render_document(episode, slug))
        .await
        .map_err(|e| MaterializeError::WriteDocumentFailed {
            path: document.clone(),
            source: e,
        })?;
    info!(path = %document.display(), "document written");

    let cover = match episode.image_url.as_deref() {
        None => CoverOutcome::NoImage,
        Some(url) => {
            let path = directory.join(COVER_FILENAME);
            match write_cover_image(client, url, &path).await {
                Ok(()) => CoverOutcome::Saved(path),
                Err(e) => {
                    debug!(%url, error = %e, "cover image not saved");
                    CoverOutcome::Failed(e)
                }
            }
        }
    };

    Ok(MaterializedPost {
        directory,
        document,
        cover,
    })
}
