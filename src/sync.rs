// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::Local;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::episode::{normalize, slugify};
use crate::error::SyncError;
use crate::http::{HttpClient, ReqwestClient};
use crate::post::{CoverOutcome, materialize_episode};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::source::{EpisodeSource, source_from_config};
use crate::state::{Membership, ProcessedStore, store_from_config};

/// Result of a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Number of episodes the source returned
    pub fetched: usize,
    /// Number of posts created
    pub added: usize,
    /// Number of episodes skipped because their slug was already processed
    pub existing: usize,
    /// Number of episodes that could not be turned into a post
    pub failed: usize,
    /// Details of failed episodes (title, error message)
    pub failed_episodes: Vec<(String, String)>,
}

/// Run the pipeline with the reqwest client, source and store named by `config`
pub async fn run_sync(
    config: &PipelineConfig,
    reporter: SharedProgressReporter,
) -> Result<SyncResult, SyncError> {
    let client = ReqwestClient::with_timeout(config.timeout);
    let source = source_from_config(&config.source, client.clone());
    let mut store = store_from_config(&config.store, &config.posts_dir);

    sync_posts(&client, source.as_ref(), store.as_mut(), config, reporter).await
}

/// Turn every new episode of `source` into a post under `config.posts_dir`
///
/// This is the main entry point for the library. It:
/// 1. Fetches the raw episodes (any failure aborts the run)
/// 2. Loads the processed set from `store`
/// 3. Normalizes each episode and derives its slug, in source order
/// 4. Skips slugs already processed, materializes the rest
/// 5. Records each created post in `store`
///
/// Failures of a single episode are reported and counted, never propagated.
pub async fn sync_posts<C: HttpClient>(
    client: &C,
    source: &dyn EpisodeSource,
    store: &mut dyn ProcessedStore,
    config: &PipelineConfig,
    reporter: SharedProgressReporter,
) -> Result<SyncResult, SyncError> {
    reporter.report(ProgressEvent::FetchingEpisodes {
        source: source.describe(),
    });
    let raw_episodes = source.fetch_raw_episodes().await?;
    reporter.report(ProgressEvent::EpisodesFetched {
        count: raw_episodes.len(),
    });

    let mut processed = store.load()?;
    reporter.report(ProgressEvent::ProcessedSetLoaded {
        store: store.describe(),
        existing_count: processed.existing_len(),
    });

    let today = Local::now().date_naive();
    let total_episodes = raw_episodes.len();
    let mut result = SyncResult {
        fetched: total_episodes,
        ..SyncResult::default()
    };

    for (episode_index, raw) in raw_episodes.iter().enumerate() {
        let episode = match normalize(raw, today) {
            Ok(episode) => episode,
            Err(e) => {
                let title = raw.guid.clone().unwrap_or_else(|| "<untitled>".to_string());
                debug!(%title, error = %e, "episode skipped");
                reporter.report(ProgressEvent::EpisodeFailed {
                    title: title.clone(),
                    error: e.to_string(),
                });
                result.failed += 1;
                result.failed_episodes.push((title, e.to_string()));
                continue;
            }
        };

        let slug = slugify(&episode.title, config.slug_fallback);

        match processed.check_episode(&slug, episode.guid.as_deref()) {
            Membership::New => {}
            membership => {
                debug!(%slug, ?membership, "already processed");
                reporter.report(ProgressEvent::EpisodeSkipped {
                    title: episode.title.clone(),
                    slug,
                });
                result.existing += 1;
                continue;
            }
        }

        reporter.report(ProgressEvent::EpisodeStarting {
            title: episode.title.clone(),
            slug: slug.clone(),
            date: episode.publish_date.format("%Y-%m-%d").to_string(),
            episode_index,
            total_episodes,
        });

        let post = match materialize_episode(
            client,
            &episode,
            &slug,
            &config.posts_dir,
            &config.document_extension,
        )
        .await
        {
            Ok(post) => post,
            Err(e) => {
                debug!(%slug, error = %e, "post not created");
                reporter.report(ProgressEvent::EpisodeFailed {
                    title: episode.title.clone(),
                    error: e.to_string(),
                });
                result.failed += 1;
                result.failed_episodes.push((episode.title.clone(), e.to_string()));
                continue;
            }
        };

        match post.cover {
            CoverOutcome::Saved(path) => reporter.report(ProgressEvent::CoverSaved {
                title: episode.title.clone(),
                path,
            }),
            CoverOutcome::NoImage => reporter.report(ProgressEvent::CoverSkipped {
                title: episode.title.clone(),
                reason: "episode has no image".to_string(),
            }),
            CoverOutcome::Failed(e) => reporter.report(ProgressEvent::CoverSkipped {
                title: episode.title.clone(),
                reason: e.to_string(),
            }),
        }

        processed.mark_added(&slug);
        if let Err(e) = store.record(&slug, &episode) {
            debug!(%slug, error = %e, "post created but not recorded");
            reporter.report(ProgressEvent::RecordFailed {
                title: episode.title.clone(),
                slug: slug.clone(),
                error: e.to_string(),
            });
        }

        reporter.report(ProgressEvent::EpisodeCreated {
            title: episode.title.clone(),
            path: post.directory,
        });
        result.added += 1;
    }

    info!(
        fetched = result.fetched,
        added = result.added,
        existing = result.existing,
        failed = result.failed,
        "sync completed"
    );
    reporter.report(ProgressEvent::SyncCompleted {
        fetched_count: result.fetched,
        added_count: result.added,
        existing_count: result.existing,
        failed_count: result.failed,
    });

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    use crate::config::{ProcessedStoreConfig, SourceConfig};
    use crate::error::SourceError;
    use crate::http::mock::MockHttpClient;
    use crate::post::encoded_test_image;
    use crate::progress::NoopReporter;
    use crate::progress::recording::RecordingReporter;
    use crate::source::{RawEpisode, SourceKind};
    use crate::state::{DirectoryStore, LedgerStore};
    use async_trait::async_trait;
    use image::ImageFormat;
    use tempfile::tempdir;

    struct StaticSource(Vec<RawEpisode>);

    #[async_trait]
    impl EpisodeSource for StaticSource {
        fn describe(&self) -> String {
            "static episodes".to_string()
        }

        async fn fetch_raw_episodes(&self) -> Result<Vec<RawEpisode>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl EpisodeSource for FailingSource {
        fn describe(&self) -> String {
            "failing source".to_string()
        }

        async fn fetch_raw_episodes(&self) -> Result<Vec<RawEpisode>, SourceError> {
            Err(SourceError::HttpStatus {
                url: "https://example.com/feed.xml".to_string(),
                status: 500,
            })
        }
    }

    fn raw(title: &str, image_url: Option<&str>) -> RawEpisode {
        RawEpisode {
            title: Some(title.to_string()),
            date: Some("Mon, 01 Jan 2024 12:00:00 +0000".to_string()),
            description: Some("An episode about epidemiology and statistics.".to_string()),
            guid: Some(format!("guid-{title}")),
            image_urls: image_url.map(String::from).into_iter().collect(),
            ..RawEpisode::new(SourceKind::Feed, "show42")
        }
    }

    fn config(posts_dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig::new(SourceConfig::default_feeds("show42"), posts_dir)
    }

    fn subdirectories(path: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(path)
            .unwrap()
            .map(|entry| entry.unwrap())
            .filter(|entry| entry.file_type().unwrap().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn existing_slug_is_skipped_and_new_one_added() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("already-published")).unwrap();

        let source = StaticSource(vec![
            raw("Already Published", None),
            raw("Brand New Episode", None),
        ]);
        let mut store = DirectoryStore::new(dir.path());
        let reporter = Arc::new(RecordingReporter::default());

        let result = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut store,
            &config(dir.path()),
            reporter.clone(),
        )
        .await
        .unwrap();

        assert_eq!(result.fetched, 2);
        assert_eq!(result.added, 1);
        assert_eq!(result.existing, 1);
        assert_eq!(result.failed, 0);
        assert_eq!(
            subdirectories(dir.path()),
            vec!["already-published", "brand-new-episode"]
        );
        assert!(!dir.path().join("already-published/index.qmd").exists());

        let skips: Vec<_> = reporter
            .events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::EpisodeSkipped { slug, .. } => Some(slug),
                _ => None,
            })
            .collect();
        assert_eq!(skips, vec!["already-published"]);
    }

    #[tokio::test]
    async fn unreachable_image_still_counts_as_added() {
        let dir = tempdir().unwrap();
        let source = StaticSource(vec![raw(
            "Pictured Episode",
            Some("https://unreachable.example/cover.jpg"),
        )]);
        let mut store = DirectoryStore::new(dir.path());

        let result = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut store,
            &config(dir.path()),
            NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert_eq!(result.added, 1);
        assert_eq!(result.failed, 0);
        let post_dir = dir.path().join("pictured-episode");
        assert!(post_dir.join("index.qmd").is_file());
        assert!(!post_dir.join("featured.png").exists());
    }

    #[tokio::test]
    async fn reachable_image_is_saved_as_cover() {
        let dir = tempdir().unwrap();
        let client = MockHttpClient::new().route(
            "https://example.com/cover.webp",
            200,
            encoded_test_image(ImageFormat::Png),
        );
        let source = StaticSource(vec![raw(
            "Pictured Episode",
            Some("https://example.com/cover.webp"),
        )]);
        let mut store = DirectoryStore::new(dir.path());

        sync_posts(
            &client,
            &source,
            &mut store,
            &config(dir.path()),
            NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert!(dir.path().join("pictured-episode/featured.png").is_file());
    }

    #[tokio::test]
    async fn second_run_adds_nothing() {
        let dir = tempdir().unwrap();
        let source = StaticSource(vec![raw("First", None), raw("Second", None)]);
        let config = config(dir.path());

        let first = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut DirectoryStore::new(dir.path()),
            &config,
            NoopReporter::shared(),
        )
        .await
        .unwrap();
        assert_eq!(first.added, 2);

        let second = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut DirectoryStore::new(dir.path()),
            &config,
            NoopReporter::shared(),
        )
        .await
        .unwrap();
        assert_eq!(second.added, 0);
        assert_eq!(second.existing, 2);
    }

    #[tokio::test]
    async fn duplicate_slug_within_one_run_is_added_once() {
        let dir = tempdir().unwrap();
        let source = StaticSource(vec![raw("Same Title", None), raw("Same  Title!", None)]);
        let mut store = DirectoryStore::new(dir.path());

        let result = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut store,
            &config(dir.path()),
            NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert_eq!(result.added, 1);
        assert_eq!(result.existing, 1);
        assert_eq!(result.failed, 0);
    }

    #[tokio::test]
    async fn untitled_episode_fails_without_stopping_the_run() {
        let dir = tempdir().unwrap();
        let mut untitled = raw("ignored", None);
        untitled.title = None;
        let source = StaticSource(vec![untitled, raw("Titled", None)]);
        let mut store = DirectoryStore::new(dir.path());

        let result = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut store,
            &config(dir.path()),
            NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.added, 1);
        assert_eq!(result.failed_episodes[0].0, "guid-ignored");
    }

    #[tokio::test]
    async fn ledger_store_skips_recorded_slugs() {
        let dir = tempdir().unwrap();
        let posts_dir = dir.path().join("posts");
        let ledger_path = dir.path().join("state.json");
        let mut config = config(&posts_dir);
        config.store = ProcessedStoreConfig::Ledger(ledger_path.clone());

        let source = StaticSource(vec![raw("Ledgered", None)]);

        let first = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut LedgerStore::new(&ledger_path),
            &config,
            NoopReporter::shared(),
        )
        .await
        .unwrap();
        assert_eq!(first.added, 1);
        assert!(ledger_path.is_file());

        // Removing the post does not matter, the ledger remembers it
        std::fs::remove_dir_all(posts_dir.join("ledgered")).unwrap();

        let second = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut LedgerStore::new(&ledger_path),
            &config,
            NoopReporter::shared(),
        )
        .await
        .unwrap();
        assert_eq!(second.added, 0);
        assert_eq!(second.existing, 1);
        assert!(!posts_dir.join("ledgered").exists());
    }

    #[tokio::test]
    async fn directory_race_fails_only_that_episode() {
        let dir = tempdir().unwrap();
        let ledger_path = dir.path().join("state.json");
        std::fs::create_dir(dir.path().join("racy")).unwrap();

        let source = StaticSource(vec![raw("Racy", None), raw("Calm", None)]);

        let result = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut LedgerStore::new(&ledger_path),
            &config(dir.path()),
            NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.added, 1);
        assert!(result.failed_episodes[0].1.contains("already exists"));
    }

    #[tokio::test]
    async fn source_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let posts_dir = dir.path().join("posts");

        let result = sync_posts(
            &MockHttpClient::new(),
            &FailingSource,
            &mut DirectoryStore::new(&posts_dir),
            &config(&posts_dir),
            NoopReporter::shared(),
        )
        .await;

        assert!(matches!(result, Err(SyncError::Source(_))));
        assert!(!posts_dir.exists());
    }

    #[tokio::test]
    async fn empty_source_still_completes() {
        let dir = tempdir().unwrap();
        let reporter = Arc::new(RecordingReporter::default());

        let result = sync_posts(
            &MockHttpClient::new(),
            &StaticSource(vec![]),
            &mut DirectoryStore::new(dir.path()),
            &config(dir.path()),
            reporter.clone(),
        )
        .await
        .unwrap();

        assert_eq!(result, SyncResult::default());
        assert!(matches!(
            reporter.events().last(),
            Some(ProgressEvent::SyncCompleted { added_count: 0, .. })
        ));
    }

    #[tokio::test]
    async fn unwritable_ledger_is_reported_but_post_counts() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-directory");
        std::fs::write(&blocker, "plain file").unwrap();

        let source = StaticSource(vec![raw("Recorded Nowhere", None)]);
        let mut store = LedgerStore::new(&blocker.join("state.json"));
        let reporter = Arc::new(RecordingReporter::default());

        let result = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut store,
            &config(&dir.path().join("posts")),
            reporter.clone(),
        )
        .await
        .unwrap();

        assert_eq!(result.added, 1);
        assert_eq!(result.failed, 0);
        assert!(dir.path().join("posts/recorded-nowhere/index.qmd").is_file());

        let record_failures: Vec<_> = reporter
            .events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::RecordFailed { slug, error, .. } => Some((slug, error)),
                _ => None,
            })
            .collect();
        assert_eq!(record_failures.len(), 1);
        assert_eq!(record_failures[0].0, "recorded-nowhere");
        assert!(record_failures[0].1.contains("state.json"));
    }

    #[tokio::test]
    async fn legacy_ledger_guid_skips_episode() {
        let dir = tempdir().unwrap();
        let ledger = dir.path().join(".podcast_state.json");
        std::fs::write(
            &ledger,
            r#"{"processed_episodes": ["guid-Old Episode"]}"#,
        )
        .unwrap();

        let source = StaticSource(vec![raw("Old Episode", None), raw("New Episode", None)]);
        let mut store = LedgerStore::new(&ledger);
        let posts = dir.path().join("posts");

        let result = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut store,
            &config(&posts),
            NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert_eq!(result.existing, 1);
        assert_eq!(result.added, 1);
        assert_eq!(subdirectories(&posts), vec!["new-episode"]);
    }

    #[tokio::test]
    async fn very_long_title_still_becomes_a_post() {
        let dir = tempdir().unwrap();
        let source = StaticSource(vec![raw(&"Long title words ".repeat(20), None)]);
        let mut store = DirectoryStore::new(dir.path());

        let result = sync_posts(
            &MockHttpClient::new(),
            &source,
            &mut store,
            &config(dir.path()),
            NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert_eq!(result.added, 1);
        assert_eq!(result.failed, 0);
        let created = subdirectories(dir.path());
        assert_eq!(created.len(), 1);
        assert!(created[0].len() <= crate::episode::MAX_SLUG_LENGTH);
    }
}
