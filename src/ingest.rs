use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::db::{Database, NewArticle, UpsertResult};
use crate::fetcher::{FeedClient, RawArticle};
use crate::sanitize::{clean_text, clean_url};

/// Why the normalizer declined a record. A data-quality outcome, not an
/// error: the record is skipped and counted, nothing is propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingTitle,
    MissingUrl,
    InvalidTimestamp,
}

/// Map a raw feed record into a storable article.
///
/// The identity is the cleaned URL. Records without a usable timestamp are
/// rejected outright rather than stamped with an arbitrary "now".
pub fn normalize(raw: &RawArticle, fallback_category: &str) -> Result<NewArticle, RejectReason> {
    let title = clean_text(raw.title.as_deref());
    let description = clean_text(raw.description.as_deref());
    let source = clean_text(raw.source.as_ref().and_then(|s| s.name.as_deref()));
    let category = clean_text(raw.category.as_deref())
        .unwrap_or_else(|| fallback_category.to_string());

    let url = clean_url(raw.url.as_deref());
    let image_url = clean_url(raw.url_to_image.as_deref());

    let published = raw
        .published_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(RejectReason::InvalidTimestamp)?;

    let title = title.ok_or(RejectReason::MissingTitle)?;
    let url = url.ok_or(RejectReason::MissingUrl)?;

    Ok(NewArticle {
        url,
        title,
        description,
        image_url,
        source,
        category,
        published,
    })
}

/// One category- or article-level failure recorded during a run.
#[derive(Debug, Clone)]
pub struct IngestFailure {
    pub category: String,
    /// Set for storage failures; `None` for category fetch failures.
    pub article_url: Option<String>,
    pub message: String,
}

/// Outcome of one full pass over the configured categories. Produced once
/// per run and reported through the logs; never persisted.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub categories_attempted: usize,
    pub articles_seen: usize,
    pub inserted: usize,
    pub updated: usize,
    pub rejected: usize,
    pub failures: Vec<IngestFailure>,
}

pub struct Ingestor {
    client: FeedClient,
    db: Arc<Database>,
    categories: Vec<String>,
}

impl Ingestor {
    pub fn new(client: FeedClient, db: Arc<Database>, categories: Vec<String>) -> Self {
        Self {
            client,
            db,
            categories,
        }
    }

    /// One full ingest pass. A failing category or article never aborts the
    /// run; every failure lands in the summary instead.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        info!("Ingesting {} categories", self.categories.len());

        for category in &self.categories {
            summary.categories_attempted += 1;

            let batch = match self.client.fetch_category(category).await {
                Ok(batch) => batch,
                Err(e) => {
                    error!(category = %category, error = %e, "failed to fetch category");
                    summary.failures.push(IngestFailure {
                        category: category.clone(),
                        article_url: None,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            for raw in &batch {
                summary.articles_seen += 1;

                let article = match normalize(raw, category) {
                    Ok(article) => article,
                    Err(reason) => {
                        debug!(category = %category, reason = ?reason, "rejected record");
                        summary.rejected += 1;
                        continue;
                    }
                };

                match self.db.upsert_article(&article).await {
                    Ok(UpsertResult::Inserted) => summary.inserted += 1,
                    Ok(UpsertResult::Updated) => summary.updated += 1,
                    Err(e) => {
                        error!(
                            category = %category,
                            url = %article.url,
                            error = %e,
                            "failed to store article"
                        );
                        summary.failures.push(IngestFailure {
                            category: category.clone(),
                            article_url: Some(article.url.clone()),
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            categories = summary.categories_attempted,
            seen = summary.articles_seen,
            inserted = summary.inserted,
            updated = summary.updated,
            rejected = summary.rejected,
            failures = summary.failures.len(),
            "ingest run complete"
        );
        summary
    }
}

/// Periodic ingest driver: one run immediately, then one per interval.
pub async fn start_background_ingest(ingestor: Arc<Ingestor>, interval_minutes: u64) {
    let interval = Duration::from_secs(interval_minutes * 60);

    info!("Starting initial ingest run");
    ingestor.run().await;

    loop {
        tokio::time::sleep(interval).await;
        info!("Starting scheduled ingest run");
        ingestor.run().await;
    }
}
