//! Wiki export
//!
//! Pages are exported concurrently, bounded by a semaphore. Within a page,
//! versions are walked from 1 to the current version; version N is written
//! before N+1 is requested. Attachments follow once all versions are done.
//!
//! The first page-level error is kept in a shared slot. Once it is set no
//! further pages are started, pages already running finish, and the error
//! is handed back to the caller.

use crate::adapters::trac::{AttachmentParent, TracClient};
use crate::core::store::{write_bytes, write_json, StoreLayout};
use crate::domain::{MigrationError, Result};
use crate::log_record_skipped;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

/// Counts for one exported page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WikiPageOutcome {
    pub name: String,
    pub versions_written: usize,
    pub attachments_written: usize,
    pub attachments_failed: usize,
}

/// What a wiki export run produced
#[derive(Debug, Default)]
pub struct WikiExport {
    /// Pages that completed
    pub pages: Vec<WikiPageOutcome>,
    /// First page error; set means the export was aborted
    pub error: Option<MigrationError>,
}

impl WikiExport {
    pub fn versions_written(&self) -> usize {
        self.pages.iter().map(|p| p.versions_written).sum()
    }

    pub fn into_result(self) -> Result<Vec<WikiPageOutcome>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.pages),
        }
    }
}

#[derive(Clone)]
pub struct WikiExporter {
    client: TracClient,
    layout: StoreLayout,
    concurrency: usize,
    include_attachments: bool,
}

impl WikiExporter {
    pub fn new(
        client: TracClient,
        layout: StoreLayout,
        concurrency: usize,
        include_attachments: bool,
    ) -> Self {
        Self {
            client,
            layout,
            concurrency: concurrency.max(1),
            include_attachments,
        }
    }

    /// Lists every page and exports it
    ///
    /// # Errors
    ///
    /// Fails only if the page list cannot be fetched; page errors are
    /// reported in [`WikiExport::error`].
    pub async fn export(&self) -> Result<WikiExport> {
        let names = self.client.wiki_page_names().await?;
        tracing::info!(pages = names.len(), concurrency = self.concurrency, "Exporting wiki");
        Ok(self.export_pages(names).await)
    }

    pub async fn export_pages(&self, names: Vec<String>) -> WikiExport {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let first_error: Arc<Mutex<Option<MigrationError>>> = Arc::new(Mutex::new(None));
        let exporter = Arc::new(self.clone());

        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            if first_error.lock().await.is_some() {
                tracing::warn!(page = %name, "Wiki export aborted; page not started");
                break;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            // Re-check: an error may have been recorded while waiting for a slot
            if first_error.lock().await.is_some() {
                break;
            }

            let exporter = Arc::clone(&exporter);
            let first_error = Arc::clone(&first_error);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                match exporter.export_page(&name).await {
                    Ok(outcome) => Some(outcome),
                    Err(error) => {
                        log_record_skipped!("wiki page", name, error);
                        let mut slot = first_error.lock().await;
                        if slot.is_none() {
                            *slot = Some(error);
                        }
                        None
                    }
                }
            }));
        }

        let mut pages = Vec::new();
        for joined in join_all(handles).await {
            match joined {
                Ok(Some(outcome)) => pages.push(outcome),
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "Wiki worker panicked"),
            }
        }

        let error = first_error.lock().await.take();
        WikiExport { pages, error }
    }

    /// Exports every version of one page, then its attachments
    ///
    /// # Errors
    ///
    /// Any failed source call; the error carries the page name.
    pub async fn export_page(&self, name: &str) -> Result<WikiPageOutcome> {
        let with_page = |e: MigrationError| e.with_key(format!("wiki page {name}"));
        let current = self.client.wiki_page_info(name).await.map_err(with_page)?;

        let mut outcome = WikiPageOutcome {
            name: name.to_string(),
            ..WikiPageOutcome::default()
        };

        for version in 1..=current.version {
            let content = self
                .client
                .wiki_page_version(name, version)
                .await
                .map_err(with_page)?;
            let key = format!("{name} v{version}");
            match content {
                Some(text) => {
                    let path = self.layout.wiki_content_file(name, version);
                    if let Err(e) = write_bytes(&path, text.as_bytes()).await {
                        log_record_skipped!("wiki version", key, e);
                        continue;
                    }
                }
                None => tracing::debug!(page = name, version, "Wiki version has no text"),
            }

            let info = self
                .client
                .wiki_page_info_version(name, version)
                .await
                .map_err(with_page)?;
            if let Err(e) = write_json(&self.layout.wiki_meta_file(name, version), &info).await {
                log_record_skipped!("wiki version", key, e);
                continue;
            }
            outcome.versions_written += 1;
        }

        if self.include_attachments {
            self.export_attachments(name, &mut outcome).await;
        }

        tracing::debug!(
            page = name,
            versions = outcome.versions_written,
            attachments = outcome.attachments_written,
            "Wiki page exported"
        );
        Ok(outcome)
    }

    async fn export_attachments(&self, name: &str, outcome: &mut WikiPageOutcome) {
        let filenames = match self.client.list_wiki_attachments(name).await {
            Ok(filenames) => filenames,
            Err(e) => {
                log_record_skipped!("wiki attachments", name, e);
                return;
            }
        };

        for filename in filenames {
            let key = format!("{name}/{filename}");
            let result: Result<()> = async {
                let bytes = self
                    .client
                    .get_attachment(AttachmentParent::WikiPage(name), &filename)
                    .await?;
                write_bytes(&self.layout.wiki_attachment_file(name, &filename), &bytes).await
            }
            .await;

            match result {
                Ok(()) => outcome.attachments_written += 1,
                Err(e) => {
                    log_record_skipped!("wiki attachment", key, e);
                    outcome.attachments_failed += 1;
                }
            }
        }
    }
}
