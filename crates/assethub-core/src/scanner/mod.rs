//! Directory scanning.
//!
//! A scan is a two-stage pipeline: a traversal task walks the directory tree
//! and feeds candidate files into a bounded queue; a fixed pool of workers
//! classifies each file, extracts metadata off the async runtime, and
//! upserts the record into the catalog. Slow extraction of one file never
//! holds up traversal or the other workers.
//!
//! Per-file problems (unreadable entries, malformed content) are demoted to
//! warnings in the report; only structural failures (missing root, database
//! errors) abort a scan.

mod classify;

pub use classify::classify;

use crate::cancel::CancellationToken;
use crate::catalog::{Asset, AssetKind, CatalogStore, UpsertOutcome};
use crate::config::ScanConfig;
use crate::error::{AssetHubError, Result};
use crate::extract::{self, Extraction};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A per-file problem noted during a scan.
#[derive(Debug, Clone)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one scan run.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Every asset cataloged by this run, as stored.
    pub assets: Vec<Asset>,
    pub added: usize,
    pub updated: usize,
    /// Files with unrecognized extensions.
    pub ignored: usize,
    /// Files that could not be cataloged at all.
    pub skipped: Vec<ScanWarning>,
    /// Cataloged with filesystem-derived fields only.
    pub warnings: Vec<ScanWarning>,
}

/// Scans directory trees into the catalog.
///
/// Re-running a scan over the same tree is idempotent: records are keyed by
/// path-derived id, so existing assets update in place.
pub struct FileScanner {
    store: Arc<CatalogStore>,
    workers: usize,
    cancel: CancellationToken,
}

impl FileScanner {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self {
            store,
            workers: ScanConfig::DEFAULT_WORKERS,
            cancel: CancellationToken::new(),
        }
    }

    /// Override the extraction worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Token for interrupting a running scan between files.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Scan a directory for assets, cataloging every recognized file.
    ///
    /// With `recursive` false only the root's immediate files are considered.
    pub async fn scan(&self, root: impl AsRef<Path>, recursive: bool) -> Result<ScanReport> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(AssetHubError::DirectoryNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(AssetHubError::NotADirectory(root.to_path_buf()));
        }
        let root = std::fs::canonicalize(root).map_err(|e| AssetHubError::io_with_path(e, root))?;

        info!("Scanning {} (recursive={})", root.display(), recursive);

        let (path_tx, path_rx) = mpsc::channel::<PathBuf>(ScanConfig::QUEUE_CAPACITY);
        let (event_tx, mut event_rx) = mpsc::channel::<WorkerEvent>(ScanConfig::QUEUE_CAPACITY);
        let path_rx = Arc::new(tokio::sync::Mutex::new(path_rx));

        let mut handles = Vec::new();
        handles.push(self.spawn_traversal(root.clone(), recursive, path_tx, event_tx.clone()));
        for _ in 0..self.workers {
            handles.push(self.spawn_worker(path_rx.clone(), event_tx.clone()));
        }
        drop(event_tx);

        let mut report = ScanReport::default();
        let mut fatal: Option<AssetHubError> = None;
        while let Some(event) = event_rx.recv().await {
            match event {
                WorkerEvent::Cataloged {
                    asset,
                    outcome,
                    degraded,
                } => {
                    match outcome {
                        UpsertOutcome::Inserted => report.added += 1,
                        UpsertOutcome::Updated => report.updated += 1,
                    }
                    if let Some(reason) = degraded {
                        report.warnings.push(ScanWarning {
                            path: PathBuf::from(&asset.file_path),
                            reason,
                        });
                    }
                    report.assets.push(asset);
                }
                WorkerEvent::Skipped { path, reason } => {
                    warn!("Skipping {}: {}", path.display(), reason);
                    report.skipped.push(ScanWarning { path, reason });
                }
                WorkerEvent::Ignored => report.ignored += 1,
                WorkerEvent::Fatal(err) => fatal = Some(err),
            }
        }
        futures::future::join_all(handles).await;

        if let Some(err) = fatal {
            return Err(err);
        }
        self.cancel.check()?;

        info!(
            "Scan of {} finished: {} added, {} updated, {} skipped, {} ignored",
            root.display(),
            report.added,
            report.updated,
            report.skipped.len(),
            report.ignored
        );
        Ok(report)
    }

    fn spawn_traversal(
        &self,
        root: PathBuf,
        recursive: bool,
        path_tx: mpsc::Sender<PathBuf>,
        event_tx: mpsc::Sender<WorkerEvent>,
    ) -> tokio::task::JoinHandle<()> {
        let cancel = self.cancel.clone();
        tokio::task::spawn_blocking(move || {
            let mut walker = WalkDir::new(&root).min_depth(1);
            if !recursive {
                walker = walker.max_depth(1);
            }

            for entry in walker {
                if cancel.is_cancelled() {
                    break;
                }
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        if path_tx.blocking_send(entry.into_path()).is_err() {
                            // All workers gone; nothing left to feed.
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        let path = err
                            .path()
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|| root.clone());
                        let _ = event_tx.blocking_send(WorkerEvent::Skipped {
                            path,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        })
    }

    fn spawn_worker(
        &self,
        path_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<PathBuf>>>,
        event_tx: mpsc::Sender<WorkerEvent>,
    ) -> tokio::task::JoinHandle<()> {
        let store = self.store.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let path = { path_rx.lock().await.recv().await };
                let Some(path) = path else { break };

                let Some((file_type, file_format)) = classify(&path) else {
                    debug!("Ignoring unrecognized extension: {}", path.display());
                    let _ = event_tx.send(WorkerEvent::Ignored).await;
                    continue;
                };

                let task_store = store.clone();
                let task_path = path.clone();
                let processed = tokio::task::spawn_blocking(move || {
                    process_file(&task_store, &task_path, file_type, &file_format)
                })
                .await;

                let event = match processed {
                    Ok(Ok(event)) => event,
                    Ok(Err(err)) => WorkerEvent::Fatal(err),
                    Err(join_err) => WorkerEvent::Skipped {
                        path,
                        reason: format!("extraction task failed: {join_err}"),
                    },
                };
                let is_fatal = matches!(event, WorkerEvent::Fatal(_));
                let _ = event_tx.send(event).await;
                if is_fatal {
                    break;
                }
            }
        })
    }
}

enum WorkerEvent {
    Cataloged {
        asset: Asset,
        outcome: UpsertOutcome,
        degraded: Option<String>,
    },
    Skipped {
        path: PathBuf,
        reason: String,
    },
    Ignored,
    Fatal(AssetHubError),
}

/// Extract metadata for one classified file and upsert it.
///
/// Only catalog failures propagate; a file that cannot even be stat-ed still
/// produces a best-effort record with a degraded flag.
fn process_file(
    store: &CatalogStore,
    path: &Path,
    file_type: AssetKind,
    file_format: &str,
) -> Result<WorkerEvent> {
    let (file_size, stat_error) = match std::fs::metadata(path) {
        Ok(meta) => (meta.len(), None),
        Err(err) => (0, Some(err.to_string())),
    };

    let mut asset = Asset::local(path, file_type, file_format, file_size);
    let extraction = match stat_error {
        Some(reason) => Extraction::degraded(format!("cannot stat file: {reason}")),
        None => extract::extract(path, file_type, file_format, file_size),
    };
    extraction.apply_to(&mut asset);

    let (stored, outcome) = store.upsert(&asset)?;

    if extraction.degraded {
        warn!(
            "Cataloged {} with filesystem fields only: {}",
            path.display(),
            extraction.reason.as_deref().unwrap_or("unknown reason")
        );
    }

    Ok(WorkerEvent::Cataloged {
        asset: stored,
        outcome,
        degraded: extraction.degraded.then(|| {
            extraction
                .reason
                .clone()
                .unwrap_or_else(|| "unknown reason".to_string())
        }),
    })
}
