//! Photo enrichment pool.
//!
//! Takes the POI list the agent produced and attaches photo data from
//! the rate-sensitive Places lookup, a few items at a time. The cache
//! and the cancellation flag are owned by the request context
//! (`AppState`), not module globals, so their lifecycle is explicit and
//! each can be exercised in isolation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use shared::{PhotoInfo, Poi};
use tokio::sync::Mutex;

pub const DEFAULT_ENRICH_CONCURRENCY: usize = 4;

/// Cooperative cancellation handle for one enrichment batch. Workers
/// check it between units of work; in-flight lookups are never aborted
/// at the transport level, their results are just discarded.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Name-keyed photo cache shared across batches for the lifetime of the
/// process. Append/update only, never evicted; a write race on the same
/// name is harmless because values are idempotent per name.
#[derive(Debug, Default)]
pub struct PhotoCache {
    entries: Mutex<HashMap<String, PhotoInfo>>,
}

impl PhotoCache {
    pub async fn get(&self, name: &str) -> Option<PhotoInfo> {
        self.entries.lock().await.get(name).cloned()
    }

    pub async fn insert(&self, name: &str, info: PhotoInfo) {
        self.entries.lock().await.insert(name.to_string(), info);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Enrich `pois` with photo data via `lookup`, running `concurrency`
/// logical workers over a shared cursor.
///
/// The output always has the same length and order as the input
/// (slots are written by index, not completion order). The cache is
/// consulted before any lookup and written after every successful or
/// definitively-empty one, never on failure. A failed lookup leaves
/// that item unenriched; it never fails the batch. Once `cancel` is
/// set, workers stop claiming items and discard results they have not
/// yet committed.
pub async fn enrich_pois<F, Fut, E>(
    pois: &[Poi],
    lookup: F,
    concurrency: usize,
    cache: &PhotoCache,
    cancel: &CancelFlag,
) -> Vec<Poi>
where
    F: Fn(Poi) -> Fut,
    Fut: Future<Output = Result<PhotoInfo, E>>,
    E: std::fmt::Display,
{
    assert!(concurrency > 0, "enrichment concurrency must be positive");

    let cursor = AtomicUsize::new(0);
    let lookup = &lookup;
    let cursor = &cursor;

    let workers = (0..concurrency).map(|_| async move {
        let mut produced: Vec<(usize, Poi)> = Vec::new();
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let index = cursor.fetch_add(1, Ordering::Relaxed);
            let Some(poi) = pois.get(index) else {
                break;
            };
            let mut poi = poi.clone();

            if let Some(info) = cache.get(&poi.name).await {
                apply_photo(&mut poi, &info);
                produced.push((index, poi));
                continue;
            }

            if cancel.is_cancelled() {
                break;
            }
            match lookup(poi.clone()).await {
                Ok(info) => {
                    // A result arriving after cancellation is stale; drop it
                    if cancel.is_cancelled() {
                        break;
                    }
                    cache.insert(&poi.name, info.clone()).await;
                    apply_photo(&mut poi, &info);
                    produced.push((index, poi));
                }
                Err(err) => {
                    tracing::warn!("photo lookup failed for '{}': {err}", poi.name);
                    produced.push((index, poi));
                }
            }
        }
        produced
    });

    let mut slots: Vec<Option<Poi>> = vec![None; pois.len()];
    for produced in join_all(workers).await {
        for (index, poi) in produced {
            slots[index] = Some(poi);
        }
    }

    // Items a worker claimed but abandoned on cancellation come back
    // untouched so the batch still resolves with full length
    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| slot.unwrap_or_else(|| pois[i].clone()))
        .collect()
}

fn apply_photo(poi: &mut Poi, info: &PhotoInfo) {
    poi.photo_url = info.photo_url.clone();
    poi.attribution = info.attribution.clone();
    poi.website = info.website.clone();
}
