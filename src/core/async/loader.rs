//! Concurrent dashboard loading with stale-response protection
//!
//! The `DashboardLoader` fetches entity collections from a [`RecordSource`]
//! and keeps the latest copy of each in a `DashMap` cache.
//!
//! # Request tokens
//!
//! Every fetch is issued a monotonically increasing token, and the latest
//! token per entity is remembered. When a fetch resolves, its result is
//! applied only if its token is still the latest one for that entity and is
//! newer than the cached copy. A slow response that resolves after a newer
//! request was issued is dropped instead of overwriting fresher data.
//!
//! # Loading state
//!
//! [`DashboardLoader::is_loading`] is true while any request is outstanding,
//! so a page that loads several entities stays "loading" until the last one
//! resolves.
//!
//! # Mutations
//!
//! A mutation marks the entity as busy until it resolves; a second mutation
//! for the same entity is rejected rather than queued. On success the cached
//! collection is marked stale and refetched in full. Failures are returned
//! verbatim and never retried.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::entities::EntityKind;
use crate::core::traits::{Mutation, RecordSource};
use crate::types::{Collection, DashboardError, Record};

/// Loader configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Upper bound on fetches running at the same time
    pub max_concurrent_fetches: usize,
}

impl LoaderConfig {
    /// Create a config; zero falls back to the default with a warning
    pub fn new(max_concurrent_fetches: usize) -> Self {
        if max_concurrent_fetches == 0 {
            let default = Self::default();
            warn!(
                fallback = default.max_concurrent_fetches,
                "max_concurrent_fetches must be positive, using default"
            );
            return default;
        }
        Self {
            max_concurrent_fetches,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: num_cpus::get().max(1),
        }
    }
}

/// What happened to a resolved fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The result replaced the cached collection
    Applied,
    /// A newer request was issued meanwhile; the result was dropped
    Superseded,
}

#[derive(Debug, Clone)]
struct CachedCollection {
    token: u64,
    stale: bool,
    collection: Collection,
}

/// Decrements the pending count for an entity when dropped
struct PendingGuard<'a> {
    pending: &'a DashMap<EntityKind, usize>,
    kind: EntityKind,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Entry::Occupied(mut entry) = self.pending.entry(self.kind) {
            if *entry.get() <= 1 {
                entry.remove();
            } else {
                *entry.get_mut() -= 1;
            }
        }
    }
}

/// Releases the mutation lock for an entity when dropped
struct MutationGuard<'a> {
    mutating: &'a DashMap<EntityKind, ()>,
    kind: EntityKind,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.mutating.remove(&self.kind);
    }
}

struct Ticket<'a> {
    kind: EntityKind,
    token: u64,
    _pending: PendingGuard<'a>,
}

/// Fetches and caches entity collections
///
/// Cheap to share behind an `Arc`; all state is in concurrent maps.
pub struct DashboardLoader<S: RecordSource> {
    source: Arc<S>,
    config: LoaderConfig,
    cache: DashMap<EntityKind, CachedCollection>,
    latest: DashMap<EntityKind, u64>,
    pending: DashMap<EntityKind, usize>,
    mutating: DashMap<EntityKind, ()>,
    next_token: AtomicU64,
}

impl<S: RecordSource> DashboardLoader<S> {
    pub fn new(source: S, config: LoaderConfig) -> Self {
        Self::with_shared_source(Arc::new(source), config)
    }

    pub fn with_shared_source(source: Arc<S>, config: LoaderConfig) -> Self {
        Self {
            source,
            config,
            cache: DashMap::new(),
            latest: DashMap::new(),
            pending: DashMap::new(),
            mutating: DashMap::new(),
            next_token: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// True while any fetch is outstanding
    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    /// True while a fetch for `kind` is outstanding
    pub fn is_loading_entity(&self, kind: EntityKind) -> bool {
        self.pending.contains_key(&kind)
    }

    /// Last applied collection for `kind`, stale or not
    pub fn collection(&self, kind: EntityKind) -> Option<Collection> {
        self.cache.get(&kind).map(|cached| cached.collection.clone())
    }

    /// Records of the last applied collection, or none if never loaded
    pub fn records(&self, kind: EntityKind) -> Vec<Record> {
        self.cache
            .get(&kind)
            .map(|cached| cached.collection.records.clone())
            .unwrap_or_default()
    }

    /// True if the cached copy predates a successful mutation
    pub fn is_stale(&self, kind: EntityKind) -> bool {
        self.cache.get(&kind).is_some_and(|cached| cached.stale)
    }

    fn issue(&self, kind: EntityKind) -> Ticket<'_> {
        let token = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.insert(kind, token);
        *self.pending.entry(kind).or_insert(0) += 1;
        Ticket {
            kind,
            token,
            _pending: PendingGuard {
                pending: &self.pending,
                kind,
            },
        }
    }

    async fn complete(&self, ticket: Ticket<'_>) -> Result<RefreshOutcome, DashboardError> {
        let Ticket { kind, token, .. } = ticket;
        let collection = self.source.fetch(kind).await?;

        let is_latest = self.latest.get(&kind).is_some_and(|latest| *latest == token);
        if !is_latest {
            debug!(entity = %kind, token, "dropping superseded response");
            return Ok(RefreshOutcome::Superseded);
        }

        let fresh = CachedCollection {
            token,
            stale: false,
            collection,
        };
        let applied = match self.cache.entry(kind) {
            Entry::Occupied(mut entry) => {
                if entry.get().token < token {
                    entry.insert(fresh);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(fresh);
                true
            }
        };

        if applied {
            debug!(entity = %kind, token, "applied response");
            Ok(RefreshOutcome::Applied)
        } else {
            debug!(entity = %kind, token, "dropping out-of-order response");
            Ok(RefreshOutcome::Superseded)
        }
    }

    /// Fetch one entity and apply the result unless superseded
    ///
    /// # Errors
    ///
    /// The source's error, unchanged. The cached copy is left as it was.
    pub async fn refresh(&self, kind: EntityKind) -> Result<RefreshOutcome, DashboardError> {
        let ticket = self.issue(kind);
        self.complete(ticket).await
    }

    /// Fetch several entities concurrently
    ///
    /// All requests count as pending from the start, so [`is_loading`]
    /// stays true until every one of them has resolved. At most
    /// `max_concurrent_fetches` run at once. Results are returned in entity
    /// order; one failure does not cancel the others.
    ///
    /// [`is_loading`]: Self::is_loading
    pub async fn load_all(
        &self,
        kinds: &[EntityKind],
    ) -> Vec<(EntityKind, Result<RefreshOutcome, DashboardError>)> {
        let tickets: Vec<Ticket<'_>> = kinds.iter().map(|kind| self.issue(*kind)).collect();

        let mut results: Vec<_> = stream::iter(tickets)
            .map(|ticket| async move {
                let kind = ticket.kind;
                (kind, self.complete(ticket).await)
            })
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        for (kind, result) in &results {
            if let Err(e) = result {
                warn!(entity = %kind, error = %e, "fetch failed");
            }
        }
        results.sort_by_key(|(kind, _)| *kind);
        results
    }

    fn lock_mutation(&self, kind: EntityKind) -> Result<MutationGuard<'_>, DashboardError> {
        match self.mutating.entry(kind) {
            Entry::Occupied(_) => Err(DashboardError::mutation_in_flight(kind.envelope_key())),
            Entry::Vacant(entry) => {
                entry.insert(());
                Ok(MutationGuard {
                    mutating: &self.mutating,
                    kind,
                })
            }
        }
    }

    /// Submit a mutation, then refetch the whole collection
    ///
    /// # Errors
    ///
    /// * `MutationInFlight` if another mutation for `kind` has not resolved
    /// * The source's error for the mutation or the refetch, unchanged
    pub async fn mutate(&self, kind: EntityKind, mutation: Mutation) -> Result<Record, DashboardError> {
        let _guard = self.lock_mutation(kind)?;

        let record = self.source.mutate(kind, mutation).await?;
        info!(entity = %kind, id = ?record.id(), "mutation applied");

        if let Some(mut cached) = self.cache.get_mut(&kind) {
            cached.stale = true;
        }
        self.refresh(kind).await?;
        Ok(record)
    }
}
