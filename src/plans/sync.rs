//! User-initiated plan mutations against the remote store and the local cache.
//!
//! The cache only changes after the remote store confirms a write, and it
//! always takes the store's returned representation. The one exception to
//! all-or-nothing behaviour is generating under [`ActivePolicy::Single`]:
//! stale plans are deleted remotely before the new one is requested, so a
//! failed generate can leave the remote store without the old plans while the
//! cache still shows them. Callers must not treat generate as atomic.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::model::{Plan, PlanId};
use super::params::{GenerateParams, PlanDraft};
use super::repo::{ActivePolicy, PlanRepository};
use crate::auth::Credential;
use crate::error::SyncError;
use crate::remote::{RemoteError, RemoteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    /// The store no longer had the plan. The cache entry is dropped all the
    /// same; the UI should tell the user and refresh.
    AlreadyGone,
}

/// Held for the whole of one generate/create; released on drop so a
/// cancelled request frees it too.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SyncError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| SyncError::Busy)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncController {
    store: Arc<dyn RemoteStore>,
    repo: Mutex<PlanRepository>,
    generating: AtomicBool,
}

impl SyncController {
    pub fn new(store: Arc<dyn RemoteStore>, policy: ActivePolicy) -> Self {
        Self {
            store,
            repo: Mutex::new(PlanRepository::new(policy)),
            generating: AtomicBool::new(false),
        }
    }

    pub fn policy(&self) -> ActivePolicy {
        self.repo().policy()
    }

    pub fn plans(&self) -> Vec<Plan> {
        self.repo().all()
    }

    pub fn plan(&self, id: &PlanId) -> Option<Plan> {
        self.repo().get(id).cloned()
    }

    /// Replaces the cache with the store's current list.
    pub async fn refresh(&self, credential: &Credential) -> Result<Vec<Plan>, SyncError> {
        let plans = self.store.fetch_plans(credential).await.map_err(|e| {
            warn!(error = %e, "fetching plans failed");
            SyncError::from(e)
        })?;
        let mut repo = self.repo();
        repo.load(plans);
        debug!(count = repo.len(), "plans loaded");
        Ok(repo.all())
    }

    pub async fn generate(
        &self,
        credential: &Credential,
        params: &GenerateParams,
    ) -> Result<Plan, SyncError> {
        let request = params.validate()?;
        self.install(credential, "generate", || {
            self.store.generate_plan(credential, &request)
        })
        .await
    }

    pub async fn create(&self, credential: &Credential, draft: &PlanDraft) -> Result<Plan, SyncError> {
        draft.validate()?;
        self.install(credential, "create", || self.store.create_plan(credential, draft))
            .await
    }

    pub async fn delete(
        &self,
        credential: &Credential,
        id: &PlanId,
    ) -> Result<DeleteOutcome, SyncError> {
        match self.store.delete_plan(credential, id).await {
            Ok(()) => {
                self.repo().remove(id);
                info!(plan_id = %id, "plan deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(RemoteError::NotFound) => {
                self.repo().remove(id);
                info!(plan_id = %id, "plan was already gone remotely");
                Ok(DeleteOutcome::AlreadyGone)
            }
            Err(e) => {
                warn!(plan_id = %id, error = %e, "delete failed; cache untouched");
                Err(e.into())
            }
        }
    }

    /// Sends the full replacement and caches what the store returns.
    pub async fn edit(
        &self,
        credential: &Credential,
        id: &PlanId,
        mut plan: Plan,
    ) -> Result<Plan, SyncError> {
        plan.id = Some(id.clone());
        let mut updated = self
            .store
            .replace_plan(credential, id, &plan)
            .await
            .map_err(|e| {
                warn!(plan_id = %id, error = %e, "edit failed; cache untouched");
                SyncError::from(e)
            })?;
        updated.id.get_or_insert_with(|| id.clone());
        updated.normalize();
        self.repo().upsert(updated.clone());
        info!(plan_id = %id, "plan replaced");
        Ok(updated)
    }

    async fn install<F, Fut>(
        &self,
        credential: &Credential,
        op: &'static str,
        produce: F,
    ) -> Result<Plan, SyncError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Plan, RemoteError>>,
    {
        let _in_flight = InFlight::acquire(&self.generating).inspect_err(|_| {
            warn!(op, "rejected: plan generation already in flight");
        })?;

        let policy = self.policy();
        if policy == ActivePolicy::Single {
            let stale = self.repo().ids();
            self.purge(credential, &stale).await;
        }

        let mut plan = produce().await.map_err(|e| {
            warn!(op, error = %e, "remote store rejected new plan");
            SyncError::from(e)
        })?;
        let Some(id) = plan.id.clone() else {
            warn!(op, "remote store returned a plan without id");
            return Err(SyncError::Unavailable("plan service returned a plan without an id".into()));
        };
        plan.normalize();

        let mut repo = self.repo();
        match policy {
            ActivePolicy::Single => repo.load([plan.clone()]),
            ActivePolicy::Multi => {
                repo.upsert(plan.clone());
            }
        }
        info!(op, plan_id = %id, cached = repo.len(), "new plan cached");
        Ok(plan)
    }

    /// Best-effort remote removal of stale plans. Every outcome counts as
    /// removed; failures are only logged.
    async fn purge(&self, credential: &Credential, stale: &[PlanId]) {
        let deletions = stale.iter().map(|id| async move {
            match self.store.delete_plan(credential, id).await {
                Ok(()) => debug!(plan_id = %id, "stale plan deleted"),
                Err(RemoteError::NotFound) => debug!(plan_id = %id, "stale plan already gone"),
                Err(e) => warn!(plan_id = %id, error = %e, "stale plan cleanup failed; continuing"),
            }
        });
        join_all(deletions).await;
    }

    fn repo(&self) -> MutexGuard<'_, PlanRepository> {
        self.repo.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
