use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Credential;
use crate::plans::{GenerationRequest, Plan, PlanDraft, PlanId};

mod http;
mod memory;

pub use http::HttpRemoteStore;
pub use memory::{GenerateHold, InMemoryRemoteStore, RemoteCall, RemoteOp};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("plan not found")]
    NotFound,
    #[error("credential rejected")]
    Unauthorized,
    #[error("rejected: {0}")]
    Validation(String),
    #[error("{0}")]
    Unavailable(String),
}

/// Plan storage service. Every call carries the caller's credential; the store
/// does not keep one of its own.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_plans(&self, credential: &Credential) -> Result<Vec<Plan>, RemoteError>;

    async fn generate_plan(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<Plan, RemoteError>;

    async fn create_plan(
        &self,
        credential: &Credential,
        draft: &PlanDraft,
    ) -> Result<Plan, RemoteError>;

    async fn delete_plan(&self, credential: &Credential, id: &PlanId) -> Result<(), RemoteError>;

    async fn replace_plan(
        &self,
        credential: &Credential,
        id: &PlanId,
        plan: &Plan,
    ) -> Result<Plan, RemoteError>;
}
