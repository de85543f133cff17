use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;
use uuid::Uuid;

use super::{RemoteError, RemoteStore};
use crate::auth::Credential;
use crate::plans::{FoodItem, GenerationRequest, Meal, Plan, PlanDraft, PlanId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Fetch,
    Generate,
    Create,
    Delete,
    Replace,
}

/// One recorded call, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Fetch,
    Generate,
    Create,
    Delete(PlanId),
    Replace(PlanId),
}

/// Pauses the next generate call until released.
#[derive(Clone)]
pub struct GenerateHold {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl GenerateHold {
    /// Resolves once a generate call is parked on this hold.
    pub async fn started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct Inner {
    plans: Vec<Plan>,
    calls: Vec<RemoteCall>,
    queued_failures: HashMap<RemoteOp, VecDeque<RemoteError>>,
    failing_deletes: HashMap<PlanId, RemoteError>,
    generate_hold: Option<GenerateHold>,
}

/// Process-local RemoteStore. Backs offline runs (`REMOTE_BASE_URL=memory`)
/// and tests, which can inject failures and inspect the calls made.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    inner: Mutex<Inner>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds stored plans; plans without an id get one.
    pub fn with_plans(plans: impl IntoIterator<Item = Plan>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for mut plan in plans {
                plan.id.get_or_insert_with(new_id);
                inner.plans.push(plan);
            }
        }
        store
    }

    /// Fails the next call of `op` with `err`. Queued failures are consumed in order.
    pub fn fail_next(&self, op: RemoteOp, err: RemoteError) {
        self.lock().queued_failures.entry(op).or_default().push_back(err);
    }

    /// Every delete of `id` fails with `err` until the store is dropped.
    pub fn fail_deletes_of(&self, id: impl Into<PlanId>, err: RemoteError) {
        self.lock().failing_deletes.insert(id.into(), err);
    }

    pub fn hold_generate(&self) -> GenerateHold {
        let hold = GenerateHold {
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        self.lock().generate_hold = Some(hold.clone());
        hold
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    pub fn stored(&self) -> Vec<Plan> {
        self.lock().plans.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, op: RemoteOp, call: RemoteCall) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        match inner.queued_failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn store(&self, mut plan: Plan) -> Plan {
        plan.id = Some(new_id());
        self.lock().plans.push(plan.clone());
        plan
    }
}

fn new_id() -> PlanId {
    PlanId::new(Uuid::new_v4().simple().to_string())
}

/// Stand-in for the server's generator: a fixed day of meals scaled by body
/// weight, with no declared totals.
fn generated_plan(request: &GenerationRequest) -> Plan {
    let scale = (request.weight / 70.0).clamp(0.5, 2.0);
    let item = |name: &str, kcal: f64, p: f64, c: f64, f: f64| {
        FoodItem::new(name, (kcal * scale).round()).with_macros(
            (p * scale).round(),
            (c * scale).round(),
            (f * scale).round(),
        )
    };
    Plan::new(
        format!("{:?} plan", request.activity_level),
        vec![
            Meal::new(
                "Breakfast",
                vec![item("Oatmeal", 300.0, 10.0, 54.0, 5.0), item("Banana", 105.0, 1.0, 27.0, 0.0)],
            ),
            Meal::new(
                "Lunch",
                vec![item("Chicken breast", 280.0, 53.0, 0.0, 6.0), item("Rice", 205.0, 4.0, 45.0, 0.0)],
            ),
            Meal::new(
                "Dinner",
                vec![item("Salmon", 350.0, 34.0, 0.0, 22.0), item("Broccoli", 55.0, 4.0, 11.0, 1.0)],
            ),
        ],
    )
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn fetch_plans(&self, _credential: &Credential) -> Result<Vec<Plan>, RemoteError> {
        self.begin(RemoteOp::Fetch, RemoteCall::Fetch)?;
        Ok(self.stored())
    }

    async fn generate_plan(
        &self,
        _credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<Plan, RemoteError> {
        self.begin(RemoteOp::Generate, RemoteCall::Generate)?;
        let hold = self.lock().generate_hold.take();
        if let Some(hold) = hold {
            hold.started.notify_one();
            hold.release.notified().await;
        }
        Ok(self.store(generated_plan(request)))
    }

    async fn create_plan(
        &self,
        _credential: &Credential,
        draft: &PlanDraft,
    ) -> Result<Plan, RemoteError> {
        self.begin(RemoteOp::Create, RemoteCall::Create)?;
        Ok(self.store(Plan::new(draft.title.trim(), draft.meals.clone())))
    }

    async fn delete_plan(&self, _credential: &Credential, id: &PlanId) -> Result<(), RemoteError> {
        self.begin(RemoteOp::Delete, RemoteCall::Delete(id.clone()))?;
        let mut inner = self.lock();
        if let Some(err) = inner.failing_deletes.get(id) {
            return Err(err.clone());
        }
        let before = inner.plans.len();
        inner.plans.retain(|p| p.id.as_ref() != Some(id));
        if inner.plans.len() == before {
            return Err(RemoteError::NotFound);
        }
        Ok(())
    }

    async fn replace_plan(
        &self,
        _credential: &Credential,
        id: &PlanId,
        plan: &Plan,
    ) -> Result<Plan, RemoteError> {
        self.begin(RemoteOp::Replace, RemoteCall::Replace(id.clone()))?;
        let mut inner = self.lock();
        let slot = inner
            .plans
            .iter_mut()
            .find(|p| p.id.as_ref() == Some(id))
            .ok_or(RemoteError::NotFound)?;
        let mut replaced = plan.clone();
        replaced.id = Some(id.clone());
        *slot = replaced.clone();
        Ok(replaced)
    }
}
