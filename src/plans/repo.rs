use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::model::{Plan, PlanId};

/// How a newly generated plan relates to the ones already cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivePolicy {
    /// Generating replaces every existing plan.
    #[default]
    Single,
    /// Generating appends.
    Multi,
}

impl FromStr for ActivePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "multi" => Ok(Self::Multi),
            other => anyhow::bail!("unknown plan policy {other:?}, expected single or multi"),
        }
    }
}

/// Client-side cache of plans. Order is insertion order, or the order the
/// remote store supplied on `load`. Every cached plan has an id.
#[derive(Debug, Default)]
pub struct PlanRepository {
    policy: ActivePolicy,
    plans: Vec<Plan>,
}

impl PlanRepository {
    pub fn new(policy: ActivePolicy) -> Self {
        Self {
            policy,
            plans: Vec::new(),
        }
    }

    pub fn policy(&self) -> ActivePolicy {
        self.policy
    }

    /// Replaces the whole cache.
    pub fn load(&mut self, plans: impl IntoIterator<Item = Plan>) {
        self.plans.clear();
        for plan in plans {
            self.put(plan);
        }
    }

    /// Inserts or replaces by id. Under `Single` every other entry is dropped
    /// from the cache; remote cleanup is the caller's concern.
    ///
    /// Returns `false` when the plan has no id and was not cached.
    pub fn upsert(&mut self, plan: Plan) -> bool {
        let Some(id) = plan.id.clone() else {
            warn!(title = %plan.title, "refusing to cache plan without id");
            return false;
        };
        if self.policy == ActivePolicy::Single {
            self.plans.retain(|p| p.id.as_ref() == Some(&id));
        }
        self.put(plan)
    }

    /// Removes one entry. `None` means the id was not cached.
    pub fn remove(&mut self, id: &PlanId) -> Option<Plan> {
        let idx = self.position(id)?;
        Some(self.plans.remove(idx))
    }

    pub fn get(&self, id: &PlanId) -> Option<&Plan> {
        self.position(id).map(|idx| &self.plans[idx])
    }

    pub fn all(&self) -> Vec<Plan> {
        self.plans.clone()
    }

    pub fn ids(&self) -> Vec<PlanId> {
        self.plans.iter().filter_map(|p| p.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    fn position(&self, id: &PlanId) -> Option<usize> {
        self.plans.iter().position(|p| p.id.as_ref() == Some(id))
    }

    fn put(&mut self, mut plan: Plan) -> bool {
        let Some(id) = plan.id.clone() else {
            warn!(title = %plan.title, "skipping plan without id");
            return false;
        };
        plan.normalize();
        match self.position(&id) {
            Some(idx) => self.plans[idx] = plan,
            None => self.plans.push(plan),
        }
        true
    }
}
