//! Keeps force-loaded content on the page.
//!
//! Once endless-scroll content has been pulled in, the page's own framework must
//! not prune it again. The guard suppresses page-initiated node removal through
//! a [`RemovalPolicy`] and reverts class-attribute churn reported by an in-page
//! observer. A revert itself produces a class mutation, so every element that
//! was just reverted is ignored exactly once.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::browser::{scripts, NodeId, PageContext};
use crate::Result;

/// Name of the function the observer calls for every class mutation.
pub const CLASS_MUTATION_BINDING: &str = "__pagetopdfClassMutation";

/// Whether page scripts may remove nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    #[default]
    Perform,
    Suppress,
}

impl RemovalPolicy {
    /// Applies the policy to `Element.remove` and `Node.removeChild`.
    ///
    /// The pipeline's own pruning keeps the native implementation either way.
    pub async fn apply(self, page: &dyn PageContext) -> Result<()> {
        page.evaluate(&scripts::removal_policy(self == RemovalPolicy::Suppress))
            .await?;
        Ok(())
    }
}

/// An attribute mutation reported by the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRecord {
    pub node: NodeId,
    pub attribute: String,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn is_class_change(&self) -> bool {
        self.attribute == "class"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Restore the previous class value.
    Revert,
    /// Let the change stand.
    Allow,
}

/// Toggle set keyed by element identity.
#[derive(Debug, Default)]
pub struct ClassChurnFilter {
    ignored: HashSet<NodeId>,
}

impl ClassChurnFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An unmarked element is reverted and marked; a marked element is let
    /// through once and unmarked.
    pub fn decide(&mut self, node: NodeId) -> GuardDecision {
        if self.ignored.remove(&node) {
            GuardDecision::Allow
        } else {
            self.ignored.insert(node);
            GuardDecision::Revert
        }
    }

    pub fn is_ignored(&self, node: NodeId) -> bool {
        self.ignored.contains(&node)
    }
}

/// Handle to the installed guard.
///
/// The guard runs until the page context goes away; dropping the handle does
/// not stop it.
pub struct MutationGuard {
    task: JoinHandle<ClassChurnFilter>,
}

impl MutationGuard {
    /// Suppresses page-initiated removal and starts reverting class churn.
    pub async fn install(page: Arc<dyn PageContext>) -> Result<Self> {
        RemovalPolicy::Suppress.apply(page.as_ref()).await?;
        let mutations = page.expose_function(CLASS_MUTATION_BINDING).await?;
        page.evaluate(&scripts::observe_class_mutations(CLASS_MUTATION_BINDING))
            .await?;
        log::debug!("mutation guard installed");

        let task = tokio::spawn(run(page, mutations));
        Ok(Self { task })
    }

    /// Waits for the mutation stream to end and returns the final filter state.
    pub async fn finished(self) -> Option<ClassChurnFilter> {
        self.task.await.ok()
    }
}

async fn run(
    page: Arc<dyn PageContext>,
    mutations: BoxStream<'static, String>,
) -> ClassChurnFilter {
    let mut filter = ClassChurnFilter::new();
    let mut records = mutations
        .filter_map(|payload| async move {
            serde_json::from_str::<MutationRecord>(&payload)
                .map_err(|e| log::debug!("ignoring malformed mutation payload: {e}"))
                .ok()
        })
        .filter(|record| futures::future::ready(record.is_class_change()))
        .boxed();

    while let Some(record) = records.next().await {
        match filter.decide(record.node) {
            GuardDecision::Revert => {
                let script = scripts::revert_class(record.node, record.old_value.as_deref());
                if let Err(err) = page.evaluate(&script).await {
                    log::debug!("failed to revert class on node {}: {err}", record.node);
                }
            }
            GuardDecision::Allow => {
                log::trace!("allowing class change on node {}", record.node);
            }
        }
    }
    filter
}
