//! Applying a primary's description to a live model

use model_controller::{IncludesValidator, ModelController, domain_handlers_with, domain_registration};
use model_tree::{DescribedResource, ModelReader, Resource};
use tracing::info;

use crate::config::SyncOptions;
use crate::error::Result;
use crate::plan::{Planner, SyncPlan};
use crate::report::SyncReport;

/// Reconciles a secondary's model with descriptions sent by the primary
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: SyncOptions,
}

impl Reconciler {
    pub fn new(options: SyncOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// A controller over `root` wired for the domain with these options.
    pub fn controller(&self, root: Resource) -> Result<ModelController> {
        let handlers = domain_handlers_with(
            self.options.host.clone(),
            IncludesValidator::new(self.options.includes_types.iter().cloned()),
        );
        Ok(ModelController::new(root, domain_registration()?, handlers)
            .with_local_indexed_add(self.options.local_indexed_add))
    }

    /// Plan without touching any model.
    pub fn plan(&self, original: &DescribedResource, incoming: &DescribedResource) -> SyncPlan {
        Planner::new(&self.options).plan(original, incoming)
    }

    /// Plan against the live model of `controller` without applying.
    pub fn dry_run(
        &self,
        controller: &ModelController,
        incoming: &DescribedResource,
    ) -> Result<SyncReport> {
        let plan = self.plan_against(controller, incoming)?;
        Ok(SyncReport::planned(incoming.digest()?, plan))
    }

    /// Bring the model of `controller` in line with `incoming` in one pass.
    ///
    /// The live model is described, planned against and changed under a
    /// single hold of the controller lock.
    ///
    /// # Errors
    ///
    /// Any failure rolls the model back to its state before the call.
    pub fn apply(
        &self,
        controller: &ModelController,
        incoming: &DescribedResource,
    ) -> Result<SyncReport> {
        let digest = incoming.digest()?;
        let planner =
            Planner::new(&self.options).with_local_indexed_add(controller.local_indexed_add());

        let outcome = controller.execute_planned(|root| {
            let original = ModelReader::new().describe(root);
            let plan = planner.plan(&original, incoming);
            if !plan.is_empty() {
                info!(%digest, operations = plan.len(), "Applying incoming model");
            }
            plan.into_operations()
        })?;

        let report = SyncReport::applied(digest, outcome);
        if report.is_noop() {
            info!(digest = %report.incoming_digest, "Model already up to date");
        } else {
            info!(
                id = %report.id,
                servers = report.server_actions.len(),
                "Incoming model applied"
            );
        }
        Ok(report)
    }

    fn plan_against(
        &self,
        controller: &ModelController,
        incoming: &DescribedResource,
    ) -> Result<SyncPlan> {
        let original = controller.read(|root| ModelReader::new().describe(root))?;
        Ok(Planner::new(&self.options)
            .with_local_indexed_add(controller.local_indexed_add())
            .plan(&original, incoming))
    }
}
