//! Best-effort teardown of entities created during the run

use async_trait::async_trait;
use tracing::warn;

use super::note;
use crate::client::ApiClient;
use crate::config::HarnessConfig;
use crate::context::RunContext;
use crate::error::HarnessResult;
use crate::pipeline::Step;

/// Deletes exams, then students, then subjects. Individual failures are
/// logged and never fail the step.
pub struct CleanupTestData;

#[async_trait]
impl Step for CleanupTestData {
    fn name(&self) -> &'static str {
        "Cleanup Test Data"
    }

    fn always_run(&self) -> bool {
        true
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        if !config.cleanup {
            note(config, "Cleanup skipped due to configuration");
            return Ok(ctx.clone());
        }

        let batches = [
            ("exam", "exams", &ctx.created.exams),
            ("student", "students", &ctx.created.students),
            ("subject", "subjects", &ctx.created.subjects),
        ];

        let mut failures = 0usize;
        for (kind, path, ids) in batches {
            for id in ids.iter() {
                note(config, format!("Deleting {} with ID: {}", kind, id));
                match client.delete(&format!("{}/{}", path, id), None).await {
                    Ok(resp) if !(200..300).contains(&resp.status) => {
                        failures += 1;
                        warn!("Deleting {} {} returned status {}", kind, id, resp.status);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        failures += 1;
                        warn!("Error deleting {} {}: {}", kind, id, e);
                    }
                }
            }
        }

        if failures == 0 {
            note(config, "Test data cleanup completed successfully");
        } else {
            warn!("Test data cleanup finished with {} failed deletion(s)", failures);
        }

        let mut next = ctx.clone();
        next.created = Default::default();
        Ok(next)
    }
}
