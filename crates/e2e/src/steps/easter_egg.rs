use async_trait::async_trait;
use rand::Rng;

use super::note;
use crate::assertions as check;
use crate::client::ApiClient;
use crate::config::HarnessConfig;
use crate::context::RunContext;
use crate::error::HarnessResult;
use crate::pipeline::Step;

/// Hidden number-fact endpoint, queried with a random number in 1..=20
pub struct CheckEasterEgg;

#[async_trait]
impl Step for CheckEasterEgg {
    fn name(&self) -> &'static str {
        "Check Easter Egg Feature"
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let number: u32 = rand::thread_rng().gen_range(1..=20);
        note(config, format!("Testing easter egg feature with number: {}", number));

        let resp = client
            .get(&format!("easter-egg/hidden-feature/{}", number), Some(200))
            .await?;
        check::status_code(&resp, 200)?;
        check::json_field_contains_text(&resp, "message", "hidden number fact")?;
        Ok(ctx.clone())
    }
}
