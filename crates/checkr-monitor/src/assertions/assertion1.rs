//! Logs every lifecycle event the agent emits.

use crate::context::{AssertionContext, ASSERTION_TARGET};
use checkr_core::lifecycle;
use checkr_eval::TaskResult;
use tracing::info;

pub async fn mainfn(ctx: AssertionContext) -> TaskResult {
    info!(target: ASSERTION_TARGET, "ASSERTION1: MAINFN STARTING");
    for name in lifecycle::ALL {
        if name == lifecycle::ON_ALL_TOOLS_CALLED {
            ctx.spawn(name, log_flags(ctx.clone(), name));
        } else {
            ctx.spawn(name, log_payloads(ctx.clone(), name));
        }
    }
    Ok(())
}

async fn log_payloads(ctx: AssertionContext, name: &'static str) -> TaskResult {
    let event = ctx.event(name)?;
    let label = name.to_uppercase();
    loop {
        let payload = ctx.wait_event(&event).await;
        info!(target: ASSERTION_TARGET, t = ctx.now(), "{} {}", label, payload);
    }
}

/// The tool-call round is summarized by which flags were raised.
async fn log_flags(ctx: AssertionContext, name: &'static str) -> TaskResult {
    let event = ctx.event(name)?;
    let label = name.to_uppercase();
    loop {
        ctx.wait_event(&event).await;
        info!(target: ASSERTION_TARGET, t = ctx.now(), "{} {:?}", label, ctx.flags().snapshot());
    }
}
