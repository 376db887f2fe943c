//! Every tool invocation must be flagged while it runs, and the flags must be
//! gone once the round's results have been analyzed.

use crate::context::AssertionContext;
use checkr_core::lifecycle::{ON_ONE_TOOL_CALLED, ON_TOOL_CALLS_ANALYZED};
use checkr_eval::{EvalError, TaskResult};

pub async fn mainfn(ctx: AssertionContext) -> TaskResult {
    ctx.spawn("flagged", check_flagged(ctx.clone()));
    ctx.spawn("cleared", check_cleared(ctx.clone()));
    Ok(())
}

async fn check_flagged(ctx: AssertionContext) -> TaskResult {
    let called = ctx.event(ON_ONE_TOOL_CALLED)?;
    loop {
        let payload = ctx.wait_event(&called).await;
        let Some(invocation) = payload.as_tool_called() else {
            ctx.fail(format!("{} carried {}", ON_ONE_TOOL_CALLED, payload));
            continue;
        };
        let name = invocation.name.as_str();

        // Tools registered through the agent have a predicate of their own;
        // anything else falls back to the raw flag.
        let flagged = match ctx.pred(name) {
            Ok(pred) => pred.eval(),
            Err(EvalError::UnresolvedSymbol(_)) | Err(EvalError::WrongKind { .. }) => {
                ctx.flags().is_set(name)
            }
            Err(e) => return Err(e),
        };
        if flagged {
            ctx.pass(format!("tool {} flagged while called", name));
        } else {
            ctx.fail(format!("tool {} called without its flag set", name));
        }
    }
}

async fn check_cleared(ctx: AssertionContext) -> TaskResult {
    let analyzed = ctx.event(ON_TOOL_CALLS_ANALYZED)?;
    loop {
        ctx.wait_event(&analyzed).await;
        let stale = ctx.flags().active();
        if stale.is_empty() {
            ctx.pass("flags cleared after tool round");
        } else {
            ctx.fail(format!("flags still set after tool round: {}", stale.join(", ")));
        }
    }
}
