//! Each received query is handled before the next one arrives.
//!
//! If the registry holds a numeric `query_deadline` value, a query that stays
//! open longer than that many seconds of virtual time also fails.

use crate::context::AssertionContext;
use checkr_core::lifecycle::{ON_QUERY_HANDLED, ON_QUERY_RECEIVED};
use checkr_eval::{TaskResult, Wait};

/// Registry name of the optional per-query deadline, in seconds.
pub const QUERY_DEADLINE: &str = "query_deadline";

pub async fn mainfn(ctx: AssertionContext) -> TaskResult {
    let received = ctx.event(ON_QUERY_RECEIVED)?;
    let handled = ctx.event(ON_QUERY_HANDLED)?;

    let mut query = ctx.wait_event(&received).await;
    loop {
        let opened = ctx.now();
        let mut waits: Vec<Wait> = vec![
            ctx.wait_event(&handled).into(),
            ctx.wait_event(&received).into(),
        ];
        // Looked up per query so a deadline defined after loading applies.
        if let Some(deadline) = ctx.value(QUERY_DEADLINE).and_then(|v| v.as_f64()) {
            waits.push(ctx.timeout(deadline).into());
        }

        let (arm, payload) = ctx.first_of(waits).await;
        match arm {
            0 => {
                ctx.pass(format!("query {} handled after {:.3}s", query, ctx.now() - opened));
                query = ctx.wait_event(&received).await;
            }
            1 => {
                ctx.fail(format!("query {} still open when {} arrived", query, payload));
                query = payload;
            }
            _ => {
                ctx.fail(format!("query {} not handled within deadline", query));
                query = ctx.wait_event(&received).await;
            }
        }
    }
}
