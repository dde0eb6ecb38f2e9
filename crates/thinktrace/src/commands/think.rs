//! `think` command: append a thought.

use anyhow::Result;

use thinktrace::api::AppendThoughtRequest;
use thinktrace::session::SessionRegistry;

use super::print_json;

pub async fn run(
    registry: &SessionRegistry,
    session_id: &str,
    content: String,
    revises: Option<u32>,
    branch_from: Option<u32>,
    branch_id: Option<String>,
    needs_more_thoughts: bool,
) -> Result<()> {
    let request = AppendThoughtRequest {
        content,
        is_revision: revises.is_some(),
        revises_thought: revises,
        branch_from_thought: branch_from,
        branch_id,
        needs_more_thoughts,
    };

    let response = registry.append_thought(session_id, request).await?;
    print_json(&response)
}
