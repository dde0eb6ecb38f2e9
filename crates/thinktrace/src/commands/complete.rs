//! `complete` command: record a conclusion.

use anyhow::Result;

use thinktrace::api::CompleteSessionRequest;
use thinktrace::session::SessionRegistry;

use super::print_json;

pub async fn run(
    registry: &SessionRegistry,
    session_id: &str,
    conclusion: String,
    success: bool,
) -> Result<()> {
    let request = CompleteSessionRequest {
        conclusion,
        success: Some(success),
    };

    let response = registry.complete(session_id, request).await?;
    print_json(&response)
}
