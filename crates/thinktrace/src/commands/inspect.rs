//! Read-only commands: `show`, `analyze`, `list`.

use anyhow::Result;

use thinktrace::api::ListSessionsResponse;
use thinktrace::session::SessionRegistry;

use super::print_json;

pub async fn show(registry: &SessionRegistry, session_id: &str) -> Result<()> {
    let session = registry.get_session(session_id).await?;
    print_json(&session)
}

pub async fn analyze(registry: &SessionRegistry, session_id: &str) -> Result<()> {
    let analytics = registry.analyze(session_id).await?;
    print_json(&analytics)
}

pub async fn list(registry: &SessionRegistry) -> Result<()> {
    let sessions = registry.list().await?;
    print_json(&ListSessionsResponse { sessions })
}
