use super::{client, server, Action};
use anyhow::Result;

/// Dispatch an action to its executor.
///
/// # Errors
/// Returns an error if the selected action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
        Action::Client(args) => client::execute(args).await,
    }
}
