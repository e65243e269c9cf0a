use crate::cli::actions::Action;
use crate::edge;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server { port, tables } => edge::serve(port, tables).await,
    }
}
