use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use std::path::PathBuf;

pub mod prune;
pub mod schema;
pub mod server;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
    Schema { output: Option<PathBuf> },
    Prune(GlobalArgs),
}

impl Action {
    /// Execute the action.
    ///
    /// # Errors
    /// Propagates the action's error unchanged.
    pub async fn execute(self) -> Result<()> {
        match self {
            Self::Server(args) => server::execute(args).await,
            Self::Schema { output } => schema::execute(output.as_deref()),
            Self::Prune(globals) => prune::execute(&globals).await,
        }
    }
}
