pub mod client;
pub mod run;
pub mod server;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
    Client(client::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
