use secrecy::SecretString;

/// Where the client subcommands talk to and with which token.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub url: String,
    pub token: Option<SecretString>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(url: String) -> Self {
        Self { url, token: None }
    }

    pub fn set_token(&mut self, token: SecretString) {
        self.token = Some(token);
    }
}
