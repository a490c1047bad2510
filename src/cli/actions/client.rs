use crate::{
    auth::now_unix_seconds,
    cli::globals::GlobalArgs,
    client::{ApiClient, ClientError, Session},
    models::{Faculty, FacultyFields, Feedback, Message, Role, Student, StudentFields},
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

/// A change to one of the record collections.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceOp<F> {
    List,
    Add(F),
    Update(Uuid, F),
    Delete(Uuid),
}

#[derive(Debug)]
pub enum Request {
    Register {
        username: String,
        password: SecretString,
        role: Option<Role>,
    },
    Login {
        username: String,
        password: SecretString,
    },
    WhoAmI,
    Students(ResourceOp<StudentFields>),
    Faculty(ResourceOp<FacultyFields>),
    Feedback(Feedback),
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub request: Request,
}

/// Execute a client request and print the JSON result to stdout.
/// # Errors
/// Returns an error if the API is unreachable or rejects the request.
pub async fn execute(args: Args) -> Result<()> {
    let client = connect(&args.globals)?;
    let output = perform(&client, args.request).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn connect(globals: &GlobalArgs) -> Result<ApiClient> {
    let client = ApiClient::new(&globals.url)
        .with_context(|| format!("Invalid API URL: {}", globals.url))?;

    let Some(token) = &globals.token else {
        return Ok(client);
    };

    let session =
        Session::from_token(token.expose_secret()).context("Session token is malformed")?;
    if session.is_expired_at(now_unix_seconds()) {
        warn!("Session token has expired, log in again");
    }
    Ok(client.with_session(session))
}

/// Run one request against the API. Mutations are followed by a fresh listing.
///
/// # Errors
/// Returns an error if any call fails.
pub async fn perform(client: &ApiClient, request: Request) -> Result<serde_json::Value> {
    match request {
        Request::Register {
            username,
            password,
            role,
        } => {
            let message = client
                .register(&username, password.expose_secret(), role)
                .await?;
            Ok(serde_json::to_value(message)?)
        }
        Request::Login { username, password } => {
            let session = client.login(&username, password.expose_secret()).await?;
            Ok(json!({
                "token": session.token(),
                "user": session.claims(),
                "home": session.home_path(),
            }))
        }
        Request::WhoAmI => {
            if client.session().is_none() {
                return Err(anyhow!("No session token, run `login` and pass --token"));
            }
            Ok(serde_json::to_value(client.test_token().await?)?)
        }
        Request::Students(op) => apply(client, op).await,
        Request::Faculty(op) => apply(client, op).await,
        Request::Feedback(feedback) => {
            Ok(serde_json::to_value(client.send_feedback(&feedback).await?)?)
        }
    }
}

/// Record collections reachable through the client.
#[async_trait]
pub trait Collection: Sync + Sized {
    type Record: Serialize + Send;

    async fn list(client: &ApiClient) -> Result<Vec<Self::Record>, ClientError>;
    async fn add(client: &ApiClient, fields: &Self) -> Result<Self::Record, ClientError>;
    async fn update(
        client: &ApiClient,
        id: Uuid,
        fields: &Self,
    ) -> Result<Self::Record, ClientError>;
    async fn delete(client: &ApiClient, id: Uuid) -> Result<Message, ClientError>;
}

#[async_trait]
impl Collection for StudentFields {
    type Record = Student;

    async fn list(client: &ApiClient) -> Result<Vec<Student>, ClientError> {
        client.list_students().await
    }

    async fn add(client: &ApiClient, fields: &Self) -> Result<Student, ClientError> {
        client.create_student(fields).await
    }

    async fn update(client: &ApiClient, id: Uuid, fields: &Self) -> Result<Student, ClientError> {
        client.update_student(id, fields).await
    }

    async fn delete(client: &ApiClient, id: Uuid) -> Result<Message, ClientError> {
        client.delete_student(id).await
    }
}

#[async_trait]
impl Collection for FacultyFields {
    type Record = Faculty;

    async fn list(client: &ApiClient) -> Result<Vec<Faculty>, ClientError> {
        client.list_faculty().await
    }

    async fn add(client: &ApiClient, fields: &Self) -> Result<Faculty, ClientError> {
        client.create_faculty(fields).await
    }

    async fn update(client: &ApiClient, id: Uuid, fields: &Self) -> Result<Faculty, ClientError> {
        client.update_faculty(id, fields).await
    }

    async fn delete(client: &ApiClient, id: Uuid) -> Result<Message, ClientError> {
        client.delete_faculty(id).await
    }
}

async fn apply<F: Collection>(client: &ApiClient, op: ResourceOp<F>) -> Result<serde_json::Value> {
    let result = match &op {
        ResourceOp::List => return Ok(serde_json::to_value(F::list(client).await?)?),
        ResourceOp::Add(fields) => serde_json::to_value(F::add(client, fields).await?)?,
        ResourceOp::Update(id, fields) => {
            serde_json::to_value(F::update(client, *id, fields).await?)?
        }
        ResourceOp::Delete(id) => serde_json::to_value(F::delete(client, *id).await?)?,
    };

    debug!("refreshing list after change");
    let list = F::list(client).await?;

    Ok(json!({
        "result": result,
        "list": list,
    }))
}
