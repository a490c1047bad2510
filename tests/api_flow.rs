mod common;

use anyhow::{bail, Result};
use campus::{
    cli::actions::client::{perform, Request, ResourceOp},
    client::ApiClient,
    models::{FacultyFields, Feedback, Role, StudentFields},
};
use reqwest::StatusCode;
use secrecy::SecretString;
use uuid::Uuid;

async fn logged_in(base: &str, username: &str, role: Option<Role>) -> Result<ApiClient> {
    let client = ApiClient::new(base)?;
    client.register(username, "pa55word", role).await?;
    let session = client.login(username, "pa55word").await?;
    Ok(ApiClient::new(base)?.with_session(session))
}

#[tokio::test]
async fn account_lifecycle() -> Result<()> {
    let base = common::spawn_app(common::default_services()).await?;
    let client = ApiClient::new(&base)?;

    let health = client.health().await?;
    assert_eq!(health.store, "memory");
    assert_eq!(health.database, "ok");

    let message = client.register("asha", "pa55word", Some(Role::Faculty)).await?;
    assert_eq!(message.message, "User registered successfully");

    let Err(err) = client.register("asha", "other", None).await else {
        bail!("duplicate registration should be rejected");
    };
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.to_string(), "400 Bad Request: User already exists");

    let Err(err) = client.login("asha", "wrong").await else {
        bail!("wrong password should be rejected");
    };
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    let session = client.login("asha", "pa55word").await?;
    assert_eq!(session.claims().username, "asha");
    assert_eq!(session.claims().role, Role::Faculty);
    assert_eq!(session.home_path(), "/faculty");
    assert_eq!(session.claims().exp - session.claims().iat, 3600);

    let client = client.with_session(session);
    let check = client.test_token().await?;
    assert_eq!(check.message, "Token is valid!");
    assert_eq!(check.user.username, "asha");

    Ok(())
}

#[tokio::test]
async fn students_and_faculty() -> Result<()> {
    let base = common::spawn_app(common::default_services()).await?;
    let client = ApiClient::new(&base)?;

    let student = client
        .create_student(&StudentFields {
            name: Some("Ravi".to_string()),
            branch: Some("CSE".to_string()),
            cgpa: Some(8.7),
        })
        .await?;
    assert_eq!(student.name, "Ravi");

    let updated = client
        .update_student(
            student.id,
            &StudentFields {
                cgpa: Some(9.1),
                ..StudentFields::default()
            },
        )
        .await?;
    assert_eq!(updated.branch, "CSE");
    assert!((updated.cgpa - 9.1).abs() < f64::EPSILON);
    assert!(updated.updated_at >= student.updated_at);

    let Err(err) = client
        .update_student(Uuid::now_v7(), &StudentFields::default())
        .await
    else {
        bail!("updating an unknown student should fail");
    };
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    let Err(err) = client.create_student(&StudentFields::default()).await else {
        bail!("empty student should be rejected");
    };
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    assert_eq!(client.list_students().await?, vec![updated]);
    assert_eq!(
        client.delete_student(student.id).await?.message,
        "Student deleted"
    );
    assert!(client.list_students().await?.is_empty());

    let faculty = client
        .create_faculty(&FacultyFields {
            name: Some("Dr. Rao".to_string()),
            designation: Some("Professor".to_string()),
            qualification: Some("PhD".to_string()),
            salary: Some(120_000.0),
        })
        .await?;
    let promoted = client
        .update_faculty(
            faculty.id,
            &FacultyFields {
                designation: Some("Dean".to_string()),
                ..FacultyFields::default()
            },
        )
        .await?;
    assert_eq!(promoted.designation, "Dean");
    assert_eq!(promoted.qualification, "PhD");
    assert_eq!(client.list_faculty().await?.len(), 1);
    assert_eq!(
        client.delete_faculty(faculty.id).await?.message,
        "Faculty deleted"
    );

    // deleting again still succeeds
    assert_eq!(
        client.delete_faculty(faculty.id).await?.message,
        "Faculty deleted"
    );

    Ok(())
}

#[tokio::test]
async fn client_actions_refresh_lists() -> Result<()> {
    let base = common::spawn_app(common::default_services()).await?;
    let client = ApiClient::new(&base)?;

    let output = perform(
        &client,
        Request::Students(ResourceOp::Add(StudentFields {
            name: Some("Meera".to_string()),
            branch: Some("ME".to_string()),
            cgpa: Some(7.5),
        })),
    )
    .await?;
    assert_eq!(output["result"]["name"], "Meera");
    assert_eq!(output["list"].as_array().map(Vec::len), Some(1));

    let output = perform(&client, Request::Students(ResourceOp::List)).await?;
    assert_eq!(output[0]["branch"], "ME");

    let output = perform(
        &client,
        Request::Register {
            username: "kiran".to_string(),
            password: SecretString::from("pa55word".to_string()),
            role: Some(Role::Management),
        },
    )
    .await?;
    assert_eq!(output["message"], "User registered successfully");

    let output = perform(
        &client,
        Request::Login {
            username: "kiran".to_string(),
            password: SecretString::from("pa55word".to_string()),
        },
    )
    .await?;
    assert_eq!(output["home"], "/management");
    assert_eq!(output["user"]["role"], "management");

    assert!(perform(&client, Request::WhoAmI).await.is_err());

    let output = perform(
        &client,
        Request::Feedback(Feedback {
            name: "Meera".to_string(),
            email: "meera@campus.dev".to_string(),
            message: "More library hours".to_string(),
        }),
    )
    .await?;
    assert_eq!(output["message"], "Email sent successfully");

    Ok(())
}

#[tokio::test]
async fn enforced_auth_guards_resources() -> Result<()> {
    let services = common::services(std::sync::Arc::new(campus::mailer::LogEmailSender), true);
    let base = common::spawn_app(services).await?;

    let anonymous = ApiClient::new(&base)?;
    let Err(err) = anonymous.list_students().await else {
        bail!("anonymous listing should be rejected");
    };
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    // registration and login stay open
    let client = logged_in(&base, "priya", Some(Role::Staff)).await?;
    assert!(client.list_students().await?.is_empty());
    assert!(client.list_faculty().await?.is_empty());

    Ok(())
}
