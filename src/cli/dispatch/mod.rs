//! Map parsed CLI arguments onto an [`Action`].

use crate::{
    cli::{
        actions::{
            client::{self, Request, ResourceOp},
            server, Action,
        },
        commands::{client as cc, server as sc},
        globals::GlobalArgs,
    },
    mailer::{SmtpConfig, SmtpSecurity},
    models::{FacultyFields, Feedback, Role, StudentFields},
};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use uuid::Uuid;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((sc::CMD_SERVER, sub_m)) => Ok(Action::Server(server_args(sub_m)?)),
        Some((name, sub_m)) => Ok(Action::Client(client::Args {
            globals: globals(sub_m),
            request: request(name, sub_m)?,
        })),
        None => Err(anyhow!("missing subcommand")),
    }
}

fn string(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    string(matches, id).with_context(|| format!("missing required argument: --{id}"))
}

fn server_args(matches: &ArgMatches) -> Result<server::Args> {
    Ok(server::Args {
        port: matches.get_one::<u16>(sc::ARG_PORT).copied().unwrap_or(5000),
        dsn: string(matches, sc::ARG_DSN),
        secret_key: SecretString::from(required(matches, sc::ARG_SECRET_KEY)?),
        token_ttl_seconds: matches
            .get_one::<u64>(sc::ARG_TOKEN_TTL)
            .copied()
            .unwrap_or(crate::auth::DEFAULT_TOKEN_TTL_SECONDS),
        enforce_auth: matches.get_flag(sc::ARG_ENFORCE_AUTH),
        cors_origin: string(matches, sc::ARG_CORS_ORIGIN),
        smtp: smtp_config(matches)?,
        feedback_inbox: string(matches, sc::ARG_FEEDBACK_INBOX),
    })
}

fn smtp_config(matches: &ArgMatches) -> Result<Option<SmtpConfig>> {
    let Some(host) = string(matches, sc::ARG_SMTP_HOST) else {
        return Ok(None);
    };

    let username = string(matches, sc::ARG_SMTP_USERNAME);
    let from = string(matches, sc::ARG_SMTP_FROM)
        .or_else(|| username.clone())
        .context("--smtp-from or --smtp-username is required with --smtp-host")?;

    let mut config = SmtpConfig::new(host, from)
        .with_port(matches.get_one::<u16>(sc::ARG_SMTP_PORT).copied().unwrap_or(587))
        .with_security(
            matches
                .get_one::<SmtpSecurity>(sc::ARG_SMTP_SECURITY)
                .copied()
                .unwrap_or_default(),
        );

    if let (Some(username), Some(password)) = (username, string(matches, sc::ARG_SMTP_PASSWORD)) {
        config = config.with_credentials(username, SecretString::from(password));
    }

    Ok(Some(config))
}

fn globals(matches: &ArgMatches) -> GlobalArgs {
    let mut globals = GlobalArgs::new(
        string(matches, cc::ARG_URL).unwrap_or_else(|| "http://localhost:5000".to_string()),
    );
    if let Some(token) = string(matches, cc::ARG_TOKEN) {
        globals.set_token(SecretString::from(token));
    }
    globals
}

fn request(name: &str, matches: &ArgMatches) -> Result<Request> {
    match name {
        cc::CMD_REGISTER => Ok(Request::Register {
            username: required(matches, "username")?,
            password: SecretString::from(required(matches, "password")?),
            role: matches.get_one::<Role>("role").copied(),
        }),
        cc::CMD_LOGIN => Ok(Request::Login {
            username: required(matches, "username")?,
            password: SecretString::from(required(matches, "password")?),
        }),
        cc::CMD_WHOAMI => Ok(Request::WhoAmI),
        cc::CMD_STUDENTS => Ok(Request::Students(resource_op(matches, |m| {
            StudentFields {
                name: string(m, "name"),
                branch: string(m, "branch"),
                cgpa: m.get_one::<f64>("cgpa").copied(),
            }
        })?)),
        cc::CMD_FACULTY => Ok(Request::Faculty(resource_op(matches, |m| {
            FacultyFields {
                name: string(m, "name"),
                designation: string(m, "designation"),
                qualification: string(m, "qualification"),
                salary: m.get_one::<f64>("salary").copied(),
            }
        })?)),
        cc::CMD_FEEDBACK => Ok(Request::Feedback(Feedback {
            name: required(matches, "name")?,
            email: required(matches, "email")?,
            message: required(matches, "message")?,
        })),
        other => Err(anyhow!("unknown subcommand: {other}")),
    }
}

fn resource_op<F>(matches: &ArgMatches, fields: impl Fn(&ArgMatches) -> F) -> Result<ResourceOp<F>> {
    let id = |m: &ArgMatches| -> Result<Uuid> {
        m.get_one::<Uuid>(cc::ARG_ID)
            .copied()
            .context("missing required argument: <id>")
    };

    match matches.subcommand() {
        Some((cc::CMD_LIST, _)) => Ok(ResourceOp::List),
        Some((cc::CMD_ADD, sub_m)) => Ok(ResourceOp::Add(fields(sub_m))),
        Some((cc::CMD_UPDATE, sub_m)) => Ok(ResourceOp::Update(id(sub_m)?, fields(sub_m))),
        Some((cc::CMD_DELETE, sub_m)) => Ok(ResourceOp::Delete(id(sub_m)?)),
        _ => Err(anyhow!("missing resource subcommand")),
    }
}
