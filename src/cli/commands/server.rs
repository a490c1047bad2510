use clap::{builder::BoolishValueParser, Arg, ArgAction, Command};

use crate::mailer::SmtpSecurity;

pub const CMD_SERVER: &str = "server";

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_SECRET_KEY: &str = "secret-key";
pub const ARG_TOKEN_TTL: &str = "token-ttl";
pub const ARG_ENFORCE_AUTH: &str = "enforce-auth";
pub const ARG_CORS_ORIGIN: &str = "cors-origin";
pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_SMTP_FROM: &str = "smtp-from";
pub const ARG_SMTP_SECURITY: &str = "smtp-security";
pub const ARG_FEEDBACK_INBOX: &str = "feedback-inbox";

#[must_use]
pub fn subcommand() -> Command {
    let command = Command::new(CMD_SERVER)
        .about("Run the API server")
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("5000")
                .env("CAMPUS_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Database connection string")
                .long_help(
                    "PostgreSQL connection string. Without it records are kept in memory and lost on exit.",
                )
                .env("CAMPUS_DSN"),
        )
        .arg(
            Arg::new(ARG_SECRET_KEY)
                .long(ARG_SECRET_KEY)
                .help("Key used to sign session tokens")
                .env("CAMPUS_SECRET_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL)
                .long(ARG_TOKEN_TTL)
                .help("Session token lifetime in seconds")
                .default_value("3600")
                .env("CAMPUS_TOKEN_TTL")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_ENFORCE_AUTH)
                .long(ARG_ENFORCE_AUTH)
                .help("Require a bearer token on student, faculty and feedback routes")
                .env("CAMPUS_ENFORCE_AUTH")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_CORS_ORIGIN)
                .long(ARG_CORS_ORIGIN)
                .help("Origin allowed by CORS, example: http://localhost:3000 (default: any)")
                .env("CAMPUS_CORS_ORIGIN"),
        )
        .arg(
            Arg::new(ARG_FEEDBACK_INBOX)
                .long(ARG_FEEDBACK_INBOX)
                .help("Address receiving feedback (default: the submitter)")
                .env("CAMPUS_FEEDBACK_INBOX"),
        );

    with_smtp_args(command)
}

fn with_smtp_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host, feedback is only logged when unset")
                .env("CAMPUS_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP relay port")
                .default_value("587")
                .env("CAMPUS_SMTP_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP username")
                .env("CAMPUS_SMTP_USERNAME")
                .requires(ARG_SMTP_PASSWORD),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password")
                .env("CAMPUS_SMTP_PASSWORD")
                .hide_env_values(true)
                .requires(ARG_SMTP_USERNAME),
        )
        .arg(
            Arg::new(ARG_SMTP_FROM)
                .long(ARG_SMTP_FROM)
                .help("Sender address (default: the SMTP username)")
                .env("CAMPUS_SMTP_FROM"),
        )
        .arg(
            Arg::new(ARG_SMTP_SECURITY)
                .long(ARG_SMTP_SECURITY)
                .help("Transport security: starttls, tls or none")
                .default_value("starttls")
                .env("CAMPUS_SMTP_SECURITY")
                .value_parser(|value: &str| value.parse::<SmtpSecurity>()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_VARS: [&str; 13] = [
        "CAMPUS_PORT",
        "CAMPUS_DSN",
        "CAMPUS_SECRET_KEY",
        "CAMPUS_TOKEN_TTL",
        "CAMPUS_ENFORCE_AUTH",
        "CAMPUS_CORS_ORIGIN",
        "CAMPUS_FEEDBACK_INBOX",
        "CAMPUS_SMTP_HOST",
        "CAMPUS_SMTP_PORT",
        "CAMPUS_SMTP_USERNAME",
        "CAMPUS_SMTP_PASSWORD",
        "CAMPUS_SMTP_FROM",
        "CAMPUS_SMTP_SECURITY",
    ];

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        overrides(&[])
    }

    // every server variable unset except the given ones
    fn overrides(
        set: &[(&'static str, &'static str)],
    ) -> Vec<(&'static str, Option<&'static str>)> {
        SERVER_VARS
            .iter()
            .map(|var| {
                let value = set.iter().find(|(name, _)| name == var).map(|(_, v)| *v);
                (*var, value)
            })
            .collect()
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(cleared(), || {
            let matches =
                subcommand().get_matches_from(vec!["server", "--secret-key", "s3cret"]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(5000));
            assert_eq!(matches.get_one::<u64>(ARG_TOKEN_TTL).copied(), Some(3600));
            assert_eq!(matches.get_one::<u16>(ARG_SMTP_PORT).copied(), Some(587));
            assert_eq!(
                matches.get_one::<SmtpSecurity>(ARG_SMTP_SECURITY).copied(),
                Some(SmtpSecurity::StartTls)
            );
            assert!(!matches.get_flag(ARG_ENFORCE_AUTH));
            assert!(matches.get_one::<String>(ARG_DSN).is_none());
        });
    }

    #[test]
    fn test_secret_key_required() {
        temp_env::with_vars(cleared(), || {
            assert!(subcommand().try_get_matches_from(vec!["server"]).is_err());
        });
    }

    #[test]
    fn test_check_env() {
        let vars = overrides(&[
            ("CAMPUS_PORT", "8443"),
            ("CAMPUS_DSN", "postgres://campus@localhost:5432/campus"),
            ("CAMPUS_SECRET_KEY", "from-env"),
            ("CAMPUS_TOKEN_TTL", "60"),
            ("CAMPUS_ENFORCE_AUTH", "yes"),
            ("CAMPUS_SMTP_HOST", "smtp.campus.dev"),
            ("CAMPUS_SMTP_SECURITY", "tls"),
        ]);
        temp_env::with_vars(vars, || {
            let matches = subcommand().get_matches_from(vec!["server"]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8443));
            assert_eq!(
                matches.get_one::<String>(ARG_DSN).map(String::as_str),
                Some("postgres://campus@localhost:5432/campus")
            );
            assert_eq!(
                matches.get_one::<String>(ARG_SECRET_KEY).map(String::as_str),
                Some("from-env")
            );
            assert_eq!(matches.get_one::<u64>(ARG_TOKEN_TTL).copied(), Some(60));
            assert!(matches.get_flag(ARG_ENFORCE_AUTH));
            assert_eq!(
                matches.get_one::<SmtpSecurity>(ARG_SMTP_SECURITY).copied(),
                Some(SmtpSecurity::Tls)
            );
        });
    }

    #[test]
    fn test_smtp_credentials_come_in_pairs() {
        temp_env::with_vars(cleared(), || {
            let result = subcommand().try_get_matches_from(vec![
                "server",
                "--secret-key",
                "s3cret",
                "--smtp-username",
                "mailer",
            ]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_token_ttl_must_be_positive() {
        temp_env::with_vars(cleared(), || {
            let result = subcommand().try_get_matches_from(vec![
                "server",
                "--secret-key",
                "s3cret",
                "--token-ttl",
                "0",
            ]);
            assert!(result.is_err());
        });
    }
}
