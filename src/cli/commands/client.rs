use clap::{builder::ValueParser, Arg, Command};
use uuid::Uuid;

use crate::models::Role;

pub const ARG_URL: &str = "url";
pub const ARG_TOKEN: &str = "token";

pub const CMD_REGISTER: &str = "register";
pub const CMD_LOGIN: &str = "login";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_STUDENTS: &str = "students";
pub const CMD_FACULTY: &str = "faculty";
pub const CMD_FEEDBACK: &str = "feedback";

pub const CMD_LIST: &str = "list";
pub const CMD_ADD: &str = "add";
pub const CMD_UPDATE: &str = "update";
pub const CMD_DELETE: &str = "delete";

pub const ARG_ID: &str = "id";

#[must_use]
pub fn validator_uuid() -> ValueParser {
    ValueParser::from(move |id: &str| -> std::result::Result<Uuid, String> {
        Uuid::parse_str(id.trim()).map_err(|_| format!("invalid id: {id}"))
    })
}

/// API location and session token shared by every client subcommand.
fn with_connection_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_URL)
                .long(ARG_URL)
                .help("Base URL of the campus API")
                .default_value("http://localhost:5000")
                .env("CAMPUS_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TOKEN)
                .long(ARG_TOKEN)
                .help("Session token returned by `login`")
                .env("CAMPUS_TOKEN")
                .hide_env_values(true)
                .global(true),
        )
}

fn credential_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("username")
                .short('u')
                .long("username")
                .help("Account name")
                .required(true),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Account password")
                .env("CAMPUS_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}

fn text_arg(name: &'static str, help: &'static str, required: bool) -> Arg {
    Arg::new(name).long(name).help(help).required(required)
}

fn number_arg(name: &'static str, help: &'static str, required: bool) -> Arg {
    text_arg(name, help, required).value_parser(clap::value_parser!(f64))
}

fn id_arg() -> Arg {
    Arg::new(ARG_ID)
        .help("Record id")
        .required(true)
        .value_parser(validator_uuid())
}

fn resource(
    name: &'static str,
    about: &'static str,
    fields: &[(&'static str, &'static str, bool)],
) -> Command {
    let add = fields.iter().fold(
        Command::new(CMD_ADD).about("Create a record and print the refreshed list"),
        |command, &(field, help, numeric)| {
            command.arg(if numeric {
                number_arg(field, help, true)
            } else {
                text_arg(field, help, true)
            })
        },
    );

    let update = fields.iter().fold(
        Command::new(CMD_UPDATE)
            .about("Change the given fields and print the refreshed list")
            .arg(id_arg()),
        |command, &(field, help, numeric)| {
            command.arg(if numeric {
                number_arg(field, help, false)
            } else {
                text_arg(field, help, false)
            })
        },
    );

    with_connection_args(
        Command::new(name)
            .about(about)
            .subcommand_required(true)
            .subcommand(Command::new(CMD_LIST).about("List all records"))
            .subcommand(add)
            .subcommand(update)
            .subcommand(
                Command::new(CMD_DELETE)
                    .about("Delete a record and print the refreshed list")
                    .arg(id_arg()),
            ),
    )
}

#[must_use]
pub fn subcommands() -> Vec<Command> {
    vec![
        with_connection_args(credential_args(
            Command::new(CMD_REGISTER).about("Create an account").arg(
                Arg::new("role")
                    .long("role")
                    .help("student, faculty, staff or management (default: student)")
                    .value_parser(|value: &str| value.parse::<Role>()),
            ),
        )),
        with_connection_args(credential_args(
            Command::new(CMD_LOGIN).about("Log in and print the session token"),
        )),
        with_connection_args(
            Command::new(CMD_WHOAMI).about("Check the session token against the server"),
        ),
        resource(
            CMD_STUDENTS,
            "Manage student records",
            &[
                ("name", "Student name", false),
                ("branch", "Branch of study", false),
                ("cgpa", "Cumulative grade point average", true),
            ],
        ),
        resource(
            CMD_FACULTY,
            "Manage faculty records",
            &[
                ("name", "Faculty member name", false),
                ("designation", "Designation, example: Professor", false),
                ("qualification", "Highest qualification", false),
                ("salary", "Salary", true),
            ],
        ),
        with_connection_args(
            Command::new(CMD_FEEDBACK)
                .about("Send feedback by email")
                .arg(text_arg("name", "Your name", true))
                .arg(text_arg("email", "Your email address", true))
                .arg(text_arg("message", "Feedback message", true)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        Command::new("campus").subcommands(subcommands())
    }

    #[test]
    fn test_connection_defaults_and_env() {
        temp_env::with_vars(
            [("CAMPUS_URL", None::<&str>), ("CAMPUS_TOKEN", None)],
            || {
                let matches = command().get_matches_from(vec!["campus", "whoami"]);
                let (_, sub) = matches.subcommand().unwrap();
                assert_eq!(
                    sub.get_one::<String>(ARG_URL).map(String::as_str),
                    Some("http://localhost:5000")
                );
                assert!(sub.get_one::<String>(ARG_TOKEN).is_none());
            },
        );

        temp_env::with_vars(
            [
                ("CAMPUS_URL", Some("https://campus.dev")),
                ("CAMPUS_TOKEN", Some("a.b.c")),
            ],
            || {
                let matches = command().get_matches_from(vec!["campus", "students", "list"]);
                let (_, students) = matches.subcommand().unwrap();
                assert_eq!(
                    students.get_one::<String>(ARG_URL).map(String::as_str),
                    Some("https://campus.dev")
                );
                assert_eq!(
                    students.get_one::<String>(ARG_TOKEN).map(String::as_str),
                    Some("a.b.c")
                );
            },
        );
    }

    #[test]
    fn test_register_role() {
        temp_env::with_vars([("CAMPUS_PASSWORD", None::<&str>)], || {
            let matches = command().get_matches_from(vec![
                "campus", "register", "-u", "asha", "--password", "pw", "--role", "faculty",
            ]);
            let (_, sub) = matches.subcommand().unwrap();
            assert_eq!(sub.get_one::<Role>("role").copied(), Some(Role::Faculty));

            assert!(command()
                .try_get_matches_from(vec![
                    "campus", "register", "-u", "asha", "--password", "pw", "--role", "dean",
                ])
                .is_err());
        });
    }

    #[test]
    fn test_resource_subcommands() {
        let matches = command().get_matches_from(vec![
            "campus", "faculty", "add", "--name", "Dr. Rao", "--designation", "Professor",
            "--qualification", "PhD", "--salary", "120000",
        ]);
        let (_, faculty) = matches.subcommand().unwrap();
        let (name, add) = faculty.subcommand().unwrap();
        assert_eq!(name, CMD_ADD);
        assert_eq!(add.get_one::<f64>("salary").copied(), Some(120_000.0));

        // add needs every field, update any subset
        assert!(command()
            .try_get_matches_from(vec!["campus", "students", "add", "--name", "Asha"])
            .is_err());

        let id = Uuid::now_v7().to_string();
        let matches = command().get_matches_from(vec![
            "campus", "students", "update", id.as_str(), "--cgpa", "9.2",
        ]);
        let (_, students) = matches.subcommand().unwrap();
        let (_, update) = students.subcommand().unwrap();
        assert_eq!(update.get_one::<Uuid>(ARG_ID).map(ToString::to_string), Some(id));
        assert_eq!(update.get_one::<f64>("cgpa").copied(), Some(9.2));
        assert!(update.get_one::<String>("name").is_none());

        assert!(command()
            .try_get_matches_from(vec!["campus", "students", "delete", "not-an-id"])
            .is_err());
    }
}
