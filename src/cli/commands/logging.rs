use clap::{builder::ValueParser, Arg, ArgAction, ArgMatches, Command};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_LEVEL: &str = "log-level";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Increase verbosity, repeat for more: -v WARN, -vv INFO, -vvv DEBUG")
                .global(true)
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new(ARG_LOG_LEVEL)
                .long(ARG_LOG_LEVEL)
                .help("Log level: error, warn, info, debug, trace (default: error)")
                .env("CAMPUS_LOG_LEVEL")
                .global(true)
                .value_parser(validator_log_level()),
        )
}

/// The louder of `-v` count and `--log-level`.
#[must_use]
pub fn verbosity(matches: &ArgMatches) -> u8 {
    let count = matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0);
    let level = matches.get_one::<u8>(ARG_LOG_LEVEL).copied().unwrap_or(0);
    count.max(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_log_level() {
        let command = with_args(Command::new("campus"));
        for (index, level) in ["error", "warn", "info", "debug", "trace"].iter().enumerate() {
            temp_env::with_vars([("CAMPUS_LOG_LEVEL", Some(*level))], || {
                let matches = command.clone().get_matches_from(vec!["campus"]);
                assert_eq!(
                    matches.get_one::<u8>(ARG_LOG_LEVEL).copied(),
                    u8::try_from(index).ok()
                );
                assert_eq!(Some(verbosity(&matches)), u8::try_from(index).ok());
            });
        }

        temp_env::with_vars([("CAMPUS_LOG_LEVEL", Some("loud"))], || {
            assert!(command.clone().try_get_matches_from(vec!["campus"]).is_err());
        });
    }

    #[test]
    fn test_verbosity_count() {
        temp_env::with_vars([("CAMPUS_LOG_LEVEL", None::<String>)], || {
            let matches = with_args(Command::new("campus")).get_matches_from(vec!["campus", "-vvv"]);
            assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(3));
            assert_eq!(verbosity(&matches), 3);
        });
    }

    #[test]
    fn test_louder_setting_wins() {
        let command = with_args(Command::new("campus"));
        temp_env::with_vars([("CAMPUS_LOG_LEVEL", Some("debug"))], || {
            let matches = command.clone().get_matches_from(vec!["campus", "-v"]);
            assert_eq!(verbosity(&matches), 3);

            let matches = command.clone().get_matches_from(vec!["campus", "-vvvv"]);
            assert_eq!(verbosity(&matches), 4);
        });

        temp_env::with_vars([("CAMPUS_LOG_LEVEL", None::<String>)], || {
            let matches = command
                .clone()
                .get_matches_from(vec!["campus", "--log-level", "info"]);
            assert_eq!(verbosity(&matches), 2);

            let matches = command.clone().get_matches_from(vec!["campus"]);
            assert_eq!(verbosity(&matches), 0);
        });
    }
}
