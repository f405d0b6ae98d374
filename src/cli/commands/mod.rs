use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
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

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("donaci")
        .about("Donor identity and access")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("DONACI_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("DONACI_DSN")
                .required(true),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Public base URI of this service, used as the token issuer claim")
                .env("DONACI_BASE_URL")
                .required(true),
        )
        .arg(
            Arg::new("token-secret")
                .long("token-secret")
                .help("Symmetric signing secret for session tokens")
                .env("DONACI_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("DONACI_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "donaci",
            "--dsn",
            "postgres://donaci@localhost:5432/donaci",
            "--base-url",
            "https://id.donaci.dev",
            "--token-secret",
            "test-secret",
        ]
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "donaci");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Donor identity and access".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_port_and_dsn() {
        let command = new();
        let mut args = base_args();
        args.extend(["--port", "8081"]);
        let matches = command.get_matches_from(args);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(8081));
        assert_eq!(
            matches.get_one::<String>("dsn").map(String::as_str),
            Some("postgres://donaci@localhost:5432/donaci")
        );
        assert_eq!(
            matches.get_one::<String>("base-url").map(String::as_str),
            Some("https://id.donaci.dev")
        );
    }

    #[test]
    fn test_default_port() {
        temp_env::with_vars([("DONACI_PORT", None::<&str>)], || {
            let command = new();
            let matches = command.get_matches_from(base_args());
            assert_eq!(matches.get_one::<u16>("port").copied(), Some(8080));
        });
    }

    #[test]
    fn test_args_from_env() {
        temp_env::with_vars(
            [
                ("DONACI_DSN", Some("postgres://env@localhost:5432/donaci")),
                ("DONACI_BASE_URL", Some("https://env.donaci.dev")),
                ("DONACI_TOKEN_SECRET", Some("env-secret")),
                ("DONACI_PORT", Some("9090")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["donaci"]);

                assert_eq!(matches.get_one::<u16>("port").copied(), Some(9090));
                assert_eq!(
                    matches.get_one::<String>("dsn").map(String::as_str),
                    Some("postgres://env@localhost:5432/donaci")
                );
                assert_eq!(
                    matches.get_one::<String>("base-url").map(String::as_str),
                    Some("https://env.donaci.dev")
                );
            },
        );
    }

    #[test]
    fn test_missing_required_args() {
        temp_env::with_vars(
            [
                ("DONACI_DSN", None::<&str>),
                ("DONACI_BASE_URL", None),
                ("DONACI_TOKEN_SECRET", None),
            ],
            || {
                let command = new();
                let result = command.try_get_matches_from(vec!["donaci"]);
                assert!(result.is_err());
            },
        );
    }
}
