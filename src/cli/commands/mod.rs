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

    Command::new("parlo")
        .about("Session and route admission gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("PARLO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("protected-routes")
                .long("protected-routes")
                .help("Comma-separated path prefixes that require a session")
                .default_value("/upload,/dashboard")
                .env("PARLO_PROTECTED_ROUTES"),
        )
        .arg(
            Arg::new("auth-routes")
                .long("auth-routes")
                .help("Comma-separated path prefixes that must not be visited while authenticated")
                .default_value("/auth")
                .env("PARLO_AUTH_ROUTES"),
        )
        .arg(
            Arg::new("public-routes")
                .long("public-routes")
                .help("Comma-separated path prefixes with no constraint")
                .default_value("/,/lessons,/review,/auth")
                .env("PARLO_PUBLIC_ROUTES"),
        )
        .arg(
            Arg::new("login-page")
                .long("login-page")
                .help("Login page path used as the redirect target")
                .default_value("/auth")
                .env("PARLO_LOGIN_PAGE"),
        )
        .arg(
            Arg::new("default-redirect")
                .long("default-redirect")
                .help("Post-login landing path when no returnUrl is present")
                .default_value("/dashboard")
                .env("PARLO_DEFAULT_REDIRECT"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("PARLO_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
