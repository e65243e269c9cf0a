use crate::admission::RouteTables;
use crate::cli::actions::Action;
use anyhow::Result;

fn split_prefixes(value: Option<&String>) -> Vec<String> {
    value
        .map(String::as_str)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let defaults = RouteTables::default();

    let tables = RouteTables {
        protected: split_prefixes(matches.get_one::<String>("protected-routes")),
        auth_only: split_prefixes(matches.get_one::<String>("auth-routes")),
        public: split_prefixes(matches.get_one::<String>("public-routes")),
        login_page: matches
            .get_one::<String>("login-page")
            .cloned()
            .unwrap_or(defaults.login_page),
        default_redirect: matches
            .get_one::<String>("default-redirect")
            .cloned()
            .unwrap_or(defaults.default_redirect),
    };

    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        tables,
    })
}
