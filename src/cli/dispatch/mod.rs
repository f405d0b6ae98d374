use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{Context, Result};
use secrecy::SecretString;
use url::Url;

/// Map validated CLI matches to the server action and global arguments.
///
/// # Errors
///
/// Returns an error if required arguments are missing or the base URL does
/// not parse.
pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let base_url = matches
        .get_one::<String>("base-url")
        .cloned()
        .context("missing required argument: --base-url")?;

    // Validate early; the issuer claim keeps the string exactly as given.
    Url::parse(&base_url).context("invalid --base-url")?;

    let token_secret = matches
        .get_one::<String>("token-secret")
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --token-secret")?;

    Ok((
        Action::Server { port, dsn },
        GlobalArgs::new(base_url, token_secret),
    ))
}
