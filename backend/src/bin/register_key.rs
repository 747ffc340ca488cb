//! Register a public key for a `user@host.domain` identity directly against
//! the database, bypassing the HTTP API.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::io::{self, Read};
use std::sync::Arc;

use clap::Parser;
use keyserver::domain::KeyRegistryService;
use keyserver::domain::PublicKey;
use keyserver::domain::ports::{RegisterKeyRequest, RegistrationOutcome};
use keyserver::outbound::persistence::{
    DbPool, DieselIdentityRepository, PoolConfig, run_pending_migrations,
};
use tokio::runtime::Builder;

const DATABASE_URL_ENV: &str = "KEYSERVER_DATABASE_URL";

/// `register-key` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "register-key",
    about = "Register or replace the SSH public key of a user@host.domain identity",
    version
)]
struct CliArgs {
    /// Identity in `user@host.domain` form.
    #[arg(value_name = "user@host.domain")]
    identifier: String,
    /// Public key line. Read from standard input when omitted or `-`.
    #[arg(long = "key", value_name = "key")]
    key: Option<String>,
    /// Comment stored on a newly created user.
    #[arg(long = "comment", value_name = "text")]
    comment: Option<String>,
    /// Replace the key if the user already exists.
    #[arg(long = "allow-update")]
    allow_update: bool,
    /// Apply pending migrations before registering.
    #[arg(long = "migrate")]
    migrate: bool,
    /// Database connection URL. Falls back to `KEYSERVER_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let raw_key = match args.key.as_deref() {
        Some(key) if key != "-" => key.to_owned(),
        _ => read_stdin()?,
    };
    let public_key = PublicKey::new(raw_key)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error.to_string()))?;

    let database_url = resolve_database_url(args.database_url, env::var(DATABASE_URL_ENV).ok())?;
    if args.migrate {
        let applied = run_pending_migrations(&database_url)
            .await
            .map_err(|error| io::Error::other(format!("run migrations: {error}")))?;
        println!("migrations_applied={applied}");
    }
    let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(1))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    let registry = KeyRegistryService::new(Arc::new(DieselIdentityRepository::new(pool)));

    let mut request =
        RegisterKeyRequest::new(args.identifier, public_key).with_allow_update(args.allow_update);
    if let Some(comment) = args.comment {
        request = request.with_comment(comment);
    }
    let registered = registry
        .add_user_and_key(request)
        .await
        .map_err(|error| io::Error::other(format!("register key failed: {error}")))?;

    let status = match registered.outcome {
        RegistrationOutcome::Created => "created",
        RegistrationOutcome::Updated => "updated",
    };
    println!("status={status}");
    println!("user_id={}", registered.user.id);
    if let Some(fingerprint) = registered.user.pub_key.fingerprint() {
        println!("fingerprint={fingerprint}");
    }
    Ok(())
}

fn read_stdin() -> io::Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|error| io::Error::other(format!("read key from stdin: {error}")))?;
    Ok(buffer)
}

fn resolve_database_url(explicit: Option<String>, from_env: Option<String>) -> io::Result<String> {
    let (value, source) = match (explicit, from_env) {
        (Some(value), _) => (value, "--database-url"),
        (None, Some(value)) => (value, DATABASE_URL_ENV),
        (None, None) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("database URL missing: set --database-url or {DATABASE_URL_ENV}"),
            ));
        }
    };
    if value.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{source} must not be empty"),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI parsing helpers.

    use clap::Parser;
    use rstest::rstest;

    use super::{CliArgs, resolve_database_url};

    #[rstest]
    fn explicit_url_wins_over_environment() {
        let url = resolve_database_url(
            Some("postgres://cli".to_owned()),
            Some("postgres://env".to_owned()),
        )
        .expect("url resolves");
        assert_eq!(url, "postgres://cli");
    }

    #[rstest]
    fn environment_url_is_used_as_fallback() {
        let url = resolve_database_url(None, Some("postgres://env".to_owned())).expect("url");
        assert_eq!(url, "postgres://env");
    }

    #[rstest]
    #[case(None, None, "database URL missing")]
    #[case(Some(" "), None, "--database-url must not be empty")]
    #[case(None, Some(""), "KEYSERVER_DATABASE_URL must not be empty")]
    fn unusable_urls_are_rejected(
        #[case] explicit: Option<&str>,
        #[case] from_env: Option<&str>,
        #[case] expected: &str,
    ) {
        let error = resolve_database_url(
            explicit.map(str::to_owned),
            from_env.map(str::to_owned),
        )
        .expect_err("url rejected");
        assert!(error.to_string().contains(expected), "{error}");
    }

    #[rstest]
    fn parses_registration_flags() {
        let args = CliArgs::try_parse_from([
            "register-key",
            "alice@web.example.com",
            "--key",
            "ssh-ed25519 AAAA alice",
            "--allow-update",
        ])
        .expect("arguments parse");
        assert_eq!(args.identifier, "alice@web.example.com");
        assert_eq!(args.key.as_deref(), Some("ssh-ed25519 AAAA alice"));
        assert!(args.allow_update);
        assert!(!args.migrate);
    }
}
