//! Account commands: login, logout, whoami, refresh.

use std::io::BufRead;

use serde::Serialize;

use crate::cli::AppContext;
use crate::cli::args::{LoginArgs, WhoamiArgs};
use crate::core::auth::LogoutOutcome;
use crate::core::credentials::CredentialStore;
use crate::core::models::Identity;
use crate::error::{DocstreamError, Result};
use crate::render::to_json;

/// Environment variable holding the login password.
pub const ENV_PASSWORD: &str = "DOCSTREAM_PASSWORD";

#[derive(Serialize)]
struct AccountJson<'a> {
    logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a Identity>,
    session: String,
}

/// Execute the login command.
///
/// # Errors
///
/// Returns an error when no password is available or the backend refuses
/// the credentials.
pub async fn login(ctx: &AppContext, args: &LoginArgs) -> Result<()> {
    let password = read_password(args.password_stdin, std::io::stdin().lock())?;
    let user = ctx.auth().login(&args.email, &password).await?;

    if ctx.is_json() {
        let body = AccountJson {
            logged_in: true,
            user: user.as_ref(),
            session: ctx.store.backend_description(),
        };
        println!("{}", to_json(&body, ctx.pretty)?);
    } else {
        let name = user.as_ref().map_or_else(|| args.email.clone(), Identity::display_name);
        println!("Logged in as {name}");
    }
    Ok(())
}

/// Password from `DOCSTREAM_PASSWORD`, else the first stdin line when
/// `from_stdin` is set.
fn read_password(from_stdin: bool, mut stdin: impl BufRead) -> Result<String> {
    if let Ok(password) = std::env::var(ENV_PASSWORD) {
        if !password.is_empty() {
            return Ok(password);
        }
    }
    if !from_stdin {
        return Err(DocstreamError::Config(format!(
            "No password given. Pipe it with --password-stdin or set {ENV_PASSWORD}"
        )));
    }

    let mut line = String::new();
    stdin.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(DocstreamError::Config("Empty password on stdin".to_string()));
    }
    Ok(password)
}

/// Execute the logout command.
///
/// # Errors
///
/// Returns an error only if the result cannot be serialized.
pub async fn logout(ctx: &AppContext) -> Result<()> {
    let outcome = ctx.auth().logout().await;

    if ctx.is_json() {
        let (status, detail) = match &outcome {
            LogoutOutcome::NotLoggedIn => ("not_logged_in", None),
            LogoutOutcome::Revoked => ("revoked", None),
            LogoutOutcome::LocalOnly(reason) => ("local_only", Some(reason.as_str())),
        };
        let body = serde_json::json!({ "status": status, "detail": detail });
        println!("{}", to_json(&body, ctx.pretty)?);
        return Ok(());
    }

    match outcome {
        LogoutOutcome::NotLoggedIn => println!("Not logged in"),
        LogoutOutcome::Revoked => println!("Logged out"),
        LogoutOutcome::LocalOnly(reason) => {
            println!("Logged out locally");
            eprintln!("Warning: the server was not notified ({reason})");
        }
    }
    Ok(())
}

/// Execute the whoami command.
///
/// # Errors
///
/// Returns [`DocstreamError::NotLoggedIn`] without a session, and pipeline
/// errors when `--refresh` is given.
pub async fn whoami(ctx: &AppContext, args: &WhoamiArgs) -> Result<()> {
    if ctx.store.get().is_none() {
        return Err(DocstreamError::NotLoggedIn);
    }

    let identity = if args.refresh {
        Some(ctx.auth().profile().await?)
    } else {
        ctx.store.identity()
    };

    if ctx.is_json() {
        let body = AccountJson {
            logged_in: true,
            user: identity.as_ref(),
            session: ctx.store.backend_description(),
        };
        println!("{}", to_json(&body, ctx.pretty)?);
        return Ok(());
    }

    match identity {
        Some(user) => {
            println!("{}", user.display_name());
            if !user.email.is_empty() {
                println!("  email:    {}", user.email);
            }
            if let Some(credits) = user.credits {
                println!("  credits:  {credits}");
            }
            println!("  verified: {}", if user.is_verified { "yes" } else { "no" });
        }
        None => println!("Logged in (profile not cached; run `docstream whoami --refresh`)"),
    }
    println!("  session:  {}", ctx.store.backend_description());
    Ok(())
}

/// Execute the refresh command.
///
/// # Errors
///
/// Returns [`DocstreamError::NotLoggedIn`] or
/// [`DocstreamError::RefreshFailed`]; a failed refresh clears the session.
pub async fn refresh(ctx: &AppContext) -> Result<()> {
    ctx.auth().refresh().await?;
    if ctx.is_json() {
        println!("{}", to_json(&serde_json::json!({ "refreshed": true }), ctx.pretty)?);
    } else {
        println!("Access token refreshed");
    }
    Ok(())
}
