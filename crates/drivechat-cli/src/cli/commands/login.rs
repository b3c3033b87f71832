//! Browser-based login.
//!
//! Opens the backend's OAuth entry point, then ingests the redirect URL the
//! user pastes back. The callback is consumed exactly once; the persisted
//! snapshot is the only durable copy of the credential.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use drivechat_core::api::ApiClient;
use drivechat_core::session::{CallbackParams, OauthCallback, SessionStore, mask_token};

pub async fn run(api: &ApiClient, store: &SessionStore) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_with(stdin.lock(), &mut stdout.lock(), api, store)
}

/// Runs the login flow over explicit input/output (testable seam).
pub fn run_with<R, W>(
    mut input: R,
    output: &mut W,
    api: &ApiClient,
    store: &SessionStore,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let login_url = api.login_url();
    writeln!(output, "Opening {login_url} in your browser...")?;
    let skip_browser = std::env::var("DRIVECHAT_NO_BROWSER").is_ok();
    if !skip_browser && open::that(&login_url).is_err() {
        writeln!(output, "Could not open a browser; visit the URL manually.")?;
    }

    writeln!(
        output,
        "After signing in, paste the full redirect URL from the address bar:"
    )?;
    write!(output, "url> ")?;
    output.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("read redirect URL from stdin")?;

    let Some(params) = CallbackParams::from_redirect_url(&line) else {
        bail!("That does not look like a redirect URL (missing token parameter)");
    };

    let mut callback = OauthCallback::new(params);
    let session = store
        .ingest(&mut callback)?
        .context("callback already consumed")?;

    writeln!(
        output,
        "Logged in as {} <{}> (token {})",
        session.name,
        session.email,
        mask_token(&session.token)
    )?;
    Ok(())
}
