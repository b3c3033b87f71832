//! Logout: best-effort backend notification, unconditional local clear.

use anyhow::Result;
use drivechat_core::api::ApiClient;
use drivechat_core::session::SessionStore;

pub async fn run(api: &ApiClient, store: &SessionStore) -> Result<()> {
    // The backend call may fail (expired token, backend down); the local
    // snapshot is cleared either way.
    if let Some(session) = store.restore() {
        api.logout(&session.token).await;
    }

    if store.invalidate()? {
        println!("Logged out.");
    } else {
        println!("No active session.");
    }
    Ok(())
}
