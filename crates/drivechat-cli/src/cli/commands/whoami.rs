//! Shows the authenticated identity.

use anyhow::Result;
use drivechat_core::api::ApiClient;
use drivechat_core::session::{Session, mask_token};

pub async fn run(api: &ApiClient, session: &Session) -> Result<()> {
    // Prefer the backend's view of the identity; fall back to the local
    // snapshot when the backend is unreachable.
    let current = api.fetch_user(&session.token).await;
    let identity = current.as_ref().unwrap_or(session);

    println!("{} <{}>", identity.name, identity.email);
    println!("token: {}", mask_token(&identity.token));
    if current.is_none() {
        println!("(backend unreachable; showing the local snapshot)");
    }
    Ok(())
}
