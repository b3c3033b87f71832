//! Lists folders available for scoping.

use anyhow::Result;
use drivechat_core::api::ApiClient;
use drivechat_core::folders::FolderScope;
use drivechat_core::session::Session;

pub async fn run(api: &ApiClient, session: &Session, filter: Option<&str>) -> Result<()> {
    let mut scope = FolderScope::new();
    if scope.begin_fetch() {
        let folders = api.fetch_folders(&session.token).await;
        scope.complete_fetch(folders);
    }

    let folders = scope.filter(filter.unwrap_or(""));
    if folders.is_empty() {
        println!("No folders available.");
        return Ok(());
    }
    for folder in folders {
        println!("{}  {}", folder.id, folder.name);
    }
    Ok(())
}
