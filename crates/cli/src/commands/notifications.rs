//! Notification listing and the live unread counter.

use radapos_client::api::notifications::unread_count;
use radapos_client::poller::NotificationPoller;

use super::{CliError, Terminal};

/// Print notifications; with `watch`, keep printing the unread count until
/// Ctrl-C or the session ends.
///
/// # Errors
///
/// Returns error if the first fetch fails.
pub async fn show(terminal: &Terminal, watch: bool) -> Result<(), CliError> {
    terminal.require_session()?;
    let list = terminal.client.list_notifications().await?;
    for n in &list {
        let marker = if n.is_read { ' ' } else { '*' };
        println!("{marker} [{:?}] {}  {}", n.kind, n.message, n.display_time());
    }
    println!("{} unread", unread_count(&list));

    if !watch {
        return Ok(());
    }

    let poller = NotificationPoller::spawn(terminal.client.clone(), terminal.config.notification_poll);
    let mut updates = poller.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{} unread", *updates.borrow_and_update());
            }
        }
        if poller.is_finished() {
            break;
        }
    }
    poller.stop();
    Ok(())
}
