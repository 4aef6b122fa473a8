//! Vendor wallet and admin withdrawal review commands.

use radapos_client::validation;
use radapos_core::{ReviewAction, WithdrawalId};

use super::{CliError, Terminal};

/// Print balance and ledger.
///
/// # Errors
///
/// Returns error if the wallet cannot be fetched.
pub async fn show(terminal: &Terminal) -> Result<(), CliError> {
    terminal.require_session()?;
    let wallet = terminal.client.wallet().await?;
    println!("Balance: {}", wallet.current_balance);

    let history = terminal.client.wallet_history().await?;
    for entry in &history {
        println!(
            "{:<12} {:<22} {:>16}  {}",
            entry.date,
            entry.kind,
            entry.signed_amount(),
            entry.status.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Request a withdrawal of `amount` after checking it against the balance.
///
/// # Errors
///
/// Returns error if the amount is invalid or exceeds the balance, or the
/// backend refuses the request.
pub async fn withdraw(terminal: &Terminal, amount: &str) -> Result<(), CliError> {
    terminal.require_session()?;
    let amount = validation::parse_amount(amount)?;
    let balance = terminal.client.wallet().await?.current_balance;
    let ack = terminal.client.request_withdrawal(amount, balance).await?;
    println!("{}", ack.message_or("Withdrawal requested"));
    Ok(())
}

/// Print withdrawal requests, optionally filtered.
///
/// # Errors
///
/// Returns error if the requests cannot be fetched.
pub async fn list_withdrawals(terminal: &Terminal, search: Option<&str>) -> Result<(), CliError> {
    terminal.require_session()?;
    let stats = terminal.client.wallet_stats().await?;
    println!(
        "Earnings {}  pending {}  revenue {}",
        stats.platform_earnings, stats.pending_withdrawals, stats.total_revenue
    );

    let requests = terminal.client.list_withdrawals().await?;
    for w in requests.iter().filter(|w| search.is_none_or(|term| w.matches(term))) {
        let when = w
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:>5}  {when:<16} {:<24} {:>14}  {:<13} {}",
            w.id,
            w.vendor_name,
            w.amount.to_string(),
            w.mpesa_number.as_deref().unwrap_or("-"),
            w.status
        );
    }
    Ok(())
}

/// Approve or reject a withdrawal.
///
/// # Errors
///
/// Returns error if the backend refuses the review.
pub async fn review(terminal: &Terminal, id: WithdrawalId, action: ReviewAction) -> Result<(), CliError> {
    terminal.require_session()?;
    let ack = terminal.client.review_withdrawal(id, action).await?;
    println!("{}", ack.message_or("Done"));
    Ok(())
}
