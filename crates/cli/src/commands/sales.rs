//! Catalogue, cart, checkout and offline queue commands.

use std::time::Duration;

use radapos_client::api::products::Product;
use radapos_client::cart::{
    AddOutcome, Cart, Checkout, CheckoutError, CheckoutOutcome, CheckoutPolicy, FixedConnectivity,
    OfflineQueue, TenderedAmount, sync_offline_queue,
};
use radapos_core::ProductId;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use url::Url;

use super::{CliError, Terminal};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Whether a TCP connection to the API host opens within two seconds.
async fn backend_reachable(api_url: &Url) -> bool {
    let Some(host) = api_url.host_str() else {
        return false;
    };
    let Some(port) = api_url.port_or_known_default() else {
        return false;
    };

    match tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(host, port, error = %e, "Backend unreachable");
            false
        }
        Err(_) => {
            debug!(host, port, "Backend probe timed out");
            false
        }
    }
}

/// Connectivity for a checkout, probed only once the sale passes the local
/// checks.
async fn checkout_connectivity(
    api_url: &Url,
    policy: CheckoutPolicy,
    cart: &Cart,
    amount: &str,
    force_offline: bool,
) -> Result<FixedConnectivity, CliError> {
    TenderedAmount::parse(amount)?;
    if policy.reject_empty_cart && cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    let online = !force_offline && backend_reachable(api_url).await;
    if !online {
        warn!("Backend unreachable; sale will be queued");
    }
    Ok(FixedConnectivity(online))
}

fn print_products(products: &[Product]) {
    for p in products {
        let stock = p
            .stock_quantity
            .map_or_else(|| "-".to_owned(), |s| s.to_string());
        let flag = if p.is_low_stock() { " (low)" } else { "" };
        println!("{:>5}  {:<30} {:>14}  stock {stock}{flag}", p.id, p.name, p.price.to_string());
    }
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:>5}  {:<30} x{:<4} {:>14}",
            line.product_id,
            line.name,
            line.quantity,
            line.line_total().to_string()
        );
    }
    println!("TOTAL {:>55}", cart.total().to_string());
}

/// List products for sale.
///
/// # Errors
///
/// Returns error if the catalogue cannot be fetched.
pub async fn products(terminal: &Terminal, vendor_only: bool) -> Result<(), CliError> {
    terminal.require_session()?;
    let products = if vendor_only {
        terminal.client.list_vendor_products().await?
    } else {
        terminal.client.list_products().await?
    };
    print_products(&products);
    Ok(())
}

/// Add one unit of a catalogue product to the cart.
///
/// # Errors
///
/// Returns error if the catalogue cannot be fetched, the product does not
/// exist, or the cart cannot be saved.
pub async fn cart_add(terminal: &Terminal, id: ProductId) -> Result<(), CliError> {
    terminal.require_session()?;
    let product = terminal
        .client
        .list_products()
        .await?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or(CliError::UnknownProduct(id))?;

    let mut cart = Cart::open(terminal.store.clone())?;
    match cart.add_item(&product)? {
        AddOutcome::Added | AddOutcome::Incremented => print_cart(&cart),
        AddOutcome::AtStockLimit => println!("Only {} of {} in stock", product.stock_quantity.unwrap_or_default(), product.name),
        AddOutcome::OutOfStock => println!("{} is out of stock", product.name),
    }
    Ok(())
}

/// Print the cart.
///
/// # Errors
///
/// Returns error if the cart cannot be read.
pub fn cart_show(terminal: &Terminal) -> Result<(), CliError> {
    print_cart(&Cart::open(terminal.store.clone())?);
    Ok(())
}

/// Change a line's quantity.
///
/// # Errors
///
/// Returns error if the cart cannot be read or saved.
pub fn cart_qty(terminal: &Terminal, id: ProductId, delta: i64) -> Result<(), CliError> {
    let mut cart = Cart::open(terminal.store.clone())?;
    if !cart.update_quantity(id, delta)? {
        println!("Quantity unchanged");
    }
    print_cart(&cart);
    Ok(())
}

/// Drop a product from the cart.
///
/// # Errors
///
/// Returns error if the cart cannot be read or saved.
pub fn cart_remove(terminal: &Terminal, id: ProductId) -> Result<(), CliError> {
    let mut cart = Cart::open(terminal.store.clone())?;
    if !cart.remove(id)? {
        println!("Product {id} is not in the cart");
    }
    print_cart(&cart);
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns error if the cart cannot be saved.
pub fn cart_clear(terminal: &Terminal) -> Result<(), CliError> {
    Cart::open(terminal.store.clone())?.clear()?;
    println!("Cart cleared");
    Ok(())
}

/// Take cash for the cart, or queue the sale when the backend is unreachable.
///
/// # Errors
///
/// Returns error if the amount is invalid, the backend rejects the sale, or
/// the queue cannot be saved. An empty cart is refused only when the policy
/// says so.
pub async fn checkout(terminal: &Terminal, amount: &str, force_offline: bool) -> Result<(), CliError> {
    terminal.require_session()?;
    let mut cart = Cart::open(terminal.store.clone())?;
    let mut queue = OfflineQueue::open(terminal.store.clone())?;

    let policy = terminal.config.checkout_policy;
    let connectivity =
        checkout_connectivity(&terminal.config.api_url, policy, &cart, amount, force_offline).await?;

    let checkout = Checkout::new(&terminal.client, connectivity, terminal.config.terminal, policy);
    let cart_cleared = match checkout.checkout(&mut cart, &mut queue, amount).await? {
        CheckoutOutcome::Submitted { message, cart_cleared } => {
            println!("{message}");
            cart_cleared
        }
        CheckoutOutcome::Queued {
            client_ref,
            cart_cleared,
        } => {
            println!("Offline: sale queued as {client_ref} ({} pending)", queue.len());
            cart_cleared || !policy.clear_on_queue
        }
    };
    if !cart_cleared {
        println!("Sale recorded, but the cart could not be cleared; run `rada cart clear`");
    }
    Ok(())
}

/// Print queued sales.
///
/// # Errors
///
/// Returns error if the queue cannot be read.
pub fn queue_list(terminal: &Terminal) -> Result<(), CliError> {
    let queue = OfflineQueue::open(terminal.store.clone())?;
    if queue.is_empty() {
        println!("No queued sales");
        return Ok(());
    }
    for entry in queue.entries() {
        println!(
            "{}  {}  {} lines  {}",
            entry.client_ref,
            entry.queued_at.format("%Y-%m-%d %H:%M:%S"),
            entry.sale.items.len(),
            entry.sale.amount_tendered
        );
    }
    Ok(())
}

/// Submit queued sales once each.
///
/// # Errors
///
/// Returns error if the queue cannot be read or saved.
pub async fn queue_sync(terminal: &Terminal) -> Result<(), CliError> {
    terminal.require_session()?;
    let mut queue = OfflineQueue::open(terminal.store.clone())?;
    if queue.is_empty() {
        println!("No queued sales");
        return Ok(());
    }

    let report = sync_offline_queue(&mut queue, &terminal.client).await?;
    for (client_ref, error) in &report.failed {
        println!("{client_ref}: {error}");
    }
    if report.halted {
        return Err(CliError::NotSignedIn);
    }
    info!(submitted = report.submitted.len(), "Queue sync finished");
    println!(
        "Submitted {}, failed {}, still queued {}",
        report.submitted.len(),
        report.failed.len(),
        report.remaining
    );
    Ok(())
}
