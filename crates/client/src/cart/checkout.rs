use std::future::Future;

use radapos_core::{Money, PaymentMethod};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{Cart, OfflineQueue};
use crate::api::transactions::SalePayload;
use crate::api::{Ack, ApiClient, ApiError};
use crate::config::TerminalConfig;
use crate::storage::StorageError;
use crate::validation::{self, ValidationError};

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Tendered amount is not a number of at least 1.
    #[error(transparent)]
    InvalidAmount(ValidationError),

    /// The cart is empty and the policy refuses empty sales.
    #[error("cart is empty")]
    EmptyCart,

    /// The backend refused or could not be reached.
    #[error("checkout failed: {0}")]
    Submit(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Cash amount typed by the cashier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenderedAmount(Money);

impl TenderedAmount {
    /// Parse a finite decimal of at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidAmount`] for anything else.
    pub fn parse(input: &str) -> Result<Self, CheckoutError> {
        validation::parse_amount(input)
            .map(Self)
            .map_err(CheckoutError::InvalidAmount)
    }

    #[must_use]
    pub const fn amount(&self) -> Money {
        self.0
    }
}

/// Cart handling around a checkout.
///
/// The default submits or queues whatever the cart holds, including nothing,
/// and only keeps the cart when the backend rejects the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutPolicy {
    /// Empty the cart once an offline sale is queued.
    pub clear_on_queue: bool,
    /// Empty the cart when the backend rejects an online sale.
    pub clear_on_failure: bool,
    /// Refuse to check out an empty cart.
    pub reject_empty_cart: bool,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            clear_on_queue: true,
            clear_on_failure: false,
            reject_empty_cart: false,
        }
    }
}

/// How a checkout ended.
///
/// `cart_cleared` is false when the cart was kept on purpose or could not be
/// saved empty. The sale stands either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Accepted by the backend.
    Submitted { message: String, cart_cleared: bool },
    /// Stored locally for a later sync.
    Queued { client_ref: Uuid, cart_cleared: bool },
}

/// Empty the cart after the sale is recorded. A failed write is logged, not
/// returned, so the caller never retries a recorded sale.
fn clear_recorded(cart: &mut Cart) -> bool {
    match cart.clear() {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Sale recorded but the cart could not be cleared");
            false
        }
    }
}

/// Whether the terminal believes it can reach the backend.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Connectivity decided up front, e.g. by a probe or a command-line flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedConnectivity(pub bool);

impl Connectivity for FixedConnectivity {
    fn is_online(&self) -> bool {
        self.0
    }
}

/// Where sales are submitted.
pub trait SaleGateway: Send + Sync {
    fn submit_sale(&self, sale: &SalePayload) -> impl Future<Output = Result<Ack, ApiError>> + Send;
}

impl SaleGateway for ApiClient {
    fn submit_sale(&self, sale: &SalePayload) -> impl Future<Output = Result<Ack, ApiError>> + Send {
        self.submit_checkout(sale)
    }
}

impl<T: SaleGateway + ?Sized> SaleGateway for &T {
    fn submit_sale(&self, sale: &SalePayload) -> impl Future<Output = Result<Ack, ApiError>> + Send {
        (**self).submit_sale(sale)
    }
}

/// Cash checkout for one terminal.
#[derive(Debug, Clone)]
pub struct Checkout<G, C> {
    gateway: G,
    connectivity: C,
    terminal: TerminalConfig,
    policy: CheckoutPolicy,
}

impl<G: SaleGateway, C: Connectivity> Checkout<G, C> {
    pub const fn new(gateway: G, connectivity: C, terminal: TerminalConfig, policy: CheckoutPolicy) -> Self {
        Self {
            gateway,
            connectivity,
            terminal,
            policy,
        }
    }

    /// Check out the cart for `amount` tendered in cash.
    ///
    /// Offline, the sale is queued instead of submitted. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidAmount`] (or [`CheckoutError::EmptyCart`]
    /// when the policy refuses empty sales) before any network call,
    /// [`CheckoutError::Submit`] when the backend fails, and
    /// [`CheckoutError::Storage`] when the queue cannot be persisted.
    #[instrument(skip(self, cart, queue), fields(lines = cart.len()))]
    pub async fn checkout(
        &self,
        cart: &mut Cart,
        queue: &mut OfflineQueue,
        amount: &str,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let tendered = TenderedAmount::parse(amount)?;
        if self.policy.reject_empty_cart && cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let online = self.connectivity.is_online();
        let sale = SalePayload {
            vendor_id: self.terminal.vendor_id,
            event_id: self.terminal.event_id,
            items: cart.sale_lines(),
            amount_tendered: tendered.amount(),
            payment_method: PaymentMethod::Cash,
            offline: !online,
        };

        if !online {
            let client_ref = queue.push(sale)?;
            let cart_cleared = self.policy.clear_on_queue && clear_recorded(cart);
            return Ok(CheckoutOutcome::Queued {
                client_ref,
                cart_cleared,
            });
        }

        match self.gateway.submit_sale(&sale).await {
            Ok(ack) => {
                info!(amount = %sale.amount_tendered, "Checkout complete");
                let message = ack.message_or("Transaction successful").to_owned();
                Ok(CheckoutOutcome::Submitted {
                    message,
                    cart_cleared: clear_recorded(cart),
                })
            }
            Err(e) => {
                warn!(error = %e, "Checkout rejected");
                if self.policy.clear_on_failure {
                    if let Err(clear_err) = cart.clear() {
                        warn!(error = %clear_err, "Failed to clear cart after rejected checkout");
                    }
                }
                Err(CheckoutError::Submit(e))
            }
        }
    }
}

/// Result of draining the offline queue.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Entries the backend accepted, now removed from the queue.
    pub submitted: Vec<Uuid>,
    /// Entries the backend refused, with the error. They stay queued.
    pub failed: Vec<(Uuid, String)>,
    /// Entries still queued afterwards.
    pub remaining: usize,
    /// The session expired and the drain stopped early.
    pub halted: bool,
}

/// Submit every queued sale once, oldest first.
///
/// # Errors
///
/// Returns error if the queue cannot be persisted after a removal.
#[instrument(skip_all, fields(pending = queue.len()))]
pub async fn sync_offline_queue<G: SaleGateway>(
    queue: &mut OfflineQueue,
    gateway: &G,
) -> Result<SyncReport, StorageError> {
    let mut report = SyncReport::default();

    for entry in queue.entries().to_vec() {
        match gateway.submit_sale(&entry.sale).await {
            Ok(_) => {
                queue.remove(entry.client_ref)?;
                report.submitted.push(entry.client_ref);
            }
            Err(ApiError::Unauthorized) => {
                warn!(client_ref = %entry.client_ref, "Session expired; queue sync stopped");
                report.halted = true;
                break;
            }
            Err(e) => {
                warn!(client_ref = %entry.client_ref, error = %e, "Queued sale rejected");
                report.failed.push((entry.client_ref, e.to_string()));
            }
        }
    }

    report.remaining = queue.len();
    info!(
        submitted = report.submitted.len(),
        failed = report.failed.len(),
        remaining = report.remaining,
        "Offline queue synced"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use reqwest::StatusCode;

    use super::*;
    use crate::cart::tests::{LockedCartStore, product};
    use crate::storage::MemoryStore;

    #[derive(Clone, Copy)]
    enum Reply {
        Accept,
        Reject,
        Expire,
    }

    struct FakeGateway {
        replies: Mutex<Vec<Reply>>,
        calls: Mutex<Vec<SalePayload>>,
    }

    impl FakeGateway {
        /// Replies are consumed in order; the last one repeats.
        fn new(replies: &[Reply]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().copied().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<SalePayload> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SaleGateway for FakeGateway {
        async fn submit_sale(&self, sale: &SalePayload) -> Result<Ack, ApiError> {
            self.calls.lock().unwrap().push(sale.clone());
            let reply = {
                let mut replies = self.replies.lock().unwrap();
                if replies.len() > 1 { replies.pop().unwrap() } else { replies[0] }
            };
            match reply {
                Reply::Accept => Ok(Ack::default()),
                Reply::Reject => Err(ApiError::Status {
                    status: StatusCode::BAD_REQUEST,
                    message: "Insufficient stock".to_owned(),
                }),
                Reply::Expire => Err(ApiError::Unauthorized),
            }
        }
    }

    struct Till {
        cart: Cart,
        queue: OfflineQueue,
    }

    fn till() -> Till {
        let store = Arc::new(MemoryStore::new());
        let mut cart = Cart::open(store.clone()).unwrap();
        cart.add_item(&product(1, 150, Some(10))).unwrap();
        cart.add_item(&product(1, 150, Some(10))).unwrap();
        cart.add_item(&product(2, 60, None)).unwrap();
        Till {
            cart,
            queue: OfflineQueue::open(store).unwrap(),
        }
    }

    fn checkout(gateway: &FakeGateway, online: bool) -> Checkout<&FakeGateway, FixedConnectivity> {
        Checkout::new(
            gateway,
            FixedConnectivity(online),
            TerminalConfig::default(),
            CheckoutPolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_invalid_amount_touches_nothing() {
        let gateway = FakeGateway::new(&[Reply::Accept]);
        let mut till = till();
        let before = till.cart.lines().to_vec();

        for bad in ["", "abc", "0", "0.5", "-10", "NaN", "inf"] {
            let err = checkout(&gateway, true)
                .checkout(&mut till.cart, &mut till.queue, bad)
                .await
                .unwrap_err();
            assert!(matches!(err, CheckoutError::InvalidAmount(_)), "{bad}");
        }

        assert!(gateway.calls().is_empty());
        assert_eq!(till.cart.lines(), before.as_slice());
        assert!(till.queue.is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_when_policy_asks() {
        let gateway = FakeGateway::new(&[Reply::Accept]);
        let mut till = till();
        till.cart.clear().unwrap();
        let strict = Checkout::new(
            &gateway,
            FixedConnectivity(true),
            TerminalConfig::default(),
            CheckoutPolicy {
                reject_empty_cart: true,
                ..CheckoutPolicy::default()
            },
        );

        let err = strict
            .checkout(&mut till.cart, &mut till.queue, "500")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert!(gateway.calls().is_empty());
        assert!(till.queue.is_empty());
    }

    #[tokio::test]
    async fn test_offline_empty_cart_still_queued() {
        let gateway = FakeGateway::new(&[Reply::Accept]);
        let mut till = till();
        till.cart.clear().unwrap();

        let outcome = checkout(&gateway, false)
            .checkout(&mut till.cart, &mut till.queue, "100")
            .await
            .unwrap();

        assert!(matches!(outcome, CheckoutOutcome::Queued { .. }));
        assert_eq!(till.queue.len(), 1);
        assert!(till.queue.entries()[0].sale.items.is_empty());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_online_empty_cart_submitted() {
        let gateway = FakeGateway::new(&[Reply::Accept]);
        let mut till = till();
        till.cart.clear().unwrap();

        checkout(&gateway, true)
            .checkout(&mut till.cart, &mut till.queue, "100")
            .await
            .unwrap();

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].items.is_empty());
    }

    fn locked_till() -> (Arc<LockedCartStore>, Till) {
        let store = Arc::new(LockedCartStore::default());
        let mut cart = Cart::open(store.clone()).unwrap();
        cart.add_item(&product(1, 150, Some(10))).unwrap();
        let queue = OfflineQueue::open(store.clone()).unwrap();
        store.lock_cart();
        (store, Till { cart, queue })
    }

    #[tokio::test]
    async fn test_submitted_sale_stands_when_cart_cannot_be_cleared() {
        let gateway = FakeGateway::new(&[Reply::Accept]);
        let (_store, mut till) = locked_till();

        let outcome = checkout(&gateway, true)
            .checkout(&mut till.cart, &mut till.queue, "150")
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            CheckoutOutcome::Submitted {
                cart_cleared: false,
                ..
            }
        ));
        assert_eq!(gateway.calls().len(), 1);
        assert_eq!(till.cart.len(), 1);
    }

    #[tokio::test]
    async fn test_queued_sale_stands_when_cart_cannot_be_cleared() {
        let gateway = FakeGateway::new(&[Reply::Accept]);
        let (store, mut till) = locked_till();

        let outcome = checkout(&gateway, false)
            .checkout(&mut till.cart, &mut till.queue, "150")
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            CheckoutOutcome::Queued {
                cart_cleared: false,
                ..
            }
        ));
        assert_eq!(till.queue.len(), 1);
        assert_eq!(OfflineQueue::open(store).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_offline_checkout_queues_once() {
        let gateway = FakeGateway::new(&[Reply::Accept]);
        let mut till = till();

        let outcome = checkout(&gateway, false)
            .checkout(&mut till.cart, &mut till.queue, "400")
            .await
            .unwrap();

        assert!(matches!(outcome, CheckoutOutcome::Queued { .. }));
        assert!(gateway.calls().is_empty());
        assert!(till.cart.is_empty());
        assert_eq!(till.queue.len(), 1);

        let queued = &till.queue.entries()[0].sale;
        assert!(queued.offline);
        assert_eq!(queued.amount_tendered, Money::from_shillings(400));
        assert_eq!(queued.items.len(), 2);
        assert_eq!(queued.items[0].qty, 2);
    }

    #[tokio::test]
    async fn test_offline_checkout_can_keep_cart() {
        let gateway = FakeGateway::new(&[Reply::Accept]);
        let mut till = till();
        let keep = Checkout::new(
            &gateway,
            FixedConnectivity(false),
            TerminalConfig::default(),
            CheckoutPolicy {
                clear_on_queue: false,
                ..CheckoutPolicy::default()
            },
        );

        keep.checkout(&mut till.cart, &mut till.queue, "400").await.unwrap();
        assert_eq!(till.cart.len(), 2);
        assert_eq!(till.queue.len(), 1);
    }

    #[tokio::test]
    async fn test_online_success_clears_cart() {
        let gateway = FakeGateway::new(&[Reply::Accept]);
        let mut till = till();

        let outcome = checkout(&gateway, true)
            .checkout(&mut till.cart, &mut till.queue, "360")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CheckoutOutcome::Submitted {
                message: "Transaction successful".to_owned(),
                cart_cleared: true,
            }
        );
        assert!(till.cart.is_empty());
        assert!(till.queue.is_empty());
        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].offline);
    }

    #[tokio::test]
    async fn test_online_failure_keeps_cart() {
        let gateway = FakeGateway::new(&[Reply::Reject]);
        let mut till = till();
        let before = till.cart.lines().to_vec();

        let err = checkout(&gateway, true)
            .checkout(&mut till.cart, &mut till.queue, "360")
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Submit(ApiError::Status { .. })));
        assert_eq!(till.cart.lines(), before.as_slice());
        assert!(till.queue.is_empty());
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_policy_clears_cart() {
        let gateway = FakeGateway::new(&[Reply::Reject]);
        let mut till = till();
        let clearing = Checkout::new(
            &gateway,
            FixedConnectivity(true),
            TerminalConfig::default(),
            CheckoutPolicy {
                clear_on_failure: true,
                ..CheckoutPolicy::default()
            },
        );

        assert!(clearing.checkout(&mut till.cart, &mut till.queue, "360").await.is_err());
        assert!(till.cart.is_empty());
    }

    #[tokio::test]
    async fn test_sync_removes_accepted_keeps_rejected() {
        let mut till = till();
        let offline = FakeGateway::new(&[Reply::Accept]);
        let policy = CheckoutPolicy {
            clear_on_queue: false,
            ..CheckoutPolicy::default()
        };
        let queueing = Checkout::new(&offline, FixedConnectivity(false), TerminalConfig::default(), policy);
        for amount in ["100", "200", "300"] {
            queueing.checkout(&mut till.cart, &mut till.queue, amount).await.unwrap();
        }
        let refs: Vec<Uuid> = till.queue.entries().iter().map(|e| e.client_ref).collect();

        let gateway = FakeGateway::new(&[Reply::Accept, Reply::Reject, Reply::Accept]);
        let report = sync_offline_queue(&mut till.queue, &gateway).await.unwrap();

        assert_eq!(report.submitted, vec![refs[0], refs[2]]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, refs[1]);
        assert_eq!(report.remaining, 1);
        assert!(!report.halted);
        assert_eq!(till.queue.entries()[0].client_ref, refs[1]);

        let amounts: Vec<Money> = gateway.calls().iter().map(|s| s.amount_tendered).collect();
        assert_eq!(
            amounts,
            vec![
                Money::from_shillings(100),
                Money::from_shillings(200),
                Money::from_shillings(300)
            ]
        );
    }

    #[tokio::test]
    async fn test_sync_stops_on_expired_session() {
        let mut till = till();
        till.queue.push(checkout_payload()).unwrap();
        till.queue.push(checkout_payload()).unwrap();

        let gateway = FakeGateway::new(&[Reply::Expire]);
        let report = sync_offline_queue(&mut till.queue, &gateway).await.unwrap();

        assert!(report.halted);
        assert_eq!(report.remaining, 2);
        assert_eq!(gateway.calls().len(), 1);
    }

    fn checkout_payload() -> SalePayload {
        SalePayload {
            vendor_id: TerminalConfig::default().vendor_id,
            event_id: TerminalConfig::default().event_id,
            items: Vec::new(),
            amount_tendered: Money::from_shillings(10),
            payment_method: PaymentMethod::Cash,
            offline: true,
        }
    }

    #[test]
    fn test_tendered_amount() {
        assert_eq!(
            TenderedAmount::parse("1000.50").unwrap().amount().to_string(),
            "KES 1000.50"
        );
        assert!(TenderedAmount::parse("0.99").is_err());
    }
}
