//! Cart, offline sale queue and checkout.
//!
//! The cart and the queue are persisted after every mutation under
//! [`keys::CART`] and [`keys::OFFLINE_QUEUE`], so a terminal that is closed
//! mid-sale picks up where it left off.

mod checkout;
mod queue;

pub use checkout::{
    Checkout, CheckoutError, CheckoutOutcome, CheckoutPolicy, Connectivity, FixedConnectivity,
    SaleGateway, SyncReport, TenderedAmount, sync_offline_queue,
};
pub use queue::{OfflineQueue, QueuedSale};

use std::sync::Arc;

use radapos_core::{Money, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::products::Product;
use crate::api::transactions::{Coupon, SaleLine, TerminalLine};
use crate::storage::{KeyValueStore, StorageError, keys, load_json, save_json};

/// One product in the cart.
///
/// Stored with the product record's field names so an existing cart saved
/// by the web terminal loads unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(rename = "stock_quantity", default, skip_serializing_if = "Option::is_none")]
    pub stock_limit: Option<u32>,
}

impl CartLine {
    /// Price of the line.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    fn allows(&self, quantity: u32) -> bool {
        quantity >= 1 && self.stock_limit.is_none_or(|limit| quantity <= limit)
    }
}

/// Result of adding a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// New line with quantity 1.
    Added,
    /// Existing line incremented.
    Incremented,
    /// Already holding every unit in stock; nothing changed.
    AtStockLimit,
    /// Product has no stock; nothing changed.
    OutOfStock,
}

/// Subtotal, coupon discount and amount due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub subtotal: Money,
    pub discount_percent: Decimal,
}

impl Pricing {
    /// Pricing with no discount.
    #[must_use]
    pub const fn new(subtotal: Money) -> Self {
        Self {
            subtotal,
            discount_percent: Decimal::ZERO,
        }
    }

    /// Apply a coupon, or clear the discount with `None`.
    #[must_use]
    pub fn with_coupon(self, coupon: Option<&Coupon>) -> Self {
        Self {
            discount_percent: coupon.map_or(Decimal::ZERO, |c| c.percentage),
            ..self
        }
    }

    /// `subtotal × pct / 100`.
    #[must_use]
    pub fn discount_amount(&self) -> Money {
        self.subtotal.percent(self.discount_percent)
    }

    /// Amount due after discount.
    #[must_use]
    pub fn final_total(&self) -> Money {
        self.subtotal - self.discount_amount()
    }
}

/// The in-progress sale.
pub struct Cart {
    store: Arc<dyn KeyValueStore>,
    lines: Vec<CartLine>,
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart").field("lines", &self.lines).finish_non_exhaustive()
    }
}

impl Cart {
    /// Load the persisted cart, or start empty.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let lines: Vec<CartLine> = load_json(store.as_ref(), keys::CART)?.unwrap_or_default();
        // Lines that break the quantity invariant are dropped on load.
        let lines = lines.into_iter().filter(|l| l.quantity >= 1).collect();
        Ok(Self { store, lines })
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Add one unit of `product`.
    ///
    /// Merges into the existing line for the same product. A tracked stock
    /// count caps the quantity; a product with zero stock is refused.
    ///
    /// # Errors
    ///
    /// Returns error if the cart cannot be persisted.
    pub fn add_item(&mut self, product: &Product) -> Result<AddOutcome, StorageError> {
        if product.stock_quantity == Some(0) {
            return Ok(AddOutcome::OutOfStock);
        }

        let previous = self.lines.clone();
        let outcome = match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                line.stock_limit = product.stock_quantity;
                if !line.allows(line.quantity + 1) {
                    return Ok(AddOutcome::AtStockLimit);
                }
                line.quantity += 1;
                AddOutcome::Incremented
            }
            None => {
                self.lines.push(CartLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    unit_price: product.price,
                    quantity: 1,
                    stock_limit: product.stock_quantity,
                });
                AddOutcome::Added
            }
        };

        self.commit(previous)?;
        debug!(product_id = %product.id, ?outcome, "Cart item added");
        Ok(outcome)
    }

    /// Change a line's quantity by `delta`.
    ///
    /// Ignored when the result would drop below 1 or exceed stock. Returns
    /// whether the cart changed.
    ///
    /// # Errors
    ///
    /// Returns error if the cart cannot be persisted.
    pub fn update_quantity(&mut self, product_id: ProductId, delta: i64) -> Result<bool, StorageError> {
        let previous = self.lines.clone();
        let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) else {
            return Ok(false);
        };

        let target = i64::from(line.quantity).saturating_add(delta);
        let Ok(target) = u32::try_from(target) else {
            return Ok(false);
        };
        if target == line.quantity || !line.allows(target) {
            return Ok(false);
        }

        line.quantity = target;
        self.commit(previous)?;
        Ok(true)
    }

    /// Drop a product's line. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns error if the cart cannot be persisted.
    pub fn remove(&mut self, product_id: ProductId) -> Result<bool, StorageError> {
        let previous = self.lines.clone();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() == previous.len() {
            return Ok(false);
        }
        self.commit(previous)?;
        Ok(true)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the cart cannot be persisted.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        let previous = std::mem::take(&mut self.lines);
        self.commit(previous)
    }

    /// Σ unit price × quantity.
    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Pricing for the current contents.
    #[must_use]
    pub fn pricing(&self) -> Pricing {
        Pricing::new(self.total())
    }

    /// Lines in checkout payload form.
    #[must_use]
    pub fn sale_lines(&self) -> Vec<SaleLine> {
        self.lines
            .iter()
            .map(|l| SaleLine {
                product_id: l.product_id,
                qty: l.quantity,
            })
            .collect()
    }

    /// Lines in terminal sale form.
    #[must_use]
    pub fn terminal_lines(&self) -> Vec<TerminalLine> {
        self.lines
            .iter()
            .map(|l| TerminalLine {
                id: l.product_id,
                quantity: l.quantity,
            })
            .collect()
    }

    fn persist(&self) -> Result<(), StorageError> {
        save_json(self.store.as_ref(), keys::CART, &self.lines)
    }

    /// Persist the current lines, restoring `previous` if the write fails.
    fn commit(&mut self, previous: Vec<CartLine>) -> Result<(), StorageError> {
        if let Err(e) = self.persist() {
            self.lines = previous;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use proptest::prelude::*;

    use super::*;
    use crate::storage::MemoryStore;

    /// Memory store whose cart writes fail once `lock_cart` is called.
    #[derive(Default)]
    pub(crate) struct LockedCartStore {
        inner: MemoryStore,
        locked: AtomicBool,
    }

    impl LockedCartStore {
        pub(crate) fn lock_cart(&self) {
            self.locked.store(true, Ordering::SeqCst);
        }

        fn check(&self, key: &str) -> Result<(), StorageError> {
            if key == keys::CART && self.locked.load(Ordering::SeqCst) {
                return Err(StorageError::InvalidKey(key.to_owned()));
            }
            Ok(())
        }
    }

    impl KeyValueStore for LockedCartStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.check(key)?;
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.check(key)?;
            self.inner.remove(key)
        }
    }

    pub(crate) fn product(id: i64, price: i64, stock: Option<u32>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Item {id}"),
            price: Money::from_shillings(price),
            description: None,
            category: None,
            stock_quantity: stock,
            image_url: None,
        }
    }

    fn cart() -> (Arc<MemoryStore>, Cart) {
        let store = Arc::new(MemoryStore::new());
        let cart = Cart::open(store.clone()).unwrap();
        (store, cart)
    }

    #[test]
    fn test_add_merges_lines() {
        let (_, mut cart) = cart();
        let soda = product(1, 80, None);
        assert_eq!(cart.add_item(&soda).unwrap(), AddOutcome::Added);
        assert_eq!(cart.add_item(&soda).unwrap(), AddOutcome::Incremented);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.total(), Money::from_shillings(160));
    }

    #[test]
    fn test_stock_limits() {
        let (_, mut cart) = cart();
        assert_eq!(cart.add_item(&product(1, 10, Some(0))).unwrap(), AddOutcome::OutOfStock);
        assert!(cart.is_empty());

        let scarce = product(2, 10, Some(2));
        cart.add_item(&scarce).unwrap();
        cart.add_item(&scarce).unwrap();
        assert_eq!(cart.add_item(&scarce).unwrap(), AddOutcome::AtStockLimit);
        assert_eq!(cart.line(scarce.id).unwrap().quantity, 2);
    }

    #[test]
    fn test_update_quantity_bounds() {
        let (_, mut cart) = cart();
        let item = product(3, 100, Some(3));
        cart.add_item(&item).unwrap();

        assert!(!cart.update_quantity(item.id, -1).unwrap());
        assert!(cart.update_quantity(item.id, 2).unwrap());
        assert!(!cart.update_quantity(item.id, 1).unwrap());
        assert_eq!(cart.line(item.id).unwrap().quantity, 3);
        assert!(!cart.update_quantity(ProductId::new(99), 1).unwrap());
    }

    #[test]
    fn test_remove_and_clear() {
        let (_, mut cart) = cart();
        cart.add_item(&product(1, 5, None)).unwrap();
        cart.add_item(&product(2, 5, None)).unwrap();
        assert!(cart.remove(ProductId::new(1)).unwrap());
        assert!(!cart.remove(ProductId::new(1)).unwrap());
        cart.clear().unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::ZERO);
    }

    #[test]
    fn test_failed_write_leaves_cart_unchanged() {
        let store = Arc::new(LockedCartStore::default());
        let mut cart = Cart::open(store.clone()).unwrap();
        let chips = product(1, 50, Some(5));
        cart.add_item(&chips).unwrap();
        cart.add_item(&product(2, 20, None)).unwrap();
        let before = cart.lines().to_vec();
        store.lock_cart();

        assert!(cart.add_item(&chips).is_err());
        assert!(cart.add_item(&product(3, 10, None)).is_err());
        assert!(cart.update_quantity(chips.id, 1).is_err());
        assert!(cart.remove(chips.id).is_err());
        assert!(cart.clear().is_err());

        assert_eq!(cart.lines(), before.as_slice());
        assert_eq!(Cart::open(store).unwrap().lines(), before.as_slice());
    }

    #[test]
    fn test_cart_survives_reopen() {
        let (store, mut cart) = cart();
        cart.add_item(&product(7, 250, Some(9))).unwrap();
        cart.add_item(&product(7, 250, Some(9))).unwrap();

        let reopened = Cart::open(store.clone()).unwrap();
        assert_eq!(reopened.lines(), cart.lines());

        let raw = store.get(keys::CART).unwrap().unwrap();
        assert!(raw.contains("\"stock_quantity\":9"));
        assert!(raw.contains("\"price\":250"));
    }

    #[test]
    fn test_pricing_with_coupon() {
        let coupon = Coupon {
            id: 1,
            code: "RADA10".to_owned(),
            percentage: Decimal::TEN,
        };
        let pricing = Pricing::new(Money::from_shillings(1_000)).with_coupon(Some(&coupon));
        assert_eq!(pricing.discount_amount(), Money::from_shillings(100));
        assert_eq!(pricing.final_total(), Money::from_shillings(900));
        assert_eq!(pricing.with_coupon(None).final_total(), Money::from_shillings(1_000));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(i64),
        Update(i64, i64),
        Remove(i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..6).prop_map(Op::Add),
            (1i64..6, -3i64..4).prop_map(|(id, d)| Op::Update(id, d)),
            (1i64..6).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_repeated_adds_merge(ids in prop::collection::vec(1i64..8, 0..40)) {
            let (_, mut cart) = cart();
            let mut expected: HashMap<i64, u32> = HashMap::new();
            for id in &ids {
                cart.add_item(&product(*id, 10, None)).unwrap();
                *expected.entry(*id).or_default() += 1;
            }

            prop_assert_eq!(cart.len(), expected.len());
            for line in cart.lines() {
                prop_assert_eq!(Some(&line.quantity), expected.get(&line.product_id.as_i64()));
            }
        }

        #[test]
        fn prop_total_matches_lines(ops in prop::collection::vec(op(), 0..60)) {
            let (_, mut cart) = cart();
            for op in ops {
                match op {
                    Op::Add(id) => { cart.add_item(&product(id, id * 15, Some(5))).unwrap(); }
                    Op::Update(id, d) => { cart.update_quantity(ProductId::new(id), d).unwrap(); }
                    Op::Remove(id) => { cart.remove(ProductId::new(id)).unwrap(); }
                }

                let expected: Money = cart
                    .lines()
                    .iter()
                    .map(|l| Money::from_shillings(l.product_id.as_i64() * 15) * l.quantity)
                    .sum();
                prop_assert_eq!(cart.total(), expected);
                prop_assert!(cart.lines().iter().all(|l| (1..=5).contains(&l.quantity)));
            }
        }
    }
}
