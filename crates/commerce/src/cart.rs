//! The shopping cart store.
//!
//! The cart lives on the client. A guest's cart is persisted as a
//! local snapshot; once the user signs in, the local items are
//! reconciled with the server copy and written back, so nothing picked
//! while signed out is lost.

use std::error::Error as StdError;
use std::fmt::{self, Display};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A line item in the cart.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartItem {
    /// The catalog product id.
    pub product_id: String,
    /// Display name, denormalized for rendering without a catalog
    /// lookup.
    pub name: String,
    /// Unit price in cents.
    pub unit_price_cents: u64,
    /// Selected quantity, always at least 1 while the item is in the
    /// cart.
    pub quantity: u32,
}

/// The error type for backend persistence calls.
#[derive(Debug, PartialEq, Eq)]
pub struct BackendError(pub String);

impl Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BackendError {}

/// Server-side cart persistence for a signed-in user.
///
/// The table behind this trait is a black box with basic CRUD
/// semantics; the store only needs wholesale fetch and replace.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Fetches the server-side cart rows.
    async fn fetch(&self) -> Result<Vec<CartItem>, BackendError>;

    /// Replaces the server-side cart with the given rows.
    async fn save(&self, items: &[CartItem]) -> Result<(), BackendError>;
}

type UpdateFn = Box<dyn Fn(&[CartItem]) + Send + Sync>;

/// The cart store: an ordered item list with an observer list.
#[derive(Default)]
pub struct CartStore {
    items: Vec<CartItem>,
    on_update: Vec<UpdateFn>,
}

impl CartStore {
    /// Creates an empty cart.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a cart from a persisted local snapshot.
    #[inline]
    pub fn restore(items: Vec<CartItem>) -> Self {
        Self {
            items,
            on_update: vec![],
        }
    }

    /// Registers a callback invoked with the full item list after
    /// every mutation.
    #[inline]
    pub fn subscribe(
        &mut self,
        on_update: impl Fn(&[CartItem]) + Send + Sync + 'static,
    ) {
        self.on_update.push(Box::new(on_update));
    }

    /// Returns the items in insertion order. The slice doubles as the
    /// local persistence snapshot ([`CartItem`] is serde-serializable).
    #[inline]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns whether the cart has no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the cart total in cents.
    pub fn total_cents(&self) -> u64 {
        self.items
            .iter()
            .map(|item| item.unit_price_cents * u64::from(item.quantity))
            .sum()
    }

    /// Adds an item. If the product is already in the cart, its
    /// quantity is incremented instead of adding a duplicate row.
    pub fn add(&mut self, item: CartItem) {
        match self.find_mut(&item.product_id) {
            Some(existing) => existing.quantity += item.quantity,
            None => self.items.push(item),
        }
        self.notify();
    }

    /// Sets the quantity for a product; a quantity of zero removes it.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(existing) = self.find_mut(product_id) {
            existing.quantity = quantity;
            self.notify();
        }
    }

    /// Removes a product from the cart.
    pub fn remove(&mut self, product_id: &str) {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        if self.items.len() != before {
            self.notify();
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.notify();
    }

    /// Reconciles the local cart with the server copy.
    ///
    /// Items are united by product id; for products present on both
    /// sides the larger quantity wins, which keeps the merge
    /// idempotent under repeated syncs. Server-only items are appended
    /// after the local ones.
    pub fn merge_remote(&mut self, remote: Vec<CartItem>) {
        for item in remote {
            match self.find_mut(&item.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.max(item.quantity);
                }
                None => self.items.push(item),
            }
        }
        self.notify();
    }

    /// Runs the sign-in reconciliation: fetch the server cart, merge
    /// it into the local one, and write the merged result back.
    pub async fn sync(
        &mut self,
        backend: &dyn CartBackend,
    ) -> Result<(), BackendError> {
        let remote = backend.fetch().await?;
        debug!("merging {} remote cart items", remote.len());
        self.merge_remote(remote);
        backend.save(&self.items).await
    }

    fn find_mut(&mut self, product_id: &str) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id == product_id)
    }

    fn notify(&self) {
        for on_update in &self.on_update {
            on_update(&self.items);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn item(product_id: &str, price: u64, quantity: u32) -> CartItem {
        CartItem {
            product_id: product_id.to_owned(),
            name: product_id.to_owned(),
            unit_price_cents: price,
            quantity,
        }
    }

    #[test]
    fn test_add_increments_existing() {
        let mut cart = CartStore::new();
        cart.add(item("soldering-iron", 2999, 1));
        cart.add(item("soldering-iron", 2999, 2));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_total() {
        let mut cart = CartStore::new();
        cart.add(item("esp32", 899, 2));
        cart.add(item("breadboard", 450, 1));
        assert_eq!(cart.total_cents(), 899 * 2 + 450);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = CartStore::new();
        cart.add(item("esp32", 899, 2));
        cart.set_quantity("esp32", 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_merge_remote_is_idempotent() {
        let mut cart = CartStore::restore(vec![item("esp32", 899, 3)]);
        let remote = vec![item("esp32", 899, 1), item("psu-650", 7999, 1)];

        cart.merge_remote(remote.clone());
        cart.merge_remote(remote);

        assert_eq!(cart.items().len(), 2);
        // The larger local quantity wins and repeated merges don't
        // inflate it.
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.items()[1].quantity, 1);
    }

    struct InMemoryBackend {
        rows: Mutex<Vec<CartItem>>,
    }

    #[async_trait]
    impl CartBackend for InMemoryBackend {
        async fn fetch(&self) -> Result<Vec<CartItem>, BackendError> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn save(
            &self,
            items: &[CartItem],
        ) -> Result<(), BackendError> {
            *self.rows.lock().unwrap() = items.to_vec();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sign_in_sync_round_trip() {
        let backend = InMemoryBackend {
            rows: Mutex::new(vec![item("raspberry-pi-5", 6999, 1)]),
        };
        let mut cart = CartStore::restore(vec![item("esp32", 899, 2)]);

        cart.sync(&backend).await.unwrap();

        // Local and remote items are united locally...
        assert_eq!(cart.items().len(), 2);
        // ...and the merged cart replaced the server copy.
        assert_eq!(&*backend.rows.lock().unwrap(), cart.items());
    }

    #[test]
    fn test_subscriber_sees_every_mutation() {
        static SNAPSHOTS: Mutex<Vec<usize>> = Mutex::new(Vec::new());

        let mut cart = CartStore::new();
        cart.subscribe(|items| {
            SNAPSHOTS.lock().unwrap().push(items.len());
        });
        cart.add(item("esp32", 899, 1));
        cart.add(item("breadboard", 450, 1));
        cart.remove("esp32");

        assert_eq!(&*SNAPSHOTS.lock().unwrap(), &[1, 2, 1]);
    }

    #[test]
    fn test_snapshot_serde_round_trip() {
        let items = vec![item("esp32", 899, 2), item("breadboard", 450, 1)];
        let json = serde_json::to_string(&items).unwrap();
        let restored: Vec<CartItem> = serde_json::from_str(&json).unwrap();
        assert_eq!(CartStore::restore(restored).items(), &items[..]);
    }
}
