//! In-memory `RemoteStore` for tests.
//!
//! Backs every collection with plain vectors, records every call in an
//! append-only log so tests can assert exact remote traffic, and supports
//! per-operation failure injection.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use uuid::Uuid;

use greengrocer_core::{CartItemId, Email, ProductId, UserId};

use super::RemoteError;
use super::store::RemoteStore;
use super::types::{
    AuthSession, AuthUser, CartRow, NewCartRow, NewProduct, OrderRow, ProductRow, ProfileRow,
};

/// One observed remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRecord {
    SignIn { email: String },
    SignUp { email: String },
    SignOut,
    Profile { user_id: UserId },
    EmailForMobile { mobile: String },
    InsertProfile { user_id: UserId },
    ListProfiles,
    ListProducts,
    InsertProduct { name: String },
    UpdateProduct { id: ProductId },
    DeleteProduct { id: ProductId },
    CartRows { user_id: UserId },
    UpsertCartRow { user_id: UserId, product_id: ProductId },
    UpdateCartQuantity { id: CartItemId, quantity: i32 },
    DeleteCartRow { id: CartItemId, user_id: UserId },
    ClearCart { user_id: UserId },
    InsertOrders { lines: usize },
    ListOrders,
}

struct SeededUser {
    id: UserId,
    email: String,
    password: String,
}

#[derive(Default)]
struct Inner {
    users: Vec<SeededUser>,
    profiles: Vec<ProfileRow>,
    products: Vec<ProductRow>,
    cart: Vec<CartRow>,
    orders: Vec<OrderRow>,
    next_row_id: i64,
    calls: Vec<CallRecord>,
    failing: HashSet<&'static str>,
}

/// In-memory stand-in for the hosted backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Seeding and inspection
    // =========================================================================

    pub fn seed_user(&self, email: &str, password: &str) -> UserId {
        let id = UserId::new(Uuid::new_v4());
        self.inner.lock().users.push(SeededUser {
            id,
            email: email.to_owned(),
            password: password.to_owned(),
        });
        id
    }

    pub fn seed_profile(&self, row: ProfileRow) {
        self.inner.lock().profiles.push(row);
    }

    pub fn seed_products(&self, rows: Vec<ProductRow>) {
        self.inner.lock().products.extend(rows);
    }

    pub fn seed_cart_row(
        &self,
        user_id: UserId,
        product_id: ProductId,
        name: &str,
        weight: &str,
        price: Decimal,
        quantity: i32,
    ) -> CartItemId {
        let mut inner = self.inner.lock();
        inner.next_row_id += 1;
        let id = CartItemId::new(inner.next_row_id);
        inner.cart.push(CartRow {
            id,
            user_id,
            product_id,
            name: name.to_owned(),
            weight: weight.to_owned(),
            price,
            quantity,
            image_url: None,
        });
        id
    }

    pub fn seed_orders(&self, rows: Vec<OrderRow>) {
        self.inner.lock().orders.extend(rows);
    }

    /// Make the named operation fail with a 500 until cleared.
    pub fn fail_on(&self, op: &'static str) {
        self.inner.lock().failing.insert(op);
    }

    pub fn clear_failure(&self, op: &'static str) {
        self.inner.lock().failing.remove(op);
    }

    /// Everything the services asked the "remote" to do, in order.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.inner.lock().calls.clone()
    }

    /// Server-side cart contents for a user.
    pub fn remote_cart(&self, user_id: UserId) -> Vec<CartRow> {
        self.inner
            .lock()
            .cart
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Server-side order rows.
    pub fn remote_orders(&self) -> Vec<OrderRow> {
        self.inner.lock().orders.clone()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn record(&self, op: &'static str, call: CallRecord) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(call);
        if inner.failing.contains(op) {
            return Err(RemoteError::Service {
                status: 500,
                message: format!("injected failure: {op}"),
            });
        }
        Ok(())
    }
}

fn session_for(user: &SeededUser) -> AuthSession {
    AuthSession {
        access_token: format!("token-{}", user.id),
        user: AuthUser {
            id: user.id,
            email: user.email.clone(),
        },
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthSession, RemoteError> {
        self.record(
            "sign_in",
            CallRecord::SignIn {
                email: email.as_str().to_owned(),
            },
        )?;

        let inner = self.inner.lock();
        inner
            .users
            .iter()
            .find(|u| u.email == email.as_str() && u.password == password)
            .map(session_for)
            .ok_or(RemoteError::Service {
                status: 400,
                message: "invalid login credentials".to_owned(),
            })
    }

    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthSession, RemoteError> {
        self.record(
            "sign_up",
            CallRecord::SignUp {
                email: email.as_str().to_owned(),
            },
        )?;

        let mut inner = self.inner.lock();
        if inner.users.iter().any(|u| u.email == email.as_str()) {
            return Err(RemoteError::Service {
                status: 422,
                message: "user already registered".to_owned(),
            });
        }

        let user = SeededUser {
            id: UserId::new(Uuid::new_v4()),
            email: email.as_str().to_owned(),
            password: password.to_owned(),
        };
        let session = session_for(&user);
        inner.users.push(user);
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.record("sign_out", CallRecord::SignOut)
    }

    async fn profile(&self, user_id: UserId) -> Result<Option<ProfileRow>, RemoteError> {
        self.record("profile", CallRecord::Profile { user_id })?;
        Ok(self
            .inner
            .lock()
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .cloned())
    }

    async fn email_for_mobile(&self, mobile: &str) -> Result<Option<String>, RemoteError> {
        self.record(
            "email_for_mobile",
            CallRecord::EmailForMobile {
                mobile: mobile.to_owned(),
            },
        )?;
        Ok(self
            .inner
            .lock()
            .profiles
            .iter()
            .find(|p| p.mobile.as_deref() == Some(mobile))
            .map(|p| p.email.clone()))
    }

    async fn insert_profile(&self, row: &ProfileRow) -> Result<(), RemoteError> {
        self.record("insert_profile", CallRecord::InsertProfile { user_id: row.id })?;
        self.inner.lock().profiles.push(row.clone());
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileRow>, RemoteError> {
        self.record("list_profiles", CallRecord::ListProfiles)?;
        Ok(self.inner.lock().profiles.clone())
    }

    async fn list_products(&self) -> Result<Vec<ProductRow>, RemoteError> {
        self.record("list_products", CallRecord::ListProducts)?;
        Ok(self.inner.lock().products.clone())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<ProductRow, RemoteError> {
        self.record(
            "insert_product",
            CallRecord::InsertProduct {
                name: product.name.clone(),
            },
        )?;

        let mut inner = self.inner.lock();
        inner.next_row_id += 1;
        let row = ProductRow {
            id: ProductId::new(inner.next_row_id),
            name: product.name.clone(),
            weight: product.weight.clone(),
            price: Some(product.price),
            image_url: Some(product.image_url.clone()),
        };
        inner.products.push(row.clone());
        Ok(row)
    }

    async fn update_product(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<(), RemoteError> {
        self.record("update_product", CallRecord::UpdateProduct { id })?;

        let mut inner = self.inner.lock();
        if let Some(row) = inner.products.iter_mut().find(|p| p.id == id) {
            row.name = product.name.clone();
            row.weight = product.weight.clone();
            row.price = Some(product.price);
            row.image_url = Some(product.image_url.clone());
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RemoteError> {
        self.record("delete_product", CallRecord::DeleteProduct { id })?;
        self.inner.lock().products.retain(|p| p.id != id);
        Ok(())
    }

    async fn cart_rows(&self, user_id: UserId) -> Result<Vec<CartRow>, RemoteError> {
        self.record("cart_rows", CallRecord::CartRows { user_id })?;
        Ok(self.remote_cart(user_id))
    }

    async fn upsert_cart_row(&self, row: &NewCartRow) -> Result<CartRow, RemoteError> {
        self.record(
            "upsert_cart_row",
            CallRecord::UpsertCartRow {
                user_id: row.user_id,
                product_id: row.product_id,
            },
        )?;

        let mut inner = self.inner.lock();

        // Merge on (user, product, weight) conflict, last write wins.
        if let Some(existing) = inner.cart.iter_mut().find(|r| {
            r.user_id == row.user_id && r.product_id == row.product_id && r.weight == row.weight
        }) {
            existing.name = row.name.clone();
            existing.price = row.price;
            existing.quantity = row.quantity;
            existing.image_url = row.image_url.clone();
            return Ok(existing.clone());
        }

        inner.next_row_id += 1;
        let stored = CartRow {
            id: CartItemId::new(inner.next_row_id),
            user_id: row.user_id,
            product_id: row.product_id,
            name: row.name.clone(),
            weight: row.weight.clone(),
            price: row.price,
            quantity: row.quantity,
            image_url: row.image_url.clone(),
        };
        inner.cart.push(stored.clone());
        Ok(stored)
    }

    async fn update_cart_quantity(
        &self,
        id: CartItemId,
        user_id: UserId,
        quantity: i32,
    ) -> Result<(), RemoteError> {
        self.record(
            "update_cart_quantity",
            CallRecord::UpdateCartQuantity { id, quantity },
        )?;

        let mut inner = self.inner.lock();
        if let Some(row) = inner
            .cart
            .iter_mut()
            .find(|r| r.id == id && r.user_id == user_id)
        {
            row.quantity = quantity;
        }
        Ok(())
    }

    async fn delete_cart_row(&self, id: CartItemId, user_id: UserId) -> Result<(), RemoteError> {
        self.record("delete_cart_row", CallRecord::DeleteCartRow { id, user_id })?;
        self.inner
            .lock()
            .cart
            .retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(())
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<(), RemoteError> {
        self.record("clear_cart", CallRecord::ClearCart { user_id })?;
        self.inner.lock().cart.retain(|r| r.user_id != user_id);
        Ok(())
    }

    async fn insert_orders(&self, rows: &[OrderRow]) -> Result<(), RemoteError> {
        self.record("insert_orders", CallRecord::InsertOrders { lines: rows.len() })?;
        self.inner.lock().orders.extend_from_slice(rows);
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<OrderRow>, RemoteError> {
        self.record("list_orders", CallRecord::ListOrders)?;
        Ok(self.inner.lock().orders.clone())
    }
}
