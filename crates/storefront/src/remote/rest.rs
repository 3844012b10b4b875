//! REST implementation of the Remote Store Client.
//!
//! Speaks the hosted service's row protocol: collections under
//! `/rest/v1/<name>` with `eq.` column filters, upserts via
//! `Prefer: resolution=merge-duplicates`, and the auth sub-API under
//! `/auth/v1`. The publishable key rides on every request; after sign-in the
//! per-user bearer token is held by the client and attached instead, the way
//! the service's own SDK manages its session.

use async_trait::async_trait;
use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use greengrocer_core::{CartItemId, Email, ProductId, UserId};

use crate::config::RemoteStoreConfig;

use super::RemoteError;
use super::store::RemoteStore;
use super::types::{
    AuthSession, CartRow, NewCartRow, NewProduct, OrderRow, ProductRow, ProfileRow,
};

/// How much of an error body to keep for diagnostics.
const ERROR_BODY_LIMIT: usize = 200;

/// Production client for the hosted backend.
pub struct RestStore {
    client: reqwest::Client,
    base: String,
    publishable_key: SecretString,
    /// Bearer token of the active user session, if any.
    access_token: RwLock<Option<String>>,
}

impl RestStore {
    /// Create a new client from configuration.
    #[must_use]
    pub fn new(config: &RemoteStoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: config.endpoint.as_str().trim_end_matches('/').to_owned(),
            publishable_key: config.publishable_key.clone(),
            access_token: RwLock::new(None),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{collection}", self.base)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base)
    }

    /// Attach the publishable key and the session bearer (or the key again
    /// when no user is signed in).
    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self
            .access_token
            .read()
            .clone()
            .unwrap_or_else(|| self.publishable_key.expose_secret().to_owned());

        request
            .header("apikey", self.publishable_key.expose_secret())
            .bearer_auth(bearer)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let response = self.authed(request).send().await?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body),
                "failed to decode remote response"
            );
            RemoteError::Parse(e)
        })
    }
}

/// Convert non-success statuses into `RemoteError::Service`, keeping a
/// truncated body for diagnostics.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = truncate(&response.text().await.unwrap_or_default());
    Err(RemoteError::Service {
        status: status.as_u16(),
        message,
    })
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl RemoteStore for RestStore {
    // =========================================================================
    // Auth sub-API
    // =========================================================================

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthSession, RemoteError> {
        let url = self.auth_url("token?grant_type=password");
        let session: AuthSession = self
            .send_json(self.client.post(&url).json(&serde_json::json!({
                "email": email.as_str(),
                "password": password,
            })))
            .await?;

        *self.access_token.write() = Some(session.access_token.clone());
        Ok(session)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthSession, RemoteError> {
        let url = self.auth_url("signup");
        let session: AuthSession = self
            .send_json(self.client.post(&url).json(&serde_json::json!({
                "email": email.as_str(),
                "password": password,
            })))
            .await?;

        *self.access_token.write() = Some(session.access_token.clone());
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), RemoteError> {
        let url = self.auth_url("logout");
        let result = self.send(self.client.post(&url)).await;

        // The local session ends regardless of what the service said.
        *self.access_token.write() = None;
        result.map(|_| ())
    }

    // =========================================================================
    // profiles
    // =========================================================================

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn profile(&self, user_id: UserId) -> Result<Option<ProfileRow>, RemoteError> {
        let filter = eq(user_id);
        let rows: Vec<ProfileRow> = self
            .send_json(
                self.client
                    .get(self.collection_url("profiles"))
                    .query(&[("select", "*"), ("id", filter.as_str())]),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn email_for_mobile(&self, mobile: &str) -> Result<Option<String>, RemoteError> {
        #[derive(serde::Deserialize)]
        struct EmailOnly {
            email: String,
        }

        let filter = eq(mobile);
        let rows: Vec<EmailOnly> = self
            .send_json(
                self.client
                    .get(self.collection_url("profiles"))
                    .query(&[("select", "email"), ("mobile", filter.as_str())]),
            )
            .await?;
        Ok(rows.into_iter().next().map(|r| r.email))
    }

    #[instrument(skip(self, row), fields(user_id = %row.id))]
    async fn insert_profile(&self, row: &ProfileRow) -> Result<(), RemoteError> {
        self.send(
            self.client
                .post(self.collection_url("profiles"))
                .header("Prefer", "return=minimal")
                .json(&[row]),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn list_profiles(&self) -> Result<Vec<ProfileRow>, RemoteError> {
        self.send_json(
            self.client
                .get(self.collection_url("profiles"))
                .query(&[("select", "*")]),
        )
        .await
    }

    // =========================================================================
    // products
    // =========================================================================

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<ProductRow>, RemoteError> {
        self.send_json(
            self.client
                .get(self.collection_url("products"))
                .query(&[("select", "*")]),
        )
        .await
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn insert_product(&self, product: &NewProduct) -> Result<ProductRow, RemoteError> {
        let rows: Vec<ProductRow> = self
            .send_json(
                self.client
                    .post(self.collection_url("products"))
                    .header("Prefer", "return=representation")
                    .json(&[product]),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::MissingData("inserted product row".to_owned()))
    }

    #[instrument(skip(self, product), fields(id = %id))]
    async fn update_product(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<(), RemoteError> {
        let filter = eq(id);
        self.send(
            self.client
                .patch(self.collection_url("products"))
                .query(&[("id", filter.as_str())])
                .json(product),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_product(&self, id: ProductId) -> Result<(), RemoteError> {
        let filter = eq(id);
        self.send(
            self.client
                .delete(self.collection_url("products"))
                .query(&[("id", filter.as_str())]),
        )
        .await
        .map(|_| ())
    }

    // =========================================================================
    // cart
    // =========================================================================

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn cart_rows(&self, user_id: UserId) -> Result<Vec<CartRow>, RemoteError> {
        let filter = eq(user_id);
        self.send_json(
            self.client
                .get(self.collection_url("cart"))
                .query(&[("select", "*"), ("user_id", filter.as_str())]),
        )
        .await
    }

    #[instrument(skip(self, row), fields(product_id = %row.product_id))]
    async fn upsert_cart_row(&self, row: &NewCartRow) -> Result<CartRow, RemoteError> {
        let rows: Vec<CartRow> = self
            .send_json(
                self.client
                    .post(self.collection_url("cart"))
                    .header("Prefer", "resolution=merge-duplicates,return=representation")
                    .json(&[row]),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::MissingData("upserted cart row".to_owned()))
    }

    #[instrument(skip(self), fields(id = %id, user_id = %user_id))]
    async fn update_cart_quantity(
        &self,
        id: CartItemId,
        user_id: UserId,
        quantity: i32,
    ) -> Result<(), RemoteError> {
        let id_filter = eq(id);
        let user_filter = eq(user_id);
        self.send(
            self.client
                .patch(self.collection_url("cart"))
                .query(&[("id", id_filter.as_str()), ("user_id", user_filter.as_str())])
                .json(&serde_json::json!({ "quantity": quantity })),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self), fields(id = %id, user_id = %user_id))]
    async fn delete_cart_row(&self, id: CartItemId, user_id: UserId) -> Result<(), RemoteError> {
        let id_filter = eq(id);
        let user_filter = eq(user_id);
        self.send(
            self.client
                .delete(self.collection_url("cart"))
                .query(&[("id", id_filter.as_str()), ("user_id", user_filter.as_str())]),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn clear_cart(&self, user_id: UserId) -> Result<(), RemoteError> {
        let filter = eq(user_id);
        self.send(
            self.client
                .delete(self.collection_url("cart"))
                .query(&[("user_id", filter.as_str())]),
        )
        .await
        .map(|_| ())
    }

    // =========================================================================
    // orders
    // =========================================================================

    #[instrument(skip(self, rows), fields(lines = rows.len()))]
    async fn insert_orders(&self, rows: &[OrderRow]) -> Result<(), RemoteError> {
        self.send(
            self.client
                .post(self.collection_url("orders"))
                .header("Prefer", "return=minimal")
                .json(rows),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<OrderRow>, RemoteError> {
        self.send_json(
            self.client
                .get(self.collection_url("orders"))
                .query(&[("select", "*")]),
        )
        .await
    }
}
