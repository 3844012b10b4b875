//! The state-management core.
//!
//! Explicit services with constructor-injected dependencies instead of
//! ambient context lookup:
//!
//! - [`session`] - current identity and profile, sign-in/out, observers
//! - [`cart`] - local mirror of the per-user remote cart
//! - [`catalog`] - flat product rows grouped into variant view models
//! - [`filter`] - search string and category selection (local-only)
//! - [`guest`] - deferred add-to-cart / buy-now for unauthenticated visitors
//! - [`checkout`] - order placement, payment handoff, postal prefill
//! - [`admin`] - product/user CRUD and dashboard stats, admin-gated
//!
//! Dependency direction: cart and guest depend on session; catalog depends
//! on filter; checkout depends on session and cart. Nothing depends back on
//! the HTTP layer.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod filter;
pub mod guest;
pub mod session;
