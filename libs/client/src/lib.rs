//! Client-side state for the Shri Ayu Wellness storefront
//!
//! Holds the session and cart the way the browser app does, persisted to a
//! key/value store, and talks to the storefront API over HTTP.

pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod models;
pub mod router;
pub mod storage;

pub use api::{AuthApi, CheckoutApi, HttpApi};
pub use auth::AuthStore;
pub use cart::CartStore;
pub use checkout::{CheckoutFlow, CheckoutReceipt, PendingCheckout};
pub use error::{ClientError, ClientResult};
pub use router::{Access, Guard, Route};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
