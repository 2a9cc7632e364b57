//! API models for request and response payloads

pub mod notification;
pub mod order;
pub mod product;

pub use notification::{NotifyAdminRequest, NotifyItem};
pub use order::{
    CartLineRequest, CreateOrderRequest, NewOrder, NewOrderItem, Order, OrderDetail,
    OrderItem, OrderItemDetail, OrderStatus, OrderUser, ShippingAddress, UpdateStatusRequest,
};
pub use product::{NewProduct, Product, ProductForm, ProductQuery, ProductUpdate};
