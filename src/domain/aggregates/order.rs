//! Order Aggregate
//!
//! Read-side view of a customer's order, used as purchase history when
//! deciding whether a review counts as a verified purchase.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: Uuid,
    customer_id: Uuid,
    status: OrderStatus,
    lines: Vec<OrderLine>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)] pub struct OrderLine { pub product_id: Uuid, pub quantity: u32 }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, Confirmed, Processing, Shipped, Delivered, Cancelled, Refunded }

impl OrderStatus {
    /// Parses a stored status. `completed` is an alias of `delivered`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "processing" => Some(Self::Processing),
            "shipped" => Some(Self::Shipped),
            "delivered" | "completed" => Some(Self::Delivered),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool { *self == Self::Delivered }
}

impl Order {
    pub fn new(id: Uuid, customer_id: Uuid, status: OrderStatus) -> Self {
        Self { id, customer_id, status, lines: vec![] }
    }

    pub fn with_line(mut self, product_id: Uuid, quantity: u32) -> Self {
        self.add_line(product_id, quantity);
        self
    }

    pub fn add_line(&mut self, product_id: Uuid, quantity: u32) { self.lines.push(OrderLine { product_id, quantity }); }

    pub fn id(&self) -> Uuid { self.id }
    pub fn customer_id(&self) -> Uuid { self.customer_id }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn lines(&self) -> &[OrderLine] { &self.lines }

    pub fn set_status(&mut self, status: OrderStatus) { self.status = status; }

    /// True when this is a completed order of `customer_id` with a line for `product_id`.
    pub fn is_completed_purchase(&self, customer_id: Uuid, product_id: Uuid) -> bool {
        self.customer_id == customer_id
            && self.status.is_completed()
            && self.lines.iter().any(|l| l.product_id == product_id && l.quantity > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_completed_purchase() {
        let (customer, product) = (Uuid::new_v4(), Uuid::new_v4());
        let mut order = Order::new(Uuid::new_v4(), customer, OrderStatus::Shipped).with_line(product, 1);
        assert!(!order.is_completed_purchase(customer, product));
        order.set_status(OrderStatus::Delivered);
        assert!(order.is_completed_purchase(customer, product));
        assert!(!order.is_completed_purchase(Uuid::new_v4(), product));
        assert!(!order.is_completed_purchase(customer, Uuid::new_v4()));
    }
    #[test]
    fn test_status_alias() {
        assert_eq!(OrderStatus::parse("completed"), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::parse("lost"), None);
    }
}
