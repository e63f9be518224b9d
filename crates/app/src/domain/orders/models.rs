//! Order Models

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::uuids::TypedUuid;

/// Marker for gateway-issued user identities (customers, vendors, drivers
/// and admins share the gateway's id space).
pub struct User;

/// User UUID
pub type UserUuid = TypedUuid<User>;

/// Marker for restaurants.
pub struct Restaurant;

/// Restaurant UUID
pub type RestaurantUuid = TypedUuid<Restaurant>;

/// Marker for delivery addresses (owned by an external address book).
pub struct Address;

/// Delivery address UUID
pub type AddressUuid = TypedUuid<Address>;

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order item UUID
pub type OrderItemUuid = TypedUuid<OrderItem>;

/// Status history entry UUID
pub type StatusHistoryUuid = TypedUuid<OrderStatusHistory>;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Cart,
    Pending,
    Confirmed,
    Preparing,
    Ready,
    DriverAssigned,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// The wire/storage spelling of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::DriverAssigned => "driver_assigned",
            Self::PickedUp => "picked_up",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Statuses on which a driver reference must be present.
    #[must_use]
    pub const fn carries_driver(self) -> bool {
        matches!(
            self,
            Self::DriverAssigned | Self::PickedUp | Self::InTransit | Self::Delivered
        )
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status `{0}`")]
pub struct ParseOrderStatusError(String);

impl FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cart" => Ok(Self::Cart),
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "driver_assigned" => Ok(Self::DriverAssigned),
            "picked_up" => Ok(Self::PickedUp),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            other => Err(ParseOrderStatusError(other.to_string())),
        }
    }
}

/// Role of the authenticated caller, as asserted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Vendor,
    Driver,
    Admin,
}

impl ActorRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
            Self::Driver => "driver",
            Self::Admin => "admin",
        }
    }
}

impl Display for ActorRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown actor role `{0}`")]
pub struct ParseActorRoleError(String);

impl FromStr for ActorRole {
    type Err = ParseActorRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "vendor" => Ok(Self::Vendor),
            "driver" => Ok(Self::Driver),
            "admin" => Ok(Self::Admin),
            other => Err(ParseActorRoleError(other.to_string())),
        }
    }
}

/// Authenticated caller identity injected by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user: UserUuid,
    pub role: ActorRole,
}

/// Order Model
///
/// Money columns are integer minor units. `total` always equals
/// `subtotal + tax + delivery_fee - discount`, and `driver` is present
/// exactly when `status.carries_driver()`.
#[derive(Debug, Clone)]
pub struct Order {
    pub uuid: OrderUuid,
    pub customer: UserUuid,
    pub restaurant: RestaurantUuid,
    pub driver: Option<UserUuid>,
    pub delivery_address: Option<AddressUuid>,
    pub status: OrderStatus,
    pub subtotal: u64,
    pub tax: u64,
    pub delivery_fee: u64,
    pub discount: u64,
    pub total: u64,
    pub special_instructions: Option<String>,
    pub cancellation_reason: Option<String>,
    pub placed_at: Option<Timestamp>,
    pub confirmed_at: Option<Timestamp>,
    pub ready_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub estimated_delivery_at: Option<Timestamp>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Order line item, snapshotted at checkout. Later menu edits never change
/// historical orders.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub uuid: OrderItemUuid,
    pub order: OrderUuid,
    pub name: String,
    pub description: Option<String>,
    pub price_at_time: u64,
    pub quantity: u32,
    pub customizations: serde_json::Value,
    pub line_total: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Append-only audit record of one committed status change.
#[derive(Debug, Clone)]
pub struct OrderStatusHistory {
    pub uuid: StatusHistoryUuid,
    pub order: OrderUuid,
    /// Acting user; `None` for system-attributed entries.
    pub user: Option<UserUuid>,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

/// New Order Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub customer: UserUuid,
    pub restaurant: RestaurantUuid,
    pub delivery_address: Option<AddressUuid>,
    pub special_instructions: Option<String>,
    pub subtotal: u64,
    pub tax: u64,
    pub delivery_fee: u64,
    pub discount: u64,
    pub total: u64,
    pub items: Vec<NewOrderItem>,
}

/// New Order Item Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub uuid: OrderItemUuid,
    pub name: String,
    pub description: Option<String>,
    pub price_at_time: u64,
    pub quantity: u32,
    pub customizations: serde_json::Value,
    pub line_total: u64,
}

/// Admin override payload: any target status, optionally re-pointing the
/// driver reference.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminOverride {
    pub status: OrderStatus,
    pub driver: Option<UserUuid>,
    pub notes: Option<String>,
}

/// Outcome of a committed status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub order: OrderUuid,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Order with its items and full audit trail, for order tracking views.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<OrderStatusHistory>,
}
