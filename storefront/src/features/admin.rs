//! Admin panel: paid orders and the license key inventory.
//!
//! All admin commands are synchronous. A rejected command records its reason
//! in [`AdminState::last_error`] and changes nothing else.

use crate::environment::StorefrontEnvironment;
use crate::features::checkout::{OrderLine, PendingOrder};
use crate::types::{KeyId, Money, OrderId, ProductId};
use chrono::{DateTime, TimeZone, Utc};
use keystore_core::effect::Effect;
use keystore_core::environment::Clock;
use keystore_core::{reducer::Reducer, SmallVec};
use serde::{Deserialize, Serialize};

/// Admin command errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    /// Blank license key
    #[error("License key must not be empty")]
    EmptyKey,
    /// License key already in the inventory
    #[error("License key {0} already exists")]
    DuplicateKey(String),
    /// Key for a product that is not in the catalog
    #[error("Unknown product {0}")]
    UnknownProduct(ProductId),
    /// No key with this id
    #[error("License key {0} not found")]
    KeyNotFound(KeyId),
    /// No order with this id
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    /// Keys can only go to orders that are still open
    #[error("Order {id} is {status} and cannot receive keys")]
    OrderClosed {
        /// Order id
        id: OrderId,
        /// Current status
        status: OrderStatus,
    },
    /// Not enough unused keys for the order
    #[error("Not enough keys for {title}: need {needed}, have {available}")]
    NotEnoughKeys {
        /// Product title
        title: String,
        /// Keys the order needs
        needed: usize,
        /// Unused keys in stock
        available: usize,
    },
}

/// Order lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Waiting for payment
    Pending,
    /// Paid, keys not sent yet
    Paid,
    /// Keys sent
    Delivered,
    /// Cancelled
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        })
    }
}

/// A customer order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order number
    pub id: OrderId,
    /// Customer full name
    pub customer_name: String,
    /// Customer email
    pub email: String,
    /// Customer phone
    pub phone: String,
    /// Purchased products
    pub lines: Vec<OrderLine>,
    /// Amount charged
    pub amount: Money,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Payment method display name
    pub payment_method: String,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
    /// License keys sent to the customer
    pub keys: Vec<String>,
}

/// A license key in stock
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseKey {
    /// Key id
    pub id: KeyId,
    /// Product the key activates
    pub product_id: ProductId,
    /// The key itself
    pub key: String,
    /// Already assigned to an order
    pub is_used: bool,
    /// Order the key was assigned to
    pub order_id: Option<OrderId>,
    /// When the key was added
    pub created_at: DateTime<Utc>,
}

/// Dashboard figures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    /// Number of orders
    pub total_orders: usize,
    /// Sum of all order amounts
    pub total_revenue: Money,
    /// Orders waiting for payment
    pub pending_orders: usize,
    /// Unused keys
    pub available_keys: usize,
}

/// Orders and key inventory
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdminState {
    /// Orders, oldest first
    pub orders: Vec<Order>,
    /// Key inventory, in insertion order
    pub keys: Vec<LicenseKey>,
    /// Sequence number of the next order
    pub next_order_seq: u32,
    /// Id of the next key
    pub next_key_id: u64,
    /// Reason the last command was rejected
    pub last_error: Option<String>,
}

impl Default for AdminState {
    fn default() -> Self {
        Self {
            orders: Vec::new(),
            keys: Vec::new(),
            next_order_seq: 1,
            next_key_id: 1,
            last_error: None,
        }
    }
}

fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0)
        .single()
        .unwrap_or_default()
}

fn line(id: u32, title: &str, price: u64) -> OrderLine {
    OrderLine {
        product_id: ProductId::new(id),
        title: title.to_string(),
        unit_price: Money::from_minor(price),
        quantity: 1,
    }
}

impl AdminState {
    /// The demo orders and key inventory
    #[must_use]
    pub fn seed() -> Self {
        let orders = vec![
            Order {
                id: OrderId::from_sequence(1),
                customer_name: "Иван Петров".to_string(),
                email: "ivan@example.com".to_string(),
                phone: "+7 900 123-45-67".to_string(),
                lines: vec![line(2, "Windows 11 Pro", 7990)],
                amount: Money::from_minor(7990),
                status: OrderStatus::Paid,
                payment_method: "СБП".to_string(),
                created_at: at(2024, 9, 8, 10, 30),
                keys: vec!["XXXXX-XXXXX-XXXXX-XXXXX-XXXXX".to_string()],
            },
            Order {
                id: OrderId::from_sequence(2),
                customer_name: "Мария Сидорова".to_string(),
                email: "maria@example.com".to_string(),
                phone: "+7 900 987-65-43".to_string(),
                lines: vec![line(1, "Windows 11 Home", 4990)],
                amount: Money::from_minor(4990),
                status: OrderStatus::Pending,
                payment_method: "Банковская карта".to_string(),
                created_at: at(2024, 9, 8, 11, 15),
                keys: Vec::new(),
            },
            Order {
                id: OrderId::from_sequence(3),
                customer_name: "Алексей Козлов".to_string(),
                email: "alex@example.com".to_string(),
                phone: "+7 900 555-44-33".to_string(),
                lines: vec![line(3, "Windows 11 Pro for Workstations", 12990)],
                amount: Money::from_minor(12990),
                status: OrderStatus::Delivered,
                payment_method: "ЮMoney".to_string(),
                created_at: at(2024, 9, 7, 16, 45),
                keys: vec!["YYYYY-YYYYY-YYYYY-YYYYY-YYYYY".to_string()],
            },
        ];

        let key = |id: u64, product: u32, key: &str, order: Option<u32>, created_at| LicenseKey {
            id: KeyId::new(id),
            product_id: ProductId::new(product),
            key: key.to_string(),
            is_used: order.is_some(),
            order_id: order.map(OrderId::from_sequence),
            created_at,
        };
        let keys = vec![
            key(1, 1, "AAAAA-BBBBB-CCCCC-DDDDD-EEEEE", None, at(2024, 9, 8, 9, 0)),
            key(2, 1, "FFFFF-GGGGG-HHHHH-IIIII-JJJJJ", None, at(2024, 9, 8, 9, 0)),
            key(3, 2, "KKKKK-LLLLL-MMMMM-NNNNN-OOOOO", Some(1), at(2024, 9, 7, 12, 0)),
            key(4, 2, "PPPPP-QQQQQ-RRRRR-SSSSS-TTTTT", None, at(2024, 9, 8, 9, 0)),
            key(5, 3, "UUUUU-VVVVV-WWWWW-XXXXX-YYYYY", Some(3), at(2024, 9, 7, 14, 0)),
        ];

        Self {
            orders,
            keys,
            next_order_seq: 4,
            next_key_id: 6,
            last_error: None,
        }
    }

    /// Dashboard figures
    #[must_use]
    pub fn stats(&self) -> AdminStats {
        AdminStats {
            total_orders: self.orders.len(),
            total_revenue: self.orders.iter().map(|o| o.amount).sum(),
            pending_orders: self
                .orders
                .iter()
                .filter(|o| o.status == OrderStatus::Pending)
                .count(),
            available_keys: self.keys.iter().filter(|k| !k.is_used).count(),
        }
    }

    /// Id the next recorded order will get
    #[must_use]
    pub fn next_order_id(&self) -> OrderId {
        OrderId::from_sequence(self.next_order_seq)
    }

    /// Looks up an order
    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.id == id)
    }

    /// Looks up a key
    #[must_use]
    pub fn key(&self, id: KeyId) -> Option<&LicenseKey> {
        self.keys.iter().find(|k| k.id == id)
    }

    /// Unused keys for a product
    #[must_use]
    pub fn available_keys(&self, product_id: ProductId) -> usize {
        self.keys
            .iter()
            .filter(|k| !k.is_used && k.product_id == product_id)
            .count()
    }
}

/// Admin actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminAction {
    /// Add a license key to the inventory
    AddKey {
        /// Product the key activates
        product_id: ProductId,
        /// The key
        key: String,
    },
    /// Remove a key from the inventory
    DeleteKey {
        /// Key id
        id: KeyId,
    },
    /// Set an order's status
    UpdateOrderStatus {
        /// Order id
        order_id: OrderId,
        /// New status
        status: OrderStatus,
    },
    /// Assign unused keys to an order and mark it delivered
    AssignKeys {
        /// Order id
        order_id: OrderId,
    },
    /// Record an order paid at checkout
    RecordOrder {
        /// The paid order
        order: PendingOrder,
    },
}

/// Reducer for the admin panel
#[derive(Clone, Copy, Debug, Default)]
pub struct AdminReducer;

impl AdminReducer {
    /// Creates a new `AdminReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn add_key(
        state: &mut AdminState,
        product_id: ProductId,
        key: &str,
        env: &StorefrontEnvironment,
    ) -> Result<(), AdminError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AdminError::EmptyKey);
        }
        if env.catalog.get(product_id).is_none() {
            return Err(AdminError::UnknownProduct(product_id));
        }
        if state.keys.iter().any(|k| k.key == key) {
            return Err(AdminError::DuplicateKey(key.to_string()));
        }

        let id = KeyId::new(state.next_key_id);
        state.next_key_id = state.next_key_id.saturating_add(1);
        state.keys.push(LicenseKey {
            id,
            product_id,
            key: key.to_string(),
            is_used: false,
            order_id: None,
            created_at: env.clock.now(),
        });
        tracing::info!(key_id = %id, %product_id, "License key added");
        Ok(())
    }

    fn assign_keys(state: &mut AdminState, order_id: &OrderId) -> Result<(), AdminError> {
        let order_index = state
            .orders
            .iter()
            .position(|o| &o.id == order_id)
            .ok_or_else(|| AdminError::OrderNotFound(order_id.clone()))?;

        let status = state.orders[order_index].status;
        if matches!(status, OrderStatus::Delivered | OrderStatus::Cancelled) {
            return Err(AdminError::OrderClosed {
                id: order_id.clone(),
                status,
            });
        }

        // Pick every key before touching anything
        let mut picked: Vec<usize> = Vec::new();
        for line in &state.orders[order_index].lines {
            let needed = line.quantity as usize;
            let candidates: Vec<usize> = state
                .keys
                .iter()
                .enumerate()
                .filter(|(_, k)| !k.is_used && k.product_id == line.product_id)
                .map(|(i, _)| i)
                .filter(|i| !picked.contains(i))
                .take(needed)
                .collect();
            if candidates.len() < needed {
                return Err(AdminError::NotEnoughKeys {
                    title: line.title.clone(),
                    needed,
                    available: candidates.len(),
                });
            }
            picked.extend(candidates);
        }

        let mut assigned = Vec::with_capacity(picked.len());
        for index in picked {
            let key = &mut state.keys[index];
            key.is_used = true;
            key.order_id = Some(order_id.clone());
            assigned.push(key.key.clone());
        }

        let order = &mut state.orders[order_index];
        tracing::info!(order_id = %order.id, keys = assigned.len(), "Keys assigned");
        order.keys.extend(assigned);
        order.status = OrderStatus::Delivered;
        Ok(())
    }

    fn apply(
        state: &mut AdminState,
        action: AdminAction,
        env: &StorefrontEnvironment,
    ) -> Result<(), AdminError> {
        match action {
            AdminAction::AddKey { product_id, key } => Self::add_key(state, product_id, &key, env),

            AdminAction::DeleteKey { id } => {
                let before = state.keys.len();
                state.keys.retain(|k| k.id != id);
                if state.keys.len() == before {
                    return Err(AdminError::KeyNotFound(id));
                }
                tracing::info!(key_id = %id, "License key deleted");
                Ok(())
            },

            AdminAction::UpdateOrderStatus { order_id, status } => {
                let order = state
                    .orders
                    .iter_mut()
                    .find(|o| o.id == order_id)
                    .ok_or(AdminError::OrderNotFound(order_id))?;
                tracing::info!(order_id = %order.id, from = %order.status, to = %status, "Order status changed");
                order.status = status;
                Ok(())
            },

            AdminAction::AssignKeys { order_id } => Self::assign_keys(state, &order_id),

            AdminAction::RecordOrder { order } => {
                let id = state.next_order_id();
                state.next_order_seq = state.next_order_seq.saturating_add(1);
                tracing::info!(order_id = %id, amount = order.amount.minor(), "Order recorded");
                state.orders.push(Order {
                    id,
                    customer_name: order.customer.full_name(),
                    email: order.customer.email.trim().to_string(),
                    phone: order.customer.phone.trim().to_string(),
                    lines: order.summary.lines,
                    amount: order.amount,
                    status: OrderStatus::Paid,
                    payment_method: order.method.name().to_string(),
                    created_at: env.clock.now(),
                    keys: Vec::new(),
                });
                Ok(())
            },
        }
    }
}

impl Reducer for AdminReducer {
    type State = AdminState;
    type Action = AdminAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match Self::apply(state, action, env) {
            Ok(()) => state.last_error = None,
            Err(error) => {
                tracing::warn!(%error, "Admin command rejected");
                state.last_error = Some(error.to_string());
            },
        }
        SmallVec::new()
    }
}
