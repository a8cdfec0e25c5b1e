//! Order placement and listing.
//!
//! An order is an immutable snapshot of the cart at checkout time: the total
//! is recomputed from live cart and product rows on the server (the web-app
//! payload is only a trigger), each line captures `price_at_time_cents`, and
//! the cart is cleared — all inside one transaction.

use rusqlite::TransactionBehavior;

use super::cart;
use crate::error::AppResult;
use crate::money;

/// Order status progression: new → verified → procurement → in_delivery →
/// completed, or cancelled at any point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    New,
    Verified,
    Procurement,
    InDelivery,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Verified => "verified",
            OrderStatus::Procurement => "procurement",
            OrderStatus::InDelivery => "in_delivery",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<OrderStatus> {
        match value {
            "new" => Some(OrderStatus::New),
            "verified" => Some(OrderStatus::Verified),
            "procurement" => Some(OrderStatus::Procurement),
            "in_delivery" => Some(OrderStatus::InDelivery),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Localization key for the status label.
    pub fn i18n_key(self) -> &'static str {
        match self {
            OrderStatus::New => "order-status-new",
            OrderStatus::Verified => "order-status-verified",
            OrderStatus::Procurement => "order-status-procurement",
            OrderStatus::InDelivery => "order-status-in-delivery",
            OrderStatus::Completed => "order-status-completed",
            OrderStatus::Cancelled => "order-status-cancelled",
        }
    }
}

/// A placed order (header row).
#[derive(Debug, Clone)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub delivery_info: Option<String>,
    pub created_at: String,
}

/// One order line with the price captured at creation time.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: f64,
    pub price_at_time_cents: i64,
    /// Weight correction filled by operators after packing, if any.
    pub final_weight: Option<f64>,
}

/// Checkout result: either a placed order or a rejected empty cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkout {
    Placed { order_id: i64, total_cents: i64 },
    EmptyCart,
}

/// Converts the user's cart into an order.
///
/// Inside a single IMMEDIATE transaction: re-reads the live cart joined to
/// live prices, inserts the order row (status `new`) and one order item per
/// line with `price_at_time_cents` captured, clears the cart, commits.
/// Either everything persists or nothing does.
pub fn place_order_from_cart(
    conn: &mut rusqlite::Connection,
    user_id: i64,
    delivery_info: Option<&str>,
) -> AppResult<Checkout> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let lines = {
        let mut stmt = tx.prepare(
            "SELECT ci.product_id, ci.quantity, p.price_cents
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.user_id = ?1
             ORDER BY ci.id",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?, row.get::<_, i64>(2)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    if lines.is_empty() {
        // Nothing to commit; the open transaction just unwinds.
        return Ok(Checkout::EmptyCart);
    }

    let total_cents: i64 = lines
        .iter()
        .map(|(_, quantity, price_cents)| money::line_total_cents(*price_cents, *quantity))
        .sum();

    tx.execute(
        "INSERT INTO orders (user_id, status, total_cents, delivery_info) VALUES (?1, 'new', ?2, ?3)",
        &[
            &user_id as &dyn rusqlite::ToSql,
            &total_cents as &dyn rusqlite::ToSql,
            &delivery_info as &dyn rusqlite::ToSql,
        ],
    )?;
    let order_id = tx.last_insert_rowid();

    for (product_id, quantity, price_cents) in &lines {
        tx.execute(
            "INSERT INTO order_items (order_id, product_id, quantity, price_at_time_cents)
             VALUES (?1, ?2, ?3, ?4)",
            &[
                &order_id as &dyn rusqlite::ToSql,
                product_id as &dyn rusqlite::ToSql,
                quantity as &dyn rusqlite::ToSql,
                price_cents as &dyn rusqlite::ToSql,
            ],
        )?;
    }

    tx.execute("DELETE FROM cart_items WHERE user_id = ?1", [user_id])?;

    tx.commit()?;
    Ok(Checkout::Placed { order_id, total_cents })
}

/// Orders of one user, newest first.
pub fn orders_for_user(conn: &rusqlite::Connection, user_id: i64) -> AppResult<Vec<Order>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, status, total_cents, delivery_info, created_at
         FROM orders WHERE user_id = ?1 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([user_id], |row| {
        let status: String = row.get(2)?;
        Ok(Order {
            id: row.get(0)?,
            user_id: row.get(1)?,
            status: OrderStatus::parse(&status).unwrap_or(OrderStatus::New),
            total_cents: row.get(3)?,
            delivery_info: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Items of one order.
pub fn order_items(conn: &rusqlite::Connection, order_id: i64) -> AppResult<Vec<OrderItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, order_id, product_id, quantity, price_at_time_cents, final_weight
         FROM order_items WHERE order_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map([order_id], |row| {
        Ok(OrderItem {
            id: row.get(0)?,
            order_id: row.get(1)?,
            product_id: row.get(2)?,
            quantity: row.get(3)?,
            price_at_time_cents: row.get(4)?,
            final_weight: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::catalog::{insert_category, insert_product, update_product_price, Availability};
    use crate::storage::db::create_user;
    use crate::storage::migrations::run_migrations;
    use pretty_assertions::assert_eq;

    fn setup() -> (rusqlite::Connection, i64, i64, i64) {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        let user = create_user(&conn, 42, "Олена").unwrap();
        let cat = insert_category(&conn, "М'ясо", "Fleisch").unwrap();
        let a = insert_product(&conn, None, "A", "A", 500, "kg", Availability::InStock, None, &[cat]).unwrap();
        let b = insert_product(&conn, None, "B", "B", 300, "kg", Availability::InStock, None, &[cat]).unwrap();
        (conn, user, a, b)
    }

    #[test]
    fn order_snapshot_totals_and_items() {
        let (mut conn, user, a, b) = setup();
        cart::increase(&mut conn, user, a).unwrap();
        cart::increase(&mut conn, user, a).unwrap();
        cart::increase(&mut conn, user, b).unwrap();

        let placed = place_order_from_cart(&mut conn, user, None).unwrap();
        let Checkout::Placed { order_id, total_cents } = placed else {
            panic!("expected a placed order");
        };

        // (A, qty 2, 5.00 €) + (B, qty 1, 3.00 €) = 13.00 €
        assert_eq!(total_cents, 1300);

        let items = order_items(&conn, order_id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].price_at_time_cents, 500);
        assert_eq!(items[0].quantity, 2.0);
        assert_eq!(items[1].price_at_time_cents, 300);
    }

    #[test]
    fn price_at_time_ignores_later_price_changes() {
        let (mut conn, user, a, _) = setup();
        cart::increase(&mut conn, user, a).unwrap();
        let Checkout::Placed { order_id, .. } = place_order_from_cart(&mut conn, user, None).unwrap() else {
            panic!("expected a placed order");
        };

        update_product_price(&conn, a, 999).unwrap();

        let items = order_items(&conn, order_id).unwrap();
        assert_eq!(items[0].price_at_time_cents, 500);
        let orders = orders_for_user(&conn, user).unwrap();
        assert_eq!(orders[0].total_cents, 500);
    }

    #[test]
    fn checkout_clears_the_cart_atomically() {
        let (mut conn, user, a, b) = setup();
        cart::increase(&mut conn, user, a).unwrap();
        cart::increase(&mut conn, user, b).unwrap();

        place_order_from_cart(&mut conn, user, None).unwrap();
        assert_eq!(cart::cart_count(&conn, user).unwrap(), 0);
    }

    #[test]
    fn empty_cart_is_rejected_without_an_order_row() {
        let (mut conn, user, _, _) = setup();
        assert_eq!(place_order_from_cart(&mut conn, user, None).unwrap(), Checkout::EmptyCart);
        assert!(orders_for_user(&conn, user).unwrap().is_empty());
    }

    #[test]
    fn status_round_trips() {
        for status in [
            OrderStatus::New,
            OrderStatus::Verified,
            OrderStatus::Procurement,
            OrderStatus::InDelivery,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("garbage"), None);
    }
}
