//! Cart engine: per-user line items keyed by product.
//!
//! Every mutation wraps its read-modify-write in an IMMEDIATE transaction so
//! concurrent increments (double-tapped buttons, the admin process touching
//! the same row) cannot lose updates. A line's quantity is always > 0; the
//! row is deleted the moment a decrement would reach zero.

use rusqlite::{OptionalExtension, TransactionBehavior};

use crate::error::{AppError, AppResult};

/// Per-tap quantity step, in product units (kg for weight goods).
pub const QUANTITY_STEP: f64 = 1.0;

/// Outcome of a `decrease` call. Callers render distinct confirmations for
/// `Decremented` and `Removed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CartUpdate {
    /// Quantity lowered; the new quantity is attached.
    Decremented(f64),
    /// The line reached zero and was deleted.
    Removed,
    /// No line existed for this (user, product) pair.
    NotInCart,
}

/// One cart line joined with its product, as rendered in the cart view.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: i64,
    pub name_uk: String,
    pub name_de: String,
    pub unit: String,
    pub price_cents: i64,
    pub quantity: f64,
}

impl CartLine {
    /// Line total in cents at the product's current price.
    pub fn total_cents(&self) -> i64 {
        crate::money::line_total_cents(self.price_cents, self.quantity)
    }
}

/// Adds one quantity step to the (user, product) line, creating it when
/// missing. Returns the new quantity, or `NotFound` when the product has
/// been deleted out from under a stale keyboard.
///
/// Callers gate this on the cutoff policy; the engine itself only mutates.
pub fn increase(conn: &mut rusqlite::Connection, user_id: i64, product_id: i64) -> AppResult<f64> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let product: Option<i64> = tx
        .query_row("SELECT id FROM products WHERE id = ?1", [product_id], |row| row.get(0))
        .optional()?;
    if product.is_none() {
        return Err(AppError::NotFound(format!("product {product_id}")));
    }

    let existing: Option<f64> = tx
        .query_row(
            "SELECT quantity FROM cart_items WHERE user_id = ?1 AND product_id = ?2",
            [user_id, product_id],
            |row| row.get(0),
        )
        .optional()?;

    let new_quantity = match existing {
        Some(quantity) => {
            let new_quantity = quantity + QUANTITY_STEP;
            tx.execute(
                "UPDATE cart_items SET quantity = ?1 WHERE user_id = ?2 AND product_id = ?3",
                &[
                    &new_quantity as &dyn rusqlite::ToSql,
                    &user_id as &dyn rusqlite::ToSql,
                    &product_id as &dyn rusqlite::ToSql,
                ],
            )?;
            new_quantity
        }
        None => {
            tx.execute(
                "INSERT INTO cart_items (user_id, product_id, quantity) VALUES (?1, ?2, ?3)",
                &[
                    &user_id as &dyn rusqlite::ToSql,
                    &product_id as &dyn rusqlite::ToSql,
                    &QUANTITY_STEP as &dyn rusqlite::ToSql,
                ],
            )?;
            QUANTITY_STEP
        }
    };

    tx.commit()?;
    Ok(new_quantity)
}

/// Removes one quantity step from the (user, product) line. Deletes the line
/// when the quantity would drop below one step.
pub fn decrease(conn: &mut rusqlite::Connection, user_id: i64, product_id: i64) -> AppResult<CartUpdate> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing: Option<f64> = tx
        .query_row(
            "SELECT quantity FROM cart_items WHERE user_id = ?1 AND product_id = ?2",
            [user_id, product_id],
            |row| row.get(0),
        )
        .optional()?;

    let update = match existing {
        None => CartUpdate::NotInCart,
        Some(quantity) if quantity > QUANTITY_STEP => {
            let new_quantity = quantity - QUANTITY_STEP;
            tx.execute(
                "UPDATE cart_items SET quantity = ?1 WHERE user_id = ?2 AND product_id = ?3",
                &[
                    &new_quantity as &dyn rusqlite::ToSql,
                    &user_id as &dyn rusqlite::ToSql,
                    &product_id as &dyn rusqlite::ToSql,
                ],
            )?;
            CartUpdate::Decremented(new_quantity)
        }
        Some(_) => {
            tx.execute(
                "DELETE FROM cart_items WHERE user_id = ?1 AND product_id = ?2",
                [user_id, product_id],
            )?;
            CartUpdate::Removed
        }
    };

    tx.commit()?;
    Ok(update)
}

/// Current quantity of one line, 0.0 when absent (product-card rendering).
pub fn line_quantity(conn: &rusqlite::Connection, user_id: i64, product_id: i64) -> AppResult<f64> {
    let quantity: Option<f64> = conn
        .query_row(
            "SELECT quantity FROM cart_items WHERE user_id = ?1 AND product_id = ?2",
            [user_id, product_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(quantity.unwrap_or(0.0))
}

/// Deletes every line of the user's cart.
pub fn clear_cart(conn: &rusqlite::Connection, user_id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM cart_items WHERE user_id = ?1", [user_id])?;
    Ok(())
}

/// Number of lines in the user's cart.
pub fn cart_count(conn: &rusqlite::Connection, user_id: i64) -> AppResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM cart_items WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// All cart lines joined with product data, for the cart view and checkout.
pub fn cart_lines(conn: &rusqlite::Connection, user_id: i64) -> AppResult<Vec<CartLine>> {
    let mut stmt = conn.prepare(
        "SELECT ci.product_id, p.name_uk, p.name_de, p.unit, p.price_cents, ci.quantity
         FROM cart_items ci
         JOIN products p ON p.id = ci.product_id
         WHERE ci.user_id = ?1
         ORDER BY ci.id",
    )?;
    let rows = stmt.query_map([user_id], |row| {
        Ok(CartLine {
            product_id: row.get(0)?,
            name_uk: row.get(1)?,
            name_de: row.get(2)?,
            unit: row.get(3)?,
            price_cents: row.get(4)?,
            quantity: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::catalog::{insert_category, insert_product, Availability};
    use crate::storage::db::create_user;
    use crate::storage::migrations::run_migrations;
    use pretty_assertions::assert_eq;

    fn setup() -> (rusqlite::Connection, i64, i64) {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        let user_id = create_user(&conn, 42, "Олена").unwrap();
        let cat = insert_category(&conn, "М'ясо", "Fleisch").unwrap();
        let product_id = insert_product(
            &conn,
            None,
            "Свинина",
            "Schweinefleisch",
            500,
            "kg",
            Availability::InStock,
            None,
            &[cat],
        )
        .unwrap();
        (conn, user_id, product_id)
    }

    #[test]
    fn increase_creates_then_increments() {
        let (mut conn, user, product) = setup();

        assert_eq!(increase(&mut conn, user, product).unwrap(), 1.0);
        assert_eq!(increase(&mut conn, user, product).unwrap(), 2.0);
        assert_eq!(line_quantity(&conn, user, product).unwrap(), 2.0);
    }

    #[test]
    fn net_of_two_increases_and_one_decrease_is_one() {
        let (mut conn, user, product) = setup();

        increase(&mut conn, user, product).unwrap();
        increase(&mut conn, user, product).unwrap();
        let update = decrease(&mut conn, user, product).unwrap();

        assert_eq!(update, CartUpdate::Decremented(1.0));
        assert_eq!(line_quantity(&conn, user, product).unwrap(), 1.0);
    }

    #[test]
    fn decrease_at_one_removes_the_line() {
        let (mut conn, user, product) = setup();

        increase(&mut conn, user, product).unwrap();
        assert_eq!(decrease(&mut conn, user, product).unwrap(), CartUpdate::Removed);

        // Quantity is never stored as 0 or negative: the row is gone.
        assert_eq!(line_quantity(&conn, user, product).unwrap(), 0.0);
        assert_eq!(cart_count(&conn, user).unwrap(), 0);
    }

    #[test]
    fn decrease_on_empty_cart_keeps_signalling_not_in_cart() {
        let (mut conn, user, product) = setup();

        assert_eq!(decrease(&mut conn, user, product).unwrap(), CartUpdate::NotInCart);
        // Repeated decreases stay idempotent.
        assert_eq!(decrease(&mut conn, user, product).unwrap(), CartUpdate::NotInCart);
    }

    #[test]
    fn cart_lines_join_product_data() {
        let (mut conn, user, product) = setup();
        increase(&mut conn, user, product).unwrap();
        increase(&mut conn, user, product).unwrap();

        let lines = cart_lines(&conn, user).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, product);
        assert_eq!(lines[0].quantity, 2.0);
        assert_eq!(lines[0].total_cents(), 1000);
    }

    #[test]
    fn increase_on_deleted_product_reports_not_found() {
        let (mut conn, user, _) = setup();

        let result = increase(&mut conn, user, 9999);
        assert!(matches!(result, Err(crate::error::AppError::NotFound(_))));
        // No orphan line was written.
        assert_eq!(cart_count(&conn, user).unwrap(), 0);
    }

    #[test]
    fn clear_cart_drops_all_lines() {
        let (mut conn, user, product) = setup();
        increase(&mut conn, user, product).unwrap();

        clear_cart(&conn, user).unwrap();
        assert_eq!(cart_count(&conn, user).unwrap(), 0);
    }
}
