//! Balance-affecting transactions (payment webhook stub).

use rusqlite::TransactionBehavior;

use crate::error::AppResult;

/// Transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Payment,
    Refund,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Payment => "payment",
            TransactionKind::Refund => "refund",
        }
    }
}

/// Transaction lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// A recorded balance-affecting event.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub amount_cents: i64,
    pub status: String,
    pub external_id: Option<String>,
    pub created_at: String,
}

/// Records a completed deposit and credits the user's balance in one
/// transaction. `external_id` is the payment provider's reference.
pub fn record_deposit(
    conn: &mut rusqlite::Connection,
    user_id: i64,
    amount_cents: i64,
    external_id: &str,
) -> AppResult<i64> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "INSERT INTO transactions (user_id, kind, amount_cents, status, external_id)
         VALUES (?1, 'deposit', ?2, 'completed', ?3)",
        &[
            &user_id as &dyn rusqlite::ToSql,
            &amount_cents as &dyn rusqlite::ToSql,
            &external_id as &dyn rusqlite::ToSql,
        ],
    )?;
    let transaction_id = tx.last_insert_rowid();

    tx.execute(
        "UPDATE users SET balance_cents = balance_cents + ?1 WHERE id = ?2",
        &[&amount_cents as &dyn rusqlite::ToSql, &user_id as &dyn rusqlite::ToSql],
    )?;

    tx.commit()?;
    Ok(transaction_id)
}

/// Transactions of one user, newest first.
pub fn transactions_for_user(conn: &rusqlite::Connection, user_id: i64) -> AppResult<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, kind, amount_cents, status, external_id, created_at
         FROM transactions WHERE user_id = ?1 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([user_id], |row| {
        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: row.get(2)?,
            amount_cents: row.get(3)?,
            status: row.get(4)?,
            external_id: row.get(5)?,
            created_at: row.get(6)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::{create_user, get_user};
    use crate::storage::migrations::run_migrations;
    use pretty_assertions::assert_eq;

    #[test]
    fn deposit_credits_balance_and_records_transaction() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        let user_id = create_user(&conn, 42, "Олена").unwrap();

        record_deposit(&mut conn, user_id, 2500, "PAYPAL-123").unwrap();

        let user = get_user(&conn, 42).unwrap().unwrap();
        assert_eq!(user.balance_cents, 2500);

        let transactions = transactions_for_user(&conn, user_id).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].kind, "deposit");
        assert_eq!(transactions[0].status, "completed");
        assert_eq!(transactions[0].external_id.as_deref(), Some("PAYPAL-123"));
    }
}
