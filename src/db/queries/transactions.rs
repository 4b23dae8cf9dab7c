use crate::models::transaction::{NewTransaction, Transaction, TransactionKind, TransactionPatch, UnknownKind};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, trace};

const SELECT_COLUMNS: &str = "SELECT id, date, due_date, amount_cents, kind, description,
        destination, category, subcategory, classification, method, status, installments
     FROM transactions";

fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let kind_str: String = row.get(4)?;
    let kind = TransactionKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(UnknownKind(kind_str)))
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        due_date: row.get(2)?,
        amount_cents: row.get(3)?,
        kind,
        description: row.get(5)?,
        destination: row.get(6)?,
        category: row.get(7)?,
        subcategory: row.get(8)?,
        classification: row.get(9)?,
        method: row.get(10)?,
        status: row.get(11)?,
        installments: row.get(12)?,
    })
}

/// Full snapshot, newest first.
pub fn list_transactions(conn: &Connection) -> rusqlite::Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY date DESC, id DESC", SELECT_COLUMNS))?;
    let transactions = stmt
        .query_map([], row_to_transaction)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(count = transactions.len(), "Listed transactions");
    Ok(transactions)
}

pub fn get_transaction(conn: &Connection, id: i64) -> rusqlite::Result<Option<Transaction>> {
    trace!(transaction_id = id, "Fetching transaction");
    conn.query_row(
        &format!("{} WHERE id = ?", SELECT_COLUMNS),
        [id],
        row_to_transaction,
    )
    .optional()
}

pub fn create_transaction(conn: &Connection, transaction: &NewTransaction) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO transactions (date, due_date, amount_cents, kind, description, destination,
                                   category, subcategory, classification, method, status, installments)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            transaction.date,
            transaction.due_date,
            transaction.amount_cents,
            transaction.kind.as_str(),
            transaction.description,
            transaction.destination,
            transaction.category,
            transaction.subcategory,
            transaction.classification,
            transaction.method,
            transaction.status,
            transaction.installments,
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(transaction_id = id, kind = %transaction.kind, "Created transaction");
    Ok(id)
}

/// Apply a partial update. Returns the updated row, or `None` when no row has
/// that id.
pub fn update_transaction(
    conn: &Connection,
    id: i64,
    patch: &TransactionPatch,
) -> rusqlite::Result<Option<Transaction>> {
    let Some(mut transaction) = get_transaction(conn, id)? else {
        return Ok(None);
    };
    patch.apply(&mut transaction);

    conn.execute(
        "UPDATE transactions SET date = ?1, due_date = ?2, amount_cents = ?3, kind = ?4,
                description = ?5, destination = ?6, category = ?7, subcategory = ?8,
                classification = ?9, method = ?10, status = ?11, installments = ?12
         WHERE id = ?13",
        params![
            transaction.date,
            transaction.due_date,
            transaction.amount_cents,
            transaction.kind.as_str(),
            transaction.description,
            transaction.destination,
            transaction.category,
            transaction.subcategory,
            transaction.classification,
            transaction.method,
            transaction.status,
            transaction.installments,
            id,
        ],
    )?;
    debug!(transaction_id = id, "Updated transaction");
    Ok(Some(transaction))
}

/// Returns whether a row was deleted.
pub fn delete_transaction(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let deleted = conn.execute("DELETE FROM transactions WHERE id = ?", [id])?;
    debug!(transaction_id = id, deleted, "Deleted transaction");
    Ok(deleted > 0)
}
