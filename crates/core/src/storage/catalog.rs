//! Catalog persistence: categories, farms, products.

use rusqlite::{OptionalExtension, Result};
use unic_langid::LanguageIdentifier;

/// Product availability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    InStock,
    OutOfStock,
    OnRequest,
}

impl Availability {
    pub fn as_str(self) -> &'static str {
        match self {
            Availability::InStock => "in_stock",
            Availability::OutOfStock => "out_of_stock",
            Availability::OnRequest => "on_request",
        }
    }

    /// Unknown stored values degrade to `OutOfStock` so a bad row can never
    /// make an unavailable product orderable.
    pub fn parse(value: &str) -> Availability {
        match value {
            "in_stock" => Availability::InStock,
            "on_request" => Availability::OnRequest,
            _ => Availability::OutOfStock,
        }
    }
}

/// A product category with per-locale names.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name_uk: String,
    pub name_de: String,
}

impl Category {
    /// Localized category name.
    pub fn name(&self, lang: &LanguageIdentifier) -> &str {
        if lang.language.as_str() == "de" {
            &self.name_de
        } else {
            &self.name_uk
        }
    }
}

/// A catalog product. Price is integer euro cents per `unit`.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: i64,
    pub sku: Option<String>,
    pub name_uk: String,
    pub name_de: String,
    pub price_cents: i64,
    pub unit: String,
    pub availability: Availability,
    pub description: Option<String>,
    pub farm_id: Option<i64>,
}

impl Product {
    /// Localized product name.
    pub fn name(&self, lang: &LanguageIdentifier) -> &str {
        if lang.language.as_str() == "de" {
            &self.name_de
        } else {
            &self.name_uk
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, sku, name_uk, name_de, price_cents, unit, availability, description, farm_id";

fn map_product_row(row: &rusqlite::Row<'_>) -> Result<Product> {
    let availability: String = row.get(6)?;
    Ok(Product {
        id: row.get(0)?,
        sku: row.get(1)?,
        name_uk: row.get(2)?,
        name_de: row.get(3)?,
        price_cents: row.get(4)?,
        unit: row.get(5)?,
        availability: Availability::parse(&availability),
        description: row.get(7)?,
        farm_id: row.get(8)?,
    })
}

/// All categories, ordered by id.
pub fn categories(conn: &rusqlite::Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name_uk, name_de FROM categories ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(Category {
            id: row.get(0)?,
            name_uk: row.get(1)?,
            name_de: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// Fetches one category.
pub fn category_by_id(conn: &rusqlite::Connection, category_id: i64) -> Result<Option<Category>> {
    conn.query_row(
        "SELECT id, name_uk, name_de FROM categories WHERE id = ?1",
        [category_id],
        |row| {
            Ok(Category {
                id: row.get(0)?,
                name_uk: row.get(1)?,
                name_de: row.get(2)?,
            })
        },
    )
    .optional()
}

/// In-stock products of a category, via the many-to-many link table.
pub fn products_in_category(conn: &rusqlite::Connection, category_id: i64) -> Result<Vec<Product>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products
         JOIN product_categories pc ON pc.product_id = products.id
         WHERE pc.category_id = ?1 AND availability = 'in_stock'
         ORDER BY products.id"
    ))?;
    let rows = stmt.query_map([category_id], map_product_row)?;
    rows.collect()
}

/// Fetches one product.
pub fn product_by_id(conn: &rusqlite::Connection, product_id: i64) -> Result<Option<Product>> {
    conn.query_row(
        &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
        [product_id],
        map_product_row,
    )
    .optional()
}

/// Inserts a category; used by the seed command and tests.
pub fn insert_category(conn: &rusqlite::Connection, name_uk: &str, name_de: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO categories (name_uk, name_de) VALUES (?1, ?2)",
        &[&name_uk as &dyn rusqlite::ToSql, &name_de as &dyn rusqlite::ToSql],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Inserts a farm (producer).
pub fn insert_farm(conn: &rusqlite::Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO farms (name) VALUES (?1)", [name])?;
    Ok(conn.last_insert_rowid())
}

/// Inserts a product and links it to the given categories.
#[allow(clippy::too_many_arguments)]
pub fn insert_product(
    conn: &rusqlite::Connection,
    sku: Option<&str>,
    name_uk: &str,
    name_de: &str,
    price_cents: i64,
    unit: &str,
    availability: Availability,
    farm_id: Option<i64>,
    category_ids: &[i64],
) -> Result<i64> {
    conn.execute(
        "INSERT INTO products (sku, name_uk, name_de, price_cents, unit, availability, farm_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        &[
            &sku as &dyn rusqlite::ToSql,
            &name_uk as &dyn rusqlite::ToSql,
            &name_de as &dyn rusqlite::ToSql,
            &price_cents as &dyn rusqlite::ToSql,
            &unit as &dyn rusqlite::ToSql,
            &availability.as_str() as &dyn rusqlite::ToSql,
            &farm_id as &dyn rusqlite::ToSql,
        ],
    )?;
    let product_id = conn.last_insert_rowid();
    for category_id in category_ids {
        conn.execute(
            "INSERT INTO product_categories (product_id, category_id) VALUES (?1, ?2)",
            &[&product_id as &dyn rusqlite::ToSql, category_id as &dyn rusqlite::ToSql],
        )?;
    }
    Ok(product_id)
}

/// Updates a product price; the admin panel edits prices, order items must
/// not follow (see `orders::place_order_from_cart`).
pub fn update_product_price(conn: &rusqlite::Connection, product_id: i64, price_cents: i64) -> Result<()> {
    conn.execute(
        "UPDATE products SET price_cents = ?1 WHERE id = ?2",
        &[&price_cents as &dyn rusqlite::ToSql, &product_id as &dyn rusqlite::ToSql],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations;
    use pretty_assertions::assert_eq;

    fn test_conn() -> rusqlite::Connection {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn category_products_are_filtered_to_in_stock() {
        let conn = test_conn();
        let cat = insert_category(&conn, "М'ясо", "Fleisch").unwrap();
        let visible = insert_product(
            &conn,
            Some("PK-001"),
            "Свинина",
            "Schweinefleisch",
            950,
            "kg",
            Availability::InStock,
            None,
            &[cat],
        )
        .unwrap();
        insert_product(
            &conn,
            Some("PK-002"),
            "Сало",
            "Speck",
            700,
            "kg",
            Availability::OutOfStock,
            None,
            &[cat],
        )
        .unwrap();

        let products = products_in_category(&conn, cat).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, visible);
    }

    #[test]
    fn localized_names_follow_language() {
        let lang_uk = crate::i18n::lang_from_code("uk");
        let lang_de = crate::i18n::lang_from_code("de");
        let category = Category {
            id: 1,
            name_uk: "Овочі".to_string(),
            name_de: "Gemüse".to_string(),
        };
        assert_eq!(category.name(&lang_uk), "Овочі");
        assert_eq!(category.name(&lang_de), "Gemüse");
    }

    #[test]
    fn availability_round_trips_and_degrades_safely() {
        assert_eq!(Availability::parse("in_stock"), Availability::InStock);
        assert_eq!(Availability::parse("on_request"), Availability::OnRequest);
        assert_eq!(Availability::parse("garbage"), Availability::OutOfStock);
    }
}
