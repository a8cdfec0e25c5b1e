//! `seed` subcommand: loads a demo catalog into an empty database.

use farmconnect_core::storage::catalog::{self, Availability};
use farmconnect_core::storage::{get_connection, DbPool};
use farmconnect_core::AppResult;

struct SeedProduct {
    sku: &'static str,
    name_uk: &'static str,
    name_de: &'static str,
    price_cents: i64,
    category: usize,
}

const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        sku: "SW-001",
        name_uk: "Шніцель / Печеня",
        name_de: "Schnitzel / Braten",
        price_cents: 1400,
        category: 0,
    },
    SeedProduct {
        sku: "SW-002",
        name_uk: "Фарш свинячий",
        name_de: "Hackfleisch vom Schwein",
        price_cents: 990,
        category: 0,
    },
    SeedProduct {
        sku: "SW-003",
        name_uk: "Реберця (Spareribs)",
        name_de: "Spareribs",
        price_cents: 1150,
        category: 0,
    },
    SeedProduct {
        sku: "RI-001",
        name_uk: "Антрекот",
        name_de: "Entrecote / Rumpsteak",
        price_cents: 3500,
        category: 1,
    },
    SeedProduct {
        sku: "RI-002",
        name_uk: "Яловичий фарш",
        name_de: "Rinderhackfleisch",
        price_cents: 1250,
        category: 1,
    },
    SeedProduct {
        sku: "RI-003",
        name_uk: "Філе (Яловичина)",
        name_de: "Filet (Rind)",
        price_cents: 4200,
        category: 1,
    },
    SeedProduct {
        sku: "WU-001",
        name_uk: "Братвурст",
        name_de: "Bratwurst",
        price_cents: 1250,
        category: 2,
    },
    SeedProduct {
        sku: "WU-002",
        name_uk: "Печінкова ковбаса",
        name_de: "Leberwurst",
        price_cents: 980,
        category: 2,
    },
];

/// Inserts the demo farm, categories, and products. Idempotence is not a
/// goal; running against a non-empty catalog duplicates rows.
pub fn run_seed(db_pool: &DbPool) -> AppResult<()> {
    let conn = get_connection(db_pool)?;

    let farm_id = catalog::insert_farm(&conn, "Hof Brinkmann, Osnabrück")?;

    let categories = [("Свинина", "Schwein"), ("Яловичина", "Rind"), ("Ковбаси", "Wurst")];
    let mut category_ids = Vec::with_capacity(categories.len());
    for (name_uk, name_de) in categories {
        category_ids.push(catalog::insert_category(&conn, name_uk, name_de)?);
    }

    for product in SEED_PRODUCTS {
        catalog::insert_product(
            &conn,
            Some(product.sku),
            product.name_uk,
            product.name_de,
            product.price_cents,
            "kg",
            Availability::InStock,
            Some(farm_id),
            &[category_ids[product.category]],
        )?;
    }

    log::info!(
        "Seeded {} categories and {} products",
        category_ids.len(),
        SEED_PRODUCTS.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmconnect_core::storage::migrations::run_migrations;
    use r2d2_sqlite::SqliteConnectionManager;

    #[test]
    fn seeds_a_browsable_catalog() {
        let manager = SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder().max_size(1).build(manager).unwrap();
        {
            let mut conn = pool.get().unwrap();
            run_migrations(&mut conn).unwrap();
        }

        run_seed(&pool).unwrap();

        let conn = pool.get().unwrap();
        let categories = catalog::categories(&conn).unwrap();
        assert_eq!(categories.len(), 3);
        for category in &categories {
            assert!(!catalog::products_in_category(&conn, category.id).unwrap().is_empty());
        }
    }
}
