//! End-to-end storage flow: first contact → onboarding writes → cart
//! mutations → checkout snapshot, against a real migrated schema.

use farmconnect_core::storage::cart::{self, CartUpdate};
use farmconnect_core::storage::catalog::{self, Availability};
use farmconnect_core::storage::db;
use farmconnect_core::storage::migrations::run_migrations;
use farmconnect_core::storage::orders::{self, Checkout, OrderStatus};
use pretty_assertions::assert_eq;

fn migrated_conn() -> rusqlite::Connection {
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    run_migrations(&mut conn).unwrap();
    conn
}

#[test]
fn full_customer_journey() {
    let mut conn = migrated_conn();

    // First contact creates an incomplete profile.
    let user_id = db::create_user(&conn, 777, "Taras").unwrap();
    assert!(!db::get_user(&conn, 777).unwrap().unwrap().is_onboarded());

    // Onboarding: language first (kept even if the rest is abandoned),
    // then name and phone in one atomic write.
    db::set_user_language(&conn, 777, "de").unwrap();
    db::complete_user_profile(&conn, 777, "Taras Kovalenko", "+4915112345678").unwrap();
    let user = db::get_user(&conn, 777).unwrap().unwrap();
    assert!(user.is_onboarded());
    assert_eq!(user.language, "de");

    // Catalog and cart.
    let meat = catalog::insert_category(&conn, "М'ясо", "Fleisch").unwrap();
    let farm = catalog::insert_farm(&conn, "Hof Janssen").unwrap();
    let pork = catalog::insert_product(
        &conn,
        Some("PK-001"),
        "Свинина",
        "Schweinefleisch",
        950,
        "kg",
        Availability::InStock,
        Some(farm),
        &[meat],
    )
    .unwrap();
    let eggs = catalog::insert_product(
        &conn,
        Some("EG-010"),
        "Яйця",
        "Eier",
        320,
        "10 шт",
        Availability::InStock,
        None,
        &[meat],
    )
    .unwrap();

    cart::increase(&mut conn, user_id, pork).unwrap();
    cart::increase(&mut conn, user_id, pork).unwrap();
    cart::increase(&mut conn, user_id, eggs).unwrap();
    assert_eq!(cart::decrease(&mut conn, user_id, eggs).unwrap(), CartUpdate::Removed);
    cart::increase(&mut conn, user_id, eggs).unwrap();

    // Checkout snapshots prices and clears the cart.
    let Checkout::Placed { order_id, total_cents } =
        orders::place_order_from_cart(&mut conn, user_id, Some("Saturday pickup")).unwrap()
    else {
        panic!("expected a placed order");
    };
    assert_eq!(total_cents, 2 * 950 + 320);
    assert_eq!(cart::cart_count(&conn, user_id).unwrap(), 0);

    // Later catalog edits do not touch the snapshot.
    catalog::update_product_price(&conn, pork, 1200).unwrap();
    let items = orders::order_items(&conn, order_id).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].price_at_time_cents, 950);

    let placed = &orders::orders_for_user(&conn, user_id).unwrap()[0];
    assert_eq!(placed.status, OrderStatus::New);
    assert_eq!(placed.total_cents, total_cents);
    assert_eq!(placed.delivery_info.as_deref(), Some("Saturday pickup"));

    // A second checkout on the now-empty cart is rejected.
    assert_eq!(
        orders::place_order_from_cart(&mut conn, user_id, None).unwrap(),
        Checkout::EmptyCart
    );
}
