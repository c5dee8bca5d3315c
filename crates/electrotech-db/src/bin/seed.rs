//! # Seed Data Generator
//!
//! Populates a development database with an electronics catalogue.
//!
//! ## Usage
//! ```bash
//! # Seed ./electrotech_dev.db
//! cargo run -p electrotech-db --bin seed
//!
//! # Specify database path
//! cargo run -p electrotech-db --bin seed -- --db ./data/electrotech.db
//! ```
//!
//! ## Generated Data
//! - Categories: Laptops, Phones, Audio, TVs, Accessories
//! - Suppliers: three distributors
//! - Products: a few models per category, priced in cents with a 25-45% margin
//! - Payment methods: Cash, Credit Card, Debit Card, Bank Transfer
//!
//! Nothing is written when the database already has products.

use chrono::Utc;
use std::env;

use electrotech_core::{Category, PaymentMethod, Product, Supplier};
use electrotech_db::repository::new_id;
use electrotech_db::{Database, DbConfig};

/// (name, description)
const CATEGORIES: &[(&str, &str)] = &[
    ("Laptops", "Notebooks and ultrabooks"),
    ("Phones", "Smartphones and feature phones"),
    ("Audio", "Headphones, speakers and soundbars"),
    ("TVs", "Televisions and monitors"),
    ("Accessories", "Cables, chargers, mice and keyboards"),
];

/// (tax_id, company, contact)
const SUPPLIERS: &[(&str, &str, &str)] = &[
    ("DNO-840215-AB1", "Distribuidora Norte", "Laura Méndez"),
    ("ISU-910730-KL9", "Importadora Sur", "Jorge Salas"),
    ("TGL-030112-ZZ3", "TecnoGlobal Mayoreo", "Patricia Ortega"),
];

/// (category index, supplier index, code, name, sale price cents, stock, min stock)
const PRODUCTS: &[(usize, usize, &str, &str, i64, i64, i64)] = &[
    (0, 0, "LAP-DELL-14", "Dell Latitude 14", 1_899_900, 8, 2),
    (0, 0, "LAP-HP-15", "HP ProBook 450", 1_549_900, 6, 2),
    (0, 2, "LAP-LEN-13", "Lenovo ThinkPad X13", 2_299_900, 4, 1),
    (1, 1, "PH-SAM-A55", "Samsung Galaxy A55", 849_900, 15, 5),
    (1, 1, "PH-MOTO-G84", "Motorola Moto G84", 599_900, 12, 5),
    (1, 2, "PH-XIA-R13", "Xiaomi Redmi Note 13", 499_900, 3, 5),
    (2, 0, "AUD-SNY-XM5", "Sony WH-1000XM5 Headphones", 749_900, 5, 2),
    (2, 2, "AUD-JBL-FLIP6", "JBL Flip 6 Speaker", 249_900, 10, 3),
    (3, 1, "TV-LG-55UHD", "LG 55\" 4K UHD Smart TV", 1_299_900, 4, 1),
    (3, 1, "TV-SAM-43FHD", "Samsung 43\" Full HD TV", 699_900, 1, 2),
    (4, 2, "ACC-LOG-M185", "Logitech M185 Wireless Mouse", 29_900, 40, 10),
    (4, 2, "ACC-USBC-2M", "USB-C Cable 2m", 14_900, 60, 15),
    (4, 0, "ACC-ANK-65W", "Anker 65W GaN Charger", 89_900, 20, 5),
];

/// (name, description)
const PAYMENT_METHODS: &[(&str, &str)] = &[
    ("Cash", "Cash at the register"),
    ("Credit Card", "Visa / Mastercard / Amex"),
    ("Debit Card", "Bank debit card"),
    ("Bank Transfer", "Transfer confirmed before delivery"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./electrotech_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ElectroTech Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./electrotech_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    println!("🌱 ElectroTech Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    // Categories
    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (name, description) in CATEGORIES {
        let category = Category {
            id: new_id(),
            name: name.to_string(),
            description: Some(description.to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.categories().insert(&category).await?;
        category_ids.push(category.id);
    }
    println!("✓ {} categories", category_ids.len());

    // Suppliers
    let mut supplier_ids = Vec::with_capacity(SUPPLIERS.len());
    for (tax_id, company, contact) in SUPPLIERS {
        let supplier = Supplier {
            id: new_id(),
            tax_id: tax_id.to_string(),
            company_name: company.to_string(),
            contact_name: Some(contact.to_string()),
            email: None,
            phone: None,
            address: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.suppliers().insert(&supplier).await?;
        supplier_ids.push(supplier.id);
    }
    println!("✓ {} suppliers", supplier_ids.len());

    // Products
    let mut generated = 0;
    for (seed, (category_idx, supplier_idx, code, name, price, stock, min_stock)) in
        PRODUCTS.iter().enumerate()
    {
        let product = Product {
            id: new_id(),
            code: code.to_string(),
            name: name.to_string(),
            description: None,
            category_id: category_ids[*category_idx].clone(),
            supplier_id: Some(supplier_ids[*supplier_idx].clone()),
            purchase_price_cents: purchase_price(*price, seed),
            sale_price_cents: *price,
            stock: *stock,
            min_stock: *min_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.code, e);
            continue;
        }
        generated += 1;
    }
    println!("✓ {} products", generated);

    // Payment methods (only if none yet)
    if db.payment_methods().count_active().await? == 0 {
        for (name, description) in PAYMENT_METHODS {
            let method = PaymentMethod {
                id: new_id(),
                name: name.to_string(),
                description: Some(description.to_string()),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            db.payment_methods().insert(&method).await?;
        }
        println!("✓ {} payment methods", PAYMENT_METHODS.len());
    }

    // Verify FTS
    println!();
    println!("Verifying FTS index...");
    let results = db.products().search("samsung", 10).await?;
    println!("  Search 'samsung': {} results", results.len());
    let results = db.products().search("LAP", 10).await?;
    println!("  Search 'LAP': {} results", results.len());

    let low = db.products().list_low_stock().await?;
    println!("  Low stock: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Cost at 55-75% of the sale price, varying per product.
fn purchase_price(sale_price_cents: i64, seed: usize) -> i64 {
    let cost_pct = 55 + ((seed * 7) % 21) as i64;
    sale_price_cents * cost_pct / 100
}
