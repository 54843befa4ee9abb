//! Writes a starter catalog as a store document tree. Point
//! `STORE_SEED_PATH` at the output to load it on start.

use std::path::PathBuf;

use rust_decimal::Decimal;

use clothy_api::{
    models::{Category, Product},
    store::{self, DocumentStore, MemoryStore, paths},
};

const CATALOG: &[(Category, &str, i64, &str)] = &[
    (Category::TShirt, "Kaos Polos Hitam", 79_000, "Kaos katun combed 30s."),
    (Category::TShirt, "Kaos Grafis Batik", 99_000, "Sablon motif parang."),
    (Category::Celana, "Celana Chino Krem", 189_000, "Potongan slim fit."),
    (Category::Dress, "Dress Batik Modern", 259_000, "Batik cap, panjang selutut."),
    (Category::Jaket, "Jaket Denim Biru", 329_000, "Denim 14 oz."),
    (Category::Hoodie, "Hoodie Abu Polos", 219_000, "Fleece tebal dengan kantong depan."),
    (Category::Sepatu, "Sneakers Kanvas Putih", 279_000, "Sol karet anti slip."),
    (Category::Aksesoris, "Topi Baseball Navy", 69_000, "Tali belakang bisa diatur."),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let out = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("STORE_SEED_PATH").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("seed.json"));

    let store = MemoryStore::new();
    for (category, name, price, description) in CATALOG {
        let product = Product {
            id: store.push_key(),
            name: name.to_string(),
            price: Decimal::from(*price),
            image: String::new(),
            description: description.to_string(),
            category: *category,
        };
        store::put(&store, &paths::product(product.category, &product.id), &product).await?;
    }

    let root = store.read("").await?.unwrap_or_default();
    tokio::fs::write(&out, serde_json::to_string_pretty(&root)?).await?;

    println!("Seed completed: {} products written to {}", CATALOG.len(), out.display());
    Ok(())
}
