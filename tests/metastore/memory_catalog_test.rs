//! Integration tests for the in-memory catalog's client contract.

use metasync::metastore::memory::{matches_pattern, CatalogCall};
use metasync::metastore::{Database, MemoryCatalog, Partition, ReadClient, Table, WriteClient};

fn catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_database(Database::new("sales", "s3://warehouse/sales.db"))
        .with_database(Database::new("sales_eu", "s3://warehouse/sales_eu.db"))
        .with_database(Database::new("hr", "s3://warehouse/hr.db"))
        .with_table(Table::new("sales", "orders", "s3://warehouse/sales.db/orders", vec![]), vec![])
}

#[test]
fn test_hive_patterns() {
    assert!(matches_pattern("sales*", "sales_eu"));
    assert!(matches_pattern("hr|sales", "hr"));
    assert!(matches_pattern(" hr | sales ", "sales"));
    assert!(!matches_pattern("sales", "sales_eu"));
}

#[tokio::test]
async fn test_get_databases_by_pattern() {
    let catalog = catalog();

    let names: Vec<_> = catalog
        .get_databases("sales*")
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();

    assert_eq!(names, vec!["sales", "sales_eu"]);
}

#[tokio::test]
async fn test_get_tables_unknown_database() {
    let catalog = catalog();
    let err = catalog.get_tables("missing", "*").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_has_table_and_get_table() {
    let catalog = catalog();

    assert!(catalog.has_table("sales", "orders").await.unwrap());
    assert!(!catalog.has_table("sales", "returns").await.unwrap());
    assert!(catalog.get_table("sales", "returns").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_create_existing_table_fails() {
    let catalog = catalog();
    let table = Table::new("sales", "orders", "", vec![]);

    assert!(catalog.create_table(&table).await.is_err());
    assert_eq!(
        catalog.calls().await,
        vec![CatalogCall::CreateTable {
            db: "sales".to_string(),
            table: "orders".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_alter_partitions_requires_existing() {
    let catalog = catalog();
    let partition = Partition::new("sales", "orders", ["2023-01"], "");

    let err = catalog
        .alter_partitions("sales", "orders", &[partition])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_writes_to_unknown_table() {
    let catalog = catalog();
    let partition = Partition::new("sales", "returns", ["2023-01"], "");

    let err = catalog
        .add_partitions("returns", "sales", &[partition])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_default_db_location() {
    let catalog = MemoryCatalog::with_warehouse("s3://lake");
    assert_eq!(catalog.get_db_location("sales"), "s3://lake/sales.db");
    assert_eq!(catalog.normalize_db_name("Sales-EU"), "Sales-EU");
}
