//! Integration tests for table-level copy, merge and diff.

use metasync::metastore::memory::CatalogCall;
use metasync::metastore::{
    copy_or_merge, copy_or_merge_to_symlink, copy_partition, get_diff, Column, DifferenceType,
    LocationTransform, MemoryCatalog, MetastoreError, Partition, Table, TableSync,
    SPARK_SQL_PATH_KEY, SPARK_SQL_PROVIDER_KEY,
};

fn sales_table(db: &str, location: &str) -> Table {
    Table::new(
        db,
        "sales",
        location,
        vec![Column::new("id", "bigint"), Column::new("amount", "double")],
    )
}

fn month(db: &str, value: &str, location_root: &str) -> Partition {
    Partition::new(db, "sales", [value], format!("{location_root}/month={value}"))
}

fn source_with(months: &[&str]) -> MemoryCatalog {
    MemoryCatalog::new().with_table(
        sales_table("src", "s3://repo/main/sales"),
        months
            .iter()
            .map(|m| month("src", m, "s3://repo/main/sales"))
            .collect(),
    )
}

fn values(months: &[&str]) -> Vec<Vec<String>> {
    months.iter().map(|m| vec![m.to_string()]).collect()
}

#[tokio::test]
async fn test_copy_when_target_table_missing() {
    let source = source_with(&["2023-01", "2023-02"]);
    let target = MemoryCatalog::new();
    let request = TableSync::new("src", "sales", "dst", "sales");

    copy_or_merge(&source, &target, &request, &LocationTransform::branch("", "dev"))
        .await
        .unwrap();

    assert_eq!(target.call_methods().await, vec!["create_table", "add_partitions"]);
    assert_eq!(
        target.calls().await[1],
        CatalogCall::AddPartitions {
            db: "dst".to_string(),
            table: "sales".to_string(),
            values: values(&["2023-01", "2023-02"]),
        }
    );

    let table = target.table("dst", "sales").await.unwrap();
    assert_eq!(table.sd.location, "s3://repo/dev/sales");
    assert_eq!(table.sd.cols.len(), 2);

    let partitions = target.partitions("dst", "sales").await;
    assert_eq!(partitions.len(), 2);
    assert_eq!(partitions[0].db_name, "dst");
    assert_eq!(partitions[0].sd.location, "s3://repo/dev/sales/month=2023-01");
}

#[tokio::test]
async fn test_merge_when_target_table_exists() {
    let source = source_with(&["2023-01", "2023-02", "2023-03"]);
    let target = MemoryCatalog::new().with_table(
        sales_table("dst", "s3://repo/dev/sales"),
        vec![month("dst", "2023-01", "s3://repo/dev/stale")],
    );
    let request = TableSync::new("src", "sales", "dst", "sales");

    copy_or_merge(&source, &target, &request, &LocationTransform::branch("", "dev"))
        .await
        .unwrap();

    assert_eq!(
        target.calls().await,
        vec![
            CatalogCall::AlterTable {
                db: "dst".to_string(),
                table: "sales".to_string(),
            },
            CatalogCall::AddPartitions {
                db: "dst".to_string(),
                table: "sales".to_string(),
                values: values(&["2023-02", "2023-03"]),
            },
            CatalogCall::AlterPartitions {
                db: "dst".to_string(),
                table: "sales".to_string(),
                values: values(&["2023-01"]),
            },
        ]
    );

    let partitions = target.partitions("dst", "sales").await;
    assert_eq!(partitions.len(), 3);
    assert_eq!(partitions[0].sd.location, "s3://repo/dev/sales/month=2023-01");
}

#[tokio::test]
async fn test_merge_drops_target_only_partitions_last() {
    let source = source_with(&["2023-02"]);
    let target = MemoryCatalog::new().with_table(
        sales_table("dst", "s3://repo/dev/sales"),
        vec![
            month("dst", "2022-11", "s3://repo/dev/sales"),
            month("dst", "2022-12", "s3://repo/dev/sales"),
        ],
    );
    let request = TableSync::new("src", "sales", "dst", "sales");

    copy_or_merge(&source, &target, &request, &LocationTransform::identity())
        .await
        .unwrap();

    assert_eq!(
        target.call_methods().await,
        vec![
            "alter_table",
            "add_partitions",
            "alter_partitions",
            "drop_partition",
            "drop_partition",
        ]
    );
    let remaining: Vec<_> = target
        .partitions("dst", "sales")
        .await
        .into_iter()
        .map(|p| p.values)
        .collect();
    assert_eq!(remaining, values(&["2023-02"]));
}

#[tokio::test]
async fn test_merge_distinguishes_slash_in_partition_values() {
    let source = MemoryCatalog::new().with_table(
        sales_table("src", "s3://repo/main/sales"),
        vec![Partition::new("src", "sales", ["2023/01"], "s3://repo/main/sales/a")],
    );
    let target = MemoryCatalog::new().with_table(
        sales_table("dst", "s3://repo/main/sales"),
        vec![Partition::new("dst", "sales", ["2023", "01"], "s3://repo/main/sales/b")],
    );
    let request = TableSync::new("src", "sales", "dst", "sales");

    copy_or_merge(&source, &target, &request, &LocationTransform::identity())
        .await
        .unwrap();

    let calls = target.calls().await;
    assert_eq!(
        calls[1],
        CatalogCall::AddPartitions {
            db: "dst".to_string(),
            table: "sales".to_string(),
            values: vec![vec!["2023/01".to_string()]],
        }
    );
    assert_eq!(
        calls[3],
        CatalogCall::DropPartition {
            db: "dst".to_string(),
            table: "sales".to_string(),
            values: vec!["2023".to_string(), "01".to_string()],
        }
    );
    let remaining: Vec<_> = target
        .partitions("dst", "sales")
        .await
        .into_iter()
        .map(|p| p.values)
        .collect();
    assert_eq!(remaining, vec![vec!["2023/01".to_string()]]);
}

#[tokio::test]
async fn test_merge_issues_empty_batches() {
    let source = source_with(&[]);
    let target = MemoryCatalog::new().with_table(sales_table("dst", "s3://repo/dev/sales"), vec![]);
    let request = TableSync::new("src", "sales", "dst", "sales");

    copy_or_merge(&source, &target, &request, &LocationTransform::identity())
        .await
        .unwrap();

    assert_eq!(
        target.call_methods().await,
        vec!["alter_table", "add_partitions", "alter_partitions"]
    );
}

#[tokio::test]
async fn test_serde_name_applied() {
    let source = source_with(&["2023-01"]);
    let target = MemoryCatalog::new();
    let request = TableSync::new("src", "sales", "dst", "orders").with_serde("orders");

    copy_or_merge(&source, &target, &request, &LocationTransform::identity())
        .await
        .unwrap();

    let table = target.table("dst", "orders").await.unwrap();
    assert_eq!(table.sd.serde_info.name, "orders");
    let partitions = target.partitions("dst", "orders").await;
    assert_eq!(partitions[0].sd.serde_info.name, "orders");
    assert_eq!(partitions[0].table_name, "orders");
}

#[tokio::test]
async fn test_copy_aborts_on_invalid_location() {
    let source = MemoryCatalog::new().with_table(sales_table("src", "not-a-location"), vec![]);
    let target = MemoryCatalog::new();
    let request = TableSync::new("src", "sales", "dst", "sales");

    let err = copy_or_merge(&source, &target, &request, &LocationTransform::branch("", "dev"))
        .await
        .unwrap_err();

    assert!(matches!(err, MetastoreError::InvalidLocation(_)));
    assert!(target.calls().await.is_empty());
}

#[tokio::test]
async fn test_spark_placeholder_renamed() {
    let mut table = sales_table("src", "s3://repo/main/src.db/sales-__PLACEHOLDER__");
    table
        .parameters
        .insert(SPARK_SQL_PROVIDER_KEY.to_string(), "delta".to_string());
    table
        .sd
        .serde_info
        .parameters
        .insert(SPARK_SQL_PATH_KEY.to_string(), "s3://repo/main/sales".to_string());
    let source = MemoryCatalog::new().with_table(table, vec![]);
    let target = MemoryCatalog::new();
    let request = TableSync::new("src", "sales", "dst", "sales").with_fix_spark_placeholder(true);

    copy_or_merge(&source, &target, &request, &LocationTransform::branch("", "dev"))
        .await
        .unwrap();

    let copied = target.table("dst", "sales").await.unwrap();
    assert_eq!(copied.sd.location, "s3://repo/dev/dst.db/sales-__PLACEHOLDER__");
    assert_eq!(
        copied.sd.serde_info.parameters[SPARK_SQL_PATH_KEY],
        "s3://repo/dev/sales"
    );
}

fn spark_table(db: &str, name: &str, location: &str) -> Table {
    let mut table = Table::new(db, name, location, vec![]);
    table
        .parameters
        .insert(SPARK_SQL_PROVIDER_KEY.to_string(), "parquet".to_string());
    table
}

#[tokio::test]
async fn test_spark_placeholder_moves_to_target_root() {
    let source = MemoryCatalog::new().with_table(
        spark_table("src", "sales", "dbfs:/user/hive/warehouse/src.db/sales-__PLACEHOLDER__"),
        vec![],
    );
    let target = MemoryCatalog::new();
    let request =
        TableSync::new("src", "sales", "dst", "sales_v2").with_fix_spark_placeholder(true);
    let transform = LocationTransform::branch("s3://bucket/", "dev");

    copy_or_merge(&source, &target, &request, &transform)
        .await
        .unwrap();

    let copied = target.table("dst", "sales_v2").await.unwrap();
    assert_eq!(
        copied.sd.location,
        "s3://bucket/dev/hive/warehouse/dst.db/sales_v2-__PLACEHOLDER__"
    );
}

#[tokio::test]
async fn test_copy_to_symlink_fixes_spark_placeholder() {
    let catalog = MemoryCatalog::new().with_table(
        spark_table("src", "sales", "s3://repo/main/src.db/sales-__PLACEHOLDER__"),
        vec![],
    );
    let request =
        TableSync::new("src", "sales", "src", "sales_link").with_fix_spark_placeholder(true);

    copy_or_merge_to_symlink(&catalog, &request, "s3://symlinks")
        .await
        .unwrap();

    let table = catalog.table("src", "sales_link").await.unwrap();
    assert_eq!(
        table.sd.location,
        "s3://symlinks/repo/main/src.db/sales_link-__PLACEHOLDER__"
    );
}

#[tokio::test]
async fn test_copy_partition_adds_missing_partition() {
    let source = source_with(&["2023-01", "2023-02"]);
    let target = MemoryCatalog::new().with_table(sales_table("dst", "s3://repo/dev/sales"), vec![]);
    let request = TableSync::new("src", "sales", "dst", "sales").with_partition(["2023-02"]);

    copy_or_merge(&source, &target, &request, &LocationTransform::branch("", "dev"))
        .await
        .unwrap();

    assert_eq!(
        target.calls().await,
        vec![CatalogCall::AddPartition {
            db: "dst".to_string(),
            table: "sales".to_string(),
            values: vec!["2023-02".to_string()],
        }]
    );
    let partitions = target.partitions("dst", "sales").await;
    assert_eq!(partitions[0].sd.location, "s3://repo/dev/sales/month=2023-02");
}

#[tokio::test]
async fn test_copy_partition_alters_existing_partition() {
    let source = source_with(&["2023-01"]);
    let target = MemoryCatalog::new().with_table(
        sales_table("dst", "s3://repo/dev/sales"),
        vec![month("dst", "2023-01", "s3://repo/dev/stale")],
    );
    let request = TableSync::new("src", "sales", "dst", "sales").with_partition(["2023-01"]);

    copy_partition(&source, &target, &request, &LocationTransform::branch("", "dev"))
        .await
        .unwrap();

    assert_eq!(target.call_methods().await, vec!["alter_partition"]);
    let partitions = target.partitions("dst", "sales").await;
    assert_eq!(partitions[0].sd.location, "s3://repo/dev/sales/month=2023-01");
}

#[tokio::test]
async fn test_copy_partition_missing_source_partition() {
    let source = source_with(&["2023-01"]);
    let target = MemoryCatalog::new().with_table(sales_table("dst", "s3://repo/dev/sales"), vec![]);
    let request = TableSync::new("src", "sales", "dst", "sales").with_partition(["1999-01"]);

    let err = copy_partition(&source, &target, &request, &LocationTransform::identity())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(target.calls().await.is_empty());
}

#[tokio::test]
async fn test_copy_to_symlink_within_one_catalog() {
    let catalog = source_with(&["2023-01"]);
    let request = TableSync::new("src", "sales", "src", "sales_link")
        .with_serde("ignored")
        .with_partition(["2023-01"]);

    copy_or_merge_to_symlink(&catalog, &request, "s3://symlinks/")
        .await
        .unwrap();

    assert_eq!(catalog.call_methods().await, vec!["create_table", "add_partitions"]);
    let table = catalog.table("src", "sales_link").await.unwrap();
    assert_eq!(table.sd.location, "s3://symlinks/repo/main/sales");
    assert!(table.sd.serde_info.name.is_empty());
    let partitions = catalog.partitions("src", "sales_link").await;
    assert_eq!(
        partitions[0].sd.location,
        "s3://symlinks/repo/main/sales/month=2023-01"
    );
}

#[tokio::test]
async fn test_get_diff_reports_what_sync_would_do() {
    let source = MemoryCatalog::new().with_table(
        Table::new(
            "src",
            "sales",
            "s3://repo/main/sales",
            vec![Column::new("id", "bigint"), Column::new("amount", "double")],
        ),
        vec![
            month("src", "2023-01", "s3://repo/main/sales"),
            month("src", "2023-02", "s3://repo/main/sales"),
        ],
    );
    let target = MemoryCatalog::new().with_table(
        Table::new(
            "dst",
            "sales",
            "s3://repo/dev/sales",
            vec![Column::new("id", "int"), Column::new("legacy", "string")],
        ),
        vec![month("dst", "2022-12", "s3://repo/dev/sales")],
    );

    let diff = get_diff(&source, &target, "src", "sales", "dst", "sales")
        .await
        .unwrap();

    let columns: Vec<_> = diff
        .columns_diff
        .iter()
        .map(|d| (d.kind, d.key.as_str()))
        .collect();
    assert_eq!(
        columns,
        vec![
            (DifferenceType::Added, "amount"),
            (DifferenceType::Changed, "id"),
            (DifferenceType::Removed, "legacy"),
        ]
    );
    assert_eq!(diff.columns_diff[1].value.data_type, "bigint");

    let partitions: Vec<_> = diff
        .partition_diff
        .iter()
        .map(|d| (d.kind, d.key.as_str()))
        .collect();
    assert_eq!(
        partitions,
        vec![
            (DifferenceType::Removed, "2022-12"),
            (DifferenceType::Added, "2023-01"),
            (DifferenceType::Added, "2023-02"),
        ]
    );
    assert!(!diff.is_key_equal());
    assert!(source.calls().await.is_empty());
    assert!(target.calls().await.is_empty());
}
