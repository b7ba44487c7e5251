//! Integration tests for location rewriting.

use metasync::metastore::{
    handle_dbfs_location, import_location, replace_branch_name, symlink_location,
    LocationTransform, MetastoreError,
};

#[test]
fn test_dbfs_rewrite_is_exact() {
    assert_eq!(handle_dbfs_location("dbfs:/x/y", "s3://bucket/"), "s3://bucket/x/y");
    assert_eq!(
        handle_dbfs_location("dbfs:/warehouse/dbfs:/odd", "s3://bucket/"),
        "s3://bucket/warehouse/dbfs:/odd"
    );
}

#[test]
fn test_dbfs_rewrite_leaves_other_locations() {
    assert_eq!(handle_dbfs_location("s3://bucket/x", "s3://other/"), "s3://bucket/x");
    assert_eq!(handle_dbfs_location("dbfs:/x", ""), "dbfs:/x");
}

#[test]
fn test_replace_branch_name() {
    assert_eq!(
        replace_branch_name("s3://repo/main/sales/orders", "dev").unwrap(),
        "s3://repo/dev/sales/orders"
    );
    assert_eq!(replace_branch_name("s3://repo/main", "dev").unwrap(), "s3://repo/dev");
}

#[test]
fn test_replace_branch_name_without_branch_segment() {
    assert!(matches!(
        replace_branch_name("s3://repo", "dev"),
        Err(MetastoreError::InvalidLocation(_))
    ));
    assert!(matches!(
        replace_branch_name("not a location", "dev"),
        Err(MetastoreError::InvalidLocation(_))
    ));
}

#[test]
fn test_symlink_location() {
    assert_eq!(
        symlink_location("s3://repo/main/sales/orders", "s3://symlinks/").unwrap(),
        "s3://symlinks/repo/main/sales/orders"
    );
    assert!(symlink_location("s3://repo", "s3://symlinks").is_err());
}

#[test]
fn test_import_location() {
    assert_eq!(
        import_location("s3://bucket/sales/orders", "lake", "imports").unwrap(),
        "s3://lake/imports/bucket/sales/orders"
    );
    assert_eq!(
        import_location("s3://bucket", "lake", "imports").unwrap(),
        "s3://lake/imports/bucket"
    );
}

#[test]
fn test_empty_location_stays_empty() {
    let transforms = [
        LocationTransform::identity(),
        LocationTransform::branch("s3://bucket/", "dev"),
        LocationTransform::import("s3://bucket/", "lake", "main"),
        LocationTransform::symlink("s3://symlinks"),
    ];
    for transform in &transforms {
        assert_eq!(transform.apply("").unwrap(), "", "{transform:?}");
    }
}

#[test]
fn test_branch_transform_rewrites_dbfs_first() {
    let transform = LocationTransform::branch("s3://repo/", "dev");
    assert_eq!(
        transform.apply("dbfs:/main/sales/orders").unwrap(),
        "s3://repo/dev/sales/orders"
    );
}

#[test]
fn test_branch_transform_with_empty_branch() {
    let transform = LocationTransform::branch("s3://bucket/", "");
    assert_eq!(transform.apply("dbfs:/x/y").unwrap(), "s3://bucket/x/y");
    assert_eq!(transform.apply("anything at all").unwrap(), "anything at all");
}

#[test]
fn test_import_transform() {
    let transform = LocationTransform::import("s3://bucket/", "lake", "main");
    assert_eq!(
        transform.apply("dbfs:/sales/orders").unwrap(),
        "s3://lake/main/bucket/sales/orders"
    );
}

#[test]
fn test_symlink_transform_ignores_dbfs() {
    let transform = LocationTransform::symlink("s3://symlinks");
    assert!(transform.apply("dbfs:/sales/orders").is_err());
}
