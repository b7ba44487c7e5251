//! Integration tests for the sorted merge-join diff.

use metasync::metastore::{
    diff, diff_iterable, Collection, Column, ColumnCollection, DifferenceType, Partition,
    PartitionCollection,
};

fn partitions(keys: &[&str]) -> PartitionCollection {
    PartitionCollection::new(
        keys.iter()
            .map(|k| Partition::new("db", "t", k.split('/'), format!("s3://repo/main/t/{k}"))),
    )
}

fn kinds_and_keys(
    left: &PartitionCollection,
    right: &PartitionCollection,
) -> Vec<(DifferenceType, String)> {
    diff(left, right)
        .into_iter()
        .map(|d| (d.kind, d.key))
        .collect()
}

#[test]
fn test_every_key_visited_once_in_order() {
    let left = partitions(&["2023-03", "2023-01", "2023-05"]);
    let right = partitions(&["2023-02", "2023-03", "2023-04"]);

    assert_eq!(
        kinds_and_keys(&left, &right),
        vec![
            (DifferenceType::Removed, "2023-01".to_string()),
            (DifferenceType::Added, "2023-02".to_string()),
            (DifferenceType::Changed, "2023-03".to_string()),
            (DifferenceType::Added, "2023-04".to_string()),
            (DifferenceType::Removed, "2023-05".to_string()),
        ]
    );
}

#[test]
fn test_empty_sides() {
    let empty = partitions(&[]);
    let some = partitions(&["a", "b"]);

    assert!(diff(&empty, &empty).is_empty());
    assert!(diff(&empty, &some)
        .iter()
        .all(|d| d.kind == DifferenceType::Added));
    assert!(diff(&some, &empty)
        .iter()
        .all(|d| d.kind == DifferenceType::Removed));
}

#[test]
fn test_multi_value_partition_keys() {
    let left = partitions(&["2023/01"]);
    let right = partitions(&["2023/01", "2023/02"]);

    let diffs = diff(&left, &right);
    assert_eq!(diffs.len(), 2);
    assert_eq!(diffs[0].key, "2023/01");
    assert_eq!(diffs[0].value.values, vec!["2023", "01"]);
    assert_eq!(diffs[1].kind, DifferenceType::Added);
}

#[test]
fn test_changed_carries_right_value() {
    let left = ColumnCollection::new([Column::new("id", "int")]);
    let right = ColumnCollection::new([Column::new("id", "bigint")]);

    let diffs = diff(&left, &right);
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].kind, DifferenceType::Changed);
    assert_eq!(diffs[0].value.data_type, "bigint");
}

#[test]
fn test_visitor_error_stops_join() {
    let left = partitions(&[]);
    let right = partitions(&["a", "b", "c"]);

    let mut seen = Vec::new();
    let result = diff_iterable(&left, &right, |_, _, key| {
        seen.push(key.to_string());
        if key == "b" {
            Err("stop")
        } else {
            Ok(())
        }
    });

    assert_eq!(result, Err("stop"));
    assert_eq!(seen, vec!["a", "b"]);
}

#[test]
fn test_collection_len() {
    let collection = partitions(&["x", "y"]);
    assert_eq!(collection.len(), 2);
    assert!(!collection.is_empty());
    assert_eq!(collection.key(0), "x");
}
