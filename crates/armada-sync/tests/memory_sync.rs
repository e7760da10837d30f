//! End-to-end sync through the in-memory backend.

// Tests panic on failure by design.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::BTreeMap;

use armada_sync::{MemorySheets, Operation, RowDiffer, SheetSyncClient, diff};
use armada_types::{CellValue, ColumnSchema, Dataset, Row};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const SHEET: &str = "装備";

fn header() -> Vec<String> {
    ["gear_id", "name", "hp"].map(ToOwned::to_owned).to_vec()
}

fn grid_of(data: &Dataset) -> Vec<Vec<CellValue>> {
    let mut grid = vec![data.columns.iter().map(|c| CellValue::from(c.as_str())).collect()];
    grid.extend(data.rows.iter().map(|r| r.values_in(&data.columns)));
    grid
}

async fn seeded(previous: &Dataset) -> (SheetSyncClient, MemorySheets) {
    let memory = MemorySheets::new();
    memory.add_sheet(SHEET, grid_of(previous)).await;
    (SheetSyncClient::memory(memory.clone()), memory)
}

fn gear(id: i32, name: &str, hp: Option<i32>) -> Row {
    Row::new().with("gear_id", id).with("name", name).with("hp", hp)
}

#[tokio::test]
async fn scenario_update_and_append_lands_in_sheet() {
    let previous = Dataset::new(header(), vec![gear(1, "A", Some(10)), gear(2, "B", None)]);
    let next = Dataset::new(header(), vec![gear(2, "B", Some(3)), gear(3, "C", Some(1))]);
    let (client, memory) = seeded(&previous).await;

    let ops = client.sync(SHEET, &next, "gear_id").await.expect("sync");
    assert_eq!(
        ops,
        vec![
            Operation::UpdateCell {
                row: 1,
                column: "hp".to_owned(),
                value: CellValue::from(3),
            },
            Operation::AppendRow {
                columns: header(),
                values: vec![CellValue::from(3), CellValue::from("C"), CellValue::from(1)],
            },
        ]
    );
    assert_eq!(memory.batch_calls().await, 1);

    let after = client.read_all(SHEET).await.expect("read");
    assert_eq!(
        after.rows,
        vec![gear(1, "A", Some(10)), gear(2, "B", Some(3)), gear(3, "C", Some(1))]
    );

    // A second pass has nothing left to do and makes no call.
    let again = client.sync(SHEET, &next, "gear_id").await.expect("sync");
    assert!(again.is_empty());
    assert_eq!(memory.batch_calls().await, 1);
}

#[tokio::test]
async fn update_to_unknown_column_is_rejected_before_any_write() {
    let previous = Dataset::new(header(), vec![gear(1, "A", None)]);
    let (client, memory) = seeded(&previous).await;
    let ops = [Operation::UpdateCell {
        row: 0,
        column: "missing".to_owned(),
        value: CellValue::from(1),
    }];
    let result = client.apply(SHEET, &ops).await;
    assert!(matches!(
        result,
        Err(armada_sync::SyncError::UnknownColumn { .. })
    ));
    assert_eq!(memory.batch_calls().await, 0);
}

#[tokio::test]
async fn appended_row_lands_under_its_headers_whatever_the_schema_order() {
    let memory = MemorySheets::new();
    memory
        .add_sheet(SHEET, vec![vec![CellValue::from("id"), CellValue::from("hp")]])
        .await;
    let client = SheetSyncClient::memory(memory.clone());

    // The schema lists the identity column last; the sheet lists it first.
    let differ = RowDiffer::new(ColumnSchema::new("id", vec!["hp".to_owned()]));
    let row = Row::new().with("id", 2).with("hp", 5);
    let ops = differ.diff(&[], std::slice::from_ref(&row));
    client.apply(SHEET, &ops).await.expect("apply");

    let after = client.read_all(SHEET).await.expect("read");
    assert_eq!(after.rows, vec![row]);
    assert_eq!(
        memory.grid(SHEET).await.expect("sheet")[1],
        vec![CellValue::from(2), CellValue::from(5)]
    );
}

#[tokio::test]
async fn sync_into_sheet_without_header_writes_one() {
    let memory = MemorySheets::new();
    memory.add_sheet(SHEET, Vec::new()).await;
    let client = SheetSyncClient::memory(memory.clone());
    let next = Dataset::new(
        vec!["id".to_owned(), "hp".to_owned()],
        vec![
            Row::new().with("id", 1).with("hp", 10),
            Row::new().with("id", 2).with("hp", 5),
        ],
    );

    let ops = client.sync(SHEET, &next, "id").await.expect("sync");
    assert_eq!(ops.len(), 2);
    assert_eq!(memory.batch_calls().await, 1);

    let after = client.read_all(SHEET).await.expect("read");
    assert_eq!(after, next);

    let again = client.sync(SHEET, &next, "id").await.expect("resync");
    assert!(again.is_empty());
    assert_eq!(memory.batch_calls().await, 1);
}

// ---------------------------------------------------------------------------
// Diff-then-apply law
// ---------------------------------------------------------------------------

fn cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        Just(CellValue::Empty),
        any::<bool>().prop_map(CellValue::Bool),
        (-1000i32..1000).prop_map(|n| CellValue::Number(f64::from(n) / 4.0)),
        "[a-z]{1,5}".prop_map(CellValue::from),
    ]
}

fn records() -> impl Strategy<Value = BTreeMap<i32, (CellValue, CellValue)>> {
    prop::collection::btree_map(0i32..30, (cell(), cell()), 0..12)
}

fn dataset(records: &BTreeMap<i32, (CellValue, CellValue)>) -> Dataset {
    let rows = records
        .iter()
        .map(|(id, (name, hp))| {
            Row::new()
                .with("gear_id", *id)
                .with("name", name.clone())
                .with("hp", hp.clone())
        })
        .collect();
    Dataset::new(header(), rows)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn applying_diff_yields_next_on_shared_rows_plus_appends(a in records(), b in records()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let previous = dataset(&a);
        let next = dataset(&b);

        let (after, leftover) = runtime.block_on(async {
            let (client, _) = seeded(&previous).await;
            client.sync(SHEET, &next, "gear_id").await.expect("sync");
            let after = client.read_all(SHEET).await.expect("read");
            let leftover = client.sync(SHEET, &next, "gear_id").await.expect("resync");
            (after, leftover)
        });

        let next_by_id: BTreeMap<i32, &Row> = b.keys().copied().zip(next.rows.iter()).collect();
        let mut expected: Vec<Row> = a
            .keys()
            .zip(previous.rows.iter())
            .map(|(id, row)| next_by_id.get(id).map_or_else(|| row.clone(), |&r| r.clone()))
            .collect();
        expected.extend(
            b.keys()
                .zip(next.rows.iter())
                .filter(|(id, _)| !a.contains_key(id))
                .map(|(_, row)| row.clone()),
        );
        prop_assert_eq!(&after.rows, &expected);
        prop_assert!(leftover.is_empty());
        prop_assert!(diff(&after, &next, "gear_id").is_empty());
    }
}
