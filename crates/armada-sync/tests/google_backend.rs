//! The Google backend against a local fake of the Sheets v4 API.

// Tests panic on failure by design.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use armada_sync::{Operation, SheetSyncClient, SheetsConfig, SyncError};
use armada_types::{CellValue, Dataset, Row};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

const SPREADSHEET: &str = "sheet-123";
const NO_SHEETS: &str = "sheet-without-tabs";

// ---------------------------------------------------------------------------
// Fake server
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Fake {
    bearer: Mutex<Vec<String>>,
    batches: Mutex<Vec<Value>>,
    appends: Mutex<Vec<(String, Value)>>,
    token_fetches: AtomicUsize,
}

impl Fake {
    async fn record_bearer(&self, headers: &HeaderMap) {
        let value = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        self.bearer.lock().await.push(value);
    }
}

type Shared = State<Arc<Fake>>;
type Reply = Result<Json<Value>, (StatusCode, String)>;

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Requested entity was not found.".to_owned())
}

async fn metadata(State(fake): Shared, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    fake.record_bearer(&headers).await;
    if id == NO_SHEETS {
        return Ok(Json(json!({ "spreadsheetId": NO_SHEETS })));
    }
    if id != SPREADSHEET {
        return Err(not_found());
    }
    Ok(Json(json!({
        "sheets": [
            { "properties": { "sheetId": 0, "title": "管理" } },
            { "properties": { "sheetId": 7, "title": "艦娘" } },
        ]
    })))
}

async fn batch_update(
    State(fake): Shared,
    headers: HeaderMap,
    Path(target): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    fake.record_bearer(&headers).await;
    if target != format!("{SPREADSHEET}:batchUpdate") {
        return Err(not_found());
    }
    fake.batches.lock().await.push(body);
    Ok(Json(json!({ "spreadsheetId": SPREADSHEET, "replies": [] })))
}

async fn values(
    State(fake): Shared,
    headers: HeaderMap,
    Path((_, range)): Path<(String, String)>,
) -> Reply {
    fake.record_bearer(&headers).await;
    match range.as_str() {
        "'艦娘'" => Ok(Json(json!({
            "range": "'艦娘'!A1:C3",
            "majorDimension": "ROWS",
            "values": [
                ["ship_id", "name", "hp"],
                [1, "睦月", 13],
                [2, "如月"],
            ]
        }))),
        "'管理'" => Ok(Json(json!({ "range": "'管理'!A1:Z1000", "majorDimension": "ROWS" }))),
        _ => Err(not_found()),
    }
}

async fn append(
    State(fake): Shared,
    headers: HeaderMap,
    Path((_, range)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Reply {
    fake.record_bearer(&headers).await;
    fake.appends.lock().await.push((range, body));
    Ok(Json(json!({ "spreadsheetId": SPREADSHEET })))
}

async fn token(State(fake): Shared, headers: HeaderMap) -> Reply {
    if headers.get("metadata-flavor").and_then(|v| v.to_str().ok()) != Some("Google") {
        return Err((StatusCode::FORBIDDEN, "missing Metadata-Flavor".to_owned()));
    }
    fake.token_fetches.fetch_add(1, Ordering::SeqCst);
    Ok(Json(json!({
        "access_token": "meta-token",
        "expires_in": 3599,
        "token_type": "Bearer",
    })))
}

async fn serve() -> (SocketAddr, Arc<Fake>) {
    let fake = Arc::new(Fake::default());
    let app = Router::new()
        .route("/v4/spreadsheets/{target}", get(metadata).post(batch_update))
        .route("/v4/spreadsheets/{id}/values/{range}", get(values).post(append))
        .route(
            "/computeMetadata/v1/instance/service-accounts/default/token",
            get(token),
        )
        .with_state(Arc::clone(&fake));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move { axum::serve(listener, app).await });
    (addr, fake)
}

fn config(addr: SocketAddr, access_token: Option<&str>) -> SheetsConfig {
    SheetsConfig {
        spreadsheet_id: SPREADSHEET.to_owned(),
        api_url: format!("http://{addr}/v4"),
        access_token: access_token.map(ToOwned::to_owned),
        metadata_url: format!("http://{addr}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn read_all_parses_unformatted_values() {
    let (addr, fake) = serve().await;
    let client = SheetSyncClient::google(&config(addr, Some("static-token")));

    let data = client.read_all("艦娘").await.expect("read");
    assert_eq!(data.columns, vec!["ship_id", "name", "hp"]);
    assert_eq!(
        data.rows,
        vec![
            Row::new().with("ship_id", 1).with("name", "睦月").with("hp", 13),
            Row::new().with("ship_id", 2).with("name", "如月"),
        ]
    );
    assert_eq!(*fake.bearer.lock().await, vec!["Bearer static-token"]);
}

#[tokio::test]
async fn sync_posts_one_batch_with_offset_rows() {
    let (addr, fake) = serve().await;
    let client = SheetSyncClient::google(&config(addr, Some("static-token")));
    let next = Dataset::new(
        vec!["ship_id".to_owned(), "name".to_owned(), "hp".to_owned()],
        vec![
            Row::new().with("ship_id", 2).with("name", "如月").with("hp", 13),
            Row::new().with("ship_id", 3).with("name", "弥生").with("hp", 13),
        ],
    );

    let ops = client.sync("艦娘", &next, "ship_id").await.expect("sync");
    assert_eq!(ops.len(), 2);

    let batches = fake.batches.lock().await;
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0],
        json!({
            "requests": [
                {
                    "updateCells": {
                        "start": { "sheetId": 7, "rowIndex": 2, "columnIndex": 2 },
                        "rows": [{ "values": [{ "userEnteredValue": { "numberValue": 13.0 } }] }],
                        "fields": "userEnteredValue",
                    }
                },
                {
                    "appendCells": {
                        "sheetId": 7,
                        "rows": [{ "values": [
                            { "userEnteredValue": { "numberValue": 3.0 } },
                            { "userEnteredValue": { "stringValue": "弥生" } },
                            { "userEnteredValue": { "numberValue": 13.0 } },
                        ] }],
                        "fields": "userEnteredValue",
                    }
                }
            ]
        })
    );
}

#[tokio::test]
async fn sync_into_empty_sheet_writes_header_first() {
    let (addr, fake) = serve().await;
    let client = SheetSyncClient::google(&config(addr, Some("static-token")));
    let next = Dataset::new(
        vec!["name".to_owned()],
        vec![Row::new().with("id", 1).with("name", "A")],
    );

    client.sync("管理", &next, "id").await.expect("sync");

    let batches = fake.batches.lock().await;
    assert_eq!(
        *batches,
        vec![json!({
            "requests": [
                {
                    "updateCells": {
                        "start": { "sheetId": 0, "rowIndex": 0, "columnIndex": 0 },
                        "rows": [{ "values": [
                            { "userEnteredValue": { "stringValue": "name" } },
                            { "userEnteredValue": { "stringValue": "id" } },
                        ] }],
                        "fields": "userEnteredValue",
                    }
                },
                {
                    "appendCells": {
                        "sheetId": 0,
                        "rows": [{ "values": [
                            { "userEnteredValue": { "stringValue": "A" } },
                            { "userEnteredValue": { "numberValue": 1.0 } },
                        ] }],
                        "fields": "userEnteredValue",
                    }
                }
            ]
        })]
    );
}

#[tokio::test]
async fn append_row_targets_quoted_range() {
    let (addr, fake) = serve().await;
    let client = SheetSyncClient::google(&config(addr, Some("static-token")));
    let row = [CellValue::from("2026/10/19 9:00:00"), CellValue::from("Start: update_data")];

    client.append_row("管理", &row).await.expect("append");

    let appends = fake.appends.lock().await;
    assert_eq!(
        *appends,
        vec![(
            "'管理':append".to_owned(),
            json!({ "values": [["2026/10/19 9:00:00", "Start: update_data"]] })
        )]
    );
}

#[tokio::test]
async fn metadata_token_is_fetched_once() {
    let (addr, fake) = serve().await;
    let client = SheetSyncClient::google(&config(addr, None));

    client.read_all("艦娘").await.expect("read");
    client.read_all("管理").await.expect("read");
    let op = Operation::AppendRow {
        columns: vec!["ship_id".to_owned()],
        values: vec![CellValue::from(9)],
    };
    client.apply("艦娘", &[op]).await.expect("apply");

    assert_eq!(fake.token_fetches.load(Ordering::SeqCst), 1);
    let bearer = fake.bearer.lock().await;
    assert_eq!(bearer.len(), 4);
    assert!(bearer.iter().all(|b| b == "Bearer meta-token"));
}

#[tokio::test]
async fn error_status_carries_body() {
    let (addr, _) = serve().await;
    let client = SheetSyncClient::google(&config(addr, Some("static-token")));

    let result = client.read_all("存在しない").await;
    assert!(matches!(
        result,
        Err(SyncError::Status { status: 404, ref body }) if body.contains("not found")
    ));
}

#[tokio::test]
async fn missing_worksheet_is_unknown_sheet() {
    let (addr, fake) = serve().await;
    let client = SheetSyncClient::google(&config(addr, Some("static-token")));
    let op = Operation::AppendRow {
        columns: vec!["gear_id".to_owned()],
        values: vec![CellValue::from(1)],
    };

    let result = client.apply("装備", &[op]).await;
    assert!(matches!(result, Err(SyncError::UnknownSheet(ref t)) if t == "装備"));
    assert!(fake.batches.lock().await.is_empty());
}

#[tokio::test]
async fn metadata_without_sheets_is_malformed() {
    let (addr, fake) = serve().await;
    let mut config = config(addr, Some("static-token"));
    config.spreadsheet_id = NO_SHEETS.to_owned();
    let client = SheetSyncClient::google(&config);
    let op = Operation::UpdateCell {
        row: 0,
        column: "hp".to_owned(),
        value: CellValue::from(1),
    };

    let result = client.apply("艦娘", &[op]).await;
    assert!(matches!(result, Err(SyncError::MalformedResponse(ref m)) if m.contains(NO_SHEETS)));
    assert!(fake.batches.lock().await.is_empty());
}
