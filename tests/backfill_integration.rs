//! End-to-end backfill against a temporary SQLite warehouse and a mocked
//! app-data endpoint.

use std::time::Duration;

use app_data_backfill::{
    models::NO_APP_DATA_HASH, AppDataApiClient, Pipeline, PipelineOptions, SqliteWarehouse,
    WarehouseTables,
};
use httpmock::prelude::*;
use rusqlite::{params, Connection};
use tempfile::NamedTempFile;

const HASH_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const HASH_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

fn trade(hash: &str) -> String {
    format!(
        "0x6b175474e89094c44da98b954eedeac495271d0f,0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2,\
         0x0000000000000000000000000000000000000000,1000,1,1700000000,{},0,0,1000,0x",
        hash
    )
}

fn seed_warehouse(path: &str) {
    let conn = Connection::open(path).expect("open warehouse");
    conn.execute_batch(
        "CREATE TABLE settlement_calls (
             call_block_number INTEGER NOT NULL,
             call_success INTEGER NOT NULL,
             trades TEXT NOT NULL
         );",
    )
    .expect("create settlement_calls");

    let rows: Vec<(i64, bool, Vec<String>)> = vec![
        (18_000_100, true, vec![trade(HASH_A), trade(NO_APP_DATA_HASH)]),
        (18_000_050, true, vec![trade(HASH_A), trade(HASH_B)]),
        (18_000_010, false, vec![trade(HASH_B)]),
        (18_000_200, true, vec!["truncated,trade".to_string()]),
    ];
    for (block, success, trades) in rows {
        conn.execute(
            "INSERT INTO settlement_calls (call_block_number, call_success, trades) VALUES (?1, ?2, ?3)",
            params![block, success as i64, serde_json::to_string(&trades).unwrap()],
        )
        .expect("insert settlement call");
    }
}

fn envelope(inner: serde_json::Value) -> String {
    serde_json::json!({ "fullAppData": inner.to_string() }).to_string()
}

#[tokio::test]
async fn backfill_loads_resolved_hashes() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_str().unwrap();
    seed_warehouse(path);

    let inner_a = serde_json::json!({
        "appCode": "CoW Swap",
        "environment": "production",
        "metadata": {
            "orderClass": {"orderClass": "limit", "version": "0.1.0"},
            "quote": {"slippageBips": 50, "version": "0.2.0"},
            "utm": {"utmSource": "cowmunity", "utmMedium": "web", "version": "0.2.0"}
        },
        "version": "1.1.0"
    });

    let server = MockServer::start_async().await;
    let found = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/app_data/{}", HASH_A));
            then.status(200).body(envelope(inner_a.clone()));
        })
        .await;
    let missing = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/app_data/{}", HASH_B));
            then.status(404);
        })
        .await;

    let warehouse = SqliteWarehouse::open(path, WarehouseTables::default()).unwrap();
    let source =
        AppDataApiClient::new(&server.url("/app_data"), Duration::from_secs(5)).unwrap();
    let options = PipelineOptions {
        success_only: false,
        reset_table: true,
    };

    let pipeline = Pipeline::new(warehouse, source, options);
    let summary = pipeline.run().await.unwrap();

    found.assert_async().await;
    missing.assert_async().await;

    assert_eq!(summary.settlement_rows, 4);
    assert_eq!(summary.observations, 5);
    assert_eq!(summary.sentinel_skipped, 1);
    assert_eq!(summary.distinct_hashes, 2);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.failures.status, 1);

    let rows = pipeline.warehouse().load_app_data().unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.app_hash, HASH_A);
    assert_eq!(row.first_seen_block, 18_000_050);
    assert_eq!(row.content.app_code, "CoW Swap");
    assert_eq!(row.content.environment, "production");
    assert_eq!(row.content.version.as_deref(), Some("1.1.0"));

    let metadata = &row.content.metadata;
    assert_eq!(
        metadata.order_class.as_ref().unwrap().order_class.as_deref(),
        Some("limit")
    );
    assert_eq!(
        metadata.quote.as_ref().unwrap().slippage_bips.as_deref(),
        Some("50")
    );
    assert_eq!(
        metadata.utm.as_ref().unwrap().utm_source.as_deref(),
        Some("cowmunity")
    );
    assert!(metadata.referrer.is_none());
}

#[tokio::test]
async fn success_only_uses_earliest_successful_call() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_str().unwrap();
    seed_warehouse(path);

    let body = envelope(serde_json::json!({"appCode": "app", "environment": "barn"}));
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/app_data/0x");
            then.status(200).body(body.clone());
        })
        .await;

    let warehouse = SqliteWarehouse::open(path, WarehouseTables::default()).unwrap();
    let source =
        AppDataApiClient::new(&server.url("/app_data"), Duration::from_secs(5)).unwrap();
    let options = PipelineOptions {
        success_only: true,
        reset_table: true,
    };

    let pipeline = Pipeline::new(warehouse, source, options);
    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.settlement_rows, 3);
    assert_eq!(summary.inserted, 2);

    let rows = pipeline.warehouse().load_app_data().unwrap();
    let blocks: Vec<(&str, u64)> = rows
        .iter()
        .map(|r| (r.app_hash.as_str(), r.first_seen_block))
        .collect();
    // The failed call at 18_000_010 is ignored, so HASH_B's first sighting is 18_000_050.
    assert_eq!(blocks, vec![(HASH_A, 18_000_050), (HASH_B, 18_000_050)]);
}

#[tokio::test]
async fn rerun_without_reset_duplicates_rows() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_str().unwrap();
    seed_warehouse(path);

    let body = envelope(serde_json::json!({"appCode": "app"}));
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).body(body.clone());
        })
        .await;

    let run = |reset_table: bool| {
        let warehouse = SqliteWarehouse::open(path, WarehouseTables::default()).unwrap();
        let source =
            AppDataApiClient::new(&server.url("/app_data"), Duration::from_secs(5)).unwrap();
        Pipeline::new(
            warehouse,
            source,
            PipelineOptions {
                success_only: false,
                reset_table,
            },
        )
    };

    run(true).run().await.unwrap();
    let second = run(false);
    second.run().await.unwrap();
    assert_eq!(second.warehouse().count_app_data().unwrap(), 4);

    let third = run(true);
    third.run().await.unwrap();
    assert_eq!(third.warehouse().count_app_data().unwrap(), 2);
}
