use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use rust_decimal::Decimal;
use serde_json::Value;
use starbags_cli::commands::inventory::{self, InventoryCommand};
use starbags_cli::commands::order::{self, OrderCommand};
use starbags_cli::commands::payment::{self, PaymentCommand};
use starbags_cli::commands::quotation::{self, QuotationCommand};
use starbags_cli::commands::{doctor, migrate, seed};
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[("STARBAGS_STORAGE_URL", &database_url(dir.path()))], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_invalid_env_value() {
    with_env(&[("STARBAGS_STORAGE_TIMEOUT_SECS", "soon")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[("STARBAGS_STORAGE_URL", &database_url(dir.path()))], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "first seed should succeed: {}", first.output);
        let first = parse_payload(&first.output);
        assert_eq!(first["data"]["added"], 7);
        assert_eq!(first["data"]["skipped"], 0);

        let second = parse_payload(&seed::run().output);
        assert_eq!(second["status"], "ok");
        assert_eq!(second["data"]["added"], 0);
        assert_eq!(second["data"]["skipped"], 7);

        let stats = payment::run(PaymentCommand::Stats);
        assert_eq!(stats.exit_code, 0);
        let stats = parse_payload(&stats.output);
        assert_eq!(decimal(&stats["data"]["totalRevenue"]), Decimal::from(7_550));
        assert_eq!(stats["data"]["failed"], 1);
    });
}

#[test]
fn payment_history_filters_by_status() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[("STARBAGS_STORAGE_URL", &database_url(dir.path()))], || {
        assert_eq!(seed::run().exit_code, 0);

        let result = payment::run(PaymentCommand::List {
            search: None,
            status: Some("pending".to_string()),
            from: None,
            to: None,
        });
        let payload = parse_payload(&result.output);
        let payments = payload["data"].as_array().expect("payment list");
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0]["id"], "PAY-002");

        let bad_date = payment::run(PaymentCommand::List {
            search: None,
            status: None,
            from: Some("02/01/2026".to_string()),
            to: None,
        });
        assert_eq!(bad_date.exit_code, 8);
        assert_eq!(parse_payload(&bad_date.output)["error_class"], "input_parse");
    });
}

#[test]
fn quotation_lifecycle_runs_end_to_end_through_commands() {
    let dir = TempDir::new().expect("temp dir");
    let request = dir.path().join("request.json");
    fs::write(
        &request,
        r#"{
            "companyName": "Star Retail",
            "contactPerson": "Ana",
            "email": "ana@star.example",
            "userId": "u1",
            "items": [
                { "productId": "1", "quantity": 2, "unitPrice": "100", "discount": "10" }
            ]
        }"#,
    )
    .expect("write request");
    let patch = dir.path().join("patch.json");
    fs::write(&patch, r#"{ "companyName": "Too Late Ltd" }"#).expect("write patch");

    with_env(&[("STARBAGS_STORAGE_URL", &database_url(dir.path()))], || {
        let created = quotation::run(QuotationCommand::Create { file: request.clone() });
        assert_eq!(created.exit_code, 0, "create should succeed: {}", created.output);
        let created = parse_payload(&created.output);
        assert_eq!(created["data"]["id"], "QT-001");
        assert_eq!(created["data"]["status"], "draft");
        assert_eq!(decimal(&created["data"]["totalAmount"]), Decimal::from(180));

        let approved = quotation::run(QuotationCommand::Approve { id: "QT-001".to_string() });
        assert_eq!(approved.exit_code, 0);
        assert_eq!(parse_payload(&approved.output)["data"]["status"], "approved");

        let locked = quotation::run(QuotationCommand::Update {
            id: "QT-001".to_string(),
            file: patch.clone(),
        });
        assert_eq!(locked.exit_code, 6);
        assert_eq!(parse_payload(&locked.output)["error_class"], "locked");

        let converted = quotation::run(QuotationCommand::Convert { id: "QT-001".to_string() });
        assert_eq!(converted.exit_code, 0, "convert should succeed: {}", converted.output);
        let order = parse_payload(&converted.output);
        assert_eq!(order["data"]["id"], "ORD-001");
        assert_eq!(order["data"]["status"], "Processing");
        assert_eq!(order["data"]["quotationId"], "QT-001");
        assert_eq!(decimal(&order["data"]["total"]), Decimal::from(180));

        let shown = parse_payload(&quotation::run(QuotationCommand::Show { id: "QT-001".to_string() }).output);
        assert_eq!(shown["data"]["status"], "converted");
        assert_eq!(shown["data"]["convertedOrderId"], "ORD-001");

        let again = quotation::run(QuotationCommand::Convert { id: "QT-001".to_string() });
        assert_eq!(again.exit_code, 6);
        assert_eq!(parse_payload(&again.output)["error_class"], "invalid_transition");

        let shipped = order::run(OrderCommand::Status {
            id: "ORD-001".to_string(),
            status: "shipped".to_string(),
        });
        assert_eq!(shipped.exit_code, 0);
        assert_eq!(parse_payload(&shipped.output)["data"]["status"], "Shipped");

        let orders = parse_payload(&order::run(OrderCommand::List).output);
        assert_eq!(orders["data"].as_array().map(Vec::len), Some(1));
    });
}

#[test]
fn deleting_a_draft_quotation_is_refused() {
    let dir = TempDir::new().expect("temp dir");
    let request = dir.path().join("request.json");
    fs::write(&request, r#"{ "companyName": "Globe", "items": [{ "productId": "6", "quantity": 1 }] }"#)
        .expect("write request");

    with_env(&[("STARBAGS_STORAGE_URL", &database_url(dir.path()))], || {
        assert_eq!(quotation::run(QuotationCommand::Create { file: request.clone() }).exit_code, 0);

        let result = quotation::run(QuotationCommand::Delete { id: "QT-001".to_string() });
        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_transition");

        let rejected = quotation::run(QuotationCommand::Reject {
            id: "QT-001".to_string(),
            reason: Some("over budget".to_string()),
        });
        assert_eq!(parse_payload(&rejected.output)["data"]["rejectionReason"], "over budget");
        assert_eq!(quotation::run(QuotationCommand::Delete { id: "QT-001".to_string() }).exit_code, 0);

        let stats = parse_payload(&quotation::run(QuotationCommand::Stats).output);
        assert_eq!(stats["data"]["total"], 0);
    });
}

#[test]
fn malformed_request_file_is_an_input_failure() {
    let dir = TempDir::new().expect("temp dir");
    let request = dir.path().join("broken.json");
    fs::write(&request, "{ not json").expect("write request");

    with_env(&[("STARBAGS_STORAGE_URL", &database_url(dir.path()))], || {
        let result = quotation::run(QuotationCommand::Create { file: request.clone() });
        assert_eq!(result.exit_code, 8);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quotation.create");
        assert_eq!(payload["error_class"], "input_parse");
    });
}

#[test]
fn unknown_order_status_is_an_input_failure() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[("STARBAGS_STORAGE_URL", &database_url(dir.path()))], || {
        let result = order::run(OrderCommand::Status {
            id: "ORD-001".to_string(),
            status: "lost".to_string(),
        });
        assert_eq!(result.exit_code, 8);
        assert_eq!(parse_payload(&result.output)["error_class"], "input_parse");
    });
}

#[test]
fn inventory_list_reports_network_failure_when_service_is_down() {
    let dir = TempDir::new().expect("temp dir");
    with_env(
        &[
            ("STARBAGS_STORAGE_URL", &database_url(dir.path())),
            ("STARBAGS_INVENTORY_BASE_URL", "http://127.0.0.1:9"),
            ("STARBAGS_INVENTORY_TIMEOUT_SECS", "2"),
        ],
        || {
            let result = inventory::run(InventoryCommand::List);
            assert_eq!(result.exit_code, 7, "expected network failure: {}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "inventory.list");
            assert_eq!(payload["error_class"], "network");
        },
    );
}

#[test]
fn doctor_reports_storage_pass_and_inventory_fail() {
    let dir = TempDir::new().expect("temp dir");
    with_env(
        &[
            ("STARBAGS_STORAGE_URL", &database_url(dir.path())),
            ("STARBAGS_INVENTORY_BASE_URL", "http://127.0.0.1:9"),
            ("STARBAGS_INVENTORY_TIMEOUT_SECS", "2"),
        ],
        || {
            let report = parse_payload(&doctor::run(true));
            assert_eq!(report["overall_status"], "fail");

            let checks = report["checks"].as_array().expect("doctor checks");
            let status_of = |name: &str| {
                checks
                    .iter()
                    .find(|check| check["name"] == name)
                    .map(|check| check["status"].clone())
                    .unwrap_or(Value::Null)
            };
            assert_eq!(status_of("config_validation"), "pass");
            assert_eq!(status_of("storage_connectivity"), "pass");
            assert_eq!(status_of("inventory_reachability"), "fail");
        },
    );
}

fn database_url(dir: &Path) -> String {
    format!("sqlite://{}", dir.join("starbags.db").display())
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(raw) => raw.parse().expect("decimal string"),
        other => other.to_string().parse().expect("decimal number"),
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "STARBAGS_STORAGE_URL",
        "STARBAGS_STORAGE_MAX_CONNECTIONS",
        "STARBAGS_STORAGE_TIMEOUT_SECS",
        "STARBAGS_INVENTORY_BASE_URL",
        "STARBAGS_INVENTORY_TIMEOUT_SECS",
        "STARBAGS_LOGGING_LEVEL",
        "STARBAGS_LOGGING_FORMAT",
        "STARBAGS_LOG_LEVEL",
        "STARBAGS_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
