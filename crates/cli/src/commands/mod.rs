pub mod config;
pub mod doctor;
pub mod inventory;
pub mod migrate;
pub mod order;
pub mod payment;
pub mod quotation;
pub mod seed;

use std::future::Future;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use starbags_core::config::{AppConfig, LoadOptions};
use starbags_core::ApplicationError;
use starbags_stores::{Application, BootstrapError, StoreError};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Error class, message and exit code of a failed command.
pub type Failure = (&'static str, String, u8);

/// Message plus optional JSON payload of a successful command.
pub type Outcome = Result<(String, Option<Value>), Failure>;

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(command: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads config, boots the store graph on a current-thread runtime and hands it to `work`.
/// `work` returns a message plus an optional JSON payload.
pub(crate) fn execute<F, Fut>(command: &str, work: F) -> CommandResult
where
    F: FnOnce(Application) -> Fut,
    Fut: Future<Output = Outcome>,
{
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let app = Application::bootstrap(config).await.map_err(bootstrap_failure)?;
        let outcome = work(app.clone()).await;
        app.shutdown().await;
        outcome
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data(command, message, data),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(command, error_class, message, exit_code)
        }
    }
}

pub(crate) fn bootstrap_failure(error: BootstrapError) -> Failure {
    match error {
        BootstrapError::DatabaseConnect(source) => ("db_connectivity", source.to_string(), 4),
        BootstrapError::Migration(source) => ("migration", source.to_string(), 5),
        BootstrapError::InventoryClient(source) => ("runtime_init", source.to_string(), 3),
        BootstrapError::Hydration(source) => store_failure(source),
    }
}

pub(crate) fn store_failure(error: StoreError) -> Failure {
    let error = ApplicationError::from(error);
    let exit_code = match &error {
        ApplicationError::Domain(_) => 6,
        ApplicationError::Persistence(_) => 4,
        ApplicationError::Network(_) => 7,
        ApplicationError::Configuration(_) => 2,
    };
    let error_class = error.error_class();
    let interface = error.into_interface("cli");
    (error_class, format!("{} ({})", interface.message(), interface.user_message()), exit_code)
}

pub(crate) fn input_failure(message: impl Into<String>) -> Failure {
    ("input_parse", message.into(), 8)
}

pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, Failure> {
    let raw = std::fs::read_to_string(path)
        .map_err(|error| input_failure(format!("could not read `{}`: {error}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|error| input_failure(format!("could not parse `{}`: {error}", path.display())))
}

pub(crate) fn to_data<T: Serialize>(value: &T) -> Result<Option<Value>, Failure> {
    serde_json::to_value(value)
        .map(Some)
        .map_err(|error| ("serialization", format!("failed to encode result: {error}"), 3))
}
