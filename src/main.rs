//! Server Entry Point
//!
//! Starts a demonstration FHIR server backed by an in-memory Patient store.
//! It initializes logging, loads configuration, registers the Patient
//! provider, and serves until interrupted.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use fhirforge::{Bundle, Config, FhirError, FhirProvider, FhirResource, FhirServer, Stored};

/// A name a patient is known by.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HumanName {
    #[serde(skip_serializing_if = "Option::is_none")]
    family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    given: Vec<String>,
}

/// A minimal Patient schema for the demonstration store.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Patient {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    name: Vec<HumanName>,
}

impl FhirResource for Patient {
    const RESOURCE_TYPE: &'static str = "Patient";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

type PatientStore = Arc<RwLock<HashMap<String, Patient>>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config.logging.level);

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let store: PatientStore = Arc::new(RwLock::new(HashMap::new()));

    let mut server = FhirServer::new(config);
    server.add_provider(patient_provider(store));

    info!("Server initialized");

    server.run().await?;

    info!("Server shutting down");

    Ok(())
}

/// Build the Patient provider over the in-memory store.
fn patient_provider(store: PatientStore) -> FhirProvider {
    let mut provider = FhirProvider::new();

    let create_store = store.clone();
    provider.create::<Patient, _, _>(move |_context, mut patient| {
        let store = create_store.clone();
        async move {
            let id = uuid::Uuid::new_v4().to_string();
            patient.id = Some(id.clone());
            store.write().await.insert(id, patient.clone());
            Ok(Stored::Resource(patient))
        }
    });

    let read_store = store.clone();
    provider.read::<Patient, _, _>(move |_context, id| {
        let store = read_store.clone();
        async move {
            store
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| FhirError::not_found(Patient::RESOURCE_TYPE, &id))
        }
    });

    let search_store = store.clone();
    provider.search_type::<Patient, _, _>(&["family"], move |_context, arguments| {
        let store = search_store.clone();
        async move {
            let family = arguments.first("family").map(str::to_string);
            let mut bundle = Bundle::searchset();
            for patient in store.read().await.values() {
                let matches = family.as_deref().is_none_or(|wanted| {
                    patient
                        .name
                        .iter()
                        .any(|name| name.family.as_deref() == Some(wanted))
                });
                if matches {
                    bundle.push(patient)?;
                }
            }
            Ok(bundle)
        }
    });

    let update_store = store.clone();
    provider.update::<Patient, _, _>(move |_context, id, mut patient| {
        let store = update_store.clone();
        async move {
            let mut patients = store.write().await;
            if !patients.contains_key(&id) {
                return Err(FhirError::not_found(Patient::RESOURCE_TYPE, &id));
            }
            patient.id = Some(id.clone());
            patients.insert(id, patient.clone());
            Ok(Stored::Resource(patient))
        }
    });

    provider
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
