//! Tollgate - fee-collection scheduler and blob gateway for on-chain agents

use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tollgate::{
    blobs::{BlobStoreManager, MemoryPointerStore, MongoPointerStore, PointerStore},
    cache::{HashCache, HashCacheConfig},
    collector::{CoSigner, FeeCollector, FeeScheduler},
    config::Args,
    db::{
        agents::{AgentStore, MemoryAgentStore, MongoAgentStore},
        schemas::{AGENT_COLLECTION, BLOB_POINTER_COLLECTION},
        MongoClient,
    },
    keys::SponsorIdentity,
    ledger::HttpLedgerClient,
    server::{self, AppState},
    storage::{HttpObjectStore, MemoryObjectStore, ObjectStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tollgate={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Tollgate - Agent Fee Gateway");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Storage: {}", args.storage_url);
    info!("Ledger: {}", args.ledger_url);
    info!(
        "Collection: {} units every {}s (maintenance every {} cycles)",
        args.fee_amount, args.collection_interval_secs, args.maintenance_cadence
    );
    info!("======================================");

    // Connect to MongoDB (optional in dev mode)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!(
                    "MongoDB connection failed (dev mode, continuing in-memory): {}",
                    e
                );
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Decrypt the sponsor key (or generate an ephemeral one in dev mode)
    let sponsor = match SponsorIdentity::from_config(&args) {
        Ok(sponsor) => {
            info!("Sponsor key loaded ({})", sponsor.public_key_base64());
            Arc::new(sponsor)
        }
        Err(e) => {
            error!("Sponsor key error: {}", e);
            std::process::exit(1);
        }
    };

    // Hash cache shared by the blob gateway and the maintenance cycle
    let cache = Arc::new(HashCache::new(HashCacheConfig {
        ttl: args.hash_cache_ttl(),
        ..Default::default()
    }));

    // Wire up stores: MongoDB-backed in production, in-memory without it
    let (agents, pointers): (Arc<dyn AgentStore>, Arc<dyn PointerStore>) = match &mongo {
        Some(client) => {
            let agent_collection = client.collection(AGENT_COLLECTION).await?;
            let pointer_collection = client.collection(BLOB_POINTER_COLLECTION).await?;
            (
                Arc::new(MongoAgentStore::new(agent_collection)),
                Arc::new(MongoPointerStore::new(pointer_collection)),
            )
        }
        None => (
            Arc::new(MemoryAgentStore::new()),
            Arc::new(MemoryPointerStore::new()),
        ),
    };

    let store: Arc<dyn ObjectStore> = if mongo.is_some() || !args.dev_mode {
        Arc::new(HttpObjectStore::new(&args.storage_url, args.request_timeout()))
    } else {
        warn!("Dev mode without MongoDB: using in-memory object store");
        Arc::new(MemoryObjectStore::new())
    };

    let blobs = Arc::new(BlobStoreManager::new(
        store,
        pointers,
        Arc::clone(&cache),
    ));

    // Fee collector over the ledger service
    let ledger = Arc::new(HttpLedgerClient::new(
        &args.ledger_url,
        args.request_timeout(),
    ));
    let collection_address = args
        .collection_address
        .clone()
        .unwrap_or_else(|| "0xdev-collection".to_string());
    let collector = FeeCollector::new(
        agents,
        CoSigner::new(ledger, Arc::clone(&sponsor)),
        Arc::clone(&cache),
        args.fee_amount,
        collection_address,
    );

    // Start the collection schedule: first cycle immediately, then hourly
    let scheduler = Arc::new(FeeScheduler::new(
        Arc::new(collector),
        args.collection_period(),
        args.maintenance_cadence,
    ));
    Arc::clone(&scheduler).start();

    let state = Arc::new(AppState {
        args,
        started_at: Instant::now(),
        mongo,
        sponsor,
        scheduler,
        blobs,
        cache,
    });

    server::run(state).await?;

    Ok(())
}
