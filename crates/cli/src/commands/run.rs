use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use common::config::ErrorStrategy;
use common::types::ConnectorKind;
use converter::SchemaCache;
use destination::PostgresSession;
use engine::worker::{OlrWorker, WorkerContext};
use engine::{Admin, Applier, OlrOffsetStore};
use olr::{BasicOracleParser, OlrClient, TcpTransport};
use rules::RuleStore;

/// Run one connector worker in the foreground until it stops. With the
/// `retry` error strategy the worker is respawned after a fixed delay.
pub fn run_connector(admin: Admin, name: &str, snapshot_mode: &str) -> Result<(), Box<dyn Error>> {
    let plan = admin.prepare_start(name, Some(snapshot_mode))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        loop {
            match run_once(&admin, &plan).await {
                Ok(()) => return Ok(()),
                Err(e) if admin.settings().error_strategy == ErrorStrategy::Retry => {
                    warn!("worker failed ({e}), respawning after backoff");
                    tokio::time::sleep(Duration::from_millis(admin.settings().retry_delay_ms))
                        .await;
                }
                Err(e) => return Err(e),
            }
        }
    })?;
    Ok(())
}

async fn run_once(admin: &Admin, plan: &engine::admin::StartPlan) -> Result<(), Box<dyn Error>> {
    let conn = plan.conn.clone();
    let session = PostgresSession::connect(
        &conn.hostname,
        conn.port,
        &conn.dstdb,
        &conn.user,
        &conn.pwd,
    )
    .await?;

    let mut store = RuleStore::new(conn.kind);
    let entries = engine::admin::load_objmap(&plan.objmap_path)?;
    rules::reload_from_objmap(&mut store, &entries)?;

    let settings = admin.settings().clone();
    let ctx = WorkerContext {
        id: plan.id,
        registry: admin.registry().clone(),
        settings: settings.clone(),
        conninfo: conn.clone(),
        store,
        cache: SchemaCache::new(),
        session,
        applier: Applier::new(&conn.name, conn.kind),
        schema_sync: plan.schema_sync,
        objmap_path: plan.objmap_path.clone(),
    };

    match conn.kind {
        ConnectorKind::Olr => {
            let olr_info = conn.olr.clone().ok_or("connector has no olr section")?;
            let transport = TcpTransport::connect(&olr_info.host, olr_info.port).await?;
            let offsets = OlrOffsetStore::new(
                &settings.metadata_dir,
                &conn,
                settings.offset_flush_interval_ms,
            );
            let worker = OlrWorker {
                ctx,
                client: OlrClient::new(transport),
                parser: Arc::new(BasicOracleParser),
                offsets,
                source: olr_info.source.clone(),
            };
            info!("starting replication worker '{}'", conn.name);
            logging::timeit!("replication worker ran", { worker.run().await })?;
            Ok(())
        }
        _ => {
            // the Debezium runner lives in an external JVM bridge; this
            // binary only ships the replicator path
            Err(format!(
                "connector kind {:?} needs a configured Debezium runner bridge",
                conn.kind
            )
            .into())
        }
    }
}
