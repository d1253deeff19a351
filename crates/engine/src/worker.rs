use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use common::config::{BridgeSettings, ConnInfo, ErrorStrategy};
use common::types::{ConnectorStage, Op};
use converter::{
    convert_ddl, convert_dml, ExpressionSubstituter, SchemaCache, TransformEvaluator,
};
use debezium::{DebeziumRunner, Envelope, EventClass, MetadataElement};
use destination::DestinationSession;
use olr::{OlrClient, OlrEnvelope, OracleDdlParser, ResponseCode, Transport};
use rules::RuleStore;

use crate::applier::Applier;
use crate::error::EngineError;
use crate::offsets::OlrOffsetStore;
use crate::registry::SharedRegistry;
use crate::state::{ConnectorState, Request};
use crate::stats::{now_ms, BatchStatistics, StatKind};

/// Everything one connector worker owns. The pipeline inside a worker is
/// single-threaded; there is no intra-batch parallelism.
pub struct WorkerContext<S: DestinationSession> {
    pub id: usize,
    pub registry: SharedRegistry,
    pub settings: BridgeSettings,
    pub conninfo: ConnInfo,
    pub store: RuleStore,
    pub cache: SchemaCache,
    pub session: S,
    pub applier: Applier,
    pub schema_sync: bool,
    /// path of this connector's object-map file, re-read on reload
    pub objmap_path: PathBuf,
}

enum Flow {
    Continue,
    Stop,
}

impl<S: DestinationSession> WorkerContext<S> {
    fn set_state(&self, state: ConnectorState) {
        self.registry.set_state(self.id, state);
    }

    fn state(&self) -> ConnectorState {
        self.registry.state(self.id)
    }

    fn set_stage_if_changed(&self, stage: ConnectorStage) {
        if self.registry.stage(self.id) != stage {
            self.registry.set_stage(self.id, stage);
        }
    }

    fn log_bad_event(&self, raw: &str, err: &EngineError) {
        if self.settings.log_event_on_error {
            error!("bad change event: {err}\n{raw}");
        } else {
            warn!("bad change event: {err}");
        }
    }

    /// Reload the rule store from the object-map file and run any
    /// migrations the new rules require.
    async fn reload_objmap(&mut self) -> Result<(), EngineError> {
        let entries = crate::admin::load_objmap(&self.objmap_path)?;
        let migrations = rules::reload_from_objmap(&mut self.store, &entries)
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        for migration in migrations {
            info!("objmap migration: {}", migration.0);
            self.session
                .exec_utility(&migration.0)
                .await
                .map_err(|source| EngineError::Apply {
                    sql: migration.0.clone(),
                    source,
                })?;
        }
        // renames invalidate everything previously cached
        self.cache.clear();
        Ok(())
    }
}

/* ---------------- Debezium-sourced worker ---------------- */

pub struct DbzWorker<S: DestinationSession, R: DebeziumRunner> {
    pub ctx: WorkerContext<S>,
    pub runner: R,
    pub snapshot_mode: String,
}

impl<S: DestinationSession, R: DebeziumRunner> DbzWorker<S, R> {
    /// Drive the connector until stopped: poll a batch, parse, convert,
    /// apply, commit, update stats, then check the request mailbox.
    pub async fn run(mut self) -> Result<(), EngineError> {
        self.ctx.set_state(ConnectorState::Initializing);
        self.ctx.registry.set_errmsg(self.ctx.id, None);
        if let Err(e) = self
            .runner
            .start(&self.ctx.conninfo, &self.snapshot_mode)
            .await
        {
            self.ctx
                .registry
                .set_errmsg(self.ctx.id, Some("failed to start runner".to_string()));
            self.ctx.set_state(ConnectorState::Stopped);
            return Err(e.into());
        }
        self.ctx.set_state(ConnectorState::Syncing);
        info!("worker for '{}' entering main loop", self.ctx.conninfo.name);

        let mut exit_signal = false;
        let result = loop {
            if exit_signal {
                warn!("runner exit signal received, leaving main loop");
                break Ok(());
            }
            match self.handle_request().await {
                Ok(Flow::Stop) => break Ok(()),
                Ok(Flow::Continue) => {}
                Err(e) => break Err(e),
            }

            match self.ctx.state() {
                ConnectorState::Syncing => {
                    let events = match self.runner.poll_events().await {
                        Ok(events) => events,
                        Err(e) => break Err(e.into()),
                    };
                    if events.is_empty() {
                        self.ctx.set_stage_if_changed(ConnectorStage::Cdc);
                    } else if let Err(e) = self.process_batch(&events, &mut exit_signal).await {
                        match self.ctx.settings.error_strategy {
                            ErrorStrategy::Skip => {
                                warn!("batch aborted: {e}");
                                self.ctx
                                    .registry
                                    .set_errmsg(self.ctx.id, Some(e.to_string()));
                            }
                            ErrorStrategy::Exit | ErrorStrategy::Retry => break Err(e),
                        }
                    }
                }
                ConnectorState::SchemaSyncDone => {
                    // schema sync finished: park the worker so the user can
                    // review table and attribute mappings before resuming
                    if let Err(e) = self.runner.stop(self.ctx.settings.runner_stop_timeout_ms).await
                    {
                        warn!("failed to stop runner: {e}");
                    }
                    self.snapshot_mode = "initial".to_string();
                    self.ctx.schema_sync = false;
                    self.ctx.set_state(ConnectorState::Paused);
                }
                _ => {}
            }

            tokio::time::sleep(Duration::from_millis(self.ctx.settings.naptime_ms)).await;
        };

        self.teardown().await;
        result
    }

    async fn teardown(&mut self) {
        info!("worker for '{}' shutting down", self.ctx.conninfo.name);
        if let Err(e) = self.runner.stop(self.ctx.settings.runner_stop_timeout_ms).await {
            warn!("runner stop during teardown failed: {e}");
        }
        self.ctx.set_state(ConnectorState::Stopped);
    }

    async fn handle_request(&mut self) -> Result<Flow, EngineError> {
        let Some(request) = self.ctx.registry.take_request(self.ctx.id) else {
            return Ok(Flow::Continue);
        };
        let current = self.ctx.state();
        info!(
            "processing request {:?} for '{}' in state {}",
            request,
            self.ctx.conninfo.name,
            current.as_str()
        );
        match request {
            Request::Stop => return Ok(Flow::Stop),
            Request::Pause => {
                if let Err(e) = self.runner.stop(self.ctx.settings.runner_stop_timeout_ms).await {
                    warn!("failed to stop runner for pause: {e}");
                    return Ok(Flow::Continue);
                }
                self.ctx.set_state(ConnectorState::Paused);
            }
            Request::Resume => {
                self.runner
                    .start(&self.ctx.conninfo, &self.snapshot_mode)
                    .await?;
                self.ctx.set_state(ConnectorState::Syncing);
            }
            Request::SetOffset(offset) => {
                self.ctx.set_state(ConnectorState::OffsetUpdate);
                match self.runner.set_offset(&offset).await {
                    Ok(()) => self.ctx.registry.set_offset(self.ctx.id, offset),
                    Err(e) => warn!("failed to set offset: {e}"),
                }
                self.ctx.set_state(ConnectorState::Paused);
            }
            Request::Restart {
                snapshot_mode,
                conninfo,
            } => {
                self.ctx.set_state(ConnectorState::Restarting);
                if let Err(e) = self.runner.stop(self.ctx.settings.runner_stop_timeout_ms).await {
                    warn!("failed to stop runner for restart: {e}");
                    self.ctx.set_state(ConnectorState::Syncing);
                    return Ok(Flow::Continue);
                }
                self.ctx.conninfo = *conninfo;
                if snapshot_mode.eq_ignore_ascii_case("schemasync") {
                    self.snapshot_mode = "no_data".to_string();
                    self.ctx.schema_sync = true;
                } else {
                    self.snapshot_mode = snapshot_mode;
                }
                match self
                    .runner
                    .start(&self.ctx.conninfo, &self.snapshot_mode)
                    .await
                {
                    Ok(()) => self.ctx.set_state(ConnectorState::Syncing),
                    Err(e) => {
                        self.ctx.set_state(ConnectorState::Stopped);
                        return Err(e.into());
                    }
                }
            }
            Request::MemDump => {
                self.ctx.set_state(ConnectorState::MemDump);
                match self.runner.memory_dump().await {
                    Ok(report) => info!("runner memory:\n{report}"),
                    Err(e) => warn!("memory dump failed: {e}"),
                }
                self.ctx.set_state(current);
            }
            Request::ReloadObjmap => {
                self.ctx.set_state(ConnectorState::ReloadObjmap);
                if let Err(e) = self.ctx.reload_objmap().await {
                    warn!("objmap reload failed: {e}");
                }
                self.ctx.set_state(current);
            }
        }
        Ok(Flow::Continue)
    }

    /// Apply one polled batch inside a destination transaction. Element 0
    /// is the metadata marker; per-event failures are counted and the
    /// batch continues unless the error strategy says otherwise.
    async fn process_batch(
        &mut self,
        events: &[String],
        exit_signal: &mut bool,
    ) -> Result<(), EngineError> {
        let Some(meta) = MetadataElement::parse(&events[0]) else {
            warn!("unknown change request marker: {}", events[0]);
            return Ok(());
        };
        let batch_id = match meta {
            MetadataElement::Completion { message } => {
                // the runner exited; surface its last message
                *exit_signal = true;
                if let Some(message) = message {
                    self.ctx.registry.set_errmsg(self.ctx.id, Some(message));
                }
                return Ok(());
            }
            MetadataElement::BatchStart(id) => id,
        };

        eprintln!("DEBUG: before begin");
        let mut stats = BatchStatistics::default();
        self.ctx.session.begin().await?;
        eprintln!("DEBUG: after begin");
        let mut first_good = true;
        let total = events.len() - 1;
        for (i, raw) in events.iter().enumerate().skip(1) {
            let is_last = i == events.len() - 1;
            eprintln!("DEBUG: before process_event {}", i);
            match self
                .process_event(raw, &mut stats, first_good, is_last)
                .await
            {
                Ok(()) => first_good = false,
                Err(e) => {
                    eprintln!("DEBUG: process_event err {:?}", e);
                    stats.increment(StatKind::BadEvent, 1);
                    self.ctx.log_bad_event(raw, &e);
                    if self.ctx.settings.error_strategy != ErrorStrategy::Skip {
                        self.ctx.session.rollback().await?;
                        return Err(e);
                    }
                }
            }
        }
        eprintln!("DEBUG: before commit");
        self.ctx.session.commit().await?;
        eprintln!("DEBUG: after commit");
        stats.increment(StatKind::TotalEvents, total as u64);
        stats.increment(StatKind::BatchCompletion, 1);

        // let the runner advance its commit cursor; failure here only
        // means re-delivery after a restart
        if let Err(e) = self.runner.mark_batch_complete(batch_id).await {
            warn!("failed to mark batch {batch_id} complete: {e}");
        }
        self.ctx.registry.merge_stats(self.ctx.id, &stats);
        if let Ok(offset) = self.runner.offset().await {
            self.ctx.registry.set_offset(self.ctx.id, offset);
        }
        Ok(())
    }

    async fn process_event(
        &mut self,
        raw: &str,
        stats: &mut BatchStatistics,
        is_first: bool,
        is_last: bool,
    ) -> Result<(), EngineError> {
        let envelope =
            Envelope::parse(raw).map_err(|e| EngineError::Transport(e.to_string()))?;
        let class = envelope
            .classify()
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        if class == EventClass::TxBoundary {
            let (_, ts) = envelope.timestamps();
            if is_first {
                stats.mark_first(ts, ts);
            }
            if is_last {
                stats.mark_last(ts, ts);
            }
            return Ok(());
        }

        let (stage, last_snapshot) = envelope
            .stage(self.ctx.schema_sync)
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        self.ctx.set_stage_if_changed(stage);

        match class {
            EventClass::Ddl => {
                stats.increment(StatKind::Ddl, 1);
                self.ctx.set_state(ConnectorState::Parsing);
                let parsed = envelope
                    .parse_ddl()
                    .map_err(|e| EngineError::Transport(e.to_string()))?;
                let Some(ddl) = parsed else {
                    self.ctx.set_state(ConnectorState::Syncing);
                    return Err(EngineError::Transport(
                        "no table change data in ddl event".to_string(),
                    ));
                };

                self.ctx.set_state(ConnectorState::Converting);
                let converted = convert_ddl(
                    &ddl,
                    &self.ctx.store,
                    &mut self.ctx.session,
                    &mut self.ctx.cache,
                )
                .await?;
                if let Some(pgddl) = converted {
                    self.ctx.set_state(ConnectorState::Executing);
                    self.ctx
                        .applier
                        .apply_ddl(&mut self.ctx.session, &ddl, &pgddl)
                        .await?;
                }
                if is_first {
                    stats.mark_first(ddl.src_ts_ms, ddl.ts_ms);
                }
                if is_last {
                    stats.mark_last(ddl.src_ts_ms, ddl.ts_ms);
                }
                self.ctx.set_state(if last_snapshot && self.ctx.schema_sync {
                    ConnectorState::SchemaSyncDone
                } else {
                    ConnectorState::Syncing
                });
            }
            EventClass::Dml(op) => {
                stats.increment(StatKind::Dml, 1);
                stats.increment(op_stat(op), 1);
                self.ctx.set_state(ConnectorState::Parsing);
                let dml = envelope
                    .parse_dml(
                        op,
                        &self.ctx.store,
                        &mut self.ctx.cache,
                        &mut self.ctx.session,
                    )
                    .await
                    .map_err(|e| match e {
                        debezium::DbzError::Convert(c) => EngineError::Convert(c),
                        other => EngineError::Transport(other.to_string()),
                    })?;

                self.ctx.set_state(ConnectorState::Converting);
                let evaluator = ExpressionSubstituter;
                let pgdml = convert_dml(
                    &dml,
                    self.ctx.settings.dml_mode,
                    &self.ctx.store,
                    Some(&evaluator as &dyn TransformEvaluator),
                )?;

                self.ctx.set_state(ConnectorState::Executing);
                let table = self
                    .ctx
                    .cache
                    .get(&dml.schema, &dml.table)
                    .map(|e| e.table.clone());
                self.ctx
                    .applier
                    .apply_dml(&mut self.ctx.session, &pgdml, table.as_ref())
                    .await?;
                if is_first {
                    stats.mark_first(dml.src_ts_ms, dml.ts_ms);
                }
                if is_last {
                    stats.mark_last(dml.src_ts_ms, dml.ts_ms);
                }
                self.ctx.set_state(ConnectorState::Syncing);
            }
            EventClass::TxBoundary => unreachable!("handled above"),
        }
        Ok(())
    }
}

fn op_stat(op: Op) -> StatKind {
    match op {
        Op::Read => StatKind::Read,
        Op::Create => StatKind::Create,
        Op::Update => StatKind::Update,
        Op::Delete => StatKind::Delete,
    }
}

/* ---------------- OpenLogReplicator-sourced worker ---------------- */

pub struct OlrWorker<S: DestinationSession, T: Transport> {
    pub ctx: WorkerContext<S>,
    pub client: OlrClient<T>,
    pub parser: Arc<dyn OracleDdlParser>,
    pub offsets: OlrOffsetStore,
    pub source: String,
}

impl<S: DestinationSession, T: Transport> OlrWorker<S, T> {
    pub async fn run(mut self) -> Result<(), EngineError> {
        self.ctx.set_state(ConnectorState::Initializing);
        self.ctx.registry.set_errmsg(self.ctx.id, None);

        let resume = self.offsets.load()?;
        self.client
            .init_scns(self.offsets.scn(), self.offsets.c_scn(), self.offsets.c_idx());
        let code = self
            .client
            .start_or_continue(&self.source, !resume)
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        match code {
            ResponseCode::Ready
            | ResponseCode::Starting
            | ResponseCode::Replicate
            | ResponseCode::AlreadyStarted => {
                debug!("replication started with response {code:?}");
            }
            other => {
                let msg = format!("replicator refused to start: {other:?}");
                self.ctx.registry.set_errmsg(self.ctx.id, Some(msg.clone()));
                self.ctx.set_state(ConnectorState::Stopped);
                return Err(EngineError::Transport(msg));
            }
        }
        self.ctx.set_state(ConnectorState::Syncing);
        info!("worker for '{}' entering main loop", self.ctx.conninfo.name);

        let result = loop {
            match self.handle_request().await {
                Ok(Flow::Stop) => break Ok(()),
                Ok(Flow::Continue) => {}
                Err(e) => break Err(e),
            }

            if self.ctx.state() == ConnectorState::Syncing {
                let events = match self.client.read_events().await {
                    Ok(events) => events,
                    Err(e) => break Err(EngineError::Transport(e.to_string())),
                };
                if !events.is_empty() {
                    if let Err(e) = self.process_batch(&events).await {
                        match self.ctx.settings.error_strategy {
                            ErrorStrategy::Skip => {
                                warn!("batch aborted: {e}");
                                self.ctx
                                    .registry
                                    .set_errmsg(self.ctx.id, Some(e.to_string()));
                            }
                            ErrorStrategy::Exit | ErrorStrategy::Retry => break Err(e),
                        }
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(self.ctx.settings.naptime_ms)).await;
        };

        // final positions must survive the shutdown
        if let Err(e) = self.offsets.flush(true) {
            warn!("final offset flush failed: {e}");
        }
        self.ctx.set_state(ConnectorState::Stopped);
        result
    }

    async fn handle_request(&mut self) -> Result<Flow, EngineError> {
        let Some(request) = self.ctx.registry.take_request(self.ctx.id) else {
            return Ok(Flow::Continue);
        };
        let current = self.ctx.state();
        match request {
            Request::Stop => return Ok(Flow::Stop),
            Request::Pause => self.ctx.set_state(ConnectorState::Paused),
            Request::Resume => self.ctx.set_state(ConnectorState::Syncing),
            Request::SetOffset(offset) => {
                self.ctx.set_state(ConnectorState::OffsetUpdate);
                match parse_scn_triple(&offset) {
                    Some((scn, c_scn, c_idx)) => {
                        self.client.init_scns(scn, c_scn, c_idx);
                        self.offsets.advance(scn, c_scn, c_idx);
                        self.offsets.flush(true)?;
                        self.ctx.registry.set_offset(self.ctx.id, offset);
                    }
                    None => warn!("malformed scn offset '{offset}', expected scn,c_scn,c_idx"),
                }
                self.ctx.set_state(ConnectorState::Paused);
            }
            Request::Restart { conninfo, .. } => {
                self.ctx.set_state(ConnectorState::Restarting);
                self.ctx.conninfo = *conninfo;
                let code = self
                    .client
                    .start_or_continue(&self.source, false)
                    .await
                    .map_err(|e| EngineError::Transport(e.to_string()))?;
                debug!("replicator restart response {code:?}");
                self.ctx.set_state(ConnectorState::Syncing);
            }
            Request::MemDump => {
                self.ctx.set_state(ConnectorState::MemDump);
                info!(
                    "replication position: scn={} c_scn={} c_idx={}",
                    self.client.scn(),
                    self.client.c_scn(),
                    self.client.c_idx()
                );
                self.ctx.set_state(current);
            }
            Request::ReloadObjmap => {
                self.ctx.set_state(ConnectorState::ReloadObjmap);
                if let Err(e) = self.ctx.reload_objmap().await {
                    warn!("objmap reload failed: {e}");
                }
                self.ctx.set_state(current);
            }
        }
        Ok(Flow::Continue)
    }

    async fn process_batch(&mut self, events: &[String]) -> Result<(), EngineError> {
        let mut stats = BatchStatistics::default();
        let mut send_confirm = false;
        self.ctx.session.begin().await?;
        for (i, raw) in events.iter().enumerate() {
            let is_first = i == 0;
            let is_last = i == events.len() - 1;
            match self
                .process_event(raw, &mut stats, &mut send_confirm, is_first, is_last)
                .await
            {
                Ok(()) => {}
                Err(e) => {
                    stats.increment(StatKind::BadEvent, 1);
                    self.ctx.log_bad_event(raw, &e);
                    if self.ctx.settings.error_strategy != ErrorStrategy::Skip {
                        self.ctx.session.rollback().await?;
                        return Err(e);
                    }
                }
            }
        }
        self.ctx.session.commit().await?;
        stats.increment(StatKind::TotalEvents, events.len() as u64);
        stats.increment(StatKind::BatchCompletion, 1);

        // offsets advance only after the destination commit
        self.offsets
            .advance(self.client.scn(), self.client.c_scn(), self.client.c_idx());
        self.offsets.flush(false)?;
        if !self.offsets.snapshot_done()? {
            self.offsets.write_snapshot_done(true)?;
        }
        if send_confirm {
            if let Err(e) = self.client.confirm(&self.source).await {
                warn!("scn confirm failed: {e}");
            }
        }
        self.ctx.registry.merge_stats(self.ctx.id, &stats);
        self.ctx.registry.set_offset(
            self.ctx.id,
            format!(
                "scn={} c_scn={} c_idx={}",
                self.client.scn(),
                self.client.c_scn(),
                self.client.c_idx()
            ),
        );
        Ok(())
    }

    async fn process_event(
        &mut self,
        raw: &str,
        stats: &mut BatchStatistics,
        send_confirm: &mut bool,
        is_first: bool,
        is_last: bool,
    ) -> Result<(), EngineError> {
        use olr::events::OlrEventClass;

        let envelope =
            OlrEnvelope::parse(raw).map_err(|e| EngineError::Transport(e.to_string()))?;
        let class = envelope
            .classify()
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        let (scn, c_scn) = envelope
            .scns()
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        match class {
            OlrEventClass::Begin | OlrEventClass::Commit => {
                let ts = envelope.tm_ms().unwrap_or(0);
                if is_first {
                    stats.mark_first(ts, now_ms());
                }
                if is_last {
                    stats.mark_last(ts, now_ms());
                }
                self.client.set_scns(scn, c_scn, envelope.c_idx());
                *send_confirm = true;
            }
            OlrEventClass::Ddl => {
                stats.increment(StatKind::Ddl, 1);
                self.ctx.set_state(ConnectorState::Parsing);
                let parsed = envelope
                    .parse_ddl(self.parser.as_ref())
                    .map_err(|e| EngineError::Transport(e.to_string()))?;
                match parsed {
                    None => {
                        // internal Oracle DDL noise: skip, but move the
                        // stream position forward so it is not re-delivered
                        self.client.set_scns(scn, c_scn, envelope.c_idx());
                        *send_confirm = true;
                        self.ctx.set_state(ConnectorState::Syncing);
                    }
                    Some(ddl) => {
                        self.ctx.set_state(ConnectorState::Converting);
                        let converted = convert_ddl(
                            &ddl,
                            &self.ctx.store,
                            &mut self.ctx.session,
                            &mut self.ctx.cache,
                        )
                        .await?;
                        if let Some(pgddl) = converted {
                            self.ctx.set_state(ConnectorState::Executing);
                            self.ctx
                                .applier
                                .apply_ddl(&mut self.ctx.session, &ddl, &pgddl)
                                .await?;
                        }
                        self.client.set_scns(scn, c_scn, envelope.c_idx());
                        *send_confirm = true;
                        if is_first {
                            stats.mark_first(ddl.src_ts_ms, now_ms());
                        }
                        if is_last {
                            stats.mark_last(ddl.src_ts_ms, now_ms());
                        }
                        self.ctx.set_state(ConnectorState::Syncing);
                    }
                }
            }
            OlrEventClass::Dml(op) => {
                stats.increment(StatKind::Dml, 1);
                stats.increment(op_stat(op), 1);
                self.ctx.set_state(ConnectorState::Parsing);
                let dml = envelope
                    .parse_dml(
                        op,
                        &self.ctx.store,
                        &mut self.ctx.cache,
                        &mut self.ctx.session,
                    )
                    .await?;

                self.ctx.set_state(ConnectorState::Converting);
                let evaluator = ExpressionSubstituter;
                let pgdml = convert_dml(
                    &dml,
                    self.ctx.settings.dml_mode,
                    &self.ctx.store,
                    Some(&evaluator as &dyn TransformEvaluator),
                )?;

                self.ctx.set_state(ConnectorState::Executing);
                let table = self
                    .ctx
                    .cache
                    .get(&dml.schema, &dml.table)
                    .map(|e| e.table.clone());
                self.ctx
                    .applier
                    .apply_dml(&mut self.ctx.session, &pgdml, table.as_ref())
                    .await?;
                self.client.set_scns(scn, c_scn, envelope.c_idx());
                *send_confirm = true;
                if is_first {
                    stats.mark_first(dml.src_ts_ms, now_ms());
                }
                if is_last {
                    stats.mark_last(dml.src_ts_ms, now_ms());
                }
                self.ctx.set_state(ConnectorState::Syncing);
            }
        }
        Ok(())
    }
}

/// `scn,c_scn,c_idx`
fn parse_scn_triple(offset: &str) -> Option<(u64, u64, u64)> {
    let mut parts = offset.split(',').map(str::trim);
    let scn = parts.next()?.parse().ok()?;
    let c_scn = parts.next()?.parse().ok()?;
    let c_idx = parts.next().unwrap_or("0").parse().ok()?;
    Some((scn, c_scn, c_idx))
}
