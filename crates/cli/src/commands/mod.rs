mod run;

use std::error::Error;

use common::config::{load_registry, BridgeSettings};
use engine::{Admin, SharedRegistry};

use crate::{parse_kind, Cli, Cmd};

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let settings = match &cli.config {
        Some(path) => load_registry(path)?.settings,
        None => BridgeSettings::default(),
    };
    let registry = SharedRegistry::new(settings.max_connectors);
    let admin = Admin::new(registry, settings);

    match cli.command {
        Cmd::AddConninfo {
            name,
            host,
            port,
            user,
            pwd,
            srcdb,
            dstdb,
            tables,
            kind,
        } => {
            let kind = parse_kind(&kind)?;
            admin.add_conninfo(&name, &host, port, &user, &pwd, &srcdb, &dstdb, &tables, kind)?;
            println!("registered connector '{name}'");
        }
        Cmd::DelConninfo { name } => {
            admin.del_conninfo(&name)?;
            println!("removed connector '{name}'");
        }
        Cmd::Start {
            name,
            snapshot_mode,
        } => run::run_connector(admin, &name, &snapshot_mode)?,
        Cmd::Stop { name } => admin.stop(&name)?,
        Cmd::Pause { name } => admin.pause(&name)?,
        Cmd::Resume { name } => admin.resume(&name)?,
        Cmd::SetOffset { name, offset } => admin.set_offset(&name, &offset)?,
        Cmd::Restart {
            name,
            snapshot_mode,
        } => admin.restart(&name, &snapshot_mode)?,
        Cmd::AddObjmap {
            name,
            objtype,
            srcobj,
            dstobj,
        } => admin.add_objmap(&name, &objtype, &srcobj, &dstobj)?,
        Cmd::DelObjmap {
            name,
            objtype,
            srcobj,
        } => admin.del_objmap(&name, &objtype, &srcobj)?,
        Cmd::ReloadObjmap { name } => admin.reload_objmap(&name)?,
        Cmd::State => {
            for slot in admin.get_state() {
                println!(
                    "{:<3} {:<24} {:<16} {:?} {}",
                    slot.id,
                    slot.name,
                    slot.state.as_str(),
                    slot.stage,
                    slot.errmsg.as_deref().unwrap_or("-")
                );
            }
        }
        Cmd::Stats { name } => {
            let slot = admin.get_stats(&name)?;
            let s = slot.stats;
            println!(
                "ddl={} dml={} read={} create={} update={} delete={} bad={} \
                 total={} batches={} avg_batch={}",
                s.ddl,
                s.dml,
                s.read,
                s.create,
                s.update,
                s.delete,
                s.bad_events,
                s.total_events,
                s.batches,
                s.average_batch_size
            );
            println!(
                "first: src={} pipeline={} dst={}  last: src={} pipeline={} dst={}",
                s.first_src_ts,
                s.first_pipeline_ts,
                s.first_dst_ts,
                s.last_src_ts,
                s.last_pipeline_ts,
                s.last_dst_ts
            );
        }
        Cmd::ResetStats { name } => admin.reset_stats(&name)?,
        Cmd::Meminfo { name } => admin.log_jvm_meminfo(&name)?,
    }
    Ok(())
}
