use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use areg_registry::{
    AssetDraft, AssetId, AuditId, CallContext, GrantRequest, MetadataUpdate, Permissions, Registry, RegistryConfig,
    RegistrySnapshot, RevisionDraft, Sequence,
};
use areg_server::{AregServer, ServerConfig};
use areg_types::Principal;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        state,
        caller,
        at,
        format,
        ..
    } = cli;

    let open = || Workspace::open(&state, caller.clone(), at);
    match command {
        Command::Register(args) => cmd_register(&open()?, args, format),
        Command::Revise(args) => cmd_revise(&open()?, args, format),
        Command::Update(args) => cmd_update(&open()?, args, format),
        Command::Grant(args) => cmd_grant(&open()?, args, format),
        Command::Revoke(args) => cmd_revoke(&open()?, args, format),
        Command::Transfer(args) => cmd_transfer(&open()?, args, format),
        Command::Retire(args) => cmd_retire(&open()?, args, format),
        Command::Rate(args) => cmd_rate(&open()?, args, format),
        Command::Show(args) => cmd_show(&open()?, args, format),
        Command::History(args) => cmd_history(&open()?, args, format),
        Command::Access(args) => cmd_access(&open()?, args, format),
        Command::Analytics(args) => cmd_analytics(&open()?, args, format),
        Command::Audit(args) => cmd_audit(&open()?, args, format),
        Command::Verify => cmd_verify(&open()?, format),
        Command::Stats => cmd_stats(&open()?, format),
        Command::Serve(args) => cmd_serve(&state, args),
    }
}

/// A registry loaded from the state file, plus the acting principal.
struct Workspace<'a> {
    path: &'a Path,
    registry: Registry,
    caller: Option<Principal>,
    at: Option<u64>,
}

impl<'a> Workspace<'a> {
    fn open(path: &'a Path, caller: Option<String>, at: Option<u64>) -> anyhow::Result<Self> {
        let registry = if path.exists() {
            let snapshot = RegistrySnapshot::read_from(path)
                .with_context(|| format!("reading state file {}", path.display()))?;
            let registry = Registry::from_snapshot(RegistryConfig::default(), snapshot)?;
            debug!(path = %path.display(), "loaded registry state");
            registry
        } else {
            debug!(path = %path.display(), "no state file, starting empty");
            Registry::default()
        };
        let caller = caller.as_deref().map(parse_principal).transpose()?;
        Ok(Self {
            path,
            registry,
            caller,
            at,
        })
    }

    /// Call context for commands that act as someone.
    fn context(&self) -> anyhow::Result<CallContext> {
        let Some(caller) = self.caller.clone() else {
            bail!("this command needs an acting principal (--as)");
        };
        Ok(CallContext::new(caller, self.now()?))
    }

    fn now(&self) -> anyhow::Result<Sequence> {
        Ok(match self.at {
            Some(at) => Sequence::new(at),
            None => self.registry.next_sequence()?,
        })
    }

    fn save(&self) -> anyhow::Result<()> {
        self.registry
            .snapshot()?
            .write_to(self.path)
            .with_context(|| format!("writing state file {}", self.path.display()))?;
        debug!(path = %self.path.display(), "saved registry state");
        Ok(())
    }
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

fn parse_principal(text: &str) -> anyhow::Result<Principal> {
    Principal::parse(text).with_context(|| format!("invalid principal '{text}'"))
}

fn cmd_register(ws: &Workspace, args: RegisterArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = ws.context()?;
    let name = args.name.clone();
    let draft = AssetDraft {
        name: args.name,
        size: args.size,
        description: args.description,
        tags: args.tags,
        encrypted: args.encrypted,
        key_hash: args.key_hash,
        content_hash: args.content_hash,
        metadata: args.metadata,
    };
    let id = ws.registry.register(draft, &ctx)?;
    ws.save()?;
    emit(format, &serde_json::json!({ "asset_id": id }), || {
        println!("{} Registered {} as {}", "✓".green().bold(), name.bold(), id.to_string().yellow());
        println!("  Owner: {}", ctx.caller.to_string().cyan());
        println!("  Sequence: {}", ctx.now);
    })
}

fn cmd_revise(ws: &Workspace, args: ReviseArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = ws.context()?;
    let id = AssetId::new(args.id);
    let draft = RevisionDraft {
        description: args.description,
        size: args.size,
        content_hash: args.content_hash,
        summary: args.summary,
    };
    let version = ws.registry.revise(id, draft, &ctx)?;
    ws.save()?;
    emit(format, &serde_json::json!({ "asset_id": id, "version": version }), || {
        println!("{} {} is now at version {}", "✓".green().bold(), id.to_string().yellow(), version.to_string().bold());
    })
}

fn cmd_update(ws: &Workspace, args: UpdateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = ws.context()?;
    let id = AssetId::new(args.id);
    let update = MetadataUpdate {
        name: args.name,
        size: args.size,
        description: args.description,
        tags: args.tags,
    };
    ws.registry.update_metadata(id, update, &ctx)?;
    ws.save()?;
    emit(format, &serde_json::json!({ "asset_id": id, "updated": true }), || {
        println!("{} Updated metadata of {}", "✓".green().bold(), id.to_string().yellow());
    })
}

fn cmd_grant(ws: &Workspace, args: GrantArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = ws.context()?;
    let id = AssetId::new(args.id);
    let target = parse_principal(&args.user)?;
    let request = GrantRequest::new(
        target.clone(),
        Permissions::new(args.read, args.write, args.admin),
        args.expires_at.map(Sequence::new),
    );
    let grant = ws.registry.grant_access(id, request, &ctx)?;
    ws.save()?;
    emit(format, &serde_json::json!({ "user": target, "grant": grant }), || {
        let p = grant.permissions;
        println!(
            "{} Granted {} on {} (read={}, write={}, admin={})",
            "✓".green().bold(),
            target.to_string().cyan(),
            id.to_string().yellow(),
            p.read,
            p.write,
            p.admin,
        );
        if let Some(expiry) = grant.expires_at {
            println!("  Expires: {expiry}");
        }
    })
}

fn cmd_revoke(ws: &Workspace, args: RevokeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = ws.context()?;
    let id = AssetId::new(args.id);
    let target = parse_principal(&args.user)?;
    let removed = ws.registry.revoke_access(id, &target, &ctx)?;
    ws.save()?;
    emit(format, &serde_json::json!({ "removed": removed }), || {
        if removed {
            println!("{} Revoked {} on {}", "✓".green().bold(), target.to_string().cyan(), id.to_string().yellow());
        } else {
            println!("{} had no grant on {}", target.to_string().cyan(), id.to_string().yellow());
        }
    })
}

fn cmd_transfer(ws: &Workspace, args: TransferArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = ws.context()?;
    let id = AssetId::new(args.id);
    let new_owner = parse_principal(&args.new_owner)?;
    ws.registry.transfer_ownership(id, &new_owner, &ctx)?;
    ws.save()?;
    emit(format, &serde_json::json!({ "asset_id": id, "owner": new_owner }), || {
        println!(
            "{} {} now belongs to {}",
            "✓".green().bold(),
            id.to_string().yellow(),
            new_owner.to_string().cyan()
        );
    })
}

fn cmd_retire(ws: &Workspace, args: AssetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = ws.context()?;
    let id = AssetId::new(args.id);
    ws.registry.retire(id, &ctx)?;
    ws.save()?;
    emit(format, &serde_json::json!({ "asset_id": id, "status": "deleted" }), || {
        println!("{} Retired {}", "✓".green().bold(), id.to_string().yellow());
    })
}

fn cmd_rate(ws: &Workspace, args: RateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = ws.context()?;
    let analytics = ws.registry.rate(AssetId::new(args.id), args.rating, &ctx)?;
    ws.save()?;
    emit(format, &analytics, || {
        println!(
            "{} Rated {} (average {} over {} ratings)",
            "✓".green().bold(),
            args.rating,
            analytics.average_rating.to_string().bold(),
            analytics.rating_count
        );
    })
}

fn cmd_show(ws: &Workspace, args: AssetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = ws.context()?;
    let view = ws.registry.read(AssetId::new(args.id), &ctx)?;
    // Views are counted, so the read is a write to the state file.
    ws.save()?;
    emit(format, &view, || {
        let a = &view.asset;
        println!("{} {}  [{}]", a.id.to_string().yellow().bold(), a.name.bold(), a.status);
        println!("  Owner: {}", a.owner.to_string().cyan());
        println!("  Description: {}", a.description);
        println!("  Size: {} bytes", a.size);
        if !a.tags.is_empty() {
            println!("  Tags: {}", a.tags.join(", "));
        }
        println!("  Version: {} of {}", a.current_version, a.total_versions);
        println!("  Content: {}", a.content_hash.short().dimmed());
        if a.encrypted {
            println!("  Encrypted: {}", "yes".magenta());
        }
        println!("  Modified: {}", a.last_modified);
        println!(
            "  Views: {}  Downloads: {}  Rating: {} ({})",
            view.analytics.views, view.analytics.downloads, view.analytics.average_rating, view.analytics.rating_count
        );
    })
}

fn cmd_history(ws: &Workspace, args: AssetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = ws.context()?;
    let history = ws.registry.history(AssetId::new(args.id), &ctx)?;
    emit(format, &history, || {
        for record in &history {
            println!(
                "{}  {}  {}  {}",
                record.version.to_string().yellow().bold(),
                record.sequence.to_string().dimmed(),
                record.editor.to_string().cyan(),
                record.description
            );
            println!("    {} ({} bytes, {})", record.summary, record.size, record.content_hash.short().dimmed());
        }
    })
}

fn cmd_access(ws: &Workspace, args: AccessArgs, format: OutputFormat) -> anyhow::Result<()> {
    let user = match args.user {
        Some(user) => parse_principal(&user)?,
        None => ws.context()?.caller,
    };
    let status = ws.registry.access_status(AssetId::new(args.id), &user, ws.now()?)?;
    emit(format, &status, || {
        let flag = |on: bool| if on { "yes".green() } else { "no".red() };
        println!("Access of {} to asset {}", user.to_string().cyan(), args.id.to_string().yellow());
        println!("  Owner: {}", flag(status.is_owner));
        println!("  Read: {}  Write: {}  Admin: {}", flag(status.read), flag(status.write), flag(status.admin));
        println!("  Can view: {}", flag(status.can_view));
        if let Some(expiry) = status.expiry {
            println!("  Expiry: {expiry}");
        }
    })
}

fn cmd_analytics(ws: &Workspace, args: AssetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let analytics = ws.registry.analytics(AssetId::new(args.id))?;
    emit(format, &analytics, || {
        println!("Views: {}", analytics.views.to_string().bold());
        println!("Downloads: {}", analytics.downloads);
        println!("Collaborations: {}", analytics.collaborations);
        println!("Average rating: {} ({} ratings)", analytics.average_rating, analytics.rating_count);
        match analytics.last_access {
            Some(seq) => println!("Last access: {seq}"),
            None => println!("Last access: {}", "never".dimmed()),
        }
    })
}

fn cmd_audit(ws: &Workspace, args: AuditArgs, format: OutputFormat) -> anyhow::Result<()> {
    let asset = args.asset.map(AssetId::new);
    if args.summary {
        let summary = ws.registry.audit_summary(asset)?;
        return emit(format, &summary, || {
            println!("Audit entries: {}", summary.total.to_string().bold());
            for (action, count) in &summary.by_action {
                println!("  {:<16} {}", action.cyan(), count);
            }
            for (actor, count) in &summary.by_actor {
                println!("  {:<16} {}", actor.to_string().yellow(), count);
            }
        });
    }

    let entries = match (args.from, args.to) {
        (None, None) => ws.registry.audit_trail(asset)?,
        (from, to) => ws
            .registry
            .audit_range(AuditId::new(from.unwrap_or(1)), AuditId::new(to.unwrap_or(u64::MAX)))?
            .into_iter()
            .filter(|entry| asset.map_or(true, |id| entry.asset == id))
            .collect(),
    };
    emit(format, &entries, || {
        if entries.is_empty() {
            println!("Audit trail: no entries.");
        }
        for entry in &entries {
            println!(
                "{} {} {} {} {}  {}",
                entry.id.to_string().yellow(),
                entry.sequence.to_string().dimmed(),
                entry.asset,
                entry.action.cyan(),
                entry.actor,
                entry.detail
            );
        }
    })
}

fn cmd_verify(ws: &Workspace, format: OutputFormat) -> anyhow::Result<()> {
    let entries = ws.registry.verify_audit_chain()?;
    let mut reports = Vec::new();
    for id in ws.registry.asset_ids()? {
        reports.push(ws.registry.validate_history(id)?);
    }
    let broken: Vec<_> = reports.iter().filter(|r| !r.is_valid()).collect();

    emit(format, &serde_json::json!({
        "audit_entries": entries,
        "assets_checked": reports.len(),
        "broken_histories": broken.iter().map(|r| r.asset).collect::<Vec<_>>(),
    }), || {
        println!("{} Audit chain verified ({} entries)", "✓".green().bold(), entries);
        if broken.is_empty() {
            println!("{} {} version histories valid", "✓".green().bold(), reports.len());
        }
        for report in &broken {
            println!("{} {} history is broken:", "✗".red().bold(), report.asset.to_string().yellow());
            for violation in &report.violations {
                println!("    {} {}", violation.version, violation.description);
            }
        }
    })?;

    if !broken.is_empty() {
        bail!("{} asset histories failed validation", broken.len());
    }
    Ok(())
}

fn cmd_stats(ws: &Workspace, format: OutputFormat) -> anyhow::Result<()> {
    let stats = ws.registry.system_statistics()?;
    emit(format, &stats, || {
        println!("Assets: {} ({} active, {} retired)", stats.total_assets.to_string().bold(), stats.active_assets, stats.retired_assets);
        println!("Versions: {}", stats.total_versions);
        println!("Grants: {}", stats.total_grants);
        println!("Audit entries: {}", stats.audit_entries);
        println!("Sessions: {}  Subscriptions: {}", stats.sessions, stats.subscriptions);
        println!("Contributors: {}", stats.contributors);
        println!("Last sequence: {}", stats.last_sequence);
    })
}

fn cmd_serve(state: &Path, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.bind_addr = bind.parse().with_context(|| format!("invalid bind address '{bind}'"))?;
    }
    if config.snapshot_path.is_none() {
        config.snapshot_path = Some(state.to_path_buf());
    }

    let snapshot = config.snapshot_path.clone().unwrap_or_else(|| state.to_path_buf());
    info!(bind = %config.bind_addr, snapshot = %snapshot.display(), "starting server");
    let server = AregServer::new(config)?;
    println!(
        "{} areg server on {} (state: {})",
        "▶".green().bold(),
        server.config().bind_addr.to_string().bold(),
        snapshot.display()
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const HASH: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn run(state: &Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["areg", "--state", state.to_str().unwrap()];
        argv.extend_from_slice(args);
        run_command(Cli::parse_from(argv))
    }

    fn load(state: &Path) -> Registry {
        Registry::from_snapshot(RegistryConfig::default(), RegistrySnapshot::read_from(state).unwrap()).unwrap()
    }

    fn register(state: &Path) {
        run(
            state,
            &[
                "--as", "alice", "register", "report.pdf", "--size", "2048", "-d", "quarterly", "-t", "finance",
                "--content-hash", HASH,
            ],
        )
        .unwrap();
    }

    #[test]
    fn register_creates_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state.json");
        register(&state);

        let registry = load(&state);
        let id = AssetId::new(1);
        assert_eq!(registry.owner(id).unwrap(), Principal::named("alice"));
        assert_eq!(registry.version_count(id).unwrap(), 1);
    }

    #[test]
    fn sequence_advances_between_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state.json");
        register(&state);
        run(&state, &["--as", "alice", "rate", "1", "5"]).unwrap();

        let stats = load(&state).system_statistics().unwrap();
        assert_eq!(stats.last_sequence, Sequence::new(2));
        assert_eq!(stats.audit_entries, 2);
    }

    #[test]
    fn grant_then_revise_as_grantee() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state.json");
        register(&state);
        run(&state, &["--as", "alice", "grant", "1", "bob", "--write"]).unwrap();
        run(
            &state,
            &["--as", "bob", "revise", "1", "-d", "v2", "--size", "10", "--content-hash", HASH, "-s", "fix"],
        )
        .unwrap();

        assert_eq!(load(&state).version_count(AssetId::new(1)).unwrap(), 2);
    }

    #[test]
    fn stranger_cannot_retire() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state.json");
        register(&state);
        let err = run(&state, &["--as", "mallory", "retire", "1"]).unwrap_err();
        assert!(err.to_string().contains("not the owner"), "{err}");
    }

    #[test]
    fn mutation_without_caller_fails() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state.json");
        let err = run(&state, &["retire", "1"]).unwrap_err();
        assert!(err.to_string().contains("--as"));
        assert!(!state.exists());
    }

    #[test]
    fn read_only_commands_work_on_fresh_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state.json");
        run(&state, &["stats"]).unwrap();
        run(&state, &["verify"]).unwrap();
        run(&state, &["--format", "json", "audit"]).unwrap();
    }

    #[test]
    fn verify_checks_every_history() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state.json");
        register(&state);
        register(&state);
        run(&state, &["--as", "alice", "transfer", "2", "bob"]).unwrap();
        run(&state, &["verify"]).unwrap();
    }

    #[test]
    fn audit_accepts_an_id_window() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state.json");
        register(&state);
        register(&state);
        run(&state, &["--format", "json", "audit", "--from", "2", "--to", "2"]).unwrap();
        run(&state, &["audit", "--asset", "1", "--from", "1"]).unwrap();
        assert_eq!(load(&state).audit_range(AuditId::new(2), AuditId::new(2)).unwrap().len(), 1);
    }

    #[test]
    fn explicit_sequence_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state.json");
        register(&state);
        run(&state, &["--as", "alice", "--at", "40", "show", "1"]).unwrap();

        let analytics = load(&state).analytics(AssetId::new(1)).unwrap();
        assert_eq!(analytics.views, 1);
        assert_eq!(analytics.last_access, Some(Sequence::new(40)));
    }

    #[test]
    fn serve_rejects_bad_bind_address() {
        let args = ServeArgs {
            config: None,
            bind: Some("not an address".into()),
        };
        assert!(cmd_serve(Path::new("state.json"), args).is_err());
    }
}
