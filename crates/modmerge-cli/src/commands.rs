use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use modmerge_diff::{diff_with, DiffMode, DiffType, LineDiff};
use modmerge_merge::{FieldPreference, IdentityGuidResolver};
use modmerge_session::{
    ChangeImpact, Component, ItemId, ItemStatus, MergeField, MergeSession, OrderMode, PreviewEntry,
    SessionConfig, Side,
};
use modmerge_types::Guid;

use crate::cli::*;
use crate::collaborators::{NameAuthorScorer, TomlSerializer};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Plan(args) => cmd_plan(args, cli.format),
        Command::Merge(args) => cmd_merge(args, cli.format),
        Command::Diff(args) => cmd_diff(args, cli.format),
    }
}

fn side(arg: SideArg) -> Side {
    match arg {
        SideArg::Existing => Side::Existing,
        SideArg::Incoming => Side::Incoming,
    }
}

fn load_catalog(path: &Path) -> anyhow::Result<Vec<Component>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let components: Vec<Component> = serde_json::from_str(&text)
        .with_context(|| format!("parsing catalog {}", path.display()))?;
    for (pos, component) in components.iter().enumerate() {
        check_guids(component)
            .with_context(|| format!("component {pos} of {}", path.display()))?;
    }
    Ok(components)
}

/// A component may lack its own GUID, but every reference must name one.
fn check_guids(component: &Component) -> anyhow::Result<()> {
    if !component.guid.is_nil() {
        Guid::parse(component.guid.as_str())
            .with_context(|| format!("{:?} has a bad GUID", component.name))?;
    }
    for reference in component.referenced_guids() {
        Guid::parse(reference.as_str())
            .with_context(|| format!("{:?} has a bad reference", component.name))?;
    }
    Ok(())
}

fn load_config(args: &SessionArgs) -> anyhow::Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            SessionConfig::from_toml_str(&text)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => SessionConfig::default(),
    };
    if let Some(order) = args.order {
        config.order_mode = match order {
            OrderArg::IncomingFirst => OrderMode::IncomingFirst,
            OrderArg::ExistingFirst => OrderMode::ExistingFirst,
        };
    }
    if args.skip_duplicates {
        config.skip_duplicates = true;
    }
    if args.myers {
        config.diff_mode = DiffMode::Myers;
    }
    let effective = config.to_toml_string().context("rendering session config")?;
    debug!(config = %effective.trim(), "effective session config");
    Ok(config)
}

/// Build a session and replay the requested edits on it.
fn build_session(args: &SessionArgs) -> anyhow::Result<MergeSession> {
    let existing = load_catalog(&args.existing)?;
    let incoming = load_catalog(&args.incoming)?;
    let config = load_config(args)?;
    let mut session = MergeSession::new(
        existing,
        incoming,
        &NameAuthorScorer::default(),
        IdentityGuidResolver,
        config,
    );

    for &pos in &args.unlink {
        let id = item_at(&session, Side::Existing, pos)?;
        if !session.unlink_item(id) {
            bail!("existing item {pos} is not paired");
        }
    }
    for &(e, i) in &args.link {
        let existing = item_at(&session, Side::Existing, e)?;
        let incoming = item_at(&session, Side::Incoming, i)?;
        let outcome = session.link(existing, incoming);
        if !outcome.is_linked() {
            bail!("cannot link existing {e} with incoming {i}: {outcome:?}");
        }
    }
    for &(s, pos) in &args.deselect {
        let id = item_at(&session, side(s), pos)?;
        session.set_selected(id, false);
    }

    match args.use_all {
        Some(SideArg::Existing) => session.use_all_existing_fields(),
        Some(SideArg::Incoming) => session.use_all_incoming_fields(),
        None => {}
    }
    for (name, choice) in &args.field {
        let field: MergeField = name.parse()?;
        let pref = match choice.as_str() {
            "existing" => FieldPreference::UseExisting,
            "incoming" => FieldPreference::UseIncoming,
            "merge" => FieldPreference::Merge,
            other => bail!("unknown field choice {other:?} (existing, incoming, merge)"),
        };
        let pairs: Vec<_> = session.pairs().into_iter().map(|p| p.id).collect();
        for pair in pairs {
            if !session.set_preference(pair, field, pref) {
                bail!("{field} does not accept {pref:?}");
            }
        }
    }

    if let Some(winner) = args.choose_guid {
        for pair_id in session.pending_guid_conflicts() {
            let Some(pair) = session.pair(pair_id).copied() else {
                continue;
            };
            session.choose_guid(pair.item(side(winner)));
        }
    }
    Ok(session)
}

fn item_at(session: &MergeSession, side: Side, pos: usize) -> anyhow::Result<ItemId> {
    session
        .side_items(side)
        .nth(pos)
        .map(|item| item.id)
        .with_context(|| format!("no {side} item at position {pos}"))
}

#[derive(Serialize)]
struct PlanReport<'a> {
    pairs: Vec<PairReport<'a>>,
    existing_only: Vec<&'a str>,
    incoming_only: Vec<&'a str>,
    preview: Vec<PreviewEntry>,
    impact: ChangeImpact,
}

#[derive(Serialize)]
struct PairReport<'a> {
    existing: &'a str,
    incoming: &'a str,
    status: ItemStatus,
    differing: Vec<MergeField>,
    guid_conflict: Option<&'a str>,
}

fn cmd_plan(args: PlanArgs, format: OutputFormat) -> anyhow::Result<()> {
    let session = build_session(&args.session)?;

    let mut pairs = Vec::new();
    for pair in session.pairs() {
        let (Some(e), Some(i)) = (session.item(pair.existing), session.item(pair.incoming)) else {
            continue;
        };
        pairs.push(PairReport {
            existing: e.component.display_name(),
            incoming: i.component.display_name(),
            status: e.status,
            differing: e.component.differing_fields(&i.component),
            guid_conflict: e.conflict_reason.as_deref(),
        });
    }
    let report = PlanReport {
        pairs,
        existing_only: session
            .existing_only()
            .into_iter()
            .map(|item| item.component.display_name())
            .collect(),
        incoming_only: session
            .incoming_only()
            .into_iter()
            .map(|item| item.component.display_name())
            .collect(),
        preview: session.preview(),
        impact: session.impact(),
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Pairs".bold());
    for pair in &report.pairs {
        let status = match pair.status {
            ItemStatus::Updated => "updated".yellow(),
            _ => "matched".green(),
        };
        println!("  {} {} {} [{}]", pair.existing, "<->".dimmed(), pair.incoming, status);
        if !pair.differing.is_empty() {
            let fields: Vec<&str> = pair.differing.iter().map(|f| f.as_str()).collect();
            println!("      differs: {}", fields.join(", ").dimmed());
        }
        if let Some(reason) = pair.guid_conflict {
            println!("      {} {}", "GUID conflict:".red(), reason);
        }
    }
    print_names("Existing only", &report.existing_only);
    print_names("Incoming only", &report.incoming_only);

    println!("{}", "Preview".bold());
    for entry in &report.preview {
        println!("  {:>3}. {:<9} {}", entry.position, entry.label.to_string().cyan(), entry.name);
    }
    print_impact(&report.impact);

    if args.diffs {
        for pair in session.pairs() {
            if let Some(diff) = session.item_diff(pair.existing, &TomlSerializer)? {
                if let Some(e) = session.item(pair.existing) {
                    println!("{} {}", "Diff".bold(), e.component.display_name());
                }
                print_diff(&diff);
            }
        }
    }
    Ok(())
}

fn print_names(title: &str, names: &[&str]) {
    println!("{}", title.bold());
    if names.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for name in names {
        println!("  {name}");
    }
}

fn print_impact(impact: &ChangeImpact) {
    println!(
        "{} {} changes: {} new, {} updated, {} kept, {} removed",
        "Impact:".bold(),
        impact.total_changes().to_string().bold(),
        impact.new.to_string().green(),
        impact.updated.to_string().yellow(),
        impact.kept,
        impact.removed.to_string().red(),
    );
}

fn cmd_merge(args: MergeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let session = build_session(&args.session)?;
    let derived = session.recompute(&TomlSerializer)?;

    if derived.is_provisional() {
        if args.strict {
            bail!(
                "{} GUID conflict(s) need a choice; pass --choose-guid",
                derived.pending_guid_conflicts()
            );
        }
        eprintln!(
            "{} {} GUID conflict(s) unresolved; existing GUIDs used as placeholders",
            "warning:".yellow().bold(),
            derived.pending_guid_conflicts()
        );
    }
    if args.show_diff {
        eprint!("{}", derived.catalog_diff.render());
    }

    let json = serde_json::to_string_pretty(&derived.merged)?;
    match &args.out {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("writing {}", path.display()))?;
            if format == OutputFormat::Text {
                println!(
                    "{} Wrote {} components to {}",
                    "✓".green().bold(),
                    derived.merged.len(),
                    path.display().to_string().bold()
                );
                print_impact(&derived.impact);
            }
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let original = fs::read_to_string(&args.original)
        .with_context(|| format!("reading {}", args.original.display()))?;
    let merged = fs::read_to_string(&args.merged)
        .with_context(|| format!("reading {}", args.merged.display()))?;
    let mode = if args.myers {
        DiffMode::Myers
    } else {
        DiffMode::Lookahead
    };
    let diff = diff_with(mode, &original, &merged);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
        OutputFormat::Text => {
            print_diff(&diff);
            println!(
                "{} added, {} removed, {} modified",
                diff.additions().to_string().green(),
                diff.removals().to_string().red(),
                diff.modifications().to_string().yellow(),
            );
        }
    }
    Ok(())
}

fn print_diff(diff: &LineDiff) {
    for line in &diff.lines {
        let text = format!("{} {}", line.kind.marker(), line.text);
        let text = match line.kind {
            DiffType::Unchanged => text.normal(),
            DiffType::Added => text.green(),
            DiffType::Removed => text.red(),
            DiffType::Modified => text.yellow(),
        };
        println!("{:>4} {}", line.line_number.to_string().dimmed(), text);
    }
}
