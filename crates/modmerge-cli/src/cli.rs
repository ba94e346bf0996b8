use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "modmerge",
    about = "Reconcile two mod-component catalogs into one",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show how two catalogs pair up and what a merge would change
    Plan(PlanArgs),
    /// Merge two catalogs and write the result
    Merge(MergeArgs),
    /// Line diff of two text files
    Diff(DiffArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SideArg {
    Existing,
    Incoming,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OrderArg {
    IncomingFirst,
    ExistingFirst,
}

/// Inputs and edits shared by `plan` and `merge`.
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Existing catalog (JSON array of components)
    pub existing: PathBuf,
    /// Incoming catalog (JSON array of components)
    pub incoming: PathBuf,
    /// Session config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub order: Option<OrderArg>,
    /// Label fully selected pairs as duplicates
    #[arg(long)]
    pub skip_duplicates: bool,
    /// Use the Myers algorithm for diffs
    #[arg(long)]
    pub myers: bool,
    /// Link EXISTING:INCOMING (0-based positions) after matching
    #[arg(long, value_parser = parse_position_pair)]
    pub link: Vec<(usize, usize)>,
    /// Unlink the pair holding this existing position
    #[arg(long)]
    pub unlink: Vec<usize>,
    /// Deselect SIDE:POSITION, e.g. `existing:2`
    #[arg(long, value_parser = parse_side_position)]
    pub deselect: Vec<(SideArg, usize)>,
    /// Bias every pair's field choices toward one side
    #[arg(long)]
    pub use_all: Option<SideArg>,
    /// Per-field override for all pairs, e.g. `tier=existing`
    #[arg(long, value_parser = parse_field_choice)]
    pub field: Vec<(String, String)>,
    /// Settle every pending GUID conflict in favour of one side
    #[arg(long)]
    pub choose_guid: Option<SideArg>,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Print the per-item diff of every pair
    #[arg(long)]
    pub diffs: bool,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Write the merged catalog here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    /// Refuse to write while a GUID conflict is unresolved
    #[arg(long)]
    pub strict: bool,
    /// Print the catalog diff to stderr
    #[arg(long)]
    pub show_diff: bool,
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    pub original: PathBuf,
    pub merged: PathBuf,
    #[arg(long)]
    pub myers: bool,
}

fn parse_position_pair(s: &str) -> Result<(usize, usize), String> {
    let (e, i) = s
        .split_once(':')
        .ok_or_else(|| format!("expected EXISTING:INCOMING, got {s:?}"))?;
    let e = e.trim().parse().map_err(|_| format!("bad existing position {e:?}"))?;
    let i = i.trim().parse().map_err(|_| format!("bad incoming position {i:?}"))?;
    Ok((e, i))
}

fn parse_side_position(s: &str) -> Result<(SideArg, usize), String> {
    let (side, pos) = s
        .split_once(':')
        .ok_or_else(|| format!("expected SIDE:POSITION, got {s:?}"))?;
    let side = match side.trim().to_ascii_lowercase().as_str() {
        "existing" | "e" => SideArg::Existing,
        "incoming" | "i" => SideArg::Incoming,
        other => return Err(format!("unknown side {other:?}")),
    };
    let pos = pos.trim().parse().map_err(|_| format!("bad position {pos:?}"))?;
    Ok((side, pos))
}

fn parse_field_choice(s: &str) -> Result<(String, String), String> {
    let (field, choice) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=CHOICE, got {s:?}"))?;
    Ok((field.trim().to_string(), choice.trim().to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plan() {
        let cli = Cli::try_parse_from(["modmerge", "plan", "a.json", "b.json"]).unwrap();
        if let Command::Plan(args) = cli.command {
            assert_eq!(args.session.existing, PathBuf::from("a.json"));
            assert!(!args.diffs);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_merge_with_edits() {
        let cli = Cli::try_parse_from([
            "modmerge", "merge", "a.json", "b.json",
            "--link", "0:2", "--deselect", "incoming:1",
            "--use-all", "existing", "--field", "tier=incoming",
            "--order", "existing-first", "-o", "out.json",
        ])
        .unwrap();
        if let Command::Merge(args) = cli.command {
            assert_eq!(args.session.link, vec![(0, 2)]);
            assert_eq!(args.session.deselect, vec![(SideArg::Incoming, 1)]);
            assert_eq!(args.session.use_all, Some(SideArg::Existing));
            assert_eq!(args.session.field, vec![("tier".to_string(), "incoming".to_string())]);
            assert_eq!(args.session.order, Some(OrderArg::ExistingFirst));
            assert_eq!(args.out, Some(PathBuf::from("out.json")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn reject_malformed_link() {
        assert!(Cli::try_parse_from(["modmerge", "plan", "a", "b", "--link", "3"]).is_err());
        let bad_side = ["modmerge", "plan", "a", "b", "--deselect", "left:1"];
        assert!(Cli::try_parse_from(bad_side).is_err());
    }

    #[test]
    fn parse_diff_myers() {
        let cli =
            Cli::try_parse_from(["modmerge", "diff", "old.txt", "new.txt", "--myers"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert!(args.myers);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["modmerge", "--verbose", "diff", "a", "b"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["modmerge", "--format", "json", "plan", "a", "b"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
