use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, error::ErrorKind};
use tracing::info;

use crate::aggregate::{
    group_by_address, map_center, sorted_by_execution_date_desc, space_type_breakdown, summarize,
};
use crate::config::StoreConfig;
use crate::data::Comparable;
use crate::dates::parse_execution_date;
use crate::deals::{DealStage, deals_in_stage};
use crate::errors::CompsError;
use crate::filter::{FilterCriteria, filter_comparables};
use crate::format::{format_currency, format_square_feet};
use crate::parse::parse_comparables_file;
use crate::store::{CrmStore, FileBackend};

#[derive(Debug, Parser)]
#[command(
    name = "lease_comps",
    disable_help_subcommand = true,
    about = "Comparable lease analysis",
    long_about = "Parse comparable-lease exports, filter and summarize them, and manage starred leases.",
    after_help = "Store location is resolved in order by --store-path, --store-dir, LEASE_COMPS_STORE_DIR, then .lease_comps_store/."
)]
struct LeaseCompsCli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarize comparables matching optional filters.
    Summary(SummaryArgs),
    /// Toggle the starred state of matching leases.
    Star(StarArgs),
    /// List starred leases present in a comps file.
    Starred(StarredArgs),
    /// List data rows the parser rejected.
    Rejects(RejectsArgs),
    /// Show the deal pipeline grouped by stage.
    Deals(DealsArgs),
    /// Move a deal to another pipeline stage.
    MoveDeal(MoveDealArgs),
}

#[derive(Debug, Args)]
struct SummaryArgs {
    #[arg(value_name = "FILE", help = "Comps export to read")]
    file: PathBuf,
    #[command(flatten)]
    filter: FilterArgs,
    #[arg(long = "by-address", help = "Also print one line per address")]
    by_address: bool,
}

#[derive(Debug, Args)]
struct FilterArgs {
    #[arg(long = "space-type", help = "Exact, case-sensitive space type")]
    space_type: Option<String>,
    #[arg(
        long = "date-start",
        value_name = "DATE",
        value_parser = parse_date_arg,
        help = "Earliest execution date kept (inclusive)"
    )]
    date_start: Option<NaiveDate>,
    #[arg(
        long = "date-end",
        value_name = "DATE",
        value_parser = parse_date_arg,
        help = "Latest execution date kept (inclusive)"
    )]
    date_end: Option<NaiveDate>,
    #[arg(long = "min-sqft", help = "Minimum transaction square feet")]
    min_sqft: Option<u64>,
    #[arg(long = "max-sqft", help = "Maximum transaction square feet")]
    max_sqft: Option<u64>,
    #[arg(long = "min-rent", help = "Minimum starting rent")]
    min_rent: Option<f64>,
    #[arg(long = "max-rent", help = "Maximum starting rent")]
    max_rent: Option<f64>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            space_type: self.space_type.clone(),
            date_start: self.date_start,
            date_end: self.date_end,
            min_sqft: self.min_sqft,
            max_sqft: self.max_sqft,
            min_rent: self.min_rent,
            max_rent: self.max_rent,
        }
    }
}

#[derive(Debug, Args)]
struct StoreArgs {
    #[arg(
        long = "store-path",
        value_name = "STORE_PATH",
        help = "Optional path for the persisted CRM store file"
    )]
    store_path: Option<PathBuf>,
    #[arg(
        long = "store-dir",
        value_name = "DIR",
        conflicts_with = "store_path",
        help = "Optional directory for the CRM store file (uses crm_store.bin filename)"
    )]
    store_dir: Option<PathBuf>,
}

impl StoreArgs {
    fn config(&self) -> StoreConfig {
        let mut config = StoreConfig::new();
        if let Some(path) = &self.store_path {
            config = config.with_path(path);
        }
        if let Some(dir) = &self.store_dir {
            config = config.with_dir(dir);
        }
        config
    }

    fn open(&self) -> Result<CrmStore<FileBackend>, CompsError> {
        let path = self.config().resolve_path();
        Ok(CrmStore::new(FileBackend::open(path)?))
    }
}

#[derive(Debug, Args)]
struct StarArgs {
    #[arg(value_name = "FILE", help = "Comps export containing the lease")]
    file: PathBuf,
    #[arg(long, help = "Lease address (exact)")]
    address: String,
    #[arg(long, help = "Tenant name (exact); any tenant when omitted")]
    tenant: Option<String>,
    #[arg(long, help = "Execution date as written in the export")]
    date: String,
    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Debug, Args)]
struct StarredArgs {
    #[arg(value_name = "FILE", help = "Comps export to resolve starred leases against")]
    file: PathBuf,
    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Debug, Args)]
struct RejectsArgs {
    #[arg(value_name = "FILE", help = "Comps export to check")]
    file: PathBuf,
}

#[derive(Debug, Args)]
struct DealsArgs {
    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Debug, Args)]
struct MoveDealArgs {
    #[arg(value_name = "DEAL_ID", help = "Id of the deal to move")]
    id: String,
    #[arg(
        value_name = "STAGE",
        value_parser = parse_stage_arg,
        help = "Target stage id or display name (e.g. loi, \"LOI Sent\")"
    )]
    stage: DealStage,
    #[command(flatten)]
    store: StoreArgs,
}

fn parse_stage_arg(raw: &str) -> Result<DealStage, String> {
    DealStage::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = DealStage::ALL.iter().map(|stage| stage.id()).collect();
        format!("unknown stage '{raw}' (expected one of {})", known.join(", "))
    })
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_execution_date(raw).ok_or_else(|| format!("Could not parse '{raw}' as a date"))
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

/// Run the `lease_comps` command line, writing results to `out`.
///
/// `args_iter` excludes the program name.
pub fn run_lease_comps<I, W>(args_iter: I, out: &mut W) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
    W: Write,
{
    let Some(cli) =
        parse_cli::<LeaseCompsCli, _>(std::iter::once("lease_comps".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    match cli.command {
        Command::Summary(args) => run_summary(&args, out),
        Command::Star(args) => run_star(&args, out),
        Command::Starred(args) => run_starred(&args, out),
        Command::Rejects(args) => run_rejects(&args, out),
        Command::Deals(args) => run_deals(&args, out),
        Command::MoveDeal(args) => run_move_deal(&args, out),
    }
}

fn run_summary<W: Write>(args: &SummaryArgs, out: &mut W) -> Result<(), Box<dyn Error>> {
    let report = parse_comparables_file(&args.file)?;
    let rejected = report.rejections().len();
    let comps = report.into_comparables();
    let criteria = args.filter.criteria();
    let filtered = filter_comparables(&comps, &criteria);
    info!(
        parsed = comps.len(),
        rejected,
        matching = filtered.len(),
        "summarized comps file"
    );

    writeln!(
        out,
        "Parsed {} comparables ({} rows rejected)",
        comps.len(),
        rejected
    )?;
    if !criteria.is_empty() {
        writeln!(out, "Matching filters: {}", filtered.len())?;
    }
    write_summary(out, &filtered)?;
    let breakdown = space_type_breakdown(&filtered);
    writeln!(
        out,
        "Retail: {}  Office: {}",
        breakdown.retail, breakdown.office
    )?;
    match map_center(&filtered) {
        Some(center) => writeln!(out, "Map center: ({:.4}, {:.4})", center.lat, center.lng)?,
        None => writeln!(out, "Map center: N/A")?,
    }

    if args.by_address {
        writeln!(out)?;
        for (address, group) in group_by_address(&filtered) {
            let summary = summarize(&group);
            writeln!(
                out,
                "{address}: {} comps, mean rent {}, mean size {}",
                summary.count,
                format_currency(Some(summary.mean_starting_rent)),
                format_square_feet(Some(summary.mean_transaction_sqft))
            )?;
        }
    }
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, comps: &[Comparable]) -> Result<(), Box<dyn Error>> {
    let summary = summarize(comps);
    let (rent, size) = if summary.is_empty() {
        (None, None)
    } else {
        (
            Some(summary.mean_starting_rent),
            Some(summary.mean_transaction_sqft),
        )
    };
    writeln!(out, "Comparables: {}", summary.count)?;
    writeln!(out, "Mean starting rent: {}", format_currency(rent))?;
    writeln!(out, "Mean transaction size: {}", format_square_feet(size))?;
    writeln!(
        out,
        "Total transaction size: {}",
        format_square_feet(Some(summary.total_transaction_sqft as f64))
    )?;
    Ok(())
}

fn run_star<W: Write>(args: &StarArgs, out: &mut W) -> Result<(), Box<dyn Error>> {
    let comps = parse_comparables_file(&args.file)?.into_comparables();
    let matches: Vec<&Comparable> = comps
        .iter()
        .filter(|comp| {
            comp.address == args.address
                && comp.execution_date == args.date
                && args
                    .tenant
                    .as_ref()
                    .is_none_or(|tenant| comp.tenant_name == *tenant)
        })
        .collect();
    if matches.is_empty() {
        return Err(CompsError::NotFound(format!(
            "no lease at '{}' executed '{}' in {}",
            args.address,
            args.date,
            args.file.display()
        ))
        .into());
    }

    let store = args.store.open()?;
    store.migrate_legacy_starred(&comps)?;
    for comp in matches {
        let starred = store.toggle_starred(comp.lease_id())?;
        writeln!(
            out,
            "{} {} | {} | {}",
            if starred { "Starred" } else { "Unstarred" },
            comp.address,
            comp.tenant_name,
            comp.execution_date
        )?;
    }
    Ok(())
}

fn run_starred<W: Write>(args: &StarredArgs, out: &mut W) -> Result<(), Box<dyn Error>> {
    let comps = parse_comparables_file(&args.file)?.into_comparables();
    let store = args.store.open()?;
    let migrated = store.migrate_legacy_starred(&comps)?;
    if migrated > 0 {
        writeln!(out, "Migrated {migrated} legacy starred keys")?;
    }
    let starred = sorted_by_execution_date_desc(&store.starred_comparables(&comps)?);
    let stored = store.starred()?.len();
    writeln!(out, "Starred comparables: {}", starred.len())?;
    for comp in &starred {
        writeln!(
            out,
            "{} | {} | {} | {} | {} | {}",
            comp.address,
            comp.tenant_name,
            comp.space_type,
            comp.execution_date,
            format_currency(Some(comp.starting_rent)),
            format_square_feet(Some(comp.transaction_sqft as f64))
        )?;
    }
    let missing = stored.saturating_sub(starred.len());
    if missing > 0 {
        writeln!(
            out,
            "{missing} starred leases are not in {}",
            args.file.display()
        )?;
    }
    Ok(())
}

fn run_rejects<W: Write>(args: &RejectsArgs, out: &mut W) -> Result<(), Box<dyn Error>> {
    let report = parse_comparables_file(&args.file)?;
    let rejections = report.rejections();
    writeln!(
        out,
        "{} of {} data rows rejected",
        rejections.len(),
        report.data_rows()
    )?;
    for (line, reason) in rejections {
        writeln!(out, "line {line}: {reason}")?;
    }
    Ok(())
}

fn run_deals<W: Write>(args: &DealsArgs, out: &mut W) -> Result<(), Box<dyn Error>> {
    let store = args.store.open()?;
    let deals = store.deals()?;
    for stage in DealStage::ALL {
        let in_stage = deals_in_stage(&deals, stage);
        writeln!(out, "{} ({})", stage.display_name(), in_stage.len())?;
        for deal in in_stage {
            writeln!(
                out,
                "  [{}] {} | {} | {} | {}",
                deal.id,
                deal.details.title,
                deal.details.tenant_name,
                format_square_feet(deal.details.transaction_sqft.map(|sqft| sqft as f64)),
                format_currency(deal.details.starting_rent)
            )?;
        }
    }
    Ok(())
}

fn run_move_deal<W: Write>(args: &MoveDealArgs, out: &mut W) -> Result<(), Box<dyn Error>> {
    let store = args.store.open()?;
    store.move_deal(&args.id, args.stage)?;
    writeln!(
        out,
        "Moved deal {} to {}",
        args.id,
        args.stage.display_name()
    )?;
    Ok(())
}
