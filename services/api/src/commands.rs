use crate::infra::{parse_bsd_type, InMemoryBsdRepository};
use bsd_index::config::AppConfig;
use bsd_index::error::AppError;
use bsd_index::index::{InMemoryIndex, ReindexPlan};
use bsd_index::registry::{to_query_body, RegistryService};
use bsd_index::{telemetry, translate, BsdType, FilterExpression};
use chrono::Utc;
use clap::Args;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ReindexArgs {
    /// JSON file holding the bordereaux to index
    #[arg(long)]
    pub(crate) fixtures: PathBuf,
    /// Only reindex one document type (bsdd, bsda, bsdasri, bsff, bsvhu)
    #[arg(long, value_parser = parse_bsd_type)]
    pub(crate) bsd_type: Option<BsdType>,
    /// Build a new versioned index even when the mappings version is unchanged
    #[arg(long)]
    pub(crate) force: bool,
}

#[derive(Args, Debug)]
pub(crate) struct TranslateArgs {
    /// Registry filter as JSON, e.g. '{"createdAt":{"_gte":"2021-01-01T00:00:00Z"}}'
    #[arg(long = "where")]
    pub(crate) filter: String,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// JSON file holding the bordereaux to index
    #[arg(long)]
    pub(crate) fixtures: PathBuf,
    /// Registry filter as JSON (defaults to every document)
    #[arg(long = "where", default_value = "{}")]
    pub(crate) filter: String,
    /// Write the CSV here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

type FixtureService = RegistryService<InMemoryBsdRepository, InMemoryIndex>;

fn load_service(
    config: &AppConfig,
    fixtures: &Path,
) -> Result<(FixtureService, usize), AppError> {
    let repository = InMemoryBsdRepository::from_path(fixtures)?;
    let loaded = repository.len();
    let service = RegistryService::new(
        Arc::new(repository),
        Arc::new(InMemoryIndex::new()),
        &config.index,
    );
    Ok((service, loaded))
}

pub(crate) async fn run_reindex(args: ReindexArgs) -> Result<(), AppError> {
    let ReindexArgs {
        fixtures,
        bsd_type,
        force,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let (service, loaded) = load_service(&config, &fixtures)?;
    let outcome = service
        .rebuild(config.environment, bsd_type, force, Utc::now())
        .await?;

    println!("Reindex of {} ({} bordereaux loaded)", fixtures.display(), loaded);
    match &outcome.plan {
        ReindexPlan::InPlace { index } => println!("  plan: in place on {index}"),
        ReindexPlan::NewIndex { index } => println!("  plan: new index {index}"),
    }
    let report = &outcome.report;
    println!("  chunks: {}", report.chunks);
    println!("  indexed: {}", report.indexed);
    println!("  failed chunks: {}", report.failed_chunks);
    if !report.failed_ids.is_empty() {
        println!("  failed ids: {}", report.failed_ids.join(", "));
    }
    println!(
        "  alias `{}`: {}",
        service.alias(),
        if outcome.alias_switched {
            "switched"
        } else {
            "unchanged"
        }
    );

    Ok(())
}

pub(crate) fn run_translate(args: TranslateArgs) -> Result<(), AppError> {
    let expression = FilterExpression::from_json(&args.filter)?;
    let body = to_query_body(&translate(&expression)?);
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

pub(crate) async fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs {
        fixtures,
        filter,
        output,
    } = args;

    let expression = FilterExpression::from_json(&filter)?;
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let (service, _) = load_service(&config, &fixtures)?;
    service
        .rebuild(config.environment, None, false, Utc::now())
        .await?;

    let rows = match &output {
        Some(path) => {
            let file = BufWriter::new(File::create(path)?);
            service.export(&expression, file).await?
        }
        None => {
            let mut buffer = Vec::new();
            let rows = service.export(&expression, &mut buffer).await?;
            let mut handle = io::stdout().lock();
            handle.write_all(&buffer)?;
            handle.flush()?;
            rows
        }
    };

    if let Some(path) = output {
        println!("Exported {rows} rows to {}", path.display());
    }
    Ok(())
}
