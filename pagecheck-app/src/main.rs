use anyhow::{Context, Result};
use clap::Parser;
use pagecheck_checks::CheckService;
use pagecheck_common::observability::init_logging;
use pagecheck_config::{PagecheckConfig, PagecheckConfigLoader};
use pagecheck_http::HttpFetcher;
use pagecheck_store::SiteRepository;
use std::process::ExitCode;

mod cli;
mod render;

use cli::{Cli, Command};

const DEFAULT_CONFIG_FILE: &str = "pagecheck.yaml";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1) Config: file (optional unless --config), then env
    let loader = match &cli.config {
        Some(path) => PagecheckConfigLoader::new().with_file(path),
        None => PagecheckConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg: PagecheckConfig = loader.with_env().load().context("loading configuration")?;

    // 2) Logging
    let log_path = init_logging(cfg.logging.to_log_config())?;
    tracing::debug!(log_path = %log_path.display(), "app.logging_ready");

    // 3) Storage + fetcher, built once and shared by every command
    let pool = pagecheck_store::connect(&cfg.database)
        .await
        .with_context(|| format!("opening database {}", cfg.database.url))?;
    pagecheck_store::migrate(&pool).await.context("bootstrapping schema")?;
    let fetcher = HttpFetcher::from_config(&cfg.fetch)?;
    let service = CheckService::new(SiteRepository::new(pool), fetcher);

    let code = run(&service, cli.command, cli.format).await?;
    Ok(code)
}

async fn run(
    service: &CheckService<HttpFetcher>,
    command: Command,
    format: cli::OutputFormat,
) -> Result<ExitCode> {
    let out = render::Renderer::new(format);
    match command {
        Command::Register { url } => match service.register(&url).await {
            Ok(reg) => {
                out.registration(&reg)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(err) if err.is_soft() => {
                out.soft_rejection(&url)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => match err.field_error() {
                Some(field) => {
                    out.field_error(&url, field, &err.to_string())?;
                    Ok(ExitCode::from(2))
                }
                None => Err(err.into()),
            },
        },
        Command::Check { site_id } => match service.run_check(site_id).await {
            Ok(report) => {
                out.check_report(&report)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(err) if err.is_transient() => {
                out.check_failure(site_id, &err)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(pagecheck_checks::CheckError::SiteNotFound(id)) => {
                out.not_found(id)?;
                Ok(ExitCode::FAILURE)
            }
            Err(err) => Err(err.into()),
        },
        Command::Sites => {
            let sites = service.repository().list_all_with_latest_check().await?;
            out.site_listing(&sites)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { site_id } => {
            let repo = service.repository();
            let site = match repo.get_by_id(site_id).await {
                Ok(site) => site,
                Err(pagecheck_store::StoreError::SiteNotFound(id)) => {
                    out.not_found(id)?;
                    return Ok(ExitCode::FAILURE);
                }
                Err(err) => return Err(err.into()),
            };
            let checks = repo.list_checks_for_site(site_id).await?;
            out.site_detail(&site, &checks)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
