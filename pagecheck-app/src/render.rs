//! Terminal output for each command, as plain text or JSON.

use crate::cli::OutputFormat;
use anyhow::Result;
use chrono::{DateTime, Utc};
use pagecheck_checks::{CheckError, CheckReport, Notice, Registration};
use pagecheck_store::{Check, Site, SiteId, SiteWithLatestCheck};
use serde::Serialize;
use serde_json::json;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct Renderer {
    format: OutputFormat,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn registration(&self, reg: &Registration) -> Result<()> {
        let notice = reg.notice();
        match self.format {
            OutputFormat::Json => emit(&json!({ "notice": notice, "site": reg.site, "created": reg.created })),
            OutputFormat::Text => {
                println!("{notice}");
                println!("{}", site_line(&reg.site));
                Ok(())
            }
        }
    }

    pub fn soft_rejection(&self, input: &str) -> Result<()> {
        match self.format {
            OutputFormat::Json => emit(&json!({ "redirect": "home", "input": input })),
            OutputFormat::Text => {
                println!("Nothing registered: enter a full URL such as https://example.com");
                Ok(())
            }
        }
    }

    pub fn field_error(&self, input: &str, field: &str, detail: &str) -> Result<()> {
        match self.format {
            OutputFormat::Json => emit(&json!({
                "input": input,
                "errors": { "name": field },
                "detail": detail,
            })),
            OutputFormat::Text => {
                eprintln!("{field}: {input:?} ({detail})");
                Ok(())
            }
        }
    }

    pub fn check_report(&self, report: &CheckReport) -> Result<()> {
        let notice = report.notice();
        match self.format {
            OutputFormat::Json => emit(&json!({ "notice": notice, "check": report.check })),
            OutputFormat::Text => {
                println!("{notice}");
                print_check(&report.check);
                Ok(())
            }
        }
    }

    pub fn check_failure(&self, site_id: SiteId, err: &CheckError) -> Result<()> {
        let notice: Notice = err.notice();
        match self.format {
            OutputFormat::Json => emit(&json!({ "notice": notice, "site_id": site_id })),
            OutputFormat::Text => {
                println!("{notice}");
                Ok(())
            }
        }
    }

    pub fn not_found(&self, site_id: SiteId) -> Result<()> {
        match self.format {
            OutputFormat::Json => emit(&json!({ "error": "not_found", "site_id": site_id })),
            OutputFormat::Text => {
                eprintln!("Page not found: site {site_id}");
                Ok(())
            }
        }
    }

    pub fn site_listing(&self, rows: &[SiteWithLatestCheck]) -> Result<()> {
        match self.format {
            OutputFormat::Json => emit(&rows),
            OutputFormat::Text => {
                if rows.is_empty() {
                    println!("No sites registered yet.");
                }
                for row in rows {
                    let (when, status) = match &row.latest_check {
                        Some(c) => (fmt_time(&c.created_at), fmt_status(c.status_code)),
                        None => ("-".to_string(), "-".to_string()),
                    };
                    println!(
                        "{:>5}  {:<40}  {:<19}  {}",
                        row.site.id, row.site.normalized_url, when, status
                    );
                }
                Ok(())
            }
        }
    }

    pub fn site_detail(&self, site: &Site, checks: &[Check]) -> Result<()> {
        match self.format {
            OutputFormat::Json => emit(&json!({ "site": site, "checks": checks })),
            OutputFormat::Text => {
                println!("{}", site_line(site));
                if checks.is_empty() {
                    println!("  no checks yet");
                }
                for check in checks {
                    print_check(check);
                }
                Ok(())
            }
        }
    }
}

fn emit<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn site_line(site: &Site) -> String {
    format!(
        "#{} {} (added {})",
        site.id,
        site.normalized_url,
        fmt_time(&site.created_at)
    )
}

fn print_check(check: &Check) {
    println!(
        "  check #{} at {}: status {}",
        check.id,
        fmt_time(&check.created_at),
        fmt_status(check.status_code)
    );
    println!("    h1:          {}", check.h1.as_deref().unwrap_or("-"));
    println!("    title:       {}", check.title.as_deref().unwrap_or("-"));
    println!("    description: {}", check.description.as_deref().unwrap_or("-"));
}

fn fmt_time(t: &DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn fmt_status(code: Option<u16>) -> String {
    code.map_or_else(|| "-".to_string(), |c| c.to_string())
}
