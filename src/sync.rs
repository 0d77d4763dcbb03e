use anyhow::Context;
use chrono::{DateTime, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::date::{extract_date, Timestamp};
use crate::error::{CatalogError, ExtractError};
use crate::media::Asset;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Calendar day (UTC) whose assets are examined
    pub day: NaiveDate,
    /// Only process the asset with this id
    pub asset_id: Option<String>,
    /// Report changes without writing them
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub total: u64,
    pub updated: u64,
    pub unchanged: u64,
    /// Filenames the engine could not date; skipped
    pub unrecognized: u64,
    /// Write-backs the catalog rejected
    pub failed: u64,
    /// Changes found during a dry run
    pub pending: u64,
}

/// Decision for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Update(Timestamp),
    Unchanged(Timestamp),
    Unrecognized(ExtractError),
}

/// Collect every page of assets for `day`.
pub fn fetch_day<C: Catalog + ?Sized>(
    catalog: &C,
    day: NaiveDate,
) -> Result<Vec<Asset>, CatalogError> {
    let mut assets = Vec::new();
    let mut page = 1;
    loop {
        let items = catalog.search_page(day, page)?;
        if items.is_empty() {
            break;
        }
        debug!(page, count = items.len(), "fetched page");
        assets.extend(items);
        page += 1;
    }
    Ok(assets)
}

/// True when the stored creation time differs from the filename date.
///
/// RFC 3339 values are compared as instants at second precision, anything
/// else by its text.
pub fn needs_update(stored: &str, extracted: &Timestamp) -> bool {
    match DateTime::parse_from_rfc3339(stored) {
        Ok(dt) => dt.timestamp() != extracted.unix_seconds(),
        Err(_) => stored != extracted.to_string(),
    }
}

pub fn plan_asset(asset: &Asset) -> Plan {
    match extract_date(&asset.original_file_name) {
        Ok(ts) if needs_update(&asset.file_created_at, &ts) => Plan::Update(ts),
        Ok(ts) => Plan::Unchanged(ts),
        Err(e) => Plan::Unrecognized(e),
    }
}

/// Plans for `assets`, in the same order. Extraction runs in parallel.
pub fn plan_assets(assets: &[Asset]) -> Vec<Plan> {
    assets.par_iter().map(plan_asset).collect()
}

/// Fetch the assets for one day, date them from their filenames and write
/// back the ones that disagree with the catalog.
///
/// Only the fetch is fatal. Undatable filenames and rejected updates are
/// logged, counted and skipped.
pub fn sync_day<C: Catalog + ?Sized>(catalog: &C, options: &SyncOptions) -> anyhow::Result<SyncReport> {
    let mut assets = fetch_day(catalog, options.day)
        .with_context(|| format!("failed to get assets for {}", options.day))?;

    if let Some(id) = &options.asset_id {
        assets.retain(|a| &a.id == id);
        if assets.is_empty() {
            warn!(asset_id = %id, "asset not found");
        }
    }
    info!(count = assets.len(), day = %options.day, "assets found");

    let plans = plan_assets(&assets);
    let to_write = plans
        .iter()
        .filter(|p| matches!(p, Plan::Update(_)))
        .count();

    let mut report = SyncReport {
        total: assets.len() as u64,
        ..SyncReport::default()
    };

    let pb = if options.dry_run {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(to_write as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} updating assets")
            .unwrap(),
    );

    for (asset, plan) in assets.iter().zip(plans) {
        match plan {
            Plan::Unrecognized(err) => {
                report.unrecognized += 1;
                warn!(asset_id = %asset.id, file = %err.filename(), "skipped: {}", err);
            }
            Plan::Unchanged(ts) => {
                report.unchanged += 1;
                debug!(asset_id = %asset.id, file = %asset.original_file_name, "already at {}", ts);
            }
            Plan::Update(ts) if options.dry_run => {
                report.pending += 1;
                info!(
                    asset_id = %asset.id,
                    file = %asset.original_file_name,
                    "would update {} -> {}",
                    asset.file_created_at,
                    ts
                );
            }
            Plan::Update(ts) => {
                match catalog.update_date_time_original(&asset.id, &ts) {
                    Ok(()) => {
                        report.updated += 1;
                        info!(
                            asset_id = %asset.id,
                            file = %asset.original_file_name,
                            "updated {} -> {}",
                            asset.file_created_at,
                            ts
                        );
                    }
                    Err(err) => {
                        report.failed += 1;
                        warn!(asset_id = %asset.id, "failed to update asset: {}", err);
                    }
                }
                pb.inc(1);
            }
        }
    }

    pb.finish_and_clear();
    Ok(report)
}
