//! Optional per-period demand response shares.
//!
//! `demand_response_max_share.tab` is tab-delimited:
//!
//! ```text
//! PERIOD	demand_response_max_share
//! 2020	0.05
//! 2030	0.15
//! ```
//!
//! Periods without a row fall back to `--demand-response-share`.

use anyhow::{anyhow, Context, Result};
use capex_core::Diagnostics;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

pub const MAX_SHARE_FILE: &str = "demand_response_max_share.tab";

#[derive(Debug, Deserialize)]
struct MaxShareRecord {
    #[serde(rename = "PERIOD")]
    period: String,
    demand_response_max_share: f64,
}

/// Load `demand_response_max_share.tab` from `inputs_dir`.
///
/// The file is optional: a missing file yields an empty map.
pub fn load_inputs(inputs_dir: &Path) -> Result<BTreeMap<String, f64>> {
    let path = inputs_dir.join(MAX_SHARE_FILE);
    if !path.exists() {
        debug!(path = %path.display(), "no demand response share file; using default share");
        return Ok(BTreeMap::new());
    }

    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(Trim::All)
        .from_path(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut shares = BTreeMap::new();
    for (row, result) in rdr.deserialize().enumerate() {
        let record: MaxShareRecord = result
            .with_context(|| format!("parsing {} row {}", path.display(), row + 1))?;
        if !(0.0..=1.0).contains(&record.demand_response_max_share) {
            return Err(anyhow!(
                "{} row {}: demand_response_max_share for period '{}' must be in [0, 1], got {}",
                path.display(),
                row + 1,
                record.period,
                record.demand_response_max_share
            ));
        }
        if shares
            .insert(record.period.clone(), record.demand_response_max_share)
            .is_some()
        {
            return Err(anyhow!(
                "{}: duplicate row for period '{}'",
                path.display(),
                record.period
            ));
        }
    }
    Ok(shares)
}

/// Full `demand_response_max_share[period]` parameter: loaded values where
/// present, `default` elsewhere. Rows for periods the model does not know
/// are ignored with a warning, also recorded in `diagnostics`.
pub fn resolve_max_share(
    periods: &[String],
    loaded: &BTreeMap<String, f64>,
    default: f64,
    diagnostics: &mut Diagnostics,
) -> BTreeMap<String, f64> {
    for period in loaded.keys() {
        if !periods.contains(period) {
            warn!(period = %period, "ignoring demand response share for unknown period");
            diagnostics.add_warning_with_entity(
                "inputs",
                "demand response share row for unknown period ignored",
                period,
            );
        }
    }
    periods
        .iter()
        .map(|p| (p.clone(), loaded.get(p).copied().unwrap_or(default)))
        .collect()
}
