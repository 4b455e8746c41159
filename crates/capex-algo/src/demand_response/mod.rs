//! Simple demand response
//!
//! Lets a share of each hour's zonal load be rescheduled to other hours of
//! the same timeseries (typically a day):
//!
//! ```text
//! ShiftDemand[z, t] ≥ -share[period(t)] · demand[z, t]      (no upper bound)
//! Σ_{t ∈ ts} ShiftDemand[z, t] = 0                          Demand_Response_Net_Zero[z, ts]
//! ```
//!
//! `ShiftDemand` is appended to the `Zone_Power_Withdrawals` registry so
//! the zonal energy balance serves the shifted load. When the model carries
//! a `Spinning_Reserve_Up_Provisions` registry, the headroom above the
//! lower bound is offered as upward reserve per balancing area.

mod inputs;

pub use inputs::{load_inputs, resolve_max_share, MAX_SHARE_FILE};

use crate::expansion::{SPINNING_RESERVE_UP_PROVISIONS, ZONE_POWER_WITHDRAWALS};
use capex_core::{
    index_key, Bounds, CapexError, CapexResult, ConstraintSense, Diagnostics, ModelData,
    ModelInstance,
};
use good_lp::Expression;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

pub const SHIFT_DEMAND: &str = "ShiftDemand";
pub const NET_ZERO: &str = "Demand_Response_Net_Zero";
pub const SPINNING_RESERVE_UP: &str = "HIDemandResponseSimpleSpinningReserveUp";

/// Default fraction of hourly load that can be shifted.
pub const DEFAULT_DEMAND_RESPONSE_SHARE: f64 = 0.10;

#[derive(Debug, Clone, Copy)]
pub struct DemandResponseOptions {
    /// Share used for every period without a row in the inputs file
    pub demand_response_share: f64,
}

impl Default for DemandResponseOptions {
    fn default() -> Self {
        Self {
            demand_response_share: DEFAULT_DEMAND_RESPONSE_SHARE,
        }
    }
}

/// What [`define_components`] added to a model.
#[derive(Debug, Clone, Serialize)]
pub struct DemandResponseSummary {
    pub shift_variables: usize,
    pub net_zero_constraints: usize,
    /// Zero when the model has no spinning reserve provisions registry
    pub reserve_expressions: usize,
    pub max_share: BTreeMap<String, f64>,
    /// Largest downward shift available per period (MW summed over zones and timepoints)
    pub shiftable_mw: BTreeMap<String, f64>,
    /// Ignored share rows
    pub diagnostics: Diagnostics,
}

/// Add the demand response components to `model`.
///
/// `loaded_shares` are the per-period rows from [`load_inputs`]; missing
/// periods use `options.demand_response_share`. The model must already
/// have the `Zone_Power_Withdrawals` registry.
pub fn define_components(
    model: &mut ModelInstance,
    data: &ModelData,
    options: &DemandResponseOptions,
    loaded_shares: &BTreeMap<String, f64>,
) -> CapexResult<DemandResponseSummary> {
    if !(0.0..=1.0).contains(&options.demand_response_share) {
        return Err(CapexError::Config(format!(
            "demand response share must be in [0, 1], got {}",
            options.demand_response_share
        )));
    }
    if !model.has_registry(ZONE_POWER_WITHDRAWALS) {
        return Err(CapexError::Model(format!(
            "demand response needs the '{}' registry",
            ZONE_POWER_WITHDRAWALS
        )));
    }

    let mut diagnostics = Diagnostics::new();
    let max_share = resolve_max_share(
        &data.periods,
        loaded_shares,
        options.demand_response_share,
        &mut diagnostics,
    );
    let tp_period = data.tp_period();
    let demand = data.demand_table();
    let timepoints = data.timepoints();

    let mut shiftable_mw: BTreeMap<String, f64> =
        data.periods.iter().map(|p| (p.clone(), 0.0)).collect();

    model.declare_var(SHIFT_DEMAND, 2)?;
    for zone in &data.load_zones {
        for &tp in &timepoints {
            let period = tp_period[tp];
            let share = max_share
                .get(period)
                .copied()
                .unwrap_or(options.demand_response_share);
            let baseline = demand.get(&(zone.as_str(), tp)).copied().unwrap_or(0.0);
            let lower = -share * baseline;
            model.add_var(
                SHIFT_DEMAND,
                index_key(&[zone.as_str(), tp]),
                Bounds::lower(lower),
            )?;
            if let Some(total) = shiftable_mw.get_mut(period) {
                *total -= lower;
            }
        }
    }

    let mut reserve_expressions = 0;
    if model.has_registry(SPINNING_RESERVE_UP_PROVISIONS) {
        for (area, zones) in data.zones_in_balancing_area() {
            for &tp in &timepoints {
                let mut headroom = Expression::from(0.0);
                for zone in &zones {
                    let shift = model.var(SHIFT_DEMAND, &[zone.as_str(), tp]).ok_or_else(|| {
                        CapexError::Model(format!("no {}[{},{}]", SHIFT_DEMAND, zone, tp))
                    })?;
                    let lower = shift.bounds.lower.unwrap_or(0.0);
                    headroom += shift.variable;
                    headroom += Expression::from(-lower);
                }
                model.add_expression(SPINNING_RESERVE_UP, index_key(&[area.as_str(), tp]), headroom)?;
                reserve_expressions += 1;
            }
        }
        model.register(SPINNING_RESERVE_UP_PROVISIONS, SPINNING_RESERVE_UP)?;
    }

    let mut net_zero_constraints = 0;
    for zone in &data.load_zones {
        for ts in &data.timeseries {
            let mut total = Expression::from(0.0);
            for tp in &ts.timepoints {
                if let Some(shift) = model.var(SHIFT_DEMAND, &[zone.as_str(), tp.as_str()]) {
                    total += shift.variable;
                }
            }
            model.add_constraint(
                NET_ZERO,
                index_key(&[zone.as_str(), ts.id.as_str()]),
                total,
                ConstraintSense::Eq,
                0.0,
            )?;
            net_zero_constraints += 1;
        }
    }

    model.register(ZONE_POWER_WITHDRAWALS, SHIFT_DEMAND)?;

    let shift_variables = data.load_zones.len() * timepoints.len();
    debug!(
        model = model.name(),
        shift_variables, net_zero_constraints, reserve_expressions, "demand response defined"
    );

    Ok(DemandResponseSummary {
        shift_variables,
        net_zero_constraints,
        reserve_expressions,
        max_share,
        shiftable_mw,
        diagnostics,
    })
}
