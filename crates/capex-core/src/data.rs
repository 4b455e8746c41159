//! Model data files (YAML or JSON).
//!
//! A model data file describes the sets and parameters the reference
//! capacity-expansion model is built from: load zones, investment periods,
//! daily timeseries with their timepoints, zonal demand, candidate projects,
//! optional balancing areas and the scenarios of the stochastic program.
//!
//! ```yaml
//! name: 3zone_toy
//! discount_rate: 0.07
//! load_zones: [North, Central, South]
//! periods: ["2020", "2030"]
//! timeseries:
//!   - id: 2020_day
//!     period: "2020"
//!     hours_per_timepoint: 12
//!     timepoints: [2020_day_00, 2020_day_12]
//! zone_demand:
//!   - { zone: North, timepoint: 2020_day_00, demand_mw: 120 }
//! projects:
//!   - { name: north_gas, zone: North, capital_cost_per_mw: 1.2e6, variable_cost_per_mwh: 45 }
//! scenarios:
//!   - { scenario_id: LowLoad, probability: 0.5, load_scale: 0.9 }
//!   - { scenario_id: HighLoad, probability: 0.5, load_scale: 1.1 }
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelData {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_discount_rate")]
    pub discount_rate: f64,
    pub load_zones: Vec<String>,
    pub periods: Vec<String>,
    pub timeseries: Vec<TimeseriesSpec>,
    #[serde(default)]
    pub zone_demand: Vec<ZoneDemand>,
    /// Balancing area -> member load zones
    #[serde(default)]
    pub balancing_areas: BTreeMap<String, Vec<String>>,
    /// Whether the model carries a spinning reserve requirement that other
    /// modules can contribute provisions to
    #[serde(default)]
    pub spinning_reserves: bool,
    #[serde(default)]
    pub projects: Vec<ProjectSpec>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeseriesSpec {
    pub id: String,
    pub period: String,
    /// Hours represented by each timepoint (weights operating costs)
    #[serde(default = "default_hours")]
    pub hours_per_timepoint: f64,
    pub timepoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDemand {
    pub zone: String,
    pub timepoint: String,
    pub demand_mw: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: String,
    pub zone: String,
    /// Overnight capital cost ($/MW)
    pub capital_cost_per_mw: f64,
    #[serde(default = "default_lifetime")]
    pub lifetime_years: u32,
    /// Variable operating cost ($/MWh)
    #[serde(default)]
    pub variable_cost_per_mwh: f64,
    pub max_capacity_mw: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub scenario_id: String,
    pub description: Option<String>,
    #[serde(default = "default_probability")]
    pub probability: f64,
    #[serde(default = "default_scale")]
    pub load_scale: f64,
}

fn default_name() -> String {
    "capex".to_string()
}

fn default_discount_rate() -> f64 {
    0.07
}

fn default_hours() -> f64 {
    1.0
}

fn default_lifetime() -> u32 {
    20
}

fn default_probability() -> f64 {
    1.0
}

fn default_scale() -> f64 {
    1.0
}

impl ModelData {
    /// Load model data, choosing the format from the file extension and
    /// falling back to YAML-then-JSON for anything else.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading model data '{}'", path.display()))?;
        let parsed: ModelData = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                serde_yaml::from_str(&data).context("parsing model data yaml")?
            }
            Some(ext) if ext.eq_ignore_ascii_case("json") => {
                serde_json::from_str(&data).context("parsing model data json")?
            }
            _ => serde_yaml::from_str(&data)
                .or_else(|_| serde_json::from_str(&data))
                .context("parsing model data")?,
        };
        parsed
            .validate()
            .with_context(|| format!("validating model data '{}'", path.display()))?;
        debug!(
            path = %path.display(),
            zones = parsed.load_zones.len(),
            timeseries = parsed.timeseries.len(),
            scenarios = parsed.scenarios.len(),
            "model data loaded"
        );
        Ok(parsed)
    }

    /// Check cross references between sets and parameters.
    pub fn validate(&self) -> Result<()> {
        if self.load_zones.is_empty() {
            return Err(anyhow!("model data declares no load zones"));
        }
        if self.periods.is_empty() {
            return Err(anyhow!("model data declares no periods"));
        }
        ensure_unique("load zone", &self.load_zones)?;
        ensure_unique("period", &self.periods)?;
        if !(0.0..1.0).contains(&self.discount_rate) {
            return Err(anyhow!(
                "discount_rate must be in [0, 1), got {}",
                self.discount_rate
            ));
        }

        let zones: HashSet<&str> = self.load_zones.iter().map(String::as_str).collect();
        let periods: HashSet<&str> = self.periods.iter().map(String::as_str).collect();

        let ts_ids: Vec<String> = self.timeseries.iter().map(|ts| ts.id.clone()).collect();
        ensure_unique("timeseries", &ts_ids)?;
        let mut timepoints = HashSet::new();
        for ts in &self.timeseries {
            if !periods.contains(ts.period.as_str()) {
                return Err(anyhow!(
                    "timeseries '{}' refers to unknown period '{}'",
                    ts.id,
                    ts.period
                ));
            }
            if ts.timepoints.is_empty() {
                return Err(anyhow!("timeseries '{}' has no timepoints", ts.id));
            }
            if ts.hours_per_timepoint <= 0.0 {
                return Err(anyhow!(
                    "timeseries '{}' must have positive hours_per_timepoint",
                    ts.id
                ));
            }
            for tp in &ts.timepoints {
                if !timepoints.insert(tp.as_str()) {
                    return Err(anyhow!("timepoint '{}' appears in more than one timeseries", tp));
                }
            }
        }

        let mut seen_demand = HashSet::new();
        for row in &self.zone_demand {
            if !zones.contains(row.zone.as_str()) {
                return Err(anyhow!("demand row refers to unknown zone '{}'", row.zone));
            }
            if !timepoints.contains(row.timepoint.as_str()) {
                return Err(anyhow!(
                    "demand row refers to unknown timepoint '{}'",
                    row.timepoint
                ));
            }
            if row.demand_mw < 0.0 || !row.demand_mw.is_finite() {
                return Err(anyhow!(
                    "demand for ({}, {}) must be a non-negative number, got {}",
                    row.zone,
                    row.timepoint,
                    row.demand_mw
                ));
            }
            if !seen_demand.insert((row.zone.as_str(), row.timepoint.as_str())) {
                return Err(anyhow!(
                    "duplicate demand row for ({}, {})",
                    row.zone,
                    row.timepoint
                ));
            }
        }

        for (area, members) in &self.balancing_areas {
            for zone in members {
                if !zones.contains(zone.as_str()) {
                    return Err(anyhow!(
                        "balancing area '{}' refers to unknown zone '{}'",
                        area,
                        zone
                    ));
                }
            }
        }

        let project_names: Vec<String> = self.projects.iter().map(|p| p.name.clone()).collect();
        ensure_unique("project", &project_names)?;
        for project in &self.projects {
            if !zones.contains(project.zone.as_str()) {
                return Err(anyhow!(
                    "project '{}' refers to unknown zone '{}'",
                    project.name,
                    project.zone
                ));
            }
            if project.capital_cost_per_mw < 0.0 {
                return Err(anyhow!("project '{}' has negative capital cost", project.name));
            }
            if project.lifetime_years == 0 {
                return Err(anyhow!("project '{}' must have lifetime_years >= 1", project.name));
            }
        }

        self.resolve_scenarios().map(|_| ())
    }

    /// Scenarios of the stochastic program; a single `Base` scenario when
    /// none are declared.
    pub fn resolve_scenarios(&self) -> Result<Vec<ScenarioSpec>> {
        if self.scenarios.is_empty() {
            return Ok(vec![ScenarioSpec {
                scenario_id: "Base".to_string(),
                description: None,
                probability: 1.0,
                load_scale: 1.0,
            }]);
        }
        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if scenario.scenario_id.trim().is_empty() {
                return Err(anyhow!("scenario_id cannot be empty"));
            }
            if !seen.insert(scenario.scenario_id.as_str()) {
                return Err(anyhow!(
                    "duplicate scenario_id '{}' in model data",
                    scenario.scenario_id
                ));
            }
            if !(0.0..=1.0).contains(&scenario.probability) {
                return Err(anyhow!(
                    "scenario '{}' probability must be in [0, 1]",
                    scenario.scenario_id
                ));
            }
            if scenario.load_scale < 0.0 {
                return Err(anyhow!(
                    "scenario '{}' load_scale must be non-negative",
                    scenario.scenario_id
                ));
            }
        }
        let total: f64 = self.scenarios.iter().map(|s| s.probability).sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(anyhow!("scenario probabilities sum to {}, expected 1", total));
        }
        Ok(self.scenarios.clone())
    }

    /// All timepoints in timeseries order.
    pub fn timepoints(&self) -> Vec<&str> {
        self.timeseries
            .iter()
            .flat_map(|ts| ts.timepoints.iter().map(String::as_str))
            .collect()
    }

    /// Period of each timepoint.
    pub fn tp_period(&self) -> HashMap<&str, &str> {
        self.timeseries
            .iter()
            .flat_map(|ts| {
                ts.timepoints
                    .iter()
                    .map(move |tp| (tp.as_str(), ts.period.as_str()))
            })
            .collect()
    }

    /// Hours represented by each timepoint.
    pub fn tp_hours(&self) -> HashMap<&str, f64> {
        self.timeseries
            .iter()
            .flat_map(|ts| {
                ts.timepoints
                    .iter()
                    .map(move |tp| (tp.as_str(), ts.hours_per_timepoint))
            })
            .collect()
    }

    /// Member zones of each balancing area. Without declared areas every
    /// load zone balances on its own.
    pub fn zones_in_balancing_area(&self) -> BTreeMap<String, Vec<String>> {
        if !self.balancing_areas.is_empty() {
            return self.balancing_areas.clone();
        }
        self.load_zones
            .iter()
            .map(|zone| (zone.clone(), vec![zone.clone()]))
            .collect()
    }

    /// Copy of the data with every demand row multiplied by `scale`.
    pub fn with_load_scale(&self, scale: f64) -> ModelData {
        let mut scaled = self.clone();
        for row in &mut scaled.zone_demand {
            row.demand_mw *= scale;
        }
        scaled
    }

    /// Baseline demand lookup; zone/timepoint pairs without a row are zero.
    pub fn demand_table(&self) -> HashMap<(&str, &str), f64> {
        self.zone_demand
            .iter()
            .map(|row| ((row.zone.as_str(), row.timepoint.as_str()), row.demand_mw))
            .collect()
    }
}

fn ensure_unique(kind: &str, values: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for value in values {
        if value.trim().is_empty() {
            return Err(anyhow!("{} name cannot be empty", kind));
        }
        if !seen.insert(value.as_str()) {
            return Err(anyhow!("duplicate {} '{}'", kind, value));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOY: &str = r#"
name: toy
load_zones: [North, South]
periods: ["2030"]
timeseries:
  - id: day
    period: "2030"
    hours_per_timepoint: 12
    timepoints: [t00, t12]
zone_demand:
  - { zone: North, timepoint: t00, demand_mw: 100 }
  - { zone: North, timepoint: t12, demand_mw: 140 }
  - { zone: South, timepoint: t00, demand_mw: 60 }
projects:
  - { name: north_gas, zone: North, capital_cost_per_mw: 1000000, variable_cost_per_mwh: 40 }
"#;

    fn toy() -> ModelData {
        serde_yaml::from_str(TOY).unwrap()
    }

    #[test]
    fn test_defaults_and_lookups() {
        let data = toy();
        data.validate().unwrap();
        assert_eq!(data.discount_rate, 0.07);
        assert_eq!(data.projects[0].lifetime_years, 20);
        assert_eq!(data.timepoints(), vec!["t00", "t12"]);
        assert_eq!(data.tp_period()["t12"], "2030");
        assert_eq!(data.tp_hours()["t00"], 12.0);
        assert_eq!(data.demand_table().get(&("South", "t12")), None);

        let scenarios = data.resolve_scenarios().unwrap();
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].scenario_id, "Base");
    }

    #[test]
    fn test_balancing_areas_default_to_zones() {
        let mut data = toy();
        let areas = data.zones_in_balancing_area();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas["North"], vec!["North".to_string()]);

        data.balancing_areas
            .insert("Island".into(), vec!["North".into(), "South".into()]);
        let areas = data.zones_in_balancing_area();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas["Island"].len(), 2);
    }

    #[test]
    fn test_load_scale_multiplies_demand() {
        let scaled = toy().with_load_scale(1.5);
        assert_eq!(scaled.demand_table()[&("North", "t12")], 210.0);
    }

    #[test]
    fn test_unknown_zone_in_demand_rejected() {
        let mut data = toy();
        data.zone_demand.push(ZoneDemand {
            zone: "East".into(),
            timepoint: "t00".into(),
            demand_mw: 1.0,
        });
        let err = data.validate().unwrap_err();
        assert!(err.to_string().contains("unknown zone 'East'"));
    }

    #[test]
    fn test_zero_lifetime_rejected() {
        let mut data = toy();
        data.projects[0].lifetime_years = 0;
        let err = data.validate().unwrap_err();
        assert!(err.to_string().contains("lifetime_years"));
    }

    #[test]
    fn test_probabilities_must_sum_to_one() {
        let mut data = toy();
        data.scenarios = vec![
            ScenarioSpec {
                scenario_id: "a".into(),
                description: None,
                probability: 0.5,
                load_scale: 1.0,
            },
            ScenarioSpec {
                scenario_id: "b".into(),
                description: None,
                probability: 0.4,
                load_scale: 1.2,
            },
        ];
        assert!(data.validate().is_err());
        data.scenarios[1].probability = 0.5;
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_shared_timepoint_rejected() {
        let mut data = toy();
        data.timeseries.push(TimeseriesSpec {
            id: "night".into(),
            period: "2030".into(),
            hours_per_timepoint: 1.0,
            timepoints: vec!["t00".into()],
        });
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_from_path_json_and_unknown_extension() {
        let data = toy();
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("model.json");
        fs::write(&json_path, serde_json::to_string(&data).unwrap()).unwrap();
        let loaded = ModelData::from_path(&json_path).unwrap();
        assert_eq!(loaded.name, "toy");

        let other_path = dir.path().join("model.txt");
        let mut file = fs::File::create(&other_path).unwrap();
        file.write_all(TOY.as_bytes()).unwrap();
        assert_eq!(ModelData::from_path(&other_path).unwrap().load_zones.len(), 2);
    }

    #[test]
    fn test_from_path_reports_file() {
        let err = ModelData::from_path(Path::new("/nonexistent/model.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/model.yaml"));
    }
}
