//! Named scenario table
use crate::DriverError;
use labdriver_core::Scenario;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Read-only, name-keyed set of scenarios.
///
/// Built once and handed to whoever needs it; nothing global. Use [`ScenarioRegistry::builtin`]
/// for the workshop cases or load an alternate set with [`ScenarioRegistry::from_json_file`].
#[derive(Debug, Clone, Default)]
pub struct ScenarioRegistry {
    scenarios: BTreeMap<String, Scenario>,
}

impl ScenarioRegistry {
    /// Validates every scenario and rejects duplicate names.
    pub fn from_scenarios(
        scenarios: impl IntoIterator<Item = Scenario>,
    ) -> Result<Self, DriverError> {
        let mut map = BTreeMap::new();
        for scenario in scenarios {
            scenario.validate()?;
            if map.contains_key(&scenario.name) {
                return Err(DriverError::DuplicateScenario(scenario.name));
            }
            map.insert(scenario.name.clone(), scenario);
        }
        Ok(Self { scenarios: map })
    }

    /// Load a JSON array of scenarios.
    pub fn from_json_file(path: &Path) -> Result<Self, DriverError> {
        let file_error = |reason: String| DriverError::ScenarioFile {
            path: path.to_path_buf(),
            reason,
        };

        let contents = std::fs::read_to_string(path).map_err(|err| file_error(err.to_string()))?;
        let scenarios: Vec<Scenario> =
            serde_json::from_str(&contents).map_err(|err| file_error(err.to_string()))?;
        debug!("Loaded {} scenarios from {}", scenarios.len(), path.display());

        Self::from_scenarios(scenarios)
    }

    /// The four workshop failure-pattern cases.
    pub fn builtin() -> Self {
        let scenarios = builtin_scenarios()
            .into_iter()
            .map(|scenario| (scenario.name.clone(), scenario))
            .collect();
        Self { scenarios }
    }

    pub fn get(&self, name: &str) -> Result<&Scenario, DriverError> {
        self.scenarios
            .get(name)
            .ok_or_else(|| DriverError::UnknownScenario {
                name: name.to_string(),
                available: self.names().into_iter().map(String::from).collect(),
            })
    }

    /// Scenario names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.scenarios.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "timeouts".to_string(),
            description: "Case 1: Timeout patterns - calls to slow dependency without deadline"
                .to_string(),
            target_url: "http://localhost:8080/cases/timeouts".to_string(),
            method: "GET".to_string(),
            body: None,
            rps: 10,
            duration: Duration::from_secs(30),
            concurrency: 20,
            max_p95_ms: 2500.,
            max_err_rate: 0.1,
            db_stats_url: None,
            hpa_stats_url: None,
            batch_url: None,
        },
        Scenario {
            name: "tx".to_string(),
            description: "Case 2: DB transaction scope - holding TX across network calls"
                .to_string(),
            target_url: "http://localhost:8080/cases/tx".to_string(),
            method: "GET".to_string(),
            body: None,
            rps: 10,
            duration: Duration::from_secs(30),
            concurrency: 20,
            max_p95_ms: 3000.,
            max_err_rate: 0.1,
            db_stats_url: Some("http://localhost:8080/debug/dbstats".to_string()),
            hpa_stats_url: None,
            batch_url: None,
        },
        Scenario {
            name: "bulkheads".to_string(),
            description: "Case 3: Bulkhead pattern - shared pool starvation".to_string(),
            target_url: "http://localhost:8081/batches".to_string(),
            method: "POST".to_string(),
            body: Some(r#"{"fast": 100, "slow": 20}"#.to_string()),
            rps: 1,
            duration: Duration::from_secs(10),
            concurrency: 5,
            max_p95_ms: 500.,
            max_err_rate: 0.05,
            db_stats_url: None,
            hpa_stats_url: None,
            batch_url: Some("http://localhost:8081/batches".to_string()),
        },
        Scenario {
            name: "autoscale".to_string(),
            description: "Case 4: Autoscaling - CPU-bound without HPA".to_string(),
            target_url: "http://localhost:8080/cases/autoscale".to_string(),
            method: "GET".to_string(),
            body: None,
            rps: 20,
            duration: Duration::from_secs(60),
            concurrency: 30,
            max_p95_ms: 5000.,
            max_err_rate: 0.1,
            db_stats_url: None,
            hpa_stats_url: None,
            batch_url: None,
        },
    ]
}
