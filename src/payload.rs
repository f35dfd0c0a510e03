/// Event payload: the YAML document a workflow scheduler hands to each
/// plugin run.
///
/// A payload names the configuration file, the hydrographs to analyze
/// (`linked_inputs`), where results go (`output_destination` plus the
/// first `required_outputs` entry) and which realization/event the run
/// belongs to. The last part doubles as the run's status key.
///
/// ```yaml
/// target_plugin: hydrograph_stats
/// model_configuration:
///   model_configuration_paths: [data/config.yml]
/// model_links:
///   linked_inputs:
///     - name: hsm1
///       parameter: flow
///       format: csv
///       resource_info: {root: data/realization_0/event_7, path: hsm1.csv}
///   required_outputs:
///     - name: results.json
/// event_config:
///   output_destination: data/realization_0/event_7
///   realization: {index: 0, seed: 1234}
///   event: {index: 7, seed: 5678}
/// ```

use serde::Deserialize;

use crate::error::PayloadError;
use crate::storage::{Storage, join_locator};

const DEFAULT_PLUGIN: &str = "hydrograph_stats";

fn default_plugin() -> String {
    DEFAULT_PLUGIN.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventPayload {
    #[serde(default = "default_plugin")]
    pub target_plugin: String,
    pub model_configuration: ModelConfiguration,
    pub model_links: ModelLinks,
    pub event_config: EventConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfiguration {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub model_configuration_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelLinks {
    #[serde(default)]
    pub linked_inputs: Vec<LinkedInput>,
    #[serde(default)]
    pub required_outputs: Vec<RequiredOutput>,
}

/// One input hydrograph. Exactly one of `source` and `resource_info`
/// must be present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkedInput {
    pub name: String,
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub resource_info: Option<ResourceInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceInfo {
    pub root: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequiredOutput {
    pub name: String,
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventConfig {
    pub output_destination: String,
    pub realization: IndexedSeed,
    pub event: IndexedSeed,
    /// Simulation window. Informational only; hydrographs are not clipped.
    #[serde(default)]
    pub time_window: Option<TimeWindow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IndexedSeed {
    pub index: i64,
    pub seed: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeWindow {
    pub starttime: String,
    pub endtime: String,
}

/// A linked input resolved to a single locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedSource {
    pub name: String,
    pub locator: String,
    /// Format tag as written in the payload (`csv`, `rdb`, `dss`, ...).
    pub format: Option<String>,
}

impl EventPayload {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PayloadError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Fetches and parses a payload document.
    pub fn load(storage: &dyn Storage, locator: &str) -> Result<Self, PayloadError> {
        let raw = storage.fetch(locator)?;
        let text = std::str::from_utf8(&raw).map_err(|_| PayloadError::Encoding)?;
        Self::from_yaml_str(text)
    }

    /// Input locators in payload order.
    ///
    /// # Errors
    /// `PayloadError::AmbiguousInput` if an input has neither or both of
    /// `source` and `resource_info`.
    pub fn linked_sources(&self) -> Result<Vec<LinkedSource>, PayloadError> {
        self.model_links
            .linked_inputs
            .iter()
            .map(|input| {
                let locator = match (&input.source, &input.resource_info) {
                    (Some(source), None) => source.clone(),
                    (None, Some(info)) => join_locator(&info.root, &info.path),
                    _ => return Err(PayloadError::AmbiguousInput(input.name.clone())),
                };
                Ok(LinkedSource {
                    name: input.name.clone(),
                    locator,
                    format: input.format.clone(),
                })
            })
            .collect()
    }

    /// Where the results document is written. Without a required output the
    /// destination itself is the target.
    pub fn output_locator(&self) -> String {
        let destination = &self.event_config.output_destination;
        match self.model_links.required_outputs.first() {
            Some(output) => join_locator(destination, &output.name),
            None => destination.clone(),
        }
    }

    /// `{plugin}_R{realization}_E{event}_S{event seed}`.
    pub fn status_key(&self) -> String {
        let ec = &self.event_config;
        format!(
            "{}_R{}_E{}_S{}",
            self.target_plugin, ec.realization.index, ec.event.index, ec.event.seed
        )
    }

    /// The configuration file the run should load.
    pub fn config_locator(&self) -> Result<&str, PayloadError> {
        self.model_configuration
            .model_configuration_paths
            .first()
            .map(String::as_str)
            .ok_or(PayloadError::NoConfiguration)
    }
}
