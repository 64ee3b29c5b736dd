use crate::sim::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub mode: String,
    pub quota: String,
    #[serde(rename = "totalWeight")]
    pub total_weight: String,
    pub trials: Option<String>,
    pub seed: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntity {
    pub id: String,
    pub weight: JSValue,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RosterSource {
    pub preset: Option<String>,
    pub entities: Option<Vec<RosterEntity>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SimRules {
    pub mode: String,
    pub quota: Option<JSValue>,
    pub trials: Option<JSValue>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioEntry {
    pub id: String,
    pub outcome: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub roster: RosterSource,
    pub rules: SimRules,
    pub scenario: Option<Vec<ScenarioEntry>>,
}

impl SimRules {
    pub fn quota(&self) -> SimResult<Option<u32>> {
        match &self.quota {
            None => Ok(None),
            x => Ok(Some(
                u32::try_from(read_js_int(x)?)
                    .ok()
                    .context(ParsingJsonNumberSnafu {})?,
            )),
        }
    }

    pub fn trials(&self) -> SimResult<Option<u64>> {
        match &self.trials {
            None => Ok(None),
            x => Ok(Some(read_js_int(x)? as u64)),
        }
    }

    pub fn seed(&self) -> SimResult<Option<u64>> {
        match &self.random_seed {
            None => Ok(None),
            Some(s) => Ok(Some(
                s.parse::<u64>()
                    .ok()
                    .context(ParsingJsonNumberSnafu {})?,
            )),
        }
    }
}

impl RosterEntity {
    pub fn weight(&self) -> SimResult<u32> {
        let w = read_js_int(&Some(self.weight.clone()))?;
        u32::try_from(w).ok().context(ParsingJsonNumberSnafu {})
    }
}

pub fn read_config(path: &str) -> SimResult<SimConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SimConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> SimResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> SimResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_numbers_and_strings() {
        let js = r#"{
            "outputSettings": {"contestName": "test"},
            "roster": {"entities": [{"id": "A", "weight": 3}, {"id": "B", "weight": "2"}]},
            "rules": {"mode": "simulate", "quota": "4", "trials": 10, "randomSeed": "5"}
        }"#;
        let config: SimConfig = serde_json::from_str(js).unwrap();
        let entities = config.roster.entities.clone().unwrap();
        assert_eq!(entities[0].weight().unwrap(), 3);
        assert_eq!(entities[1].weight().unwrap(), 2);
        assert_eq!(config.rules.quota().unwrap(), Some(4));
        assert_eq!(config.rules.trials().unwrap(), Some(10));
        assert_eq!(config.rules.seed().unwrap(), Some(5));
        assert!(config.scenario.is_none());
    }

    #[test]
    fn rejects_bad_numbers() {
        let rules = SimRules {
            mode: "simulate".to_string(),
            quota: Some(JSValue::String("many".to_string())),
            trials: Some(JSValue::Bool(true)),
            random_seed: Some("-1".to_string()),
        };
        assert!(rules.quota().is_err());
        assert!(rules.trials().is_err());
        assert!(rules.seed().is_err());
    }
}
