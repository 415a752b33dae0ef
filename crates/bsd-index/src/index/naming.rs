use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::{AppEnvironment, IndexConfig};

/// Concrete index name: `<alias>_<mappings_version>_<env>_<timestamp>`.
///
/// The timestamp is RFC 3339 with `:` replaced by `===`, and the whole name is
/// lower-cased so it is accepted as an index name. A `_` in the mappings version
/// becomes `-`, so the name always splits back into its four parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexName {
    pub alias: String,
    pub mappings_version: String,
    pub environment: String,
    pub created_at: DateTime<Utc>,
}

impl IndexName {
    pub fn new(config: &IndexConfig, environment: AppEnvironment, created_at: DateTime<Utc>) -> Self {
        Self {
            alias: config.alias.to_ascii_lowercase(),
            mappings_version: Self::version_segment(&config.mappings_version),
            environment: environment.label().to_string(),
            created_at,
        }
    }

    fn version_segment(version: &str) -> String {
        version.to_ascii_lowercase().replace('_', "-")
    }

    fn encode_timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace(':', "===")
            .to_ascii_lowercase()
    }

    fn decode_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let restored = raw.replace("===", ":").to_ascii_uppercase();
        DateTime::parse_from_rfc3339(&restored)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.alias,
            self.mappings_version,
            self.environment,
            Self::encode_timestamp(self.created_at)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a versioned index name")]
pub struct InvalidIndexName(pub String);

impl FromStr for IndexName {
    type Err = InvalidIndexName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidIndexName(value.to_string());
        // The alias may itself contain underscores, so split from the right.
        let mut parts = value.rsplitn(4, '_');
        let timestamp = parts.next().ok_or_else(invalid)?;
        let environment = parts.next().ok_or_else(invalid)?;
        let mappings_version = parts.next().ok_or_else(invalid)?;
        let alias = parts.next().filter(|alias| !alias.is_empty()).ok_or_else(invalid)?;

        Ok(Self {
            alias: alias.to_string(),
            mappings_version: mappings_version.to_string(),
            environment: environment.to_string(),
            created_at: Self::decode_timestamp(timestamp).ok_or_else(invalid)?,
        })
    }
}

/// Where a bulk reindex writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReindexPlan {
    /// Mappings are unchanged: overwrite documents in the index behind the alias.
    InPlace { index: String },
    /// Build a fresh index, then point the alias at it once the job succeeds.
    NewIndex { index: IndexName },
}

impl ReindexPlan {
    /// Index name the job writes to.
    pub fn target(&self) -> String {
        match self {
            Self::InPlace { index } => index.clone(),
            Self::NewIndex { index } => index.to_string(),
        }
    }

    /// Decides from the index the alias currently points at.
    pub fn decide(
        current: Option<&str>,
        config: &IndexConfig,
        environment: AppEnvironment,
        force: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let reusable = current.filter(|name| {
            !force
                && name
                    .parse::<IndexName>()
                    .map(|parsed| {
                        parsed.mappings_version == IndexName::version_segment(&config.mappings_version)
                    })
                    .unwrap_or(false)
        });

        match reusable {
            Some(index) => Self::InPlace {
                index: index.to_string(),
            },
            None => Self::NewIndex {
                index: IndexName::new(config, environment, now),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config(version: &str) -> IndexConfig {
        IndexConfig {
            alias: "bsds".into(),
            mappings_version: version.into(),
            ..IndexConfig::default()
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 4, 10, 20, 30).single().expect("valid date")
    }

    #[test]
    fn formats_names_with_encoded_timestamp() {
        let name = IndexName::new(&config("V2"), AppEnvironment::Production, at());
        assert_eq!(
            name.to_string(),
            "bsds_v2_prod_2021-03-04t10===20===30.000z"
        );
    }

    #[test]
    fn parses_names_back() {
        let parsed: IndexName = "bsds_archive_v2_prod_2021-03-04t10===20===30.000z"
            .parse()
            .expect("valid name");
        assert_eq!(parsed.alias, "bsds_archive");
        assert_eq!(parsed.mappings_version, "v2");
        assert_eq!(parsed.environment, "prod");
        assert_eq!(parsed.created_at, at());

        assert!("bsds".parse::<IndexName>().is_err());
        assert!("bsds_v1_dev_yesterday".parse::<IndexName>().is_err());
    }

    #[test]
    fn reindexes_in_place_only_when_mappings_match() {
        let current = "bsds_v1_dev_2021-03-04t10===20===30.000z";

        let same = ReindexPlan::decide(Some(current), &config("v1"), AppEnvironment::Development, false, at());
        assert_eq!(same, ReindexPlan::InPlace { index: current.to_string() });

        let forced = ReindexPlan::decide(Some(current), &config("v1"), AppEnvironment::Development, true, at());
        assert!(matches!(forced, ReindexPlan::NewIndex { .. }));

        let bumped = ReindexPlan::decide(Some(current), &config("v2"), AppEnvironment::Development, false, at());
        match bumped {
            ReindexPlan::NewIndex { index } => assert_eq!(index.mappings_version, "v2"),
            other => panic!("expected a new index, got {other:?}"),
        }

        let fresh = ReindexPlan::decide(None, &config("v1"), AppEnvironment::Test, false, at());
        assert_eq!(fresh.target(), "bsds_v1_test_2021-03-04t10===20===30.000z");
    }

    #[test]
    fn underscored_versions_still_round_trip() {
        let fresh = ReindexPlan::decide(None, &config("V1_1"), AppEnvironment::Production, false, at());
        let name = fresh.target();
        assert_eq!(name, "bsds_v1-1_prod_2021-03-04t10===20===30.000z");

        let parsed: IndexName = name.parse().expect("valid name");
        assert_eq!(parsed.alias, "bsds");
        assert_eq!(parsed.mappings_version, "v1-1");

        let again = ReindexPlan::decide(Some(&name), &config("v1_1"), AppEnvironment::Production, false, at());
        assert_eq!(again, ReindexPlan::InPlace { index: name });
    }
}
