//! JSON snapshot format for factorization results.
//!
//! Big integers are written as decimal strings so the snapshot stays readable
//! by tools without arbitrary-precision JSON numbers.

use serde::{Deserialize, Serialize};

use crate::result::Factorization;

pub const CURRENT_VERSION: &str = "1";

/// serde adapter: `BigUint` ⇄ decimal string.
pub mod decimal {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(n: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(n)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(d)?;
        s.parse::<BigUint>()
            .map_err(|e| D::Error::custom(format!("invalid integer {s:?}: {e}")))
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Snapshot {
    pub version: String,
    pub results: Vec<Factorization>,
}

pub fn export_json(results: &[Factorization]) -> serde_json::Result<String> {
    let snapshot = SnapshotRef {
        version: CURRENT_VERSION,
        results,
    };
    serde_json::to_string_pretty(&snapshot)
}

pub fn import_json(json: &str) -> serde_json::Result<Vec<Factorization>> {
    let snapshot: Snapshot = serde_json::from_str(json)?;
    if snapshot.version != CURRENT_VERSION {
        return Err(<serde_json::Error as serde::de::Error>::custom(format!(
            "unsupported snapshot version {:?} (expected {CURRENT_VERSION:?})",
            snapshot.version
        )));
    }
    Ok(snapshot.results)
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: &'a str,
    results: &'a [Factorization],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::Budget;
    use crate::result::{Certainty, Factor, Method};
    use num_bigint::BigUint;

    fn sample() -> Factorization {
        let big: BigUint = "340282366920938463463374607431768211457".parse().unwrap();
        Factorization::from_factors(
            big.clone(),
            vec![Factor {
                value: big,
                method: Method::HeuristicIncomplete,
                certainty: Certainty::Unresolved { confidence: 0.0 },
                evidence: vec!["budget exhausted".into()],
            }],
            100,
            Budget::default(),
        )
    }

    #[test]
    fn test_big_integers_are_strings() {
        let json = export_json(&[sample()]).unwrap();
        assert!(
            json.contains("\"340282366920938463463374607431768211457\""),
            "{json}"
        );
        assert!(json.contains("\"version\": \"1\""), "{json}");
    }

    #[test]
    fn test_import_preserves_results() {
        let json = export_json(&[sample()]).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back, vec![sample()]);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let err = import_json(r#"{"version":"99","results":[]}"#).unwrap_err();
        assert!(err.to_string().contains("99"), "{err}");
    }

    #[test]
    fn test_bad_integer_rejected() {
        let json = r#"{"version":"1","results":[{"n":"12x","factors":[],"method":"trivial",
            "iterations":0,"confidence":1.0,"budget":{"max_iterations":1}}]}"#;
        assert!(import_json(json).is_err());
    }
}
