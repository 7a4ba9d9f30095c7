//! Check and job generation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use basalt_core::{AssetType, Catalog, Checktype, Error, Result, Target};

/// A runnable (checktype, target) pair with its effective options.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    /// Fresh identifier, unique per generated check.
    pub id: String,
    pub checktype: Checktype,
    pub target: Target,
    /// Checktype defaults with the target's overrides applied on top.
    pub options: Map<String, Value>,
}

/// Unit of work handed to the external check runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub check_id: String,
    pub image: String,
    pub target: String,
    pub asset_type: String,
    /// Effective options as a JSON object, `{}` when empty.
    pub options: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_vars: Vec<String>,
}

/// Expands the (checktype, target) cross product into checks.
///
/// A pair produces a check iff the checktype accepts the target's asset
/// type; incompatible pairs are silently excluded, so zero compatible
/// pairs is not an error. Duplicate targets (same identifier and asset
/// type) count once. A target with a missing or unrecognized asset type
/// fails the whole generation.
///
/// The returned list carries no ordering guarantee.
pub fn generate_checks(catalog: &Catalog, targets: &[Target]) -> Result<Vec<Check>> {
    let mut checks = Vec::new();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();

    for target in targets {
        let asset_type = validate_asset_type(target)?;
        if !seen.insert(target.dedup_key()) {
            debug!("skipping duplicated target {target}");
            continue;
        }

        for checktype in catalog.values() {
            if !checktype.accepts(asset_type) {
                continue;
            }
            let mut options = checktype.options.clone();
            for (key, value) in &target.options {
                options.insert(key.clone(), value.clone());
            }
            checks.push(Check {
                id: Uuid::new_v4().to_string(),
                checktype: checktype.clone(),
                target: target.clone(),
                options,
            });
        }
    }

    debug!("generated {} checks for {} targets", checks.len(), targets.len());
    Ok(checks)
}

/// Generates the job list submitted to the external runner.
///
/// Projects the checks of [`generate_checks`]; any validation failure
/// yields no jobs at all.
pub fn generate_jobs(catalog: &Catalog, targets: &[Target]) -> Result<Vec<Job>> {
    let checks = generate_checks(catalog, targets)?;
    checks.into_iter().map(job_from_check).collect()
}

fn job_from_check(check: Check) -> Result<Job> {
    let required_vars = required_var_names(&check.checktype)?;
    let options = serde_json::to_string(&check.options)?;
    Ok(Job {
        check_id: check.id,
        image: check.checktype.image,
        target: check.target.identifier,
        asset_type: check.target.asset_type,
        options,
        required_vars,
    })
}

fn validate_asset_type(target: &Target) -> Result<AssetType> {
    if target.asset_type.is_empty() {
        return Err(Error::MissingAssetType {
            identifier: target.identifier.clone(),
        });
    }
    AssetType::parse(&target.asset_type).ok_or_else(|| Error::InvalidAssetType {
        identifier: target.identifier.clone(),
        asset_type: target.asset_type.clone(),
    })
}

/// The checktype's required variables, which must all be declared as
/// strings; any other entry type marks the whole checktype as malformed.
fn required_var_names(checktype: &Checktype) -> Result<Vec<String>> {
    checktype
        .required_vars
        .iter()
        .map(|var| match var {
            Value::String(name) => Ok(name.clone()),
            _ => Err(Error::RequiredVars {
                checktype: checktype.name.clone(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn checktype(name: &str, image: &str, assets: &[&str]) -> Checktype {
        Checktype {
            name: name.to_string(),
            description: format!("{name} description"),
            image: image.to_string(),
            assets: assets.iter().map(|a| a.to_string()).collect(),
            ..Checktype::default()
        }
    }

    fn catalog_of(checktypes: Vec<Checktype>) -> Catalog {
        checktypes
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect()
    }

    #[test]
    fn test_generate_checks_single_pair() {
        let catalog = catalog_of(vec![checktype("dnsprobe", "dnsprobe:v1", &["DomainName"])]);
        let targets = vec![Target::new("example.com", "DomainName")];

        let checks = generate_checks(&catalog, &targets).unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].checktype.name, "dnsprobe");
        assert_eq!(checks[0].target.identifier, "example.com");
        assert!(checks[0].options.is_empty());
        assert!(!checks[0].id.is_empty());
    }

    #[test]
    fn test_generate_checks_target_overrides_options() {
        let mut probe = checktype("webprobe", "webprobe:v1", &["WebAddress"]);
        probe.options = serde_json::from_value(json!({
            "depth": 1,
            "timeout": 30,
            "agent": "basalt",
        }))
        .unwrap();
        let catalog = catalog_of(vec![probe]);
        let targets = vec![
            Target::new("https://example.com", "WebAddress").with_option("depth", json!(5)),
        ];

        let checks = generate_checks(&catalog, &targets).unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].options.get("depth"), Some(&json!(5)));
        assert_eq!(checks[0].options.get("timeout"), Some(&json!(30)));
        assert_eq!(checks[0].options.get("agent"), Some(&json!("basalt")));
    }

    #[test]
    fn test_generate_checks_two_checktypes() {
        let catalog = catalog_of(vec![
            checktype("dnsprobe", "dnsprobe:v1", &["DomainName"]),
            checktype("zonewalk", "zonewalk:v1", &["DomainName"]),
        ]);
        let targets = vec![Target::new("example.com", "DomainName")];

        let checks = generate_checks(&catalog, &targets).unwrap();
        assert_eq!(checks.len(), 2);
    }

    #[test]
    fn test_generate_checks_incompatible_pair_excluded() {
        let catalog = catalog_of(vec![checktype("dnsprobe", "dnsprobe:v1", &["DomainName"])]);
        let targets = vec![Target::new("git@github.com:org/repo.git", "GitRepository")];

        let checks = generate_checks(&catalog, &targets).unwrap();
        assert!(checks.is_empty());
    }

    #[test]
    fn test_generate_checks_unknown_asset_type() {
        let catalog = catalog_of(vec![checktype("dnsprobe", "dnsprobe:v1", &["Hostname"])]);
        let targets = vec![Target::new("example.com", "Satellite")];

        let err = generate_checks(&catalog, &targets).unwrap_err();
        assert!(matches!(err, Error::InvalidAssetType { .. }), "got {err:?}");
    }

    #[test]
    fn test_generate_checks_missing_asset_type() {
        let catalog = catalog_of(vec![checktype("dnsprobe", "dnsprobe:v1", &["Hostname"])]);
        let targets = vec![Target::new("example.com", "")];

        let err = generate_checks(&catalog, &targets).unwrap_err();
        assert!(matches!(err, Error::MissingAssetType { .. }), "got {err:?}");
    }

    #[test]
    fn test_generate_checks_empty_inputs() {
        let catalog = catalog_of(vec![checktype("dnsprobe", "dnsprobe:v1", &["Hostname"])]);

        assert!(generate_checks(&Catalog::new(), &[Target::new("h", "Hostname")])
            .unwrap()
            .is_empty());
        assert!(generate_checks(&catalog, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_generate_checks_same_identifier_two_asset_types() {
        let catalog = catalog_of(vec![checktype(
            "hostaudit",
            "hostaudit:v1",
            &["Hostname", "DomainName"],
        )]);
        let targets = vec![
            Target::new("example.com", "DomainName"),
            Target::new("example.com", "Hostname"),
        ];

        let checks = generate_checks(&catalog, &targets).unwrap();
        assert_eq!(checks.len(), 2);
    }

    #[test]
    fn test_generate_checks_same_identifier_one_compatible_asset_type() {
        let catalog = catalog_of(vec![checktype("hostaudit", "hostaudit:v1", &["Hostname"])]);
        let targets = vec![
            Target::new("https://www.example.com", "Hostname"),
            Target::new("https://www.example.com", "WebAddress"),
        ];

        let checks = generate_checks(&catalog, &targets).unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].target.asset_type, "Hostname");
    }

    #[test]
    fn test_generate_checks_duplicated_targets() {
        let catalog = catalog_of(vec![checktype("dnsprobe", "dnsprobe:v1", &["DomainName"])]);
        let targets = vec![
            Target::new("example.com", "DomainName"),
            Target::new("example.com", "DomainName"),
        ];

        let checks = generate_checks(&catalog, &targets).unwrap();
        assert_eq!(checks.len(), 1);
    }

    #[test]
    fn test_generate_checks_fresh_ids() {
        let catalog = catalog_of(vec![
            checktype("dnsprobe", "dnsprobe:v1", &["DomainName"]),
            checktype("zonewalk", "zonewalk:v1", &["DomainName"]),
        ]);
        let targets = vec![Target::new("example.com", "DomainName")];

        let checks = generate_checks(&catalog, &targets).unwrap();
        assert_ne!(checks[0].id, checks[1].id);
    }

    #[test]
    fn test_generate_jobs_projection() {
        let catalog = catalog_of(vec![checktype("dnsprobe", "dnsprobe:v1", &["DomainName"])]);
        let targets = vec![Target::new("example.com", "DomainName")];

        let jobs = generate_jobs(&catalog, &targets).unwrap();
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.image, "dnsprobe:v1");
        assert_eq!(job.target, "example.com");
        assert_eq!(job.asset_type, "DomainName");
        assert_eq!(job.options, "{}");
        assert!(job.required_vars.is_empty());
        assert!(!job.check_id.is_empty());
    }

    #[test]
    fn test_generate_jobs_options_round_trip() {
        let mut probe = checktype("webprobe", "webprobe:v1", &["WebAddress"]);
        probe.options = serde_json::from_value(json!({"depth": 1})).unwrap();
        let catalog = catalog_of(vec![probe]);
        let targets = vec![
            Target::new("https://example.com", "WebAddress").with_option("rate", json!(10)),
        ];

        let jobs = generate_jobs(&catalog, &targets).unwrap();
        let decoded: Map<String, Value> = serde_json::from_str(&jobs[0].options).unwrap();
        assert_eq!(decoded.get("depth"), Some(&json!(1)));
        assert_eq!(decoded.get("rate"), Some(&json!(10)));
    }

    #[test]
    fn test_generate_jobs_required_vars() {
        let mut probe = checktype("regaudit", "regaudit:v1", &["DockerImage"]);
        probe.required_vars = vec![json!("REGISTRY_USER"), json!("REGISTRY_PASS")];
        let catalog = catalog_of(vec![probe]);
        let targets = vec![Target::new("registry.example.com/app:latest", "DockerImage")];

        let jobs = generate_jobs(&catalog, &targets).unwrap();
        assert_eq!(jobs[0].required_vars, vec!["REGISTRY_USER", "REGISTRY_PASS"]);
    }

    #[test]
    fn test_generate_jobs_non_string_required_vars() {
        let mut probe = checktype("regaudit", "regaudit:v1", &["DockerImage"]);
        probe.required_vars = vec![json!(1), json!(2)];
        let catalog = catalog_of(vec![probe]);
        let targets = vec![Target::new("registry.example.com/app:latest", "DockerImage")];

        let err = generate_jobs(&catalog, &targets).unwrap_err();
        assert!(matches!(err, Error::RequiredVars { .. }), "got {err:?}");
    }

    #[test]
    fn test_job_serialization_skips_empty_required_vars() {
        let job = Job {
            check_id: "c1".to_string(),
            image: "dnsprobe:v1".to_string(),
            target: "example.com".to_string(),
            asset_type: "DomainName".to_string(),
            options: "{}".to_string(),
            required_vars: Vec::new(),
        };

        let encoded = serde_json::to_string(&job).unwrap();
        assert!(!encoded.contains("required_vars"), "got {encoded}");
    }
}
