//! Application-aware targeting of log points.
//!
//! Stored probes carry zero or more [`ApplicationFilter`]s. A probe with no
//! filters is global and dispatches to every application; otherwise the
//! filters are OR-combined, and a single filter matches when every attribute
//! it specifies is present and equal on the requesting application. Filter
//! lists live in one encoded column, so whatever pruning the store performs
//! is a superset scan; [`select_targets`] is the authoritative pass.

use crate::model::{ApplicationFilter, LogPoint, LogPointConfig};

/// Whether a stored filter is compatible with a requesting application.
///
/// Attributes the filter leaves unspecified are wildcards; attributes the
/// requester carries beyond the filter never cause a mismatch.
pub fn filter_matches(stored: &ApplicationFilter, requester: &ApplicationFilter) -> bool {
    if let Some(name) = &stored.name {
        if requester.name.as_ref() != Some(name) {
            return false;
        }
    }
    if let Some(version) = &stored.version {
        if requester.version.as_ref() != Some(version) {
            return false;
        }
    }
    if let Some(stage) = &stored.stage {
        if requester.stage.as_ref() != Some(stage) {
            return false;
        }
    }
    stored
        .custom_tags
        .iter()
        .all(|(key, value)| requester.custom_tags.get(key) == Some(value))
}

/// Whether a probe targets the requesting application.
pub fn probe_applies(config: &LogPointConfig, requester: &ApplicationFilter) -> bool {
    config.application_filters.is_empty()
        || config
            .application_filters
            .iter()
            .any(|stored| filter_matches(stored, requester))
}

/// Authoritative dispatch pass over a workspace scan.
///
/// Drops disabled probes, keeps probes whose targeting is compatible with
/// the requester, and strips the filter lists. Expired-but-enabled probes
/// are not excluded here; time-based enforcement is owned elsewhere.
pub fn select_targets(
    configs: Vec<LogPointConfig>,
    requester: &ApplicationFilter,
) -> Vec<LogPoint> {
    configs
        .into_iter()
        .filter(|config| !config.point.disabled)
        .filter(|config| probe_applies(config, requester))
        .map(|config| config.point)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn named(name: &str) -> ApplicationFilter {
        ApplicationFilter {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn requester(name: &str, version: &str, stage: &str) -> ApplicationFilter {
        ApplicationFilter {
            name: Some(name.to_string()),
            version: Some(version.to_string()),
            stage: Some(stage.to_string()),
            custom_tags: BTreeMap::new(),
        }
    }

    fn config_with_filters(id: &str, filters: Vec<ApplicationFilter>) -> LogPointConfig {
        LogPointConfig {
            point: test_point(id),
            application_filters: filters,
        }
    }

    fn test_point(id: &str) -> LogPoint {
        LogPoint {
            id: id.to_string(),
            workspace_id: "w1".to_string(),
            user_id: "u1".to_string(),
            file_name: "app.py".to_string(),
            line_no: 10,
            client: "c1".to_string(),
            condition_expression: None,
            expire_secs: None,
            expire_count: None,
            file_hash: None,
            disabled: false,
            expire_timestamp: None,
            log_expression: "hit".to_string(),
            stdout_enabled: false,
            log_level: "INFO".to_string(),
            webhook_ids: vec![],
            from_api: false,
            predefined: false,
            probe_name: None,
        }
    }

    #[test]
    fn test_empty_filter_is_wildcard() {
        let stored = ApplicationFilter::default();
        assert!(filter_matches(&stored, &requester("svc1", "1.0", "prod")));
        assert!(filter_matches(&stored, &ApplicationFilter::default()));
    }

    #[test]
    fn test_specified_attributes_must_match_exactly() {
        let stored = named("svc1");
        assert!(filter_matches(&stored, &requester("svc1", "1.0", "prod")));
        assert!(!filter_matches(&stored, &requester("svc2", "1.0", "prod")));
    }

    #[test]
    fn test_missing_requester_attribute_is_a_mismatch() {
        let stored = named("svc1");
        assert!(!filter_matches(&stored, &ApplicationFilter::default()));
    }

    #[test]
    fn test_unspecified_attributes_impose_no_constraint() {
        let stored = ApplicationFilter {
            version: Some("2.1".to_string()),
            ..Default::default()
        };
        assert!(filter_matches(&stored, &requester("anything", "2.1", "dev")));
        assert!(!filter_matches(&stored, &requester("anything", "2.2", "dev")));
    }

    #[test]
    fn test_custom_tags_are_subset_matched() {
        let mut stored = ApplicationFilter::default();
        stored
            .custom_tags
            .insert("region".to_string(), "eu-1".to_string());

        let mut matching = requester("svc1", "1.0", "prod");
        matching
            .custom_tags
            .insert("region".to_string(), "eu-1".to_string());
        matching
            .custom_tags
            .insert("zone".to_string(), "a".to_string());
        assert!(filter_matches(&stored, &matching));

        let mismatching = requester("svc1", "1.0", "prod");
        assert!(!filter_matches(&stored, &mismatching));
    }

    #[test]
    fn test_global_probe_matches_every_requester() {
        let config = config_with_filters("lp-1", vec![]);
        assert!(probe_applies(&config, &requester("svc1", "1.0", "prod")));
        assert!(probe_applies(&config, &ApplicationFilter::default()));
    }

    #[test]
    fn test_filters_are_or_combined() {
        let config = config_with_filters("lp-1", vec![named("svc1"), named("svc2")]);
        assert!(probe_applies(&config, &requester("svc2", "1.0", "prod")));
        assert!(!probe_applies(&config, &requester("svc3", "1.0", "prod")));
    }

    #[test]
    fn test_select_targets_keeps_global_and_matching_probes() {
        let selective = config_with_filters("lp-a", vec![named("svc1")]);
        let global = config_with_filters("lp-b", vec![]);

        let seen = select_targets(
            vec![selective.clone(), global.clone()],
            &requester("svc1", "1.0", "prod"),
        );
        let ids: Vec<&str> = seen.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["lp-a", "lp-b"]);

        let seen = select_targets(vec![selective, global], &requester("svc2", "1.0", "prod"));
        let ids: Vec<&str> = seen.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["lp-b"]);
    }

    #[test]
    fn test_select_targets_excludes_disabled_probes() {
        let mut disabled = config_with_filters("lp-a", vec![]);
        disabled.point.disabled = true;
        let enabled = config_with_filters("lp-b", vec![]);

        let seen = select_targets(vec![disabled, enabled], &ApplicationFilter::default());
        let ids: Vec<&str> = seen.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["lp-b"]);
    }
}
