//! YAML parser (verb module)
//!
//! Loads planner configuration and catalog fixtures from YAML files.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::config::PlannerConfig;
use crate::error::ParseError;
use crate::store::CatalogFixture;

fn parse_yaml_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ParseError> {
    let path_str = path.as_ref().display().to_string();
    let contents = std::fs::read_to_string(&path).map_err(|e| ParseError::Io {
        path: path_str,
        source: e,
    })?;
    serde_yaml::from_str(&contents).map_err(ParseError::from)
}

/// Parse planner configuration from a YAML file
pub fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<PlannerConfig, ParseError> {
    parse_yaml_file(path)
}

/// Parse planner configuration from a YAML string; missing keys keep defaults
pub fn parse_config_str(yaml: &str) -> Result<PlannerConfig, ParseError> {
    serde_yaml::from_str(yaml).map_err(ParseError::from)
}

/// Parse a catalog fixture from a YAML file
pub fn parse_fixture_file<P: AsRef<Path>>(path: P) -> Result<CatalogFixture, ParseError> {
    parse_yaml_file(path)
}

/// Parse a catalog fixture from a YAML string
pub fn parse_fixture_str(yaml: &str) -> Result<CatalogFixture, ParseError> {
    serde_yaml::from_str(yaml).map_err(ParseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Cardinality, DataType, ValidationStatus};
    use crate::policy::SharePermission;

    #[test]
    fn test_parse_config() {
        let config = parse_config_str("defaultLimit: 100\ndefaultSchema: snapshots\n").unwrap();
        assert_eq!(config.default_limit, 100);
        assert_eq!(config.max_limit, 5000);
        assert_eq!(config.default_schema, "snapshots");
    }

    #[test]
    fn test_parse_fixture() {
        let yaml = r#"
physicalTables:
  - id: orders
    tenantId: acme
    tableName: orders
    sourceType: postgres
    columns:
      - { name: id, type: bigint }
      - { name: amount, type: "numeric(12,2)" }
      - { name: region, type: text }
relationships:
  - id: r1
    dataModelId: dm1
    fromTableId: orders
    fromColumn: customer_id
    toTableId: customers
    toColumn: id
    cardinality: n-1
    validationStatus: valid
shares:
  - id: s1
    tenantId: acme
    dashboardId: d1
    userId: u1
    permission: view
    allowedPageIds: [p1]
    rls:
      rules:
        - combinator: AND
          conditions:
            - { field: region, operator: equals, value: EMEA }
"#;
        let fixture = parse_fixture_str(yaml).unwrap();
        let orders = &fixture.physical_tables[0];
        assert!(orders.is_active);
        assert_eq!(orders.columns[0].data_type, DataType::I64);
        assert_eq!(
            orders.columns[1].data_type,
            DataType::Decimal { precision: 12, scale: 2 }
        );
        assert_eq!(fixture.relationships[0].cardinality, Cardinality::ManyToOne);
        assert_eq!(fixture.relationships[0].validation_status, ValidationStatus::Valid);
        assert_eq!(fixture.shares[0].permission, SharePermission::View);
        assert_eq!(fixture.shares[0].rls.rules[0].conditions.len(), 1);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        assert!(parse_fixture_str("not: [valid: yaml").is_err());
        assert!(parse_config_file("does/not/exist.yaml").is_err());
    }
}
