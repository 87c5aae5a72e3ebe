//! Shared registry fixtures for unit tests

use crate::registry::{
    MpackDefinition, MpackVersionDefinition, OsTemplate, Registry, RepoTemplate,
    ServiceDefinition, StaticRegistrySource, UseCaseDefinition,
};
use crate::types::ServiceCategory;

fn service(name: &str) -> ServiceDefinition {
    ServiceDefinition {
        name: name.to_string(),
        display_name: name.to_string(),
        description: None,
        category: ServiceCategory::Server,
        version: "1.0".to_string(),
    }
}

fn version(mpack: &str, version: &str, services: &[&str]) -> MpackVersionDefinition {
    MpackVersionDefinition {
        version: version.to_string(),
        mpack_url: format!("http://repo.example.com/{mpack}/{version}/mpack.tar.gz"),
        doc_url: None,
        services: services.iter().map(|s| service(s)).collect(),
    }
}

/// CORE 1.0.0 / 1.1.0 and ODS 1.0.0 with two use cases
pub fn registry() -> Registry {
    Registry {
        mpacks: vec![
            MpackDefinition {
                name: "CORE".to_string(),
                display_name: "Core".to_string(),
                registry_id: 1,
                description: None,
                logo_url: None,
                versions: vec![
                    version("CORE", "1.0.0", &["ZOOKEEPER", "HDFS", "YARN"]),
                    version("CORE", "1.1.0", &["ZOOKEEPER", "HDFS"]),
                ],
            },
            MpackDefinition {
                name: "ODS".to_string(),
                display_name: "Operational Data Store".to_string(),
                registry_id: 1,
                description: None,
                logo_url: None,
                versions: vec![version("ODS", "1.0.0", &["HBASE", "HIVE"])],
            },
        ],
        use_cases: vec![
            UseCaseDefinition {
                name: "DataStore".to_string(),
                description: None,
                mpack_names: vec!["CORE".to_string(), "ODS".to_string()],
            },
            UseCaseDefinition {
                name: "Hadoop".to_string(),
                description: None,
                mpack_names: vec!["CORE".to_string()],
            },
        ],
    }
}

fn repo(id: &str, url: &str) -> RepoTemplate {
    RepoTemplate {
        repo_id: id.to_string(),
        repo_name: id.split('-').next().unwrap_or(id).to_string(),
        base_url: url.to_string(),
        unique: false,
    }
}

pub fn core_1_0_catalog() -> Vec<OsTemplate> {
    vec![
        OsTemplate {
            os_type: "redhat7".to_string(),
            repos: vec![
                repo("CORE-1.0", "http://public.example.com/core/1.0/redhat7"),
                repo("UTILS-1.1", "http://public.example.com/utils/redhat7"),
            ],
        },
        OsTemplate {
            os_type: "ubuntu16".to_string(),
            repos: vec![repo("CORE-1.0", "http://public.example.com/core/1.0/ubuntu16")],
        },
    ]
}

pub fn core_1_1_catalog() -> Vec<OsTemplate> {
    vec![OsTemplate {
        os_type: "redhat7".to_string(),
        repos: vec![repo("CORE-1.0", "http://public.example.com/core/1.1/redhat7")],
    }]
}

pub fn ods_catalog() -> Vec<OsTemplate> {
    vec![OsTemplate {
        os_type: "redhat7".to_string(),
        repos: vec![repo("ODS-1.0", "http://public.example.com/ods/1.0/redhat7")],
    }]
}

pub fn source() -> StaticRegistrySource {
    StaticRegistrySource::new(registry())
        .with_catalog("CORE", "1.0.0", core_1_0_catalog())
        .with_catalog("CORE", "1.1.0", core_1_1_catalog())
        .with_catalog("ODS", "1.0.0", ods_catalog())
}
