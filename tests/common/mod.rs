//! Registry and catalog shared by the integration tests

#![allow(dead_code)]

use mpack_wizard::registry::{
    MpackDefinition, MpackVersionDefinition, OsTemplate, Registry, RepoTemplate, ServiceDefinition,
    StaticRegistrySource, UseCaseDefinition,
};
use mpack_wizard::types::ServiceCategory;

fn version(mpack: &str, version: &str, services: &[&str]) -> MpackVersionDefinition {
    MpackVersionDefinition {
        version: version.to_string(),
        mpack_url: format!("http://repo.example.com/{mpack}/{version}/mpack.tar.gz"),
        doc_url: None,
        services: services
            .iter()
            .map(|name| ServiceDefinition {
                name: name.to_string(),
                display_name: name.to_string(),
                description: None,
                category: ServiceCategory::Server,
                version: "1.0".to_string(),
            })
            .collect(),
    }
}

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
                    version("CORE", "1.0.0", &["ZOOKEEPER", "HDFS"]),
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
        use_cases: vec![UseCaseDefinition {
            name: "Hadoop".to_string(),
            description: None,
            mpack_names: vec!["CORE".to_string()],
        }],
    }
}

fn os(os_type: &str, repos: &[(&str, &str)]) -> OsTemplate {
    OsTemplate {
        os_type: os_type.to_string(),
        repos: repos
            .iter()
            .map(|(id, url)| RepoTemplate {
                repo_id: id.to_string(),
                repo_name: id.to_string(),
                base_url: url.to_string(),
                unique: false,
            })
            .collect(),
    }
}

pub fn source() -> StaticRegistrySource {
    StaticRegistrySource::new(registry())
        .with_catalog(
            "CORE",
            "1.0.0",
            vec![
                os("redhat7", &[("CORE-1.0", "http://public.example.com/core/1.0/redhat7")]),
                os("ubuntu16", &[("CORE-1.0", "http://public.example.com/core/1.0/ubuntu16")]),
            ],
        )
        .with_catalog(
            "CORE",
            "1.1.0",
            vec![os("redhat7", &[("CORE-1.0", "http://public.example.com/core/1.1/redhat7")])],
        )
        .with_catalog(
            "ODS",
            "1.0.0",
            vec![os("redhat7", &[("ODS-1.0", "http://public.example.com/ods/1.0/redhat7")])],
        )
}
