//! Cosmetic tag and technology refinement, applied once after merge.

use fc_core::{ComponentType, Entity, EntitySpec, normalize};

/// Service frameworks that get a tag and display label of their own.
const SERVICE_FRAMEWORKS: [(&str, &str); 3] =
    [("react", "React"), ("angular", "Angular"), ("kong", "Kong")];

/// Derive tags from subtype and technology, possibly relabelling technology.
pub fn refine(entity: &mut Entity) {
    if entity.spec.subtype().is_none() {
        entity.tags.clear();
        return;
    }

    let technology = entity
        .technology
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_default();
    let mut tags = Vec::new();
    let default_tag = normalize(&technology);
    if !default_tag.is_empty() {
        tags.push(default_tag);
    }

    match &entity.spec {
        EntitySpec::Component {
            subtype: ComponentType::Service,
            ..
        } => {
            if technology.contains("spring") {
                tags = vec!["spring-service".to_string()];
                entity.technology = Some("Spring Boot Service".to_string());
            } else if let Some((token, label)) = SERVICE_FRAMEWORKS
                .iter()
                .find(|(token, _)| technology.contains(token))
            {
                tags = vec![(*token).to_string()];
                entity.technology = Some((*label).to_string());
            }
        }
        EntitySpec::Component {
            subtype: ComponentType::Library,
            container,
            ..
        } => {
            if technology.contains("spring") {
                tags = vec!["spring-library".to_string()];
                entity.technology = Some("Spring Framework".to_string());
                let description = entity.description.to_lowercase();
                if description.contains("database") || description.contains("postgres") {
                    tags.extend(["spring-data".to_string(), "database-library".to_string()]);
                    entity.technology = Some("Spring Data JPA".to_string());
                }
            }
            if let Some(container) = container.as_deref().filter(|c| !c.is_empty()) {
                tags.push(format!("{container}-library"));
            }
        }
        _ => {}
    }

    tags.dedup();
    entity.tags = tags;
}

#[cfg(test)]
mod tests {
    use fc_core::{ApiType, ComponentType, Entity, EntitySpec, ResourceType};

    use super::refine;

    fn component(subtype: ComponentType, technology: &str, container: Option<&str>) -> Entity {
        Entity::new(
            "thing",
            EntitySpec::Component {
                subtype,
                system: None,
                container: container.map(str::to_string),
            },
        )
        .with_technology(technology)
    }

    #[test]
    fn spring_services_get_a_service_tag() {
        let mut entity = component(ComponentType::Service, "Spring Boot", None);
        refine(&mut entity);
        assert_eq!(entity.tags, vec!["spring-service".to_string()]);
        assert_eq!(entity.technology.as_deref(), Some("Spring Boot Service"));
    }

    #[test]
    fn gateway_services_keep_their_framework_name() {
        let mut entity = component(ComponentType::Service, "Kong Gateway", None);
        refine(&mut entity);
        assert_eq!(entity.tags, vec!["kong".to_string()]);
        assert_eq!(entity.technology.as_deref(), Some("Kong"));
    }

    #[test]
    fn spring_data_libraries_are_upgraded() {
        let mut entity = component(ComponentType::Library, "Spring", Some("invoice-service"))
            .with_description("Talks to the Postgres database");
        refine(&mut entity);
        assert_eq!(
            entity.tags,
            vec![
                "spring-library".to_string(),
                "spring-data".to_string(),
                "database-library".to_string(),
                "invoice-service-library".to_string(),
            ]
        );
        assert_eq!(entity.technology.as_deref(), Some("Spring Data JPA"));
    }

    #[test]
    fn other_entities_are_tagged_with_their_technology() {
        let mut entity = Entity::new(
            "orders-db",
            EntitySpec::Resource {
                subtype: ResourceType::Database,
                system: None,
            },
        )
        .with_technology("Apache Kafka");
        refine(&mut entity);
        assert_eq!(entity.tags, vec!["apache-kafka".to_string()]);
        assert_eq!(entity.technology.as_deref(), Some("Apache Kafka"));

        let mut api = Entity::new(
            "api-x",
            EntitySpec::Api {
                subtype: ApiType::Grpc,
                system: None,
            },
        )
        .with_technology("gRPC");
        refine(&mut api);
        assert_eq!(api.tags, vec!["grpc".to_string()]);
    }

    #[test]
    fn entities_without_subtype_have_no_tags() {
        let mut system = Entity::new("billing", EntitySpec::System { domain: None })
            .with_technology("Java");
        system.tags = vec!["stale".to_string()];
        refine(&mut system);
        assert!(system.tags.is_empty());
    }

    #[test]
    fn refine_is_stable_when_repeated() {
        let mut entity = component(ComponentType::Library, "Spring", Some("core"));
        refine(&mut entity);
        let once = entity.clone();
        refine(&mut entity);
        assert_eq!(entity, once);
    }
}
