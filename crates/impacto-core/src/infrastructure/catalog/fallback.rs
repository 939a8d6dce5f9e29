//! Built-in catalog served when the secondary service is unreachable

use async_trait::async_trait;

use super::{CatalogComponent, CatalogFeature, ComponentCatalog};

const COMPONENTS: [(&str, &str, &str, &str); 15] = [
    ("auth", "Authentication", "Handles user authentication and session management", "Security"),
    ("authz", "Authorization", "Manages user permissions and access control", "Security"),
    ("user-mgmt", "User Management", "Manages user profiles and account settings", "Core"),
    ("notif", "Notification Service", "Sends notifications to users via various channels", "Communication"),
    ("payment", "Payment Processing", "Handles payment transactions and billing", "Finance"),
    ("doc-gen", "Document Generation", "Creates and manages documents and templates", "Content"),
    ("report", "Reporting", "Generates reports and analytics dashboards", "Analytics"),
    ("data-export", "Data Export", "Exports data in various formats", "Data"),
    ("search", "Search", "Provides search functionality across the platform", "Core"),
    ("audit", "Audit Logging", "Tracks and logs system activities for compliance", "Security"),
    ("email", "Email Service", "Sends and manages email communications", "Communication"),
    ("sms", "SMS Service", "Sends SMS messages to users", "Communication"),
    ("storage", "File Storage", "Manages file uploads and storage", "Infrastructure"),
    ("analytics", "Analytics", "Collects and processes usage data", "Data"),
    ("workflow", "Workflow Engine", "Manages business processes and workflows", "Core"),
];

const FEATURES: [(&str, &str, &str, &[&str]); 9] = [
    ("user-auth", "User Authentication", "User authentication and authorization", &["auth", "authz"]),
    ("user-profile", "User Profile Management", "User profile and account management", &["user-mgmt"]),
    ("notifications", "Notifications", "User notifications via various channels", &["notif", "email", "sms"]),
    ("billing", "Billing and Payments", "Billing and payment processing", &["payment"]),
    ("document-management", "Document Management", "Document creation and management", &["doc-gen", "storage"]),
    ("reporting", "Reporting and Analytics", "Reporting and data analytics", &["report", "analytics", "data-export"]),
    ("search-functionality", "Search Functionality", "Search across the platform", &["search"]),
    ("audit-logging", "Audit Logging", "System activity logging for compliance", &["audit"]),
    ("workflow-management", "Workflow Management", "Business process and workflow management", &["workflow"]),
];

pub fn fallback_components() -> Vec<CatalogComponent> {
    COMPONENTS
        .iter()
        .map(|(id, name, description, kind)| CatalogComponent {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            component_type: kind.to_string(),
        })
        .collect()
}

pub fn fallback_features() -> Vec<CatalogFeature> {
    FEATURES
        .iter()
        .map(|(id, name, description, components)| CatalogFeature {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            components: components.iter().map(|c| c.to_string()).collect(),
        })
        .collect()
}

/// Catalog backed only by the built-in table
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

#[async_trait]
impl ComponentCatalog for StaticCatalog {
    async fn get_all_components(&self) -> Vec<CatalogComponent> {
        fallback_components()
    }

    async fn get_component_by_id(&self, id: &str) -> Option<CatalogComponent> {
        fallback_components().into_iter().find(|c| c.id == id)
    }

    async fn get_all_component_names(&self) -> Vec<String> {
        fallback_components().into_iter().map(|c| c.name).collect()
    }

    async fn get_all_features(&self) -> Vec<CatalogFeature> {
        fallback_features()
    }

    async fn get_feature_by_id(&self, id: &str) -> Option<CatalogFeature> {
        fallback_features().into_iter().find(|f| f.id == id)
    }

    async fn get_all_feature_names(&self) -> Vec<String> {
        fallback_features().into_iter().map(|f| f.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fallback_table_is_stable() {
        let components = fallback_components();
        assert_eq!(components.len(), 15);
        assert_eq!(components[0].id, "auth");
        assert_eq!(components[14].name, "Workflow Engine");

        let features = fallback_features();
        assert_eq!(features.len(), 9);
        assert_eq!(features[2].components, vec!["notif", "email", "sms"]);
    }

    #[test]
    fn test_feature_members_exist_and_ids_are_unique() {
        let components = fallback_components();
        let ids: HashSet<&str> = components.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), components.len());

        for feature in fallback_features() {
            for member in &feature.components {
                assert!(ids.contains(member.as_str()), "{} lists unknown {}", feature.id, member);
            }
        }
    }

    #[tokio::test]
    async fn test_static_catalog_lookups() {
        let catalog = StaticCatalog;
        assert_eq!(
            catalog.get_component_by_id("sms").await.unwrap().name,
            "SMS Service"
        );
        assert!(catalog.get_component_by_id("SMS").await.is_none());
        assert_eq!(
            catalog.get_feature_by_id("billing").await.unwrap().components,
            vec!["payment"]
        );
        assert!(
            catalog
                .get_all_feature_names()
                .await
                .contains(&"Audit Logging".to_string())
        );
    }
}
