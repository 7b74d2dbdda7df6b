use serde::Deserialize;

/// Identity and creation time shared by every API resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    #[serde(rename = "guid")]
    pub id: String,
    #[serde(default)]
    pub created_at: String,
}

impl Metadata {
    pub fn new(id: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: created_at.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Resource<ServiceEntity>")]
pub struct Service {
    pub metadata: Metadata,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Resource<PlanEntity>")]
pub struct ServicePlan {
    pub metadata: Metadata,
    pub name: String,
    pub is_free: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Resource<InstanceEntity>")]
pub struct ServiceInstance {
    pub metadata: Metadata,
    pub name: String,
}

/// One page of a collection response.
///
/// `next_page_token` is the API's `next_url`: either a full URL or an endpoint
/// path relative to the API base URL. `None` once the collection is exhausted.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "resources", default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(rename = "next_url", default)]
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// Splits the page, treating an empty `next_url` the same as a missing one.
    pub fn into_parts(self) -> (Vec<T>, Option<String>) {
        let next = self.next_page_token.filter(|token| !token.is_empty());
        (self.items, next)
    }
}

// Wire shape of a v2 resource: `{ "metadata": {...}, "entity": {...} }`.
#[derive(Deserialize)]
struct Resource<E> {
    metadata: Metadata,
    entity: E,
}

#[derive(Deserialize)]
struct ServiceEntity {
    #[serde(default)]
    label: String,
}

#[derive(Deserialize)]
struct PlanEntity {
    #[serde(default)]
    name: String,
    #[serde(default)]
    free: bool,
}

#[derive(Deserialize)]
struct InstanceEntity {
    #[serde(default)]
    name: String,
}

impl From<Resource<ServiceEntity>> for Service {
    fn from(resource: Resource<ServiceEntity>) -> Self {
        Self {
            metadata: resource.metadata,
            label: resource.entity.label,
        }
    }
}

impl From<Resource<PlanEntity>> for ServicePlan {
    fn from(resource: Resource<PlanEntity>) -> Self {
        Self {
            metadata: resource.metadata,
            name: resource.entity.name,
            is_free: resource.entity.free,
        }
    }
}

impl From<Resource<InstanceEntity>> for ServiceInstance {
    fn from(resource: Resource<InstanceEntity>) -> Self {
        Self {
            metadata: resource.metadata,
            name: resource.entity.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_page_from_v2_json() {
        let json = serde_json::json!({
            "total_results": 2,
            "next_url": "/v2/services/svc/service_plans?page=2",
            "resources": [
                {
                    "metadata": {"guid": "plan-1", "created_at": "2018-01-24T10:00:00Z"},
                    "entity": {"name": "trial", "free": true}
                },
                {
                    "metadata": {"guid": "plan-2", "created_at": "2018-01-24T10:00:00Z"},
                    "entity": {"name": "standard", "free": false}
                }
            ]
        });

        let page: Page<ServicePlan> = serde_json::from_value(json).unwrap();
        let (items, next) = page.into_parts();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].metadata.id, "plan-1");
        assert_eq!(items[0].name, "trial");
        assert!(items[0].is_free);
        assert!(!items[1].is_free);
        assert_eq!(next.as_deref(), Some("/v2/services/svc/service_plans?page=2"));
    }

    #[test]
    fn test_last_page_has_no_next_token() {
        let null_next: Page<ServiceInstance> =
            serde_json::from_value(serde_json::json!({"next_url": null, "resources": []})).unwrap();
        let empty_next: Page<ServiceInstance> =
            serde_json::from_value(serde_json::json!({"next_url": "", "resources": []})).unwrap();
        let missing_next: Page<ServiceInstance> =
            serde_json::from_value(serde_json::json!({"resources": []})).unwrap();

        assert!(null_next.into_parts().1.is_none());
        assert!(empty_next.into_parts().1.is_none());
        assert!(missing_next.into_parts().1.is_none());
    }

    #[test]
    fn test_instance_without_created_at_defaults_to_empty() {
        let json = serde_json::json!({
            "metadata": {"guid": "instance-1"},
            "entity": {"name": "my-db"}
        });

        let instance: ServiceInstance = serde_json::from_value(json).unwrap();

        assert_eq!(instance.metadata, Metadata::new("instance-1", ""));
        assert_eq!(instance.name, "my-db");
    }
}
