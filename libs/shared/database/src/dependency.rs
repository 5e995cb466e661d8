use futures::future::try_join_all;
use tracing::debug;

use crate::error::DbError;
use crate::supabase::{eq_filter, SupabaseClient};

/// A table whose rows point at the record being deleted.
#[derive(Debug, Clone, Copy)]
pub struct DependencyCheck {
    pub table: &'static str,
    pub column: &'static str,
    pub label: &'static str,
    pub extra_filter: Option<&'static str>,
}

impl DependencyCheck {
    pub const fn new(table: &'static str, column: &'static str, label: &'static str) -> Self {
        Self {
            table,
            column,
            label,
            extra_filter: None,
        }
    }

    pub const fn with_filter(mut self, filter: &'static str) -> Self {
        self.extra_filter = Some(filter);
        self
    }

    fn filter_for(&self, id: &str) -> String {
        match self.extra_filter {
            Some(extra) => format!("{}&{}", eq_filter(self.column, id), extra),
            None => eq_filter(self.column, id),
        }
    }
}

/// Runs every check concurrently and returns the labels of those that found rows.
pub async fn blocking_references(
    client: &SupabaseClient,
    checks: &[DependencyCheck],
    id: &str,
    auth_token: Option<&str>,
) -> Result<Vec<&'static str>, DbError> {
    let lookups = checks.iter().map(|check| {
        let filter = check.filter_for(id);
        async move {
            let found = client.exists(check.table, &filter, auth_token).await?;
            Ok::<_, DbError>(found.then_some(check.label))
        }
    });

    let blocking: Vec<&'static str> = try_join_all(lookups)
        .await?
        .into_iter()
        .flatten()
        .collect();

    debug!("Dependency check for {} found: {:?}", id, blocking);
    Ok(blocking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use shared_config::AppConfig;
    use wiremock::{MockServer, Mock, ResponseTemplate};
    use wiremock::matchers::{method, path, query_param};

    const ROOM_CHECKS: [DependencyCheck; 3] = [
        DependencyCheck::new("schedules", "room_id", "schedules"),
        DependencyCheck::new("appointments", "room_id", "appointments"),
        DependencyCheck::new("test_results", "room_id", "test results"),
    ];

    #[test]
    fn test_extra_filter_is_appended() {
        let check = DependencyCheck::new("schedules", "staff_id", "schedules")
            .with_filter("staff_type=eq.doctor");
        assert_eq!(check.filter_for("d-1"), "staff_id=eq.d-1&staff_type=eq.doctor");
    }

    #[tokio::test]
    async fn test_reports_only_tables_with_rows() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("room_id", "eq.r-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a-1"}])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let config = AppConfig {
            supabase_url: mock_server.uri(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_jwt_secret: "secret".to_string(),
            public_assets_dir: PathBuf::from("public"),
            default_avatar_path: shared_config::DEFAULT_AVATAR_PATH.to_string(),
            server_port: 3000,
        };
        let client = SupabaseClient::new(&config);

        let blocking = blocking_references(&client, &ROOM_CHECKS, "r-1", None).await.unwrap();
        assert_eq!(blocking, vec!["appointments"]);
    }
}
