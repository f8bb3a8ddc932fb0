use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::admin::reload::Reloader;
use crate::routing::{AdminAction, RouteTable, RouteTarget};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteListing {
    pub generation: u64,
    pub routes: Vec<RouteEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<&'static str>,
}

/// `POST <prefix>/__admin/reload`
pub async fn reload(reloader: &Reloader) -> Response {
    match reloader.reload().await {
        Ok(summary) => (
            StatusCode::OK,
            format!("reloaded {} routes (generation {})", summary.routes, summary.generation),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {}", e)).into_response(),
    }
}

/// `GET <prefix>/__admin/routes`
pub fn list_routes(table: &RouteTable) -> Json<RouteListing> {
    let routes = table
        .routes()
        .into_iter()
        .map(|(key, target)| {
            let (status_code, admin) = match target {
                RouteTarget::Canned(canned) => (Some(canned.status.as_u16()), None),
                RouteTarget::Admin(AdminAction::Reload) => (None, Some("reload")),
                RouteTarget::Admin(AdminAction::ListRoutes) => (None, Some("routes")),
            };
            RouteEntry {
                method: key.method().to_string(),
                path: key.path().to_string(),
                status_code,
                admin,
            }
        })
        .collect();

    Json(RouteListing {
        generation: table.generation(),
        routes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{MappingRecord, MockResponse};
    use crate::routing::RouteTableBuilder;

    #[test]
    fn test_listing_includes_mappings_and_admin_routes() {
        let records = vec![MappingRecord::new("get", "/users", MockResponse::new(200))];
        let table = RouteTableBuilder::new("/mock")
            .with_admin_routes()
            .generation(3)
            .build(&records)
            .unwrap();

        let Json(listing) = list_routes(&table);
        let value = serde_json::to_value(&listing).unwrap();

        assert_eq!(value["generation"], 3);
        assert_eq!(
            value["routes"],
            serde_json::json!([
                {"method": "POST", "path": "/mock/__admin/reload", "admin": "reload"},
                {"method": "GET", "path": "/mock/__admin/routes", "admin": "routes"},
                {"method": "GET", "path": "/mock/users", "statusCode": 200},
            ])
        );
    }
}
