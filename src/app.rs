use axum::{
    http::{HeaderValue, StatusCode},
    middleware::from_fn,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config;
use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, validate_user_middleware};

/// Full HTTP surface: banner, health, and the versioned API under `api.prefix`
pub fn app() -> Router {
    let api = Router::new().merge(public_routes()).merge(protected_routes());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest(&config::config().api.prefix, api)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    Router::new()
        .route("/auth/login/access-token", post(public::login_access_token))
        .route("/auth/password-recovery/:email", post(public::password_recovery))
}

/// Everything behind a bearer token. `route_layer` runs the last-added layer
/// first, so the JWT check precedes the user lookup.
fn protected_routes() -> Router {
    Router::new()
        .route("/auth/login/test-token", post(protected::auth::test_token))
        .merge(user_routes())
        .merge(asset_routes())
        .route_layer(from_fn(validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn user_routes() -> Router {
    use protected::users;

    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/me", get(users::read_me).put(users::update_me))
        .route("/users/me/change-password", post(users::change_password))
        .route("/users/roles/available", get(users::available_roles))
        .route("/users/permissions/check", get(users::check_permissions))
        .route("/users/stats/summary", get(users::stats))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/users/:id/role", put(users::update_user_role))
        .route("/users/:id/reset-password", post(users::reset_password))
        .route("/users/:id/restore", post(users::restore_user))
}

fn asset_routes() -> Router {
    use protected::assets::{assets, inventory, items, locations, sensors, templates};

    Router::new()
        // Locations
        .route(
            "/assets/locations",
            get(locations::list_locations).post(locations::create_location),
        )
        .route(
            "/assets/locations/:id",
            get(locations::get_location)
                .put(locations::update_location)
                .delete(locations::delete_location),
        )
        // Templates
        .route(
            "/assets/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/assets/templates/:id",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        // Store inventory
        .route(
            "/assets/inventory",
            get(inventory::list_inventory).post(inventory::create_inventory),
        )
        .route(
            "/assets/inventory/:id",
            get(inventory::get_inventory)
                .put(inventory::update_inventory)
                .delete(inventory::delete_inventory),
        )
        // Deployed items
        .route(
            "/assets/items/:id",
            get(items::get_item).put(items::update_item).delete(items::delete_item),
        )
        // Sensors
        .route("/assets/sensors/uuid/:uuid", get(sensors::get_sensor_by_uuid))
        .route(
            "/assets/sensors/:id",
            get(sensors::get_sensor)
                .put(sensors::update_sensor)
                .delete(sensors::delete_sensor),
        )
        // Assets and their tree views
        .route("/assets", get(assets::list_assets).post(assets::create_asset))
        .route("/assets/uuid/:uuid", get(assets::get_asset_by_uuid))
        .route(
            "/assets/:id",
            get(assets::get_asset).put(assets::update_asset).delete(assets::delete_asset),
        )
        .route("/assets/:id/hierarchy", get(assets::asset_hierarchy))
        .route("/assets/:id/ancestors", get(assets::asset_ancestors))
        .route("/assets/:id/children", get(assets::asset_children))
        .route(
            "/assets/:id/items",
            get(items::list_asset_items).post(items::create_asset_item),
        )
        .route(
            "/assets/:id/sensors",
            get(sensors::list_asset_sensors).post(sensors::create_sensor),
        )
}

fn cors_layer() -> CorsLayer {
    let security = &config::config().security;
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
}

async fn root() -> Json<Value> {
    let prefix = &config::config().api.prefix;

    Json(json!({
        "success": true,
        "data": {
            "name": "Solar Asset API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Solar plant operations backend: users, roles and the asset hierarchy",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": format!("{}/auth/login/access-token (public)", prefix),
                "users": format!("{}/users/* (protected)", prefix),
                "assets": format!("{}/assets/* (protected)", prefix),
            }
        }
    }))
}

async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": e.to_string()
                    }
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn root_banner_is_public() {
        let (status, body) = send(get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Solar Asset API");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/v1/users/me", "/api/v1/assets", "/api/v1/assets/1/hierarchy", "/api/v1/users/stats/summary"] {
            let (status, body) = send(get(uri)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(body["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn malformed_token_is_rejected() {
        let request = Request::builder()
            .uri("/api/v1/assets/locations")
            .header("authorization", "Bearer not.a.jwt")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let request = Request::builder()
            .uri("/api/v1/users")
            .header("authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authorization header must use Bearer token format");
    }
}
