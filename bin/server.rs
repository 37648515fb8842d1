// Employee Demography Dashboard - Web Server
// REST API with Axum; every request runs one full pass over the shared tables

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use employee_dashboard::{
    compute_all, gender_by_department, generation_breakdown, joining_frequency,
    province_distribution, AgeDomain, DashboardError, DataArgs, SelectionState, Tables,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Debug, Parser)]
#[command(name = "dashboard-server", version, about = "Employee demography dashboard API")]
struct ServerArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000")]
    addr: String,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    // Loaded once, read-only afterwards
    tables: Arc<Tables>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Query parameters of the two dashboard controls
#[derive(Debug, Default, Deserialize)]
struct SelectionQuery {
    department: Option<String>,
    age_low: Option<u32>,
    age_high: Option<u32>,
}

impl SelectionQuery {
    /// Fill missing values from the default selection, then validate.
    fn resolve(&self, tables: &Tables) -> Result<SelectionState, DashboardError> {
        let defaults = SelectionState::default_for(tables);
        let department = self
            .department
            .as_deref()
            .unwrap_or_else(|| defaults.department());
        let low = self.age_low.unwrap_or(defaults.age_range().low());
        let high = self.age_high.unwrap_or(defaults.age_range().high());
        SelectionState::new(tables, department, low, high)
    }
}

fn bad_request(e: DashboardError) -> Response {
    log::warn!("Rejected selection: {}", e);
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::err(e.to_string())),
    )
        .into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/departments - Distinct departments, ascending
async fn get_departments(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.tables.departments().to_vec()))
}

/// GET /api/age-domain - Observed age bounds
async fn get_age_domain(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::<AgeDomain>::ok(state.tables.age_domain()))
}

/// GET /api/dashboard - Full pass for the given selection
async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Response {
    let pass = match query
        .resolve(&state.tables)
        .and_then(|selection| compute_all(&state.tables, &selection))
    {
        Ok(pass) => pass,
        Err(e) => return bad_request(e),
    };

    let fingerprint = match pass.fingerprint() {
        Ok(fingerprint) => fingerprint,
        Err(e) => {
            log::error!("Failed to fingerprint dashboard pass: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::err(e.to_string())),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        [(header::ETAG, format!("\"{}\"", fingerprint))],
        Json(ApiResponse::ok(pass)),
    )
        .into_response()
}

/// GET /api/joining - Hires per year
async fn get_joining(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(joining_frequency(state.tables.employees())))
}

/// GET /api/provinces - Head count per province with coordinates
async fn get_provinces(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(province_distribution(
        state.tables.employees(),
        state.tables.coordinates(),
    )))
}

/// GET /api/generations/:department - Generations inside one department
async fn get_generations(
    State(state): State<AppState>,
    Path(department): Path<String>,
) -> Response {
    // Path has already percent-decoded the segment
    if !state.tables.has_department(&department) {
        return bad_request(DashboardError::UnknownDepartment(department));
    }

    let rows = generation_breakdown(state.tables.employees(), &department);
    (StatusCode::OK, Json(ApiResponse::ok(rows))).into_response()
}

/// GET /api/gender-by-department - Department × gender inside an age range
async fn get_gender_by_department(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Response {
    match query.resolve(&state.tables) {
        Ok(selection) => {
            let rows = gender_by_department(state.tables.employees(), selection.age_range());
            (StatusCode::OK, Json(ApiResponse::ok(rows))).into_response()
        }
        Err(e) => bad_request(e),
    }
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/departments", get(get_departments))
        .route("/age-domain", get(get_age_domain))
        .route("/dashboard", get(get_dashboard))
        .route("/joining", get(get_joining))
        .route("/provinces", get(get_provinces))
        .route("/generations/:department", get(get_generations))
        .route("/gender-by-department", get(get_gender_by_department))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = ServerArgs::parse();

    println!("🌐 Employee Demography Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let tables = args.data.load_tables()?;
    println!(
        "✓ Loaded {} employees, {} province coordinates",
        tables.employees().len(),
        tables.coordinates().len()
    );

    let app = build_router(AppState {
        tables: Arc::new(tables),
    });

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", args.addr))?;

    println!("\n🚀 Server running on http://{}", args.addr);
    println!("   API: http://{}/api/dashboard", args.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use employee_dashboard::{EmployeeRecord, Gender, ProvinceCoordinate};
    use tower::ServiceExt;

    fn router() -> Router {
        let employee = |year: i32, department: &str, gender: Gender, age: u32| EmployeeRecord {
            join_year: year,
            province: "Jakarta".to_string(),
            gender,
            department_name: department.to_string(),
            generation: "Gen X".to_string(),
            age,
        };
        let tables = Tables::new(
            vec![
                employee(2020, "Human Resources", Gender::Male, 30),
                employee(2020, "Sales", Gender::Female, 45),
                employee(2021, "Sales", Gender::Male, 51),
                employee(2022, "Sales %41", Gender::Female, 35),
            ],
            vec![ProvinceCoordinate {
                province: "Jakarta".to_string(),
                latitude: -6.2,
                longitude: 106.8,
            }],
        )
        .unwrap();
        build_router(AppState {
            tables: Arc::new(tables),
        })
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_departments_sorted() {
        let (status, json) = get_json("/api/departments").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"], serde_json::json!(["Human Resources", "Sales", "Sales %41"]));
    }

    #[tokio::test]
    async fn test_dashboard_defaults_and_etag() {
        let uri = "/api/dashboard";
        let first = router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let second = router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            first.headers().get(header::ETAG),
            second.headers().get(header::ETAG)
        );

        let body = to_bytes(first.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"]["selection"]["department"], "Human Resources");
        assert_eq!(json["data"]["selection"]["age_range"]["high"], 50);
    }

    #[tokio::test]
    async fn test_inverted_range_is_bad_request() {
        let (status, json) = get_json("/api/dashboard?age_low=45&age_high=35").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_generations_decodes_department() {
        let (status, json) = get_json("/api/generations/Human%20Resources").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"][0]["generation"], "Gen X");
        assert_eq!(json["data"][0]["num_people"], 1);

        let (status, _) = get_json("/api/generations/Legal").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generations_keeps_literal_percent_sequence() {
        // "Sales %41" must not be decoded a second time into "Sales A"
        let (status, json) = get_json("/api/generations/Sales%20%2541").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"][0]["num_people"], 1);

        let (status, json) = get_json("/api/generations/Sales").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"][0]["num_people"], 2);
    }

    #[tokio::test]
    async fn test_gender_by_department_filters_age() {
        let (status, json) = get_json("/api/gender-by-department?age_low=40&age_high=60").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json["data"].as_array().unwrap();
        // Sales only: Female 45, Male 51
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["department_name"] == "Sales"));
    }
}
