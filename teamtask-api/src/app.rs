/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use teamtask_api::{app::{build_router, AppState}, config::Config};
/// use teamtask_shared::{clock::SystemClock, store::PgStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = sqlx::PgPool::connect(&config.database.url).await?;
/// let store = Arc::new(PgStore::new(pool.clone()));
/// let state = AppState::new(store, Arc::new(SystemClock), None, config).with_db(pool);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth::require_auth};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use teamtask_shared::{
    ai::TaskExtractor,
    clock::Clock,
    invite::RandomInviteCodeGenerator,
    services::{AuthService, MembershipResolver, OrganizationService, TaskService},
    store::{OrganizationStore, TaskStore, UserStore},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
/// Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub organizations: OrganizationService,
    pub tasks: TaskService,
    pub membership: MembershipResolver,

    /// Application configuration
    pub config: Arc<Config>,

    /// Present when the stores are backed by PostgreSQL; used by `/health`
    pub db: Option<PgPool>,
}

impl AppState {
    /// Wires the domain services over one store that serves every entity family
    pub fn new<S>(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        extractor: Option<Arc<dyn TaskExtractor>>,
        config: Config,
    ) -> Self
    where
        S: UserStore + OrganizationStore + TaskStore + 'static,
    {
        let invite_codes = Arc::new(RandomInviteCodeGenerator);
        let organizations = OrganizationService::new(store.clone(), invite_codes.clone(), clock.clone());
        let membership = organizations.membership().clone();

        let mut tasks =
            TaskService::new(store.clone(), membership.clone(), clock.clone()).with_extraction_timeout(config.ai.timeout());
        if let Some(extractor) = extractor {
            tasks = tasks.with_extractor(extractor);
        }

        Self {
            auth: AuthService::new(store, invite_codes, clock),
            organizations,
            tasks,
            membership,
            config: Arc::new(config),
            db: None,
        }
    }

    pub fn with_db(mut self, db: PgPool) -> Self {
        self.db = Some(db);
        self
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                         # public
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /signup                # public
///     │   ├── POST /login                 # public
///     │   ├── POST /refresh               # public
///     │   └── GET  /me
///     ├── /organizations/
///     │   ├── POST|GET /
///     │   ├── POST /join
///     │   ├── GET|PUT|DELETE /:id
///     │   ├── POST /:id/regenerate-code
///     │   └── DELETE /:id/members/:user_id
///     └── /tasks/
///         ├── GET|POST /
///         ├── POST /generate
///         ├── GET|PATCH|DELETE /:id
///         ├── POST /:id/assign
///         ├── POST /:id/unassign
///         └── POST /:id/toggle
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Compression
/// 2. CORS
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_layer = || axum::middleware::from_fn_with_state(state.clone(), require_auth);

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route_layer(auth_layer())
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let organization_routes = Router::new()
        .route(
            "/",
            post(routes::organizations::create_organization).get(routes::organizations::list_organizations),
        )
        .route("/join", post(routes::organizations::join_organization))
        .route(
            "/:id",
            get(routes::organizations::get_organization)
                .put(routes::organizations::update_organization)
                .delete(routes::organizations::delete_organization),
        )
        .route("/:id/regenerate-code", post(routes::organizations::regenerate_invite_code))
        .route("/:id/members/:user_id", delete(routes::organizations::remove_member))
        .route_layer(auth_layer());

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks).post(routes::tasks::create_task))
        .route("/generate", post(routes::tasks::generate_tasks))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/assign", post(routes::tasks::assign_users))
        .route("/:id/unassign", post(routes::tasks::unassign_users))
        .route("/:id/toggle", post(routes::tasks::toggle_task_status))
        .route_layer(auth_layer());

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/organizations", organization_routes)
        .nest("/tasks", task_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(CompressionLayer::new())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
