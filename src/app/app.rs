use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::config::{
    AdminUserConfig, AppConfig, AppEnvironment, ConfigError, EmailConfig, JwtConfig, MongoConfig, RateLimitBackend,
    RateLimitConfig, RedisConfig,
};
use crate::handler::dashboard_handler::DashboardState;
use crate::handler::health_handler::{health_handler, not_found_handler, root_handler, HealthState};
use crate::handler::lead_handler::LeadState;
use crate::handler::user_handler::UserHandlerState;
use crate::middlewares::admin_middleware::AdminAuthState;
use crate::middlewares::rate_limit_middleware::RateLimitState;
use crate::model::contact::Contact;
use crate::model::enquiry::Enquiry;
use crate::repository::lead_repo::{LeadRepository, MongoLeadRepository};
use crate::repository::mongo::{self, MongoHealth, StoreHealth};
use crate::repository::repository_error::RepositoryError;
use crate::repository::user_repo::{UserRepository, UserRepositoryImpl};
use crate::router::admin_router::admin_router;
use crate::router::lead_router::{contact_router, enquiry_router};
use crate::service::dashboard::DashboardService;
use crate::service::moderation_service::ModerationServiceImpl;
use crate::service::notification::{EmailNotifier, Notifier};
use crate::service::submission_service::{SubmissionService, SubmissionServiceImpl};
use crate::service::user_service::{UserService, UserServiceImpl};
use crate::util::email::{EmailError, SmtpEmailService};
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};
use crate::util::rate_limiter::{Endpoint, RateLimiter, RedisRateLimitStore};
use crate::util::redis::{RedisError, RedisService};
use crate::util::session::SessionGate;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),
    #[error("Email error: {0}")]
    Email(#[from] EmailError),
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Every collaborator the HTTP layer needs. Tests build one from
/// in-memory parts.
pub struct AppState {
    pub enquiry_repo: Arc<dyn LeadRepository<Enquiry>>,
    pub contact_repo: Arc<dyn LeadRepository<Contact>>,
    pub user_repo: Arc<dyn UserRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub store: Arc<dyn StoreHealth>,
    pub limiter: Arc<RateLimiter>,
    pub jwt_config: JwtConfig,
    pub environment: AppEnvironment,
    pub allowed_origins: Vec<String>,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::HeaderName::from_static("x-requested-with")])
        .allow_credentials(true)
}

/// Assemble the full route table from `state`.
pub fn build_router(state: AppState) -> Router {
    let expose_details = state.environment.is_development();
    let jwt_utils: Arc<dyn JwtTokenUtils> = Arc::new(JwtTokenUtilsImpl::new(state.jwt_config.clone()));

    let admin_auth_state = Arc::new(AdminAuthState {
        jwt_utils: jwt_utils.clone(),
        gate: SessionGate::new(state.jwt_config.session_max_age),
    });
    let submission: Arc<dyn SubmissionService> = Arc::new(SubmissionServiceImpl::new(
        state.enquiry_repo.clone(),
        state.contact_repo.clone(),
        state.notifier.clone(),
    ));
    let enquiry_state = Arc::new(LeadState {
        submission: submission.clone(),
        moderation: Arc::new(ModerationServiceImpl::new(state.enquiry_repo.clone())),
        expose_details,
    });
    let contact_state = Arc::new(LeadState {
        submission,
        moderation: Arc::new(ModerationServiceImpl::new(state.contact_repo.clone())),
        expose_details,
    });
    let user_state = Arc::new(UserHandlerState {
        service: Arc::new(UserServiceImpl::new(state.user_repo.clone(), jwt_utils)),
        expose_details,
    });
    let dashboard_state = Arc::new(DashboardState {
        service: Arc::new(DashboardService::new(state.enquiry_repo, state.contact_repo)),
        expose_details,
    });
    let health_state = Arc::new(HealthState {
        store: state.store,
        environment: state.environment,
        started: Instant::now(),
    });
    let enquiry_limit = Arc::new(RateLimitState { limiter: state.limiter.clone(), endpoint: Endpoint::EnquirySubmit });
    let contact_limit = Arc::new(RateLimitState { limiter: state.limiter, endpoint: Endpoint::ContactSubmit });

    Router::new()
        .merge(enquiry_router(enquiry_state, admin_auth_state.clone(), enquiry_limit))
        .merge(contact_router(contact_state, admin_auth_state.clone(), contact_limit))
        .merge(admin_router(user_state, dashboard_state, admin_auth_state))
        .route("/health", get(health_handler).with_state(health_state))
        .route("/", get(root_handler))
        .fallback(not_found_handler)
        .layer(cors_layer(&state.allowed_origins))
}

pub struct App {
    config: AppConfig,
    router: Router,
}

impl App {
    pub async fn new() -> Result<Self, AppError> {
        let config = AppConfig::from_env()?;
        let mongo_config = MongoConfig::from_env()?;
        let jwt_config = JwtConfig::from_env()?;
        let email_config = EmailConfig::from_env()?;
        let rate_limit_config = RateLimitConfig::from_env()?;

        let client = mongo::connect(&mongo_config).await?;
        let store = Arc::new(MongoHealth::new(client.clone()));
        if !mongo::wait_for_store(store.as_ref(), mongo_config.connect_retries, mongo_config.retry_base_delay_ms).await {
            warn!("MongoDB unreachable, starting in degraded mode");
        }

        let enquiry_repo: Arc<dyn LeadRepository<Enquiry>> = Arc::new(MongoLeadRepository::new(
            &client,
            &mongo_config.database,
            &mongo_config.enquiry_collection,
        ));
        let contact_repo: Arc<dyn LeadRepository<Contact>> = Arc::new(MongoLeadRepository::new(
            &client,
            &mongo_config.database,
            &mongo_config.contact_collection,
        ));
        let user_repo: Arc<dyn UserRepository> = Arc::new(UserRepositoryImpl::new(
            &client,
            &mongo_config.database,
            &mongo_config.user_collection,
        ));

        let operator_email = email_config.operator_address.clone();
        let mailer = Arc::new(SmtpEmailService::new(email_config)?);
        let notifier: Arc<dyn Notifier> = Arc::new(EmailNotifier::new(mailer, operator_email));

        let limiter = Arc::new(Self::rate_limiter(&rate_limit_config).await?);

        Self::create_first_admin_user(user_repo.clone(), jwt_config.clone()).await;

        let router = build_router(AppState {
            enquiry_repo,
            contact_repo,
            user_repo,
            notifier,
            store,
            limiter,
            jwt_config,
            environment: config.environment,
            allowed_origins: config.allowed_origins.clone(),
        });
        Ok(App { config, router })
    }

    async fn rate_limiter(config: &RateLimitConfig) -> Result<RateLimiter, AppError> {
        match config.backend {
            RateLimitBackend::Memory => {
                info!("Rate limiting with in-memory counters");
                Ok(RateLimiter::in_memory(config))
            }
            RateLimitBackend::Redis => {
                let redis = RedisService::new(RedisConfig::from_env()?).await?;
                info!("Rate limiting with Redis counters");
                Ok(RateLimiter::new(Box::new(RedisRateLimitStore::new(redis)), config))
            }
        }
    }

    async fn create_first_admin_user(user_repo: Arc<dyn UserRepository>, jwt_config: JwtConfig) {
        let admin_conf = match AdminUserConfig::from_env() {
            Ok(c) => c,
            Err(e) => {
                warn!("Admin user config not loaded: {e}");
                return;
            }
        };
        let service = UserServiceImpl::new(user_repo, Arc::new(JwtTokenUtilsImpl::new(jwt_config)));
        if let Err(e) = service.ensure_admin(&admin_conf).await {
            error!("Failed to create admin user: {e}");
        }
    }

    pub async fn start(self) -> Result<(), AppError> {
        let host: std::net::IpAddr = self
            .config
            .host
            .parse()
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid host {}: {}", self.config.host, e)))?;
        let addr = SocketAddr::new(host, self.config.port);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(environment = %self.config.environment, "Server running at http://{}", addr);

        axum::serve(listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down gracefully"),
        _ = terminate => info!("SIGTERM received, shutting down gracefully"),
    }
}
