pub mod authorizable_service;
pub mod job_service;
pub mod query_store_service;
pub mod sentry_service;

pub use authorizable_service::AuthorizableService;
pub use job_service::{AppLookup, JobService};
pub use query_store_service::{ProxyRequest, QueryStoreService};
pub use sentry_service::SentryService;
