// handlers/security/mod.rs - Role and privilege admin endpoints (/security/api/sentry/*)
//
// Every endpoint names the policy `component` (hive | solr). Plain fields
// (`component`, `roleName`, `groupName`, `server`) are sent as text; role,
// privilege and authorizable documents are JSON-encoded.

pub mod authorizables;
pub mod privileges;
pub mod roles;

pub use authorizables::fetch as fetch_authorizables;

pub use roles::create as create_role;
pub use roles::create_sentry_role;
pub use roles::drop_sentry_role;
pub use roles::list_by_group as list_sentry_roles_by_group;
pub use roles::update_groups as update_role_groups;

pub use privileges::bulk_add as bulk_add_privileges;
pub use privileges::bulk_delete as bulk_delete_privileges;
pub use privileges::grant as grant_privilege;
pub use privileges::list_by_authorizable as list_sentry_privileges_by_authorizable;
pub use privileges::list_by_role as list_sentry_privileges_by_role;
pub use privileges::list_for_provider as list_sentry_privileges_for_provider;
pub use privileges::rename as rename_sentry_privilege;
pub use privileges::save as save_privileges;

use crate::error::GatewayError;
use crate::params::RequestParams;
use crate::types::Component;

pub(crate) fn component(params: &RequestParams) -> Result<Component, GatewayError> {
    params.text("component")?.parse()
}
