pub mod response;
pub mod user;

pub use response::{respond, GatewayResult, Reply};
pub use user::RequestUser;
