// handlers/mod.rs - HTTP surface of the gateway
//
// Handlers stay thin: extract the caller, the path segments and the request
// parameters, call a service, and hand the result to `respond`, which renders
// the envelope and logs failures under the operation name.

pub mod jobbrowser; // /jobbrowser/api/*
pub mod security; // /security/api/sentry/*
