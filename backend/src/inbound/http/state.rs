//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    LendingCommand, LendingQuery, LoginService, SignupCommand, UserProfileQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub signup: Arc<dyn SignupCommand>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub lending: Arc<dyn LendingCommand>,
    pub lending_query: Arc<dyn LendingQuery>,
}

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub signup: Arc<dyn SignupCommand>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub lending: Arc<dyn LendingCommand>,
    pub lending_query: Arc<dyn LendingQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            signup,
            profile,
            lending,
            lending_query,
        } = ports;
        Self {
            login,
            signup,
            profile,
            lending,
            lending_query,
        }
    }
}
