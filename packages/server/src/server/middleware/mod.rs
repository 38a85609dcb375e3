pub mod ingress_auth;

pub use ingress_auth::*;
