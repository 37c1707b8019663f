//! Bearer-token verification.

mod jwt;

pub use jwt::{JwtConfig, JwtTokenService};
