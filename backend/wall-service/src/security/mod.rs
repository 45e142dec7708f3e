pub mod jwt;
pub mod password;
pub mod revocation;

pub use jwt::{Claims, TokenService};
pub use revocation::RevocationList;
