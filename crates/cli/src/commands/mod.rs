//! CLI command implementations.

pub mod migrate;
pub mod session;
pub mod users;

use secrecy::SecretString;

/// `DATABASE_URL`, after loading `.env` if present.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").ok().map(SecretString::from)
}
