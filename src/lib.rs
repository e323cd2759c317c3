pub mod api_connection;
pub mod cli;
pub mod providers;
pub mod resolver;
pub mod verification;
pub mod correction;
