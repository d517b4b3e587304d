pub mod config;
pub mod error;
pub mod gateway;
pub mod parser;
pub mod query_builder;
pub mod response;
pub mod router;
pub mod row;
pub mod schema;
pub mod server;
pub mod store;
pub mod value;

// Re-export them for easier access from main.rs and the tests
pub use config::*;
pub use error::*;
pub use gateway::*;
pub use parser::*;
pub use query_builder::*;
pub use response::*;
pub use router::*;
pub use row::*;
pub use schema::*;
pub use server::*;
pub use store::*;
pub use value::*;
