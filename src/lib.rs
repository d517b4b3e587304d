//! # tablegate
//!
//! A REST gateway over a relational database. Tables are discovered from the
//! live schema on every request, client JSON is checked against the declared
//! column types, and every scalar reaches SQL as a bound parameter.
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | GET | `/` | list tables |
//! | GET | `/{table}?limit=&offset=` | list records |
//! | GET | `/{table}/{id}` | fetch a record |
//! | PUT | `/{table}` | create a record |
//! | POST | `/{table}/{id}` | update a record |
//! | DELETE | `/{table}/{id}` | delete a record |

pub mod libs;

pub use libs::*;
