/// Database layer
///
/// Connection pooling and schema migrations. Models live in the `models`
/// module at the crate root.

pub mod migrations;
pub mod pool;
