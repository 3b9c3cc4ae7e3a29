/// Database layer: connection pool and embedded migrations.
///
/// Models live in [`crate::models`]; every model function takes the pool
/// created by [`pool::create_pool`].

pub mod migrations;
pub mod pool;
