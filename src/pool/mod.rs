//! Connection pool shared by all calls of one executor.
//!
//! Connections are keyed by host (`scheme://host:port`) and reused across
//! requests. A checked-out [`PooledConnection`] is owned by exactly one call
//! until it is released or evicted.

mod connection;


pub use connection::{ConnectionPool, PoolSettings, PoolStats, PooledConnection};
