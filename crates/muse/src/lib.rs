pub mod db;
pub mod generation;
pub mod search;
pub mod services;
pub mod storage;

/// Test doubles for unit and integration testing.
/// Only available with cfg(test) or feature "testing".
#[cfg(any(test, feature = "testing"))]
pub mod testing;
