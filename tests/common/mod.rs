#![allow(dead_code)]

use depgate::store::UnitSpec;
use depgate_test_utils::builders::UnitSpecBuilder;

pub use depgate_test_utils::init_tracing;

/// `db` with no dependencies, in group `g1`.
pub fn db() -> UnitSpec {
    UnitSpecBuilder::new("db").build()
}

/// `api` running-depends on `db`, in group `g1`.
pub fn api() -> UnitSpec {
    UnitSpecBuilder::new("api").running_after("db").build()
}
