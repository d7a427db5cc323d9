//! Generated code under test, brought in from `OUT_DIR` the way `protolith-compiler`'s own
//! documentation recommends wiring a `build.rs` into a consuming crate.

#![allow(clippy::all)]

pub mod scenarios {
    include!(concat!(env!("OUT_DIR"), "/protolith.tests.scenarios.rs"));
}

pub mod wrappers {
    include!(concat!(env!("OUT_DIR"), "/protolith.tests.wrappers.rs"));
}

pub mod retargeted {
    include!(concat!(env!("OUT_DIR"), "/protolith.tests.retargeted.rs"));
}
