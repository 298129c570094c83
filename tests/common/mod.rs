#![allow(dead_code)]

pub use watchcmd_test_utils::{builders, fake_source, init_tracing, with_timeout};
