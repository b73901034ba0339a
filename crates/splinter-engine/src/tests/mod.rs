//! Engine test suite.

mod helpers;
