/// Hardware free test doubles, also exported to integration tests
/// through the `test_utils` feature.
#[cfg(any(test, feature = "test_utils"))]
pub mod doubles;
