// Shared setup for the integration tests
#![allow(dead_code)]

use ent_predicate::schemas::ecommerce_schema;
use ent_predicate::{RegistryError, ValidationErrors, ValidatorConfig, ValidatorRegistry};
use std::fmt::Debug;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn registry() -> ValidatorRegistry {
    registry_with(ValidatorConfig::default())
}

pub fn registry_with(config: ValidatorConfig) -> ValidatorRegistry {
    init_tracing();
    ValidatorRegistry::new(ecommerce_schema(), config)
}

/// The validation errors of a rejected input.
pub fn rejected<T: Debug>(result: Result<T, RegistryError>) -> ValidationErrors {
    match result {
        Err(RegistryError::Invalid(errors)) => errors,
        other => panic!("expected validation errors, got {other:?}"),
    }
}

/// Assert that some error at `path` carries `code`, printing all errors otherwise.
pub fn assert_error(errors: &ValidationErrors, path: &str, code: &str) {
    assert!(errors.contains(path, code), "no `{code}` at `{path}` in {errors}");
}
