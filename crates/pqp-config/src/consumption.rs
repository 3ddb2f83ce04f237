//! Declares which config subtree each role actually reads, so `pqp-cli`
//! can print a role's "consumed" config slice for debugging without
//! guessing from the full merged document.

use crate::secrets::Role;

pub fn consumed_pointers(role: Role) -> &'static [&'static str] {
    match role {
        Role::Generator => GENERATOR,
        Role::Validator => VALIDATOR,
        Role::Backtester => BACKTESTER,
        Role::Classifier => CLASSIFIER,
        Role::Deployer => DEPLOYER,
        Role::Executor => EXECUTOR,
    }
}

static GENERATOR: &[&str] = &[
    "/generator",
    "/backpressure/generated_limit",
    "/coin_registry",
];

static VALIDATOR: &[&str] = &["/validation", "/backpressure/validated_limit"];

static BACKTESTER: &[&str] = &["/backtest", "/backpressure/tested_limit"];

static CLASSIFIER: &[&str] = &["/classifier", "/promotion", "/retirement"];

static DEPLOYER: &[&str] = &["/deployer", "/portfolio/allocation"];

static EXECUTOR: &[&str] = &["/executor", "/venue", "/risk", "/reconcile"];
