//! Each role's consumed-pointer list must be non-empty and role-specific,
//! since `pqp-cli`'s debug surface relies on it to slice the merged config.

use pqp_config::consumption::consumed_pointers;
use pqp_config::secrets::Role;

const ALL_ROLES: [Role; 6] = [
    Role::Generator,
    Role::Validator,
    Role::Backtester,
    Role::Classifier,
    Role::Deployer,
    Role::Executor,
];

#[test]
fn every_role_consumes_at_least_one_pointer() {
    for role in ALL_ROLES {
        assert!(!consumed_pointers(role).is_empty(), "{role:?} has no declared pointers");
    }
}

#[test]
fn executor_and_deployer_consume_distinct_pointer_sets() {
    let deployer: std::collections::HashSet<_> = consumed_pointers(Role::Deployer).iter().collect();
    let executor: std::collections::HashSet<_> = consumed_pointers(Role::Executor).iter().collect();
    assert_ne!(deployer, executor);
}

#[test]
fn only_executor_consumes_risk_config() {
    for role in ALL_ROLES {
        let pointers = consumed_pointers(role);
        if role == Role::Executor {
            assert!(pointers.contains(&"/risk"));
        } else {
            assert!(!pointers.contains(&"/risk"));
        }
    }
}
