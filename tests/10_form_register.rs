mod common;

use common::{test_site, TestAdmin, TestAdmin1};
use form_admin::ConfigError;

#[test]
fn form_admin_without_schema_fails_to_materialize() {
    let site = test_site();
    site.register_admin::<TestAdmin>();

    let err = site.get_admin_or_create::<TestAdmin>().unwrap_err();
    assert!(err.to_string().contains("schema is None"), "unexpected error: {}", err);
}

#[test]
fn router_refuses_to_build_with_misconfigured_admin() {
    let site = test_site();
    site.register_admin::<TestAdmin1>().register_admin::<TestAdmin>();

    let err = site.router().unwrap_err();
    assert!(matches!(err, ConfigError::MissingSchema { .. }));
}

#[test]
fn materialized_paths() {
    let site = test_site();
    site.register_admin::<TestAdmin1>();

    let ins = site.get_admin_or_create::<TestAdmin1>().unwrap();
    assert_eq!(ins.router_path(), "/admin/testadmin1");
    assert_eq!(ins.page_path(), "/test");
    assert_eq!(ins.form_path(), "/test/api");
    assert!(!ins.form_init());
}
