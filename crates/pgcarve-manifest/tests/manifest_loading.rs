use std::path::Path;

use pgcarve_manifest::{Manifest, ManifestError};

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

#[test]
fn loads_the_staging_fixture() {
    let manifest = Manifest::from_path(&fixture("staging.yml")).expect("load fixture");

    let names: Vec<&str> = manifest.tables().iter().map(|entry| entry.name()).collect();
    assert_eq!(names, ["accounts", "orders", "products"]);

    let accounts = manifest.table("accounts").unwrap();
    assert_eq!(
        accounts.query(),
        Some("select * from accounts where tenant_id = 7")
    );
    assert_eq!(accounts.has_many(), ["orders"]);

    let mask = accounts.mask().expect("accounts mask");
    assert!(mask.rules_for("email").is_some());
    assert!(mask.rules_for("phone").is_some());
    assert!(mask.rules_for("name").is_none());

    let orders = manifest.table("orders").unwrap();
    assert_eq!(
        orders.query(),
        Some("select * from orders where created_at >= '2024-01-01'")
    );

    assert_eq!(manifest.foreign_keys().len(), 1);
}

#[test]
fn missing_file_is_a_configuration_error() {
    let err = Manifest::from_path(&fixture("does_not_exist.yml")).unwrap_err();
    assert!(matches!(err, ManifestError::MissingFile(_)));
}
