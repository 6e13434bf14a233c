use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "op, actor, ref, amount, currency, target").unwrap();
    writeln!(csv, "charge, shop, t1, 100.0, EUR, alice").unwrap();

    let mut cmd = Command::new(cargo_bin!("paycode"));
    cmd.arg("replay").arg(csv.path()).arg("--db-path").arg("some_db");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."))
        .stdout(predicate::str::contains("t1,alice,shop,100,EUR,CREATED,"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "op, actor, ref, amount, currency, target").unwrap();
    writeln!(csv, "charge, shop, t1, 100.0, EUR, alice").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("paycode"));
    cmd.arg("replay").arg(csv.path()).arg("--db-path").arg(&db_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not())
        .stdout(predicate::str::starts_with(
            "transaction,client,tenant,amount,currency,status,card",
        ))
        .stdout(predicate::str::contains("t1,alice,shop,100,EUR,CREATED,"));
    assert!(db_path.exists());
}
