use std::fs;

use assert_cmd::Command;
use indoc::indoc;
use predicates::prelude::*;
use tempfile::TempDir;

const UPWORK_CSV: &str = indoc! {r#"
    Date,Ref ID,Type,Description,Agency,Freelancer,Team,Account Name,PO,Amount,Amount in local currency,Currency,Balance
    "Jan 5, 2020",300,Withdrawal,"Withdrawal Method: Direct to U.S. bank (ACH) - Account ending in: xxxx-1234",,,,,,-500.00,,USD,100.00
"#};

const CONFIG: &str = indoc! {r#"
    [upwork]
    [upwork.bank_accounts]
    "1234" = "Assets:Schwab:Checking"
"#};

const STATEMENT: &str = "statements_2020-01-01_2020-01-31.csv";

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(STATEMENT), UPWORK_CSV).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a statement\n").unwrap();
    dir
}

fn bean_import(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bean-import").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn identify_names_the_importer() {
    let dir = workspace();
    bean_import(&dir)
        .args(["identify", STATEMENT, "notes.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{}: upwork", STATEMENT)))
        .stdout(predicate::str::contains("notes.txt: -"));
}

#[test]
fn extract_renders_entries() {
    let dir = workspace();
    fs::write(dir.path().join("bean-import.toml"), CONFIG).unwrap();
    bean_import(&dir)
        .args(["extract", STATEMENT])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(";; -*- {}", STATEMENT)))
        .stdout(predicate::str::contains(
            "2020-01-05 * \"Withdrawal Method: Direct to U.S. bank (ACH) - Account ending in: xxxx-1234\" #Upwork-Withdrawal",
        ))
        .stdout(predicate::str::contains(
            "\tAssets:InTransit:Upwork:Schwab-1234\t500.00 USD\n",
        ))
        .stdout(predicate::str::contains(
            "2020-01-06 balance Assets:Upwork:Balance\t100.00 USD",
        ));
}

#[test]
fn extract_fails_on_unmapped_account() {
    let dir = workspace();
    bean_import(&dir)
        .args(["extract", STATEMENT])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xxxx").or(predicate::str::contains("1234")));
}

#[test]
fn explicit_config_must_exist() {
    let dir = workspace();
    bean_import(&dir)
        .args(["--config", "missing.toml", "identify", STATEMENT])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}

#[test]
fn file_prints_archive_path() {
    let dir = workspace();
    bean_import(&dir)
        .args(["file", STATEMENT])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Assets/Upwork/2020-01-31.{}",
            STATEMENT
        )));
}
