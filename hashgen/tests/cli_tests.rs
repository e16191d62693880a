use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const HASH_PATTERN: &str = r"\$2[aby]\$\d{2}\$[./A-Za-z0-9]{53}";

/// Helper to get the hashgen command with an empty config directory
fn hashgen_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("hashgen").unwrap();
    cmd.arg("--config-dir")
        .arg(config_dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn extract_hash(stdout: &[u8]) -> String {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .find(|l| l.starts_with("Hash: "))
        .expect("report has a Hash line");
    line.trim_start_matches("Hash: ").to_string()
}

mod generate {
    use super::*;

    #[test]
    fn prints_hash_verification_and_sql() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args(["generate", "--cost", "4", "--password-stdin"])
            .write_stdin("admin123\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("BCRYPT HASH GENERATED"))
            .stdout(predicate::str::contains("Verification: OK"))
            .stdout(
                predicate::str::is_match(format!(
                    r"UPDATE usuario SET password = '{}' WHERE username = 'admin';",
                    HASH_PATTERN
                ))
                .unwrap(),
            )
            .stdout(predicate::str::contains("admin123").not());
    }

    #[test]
    fn generated_hash_verifies_with_bcrypt() {
        let dir = TempDir::new().unwrap();
        let output = hashgen_cmd(&dir)
            .args(["generate", "--cost", "4", "--password-stdin"])
            .write_stdin("admin123\n")
            .output()
            .unwrap();
        assert!(output.status.success());

        let hash = extract_hash(&output.stdout);
        assert!(bcrypt::verify("admin123", &hash).unwrap());
        assert!(!bcrypt::verify("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn reads_password_from_env() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args(["generate", "--cost", "4", "--password-env", "HASHGEN_TEST_PW"])
            .env("HASHGEN_TEST_PW", "from-env")
            .assert()
            .success()
            .stdout(predicate::str::contains("Verification: OK"));
    }

    #[test]
    fn json_output_without_sql() {
        let dir = TempDir::new().unwrap();
        let output = hashgen_cmd(&dir)
            .args([
                "generate",
                "--cost",
                "4",
                "--hash-version",
                "2a",
                "--no-sql",
                "--format",
                "json",
                "--password-stdin",
            ])
            .write_stdin("admin123\n")
            .output()
            .unwrap();
        assert!(output.status.success());

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["verified"], true);
        assert_eq!(value["version"], "2a");
        assert!(value["hash"].as_str().unwrap().starts_with("$2a$04$"));
        assert!(value.get("sql").is_none());
    }

    #[test]
    fn custom_username_and_table() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args([
                "generate",
                "--cost",
                "4",
                "--username",
                "o'neil",
                "--table",
                "app_users",
                "--password-stdin",
            ])
            .write_stdin("secret\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("UPDATE app_users SET password = '"))
            .stdout(predicate::str::contains("WHERE username = 'o''neil';"));
    }

    #[test]
    fn config_file_sets_cost() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("default.toml"), "[hasher]\ncost = 5\n").unwrap();
        hashgen_cmd(&dir)
            .args(["generate", "--password-stdin"])
            .write_stdin("secret\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("$05$"));
    }

    #[test]
    fn invalid_cost_fails() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args(["generate", "--cost", "3", "--password-stdin"])
            .write_stdin("secret\n")
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("cost"));
    }

    #[test]
    fn overlong_password_fails() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args(["generate", "--cost", "4", "--password-stdin"])
            .write_stdin(format!("{}\n", "x".repeat(73)))
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("72"));
    }

    #[test]
    fn overlong_password_truncated_by_policy() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args([
                "generate",
                "--cost",
                "4",
                "--truncation",
                "truncate",
                "--password-stdin",
            ])
            .write_stdin(format!("{}\n", "x".repeat(80)))
            .assert()
            .success();
    }

    #[test]
    fn empty_stdin_fails() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args(["generate", "--cost", "4", "--password-stdin"])
            .write_stdin("")
            .assert()
            .failure()
            .stderr(predicate::str::contains("empty"));
    }

    #[test]
    fn bad_sql_config_ignored_with_no_sql() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("default.toml"), "[sql]\ntable = \"bad table\"\n").unwrap();
        hashgen_cmd(&dir)
            .args(["generate", "--cost", "4", "--no-sql", "--password-stdin"])
            .write_stdin("secret\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("Verification: OK"))
            .stdout(predicate::str::contains("UPDATE").not());
    }

    #[test]
    fn bad_sql_config_fails_when_rendered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("default.toml"), "[sql]\ntable = \"bad table\"\n").unwrap();
        hashgen_cmd(&dir)
            .args(["generate", "--cost", "4", "--password-stdin"])
            .write_stdin("secret\n")
            .assert()
            .code(2)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("sql.table"));
    }

    #[test]
    fn no_source_without_terminal_fails() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args(["generate", "--cost", "4"])
            .write_stdin("")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No password source"));
    }
}

mod default_flow {
    use super::*;

    #[test]
    fn top_level_options_generate_without_subcommand() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args(["--cost", "4", "--password-stdin"])
            .write_stdin("admin123\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("BCRYPT HASH GENERATED"))
            .stdout(predicate::str::contains("$2b$04$"))
            .stdout(predicate::str::contains("Verification: OK"))
            .stdout(
                predicate::str::is_match(format!(
                    r"UPDATE usuario SET password = '{}' WHERE username = 'admin';",
                    HASH_PATTERN
                ))
                .unwrap(),
            );
    }

    #[test]
    fn generate_options_before_subcommand_rejected() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args(["--cost", "5", "verify", "$2b$04$abc", "--password-stdin"])
            .write_stdin("admin123\n")
            .assert()
            .code(2)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("must follow the subcommand"));
    }
}

mod verify {
    use super::*;

    fn known_hash() -> String {
        bcrypt::hash("admin123", 4).unwrap()
    }

    #[test]
    fn matching_password_succeeds() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args(["verify", &known_hash(), "--password-stdin"])
            .write_stdin("admin123\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("Password matches hash"));
    }

    #[test]
    fn wrong_password_exits_with_mismatch() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args(["verify", &known_hash(), "--password-stdin"])
            .write_stdin("wrongpassword\n")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Password does not match hash"));
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let dir = TempDir::new().unwrap();
        hashgen_cmd(&dir)
            .args(["verify", "not-a-valid-hash", "--password-stdin"])
            .write_stdin("admin123\n")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Malformed hash"));
    }
}
