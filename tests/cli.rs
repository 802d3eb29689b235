use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn scriptpad() -> Command {
    let mut cmd = Command::cargo_bin("scriptpad").expect("binary should build");
    cmd.env_remove("SCRIPTPAD_TIMEOUT_MS");
    cmd
}

const SHELL_CONFIG: &str = r#"{
    "shell_fallback": false,
    "languages": [
        { "name": "shell", "command": "sh", "extension": ".sh", "args": ["$FILE"] }
    ]
}"#;

#[test]
fn unknown_language_prints_diagnostic() {
    let dir = assert_fs::TempDir::new().unwrap();
    let script = dir.child("prog.cob");
    script.write_str("DISPLAY 'HI'.").unwrap();

    scriptpad()
        .arg(script.path())
        .assert()
        .code(2)
        .stdout("Unknown language chosen.\n");
}

#[test]
fn pinned_missing_interpreter_prints_diagnostic() {
    let dir = assert_fs::TempDir::new().unwrap();
    let script = dir.child("main.py");
    script.write_str("print('hi')").unwrap();
    let config = dir.child("config.json");
    config
        .write_str(r#"{ "shell_fallback": false, "interpreter_overrides": { "python": "/nonexistent/python" } }"#)
        .unwrap();

    scriptpad()
        .arg(script.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .code(2)
        .stdout("Could not find command python in Path.\n");
}

#[test]
fn invalid_config_is_an_error() {
    let dir = assert_fs::TempDir::new().unwrap();
    let script = dir.child("main.py");
    script.write_str("print('hi')").unwrap();
    let config = dir.child("config.json");
    config.write_str(r#"{ "timeout_ms": 0 }"#).unwrap();

    scriptpad()
        .arg(script.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_ms"));
}

#[cfg(unix)]
mod with_shell {
    use super::*;

    #[test]
    fn runs_script_with_stdin() {
        let dir = assert_fs::TempDir::new().unwrap();
        let config = dir.child("config.json");
        config.write_str(SHELL_CONFIG).unwrap();
        let script = dir.child("greet.sh");
        script.write_str("read name\necho \"hello $name\"\n").unwrap();
        let input = dir.child("input.txt");
        input.write_str("world\n").unwrap();

        scriptpad()
            .arg(script.path())
            .args(["--config"])
            .arg(config.path())
            .arg("--stdin")
            .arg(input.path())
            .assert()
            .success()
            .stdout("hello world\n");
    }

    #[test]
    fn expected_output_verdict() {
        let dir = assert_fs::TempDir::new().unwrap();
        let config = dir.child("config.json");
        config.write_str(SHELL_CONFIG).unwrap();
        let script = dir.child("count.sh");
        script.write_str("echo 1; echo 2").unwrap();
        let good = dir.child("good.txt");
        good.write_str("1\n2\n").unwrap();
        let bad = dir.child("bad.txt");
        bad.write_str("1\n3\n").unwrap();

        scriptpad()
            .arg(script.path())
            .arg("--config")
            .arg(config.path())
            .arg("--expected")
            .arg(good.path())
            .assert()
            .success()
            .stderr(predicate::str::contains("PASS"));

        scriptpad()
            .arg(script.path())
            .arg("--config")
            .arg(config.path())
            .arg("--expected")
            .arg(bad.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("FAIL at line 2"));
    }

    #[test]
    fn timeout_flag_applies() {
        let dir = assert_fs::TempDir::new().unwrap();
        let config = dir.child("config.json");
        config.write_str(SHELL_CONFIG).unwrap();
        let script = dir.child("hang.sh");
        script.write_str("sleep 30").unwrap();

        scriptpad()
            .arg(script.path())
            .arg("--config")
            .arg(config.path())
            .arg("--timeout-ms")
            .arg("300")
            .assert()
            .code(2)
            .stdout("Error timedout: script took longer than 0.3 seconds to run.\n");
    }

    #[test]
    fn timeout_from_environment() {
        let dir = assert_fs::TempDir::new().unwrap();
        let config = dir.child("config.json");
        config.write_str(SHELL_CONFIG).unwrap();
        let script = dir.child("hang.sh");
        script.write_str("sleep 30").unwrap();

        scriptpad()
            .env("SCRIPTPAD_TIMEOUT_MS", "300")
            .arg(script.path())
            .arg("--config")
            .arg(config.path())
            .assert()
            .code(2)
            .stdout("Error timedout: script took longer than 0.3 seconds to run.\n");
    }

    #[test]
    fn invalid_timeout_environment_is_ignored() {
        let dir = assert_fs::TempDir::new().unwrap();
        let config = dir.child("config.json");
        config.write_str(SHELL_CONFIG).unwrap();
        let script = dir.child("ok.sh");
        script.write_str("echo ok").unwrap();

        for value in ["0", "soon"] {
            scriptpad()
                .env("SCRIPTPAD_TIMEOUT_MS", value)
                .arg(script.path())
                .arg("--config")
                .arg(config.path())
                .assert()
                .success()
                .stdout("ok\n");
        }
    }

    #[test]
    fn json_report() {
        let dir = assert_fs::TempDir::new().unwrap();
        let config = dir.child("config.json");
        config.write_str(SHELL_CONFIG).unwrap();
        let script = dir.child("fail.sh");
        script.write_str("echo boom 1>&2; exit 7").unwrap();

        let output = scriptpad()
            .arg(script.path())
            .arg("--config")
            .arg(config.path())
            .arg("--json")
            .output()
            .unwrap();
        assert!(output.status.success());

        let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(document["report"]["language"], "shell");
        assert_eq!(document["report"]["exit_code"], 7);
        assert_eq!(document["report"]["outcome"]["status"], "output");
        assert_eq!(document["report"]["outcome"]["value"], "boom");
        assert!(document["verdict"].is_null());
    }
}
