use intervention::Analysis;
use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn run_bin(args: &[&str]) -> Output {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_intervention"));

    Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command")
}

fn assert_success(output: &Output, args: &[&str]) -> String {
    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );
    stdout_str.to_string()
}

fn fresh_dir(name: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir_all(&test_dir).expect("failed to create test directory");
    test_dir
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("failed to convert path to string")
}

#[test]
fn basic_workflow() {
    let test_dir = fresh_dir("basic_workflow");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "title = \"Campaign\"\n"
        + "index = [2015, 2016, 2017, 2018, 2019, 2020, 2021, 2022]\n"
        + "series = [2.0, 3.1, 2.4, 3.0, 5.2, 6.1, 5.4, 6.3]\n"
        + "control_series = [1.0, 2.0, 1.5, 2.1, 1.2, 2.2, 1.4, 2.3]\n"
        + "intervention_label = 2019\n"
        + "\n"
        + "[[covariates]]\n"
        + "name = \"trend\"\n"
        + "values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]\n"
        + "\n"
        + "[analysis]\n"
        + "equal_var = false\n"
        + "alternative = \"greater\"\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");
    let config = path_str(&config_path);

    let args = ["--config", config, "report"];
    let report = assert_success(&run_bin(&args), &args);
    assert!(report.contains("intervention at position 4 (8 observations: 4 before, 4 after)"));
    assert!(report.contains("welch"));
    assert!(report.contains("#ancova:"));
    assert!(report.contains("trend"));

    let svg_path = test_dir.join("figure.svg");
    let args = ["--config", config, "plot", "--out", path_str(&svg_path)];
    assert_success(&run_bin(&args), &args);
    let svg = fs::read_to_string(&svg_path).expect("failed to read figure");
    assert!(svg.contains("Campaign"));
    assert_eq!(svg.matches("<polyline").count(), 2);

    let results_path = test_dir.join("results.msgpack");
    let args = ["--config", config, "export", "--out", path_str(&results_path)];
    assert_success(&run_bin(&args), &args);
    let bytes = fs::read(&results_path).expect("failed to read results");
    let analysis: Analysis = rmp_serde::from_slice(&bytes).expect("failed to decode results");
    assert_eq!(analysis.cut, 4);
    assert_eq!(analysis.sample_sizes.to_array(), [8, 4, 4]);
    assert!(analysis.ttest_series.p_value < 0.001);
    let ancova = analysis.ancova.expect("ancova table with covariates");
    assert_eq!(ancova.rows.len(), 4);

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn misaligned_config_fails() {
    let test_dir = fresh_dir("misaligned_config");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "series = [1.0, 2.0, 1.0, 2.0]\n"
        + "control_series = [3.0, 4.0, 3.0]\n"
        + "intervention_index = 2\n";
    fs::write(&config_path, config_contents).expect("failed to write config file");

    let output = run_bin(&["--config", path_str(&config_path), "report"]);
    assert!(!output.status.success());
    let stderr_str = String::from_utf8_lossy(&output.stderr);
    assert!(stderr_str.contains("invalid control series"), "{stderr_str}");

    fs::remove_dir_all(&test_dir).ok();
}
