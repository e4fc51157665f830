use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const LABEL: &str = "Ingredients: Sugar, Palm Oil, Gelatin (Bovine), Warning: contains nuts";

fn halal_scan_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("halal-scan");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/halal-scan.sqlite"

[server]
bind = "127.0.0.1:7341"

[scan]
timeout_secs = 10
"#,
        root.display()
    );

    let config_path = config_dir.join("halal-scan.toml");
    fs::write(&config_path, config_content).unwrap();

    fs::write(root.join("label.txt"), LABEL).unwrap();
    fs::write(
        root.join("reference.json"),
        r#"[
  { "name": "sodium benzoate", "code": "E211", "category": "preservative",
    "status": "Caution", "description": "Synthetic preservative; check carrier." },
  { "name": "cochineal", "code": "E120", "category": "colour",
    "status": "Avoid", "description": "Insect-derived colour." }
]"#,
    )
    .unwrap();

    (tmp, config_path)
}

fn run_halal_scan(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = halal_scan_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run halal-scan binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn root_of(config_path: &Path) -> PathBuf {
    config_path.parent().unwrap().parent().unwrap().to_path_buf()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn init(config_path: &Path) {
    let (_, stderr, success) = run_halal_scan(config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
}

fn classify_json(config_path: &Path, label: &Path, extra: &[&str]) -> serde_json::Value {
    let mut args = vec!["classify", path_arg(label)];
    args.extend_from_slice(extra);
    let (stdout, stderr, success) = run_halal_scan(config_path, &args);
    assert!(success, "classify failed: {}", stderr);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("bad JSON ({}): {}", e, stdout))
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_halal_scan(&config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("Database initialized successfully."));
    assert!(root_of(&config_path).join("data/halal-scan.sqlite").exists());
}

#[test]
fn test_init_is_idempotent() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);
    init(&config_path);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_halal_scan(&tmp.path().join("nope.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_reference_import_and_list() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);
    let root = root_of(&config_path);

    let (stdout, stderr, success) = run_halal_scan(
        &config_path,
        &["reference", "import", path_arg(&root.join("reference.json"))],
    );
    assert!(success, "import failed: {}", stderr);
    assert!(stdout.contains("Imported 2 reference ingredients."));

    let (stdout, _, success) = run_halal_scan(&config_path, &["reference", "list"]);
    assert!(success);
    assert!(stdout.contains("sodium benzoate"));
    assert!(stdout.contains("E120"));
    assert!(stdout.contains("2 reference ingredients"));
    assert!(stdout.find("sodium benzoate").unwrap() < stdout.find("cochineal").unwrap());
}

#[test]
fn test_reference_import_rejects_unknown_status() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);
    let root = root_of(&config_path);

    let bad = root.join("bad.json");
    fs::write(
        &bad,
        r#"[{ "name": "salt", "status": "OK" }, { "name": "mystery", "status": "Unknown" }]"#,
    )
    .unwrap();

    let (_, stderr, success) = run_halal_scan(&config_path, &["reference", "import", path_arg(&bad)]);
    assert!(!success);
    assert!(stderr.contains("mystery"));

    let (stdout, _, _) = run_halal_scan(&config_path, &["reference", "list"]);
    assert!(stdout.contains("No reference ingredients"));
}

#[test]
fn test_classify_prints_verdict() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);
    let root = root_of(&config_path);

    let verdict = classify_json(&config_path, &root.join("label.txt"), &[]);
    assert_eq!(verdict["overallStatus"], "Caution");

    let ingredients = verdict["ingredients"].as_array().unwrap();
    let names: Vec<&str> = ingredients
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["sugar", "palm oil", "gelatin", "bovine"]);
    assert_eq!(ingredients[2]["status"], "Caution");
    assert_eq!(ingredients[0]["status"], "Unknown");
}

#[test]
fn test_classify_uses_references() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);
    let root = root_of(&config_path);
    run_halal_scan(
        &config_path,
        &["reference", "import", path_arg(&root.join("reference.json"))],
    );

    let label = root.join("soda.txt");
    fs::write(&label, "INGREDIENTS: carbonated water, sodium benzoate, colour (E120).").unwrap();

    let verdict = classify_json(&config_path, &label, &[]);
    assert_eq!(verdict["overallStatus"], "Avoid");

    let benzoate = verdict["ingredients"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["name"] == "sodium benzoate")
        .unwrap();
    assert_eq!(benzoate["status"], "Caution");
    assert_eq!(benzoate["description"], "Synthetic preservative; check carrier.");
}

#[test]
fn test_classify_without_learn_records_nothing() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);
    let root = root_of(&config_path);

    classify_json(&config_path, &root.join("label.txt"), &[]);

    let (stdout, _, success) = run_halal_scan(&config_path, &["candidates", "list"]);
    assert!(success);
    assert!(stdout.contains("No candidate ingredients awaiting review."));
}

#[test]
fn test_classify_learn_records_candidates_once() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);
    let label = root_of(&config_path).join("label.txt");

    let (_, stderr, success) =
        run_halal_scan(&config_path, &["classify", path_arg(&label), "--learn"]);
    assert!(success, "classify failed: {}", stderr);
    assert!(stderr.contains("learner: 3 new, 0 already known, 0 failed"));

    let (_, stderr, success) =
        run_halal_scan(&config_path, &["classify", path_arg(&label), "--learn"]);
    assert!(success);
    assert!(stderr.contains("learner: 0 new, 3 already known, 0 failed"));

    let (stdout, _, _) = run_halal_scan(&config_path, &["candidates", "list"]);
    assert!(stdout.contains("bovine"));
    assert!(stdout.contains("palm oil"));
    assert!(stdout.contains("auto-upload"));
    assert!(!stdout.contains("gelatin"));
    assert!(stdout.contains("3 candidates awaiting review"));
}

#[test]
fn test_noisy_label_is_rejected() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);
    let root = root_of(&config_path);

    let label = root.join("noisy.txt");
    fs::write(
        &label,
        "Ingredients: xkcdq1wrtzp, vbnmq7lkjhg, t r w q z x v b, salt",
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_halal_scan(&config_path, &["classify", path_arg(&label), "--learn"]);
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("too unclear"));

    let (stdout, _, _) = run_halal_scan(&config_path, &["candidates", "list"]);
    assert!(stdout.contains("No candidate ingredients awaiting review."));
}
