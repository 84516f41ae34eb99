#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn valpro(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("valpro").unwrap();
    cmd.current_dir(dir.path())
        .env("VALPRO_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn init_project(dir: &TempDir) {
    valpro(dir).arg("init").assert().success();
}

fn login(dir: &TempDir, user_id: &str) {
    valpro(dir).args(["login", user_id]).assert().success();
}

/// Run with `--json`, require success, and parse stdout.
fn json(dir: &TempDir, args: &[&str]) -> Value {
    let out = valpro(dir).args(args).arg("--json").output().unwrap();
    assert!(
        out.status.success(),
        "valpro {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// valpro init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_demo_data() {
    let dir = TempDir::new().unwrap();
    valpro(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .valpro/config.yaml"));

    assert!(dir.path().join(".valpro/config.yaml").exists());
    assert!(dir.path().join(".valpro/data/jobs.yaml").exists());
    assert!(dir.path().join(".valpro/data/users.yaml").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    valpro(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .valpro/config.yaml"));
}

#[test]
fn init_empty_skips_demo_data() {
    let dir = TempDir::new().unwrap();
    valpro(&dir).args(["init", "--empty"]).assert().success();
    assert!(!dir.path().join(".valpro/data/jobs.yaml").exists());
}

#[test]
fn commands_before_init_fail() {
    let dir = TempDir::new().unwrap();
    valpro(&dir)
        .args(["user", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[test]
fn user_list_works_without_login() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    valpro(&dir)
        .args(["user", "list", "--type", "valuer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Charlie Davis"))
        .stdout(predicate::str::contains("Eve Adams"))
        .stdout(predicate::str::contains("Alice Johnson").not());
}

#[test]
fn job_commands_require_login() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    valpro(&dir)
        .args(["job", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"));
}

#[test]
fn login_whoami_logout() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    valpro(&dir)
        .args(["login", "user-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice Johnson (user-1, client)"));
    assert!(dir.path().join(".valpro/session.yaml").exists());

    let me = json(&dir, &["whoami"]);
    assert_eq!(me["id"], "user-1");

    valpro(&dir)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out."));
    assert!(!dir.path().join(".valpro/session.yaml").exists());

    valpro(&dir)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[test]
fn login_unknown_user_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    valpro(&dir)
        .args(["login", "user-99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("user not found: user-99"));
    assert!(!dir.path().join(".valpro/session.yaml").exists());
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[test]
fn job_list_is_scoped_to_role() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    login(&dir, "user-1");
    let jobs = json(&dir, &["job", "list"]);
    assert_eq!(jobs.as_array().unwrap().len(), 3);

    login(&dir, "user-4");
    let jobs = json(&dir, &["job", "list"]);
    assert_eq!(jobs.as_array().unwrap().len(), 5);

    let open = json(&dir, &["job", "list", "--status", "open-for-bids"]);
    assert_eq!(open.as_array().unwrap().len(), 2);
}

#[test]
fn job_show_renders_details() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    login(&dir, "user-2");
    valpro(&dir)
        .args(["job", "show", "job-67890"])
        .assert()
        .success()
        .stdout(predicate::str::contains("status:    Completed"))
        .stdout(predicate::str::contains("MPESA-QWERTY123"));
}

#[test]
fn full_lifecycle_through_bidding() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    login(&dir, "user-1");
    let job = json(
        &dir,
        &[
            "job", "create", "--make", "Toyota", "--model", "Land Cruiser", "--year", "2018",
            "--vin", "jtmhv05j604123456", "--address", "Westlands, Nairobi", "--type", "big",
        ],
    );
    assert_eq!(job["status"], "pending_payment");
    assert_eq!(job["payment_info"]["amount"], 6000);
    let id = job["id"].as_str().unwrap().to_string();

    let job = json(&dir, &["job", "pay", &id, "--open-bidding"]);
    assert_eq!(job["status"], "open_for_bids");

    login(&dir, "user-5");
    json(&dir, &["job", "bid", &id, "5500"]);

    login(&dir, "user-1");
    let job = json(&dir, &["job", "accept", &id, "user-5"]);
    assert_eq!(job["status"], "in_progress");

    login(&dir, "user-5");
    json(&dir, &["job", "task", &id, "1"]);
    let job = json(&dir, &["job", "report", &id, "/reports/land-cruiser.pdf"]);
    assert_eq!(job["status"], "report_ready");

    login(&dir, "user-1");
    valpro(&dir)
        .args(["job", "sign", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("signature url is required"));
    let job = json(&dir, &["job", "sign", &id, "--signature-url", "/sig/alice.png"]);
    assert_eq!(job["status"], "pending_valuer_signature");

    login(&dir, "user-5");
    let job = json(&dir, &["job", "sign", &id, "--signature-url", "/sig/eve.png"]);
    assert_eq!(job["status"], "pending_final_signature");

    login(&dir, "user-4");
    let job = json(&dir, &["job", "sign", &id, "--signature-url", "/sig/diana.png"]);
    assert_eq!(job["status"], "completed");
    let job = json(&dir, &["job", "payout", &id, "--transaction-id", "MPESA-XYZ789"]);
    assert_eq!(job["payout_info"]["amount"], 4800);

    login(&dir, "user-1");
    let job = json(&dir, &["job", "review", &id, "5", "Thorough", "and", "quick"]);
    assert_eq!(job["review"]["comment"], "Thorough and quick");
    assert_eq!(job["status"], "completed");

    // Everything above persisted to the data files.
    let jobs = std::fs::read_to_string(dir.path().join(".valpro/data/jobs.yaml")).unwrap();
    assert!(jobs.contains("MPESA-XYZ789"));
}

#[test]
fn revision_round_trip() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    login(&dir, "user-3");
    json(&dir, &["job", "report", "job-12345", "/reports/v1.pdf"]);

    login(&dir, "user-1");
    let job = json(&dir, &["job", "revise", "job-12345", "Mileage", "looks", "wrong"]);
    assert_eq!(job["status"], "revisions_requested");

    login(&dir, "user-3");
    let job = json(&dir, &["job", "report", "job-12345", "/reports/v2.pdf"]);
    assert_eq!(job["status"], "report_ready");
    assert_eq!(job["report_url"], "/reports/v2.pdf");
}

#[test]
fn illegal_transition_is_rejected_without_change() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    login(&dir, "user-2");

    let before = std::fs::read_to_string(dir.path().join(".valpro/data/jobs.yaml")).unwrap();
    valpro(&dir)
        .args(["job", "pay", "job-67890"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("capture_payment failed for job-67890"))
        .stderr(predicate::str::contains("invalid transition"));
    let after = std::fs::read_to_string(dir.path().join(".valpro/data/jobs.yaml")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn valuer_cannot_bid_twice() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    login(&dir, "user-5");
    valpro(&dir)
        .args(["job", "bid", "job-ABCDE", "4500"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("place_bid failed"));
}

#[test]
fn comments_are_recorded() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    login(&dir, "user-1");
    valpro(&dir)
        .args(["job", "comment", "job-12345", "Keys", "at", "reception"])
        .assert()
        .success()
        .stdout(predicate::str::contains("job-12345: add_comment -> In Progress"));
    valpro(&dir)
        .args(["job", "show", "job-12345"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[C1] Alice Johnson: Keys at reception"));
}

#[test]
fn valuer_records_inspection_findings() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    login(&dir, "user-1");
    valpro(&dir)
        .args(["job", "inspect", "job-12345", "hood", "--notes", "Dent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only the assigned valuer"));

    login(&dir, "user-3");
    let job = json(
        &dir,
        &[
            "job", "inspect", "job-12345", "front-bumper", "--notes", "Cracked fog light",
            "--photo-url", "/photos/fb.jpg",
        ],
    );
    assert_eq!(
        job["interactive_inspection"]["front-bumper"]["notes"],
        "Cracked fog light"
    );
    json(&dir, &["job", "damage", "job-12345", "Hail", "damage", "on", "roof"]);

    valpro(&dir)
        .args(["job", "inspect", "job-12345", "spoiler", "--notes", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown value 'spoiler'"));

    valpro(&dir)
        .args(["job", "show", "job-12345"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "front-bumper: Cracked fog light [/photos/fb.jpg]",
        ))
        .stdout(predicate::str::contains("damage:    Hail damage on roof"));
}

// ---------------------------------------------------------------------------
// Users and certifications
// ---------------------------------------------------------------------------

#[test]
fn admin_verifies_certification() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    login(&dir, "user-3");
    valpro(&dir)
        .args([
            "user",
            "cert",
            "user-5",
            "Heavy Commercial Vehicle Certification",
            "verified",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot review certifications"));

    login(&dir, "user-4");
    let eve = json(
        &dir,
        &[
            "user",
            "cert",
            "user-5",
            "Heavy Commercial Vehicle Certification",
            "verified",
        ],
    );
    assert_eq!(eve["certifications"][0]["status"], "verified");
    assert_eq!(eve["verified"], true);

    valpro(&dir)
        .args([
            "user",
            "cert",
            "user-5",
            "Heavy Commercial Vehicle Certification",
            "rejected",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already been reviewed"));
}

#[test]
fn user_edit_updates_profile() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    login(&dir, "user-3");
    let me = json(&dir, &["user", "edit", "--location", "Mombasa, Kenya"]);
    assert_eq!(me["location"], "Mombasa, Kenya");
    let shown = json(&dir, &["user", "show", "user-3"]);
    assert_eq!(shown["location"], "Mombasa, Kenya");
}

// ---------------------------------------------------------------------------
// Stats, notifications, config
// ---------------------------------------------------------------------------

#[test]
fn valuer_stats() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    login(&dir, "user-3");
    let perf = json(&dir, &["stats", "valuer"]);
    assert_eq!(perf["completed_jobs"], 1);
    assert_eq!(perf["active_jobs"], 1);
    assert_eq!(perf["total_earnings"], 4800);
}

#[test]
fn dashboard_counts_statuses() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    login(&dir, "user-4");
    let counts = json(&dir, &["stats", "dashboard"]);
    assert_eq!(counts["open_for_bids"], 2);
    assert_eq!(counts["completed"], 1);
}

#[test]
fn notification_routing() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let route = json(&dir, &["notify", "open", "job-12345"]);
    assert_eq!(route["route"], "login");

    login(&dir, "user-1");
    let route = json(&dir, &["notify", "open", "job-12345"]);
    assert_eq!(route["route"], "job_detail");

    let route = json(&dir, &["notify", "open", "job-00000"]);
    assert_eq!(route["route"], "not_found");

    let route = json(
        &dir,
        &[
            "notify",
            "open",
            "--payload",
            r#"{"notification":{"extra":{"jobId":"job-ABCDE"}}}"#,
        ],
    );
    assert_eq!(route["job_id"], "job-ABCDE");
}

#[test]
fn push_token_registration() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    login(&dir, "user-3");
    let out = json(&dir, &["notify", "register", "ExponentPushToken[abc]"]);
    assert_eq!(out["registered"], true);
    let tokens =
        std::fs::read_to_string(dir.path().join(".valpro/data/push_tokens.yaml")).unwrap();
    assert!(tokens.contains("ExponentPushToken[abc]"));
}

#[test]
fn config_validate_default_is_clean() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    valpro(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(
        dir.path().join(".valpro/config.yaml"),
        "payout_share_percent: 150\n",
    )
    .unwrap();
    valpro(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"))
        .stderr(predicate::str::contains("config validation found errors"));
}
