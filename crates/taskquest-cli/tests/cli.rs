//! CLI end-to-end tests against a throwaway data directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn taskquest(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("taskquest").unwrap();
    cmd.env("TASKQUEST_DATA_DIR", data_dir.path())
        .env_remove("TASKQUEST_LOG");
    cmd
}

fn run_json(data_dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = taskquest(data_dir).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_task_create_computes_reward() {
    let dir = TempDir::new().unwrap();
    let task = run_json(&dir, &["task", "create", "Write report", "--minutes", "30"]);
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["status"], "todo");
    assert_eq!(task["xp_reward"], 105);

    let high = run_json(&dir, &["task", "create", "Ship it", "--priority", "high"]);
    assert_eq!(high["xp_reward"], 140);
}

#[test]
fn test_task_create_rejects_blank_title() {
    let dir = TempDir::new().unwrap();
    taskquest(&dir)
        .args(["task", "create", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_task_list_and_filters() {
    let dir = TempDir::new().unwrap();
    run_json(&dir, &["task", "create", "Gym", "--category", "health"]);
    run_json(&dir, &["task", "create", "Taxes", "--category", "chores", "--priority", "high"]);

    let all = run_json(&dir, &["task", "list"]);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let health = run_json(&dir, &["task", "list", "--category", "health"]);
    assert_eq!(health.as_array().unwrap().len(), 1);
    assert_eq!(health[0]["title"], "Gym");

    let urgent = run_json(&dir, &["task", "list", "--urgent"]);
    assert_eq!(urgent.as_array().unwrap().len(), 1);
    assert_eq!(urgent[0]["title"], "Taxes");
}

#[test]
fn test_task_complete_awards_xp_once() {
    let dir = TempDir::new().unwrap();
    let task = run_json(&dir, &["task", "create", "Finish chapter"]);
    let id = task["id"].as_str().unwrap();

    run_json(&dir, &["pomodoro", "log", id]);
    let logged = run_json(&dir, &["pomodoro", "log", id]);
    assert_eq!(logged["task"]["pomodoros_completed"], 2);

    let report = run_json(&dir, &["task", "complete", id]);
    assert_eq!(report["task"]["status"], "completed");
    assert_eq!(report["xp_gained"], 105);
    assert_eq!(report["leveled_up"], true);
    assert_eq!(report["stats"]["level"], 2);
    assert_eq!(report["stats"]["total_pomodoros_completed"], 2);

    taskquest(&dir)
        .args(["task", "complete", id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already completed"));

    let level = run_json(&dir, &["stats", "level"]);
    assert_eq!(level["total_xp"], 105);
    assert_eq!(level["current_level"], 2);
    assert_eq!(level["xp_for_next_level"], 250);
    assert_eq!(level["xp_until_next_level"], 145);
    assert_eq!(level["level_title"], "Novice");
}

#[test]
fn test_task_get_update_delete() {
    let dir = TempDir::new().unwrap();
    let task = run_json(&dir, &["task", "create", "Draft"]);
    let id = task["id"].as_str().unwrap();

    let updated = run_json(&dir, &["task", "update", id, "--minutes", "60", "--title", "Final"]);
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["xp_reward"], 195);

    let fetched = run_json(&dir, &["task", "get", id]);
    assert_eq!(fetched["estimated_minutes"], 60);

    taskquest(&dir)
        .args(["task", "delete", id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task deleted"));

    taskquest(&dir)
        .args(["task", "get", id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_task_update_clears_fields() {
    let dir = TempDir::new().unwrap();
    let task = run_json(
        &dir,
        &[
            "task",
            "create",
            "Renew passport",
            "--description",
            "bring photos",
            "--deadline",
            "2030-01-05T18:00:00Z",
        ],
    );
    let id = task["id"].as_str().unwrap();
    assert!(!task["deadline"].is_null());

    let updated = run_json(
        &dir,
        &["task", "update", id, "--clear-deadline", "--description", "  "],
    );
    assert!(updated["deadline"].is_null());
    assert!(updated["description"].is_null());

    taskquest(&dir)
        .args([
            "task",
            "update",
            id,
            "--clear-deadline",
            "--deadline",
            "2030-01-05T18:00:00Z",
        ])
        .assert()
        .failure();
}

#[test]
fn test_categories_are_stored_and_enforced() {
    let dir = TempDir::new().unwrap();
    let categories = run_json(&dir, &["category", "list"]);
    assert_eq!(categories.as_array().unwrap().len(), 6);
    assert_eq!(categories[0]["id"], "work");

    taskquest(&dir)
        .args(["task", "create", "Mystery", "--category", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Category not found"));

    let created = run_json(&dir, &["category", "create", "Errands", "Errands", "--icon", "cart"]);
    assert_eq!(created["id"], "errands");
    let task = run_json(&dir, &["task", "create", "Post office", "--category", "errands"]);
    let id = task["id"].as_str().unwrap();

    taskquest(&dir)
        .args(["task", "update", id, "--category", "nowhere"])
        .assert()
        .failure();
    taskquest(&dir)
        .args(["category", "create", "errands", "Again"])
        .assert()
        .failure();
}

#[test]
fn test_pomodoro_sessions() {
    let dir = TempDir::new().unwrap();
    taskquest(&dir)
        .args(["config", "set", "pomodoro.pomodoros_before_long_break", "2"])
        .assert()
        .success();
    let task = run_json(&dir, &["task", "create", "Deep work"]);
    let id = task["id"].as_str().unwrap();

    let first = run_json(&dir, &["pomodoro", "log", id]);
    assert_eq!(first["session"]["duration_minutes"], 25);
    assert_eq!(first["session"]["kind"], "focus");
    assert_eq!(first["next_break"], "short_break");

    let pause = run_json(&dir, &["pomodoro", "log", id, "--kind", "short_break"]);
    assert_eq!(pause["session"]["duration_minutes"], 5);
    assert_eq!(pause["task"]["pomodoros_completed"], 1);
    assert!(pause.get("next_break").is_none());

    let second = run_json(&dir, &["pomodoro", "log", id, "--minutes", "50"]);
    assert_eq!(second["task"]["pomodoros_completed"], 2);
    assert_eq!(second["next_break"], "long_break");

    let sessions = run_json(&dir, &["pomodoro", "list", id]);
    assert_eq!(sessions.as_array().unwrap().len(), 3);

    taskquest(&dir)
        .args(["pomodoro", "log", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_templates() {
    let dir = TempDir::new().unwrap();
    let source = run_json(&dir, &["task", "create", "Ship release", "--priority", "high"]);
    let source_id = source["id"].as_str().unwrap();

    let template = run_json(
        &dir,
        &[
            "template",
            "create",
            "Release day",
            "--chained",
            "--task",
            "Write changelog",
            "--from-task",
            source_id,
        ],
    );
    let template_id = template["id"].as_str().unwrap();
    assert_eq!(template["tasks"].as_array().unwrap().len(), 2);

    let listed = run_json(&dir, &["template", "list"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let tasks = run_json(&dir, &["template", "use", template_id]);
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["title"], "Write changelog");
    assert_eq!(tasks[0]["xp_reward"], 105);
    assert_eq!(tasks[1]["xp_reward"], 140);
    assert_eq!(tasks[0]["next_task_id"], tasks[1]["id"]);
    assert_eq!(tasks[0]["chain_id"], tasks[1]["chain_id"]);
    assert_eq!(run_json(&dir, &["task", "list"]).as_array().unwrap().len(), 3);

    taskquest(&dir)
        .args(["template", "delete", template_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Template deleted"));
    taskquest(&dir)
        .args(["template", "use", template_id])
        .assert()
        .failure();

    let defaults = run_json(&dir, &["template", "install-defaults"]);
    assert_eq!(defaults.as_array().unwrap().len(), 3);
}

#[test]
fn test_stats_fresh_install() {
    let dir = TempDir::new().unwrap();
    let stats = run_json(&dir, &["stats", "show"]);
    assert_eq!(stats["total_xp"], 0);
    assert_eq!(stats["level"], 1);
    assert_eq!(stats["current_streak"], 0);
    assert_eq!(stats["streak_in_danger"], false);

    let levels = run_json(&dir, &["stats", "levels"]);
    let levels = levels.as_array().unwrap();
    assert_eq!(levels.len(), 15);
    assert_eq!(levels[14]["title"], "Ascended");
    assert_eq!(levels[14]["display"], "75.0K");

    let reset = run_json(&dir, &["stats", "reset-streak"]);
    assert_eq!(reset["current_streak"], 0);
}

#[test]
fn test_config_roundtrip() {
    let dir = TempDir::new().unwrap();

    taskquest(&dir)
        .args(["config", "get", "dark_mode"])
        .assert()
        .success()
        .stdout(predicate::str::diff("true\n"));

    taskquest(&dir)
        .args(["config", "set", "settings.dark_mode", "off"])
        .assert()
        .success();
    taskquest(&dir)
        .args(["config", "get", "dark_mode"])
        .assert()
        .success()
        .stdout(predicate::str::diff("false\n"));

    taskquest(&dir)
        .args(["config", "set", "daily_motivation_time", "off"])
        .assert()
        .success();
    taskquest(&dir)
        .args(["config", "get", "daily_motivation_time"])
        .assert()
        .success()
        .stdout(predicate::str::diff("off\n"));

    taskquest(&dir)
        .args(["config", "set", "daily_motivation_time", "25:99"])
        .assert()
        .failure();

    taskquest(&dir)
        .args(["config", "get", "no_such_key"])
        .assert()
        .failure();

    let listed = run_json(&dir, &["config", "list"]);
    assert_eq!(listed["settings"]["dark_mode"], false);
    assert_eq!(listed["gamification"]["base_xp"], 10);

    taskquest(&dir).args(["config", "reset"]).assert().success();
    let listed = run_json(&dir, &["config", "list"]);
    assert_eq!(listed["settings"]["dark_mode"], true);
}
