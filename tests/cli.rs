use std::fs;
use std::path::Path;

use predicates::prelude::*;
use serde_json::Value;

const GROUPS: &str = r#"[
  {
    "category": "Placement Material",
    "subcategory": "C & DSA Notes",
    "resources": [
      {"name": "Pointers in C", "file_link": "https://drive.google.com/file/d/AAA111/view"},
      {"name": "Graph Algorithms", "file_link": "https://drive.google.com/file/d/BBB222/view"}
    ]
  },
  {
    "category": "Mathematics",
    "subcategory": "Calculus",
    "resources": [
      {"name": "Calculus Cheat Notes", "file_link": "https://example.com/calculus.pdf", "thumbnail": "https://example.com/calc.png"}
    ]
  }
]"#;

const GUIDE: &str = "# Arrays\nintro\n## Two Pointers\ntext\n### Sliding Window\n# Graphs\n## BFS\n## BFS\n";

fn studyshelf() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("studyshelf");
    cmd.env_remove("STUDYSHELF_BACKEND_URL")
        .env_remove("STUDYSHELF_BACKEND_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut assert_cmd::Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is json")
}

fn import_catalog(dir: &Path) -> String {
    let groups = dir.join("groups.json");
    fs::write(&groups, GROUPS).expect("write groups");
    let catalog = dir.join("catalog.json");
    studyshelf()
        .args(["catalog", "import", "--groups"])
        .arg(&groups)
        .arg("--catalog")
        .arg(&catalog)
        .assert()
        .success();
    catalog.to_string_lossy().into_owned()
}

#[test]
fn library_list_without_backend_uses_fallback_records() {
    let page = stdout_json(studyshelf().args(["library", "list"]));
    assert_eq!(page["total_items"], 3);
    assert_eq!(page["items"][0]["name"], "100 Python Interview Questions");
}

#[test]
fn library_list_filters_catalog_file() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let catalog = import_catalog(temp.path());

    let page = stdout_json(studyshelf().args([
        "library",
        "list",
        "--catalog",
        &catalog,
        "--category",
        "Placement Material",
        "--sort",
        "title",
    ]));
    assert_eq!(page["total_items"], 2);
    assert_eq!(page["items"][0]["name"], "Graph Algorithms");
    assert_eq!(
        page["items"][0]["thumbnail"],
        "https://lh3.googleusercontent.com/d/BBB222=s1024?authuser=0"
    );

    let page = stdout_json(studyshelf().args([
        "library", "list", "--catalog", &catalog, "--search", "CALC",
    ]));
    assert_eq!(page["total_items"], 1);
    assert_eq!(page["items"][0]["thumbnail"], "https://example.com/calc.png");
}

#[test]
fn library_session_resumes_query_and_page() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let catalog = import_catalog(temp.path());
    let session = temp.path().join("session.json");
    let session = session.to_string_lossy().into_owned();

    studyshelf()
        .args([
            "library",
            "list",
            "--catalog",
            &catalog,
            "--category",
            "Mathematics",
            "--session",
            &session,
        ])
        .assert()
        .success();

    let page = stdout_json(studyshelf().args([
        "library", "resume", "--session", &session, "--catalog", &catalog,
    ]));
    assert_eq!(page["total_items"], 1);
    assert_eq!(page["page"], 1);
    assert_eq!(page["items"][0]["category"], "Mathematics");
}

#[test]
fn library_resume_without_session_fails() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let session = temp.path().join("missing.json");
    studyshelf()
        .args(["library", "resume", "--session"])
        .arg(&session)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no saved session"));
}

#[test]
fn catalog_add_remove_and_stats() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let catalog = import_catalog(temp.path());

    let output = studyshelf()
        .args([
            "catalog",
            "add",
            "--catalog",
            &catalog,
            "--name",
            "Linear Algebra",
            "--file-link",
            "https://example.com/linear.pdf",
            "--category",
            "Mathematics",
            "--subcategory",
            "Algebra",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let id = String::from_utf8(output).expect("utf8").trim().to_owned();
    assert!(id.starts_with("r_"));

    let stats = stdout_json(studyshelf().args(["catalog", "stats", "--catalog", &catalog]));
    assert_eq!(stats["total_resources"], 4);
    assert_eq!(stats["total_categories"], 3);

    studyshelf()
        .args(["catalog", "remove", "--catalog", &catalog, "--id", &id])
        .assert()
        .success();
    let stats = stdout_json(studyshelf().args(["catalog", "stats", "--catalog", &catalog]));
    assert_eq!(stats["total_resources"], 3);

    studyshelf()
        .args(["catalog", "remove", "--catalog", &catalog, "--id", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn catalog_add_prints_nothing_when_write_fails() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "not a directory").expect("write blocker");
    let catalog = blocker.join("catalog.json");

    studyshelf()
        .args(["catalog", "add", "--catalog"])
        .arg(&catalog)
        .args([
            "--name",
            "Linear Algebra",
            "--file-link",
            "https://example.com/linear.pdf",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("create parent dir"));
}

#[test]
fn toc_prints_headings_with_unique_ids() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let input = temp.path().join("guide.md");
    fs::write(&input, GUIDE).expect("write guide");

    let headings = stdout_json(studyshelf().args(["toc", "--json", "--input"]).arg(&input));
    let ids = headings
        .as_array()
        .expect("array")
        .iter()
        .map(|h| h["id"].as_str().unwrap_or_default().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(
        ids,
        vec![
            "arrays",
            "two-pointers",
            "sliding-window",
            "graphs",
            "bfs",
            "bfs-1"
        ]
    );

    studyshelf()
        .args(["toc", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("- Arrays #arrays"))
        .stdout(predicate::str::contains("    - Sliding Window #sliding-window"));
}

#[test]
fn render_writes_heading_anchors() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let input = temp.path().join("guide.md");
    fs::write(&input, GUIDE).expect("write guide");
    let out = temp.path().join("guide.html");

    studyshelf()
        .args(["render", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let html = fs::read_to_string(&out).expect("read html");
    assert!(html.contains("<h1 id=\"arrays\">Arrays</h1>"));
    assert!(html.contains("<h2 id=\"bfs-1\">BFS</h2>"));
}

#[test]
fn cheatsheets_list_and_show() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    fs::write(
        temp.path().join("git.md"),
        "---\ntitle: Git\ntags: [vcs]\ncategories: [Programming]\n---\n## Basics\n### Commit\ngit commit -m msg\n",
    )
    .expect("write sheet");
    fs::write(temp.path().join("docker-compose.md"), "## Up\n### Start\nup\n").expect("write sheet");

    let listed = stdout_json(
        studyshelf()
            .args(["cheatsheets", "list", "--search", "vcs", "--dir"])
            .arg(temp.path()),
    );
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["id"], "git");

    let shown = stdout_json(
        studyshelf()
            .args(["cheatsheets", "show", "--id", "docker-compose", "--dir"])
            .arg(temp.path()),
    );
    assert_eq!(shown["title"], "docker compose");
    assert_eq!(shown["categories"][0], "General");
    assert_eq!(shown["sections"][0]["subsections"][0]["title"], "Start");
}

#[test]
fn companies_questions_are_paged_and_banded() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let data = temp.path().join("companies.json");
    let questions = (0..12)
        .map(|i| {
            serde_json::json!({
                "Title": format!("Problem {i:02}"),
                "Difficulty": if i % 2 == 0 { "Easy" } else { "Hard" },
                "Frequency %": format!("{}%", i * 8),
                "Acceptance %": "50%",
                "URL": format!("https://leetcode.com/problems/p{i}")
            })
        })
        .collect::<Vec<_>>();
    let companies = serde_json::json!([
        {"company": "Google", "leetcode data": questions},
        {"company": "amazon", "leetcode data": []}
    ]);
    fs::write(&data, companies.to_string()).expect("write companies");

    let listed = stdout_json(studyshelf().args(["companies", "list", "--data"]).arg(&data));
    assert_eq!(listed["items"][0]["name"], "amazon");
    assert_eq!(listed["items"][1]["question_count"], 12);

    let page = stdout_json(
        studyshelf()
            .args(["companies", "questions", "--company", "google", "--page", "2", "--data"])
            .arg(&data),
    );
    assert_eq!(page["total_items"], 12);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(page["items"][1]["Title"], "Problem 11");
    assert_eq!(page["items"][1]["frequency_band"], "very_high");
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() {
    studyshelf()
        .env("RUST_LOG", "debug")
        .args(["library", "categories"])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
}
