// SPDX-License-Identifier: MIT OR Apache-2.0

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn record(id: &str, heading: &str, date: Option<&str>, text: &str) -> String {
    let mut value = serde_json::json!({
        "id": id,
        "book_abbr": "TB",
        "book_name": "The Book",
        "heading": heading,
        "text": text,
    });
    if let Some(date) = date {
        value["date"] = Value::String(date.to_string());
    }
    value.to_string()
}

fn write_corpus(dir: &Path, records: &[String]) {
    let corpus = dir.join("books");
    fs::create_dir_all(&corpus).expect("create corpus dir");
    fs::write(corpus.join("tb.jsonl"), records.join("\n") + "\n").expect("write corpus");
}

fn excerpta(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("excerpta"));
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("EXCERPTA_LOG");
    cmd
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let assert = excerpta(dir)
        .args(["--format", "json", "--compact"])
        .args(args)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("json output")
}

fn small_corpus(dir: &Path) {
    write_corpus(
        dir,
        &[
            record(
                "tb-1",
                "Chapter 1",
                Some("1980-03-06"),
                "The cat sat on the mat. It was warm.\n\nLater the cat slept.",
            ),
            record("tb-2", "Chapter 2", Some("1971-04-30"), "Dogs barked at night.\n\nThe cat hid."),
            record("tb-3", "Chapter 3", None, "Reality is a frame of mind."),
        ],
    );
    run_json(dir, &["index", "--input", "books"]);
}

#[test]
fn index_reports_documents_and_skips_unchanged_corpus() {
    let dir = TempDir::new().expect("tempdir");
    write_corpus(dir.path(), &[record("tb-1", "Chapter 1", None, "Some cats.")]);

    let first = run_json(dir.path(), &["index", "--input", "books"]);
    assert_eq!(first["documents"], 1);
    assert_eq!(first["skipped"], false);
    assert!(dir.path().join(".excerpta/index/excerpta-metadata.json").exists());

    let second = run_json(dir.path(), &["index", "--input", "books"]);
    assert_eq!(second["skipped"], true);

    let forced = run_json(dir.path(), &["index", "--input", "books", "--force"]);
    assert_eq!(forced["skipped"], false);
}

#[test]
fn content_search_returns_multiple_results_with_excerpts() {
    let dir = TempDir::new().expect("tempdir");
    small_corpus(dir.path());

    let page = run_json(dir.path(), &["search", "cat"]);
    assert_eq!(page["result_type"], "multiple");
    assert_eq!(page["total"], 2);

    let hits = page["hits"].as_array().expect("hits");
    assert_eq!(hits[0]["excerpts"]["blocks"][0]["kind"], "full-paragraph");
    let html = hits[1]["excerpts"]["blocks"][0]["html"].as_str().expect("html");
    assert!(html.contains(r#"<strong class="match term0">cat</strong>"#));
    assert!(page["description"].is_string());
}

#[test]
fn metadata_search_is_a_listing_without_excerpts() {
    let dir = TempDir::new().expect("tempdir");
    small_corpus(dir.path());

    let page = run_json(dir.path(), &["search", "book:tb"]);
    assert_eq!(page["result_type"], "listing");
    assert_eq!(page["total"], 3);
    for hit in page["hits"].as_array().expect("hits") {
        assert!(hit["excerpts"]["blocks"].as_array().expect("blocks").is_empty());
    }
}

#[test]
fn date_sorts_put_undated_documents_last() {
    let dir = TempDir::new().expect("tempdir");
    small_corpus(dir.path());

    let ids = |page: &Value| -> Vec<String> {
        page["hits"]
            .as_array()
            .expect("hits")
            .iter()
            .map(|hit| hit["id"].as_str().expect("id").to_string())
            .collect()
    };

    let ascending = run_json(dir.path(), &["search", "book:tb", "--sort", "asc-date"]);
    assert_eq!(ids(&ascending), vec!["tb-2", "tb-1", "tb-3"]);

    let descending = run_json(dir.path(), &["search", "book:tb", "--sort", "desc-date"]);
    assert_eq!(ids(&descending), vec!["tb-1", "tb-2", "tb-3"]);
}

#[test]
fn exposed_single_result_is_truncated_with_a_notice() {
    let dir = TempDir::new().expect("tempdir");
    let text = (0..6)
        .map(|i| format!("Paragraph {} tells of the whale. {}", i + 10, "The sea was wide and grey. ".repeat(12)))
        .collect::<Vec<_>>()
        .join("\n\n");
    write_corpus(dir.path(), &[record("tb-1", "Chapter 1", None, &text)]);
    run_json(dir.path(), &["index", "--input", "books"]);

    let page = run_json(dir.path(), &["search", "whale"]);
    assert_eq!(page["result_type"], "single");
    assert_eq!(page["ordering"], "relevance");

    let excerpts = &page["hits"][0]["excerpts"];
    assert_eq!(excerpts["is_exposed"], true);
    let notice = excerpts["notice"].as_str().expect("notice");
    assert_eq!(
        notice,
        "All 6 matching paragraphs are shown best first, as this search matches much of the document."
    );
}

#[test]
fn hits_carry_key_terms_and_a_narrowing_query() {
    let dir = TempDir::new().expect("tempdir");
    small_corpus(dir.path());

    let page = run_json(dir.path(), &["search", "cat"]);
    let first = page["hits"]
        .as_array()
        .expect("hits")
        .iter()
        .find(|hit| hit["id"] == "tb-1")
        .expect("tb-1 hit");
    assert_eq!(first["key_terms"][0], "cat");
    assert_eq!(first["link"], r#"book:tb heading:"Chapter 1" cat"#);
    assert_eq!(first["html"][0], r#"<ul class="excerpts">"#);

    excerpta(dir.path())
        .args(["search", "cat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("key terms: cat"));
}

#[test]
fn index_refuses_to_replace_an_unrelated_directory() {
    let dir = TempDir::new().expect("tempdir");
    write_corpus(dir.path(), &[record("tb-1", "Chapter 1", None, "Some cats.")]);
    let notes = dir.path().join("notes");
    fs::create_dir_all(&notes).expect("create notes dir");
    fs::write(notes.join("todo.txt"), "keep").expect("write note");

    excerpta(dir.path())
        .args(["index", "--input", "books", "--index-dir", "notes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to replace it"));
    assert!(notes.join("todo.txt").exists());
}

#[test]
fn suggest_offers_a_corrected_query() {
    let dir = TempDir::new().expect("tempdir");
    small_corpus(dir.path());

    let output = run_json(dir.path(), &["suggest", "realty"]);
    assert_eq!(output["suggestion"], "reality");

    let output = run_json(dir.path(), &["suggest", "reality"]);
    assert!(output["suggestion"].is_null());
}

#[test]
fn text_search_prints_titles_and_marked_matches() {
    let dir = TempDir::new().expect("tempdir");
    small_corpus(dir.path());

    excerpta(dir.path())
        .args(["search", "cat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TB Chapter 1"))
        .stdout(predicate::str::contains("*cat*"));
}

#[test]
fn similar_rejects_unknown_ids() {
    let dir = TempDir::new().expect("tempdir");
    small_corpus(dir.path());

    excerpta(dir.path())
        .args(["similar", "tb-404"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No document with id 'tb-404'"));
}

#[test]
fn search_without_index_explains_how_to_build_one() {
    let dir = TempDir::new().expect("tempdir");

    excerpta(dir.path())
        .args(["search", "cat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Index not found"))
        .stderr(predicate::str::contains("excerpta index"));
}
