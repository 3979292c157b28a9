use assert_cmd::Command;
use classmap_test_helpers::fixtures::SourceTree;
use predicates::prelude::*;

// Helper to create classmap command using the non-deprecated macro approach
fn classmap_cmd(tree: &SourceTree) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("classmap"));
    cmd.current_dir(tree.root());
    cmd
}

fn sample_tree() -> SourceTree {
    let tree = SourceTree::new();
    tree.write("lib/a.php", "<?php\nclass Alpha {}\n");
    tree.write("lib/sub/b.php", "<?php\ninterface Beta {}\n");
    tree
}

// ============================================================================
// BUILD / LIST
// ============================================================================

#[test]
fn test_build_writes_cache() {
    let tree = sample_tree();

    classmap_cmd(&tree)
        .args(["--root", "lib/*", "--cache-file", "var/classmap.bin", "build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mapped 2 types from 2 files"))
        .stdout(predicate::str::contains("Cache written to"));

    assert!(tree.path("var/classmap.bin").is_file());
}

#[test]
fn test_build_reports_shadowed_definitions() {
    let tree = SourceTree::new();
    tree.write_class("one/Foo.php", "Foo");
    tree.write_class("two/Foo.php", "Foo");

    classmap_cmd(&tree)
        .args(["--root", "one", "--root", "two", "--no-cache", "build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("warning: Foo in"))
        .stdout(predicate::str::contains("Cache disabled"));
}

#[test]
fn test_list_plain_is_sorted() {
    let tree = sample_tree();

    classmap_cmd(&tree)
        .args(["--root", "lib/*", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)^Alpha\t.*a\.php\nBeta\t.*b\.php\n$").unwrap());
}

#[test]
fn test_list_json() {
    let tree = sample_tree();

    let output = classmap_cmd(&tree)
        .args(["--root", "lib/*", "list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed["Alpha"].as_str().unwrap().ends_with("a.php"));
    assert!(parsed["Beta"].as_str().unwrap().ends_with("b.php"));
}

#[test]
fn test_flat_root_skips_subdirectories() {
    let tree = sample_tree();

    classmap_cmd(&tree)
        .args(["--root", "lib", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alpha"))
        .stdout(predicate::str::contains("Beta").not());
}

// ============================================================================
// RESOLVE
// ============================================================================

#[test]
fn test_resolve_found() {
    let tree = sample_tree();

    classmap_cmd(&tree)
        .args(["--root", "lib/*", "resolve", "Beta"])
        .assert()
        .success()
        .stdout(predicate::str::contains("b.php"));
}

#[test]
fn test_resolve_unresolved_exits_nonzero() {
    let tree = sample_tree();

    classmap_cmd(&tree)
        .args(["--root", "lib/*", "resolve", "Gamma"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_resolve_with_corrupt_cache_fails() {
    let tree = sample_tree();
    tree.write("var/classmap.bin", "garbage");

    classmap_cmd(&tree)
        .args(["--root", "lib/*", "--cache-file", "var/classmap.bin", "resolve", "Alpha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a class map cache file"));
}

// ============================================================================
// CONFIG / INIT / CLEAR
// ============================================================================

#[test]
fn test_config_file_in_current_dir_is_used() {
    let tree = sample_tree();
    tree.write(
        "classmap.yaml",
        "scanRoots:\n  - lib/*\ncacheFile: cache/map.bin\n",
    );

    classmap_cmd(&tree)
        .args(["resolve", "Alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.php"));

    assert!(tree.path("cache/map.bin").is_file());
}

#[test]
fn test_explicit_config_and_extension_override() {
    let tree = SourceTree::new();
    tree.write("src/Widget.inc", "class Widget {}\n");
    tree.write("conf/settings.json", r#"{ "scanRoots": ["../src/*"] }"#);

    classmap_cmd(&tree)
        .args([
            "--config",
            "conf/settings.json",
            "--extension",
            ".inc",
            "resolve",
            "Widget",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Widget.inc"));
}

#[test]
fn test_init_writes_config_once() {
    let tree = SourceTree::new();

    classmap_cmd(&tree)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created classmap.yaml"));
    assert!(tree.path("classmap.yaml").is_file());

    classmap_cmd(&tree)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_clear_removes_cache() {
    let tree = sample_tree();
    let args = ["--root", "lib/*", "--cache-file", "var/classmap.bin"];

    classmap_cmd(&tree).args(args).arg("build").assert().success();

    classmap_cmd(&tree)
        .args(args)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));
    assert!(!tree.path("var/classmap.bin").exists());

    classmap_cmd(&tree)
        .args(args)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("No cache file at"));
}
