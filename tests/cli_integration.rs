//! CLI integration tests for slipway.
//!
//! These tests verify the full workflow from recipe evaluation through
//! packaging. The external build tool is a scripted fake cmake selected via
//! the `CMAKE` environment variable, which also records every invocation so
//! tests can assert on build avoidance.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const RECIPE: &str = r#"
[recipe]
name = "selene"
version = "0.3"
license = "MIT"
url = "https://github.com/kmhofmann/selene"
description = "A C++17 image representation, processing and I/O library."
requires = [
    "libjpeg-turbo/>=1.5.0@stable",
    "libpng/>=1.2.0@stable",
    "libtiff/>=4.0.9@stable",
]

[options.shared]
values = [true, false]
default = false

[[package.copy]]
pattern = "lib/*"
dest = "lib"
keep_path = false

[[package.copy]]
pattern = "license*"
dest = "licenses"
ignore_case = true
keep_path = false
required = true

[package-info]
libs = [
    "selene_base",
    "selene_base_io",
    "selene_img",
    "selene_img_io",
    "selene_img_io_jpeg",
    "selene_img_io_png",
    "selene_img_io_tiff",
    "selene_img_ops",
    "selene_io",
]
"#;

const INDEX: &str = r#"
[[packages]]
name = "libjpeg-turbo"
channel = "stable"
versions = [
    { version = "1.4.0" },
    { version = "1.5.0" },
    { version = "1.6.2" },
]

[[packages]]
name = "libpng"
channel = "stable"
versions = [{ version = "1.2.0" }, { version = "1.6.37" }]

[[packages]]
name = "libtiff"
channel = "stable"
versions = [{ version = "4.0.9" }]
"#;

/// Index where nothing satisfies `libtiff/>=4.0.9`.
const INDEX_STALE_TIFF: &str = r#"
[[packages]]
name = "libjpeg-turbo"
channel = "stable"
versions = [{ version = "1.5.0" }]

[[packages]]
name = "libpng"
channel = "stable"
versions = [{ version = "1.2.0" }]

[[packages]]
name = "libtiff"
channel = "stable"
versions = [{ version = "4.0.0" }]
"#;

const FAKE_CMAKE: &str = r#"#!/bin/sh
# Fake cmake used by the integration tests. Records each invocation and
# simulates configure/build/install.
echo "$@" >> "$FAKE_CMAKE_LOG"

mode=configure
src=""
build=""
prefix=""
while [ $# -gt 0 ]; do
    case "$1" in
        --build) mode=build; build="$2"; shift ;;
        --install) mode=install; build="$2"; shift ;;
        -S) src="$2"; shift ;;
        -B) build="$2"; shift ;;
        -DCMAKE_INSTALL_PREFIX=*) prefix="${1#-DCMAKE_INSTALL_PREFIX=}" ;;
    esac
    shift
done

if [ "$FAKE_CMAKE_FAIL_AT" = "$mode" ]; then
    echo "fake cmake: $mode boom" >&2
    exit 1
fi

case "$mode" in
    configure)
        mkdir -p "$build"
        printf '%s' "$prefix" > "$build/prefix.txt"
        ;;
    build)
        : ;;
    install)
        prefix=$(cat "$build/prefix.txt")
        mkdir -p "$prefix/lib"
        echo obj > "$prefix/lib/libselene_base.a"
        echo obj > "$prefix/lib/libselene_img.a"
        ;;
esac
exit 0
"#;

struct Sandbox {
    tmp: TempDir,
    recipe: PathBuf,
    index: PathBuf,
    cache: PathBuf,
    cmake_log: PathBuf,
    cmake: PathBuf,
}

fn sandbox(index_content: &str) -> Sandbox {
    let tmp = TempDir::new().unwrap();

    let recipe_dir = tmp.path().join("recipe");
    fs::create_dir_all(&recipe_dir).unwrap();
    let recipe = recipe_dir.join("Slipway.toml");
    fs::write(&recipe, RECIPE).unwrap();
    fs::write(recipe_dir.join("LICENSE"), "MIT License").unwrap();
    fs::write(recipe_dir.join("CMakeLists.txt"), "project(selene CXX)").unwrap();

    let index = tmp.path().join("index.toml");
    fs::write(&index, index_content).unwrap();

    let cmake = tmp.path().join("fake-cmake");
    fs::write(&cmake, FAKE_CMAKE).unwrap();
    fs::set_permissions(&cmake, fs::Permissions::from_mode(0o755)).unwrap();

    let cache = tmp.path().join("cache");
    let cmake_log = tmp.path().join("cmake.log");

    Sandbox {
        tmp,
        recipe,
        index,
        cache,
        cmake_log,
        cmake,
    }
}

impl Sandbox {
    fn slipway(&self) -> Command {
        let mut cmd = Command::cargo_bin("slipway").unwrap();
        cmd.env("CMAKE", &self.cmake)
            .env("FAKE_CMAKE_LOG", &self.cmake_log)
            .env("SLIPWAY_INDEX", &self.index)
            .env("SLIPWAY_CACHE", &self.cache)
            .current_dir(self.tmp.path());
        cmd
    }

    fn create(&self) -> Command {
        let mut cmd = self.slipway();
        cmd.args(["create", "--recipe"])
            .arg(&self.recipe)
            .arg("--work-dir")
            .arg(self.tmp.path().join("work"));
        cmd
    }

    fn cmake_invocations(&self) -> usize {
        match fs::read_to_string(&self.cmake_log) {
            Ok(log) => log.lines().count(),
            Err(_) => 0,
        }
    }

    fn package_dir(&self) -> PathBuf {
        // Exactly one published slot is expected in these tests
        let mut dirs: Vec<PathBuf> = fs::read_dir(&self.cache)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        assert_eq!(dirs.len(), 1, "expected exactly one cached package");
        dirs.pop().unwrap()
    }
}

// ============================================================================
// slipway create
// ============================================================================

#[test]
fn test_create_builds_and_publishes() {
    let sb = sandbox(INDEX);

    sb.create()
        .assert()
        .success()
        .stdout(predicate::str::contains("built and published"))
        .stdout(predicate::str::contains("libjpeg-turbo/1.6.2@stable"))
        .stdout(predicate::str::contains("libpng/1.6.37@stable"))
        .stdout(predicate::str::contains("libtiff/4.0.9@stable"));

    // configure, build, install
    assert_eq!(sb.cmake_invocations(), 3);

    let pkg = sb.package_dir();
    assert_eq!(
        fs::read_to_string(pkg.join("licenses/LICENSE")).unwrap(),
        "MIT License"
    );
    assert!(pkg.join("lib/libselene_base.a").exists());
    assert!(pkg.join("slipway-manifest.toml").exists());

    let manifest = fs::read_to_string(pkg.join("slipway-manifest.toml")).unwrap();
    assert!(manifest.contains("selene_img_io_jpeg"));
}

#[test]
fn test_create_warm_cache_skips_build_tool() {
    let sb = sandbox(INDEX);

    sb.create().assert().success();
    let after_cold = sb.cmake_invocations();

    sb.create()
        .assert()
        .success()
        .stdout(predicate::str::contains("cache hit"));

    // No further cmake calls on a warm cache
    assert_eq!(sb.cmake_invocations(), after_cold);
}

#[test]
fn test_create_force_build_rebuilds() {
    let sb = sandbox(INDEX);

    sb.create().assert().success();
    let after_cold = sb.cmake_invocations();

    sb.create().arg("--force-build").assert().success();
    assert_eq!(sb.cmake_invocations(), after_cold * 2);
}

#[test]
fn test_create_unresolved_dependency_fails_before_build() {
    let sb = sandbox(INDEX_STALE_TIFF);

    sb.create()
        .assert()
        .failure()
        .stderr(predicate::str::contains("no version of `libtiff`"));

    assert_eq!(sb.cmake_invocations(), 0);
    assert!(!sb.cache.exists());
}

#[test]
fn test_create_rejects_unknown_option() {
    let sb = sandbox(INDEX);

    sb.create()
        .args(["-o", "fpic=true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown option `fpic`"));

    assert_eq!(sb.cmake_invocations(), 0);
}

#[test]
fn test_create_rejects_out_of_domain_value() {
    let sb = sandbox(INDEX);

    sb.create()
        .args(["-o", "shared=maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value `maybe`"));
}

#[test]
fn test_create_build_failure_surfaces_tool_output() {
    let sb = sandbox(INDEX);

    sb.create()
        .env("FAKE_CMAKE_FAIL_AT", "build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("build step failed"))
        .stderr(predicate::str::contains("fake cmake: build boom"));

    // install never ran, nothing was published
    assert_eq!(sb.cmake_invocations(), 2);
    assert!(!sb.cache.exists());
}

#[test]
fn test_create_shared_option_reaches_cmake() {
    let sb = sandbox(INDEX);

    sb.create().args(["-o", "shared=true"]).assert().success();

    let log = fs::read_to_string(&sb.cmake_log).unwrap();
    assert!(log.contains("-DBUILD_SHARED_LIBS=ON"));
}

#[test]
fn test_create_forwards_extra_cmake_args_to_configure() {
    let sb = sandbox(INDEX);

    sb.create()
        .args(["--cmake-arg", "-DSELENE_BUILD_TESTS=OFF"])
        .args(["--cmake-arg", "-Wno-dev"])
        .assert()
        .success();

    let log = fs::read_to_string(&sb.cmake_log).unwrap();
    let configure = log
        .lines()
        .find(|l| l.contains("-S "))
        .expect("configure invocation logged");
    assert!(configure.contains("-DSELENE_BUILD_TESTS=OFF"));
    assert!(configure.contains("-Wno-dev"));
}

// ============================================================================
// slipway resolve
// ============================================================================

#[test]
fn test_resolve_prints_highest_satisfying_versions() {
    let sb = sandbox(INDEX);

    sb.slipway()
        .args(["resolve", "--recipe"])
        .arg(&sb.recipe)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "libjpeg-turbo/>=1.5.0@stable -> libjpeg-turbo/1.6.2@stable",
        ));

    // Resolution alone must not touch the build tool
    assert_eq!(sb.cmake_invocations(), 0);
}

#[test]
fn test_resolve_unknown_channel() {
    let sb = sandbox(INDEX);
    let recipe_dir = sb.recipe.parent().unwrap();
    fs::write(
        recipe_dir.join("Slipway.toml"),
        RECIPE.replace("libpng/>=1.2.0@stable", "libpng/>=1.2.0@testing"),
    )
    .unwrap();

    sb.slipway()
        .args(["resolve", "--recipe"])
        .arg(&sb.recipe)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no channel `testing`"));
}

// ============================================================================
// slipway info / clean
// ============================================================================

#[test]
fn test_info_shows_link_order_after_create() {
    let sb = sandbox(INDEX);
    sb.create().assert().success();

    let assert = sb
        .slipway()
        .args(["info", "--recipe"])
        .arg(&sb.recipe)
        .assert()
        .success()
        .stdout(predicate::str::contains("libs (link order):"));

    // Declared order preserved verbatim
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let base = stdout.find("selene_base").unwrap();
    let io = stdout.rfind("selene_io").unwrap();
    assert!(base < io);
}

#[test]
fn test_info_misses_without_create() {
    let sb = sandbox(INDEX);

    sb.slipway()
        .args(["info", "--recipe"])
        .arg(&sb.recipe)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no cached package"));
}

#[test]
fn test_clean_empties_cache() {
    let sb = sandbox(INDEX);
    sb.create().assert().success();

    sb.slipway().arg("clean").assert().success();

    sb.slipway()
        .args(["info", "--recipe"])
        .arg(&sb.recipe)
        .assert()
        .failure();
}

// ============================================================================
// slipway completions
// ============================================================================

#[test]
fn test_completions_generate() {
    let sb = sandbox(INDEX);

    sb.slipway()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("slipway"));
}
