//! End-to-end tests running the embedded hook host under a real interpreter.
//!
//! Skipped when no Python interpreter is available.

use pep517_hooks::{HookCaller, HookCallerConfig, HookError};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

const STUB_BACKEND: &str = r#"
import os

class UnsupportedOperation(Exception):
    pass

def get_requires_for_build_wheel(config_settings):
    if config_settings:
        return sorted(config_settings)
    return ["wheel>=0.25"]

def build_wheel(wheel_directory, config_settings=None, metadata_directory=None):
    name = "stub-1.0-py3-none-any.whl"
    with open(os.path.join(wheel_directory, name), "w") as f:
        f.write(os.getcwd())
    return name

def build_sdist(sdist_directory, config_settings=None):
    raise UnsupportedOperation("no sdists here")

class _Legacy:
    @staticmethod
    def get_requires_for_build_wheel(config_settings):
        return ["legacy-requirement"]

obj = _Legacy()
"#;

/// A backend without `prepare_metadata_for_build_wheel`. Every real build is
/// logged to `builds.log` in the working directory.
const WHEEL_ONLY_BACKEND: &str = r#"
import os
import zipfile

def build_wheel(wheel_directory, config_settings=None, metadata_directory=None):
    with open("builds.log", "a") as f:
        f.write("build\n")
    name = "demo-1.0-py3-none-any.whl"
    with zipfile.ZipFile(os.path.join(wheel_directory, name), "w") as zf:
        zf.writestr("demo/__init__.py", "")
        zf.writestr("demo-1.0.dist-info/METADATA", "Name: demo\nVersion: 1.0\n")
        zf.writestr("demo-1.0.dist-info/WHEEL", "Wheel-Version: 1.0\n")
    return name
"#;

fn python() -> Option<PathBuf> {
    HookCallerConfig::default().find_python().ok()
}

fn project_with_backend() -> tempfile::TempDir {
    let project = tempfile::tempdir().unwrap();
    std::fs::write(project.path().join("stub_backend.py"), STUB_BACKEND).unwrap();
    project
}

fn caller(project: &Path, backend: &str, backend_path: &[PathBuf], python: PathBuf) -> HookCaller {
    HookCaller::new(project, backend, Some(backend_path))
        .unwrap()
        .with_config(HookCallerConfig::default().python(python))
}

#[test]
fn test_in_tree_backend_hooks() {
    let Some(python) = python() else {
        eprintln!("Python not found; skipping hook host test");
        return;
    };
    let project = project_with_backend();
    let caller = caller(project.path(), "stub_backend", &[PathBuf::from(".")], python);

    assert_eq!(
        caller.get_requires_for_build_wheel(None).unwrap(),
        vec!["wheel>=0.25".to_string()]
    );

    let settings = serde_json::json!({"b": "1", "a": "2"});
    assert_eq!(
        caller.get_requires_for_build_wheel(Some(&settings)).unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );

    // Missing optional hook falls back to an empty list.
    assert!(caller.get_requires_for_build_sdist(None).unwrap().is_empty());

    let out = tempfile::tempdir().unwrap();
    let wheel = caller.build_wheel(out.path(), None, None).unwrap();
    assert_eq!(wheel, "stub-1.0-py3-none-any.whl");

    // The hook process runs in the source directory.
    let cwd = std::fs::read_to_string(out.path().join(&wheel)).unwrap();
    assert_eq!(
        std::fs::canonicalize(cwd).unwrap(),
        std::fs::canonicalize(project.path()).unwrap()
    );
}

#[test]
fn test_backend_unsupported_operation() {
    let Some(python) = python() else {
        eprintln!("Python not found; skipping hook host test");
        return;
    };
    let project = project_with_backend();
    let caller = caller(project.path(), "stub_backend", &[PathBuf::from(".")], python);

    let out = tempfile::tempdir().unwrap();
    let err = caller.build_sdist(out.path(), None).unwrap_err();
    assert!(err.is_unsupported());
    assert!(err.traceback().unwrap().contains("no sdists here"));
}

#[test]
fn test_missing_backend_is_unavailable() {
    let Some(python) = python() else {
        eprintln!("Python not found; skipping hook host test");
        return;
    };
    let project = tempfile::tempdir().unwrap();
    let caller = caller(project.path(), "pep517_no_such_backend", &[], python);

    match caller.get_requires_for_build_wheel(None).unwrap_err() {
        HookError::BackendUnavailable { traceback } => {
            assert!(traceback.contains("pep517_no_such_backend"))
        }
        other => panic!("expected BackendUnavailable, got {:?}", other),
    }
}

#[test]
fn test_backend_outside_backend_path_is_invalid() {
    let Some(python) = python() else {
        eprintln!("Python not found; skipping hook host test");
        return;
    };
    let project = tempfile::tempdir().unwrap();
    let caller = caller(project.path(), "json", &[PathBuf::from("backend")], python);

    match caller.get_requires_for_build_wheel(None).unwrap_err() {
        HookError::BackendInvalid {
            backend_name,
            backend_path,
            message,
        } => {
            assert_eq!(backend_name, "json");
            assert_eq!(backend_path.unwrap().len(), 1);
            assert!(message.contains("backend-path"));
        }
        other => panic!("expected BackendInvalid, got {:?}", other),
    }
}

#[test]
fn test_backend_object_path() {
    let Some(python) = python() else {
        eprintln!("Python not found; skipping hook host test");
        return;
    };
    let project = project_with_backend();
    let caller = caller(project.path(), "stub_backend:obj", &[PathBuf::from(".")], python);

    assert_eq!(
        caller.get_requires_for_build_wheel(None).unwrap(),
        vec!["legacy-requirement".to_string()]
    );
}

#[test]
fn test_missing_backend_object_is_invalid() {
    let Some(python) = python() else {
        eprintln!("Python not found; skipping hook host test");
        return;
    };
    let project = project_with_backend();
    let caller = caller(project.path(), "stub_backend:missing", &[PathBuf::from(".")], python);

    match caller.get_requires_for_build_wheel(None).unwrap_err() {
        HookError::BackendInvalid {
            backend_name,
            message,
            ..
        } => {
            assert_eq!(backend_name, "stub_backend:missing");
            assert_eq!(message, "Backend object 'missing' not found in 'stub_backend'");
        }
        other => panic!("expected BackendInvalid, got {:?}", other),
    }
}

#[test]
fn test_metadata_from_wheel_and_wheel_reuse() {
    let Some(python) = python() else {
        eprintln!("Python not found; skipping hook host test");
        return;
    };
    let project = tempfile::tempdir().unwrap();
    std::fs::write(project.path().join("wheel_only.py"), WHEEL_ONLY_BACKEND).unwrap();
    let caller = caller(project.path(), "wheel_only", &[PathBuf::from(".")], python);

    // No prepare hook: the wheel is built and its .dist-info extracted.
    let meta = tempfile::tempdir().unwrap();
    let dist_info = caller.prepare_metadata_for_build_wheel(meta.path(), None).unwrap();
    assert_eq!(dist_info, "demo-1.0.dist-info");
    assert!(meta.path().join(&dist_info).join("METADATA").is_file());
    assert!(meta.path().join("PEP517_ALREADY_BUILT_WHEEL").is_file());

    // The wheel built for metadata is copied rather than rebuilt.
    let out = tempfile::tempdir().unwrap();
    let metadata_directory = meta.path().join(&dist_info);
    let wheel = caller.build_wheel(out.path(), None, Some(&metadata_directory)).unwrap();
    assert_eq!(wheel, "demo-1.0-py3-none-any.whl");
    assert!(out.path().join(&wheel).is_file());

    let builds = std::fs::read_to_string(project.path().join("builds.log")).unwrap();
    assert_eq!(builds.lines().count(), 1);
}
