// tests/executor_real_process.rs
//
// End-to-end runs through `RealProcessBackend` with `sh` entry scripts.

#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use automan::config::{DiscoveryConfig, ExecutionConfig};
use automan::exec::{Executor, RealProcessBackend};
use automan::fs::{FileSystem, RealFileSystem};
use automan::registry::Registry;
use automan::tracking::ExecutionStatus;
use automan::types::{Completion, InputValues};
use automan_test_utils::builders::AutomationBuilder;
use automan_test_utils::{init_tracing, with_timeout};

fn executor(root: &Path, timeout: Duration) -> Executor {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let discovery = DiscoveryConfig {
        root: root.to_path_buf(),
        manifest_file: "ui_config.json".to_string(),
        entry_file: "run.sh".to_string(),
    };
    let registry = Arc::new(Registry::load(discovery, Arc::clone(&fs)));
    let config = ExecutionConfig {
        interpreter: Some("sh".to_string()),
        timeout,
        cleanup_grace: Duration::from_secs(60),
    };
    Executor::new(
        registry,
        fs,
        Arc::new(RealProcessBackend::new()),
        config,
        Handle::current(),
    )
}

fn values(pairs: &[(&str, &str)]) -> InputValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn process_alive(pid: &str) -> bool {
    std::process::Command::new("kill")
        .args(["-0", pid.trim()])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn arguments_and_working_directory_reach_the_script() {
    init_tracing();

    let root = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    AutomationBuilder::new("echoer")
        .input("src", "Source folder", "folder", true)
        .input("cfg", "Config file", "file", false)
        .script("echo \"argc=$#\"\necho \"src=$1\"\necho \"cfg=[$2]\"\necho \"cwd=$(basename \"$PWD\")\"\n")
        .write_to(root.path(), "run.sh");

    let exec = executor(root.path(), Duration::from_secs(30));
    let src = data.path().to_string_lossy().into_owned();
    let result = exec.run("echoer", &values(&[("src", &src)])).await;

    assert!(result.success, "output: {}", result.output);
    assert!(result.output.contains("argc=2"));
    assert!(result.output.contains(&format!("src={src}")));
    assert!(result.output.contains("cfg=[]"));
    assert!(result.output.contains("cwd=echoer"));
    assert!(!result.output.contains("--- ERRORS ---"));
}

#[tokio::test]
async fn non_zero_exit_with_stderr_is_reported() {
    init_tracing();

    let root = TempDir::new().unwrap();
    AutomationBuilder::new("broken")
        .script("echo starting\necho boom >&2\nexit 1\n")
        .write_to(root.path(), "run.sh");

    let exec = executor(root.path(), Duration::from_secs(30));
    let result = exec.run("broken", &InputValues::new()).await;

    assert!(!result.success);
    assert_eq!(result.output, "starting\n\n--- ERRORS ---\nboom\n");
}

#[tokio::test]
async fn timed_out_child_is_killed_before_returning() {
    init_tracing();

    let root = TempDir::new().unwrap();
    // `exec` keeps the sleeping process on the pid the script reports.
    AutomationBuilder::new("sleeper")
        .script("echo $$ > pid\nexec sleep 30\n")
        .write_to(root.path(), "run.sh");

    let exec = executor(root.path(), Duration::from_millis(500));
    let result = with_timeout(exec.run("sleeper", &InputValues::new())).await;

    assert!(!result.success);
    assert!(result.output.contains("timed out"));

    let pid = std::fs::read_to_string(root.path().join("sleeper").join("pid")).unwrap();
    assert!(!process_alive(&pid), "child {pid} outlived the run");
}

#[tokio::test]
async fn missing_interpreter_is_a_failed_result() {
    init_tracing();

    let root = TempDir::new().unwrap();
    AutomationBuilder::new("plain").write_to(root.path(), "run.sh");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let registry = Arc::new(Registry::load(
        DiscoveryConfig {
            root: root.path().to_path_buf(),
            manifest_file: "ui_config.json".to_string(),
            entry_file: "run.sh".to_string(),
        },
        Arc::clone(&fs),
    ));
    let exec = Executor::new(
        registry,
        fs,
        Arc::new(RealProcessBackend::new()),
        ExecutionConfig {
            interpreter: Some("definitely-not-an-interpreter-4d1f".to_string()),
            ..ExecutionConfig::default()
        },
        Handle::current(),
    );

    let result = exec.run("plain", &InputValues::new()).await;
    assert!(!result.success);
    assert!(result.output.contains("definitely-not-an-interpreter-4d1f"));
}

#[tokio::test]
async fn background_run_completes_through_the_callback() {
    init_tracing();

    let root = TempDir::new().unwrap();
    AutomationBuilder::new("greeter")
        .script("echo hello from background\n")
        .write_to(root.path(), "run.sh");

    let exec = executor(root.path(), Duration::from_secs(30));
    let (tx, rx) = oneshot::channel::<Completion>();
    let id = exec.run_async("greeter", InputValues::new(), move |c| {
        let _ = tx.send(c);
    });

    let completion = with_timeout(rx).await.unwrap();
    assert!(completion.success);
    assert_eq!(completion.output, "hello from background\n");
    assert_eq!(
        exec.executions().get(&id).unwrap().status,
        ExecutionStatus::Completed
    );
}

#[test]
fn run_blocking_serves_plain_threads() {
    init_tracing();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    let root = TempDir::new().unwrap();
    AutomationBuilder::new("quick")
        .script("echo quick\n")
        .write_to(root.path(), "run.sh");

    let exec = {
        let _guard = runtime.enter();
        executor(root.path(), Duration::from_secs(30))
    };

    let result = exec.run_blocking("quick", &InputValues::new());
    assert!(result.success);
    assert_eq!(result.output, "quick\n");
}
