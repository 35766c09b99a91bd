use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use log::{info, warn};
use tokio::process::Command;

/// Captured result of a finished collaborator process.
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external tool to completion and returns its output. Any failure
/// (spawn error, timeout, non-zero exit) is flattened into a message.
pub async fn run_tool<I, S>(program: &str, args: I, timeout: Option<Duration>) -> std::result::Result<ToolOutput, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    log::debug!("[TOOL] Running {:?}", cmd.as_std());

    let child = cmd
        .spawn()
        .map_err(|e| format!("failed to start {}: {}", program, e))?;

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| format!("{} timed out after {:?}", program, limit))?,
        None => child.wait_with_output().await,
    }
    .map_err(|e| format!("failed to wait for {}: {}", program, e))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let detail = stderr.trim();
        return Err(if detail.is_empty() {
            format!("{} exited with {}", program, output.status)
        } else {
            format!("{} exited with {}: {}", program, output.status, detail)
        });
    }

    Ok(ToolOutput { stdout, stderr })
}

/// Returns true when `<program> <version_flag>` runs successfully.
pub async fn tool_available(program: &str, version_flag: &str) -> bool {
    run_tool(program, [version_flag], Some(Duration::from_secs(10)))
        .await
        .is_ok()
}

/// Sanitizes a filename by removing invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Creates a directory (and parents) if it doesn't exist. Another process
/// creating it first is not an error.
pub async fn ensure_dir_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::create_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => {}
        Err(e) => return Err(e),
    }
    info!("📁 [FS] Directory ready: {:?}", path);
    Ok(())
}

/// Deletes a file, logging instead of failing. A file that is already gone
/// counts as removed.
pub async fn remove_file_best_effort(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!("⚠️ [FS] Could not remove {:?}: {}", path, e);
            false
        }
    }
}
