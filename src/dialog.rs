use tokio::process::Command;

const PROMPT: &str = "Select a folder containing a .beads directory";

/// Outcome of a native folder-picker dialog.
#[derive(Debug, Default)]
pub struct FolderPick {
    pub path: Option<String>,
    pub cancelled: bool,
    pub error: Option<String>,
}

impl FolderPick {
    fn picked(path: String) -> Self {
        Self {
            path: Some(path),
            ..Self::default()
        }
    }

    fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Show a native folder picker and return the chosen path.
///
/// Shells out to the platform's dialog tool (`osascript` on macOS, `zenity`
/// or `kdialog` on Linux, PowerShell on Windows). Cancellation is not an
/// error; a missing dialog tool is.
pub async fn pick_folder() -> FolderPick {
    match std::env::consts::OS {
        "macos" => macos_dialog().await,
        "linux" => linux_dialog().await,
        "windows" => windows_dialog().await,
        other => FolderPick::failed(format!("unsupported platform: {other}")),
    }
}

async fn macos_dialog() -> FolderPick {
    let script = format!(
        "set selectedFolder to choose folder with prompt \"{PROMPT}\"\nreturn POSIX path of selectedFolder"
    );
    let output = match Command::new("osascript").arg("-e").arg(script).output().await {
        Ok(output) => output,
        Err(err) => return FolderPick::failed(err.to_string()),
    };
    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        return FolderPick::picked(path.trim_end_matches('/').to_string());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("User canceled") {
        FolderPick::cancelled()
    } else {
        FolderPick::failed(stderr.trim().to_string())
    }
}

async fn linux_dialog() -> FolderPick {
    // zenity first (GTK), kdialog as fallback (KDE). Exit code 1 means the
    // user dismissed the dialog.
    match Command::new("zenity")
        .args(["--file-selection", "--directory"])
        .arg(format!("--title={PROMPT}"))
        .output()
        .await
    {
        Ok(output) if output.status.success() => {
            return FolderPick::picked(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }
        Ok(output) if output.status.code() == Some(1) => return FolderPick::cancelled(),
        _ => {}
    }

    match Command::new("kdialog")
        .args(["--getexistingdirectory", "~/", "--title", PROMPT])
        .output()
        .await
    {
        Ok(output) if output.status.success() => {
            FolderPick::picked(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
        Ok(output) if output.status.code() == Some(1) => FolderPick::cancelled(),
        _ => FolderPick::failed("no file dialog available; install zenity or kdialog"),
    }
}

async fn windows_dialog() -> FolderPick {
    let script = "Add-Type -AssemblyName System.Windows.Forms; \
        $dialog = New-Object System.Windows.Forms.FolderBrowserDialog; \
        if ($dialog.ShowDialog() -eq 'OK') { Write-Output $dialog.SelectedPath }";
    let output = match Command::new("powershell")
        .args(["-NoProfile", "-Command", script])
        .output()
        .await
    {
        Ok(output) => output,
        Err(err) => return FolderPick::failed(err.to_string()),
    };
    if !output.status.success() {
        return FolderPick::failed(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if path.is_empty() {
        FolderPick::cancelled()
    } else {
        FolderPick::picked(path)
    }
}
