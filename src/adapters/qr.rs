use crate::utils::error::Result;
use std::fs;
use std::path::Path;
use std::process::Command;

pub fn save_image(path: &str, data: &[u8]) -> Result<()> {
    let full_path = Path::new(path);

    if let Some(parent) = full_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(full_path, data)?;
    Ok(())
}

fn viewer_command(path: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", path]);
        command
    } else if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(path);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        command
    }
}

/// 用系統預設看圖程式開啟二維碼，失敗只記警告。子行程在背景執行緒回收
pub fn open_image(path: &str) {
    match viewer_command(path).spawn() {
        Ok(mut child) => {
            std::thread::spawn(move || {
                if let Err(e) = child.wait() {
                    tracing::debug!("Failed to wait for the QR viewer: {}", e);
                }
            });
        }
        Err(e) => {
            tracing::warn!("⚠️ Could not open {} automatically ({}), open it by hand", path, e);
        }
    }
}
