//! External player launch.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

pub fn player_args(path: &Path, crop: Option<&str>) -> Vec<OsString> {
    let mut args = Vec::with_capacity(3);
    if let Some(aspect) = crop {
        args.push(OsString::from("--crop"));
        args.push(OsString::from(aspect));
    }
    args.push(path.as_os_str().to_owned());
    args
}

/// Start the player and return once it is running. The child is reaped on
/// a detached thread so it never lingers as a zombie.
pub fn launch(player: &str, path: &Path, crop: Option<&str>) -> io::Result<()> {
    let mut child = Command::new(player)
        .args(player_args(path, crop))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    info!("player {} started for {}", player, path.display());
    std::thread::spawn(move || match child.wait() {
        Ok(status) => debug!("player exited: {}", status),
        Err(e) => debug!("player wait: {}", e),
    });
    Ok(())
}
