use std::io;
use std::process::{Command, Stdio};

use log::{info, warn};

/// Opens `url` with the platform's default handler.
pub fn open_url(url: &str) -> io::Result<()> {
    let (program, args) = opener();
    let status = Command::new(program)
        .args(args)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|err| io::Error::new(err.kind(), format!("failed launching `{program}`: {err}")))?;

    if status.success() {
        info!("event=browser_open module=cli status=ok opener={program}");
        return Ok(());
    }
    warn!("event=browser_open module=cli status=error opener={program} exit={status}");
    Err(io::Error::new(
        io::ErrorKind::Other,
        format!("`{program}` exited with status {status}"),
    ))
}

fn opener() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(target_os = "windows") {
        ("cmd", &["/C", "start", ""])
    } else {
        ("xdg-open", &[])
    }
}
