//! Side effects requested by the UI: intents for the studio, file reads and
//! exports on the runtime, and links handed to the system browser.

use std::process::{Command, Stdio};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::chat::is_web_link;
use crate::codec::export_image;
use crate::studio::StudioHandle;
use crate::upload::forward;

use super::state::{Action, Message, UiState};

pub fn execute(
    action: Action,
    state: &mut UiState,
    studio: &StudioHandle,
    msg_tx: &mpsc::UnboundedSender<Message>,
) {
    match action {
        Action::Dispatch(intent) => {
            if let Err(e) = studio.dispatch(intent) {
                warn!(error = %e, "intent not delivered");
                state.notice = Some(e.to_string());
            }
        }
        Action::Upload(file) => {
            let studio = studio.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                match forward(file, &studio).await {
                    Ok(outcome) => {
                        let _ = tx.send(Message::UploadFinished(outcome));
                    }
                    Err(e) => warn!(error = %e, "upload not delivered"),
                }
            });
        }
        Action::Export { image, path } => {
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let outcome = export_image(&image, &path).await;
                if let Err(e) = &outcome {
                    warn!(kind = e.kind(), path = %path.display(), "export failed");
                }
                let _ = tx.send(Message::Exported(outcome));
            });
        }
        Action::OpenLink(url) => match open_url(&url) {
            Ok(()) => {
                info!(%url, "opened link");
                state.notice = Some(format!("Opened {url}"));
            }
            Err(e) => {
                warn!(%url, error = %e, "could not open link");
                state.notice = Some(format!("Could not open link: {e}"));
            }
        },
    }
}

/// Open a web link in the platform-default browser (fire-and-forget).
pub fn open_url(url: &str) -> std::io::Result<()> {
    if !is_web_link(url) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "only http(s) links can be opened",
        ));
    }

    let Some(mut command) = browser_command() else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "no browser opener available for this platform",
        ));
    };
    // The child must not draw over the screen.
    command
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

fn browser_command() -> Option<Command> {
    #[cfg(target_os = "macos")]
    {
        return Some(Command::new("open"));
    }

    #[cfg(target_os = "windows")]
    {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        return Some(command);
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        return Some(Command::new("xdg-open"));
    }

    #[allow(unreachable_code)]
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_non_web_links_before_spawning() {
        let err = open_url("file:///etc/passwd").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        let err = open_url("https://evil\x1b]0;x").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
