//! Platform audio playback through external player commands.
//!
//! | Platform | Player |
//! |----------|--------|
//! | macOS    | `afplay` |
//! | Linux    | first of `paplay`, `aplay`, `ffplay` on `PATH` |
//! | Windows  | PowerShell `Media.SoundPlayer` |
//!
//! The player of the clip currently playing is tracked by PID so a stop
//! request can terminate it without touching unrelated processes.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::audio_io::{AudioClip, AudioSink};
use crate::error::VoiceError;

#[cfg(target_os = "macos")]
const PLAYERS: &[&str] = &["afplay"];

#[cfg(target_os = "linux")]
const PLAYERS: &[&str] = &["paplay", "aplay", "ffplay"];

#[cfg(target_os = "windows")]
const PLAYERS: &[&str] = &["powershell"];

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const PLAYERS: &[&str] = &["ffplay"];

// ── Player command ─────────────────────────────────────────────────

/// How the clip path is passed to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ArgStyle {
    /// `player <file>` (afplay, paplay, aplay).
    PathOnly,
    /// `ffplay -nodisp -autoexit -loglevel quiet <file>`.
    Ffplay,
    /// PowerShell one-liner around `Media.SoundPlayer`.
    PowerShell,
    /// Fixed leading arguments followed by the file.
    Prefixed(Vec<String>),
}

/// An external program able to play a WAV file to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    program: PathBuf,
    style: ArgStyle,
}

impl PlayerCommand {
    /// A custom player: `program <args>... <file>`.
    pub fn new(program: impl Into<PathBuf>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            style: ArgStyle::Prefixed(args.into_iter().map(Into::into).collect()),
        }
    }

    /// The well-known player `name`, with its usual flags.
    fn known(name: &str) -> Self {
        let style = match name {
            "ffplay" => ArgStyle::Ffplay,
            "powershell" => ArgStyle::PowerShell,
            _ => ArgStyle::PathOnly,
        };
        Self {
            program: PathBuf::from(name),
            style,
        }
    }

    /// First platform player found on `PATH`.
    pub fn detect() -> Option<Self> {
        PLAYERS
            .iter()
            .find(|player| which::which(player).is_ok())
            .map(|player| Self::known(player))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn build_args(&self, path: &Path) -> Vec<String> {
        let path_str = path.to_string_lossy().into_owned();

        match &self.style {
            ArgStyle::PathOnly => vec![path_str],
            ArgStyle::Ffplay => vec![
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
                path_str,
            ],
            ArgStyle::PowerShell => vec![
                "-NoProfile".to_string(),
                "-NonInteractive".to_string(),
                "-Command".to_string(),
                format!(
                    "(New-Object Media.SoundPlayer '{}').PlaySync()",
                    path_str.replace('\'', "''")
                ),
            ],
            ArgStyle::Prefixed(args) => {
                let mut all = args.clone();
                all.push(path_str);
                all
            }
        }
    }
}

// ── CommandPlayer ──────────────────────────────────────────────────

/// [`AudioSink`] that shells out to a platform player per clip.
#[derive(Debug)]
pub struct CommandPlayer {
    player: Option<PlayerCommand>,
    current_pid: Mutex<Option<u32>>,
}

impl CommandPlayer {
    /// Use the first platform player available on this system.
    ///
    /// Construction never fails; without a player every `play` reports
    /// [`VoiceError::NoAudioPlayer`].
    pub fn detect() -> Self {
        let player = PlayerCommand::detect();
        match &player {
            Some(p) => tracing::debug!(player = %p.program().display(), "Audio player detected"),
            None => tracing::warn!(tried = %PLAYERS.join(", "), "No audio player found"),
        }
        Self::from_player(player)
    }

    pub fn with_player(player: PlayerCommand) -> Self {
        Self::from_player(Some(player))
    }

    const fn from_player(player: Option<PlayerCommand>) -> Self {
        Self {
            player,
            current_pid: Mutex::new(None),
        }
    }

    pub const fn player(&self) -> Option<&PlayerCommand> {
        self.player.as_ref()
    }

    /// PID of the player process running right now, if any.
    pub fn current_pid(&self) -> Option<u32> {
        *self.current_pid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_current_pid(&self, pid: Option<u32>) {
        *self.current_pid.lock().unwrap_or_else(PoisonError::into_inner) = pid;
    }
}

#[async_trait::async_trait]
impl AudioSink for CommandPlayer {
    async fn play(&self, clip: AudioClip, cancel: &CancellationToken) -> Result<(), VoiceError> {
        if cancel.is_cancelled() {
            return Err(VoiceError::Cancelled);
        }

        let player = self
            .player
            .as_ref()
            .ok_or_else(|| VoiceError::NoAudioPlayer(PLAYERS.join(", ")))?;

        tracing::debug!(
            player = %player.program().display(),
            path = %clip.path().display(),
            bytes = clip.size(),
            "Playing clip"
        );

        let mut child = Command::new(player.program())
            .args(player.build_args(clip.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        self.set_current_pid(child.id());

        let waited = tokio::select! {
            status = child.wait() => Some(status),
            () = cancel.cancelled() => None,
        };

        let result = match waited {
            Some(Ok(status)) if status.success() => Ok(()),
            Some(Ok(status)) => Err(VoiceError::PlaybackFailed {
                path: clip.path().to_path_buf(),
                reason: format!("{} exited with {status}", player.program().display()),
            }),
            Some(Err(e)) => Err(VoiceError::Io(e)),
            None => {
                if let Err(e) = child.start_kill() {
                    tracing::debug!(error = %e, "Player already exited");
                }
                let _ = child.wait().await;
                Err(VoiceError::Cancelled)
            }
        };

        self.set_current_pid(None);
        result
    }

    fn interrupt(&self) {
        let Some(pid) = self.current_pid() else {
            return;
        };
        tracing::debug!(pid, "Interrupting audio player");
        terminate_pid(pid);
    }
}

/// Send a termination request to `pid` without waiting for it to exit.
#[cfg(unix)]
fn terminate_pid(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        tracing::warn!(pid, "Player PID out of range");
        return;
    };

    match signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pid, error = %e, "Failed to signal audio player"),
    }
}

#[cfg(windows)]
fn terminate_pid(pid: u32) {
    let spawned = std::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    if let Err(e) = spawned {
        tracing::warn!(pid, error = %e, "Failed to run taskkill");
    }
}

#[cfg(not(any(unix, windows)))]
fn terminate_pid(pid: u32) {
    tracing::warn!(pid, "Interrupting playback is not supported on this platform");
}
