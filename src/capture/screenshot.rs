//! Full-screen screenshot collaborators.
//!
//! Hiding the app window before the shot is the caller's job.

use crate::error::CaptureError;
use std::path::{Path, PathBuf};

/// Takes a full-screen screenshot and returns it as PNG bytes.
pub trait ScreenCapturer: Send + Sync {
    fn capture_full_screen(&self) -> Result<Vec<u8>, CaptureError>;
}

/// Known screenshot tools and the arguments that write a PNG to a path.
const TOOLS: &[(&str, &[&str])] = &[
    ("screencapture", &["-x"]),
    ("grim", &[]),
    ("gnome-screenshot", &["-f"]),
    ("scrot", &["-o"]),
    ("import", &["-window", "root"]),
];

/// Shells out to the first screenshot tool found on `PATH`.
pub struct CommandCapturer {
    program: PathBuf,
    args: Vec<String>,
    scratch_dir: PathBuf,
}

impl CommandCapturer {
    /// `program args... <out.png>` must write a PNG to the final argument.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Directory for the tool's output file. Defaults to the temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Locate a usable screenshot tool, if any.
    pub fn detect() -> Option<Self> {
        TOOLS.iter().find_map(|(name, args)| {
            which::which(name).ok().map(|program| {
                log::info!("[CAPTURE] Using screenshot tool: {}", program.display());
                Self::new(program, args.iter().map(|a| a.to_string()).collect())
            })
        })
    }

    fn scratch_path(&self) -> PathBuf {
        let epoch_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        self.scratch_dir
            .join(format!("snapsolve-shot-{}-{}.png", std::process::id(), epoch_ms))
    }

    fn run(&self, out: &Path) -> Result<(), CaptureError> {
        let output = std::process::Command::new(&self.program)
            .args(&self.args)
            .arg(out)
            .output()
            .map_err(|e| CaptureError::Tool(format!("{}: {}", self.program.display(), e)))?;
        if !output.status.success() {
            return Err(CaptureError::Tool(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl ScreenCapturer for CommandCapturer {
    fn capture_full_screen(&self) -> Result<Vec<u8>, CaptureError> {
        let start = std::time::Instant::now();
        let scratch = self.scratch_path();
        let result = self.run(&scratch).and_then(|()| {
            std::fs::read(&scratch).map_err(|e| CaptureError::Tool(e.to_string()))
        });
        // The tool may have written a partial file before failing.
        if scratch.exists() {
            if let Err(e) = std::fs::remove_file(&scratch) {
                log::warn!("[CAPTURE] Failed to remove {}: {}", scratch.display(), e);
            }
        }

        let bytes = result?;
        if bytes.is_empty() {
            return Err(CaptureError::Tool("screenshot tool produced an empty file".to_string()));
        }
        log::info!(
            "[CAPTURE] Full screen captured in {}ms ({} bytes)",
            start.elapsed().as_millis(),
            bytes.len()
        );
        Ok(bytes)
    }
}

/// Used when no screenshot backend is available; every capture fails.
#[cfg_attr(feature = "screen-capture", allow(dead_code))]
struct NoCapturer;

impl ScreenCapturer for NoCapturer {
    fn capture_full_screen(&self) -> Result<Vec<u8>, CaptureError> {
        Err(CaptureError::Unavailable)
    }
}

/// In-process capture of the primary monitor via xcap.
#[cfg(feature = "screen-capture")]
pub struct MonitorCapturer;

#[cfg(feature = "screen-capture")]
impl ScreenCapturer for MonitorCapturer {
    fn capture_full_screen(&self) -> Result<Vec<u8>, CaptureError> {
        let start = std::time::Instant::now();
        let monitors = xcap::Monitor::all().map_err(|e| CaptureError::Tool(e.to_string()))?;
        let monitor = monitors
            .iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .or_else(|| monitors.first())
            .ok_or(CaptureError::Unavailable)?;
        let image = monitor
            .capture_image()
            .map_err(|e| CaptureError::Tool(e.to_string()))?;

        let mut png_bytes = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut png_bytes),
                image::ImageFormat::Png,
            )
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        log::info!(
            "[CAPTURE] Primary monitor captured in {}ms ({} bytes)",
            start.elapsed().as_millis(),
            png_bytes.len()
        );
        Ok(png_bytes)
    }
}

/// Pick the best available capturer for this build and platform.
pub fn default_capturer() -> Box<dyn ScreenCapturer> {
    #[cfg(feature = "screen-capture")]
    {
        return Box::new(MonitorCapturer);
    }
    #[cfg(not(feature = "screen-capture"))]
    {
        match CommandCapturer::detect() {
            Some(capturer) => Box::new(capturer),
            None => {
                log::warn!("[CAPTURE] No screenshot tool found — capture disabled");
                Box::new(NoCapturer)
            }
        }
    }
}
