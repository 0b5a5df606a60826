//! Transcoder command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Number of stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Builder for transcoder invocations.
#[derive(Debug, Clone)]
pub struct TranscodeCommand {
    input: PathBuf,
    output: PathBuf,
    /// Arguments placed before `-i`
    input_args: Vec<String>,
    /// Arguments placed after `-i`
    output_args: Vec<String>,
    log_level: String,
}

impl TranscodeCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            log_level: "error".to_string(),
        }
    }

    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Seek on the input before decoding.
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Limit the amount of input read.
    pub fn duration(self, seconds: f64) -> Self {
        self.input_arg("-t").input_arg(format!("{:.3}", seconds))
    }

    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    pub fn single_frame(self) -> Self {
        self.output_arg("-frames:v").output_arg("1")
    }

    /// JPEG quality scale (2 best .. 31 worst).
    pub fn quality(self, q: u8) -> Self {
        self.output_arg("-q:v").output_arg(q.to_string())
    }

    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(),
            "-v".to_string(),
            self.log_level.clone(),
        ];
        args.extend(self.input_args.iter().cloned());
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());
        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());
        args
    }
}

/// Runs transcoder commands with an optional timeout.
///
/// The child is killed when the timeout fires, and also when the run future
/// is dropped.
#[derive(Debug, Clone)]
pub struct TranscodeRunner {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for TranscodeRunner {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl TranscodeRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run a command to completion; returns the wall time it took.
    pub async fn run(&self, cmd: &TranscodeCommand) -> MediaResult<Duration> {
        let args = cmd.build_args();
        let program = self.program.to_string_lossy().to_string();
        debug!("Running transcoder: {} {}", program, args.join(" "));

        let started = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    MediaError::TranscoderNotFound(program.clone())
                } else {
                    MediaError::SpawnFailed {
                        program: program.clone(),
                        source,
                    }
                }
            })?;

        let stderr = child.stderr.take();
        let tail_handle = tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        let result = self.wait_for_completion(&mut child).await;
        let stderr_tail = tail_handle.await.unwrap_or_default();

        match result {
            Ok(status) if status.success() => Ok(started.elapsed()),
            Ok(status) => Err(MediaError::transcode_failed(
                format!("{} exited with non-zero status", program),
                (!stderr_tail.is_empty()).then_some(stderr_tail),
                status.code(),
            )),
            Err(e) => Err(e),
        }
    }

    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait().await?);
        };

        match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                let _ = child.kill().await;
                warn!("Transcoder timed out after {} seconds, killed process", limit.as_secs());
                Err(MediaError::Timeout(limit.as_secs()))
            }
        }
    }
}

/// Resolve the transcoder binary on `PATH` (or accept an existing path).
pub fn check_transcoder(program: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let program = program.as_ref();
    which::which(program)
        .map_err(|_| MediaError::TranscoderNotFound(program.to_string_lossy().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let args = TranscodeCommand::new("source.mp4", "clip.gif")
            .seek(300.0)
            .duration(300.0)
            .video_filter("fps=5,scale=320:-1:flags=fast_bilinear")
            .no_audio()
            .build_args();

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < input);
        assert_eq!(args[ss + 1], "300.000");
        assert_eq!(args.last().unwrap(), "clip.gif");
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_single_frame_args() {
        let args = TranscodeCommand::new("in.mp4", "out.jpg")
            .single_frame()
            .quality(3)
            .build_args();
        let frames = args.iter().position(|a| a == "-frames:v").unwrap();
        assert_eq!(args[frames + 1], "1");
        assert!(frames > args.iter().position(|a| a == "-i").unwrap());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let runner = TranscodeRunner::new("/nonexistent/transcoder-binary");
        let err = runner
            .run(&TranscodeCommand::new("a.mp4", "b.gif"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::TranscoderNotFound(_)));
    }

    #[test]
    fn test_check_transcoder_missing() {
        assert!(matches!(
            check_transcoder("definitely-not-a-transcoder-7f3a"),
            Err(MediaError::TranscoderNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_reports_code() {
        // `false` ignores its arguments and exits 1
        let runner = TranscodeRunner::new("false");
        let err = runner
            .run(&TranscodeCommand::new("a.mp4", "b.gif"))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child() {
        // `yes` never exits on its own
        let runner = TranscodeRunner::new("yes").with_timeout(Duration::from_millis(200));
        let result = runner.run(&TranscodeCommand::new("a.mp4", "b.gif")).await;
        assert!(matches!(result, Err(MediaError::Timeout(0))));
    }
}
