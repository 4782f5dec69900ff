//! yt-dlp process driver

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Output, Stdio};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

use super::{FetchOptions, FetchedMedia, MediaError, MediaFetcher, ProbeResult};

const MAX_ERROR_CHARS: usize = 300;

// Progress lines are tagged so they can be told apart from --print output
// regardless of which stream the extractor writes them to.
const PROGRESS_MARKER: &str = "tubefetch-progress|";
const PROGRESS_TEMPLATE: &str =
    "download:tubefetch-progress|%(progress.status)s|%(progress._percent_str)s|%(progress.filename)s";

/// One parsed progress line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ProgressUpdate<'a> {
    pub status: &'a str,
    pub percent: &'a str,
    pub filename: &'a str,
}

/// Runs the `yt-dlp` executable as a child process, one per call.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProbeJson {
    title: Option<String>,
    duration: Option<f64>,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: Vec<OsString>) -> Result<Output, MediaError> {
        debug!(binary = %self.binary.display(), ?args, "Running extractor");

        let output = Command::new(&self.binary)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::Failed(summarize_stderr(&stderr)));
        }

        Ok(output)
    }

    /// Like `run`, but consumes output line by line so progress is logged
    /// while the download is still going. Returns non-progress stdout lines.
    async fn run_streaming(
        &self,
        args: Vec<OsString>,
        request_id: &str,
    ) -> Result<Vec<String>, MediaError> {
        debug!(binary = %self.binary.display(), ?args, "Running extractor");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::Failed("extractor stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::Failed("extractor stderr not captured".to_string()))?;

        let (out_lines, err_lines) = tokio::try_join!(
            collect_lines(stdout, request_id),
            collect_lines(stderr, request_id),
        )?;
        let status = child.wait().await?;

        if !status.success() {
            return Err(MediaError::Failed(summarize_stderr(&err_lines.join("\n"))));
        }

        Ok(out_lines)
    }
}

/// Reads `reader` to the end, logging progress lines and keeping the rest.
async fn collect_lines<R>(reader: R, request_id: &str) -> std::io::Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut kept = Vec::new();

    while let Some(line) = lines.next_line().await? {
        match parse_progress(&line) {
            Some(update) => debug!(
                request_id,
                status = update.status,
                percent = update.percent,
                filename = update.filename,
                "Download status"
            ),
            None => kept.push(line),
        }
    }

    Ok(kept)
}

pub(crate) fn parse_progress(line: &str) -> Option<ProgressUpdate<'_>> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let mut fields = rest.splitn(3, '|');
    Some(ProgressUpdate {
        status: fields.next()?.trim(),
        percent: fields.next()?.trim(),
        filename: fields.next().unwrap_or_default().trim(),
    })
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl MediaFetcher for YtDlp {
    async fn probe(&self, url: &str) -> Result<ProbeResult, MediaError> {
        let output = self.run(probe_args(url)).await?;
        parse_probe(&output.stdout)
    }

    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedMedia, MediaError> {
        let lines = self
            .run_streaming(fetch_args(url, options), &options.request_id)
            .await?;
        Ok(parse_fetch(&lines.join("\n")))
    }
}

fn probe_args(url: &str) -> Vec<OsString> {
    [
        "--dump-single-json",
        "--skip-download",
        "--no-playlist",
        "--no-cache-dir",
        "--quiet",
        "--no-warnings",
        "--",
        url,
    ]
    .into_iter()
    .map(OsString::from)
    .collect()
}

fn fetch_args(url: &str, options: &FetchOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--format".into(),
        options.format_selector.clone().into(),
        "--recode-video".into(),
        options.container_format.clone().into(),
        "--no-cache-dir".into(),
        "--no-simulate".into(),
        "--no-warnings".into(),
        "--newline".into(),
        "--progress".into(),
        "--progress-template".into(),
        PROGRESS_TEMPLATE.into(),
        "--print".into(),
        "title".into(),
        "--print".into(),
        "after_move:filepath".into(),
        "--output".into(),
        options.output_template.clone().into_os_string(),
    ];
    if options.no_playlist {
        args.push("--no-playlist".into());
    }
    args.push("--".into());
    args.push(url.into());
    args
}

fn parse_probe(stdout: &[u8]) -> Result<ProbeResult, MediaError> {
    let info: ProbeJson =
        serde_json::from_slice(stdout).map_err(|e| MediaError::Parse(e.to_string()))?;

    Ok(ProbeResult {
        title: info
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "video".to_string()),
        duration_seconds: info.duration,
    })
}

/// `--print title` runs before the download, `after_move:filepath` after it.
fn parse_fetch(stdout: &str) -> FetchedMedia {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    let title = lines.next().unwrap_or("video").to_string();
    let output_path = lines.last().map(PathBuf::from);
    FetchedMedia { title, output_path }
}

/// Reduces extractor stderr to its last meaningful line.
pub(crate) fn summarize_stderr(stderr: &str) -> String {
    let line = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or("extractor exited with an error");
    let line = line.strip_prefix("ERROR:").map(str::trim).unwrap_or(line);

    if line.chars().count() > MAX_ERROR_CHARS {
        let cut: String = line.chars().take(MAX_ERROR_CHARS).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
