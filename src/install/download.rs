use indicatif::ProgressBar;
use reqwest::blocking::Client;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, IoContext, Result};
use crate::progress::{download_bar, finish_err, finish_ok};

pub const CHUNK_SIZE: usize = 8192;

/// Stream `url` into a fresh temporary file inside `dir`.
///
/// The body is copied in [`CHUNK_SIZE`] pieces, so memory use does not
/// depend on the archive size. The file is deleted when the returned
/// handle is dropped.
pub fn download_to_temp(client: &Client, url: &str, dir: &Path) -> Result<NamedTempFile> {
    info!(%url, "downloading");
    let mut resp = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::network(url, e))?;

    let total = resp.content_length();
    debug!(content_length = ?total, "download started");

    let tmp = tempfile::Builder::new()
        .prefix("discord-")
        .suffix(".tar.gz")
        .tempfile_in(dir)
        .at(dir)?;

    let pb = download_bar(total);
    pb.set_message("downloading Discord");

    let res = copy_chunks(&mut resp, tmp.as_file(), total, &pb)
        .map_err(|e| match e {
            ChunkError::Read(source) => Error::network(url, source),
            ChunkError::Write(source) => Error::Io {
                path: tmp.path().to_path_buf(),
                source,
            },
        });

    match res {
        Ok(n) => {
            finish_ok(&pb, format!("downloaded {n} bytes"));
            info!(bytes = n, path = %tmp.path().display(), "download complete");
            Ok(tmp)
        }
        Err(e) => {
            finish_err(&pb, format!("download failed: {e}"));
            Err(e)
        }
    }
}

enum ChunkError {
    Read(std::io::Error),
    Write(std::io::Error),
}

fn copy_chunks(
    resp: &mut reqwest::blocking::Response,
    mut out: &std::fs::File,
    total: Option<u64>,
    pb: &ProgressBar,
) -> std::result::Result<u64, ChunkError> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;
    let mut last_percent = None;
    loop {
        let n = match resp.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ChunkError::Read(e)),
        };
        out.write_all(&buf[..n]).map_err(ChunkError::Write)?;
        downloaded += n as u64;
        pb.set_position(downloaded);

        if let Some(len) = total.filter(|l| *l > 0) {
            let percent = downloaded * 100 / len;
            if last_percent != Some(percent) {
                debug!(percent, "download progress");
                last_percent = Some(percent);
            }
        }
    }
    out.flush().map_err(ChunkError::Write)?;
    Ok(downloaded)
}
