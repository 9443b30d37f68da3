use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::audio_models::AudioFormat;
use crate::models::config::{CaptureConfiguration, OutputContainer};
use crate::models::error::CaptureError;
use crate::processing::wav_format;

/// Summary of a finalized sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSummary {
    pub path: PathBuf,
    /// Sample bytes appended, excluding container header.
    pub bytes_written: u64,
    /// SHA-256 hex digest of the complete file.
    pub checksum: String,
}

/// Append-only byte sink bound to one output file for a session.
pub trait FileSink: Send {
    /// Append raw sample bytes. Never reorders.
    fn write(&mut self, bytes: &[u8]) -> Result<(), CaptureError>;

    /// Flush and close. Idempotent: later calls return the first summary.
    fn finalize(&mut self) -> Result<SinkSummary, CaptureError>;

    /// Sample bytes appended so far.
    fn bytes_written(&self) -> u64;

    fn path(&self) -> &Path;
}

/// Builds the sink for a session. Called once per `start()`.
pub type SinkFactory =
    Box<dyn Fn(&CaptureConfiguration) -> Result<Box<dyn FileSink>, CaptureError> + Send + Sync>;

/// Default sink factory: a `PcmFileWriter` at the configured output path.
pub fn open_file_sink(config: &CaptureConfiguration) -> Result<Box<dyn FileSink>, CaptureError> {
    let writer = PcmFileWriter::create(&config.output_path, config.format, config.container)?;
    Ok(Box::new(writer))
}

/// Streaming PCM file writer.
///
/// ## File Format
///
/// **Raw:**
/// ```text
/// [sample bytes...]
/// ```
///
/// **WAV:**
/// ```text
/// [44-byte WAV header, sizes patched on finalize]
/// [sample bytes...]
/// ```
pub struct PcmFileWriter {
    file_path: PathBuf,
    container: OutputContainer,
    file: Option<BufWriter<File>>,
    bytes_written: u64,
    summary: Option<SinkSummary>,
}

impl PcmFileWriter {
    /// Create (truncating) the output file and write the container header.
    pub fn create(
        path: &Path,
        format: AudioFormat,
        container: OutputContainer,
    ) -> Result<Self, CaptureError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::Io(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(path)
            .map_err(|e| CaptureError::Io(format!("failed to create {}: {}", path.display(), e)))?;
        let mut file = BufWriter::new(file);

        if container == OutputContainer::Wav {
            let header = wav_format::generate_wav_header(&format, 0);
            file.write_all(&header)
                .map_err(|e| CaptureError::Io(format!("failed to write header: {}", e)))?;
        }

        log::debug!("Opened {:?} output at {}", container, path.display());

        Ok(Self {
            file_path: path.to_path_buf(),
            container,
            file: Some(file),
            bytes_written: 0,
            summary: None,
        })
    }

    fn patch_wav_header(file: &mut File, data_size: u64) -> std::io::Result<()> {
        file.seek(SeekFrom::Start(wav_format::RIFF_SIZE_OFFSET))?;
        file.write_all(&wav_format::riff_chunk_size(data_size).to_le_bytes())?;
        file.seek(SeekFrom::Start(wav_format::DATA_SIZE_OFFSET))?;
        file.write_all(&wav_format::data_chunk_size(data_size).to_le_bytes())?;
        file.seek(SeekFrom::End(0))?;
        Ok(())
    }
}

impl FileSink for PcmFileWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::Io("file is not open for writing".into()))?;
        file.write_all(bytes)
            .map_err(|e| CaptureError::Io(format!("write failed: {}", e)))?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn finalize(&mut self) -> Result<SinkSummary, CaptureError> {
        if let Some(summary) = &self.summary {
            return Ok(summary.clone());
        }

        let writer = self
            .file
            .take()
            .ok_or_else(|| CaptureError::Io("file is not open".into()))?;
        let mut file = writer
            .into_inner()
            .map_err(|e| CaptureError::Io(format!("flush failed: {}", e.error())))?;

        if self.container == OutputContainer::Wav {
            Self::patch_wav_header(&mut file, self.bytes_written)
                .map_err(|e| CaptureError::Io(format!("failed to patch header: {}", e)))?;
        }
        file.sync_all()
            .map_err(|e| CaptureError::Io(format!("sync failed: {}", e)))?;
        drop(file);

        let summary = SinkSummary {
            path: self.file_path.clone(),
            bytes_written: self.bytes_written,
            checksum: sha256_file(&self.file_path)?,
        };
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Compute SHA-256 hex digest of a file, streaming its contents.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let mut file = File::open(path)
        .map_err(|e| CaptureError::Io(format!("failed to open file for checksum: {}", e)))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| CaptureError::Io(format!("failed to read file for checksum: {}", e)))?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
