//! PGM image collaborator
//!
//! Reads `<input>/<W>x<H>.pgm` and writes `<output>/<W>x<H>x<turns>.pgm` as
//! binary greyscale (`P5`, max value 255). Writes go through a dedicated
//! thread so mid-run snapshots never stall the control loop.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{debug, error, info};

use super::{GridIo, Snapshot};
use crate::error::GridIoError;

const MAGIC: &str = "P5";
const MAX_VALUE: usize = 255;

// ============================================================================
// Codec
// ============================================================================

/// Decoded image: width, height, row-major pixels
pub type Image = (usize, usize, Vec<u8>);

/// Encode pixels as a binary PGM image.
pub fn encode(width: usize, height: usize, pixels: &[u8]) -> Vec<u8> {
    let header = format!("{MAGIC}\n{width} {height}\n{MAX_VALUE}\n");
    let mut out = Vec::with_capacity(header.len() + pixels.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(pixels);
    out
}

/// Decode a binary PGM image. Header fields may be separated by any
/// whitespace and interleaved with `#` comments.
pub fn decode(bytes: &[u8]) -> Result<Image, String> {
    let mut pos = 0;

    let magic = next_token(bytes, &mut pos).ok_or("missing magic number")?;
    if magic != MAGIC.as_bytes() {
        return Err(format!(
            "unsupported magic {:?}, expected {MAGIC}",
            String::from_utf8_lossy(magic)
        ));
    }

    let width = header_number(bytes, &mut pos, "width")?;
    let height = header_number(bytes, &mut pos, "height")?;
    let max_value = header_number(bytes, &mut pos, "max value")?;
    if max_value != MAX_VALUE {
        return Err(format!("unsupported max value {max_value}, expected {MAX_VALUE}"));
    }

    // Exactly one whitespace byte separates the header from the raster
    if !bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        return Err("missing separator after header".to_string());
    }
    pos += 1;

    let (len, end) = width
        .checked_mul(height)
        .and_then(|len| Some((len, pos.checked_add(len)?)))
        .ok_or("image dimensions too large")?;
    let pixels = bytes
        .get(pos..end)
        .ok_or_else(|| format!("expected {len} pixel bytes, found {}", bytes.len() - pos))?;

    Ok((width, height, pixels.to_vec()))
}

fn next_token<'a>(bytes: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    loop {
        match *bytes.get(*pos)? {
            b'#' => {
                while bytes.get(*pos).is_some_and(|&b| b != b'\n') {
                    *pos += 1;
                }
            }
            b if b.is_ascii_whitespace() => *pos += 1,
            _ => break,
        }
    }
    let start = *pos;
    while bytes.get(*pos).is_some_and(|b| !b.is_ascii_whitespace()) {
        *pos += 1;
    }
    Some(&bytes[start..*pos])
}

fn header_number(bytes: &[u8], pos: &mut usize, field: &str) -> Result<usize, String> {
    let token = next_token(bytes, pos).ok_or_else(|| format!("missing {field}"))?;
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| format!("invalid {field} {:?}", String::from_utf8_lossy(token)))
}

// ============================================================================
// Collaborator
// ============================================================================

enum WriterCommand {
    Save(Snapshot),
    CheckIdle(Sender<Result<(), GridIoError>>),
}

pub struct PgmIo {
    input_dir: PathBuf,
    output_dir: PathBuf,
    commands: Option<Sender<WriterCommand>>,
    writer: Option<JoinHandle<()>>,
}

impl PgmIo {
    /// Create the output directory and start the writer thread.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Result<Self, GridIoError> {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();

        fs::create_dir_all(&output_dir).map_err(|source| GridIoError::Io {
            path: output_dir.clone(),
            source,
        })?;

        let (tx, rx) = unbounded();
        let dir = output_dir.clone();
        let writer = thread::Builder::new()
            .name("pgm-writer".to_string())
            .spawn(move || run_writer(&dir, &rx))
            .map_err(|source| GridIoError::Io {
                path: output_dir.clone(),
                source,
            })?;

        Ok(Self {
            input_dir,
            output_dir,
            commands: Some(tx),
            writer: Some(writer),
        })
    }

    pub fn input_path(&self, width: usize, height: usize) -> PathBuf {
        self.input_dir.join(format!("{width}x{height}.pgm"))
    }

    pub fn output_path(&self, width: usize, height: usize, turns: u64) -> PathBuf {
        output_path(&self.output_dir, width, height, turns)
    }

    fn send(&self, command: WriterCommand) -> Result<(), GridIoError> {
        self.commands
            .as_ref()
            .ok_or(GridIoError::Disconnected)?
            .send(command)
            .map_err(|_| GridIoError::Disconnected)
    }
}

fn output_path(dir: &Path, width: usize, height: usize, turns: u64) -> PathBuf {
    dir.join(format!("{width}x{height}x{turns}.pgm"))
}

impl GridIo for PgmIo {
    fn load_grid(&mut self, width: usize, height: usize) -> Result<Vec<u8>, GridIoError> {
        let path = self.input_path(width, height);
        let bytes = fs::read(&path).map_err(|source| GridIoError::Io {
            path: path.clone(),
            source,
        })?;

        let (w, h, pixels) = decode(&bytes).map_err(|reason| GridIoError::Malformed {
            path: path.clone(),
            reason,
        })?;
        if (w, h) != (width, height) {
            return Err(GridIoError::Malformed {
                path,
                reason: format!("image is {w}x{h}, expected {width}x{height}"),
            });
        }

        info!(path = %path.display(), width, height, "Loaded initial grid");
        Ok(pixels)
    }

    fn save_grid(&mut self, snapshot: Snapshot) -> Result<(), GridIoError> {
        self.send(WriterCommand::Save(snapshot))
    }

    fn wait_idle(&mut self) -> Result<(), GridIoError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(WriterCommand::CheckIdle(reply_tx))?;
        reply_rx.recv().map_err(|_| GridIoError::Disconnected)?
    }
}

impl Drop for PgmIo {
    fn drop(&mut self) {
        // Disconnecting the queue lets the writer drain and exit
        self.commands.take();
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
    }
}

/// Writer loop. Commands are handled in order, so an idle check is answered
/// only after every save queued before it.
fn run_writer(dir: &Path, commands: &Receiver<WriterCommand>) {
    let mut failure: Option<GridIoError> = None;

    for command in commands {
        match command {
            WriterCommand::Save(snapshot) => {
                let path = output_path(dir, snapshot.width, snapshot.height, snapshot.turns);
                let data = encode(snapshot.width, snapshot.height, &snapshot.cells);
                match fs::write(&path, data) {
                    Ok(()) => debug!(path = %path.display(), turns = snapshot.turns, "Wrote snapshot"),
                    Err(source) => {
                        error!(path = %path.display(), %source, "Snapshot write failed");
                        failure.get_or_insert(GridIoError::Io { path, source });
                    }
                }
            }
            WriterCommand::CheckIdle(reply) => {
                let _ = reply.send(failure.take().map_or(Ok(()), Err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_header() {
        let data = encode(3, 2, &[0, 255, 0, 255, 0, 255]);
        assert!(data.starts_with(b"P5\n3 2\n255\n"));
        assert_eq!(&data[data.len() - 6..], &[0, 255, 0, 255, 0, 255]);
    }

    #[test]
    fn test_decode_roundtrip() {
        let pixels = vec![0, 255, 255, 0];
        let (w, h, decoded) = decode(&encode(2, 2, &pixels)).unwrap();
        assert_eq!((w, h), (2, 2));
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn test_decode_comments_and_whitespace() {
        let mut data = b"P5 # made by hand\n# another\n2\t1\r\n255\n".to_vec();
        data.extend_from_slice(&[255, 0]);
        assert_eq!(decode(&data).unwrap(), (2, 1, vec![255, 0]));
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(decode(b"P2\n1 1\n255\n\x00").is_err());
        assert!(decode(b"P5\n1 1\n15\n\x00").is_err());
        assert!(decode(b"P5\n2 2\n255\n\x00\x00").is_err());
        assert!(decode(b"P5\nx 2\n255\n").is_err());
        assert!(decode(b"").is_err());
        assert_eq!(
            decode(b"P5\n18446744073709551615 2\n255\n\x00\x00"),
            Err("image dimensions too large".to_string())
        );
    }

    #[test]
    fn test_decode_raster_may_start_with_whitespace_byte() {
        // 0x0A is a valid pixel value right after the separator
        let data = encode(2, 1, &[b'\n', 255]);
        assert_eq!(decode(&data).unwrap(), (2, 1, vec![b'\n', 255]));
    }
}
