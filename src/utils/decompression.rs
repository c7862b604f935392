use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use std::io::Read;
use tracing::{debug, warn};

use crate::errors::{SourceError, SourceResult};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Supported compression formats detected by magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Gzip,
    Uncompressed,
}

/// Detect compression format using magic bytes
pub fn detect_compression_format(data: &[u8]) -> CompressionFormat {
    if data.starts_with(&GZIP_MAGIC) {
        CompressionFormat::Gzip
    } else {
        CompressionFormat::Uncompressed
    }
}

/// Inflate a gzip body
pub fn decompress_gzip(data: &[u8]) -> SourceResult<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| SourceError::decompress(format!("invalid gzip data: {e}")))?;
    Ok(decompressed)
}

/// Decompress a downloaded feed body
///
/// Gzip bodies are inflated. Anything else, including a body that looks like
/// gzip but fails to inflate, is returned unchanged and left for the XML
/// parser to accept or reject.
pub fn decompress_feed(data: Bytes) -> Bytes {
    match detect_compression_format(&data) {
        CompressionFormat::Uncompressed => {
            debug!("Feed body is uncompressed ({} bytes)", data.len());
            data
        }
        CompressionFormat::Gzip => match decompress_gzip(&data) {
            Ok(inflated) => {
                debug!(
                    "Inflated gzip feed body from {} to {} bytes",
                    data.len(),
                    inflated.len()
                );
                Bytes::from(inflated)
            }
            Err(e) => {
                warn!("{}, using body as-is", e);
                data
            }
        },
    }
}
