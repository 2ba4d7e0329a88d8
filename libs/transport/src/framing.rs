//! Wire framing: 4-byte little-endian length prefix followed by a JSON
//! payload. The cap applies on both ends so a corrupt prefix cannot make a
//! reader allocate unbounded memory.

use crate::error::{Result, TransportError};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame payload size.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Write one length-prefixed frame.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            size: payload.len(),
            limit: MAX_FRAME_SIZE,
        });
    }
    writer.write_all(&(payload.len() as u32).to_le_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame.
///
/// Returns `None` on a clean end-of-stream (peer closed between frames).
/// End-of-stream inside a frame is an error.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Bytes>>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 4];
    match reader.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let size = u32::from_le_bytes(prefix) as usize;
    if size > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            size,
            limit: MAX_FRAME_SIZE,
        });
    }

    let mut payload = vec![0u8; size];
    reader.read_exact(&mut payload).await?;
    Ok(Some(Bytes::from(payload)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_round_trip() {
        let (mut tx, mut rx) = tokio::io::duplex(1024);

        write_frame(&mut tx, b"{\"hello\":true}").await.unwrap();
        write_frame(&mut tx, b"").await.unwrap();

        let first = read_frame(&mut rx).await.unwrap().unwrap();
        assert_eq!(&first[..], b"{\"hello\":true}");
        let second = read_frame(&mut rx).await.unwrap().unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_clean_eof_is_none() {
        let (tx, mut rx) = tokio::io::duplex(64);
        drop(tx);
        assert!(read_frame(&mut rx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eof_inside_frame_is_error() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        // Prefix promises 8 bytes, only 3 arrive.
        tx.write_all(&8u32.to_le_bytes()).await.unwrap();
        tx.write_all(b"abc").await.unwrap();
        drop(tx);

        assert!(read_frame(&mut rx).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_prefix_rejected() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        tx.write_all(&(u32::MAX).to_le_bytes()).await.unwrap();

        match read_frame(&mut rx).await {
            Err(TransportError::FrameTooLarge { limit, .. }) => {
                assert_eq!(limit, MAX_FRAME_SIZE);
            }
            other => panic!("expected FrameTooLarge, got {:?}", other),
        }
    }
}
