//! Source side of the scp protocol, as spoken to a remote `scp -t <path>`.
//!
//! The sink acknowledges each message with a single byte: `0` for success,
//! `1` (warning) or `2` (fatal) followed by a newline-terminated message.

use crate::remote::error::{Result, TransportError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const ACK_OK: u8 = 0;
const ACK_WARNING: u8 = 1;
const ACK_FATAL: u8 = 2;

/// Send one regular file. `name` is the base name announced to the sink; the
/// sink writes to the path it was started with.
pub async fn send_file<R, W>(
    reader: &mut R,
    writer: &mut W,
    name: &str,
    content: &[u8],
    mode: u32,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    read_ack(reader).await?;

    let header = format!("C{:04o} {} {}\n", mode & 0o7777, content.len(), name);
    writer.write_all(header.as_bytes()).await?;
    writer.flush().await?;
    read_ack(reader).await?;

    writer.write_all(content).await?;
    writer.write_all(&[ACK_OK]).await?;
    writer.flush().await?;
    read_ack(reader).await
}

async fn read_ack<R: AsyncRead + Unpin>(reader: &mut R) -> Result<()> {
    let mut byte = [0u8; 1];
    if reader.read(&mut byte).await? == 0 {
        return Err(TransportError::Closed);
    }

    match byte[0] {
        ACK_OK => Ok(()),
        ACK_WARNING | ACK_FATAL => {
            let message = read_line(reader).await?;
            Err(TransportError::CopyRejected { message })
        }
        other => Err(TransportError::Protocol(other)),
    }
}

async fn read_line<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    while reader.read(&mut byte).await? == 1 && byte[0] != b'\n' {
        line.push(byte[0]);
    }
    Ok(String::from_utf8_lossy(&line).trim().to_string())
}
