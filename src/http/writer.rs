use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::ResponseHead;

/// Bytes of file content read per step while streaming a GET response.
///
/// The first chunk travels in the same write as the headers.
pub const FILE_CHUNK_SIZE: usize = 1024;

/// Writes a serialized response, tracking partial writes.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(buffer: Vec<u8>) -> Self {
        Self { buffer, written: 0 }
    }

    /// Writer for a response without a body (404, 501, HEAD).
    pub fn head_only(head: &ResponseHead) -> Self {
        Self::new(head.render(None))
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}

/// Sends a 200 head followed by the file contents, one chunk at a time.
///
/// At most `size` bytes are sent so the body always matches the advertised
/// `Content-Length`. A file that turns out shorter is an error.
///
/// Returns the number of body bytes written.
pub async fn send_file<W>(
    stream: &mut W,
    head: &ResponseHead,
    file: File,
    size: u64,
) -> anyhow::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut reader = file.take(size);
    let mut chunk = [0u8; FILE_CHUNK_SIZE];

    let mut n = read_chunk(&mut reader, &mut chunk).await?;
    ResponseWriter::new(head.render(Some(&chunk[..n])))
        .write_to_stream(stream)
        .await?;

    let mut sent = n as u64;

    // A short chunk means end of file
    while n == FILE_CHUNK_SIZE {
        n = read_chunk(&mut reader, &mut chunk).await?;
        if n == 0 {
            break;
        }

        stream.write_all(&chunk[..n]).await?;
        sent += n as u64;
    }

    stream.flush().await?;

    if sent < size {
        anyhow::bail!("file shrank while streaming: sent {sent} of {size} bytes");
    }

    Ok(sent)
}

/// Fills `buf` from `reader`, stopping early only at end of input.
pub async fn read_chunk<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;

    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    Ok(filled)
}
