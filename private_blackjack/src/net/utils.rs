//! Newline framing for session messages.
//!
//! Every message is one ASCII line terminated by `\n`. A trailing `\r` is
//! tolerated. Lines longer than [`MAX_LINE_LEN`] are rejected before they are
//! buffered in full so a peer can't make us allocate without bound.

use std::{
    fmt::Display,
    io::{self, BufRead, Read, Write},
};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Longest accepted line, excluding the terminator.
pub const MAX_LINE_LEN: usize = 128;

fn finish_line(mut line: String, read: usize) -> io::Result<Option<String>> {
    if read == 0 {
        return Ok(None);
    }
    if !line.ends_with('\n') {
        // Either the peer closed mid-line or the line is too long.
        if read > MAX_LINE_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line exceeds maximum of {MAX_LINE_LEN} bytes"),
            ));
        }
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    line.pop();
    if line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

/// Read one line. `Ok(None)` means the peer closed the stream cleanly
/// between messages.
pub fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    let read = reader
        .take(MAX_LINE_LEN as u64 + 1)
        .read_line(&mut line)?;
    finish_line(line, read)
}

/// Write `msg` followed by a newline in a single write.
pub fn write_line<W: Write, M: Display>(writer: &mut W, msg: &M) -> io::Result<()> {
    writer.write_all(format!("{msg}\n").as_bytes())?;
    writer.flush()
}

/// Async counterpart of [`read_line`].
pub async fn read_line_async<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    let read = reader
        .take(MAX_LINE_LEN as u64 + 1)
        .read_line(&mut line)
        .await?;
    finish_line(line, read)
}

/// Async counterpart of [`write_line`].
pub async fn write_line_async<W: AsyncWrite + Unpin, M: Display>(
    writer: &mut W,
    msg: &M,
) -> io::Result<()> {
    writer.write_all(format!("{msg}\n").as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, BufReader, Write},
        net::{TcpListener, TcpStream},
    };

    use tokio::io::BufReader as AsyncBufReader;

    use super::*;

    fn setup() -> (BufReader<TcpStream>, TcpStream) {
        let server = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (stream, _) = server.accept().unwrap();
        (BufReader::new(client), stream)
    }

    #[test]
    fn write_and_read() {
        let (mut client, mut stream) = setup();
        assert!(write_line(&mut stream, &"ACTION?").is_ok());
        assert_eq!(read_line(&mut client).unwrap().as_deref(), Some("ACTION?"));
    }

    #[test]
    fn write_and_read_multiple_lines() {
        let (mut client, mut stream) = setup();
        let lines = ["3", "HIT", "STAND"];
        for line in &lines {
            write_line(&mut stream, line).unwrap();
        }
        for line in &lines {
            assert_eq!(read_line(&mut client).unwrap().as_deref(), Some(*line));
        }
    }

    #[test]
    fn carriage_return_is_stripped() {
        let (mut client, mut stream) = setup();
        stream.write_all(b"HIT\r\n").unwrap();
        assert_eq!(read_line(&mut client).unwrap().as_deref(), Some("HIT"));
    }

    #[test]
    fn clean_close_is_none() {
        let (mut client, stream) = setup();
        drop(stream);
        assert_eq!(read_line(&mut client).unwrap(), None);
    }

    #[test]
    fn close_mid_line_is_unexpected_eof() {
        let (mut client, mut stream) = setup();
        stream.write_all(b"HI").unwrap();
        drop(stream);
        assert_eq!(
            read_line(&mut client).map_err(|e| e.kind()),
            Err(io::ErrorKind::UnexpectedEof)
        );
    }

    #[test]
    fn reject_oversized_line() {
        let (mut client, mut stream) = setup();
        stream
            .write_all("x".repeat(MAX_LINE_LEN * 4).as_bytes())
            .unwrap();
        assert_eq!(
            read_line(&mut client).map_err(|e| e.kind()),
            Err(io::ErrorKind::InvalidData)
        );
    }

    #[test]
    fn longest_line_is_accepted() {
        let (mut client, mut stream) = setup();
        let line = "x".repeat(MAX_LINE_LEN);
        write_line(&mut stream, &line).unwrap();
        assert_eq!(read_line(&mut client).unwrap(), Some(line));
    }

    #[tokio::test]
    async fn async_write_and_read() {
        let (client, server) = tokio::io::duplex(256);
        let (_, mut writer) = tokio::io::split(server);
        let (reader, _) = tokio::io::split(client);
        let mut reader = AsyncBufReader::new(reader);

        write_line_async(&mut writer, &"SUMMARY WINS=1 LOSSES=0 PUSHES=0")
            .await
            .unwrap();
        write_line_async(&mut writer, &"ACTION?").await.unwrap();
        assert_eq!(
            read_line_async(&mut reader).await.unwrap().as_deref(),
            Some("SUMMARY WINS=1 LOSSES=0 PUSHES=0")
        );
        assert_eq!(
            read_line_async(&mut reader).await.unwrap().as_deref(),
            Some("ACTION?")
        );
        drop(writer);
    }

    #[tokio::test]
    async fn async_reject_non_utf8() {
        let (client, mut server) = tokio::io::duplex(64);
        server.write_all(&[0xFF, 0xFE, b'\n']).await.unwrap();
        let mut reader = AsyncBufReader::new(client);
        assert_eq!(
            read_line_async(&mut reader).await.map_err(|e| e.kind()),
            Err(io::ErrorKind::InvalidData)
        );
    }
}
