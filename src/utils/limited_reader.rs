use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio::io::{AsyncRead, ReadBuf};

/// Error payload carried inside the `io::Error` raised by [`LimitedReader`].
#[derive(Debug, thiserror::Error)]
#[error("stream exceeded the {limit} byte limit")]
pub struct SizeLimitExceeded {
    pub limit: u64,
}

/// Fails the read as soon as more than `limit` bytes have passed through,
/// so oversized uploads stop mid-transfer instead of after the fact.
pub struct LimitedReader<R> {
    inner: R,
    limit: u64,
    read: u64,
}

impl<R> LimitedReader<R> {
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            limit,
            read: 0,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for LimitedReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        ready!(Pin::new(&mut self.inner).poll_read(cx, buf))?;
        self.read += (buf.filled().len() - before) as u64;

        if self.read > self.limit {
            // A failed read must not report filled bytes.
            buf.set_filled(before);
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::InvalidData,
                SizeLimitExceeded { limit: self.limit },
            )));
        }
        Poll::Ready(Ok(()))
    }
}
