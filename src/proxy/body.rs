use bytes::{Bytes, BytesMut};
use futures::{
    StreamExt,
    stream::{self, BoxStream},
};

use crate::{Error, Result};

/// Upstream response body.
///
/// Either streamed through untouched, or inspected once: a bounded
/// [`peek`](Self::peek) keeps the chunks it pulled and replays them ahead of
/// the rest of the stream, and [`into_text`](Self::into_text) buffers the
/// whole body. Peeked chunks are never fetched twice.
pub struct UpstreamBody {
    prefix: Vec<Bytes>,
    rest: BoxStream<'static, Result<Bytes>>,
    exhausted: bool,
}

impl UpstreamBody {
    pub fn new(rest: BoxStream<'static, Result<Bytes>>) -> Self {
        Self {
            prefix: Vec::new(),
            rest,
            exhausted: false,
        }
    }

    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(Error::from))
                .boxed(),
        )
    }

    fn buffered_len(&self) -> usize {
        self.prefix.iter().map(Bytes::len).sum()
    }

    /// Return up to `limit` leading bytes, pulling chunks only as needed.
    pub async fn peek(&mut self, limit: usize) -> Result<Bytes> {
        while self.buffered_len() < limit && !self.exhausted {
            match self.rest.next().await {
                Some(chunk) => {
                    let chunk = chunk?;
                    if !chunk.is_empty() {
                        self.prefix.push(chunk);
                    }
                }
                None => self.exhausted = true,
            }
        }

        let mut peeked = BytesMut::with_capacity(limit.min(self.buffered_len()));
        for chunk in &self.prefix {
            let remaining = limit - peeked.len();
            if remaining == 0 {
                break;
            }
            peeked.extend_from_slice(&chunk[..remaining.min(chunk.len())]);
        }

        Ok(peeked.freeze())
    }

    /// Stream the full body, replaying any peeked chunks first.
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes>> {
        let prefix = stream::iter(self.prefix.into_iter().map(Ok));
        if self.exhausted {
            prefix.boxed()
        } else {
            prefix.chain(self.rest).boxed()
        }
    }

    /// Buffer the full body and decode it as text.
    pub async fn into_text(self) -> Result<String> {
        let mut buffer = Vec::new();
        let mut stream = self.into_stream();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(decode_text(&buffer))
    }
}

/// Best-effort UTF-8 decoding: invalid sequences become U+FFFD and a
/// leading byte order mark is dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
