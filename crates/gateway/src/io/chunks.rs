#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;

/// The underlying byte stream failed while being read.
#[derive(Debug, PartialEq, Eq)]
pub struct Error(pub(crate) String);

/// A source of streaming byte chunks.
///
/// Chunks arrive with arbitrary sizes and boundaries; consumers must
/// not assume any alignment with lines or UTF-8 code points.
pub enum Chunks {
    Response(Response),
    #[cfg(test)]
    Scripted(VecDeque<Bytes>),
}

impl Chunks {
    /// Pulls the next chunk, or `None` once the stream has ended.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self {
            Chunks::Response(response) => response
                .chunk()
                .await
                .map_err(|err| Error(err.to_string())),
            #[cfg(test)]
            Chunks::Scripted(chunks) => Ok(chunks.pop_front()),
        }
    }
}

impl From<Response> for Chunks {
    fn from(response: Response) -> Self {
        Chunks::Response(response)
    }
}

#[cfg(test)]
impl From<VecDeque<Bytes>> for Chunks {
    fn from(chunks: VecDeque<Bytes>) -> Self {
        Chunks::Scripted(chunks)
    }
}
