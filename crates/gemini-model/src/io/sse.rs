use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
pub struct Sse {
    buf: String,
    // Data lines of the event being assembled, yielded once the blank
    // terminator line arrives.
    pending: Vec<String>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: String::new(),
            pending: Vec::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Read more data from the stream first.
            let mut has_more_data = false;
            if let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            {
                let Ok(s) = str::from_utf8(&bytes) else {
                    return Err(Error::InvalidPayload);
                };
                self.buf.push_str(s);
                has_more_data = true;
            }

            // There are data in the buffer, try to parse an event. If the data
            // is not enough to parse an event, we need to read more.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            // Abort if no more data available.
            if !has_more_data {
                return Ok(None);
            }
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        // An event is one or more `data` field lines followed by a blank
        // line. The server may terminate lines with either lf or cr lf.
        //
        // event         = *( comment / field ) end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        // end-of-line   = ( cr lf / cr / lf )
        while let Some(eol_idx) = self.buf.find('\n') {
            let line =
                self.buf[..eol_idx].trim_end_matches('\r').to_owned();
            self.buf.drain(0..eol_idx + 1);

            if line.is_empty() {
                if self.pending.is_empty() {
                    // A stray separator between events.
                    continue;
                }
                let event = self.pending.join("\n");
                self.pending.clear();
                return Ok(Some(event));
            }

            if let Some(data) = line.strip_prefix("data:") {
                let data = data.strip_prefix(' ').unwrap_or(data);
                self.pending.push(data.to_owned());
            } else {
                // Other fields are not supported.
                return Err(Error::InvalidPayload);
            }
        }

        Ok(None)
    }
}
