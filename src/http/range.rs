//! Single byte-range requests (RFC 9110 §14)

/// Inclusive byte span inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn len(self) -> usize {
        self.end - self.start + 1
    }

    /// `Content-Range` value for this span of a `total`-byte file
    pub fn content_range(self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// Outcome of interpreting a `Range` header
#[derive(Debug, PartialEq, Eq)]
pub enum RangeRequest {
    /// No usable header: serve the full body
    Full,
    /// Serve this span with 206
    Partial(ByteRange),
    /// Answer 416
    Unsatisfiable,
}

/// Interpret a `Range` header against a file of `size` bytes.
///
/// Accepts `bytes=a-b`, `bytes=a-` and `bytes=-n`. Other units, multiple
/// ranges and syntax errors are ignored rather than rejected.
pub fn parse_range_header(header: Option<&str>, size: usize) -> RangeRequest {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeRequest::Full;
    };
    if spec.contains(',') {
        return RangeRequest::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return RangeRequest::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        return suffix_range(last, size);
    }

    let Ok(start) = first.parse::<usize>() else {
        return RangeRequest::Full;
    };
    let end = if last.is_empty() {
        None
    } else {
        match last.parse::<usize>() {
            Ok(end) => Some(end),
            Err(_) => return RangeRequest::Full,
        }
    };

    if start >= size {
        return RangeRequest::Unsatisfiable;
    }
    let end = end.map_or(size - 1, |e| e.min(size - 1));
    if start > end {
        return RangeRequest::Unsatisfiable;
    }
    RangeRequest::Partial(ByteRange { start, end })
}

fn suffix_range(last: &str, size: usize) -> RangeRequest {
    let Ok(suffix) = last.parse::<usize>() else {
        return RangeRequest::Full;
    };
    if suffix == 0 || size == 0 {
        return RangeRequest::Unsatisfiable;
    }
    RangeRequest::Partial(ByteRange {
        start: size.saturating_sub(suffix),
        end: size - 1,
    })
}
