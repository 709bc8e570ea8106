use crate::error::LlmError;

/// Events emitted while a turn's assistant reply is being streamed.
#[derive(Debug, Clone)]
pub enum LlmEvent {
    /// Incremental text content from the model.
    TextDelta { text: String },
    /// Stream completed successfully.
    Done { tokens_out: u32 },
    /// Stream failed; no further events follow.
    Error { error: LlmError },
}

/// Parse a single SSE line of the `data: <payload>` shape used by
/// OpenAI-compatible chat completion streaming endpoints.
pub fn parse_sse_data_line(line: &str) -> Option<&str> {
    line.strip_prefix("data: ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_data_prefix() {
        assert_eq!(parse_sse_data_line("data: {\"a\":1}"), Some("{\"a\":1}"));
    }

    #[test]
    fn non_data_lines_are_ignored() {
        assert_eq!(parse_sse_data_line("event: ping"), None);
    }
}
