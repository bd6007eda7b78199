//! Knobs for decoding untrusted input.

/// Maximum nesting of lists, maps, arrays and described values unless configured otherwise
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// What to do when a message contains the same section kind more than once. Data and amqp-sequence
/// sections are exempt since AMQP allows a body to be split across several of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatedSection {
    /// Fail with `DecodeError::DuplicateSection`
    Reject,
    /// Keep the last occurrence and log a warning
    Overwrite,
    /// Keep the first occurrence and log a warning
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub max_depth: usize,
    pub repeated_sections: RepeatedSection,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH, repeated_sections: RepeatedSection::Reject }
    }
}

impl DecodeOptions {

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn repeated_sections(mut self, policy: RepeatedSection) -> Self {
        self.repeated_sections = policy;
        self
    }

}

#[cfg(test)]
mod tests {
    use super::{DecodeOptions, RepeatedSection, DEFAULT_MAX_DEPTH};

    #[test]
    fn defaults_reject_repeated_sections() {
        let options = DecodeOptions::default();
        assert_eq!(DEFAULT_MAX_DEPTH, options.max_depth);
        assert_eq!(RepeatedSection::Reject, options.repeated_sections);
    }

    #[test]
    fn setters_chain() {
        let options = DecodeOptions::default().max_depth(4).repeated_sections(RepeatedSection::Ignore);
        assert_eq!(DecodeOptions { max_depth: 4, repeated_sections: RepeatedSection::Ignore }, options);
    }
}
