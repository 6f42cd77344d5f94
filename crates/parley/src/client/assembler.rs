/// Folds content fragments, in arrival order, into one growing string
#[derive(Debug, Default)]
pub struct MessageAssembler {
    text: String,
    fragments: usize,
}

impl MessageAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        self.fragments += 1;
    }

    /// Text assembled so far
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn finish(self) -> AssembledMessage {
        AssembledMessage {
            content: self.text,
            fragments: self.fragments,
        }
    }
}

/// A finished message. There is no way to change it once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledMessage {
    content: String,
    fragments: usize,
}

impl AssembledMessage {
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of fragments the content was built from
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn into_content(self) -> String {
        self.content
    }
}
