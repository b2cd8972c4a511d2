// SPDX-License-Identifier: MIT OR Apache-2.0

//! Groups matched spans into paragraph-bounded fragments.

use serde::Serialize;

/// One matched term occurrence, as byte offsets into a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    /// Lowercased matched term, used to number `termN` highlight classes
    pub term: String,
}

impl MatchSpan {
    pub fn new(start: usize, end: usize, term: impl Into<String>) -> Self {
        Self {
            start,
            end,
            term: term.into(),
        }
    }
}

/// A run of spans that share one paragraph.
///
/// `paragraph_start..paragraph_end` is the paragraph's content range: it starts
/// just after the preceding newline (or at 0) and stops at the following
/// newline (or at the end of the text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub spans: Vec<MatchSpan>,
    pub paragraph_start: usize,
    pub paragraph_end: usize,
}

impl Fragment {
    /// Offset of the first matched term in the fragment.
    pub fn start_offset(&self) -> usize {
        self.spans
            .first()
            .map(|span| span.start)
            .unwrap_or(self.paragraph_start)
    }

    /// Paragraph text the fragment covers.
    pub fn text<'t>(&self, document: &'t str) -> &'t str {
        document
            .get(self.paragraph_start..self.paragraph_end)
            .unwrap_or_default()
    }
}

/// Paragraph bounds around a span: last newline at or before its start, first
/// newline at or after its end, defaulting to the document edges.
pub fn paragraph_bounds(text: &str, span: &MatchSpan) -> (usize, usize) {
    let bytes = text.as_bytes();
    let start = span.start.min(bytes.len());
    let end = span.end.clamp(start, bytes.len());

    let paragraph_start = bytes[..start]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|newline| newline + 1)
        .unwrap_or(0);
    let paragraph_end = bytes[end..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|offset| end + offset)
        .unwrap_or(bytes.len());

    (paragraph_start, paragraph_end)
}

/// Lazy one-pass splitter over spans given in increasing start order.
pub struct FragmentSplitter<'t, I> {
    text: &'t str,
    spans: I,
    pending: Vec<MatchSpan>,
    bounds: Option<(usize, usize)>,
}

impl<'t, I> FragmentSplitter<'t, I>
where
    I: Iterator<Item = MatchSpan>,
{
    pub fn new(text: &'t str, spans: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            text,
            spans: spans.into_iter(),
            pending: Vec::new(),
            bounds: None,
        }
    }

    fn take_pending(&mut self) -> Option<Fragment> {
        let (paragraph_start, paragraph_end) = self.bounds?;
        if self.pending.is_empty() {
            return None;
        }
        Some(Fragment {
            spans: std::mem::take(&mut self.pending),
            paragraph_start,
            paragraph_end,
        })
    }
}

impl<I> Iterator for FragmentSplitter<'_, I>
where
    I: Iterator<Item = MatchSpan>,
{
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        for span in self.spans.by_ref() {
            let bounds = paragraph_bounds(self.text, &span);
            if self.bounds != Some(bounds) && !self.pending.is_empty() {
                let fragment = self.take_pending();
                self.bounds = Some(bounds);
                self.pending.push(span);
                return fragment;
            }
            self.bounds = Some(bounds);
            self.pending.push(span);
        }
        self.take_pending()
    }
}

/// Split `spans` of `text` into paragraph fragments, in text order.
pub fn split_fragments<I>(text: &str, spans: I) -> FragmentSplitter<'_, I::IntoIter>
where
    I: IntoIterator<Item = MatchSpan>,
{
    FragmentSplitter::new(text, spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_of(text: &str, word: &str) -> Vec<MatchSpan> {
        text.match_indices(word)
            .map(|(start, matched)| MatchSpan::new(start, start + matched.len(), word))
            .collect()
    }

    #[test]
    fn one_fragment_per_matched_paragraph() {
        let text = "Para one about cats.\n\nPara two about dogs and cats.";
        let fragments: Vec<Fragment> = split_fragments(text, spans_of(text, "cats")).collect();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text(text), "Para one about cats.");
        assert_eq!(fragments[1].text(text), "Para two about dogs and cats.");
    }

    #[test]
    fn spans_in_the_same_paragraph_accumulate() {
        let text = "a cat and a cat\nno match here\nlast cat";
        let spans = spans_of(text, "cat");
        let fragments: Vec<Fragment> = split_fragments(text, spans.clone()).collect();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].spans.len(), 2);
        assert_eq!(fragments[1].spans.len(), 1);

        let flattened: Vec<MatchSpan> = fragments.into_iter().flat_map(|f| f.spans).collect();
        assert_eq!(flattened, spans);
    }

    #[test]
    fn text_without_newlines_is_one_fragment() {
        let text = "cat cat cat";
        let fragments: Vec<Fragment> = split_fragments(text, spans_of(text, "cat")).collect();

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].paragraph_start, 0);
        assert_eq!(fragments[0].paragraph_end, text.len());
        assert_eq!(fragments[0].spans.len(), 3);
    }

    #[test]
    fn no_spans_yield_no_fragments() {
        let mut splitter = split_fragments("some text", Vec::new());
        assert!(splitter.next().is_none());
        assert!(splitter.next().is_none());
    }

    #[test]
    fn every_fragment_stays_inside_its_paragraph() {
        let paragraphs = ["alpha beta", "gamma", "beta gamma beta", "delta", "beta"];
        let text = paragraphs.join("\n\n");
        let spans = spans_of(&text, "beta");
        let total = spans.len();

        let fragments: Vec<Fragment> = split_fragments(&text, spans).collect();
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments.iter().map(|f| f.spans.len()).sum::<usize>(), total);
        for fragment in &fragments {
            assert!(!fragment.text(&text).contains('\n'));
            for span in &fragment.spans {
                assert!(span.start >= fragment.paragraph_start);
                assert!(span.end <= fragment.paragraph_end);
            }
        }
    }

    #[test]
    fn start_offset_is_the_first_match() {
        let text = "intro\nthe cat sat";
        let fragment = split_fragments(text, spans_of(text, "cat"))
            .next()
            .expect("fragment");
        assert_eq!(fragment.paragraph_start, 6);
        assert_eq!(fragment.start_offset(), 10);
    }
}
