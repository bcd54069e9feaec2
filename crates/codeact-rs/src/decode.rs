//! Response decoder: turns raw completion text into exactly one [`Action`].
//!
//! The model marks actions with four tag families:
//!
//! | Tag | Action | Match |
//! |-----|--------|-------|
//! | `<finish>…</finish>` | [`Action::Finish`] | first open to last close |
//! | `<execute_bash>…</execute_bash>` | [`Action::RunCommand`] | first open to next close |
//! | `<execute_ipython>…</execute_ipython>` | [`Action::RunIpython`] | first open to next close |
//! | `<execute_browse>…</execute_browse>` | [`Action::BrowseInteractive`] | first open to last close |
//!
//! Decoding happens in two steps. [`repair_unclosed_tags`] closes execute
//! blocks that the completion service cut off at a stop sequence, then
//! [`scan_markup`] walks the text once, records where each family opens
//! and closes, and resolves the winner in [`TagFamily::PRIORITY`] order.
//! Text with no complete tag pair becomes a plain message. Decoding never
//! fails.
//!
//! Tags are case-sensitive and nesting is not validated: a tag nested
//! inside another family's block is just part of that block's text.

use crate::history::Action;
use std::ops::Range;

/// One of the markup tag families the model can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFamily {
    Finish,
    Bash,
    Ipython,
    Browse,
}

impl TagFamily {
    /// Resolution order when several families are present.
    pub const PRIORITY: [TagFamily; 4] = [
        TagFamily::Finish,
        TagFamily::Bash,
        TagFamily::Ipython,
        TagFamily::Browse,
    ];

    /// Families whose closing tags are used as stop sequences.
    pub const EXECUTE: [TagFamily; 3] = [TagFamily::Bash, TagFamily::Ipython, TagFamily::Browse];

    pub fn open(self) -> &'static str {
        match self {
            TagFamily::Finish => "<finish>",
            TagFamily::Bash => "<execute_bash>",
            TagFamily::Ipython => "<execute_ipython>",
            TagFamily::Browse => "<execute_browse>",
        }
    }

    pub fn close(self) -> &'static str {
        match self {
            TagFamily::Finish => "</finish>",
            TagFamily::Bash => "</execute_bash>",
            TagFamily::Ipython => "</execute_ipython>",
            TagFamily::Browse => "</execute_browse>",
        }
    }

    /// Greedy families extend to the last closing tag in the text.
    fn greedy(self) -> bool {
        matches!(self, TagFamily::Finish | TagFamily::Browse)
    }

    fn index(self) -> usize {
        match self {
            TagFamily::Finish => 0,
            TagFamily::Bash => 1,
            TagFamily::Ipython => 2,
            TagFamily::Browse => 3,
        }
    }
}

/// Stop sequences for the completion request: the execute closing tags.
pub fn stop_sequences() -> Vec<String> {
    [TagFamily::Ipython, TagFamily::Bash, TagFamily::Browse]
        .iter()
        .map(|f| f.close().to_string())
        .collect()
}

/// Close execute blocks that were opened but never closed.
///
/// The completion service stops at a closing tag and usually drops it, so
/// an unclosed block is the normal shape of a response. If the text ends
/// with a partial closing tag (`</execute_ipython`), only the missing
/// suffix is appended.
pub fn repair_unclosed_tags(text: &str) -> String {
    let mut repaired = text.to_string();
    for family in TagFamily::EXECUTE {
        let close = family.close();
        if repaired.contains(family.open()) && !repaired.contains(close) {
            let partial = partial_suffix_len(&repaired, close);
            repaired.push_str(close.get(partial..).unwrap_or_default());
        }
    }
    repaired
}

/// Length of the longest proper prefix of `tag` that `text` ends with.
///
/// Only fragments that already read `</` count; a lone trailing `<` belongs
/// to the payload.
fn partial_suffix_len(text: &str, tag: &str) -> usize {
    (2..tag.len())
        .rev()
        .find(|&n| text.ends_with(tag.get(..n).unwrap_or_default()))
        .unwrap_or(0)
}

/// A resolved tag pair. Ranges are byte offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupMatch {
    pub family: TagFamily,
    /// From the start of the opening tag to the end of the closing tag.
    pub span: Range<usize>,
    /// Between the tags.
    pub inner: Range<usize>,
}

impl MarkupMatch {
    pub fn inner_text<'t>(&self, text: &'t str) -> &'t str {
        text.get(self.inner.clone()).unwrap_or_default()
    }

    /// The text with the matched span removed, trimmed.
    pub fn thought(&self, text: &str) -> String {
        let before = text.get(..self.span.start).unwrap_or_default();
        let after = text.get(self.span.end..).unwrap_or_default();
        format!("{before}{after}").trim().to_string()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Occurrences {
    first_open: Option<usize>,
    first_close: Option<usize>,
    last_close: Option<usize>,
}

/// Find the winning tag pair in one pass over the text.
///
/// Only closing tags after a family's first opening tag count. The family
/// that wins is the first one in [`TagFamily::PRIORITY`] with a complete
/// pair, regardless of where in the text each family appears.
pub fn scan_markup(text: &str) -> Option<MarkupMatch> {
    let mut seen = [Occurrences::default(); 4];

    for (pos, _) in text.match_indices('<') {
        let rest = text.get(pos..).unwrap_or_default();
        for family in TagFamily::PRIORITY {
            let occ = &mut seen[family.index()];
            if occ.first_open.is_none() {
                if rest.starts_with(family.open()) {
                    occ.first_open = Some(pos);
                }
            } else if rest.starts_with(family.close()) {
                occ.first_close.get_or_insert(pos);
                occ.last_close = Some(pos);
            }
        }
    }

    TagFamily::PRIORITY.into_iter().find_map(|family| {
        let occ = seen[family.index()];
        let open = occ.first_open?;
        let close = if family.greedy() {
            occ.last_close?
        } else {
            occ.first_close?
        };
        Some(MarkupMatch {
            family,
            span: open..close + family.close().len(),
            inner: open + family.open().len()..close,
        })
    })
}

/// Decode a completion into exactly one action.
///
/// `kernel_init_code` is attached to IPython actions so the sandbox can
/// prepare the kernel before running the cell.
pub fn decode_response(response: &str, kernel_init_code: &str) -> Action {
    let text = repair_unclosed_tags(response);
    let Some(found) = scan_markup(&text) else {
        return Action::message(text, true);
    };

    let thought = found.thought(&text);
    let inner = found.inner_text(&text).trim();
    match found.family {
        TagFamily::Finish => Action::finish(thought),
        TagFamily::Bash if inner == "exit" => Action::finish(thought),
        TagFamily::Bash => Action::run_command(inner, thought),
        TagFamily::Ipython => Action::run_ipython(inner, thought, kernel_init_code),
        TagFamily::Browse => Action::browse(inner, thought),
    }
}
