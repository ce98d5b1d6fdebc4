//! Page grouping: partition a flat segment list into ordered per-page groups
//!
//! Page identity comes from a fixed parsing rule over `Segment.id`:
//! `"<Work name> <folio><a|b>:<ordinal>"`. Segments whose id does not match
//! are skipped and counted, never fatal.

use super::segment::Segment;

/// One page's ordered segments.
#[derive(Debug, Clone)]
pub struct PageGroup {
    /// Work name + page label, e.g. "Berakhot 2a"
    pub page_ref: String,
    pub segments: Vec<Segment>,
}

/// Parse `"<Work> <folio><a|b>"` out of a segment id.
///
/// The id must carry at least one word of work name, then a folio number
/// followed by `a` or `b`, then `:` and an ordinal. Returns the normalized
/// page_ref, or None when the id doesn't follow the pattern.
pub fn parse_page_ref(segment_id: &str) -> Option<String> {
    let (before_colon, ordinal) = segment_id.split_once(':')?;
    if ordinal.is_empty() || !ordinal.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (work, page) = before_colon.rsplit_once(' ')?;
    if work.trim().is_empty() {
        return None;
    }

    // Page label: digits followed by a single 'a' or 'b' side marker.
    let side = page.chars().last()?;
    if side != 'a' && side != 'b' {
        return None;
    }
    let folio = &page[..page.len() - 1];
    if folio.is_empty() || !folio.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(format!("{} {}", work, page))
}

/// Group segments by page in first-seen order.
///
/// `start_page` restricts the output to pages at or after the first group
/// whose label matches; `page_limit` caps the number of groups. Segments
/// with unparseable ids are skipped; the skip count is returned alongside
/// the groups so callers can report it.
pub fn group_pages(
    segments: &[Segment],
    start_page: Option<&str>,
    page_limit: Option<usize>,
) -> (Vec<PageGroup>, usize) {
    let mut groups: Vec<PageGroup> = Vec::new();
    let mut skipped = 0usize;
    let mut started = start_page.is_none();

    for seg in segments {
        let page_ref = match parse_page_ref(&seg.id) {
            Some(r) => r,
            None => {
                skipped += 1;
                continue;
            }
        };

        if !started {
            if let Some(start) = start_page {
                let label = page_ref.rsplit(' ').next().unwrap_or("");
                started = label == start;
            }
            if !started {
                continue;
            }
        }

        match groups.iter_mut().find(|g| g.page_ref == page_ref) {
            Some(group) => group.segments.push(seg.clone()),
            None => {
                if let Some(limit) = page_limit {
                    if groups.len() >= limit {
                        // Past the page budget; remaining new pages are ignored.
                        continue;
                    }
                }
                groups.push(PageGroup {
                    page_ref,
                    segments: vec![seg.clone()],
                });
            }
        }
    }

    (groups, skipped)
}
