use std::collections::HashSet;

use crate::page::{ElementId, PageBackend};

/// Media elements found by one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub elements: Vec<ElementId>,
    /// True when the light DOM had no media and shadow roots were searched.
    pub used_fallback: bool,
}

/// Finds media elements in document order.
///
/// Shadow roots are only searched when the light DOM yields nothing, which
/// keeps the common case to a single shallow walk.
pub fn discover<P>(page: &P) -> Discovery
where
    P: PageBackend + ?Sized,
{
    let elements = collect_media(page, false);
    if !elements.is_empty() {
        return Discovery {
            elements,
            used_fallback: false,
        };
    }

    Discovery {
        elements: collect_media(page, true),
        used_fallback: true,
    }
}

/// First element that is already playing with at least `min_ready_state`.
pub fn find_playing<P>(page: &P, candidates: &[ElementId], min_ready_state: u8) -> Option<ElementId>
where
    P: PageBackend + ?Sized,
{
    candidates.iter().copied().find(|element| {
        page.media_state(*element)
            .is_some_and(|state| state.is_playing() && state.ready_state >= min_ready_state)
    })
}

fn collect_media<P>(page: &P, pierce_shadow: bool) -> Vec<ElementId>
where
    P: PageBackend + ?Sized,
{
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![page.document()];

    while let Some(node) = stack.pop() {
        if !seen.insert(node) {
            continue;
        }
        if page.is_media(node) {
            found.push(node);
        }
        if pierce_shadow && let Some(shadow) = page.shadow_root(node) {
            stack.push(shadow);
        }
        let children = page.children(node);
        stack.extend(children.into_iter().rev());
    }

    found
}
