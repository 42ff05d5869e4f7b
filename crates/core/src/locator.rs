use crate::logger;
use crate::platform::{Accessibility, Element};
use crate::types::{Point, Rect};
use crate::walker::AncestorChain;

/// Turns one element into selection bounds (top-left origin), if it can.
pub type BoundsStrategy = fn(&dyn Element) -> Option<Rect>;

/// Tried in order; each strategy runs over the whole chain before the next.
pub const BOUNDS_STRATEGIES: [(&str, BoundsStrategy); 2] = [
    ("range", range_bounds),
    ("text-marker", text_marker_bounds),
];

/// Integer selection range (native text controls). A collapsed range is a
/// caret, not a selection.
pub fn range_bounds(element: &dyn Element) -> Option<Rect> {
    let range = element.selected_range()?;
    if range.length == 0 {
        return None;
    }
    element.bounds_for_range(range)
}

/// Opaque text-marker range (browsers, Electron web views).
pub fn text_marker_bounds(element: &dyn Element) -> Option<Rect> {
    let range = element.selected_text_marker_range()?;
    element.bounds_for_text_marker_range(&range)
}

/// Selection bounds from `start` or one of its ancestors.
pub fn find_selection_bounds(start: &dyn Element, max_depth: usize) -> Option<Rect> {
    let chain = AncestorChain::walk(start, max_depth);
    BOUNDS_STRATEGIES.iter().find_map(|(name, strategy)| {
        let rect = chain.iter().find_map(|el| strategy(el))?;
        logger::info_p("locator", &format!("{} strategy found {:?}", name, rect));
        Some(rect)
    })
}

/// Selection bounds from the element under the pointer. Chat apps keep
/// focus in the composer while the selection sits in the message list.
pub fn bounds_at_pointer(
    ax: &dyn Accessibility,
    pointer: Point,
    display_height: Option<f64>,
    max_depth: usize,
) -> Option<Rect> {
    let height = display_height?;
    let probe = Point::new(pointer.x, height - pointer.y);
    let element = ax.element_at(probe)?;
    find_selection_bounds(element.as_ref(), max_depth)
}

/// Top-left origin to bottom-left origin on the primary display. Without a
/// display only the size survives.
pub fn flip_to_bottom_left(rect: Rect, display_height: Option<f64>) -> Rect {
    match display_height {
        Some(height) => Rect::new(rect.x, height - rect.y - rect.h, rect.w, rect.h),
        None => Rect::new(0.0, 0.0, rect.w, rect.h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::stub::{Stub, StubElement, StubWorld};
    use crate::types::TextRange;

    #[test]
    fn test_collapsed_range_is_not_a_selection() {
        let stub = Stub::new(StubWorld::new());
        stub.with(|w| {
            let id = w.add(StubElement {
                selected_range: Some(TextRange::new(3, 0)),
                range_bounds: Some(Rect::new(1.0, 1.0, 0.0, 14.0)),
                ..Default::default()
            });
            w.focused = Some(id);
        });
        let platform = stub.platform();
        let el = platform.ax.focused_element().unwrap();
        assert_eq!(range_bounds(el.as_ref()), None);
    }

    #[test]
    fn test_range_strategy_wins_over_closer_marker() {
        let stub = Stub::new(StubWorld::new());
        stub.with(|w| {
            let parent = w.add(StubElement {
                selected_range: Some(TextRange::new(0, 4)),
                range_bounds: Some(Rect::new(10.0, 10.0, 40.0, 12.0)),
                ..Default::default()
            });
            let child = w.add(StubElement {
                parent: Some(parent),
                marker_bounds: Some(Rect::new(99.0, 99.0, 9.0, 9.0)),
                ..Default::default()
            });
            w.focused = Some(child);
        });
        let platform = stub.platform();
        let el = platform.ax.focused_element().unwrap();

        assert_eq!(find_selection_bounds(el.as_ref(), 10), Some(Rect::new(10.0, 10.0, 40.0, 12.0)));
    }

    #[test]
    fn test_marker_strategy_on_ancestor() {
        let stub = Stub::new(StubWorld::new());
        stub.with(|w| {
            let web_area = w.add(StubElement {
                marker_bounds: Some(Rect::new(5.0, 6.0, 70.0, 16.0)),
                ..Default::default()
            });
            let group = w.add(StubElement { parent: Some(web_area), ..Default::default() });
            let leaf = w.add(StubElement { parent: Some(group), ..Default::default() });
            w.focused = Some(leaf);
        });
        let platform = stub.platform();
        let el = platform.ax.focused_element().unwrap();

        assert_eq!(find_selection_bounds(el.as_ref(), 10), Some(Rect::new(5.0, 6.0, 70.0, 16.0)));
        // out of reach when the walk is too shallow
        assert_eq!(find_selection_bounds(el.as_ref(), 1), None);
    }

    #[test]
    fn test_pointer_probe_uses_top_left_coordinates() {
        let stub = Stub::new(StubWorld::new());
        stub.with(|w| {
            let id = w.add(StubElement {
                marker_bounds: Some(Rect::new(380.0, 690.0, 60.0, 20.0)),
                ..Default::default()
            });
            w.under_pointer = Some(id);
        });
        let platform = stub.platform();

        let rect = bounds_at_pointer(platform.ax.as_ref(), Point::new(400.0, 300.0), Some(1000.0), 10);
        assert_eq!(rect, Some(Rect::new(380.0, 690.0, 60.0, 20.0)));
        assert_eq!(stub.with(|w| w.pointer_probes.clone()), vec![Point::new(400.0, 700.0)]);
    }

    #[test]
    fn test_pointer_probe_needs_a_display() {
        let stub = Stub::new(StubWorld::new());
        let platform = stub.platform();
        assert_eq!(bounds_at_pointer(platform.ax.as_ref(), Point::new(1.0, 1.0), None, 10), None);
        assert!(stub.with(|w| w.pointer_probes.is_empty()));
    }

    #[test]
    fn test_flip() {
        let r = Rect::new(100.0, 200.0, 50.0, 20.0);
        assert_eq!(flip_to_bottom_left(r, Some(1000.0)), Rect::new(100.0, 780.0, 50.0, 20.0));
        assert_eq!(flip_to_bottom_left(r, None), Rect::new(0.0, 0.0, 50.0, 20.0));
    }
}
