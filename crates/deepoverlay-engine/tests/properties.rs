//! Property-based tests for the anchoring engine.
//!
//! 1. Reconciliation is idempotent.
//! 2. Reconciliation never changes the size of offset-only boxes.
//! 3. Reconciliation does not depend on box order.
//! 4. Computing then resolving a locator returns the same element.
//! 5. Binding a box and reconciling it without layout changes keeps it in place.

use deepoverlay_core::{AnchorBinding, AnnotationBox, Locator, Point, RatioBinding, Rect};
use deepoverlay_engine::{
    bind_box, compute_locator, reconcile_all, reconcile_box, NodeId, PageDom, PageTree,
};
use proptest::prelude::*;

fn anchor_rect_strategy() -> impl Strategy<Value = Rect> {
    (0.0f64..2000.0, 0.0f64..2000.0, 1.0f64..1500.0, 1.0f64..1500.0)
        .prop_map(|(l, t, w, h)| Rect::new(l, t, w, h))
}

fn ratio_strategy() -> impl Strategy<Value = RatioBinding> {
    (
        -2.0f64..3.0,
        -2.0f64..3.0,
        proptest::option::of(0.01f64..4.0),
        proptest::option::of(0.01f64..4.0),
    )
        .prop_map(|(x, y, width, height)| RatioBinding { x, y, width, height })
}

fn page_with_card(anchor: Rect, scroll: Point) -> PageTree {
    let mut tree = PageTree::new(1280.0, 800.0);
    tree.append_with_id(tree.body_node(), "div", "card", anchor);
    tree.scroll_to(scroll);
    tree
}

fn card_box(id: u64, ratios: RatioBinding, geometry: Rect) -> AnnotationBox {
    AnnotationBox::new(id, geometry).with_anchor(AnchorBinding {
        locator: Locator::new("#card"),
        ratios,
    })
}

/// Tree shape: each entry attaches a new element under an earlier one.
fn tree_strategy() -> impl Strategy<Value = Vec<(usize, usize, bool)>> {
    proptest::collection::vec((any::<usize>(), 0usize..4, proptest::bool::weighted(0.2)), 1..40)
}

const TAGS: [&str; 4] = ["div", "span", "p", "section"];

fn build_tree(shape: &[(usize, usize, bool)]) -> (PageTree, Vec<NodeId>) {
    let mut tree = PageTree::new(1280.0, 800.0);
    let mut nodes = vec![tree.body_node()];
    for (i, (parent_pick, tag, with_id)) in shape.iter().enumerate() {
        let parent = nodes[parent_pick % nodes.len()];
        let node = tree.append(parent, TAGS[*tag], Rect::new(0.0, 0.0, 10.0, 10.0));
        if *with_id {
            // deliberately awkward ids, some duplicated
            let id = format!("{}n {}", i % 3, i % 5);
            tree.set_element_id(node, Some(&id));
        }
        nodes.push(node);
    }
    (tree, nodes)
}

proptest! {
    #[test]
    fn reconcile_is_idempotent(
        anchor in anchor_rect_strategy(),
        ratios in ratio_strategy(),
        scroll_y in 0.0f64..3000.0,
    ) {
        let tree = page_with_card(anchor, Point::new(0.0, scroll_y));
        let mut b = card_box(1, ratios, Rect::new(5.0, 5.0, 40.0, 40.0));

        reconcile_box(&tree, &mut b);
        let once = b.geometry;
        reconcile_box(&tree, &mut b);
        prop_assert_eq!(b.geometry, once, "second pass moved the box");
    }
}

proptest! {
    #[test]
    fn offset_only_boxes_keep_size(
        before in anchor_rect_strategy(),
        after in anchor_rect_strategy(),
        x in -1.0f64..2.0,
        y in -1.0f64..2.0,
        size in (1.0f64..800.0, 1.0f64..800.0),
    ) {
        let mut tree = page_with_card(before, Point::default());
        let geometry = Rect::new(0.0, 0.0, size.0, size.1);
        let mut b = card_box(1, RatioBinding::offset(x, y), geometry);

        reconcile_box(&tree, &mut b);
        let card = tree.element_by_id("card").unwrap();
        tree.set_rect(card, after);
        reconcile_box(&tree, &mut b);

        prop_assert_eq!(b.geometry.width, size.0);
        prop_assert_eq!(b.geometry.height, size.1);
    }
}

proptest! {
    #[test]
    fn reconcile_is_order_independent(
        anchor in anchor_rect_strategy(),
        ratios in proptest::collection::vec(ratio_strategy(), 1..8),
    ) {
        let tree = page_with_card(anchor, Point::default());
        let boxes: Vec<AnnotationBox> = ratios
            .iter()
            .zip(0u64..)
            .map(|(r, id)| card_box(id, *r, Rect::new(1.0, 2.0, 30.0, 30.0)))
            .collect();

        let mut forward = boxes.clone();
        let mut reversed: Vec<AnnotationBox> = boxes.into_iter().rev().collect();
        reconcile_all(&tree, forward.iter_mut());
        reconcile_all(&tree, reversed.iter_mut());
        reversed.reverse();

        prop_assert_eq!(forward, reversed);
    }
}

proptest! {
    #[test]
    fn locator_round_trip(shape in tree_strategy()) {
        let (tree, nodes) = build_tree(&shape);
        for node in nodes.into_iter().skip(1) {
            let locator = compute_locator(&tree, node);
            prop_assert!(locator.is_some(), "element {:?} should have a locator", node);
            let locator = locator.unwrap();
            prop_assert_eq!(
                deepoverlay_engine::resolve_locator(&tree, &locator),
                Some(node),
                "locator {} did not resolve back",
                locator
            );
        }
    }
}

proptest! {
    #[test]
    fn bind_then_reconcile_is_stable(
        anchor in (0.0f64..600.0, 0.0f64..400.0, 200.0f64..600.0, 200.0f64..400.0),
        inset in (0.0f64..0.5, 0.0f64..0.5),
        scroll_y in 0.0f64..500.0,
    ) {
        let anchor_page = Rect::new(anchor.0, anchor.1 + scroll_y, anchor.2, anchor.3);
        let mut tree = page_with_card(anchor_page, Point::new(0.0, scroll_y));

        let geometry = Rect::new(
            anchor_page.left + anchor_page.width * inset.0,
            anchor_page.top + anchor_page.height * inset.1,
            anchor_page.width * 0.25,
            anchor_page.height * 0.25,
        );
        let mut b = AnnotationBox::new(1, geometry);
        prop_assert!(bind_box(&mut tree, &mut b).is_ok());

        reconcile_box(&tree, &mut b);
        let g = b.geometry;
        prop_assert!((g.left - geometry.left).abs() < 1e-6, "left drifted: {} vs {}", g.left, geometry.left);
        prop_assert!((g.top - geometry.top).abs() < 1e-6, "top drifted: {} vs {}", g.top, geometry.top);
        prop_assert!((g.width - geometry.width).abs() < 1e-6);
        prop_assert!((g.height - geometry.height).abs() < 1e-6);
    }
}
