#![cfg(test)]

use crate::test_utils::{create_test_context, fixed, grow};
use crate::{
    Alignment, BoundingBox, ClipConfig, ElementDeclaration, ElementId, LayoutContext, Padding,
    SizingAxis, TextConfig,
};

fn bounds(context: &LayoutContext, name: &str) -> BoundingBox {
    context
        .element_bounds(&ElementId::new(name))
        .unwrap_or_else(|| panic!("no bounds for {}", name))
}

#[test]
fn test_single_grow_child_fills_the_viewport() {
    let (mut context, errors) = create_test_context(800.0, 600.0);

    context.begin_layout();
    context.open_element(&ElementId::new("child"), &grow());
    context.close_element();
    context.end_layout();

    assert!(errors.is_empty());
    assert_eq!(bounds(&context, "child"), BoundingBox::new(0.0, 0.0, 800.0, 600.0));
}

#[test]
fn test_grow_children_split_a_fixed_row_evenly() {
    let (mut context, _errors) = create_test_context(800.0, 600.0);

    context.begin_layout();
    context.open_element(&ElementId::new("row"), &ElementDeclaration::new().width(SizingAxis::Fixed(300.0)));
    context.open_element(
        &ElementId::new("left"),
        &ElementDeclaration::new().sizing(SizingAxis::grow(), SizingAxis::Fixed(20.0)),
    );
    context.close_element();
    context.open_element(
        &ElementId::new("right"),
        &ElementDeclaration::new().sizing(SizingAxis::grow(), SizingAxis::Fixed(40.0)),
    );
    context.close_element();
    context.close_element();
    context.end_layout();

    assert_eq!(bounds(&context, "row"), BoundingBox::new(0.0, 0.0, 300.0, 40.0));
    assert_eq!(bounds(&context, "left"), BoundingBox::new(0.0, 0.0, 150.0, 20.0));
    assert_eq!(bounds(&context, "right"), BoundingBox::new(150.0, 0.0, 150.0, 40.0));
}

#[test]
fn test_grow_is_weighted_by_factor() {
    let (mut context, _errors) = create_test_context(800.0, 600.0);

    context.begin_layout();
    context.open_anonymous(&fixed(300.0, 10.0));
    context.open_element(&ElementId::new("one"), &ElementDeclaration::new().width(SizingAxis::grow_weighted(1.0)));
    context.close_element();
    context.open_element(&ElementId::new("two"), &ElementDeclaration::new().width(SizingAxis::grow_weighted(2.0)));
    context.close_element();
    context.close_element();
    context.end_layout();

    assert_eq!(bounds(&context, "one").width, 100.0);
    assert_eq!(bounds(&context, "two").width, 200.0);
}

#[test]
fn test_grow_redistributes_past_a_saturated_max() {
    let (mut context, _errors) = create_test_context(800.0, 600.0);

    context.begin_layout();
    context.open_anonymous(&fixed(300.0, 10.0));
    context.open_element(&ElementId::new("capped"), &ElementDeclaration::new().width(SizingAxis::grow_between(0.0, 50.0)));
    context.close_element();
    context.open_element(&ElementId::new("free"), &ElementDeclaration::new().width(SizingAxis::grow()));
    context.close_element();
    context.close_element();
    context.end_layout();

    assert_eq!(bounds(&context, "capped").width, 50.0);
    assert_eq!(bounds(&context, "free").width, 250.0);
}

#[test]
fn test_grow_shares_sum_exactly_to_the_inner_size() {
    let (mut context, _errors) = create_test_context(800.0, 600.0);
    let names = ["a", "b", "c"];

    context.begin_layout();
    context.open_anonymous(&fixed(301.0, 10.0).padding(Padding::xy(5, 0)).child_gap(7));
    for name in names {
        context.open_element(&ElementId::new(name), &ElementDeclaration::new().width(SizingAxis::grow()));
        context.close_element();
    }
    context.close_element();
    context.end_layout();

    let widths: f32 = names.iter().map(|name| bounds(&context, name).width).sum();
    assert!((widths + 2.0 * 7.0 + 10.0 - 301.0).abs() < 1e-3, "widths sum to {}", widths);
    let last = bounds(&context, "c");
    assert!((last.x + last.width - 296.0).abs() < 1e-3);
}

fn wrapped_label(context: &mut LayoutContext, name: &str) {
    context.open_element(
        &ElementId::new(name),
        &ElementDeclaration::new().width(SizingAxis::fit_between(60.0, f32::MAX)),
    );
    context.open_text_element("aaaa bbbb cccc dddd", &TextConfig::default());
    context.close_element();
}

#[test]
fn test_shrink_stops_at_min_and_reports_overflow() {
    let (mut context, errors) = create_test_context(800.0, 600.0);

    context.begin_layout();
    context.open_element(&ElementId::new("row"), &ElementDeclaration::new().width(SizingAxis::Fixed(100.0)));
    wrapped_label(&mut context, "first");
    wrapped_label(&mut context, "second");
    context.close_element();
    context.end_layout();

    assert!(errors.is_empty());
    assert_eq!(bounds(&context, "first").width, 60.0);
    assert_eq!(bounds(&context, "second").width, 60.0);
    assert_eq!(bounds(&context, "second").x, 60.0);
    assert_eq!(context.frame_stats().overflowing_containers, 1);
    // Four lines of 16px once wrapped at 60px.
    assert_eq!(bounds(&context, "first").height, 64.0);
}

#[test]
fn test_clipped_axis_is_never_shrunk() {
    let (mut context, _errors) = create_test_context(800.0, 600.0);

    context.begin_layout();
    context.open_element(
        &ElementId::new("row"),
        &ElementDeclaration::new()
            .width(SizingAxis::Fixed(100.0))
            .clip(ClipConfig::horizontal()),
    );
    wrapped_label(&mut context, "first");
    wrapped_label(&mut context, "second");
    context.close_element();
    context.end_layout();

    assert_eq!(bounds(&context, "first").width, 152.0);
    assert_eq!(bounds(&context, "second").width, 152.0);
    assert_eq!(context.frame_stats().overflowing_containers, 0);
}

#[test]
fn test_percent_shares_inner_size_after_gaps() {
    let (mut context, _errors) = create_test_context(800.0, 600.0);

    context.begin_layout();
    context.open_anonymous(&fixed(210.0, 10.0).child_gap(10));
    context.open_element(&ElementId::new("half"), &ElementDeclaration::new().width(SizingAxis::percent(0.5)));
    context.close_element();
    context.open_element(&ElementId::new("other"), &ElementDeclaration::new().width(SizingAxis::percent(0.5)));
    context.close_element();
    context.close_element();
    context.end_layout();

    assert_eq!(bounds(&context, "half").width, 100.0);
    assert_eq!(bounds(&context, "other"), BoundingBox::new(110.0, 0.0, 100.0, 0.0));
}

#[test]
fn test_stretch_fills_the_cross_axis() {
    let (mut context, _errors) = create_test_context(800.0, 600.0);

    context.begin_layout();
    context.open_anonymous(&fixed(300.0, 100.0).align(Alignment::Start, Alignment::Stretch));
    context.open_element(&ElementId::new("column"), &ElementDeclaration::new().width(SizingAxis::Fixed(50.0)));
    context.close_element();
    context.close_element();
    context.end_layout();

    assert_eq!(bounds(&context, "column"), BoundingBox::new(0.0, 0.0, 50.0, 100.0));
}

#[test]
fn test_wrap_breaks_children_into_lines() {
    let (mut context, _errors) = create_test_context(800.0, 600.0);

    context.begin_layout();
    context.open_element(
        &ElementId::new("grid"),
        &ElementDeclaration::new().width(SizingAxis::Fixed(100.0)).child_gap(5).wrap(),
    );
    for index in 0..5 {
        context.open_element(&ElementId::indexed("cell", index), &fixed(30.0, 10.0));
        context.close_element();
    }
    context.close_element();
    context.end_layout();

    assert_eq!(bounds(&context, "grid").height, 25.0);
    let third = context.element_bounds(&ElementId::indexed("cell", 2)).unwrap();
    let fourth = context.element_bounds(&ElementId::indexed("cell", 3)).unwrap();
    assert_eq!(third, BoundingBox::new(70.0, 0.0, 30.0, 10.0));
    assert_eq!(fourth, BoundingBox::new(0.0, 15.0, 30.0, 10.0));
}

#[test]
fn test_percent_base_excludes_gaps_only_without_wrapping() {
    let (mut context, errors) = create_test_context(800.0, 600.0);
    let half = ElementDeclaration::new().sizing(SizingAxis::percent(0.5), SizingAxis::Fixed(10.0));

    context.begin_layout();
    context.open_element(&ElementId::new("row"), &ElementDeclaration::new().width(SizingAxis::Fixed(100.0)).child_gap(10));
    for index in 0..2 {
        context.open_element(&ElementId::indexed("row_half", index), &half);
        context.close_element();
    }
    context.close_element();
    context.open_element(
        &ElementId::new("grid"),
        &ElementDeclaration::new().width(SizingAxis::Fixed(100.0)).child_gap(10).wrap(),
    );
    for index in 0..2 {
        context.open_element(&ElementId::indexed("grid_half", index), &half);
        context.close_element();
    }
    context.close_element();
    context.end_layout();

    assert!(errors.is_empty());
    let row_second = context.element_bounds(&ElementId::indexed("row_half", 1)).unwrap();
    assert_eq!(row_second, BoundingBox::new(55.0, 0.0, 45.0, 10.0));

    // Halves of the full width plus a gap cannot share a line.
    let grid = bounds(&context, "grid");
    let grid_second = context.element_bounds(&ElementId::indexed("grid_half", 1)).unwrap();
    assert_eq!(grid.height, 30.0);
    assert_eq!(grid_second, BoundingBox::new(grid.x, 20.0, 50.0, 10.0));
}

#[test]
fn test_aspect_ratio_derives_height_from_width() {
    let (mut context, _errors) = create_test_context(800.0, 600.0);

    context.begin_layout();
    context.open_element(
        &ElementId::new("banner"),
        &ElementDeclaration::new().width(SizingAxis::grow()).aspect_ratio(4.0),
    );
    context.close_element();
    context.open_element(
        &ElementId::new("tall"),
        &ElementDeclaration::new().height(SizingAxis::Fixed(50.0)).aspect_ratio(0.5),
    );
    context.close_element();
    context.end_layout();

    let tall = bounds(&context, "tall");
    assert_eq!((tall.width, tall.height), (25.0, 50.0));
    let banner = bounds(&context, "banner");
    assert_eq!((banner.width, banner.height), (775.0, 193.75));
}
