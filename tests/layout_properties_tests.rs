mod common;

use common::{TestResult, bounds, clip_depth, context, context_with, context_with_memory, fixed, small_config};
use trellis::{
    AttachPoint, AttachPoints, BoundingBox, ClipConfig, Color, ContextConfig, ElementDeclaration,
    ElementId, ErrorKind, FloatingClipTo, FloatingConfig, LayoutContext, LayoutDirection, Padding,
    SizingAxis, TextConfig, Vector2, minimum_memory_size,
};

#[test]
fn test_grow_shares_fill_the_container_exactly() -> TestResult {
    for count in 1..=5_u32 {
        for padding in [0_u16, 3] {
            for gap in [0_u16, 7] {
                let (mut context, errors) = context(800.0, 600.0);
                context.begin_layout();
                context.open_anonymous(&fixed(301.0, 10.0).padding(Padding::xy(padding, 0)).child_gap(gap));
                for index in 0..count {
                    let weight = (index + 1) as f32;
                    context.open_element(
                        &ElementId::indexed("cell", index),
                        &ElementDeclaration::new().width(SizingAxis::grow_weighted(weight)),
                    );
                    context.close_element();
                }
                context.close_element();
                context.end_layout();
                assert!(errors.is_empty());

                let mut total = f32::from(padding) * 2.0 + f32::from(gap) * (count - 1) as f32;
                for index in 0..count {
                    total += bounds(&context, &ElementId::indexed("cell", index))?.width;
                }
                assert!(
                    (total - 301.0).abs() < 1e-3,
                    "{} cells, padding {}, gap {}: total {}",
                    count,
                    padding,
                    gap,
                    total
                );
                let last = bounds(&context, &ElementId::indexed("cell", count - 1))?;
                assert!((last.right() - (301.0 - f32::from(padding))).abs() < 1e-3);
            }
        }
    }
    Ok(())
}

fn shrink_row(min: f32) -> Result<(Vec<f32>, usize), Box<dyn std::error::Error>> {
    let (mut context, _errors) = context(800.0, 600.0);
    context.begin_layout();
    context.open_anonymous(&ElementDeclaration::new().width(SizingAxis::Fixed(100.0)));
    for index in 0..3 {
        context.open_element(
            &ElementId::indexed("label", index),
            &ElementDeclaration::new().width(SizingAxis::fit_between(min, f32::MAX)),
        );
        context.open_text_element("aaaa bbbb cccc dddd", &TextConfig::default());
        context.close_element();
    }
    context.close_element();
    context.end_layout();

    let mut widths = Vec::new();
    for index in 0..3 {
        widths.push(bounds(&context, &ElementId::indexed("label", index))?.width);
    }
    Ok((widths, context.frame_stats().overflowing_containers))
}

#[test]
fn test_shrinking_never_goes_below_min() -> TestResult {
    // The widest word is 32px, so that is the floor whatever the declared min.
    let (widths, overflowing) = shrink_row(20.0)?;
    assert!(widths.iter().all(|width| *width >= 32.0 - 1e-3), "{:?}", widths);
    assert!((widths.iter().sum::<f32>() - 100.0).abs() < 1e-3);
    assert_eq!(overflowing, 0);

    for min in [40.0, 80.0] {
        let (widths, overflowing) = shrink_row(min)?;
        assert!(widths.iter().all(|width| (*width - min).abs() < 1e-3), "{:?}", widths);
        assert_eq!(overflowing, 1);
    }
    Ok(())
}

fn declare_clipped_scene(context: &mut LayoutContext) {
    let panel = ElementDeclaration::new()
        .sizing(SizingAxis::Fixed(300.0), SizingAxis::Fixed(200.0))
        .background(Color::WHITE)
        .clip(ClipConfig::both());
    context.open_element(&ElementId::new("outer"), &panel);
    context.open_element(
        &ElementId::new("middle"),
        &fixed(200.0, 150.0)
            .direction(LayoutDirection::Column)
            .background(Color::gray(200))
            .clip(ClipConfig::vertical()),
    );
    for index in 0..4 {
        context.open_element(
            &ElementId::indexed("row", index),
            &fixed(180.0, 60.0).background(Color::gray(100)),
        );
        context.open_text_element("row label", &TextConfig::default());
        context.close_element();
    }
    context.open_element(
        &ElementId::new("tooltip"),
        &fixed(80.0, 30.0).background(Color::BLACK).floating(FloatingConfig {
            clip_to: FloatingClipTo::AttachedParent,
            z_index: 2,
            ..FloatingConfig::default()
        }),
    );
    context.close_element();
    context.close_element();
    context.close_element();
    // Entirely outside the viewport, so culled with its subtree.
    context.open_element(
        &ElementId::new("offscreen"),
        &fixed(50.0, 50.0).clip(ClipConfig::both()).floating(FloatingConfig {
            offset: Vector2::new(2000.0, 0.0),
            ..FloatingConfig::default()
        }),
    );
    context.open_anonymous(&fixed(10.0, 10.0).background(Color::BLACK));
    context.close_element();
    context.close_element();
}

#[test]
fn test_clips_stay_balanced_under_any_command_budget() -> TestResult {
    let (mut context, errors) = context(400.0, 300.0);
    context.begin_layout();
    declare_clipped_scene(&mut context);
    let full = context.end_layout().len();
    assert!(errors.is_empty());

    for budget in 0..=full {
        let config = ContextConfig {
            max_render_command_count: Some(budget),
            ..small_config()
        };
        let (mut context, errors) = context_with(config, 400.0, 300.0);
        context.begin_layout();
        declare_clipped_scene(&mut context);
        let commands = context.end_layout();
        clip_depth(&commands).map_err(|message| format!("budget {}: {}", budget, message))?;
        assert!(commands.len() <= budget);
        if budget < full {
            assert_eq!(errors.count(ErrorKind::RenderCommandCapacityExceeded), 1);
        }
    }
    Ok(())
}

#[test]
fn test_clipped_scene_nests_clips() -> TestResult {
    let (mut context, _errors) = context(400.0, 300.0);
    context.begin_layout();
    declare_clipped_scene(&mut context);
    let commands = context.end_layout();

    // Middle nests inside outer; the tooltip's clip is emitted at the top level.
    assert_eq!(clip_depth(&commands)?, 2);
    let offscreen = ElementId::new("offscreen");
    assert!(commands.iter().all(|command| command.id != offscreen.id));
    Ok(())
}

fn declare_scroll_scene(context: &mut LayoutContext) {
    context.open_element(
        &ElementId::new("list"),
        &fixed(200.0, 100.0).clip(ClipConfig::vertical()).direction(LayoutDirection::Column),
    );
    for index in 0..10 {
        context.open_element(&ElementId::indexed("item", index), &fixed(200.0, 30.0).background(Color::WHITE));
        context.open_text_element("item", &TextConfig::default());
        context.close_element();
    }
    context.close_element();
}

#[test]
fn test_identical_input_gives_identical_output() -> TestResult {
    let (mut context, _errors) = context(800.0, 600.0);
    let mut frames = Vec::new();

    context.begin_layout();
    declare_scroll_scene(&mut context);
    context.end_layout();
    context.set_scroll_offset(&ElementId::new("list"), Vector2::new(0.0, 45.0));
    context.set_pointer_state(Vector2::new(10.0, 10.0), false);

    for _ in 0..2 {
        context.begin_layout();
        declare_scroll_scene(&mut context);
        frames.push(serde_json::to_string(&context.end_layout())?);
    }

    assert_eq!(frames[0], frames[1]);
    assert_eq!(bounds(&context, &ElementId::indexed("item", 0))?.y, -45.0);
    Ok(())
}

#[test]
fn test_viewport_sized_grow_child() -> TestResult {
    let (mut context, errors) = context(800.0, 600.0);
    let child = ElementId::new("child");

    context.begin_layout();
    context.open_element(&child, &ElementDeclaration::new().sizing(SizingAxis::grow(), SizingAxis::grow()));
    context.close_element();
    context.end_layout();

    assert!(errors.is_empty());
    assert_eq!(bounds(&context, &child)?, BoundingBox::new(0.0, 0.0, 800.0, 600.0));
    Ok(())
}

#[test]
fn test_two_grow_children_split_a_fixed_row() -> TestResult {
    let (mut context, _errors) = context(800.0, 600.0);
    let row = ElementId::new("row");

    context.begin_layout();
    context.open_element(&row, &ElementDeclaration::new().width(SizingAxis::Fixed(300.0)));
    for (index, height) in [(0, 24.0), (1, 36.0)] {
        context.open_element(
            &ElementId::indexed("half", index),
            &ElementDeclaration::new().sizing(SizingAxis::grow(), SizingAxis::Fixed(height)),
        );
        context.close_element();
    }
    context.close_element();
    context.end_layout();

    assert_eq!(bounds(&context, &ElementId::indexed("half", 0))?.width, 150.0);
    assert_eq!(bounds(&context, &ElementId::indexed("half", 1))?.width, 150.0);
    assert_eq!(bounds(&context, &row)?.height, 36.0);
    Ok(())
}

#[test]
fn test_unclosed_elements_do_not_crash() -> TestResult {
    let (mut context, errors) = context(800.0, 600.0);

    context.begin_layout();
    for index in 0..10 {
        context.open_element(&ElementId::indexed("open", index), &fixed(10.0, 10.0).background(Color::BLACK));
    }
    let commands = context.end_layout();

    assert!(commands.is_empty());
    assert_eq!(errors.count(ErrorKind::UnbalancedOpenClose), 1);
    Ok(())
}

fn declare_memory_scene(context: &mut LayoutContext) {
    context.open_element(&ElementId::new("card"), &fixed(300.0, 200.0).background(Color::WHITE));
    context.open_text_element("fixed memory budget", &TextConfig::default());
    context.close_element();
}

#[test]
fn test_minimum_memory_size_is_exact() -> TestResult {
    let config = small_config();
    let memory = minimum_memory_size(&config);

    let (mut context, errors) = context_with_memory(config, memory, 800.0, 600.0);
    context.begin_layout();
    declare_memory_scene(&mut context);
    assert!(!context.end_layout().is_empty());
    assert!(errors.is_empty(), "{:?}", errors.kinds());

    let (mut context, errors) = context_with_memory(config, memory - 1, 800.0, 600.0);
    context.begin_layout();
    declare_memory_scene(&mut context);
    context.end_layout();
    assert!(errors.count(ErrorKind::ArenaCapacityExceeded) >= 1);
    Ok(())
}

#[test]
fn test_floating_element_follows_its_anchor_final_box() -> TestResult {
    let (mut context, errors) = context(800.0, 600.0);
    let menu = ElementId::new("menu");
    let dropdown = ElementId::new("dropdown");

    context.begin_layout();
    context.open_anonymous(&fixed(120.0, 40.0));
    context.close_element();
    context.open_element(&menu, &ElementDeclaration::new().sizing(SizingAxis::grow(), SizingAxis::Fixed(40.0)));
    context.close_element();
    context.open_element(
        &dropdown,
        &fixed(150.0, 200.0).floating(FloatingConfig {
            attach_points: AttachPoints {
                element: AttachPoint::CenterTop,
                parent: AttachPoint::CenterBottom,
            },
            ..FloatingConfig::attached_to(menu.clone())
        }),
    );
    context.close_element();
    context.end_layout();

    assert!(errors.is_empty());
    let anchor = bounds(&context, &menu)?;
    assert_eq!(anchor, BoundingBox::new(120.0, 0.0, 680.0, 40.0));
    // Centred under the grown anchor, not under its zero-width fit size.
    assert_eq!(bounds(&context, &dropdown)?, BoundingBox::new(385.0, 40.0, 150.0, 200.0));
    Ok(())
}
