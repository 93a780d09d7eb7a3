use serde_json::{Value, json};

/// A layout document over a `width` x `height` viewport.
pub fn document(width: f32, height: f32, children: Value) -> Value {
    json!({
        "viewport": { "width": width, "height": height },
        "children": children
    })
}

pub fn element(id: &str, layout: Value, children: Value) -> Value {
    json!({
        "element": {
            "id": id,
            "layout": layout,
            "children": children
        }
    })
}

pub fn text(content: &str) -> Value {
    json!({ "text": { "text": content } })
}

/// A sidebar of fixed width next to a growing content column.
pub fn two_pane_document() -> Value {
    document(
        800.0,
        600.0,
        json!([
            element(
                "sidebar",
                json!({ "sizing": { "width": { "fixed": 200 }, "height": { "grow": {} } } }),
                json!([text("Inbox")])
            ),
            element(
                "content",
                json!({
                    "sizing": { "width": { "grow": {} }, "height": { "grow": {} } },
                    "direction": "column",
                    "padding": { "left": 16, "right": 16, "top": 16, "bottom": 16 },
                    "childGap": 8
                }),
                json!([text("hello world"), text("second line")])
            )
        ]),
    )
}
