use motif_core::compositor;
use motif_data::model::{Modification, Shape};
use serde_json::json;

fn base_shape() -> Shape {
    serde_json::from_value(json!({
        "id": "base",
        "position": { "global": { "x": 100.0, "y": 100.0 } },
        "controlPoints": [
            { "id": "a", "x": 0.0, "y": 0.0 },
            { "id": "b", "x": 10.0, "y": 0.0 },
            { "id": "c", "x": 10.0, "y": 10.0 }
        ],
        "segments": [
            { "id": "s1", "kind": "line", "pointIds": ["a", "b"],
              "style": { "lineWidth": 1 } },
            { "id": "s2", "kind": "line", "pointIds": ["b", "c"] }
        ],
        "style": { "strokeStyle": "black" },
        "variables": { "sway": 2.0 }
    }))
    .unwrap()
}

#[test]
fn test_position_delta() {
    let base = base_shape();
    let modification: Modification = serde_json::from_value(json!({
        "modifyPosition": { "x": 5.0, "y": -3.0 }
    }))
    .unwrap();

    let derived = compositor::apply(&base, &modification);
    assert_eq!(derived.position.global.x, 105.0);
    assert_eq!(derived.position.global.y, 97.0);
    // Base untouched
    assert_eq!(base.position.global.x, 100.0);
    assert_eq!(base.position.global.y, 100.0);
}

#[test]
fn test_apply_never_mutates_base() {
    let base = base_shape();
    let before = serde_json::to_value(&base).unwrap();

    let modification: Modification = serde_json::from_value(json!({
        "modifyPosition": { "x": 1.0 },
        "modifyControlPoints": {
            "a": { "xOffset": 4.0, "yOffset": 4.0 },
            "ghost": { "xOffset": 100.0 }
        },
        "styleChanges": {
            "s1": { "lineWidth": 3 },
            "missing-segment": { "lineWidth": 9 }
        },
        "style": { "strokeStyle": "green" },
        "fillPath": true,
        "closePath": true,
        "animations": { "duration": 2.0, "loops": 1 }
    }))
    .unwrap();

    let derived = compositor::apply(&base, &modification);

    let after = serde_json::to_value(&base).unwrap();
    assert_eq!(before, after, "base must not be mutated");

    // Sanity on the derived copy
    assert_eq!(derived.control_points[0].x, 4.0);
    assert_eq!(derived.segments[0].style["lineWidth"], json!(3));
    assert_eq!(derived.style["strokeStyle"], json!("green"));
    assert!(derived.fill_path);
    assert!(derived.close_path);
    assert_eq!(derived.animations.as_ref().unwrap().duration, 2.0);
}

#[test]
fn test_unknown_references_are_skipped() {
    let base = base_shape();
    let modification: Modification = serde_json::from_value(json!({
        "modifyControlPoints": { "nope": { "xOffset": 5.0 } },
        "styleChanges": { "nope": { "lineWidth": 5 } }
    }))
    .unwrap();

    let derived = compositor::apply(&base, &modification);
    assert_eq!(derived.control_points[0].x, base.control_points[0].x);
    assert_eq!(derived.segments[0].style, base.segments[0].style);
}

#[test]
fn test_double_apply_compounds_deltas_only() {
    let base = base_shape();
    let modification: Modification = serde_json::from_value(json!({
        "modifyPosition": { "x": 5.0 },
        "modifyControlPoints": { "a": { "xOffset": 2.0 } },
        "style": { "strokeStyle": "green" },
        "fillPath": true
    }))
    .unwrap();

    let once = compositor::apply(&base, &modification);
    let twice = compositor::apply(&once, &modification);

    // Additive fields compound
    assert_eq!(once.position.global.x, 105.0);
    assert_eq!(twice.position.global.x, 110.0);
    assert_eq!(once.control_points[0].x, 2.0);
    assert_eq!(twice.control_points[0].x, 4.0);

    // Overwrite fields are stable
    assert_eq!(once.style["strokeStyle"], twice.style["strokeStyle"]);
    assert_eq!(once.fill_path, twice.fill_path);
}

#[test]
fn test_same_base_same_result() {
    let base = base_shape();
    let modification: Modification = serde_json::from_value(json!({
        "modifyPosition": { "x": 5.0, "y": 5.0 },
        "modifyControlPoints": { "b": { "yOffset": -1.0 } }
    }))
    .unwrap();

    let first = serde_json::to_value(compositor::apply(&base, &modification)).unwrap();
    let second = serde_json::to_value(compositor::apply(&base, &modification)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_animation_replacement_uses_defaults() {
    let base = base_shape();
    let modification: Modification = serde_json::from_value(json!({
        "animations": { "controlPointAnimations": {} }
    }))
    .unwrap();

    let derived = compositor::apply(&base, &modification);
    let anim = derived.animations.unwrap();
    assert_eq!(anim.duration, 5.0);
    assert_eq!(anim.loops, 0);
}
