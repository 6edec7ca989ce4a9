//! Integration tests for the editor crate: full interaction flows
//! against server-shaped responses.

use std::time::Instant;

use uuid::Uuid;

use collage_editor::{
    ActiveItem, Direction, DropContainer, Editor, EditorSettings, HookPayload, HookReply, Point,
    Scene, UiRect, Viewport,
};
use collage_model::{ComponentType, LayoutState, LayoutTree, TypeRegistry};
use collage_protocol::{
    keys, Command, CommandResponse, Fragment, FragmentComponent, HookEvent, Patch, Placement,
    Target,
};

fn leaf(uuid: Uuid, parent: Option<(Uuid, &str)>) -> FragmentComponent {
    FragmentComponent {
        uuid,
        type_id: "text".to_string(),
        regions: Vec::new(),
        parent_uuid: parent.map(|(parent, _)| parent),
        region: parent.map(|(_, region)| region.to_string()),
    }
}

fn section(uuid: Uuid) -> FragmentComponent {
    FragmentComponent {
        uuid,
        type_id: "two_column".to_string(),
        regions: vec!["first".to_string(), "second".to_string()],
        parent_uuid: None,
        region: None,
    }
}

fn fragment(components: Vec<FragmentComponent>) -> Fragment {
    Fragment {
        markup: "<div></div>".to_string(),
        components,
    }
}

/// Boots an editor the way a host would: empty, then initialized from
/// a full editor replacement patch.
fn booted_editor(components: Vec<FragmentComponent>) -> Editor {
    let mut editor = Editor::new("layout-1", EditorSettings::default());
    editor.set_viewport(Viewport::new(0.0, 2000.0));
    editor.apply_response(&CommandResponse::new(
        vec![Patch::Replace {
            target: Target::Editor {
                layout_id: "layout-1".to_string(),
            },
            content: fragment(components),
        }],
        1,
    ));
    editor
}

#[test]
fn test_insert_flow_from_toggle_to_applied_patches() {
    let tail = Uuid::new_v4();
    let mut editor = booted_editor(vec![leaf(tail, None)]);
    editor
        .scene_mut()
        .set_component_rect(tail, UiRect::new(0.0, 0.0, 800.0, 120.0));

    // hover until the component activates
    let start = Instant::now();
    editor.pointer_moved(Point::new(400.0, 60.0), start);
    editor.tick(start + editor.settings().hover_interval());
    assert_eq!(editor.active(), Some(&ActiveItem::Component(tail)));

    // open the "after" toggle and pick a type
    editor.toggle_clicked(1, start).unwrap();
    let request = editor.select_component_type("text", start).unwrap();
    assert_eq!(request.path, format!("{tail}/insert-sibling/after/text"));
    assert!(request.payload.contains(keys::LAYOUT_STATE));

    // the server creates the component and opens the configure dialog
    let inserted = Uuid::new_v4();
    editor.apply_response(&CommandResponse::new(
        vec![Patch::OpenDialog {
            id: "collage-dialog".to_string(),
            title: "Create text".to_string(),
            markup: "<form></form>".to_string(),
        }],
        2,
    ));
    assert_eq!(editor.dialog().unwrap().title, "Create text");

    // submitting the form lands the rendered component after its anchor
    let submit = editor
        .submit_form(inserted, &serde_json::json!({"text": "hello"}))
        .unwrap();
    assert_eq!(submit.command().unwrap(), Command::SubmitForm { uuid: inserted });

    editor.apply_response(&CommandResponse::new(
        vec![
            Patch::InsertAfter {
                target: Target::Component { uuid: tail },
                content: fragment(vec![leaf(inserted, None)]),
            },
            Patch::InvokeHook {
                event: HookEvent::InsertComponent {
                    layout_id: "layout-1".to_string(),
                    component_uuid: inserted,
                },
            },
            Patch::focus(inserted),
            Patch::CloseDialog {
                id: "collage-dialog".to_string(),
            },
        ],
        3,
    ));

    assert_eq!(editor.scene().component_uuids(), vec![tail, inserted]);
    assert_eq!(editor.active(), Some(&ActiveItem::Component(inserted)));
    assert!(editor.dialog().is_none());
    assert!(editor.is_dirty());
    assert_eq!(editor.revision(), 3);
}

#[test]
fn test_edit_flow_replaces_the_component_in_place() {
    let section_uuid = Uuid::new_v4();
    let child = Uuid::new_v4();
    let mut editor = booted_editor(vec![
        section(section_uuid),
        leaf(child, Some((section_uuid, "first"))),
    ]);

    let edit = editor.edit_component(child).unwrap();
    assert_eq!(edit.path, format!("edit/{child}"));

    editor.apply_response(&CommandResponse::new(
        vec![Patch::OpenDialog {
            id: "collage-dialog".to_string(),
            title: "Edit text".to_string(),
            markup: "<form></form>".to_string(),
        }],
        2,
    ));

    let _ = editor
        .submit_form(child, &serde_json::json!({"text": "updated"}))
        .unwrap();
    editor.apply_response(&CommandResponse::new(
        vec![
            Patch::Replace {
                target: Target::Component { uuid: child },
                content: fragment(vec![leaf(child, None)]),
            },
            Patch::InvokeHook {
                event: HookEvent::UpdateComponent {
                    layout_id: "layout-1".to_string(),
                    component_uuid: child,
                },
            },
            Patch::focus(child),
            Patch::CloseDialog {
                id: "collage-dialog".to_string(),
            },
        ],
        3,
    ));

    // still in the same slot, now the active component
    assert_eq!(
        editor.scene().capture_state().iter().count(),
        2,
        "section and child survive the replacement"
    );
    assert_eq!(editor.active(), Some(&ActiveItem::Component(child)));
    assert!(editor.is_dirty());
}

#[test]
fn test_delete_undo_and_save_report_the_right_delete_set() {
    let section_uuid = Uuid::new_v4();
    let nested = Uuid::new_v4();
    let tail = Uuid::new_v4();
    let mut editor = booted_editor(vec![
        section(section_uuid),
        leaf(nested, Some((section_uuid, "first"))),
        leaf(tail, None),
    ]);

    let now = Instant::now();
    editor.delete_component(tail, now);
    editor.delete_component(section_uuid, now);
    // undo brings the section (and its nested child) back
    assert!(editor.restore_deleted());
    assert_eq!(editor.scene().component_uuids(), vec![section_uuid, nested]);

    let save = editor.save().unwrap();
    let deleted: Vec<Uuid> = save
        .payload
        .get_json(keys::DELETE_COMPONENTS)
        .unwrap()
        .unwrap();
    assert_eq!(deleted, vec![tail]);

    editor.apply_response(&CommandResponse::new(
        vec![Patch::InvokeHook {
            event: HookEvent::Save {
                layout_id: "layout-1".to_string(),
            },
        }],
        5,
    ));
    assert!(!editor.is_dirty());
    assert!(editor.trash().is_empty());
}

#[test]
fn test_drag_reorder_feeds_the_next_command_snapshot() -> anyhow::Result<()> {
    let section_uuid = Uuid::new_v4();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let mut editor = booted_editor(vec![
        section(section_uuid),
        leaf(first, Some((section_uuid, "first"))),
        leaf(second, Some((section_uuid, "second"))),
    ]);

    assert!(editor.drag_start(first));
    assert!(editor.drag_over(
        DropContainer::Region {
            parent: section_uuid,
            region: "second".to_string(),
        },
        Some(second),
    ));
    assert!(editor.drop_dragged());

    // the optimistic move reaches the server inside the next payload
    let request = editor.save()?;
    let state: LayoutState = request
        .payload
        .get_json(keys::LAYOUT_STATE)?
        .expect("snapshot rides along");
    let described: Vec<Uuid> = state.uuids().collect();
    assert_eq!(described, vec![section_uuid, first, second]);

    // and a server-side tree accepts it as-is
    let mut registry = TypeRegistry::new();
    registry.register(ComponentType::section(
        "two_column",
        "Two column",
        &["first", "second"],
    ));
    registry.register(ComponentType::leaf("text", "Text"));
    let mut tree = LayoutTree::new(registry);
    tree.append(collage_model::Component::with_uuid(section_uuid, "two_column"))?;
    tree.insert_into_region(
        section_uuid,
        "first",
        collage_model::Component::with_uuid(first, "text"),
    )?;
    tree.insert_into_region(
        section_uuid,
        "second",
        collage_model::Component::with_uuid(second, "text"),
    )?;
    tree.apply_state(&state);
    assert_eq!(tree.order(), &[section_uuid, first, second]);
    assert_eq!(
        tree.component(first).and_then(|component| component.region()),
        Some("second")
    );
    Ok(())
}

#[test]
fn test_keyboard_move_round_trip_matches_the_drag_path() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut editor = booted_editor(vec![leaf(a, None), leaf(b, None)]);
    editor
        .scene_mut()
        .set_component_rect(a, UiRect::new(0.0, 0.0, 800.0, 100.0));
    editor
        .scene_mut()
        .set_component_rect(b, UiRect::new(0.0, 100.0, 800.0, 100.0));

    let now = Instant::now();
    match editor.move_component(a, Direction::Down) {
        collage_editor::MoveOutcome::Animating(animation) => {
            assert_eq!(animation.sibling, b);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(editor.finish_move(now));
    assert_eq!(editor.scene().component_uuids(), vec![b, a]);
}

#[test]
fn test_extension_hooks_observe_server_events() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let tail = Uuid::new_v4();
    let mut editor = booted_editor(vec![leaf(tail, None)]);

    let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    editor.register_hook("save.audit", move |payload| {
        if let HookPayload::Event(HookEvent::Save { layout_id }) = payload {
            sink.borrow_mut().push(layout_id.clone());
        }
        HookReply::None
    });

    editor.apply_response(&CommandResponse::new(
        vec![Patch::InvokeHook {
            event: HookEvent::Save {
                layout_id: "layout-1".to_string(),
            },
        }],
        2,
    ));
    assert_eq!(seen.borrow().as_slice(), ["layout-1".to_string()]);
}

#[test]
fn test_cancel_flow_detaches_and_discards_local_state() {
    let tail = Uuid::new_v4();
    let mut editor = booted_editor(vec![leaf(tail, None)]);
    let now = Instant::now();
    editor.delete_component(tail, now);

    let cancel = editor.cancel();
    assert!(cancel.payload.is_empty(), "plain cancel sends nothing");

    editor.apply_response(&CommandResponse::new(
        vec![Patch::Replace {
            target: Target::Editor {
                layout_id: "layout-1".to_string(),
            },
            content: Fragment::markup_only("<div>read only</div>"),
        }],
        1,
    ));
    assert!(!editor.is_attached());
    assert!(editor.trash().is_empty());
    assert!(editor.scene().component_uuids().is_empty());
}

#[test]
fn test_scene_rebuild_is_deterministic_for_the_same_fragment() {
    let section_uuid = Uuid::new_v4();
    let child = Uuid::new_v4();
    let components = vec![section(section_uuid), leaf(child, Some((section_uuid, "second")))];

    let first = Scene::from_fragment(&fragment(components.clone())).capture_state();
    let second = Scene::from_fragment(&fragment(components)).capture_state();
    assert_eq!(first, second);
}

#[test]
fn test_insert_sibling_command_wire_shape() {
    let sibling = Uuid::new_v4();
    let command = Command::InsertSibling {
        sibling,
        placement: Placement::Before,
        type_id: "gallery".to_string(),
    };
    assert_eq!(Command::parse(&command.path()).unwrap(), command);
}
