/// Comprehensive test suite for the command handlers
/// Covers session lifecycle, two-phase inserts, save and cancel
use crate::*;

use std::sync::Arc;

use uuid::Uuid;

use collage_model::{
    Component, ComponentType, LayoutState, LayoutTree, ModelError, OrderedNode, TypeRegistry,
};
use collage_protocol::{keys, HookEvent, Placement, Target};

fn registry() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types.register(ComponentType::section(
        "two_column",
        "Two columns",
        &["left", "right"],
    ));
    types.register(ComponentType::leaf("text", "Text"));
    types.register(ComponentType::leaf("image", "Image"));
    types
}

struct Env {
    adapter: Arc<MemoryAdapter>,
    server: EditorServer,
    key: StorageKey,
}

fn env() -> Env {
    let adapter = Arc::new(MemoryAdapter::new(registry()));
    let server = EditorServer::new(adapter.clone(), Arc::new(PlainRenderer));
    Env {
        adapter,
        server,
        key: StorageKey::new("node:7", "body", "default"),
    }
}

fn env_with(seed: impl FnOnce(&mut LayoutTree)) -> Env {
    let env = env();
    let mut layout = LayoutTree::new(registry());
    seed(&mut layout);
    env.adapter.seed("node:7", "body", layout);
    env
}

/// A request shaped the way the client builds it: command path plus the
/// ordering snapshot and revision token.
fn client_request(command: &Command, layout: &LayoutTree, revision: u64) -> CommandRequest {
    let mut request = CommandRequest::new(command);
    request
        .payload
        .insert_json(keys::LAYOUT_STATE, &layout.capture_state())
        .expect("Failed to encode state");
    request
        .payload
        .insert_json(keys::REVISION, &revision)
        .expect("Failed to encode revision");
    request
}

#[cfg(test)]
mod handler_tests {
    use super::*;

    #[tokio::test]
    async fn test_init_replaces_the_field_with_the_editor_view() {
        let env = env_with(|layout| {
            layout.append(Component::new("text")).unwrap();
        });

        let response = env
            .server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .expect("Failed to init");

        assert_eq!(response.revision, 1);
        assert_eq!(response.patches.len(), 1);
        match &response.patches[0] {
            Patch::Replace {
                target: Target::Editor { layout_id },
                content,
            } => {
                assert_eq!(layout_id, &env.key.to_string());
                assert_eq!(content.components.len(), 1);
                assert!(content.markup.contains("text"));
            }
            other => panic!("Expected editor replacement, got {:?}", other),
        }

        let staged = env.server.staged(&env.key).await.expect("entry seeded");
        assert_eq!(staged.revision, 1);
        assert_eq!(staged.layout.len(), 1);
    }

    #[tokio::test]
    async fn test_init_resets_stale_staging_to_the_stored_value() {
        let env = env();
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();

        // Stage an insert, then reopen the session.
        let staged = env.server.staged(&env.key).await.unwrap();
        let insert = client_request(
            &Command::InsertComponent {
                type_id: "text".to_string(),
            },
            &staged.layout,
            staged.revision,
        );
        env.server.handle(&env.key, &insert).await.unwrap();
        assert_eq!(env.server.staged(&env.key).await.unwrap().layout.len(), 1);

        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();
        let fresh = env.server.staged(&env.key).await.unwrap();
        assert!(fresh.layout.is_empty());
        assert_eq!(fresh.revision, 1);
    }

    #[tokio::test]
    async fn test_edit_form_opens_a_dialog_for_the_component() {
        let mut uuid = Uuid::nil();
        let env = env_with(|layout| {
            uuid = layout.append(Component::new("text")).unwrap();
        });
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();

        let staged = env.server.staged(&env.key).await.unwrap();
        let request = client_request(&Command::EditForm { uuid }, &staged.layout, staged.revision);
        let response = env.server.handle(&env.key, &request).await.unwrap();

        assert_eq!(response.revision, 2);
        match &response.patches[0] {
            Patch::OpenDialog { id, title, markup } => {
                assert_eq!(id, DIALOG_ID);
                assert_eq!(title, "Edit Text");
                assert!(markup.contains(&uuid.to_string()));
            }
            other => panic!("Expected dialog, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_insert_places_the_component_and_opens_the_create_form() {
        let mut anchor = Uuid::nil();
        let env = env_with(|layout| {
            anchor = layout.append(Component::new("text")).unwrap();
        });
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();

        let staged = env.server.staged(&env.key).await.unwrap();
        let request = client_request(
            &Command::InsertSibling {
                sibling: anchor,
                placement: Placement::After,
                type_id: "image".to_string(),
            },
            &staged.layout,
            staged.revision,
        );
        let response = env.server.handle(&env.key, &request).await.unwrap();

        match &response.patches[0] {
            Patch::OpenDialog { title, .. } => assert_eq!(title, "Create Image"),
            other => panic!("Expected dialog, got {:?}", other),
        }

        let staged = env.server.staged(&env.key).await.unwrap();
        assert_eq!(staged.revision, 2);
        assert_eq!(staged.layout.len(), 2);
        let pending = staged.pending.expect("pending insert recorded");
        assert_eq!(pending.anchor, InsertAnchor::After(anchor));
        assert_eq!(staged.layout.order()[1], pending.uuid);
    }

    #[tokio::test]
    async fn test_submit_lands_a_pending_insert_after_its_anchor() {
        let mut anchor = Uuid::nil();
        let env = env_with(|layout| {
            anchor = layout.append(Component::new("text")).unwrap();
        });
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();
        let staged = env.server.staged(&env.key).await.unwrap();
        env.server
            .handle(
                &env.key,
                &client_request(
                    &Command::InsertSibling {
                        sibling: anchor,
                        placement: Placement::After,
                        type_id: "image".to_string(),
                    },
                    &staged.layout,
                    staged.revision,
                ),
            )
            .await
            .unwrap();
        let staged = env.server.staged(&env.key).await.unwrap();
        let inserted = staged.pending.as_ref().unwrap().uuid;

        // The client's snapshot still lacks the pending component.
        let mut snapshot = LayoutTree::new(registry());
        snapshot.append(Component::with_uuid(anchor, "text")).unwrap();
        let mut request = client_request(
            &Command::SubmitForm { uuid: inserted },
            &snapshot,
            staged.revision,
        );
        request
            .payload
            .insert_json(keys::COMPONENT_DATA, &serde_json::json!({"alt": "photo"}))
            .unwrap();
        let response = env.server.handle(&env.key, &request).await.unwrap();

        assert_eq!(response.patches.len(), 4);
        match &response.patches[0] {
            Patch::InsertAfter {
                target: Target::Component { uuid },
                content,
            } => {
                assert_eq!(*uuid, anchor);
                assert_eq!(content.components.len(), 1);
                assert_eq!(content.components[0].uuid, inserted);
            }
            other => panic!("Expected insert-after, got {:?}", other),
        }
        match &response.patches[1] {
            Patch::InvokeHook {
                event: HookEvent::InsertComponent { component_uuid, .. },
            } => assert_eq!(*component_uuid, inserted),
            other => panic!("Expected insert hook, got {:?}", other),
        }
        assert_eq!(response.patches[2], Patch::focus(inserted));
        assert_eq!(
            response.patches[3],
            Patch::CloseDialog {
                id: DIALOG_ID.to_string()
            }
        );

        let staged = env.server.staged(&env.key).await.unwrap();
        assert!(staged.pending.is_none());
        assert_eq!(
            staged.layout.component(inserted).unwrap().settings,
            serde_json::json!({"alt": "photo"})
        );
    }

    #[tokio::test]
    async fn test_submit_lands_region_inserts_at_the_region_end() {
        let mut section = Uuid::nil();
        let env = env_with(|layout| {
            section = layout.append(Component::new("two_column")).unwrap();
        });
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();
        let staged = env.server.staged(&env.key).await.unwrap();
        env.server
            .handle(
                &env.key,
                &client_request(
                    &Command::InsertIntoRegion {
                        parent: section,
                        region: "left".to_string(),
                        type_id: "text".to_string(),
                    },
                    &staged.layout,
                    staged.revision,
                ),
            )
            .await
            .unwrap();
        let staged = env.server.staged(&env.key).await.unwrap();
        let inserted = staged.pending.as_ref().unwrap().uuid;

        let response = env
            .server
            .handle(
                &env.key,
                &client_request(
                    &Command::SubmitForm { uuid: inserted },
                    &staged.layout,
                    staged.revision,
                ),
            )
            .await
            .unwrap();

        match &response.patches[0] {
            Patch::Append {
                target: Target::Region { parent, region },
                content,
            } => {
                assert_eq!(*parent, section);
                assert_eq!(region, "left");
                assert_eq!(content.components[0].parent_uuid, Some(section));
                assert_eq!(content.components[0].region.as_deref(), Some("left"));
            }
            other => panic!("Expected region append, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_top_level_insert_appends_to_the_editor() {
        let env = env();
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();
        let staged = env.server.staged(&env.key).await.unwrap();
        env.server
            .handle(
                &env.key,
                &client_request(
                    &Command::InsertComponent {
                        type_id: "text".to_string(),
                    },
                    &staged.layout,
                    staged.revision,
                ),
            )
            .await
            .unwrap();
        let staged = env.server.staged(&env.key).await.unwrap();
        let inserted = staged.pending.as_ref().unwrap().uuid;

        let response = env
            .server
            .handle(
                &env.key,
                &client_request(
                    &Command::SubmitForm { uuid: inserted },
                    &staged.layout,
                    staged.revision,
                ),
            )
            .await
            .unwrap();

        match &response.patches[0] {
            Patch::Append {
                target: Target::Editor { layout_id },
                ..
            } => assert_eq!(layout_id, &env.key.to_string()),
            other => panic!("Expected editor append, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_without_pending_replaces_in_place() {
        let mut uuid = Uuid::nil();
        let env = env_with(|layout| {
            uuid = layout.append(Component::new("text")).unwrap();
        });
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();
        let staged = env.server.staged(&env.key).await.unwrap();

        let mut request = client_request(
            &Command::SubmitForm { uuid },
            &staged.layout,
            staged.revision,
        );
        request
            .payload
            .insert_json(keys::COMPONENT_DATA, &serde_json::json!({"text": "updated"}))
            .unwrap();
        let response = env.server.handle(&env.key, &request).await.unwrap();

        match &response.patches[0] {
            Patch::Replace {
                target: Target::Component { uuid: target },
                ..
            } => assert_eq!(*target, uuid),
            other => panic!("Expected replacement, got {:?}", other),
        }
        match &response.patches[1] {
            Patch::InvokeHook {
                event: HookEvent::UpdateComponent { component_uuid, .. },
            } => assert_eq!(*component_uuid, uuid),
            other => panic!("Expected update hook, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_save_applies_deletions_before_the_write_back() {
        let (mut a, mut b, mut c) = (Uuid::nil(), Uuid::nil(), Uuid::nil());
        let env = env_with(|layout| {
            a = layout.append(Component::new("text")).unwrap();
            b = layout.append(Component::new("text")).unwrap();
            c = layout.append(Component::new("text")).unwrap();
        });
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();

        let mut request = CommandRequest::new(&Command::Save);
        request
            .payload
            .insert_json(
                keys::LAYOUT_STATE,
                &LayoutState::new(vec![OrderedNode::top_level(a), OrderedNode::top_level(c)]),
            )
            .unwrap();
        request
            .payload
            .insert_json(keys::DELETE_COMPONENTS, &vec![b])
            .unwrap();
        request.payload.insert_json(keys::REVISION, &1u64).unwrap();
        let response = env.server.handle(&env.key, &request).await.unwrap();

        assert_eq!(
            response.patches,
            vec![Patch::InvokeHook {
                event: HookEvent::Save {
                    layout_id: env.key.to_string()
                }
            }]
        );
        assert_eq!(response.revision, 2);

        let stored = env.adapter.stored("node:7", "body").expect("persisted");
        assert_eq!(stored.order(), &[a, c]);
        assert!(!stored.contains(b));

        // The entry survives a save so editing can continue.
        let staged = env.server.staged(&env.key).await.expect("entry refreshed");
        assert_eq!(staged.revision, 2);
        assert_eq!(staged.layout.order(), &[a, c]);
    }

    #[tokio::test]
    async fn test_cancel_discards_staging_and_restores_the_read_view() {
        let env = env_with(|layout| {
            layout.append(Component::new("text")).unwrap();
        });
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();
        let staged = env.server.staged(&env.key).await.unwrap();
        env.server
            .handle(
                &env.key,
                &client_request(
                    &Command::InsertComponent {
                        type_id: "image".to_string(),
                    },
                    &staged.layout,
                    staged.revision,
                ),
            )
            .await
            .unwrap();

        let response = env
            .server
            .handle(&env.key, &CommandRequest::new(&Command::Cancel))
            .await
            .unwrap();

        match &response.patches[0] {
            Patch::Replace {
                target: Target::Editor { .. },
                content,
            } => {
                assert!(content.markup.contains("<static>"));
                assert!(content.components.is_empty());
            }
            other => panic!("Expected read view, got {:?}", other),
        }
        assert!(matches!(
            env.server.staged(&env.key).await,
            Err(WorkspaceError::MissingEntry(_))
        ));

        // The staged insert never reached storage.
        let stored = env.adapter.stored("node:7", "body");
        assert!(stored.is_none() || stored.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn test_mutating_commands_require_the_snapshot() {
        let mut uuid = Uuid::nil();
        let env = env_with(|layout| {
            uuid = layout.append(Component::new("text")).unwrap();
        });
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();

        let bare = CommandRequest::new(&Command::EditForm { uuid });
        let err = env.server.handle(&env.key, &bare).await.unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::MissingField(field) if field == keys::LAYOUT_STATE
        ));
    }

    #[tokio::test]
    async fn test_stale_revisions_still_apply_last_writer_wins() {
        let env = env();
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();
        let staged = env.server.staged(&env.key).await.unwrap();

        let request = client_request(
            &Command::InsertComponent {
                type_id: "text".to_string(),
            },
            &staged.layout,
            99,
        );
        env.server
            .handle(&env.key, &request)
            .await
            .expect("stale revision is tolerated");
        assert_eq!(env.server.staged(&env.key).await.unwrap().layout.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_against_an_unknown_sibling_fails() {
        let env = env();
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();
        let staged = env.server.staged(&env.key).await.unwrap();

        let missing = Uuid::new_v4();
        let err = env
            .server
            .handle(
                &env.key,
                &client_request(
                    &Command::InsertSibling {
                        sibling: missing,
                        placement: Placement::Before,
                        type_id: "text".to_string(),
                    },
                    &staged.layout,
                    staged.revision,
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::Model(ModelError::ComponentNotFound(uuid)) if uuid == missing
        ));
    }

    #[tokio::test]
    async fn test_unknown_types_are_rejected_on_insert() {
        let env = env();
        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();
        let staged = env.server.staged(&env.key).await.unwrap();

        let err = env
            .server
            .handle(
                &env.key,
                &client_request(
                    &Command::InsertComponent {
                        type_id: "carousel".to_string(),
                    },
                    &staged.layout,
                    staged.revision,
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::Model(ModelError::UnknownType(ty)) if ty == "carousel"
        ));
    }

    #[tokio::test]
    async fn test_subscribers_observe_the_session_lifecycle() {
        let env = env();
        let mut events = env.server.subscribe().await;

        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Init))
            .await
            .unwrap();
        assert_eq!(
            events.recv().await,
            Some(ServerEvent::EntryUpdated {
                key: env.key.clone(),
                revision: 1
            })
        );

        let staged = env.server.staged(&env.key).await.unwrap();
        let mut save = client_request(&Command::Save, &staged.layout, staged.revision);
        save.payload
            .insert_json(keys::DELETE_COMPONENTS, &Vec::<Uuid>::new())
            .unwrap();
        env.server.handle(&env.key, &save).await.unwrap();
        assert_eq!(
            events.recv().await,
            Some(ServerEvent::Saved {
                key: env.key.clone()
            })
        );

        env.server
            .handle(&env.key, &CommandRequest::new(&Command::Cancel))
            .await
            .unwrap();
        assert_eq!(
            events.recv().await,
            Some(ServerEvent::Cancelled {
                key: env.key.clone()
            })
        );
    }
}
