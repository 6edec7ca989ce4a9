//! Command handlers for edit sessions.
//!
//! One [`EditorServer`] serves every staged field. The client posts a
//! [`CommandRequest`] against a [`StorageKey`]; the matching handler
//! reorders the staging entry from the payload snapshot, applies the
//! command, lands the entry back in the tempstore and replies with a
//! [`CommandResponse`] carrying patches plus the entry's new revision.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use collage_model::{Component, LayoutState, LayoutTree, ModelError};
use collage_protocol::{
    keys, Command, CommandRequest, CommandResponse, Fragment, FragmentComponent, HookEvent, Patch,
    Placement, ProtocolError, Target,
};

use crate::adapters::{AdapterError, EntityAdapter, FieldRenderer};
use crate::tempstore::{InsertAnchor, PendingInsert, StagingEntry, StorageKey, TempstoreRepository};

/// Dialog id shared by every form the server opens.
pub const DIALOG_ID: &str = "collage-dialog";

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("No staging entry for {0}")]
    MissingEntry(String),

    #[error("Payload is missing {0}")]
    MissingField(&'static str),
}

/// Staging activity, for hosts that mirror sessions elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    EntryUpdated { key: StorageKey, revision: u64 },
    Saved { key: StorageKey },
    Cancelled { key: StorageKey },
}

pub struct EditorServer {
    adapter: Arc<dyn EntityAdapter>,
    renderer: Arc<dyn FieldRenderer>,
    tempstore: TempstoreRepository,
    subscribers: RwLock<Vec<mpsc::Sender<ServerEvent>>>,
}

impl EditorServer {
    pub fn new(adapter: Arc<dyn EntityAdapter>, renderer: Arc<dyn FieldRenderer>) -> Self {
        Self {
            tempstore: TempstoreRepository::new(adapter.clone()),
            adapter,
            renderer,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn tempstore(&self) -> &TempstoreRepository {
        &self.tempstore
    }

    /// The current staging entry, without creating one.
    pub async fn staged(&self, key: &StorageKey) -> Result<StagingEntry, WorkspaceError> {
        self.tempstore
            .peek(key)
            .await
            .ok_or_else(|| WorkspaceError::MissingEntry(key.to_string()))
    }

    /// Registers a staging-activity listener.
    pub async fn subscribe(&self) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(100);
        self.subscribers.write().await.push(tx);
        rx
    }

    async fn broadcast(&self, event: ServerEvent) {
        let subscribers = self.subscribers.read().await;
        for tx in subscribers.iter() {
            // Ignore send errors (subscriber may be gone)
            let _ = tx.send(event.clone()).await;
        }
    }

    /// Dispatches one command against one staged field.
    pub async fn handle(
        &self,
        key: &StorageKey,
        request: &CommandRequest,
    ) -> Result<CommandResponse, WorkspaceError> {
        let command = request.command()?;
        tracing::debug!("Handling {} for {}", request.path, key);
        match command {
            Command::Init => self.init(key).await,
            Command::EditForm { uuid } => self.edit_form(key, uuid, request).await,
            Command::SubmitForm { uuid } => self.submit_form(key, uuid, request).await,
            Command::InsertSibling {
                sibling,
                placement,
                type_id,
            } => {
                let anchor = match placement {
                    Placement::Before => InsertAnchor::Before(sibling),
                    Placement::After => InsertAnchor::After(sibling),
                };
                self.insert(key, type_id, anchor, request).await
            }
            Command::InsertIntoRegion {
                parent,
                region,
                type_id,
            } => {
                self.insert(key, type_id, InsertAnchor::Region { parent, region }, request)
                    .await
            }
            Command::InsertComponent { type_id } => {
                self.insert(key, type_id, InsertAnchor::End, request).await
            }
            Command::Save => self.save(key, request).await,
            Command::Cancel => self.cancel(key).await,
        }
    }

    /// Opens a session: a fresh staging copy of the stored field and
    /// the full editor rendering to swap into the page.
    async fn init(&self, key: &StorageKey) -> Result<CommandResponse, WorkspaceError> {
        self.tempstore.delete(key).await;
        let entry = self.tempstore.get(key).await?;
        tracing::info!("Opened edit session for {}", key);

        let content = Fragment {
            markup: self.renderer.editor_view(&entry.layout),
            components: describe_layout(&entry.layout),
        };
        let revision = entry.revision;
        self.broadcast(ServerEvent::EntryUpdated {
            key: key.clone(),
            revision,
        })
        .await;
        Ok(CommandResponse::new(
            vec![Patch::Replace {
                target: Target::Editor {
                    layout_id: key.to_string(),
                },
                content,
            }],
            revision,
        ))
    }

    async fn edit_form(
        &self,
        key: &StorageKey,
        uuid: Uuid,
        request: &CommandRequest,
    ) -> Result<CommandResponse, WorkspaceError> {
        let mut entry = self.tempstore.get(key).await?;
        self.apply_snapshot(key, &mut entry, request)?;

        let (title, markup) = self.render_form(&entry.layout, uuid)?;
        entry.touch();
        let revision = entry.revision;
        self.tempstore.set(key, entry).await;
        self.broadcast(ServerEvent::EntryUpdated {
            key: key.clone(),
            revision,
        })
        .await;
        Ok(CommandResponse::new(
            vec![Patch::OpenDialog {
                id: DIALOG_ID.to_string(),
                title: format!("Edit {title}"),
                markup,
            }],
            revision,
        ))
    }

    /// First half of a two-phase insert: create the component, place it
    /// in the staging layout, and open its configure form. The markup
    /// lands on the page only when the form is submitted.
    async fn insert(
        &self,
        key: &StorageKey,
        type_id: String,
        anchor: InsertAnchor,
        request: &CommandRequest,
    ) -> Result<CommandResponse, WorkspaceError> {
        let mut entry = self.tempstore.get(key).await?;
        self.apply_snapshot(key, &mut entry, request)?;

        let component = Component::new(type_id.clone());
        let uuid = match &anchor {
            InsertAnchor::Before(sibling) => entry.layout.insert_before(*sibling, component)?,
            InsertAnchor::After(sibling) => entry.layout.insert_after(*sibling, component)?,
            InsertAnchor::Region { parent, region } => {
                entry.layout.insert_into_region(*parent, region, component)?
            }
            InsertAnchor::End => entry.layout.append(component)?,
        };
        tracing::info!("Placed {} {} in {}, awaiting submit", type_id, uuid, key);

        let (title, markup) = self.render_form(&entry.layout, uuid)?;
        entry.pending = Some(PendingInsert {
            uuid,
            type_id,
            anchor,
        });
        entry.touch();
        let revision = entry.revision;
        self.tempstore.set(key, entry).await;
        self.broadcast(ServerEvent::EntryUpdated {
            key: key.clone(),
            revision,
        })
        .await;
        Ok(CommandResponse::new(
            vec![Patch::OpenDialog {
                id: DIALOG_ID.to_string(),
                title: format!("Create {title}"),
                markup,
            }],
            revision,
        ))
    }

    /// Second half of an insert, or a plain settings update. A pending
    /// insert lands the rendered component at its recorded anchor; an
    /// update replaces the component in place.
    async fn submit_form(
        &self,
        key: &StorageKey,
        uuid: Uuid,
        request: &CommandRequest,
    ) -> Result<CommandResponse, WorkspaceError> {
        let mut entry = self.tempstore.get(key).await?;
        self.apply_snapshot(key, &mut entry, request)?;

        if let Some(values) = request
            .payload
            .get_json::<serde_json::Value>(keys::COMPONENT_DATA)?
        {
            entry.layout.set_settings(uuid, values)?;
        } else if !entry.layout.contains(uuid) {
            return Err(WorkspaceError::Model(ModelError::ComponentNotFound(uuid)));
        }

        let pending = match entry.pending.take() {
            Some(pending) if pending.uuid == uuid => Some(pending),
            other => {
                entry.pending = other;
                None
            }
        };

        let content = Fragment {
            markup: self.renderer.component(&entry.layout, uuid),
            components: describe_subtree(&entry.layout, uuid),
        };
        let landing = match pending {
            Some(pending) => match pending.anchor {
                InsertAnchor::Before(sibling) => Patch::InsertBefore {
                    target: Target::Component { uuid: sibling },
                    content,
                },
                InsertAnchor::After(sibling) => Patch::InsertAfter {
                    target: Target::Component { uuid: sibling },
                    content,
                },
                InsertAnchor::Region { parent, region } => Patch::Append {
                    target: Target::Region { parent, region },
                    content,
                },
                InsertAnchor::End => Patch::Append {
                    target: Target::Editor {
                        layout_id: key.to_string(),
                    },
                    content,
                },
            },
            None => Patch::Replace {
                target: Target::Component { uuid },
                content,
            },
        };
        let event = if matches!(landing, Patch::Replace { .. }) {
            HookEvent::UpdateComponent {
                layout_id: key.to_string(),
                component_uuid: uuid,
            }
        } else {
            HookEvent::InsertComponent {
                layout_id: key.to_string(),
                component_uuid: uuid,
            }
        };

        entry.touch();
        let revision = entry.revision;
        self.tempstore.set(key, entry).await;
        self.broadcast(ServerEvent::EntryUpdated {
            key: key.clone(),
            revision,
        })
        .await;
        Ok(CommandResponse::new(
            vec![
                landing,
                Patch::InvokeHook { event },
                Patch::focus(uuid),
                Patch::CloseDialog {
                    id: DIALOG_ID.to_string(),
                },
            ],
            revision,
        ))
    }

    /// Finalizes the session: deletions first, then the reorder, then
    /// the write-back. The staging entry is refreshed rather than
    /// dropped so editing can continue from the saved state.
    async fn save(
        &self,
        key: &StorageKey,
        request: &CommandRequest,
    ) -> Result<CommandResponse, WorkspaceError> {
        let mut entry = self.tempstore.get(key).await?;
        if let Some(doomed) = request
            .payload
            .get_json::<Vec<Uuid>>(keys::DELETE_COMPONENTS)?
        {
            for uuid in doomed {
                entry.layout.remove(uuid);
            }
        }
        self.apply_snapshot(key, &mut entry, request)?;

        self.adapter
            .persist(&key.entity, &key.field, &entry.layout)?;
        entry.pending = None;
        entry.touch();
        let revision = entry.revision;
        self.tempstore.set(key, entry).await;
        tracing::info!("Saved {} at revision {}", key, revision);
        self.broadcast(ServerEvent::Saved { key: key.clone() }).await;
        Ok(CommandResponse::new(
            vec![Patch::InvokeHook {
                event: HookEvent::Save {
                    layout_id: key.to_string(),
                },
            }],
            revision,
        ))
    }

    /// Discards the session and swaps the static read view back in.
    async fn cancel(&self, key: &StorageKey) -> Result<CommandResponse, WorkspaceError> {
        let dropped = self.tempstore.delete(key).await;
        tracing::info!("Cancelled edit session for {} (entry existed: {})", key, dropped);

        let stored = self.adapter.load(&key.entity, &key.field)?;
        let markup = self.renderer.read_view(&stored);
        self.broadcast(ServerEvent::Cancelled { key: key.clone() })
            .await;
        Ok(CommandResponse::new(
            vec![Patch::Replace {
                target: Target::Editor {
                    layout_id: key.to_string(),
                },
                content: Fragment::markup_only(markup),
            }],
            0,
        ))
    }

    /// Applies the client's reorder snapshot and checks its revision
    /// token. A stale token logs a warning; the write still proceeds,
    /// last writer wins.
    fn apply_snapshot(
        &self,
        key: &StorageKey,
        entry: &mut StagingEntry,
        request: &CommandRequest,
    ) -> Result<(), WorkspaceError> {
        let state: LayoutState = request
            .payload
            .get_json(keys::LAYOUT_STATE)?
            .ok_or(WorkspaceError::MissingField(keys::LAYOUT_STATE))?;
        if let Some(revision) = request.payload.get_json::<u64>(keys::REVISION)? {
            if revision != entry.revision {
                tracing::warn!(
                    "Revision mismatch for {}: client {} vs staged {}, last writer wins",
                    key,
                    revision,
                    entry.revision
                );
            }
        }
        entry.layout.apply_state(&state);
        Ok(())
    }

    fn render_form(
        &self,
        layout: &LayoutTree,
        uuid: Uuid,
    ) -> Result<(String, String), WorkspaceError> {
        let component = layout
            .component(uuid)
            .ok_or(ModelError::ComponentNotFound(uuid))?;
        let ty = layout
            .types()
            .get(component.type_id())
            .ok_or_else(|| ModelError::UnknownType(component.type_id().to_string()))?;
        Ok((ty.label.clone(), self.renderer.edit_form(ty, component)))
    }
}

/// Flat parent-first description of a whole layout.
fn describe_layout(layout: &LayoutTree) -> Vec<FragmentComponent> {
    layout
        .iter()
        .map(|component| describe(layout, component))
        .collect()
}

/// Flat parent-first description of one component and its descendants.
fn describe_subtree(layout: &LayoutTree, root: Uuid) -> Vec<FragmentComponent> {
    let mut uuids = vec![root];
    uuids.extend(layout.descendants(root));
    uuids
        .into_iter()
        .filter_map(|uuid| layout.component(uuid))
        .map(|component| describe(layout, component))
        .collect()
}

fn describe(layout: &LayoutTree, component: &Component) -> FragmentComponent {
    FragmentComponent {
        uuid: component.uuid(),
        type_id: component.type_id().to_string(),
        regions: layout.types().regions(component.type_id()).to_vec(),
        parent_uuid: component.parent(),
        region: component.region().map(str::to_string),
    }
}
