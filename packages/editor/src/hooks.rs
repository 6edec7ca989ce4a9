//! The hook bus.
//!
//! Extensions register callbacks against named hooks. Registering under
//! a dotted name like `accepts.gallery` still receives `accepts`
//! invocations but can be unregistered on its own, so two extensions
//! never clobber each other's handlers.

use serde_json::Value;

use collage_protocol::HookEvent;

use crate::drag::DropCheck;

/// Payload handed to hook callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum HookPayload {
    /// A drop veto check while a drag hovers a container.
    Accepts(DropCheck),
    /// A server-raised event arriving through a patch.
    Event(HookEvent),
}

/// What a callback answers.
#[derive(Debug, Clone, PartialEq)]
pub enum HookReply {
    None,
    Bool(bool),
    Value(Value),
}

type Callback = Box<dyn Fn(&HookPayload) -> HookReply>;

struct Registration {
    hook: String,
    callback: Callback,
}

/// Callback registry for one editor instance.
#[derive(Default)]
pub struct HookBus {
    callbacks: Vec<Registration>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback under a hook name, dotted suffix allowed.
    pub fn register<F>(&mut self, hook: impl Into<String>, callback: F)
    where
        F: Fn(&HookPayload) -> HookReply + 'static,
    {
        self.callbacks.push(Registration {
            hook: hook.into(),
            callback: Box::new(callback),
        });
    }

    /// Removes every callback whose registered name matches exactly.
    /// `unregister("accepts")` leaves `accepts.gallery` in place.
    pub fn unregister(&mut self, hook: &str) {
        self.callbacks.retain(|registration| registration.hook != hook);
    }

    /// Invokes callbacks whose leading dot segment matches, in
    /// registration order, collecting their replies.
    pub fn invoke(&self, hook: &str, payload: &HookPayload) -> Vec<HookReply> {
        self.callbacks
            .iter()
            .filter(|registration| registration.hook.split('.').next() == Some(hook))
            .map(|registration| (registration.callback)(payload))
            .collect()
    }

    /// Runs a veto round: permitted unless some callback answers an
    /// explicit `false`.
    pub fn permits(&self, hook: &str, payload: &HookPayload) -> bool {
        !self
            .invoke(hook, payload)
            .iter()
            .any(|reply| matches!(reply, HookReply::Bool(false)))
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl std::fmt::Debug for HookBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookBus")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
