//! Typed subscription surface for protocol events.
//!
//! Callbacks register per event kind and run strictly sequentially, one
//! invocation at a time, in registration order. There is no internal
//! locking requirement on handler state beyond that ordering guarantee.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use wharf_types::{
    CallEvent, ConnectionUpdate, GroupParticipantsUpdate, GroupUpdate, MessagesUpsert,
};

type Callback<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

fn wrap<T, F, Fut>(f: F) -> Callback<T>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ev| Box::pin(f(ev)))
}

/// Per-event-kind callback lists.
#[derive(Default)]
pub struct EventRegistry {
    messages_upsert: Mutex<Vec<Callback<MessagesUpsert>>>,
    groups_update: Mutex<Vec<Callback<Vec<GroupUpdate>>>>,
    group_participants_update: Mutex<Vec<Callback<GroupParticipantsUpdate>>>,
    connection_update: Mutex<Vec<Callback<ConnectionUpdate>>>,
    creds_update: Mutex<Vec<Callback<()>>>,
    call: Mutex<Vec<Callback<Vec<CallEvent>>>>,
}

macro_rules! registry_event {
    ($on:ident, $emit:ident, $field:ident, $ty:ty) => {
        pub fn $on<F, Fut>(&self, f: F)
        where
            F: Fn($ty) -> Fut + Send + Sync + 'static,
            Fut: std::future::Future<Output = ()> + Send + 'static,
        {
            self.$field.lock().expect("event registry lock").push(wrap(f));
        }

        pub(crate) async fn $emit(&self, event: $ty) {
            let callbacks: Vec<Callback<$ty>> = self
                .$field
                .lock()
                .expect("event registry lock")
                .clone();
            for cb in callbacks {
                cb(event.clone()).await;
            }
        }
    };
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    registry_event!(on_messages_upsert, emit_messages_upsert, messages_upsert, MessagesUpsert);
    registry_event!(on_groups_update, emit_groups_update, groups_update, Vec<GroupUpdate>);
    registry_event!(
        on_group_participants_update,
        emit_group_participants_update,
        group_participants_update,
        GroupParticipantsUpdate
    );
    registry_event!(
        on_connection_update,
        emit_connection_update,
        connection_update,
        ConnectionUpdate
    );
    registry_event!(on_creds_update, emit_creds_update, creds_update, ());
    registry_event!(on_call, emit_call, call, Vec<CallEvent>);
}
