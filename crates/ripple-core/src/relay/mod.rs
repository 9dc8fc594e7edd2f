//! Per-event relay handlers.
//!
//! Each relay is a thin component over the shared [`Registry`] and the
//! transport [`Emitter`]: it decides who receives what, in what shape, and
//! when. All failures are handled at the point of occurrence; nothing here
//! ever terminates the relay process.
//!
//! [`Registry`]: crate::registry::Registry
//! [`Emitter`]: crate::emit::Emitter

mod call;
mod message;
mod social;

pub use call::CallRelay;
pub use message::{MessageRelay, PERSIST_FAILURE_NOTICE, RATE_LIMIT_NOTICE};
pub use social::SocialRelay;

/// Notice sent when an inbound payload fails validation.
pub const MALFORMED_NOTICE: &str = "Invalid payload";

#[cfg(test)]
pub(crate) mod support {
    //! Recording fakes shared by the relay tests.

    use std::sync::Mutex;

    use async_trait::async_trait;
    use ripple_protocol::ServerEvent;

    use crate::emit::Emitter;
    use crate::store::{ChatRecord, MessageStore, StoreError};

    /// A single recorded emit.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Emitted {
        Direct {
            connection_id: String,
            event: ServerEvent,
        },
        Room {
            room: String,
            except: String,
            event: ServerEvent,
        },
    }

    /// Emitter that records every emit for inspection.
    #[derive(Debug, Default)]
    pub struct RecordingEmitter {
        events: Mutex<Vec<Emitted>>,
    }

    impl RecordingEmitter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn all(&self) -> Vec<Emitted> {
            self.events.lock().unwrap().clone()
        }

        /// Events emitted directly to the given connection.
        pub fn to_connection(&self, connection_id: &str) -> Vec<ServerEvent> {
            self.all()
                .into_iter()
                .filter_map(|e| match e {
                    Emitted::Direct {
                        connection_id: c,
                        event,
                    } if c == connection_id => Some(event),
                    _ => None,
                })
                .collect()
        }

        /// Events broadcast to the given room.
        pub fn to_room(&self, room: &str) -> Vec<ServerEvent> {
            self.all()
                .into_iter()
                .filter_map(|e| match e {
                    Emitted::Room { room: r, event, .. } if r == room => Some(event),
                    _ => None,
                })
                .collect()
        }

        pub fn is_empty(&self) -> bool {
            self.events.lock().unwrap().is_empty()
        }
    }

    impl Emitter for RecordingEmitter {
        fn emit(&self, connection_id: &str, event: ServerEvent) {
            self.events.lock().unwrap().push(Emitted::Direct {
                connection_id: connection_id.to_string(),
                event,
            });
        }

        fn emit_room(&self, room: &str, except_connection: &str, event: ServerEvent) {
            self.events.lock().unwrap().push(Emitted::Room {
                room: room.to_string(),
                except: except_connection.to_string(),
                event,
            });
        }
    }

    /// Store that records persisted records and can be made to fail.
    #[derive(Debug, Default)]
    pub struct RecordingStore {
        records: Mutex<Vec<ChatRecord>>,
        fail: bool,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn records(&self) -> Vec<ChatRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageStore for RecordingStore {
        async fn persist(&self, record: &ChatRecord) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Write("boom".into()));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }
}
