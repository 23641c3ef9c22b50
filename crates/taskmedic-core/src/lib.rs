pub mod action;
pub mod app;
pub mod checklist;
pub mod datastore;
pub mod datetime;
pub mod draft;
pub mod gesture;
pub mod item;
pub mod query;
pub mod scribe;
pub mod view;

pub use action::{
  Action,
  ActionAttrs,
  Route
};
pub use app::{
  App,
  AppConfig,
  DialogChange,
  DomPatch,
  Effect
};
pub use datastore::{
  DocumentStore,
  KvStore,
  MemoryStore
};
