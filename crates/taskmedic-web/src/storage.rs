use anyhow::anyhow;
use taskmedic_core::datastore::KvStore;
use tracing::warn;
use wasm_bindgen::JsValue;

/// `window.localStorage` as a
/// [`KvStore`]. When the browser refuses
/// storage altogether, reads come back
/// empty and every write fails, so the app
/// keeps running on in-memory state.
pub struct LocalStore {
  storage: Option<web_sys::Storage>
}

impl LocalStore {
  pub fn open() -> Self {
    let storage = web_sys::window()
      .and_then(|window| {
        match window.local_storage() {
          | Ok(storage) => storage,
          | Err(err) => {
            warn!(error = ?err, "localStorage access denied");
            None
          }
        }
      });
    if storage.is_none() {
      warn!(
        "localStorage is unavailable; \
         changes will not persist"
      );
    }
    Self {
      storage
    }
  }
}

impl KvStore for LocalStore {
  fn get(
    &self,
    key: &str
  ) -> anyhow::Result<Option<String>> {
    match &self.storage {
      | Some(storage) => storage
        .get_item(key)
        .map_err(js_error),
      | None => Ok(None)
    }
  }

  fn set(
    &mut self,
    key: &str,
    value: &str
  ) -> anyhow::Result<()> {
    let storage = self
      .storage
      .as_ref()
      .ok_or_else(|| {
        anyhow!(
          "localStorage is unavailable"
        )
      })?;
    storage
      .set_item(key, value)
      .map_err(js_error)
  }
}

pub fn js_error(
  value: JsValue
) -> anyhow::Error {
  match value.as_string() {
    | Some(text) => anyhow!(text),
    | None => anyhow!("{value:?}")
  }
}
