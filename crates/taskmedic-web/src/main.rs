mod dom;
mod events;
mod gestures;
mod runtime;
mod storage;

fn main() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  tracing::info!(
    "starting TaskMedic web frontend"
  );

  if let Err(err) = runtime::start() {
    tracing::error!(
      error = %format!("{err:#}"),
      "failed to start TaskMedic"
    );
  }
}
