#![allow(dead_code)]

pub mod mock_host;

use vi_modal::{Engine, KeyCode, KeyEvent, KeyOutcome, Mode};

pub use mock_host::MockHost;

/// An activated engine for `host`.
pub fn engine(host: &mut MockHost) -> Engine {
    let mut engine = Engine::new();
    engine.activate(host);
    engine
}

/// Feeds keys in `<Esc>`/`<C-v>` notation. Unbound keys in insert mode are
/// typed into the buffer, the way a host would.
pub async fn feed(engine: &mut Engine, host: &mut MockHost, keys: &str) {
    for key in KeyEvent::parse_sequence(keys) {
        let outcome = engine.handle_key(host, key).await.expect("key handled");
        if outcome == KeyOutcome::Unbound && engine.mode() == Mode::Insert {
            match (key.code, key.typed_char()) {
                (KeyCode::Enter, _) => host.type_char('\n'),
                (_, Some(c)) => host.type_char(c),
                _ => {}
            }
        }
    }
}

/// Installs a fmt subscriber writing through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
