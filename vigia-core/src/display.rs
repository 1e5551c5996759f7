//! Status screen layout and refresher
//!
//! Layout for a 128x64 panel with a 6x10 small font (21 columns) and a
//! 10x20 large font:
//!
//! ```text
//! Vigia            *      <- '*' marks a stale snapshot
//! Temp: 23.4 C
//! Umid: 55.2 %
//! Caixa: fechada
//! Colisao: nao
//! WiFi:ok  MQTT:ok
//! ```
//!
//! While the collision latch is active the value rows are replaced by a
//! large alert.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;

use crate::net::{ConnectionState, LinkState, LinkStatus, SessionStatus};
use crate::state::{Fetched, SharedStateStore};
use crate::traits::{DisplayError, TextDisplay};

const LINE_HEIGHT: i32 = 10;
const STATUS_ROW_Y: i32 = 54;

type Line = String<32>;

fn link_label(state: LinkState) -> &'static str {
    match state {
        LinkState::Down => "--",
        LinkState::Associating => "..",
        LinkState::Up => "ok",
    }
}

fn session_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "--",
        ConnectionState::Resolving => "dns",
        ConnectionState::Connecting => "..",
        ConnectionState::Connected => "ok",
    }
}

/// Everything the status screen shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusView {
    pub fetched: Fetched,
    pub link: LinkState,
    pub session: ConnectionState,
}

/// Draw the status screen into the frame buffer (does not flush)
pub fn render_status<D: TextDisplay>(display: &mut D, view: &StatusView) {
    let s = &view.fetched.snapshot;
    let mut line = Line::new();

    display.clear();
    display.draw_text(0, 0, 1, "Vigia");
    if view.fetched.stale {
        display.draw_text(120, 0, 1, "*");
    }

    if s.collision {
        display.draw_text(24, 14, 2, "COLISAO!");
        let _ = write!(line, "Temp: {:.1} C", s.temperature_c);
        display.draw_text(0, 40, 1, &line);
    } else {
        let _ = write!(line, "Temp: {:.1} C", s.temperature_c);
        display.draw_text(0, 12, 1, &line);

        line.clear();
        let _ = write!(line, "Umid: {:.1} %", s.humidity_pct);
        display.draw_text(0, 12 + LINE_HEIGHT, 1, &line);

        line.clear();
        let _ = write!(
            line,
            "Caixa: {}",
            if s.opened { "aberta" } else { "fechada" }
        );
        display.draw_text(0, 12 + 2 * LINE_HEIGHT, 1, &line);

        display.draw_text(0, 12 + 3 * LINE_HEIGHT, 1, "Colisao: nao");
    }

    line.clear();
    let _ = write!(
        line,
        "WiFi:{}  MQTT:{}",
        link_label(view.link),
        session_label(view.session)
    );
    display.draw_text(0, STATUS_ROW_Y, 1, &line);
}

/// Draw and flush a fatal boot error
pub fn render_fault<D: TextDisplay>(display: &mut D, lines: &[&str]) -> Result<(), DisplayError> {
    display.clear();
    for (row, text) in lines.iter().enumerate() {
        display.draw_text(0, 16 + row as i32 * LINE_HEIGHT, 1, text);
    }
    display.show()
}

/// Draw and flush the boot splash
pub fn render_splash<D: TextDisplay>(display: &mut D) -> Result<(), DisplayError> {
    display.clear();
    display.draw_text(34, 16, 2, "Vigia");
    display.draw_text(22, 44, 1, "Sensores + MQTT");
    display.show()
}

/// Periodic display task body
pub struct DisplayRefresher<'a, M: RawMutex> {
    store: &'a SharedStateStore<M>,
    link: &'a LinkStatus,
    session: &'a SessionStatus,
}

impl<'a, M: RawMutex> DisplayRefresher<'a, M> {
    pub fn new(
        store: &'a SharedStateStore<M>,
        link: &'a LinkStatus,
        session: &'a SessionStatus,
    ) -> Self {
        Self {
            store,
            link,
            session,
        }
    }

    /// Fetch a snapshot and redraw the panel
    pub async fn refresh<D: TextDisplay>(&self, display: &mut D) -> Result<StatusView, DisplayError> {
        let view = StatusView {
            fetched: self.store.fetch().await,
            link: self.link.get(),
            session: self.session.get(),
        };
        render_status(display, &view);
        display.show()?;
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SensorField, StateSnapshot};
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use std::string::String as StdString;
    use std::vec::Vec;

    /// Records draw calls; `show` publishes the current frame
    #[derive(Default)]
    struct RecordingDisplay {
        frame: Vec<(i32, i32, u8, StdString)>,
        shown: Vec<Vec<(i32, i32, u8, StdString)>>,
        fail_show: bool,
    }

    impl RecordingDisplay {
        fn texts(&self) -> Vec<&str> {
            self.frame.iter().map(|(_, _, _, t)| t.as_str()).collect()
        }
    }

    impl TextDisplay for RecordingDisplay {
        fn clear(&mut self) {
            self.frame.clear();
        }

        fn draw_text(&mut self, x: i32, y: i32, scale: u8, text: &str) {
            self.frame.push((x, y, scale, text.to_string()));
        }

        fn show(&mut self) -> Result<(), DisplayError> {
            if self.fail_show {
                return Err(DisplayError::Communication);
            }
            self.shown.push(self.frame.clone());
            Ok(())
        }
    }

    fn view(snapshot: StateSnapshot, stale: bool) -> StatusView {
        StatusView {
            fetched: Fetched { snapshot, stale },
            link: LinkState::Up,
            session: ConnectionState::Connected,
        }
    }

    #[test]
    fn test_status_rows() {
        let mut display = RecordingDisplay::default();
        let snapshot = StateSnapshot {
            temperature_c: 23.4,
            humidity_pct: 55.2,
            opened: true,
            collision: false,
        };
        render_status(&mut display, &view(snapshot, false));
        assert_eq!(
            display.texts(),
            vec![
                "Vigia",
                "Temp: 23.4 C",
                "Umid: 55.2 %",
                "Caixa: aberta",
                "Colisao: nao",
                "WiFi:ok  MQTT:ok"
            ]
        );
        // Nothing flushed by render alone
        assert!(display.shown.is_empty());
    }

    #[test]
    fn test_stale_marker() {
        let mut display = RecordingDisplay::default();
        render_status(&mut display, &view(StateSnapshot::ZERO, true));
        assert!(display.frame.contains(&(120, 0, 1, "*".to_string())));
    }

    #[test]
    fn test_collision_alert_is_large() {
        let mut display = RecordingDisplay::default();
        let snapshot = StateSnapshot::ZERO.with(SensorField::Collision(true));
        render_status(&mut display, &view(snapshot, false));
        assert!(display
            .frame
            .iter()
            .any(|(_, _, scale, text)| *scale == 2 && text == "COLISAO!"));
        assert!(!display.texts().contains(&"Colisao: nao"));
    }

    #[test]
    fn test_status_labels() {
        let mut display = RecordingDisplay::default();
        let v = StatusView {
            fetched: Fetched {
                snapshot: StateSnapshot::ZERO,
                stale: false,
            },
            link: LinkState::Down,
            session: ConnectionState::Resolving,
        };
        render_status(&mut display, &v);
        assert!(display.texts().contains(&"WiFi:--  MQTT:dns"));
    }

    #[test]
    fn test_fault_screen_flushes() {
        let mut display = RecordingDisplay::default();
        render_fault(&mut display, &["Erro no Sensor", "AHT10!"]).unwrap();
        assert_eq!(display.shown.len(), 1);
        assert_eq!(display.texts(), vec!["Erro no Sensor", "AHT10!"]);
    }

    #[test]
    fn test_refresher_reads_store_and_status() {
        let store: SharedStateStore<NoopRawMutex> = SharedStateStore::new();
        let link = LinkStatus::new();
        let session = SessionStatus::new();
        let refresher = DisplayRefresher::new(&store, &link, &session);
        let mut display = RecordingDisplay::default();

        block_on(async {
            store.set(SensorField::Temperature(21.0)).await.unwrap();
            let view = refresher.refresh(&mut display).await.unwrap();
            assert_eq!(view.fetched.snapshot.temperature_c, 21.0);
            assert_eq!(view.link, LinkState::Down);
        });
        assert_eq!(display.shown.len(), 1);
        assert!(display.texts().contains(&"Temp: 21.0 C"));
        assert!(display.texts().contains(&"WiFi:--  MQTT:--"));
    }

    #[test]
    fn test_refresher_reports_show_failure() {
        let store: SharedStateStore<NoopRawMutex> = SharedStateStore::new();
        let link = LinkStatus::new();
        let session = SessionStatus::new();
        let refresher = DisplayRefresher::new(&store, &link, &session);
        let mut display = RecordingDisplay {
            fail_show: true,
            ..Default::default()
        };

        let result = block_on(refresher.refresh(&mut display));
        assert_eq!(result.err(), Some(DisplayError::Communication));
    }
}
