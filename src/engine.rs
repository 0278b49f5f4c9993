// src/engine.rs
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::config::AppConfig;
use crate::display::ViewWindow;
use crate::edit::{EditPolicy, IndexRange};
use crate::export::{export_selection, export_series};
use crate::session::Session;
use crate::types::*;

pub fn spawn_thread(
    tx: Sender<EngineMessage>,
    rx_cmd: Receiver<EngineCommand>,
    config: AppConfig,
) -> JoinHandle<()> {
    thread::spawn(move || {
        tx.send(EngineMessage::Log("engine ready".to_owned())).ok();
        Engine::new(config, tx).run(rx_cmd);
        log::debug!("engine stopped");
    })
}

struct Engine {
    session: Session,
    config: AppConfig,
    tx: Sender<EngineMessage>,
    window: Option<ViewWindow>,
    // 下一次视图重建的时间点，期间的触发合并为一次
    rebuild_at: Option<Instant>,
}

impl Engine {
    fn new(config: AppConfig, tx: Sender<EngineMessage>) -> Self {
        Self {
            session: Session::new(config.trim),
            config,
            tx,
            window: None,
            rebuild_at: None,
        }
    }

    fn run(mut self, rx_cmd: Receiver<EngineCommand>) {
        loop {
            let cmd = match self.rebuild_at {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        self.rebuild_view();
                        continue;
                    }
                    match rx_cmd.recv_timeout(deadline - now) {
                        Ok(cmd) => cmd,
                        Err(RecvTimeoutError::Timeout) => {
                            self.rebuild_view();
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match rx_cmd.recv() {
                    Ok(cmd) => cmd,
                    Err(_) => break,
                },
            };
            if !self.handle(cmd) {
                break;
            }
        }
    }

    fn send(&self, msg: EngineMessage) {
        self.tx.send(msg).ok();
    }

    fn log(&self, text: impl Into<String>) {
        self.send(EngineMessage::Log(text.into()));
    }

    fn schedule_view(&mut self) {
        self.rebuild_at = Some(Instant::now() + self.config.view.debounce());
    }

    fn show_full_selected(&mut self) {
        self.window = self.session.selected().map(|f| ViewWindow::full(&f.series));
        self.schedule_view();
    }

    fn rebuild_view(&mut self) {
        self.rebuild_at = None;
        let (Some(file), Some(window)) = (self.session.selected(), self.window) else {
            return;
        };
        if let Some(view) = window.rebuild(&file.series, &self.config.view) {
            self.send(EngineMessage::ViewReady(view));
        }
    }

    fn report_edit(&mut self, removed: Vec<IndexRange>) {
        let Some(index) = self.session.selected_index() else {
            return;
        };
        let remaining = self.session.selected().map_or(0, |f| f.series.len());
        self.send(EngineMessage::Edited { index, remaining, removed });
        self.schedule_view();
    }

    fn send_trim_preview(&self) {
        match self.session.selected() {
            Some(file) => {
                let preview = file.marks.preview(&file.lines());
                self.send(EngineMessage::TrimPreview(preview));
            }
            None => self.log("no file selected"),
        }
    }

    // 返回 false 表示退出线程
    fn handle(&mut self, cmd: EngineCommand) -> bool {
        match cmd {
            EngineCommand::Import(paths) => {
                let had_selection = self.session.selected_index().is_some();
                let tx = &self.tx;
                let (added, failed) = self.session.import_paths(paths, |p| {
                    tx.send(EngineMessage::Progress(p)).ok();
                });
                for index in added {
                    if let Some(file) = self.session.get(index) {
                        self.send(EngineMessage::Imported {
                            index,
                            name: file.name.clone(),
                            samples: file.series.len(),
                        });
                    }
                }
                for err in failed {
                    self.send(EngineMessage::Rejected {
                        name: err.file_name(),
                        reason: err.to_string(),
                    });
                }
                if !had_selection {
                    self.show_full_selected();
                }
            }
            EngineCommand::Select(index) => {
                if self.session.select(index) {
                    self.show_full_selected();
                } else {
                    self.log(format!("no file at position {index}"));
                }
            }
            EngineCommand::Remove(index) => match self.session.remove(index) {
                Some(file) => {
                    self.log(format!("closed {}", file.name));
                    self.show_full_selected();
                }
                None => self.log(format!("no file at position {index}")),
            },
            EngineCommand::Cut(selection) => {
                let removed = self.session.edit_selected(&selection, EditPolicy::Cut);
                self.report_edit(removed);
            }
            EngineCommand::Keep(selection) => {
                let removed = self.session.edit_selected(&selection, EditPolicy::Keep);
                self.report_edit(removed);
                self.window = self.session.selected().map(|f| ViewWindow::full(&f.series));
            }
            EngineCommand::Reset => {
                if self.session.reset_selected() {
                    self.report_edit(Vec::new());
                    self.show_full_selected();
                }
            }
            EngineCommand::SetTrim(marks) => {
                if let Some(file) = self.session.selected_mut() {
                    file.marks = marks;
                }
                self.send_trim_preview();
            }
            EngineCommand::PreviewTrim => self.send_trim_preview(),
            EngineCommand::Trim => {
                let removed = self.session.trim_selected();
                self.report_edit(removed);
            }
            EngineCommand::ApplyToAll => {
                let updated = self.session.apply_to_all();
                self.log(format!("trim marks copied to {updated} files"));
            }
            EngineCommand::RequestView { min_x, max_x } => {
                self.window = Some(ViewWindow::new(min_x, max_x));
                self.schedule_view();
            }
            EngineCommand::Export { dir } => {
                for file in self.session.iter() {
                    match export_series(file, &dir, &self.config.export) {
                        Ok(path) => self.send(EngineMessage::Exported(path)),
                        Err(err) => self.log(err.to_string()),
                    }
                }
            }
            EngineCommand::ExportSelection { start, end, dir } => match self.session.selected() {
                Some(file) => match export_selection(file, start, end, &dir, &self.config.export) {
                    Ok(path) => self.send(EngineMessage::Exported(path)),
                    Err(err) => self.log(err.to_string()),
                },
                None => self.log("no file selected"),
            },
            EngineCommand::Shutdown => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::{Selection, TrimMarks};
    use std::sync::mpsc;
    use std::time::Duration;

    fn write_log(dir: &std::path::Path, name: &str, n: usize) -> std::path::PathBuf {
        let mut text = String::from("Device: AX 3D\nDate: 2024-01-01 00:00:00\nSampling rate: 100\nTimeStamp;Z;X;Y\n");
        for i in 0..n {
            text.push_str(&format!("{i};{i};0;0\n"));
        }
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    fn wait_for(
        rx: &mpsc::Receiver<EngineMessage>,
        pred: impl Fn(&EngineMessage) -> bool,
    ) -> EngineMessage {
        loop {
            let msg = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            if pred(&msg) {
                return msg;
            }
        }
    }

    #[test]
    fn view_requests_are_coalesced() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), "a.txt", 1000);
        let (tx, rx) = mpsc::channel();
        let (tx_cmd, rx_cmd) = mpsc::channel();
        let handle = spawn_thread(tx, rx_cmd, AppConfig::default());

        tx_cmd.send(EngineCommand::Import(vec![path])).unwrap();
        for max_x in [300.0, 200.0, 100.0] {
            tx_cmd.send(EngineCommand::RequestView { min_x: 0.0, max_x }).unwrap();
        }
        let msg = wait_for(&rx, |m| matches!(m, EngineMessage::ViewReady(_)));
        let EngineMessage::ViewReady(view) = msg else { unreachable!() };
        assert_eq!((view.start, view.end), (0, 100));
        let extra = rx.recv_timeout(Duration::from_millis(400));
        assert!(!matches!(extra, Ok(EngineMessage::ViewReady(_))));

        tx_cmd.send(EngineCommand::Keep(Selection::Index { min: 10.0, max: 19.0 })).unwrap();
        let msg = wait_for(&rx, |m| matches!(m, EngineMessage::Edited { .. }));
        let EngineMessage::Edited { remaining, removed, .. } = msg else { unreachable!() };
        assert_eq!(remaining, 10);
        assert_eq!(removed, vec![IndexRange::new(20, 999), IndexRange::new(0, 9)]);

        tx_cmd.send(EngineCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn rejected_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "no header").unwrap();
        let (tx, rx) = mpsc::channel();
        let (tx_cmd, rx_cmd) = mpsc::channel();
        let handle = spawn_thread(tx, rx_cmd, AppConfig::default());
        tx_cmd.send(EngineCommand::Import(vec![bad])).unwrap();
        let msg = wait_for(&rx, |m| matches!(m, EngineMessage::Rejected { .. }));
        let EngineMessage::Rejected { name, .. } = msg else { unreachable!() };
        assert_eq!(name, "bad.txt");
        drop(tx_cmd);
        handle.join().unwrap();
    }

    #[test]
    fn trim_marks_come_back_as_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), "a.txt", 50);
        let (tx, rx) = mpsc::channel();
        let (tx_cmd, rx_cmd) = mpsc::channel();
        let handle = spawn_thread(tx, rx_cmd, AppConfig::default());
        tx_cmd.send(EngineCommand::Import(vec![path])).unwrap();
        wait_for(&rx, |m| matches!(m, EngineMessage::Imported { .. }));

        let marks = TrimMarks {
            top_cut_line: 5,
            bottom_cut_line: 46,
            top_context: 2,
            bottom_context: 2,
        };
        tx_cmd.send(EngineCommand::SetTrim(marks)).unwrap();
        let msg = wait_for(&rx, |m| matches!(m, EngineMessage::TrimPreview(_)));
        let EngineMessage::TrimPreview(preview) = msg else { unreachable!() };
        assert_eq!(preview.top_removed.len(), 2);
        assert!(preview.top_removed[1].ends_with(";4;0;0"));
        assert!(preview.top_kept[0].ends_with(";5;0;0"));
        assert!(preview.bottom_removed[0].ends_with(";45;0;0"));
        assert!(!preview.bottom_reaches_end);

        tx_cmd.send(EngineCommand::Trim).unwrap();
        wait_for(&rx, |m| matches!(m, EngineMessage::Edited { .. }));
        tx_cmd.send(EngineCommand::PreviewTrim).unwrap();
        let msg = wait_for(&rx, |m| matches!(m, EngineMessage::TrimPreview(_)));
        let EngineMessage::TrimPreview(preview) = msg else { unreachable!() };
        assert!(preview.top_removed.is_empty());
        assert!(preview.top_kept[0].ends_with(";5;0;0"));

        tx_cmd.send(EngineCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }
}
