// src/types.rs
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::display::SeriesView;
use crate::edit::{IndexRange, Selection, TrimMarks, TrimPreview};
use crate::ingest::ImportProgress;

// 采集通道，按文件列顺序
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Z,
    X,
    Y,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Z, Channel::X, Channel::Y];

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Z => "Z",
            Channel::X => "X",
            Channel::Y => "Y",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// 设备类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SensorType {
    Ax3d,
    Unknown,
}

impl SensorType {
    pub fn from_device_name(name: &str) -> Self {
        if name.to_ascii_uppercase().contains("AX 3D") {
            SensorType::Ax3d
        } else {
            SensorType::Unknown
        }
    }
}

// 前端发给后台的命令
#[derive(Clone, Debug)]
pub enum EngineCommand {
    Import(Vec<PathBuf>),
    Select(usize),
    Remove(usize),
    Cut(Selection),
    Keep(Selection),
    Reset,
    // 设置当前文件的首尾裁剪标记
    SetTrim(TrimMarks),
    // 请求当前裁剪标记两侧的行
    PreviewTrim,
    Trim,
    ApplyToAll,
    RequestView { min_x: f64, max_x: f64 },
    Export { dir: PathBuf },
    ExportSelection { start: isize, end: isize, dir: PathBuf },
    Shutdown,
}

// 后台发给前端的消息
#[derive(Clone, Debug)]
pub enum EngineMessage {
    Log(String),
    Progress(ImportProgress),
    Imported { index: usize, name: String, samples: usize },
    Rejected { name: String, reason: String },
    Edited { index: usize, remaining: usize, removed: Vec<IndexRange> },
    ViewReady(SeriesView),
    TrimPreview(TrimPreview),
    Exported(PathBuf),
}
